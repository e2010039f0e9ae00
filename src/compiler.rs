/*
 * Copyright 2021-2025 The Almanac Project Developers
 *
 * This file is part of Almanac.
 *
 * Almanac is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Lesser General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Almanac is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Lesser General Public License for more details.
 *
 * You should have received a copy of the GNU Lesser General Public License
 * along with Almanac.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Module containing the program compiler
//!
//! The entry point for compiler code is the [`compile()`] function. Users
//! are expected to run the staged parser first with
//! [`crate::parser::parse()`]. The compiler concatenates the objects' byte
//! streams and applies entry-point relocation: instructions governed by the
//! entry label move to the front of the program while every other
//! instruction keeps its original relative order. Byte content is preserved
//! exactly, only ordering changes, and the [`InstructionMap`] records the
//! permutation so external tools can map program positions back to source
//! order

use serde::Serialize;

use crate::bytes::INSTRUCTION_BYTE_COUNT;
use crate::messages::{code, ExtendedAsmMessage, Reporter};
use crate::parser::{EncodedInstruction, ParsedAssembly};

/// Program entry point: a first-class label of one object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryPoint {
    /// Name of the object declaring the label
    pub object_name: String,
    /// Name of the first-class label
    pub label: String,
}

/// Bidirectional permutation between original instruction order and the
/// relocated program order
///
/// Original order is the concatenation of the objects' instructions in
/// declaration order. Both directions are total over the program
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstructionMap {
    /// Reordered index of each original index
    to_reordered: Vec<usize>,
    /// Original index of each reordered index
    to_original: Vec<usize>,
}

impl InstructionMap {
    /// Builds the map from the reordered sequence of original indices
    fn from_order(order: &[usize]) -> Self {
        let mut to_reordered = vec![0; order.len()];
        for (reordered, &original) in order.iter().enumerate() {
            to_reordered[original] = reordered;
        }
        Self {
            to_reordered,
            to_original: order.to_vec(),
        }
    }

    /// Gets the program position of an instruction by its original index
    #[must_use]
    pub fn reordered_of(&self, original: usize) -> Option<usize> {
        self.to_reordered.get(original).copied()
    }

    /// Gets the original index of an instruction by its program position
    #[must_use]
    pub fn original_of(&self, reordered: usize) -> Option<usize> {
        self.to_original.get(reordered).copied()
    }

    /// Gets the amount of instructions covered by the map
    #[must_use]
    pub fn len(&self) -> usize {
        self.to_original.len()
    }

    /// Checks whether the map covers no instructions
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_original.is_empty()
    }
}

/// One object's compiled byte stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledObject {
    /// Name of the object
    pub object_name: String,
    /// Encoded bytes of the object's instructions, ordered by their program
    /// position
    pub bytes: Vec<u8>,
    /// Whether the object produced no blocking diagnostic
    pub succeeded: bool,
}

/// Compilation result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledAssembly {
    /// Whether every object succeeded and the entry point resolved
    pub succeeded: bool,
    /// Diagnostics of the whole build, in object order
    pub messages: Vec<ExtendedAsmMessage>,
    /// Full program bytes, in relocated order
    pub program_bytes: Vec<u8>,
    /// Per-object byte streams, in declaration order
    pub objects: Vec<CompiledObject>,
    /// Permutation applied by the entry-point relocation
    pub instruction_map: InstructionMap,
}

/// Output format of a compiled program file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Raw bytes
    #[default]
    Binary,
    /// Space-joined zero-padded decimal byte tokens
    Base10,
    /// Space-joined zero-padded hexadecimal byte tokens
    Base16,
}

impl CompiledAssembly {
    /// Renders the program bytes in the given file format
    #[must_use]
    pub fn to_file_content(&self, format: OutputFormat) -> Vec<u8> {
        let tokens = |f: fn(u8) -> String| {
            self.program_bytes
                .iter()
                .map(|&byte| f(byte))
                .collect::<Vec<_>>()
                .join(" ")
                .into_bytes()
        };
        match format {
            OutputFormat::Binary => self.program_bytes.clone(),
            OutputFormat::Base10 => tokens(|byte| format!("{byte:03}")),
            OutputFormat::Base16 => tokens(|byte| format!("{byte:02X}")),
        }
    }
}

/// Compiles a parsed assembly into the final program
///
/// The relocation is a stable partition: instructions of the entry object
/// governed by the entry label come first in their original relative order,
/// followed by every other instruction in original order. Each object's byte
/// slice is re-emitted under the same permutation, with its instructions
/// sorted by their program position. Without an entry point everything keeps
/// the source order
///
/// # Parameters
///
/// * `parsed`: output of [`crate::parser::parse()`]
/// * `entry_point`: entry label to relocate to the front, if any
#[must_use]
pub fn compile(parsed: &ParsedAssembly, entry_point: Option<&EntryPoint>) -> CompiledAssembly {
    let mut messages = parsed.messages();

    // Original order: objects in declaration order, instructions in source
    // order within each
    let instructions = parsed
        .objects
        .iter()
        .enumerate()
        .flat_map(|(index, object)| {
            object
                .encoded
                .iter()
                .map(move |instruction| (index, instruction))
        })
        .collect::<Vec<_>>();

    let is_entry = |object_index: usize, instruction: &EncodedInstruction| {
        entry_point.is_some_and(|entry| {
            parsed.objects[object_index].name == entry.object_name
                && instruction.governing_label == entry.label
        })
    };
    let mut entry_found = false;
    let mut order = Vec::with_capacity(instructions.len());
    for (i, &(object_index, instruction)) in instructions.iter().enumerate() {
        if is_entry(object_index, instruction) {
            entry_found = true;
            order.push(i);
        }
    }
    for (i, &(object_index, instruction)) in instructions.iter().enumerate() {
        if !is_entry(object_index, instruction) {
            order.push(i);
        }
    }
    if let Some(entry) = entry_point {
        if !entry_found {
            // No source to excerpt: the failure names a label, not a span
            let mut reporter = Reporter::new(entry.object_name.as_str(), "");
            reporter.report(
                code::ENTRY_POINT_NOT_FOUND,
                None,
                [format!(
                    "no instruction of `{}` is governed by `{}`",
                    entry.object_name, entry.label
                )],
            );
            messages.extend(reporter.into_messages());
        }
    }
    let entry_failed = entry_point.is_some() && !entry_found;

    // Emit the program stream and each object's slice from the same walk of
    // the relocated order
    let mut program_bytes = Vec::with_capacity(instructions.len() * INSTRUCTION_BYTE_COUNT);
    let mut object_bytes = vec![Vec::new(); parsed.objects.len()];
    for &original in &order {
        let (object_index, instruction) = instructions[original];
        program_bytes.extend(instruction.bytes);
        object_bytes[object_index].extend(instruction.bytes);
    }
    debug_assert_eq!(program_bytes.len() % INSTRUCTION_BYTE_COUNT, 0);

    let objects = parsed
        .objects
        .iter()
        .zip(object_bytes)
        .map(|(object, bytes)| CompiledObject {
            object_name: object.name.clone(),
            bytes,
            succeeded: object.succeeded,
        })
        .collect();

    CompiledAssembly {
        succeeded: parsed.succeeded && !entry_failed,
        messages,
        program_bytes,
        objects,
        instruction_map: InstructionMap::from_order(&order),
    }
}
