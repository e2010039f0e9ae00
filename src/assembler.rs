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

//! Module containing the top level build entry point
//!
//! [`build()`] drives the whole toolchain: source normalization, the staged
//! parser, and the compiler. It never fails outright, a build with
//! diagnostics still carries its partial program so callers can inspect
//! what was produced

use serde::Serialize;

use crate::compiler::{self, CompiledAssembly, EntryPoint, OutputFormat};
use crate::messages::ExtendedAsmMessage;
use crate::parser::{self, OversizedValueSizing, ParseOptions};

/// Options of a build
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Demote oversized inline values to warnings instead of failing the
    /// build
    pub treat_oversized_inline_values_as_warnings: bool,
    /// Policy for resolved values that don't fit their encoding field
    pub oversized_inline_value_sizing: OversizedValueSizing,
    /// Substitute a placeholder for unresolvable external addresses instead
    /// of failing. Used for partial/incremental builds
    pub use_mock_for_external_addresses: bool,
    /// Entry label to relocate to the front of the program, if any
    pub entry_point: Option<EntryPoint>,
    /// Offset added to every computed address
    pub base_address_offset: u32,
}

/// Result of a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assembly {
    /// Whether the build produced no blocking diagnostic
    pub build_succeeded: bool,
    /// Diagnostics of the whole build, in object order
    pub messages: Vec<ExtendedAsmMessage>,
    /// Total amount of program bytes produced
    pub total_byte_count: usize,
    /// Compiled program
    pub compilation: CompiledAssembly,
}

impl Assembly {
    /// Renders the program bytes in the given file format
    #[must_use]
    pub fn to_file_content(&self, format: OutputFormat) -> Vec<u8> {
        self.compilation.to_file_content(format)
    }
}

/// Builds a set of source objects into a compiled program
///
/// Sources are CRLF-folded before parsing so coordinates and excerpts are
/// stable across platforms. Always produces a partial result alongside any
/// diagnostics
///
/// # Parameters
///
/// * `file_map`: ordered `(object name, source text)` pairs
/// * `options`: build options
#[must_use]
pub fn build(file_map: &[(&str, &str)], options: &BuildOptions) -> Assembly {
    let normalized = file_map
        .iter()
        .map(|&(name, content)| (name, content.replace("\r\n", "\n")))
        .collect::<Vec<_>>();
    let parse_options = ParseOptions {
        treat_oversized_inline_values_as_warnings: options
            .treat_oversized_inline_values_as_warnings,
        oversized_value_sizing: options.oversized_inline_value_sizing,
        use_mock_for_external_addresses: options.use_mock_for_external_addresses,
        base_address_offset: options.base_address_offset,
    };
    let parsed = parser::parse(
        normalized.iter().map(|(name, content)| (*name, content.as_str())),
        &parse_options,
    );
    let compilation = compiler::compile(&parsed, options.entry_point.as_ref());
    Assembly {
        build_succeeded: compilation.succeeded,
        messages: compilation.messages.clone(),
        total_byte_count: compilation.program_bytes.len(),
        compilation,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn minimal_build() {
        let assembly = build(&[("main", "main:\n  NOOP\n")], &BuildOptions::default());
        assert!(assembly.build_succeeded, "{:?}", assembly.messages);
        assert_eq!(assembly.total_byte_count, 5);
        assert_eq!(assembly.compilation.program_bytes, vec![0, 0, 0, 0, 0]);
    }

    #[test]
    fn crlf_sources_fold() {
        let lf = build(
            &[("main", "main:\n  LOAD [MONDAY] 5\n")],
            &BuildOptions::default(),
        );
        let crlf = build(
            &[("main", "main:\r\n  LOAD [MONDAY] 5\r\n")],
            &BuildOptions::default(),
        );
        assert_eq!(lf, crlf);
    }

    #[test]
    fn entry_point_flows_through() {
        let options = BuildOptions {
            entry_point: Some(EntryPoint {
                object_name: "main".to_owned(),
                label: "main".to_owned(),
            }),
            ..BuildOptions::default()
        };
        let assembly = build(&[("main", "setup:\n  TICK\nmain:\n  HALT\n")], &options);
        assert!(assembly.build_succeeded, "{:?}", assembly.messages);
        assert_eq!(
            assembly.compilation.program_bytes,
            vec![1, 0, 0, 0, 0, 14, 0, 0, 0, 0]
        );
    }

    #[test]
    fn failed_build_keeps_partial_program() {
        let assembly = build(&[("main", "  PUSH [MONDY]\n")], &BuildOptions::default());
        assert!(!assembly.build_succeeded);
        assert_eq!(assembly.total_byte_count, 5);
        assert!(!assembly.messages.is_empty());
    }
}
