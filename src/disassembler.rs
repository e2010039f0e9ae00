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

//! Module containing the program disassembler
//!
//! Walks a compiled byte stream in fixed-width steps and renders each
//! instruction back to source syntax. Instructions that don't decode render
//! as `???` followed by their raw bytes instead of failing the walk, so a
//! partially corrupted program can still be inspected

use crate::bytes::INSTRUCTION_BYTE_COUNT;
use crate::machine::Mnemonic;
use crate::parser::RegisterRef;

/// Error of a disassembly
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The byte stream length isn't a multiple of the instruction width
    MisalignedLength(usize),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MisalignedLength(length) => write!(
                f,
                "byte stream length {length} isn't a multiple of the instruction width {INSTRUCTION_BYTE_COUNT}"
            ),
        }
    }
}

impl std::error::Error for Error {}

/// Disassembles a compiled byte stream into one source line per instruction
///
/// # Parameters
///
/// * `bytes`: compiled program bytes
///
/// # Errors
///
/// Errors if the length of the stream isn't a multiple of the instruction
/// width
pub fn disassemble(bytes: &[u8]) -> Result<Vec<String>, Error> {
    if bytes.len() % INSTRUCTION_BYTE_COUNT != 0 {
        return Err(Error::MisalignedLength(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(INSTRUCTION_BYTE_COUNT)
        .map(instruction)
        .collect())
}

/// Disassembles a compiled byte stream into a single newline-joined text
///
/// # Errors
///
/// Errors if the length of the stream isn't a multiple of the instruction
/// width
pub fn disassemble_to_text(bytes: &[u8]) -> Result<String, Error> {
    Ok(disassemble(bytes)?.join("\n"))
}

/// Renders one fixed-width instruction
fn instruction(bytes: &[u8]) -> String {
    decode(bytes).unwrap_or_else(|| {
        let raw = bytes
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        format!("??? {raw}")
    })
}

/// Decodes one fixed-width instruction, or [`None`] if any byte doesn't
/// decode under the mnemonic's shape
fn decode(bytes: &[u8]) -> Option<String> {
    let mnemonic = Mnemonic::from_code(bytes[0])?;
    let shape = mnemonic.shape();
    let mut parts = vec![mnemonic.name().to_owned()];
    let mut pos = 1;
    for _ in 0..shape.register_count() {
        parts.push(RegisterRef::decode(bytes[pos])?.to_string());
        pos += 1;
    }
    if let Some(width) = shape.value_width() {
        let mut value: u32 = 0;
        for (i, &byte) in bytes[pos..pos + width].iter().enumerate() {
            value |= u32::from(byte) << (8 * i);
        }
        parts.push(value.to_string());
    }
    Some(parts.join(" "))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn implicit_accumulator() {
        assert_eq!(
            disassemble(&[0, 0, 0, 0, 0, 1, 0, 0, 0, 0]),
            Ok(vec!["NOOP".to_owned(), "HALT".to_owned()])
        );
    }

    #[test]
    fn registers_and_masks() {
        // The mask acronym only renders for partial masks
        assert_eq!(
            disassemble(&[4, 0x00, 0x86, 0, 0]),
            Ok(vec!["COPY [MONDAY] [SUNDAY.LB]".to_owned()])
        );
    }

    #[test]
    fn register_and_value() {
        assert_eq!(
            disassemble(&[2, 0x20, 5, 0, 0]),
            Ok(vec!["LOAD [MONDAY.HH] 5".to_owned()])
        );
    }

    #[test]
    fn inline_quad_is_little_endian() {
        assert_eq!(
            disassemble(&[10, 0xEF, 0xBE, 0xAD, 0xDE]),
            Ok(vec![format!("JUMP {}", 0xDEAD_BEEFu32)])
        );
    }

    #[test]
    fn unknown_mnemonic() {
        assert_eq!(
            disassemble(&[99, 1, 2, 3, 4]),
            Ok(vec!["??? 99 1 2 3 4".to_owned()])
        );
    }

    #[test]
    fn undecodable_register() {
        // Register code 31 doesn't exist
        assert_eq!(
            disassemble(&[12, 0x1F, 0, 0, 0]),
            Ok(vec!["??? 12 31 0 0 0".to_owned()])
        );
    }

    #[test]
    fn misaligned_length() {
        assert_eq!(disassemble(&[0, 0, 0]), Err(Error::MisalignedLength(3)));
        assert_eq!(disassemble(&[]), Ok(vec![]));
    }

    #[test]
    fn joined_text() {
        assert_eq!(
            disassemble_to_text(&[0, 0, 0, 0, 0, 14, 0, 0, 0, 0]),
            Ok("NOOP\nTICK".to_owned())
        );
    }
}
