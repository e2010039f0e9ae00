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

//! Module containing the stage 5 instruction finalizer
//!
//! Packs each resolved instruction into its fixed-width encoding: byte 0 is
//! the mnemonic code, followed by one byte per register argument and the
//! little-endian trailing value, with explicit zero padding up to
//! [`INSTRUCTION_BYTE_COUNT`]. The padding is a hard format contract: tools
//! reading the byte stream rely on every instruction occupying exactly the
//! fixed width

use crate::bytes::INSTRUCTION_BYTE_COUNT;
use crate::messages::{code, Reporter};
use crate::parser::resolver::{ResolvedArg, ResolvedInstruction};

/// Policy applied to resolved values that don't fit their encoding field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OversizedValueSizing {
    /// Keep the low bytes of the value
    #[default]
    Truncate,
    /// Clamp the value to the field's maximum
    Saturate,
}

/// Options of the finalizer stage
#[derive(Debug, Clone, Copy, Default)]
pub struct FinalizeOptions {
    /// Policy for values that don't fit their encoding field
    pub oversized_value_sizing: OversizedValueSizing,
    /// Demote oversized-value diagnostics to warnings
    pub treat_oversized_values_as_warnings: bool,
}

/// One instruction in its final fixed-width encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedInstruction {
    /// Encoded bytes of the instruction
    pub bytes: [u8; INSTRUCTION_BYTE_COUNT],
    /// Absolute address of the instruction
    pub address: u32,
    /// Name of the first-class block governing the instruction
    pub governing_label: String,
    /// 0-based index of the source line
    pub line_index: usize,
}

/// Finalizes every instruction of an object
#[must_use]
pub fn finalize_object(
    instructions: &[ResolvedInstruction],
    options: FinalizeOptions,
    reporter: &mut Reporter,
) -> Vec<EncodedInstruction> {
    instructions
        .iter()
        .map(|instruction| finalize(instruction, options, reporter))
        .collect()
}

/// Packs one resolved instruction into its fixed-width encoding
///
/// Total by construction: arguments missing after a diagnosed shape mismatch
/// encode as zero so the byte stream stays aligned
#[must_use]
pub fn finalize(
    instruction: &ResolvedInstruction,
    options: FinalizeOptions,
    reporter: &mut Reporter,
) -> EncodedInstruction {
    let (mnemonic, span) = instruction.mnemonic;
    let shape = mnemonic.shape();
    let mut bytes = [0; INSTRUCTION_BYTE_COUNT];
    bytes[0] = mnemonic.code();
    let mut pos = 1;
    for i in 0..shape.register_count() {
        bytes[pos] = match instruction.args.get(i) {
            Some(ResolvedArg::Register(reference)) => reference.encode(),
            // Shape mismatches were diagnosed in stage 3, keep the stream
            // aligned with the value's low byte
            Some(ResolvedArg::Value(value)) => *value as u8,
            None => 0,
        };
        pos += 1;
    }
    if let Some(width) = shape.value_width() {
        let raw = match instruction.args.get(shape.register_count()) {
            Some(ResolvedArg::Value(value)) => u64::from(*value),
            Some(ResolvedArg::Register(reference)) => u64::from(reference.encode()),
            None => 0,
        };
        let max = (1u64 << (8 * width as u32)) - 1;
        let value = if raw > max {
            let details = [format!(
                "the value {raw} doesn't fit in the {width}-byte field of `{mnemonic}`"
            )];
            if options.treat_oversized_values_as_warnings {
                reporter.report_demoted(code::OVERSIZED_ARGUMENT, Some(span), details);
            } else {
                reporter.report(code::OVERSIZED_ARGUMENT, Some(span), details);
            }
            match options.oversized_value_sizing {
                OversizedValueSizing::Truncate => raw & max,
                OversizedValueSizing::Saturate => max,
            }
        } else {
            raw
        };
        bytes[pos..pos + width].copy_from_slice(&value.to_le_bytes()[..width]);
    }
    EncodedInstruction {
        bytes,
        address: instruction.address,
        governing_label: instruction.governing_label.clone(),
        line_index: instruction.line_index,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::machine::{Mnemonic, Register, RegisterMask};
    use crate::parser::unit::RegisterRef;
    use crate::span::DEFAULT_SPAN;

    fn resolved(mnemonic: Mnemonic, args: Vec<ResolvedArg>) -> ResolvedInstruction {
        ResolvedInstruction {
            mnemonic: (mnemonic, DEFAULT_SPAN),
            args,
            address: 0,
            governing_label: String::new(),
            line_index: 0,
        }
    }

    fn register(register: Register, mask: RegisterMask) -> ResolvedArg {
        ResolvedArg::Register(RegisterRef { register, mask })
    }

    fn encode(instruction: &ResolvedInstruction) -> ([u8; INSTRUCTION_BYTE_COUNT], Vec<u32>) {
        encode_with(instruction, FinalizeOptions::default())
    }

    fn encode_with(
        instruction: &ResolvedInstruction,
        options: FinalizeOptions,
    ) -> ([u8; INSTRUCTION_BYTE_COUNT], Vec<u32>) {
        let mut reporter = Reporter::new("obj", "");
        let encoded = finalize(instruction, options, &mut reporter);
        let codes = reporter.messages().iter().map(|m| m.code).collect();
        (encoded.bytes, codes)
    }

    #[test]
    fn implicit_accumulator_is_zero_padded() {
        let (bytes, codes) = encode(&resolved(Mnemonic::Noop, vec![]));
        assert_eq!(bytes, [0, 0, 0, 0, 0]);
        assert_eq!(codes, vec![]);
        let (bytes, _) = encode(&resolved(Mnemonic::Halt, vec![]));
        assert_eq!(bytes, [1, 0, 0, 0, 0]);
    }

    #[test]
    fn register_bytes() {
        let (bytes, _) = encode(&resolved(
            Mnemonic::Copy,
            vec![
                register(Register::Monday, RegisterMask::Full),
                register(Register::Sunday, RegisterMask::LowByte),
            ],
        ));
        // Mask selector in the high 3 bits, register code in the low 5
        assert_eq!(bytes, [4, 0x00, 0x86, 0, 0]);
    }

    #[test]
    fn register_and_value() {
        let (bytes, codes) = encode(&resolved(
            Mnemonic::Load,
            vec![
                register(Register::Tuesday, RegisterMask::HighHalf),
                ResolvedArg::Value(0x0102_03),
            ],
        ));
        assert_eq!(bytes, [2, 0x21, 0x03, 0x02, 0x01]);
        assert_eq!(codes, vec![]);
    }

    #[test]
    fn inline_quad() {
        let (bytes, _) = encode(&resolved(
            Mnemonic::Jump,
            vec![ResolvedArg::Value(0xDEAD_BEEF)],
        ));
        assert_eq!(bytes, [10, 0xEF, 0xBE, 0xAD, 0xDE]);
    }

    #[test]
    fn oversized_value_truncates() {
        let instruction = resolved(
            Mnemonic::Load,
            vec![
                register(Register::Monday, RegisterMask::Full),
                ResolvedArg::Value(0x0100_0000),
            ],
        );
        let (bytes, codes) = encode(&instruction);
        assert_eq!(codes, vec![code::OVERSIZED_ARGUMENT]);
        assert_eq!(bytes, [2, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn oversized_value_saturates() {
        let instruction = resolved(
            Mnemonic::Load,
            vec![
                register(Register::Monday, RegisterMask::Full),
                ResolvedArg::Value(0x0100_0000),
            ],
        );
        let options = FinalizeOptions {
            oversized_value_sizing: OversizedValueSizing::Saturate,
            ..FinalizeOptions::default()
        };
        let (bytes, codes) = encode_with(&instruction, options);
        assert_eq!(codes, vec![code::OVERSIZED_ARGUMENT]);
        assert_eq!(bytes, [2, 0x00, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn oversized_demotion() {
        let instruction = resolved(
            Mnemonic::Load,
            vec![
                register(Register::Monday, RegisterMask::Full),
                ResolvedArg::Value(0x0100_0000),
            ],
        );
        let options = FinalizeOptions {
            treat_oversized_values_as_warnings: true,
            ..FinalizeOptions::default()
        };
        let mut reporter = Reporter::new("obj", "");
        finalize(&instruction, options, &mut reporter);
        assert!(reporter.succeeded());
    }

    #[test]
    fn missing_arguments_encode_as_zero() {
        // Shape mismatches keep the stream aligned
        let (bytes, codes) = encode(&resolved(Mnemonic::Load, vec![]));
        assert_eq!(bytes, [2, 0, 0, 0, 0]);
        assert_eq!(codes, vec![]);
    }
}
