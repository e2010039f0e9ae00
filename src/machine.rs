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

//! Module containing the static tables of the Almanac machine: mnemonics and
//! their argument shapes, registers and register masks, and status flags
//!
//! The numeric codes in this module are a wire contract shared with the
//! emulator and the debug tooling. They must never be renumbered

use serde::Serialize;

/// Result of looking up a name against a case-sensitive table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch<T> {
    /// The name matched with its canonical spelling
    Exact(T),
    /// The name matched a table entry, but only case-insensitively
    WrongCase(T),
    /// The name didn't match any table entry
    Unknown,
}

/// Looks a name up in a `(name, value)` table, distinguishing exact matches
/// from case-insensitive ones
fn lookup<T: Copy>(name: &str, table: &[(&str, T)]) -> NameMatch<T> {
    for (candidate, value) in table {
        if *candidate == name {
            return NameMatch::Exact(*value);
        }
    }
    for (candidate, value) in table {
        if candidate.eq_ignore_ascii_case(name) {
            return NameMatch::WrongCase(*value);
        }
    }
    NameMatch::Unknown
}

/// Shape of the arguments a mnemonic takes, determining how its data part is
/// laid out within the fixed instruction width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgShape {
    /// No arguments, the instruction operates on the implicit accumulator
    ImplicitAccumulator,
    /// A single register reference
    OneRegister,
    /// Two register references
    TwoRegister,
    /// Three register references
    ThreeRegister,
    /// A register reference followed by a 1-byte value
    RegisterByte,
    /// A register reference followed by a 2-byte value
    RegisterDoubleByte,
    /// A register reference followed by a 3-byte value
    RegisterTriByte,
    /// A single 4-byte inline value
    InlineQuad,
}

impl ArgShape {
    /// Gets the amount of arguments the shape expects
    #[must_use]
    pub const fn arg_count(self) -> usize {
        match self {
            Self::ImplicitAccumulator => 0,
            Self::OneRegister | Self::InlineQuad => 1,
            Self::TwoRegister
            | Self::RegisterByte
            | Self::RegisterDoubleByte
            | Self::RegisterTriByte => 2,
            Self::ThreeRegister => 3,
        }
    }

    /// Gets the amount of leading register arguments of the shape
    #[must_use]
    pub const fn register_count(self) -> usize {
        match self {
            Self::ImplicitAccumulator | Self::InlineQuad => 0,
            Self::OneRegister
            | Self::RegisterByte
            | Self::RegisterDoubleByte
            | Self::RegisterTriByte => 1,
            Self::TwoRegister => 2,
            Self::ThreeRegister => 3,
        }
    }

    /// Gets the byte width of the trailing value argument, if the shape has
    /// one
    #[must_use]
    pub const fn value_width(self) -> Option<usize> {
        match self {
            Self::RegisterByte => Some(1),
            Self::RegisterDoubleByte => Some(2),
            Self::RegisterTriByte => Some(3),
            Self::InlineQuad => Some(4),
            _ => None,
        }
    }
}

/// Mnemonics of the Almanac instruction set
///
/// The discriminant of each variant is its encoding in byte 0 of the
/// instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum Mnemonic {
    Noop = 0,
    Halt = 1,
    Load = 2,
    Save = 3,
    Copy = 4,
    Swap = 5,
    Add = 6,
    Sub = 7,
    Mul = 8,
    Div = 9,
    Jump = 10,
    Fork = 11,
    Push = 12,
    Pop = 13,
    Tick = 14,
    Emit = 15,
}

/// Canonical upper-case spelling of each mnemonic, paired with its variant
static MNEMONICS: &[(&str, Mnemonic)] = &[
    ("NOOP", Mnemonic::Noop),
    ("HALT", Mnemonic::Halt),
    ("LOAD", Mnemonic::Load),
    ("SAVE", Mnemonic::Save),
    ("COPY", Mnemonic::Copy),
    ("SWAP", Mnemonic::Swap),
    ("ADD", Mnemonic::Add),
    ("SUB", Mnemonic::Sub),
    ("MUL", Mnemonic::Mul),
    ("DIV", Mnemonic::Div),
    ("JUMP", Mnemonic::Jump),
    ("FORK", Mnemonic::Fork),
    ("PUSH", Mnemonic::Push),
    ("POP", Mnemonic::Pop),
    ("TICK", Mnemonic::Tick),
    ("EMIT", Mnemonic::Emit),
];

impl Mnemonic {
    /// Finds the mnemonic with the given name, case-sensitively but reporting
    /// case-insensitive near misses
    #[must_use]
    pub fn find(name: &str) -> NameMatch<Self> {
        lookup(name, MNEMONICS)
    }

    /// Gets the mnemonic with the given encoding byte
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        MNEMONICS.iter().map(|(_, m)| *m).find(|m| m.code() == code)
    }

    /// Gets the encoding byte of the mnemonic
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Gets the canonical name of the mnemonic
    #[must_use]
    pub fn name(self) -> &'static str {
        MNEMONICS
            .iter()
            .find(|(_, m)| *m == self)
            .expect("every mnemonic variant has a table entry")
            .0
    }

    /// Gets the argument shape of the mnemonic
    #[must_use]
    pub const fn shape(self) -> ArgShape {
        match self {
            Self::Noop | Self::Halt | Self::Tick => ArgShape::ImplicitAccumulator,
            Self::Push | Self::Pop | Self::Emit => ArgShape::OneRegister,
            Self::Copy | Self::Swap => ArgShape::TwoRegister,
            Self::Add | Self::Sub | Self::Mul | Self::Div => ArgShape::ThreeRegister,
            Self::Load | Self::Save | Self::Fork => ArgShape::RegisterTriByte,
            Self::Jump => ArgShape::InlineQuad,
        }
    }

    /// Iterates over the canonical names of all mnemonics
    pub fn names() -> impl Iterator<Item = &'static str> {
        MNEMONICS.iter().map(|(name, _)| *name)
    }
}

impl std::fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// General purpose registers of the Almanac machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum Register {
    Monday = 0,
    Tuesday = 1,
    Wednesday = 2,
    Thursday = 3,
    Friday = 4,
    Saturday = 5,
    Sunday = 6,
}

/// Canonical upper-case spelling of each register, paired with its variant
static REGISTERS: &[(&str, Register)] = &[
    ("MONDAY", Register::Monday),
    ("TUESDAY", Register::Tuesday),
    ("WEDNESDAY", Register::Wednesday),
    ("THURSDAY", Register::Thursday),
    ("FRIDAY", Register::Friday),
    ("SATURDAY", Register::Saturday),
    ("SUNDAY", Register::Sunday),
];

impl Register {
    /// Finds the register with the given name, case-sensitively but reporting
    /// case-insensitive near misses
    #[must_use]
    pub fn find(name: &str) -> NameMatch<Self> {
        lookup(name, REGISTERS)
    }

    /// Gets the register with the given encoding code
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        REGISTERS.iter().map(|(_, r)| *r).find(|r| r.code() == code)
    }

    /// Gets the encoding code of the register, stored in the low 5 bits of a
    /// register argument byte
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Gets the canonical name of the register
    #[must_use]
    pub fn name(self) -> &'static str {
        REGISTERS
            .iter()
            .find(|(_, r)| *r == self)
            .expect("every register variant has a table entry")
            .0
    }

    /// Iterates over the canonical names of all registers
    pub fn names() -> impl Iterator<Item = &'static str> {
        REGISTERS.iter().map(|(name, _)| *name)
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Sub-register masks selecting the part of a register an instruction
/// operates on
///
/// Masks are written after the register name with a `.` separator, either by
/// acronym (`[MONDAY.HH]`) or by numeric selector (`[MONDAY.1]`). The
/// selector is the encoding stored in the high 3 bits of a register argument
/// byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[repr(u8)]
pub enum RegisterMask {
    /// The whole register. Never rendered as an acronym
    #[default]
    Full = 0,
    /// High half (bits 16-31)
    HighHalf = 1,
    /// Low half (bits 0-15)
    LowHalf = 2,
    /// High byte (bits 24-31)
    HighByte = 3,
    /// Low byte (bits 0-7)
    LowByte = 4,
}

/// Acronym spelling of each mask, paired with its variant. `Full` is absent:
/// it is the implied default and has no written form
static MASKS: &[(&str, RegisterMask)] = &[
    ("HH", RegisterMask::HighHalf),
    ("LH", RegisterMask::LowHalf),
    ("HB", RegisterMask::HighByte),
    ("LB", RegisterMask::LowByte),
];

impl RegisterMask {
    /// Finds the mask with the given acronym, case-sensitively but reporting
    /// case-insensitive near misses
    #[must_use]
    pub fn find(acronym: &str) -> NameMatch<Self> {
        lookup(acronym, MASKS)
    }

    /// Gets the mask with the given numeric selector
    #[must_use]
    pub const fn from_selector(selector: u8) -> Option<Self> {
        Some(match selector {
            0 => Self::Full,
            1 => Self::HighHalf,
            2 => Self::LowHalf,
            3 => Self::HighByte,
            4 => Self::LowByte,
            _ => return None,
        })
    }

    /// Gets the numeric selector of the mask
    #[must_use]
    pub const fn selector(self) -> u8 {
        self as u8
    }

    /// Gets the acronym of the mask, or [`None`] for the full mask
    #[must_use]
    pub fn acronym(self) -> Option<&'static str> {
        MASKS.iter().find(|(_, m)| *m == self).map(|(a, _)| *a)
    }

    /// Gets the 32-bit bit pattern the mask selects
    #[must_use]
    pub const fn bit_pattern(self) -> u32 {
        match self {
            Self::Full => 0xFFFF_FFFF,
            Self::HighHalf => 0xFFFF_0000,
            Self::LowHalf => 0x0000_FFFF,
            Self::HighByte => 0xFF00_0000,
            Self::LowByte => 0x0000_00FF,
        }
    }
}

/// Status flags of the machine, injectable as constants through the
/// `@flag=NAME` argument form
///
/// The injection value of a flag is its bit within the status register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum Flag {
    Carry = 0,
    Zero = 1,
    Negative = 2,
    Overflow = 3,
    Parity = 4,
    Interrupt = 5,
}

/// Canonical upper-case spelling of each flag, paired with its variant
static FLAGS: &[(&str, Flag)] = &[
    ("CARRY", Flag::Carry),
    ("ZERO", Flag::Zero),
    ("NEGATIVE", Flag::Negative),
    ("OVERFLOW", Flag::Overflow),
    ("PARITY", Flag::Parity),
    ("INTERRUPT", Flag::Interrupt),
];

impl Flag {
    /// Finds the flag with the given name, case-sensitively but reporting
    /// case-insensitive near misses
    #[must_use]
    pub fn find(name: &str) -> NameMatch<Self> {
        lookup(name, FLAGS)
    }

    /// Gets the injection value of the flag
    #[must_use]
    pub const fn injection_value(self) -> u32 {
        1 << (self as u8)
    }

    /// Iterates over the canonical names of all flags
    pub fn names() -> impl Iterator<Item = &'static str> {
        FLAGS.iter().map(|(name, _)| *name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mnemonic_lookup() {
        assert_eq!(Mnemonic::find("LOAD"), NameMatch::Exact(Mnemonic::Load));
        assert_eq!(Mnemonic::find("load"), NameMatch::WrongCase(Mnemonic::Load));
        assert_eq!(Mnemonic::find("LoAd"), NameMatch::WrongCase(Mnemonic::Load));
        assert_eq!(Mnemonic::find("LODE"), NameMatch::<Mnemonic>::Unknown);
        assert_eq!(Mnemonic::from_code(10), Some(Mnemonic::Jump));
        assert_eq!(Mnemonic::from_code(200), None);
        assert_eq!(Mnemonic::Load.name(), "LOAD");
    }

    #[test]
    fn shapes() {
        assert_eq!(Mnemonic::Halt.shape().arg_count(), 0);
        assert_eq!(Mnemonic::Add.shape().register_count(), 3);
        assert_eq!(Mnemonic::Load.shape(), ArgShape::RegisterTriByte);
        assert_eq!(Mnemonic::Load.shape().value_width(), Some(3));
        assert_eq!(Mnemonic::Jump.shape().value_width(), Some(4));
        assert_eq!(Mnemonic::Copy.shape().value_width(), None);
        // The widest shape must fit in the fixed instruction width
        for name in Mnemonic::names() {
            let NameMatch::Exact(m) = Mnemonic::find(name) else {
                unreachable!("table names are canonical");
            };
            let width = 1 + m.shape().register_count() + m.shape().value_width().unwrap_or(0);
            assert!(width <= crate::bytes::INSTRUCTION_BYTE_COUNT, "{name}");
        }
    }

    #[test]
    fn register_lookup() {
        assert_eq!(Register::find("MONDAY"), NameMatch::Exact(Register::Monday));
        assert_eq!(
            Register::find("monday"),
            NameMatch::WrongCase(Register::Monday)
        );
        assert_eq!(Register::find("MOONDAY"), NameMatch::<Register>::Unknown);
        assert_eq!(Register::from_code(6), Some(Register::Sunday));
        assert_eq!(Register::from_code(7), None);
    }

    #[test]
    fn mask_lookup() {
        assert_eq!(
            RegisterMask::find("HH"),
            NameMatch::Exact(RegisterMask::HighHalf)
        );
        assert_eq!(
            RegisterMask::find("hh"),
            NameMatch::WrongCase(RegisterMask::HighHalf)
        );
        assert_eq!(RegisterMask::find("XX"), NameMatch::<RegisterMask>::Unknown);
        assert_eq!(RegisterMask::from_selector(2), Some(RegisterMask::LowHalf));
        assert_eq!(RegisterMask::from_selector(5), None);
        assert_eq!(RegisterMask::Full.acronym(), None);
        assert_eq!(RegisterMask::LowByte.acronym(), Some("LB"));
    }

    #[test]
    fn flag_values() {
        assert_eq!(Flag::find("CARRY"), NameMatch::Exact(Flag::Carry));
        assert_eq!(Flag::find("carry"), NameMatch::WrongCase(Flag::Carry));
        assert_eq!(Flag::Carry.injection_value(), 1);
        assert_eq!(Flag::Interrupt.injection_value(), 32);
    }
}
