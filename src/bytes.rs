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

//! Module containing the fixed-width byte-sequence family used by the
//! instruction encoding
//!
//! Arithmetic on these types always wraps at the type's width. The widths are
//! a wire contract: every instruction occupies exactly
//! [`INSTRUCTION_BYTE_COUNT`] bytes, and multi-byte argument values are
//! serialized little-endian

use num_bigint::BigUint;
use num_traits::ToPrimitive as _;

/// Amount of bytes every encoded instruction occupies: 1 mnemonic byte plus
/// up to 4 argument bytes, zero-padded
pub const INSTRUCTION_BYTE_COUNT: usize = 5;

/// Declares a fixed-width unsigned integer newtype with wraparound-safe
/// arithmetic and a little-endian byte projection
macro_rules! byte_width {
    ($(#[$doc:meta])* $name:ident, $bytes:literal, $max:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
        pub struct $name(u32);

        impl $name {
            /// Amount of bytes of the type
            pub const BYTES: usize = $bytes;
            /// Largest representable value
            pub const MAX: Self = Self($max);

            /// Creates a new value, wrapping at the type's width
            #[must_use]
            pub const fn new(value: u32) -> Self {
                Self(value & $max)
            }

            /// Gets the numeric value
            #[must_use]
            pub const fn value(self) -> u32 {
                self.0
            }

            /// Adds two values, wrapping at the type's width
            #[must_use]
            pub const fn wrapping_add(self, rhs: Self) -> Self {
                Self::new(self.0.wrapping_add(rhs.0))
            }

            /// Subtracts two values, wrapping at the type's width
            #[must_use]
            pub const fn wrapping_sub(self, rhs: Self) -> Self {
                Self::new(self.0.wrapping_sub(rhs.0))
            }

            /// Adds a signed offset, wrapping at the type's width
            #[must_use]
            pub const fn wrapping_offset(self, offset: i64) -> Self {
                Self::new((self.0 as i64).wrapping_add(offset) as u32)
            }

            /// Serializes the value as little-endian bytes
            #[must_use]
            pub fn to_le_bytes(self) -> [u8; $bytes] {
                let le = self.0.to_le_bytes();
                let mut out = [0; $bytes];
                out.copy_from_slice(&le[..$bytes]);
                out
            }

            /// Deserializes a value from little-endian bytes
            #[must_use]
            pub fn from_le_bytes(bytes: [u8; $bytes]) -> Self {
                let mut le = [0; 4];
                le[..$bytes].copy_from_slice(&bytes);
                Self::new(u32::from_le_bytes(le))
            }
        }

        impl TryFrom<&BigUint> for $name {
            type Error = Oversized;

            fn try_from(value: &BigUint) -> Result<Self, Self::Error> {
                match value.to_u32() {
                    Some(x) if x <= $max => Ok(Self(x)),
                    _ => Err(Oversized {
                        width: $bytes,
                        max: $max,
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

byte_width!(
    /// Single byte value
    Byte, 1, 0xFF
);
byte_width!(
    /// Two byte value
    DoubleByte, 2, 0xFFFF
);
byte_width!(
    /// Three byte value
    TriByte, 3, 0xFF_FFFF
);
byte_width!(
    /// Four byte value, the widest argument width of the machine
    QuadByte, 4, 0xFFFF_FFFF
);

/// Error produced when a value doesn't fit in a fixed byte width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Oversized {
    /// Width of the target type in bytes
    pub width: usize,
    /// Largest value the target type can hold
    pub max: u32,
}

/// Encodes a real number as the machine's 4-byte real representation
///
/// The machine uses IEEE-754 single precision bit patterns; wider inputs are
/// truncated to single precision first
#[must_use]
pub fn encode_real(value: f64) -> QuadByte {
    // We intentionally want to truncate to the machine's single precision
    #[allow(clippy::cast_possible_truncation)]
    QuadByte::new((value as f32).to_bits())
}
