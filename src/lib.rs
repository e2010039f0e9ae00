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

#![doc = include_str!("../README.md")]
//! # Example
//!
//! Example usage of the assembler from Rust:
//!
//! ```
//! use almanac_asm::prelude::*;
//!
//! let code = "
//! main:
//!   LOAD [MONDAY.HH] 5
//! .loop:
//!   ADD [MONDAY] [TUESDAY] [WEDNESDAY]
//!   JUMP $.loop
//! ";
//!
//! let assembly = assembler::build(&[("main", code)], &BuildOptions::default());
//! for message in &assembly.messages {
//!     eprintln!("{message}");
//! }
//! assert!(assembly.build_succeeded);
//! assert_eq!(assembly.total_byte_count, 15);
//! ```

pub mod assembler;
pub mod bytes;
pub mod compiler;
pub mod disassembler;
mod error_rendering;
pub mod machine;
pub mod messages;
pub mod parser;
mod seq;
pub mod span;

/// Module containing the default exports
pub mod prelude {
    pub use crate::assembler::{self, Assembly, BuildOptions};
    pub use crate::compiler::{self, EntryPoint, OutputFormat};
    pub use crate::disassembler;
    pub use crate::error_rendering::RenderError;
    pub use crate::parser;
}

/// Builds a new lazily-initialized regex with a given literal string
///
/// # Panics
///
/// Panics if the literal string isn't a valid regex
macro_rules! build_regex {
    ($re:expr) => {
        LazyLock::new(|| Regex::new($re).expect("All regexes should compile"))
    };
}
use build_regex as regex;
