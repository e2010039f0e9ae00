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

//! Module containing the stage 3 semantic resolver
//!
//! Converts each tentative argument span into a typed [`ArgUnit`]. The unit
//! is a genuine sum type: exactly one payload exists per argument, selected
//! by the variant, so a kind mismatch downstream is a pattern-match case and
//! not a runtime accessor error

use num_bigint::BigUint;
use num_traits::ToPrimitive as _;
use regex::Regex;

use std::sync::LazyLock;

use crate::bytes::encode_real;
use crate::error_rendering::{did_you_mean, ArgCount};
use crate::machine::{Flag, Mnemonic, NameMatch, Register, RegisterMask};
use crate::messages::{code, Reporter};
use crate::parser::address_ref::{self, AutoAddressRef};
use crate::parser::argument::{ArgKind, ArgSpan};
use crate::parser::line::S2InstructionLine;
use crate::span::{Span, Spanned};

/// Validated register reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterRef {
    /// Referenced register
    pub register: Register,
    /// Part of the register the instruction operates on
    pub mask: RegisterMask,
}

impl RegisterRef {
    /// Encodes the reference as a register argument byte: mask selector in
    /// the high 3 bits, register code in the low 5
    #[must_use]
    pub const fn encode(self) -> u8 {
        (self.mask.selector() << 5) | self.register.code()
    }

    /// Decodes a register argument byte
    #[must_use]
    pub fn decode(byte: u8) -> Option<Self> {
        Some(Self {
            register: Register::from_code(byte & 0x1F)?,
            mask: RegisterMask::from_selector(byte >> 5)?,
        })
    }
}

impl std::fmt::Display for RegisterRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.mask.acronym() {
            Some(acronym) => write!(f, "[{}.{acronym}]", self.register),
            None => write!(f, "[{}]", self.register),
        }
    }
}

/// Typed argument unit produced by the semantic stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgUnit {
    /// Validated register reference
    Register(RegisterRef),
    /// Bounded inline numeric value
    Inline(u32),
    /// Injected constant value
    Injector(u32),
    /// Parsed auto-address reference, resolved in the global pass
    AddressRef(AutoAddressRef),
    /// Alias reference, resolved in the global pass
    Alias(String),
    /// Argument that couldn't be resolved, preserving its text
    Invalid(String),
}

/// Instruction with semantically resolved arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Instruction {
    /// 0-based index of the source line
    pub line_index: usize,
    /// Mnemonic of the instruction
    pub mnemonic: Spanned<Mnemonic>,
    /// Typed arguments, in source order
    pub args: Vec<Spanned<ArgUnit>>,
}

/// Symbols declared by the object's own directives, used to validate alias
/// references locally before the global pass resolves them
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSymbols<'a> {
    /// `?define` symbols: name and value
    pub defines: &'a [(String, u32)],
    /// `?import` directives: local alias and imported object name
    pub imports: &'a [(String, String)],
}

impl LocalSymbols<'_> {
    /// Checks whether a name is declared by a define or an import
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.defines.iter().any(|(n, _)| n == name)
            || self.imports.iter().any(|(alias, _)| alias == name)
    }
}

/// Options of the semantic stage
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// Demote oversized inline values to warnings instead of failing the
    /// build
    pub treat_oversized_inline_values_as_warnings: bool,
}

static REGISTER_REF: LazyLock<Regex> = crate::regex!(r"^\[([A-Za-z]+)(?:\.([A-Za-z0-9]+))?\]$");
// Loose form used to extract the name and mask parts from invalid refs so
// the diagnostic can point at the failing axis
static REGISTER_REF_LOOSE: LazyLock<Regex> =
    crate::regex!(r"^\[([^\s\].]*)(?:\.([^\s\]]*))?\]?$");
static NUMERIC: LazyLock<Regex> = crate::regex!(r"^[0-9]+$");

/// First value too large for an inline argument
const VALUE_LIMIT: u64 = 1 << 32;

/// Resolves a stage 2 instruction line into typed units, checking the
/// argument list against the mnemonic's shape
///
/// # Parameters
///
/// * `line`: classified instruction line
/// * `symbols`: the object's own defines and imports
/// * `options`: semantic stage options
/// * `reporter`: diagnostics sink of the object
#[must_use]
pub fn resolve_line(
    line: &S2InstructionLine,
    symbols: LocalSymbols,
    options: ResolveOptions,
    reporter: &mut Reporter,
) -> S3Instruction {
    let args = line
        .args
        .iter()
        .map(|arg| (resolve_arg(arg, symbols, options, reporter), arg.span))
        .collect::<Vec<_>>();
    check_shape(line.mnemonic, &args, reporter);
    S3Instruction {
        line_index: line.line_index,
        mnemonic: line.mnemonic,
        args,
    }
}

/// Resolves one argument span according to its tentative kind
fn resolve_arg(
    arg: &ArgSpan,
    symbols: LocalSymbols,
    options: ResolveOptions,
    reporter: &mut Reporter,
) -> ArgUnit {
    match arg.kind {
        ArgKind::RegisterRef => register_ref(&arg.text, arg.span, reporter)
            .map_or_else(|| ArgUnit::Invalid(arg.text.clone()), ArgUnit::Register),
        ArgKind::InlineValue => inline(&arg.text, arg.span, options, reporter)
            .map_or_else(|| ArgUnit::Invalid(arg.text.clone()), ArgUnit::Inline),
        ArgKind::ConstantInjector => injector(&arg.text, arg.span, reporter)
            .map_or_else(|| ArgUnit::Invalid(arg.text.clone()), ArgUnit::Injector),
        ArgKind::AutoAddressRef => {
            ArgUnit::AddressRef(address_ref::parse(&arg.text, arg.span, reporter))
        }
        ArgKind::AliasRef => {
            let name = arg.text.trim_start_matches('#');
            if arg.is_valid && symbols.declares(name) {
                ArgUnit::Alias(name.to_owned())
            } else {
                let details = did_you_mean(
                    name,
                    symbols
                        .defines
                        .iter()
                        .map(|(n, _)| n.as_str())
                        .chain(symbols.imports.iter().map(|(a, _)| a.as_str())),
                );
                reporter.report(code::ALIAS_NOT_FOUND, Some(arg.span), details);
                ArgUnit::Invalid(arg.text.clone())
            }
        }
        // Unknown spans were already diagnosed by the classifier
        ArgKind::Unknown => ArgUnit::Invalid(arg.text.clone()),
    }
}

/// Parses a register reference, diagnosing the failing axis (name, named
/// mask, or numeric mask) separately
fn register_ref(text: &str, span: Span, reporter: &mut Reporter) -> Option<RegisterRef> {
    let captures = REGISTER_REF
        .captures(text)
        .or_else(|| REGISTER_REF_LOOSE.captures(text))?;
    let name = &captures[1];
    let register = match Register::find(name) {
        NameMatch::Exact(register) => register,
        NameMatch::WrongCase(register) => {
            reporter.report(
                code::REGISTER_BAD_CASING,
                Some(span),
                [format!("the canonical spelling is `{}`", register.name())],
            );
            register
        }
        NameMatch::Unknown => {
            let details = did_you_mean(name, Register::names());
            reporter.report(code::BAD_REGISTER_NAME, Some(span), details);
            return None;
        }
    };
    let mask = match captures.get(2) {
        None => RegisterMask::Full,
        Some(mask) if NUMERIC.is_match(mask.as_str()) => {
            let selector = mask.as_str().parse::<u8>().ok();
            match selector.and_then(RegisterMask::from_selector) {
                Some(mask) => mask,
                None => {
                    reporter.report(
                        code::BAD_NUMERIC_MASK,
                        Some(span),
                        [format!("`{}` is not a valid mask selector", mask.as_str())],
                    );
                    return None;
                }
            }
        }
        Some(mask) => match RegisterMask::find(mask.as_str()) {
            NameMatch::Exact(mask) => mask,
            NameMatch::WrongCase(mask) => {
                reporter.report(
                    code::BAD_NAMED_MASK,
                    Some(span),
                    [format!(
                        "mask acronyms are upper-case, the canonical spelling is `{}`",
                        mask.acronym().unwrap_or_default()
                    )],
                );
                mask
            }
            NameMatch::Unknown => {
                reporter.report(
                    code::BAD_NAMED_MASK,
                    Some(span),
                    [format!("`{}` is not a mask acronym", mask.as_str())],
                );
                return None;
            }
        },
    };
    Some(RegisterRef { register, mask })
}

/// Parses an inline numeric value, base 10 or `x`-prefixed base 16
///
/// Oversized values are truncated to 32 bits so a partial result exists
/// alongside the diagnostic
fn inline(
    text: &str,
    span: Span,
    options: ResolveOptions,
    reporter: &mut Reporter,
) -> Option<u32> {
    let (negative, digits, radix) = match text.strip_prefix('x') {
        Some(digits) => (false, digits, 16),
        None => match text.strip_prefix('-') {
            Some(digits) => (true, digits, 10),
            None => (false, text, 10),
        },
    };
    let Some(magnitude) = BigUint::parse_bytes(digits.as_bytes(), radix) else {
        reporter.report(
            code::NON_INTEGER_INLINE_VALUE,
            Some(span),
            [format!("`{text}` is not an integer")],
        );
        return None;
    };
    let oversized = magnitude.to_u64().is_none_or(|m| m >= VALUE_LIMIT);
    if oversized {
        let details = [format!("inline values must be below {VALUE_LIMIT}")];
        if options.treat_oversized_inline_values_as_warnings {
            reporter.report_demoted(code::OVERSIZED_INLINE_VALUE, Some(span), details);
        } else {
            reporter.report(code::OVERSIZED_INLINE_VALUE, Some(span), details);
        }
    }
    // Keep the low 32 bits of the magnitude, negated for negative literals
    let low = (&magnitude % VALUE_LIMIT)
        .to_u64()
        .expect("the remainder fits in 64 bits") as u32;
    Some(if negative { low.wrapping_neg() } else { low })
}

/// Parses a constant injector (`@flag=NAME`, `@vec=N`, `@float=X`) into its
/// injection value
fn injector(text: &str, span: Span, reporter: &mut Reporter) -> Option<u32> {
    let body = &text[1..];
    let Some((key, value)) = body.split_once('=') else {
        if body.chars().all(|c| c.is_ascii_alphabetic()) && !body.is_empty() {
            reporter.report(
                code::MISSING_INJECTOR_VALUE,
                Some(span),
                [format!("`@{body}` is missing its `=value` part")],
            );
        } else {
            reporter.report(code::UNKNOWN_INJECTOR_KEY, Some(span), []);
        }
        return None;
    };
    match key {
        "flag" => match Flag::find(value) {
            NameMatch::Exact(flag) => Some(flag.injection_value()),
            NameMatch::WrongCase(flag) => {
                reporter.report(
                    code::FLAG_BAD_CASING,
                    Some(span),
                    [format!("flag names are upper-case: `{value}`")],
                );
                Some(flag.injection_value())
            }
            NameMatch::Unknown => {
                let details = did_you_mean(value, Flag::names());
                reporter.report(code::UNKNOWN_FLAG, Some(span), details);
                None
            }
        },
        "vec" => {
            let Ok(value) = value.parse::<i64>() else {
                reporter.report(
                    code::NON_INTEGER_INLINE_VALUE,
                    Some(span),
                    [format!("`{value}` is not an integer vector number")],
                );
                return None;
            };
            if i32::try_from(value).is_err() {
                reporter.report(
                    code::OVERSIZED_INLINE_VALUE,
                    Some(span),
                    ["vector numbers are signed 32-bit integers".to_owned()],
                );
                return None;
            }
            // The vector transform: 0x8000_0000 + |value + 1|. The +1 offset
            // maps the most negative representable value onto the table
            // correctly
            Some(0x8000_0000u32.wrapping_add((value + 1).unsigned_abs() as u32))
        }
        "float" => match value.parse::<f64>() {
            Ok(value) => Some(encode_real(value).value()),
            Err(_) => {
                reporter.report(
                    code::NON_INTEGER_INLINE_VALUE,
                    Some(span),
                    [format!("`{value}` is not a real number")],
                );
                None
            }
        },
        _ => {
            reporter.report(
                code::UNKNOWN_INJECTOR_KEY,
                Some(span),
                [format!("`{key}` is not one of `flag`, `vec`, or `float`")],
            );
            None
        }
    }
}

/// Checks the resolved argument list against the mnemonic's shape
fn check_shape(
    mnemonic: Spanned<Mnemonic>,
    args: &[Spanned<ArgUnit>],
    reporter: &mut Reporter,
) {
    let shape = mnemonic.0.shape();
    if args.len() != shape.arg_count() {
        reporter.report(
            code::ARGUMENT_SHAPE_MISMATCH,
            Some(mnemonic.1),
            [format!(
                "`{}` takes {}, found {}",
                mnemonic.0,
                ArgCount(shape.arg_count()),
                ArgCount(args.len())
            )],
        );
        return;
    }
    for (i, (arg, span)) in args.iter().enumerate() {
        // Already-diagnosed arguments don't get a second, vaguer message
        if matches!(arg, ArgUnit::Invalid(_)) {
            continue;
        }
        let is_register = matches!(arg, ArgUnit::Register(_));
        let wants_register = i < shape.register_count();
        if is_register != wants_register {
            let expected = if wants_register {
                "a register reference"
            } else {
                "a value"
            };
            reporter.report(
                code::ARGUMENT_SHAPE_MISMATCH,
                Some(*span),
                [format!("`{}` expects {expected} here", mnemonic.0)],
            );
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::line;
    use crate::parser::tokenizer::tokenize;
    use crate::span::ObjectIndex;

    fn resolve(src: &str) -> (Vec<ArgUnit>, Vec<u32>) {
        resolve_with(src, LocalSymbols::default(), ResolveOptions::default())
    }

    fn resolve_with(
        src: &str,
        symbols: LocalSymbols,
        options: ResolveOptions,
    ) -> (Vec<ArgUnit>, Vec<u32>) {
        let tokens = tokenize(src, ObjectIndex::FIRST);
        let mut reporter = Reporter::new("obj", src);
        let line = line::instruction_line(src, 0, &tokens, &mut reporter)
            .expect("the test line should have a valid mnemonic");
        let instruction = resolve_line(&line, symbols, options, &mut reporter);
        let args = instruction.args.into_iter().map(|(arg, _)| arg).collect();
        let codes = reporter.messages().iter().map(|m| m.code).collect();
        (args, codes)
    }

    #[test]
    fn register_refs() {
        let reference = |register, mask| ArgUnit::Register(RegisterRef { register, mask });
        assert_eq!(
            resolve("COPY [MONDAY] [SUNDAY.LB]"),
            (
                vec![
                    reference(Register::Monday, RegisterMask::Full),
                    reference(Register::Sunday, RegisterMask::LowByte),
                ],
                vec![]
            )
        );
        assert_eq!(
            resolve("COPY [MONDAY.2] [TUESDAY]"),
            (
                vec![
                    reference(Register::Monday, RegisterMask::LowHalf),
                    reference(Register::Tuesday, RegisterMask::Full),
                ],
                vec![]
            )
        );
    }

    #[test]
    fn register_diagnostics_per_axis() {
        let (args, codes) = resolve("PUSH [MONDY]");
        assert_eq!(args, vec![ArgUnit::Invalid("[MONDY]".into())]);
        assert_eq!(codes, vec![code::BAD_REGISTER_NAME]);

        let (args, codes) = resolve("PUSH [MONDAY.XX]");
        assert_eq!(args, vec![ArgUnit::Invalid("[MONDAY.XX]".into())]);
        assert_eq!(codes, vec![code::BAD_NAMED_MASK]);

        let (args, codes) = resolve("PUSH [MONDAY.9]");
        assert_eq!(args, vec![ArgUnit::Invalid("[MONDAY.9]".into())]);
        assert_eq!(codes, vec![code::BAD_NUMERIC_MASK]);

        let (args, codes) = resolve("PUSH [monday]");
        assert_eq!(
            args,
            vec![ArgUnit::Register(RegisterRef {
                register: Register::Monday,
                mask: RegisterMask::Full,
            })]
        );
        assert_eq!(codes, vec![code::REGISTER_BAD_CASING]);
    }

    #[test]
    fn inline_values() {
        assert_eq!(resolve("JUMP 5"), (vec![ArgUnit::Inline(5)], vec![]));
        assert_eq!(
            resolve("JUMP x1F"),
            (vec![ArgUnit::Inline(0x1F)], vec![])
        );
        assert_eq!(
            resolve("JUMP -1"),
            (vec![ArgUnit::Inline(u32::MAX)], vec![])
        );
    }

    #[test]
    fn oversized_inline_value() {
        // 2^32 is the first rejected value, kept truncated for partial output
        let (args, codes) = resolve("JUMP 4294967296");
        assert_eq!(args, vec![ArgUnit::Inline(0)]);
        assert_eq!(codes, vec![code::OVERSIZED_INLINE_VALUE]);

        let (args, codes) = resolve("JUMP 4294967295");
        assert_eq!(args, vec![ArgUnit::Inline(u32::MAX)]);
        assert_eq!(codes, vec![]);
    }

    #[test]
    fn oversized_demotion() {
        let options = ResolveOptions {
            treat_oversized_inline_values_as_warnings: true,
        };
        let src = "JUMP 4294967296";
        let tokens = tokenize(src, ObjectIndex::FIRST);
        let mut reporter = Reporter::new("obj", src);
        let line = line::instruction_line(src, 0, &tokens, &mut reporter).expect("valid mnemonic");
        resolve_line(&line, LocalSymbols::default(), options, &mut reporter);
        assert!(reporter.succeeded());
        assert_eq!(reporter.messages()[0].code, code::OVERSIZED_INLINE_VALUE);
    }

    #[test]
    fn injectors() {
        assert_eq!(
            resolve("JUMP @flag=CARRY"),
            (vec![ArgUnit::Injector(1)], vec![])
        );
        assert_eq!(
            resolve("JUMP @flag=INTERRUPT"),
            (vec![ArgUnit::Injector(32)], vec![])
        );
        // The vector transform, including the +1 offset
        assert_eq!(
            resolve("JUMP @vec=-1"),
            (vec![ArgUnit::Injector(0x8000_0000)], vec![])
        );
        assert_eq!(
            resolve("JUMP @vec=5"),
            (vec![ArgUnit::Injector(0x8000_0006)], vec![])
        );
        assert_eq!(
            resolve("JUMP @float=1.0"),
            (vec![ArgUnit::Injector(0x3F80_0000)], vec![])
        );
    }

    #[test]
    fn injector_diagnostics() {
        let (_, codes) = resolve("JUMP @vec");
        assert_eq!(codes, vec![code::MISSING_INJECTOR_VALUE]);
        let (_, codes) = resolve("JUMP @word=5");
        assert_eq!(codes, vec![code::UNKNOWN_INJECTOR_KEY]);
        let (_, codes) = resolve("JUMP @flag=SPARKLE");
        assert_eq!(codes, vec![code::UNKNOWN_FLAG]);
        let (_, codes) = resolve("JUMP @flag=carry");
        assert_eq!(codes, vec![code::FLAG_BAD_CASING]);
        let (_, codes) = resolve("JUMP @vec=many");
        assert_eq!(codes, vec![code::NON_INTEGER_INLINE_VALUE]);
    }

    #[test]
    fn aliases() {
        let defines = [("LIMIT".to_owned(), 400)];
        let imports = [("io".to_owned(), "iolib".to_owned())];
        let symbols = LocalSymbols {
            defines: &defines,
            imports: &imports,
        };
        let (args, codes) = resolve_with("JUMP #LIMIT", symbols, ResolveOptions::default());
        assert_eq!(args, vec![ArgUnit::Alias("LIMIT".into())]);
        assert_eq!(codes, vec![]);

        let (args, codes) = resolve_with("JUMP #io", symbols, ResolveOptions::default());
        assert_eq!(args, vec![ArgUnit::Alias("io".into())]);
        assert_eq!(codes, vec![]);

        let (args, codes) = resolve_with("JUMP #LIMTI", symbols, ResolveOptions::default());
        assert_eq!(args, vec![ArgUnit::Invalid("#LIMTI".into())]);
        assert_eq!(codes, vec![code::ALIAS_NOT_FOUND]);
    }

    #[test]
    fn shape_mismatches() {
        let (_, codes) = resolve("NOOP 5");
        assert_eq!(codes, vec![code::ARGUMENT_SHAPE_MISMATCH]);
        let (_, codes) = resolve("COPY [MONDAY]");
        assert_eq!(codes, vec![code::ARGUMENT_SHAPE_MISMATCH]);
        // A value where a register is expected
        let (_, codes) = resolve("COPY 5 [MONDAY]");
        assert_eq!(codes, vec![code::ARGUMENT_SHAPE_MISMATCH]);
        // A register where the value is expected
        let (_, codes) = resolve("JUMP [MONDAY]");
        assert_eq!(codes, vec![code::ARGUMENT_SHAPE_MISMATCH]);
    }

    #[test]
    fn address_refs_delegate() {
        let (args, codes) = resolve("JUMP $main");
        assert_eq!(
            args,
            vec![ArgUnit::AddressRef(AutoAddressRef::Block {
                block_name: "main".into(),
                external_object: None,
                embedded: false,
            })]
        );
        assert_eq!(codes, vec![]);

        let (args, codes) = resolve("JUMP $(there+1)");
        assert_eq!(
            args,
            vec![ArgUnit::AddressRef(AutoAddressRef::Invalid(
                "$(there+1)".into()
            ))]
        );
        assert_eq!(codes, vec![code::INVALID_REF_ANCHOR]);
    }
}
