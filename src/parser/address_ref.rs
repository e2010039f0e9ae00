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

//! Module containing the auto-address-reference parser
//!
//! Parses the `$...` argument forms into [`AutoAddressRef`] values. The
//! grammar has three mutually exclusive forms, tried in order: embedded
//! block (`$.label`), block (`$label` / `$obj:label`), and relative
//! (`$(here|post[+|-N])`). Invalid input preserves the literal text and
//! attaches the most specific diagnostic available

use num_bigint::BigUint;
use num_traits::ToPrimitive as _;
use regex::Regex;

use std::sync::LazyLock;

use crate::bytes::INSTRUCTION_BYTE_COUNT;
use crate::messages::{code, Reporter};
use crate::span::Span;

/// Anchor of a relative address reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefAnchor {
    /// The address of the referencing instruction itself
    Here,
    /// The start address of the referencing instruction's data part
    Post,
}

/// Parsed auto-address reference
///
/// The variant fully determines which fields are populated; resolution to a
/// concrete address happens in the global pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoAddressRef {
    /// Reference to a labeled block
    Block {
        /// Name of the target block
        block_name: String,
        /// Local alias of the imported object holding the block, for
        /// external references
        external_object: Option<String>,
        /// Whether the target is an embedded block of the current
        /// first-class block
        embedded: bool,
    },
    /// Reference relative to the referencing instruction
    Relative {
        /// Anchor the offset applies to
        anchor: RefAnchor,
        /// Signed byte offset, already multiplied by the instruction width
        offset: i64,
    },
    /// Unparseable reference, preserving the literal text
    Invalid(String),
}

static EMBEDDED: LazyLock<Regex> = crate::regex!(r"^\$\.([A-Za-z_][A-Za-z0-9_]*):?$");
static BLOCK: LazyLock<Regex> =
    crate::regex!(r"^\$([A-Za-z_][A-Za-z0-9_]*)(?::([A-Za-z_][A-Za-z0-9_]*))?$");
static RELATIVE: LazyLock<Regex> = crate::regex!(r"^\$\(([A-Za-z]+)(?:([+-])([0-9]+))?\)$");
// Loose form used only to pick the most specific diagnostic for bad input
static RELATIVE_LOOSE: LazyLock<Regex> = crate::regex!(r"^\$\(([A-Za-z]+)(.)(.*)\)$");

/// Largest accepted offset magnitude, in instruction units
const OFFSET_LIMIT: u64 = 1 << 32;

/// Parses an auto-address-ref argument
///
/// Never fails: unparseable input produces [`AutoAddressRef::Invalid`] along
/// with the most specific diagnostic for the failure
///
/// # Parameters
///
/// * `text`: full text of the argument, including the leading `$`
/// * `span`: location of the argument within the object's source
/// * `reporter`: diagnostics sink of the object
#[must_use]
pub fn parse(text: &str, span: Span, reporter: &mut Reporter) -> AutoAddressRef {
    if let Some(captures) = EMBEDDED.captures(text) {
        return AutoAddressRef::Block {
            block_name: captures[1].to_owned(),
            external_object: None,
            embedded: true,
        };
    }
    if let Some(captures) = BLOCK.captures(text) {
        // `$obj:label` names a block of an imported object, `$label` a local
        // one
        return match captures.get(2) {
            Some(label) => AutoAddressRef::Block {
                block_name: label.as_str().to_owned(),
                external_object: Some(captures[1].to_owned()),
                embedded: false,
            },
            None => AutoAddressRef::Block {
                block_name: captures[1].to_owned(),
                external_object: None,
                embedded: false,
            },
        };
    }
    if let Some(captures) = RELATIVE.captures(text) {
        let anchor = match &captures[1] {
            "here" => RefAnchor::Here,
            "post" => RefAnchor::Post,
            other => {
                reporter.report(
                    code::INVALID_REF_ANCHOR,
                    Some(span),
                    [format!("`{other}` is not a valid anchor, expected `here` or `post`")],
                );
                return AutoAddressRef::Invalid(text.to_owned());
            }
        };
        let offset = match (captures.get(2), captures.get(3)) {
            (Some(op), Some(magnitude)) => {
                let Some(magnitude) = parse_offset(magnitude.as_str()) else {
                    reporter.report(
                        code::OVERSIZED_REF_PARAMETER,
                        Some(span),
                        [format!("the offset magnitude must be below {OFFSET_LIMIT}")],
                    );
                    return AutoAddressRef::Invalid(text.to_owned());
                };
                let sign = if op.as_str() == "-" { -1 } else { 1 };
                // Offsets are stored pre-multiplied by the instruction width
                sign * magnitude * INSTRUCTION_BYTE_COUNT as i64
            }
            _ => 0,
        };
        return AutoAddressRef::Relative { anchor, offset };
    }
    // The reference is invalid. Match looser forms to find the most specific
    // diagnostic before giving up with the generic one
    if let Some(captures) = RELATIVE_LOOSE.captures(text) {
        if !matches!(&captures[1], "here" | "post") {
            reporter.report(
                code::INVALID_REF_ANCHOR,
                Some(span),
                [format!(
                    "`{}` is not a valid anchor, expected `here` or `post`",
                    &captures[1]
                )],
            );
        } else if !matches!(&captures[2], "+" | "-") {
            reporter.report(
                code::INVALID_REF_OPERATOR,
                Some(span),
                [format!(
                    "`{}` is not a valid offset operator, expected `+` or `-`",
                    &captures[2]
                )],
            );
        } else {
            reporter.report(
                code::INVALID_REF_PARAMETER,
                Some(span),
                [format!("`{}` is not an integer offset", &captures[3])],
            );
        }
    } else {
        reporter.report(code::INVALID_ADDRESS_REF, Some(span), []);
    }
    AutoAddressRef::Invalid(text.to_owned())
}

/// Parses an offset magnitude, rejecting values at or above the limit
fn parse_offset(digits: &str) -> Option<i64> {
    let magnitude = digits
        .parse::<BigUint>()
        .expect("the pattern only matches decimal digits");
    magnitude.to_u64().filter(|&m| m < OFFSET_LIMIT)?.to_i64()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::span::test::IntoSpan;

    fn parsed(text: &str) -> (AutoAddressRef, Vec<u32>) {
        let mut reporter = Reporter::new("obj", text);
        let result = parse(text, (0..text.len()).span(), &mut reporter);
        let codes = reporter.messages().iter().map(|m| m.code).collect();
        (result, codes)
    }

    fn block(name: &str, external: Option<&str>, embedded: bool) -> AutoAddressRef {
        AutoAddressRef::Block {
            block_name: name.to_owned(),
            external_object: external.map(str::to_owned),
            embedded,
        }
    }

    #[test]
    fn embedded_blocks() {
        assert_eq!(parsed("$.loop"), (block("loop", None, true), vec![]));
        assert_eq!(parsed("$.loop:"), (block("loop", None, true), vec![]));
    }

    #[test]
    fn blocks() {
        assert_eq!(parsed("$main"), (block("main", None, false), vec![]));
        assert_eq!(
            parsed("$io:write"),
            (block("write", Some("io"), false), vec![])
        );
    }

    #[test]
    fn relative() {
        let relative = |anchor, offset| AutoAddressRef::Relative { anchor, offset };
        assert_eq!(parsed("$(here)"), (relative(RefAnchor::Here, 0), vec![]));
        assert_eq!(
            parsed("$(here+3)"),
            (relative(RefAnchor::Here, 3 * INSTRUCTION_BYTE_COUNT as i64), vec![])
        );
        assert_eq!(
            parsed("$(post-2)"),
            (relative(RefAnchor::Post, -2 * INSTRUCTION_BYTE_COUNT as i64), vec![])
        );
        assert_eq!(parsed("$(post)"), (relative(RefAnchor::Post, 0), vec![]));
    }

    #[test]
    fn invalid_anchor() {
        let invalid = |text: &str| AutoAddressRef::Invalid(text.to_owned());
        assert_eq!(
            parsed("$(there+1)"),
            (invalid("$(there+1)"), vec![code::INVALID_REF_ANCHOR])
        );
        assert_eq!(
            parsed("$(nowhere)"),
            (invalid("$(nowhere)"), vec![code::INVALID_REF_ANCHOR])
        );
    }

    #[test]
    fn invalid_operator_and_parameter() {
        let invalid = |text: &str| AutoAddressRef::Invalid(text.to_owned());
        assert_eq!(
            parsed("$(here*3)"),
            (invalid("$(here*3)"), vec![code::INVALID_REF_OPERATOR])
        );
        assert_eq!(
            parsed("$(here+x)"),
            (invalid("$(here+x)"), vec![code::INVALID_REF_PARAMETER])
        );
    }

    #[test]
    fn oversized_parameter() {
        // 2^32 is the first rejected magnitude
        let (result, codes) = parsed("$(here+4294967296)");
        assert_eq!(result, AutoAddressRef::Invalid("$(here+4294967296)".into()));
        assert_eq!(codes, vec![code::OVERSIZED_REF_PARAMETER]);
        // One below the limit is fine
        let (result, _) = parsed("$(here+4294967295)");
        assert_eq!(
            result,
            AutoAddressRef::Relative {
                anchor: RefAnchor::Here,
                offset: 4_294_967_295 * INSTRUCTION_BYTE_COUNT as i64,
            }
        );
    }

    #[test]
    fn generic_invalid() {
        assert_eq!(
            parsed("$()"),
            (
                AutoAddressRef::Invalid("$()".into()),
                vec![code::INVALID_ADDRESS_REF]
            )
        );
        assert_eq!(
            parsed("$5x"),
            (
                AutoAddressRef::Invalid("$5x".into()),
                vec![code::INVALID_ADDRESS_REF]
            )
        );
    }
}
