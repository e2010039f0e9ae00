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

//! Module containing the stage 2 argument matcher
//!
//! Segments the post-mnemonic text of an instruction line into argument
//! spans, assigning each a tentative kind via a longest-valid-match-from-start
//! scan over per-kind pattern sets. The selection rule is load-bearing for
//! diagnostics: any valid match beats every invalid one, the longest valid
//! match wins, and invalid matches are only used as a last resort so that the
//! later stages can attach a useful diagnostic to the failed kind

use regex::Regex;

use std::sync::LazyLock;

use crate::seq;
use crate::span::{ObjectIndex, Span, Spanned};

/// Tentative kind assigned to an argument span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// Bracketed register reference (`[MONDAY]`, `[MONDAY.HH]`)
    RegisterRef,
    /// Auto-address reference (`$label`, `$obj:label`, `$.label`, `$(here+N)`)
    AutoAddressRef,
    /// Alias reference (`#name`)
    AliasRef,
    /// Constant injector (`@key=value`)
    ConstantInjector,
    /// Inline numeric value (`5`, `-3`, `x1F`)
    InlineValue,
    /// Text that didn't match any kind
    Unknown,
}

/// Confidence of a pattern case. At equal match length a strong case beats a
/// weak one
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Certainty {
    Weak,
    Strong,
}

/// One pattern case of a kind's case list
struct MatchCase {
    /// Full-anchored pattern the prefix must match
    regex: &'static LazyLock<Regex>,
    /// Whether a match of this case is a well-formed argument of the kind
    is_valid: bool,
    /// Confidence of the case
    certainty: Certainty,
}

static REGISTER_VALID: LazyLock<Regex> =
    crate::regex!(r"^\[[A-Za-z]+(?:\.[A-Za-z0-9]+)?\]$");
static REGISTER_INVALID: LazyLock<Regex> = crate::regex!(r"^\[[^\s\]]*\]?$");
static REF_NAMED_VALID: LazyLock<Regex> =
    crate::regex!(r"^\$\.?[A-Za-z_][A-Za-z0-9_]*(?::(?:[A-Za-z_][A-Za-z0-9_]*)?)?$");
static REF_RELATIVE_VALID: LazyLock<Regex> = crate::regex!(r"^\$\([A-Za-z]+(?:[+-][0-9]+)?\)$");
static REF_RELATIVE_INVALID: LazyLock<Regex> = crate::regex!(r"^\$\([^\s)]*\)?$");
static REF_INVALID: LazyLock<Regex> = crate::regex!(r"^\$[^\s]*$");
static ALIAS_VALID: LazyLock<Regex> = crate::regex!(r"^#[A-Za-z_][A-Za-z0-9_]*$");
static ALIAS_INVALID: LazyLock<Regex> = crate::regex!(r"^#[^\s]*$");
static INJECTOR_VALID: LazyLock<Regex> = crate::regex!(r"^@[A-Za-z]+=[^\s]+$");
static INJECTOR_NO_VALUE: LazyLock<Regex> = crate::regex!(r"^@[A-Za-z]+$");
static INJECTOR_INVALID: LazyLock<Regex> = crate::regex!(r"^@[^\s]*$");
static INLINE_DECIMAL: LazyLock<Regex> = crate::regex!(r"^-?[0-9]+$");
static INLINE_HEX: LazyLock<Regex> = crate::regex!(r"^x[0-9A-Fa-f]+$");

/// Shorthand for case list entries
const fn case(
    regex: &'static LazyLock<Regex>,
    is_valid: bool,
    certainty: Certainty,
) -> MatchCase {
    MatchCase {
        regex,
        is_valid,
        certainty,
    }
}

/// Per-kind case lists, in the fixed kind priority order. Both the kind order
/// and the case order within each kind are part of the matching contract
static KIND_CASES: &[(ArgKind, &[MatchCase])] = &[
    (
        ArgKind::RegisterRef,
        &[
            case(&REGISTER_VALID, true, Certainty::Strong),
            case(&REGISTER_INVALID, false, Certainty::Weak),
        ],
    ),
    (
        ArgKind::AutoAddressRef,
        &[
            case(&REF_NAMED_VALID, true, Certainty::Strong),
            case(&REF_RELATIVE_VALID, true, Certainty::Strong),
            case(&REF_RELATIVE_INVALID, false, Certainty::Weak),
            case(&REF_INVALID, false, Certainty::Weak),
        ],
    ),
    (
        ArgKind::AliasRef,
        &[
            case(&ALIAS_VALID, true, Certainty::Strong),
            case(&ALIAS_INVALID, false, Certainty::Weak),
        ],
    ),
    (
        ArgKind::ConstantInjector,
        &[
            case(&INJECTOR_VALID, true, Certainty::Strong),
            // A keyless injector is structurally fine, the missing value is
            // diagnosed semantically
            case(&INJECTOR_NO_VALUE, true, Certainty::Weak),
            case(&INJECTOR_INVALID, false, Certainty::Weak),
        ],
    ),
    (
        ArgKind::InlineValue,
        &[
            case(&INLINE_DECIMAL, true, Certainty::Strong),
            case(&INLINE_HEX, true, Certainty::Strong),
        ],
    ),
];

/// Result of matching the start of the remaining text against all kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgMatch {
    /// Kind that matched
    pub kind: ArgKind,
    /// Length of the matched prefix in bytes
    pub len: usize,
    /// Whether the matched case was a valid one
    pub is_valid: bool,
    /// Confidence of the matched case
    pub certainty: Certainty,
}

/// Runs the longest-match-from-start scan of one kind's case list over the
/// text, returning the longest valid prefix match, or the longest invalid
/// one if no prefix is valid
fn kind_match(text: &str, cases: &[MatchCase]) -> Option<(usize, bool, Certainty)> {
    let mut invalid = None;
    // Walk candidate end positions from the end of the text backwards
    for end in text
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .rev()
    {
        let prefix = &text[..end];
        // The first case that matches decides the prefix's validity
        if let Some(case) = cases.iter().find(|case| case.regex.is_match(prefix)) {
            if case.is_valid {
                return Some((end, true, case.certainty));
            }
            if invalid.is_none() {
                invalid = Some((end, false, case.certainty));
            }
        }
    }
    invalid
}

/// Matches the start of the remaining post-mnemonic text against every kind
///
/// Selection across kinds: any valid match beats all invalid ones, longer
/// beats shorter, strong beats weak, and the kind priority order
/// (register ref, address ref, alias ref, injector, inline value) breaks the
/// remaining ties. With no match at all an [`ArgKind::Unknown`] span is
/// produced, consuming text until a recognizable argument resumes
#[must_use]
pub fn match_argument(text: &str) -> ArgMatch {
    let candidates = KIND_CASES.iter().filter_map(|&(kind, cases)| {
        kind_match(text, cases).map(|(len, is_valid, certainty)| ArgMatch {
            kind,
            len,
            is_valid,
            certainty,
        })
    });
    seq::max_by_key_first(candidates, |m| (m.is_valid, m.len, m.certainty)).unwrap_or_else(|| {
        // Nothing matched: consume until whitespace or the start marker of
        // another argument
        let len = text
            .char_indices()
            .skip(1)
            .find(|&(_, c)| c.is_whitespace() || matches!(c, '[' | '$' | '#' | '@'))
            .map_or(text.len(), |(i, _)| i);
        ArgMatch {
            kind: ArgKind::Unknown,
            len,
            is_valid: false,
            certainty: Certainty::Weak,
        }
    })
}

/// Argument span produced by segmentation, carrying its tentative kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpan {
    /// Tentative kind of the argument
    pub kind: ArgKind,
    /// Whether the span matched a valid case of its kind
    pub is_valid: bool,
    /// Matched text
    pub text: String,
    /// Location of the span within the object's source
    pub span: Span,
}

/// Segments the post-mnemonic text of an instruction line into argument spans
///
/// # Parameters
///
/// * `text`: text after the mnemonic, up to the end of the line
/// * `offset`: absolute offset of `text` within the object's source
/// * `context`: index of the object within the build
#[must_use]
pub fn segment(text: &str, offset: usize, context: ObjectIndex) -> Vec<ArgSpan> {
    let mut args = Vec::new();
    let mut pos = 0;
    while pos < text.len() {
        let rest = &text[pos..];
        // Skip the whitespace between arguments
        let Some(start) = rest.find(|c: char| !c.is_whitespace()) else {
            break;
        };
        let rest = &rest[start..];
        pos += start;
        let matched = match_argument(rest);
        args.push(ArgSpan {
            kind: matched.kind,
            is_valid: matched.is_valid,
            text: rest[..matched.len].to_owned(),
            span: Span {
                context,
                start: offset + pos,
                end: offset + pos + matched.len,
            },
        });
        pos += matched.len;
    }
    args
}

/// Convenience projection of an [`ArgSpan`] list used by tests and callers
/// that only care about the classification
#[must_use]
pub fn kinds(args: &[ArgSpan]) -> Vec<Spanned<ArgKind>> {
    args.iter().map(|arg| (arg.kind, arg.span)).collect()
}
