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

//! Module containing the stage 2 structural line classifier
//!
//! Decides per line whether it is a label, instruction, directive, comment,
//! or blank line, and splits instruction lines into mnemonic plus argument
//! spans. Lines that can't be classified are diagnosed and degrade to blank
//! so later stages still see a partial result

use regex::Regex;

use std::sync::LazyLock;

use crate::error_rendering::did_you_mean;
use crate::machine::{Mnemonic, NameMatch};
use crate::messages::{code, Reporter};
use crate::parser::argument::{self, ArgKind, ArgSpan};
use crate::parser::tokenizer::Token;
use crate::span::{Span, Spanned};

/// Structural classification of one source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum S2Line {
    /// Line with no tokens
    Blank,
    /// Line whose first token starts a comment
    Comment,
    /// Label declaration line
    Label(S2Label),
    /// Directive line
    Directive(S2Directive),
    /// Instruction line
    Instruction(S2InstructionLine),
}

/// Label declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S2Label {
    /// Name of the label, without the trailing `:` or the embedding `.`
    pub name: String,
    /// Whether the label declares an embedded block (`.name:`)
    pub embedded: bool,
    /// Location of the declaration
    pub span: Span,
}

/// Directive line, following the `?command receiver[=parameter]` grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S2Directive {
    /// Command of the directive, without the leading `?`
    pub command: String,
    /// Receiver of the directive
    pub receiver: String,
    /// Free-text parameter after the first unescaped `=`, if present
    pub parameter: Option<String>,
    /// Location of the whole directive
    pub span: Span,
}

/// Instruction line: validated mnemonic plus tentative argument spans
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S2InstructionLine {
    /// 0-based index of the source line
    pub line_index: usize,
    /// Mnemonic of the instruction
    pub mnemonic: Spanned<Mnemonic>,
    /// Argument spans after the mnemonic, in source order
    pub args: Vec<ArgSpan>,
}

static LABEL: LazyLock<Regex> = crate::regex!(r"^(\.?)([A-Za-z_][A-Za-z0-9_]*):$");
static LABEL_FORMAT: LazyLock<Regex> = crate::regex!(r"^[A-Za-z_][A-Za-z0-9_]*$");
static COMMAND: LazyLock<Regex> = crate::regex!(r"^\?[A-Za-z]+$");

/// Prefix marking the rest of a line as a comment
pub const COMMENT_PREFIX: &str = ";";

/// Classifies one source line from its tokens
///
/// # Parameters
///
/// * `src`: full source text of the object
/// * `line_index`: 0-based index of the line
/// * `tokens`: tokens belonging to the line, in source order
/// * `reporter`: diagnostics sink of the object
#[must_use]
pub fn classify_line(
    src: &str,
    line_index: usize,
    tokens: &[Token],
    reporter: &mut Reporter,
) -> S2Line {
    // Cut the line at the first comment token
    let cut = tokens
        .iter()
        .position(|t| t.text.starts_with(COMMENT_PREFIX));
    let commented = cut.is_some();
    let tokens = &tokens[..cut.unwrap_or(tokens.len())];
    let Some(first) = tokens.first() else {
        return if commented { S2Line::Comment } else { S2Line::Blank };
    };

    if first.text.starts_with('?') {
        return match directive(src, tokens, reporter) {
            Some(directive) => S2Line::Directive(directive),
            None => S2Line::Blank,
        };
    }

    if first.text.ends_with(':') {
        // Label lines must be a single well-formed label token
        if let (1, Some(captures)) = (tokens.len(), LABEL.captures(&first.text)) {
            return S2Line::Label(S2Label {
                name: captures[2].to_owned(),
                embedded: !captures[1].is_empty(),
                span: first.span,
            });
        }
        reporter.report(code::MALFORMED_LABEL, Some(line_span(tokens)), []);
        return S2Line::Blank;
    }

    match instruction_line(src, line_index, tokens, reporter) {
        Some(instruction) => S2Line::Instruction(instruction),
        None => S2Line::Blank,
    }
}

/// Parses a directive line, diagnosing grammar violations
fn directive(src: &str, tokens: &[Token], reporter: &mut Reporter) -> Option<S2Directive> {
    let span = line_span(tokens);
    let command = &tokens[0];
    if !COMMAND.is_match(&command.text) || tokens.len() < 2 {
        reporter.report(
            code::MALFORMED_DIRECTIVE,
            Some(span),
            ["expected `?command receiver[=parameter]`".to_owned()],
        );
        return None;
    }
    // The receiver and parameter are the raw line text after the command,
    // since the parameter is free text and may contain spaces
    let rest_start = tokens[1].span.start;
    let rest = &src[rest_start..span.end];
    let (receiver, parameter) = match split_unescaped(rest) {
        Some((receiver, parameter)) => (receiver, Some(parameter.to_owned())),
        None => (rest, None),
    };
    if !LABEL_FORMAT.is_match(receiver) {
        reporter.report(
            code::MALFORMED_DIRECTIVE,
            Some(span),
            [format!("`{receiver}` is not a valid receiver name")],
        );
        return None;
    }
    Some(S2Directive {
        command: command.text[1..].to_owned(),
        receiver: receiver.to_owned(),
        parameter,
        span,
    })
}

/// Splits text at the first `=` not preceded by a backslash
fn split_unescaped(text: &str) -> Option<(&str, &str)> {
    let mut prev = None;
    for (i, c) in text.char_indices() {
        if c == '=' && prev != Some('\\') {
            return Some((&text[..i], &text[i + 1..]));
        }
        prev = Some(c);
    }
    None
}

/// Parses an instruction line, validating the mnemonic and segmenting the
/// arguments
///
/// This is the raw per-line entry point: a line with no tokens at all is the
/// fatal missing-mnemonic condition
#[must_use]
pub fn instruction_line(
    src: &str,
    line_index: usize,
    tokens: &[Token],
    reporter: &mut Reporter,
) -> Option<S2InstructionLine> {
    let Some(first) = tokens.first() else {
        reporter.report(code::MISSING_MNEMONIC, None, []);
        return None;
    };
    let mnemonic = match Mnemonic::find(&first.text) {
        NameMatch::Exact(mnemonic) => mnemonic,
        NameMatch::WrongCase(mnemonic) => {
            reporter.report(
                code::MNEMONIC_BAD_CASING,
                Some(first.span),
                [format!("the canonical spelling is `{}`", mnemonic.name())],
            );
            mnemonic
        }
        NameMatch::Unknown => {
            let details = did_you_mean(&first.text, Mnemonic::names());
            reporter.report(code::UNRECOGNIZED_MNEMONIC, Some(first.span), details);
            return None;
        }
    };
    let span = line_span(tokens);
    let args = argument::segment(
        &src[first.span.end..span.end],
        first.span.end,
        first.span.context,
    );
    for arg in &args {
        if arg.kind == ArgKind::Unknown {
            reporter.report(
                code::UNKNOWN_ARGUMENT,
                Some(arg.span),
                [format!("`{}` doesn't match any argument form", arg.text)],
            );
        }
    }
    Some(S2InstructionLine {
        line_index,
        mnemonic: (mnemonic, first.span),
        args,
    })
}

/// Gets the span covering a non-empty token slice
fn line_span(tokens: &[Token]) -> Span {
    Span {
        context: tokens[0].span.context,
        start: tokens[0].span.start,
        end: tokens[tokens.len() - 1].span.end,
    }
}
