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

//! Module containing the stage 1 tokenizer
//!
//! Splits one object's full source text into an ordered, non-overlapping
//! sequence of positioned tokens, each a maximal run of non-whitespace
//! characters. No semantic validation happens here: garbage text becomes
//! garbage tokens, diagnosed by the later stages

use chumsky::{input::WithContext, prelude::*};

use crate::span::{ObjectIndex, Span, Spanned};

/// Lexical unit of a source object
///
/// Positions are absolute byte offsets into the object's full source text.
/// Tokens are produced once per object and never mutated afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Index of the token within the object's token sequence
    pub index: usize,
    /// Location of the token within the object's source
    pub span: Span,
    /// Text of the token
    pub text: String,
}

impl Token {
    /// Gets the length of the token in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Checks whether the token is empty. Never true for lexed tokens
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Creates the lexer for an object's source
#[must_use]
fn lexer<'src>() -> impl Parser<
    'src,
    WithContext<Span, &'src str>,
    Vec<Spanned<&'src str>>,
    extra::Err<EmptyErr>,
> {
    // `token -> [^\s]+`
    any()
        .filter(|c: &char| !c.is_whitespace())
        .repeated()
        .at_least(1)
        .to_slice()
        .map_with(|text, e| (text, e.span()))
        .padded()
        .repeated()
        .collect()
}

/// Tokenizes an object's source text
///
/// Always succeeds: every non-whitespace character belongs to exactly one
/// token, and an empty or all-whitespace source produces an empty sequence
/// (which the caller diagnoses as an empty object)
///
/// # Parameters
///
/// * `src`: full source text of the object
/// * `context`: index of the object within the build, tagged onto each span
#[must_use]
pub fn tokenize(src: &str, context: ObjectIndex) -> Vec<Token> {
    lexer()
        .parse(src.with_context(context))
        .into_output()
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(index, (text, span))| Token {
            index,
            span,
            text: text.to_owned(),
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::span::test::IntoSpan;

    fn token(index: usize, text: &str, span: std::ops::Range<usize>) -> Token {
        Token {
            index,
            span: span.span(),
            text: text.to_owned(),
        }
    }

    fn tokens(src: &str) -> Vec<Token> {
        tokenize(src, ObjectIndex::FIRST)
    }

    #[test]
    fn empty() {
        assert_eq!(tokens(""), vec![]);
        assert_eq!(tokens("   \n\t \n"), vec![]);
    }

    #[test]
    fn simple() {
        assert_eq!(
            tokens("LOAD [MONDAY] 5"),
            vec![
                token(0, "LOAD", 0..4),
                token(1, "[MONDAY]", 5..13),
                token(2, "5", 14..15),
            ]
        );
    }

    #[test]
    fn multiline() {
        assert_eq!(
            tokens("main:\n  NOOP\n\n  HALT\n"),
            vec![
                token(0, "main:", 0..5),
                token(1, "NOOP", 8..12),
                token(2, "HALT", 16..20),
            ]
        );
    }

    #[test]
    fn garbage_tokenizes() {
        // No validation at this stage, anything non-whitespace is a token
        assert_eq!(
            tokens("@@@ [[[ $)("),
            vec![
                token(0, "@@@", 0..3),
                token(1, "[[[", 4..7),
                token(2, "$)(", 8..11),
            ]
        );
    }

    #[test]
    fn context_is_tagged() {
        let tokens = tokenize("NOOP", ObjectIndex(3));
        assert_eq!(tokens[0].span.context, ObjectIndex(3));
    }
}
