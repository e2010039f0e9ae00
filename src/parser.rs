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

//! Module containing the staged assembly parser
//!
//! The pipeline runs five stages per object: tokenization, structural line
//! classification, semantic argument resolution, the global/address pass
//! over all objects together, and fixed-width finalization. Each stage is a
//! pure function over immutable inputs; the only cross-cutting state is the
//! append-only diagnostics list of each object's [`Reporter`]. The entry
//! point is [`parse()`]

use num_bigint::BigUint;
use num_traits::ToPrimitive as _;

use crate::messages::{code, distinct_messages, ExtendedAsmMessage, Reporter};
use crate::seq;
use crate::span::{ObjectIndex, Span};

pub mod address_ref;
pub mod argument;
pub mod finalizer;
pub mod line;
pub mod resolver;
pub mod tokenizer;
pub mod unit;

pub use address_ref::AutoAddressRef;
pub use argument::{ArgKind, ArgSpan};
pub use finalizer::{EncodedInstruction, OversizedValueSizing};
pub use line::S2Line;
pub use resolver::{PassOutput, ResolvedArg};
pub use tokenizer::Token;
pub use unit::{ArgUnit, RegisterRef};

/// Options of a full parse
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Demote oversized inline values to warnings instead of failing the
    /// build
    pub treat_oversized_inline_values_as_warnings: bool,
    /// Policy for resolved values that don't fit their encoding field
    pub oversized_value_sizing: OversizedValueSizing,
    /// Substitute a placeholder for unresolvable external addresses instead
    /// of failing. Used for partial/incremental builds
    pub use_mock_for_external_addresses: bool,
    /// Offset added to every computed address
    pub base_address_offset: u32,
}

/// One object's complete pipeline output
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPass {
    /// Name of the object
    pub name: String,
    /// Index of the object within the build
    pub index: ObjectIndex,
    /// Output of the global pass for the object
    pub pass: PassOutput,
    /// Finalized fixed-width instruction encodings, in source order
    pub encoded: Vec<EncodedInstruction>,
    /// Deduplicated diagnostics of the object, in generation order
    pub messages: Vec<ExtendedAsmMessage>,
    /// Whether the object produced no blocking diagnostic
    pub succeeded: bool,
}

/// Output of parsing a complete set of objects
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAssembly {
    /// Per-object outputs, in declaration order
    pub objects: Vec<ObjectPass>,
    /// Whether every object succeeded
    pub succeeded: bool,
}

impl ParsedAssembly {
    /// Gets the diagnostics of all objects, in object order
    #[must_use]
    pub fn messages(&self) -> Vec<ExtendedAsmMessage> {
        self.objects
            .iter()
            .flat_map(|object| object.messages.iter().cloned())
            .collect()
    }
}

/// Stage 2/3 output of one object, the input to the global pass
struct StagedObject {
    snapshot: resolver::ObjectSnapshot,
    reporter: Reporter,
}

/// Parses a set of source objects through the full pipeline
///
/// Sources must already be LF-normalized. Always produces a partial result
/// alongside any diagnostics, never an all-or-nothing failure
///
/// # Parameters
///
/// * `sources`: ordered `(object name, source text)` pairs
/// * `options`: parse options
#[must_use]
pub fn parse<'a>(
    sources: impl IntoIterator<Item = (&'a str, &'a str)>,
    options: &ParseOptions,
) -> ParsedAssembly {
    // Stages 1 to 3 run per object; the results form the immutable snapshot
    // the global pass consumes
    let (snapshots, mut reporters): (Vec<_>, Vec<_>) = sources
        .into_iter()
        .enumerate()
        .map(|(i, (name, src))| {
            let staged = stage_object(name, src, ObjectIndex(i as u32), options);
            (staged.snapshot, staged.reporter)
        })
        .unzip();
    let global_options = resolver::GlobalOptions {
        use_mock_for_external_addresses: options.use_mock_for_external_addresses,
        base_address_offset: options.base_address_offset,
    };
    let outputs = resolver::resolve(&snapshots, global_options, &mut reporters);
    // Stage 5 and the per-object message fold
    let finalize_options = finalizer::FinalizeOptions {
        oversized_value_sizing: options.oversized_value_sizing,
        treat_oversized_values_as_warnings: options.treat_oversized_inline_values_as_warnings,
    };
    let objects = outputs
        .into_iter()
        .zip(reporters)
        .zip(&snapshots)
        .map(|((pass, mut reporter), snapshot)| {
            let encoded = if reporter.is_fatal() {
                Vec::new()
            } else {
                finalizer::finalize_object(&pass.instructions, finalize_options, &mut reporter)
            };
            let succeeded = reporter.succeeded();
            let messages = distinct_messages(reporter.messages());
            ObjectPass {
                name: pass.name.clone(),
                index: snapshot.index,
                pass,
                encoded,
                messages,
                succeeded,
            }
        })
        .collect::<Vec<_>>();
    let succeeded = objects.iter().all(|object| object.succeeded);
    ParsedAssembly { objects, succeeded }
}

/// Runs stages 1 to 3 for one object
fn stage_object(
    name: &str,
    src: &str,
    index: ObjectIndex,
    options: &ParseOptions,
) -> StagedObject {
    let mut reporter = Reporter::new(name, src);
    let empty_snapshot = |reporter: Reporter| StagedObject {
        snapshot: resolver::ObjectSnapshot {
            name: name.to_owned(),
            index,
            instructions: Vec::new(),
            labels: Vec::new(),
            defines: Vec::new(),
            imports: Vec::new(),
        },
        reporter,
    };

    // Stage 1
    let tokens = tokenizer::tokenize(src, index);
    if tokens.is_empty() {
        reporter.report(code::EMPTY_SOURCE, None, []);
        return empty_snapshot(reporter);
    }

    // Stage 2: classify line by line
    let lines = seq::group_by(tokens, |token| reporter.line_of(token.span.start));
    let classified = lines
        .into_iter()
        .map(|(line_index, tokens)| {
            (
                line_index,
                line::classify_line(src, line_index, &tokens, &mut reporter),
            )
        })
        .collect::<Vec<_>>();

    // Directives first: defines and imports must be visible to every
    // instruction of the object regardless of declaration order
    let mut defines = Vec::new();
    let mut imports = Vec::new();
    for (_, classified_line) in &classified {
        if let S2Line::Directive(directive) = classified_line {
            match directive.command.as_str() {
                "import" => match &directive.parameter {
                    Some(parameter) => {
                        imports.push((directive.receiver.clone(), parameter.trim().to_owned()));
                    }
                    None => reporter.report(
                        code::MALFORMED_DIRECTIVE,
                        Some(directive.span),
                        ["`?import` needs an `=object` parameter".to_owned()],
                    ),
                },
                "define" => match &directive.parameter {
                    Some(parameter) => {
                        if let Some(value) =
                            define_value(parameter.trim(), directive.span, &mut reporter)
                        {
                            defines.push((directive.receiver.clone(), value));
                        }
                    }
                    None => reporter.report(
                        code::MALFORMED_DIRECTIVE,
                        Some(directive.span),
                        ["`?define` needs an `=value` parameter".to_owned()],
                    ),
                },
                other => reporter.report(
                    code::MALFORMED_DIRECTIVE,
                    Some(directive.span),
                    [format!("`?{other}` is not a known command")],
                ),
            }
        }
    }

    // Stage 3: resolve instructions in order, attaching pending labels to
    // the next instruction as we go
    let symbols = unit::LocalSymbols {
        defines: &defines,
        imports: &imports,
    };
    let resolve_options = unit::ResolveOptions {
        treat_oversized_inline_values_as_warnings: options
            .treat_oversized_inline_values_as_warnings,
    };
    let mut instructions = Vec::new();
    let mut labels: Vec<resolver::LabelDecl> = Vec::new();
    let mut pending: Vec<resolver::LabelDecl> = Vec::new();
    let mut parent = String::new();
    for (_, classified_line) in classified {
        match classified_line {
            S2Line::Label(label) => {
                let parent_name = if label.embedded {
                    parent.clone()
                } else {
                    // First-class labels open a new block
                    parent.clone_from(&label.name);
                    String::new()
                };
                pending.push(resolver::LabelDecl {
                    name: label.name,
                    embedded: label.embedded,
                    parent: parent_name,
                    instruction: None,
                    span: label.span,
                });
            }
            S2Line::Instruction(instruction_line) => {
                for mut declaration in pending.drain(..) {
                    declaration.instruction = Some(instructions.len());
                    labels.push(declaration);
                }
                instructions.push(unit::resolve_line(
                    &instruction_line,
                    symbols,
                    resolve_options,
                    &mut reporter,
                ));
            }
            S2Line::Blank | S2Line::Comment | S2Line::Directive(_) => {}
        }
    }
    // Trailing labels have no instruction to point at
    labels.append(&mut pending);

    StagedObject {
        snapshot: resolver::ObjectSnapshot {
            name: name.to_owned(),
            index,
            instructions,
            labels,
            defines,
            imports,
        },
        reporter,
    }
}

/// Parses a `?define` value: base 10, `x`-prefixed base 16, or a negated
/// base 10 literal
fn define_value(text: &str, span: Span, reporter: &mut Reporter) -> Option<u32> {
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
            [format!("`{text}` is not an integer define value")],
        );
        return None;
    };
    match magnitude.to_u32() {
        Some(value) => Some(if negative { value.wrapping_neg() } else { value }),
        None => {
            reporter.report(
                code::OVERSIZED_INLINE_VALUE,
                Some(span),
                ["define values must fit in 32 bits".to_owned()],
            );
            None
        }
    }
}
