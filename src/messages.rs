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

//! Module containing the message/diagnostics subsystem used by every stage
//! of the pipeline
//!
//! Diagnostics are never raised as exceptional control flow for malformed
//! input: each stage appends [`ExtendedAsmMessage`] values to its object's
//! [`Reporter`] and produces whatever partial output it can. Message codes
//! and classifications are a wire contract; see the code constants in
//! [`code`]

use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};
use serde::Serialize;

use crate::error_rendering::RenderError;
use crate::span::Span;

/// Severity classification of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Classification {
    /// Doesn't block compilation
    Warning,
    /// Fails the build, but processing of the object continues
    Critical,
    /// Aborts processing of the object's remaining stages
    Fatal,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Warning => "Warning",
            Self::Critical => "Critical",
            Self::Fatal => "Fatal",
        })
    }
}

/// Stable numeric message codes, partitioned by stage (1xxx tokenizer,
/// 2xxx structural classifier, 3xxx semantic resolver, 4xxx global resolver,
/// 5xxx finalizer, 6xxx compiler)
pub mod code {
    /// Source content is null or empty
    pub const EMPTY_SOURCE: u32 = 1001;
    /// Instruction line has no mnemonic token
    pub const MISSING_MNEMONIC: u32 = 2001;
    /// Mnemonic doesn't name any instruction
    pub const UNRECOGNIZED_MNEMONIC: u32 = 2002;
    /// Mnemonic matches an instruction, but not with canonical casing
    pub const MNEMONIC_BAD_CASING: u32 = 2003;
    /// Directive line doesn't follow the `?command receiver[=parameter]` grammar
    pub const MALFORMED_DIRECTIVE: u32 = 2004;
    /// Label line isn't a single well-formed label token
    pub const MALFORMED_LABEL: u32 = 2005;
    /// Argument text didn't match any known argument kind
    pub const UNKNOWN_ARGUMENT: u32 = 2006;
    /// Argument list doesn't fit the mnemonic's shape
    pub const ARGUMENT_SHAPE_MISMATCH: u32 = 3001;
    /// Register name doesn't name any register
    pub const BAD_REGISTER_NAME: u32 = 3002;
    /// Named register mask doesn't name any mask
    pub const BAD_NAMED_MASK: u32 = 3003;
    /// Numeric register mask is out of range
    pub const BAD_NUMERIC_MASK: u32 = 3004;
    /// Inline value isn't an integer
    pub const NON_INTEGER_INLINE_VALUE: u32 = 3005;
    /// Inline value doesn't fit in 32 bits
    pub const OVERSIZED_INLINE_VALUE: u32 = 3006;
    /// Alias doesn't name a declared symbol
    pub const ALIAS_NOT_FOUND: u32 = 3007;
    /// Register name matches a register, but not with canonical casing
    pub const REGISTER_BAD_CASING: u32 = 3008;
    /// Constant injector key isn't `flag`, `vec`, or `float`
    pub const UNKNOWN_INJECTOR_KEY: u32 = 3009;
    /// Flag injector value doesn't name any flag
    pub const UNKNOWN_FLAG: u32 = 3010;
    /// Flag injector value matches a flag, but not with upper casing
    pub const FLAG_BAD_CASING: u32 = 3011;
    /// Constant injector is missing its `=value` part
    pub const MISSING_INJECTOR_VALUE: u32 = 3012;
    /// Relative address ref uses an unknown anchor
    pub const INVALID_REF_ANCHOR: u32 = 3020;
    /// Relative address ref uses an unknown offset operator
    pub const INVALID_REF_OPERATOR: u32 = 3021;
    /// Relative address ref offset isn't an integer
    pub const INVALID_REF_PARAMETER: u32 = 3022;
    /// Relative address ref offset doesn't fit in 32 bits
    pub const OVERSIZED_REF_PARAMETER: u32 = 3023;
    /// Address ref doesn't match any of the grammar forms
    pub const INVALID_ADDRESS_REF: u32 = 3024;
    /// External address couldn't be resolved and was mocked
    pub const UNRESOLVED_EXTERNAL: u32 = 4001;
    /// External ref names an object that isn't imported
    pub const EXTERNAL_OBJECT_NOT_FOUND: u32 = 4002;
    /// External ref names a label the imported object doesn't contain
    pub const EXTERNAL_LABEL_NOT_FOUND: u32 = 4003;
    /// Alias couldn't be resolved against defines or imports
    pub const ALIAS_UNRESOLVED_GLOBALLY: u32 = 4004;
    /// Label is declared more than once in the same object
    pub const DUPLICATE_LABEL: u32 = 4005;
    /// Referenced label has no address (no instruction follows it)
    pub const LABEL_WITHOUT_ADDRESS: u32 = 4006;
    /// Resolved argument value doesn't fit its encoding field
    pub const OVERSIZED_ARGUMENT: u32 = 5001;
    /// Entry point label couldn't be resolved
    pub const ENTRY_POINT_NOT_FOUND: u32 = 6001;
}

/// Immutable template a diagnostic is generated from
///
/// The effective code of a message is `code + master_code`; the address-ref
/// family shares the `3000` master with the rest of the semantic stage while
/// keeping its own sub-area numbering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageTemplate {
    /// Base numeric code
    pub code: u32,
    /// Offset added to the base code, when the template belongs to a
    /// sub-area of a stage
    pub master_code: Option<u32>,
    /// Severity of messages generated from this template
    pub classification: Classification,
    /// Whether generated messages carry source coordinates
    pub has_coordinates: bool,
}

impl MessageTemplate {
    /// Gets the effective code of messages generated from this template
    #[must_use]
    pub fn effective_code(&self) -> u32 {
        self.code + self.master_code.unwrap_or(0)
    }
}

/// Shorthand for template table entries
const fn template(
    code: u32,
    master_code: Option<u32>,
    classification: Classification,
    has_coordinates: bool,
) -> MessageTemplate {
    MessageTemplate {
        code,
        master_code,
        classification,
        has_coordinates,
    }
}

/// The static message template table, loaded once at process start and never
/// mutated. Classifications here are part of the wire contract
static TEMPLATES: &[MessageTemplate] = &[
    template(code::EMPTY_SOURCE, None, Classification::Fatal, false),
    template(code::MISSING_MNEMONIC, None, Classification::Fatal, true),
    template(code::UNRECOGNIZED_MNEMONIC, None, Classification::Critical, true),
    template(code::MNEMONIC_BAD_CASING, None, Classification::Critical, true),
    template(code::MALFORMED_DIRECTIVE, None, Classification::Critical, true),
    template(code::MALFORMED_LABEL, None, Classification::Critical, true),
    template(code::UNKNOWN_ARGUMENT, None, Classification::Critical, true),
    template(code::ARGUMENT_SHAPE_MISMATCH, None, Classification::Critical, true),
    template(code::BAD_REGISTER_NAME, None, Classification::Critical, true),
    template(code::BAD_NAMED_MASK, None, Classification::Critical, true),
    template(code::BAD_NUMERIC_MASK, None, Classification::Critical, true),
    template(code::NON_INTEGER_INLINE_VALUE, None, Classification::Critical, true),
    template(code::OVERSIZED_INLINE_VALUE, None, Classification::Critical, true),
    template(code::ALIAS_NOT_FOUND, None, Classification::Critical, true),
    template(code::REGISTER_BAD_CASING, None, Classification::Critical, true),
    template(code::UNKNOWN_INJECTOR_KEY, None, Classification::Critical, true),
    template(code::UNKNOWN_FLAG, None, Classification::Critical, true),
    template(code::FLAG_BAD_CASING, None, Classification::Critical, true),
    template(code::MISSING_INJECTOR_VALUE, None, Classification::Critical, true),
    // Address-ref grammar sub-area: base codes 20-24 under the 3000 master
    template(20, Some(3000), Classification::Critical, true),
    template(21, Some(3000), Classification::Critical, true),
    template(22, Some(3000), Classification::Critical, true),
    template(23, Some(3000), Classification::Critical, true),
    template(24, Some(3000), Classification::Critical, true),
    template(code::UNRESOLVED_EXTERNAL, None, Classification::Warning, true),
    template(code::EXTERNAL_OBJECT_NOT_FOUND, None, Classification::Critical, true),
    template(code::EXTERNAL_LABEL_NOT_FOUND, None, Classification::Critical, true),
    template(code::ALIAS_UNRESOLVED_GLOBALLY, None, Classification::Critical, true),
    template(code::DUPLICATE_LABEL, None, Classification::Critical, true),
    template(code::LABEL_WITHOUT_ADDRESS, None, Classification::Critical, true),
    template(code::OVERSIZED_ARGUMENT, None, Classification::Critical, true),
    template(code::ENTRY_POINT_NOT_FOUND, None, Classification::Critical, false),
];

/// String table for localized message text. Kept separate from the
/// code→index table so alternative locales can swap the strings wholesale
static STRINGS: &[&str] = &[
    "source content is null or empty",
    "instruction line is missing a mnemonic",
    "unrecognized mnemonic",
    "mnemonic has incorrect casing",
    "malformed directive",
    "malformed label",
    "unknown argument",
    "arguments don't match the instruction's shape",
    "unknown register name",
    "unknown register mask",
    "numeric register mask out of range",
    "inline value is not an integer",
    "inline value is too large",
    "alias not found",
    "register name has incorrect casing",
    "unknown constant injector key",
    "unknown flag name",
    "flag name has incorrect casing",
    "constant injector is missing a value",
    "invalid address ref anchor",
    "invalid address ref operator",
    "invalid address ref offset",
    "address ref offset is too large",
    "invalid address ref",
    "external address could not be resolved",
    "external object not found",
    "external object does not contain the label",
    "alias could not be resolved",
    "duplicate label",
    "label has no address",
    "argument value does not fit its encoding field",
    "entry point not found",
];

/// Code → string-table index for message text localization
static TEXT_INDEX: &[(u32, usize)] = &[
    (code::EMPTY_SOURCE, 0),
    (code::MISSING_MNEMONIC, 1),
    (code::UNRECOGNIZED_MNEMONIC, 2),
    (code::MNEMONIC_BAD_CASING, 3),
    (code::MALFORMED_DIRECTIVE, 4),
    (code::MALFORMED_LABEL, 5),
    (code::UNKNOWN_ARGUMENT, 6),
    (code::ARGUMENT_SHAPE_MISMATCH, 7),
    (code::BAD_REGISTER_NAME, 8),
    (code::BAD_NAMED_MASK, 9),
    (code::BAD_NUMERIC_MASK, 10),
    (code::NON_INTEGER_INLINE_VALUE, 11),
    (code::OVERSIZED_INLINE_VALUE, 12),
    (code::ALIAS_NOT_FOUND, 13),
    (code::REGISTER_BAD_CASING, 14),
    (code::UNKNOWN_INJECTOR_KEY, 15),
    (code::UNKNOWN_FLAG, 16),
    (code::FLAG_BAD_CASING, 17),
    (code::MISSING_INJECTOR_VALUE, 18),
    (code::INVALID_REF_ANCHOR, 19),
    (code::INVALID_REF_OPERATOR, 20),
    (code::INVALID_REF_PARAMETER, 21),
    (code::OVERSIZED_REF_PARAMETER, 22),
    (code::INVALID_ADDRESS_REF, 23),
    (code::UNRESOLVED_EXTERNAL, 24),
    (code::EXTERNAL_OBJECT_NOT_FOUND, 25),
    (code::EXTERNAL_LABEL_NOT_FOUND, 26),
    (code::ALIAS_UNRESOLVED_GLOBALLY, 27),
    (code::DUPLICATE_LABEL, 28),
    (code::LABEL_WITHOUT_ADDRESS, 29),
    (code::OVERSIZED_ARGUMENT, 30),
    (code::ENTRY_POINT_NOT_FOUND, 31),
];

/// Gets the template with the given effective code
///
/// # Panics
///
/// Panics if the code doesn't name any template. Generating a message from
/// an unknown code is a programmer error, not a diagnosable input condition
#[must_use]
pub fn find_template(effective_code: u32) -> &'static MessageTemplate {
    TEMPLATES
        .iter()
        .find(|t| t.effective_code() == effective_code)
        .expect("every generated message code has a template")
}

/// Gets the localized text for the given effective code
#[must_use]
pub fn localized_text(effective_code: u32) -> &'static str {
    TEXT_INDEX
        .iter()
        .find(|(code, _)| *code == effective_code)
        .map_or("unknown message", |&(_, idx)| STRINGS[idx])
}

/// A generated, position-tagged diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtendedAsmMessage {
    /// Effective numeric code (base + master)
    pub code: u32,
    /// Severity of the message
    pub classification: Classification,
    /// Absolute character coordinates of the offending text within the
    /// object's source, when the template carries coordinates
    pub coordinates: Option<(usize, usize)>,
    /// Name of the source object the message belongs to
    pub object_name: String,
    /// Full text of the source line the coordinates point into
    pub excerpt: Option<String>,
    /// 0-based index of the source line the coordinates point into
    pub line_index: Option<usize>,
    /// Absolute offset of the start of the excerpt line
    #[serde(skip)]
    excerpt_offset: usize,
    /// Extra human-readable detail lines
    pub details: Vec<String>,
}

/// Options controlling which parts of a stringified message are emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringifyOptions {
    /// Include the `at object:line:coords` location line
    pub location: bool,
    /// Include the excerpt line with its caret underline
    pub excerpt: bool,
    /// Include the detail lines
    pub details: bool,
}

impl Default for StringifyOptions {
    fn default() -> Self {
        Self {
            location: true,
            excerpt: true,
            details: true,
        }
    }
}

impl ExtendedAsmMessage {
    /// Composes the message as up to 4 displayable parts: header, location,
    /// excerpt with caret underline, and details
    ///
    /// # Parameters
    ///
    /// * `options`: which optional parts to include
    #[must_use]
    pub fn stringify(&self, options: &StringifyOptions) -> String {
        let mut out = format!(
            "{} {}: {}",
            self.classification,
            self.code,
            localized_text(self.code)
        );
        if options.location {
            if let (Some((start, end)), Some(line)) = (self.coordinates, self.line_index) {
                // Lines are displayed 1-based, coordinates stay absolute
                out.push_str(&format!(
                    "\n  at {}:{}:{start}-{end}",
                    self.object_name,
                    line + 1
                ));
            }
        }
        if options.excerpt {
            if let (Some((start, end)), Some(excerpt)) = (self.coordinates, &self.excerpt) {
                let column = start.saturating_sub(self.excerpt_offset);
                let width = end.saturating_sub(start).max(1).min(excerpt.len().saturating_sub(column).max(1));
                out.push_str(&format!(
                    "\n    {excerpt}\n    {}{}",
                    " ".repeat(column),
                    "^".repeat(width)
                ));
            }
        }
        if options.details {
            for detail in &self.details {
                out.push_str("\n  note: ");
                out.push_str(detail);
            }
        }
        out
    }
}

impl std::fmt::Display for ExtendedAsmMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.stringify(&StringifyOptions::default()))
    }
}

/// Per-object message generator, keyed off the static template table
///
/// Holds a copy of the object's source so generated messages can carry line
/// indices and excerpt text without back-references into the parser state
#[derive(Debug, Clone)]
pub struct Reporter {
    /// Name of the object messages are generated for
    object_name: String,
    /// Source text of the object
    src: String,
    /// Offsets of the start of each source line
    line_starts: Vec<usize>,
    /// Messages generated so far, in generation order
    messages: Vec<ExtendedAsmMessage>,
    /// Whether a fatal message was generated
    fatal: bool,
}

impl Reporter {
    /// Creates a new [`Reporter`] for an object
    ///
    /// # Parameters
    ///
    /// * `object_name`: name of the object
    /// * `src`: full (LF-normalized) source text of the object
    #[must_use]
    pub fn new(object_name: impl Into<String>, src: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(src.char_indices().filter(|&(_, c)| c == '\n').map(|(i, _)| i + 1));
        Self {
            object_name: object_name.into(),
            src: src.to_owned(),
            line_starts,
            messages: Vec::new(),
            fatal: false,
        }
    }

    /// Gets the 0-based line index containing an absolute offset
    #[must_use]
    pub fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset) - 1
    }

    /// Generates a message from the template with the given effective code
    ///
    /// # Parameters
    ///
    /// * `code`: effective code of the template to generate from
    /// * `span`: coordinates of the offending text; ignored when the
    ///   template doesn't carry coordinates
    /// * `details`: extra detail lines
    pub fn report(
        &mut self,
        code: u32,
        span: Option<Span>,
        details: impl IntoIterator<Item = String>,
    ) {
        self.report_classified(code, span, details, find_template(code).classification);
    }

    /// Generates a message like [`Reporter::report`] but demoted to a
    /// warning, for the oversized-value codes when the build options request
    /// demotion
    pub fn report_demoted(
        &mut self,
        code: u32,
        span: Option<Span>,
        details: impl IntoIterator<Item = String>,
    ) {
        self.report_classified(code, span, details, Classification::Warning);
    }

    fn report_classified(
        &mut self,
        code: u32,
        span: Option<Span>,
        details: impl IntoIterator<Item = String>,
        classification: Classification,
    ) {
        let tpl = find_template(code);
        self.fatal |= classification == Classification::Fatal;
        let span = span.filter(|_| tpl.has_coordinates);
        let (coordinates, excerpt, line_index, excerpt_offset) = match span {
            Some(span) => {
                let line = self.line_of(span.start);
                let start = self.line_starts[line];
                let end = self
                    .line_starts
                    .get(line + 1)
                    .map_or(self.src.len(), |&next| next.saturating_sub(1));
                (
                    Some((span.start, span.end)),
                    Some(self.src[start..end].to_owned()),
                    Some(line),
                    start,
                )
            }
            None => (None, None, None, 0),
        };
        self.messages.push(ExtendedAsmMessage {
            code,
            classification,
            coordinates,
            object_name: self.object_name.clone(),
            excerpt,
            line_index,
            excerpt_offset,
            details: details.into_iter().collect(),
        });
    }

    /// Checks whether a fatal message was generated, meaning the object's
    /// remaining stages must not run
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        self.fatal
    }

    /// Checks whether no blocking (critical or fatal) message was generated
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.messages
            .iter()
            .all(|m| m.classification == Classification::Warning)
    }

    /// Gets the name of the object messages are generated for
    #[must_use]
    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    /// Gets the messages generated so far
    #[must_use]
    pub fn messages(&self) -> &[ExtendedAsmMessage] {
        &self.messages
    }

    /// Consumes the reporter, returning the generated messages
    #[must_use]
    pub fn into_messages(self) -> Vec<ExtendedAsmMessage> {
        self.messages
    }
}

/// Checks whether the coordinates of `inner` are fully contained within the
/// coordinates of `outer`, within the same object
fn contained_in(inner: &ExtendedAsmMessage, outer: &ExtendedAsmMessage) -> bool {
    match (inner.coordinates, outer.coordinates) {
        (Some((is, ie)), Some((os, oe))) => {
            inner.object_name == outer.object_name && os <= is && ie <= oe
        }
        _ => false,
    }
}

/// Folds a raw message list into the final deduplicated list
///
/// A later message whose coordinate span is fully contained within an
/// already-kept message's span is dropped. The [`code::UNRESOLVED_EXTERNAL`]
/// code is special-cased: it is only kept when no other message survives,
/// since it merely restates a resolution failure that any other diagnostic
/// explains better
#[must_use]
pub fn distinct_messages(messages: &[ExtendedAsmMessage]) -> Vec<ExtendedAsmMessage> {
    let mut kept: Vec<ExtendedAsmMessage> = Vec::new();
    for msg in messages {
        if !kept.iter().any(|prev| contained_in(msg, prev)) {
            kept.push(msg.clone());
        }
    }
    if kept.iter().any(|m| m.code != code::UNRESOLVED_EXTERNAL) {
        kept.retain(|m| m.code != code::UNRESOLVED_EXTERNAL);
    }
    kept
}

impl RenderError for [ExtendedAsmMessage] {
    fn format(&self, filename: &str, src: &str, mut buffer: &mut Vec<u8>, color: bool) {
        let config = Config::default()
            .with_color(color)
            .with_index_type(IndexType::Byte);
        for msg in self {
            // Skip messages belonging to other objects
            if msg.object_name != filename {
                continue;
            }
            let kind = match msg.classification {
                Classification::Warning => ReportKind::Warning,
                Classification::Critical | Classification::Fatal => ReportKind::Error,
            };
            let range = msg.coordinates.map_or(0..0, |(s, e)| s..e);
            let mut report = Report::build(kind, (filename, range.clone()))
                .with_config(config)
                .with_code(msg.code)
                .with_message(localized_text(msg.code));
            if msg.coordinates.is_some() {
                report = report.with_label(
                    Label::new((filename, range))
                        .with_message(localized_text(msg.code))
                        .with_color(match msg.classification {
                            Classification::Warning => Color::Yellow,
                            _ => Color::Red,
                        }),
                );
            }
            for detail in &msg.details {
                report = report.with_note(detail);
            }
            report
                .finish()
                .write((filename, Source::from(src)), &mut buffer)
                .expect("Writing to an in-memory vector can't fail");
        }
    }
}
