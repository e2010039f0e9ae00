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

//! Module containing the stage 4 global/address resolver
//!
//! The global pass runs in two phases over an immutable snapshot of every
//! object's stage 3 output: phase 1 lays out all objects (base addresses and
//! block address maps), phase 2 resolves every remaining argument to a
//! register or a concrete numeric value. No object is resolved before the
//! whole snapshot exists, so cross-object references never depend on
//! processing order

use crate::bytes::{QuadByte, INSTRUCTION_BYTE_COUNT};
use crate::machine::Mnemonic;
use crate::messages::{code, Reporter};
use crate::parser::address_ref::{AutoAddressRef, RefAnchor};
use crate::parser::unit::{ArgUnit, RegisterRef, S3Instruction};
use crate::span::{ObjectIndex, Span, Spanned};

/// Label declaration collected during line classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelDecl {
    /// Name of the label
    pub name: String,
    /// Whether the label declares an embedded block
    pub embedded: bool,
    /// Name of the enclosing first-class block, for embedded labels. Empty
    /// when code precedes the first first-class label
    pub parent: String,
    /// Index of the first instruction after the label within the object, or
    /// [`None`] for trailing labels with no instruction to point at
    pub instruction: Option<usize>,
    /// Location of the declaration
    pub span: Span,
}

/// One object's complete stage 3 output, the unit of the global snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSnapshot {
    /// Name of the object
    pub name: String,
    /// Index of the object within the build
    pub index: ObjectIndex,
    /// Semantically resolved instructions, in source order
    pub instructions: Vec<S3Instruction>,
    /// Label declarations, in source order
    pub labels: Vec<LabelDecl>,
    /// `?define` symbols of the object
    pub defines: Vec<(String, u32)>,
    /// `?import` directives of the object: local alias and object name
    pub imports: Vec<(String, String)>,
}

/// Options of the global pass
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalOptions {
    /// Substitute a placeholder for external addresses that can't be
    /// resolved, instead of failing. Used for partial/incremental builds
    pub use_mock_for_external_addresses: bool,
    /// Offset added to every computed address
    pub base_address_offset: u32,
}

/// Fully resolved instruction argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedArg {
    /// Register reference
    Register(RegisterRef),
    /// Concrete numeric value
    Value(u32),
}

/// Instruction with all arguments resolved to registers or values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInstruction {
    /// Mnemonic of the instruction
    pub mnemonic: Spanned<Mnemonic>,
    /// Resolved arguments, in source order
    pub args: Vec<ResolvedArg>,
    /// Absolute address of the instruction
    pub address: u32,
    /// Name of the first-class block governing the instruction. Empty before
    /// the first label
    pub governing_label: String,
    /// 0-based index of the source line
    pub line_index: usize,
}

/// One object's output of the global pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassOutput {
    /// Name of the object
    pub name: String,
    /// Absolute address of the object's first instruction
    pub base_address: u32,
    /// Absolute address one past the object's last instruction
    pub tail_address: u32,
    /// Block name to absolute address, in declaration order. Embedded blocks
    /// are keyed `parent.name`; [`None`] marks a label with no address
    pub block_addresses: Vec<(String, Option<u32>)>,
    /// Resolved instructions, in source order
    pub instructions: Vec<ResolvedInstruction>,
}

impl PassOutput {
    /// Looks a block address up by its key
    #[must_use]
    pub fn block_address(&self, key: &str) -> Option<Option<u32>> {
        self.block_addresses
            .iter()
            .find(|(name, _)| name == key)
            .map(|&(_, address)| address)
    }
}

/// Placeholder substituted for unresolvable external addresses under the
/// mock option
const MOCK_ADDRESS: u32 = 0;

/// Per-object layout computed by phase 1
struct Layout {
    base_address: u32,
    tail_address: u32,
    block_addresses: Vec<(String, Option<u32>)>,
    /// Governing first-class block of each instruction
    governing: Vec<String>,
}

/// Width of one instruction as an address delta
const WIDTH: u32 = INSTRUCTION_BYTE_COUNT as u32;

/// Runs the global pass over the snapshot of all objects
///
/// # Parameters
///
/// * `objects`: stage 3 snapshot of every object, in declaration order
/// * `options`: global pass options
/// * `reporters`: diagnostics sinks, parallel to `objects`
///
/// # Panics
///
/// Panics if `reporters` isn't parallel to `objects`
#[must_use]
pub fn resolve(
    objects: &[ObjectSnapshot],
    options: GlobalOptions,
    reporters: &mut [Reporter],
) -> Vec<PassOutput> {
    assert_eq!(
        objects.len(),
        reporters.len(),
        "one reporter per object of the snapshot"
    );
    // Phase 1: lay out every object before resolving anything
    let mut layouts = Vec::with_capacity(objects.len());
    let mut next_base = options.base_address_offset;
    for (object, reporter) in objects.iter().zip(reporters.iter_mut()) {
        let layout = lay_out(object, next_base, reporter);
        next_base = layout.tail_address;
        layouts.push(layout);
    }
    // Phase 2: resolve arguments against the read-only layouts
    objects
        .iter()
        .enumerate()
        .zip(reporters.iter_mut())
        .map(|((index, object), reporter)| {
            let instructions = object
                .instructions
                .iter()
                .enumerate()
                .map(|(i, instruction)| {
                    let address = layouts[index]
                        .base_address
                        .wrapping_add(i as u32 * WIDTH);
                    let governing = layouts[index].governing[i].clone();
                    let args = instruction
                        .args
                        .iter()
                        .map(|(arg, span)| {
                            resolve_arg(
                                arg, *span, address, &governing, object, index, &layouts, objects,
                                options, reporter,
                            )
                        })
                        .collect();
                    ResolvedInstruction {
                        mnemonic: instruction.mnemonic,
                        args,
                        address,
                        governing_label: governing,
                        line_index: instruction.line_index,
                    }
                })
                .collect();
            PassOutput {
                name: object.name.clone(),
                base_address: layouts[index].base_address,
                tail_address: layouts[index].tail_address,
                block_addresses: layouts[index].block_addresses.clone(),
                instructions,
            }
        })
        .collect()
}

/// Computes one object's layout: base and tail addresses, block address map,
/// and the governing block of each instruction
fn lay_out(object: &ObjectSnapshot, base_address: u32, reporter: &mut Reporter) -> Layout {
    let tail_address =
        base_address.wrapping_add(object.instructions.len() as u32 * WIDTH);
    let mut block_addresses: Vec<(String, Option<u32>)> = Vec::new();
    for label in &object.labels {
        let key = if label.embedded {
            format!("{}.{}", label.parent, label.name)
        } else {
            label.name.clone()
        };
        if block_addresses.iter().any(|(name, _)| *name == key) {
            reporter.report(
                code::DUPLICATE_LABEL,
                Some(label.span),
                [format!("`{}` is declared more than once", label.name)],
            );
            continue;
        }
        // A label's nominal address is the cumulative count of preceding
        // instructions times the instruction width
        let address = label
            .instruction
            .map(|i| base_address.wrapping_add(i as u32 * WIDTH));
        block_addresses.push((key, address));
    }
    // Governing block per instruction: the last first-class label at or
    // before it
    let mut governing = vec![String::new(); object.instructions.len()];
    let mut current = String::new();
    let mut boundaries = object
        .labels
        .iter()
        .filter(|l| !l.embedded)
        .filter_map(|l| l.instruction.map(|i| (i, l.name.clone())))
        .collect::<Vec<_>>();
    boundaries.sort_by_key(|&(i, _)| i);
    let mut next = boundaries.into_iter().peekable();
    for (i, slot) in governing.iter_mut().enumerate() {
        while next.peek().is_some_and(|&(at, _)| at <= i) {
            current = next.next().expect("peeked element exists").1;
        }
        slot.clone_from(&current);
    }
    Layout {
        base_address,
        tail_address,
        block_addresses,
        governing,
    }
}

/// Resolves one argument to a register or a concrete value
#[allow(clippy::too_many_arguments)]
fn resolve_arg(
    arg: &ArgUnit,
    span: Span,
    address: u32,
    governing: &str,
    object: &ObjectSnapshot,
    object_index: usize,
    layouts: &[Layout],
    objects: &[ObjectSnapshot],
    options: GlobalOptions,
    reporter: &mut Reporter,
) -> ResolvedArg {
    match arg {
        ArgUnit::Register(reference) => ResolvedArg::Register(*reference),
        ArgUnit::Inline(value) | ArgUnit::Injector(value) => ResolvedArg::Value(*value),
        ArgUnit::Alias(name) => {
            if let Some((_, value)) = object.defines.iter().find(|(n, _)| n == name) {
                return ResolvedArg::Value(*value);
            }
            if let Some((_, target)) = object.imports.iter().find(|(alias, _)| alias == name) {
                // An alias naming an import resolves to the imported
                // object's base address
                if let Some(layout) = find_object(target, objects, layouts) {
                    return ResolvedArg::Value(layout.base_address);
                }
                return external_failure(
                    code::ALIAS_UNRESOLVED_GLOBALLY,
                    format!("`{target}` is not part of the build"),
                    span,
                    options,
                    reporter,
                );
            }
            reporter.report(
                code::ALIAS_UNRESOLVED_GLOBALLY,
                Some(span),
                [format!("`#{name}` doesn't resolve to a define or import")],
            );
            ResolvedArg::Value(MOCK_ADDRESS)
        }
        ArgUnit::AddressRef(reference) => resolve_ref(
            reference,
            span,
            address,
            governing,
            object,
            object_index,
            layouts,
            objects,
            options,
            reporter,
        ),
        // Already diagnosed in an earlier stage, kept as a placeholder so
        // the instruction still encodes
        ArgUnit::Invalid(_) => ResolvedArg::Value(MOCK_ADDRESS),
    }
}

/// Resolves an auto-address reference to an absolute address
#[allow(clippy::too_many_arguments)]
fn resolve_ref(
    reference: &AutoAddressRef,
    span: Span,
    address: u32,
    governing: &str,
    object: &ObjectSnapshot,
    object_index: usize,
    layouts: &[Layout],
    objects: &[ObjectSnapshot],
    options: GlobalOptions,
    reporter: &mut Reporter,
) -> ResolvedArg {
    match reference {
        AutoAddressRef::Relative { anchor, offset } => {
            let anchor_address = match anchor {
                RefAnchor::Here => address,
                // The data part starts right after the mnemonic byte
                RefAnchor::Post => address.wrapping_add(1),
            };
            ResolvedArg::Value(QuadByte::new(anchor_address).wrapping_offset(*offset).value())
        }
        AutoAddressRef::Block {
            block_name,
            external_object: Some(alias),
            ..
        } => {
            let Some((_, target)) = object.imports.iter().find(|(a, _)| a == alias) else {
                return external_failure(
                    code::EXTERNAL_OBJECT_NOT_FOUND,
                    format!("`{alias}` is not an import alias of this object"),
                    span,
                    options,
                    reporter,
                );
            };
            let Some(layout) = find_object(target, objects, layouts) else {
                return external_failure(
                    code::EXTERNAL_OBJECT_NOT_FOUND,
                    format!("`{target}` is not part of the build"),
                    span,
                    options,
                    reporter,
                );
            };
            match lookup_block(layout, block_name) {
                Some(Some(target_address)) => ResolvedArg::Value(target_address),
                Some(None) => {
                    reporter.report(
                        code::LABEL_WITHOUT_ADDRESS,
                        Some(span),
                        [format!("`{block_name}` has no instruction to point at")],
                    );
                    ResolvedArg::Value(MOCK_ADDRESS)
                }
                None => external_failure(
                    code::EXTERNAL_LABEL_NOT_FOUND,
                    format!("`{target}` doesn't contain the label `{block_name}`"),
                    span,
                    options,
                    reporter,
                ),
            }
        }
        AutoAddressRef::Block {
            block_name,
            embedded,
            ..
        } => {
            let key = if *embedded {
                format!("{governing}.{block_name}")
            } else {
                block_name.clone()
            };
            match lookup_block(&layouts[object_index], &key) {
                Some(Some(target_address)) => ResolvedArg::Value(target_address),
                Some(None) => {
                    reporter.report(
                        code::LABEL_WITHOUT_ADDRESS,
                        Some(span),
                        [format!("`{block_name}` has no instruction to point at")],
                    );
                    ResolvedArg::Value(MOCK_ADDRESS)
                }
                None => {
                    reporter.report(
                        code::LABEL_WITHOUT_ADDRESS,
                        Some(span),
                        [format!("`{block_name}` is not declared in this object")],
                    );
                    ResolvedArg::Value(MOCK_ADDRESS)
                }
            }
        }
        // The parse failure was already diagnosed
        AutoAddressRef::Invalid(_) => ResolvedArg::Value(MOCK_ADDRESS),
    }
}

/// Reports an external resolution failure, or mocks the address when the
/// options ask for it
fn external_failure(
    failure_code: u32,
    detail: String,
    span: Span,
    options: GlobalOptions,
    reporter: &mut Reporter,
) -> ResolvedArg {
    if options.use_mock_for_external_addresses {
        reporter.report(code::UNRESOLVED_EXTERNAL, Some(span), [detail]);
    } else {
        reporter.report(failure_code, Some(span), [detail]);
    }
    ResolvedArg::Value(MOCK_ADDRESS)
}

/// Finds an object's layout by object name
fn find_object<'a>(
    name: &str,
    objects: &[ObjectSnapshot],
    layouts: &'a [Layout],
) -> Option<&'a Layout> {
    objects
        .iter()
        .position(|object| object.name == name)
        .map(|i| &layouts[i])
}

/// Looks a block key up in a layout
fn lookup_block(layout: &Layout, key: &str) -> Option<Option<u32>> {
    layout
        .block_addresses
        .iter()
        .find(|(name, _)| name == key)
        .map(|&(_, address)| address)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::span::test::IntoSpan;
    use crate::span::DEFAULT_SPAN;

    fn instruction(mnemonic: Mnemonic, args: Vec<ArgUnit>) -> S3Instruction {
        S3Instruction {
            line_index: 0,
            mnemonic: (mnemonic, DEFAULT_SPAN),
            args: args.into_iter().map(|a| (a, (0..1).span())).collect(),
        }
    }

    fn label(name: &str, instruction: Option<usize>) -> LabelDecl {
        LabelDecl {
            name: name.to_owned(),
            embedded: false,
            parent: String::new(),
            instruction,
            span: (0..1).span(),
        }
    }

    fn object(name: &str, instructions: Vec<S3Instruction>, labels: Vec<LabelDecl>) -> ObjectSnapshot {
        ObjectSnapshot {
            name: name.to_owned(),
            index: ObjectIndex::FIRST,
            instructions,
            labels,
            defines: vec![],
            imports: vec![],
        }
    }

    fn run(
        objects: Vec<ObjectSnapshot>,
        options: GlobalOptions,
    ) -> (Vec<PassOutput>, Vec<Vec<u32>>) {
        let mut reporters = objects
            .iter()
            .map(|o| Reporter::new(o.name.clone(), ""))
            .collect::<Vec<_>>();
        let outputs = resolve(&objects, options, &mut reporters);
        let codes = reporters
            .iter()
            .map(|r| r.messages().iter().map(|m| m.code).collect())
            .collect();
        (outputs, codes)
    }

    fn noop() -> S3Instruction {
        instruction(Mnemonic::Noop, vec![])
    }

    #[test]
    fn block_addresses_are_cumulative() {
        let objects = vec![object(
            "main",
            vec![noop(), noop(), noop()],
            vec![label("start", Some(0)), label("mid", Some(2))],
        )];
        let (outputs, codes) = run(objects, GlobalOptions::default());
        assert_eq!(codes, vec![Vec::<u32>::new()]);
        assert_eq!(outputs[0].base_address, 0);
        assert_eq!(outputs[0].tail_address, 15);
        assert_eq!(outputs[0].block_address("start"), Some(Some(0)));
        assert_eq!(outputs[0].block_address("mid"), Some(Some(10)));
        assert_eq!(
            outputs[0].instructions.iter().map(|i| i.address).collect::<Vec<_>>(),
            vec![0, 5, 10]
        );
    }

    #[test]
    fn base_address_offset_and_second_object() {
        let objects = vec![
            object("a", vec![noop(), noop()], vec![]),
            object("b", vec![noop()], vec![label("entry", Some(0))]),
        ];
        let options = GlobalOptions {
            base_address_offset: 100,
            ..GlobalOptions::default()
        };
        let (outputs, _) = run(objects, options);
        assert_eq!(outputs[0].base_address, 100);
        assert_eq!(outputs[0].tail_address, 110);
        assert_eq!(outputs[1].base_address, 110);
        assert_eq!(outputs[1].block_address("entry"), Some(Some(110)));
    }

    #[test]
    fn zero_instruction_label_shares_next_address() {
        // Two labels in a row both point at the next instruction
        let objects = vec![object(
            "main",
            vec![noop()],
            vec![label("a", Some(0)), label("b", Some(0))],
        )];
        let (outputs, _) = run(objects, GlobalOptions::default());
        assert_eq!(outputs[0].block_address("a"), Some(Some(0)));
        assert_eq!(outputs[0].block_address("b"), Some(Some(0)));
    }

    #[test]
    fn duplicate_label() {
        let objects = vec![object(
            "main",
            vec![noop(), noop()],
            vec![label("a", Some(0)), label("a", Some(1))],
        )];
        let (outputs, codes) = run(objects, GlobalOptions::default());
        assert_eq!(codes[0], vec![code::DUPLICATE_LABEL]);
        // The first declaration wins
        assert_eq!(outputs[0].block_address("a"), Some(Some(0)));
    }

    #[test]
    fn local_block_refs() {
        let jump = instruction(
            Mnemonic::Jump,
            vec![ArgUnit::AddressRef(AutoAddressRef::Block {
                block_name: "target".into(),
                external_object: None,
                embedded: false,
            })],
        );
        let objects = vec![object(
            "main",
            vec![jump, noop()],
            vec![label("target", Some(1))],
        )];
        let (outputs, codes) = run(objects, GlobalOptions::default());
        assert_eq!(codes[0], Vec::<u32>::new());
        assert_eq!(outputs[0].instructions[0].args, vec![ResolvedArg::Value(5)]);
    }

    #[test]
    fn relative_refs() {
        let relative = |anchor, offset| {
            instruction(
                Mnemonic::Jump,
                vec![ArgUnit::AddressRef(AutoAddressRef::Relative {
                    anchor,
                    offset,
                })],
            )
        };
        let width = i64::from(WIDTH);
        let objects = vec![object(
            "main",
            vec![
                relative(RefAnchor::Here, 3 * width),
                relative(RefAnchor::Post, 0),
                relative(RefAnchor::Here, -width),
            ],
            vec![],
        )];
        let (outputs, codes) = run(objects, GlobalOptions::default());
        assert_eq!(codes[0], Vec::<u32>::new());
        let args = outputs[0]
            .instructions
            .iter()
            .map(|i| i.args[0])
            .collect::<Vec<_>>();
        // here+3 at address 0, post at address 5, here-1 at address 10
        assert_eq!(
            args,
            vec![
                ResolvedArg::Value(15),
                ResolvedArg::Value(6),
                ResolvedArg::Value(5),
            ]
        );
    }

    #[test]
    fn embedded_refs_resolve_within_governing_block() {
        let embedded_ref = instruction(
            Mnemonic::Jump,
            vec![ArgUnit::AddressRef(AutoAddressRef::Block {
                block_name: "loop".into(),
                external_object: None,
                embedded: true,
            })],
        );
        let mut labels = vec![label("main", Some(0))];
        labels.push(LabelDecl {
            name: "loop".into(),
            embedded: true,
            parent: "main".into(),
            instruction: Some(1),
            span: (0..1).span(),
        });
        let objects = vec![object("obj", vec![embedded_ref, noop()], labels)];
        let (outputs, codes) = run(objects, GlobalOptions::default());
        assert_eq!(codes[0], Vec::<u32>::new());
        assert_eq!(outputs[0].instructions[0].args, vec![ResolvedArg::Value(5)]);
    }

    #[test]
    fn external_refs() {
        let external = instruction(
            Mnemonic::Jump,
            vec![ArgUnit::AddressRef(AutoAddressRef::Block {
                block_name: "write".into(),
                external_object: Some("io".into()),
                embedded: false,
            })],
        );
        let mut caller = object("main", vec![external], vec![]);
        caller.imports = vec![("io".into(), "iolib".into())];
        let callee = object(
            "iolib",
            vec![noop(), noop()],
            vec![label("write", Some(1))],
        );
        let (outputs, codes) = run(vec![caller, callee], GlobalOptions::default());
        assert_eq!(codes, vec![vec![], vec![]]);
        // iolib starts at 5 (after main's single instruction), write is its
        // second instruction
        assert_eq!(
            outputs[0].instructions[0].args,
            vec![ResolvedArg::Value(10)]
        );
    }

    #[test]
    fn external_failures() {
        let external = |alias: &str, name: &str| {
            instruction(
                Mnemonic::Jump,
                vec![ArgUnit::AddressRef(AutoAddressRef::Block {
                    block_name: name.into(),
                    external_object: Some(alias.into()),
                    embedded: false,
                })],
            )
        };
        // Unknown import alias
        let (_, codes) = run(
            vec![object("main", vec![external("io", "write")], vec![])],
            GlobalOptions::default(),
        );
        assert_eq!(codes[0], vec![code::EXTERNAL_OBJECT_NOT_FOUND]);
        // Known alias, object missing from the build
        let mut caller = object("main", vec![external("io", "write")], vec![]);
        caller.imports = vec![("io".into(), "iolib".into())];
        let (_, codes) = run(vec![caller.clone()], GlobalOptions::default());
        assert_eq!(codes[0], vec![code::EXTERNAL_OBJECT_NOT_FOUND]);
        // Object present, label missing
        let callee = object("iolib", vec![noop()], vec![]);
        let (_, codes) = run(vec![caller.clone(), callee], GlobalOptions::default());
        assert_eq!(codes[0], vec![code::EXTERNAL_LABEL_NOT_FOUND]);
        // Mocking demotes all of these to the dedup-exempt warning
        let options = GlobalOptions {
            use_mock_for_external_addresses: true,
            ..GlobalOptions::default()
        };
        let (outputs, codes) = run(vec![caller], options);
        assert_eq!(codes[0], vec![code::UNRESOLVED_EXTERNAL]);
        assert_eq!(
            outputs[0].instructions[0].args,
            vec![ResolvedArg::Value(MOCK_ADDRESS)]
        );
    }

    #[test]
    fn trailing_label_has_no_address() {
        let jump = instruction(
            Mnemonic::Jump,
            vec![ArgUnit::AddressRef(AutoAddressRef::Block {
                block_name: "end".into(),
                external_object: None,
                embedded: false,
            })],
        );
        let objects = vec![object("main", vec![jump], vec![label("end", None)])];
        let (outputs, codes) = run(objects, GlobalOptions::default());
        assert_eq!(codes[0], vec![code::LABEL_WITHOUT_ADDRESS]);
        assert_eq!(outputs[0].block_address("end"), Some(None));
    }

    #[test]
    fn alias_resolution() {
        let alias = |name: &str| instruction(Mnemonic::Jump, vec![ArgUnit::Alias(name.into())]);
        let mut main = object("main", vec![alias("LIMIT"), alias("io")], vec![]);
        main.defines = vec![("LIMIT".into(), 400)];
        main.imports = vec![("io".into(), "iolib".into())];
        let iolib = object("iolib", vec![noop()], vec![]);
        let (outputs, codes) = run(vec![main, iolib], GlobalOptions::default());
        assert_eq!(codes[0], Vec::<u32>::new());
        assert_eq!(
            outputs[0]
                .instructions
                .iter()
                .map(|i| i.args[0])
                .collect::<Vec<_>>(),
            // The define's value, then the imported object's base address
            vec![ResolvedArg::Value(400), ResolvedArg::Value(10)]
        );
    }

    #[test]
    fn governing_labels() {
        let objects = vec![object(
            "main",
            vec![noop(), noop(), noop()],
            vec![label("first", Some(1)), label("second", Some(2))],
        )];
        let (outputs, _) = run(objects, GlobalOptions::default());
        assert_eq!(
            outputs[0]
                .instructions
                .iter()
                .map(|i| i.governing_label.as_str())
                .collect::<Vec<_>>(),
            vec!["", "first", "second"]
        );
    }
}
