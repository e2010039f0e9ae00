#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use std::hint::black_box;
use std::time::Duration;

use almanac_asm::parser::{ParseOptions, ParsedAssembly};
use almanac_asm::prelude::*;

static CODE: &str = include_str!("sample.alm");
static NAME: &str = "sample";

fn parse(options: &ParseOptions) -> ParsedAssembly {
    let parsed = parser::parse([(black_box(NAME), black_box(CODE))], options);
    assert!(parsed.succeeded, "{:?}", parsed.messages());
    parsed
}

pub fn benchmark_crate(c: &mut Criterion) {
    let options = ParseOptions::default();
    c.bench_function("parse-only", |b| {
        b.iter(|| black_box(parse(&options)));
    });

    let parsed = parse(&options);
    c.bench_function("compile-only", |b| {
        b.iter_batched(
            || parsed.clone(),
            |parsed| {
                black_box(compiler::compile(black_box(&parsed), black_box(None)));
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("full-process", |b| {
        b.iter(|| {
            let assembly = assembler::build(
                black_box(&[(NAME, CODE)]),
                black_box(&BuildOptions::default()),
            );
            assert!(assembly.build_succeeded);
            black_box(assembly)
        });
    });

    let program = assembler::build(&[(NAME, CODE)], &BuildOptions::default())
        .compilation
        .program_bytes;
    c.bench_function("disassemble-only", |b| {
        b.iter(|| black_box(disassembler::disassemble(black_box(&program)).unwrap()));
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().warm_up_time(Duration::from_secs(5)).measurement_time(Duration::from_secs(15));
    targets = benchmark_crate
}
criterion_main!(benches);
