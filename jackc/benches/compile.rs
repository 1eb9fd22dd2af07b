use criterion::{black_box, criterion_group, criterion_main, Criterion};

use jackc::prelude::*;

fn criterion_benchmark(c: &mut Criterion) {
    let source = include_str!("../tests/Point.jack");

    c.bench_function("compile point", |b| {
        b.iter(|| black_box(compile_str(black_box(source))))
    });

    let conf = CompilerConf { emit_tree: true };
    c.bench_function("compile point with tree", |b| {
        b.iter(|| black_box(compile_class(black_box(source), &conf)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
