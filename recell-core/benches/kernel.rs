//! Kernel micro-benchmarks: cell reads, writes, and derived-chain reads.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use recell_core::reactive::Runtime;

fn bench_reads(c: &mut Criterion) {
    let runtime = Runtime::new();
    let cell = runtime.cell(42u64);

    c.bench_function("cell_get", |b| {
        b.iter(|| black_box(cell.get()));
    });
}

fn bench_writes(c: &mut Criterion) {
    let runtime = Runtime::new();
    let cell = runtime.cell(0u64);

    c.bench_function("cell_set", |b| {
        let mut value = 0u64;
        b.iter(|| {
            value = value.wrapping_add(1);
            cell.set(black_box(value));
        });
    });
}

fn bench_derived_chain(c: &mut Criterion) {
    let runtime = Runtime::new();
    let base = runtime.cell(1u64);

    let base_handle = base.clone();
    let doubled = runtime.derived(move || base_handle.get() * 2);
    let doubled_handle = doubled.clone();
    let quadrupled = runtime.derived(move || doubled_handle.get() * 2);

    c.bench_function("derived_chain_get", |b| {
        b.iter(|| black_box(quadrupled.get()));
    });
}

criterion_group!(benches, bench_reads, bench_writes, bench_derived_chain);
criterion_main!(benches);
