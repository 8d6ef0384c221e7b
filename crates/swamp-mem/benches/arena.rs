// Arena allocator benchmarks for the Swamp runtime memory model.
//
// These benchmarks measure the performance of the dynamic arena's bump
// allocator, including sequential allocations, mixed workloads, and the
// cost of a reset between top-level invocations.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use swamp_mem::DynamicArena;

/// Benchmark sequential allocations of different sizes.
fn bench_sequential_allocations(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_alloc");
    group.sample_size(1000);

    for size in &[4, 16, 64, 256, 1024, 4096] {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut arena = DynamicArena::new(1024 * 1024);
            b.iter(|| arena.alloc(black_box(size), 1, 8).unwrap());
        });
    }

    group.finish();
}

/// Benchmark the cost of resetting and reusing an arena, as happens between
/// top-level invocations on the same execution context.
fn bench_reset_and_refill(c: &mut Criterion) {
    c.bench_function("reset_and_refill", |b| {
        let mut arena = DynamicArena::new(64 * 1024);
        b.iter(|| {
            for _ in 0..256 {
                arena.alloc(black_box(64), 1, 8).unwrap();
            }
            arena.reset();
        });
    });
}

criterion_group!(benches, bench_sequential_allocations, bench_reset_and_refill);
criterion_main!(benches);
