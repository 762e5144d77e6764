//! Slot arena performance benchmarks.
//!
//! Measures the operations the object heap performs on every allocation:
//! - Inserting into a fresh arena (slot vector growth)
//! - Insert/remove churn (free list reuse)
//! - Lookups by id (generation check + index)

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use vtobj_mem::slots::{SlotArena, SlotId};

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("slots_insert");

    for size in [10, 100, 1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut arena = SlotArena::new();
                for i in 0..size {
                    black_box(arena.insert(i));
                }
            });
        });
    }

    group.finish();
}

fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("slots_churn");

    for size in [10, 100, 1_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut arena = SlotArena::with_capacity(size);

            b.iter(|| {
                let ids: Vec<SlotId> = (0..size).map(|i| arena.insert(i)).collect();
                for id in ids {
                    black_box(arena.remove(id));
                }
            });
        });
    }

    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let mut arena = SlotArena::new();
    let ids: Vec<SlotId> = (0..1_000u64).map(|i| arena.insert(i)).collect();

    c.bench_function("slots_get", |b| {
        b.iter(|| {
            for &id in &ids {
                black_box(arena.get(id));
            }
        });
    });
}

criterion_group!(benches, bench_insert, bench_churn, bench_get);
criterion_main!(benches);
