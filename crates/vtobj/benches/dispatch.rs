// Dispatch benchmarks
//
// This benchmark suite measures:
// - Direct table dispatch through one and several levels of inheritance
// - Super call chains
// - Object creation and deletion

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::cmp::Ordering;
use vtobj::{Args, Class, Imp, Integer, ObjRef, Result, Runtime, args};

fn chained_construct(rt: &mut Runtime, obj: ObjRef, args: &mut Args) -> Result<()> {
    rt.super_construct(obj, args)
}

fn chained_compare(rt: &mut Runtime, a: ObjRef, b: ObjRef) -> Result<Ordering> {
    rt.super_compare(a, b)
}

/// Builds a chain of `depth` classes below the root, each overriding
/// construct and compare with a plain super call.
fn chain(depth: usize) -> Class {
    (0..depth).fold(Class::root(), |parent, level| {
        Class::derive(
            &format!("BenchChain{depth}_{level}"),
            parent,
            0,
            [Imp::Construct(chained_construct), Imp::Compare(chained_compare)],
        )
        .unwrap()
    })
}

fn bench_compare(c: &mut Criterion) {
    let mut rt = Runtime::new();
    let a = Integer::new(&mut rt, 1).unwrap();
    let b = Integer::new(&mut rt, 2).unwrap();

    c.bench_function("compare_integers", |bench| {
        bench.iter(|| black_box(rt.compare(black_box(a), black_box(b)).unwrap()))
    });
}

fn bench_super_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("super_compare_chain");

    for depth in [1, 4, 16] {
        let class = chain(depth);
        let mut rt = Runtime::new();
        let a = rt.new_instance(class, args![]).unwrap();
        let b = rt.new_instance(class, args![]).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |bench, _| {
            bench.iter(|| black_box(rt.compare(a, b).unwrap()))
        });
    }

    group.finish();
}

fn bench_new_delete(c: &mut Criterion) {
    let mut group = c.benchmark_group("new_delete");

    group.bench_function("integer", |bench| {
        let mut rt = Runtime::new();
        bench.iter(|| {
            let obj = Integer::new(&mut rt, black_box(7)).unwrap();
            rt.delete(obj).unwrap();
        })
    });

    let deep = chain(8);
    group.bench_function("chain_8", |bench| {
        let mut rt = Runtime::new();
        bench.iter(|| {
            let obj = rt.new_instance(deep, args![]).unwrap();
            rt.delete(obj).unwrap();
        })
    });

    group.finish();
}

fn bench_describe(c: &mut Criterion) {
    let mut rt = Runtime::new();
    let n = Integer::new(&mut rt, 123_456).unwrap();

    c.bench_function("describe_integer", |bench| {
        bench.iter(|| black_box(rt.describe(n).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_compare,
    bench_super_chain,
    bench_new_delete,
    bench_describe
);
criterion_main!(benches);
