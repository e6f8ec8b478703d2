// Write performance benchmarks for SkipFilter

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use skipfilter::SkipFilter;
use std::hint::black_box;

fn benchmark_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("add");

    for size in [1_000u64, 10_000, 100_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut engine =
                    SkipFilter::new(|value: &u64, filter: &u64| value % filter == 0, 0);
                for i in 0..size {
                    engine.add(i);
                }
                black_box(engine.len())
            });
        });
    }

    group.finish();
}

fn benchmark_add_remove_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_remove_churn");

    for size in [1_000u64, 10_000] {
        group.throughput(Throughput::Elements(size * 2));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut engine =
                    SkipFilter::new(|value: &u64, filter: &u64| value % filter == 0, 0);
                for i in 0..size {
                    engine.add(i);
                }
                for i in 0..size {
                    engine.remove(&i);
                }
                black_box(engine.len())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_add, benchmark_add_remove_churn);
criterion_main!(benches);
