use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use phtable::prelude::*;

const KEYS: usize = 8_000;

fn full_run(config: &BenchConfig) -> usize {
    let bench = Benchmark::new(config.clone()).unwrap();
    bench.run().unwrap().total_missing()
}

fn bench_phases(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_then_lookup");
    group.throughput(Throughput::Elements(KEYS as u64));

    for threads in [1_usize, 2, 4].iter() {
        for barrier in [BarrierKind::Spin, BarrierKind::Blocking].iter() {
            let config = BenchConfig::default()
                .with_threads(*threads)
                .with_keys(KEYS)
                .with_barrier(*barrier);
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", barrier), threads),
                &config,
                |b, config| b.iter(|| full_run(config)),
            );
        }
    }
    group.finish();
}

criterion_group! {
    name = phase_benches;
    config = Criterion::default().sample_size(10);
    targets = bench_phases
}
criterion_main!(phase_benches);
