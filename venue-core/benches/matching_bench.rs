mod common;
use common::*;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use rand::Rng;
use venue_core::prelude::*;

fn bench_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("matching for 10k crossing orders");
    group.throughput(Throughput::Elements(10_000));
    group.bench_function("submit 10k crossing limits", |b| {
        b.iter_batched(
            || {
                let mut e = engine();
                for i in 0..10_000u64 {
                    e.submit(limit_order(i, Side::Sell, 1_000 + (i as i64 % 500), 10));
                }
                e
            },
            |mut e| {
                for i in 10_000..20_000u64 {
                    e.submit(limit_order(i, Side::Buy, 1_500, 10));
                }
            },
            criterion::BatchSize::LargeInput,
        );
    });
    group.finish();
}

fn bench_single_threaded_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("cancel churn");
    group.throughput(Throughput::Elements(1));
    group.bench_function("place then cancel under resting depth", |b| {
        let mut e = engine();
        for i in 0..5_000u64 {
            e.submit(limit_order(i, Side::Sell, 1_000 - (i as i64 % 500), 10));
        }

        let mut rng = rand::rng();
        let mut next_id = 5_000u64;
        b.iter(|| {
            next_id += 1;
            let placed = e.submit(limit_order(next_id, Side::Buy, 900, 10));
            let _ = placed;
            if rng.random_bool(0.5) {
                e.submit(cancel_order(next_id));
            }
        });
    });
    group.finish();
}

fn bench_market_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("market order sweep");
    group.throughput(Throughput::Elements(1));
    group.bench_function("market buy against 1k levels", |b| {
        b.iter_batched(
            || {
                let mut e = engine();
                for i in 0..1_000u64 {
                    e.submit(limit_order(i, Side::Sell, 1_000 + i as i64, 1));
                }
                e
            },
            |mut e| {
                e.submit(market_order(1_000, Side::Buy, 1_000));
            },
            criterion::BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_matching, bench_single_threaded_churn, bench_market_sweep);
criterion_main!(benches);
