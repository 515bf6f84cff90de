//! Benchmark suite for wordmaster-algo
//!
//! Run with: cargo bench

use chrono::Utc;
use criterion::{criterion_group, criterion_main, Criterion};
use wordmaster_algo::{apply_outcome, next_review, WordProgress};

fn bench_next_review(c: &mut Criterion) {
    let now = Utc::now();
    c.bench_function("next_review", |b| b.iter(|| next_review(now, 4, 2)));
}

fn bench_apply_outcome(c: &mut Criterion) {
    let now = Utc::now();
    let progress = WordProgress::new(now);
    c.bench_function("apply_outcome", |b| {
        b.iter(|| apply_outcome(&progress, true, now))
    });
}

criterion_group!(benches, bench_next_review, bench_apply_outcome);
criterion_main!(benches);
