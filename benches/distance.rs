//! Benchmarks for distance computations.
//!
//! Pairwise distance blocks dominate both the exact entropy and the
//! coverage ranking; single-pair distances dominate the ball tree.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kdentropy::matrix::{pairwise_distances, self_distances};
use kdentropy::simd::{dot, l2_distance};
use kdentropy::Matrix;
use rand::prelude::*;

// === Generators ===

fn random_matrix(rows: usize, dim: usize, seed: u64) -> Matrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..rows * dim).map(|_| rng.random::<f64>() * 2.0 - 1.0).collect();
    Matrix::new(rows, dim, data).unwrap()
}

// === Benchmarks ===

fn bench_l2_dimensions(c: &mut Criterion) {
    let mut group = c.benchmark_group("l2_distance");

    for dim in [16, 64, 128, 256, 512].iter() {
        group.throughput(Throughput::Elements(*dim as u64));

        let m = random_matrix(2, *dim, 42);
        let a = m.row(0);
        let b = m.row(1);

        group.bench_with_input(BenchmarkId::from_parameter(dim), dim, |bench, _| {
            bench.iter(|| l2_distance(black_box(a), black_box(b)));
        });
    }

    group.finish();
}

fn bench_dot_dimensions(c: &mut Criterion) {
    let mut group = c.benchmark_group("dot_product");

    for dim in [16, 64, 128, 256, 512].iter() {
        group.throughput(Throughput::Elements(*dim as u64));

        let m = random_matrix(2, *dim, 42);
        let a = m.row(0);
        let b = m.row(1);

        group.bench_with_input(BenchmarkId::from_parameter(dim), dim, |bench, _| {
            bench.iter(|| dot(black_box(a), black_box(b)));
        });
    }

    group.finish();
}

fn bench_pairwise(c: &mut Criterion) {
    let mut group = c.benchmark_group("pairwise_distances");

    let dim = 64; // Typical descriptor width

    for n in [100, 500, 1000].iter() {
        group.throughput(Throughput::Elements((*n * *n) as u64));

        let a = random_matrix(*n, dim, 1);
        let b = random_matrix(*n, dim, 2);

        group.bench_with_input(BenchmarkId::from_parameter(n), n, |bench, _| {
            bench.iter(|| pairwise_distances(black_box(&a), black_box(&b)).unwrap());
        });
    }

    group.finish();
}

fn bench_self_distances(c: &mut Criterion) {
    let mut group = c.benchmark_group("self_distances");

    for n in [100, 500].iter() {
        group.throughput(Throughput::Elements((*n * *n / 2) as u64));

        let a = random_matrix(*n, 64, 3);

        group.bench_with_input(BenchmarkId::from_parameter(n), n, |bench, _| {
            bench.iter(|| self_distances(black_box(&a)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_l2_dimensions,
    bench_dot_dimensions,
    bench_pairwise,
    bench_self_distances,
);
criterion_main!(benches);
