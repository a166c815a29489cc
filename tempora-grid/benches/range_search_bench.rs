//! Bench range_search over a 4-dimensional grid of 100k points.

#![forbid(unsafe_code)]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use rand::{Rng, SeedableRng, rngs::SmallRng};

use tempora_buffer::BufferAllocator;
use tempora_grid::{GridBuilder, GridConfig, SimpleGrid};

const N: usize = 100_000;

fn build_grid() -> SimpleGrid {
    let mut rng = SmallRng::seed_from_u64(0xDEAD_BEEF_0BAD_F00D);
    let points: Vec<[i64; 4]> = (0..N)
        .map(|_| {
            [
                rng.random_range(0..1_000_000),
                rng.random_range(0..1_000_000),
                rng.random_range(0..1_000_000),
                rng.random_range(0..1_000_000),
            ]
        })
        .collect();
    GridBuilder::new(BufferAllocator::unbounded(), 4, GridConfig::default())
        .unwrap()
        .build(points.as_slice())
        .unwrap()
}

fn bench_range_search(c: &mut Criterion) {
    let grid = build_grid();
    let full_min = grid.mins().to_vec();
    let full_max = grid.maxs().to_vec();

    c.bench_function("range_search/full_scan", |b| {
        b.iter(|| {
            let n = grid.range_search(black_box(&full_min), black_box(&full_max)).count();
            black_box(n)
        })
    });

    c.bench_function("range_search/narrow_box", |b| {
        b.iter(|| {
            let lo = [450_000i64, 450_000, 450_000, 0];
            let hi = [550_000i64, 550_000, 550_000, 1_000_000];
            let n = grid.range_search(black_box(&lo), black_box(&hi)).count();
            black_box(n)
        })
    });

    c.bench_function("range_search/first_hit", |b| {
        b.iter(|| {
            let got = grid
                .range_search(black_box(&full_min), black_box(&full_max))
                .next();
            black_box(got)
        })
    });
}

criterion_group!(benches, bench_range_search);
criterion_main!(benches);
