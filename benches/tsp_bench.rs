//! Criterion benchmarks for the tsp-evo generation pipeline.
//!
//! Cities sit on a jittered grid so tour lengths are realistic without
//! shipping a data file.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::seq::SliceRandom;
use rand::Rng;
use tsp_evo::data::{Dataset, DistanceMatrix};
use tsp_evo::ga::operators::{best_order, cut_crossfill};
use tsp_evo::ga::{evaluate, initial_population, step, Chromosome, RecombinationKind, RunConfig, RunState};
use tsp_evo::random::create_rng;

fn grid(n: usize) -> DistanceMatrix {
    let mut rng = create_rng(7);
    let side = (n as f64).sqrt().ceil() as usize;
    let coords: Vec<(f64, f64)> = (0..n)
        .map(|i| {
            let x = (i % side) as f64 * 10.0 + rng.random_range(0.0..1.0);
            let y = (i / side) as f64 * 10.0 + rng.random_range(0.0..1.0);
            (x, y)
        })
        .collect();
    let dataset = Dataset::from_coords(&coords).expect("valid coordinates");
    DistanceMatrix::from_dataset(&dataset).expect("non-empty dataset")
}

fn shuffled(n: usize, seed: u64) -> Chromosome {
    let mut tour: Chromosome = (0..n).collect();
    tour.shuffle(&mut create_rng(seed));
    tour
}

// ===========================================================================
// Fitness
// ===========================================================================

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    for &n in &[100, 500, 1000] {
        let distances = grid(n);
        let population: Vec<Chromosome> = (0..100).map(|s| shuffled(n, s)).collect();
        group.bench_with_input(
            BenchmarkId::from_parameter(n),
            &(population, distances),
            |b, (p, d)| b.iter(|| black_box(evaluate(black_box(p), black_box(d)))),
        );
    }
    group.finish();
}

// ===========================================================================
// Crossover
// ===========================================================================

fn bench_crossover(c: &mut Criterion) {
    let mut group = c.benchmark_group("crossover");

    for &n in &[100, 1000] {
        let p1 = shuffled(n, 1);
        let p2 = shuffled(n, 2);
        let best = shuffled(n, 3);

        group.bench_with_input(BenchmarkId::new("cut_crossfill", n), &(&p1, &p2), |b, (p1, p2)| {
            let mut rng = create_rng(42);
            b.iter(|| black_box(cut_crossfill(p1, p2, &mut rng)))
        });
        group.bench_with_input(
            BenchmarkId::new("best_order", n),
            &(&p1, &p2, &best),
            |b, (p1, p2, best)| {
                let mut rng = create_rng(42);
                b.iter(|| black_box(best_order(p1, p2, best, 6, &mut rng)))
            },
        );
    }
    group.finish();
}

// ===========================================================================
// One generation
// ===========================================================================

fn bench_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generation");
    group.sample_size(10);

    for kind in [RecombinationKind::CutCrossfill, RecombinationKind::BestOrder] {
        let distances = grid(500);
        let config = RunConfig::default().with_recombination(kind).with_seed(42);
        let population =
            initial_population(&config, &distances, 42).expect("population for a valid config");
        let state = RunState::new(population, &distances);

        group.bench_with_input(
            BenchmarkId::from_parameter(kind),
            &(config, distances, state),
            |b, (c, d, s)| {
                let mut rng = create_rng(42);
                b.iter(|| {
                    let mut state = s.clone();
                    step(c, d, &mut state, &mut rng).expect("step on a valid config");
                    black_box(state)
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_evaluate, bench_crossover, bench_generation);
criterion_main!(benches);
