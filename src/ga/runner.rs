//! Evolutionary loop execution.
//!
//! [`TspRunner`] orchestrates one or more independent runs:
//! seeding → evaluation → (tournament → recombination → mutation →
//! evaluation → (μ+λ) survivors) × generations.
//!
//! Stages run strictly in sequence; each consumes the complete output of the
//! previous one. The only parallel work is cluster seeding (see
//! [`initial_population`]).

use super::config::{RecombinationKind, RunConfig};
use super::fitness::{evaluate, GenerationStats};
use super::init::initial_population;
use super::operators::{best_order, cut_crossfill, mutate};
use super::selection::{mu_plus_lambda, tournament};
use super::types::{best_index, Chromosome, RunState};
use crate::data::DistanceMatrix;
use crate::error::Result;
use crate::random::{create_rng, derive_seed, EngineRng};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Result of one run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Zero-based index of the run.
    pub run: usize,

    /// Seed the run was derived from; replaying it reproduces the run.
    pub seed: u64,

    /// Shortest tour found.
    pub best_tour: Chromosome,

    /// Length of `best_tour`.
    pub best_length: f64,

    /// Generations executed.
    pub generations: usize,

    /// Whether the run was cancelled externally.
    pub cancelled: bool,

    /// Statistics of the initial population followed by one entry per
    /// generation.
    pub history: Vec<GenerationStats>,
}

/// Receives read-only snapshots while a run progresses.
///
/// Printing, plotting, and export collaborators implement this. Every method
/// defaults to a no-op; `()` is the silent observer.
pub trait Observer {
    /// Called once for the seeded population and after every generation.
    fn on_generation(&mut self, _state: &RunState, _stats: &GenerationStats) {}

    /// Called when a run finishes.
    fn on_run_complete(&mut self, _result: &RunResult) -> Result<()> {
        Ok(())
    }
}

impl Observer for () {}

impl<O: Observer + ?Sized> Observer for &mut O {
    fn on_generation(&mut self, state: &RunState, stats: &GenerationStats) {
        (**self).on_generation(state, stats);
    }

    fn on_run_complete(&mut self, result: &RunResult) -> Result<()> {
        (**self).on_run_complete(result)
    }
}

/// Fans every event out to both observers, left first.
impl<A: Observer, B: Observer> Observer for (A, B) {
    fn on_generation(&mut self, state: &RunState, stats: &GenerationStats) {
        self.0.on_generation(state, stats);
        self.1.on_generation(state, stats);
    }

    fn on_run_complete(&mut self, result: &RunResult) -> Result<()> {
        self.0.on_run_complete(result)?;
        self.1.on_run_complete(result)
    }
}

impl<O: Observer> Observer for Option<O> {
    fn on_generation(&mut self, state: &RunState, stats: &GenerationStats) {
        if let Some(inner) = self {
            inner.on_generation(state, stats);
        }
    }

    fn on_run_complete(&mut self, result: &RunResult) -> Result<()> {
        match self {
            Some(inner) => inner.on_run_complete(result),
            None => Ok(()),
        }
    }
}

/// Executes the evolutionary loop.
///
/// # Usage
///
/// ```
/// use tsp_evo::data::{Dataset, DistanceMatrix};
/// use tsp_evo::ga::{RunConfig, TspRunner};
///
/// let dataset = Dataset::from_coords(&[
///     (0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (2.0, 1.0),
///     (2.0, 2.0), (1.0, 2.0), (0.0, 2.0), (0.0, 1.0),
/// ]).unwrap();
/// let distances = DistanceMatrix::from_dataset(&dataset).unwrap();
/// let config = RunConfig::default()
///     .with_pop_size(20)
///     .with_mp_size(20)
///     .with_kca_k_fraction(0.25)
///     .with_generations(50)
///     .with_seed(42);
///
/// let result = TspRunner::run(&config, &distances).unwrap();
/// assert!(result.best_length >= 8.0 - 1e-9);
/// ```
pub struct TspRunner;

impl TspRunner {
    /// Runs a single optimization.
    ///
    /// # Errors
    /// Configuration, data, and seeding errors; all raised before the first
    /// generation.
    pub fn run(config: &RunConfig, distances: &DistanceMatrix) -> Result<RunResult> {
        let base = base_seed(config);
        Self::run_with(config, distances, 0, base, &mut (), None)
    }

    /// Runs `runs` independent optimizations, reporting each to `observer`.
    ///
    /// Run `r` is seeded with `derive_seed(base, r)`, so any single run can
    /// be replayed from the base seed alone.
    pub fn run_many<O: Observer>(
        config: &RunConfig,
        distances: &DistanceMatrix,
        runs: usize,
        observer: &mut O,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<Vec<RunResult>> {
        config.validate(distances.len())?;
        let base = base_seed(config);
        info!(base_seed = base, runs, "starting runs");

        let mut results = Vec::with_capacity(runs);
        for run in 0..runs {
            let result = Self::run_with(config, distances, run, base, observer, cancel.clone())?;
            let cancelled = result.cancelled;
            results.push(result);
            if cancelled {
                break;
            }
        }
        Ok(results)
    }

    /// Runs one optimization with an observer and an optional cancellation
    /// token.
    ///
    /// If `cancel` is set to `true`, the run stops after the current
    /// generation and returns the best tour so far.
    #[tracing::instrument(level = "info", skip(config, distances, observer, cancel), fields(cities = distances.len()))]
    pub fn run_with<O: Observer>(
        config: &RunConfig,
        distances: &DistanceMatrix,
        run: usize,
        base_seed: u64,
        observer: &mut O,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<RunResult> {
        config.validate(distances.len())?;

        let seed = derive_seed(base_seed, run as u64);
        let started = Instant::now();

        // 1. Seed and evaluate the population
        let population = initial_population(config, distances, derive_seed(seed, 0))?;
        let mut state = RunState::new(population, distances);
        let mut rng = create_rng(derive_seed(seed, 1));

        let mut history = Vec::with_capacity(config.generations + 1);
        let stats = GenerationStats::from_fitness(0, &state.fitness);
        observer.on_generation(&state, &stats);
        history.push(stats);

        // 2. Evolutionary loop
        let mut cancelled = false;
        while state.generation < config.generations {
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    cancelled = true;
                    break;
                }
            }

            step(config, distances, &mut state, &mut rng)?;

            let stats = GenerationStats::from_fitness(state.generation, &state.fitness);
            debug!(
                generation = stats.generation,
                best = stats.best_length,
                mean = stats.mean_length,
                sd = stats.sd_length,
                "generation complete"
            );
            observer.on_generation(&state, &stats);
            history.push(stats);
        }

        let result = RunResult {
            run,
            seed,
            best_tour: state.best().clone(),
            best_length: state.best_length(),
            generations: state.generation,
            cancelled,
            history,
        };
        info!(
            run,
            best_length = result.best_length,
            generations = result.generations,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "run finished"
        );
        observer.on_run_complete(&result)?;
        Ok(result)
    }
}

/// Base seed of a batch of runs: the configured one or a fresh random one.
fn base_seed(config: &RunConfig) -> u64 {
    config.seed.unwrap_or_else(rand::random)
}

// ============================================================================
// Stages
// ============================================================================

/// Advances `state` by one generation.
///
/// Parent selection, recombination, mutation, offspring evaluation, and
/// survivor selection, in that order.
pub fn step(
    config: &RunConfig,
    distances: &DistanceMatrix,
    state: &mut RunState,
    rng: &mut EngineRng,
) -> Result<()> {
    step_timed(config, distances, state, rng).map(|_| ())
}

/// Wall-clock time spent in each stage of one generation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageTimings {
    pub selection: Duration,
    pub recombination: Duration,
    pub mutation: Duration,
    pub evaluation: Duration,
    pub survivors: Duration,
}

impl StageTimings {
    pub fn total(&self) -> Duration {
        self.selection + self.recombination + self.mutation + self.evaluation + self.survivors
    }
}

/// [`step`], also reporting how long each stage took.
pub fn step_timed(
    config: &RunConfig,
    distances: &DistanceMatrix,
    state: &mut RunState,
    rng: &mut EngineRng,
) -> Result<StageTimings> {
    let mut timings = StageTimings::default();

    let t = Instant::now();
    let pool = tournament(&state.fitness, config.mp_size, config.tournament_size, rng);
    timings.selection = t.elapsed();

    let t = Instant::now();
    let mut offspring = recombine(config, &state.population, &state.fitness, &pool, rng)?;
    timings.recombination = t.elapsed();

    let t = Instant::now();
    mutate_all(config, distances.len(), &mut offspring, rng);
    timings.mutation = t.elapsed();

    let t = Instant::now();
    let offspring_fitness = evaluate(&offspring, distances);
    timings.evaluation = t.elapsed();

    let t = Instant::now();
    let before = state.fitness[best_index(&state.fitness)];
    let (population, fitness) = mu_plus_lambda(
        std::mem::take(&mut state.population),
        std::mem::take(&mut state.fitness),
        offspring,
        offspring_fitness,
        config.pop_size,
    );
    debug_assert!(fitness[0] >= before, "survivor selection lost the elite");

    state.population = population;
    state.fitness = fitness;
    state.generation += 1;
    timings.survivors = t.elapsed();
    Ok(timings)
}

/// Breeds exactly `mating_pool.len()` offspring.
///
/// The pool is consumed in consecutive pairs. Each pair is recombined with
/// probability `crossover_rate`, otherwise both parents are cloned.
pub fn recombine<R: Rng>(
    config: &RunConfig,
    population: &[Chromosome],
    fitness: &[f64],
    mating_pool: &[usize],
    rng: &mut R,
) -> Result<Vec<Chromosome>> {
    let mp_size = mating_pool.len();
    let best = &population[best_index(fitness)];
    let mut offspring = Vec::with_capacity(mp_size);

    let mut cursor = 0;
    while offspring.len() < mp_size {
        let parent1 = &population[mating_pool[cursor]];
        let parent2 = &population[mating_pool[(cursor + 1) % mp_size]];

        let (child1, child2) = if rng.random_bool(config.crossover_rate) {
            match config.recombination {
                RecombinationKind::CutCrossfill => cut_crossfill(parent1, parent2, rng),
                RecombinationKind::BestOrder => {
                    best_order(parent1, parent2, best, config.box_cutting_points_n, rng)?
                }
            }
        } else {
            (parent1.clone(), parent2.clone())
        };

        offspring.push(child1);
        if offspring.len() < mp_size {
            offspring.push(child2);
        }
        cursor = (cursor + 2) % mp_size;
    }

    Ok(offspring)
}

/// Mutates each offspring independently with probability `mutation_rate`.
pub fn mutate_all<R: Rng>(
    config: &RunConfig,
    n_cities: usize,
    offspring: &mut [Chromosome],
    rng: &mut R,
) {
    let window = config.mutation_window(n_cities);
    for child in offspring.iter_mut() {
        if rng.random_bool(config.mutation_rate) {
            mutate(child, config.mutation, window, rng);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
