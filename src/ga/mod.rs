//! Genetic algorithm for the travelling salesman problem.
//!
//! Chromosomes are permutations of city ids. Each generation runs the same
//! fixed pipeline over an explicit [`RunState`]:
//!
//! 1. [`tournament`] parent selection fills the mating pool
//! 2. [`recombine`] breeds one offspring per pool slot
//! 3. [`mutate_all`] perturbs offspring
//! 4. [`evaluate`] scores the offspring
//! 5. [`mu_plus_lambda`] keeps the fittest `pop_size` of parents + offspring
//!
//! # Key Types
//!
//! - [`RunConfig`]: Immutable run parameters, validated per dataset
//! - [`ConfigFile`]: JSON parameter file
//! - [`TspRunner`]: Executes one or many runs
//! - [`RunResult`], [`GenerationStats`]: What a run reports
//! - [`Observer`]: Hook for progress printing, plotting, and export
//!
//! # Submodules
//!
//! - [`operators`]: Cut-and-crossfill, BOX, and the mutation operators
//!
//! # References
//!
//! - Eiben & Smith (2015), *Introduction to Evolutionary Computing*
//! - Ibrahim & Tawhid (2019), "Best-order crossover for permutation-based
//!   evolutionary algorithms"

mod config;
mod fitness;
mod init;
pub mod operators;
mod runner;
mod selection;
mod types;

pub use config::{
    ConfigFile, InitMethod, MutationKind, RecombinationKind, RunConfig, MAX_CUT_ATTEMPTS,
};
pub use fitness::{evaluate, fitness, GenerationStats};
pub use init::{cluster_tour, initial_population, random_tour};
pub use runner::{
    mutate_all, recombine, step, step_timed, Observer, RunResult, StageTimings, TspRunner,
};
pub use selection::{mu_plus_lambda, tournament};
pub use types::{best_index, is_permutation, Chromosome, FitnessVector, MatingPool, RunState};
