//! Evolutionary solver for the Euclidean travelling salesman problem.
//!
//! A (μ+λ) genetic algorithm over tour permutations:
//!
//! - **Data**: city coordinates and a cached pairwise distance matrix
//! - **Seeding**: uniform random tours, or cluster-seeded tours built by
//!   iterative nearest-center clustering, in parallel with rayon
//! - **Selection**: tournament parents, elitist (μ+λ) survivors
//! - **Recombination**: cut-and-crossfill and Best-Order Crossover (BOX)
//! - **Mutation**: swap, insertion, inversion, two-opt, scramble, and a
//!   cyclic mix of all five
//!
//! # Architecture
//!
//! The distance matrix and configuration are built once and shared
//! read-only. Everything that changes during a run lives in
//! [`ga::RunState`], which [`ga::TspRunner`] threads through the stages of
//! each generation. Progress reporting and export are [`ga::Observer`]s.

pub mod data;
pub mod error;
pub mod export;
pub mod ga;
pub mod random;

pub use error::{Error, Result};
