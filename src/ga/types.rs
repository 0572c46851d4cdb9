//! Data carried between pipeline stages.
//!
//! A [`Chromosome`] is a tour: a permutation of the city ids `0..n`, visited
//! in order and implicitly closed back to the first city. The population and
//! its fitness vector live together in [`RunState`], the only mutable state
//! of a run.

use super::fitness::evaluate;
use crate::data::DistanceMatrix;

/// An ordered, cyclic visiting sequence of every city exactly once.
pub type Chromosome = Vec<usize>;

/// Fitness values aligned 1:1 with a chromosome sequence.
///
/// Each value is the negated cyclic tour length, so higher is better.
pub type FitnessVector = Vec<f64>;

/// Indices into the current population selected for breeding.
pub type MatingPool = Vec<usize>;

/// Mutable state threaded through the stages of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
    /// Current population; replaced wholesale by survivor selection.
    pub population: Vec<Chromosome>,

    /// Fitness of `population`, never stale.
    pub fitness: FitnessVector,

    /// Number of completed generations.
    pub generation: usize,
}

impl RunState {
    /// Generation-zero state: `population` with its fitness evaluated.
    pub fn new(population: Vec<Chromosome>, distances: &DistanceMatrix) -> Self {
        let fitness = evaluate(&population, distances);
        Self {
            population,
            fitness,
            generation: 0,
        }
    }

    /// Index of the fittest individual. Ties resolve to the lowest index.
    ///
    /// # Panics
    /// Panics if the population is empty.
    pub fn best_index(&self) -> usize {
        best_index(&self.fitness)
    }

    /// The fittest individual of the current generation.
    pub fn best(&self) -> &Chromosome {
        &self.population[self.best_index()]
    }

    /// Tour length of the fittest individual.
    pub fn best_length(&self) -> f64 {
        -self.fitness[self.best_index()]
    }
}

/// Index of the maximum value; the first one wins ties.
///
/// # Panics
/// Panics if `fitness` is empty.
pub fn best_index(fitness: &[f64]) -> usize {
    assert!(!fitness.is_empty(), "cannot pick best of empty fitness vector");
    let mut best = 0;
    for (i, &f) in fitness.iter().enumerate().skip(1) {
        if f > fitness[best] {
            best = i;
        }
    }
    best
}

/// Checks that `tour` is a permutation of `0..n`.
pub fn is_permutation(tour: &[usize], n: usize) -> bool {
    if tour.len() != n {
        return false;
    }
    let mut seen = vec![false; n];
    for &city in tour {
        if city >= n || seen[city] {
            return false;
        }
        seen[city] = true;
    }
    true
}
