//! Parent and survivor selection.
//!
//! Parents are chosen by tournament; survivors by elitist (μ+λ) truncation.
//! Both compare fitness directly, so higher is better.
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Eiben & Smith (2015), *Introduction to Evolutionary Computing*, ch. 5

use super::types::{Chromosome, FitnessVector, MatingPool};
use rand::seq::index;
use rand::Rng;

/// Tournament selection without replacement inside each tournament.
///
/// Each tournament samples `tournament_size` distinct indices and keeps the
/// one with maximal fitness; the first sampled wins ties. Tournaments are
/// independent, so an individual may appear in the pool several times.
///
/// # Complexity
/// O(mp_size · tournament_size)
///
/// # Panics
/// Panics if `tournament_size` is 0 or exceeds `fitness.len()`.
pub fn tournament<R: Rng>(
    fitness: &[f64],
    mp_size: usize,
    tournament_size: usize,
    rng: &mut R,
) -> MatingPool {
    assert!(
        tournament_size >= 1 && tournament_size <= fitness.len(),
        "tournament size must be in [1, population size]"
    );

    (0..mp_size)
        .map(|_| {
            let mut entrants = index::sample(rng, fitness.len(), tournament_size).into_iter();
            let mut winner = entrants.next().expect("tournament_size >= 1");
            for idx in entrants {
                if fitness[idx] > fitness[winner] {
                    winner = idx;
                }
            }
            winner
        })
        .collect()
}

/// (μ+λ) survivor selection.
///
/// Parents and offspring compete together; the `mu` fittest survive, ranked
/// best first. Equal fitness keeps merge order (parents before offspring).
/// The best fitness can therefore never decrease.
pub fn mu_plus_lambda(
    population: Vec<Chromosome>,
    fitness: FitnessVector,
    offspring: Vec<Chromosome>,
    offspring_fitness: FitnessVector,
    mu: usize,
) -> (Vec<Chromosome>, FitnessVector) {
    debug_assert_eq!(population.len(), fitness.len());
    debug_assert_eq!(offspring.len(), offspring_fitness.len());

    let mut merged: Vec<(Chromosome, f64)> = population
        .into_iter()
        .zip(fitness)
        .chain(offspring.into_iter().zip(offspring_fitness))
        .collect();

    // `sort_by` is stable, which gives the merge-order tie-break.
    merged.sort_by(|a, b| b.1.total_cmp(&a.1));
    merged.truncate(mu);
    merged.into_iter().unzip()
}
