//! Fitness evaluation and per-generation statistics.

use super::types::{Chromosome, FitnessVector};
use crate::data::DistanceMatrix;
use serde::Serialize;

/// Negated cyclic tour length of a single chromosome.
#[inline]
pub fn fitness(tour: &[usize], distances: &DistanceMatrix) -> f64 {
    -distances.tour_length(tour)
}

/// Evaluates a chromosome set, returning fitness values in the same order.
///
/// Used identically for the population and for the offspring.
pub fn evaluate(chromosomes: &[Chromosome], distances: &DistanceMatrix) -> FitnessVector {
    chromosomes.iter().map(|c| fitness(c, distances)).collect()
}

/// Summary of one generation, expressed as tour lengths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationStats {
    /// Generation number, 0 for the initial population.
    pub generation: usize,

    /// Shortest tour in the population.
    pub best_length: f64,

    pub mean_length: f64,

    /// Population standard deviation of tour lengths.
    pub sd_length: f64,
}

impl GenerationStats {
    /// Computes statistics from a non-empty fitness vector.
    pub fn from_fitness(generation: usize, fitness: &[f64]) -> Self {
        let n = fitness.len().max(1) as f64;
        let best = fitness.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = fitness.iter().sum::<f64>() / n;
        let variance = fitness.iter().map(|f| (f - mean).powi(2)).sum::<f64>() / n;
        Self {
            generation,
            best_length: -best,
            mean_length: -mean,
            sd_length: variance.sqrt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dataset;

    fn square_plus_one() -> DistanceMatrix {
        let ds = Dataset::from_coords(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (2.0, 2.0)])
            .unwrap();
        DistanceMatrix::from_dataset(&ds).unwrap()
    }

    #[test]
    fn test_unit_square_fitness() {
        let dm = square_plus_one();
        assert!((fitness(&[0, 1, 2, 3], &dm) + 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_rotation_and_reversal_invariant() {
        let dm = square_plus_one();
        let tour = vec![0, 4, 2, 1, 3];
        let f = fitness(&tour, &dm);

        let mut rotated = tour.clone();
        rotated.rotate_left(2);
        let mut reversed = tour.clone();
        reversed.reverse();

        assert!((fitness(&rotated, &dm) - f).abs() < 1e-12);
        assert!((fitness(&reversed, &dm) - f).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_aligns_with_input() {
        let dm = square_plus_one();
        let tours = vec![vec![0, 1, 2, 3, 4], vec![0, 2, 1, 3, 4]];
        let f = evaluate(&tours, &dm);
        assert_eq!(f.len(), 2);
        assert_eq!(f[0], fitness(&tours[0], &dm));
        assert_eq!(f[1], fitness(&tours[1], &dm));
    }

    #[test]
    fn test_stats() {
        let stats = GenerationStats::from_fitness(3, &[-2.0, -4.0, -6.0]);
        assert_eq!(stats.generation, 3);
        assert_eq!(stats.best_length, 2.0);
        assert_eq!(stats.mean_length, 4.0);
        assert!((stats.sd_length - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }
}
