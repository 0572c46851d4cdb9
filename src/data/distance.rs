//! Pairwise distance matrix with an on-disk cache.

use super::dataset::Dataset;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// Dense symmetric `n × n` matrix of Euclidean distances.
///
/// Stored row-major in a single allocation. Immutable once built;
/// `get(i, i) == 0` and `get(i, j) == get(j, i)` for every valid pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<f64>,
}

/// On-disk layout of the cache file.
#[derive(Serialize, Deserialize)]
struct CacheFile {
    fingerprint: String,
    matrix: DistanceMatrix,
}

impl DistanceMatrix {
    /// Computes all pairwise distances of a dataset.
    ///
    /// Only the upper triangle is computed; the lower triangle is mirrored so
    /// the matrix is exactly symmetric.
    pub fn from_dataset(dataset: &Dataset) -> Result<Self> {
        let n = dataset.len();
        if n == 0 {
            return Err(Error::Data("cannot build a distance matrix for 0 cities".into()));
        }
        let cities = dataset.cities();
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = cities[i].distance_to(&cities[j]);
                data[i * n + j] = d;
                data[j * n + i] = d;
            }
        }
        Ok(Self { n, data })
    }

    /// Loads the matrix from `cache_path` when it was built for the same
    /// dataset; otherwise computes it and writes the cache.
    ///
    /// A cache built for a different dataset is overwritten.
    #[tracing::instrument(level = "debug", skip(dataset), fields(cities = dataset.len()))]
    pub fn load_or_compute(dataset: &Dataset, cache_path: &Path) -> Result<Self> {
        let fingerprint = dataset.fingerprint();

        if cache_path.is_file() {
            match Self::load_cache(cache_path, &fingerprint) {
                Ok(matrix) => {
                    debug!(path = %cache_path.display(), "distance cache hit");
                    return Ok(matrix);
                }
                Err(Error::Cache(reason)) => {
                    warn!(path = %cache_path.display(), %reason, "stale distance cache, recomputing");
                }
                Err(e) => return Err(e),
            }
        }

        let matrix = Self::from_dataset(dataset)?;
        let file = CacheFile {
            fingerprint,
            matrix,
        };
        let bytes = serde_json::to_vec(&file).map_err(|e| Error::json(cache_path, e))?;
        std::fs::write(cache_path, bytes).map_err(|e| Error::io(cache_path, e))?;
        info!(path = %cache_path.display(), "distance matrix computed and cached");
        Ok(file.matrix)
    }

    fn load_cache(path: &Path, fingerprint: &str) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        let file: CacheFile =
            serde_json::from_slice(&bytes).map_err(|e| Error::Cache(e.to_string()))?;
        if file.fingerprint != fingerprint {
            return Err(Error::Cache(format!(
                "built for dataset {}, expected {fingerprint}",
                file.fingerprint
            )));
        }
        if file.matrix.data.len() != file.matrix.n * file.matrix.n {
            return Err(Error::Cache("matrix size does not match its dimension".into()));
        }
        Ok(file.matrix)
    }

    /// Number of cities.
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Distance between cities `i` and `j`.
    ///
    /// # Panics
    /// Panics if either id is `>= len()`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.n && j < self.n, "city id out of range");
        self.data[i * self.n + j]
    }

    /// Row `i` of the matrix: distances from city `i` to every city.
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    /// Cyclic length of a tour, including the closing edge back to the start.
    pub fn tour_length(&self, tour: &[usize]) -> f64 {
        if tour.len() < 2 {
            return 0.0;
        }
        let open: f64 = tour.windows(2).map(|w| self.get(w[0], w[1])).sum();
        open + self.get(tour[tour.len() - 1], tour[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;
    use rand::Rng;

    fn five_cities() -> Dataset {
        Dataset::from_coords(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (2.0, 2.0)])
            .unwrap()
    }

    #[test]
    fn test_known_distances() {
        let dm = DistanceMatrix::from_dataset(&five_cities()).unwrap();
        assert_eq!(dm.len(), 5);
        assert!((dm.get(0, 1) - 1.0).abs() < 1e-12);
        assert!((dm.get(0, 2) - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_symmetric_zero_diagonal() {
        let dm = DistanceMatrix::from_dataset(&five_cities()).unwrap();
        for i in 0..5 {
            assert_eq!(dm.get(i, i), 0.0);
            for j in 0..5 {
                assert_eq!(dm.get(i, j), dm.get(j, i));
            }
        }
    }

    #[test]
    fn test_square_tour_length() {
        let dm = DistanceMatrix::from_dataset(&five_cities()).unwrap();
        assert!((dm.tour_length(&[0, 1, 2, 3]) - 4.0).abs() < 1e-12);
        assert_eq!(dm.tour_length(&[2]), 0.0);
    }

    #[test]
    fn test_row() {
        let dm = DistanceMatrix::from_dataset(&five_cities()).unwrap();
        assert_eq!(dm.row(0).len(), 5);
        assert_eq!(dm.row(3)[0], dm.get(3, 0));
    }

    #[test]
    fn test_cache_round_trip_and_invalidation() {
        let path = std::env::temp_dir().join(format!(
            "tsp-evo-cache-{}-{}.distance",
            std::process::id(),
            line!()
        ));
        let _ = std::fs::remove_file(&path);

        let mut rng = create_rng(42);
        let coords: Vec<(f64, f64)> = (0..200)
            .map(|_| (rng.random_range(0.0..10_000.0), rng.random_range(0.0..10_000.0)))
            .collect();
        let ds = Dataset::from_coords(&coords).unwrap();
        let computed = DistanceMatrix::from_dataset(&ds).unwrap();
        let fresh = DistanceMatrix::load_or_compute(&ds, &path).unwrap();
        assert!(path.is_file());
        let cached = DistanceMatrix::load_or_compute(&ds, &path).unwrap();

        // Cached distances must be bit-identical, or same-seed runs diverge.
        let mismatches = (0..200)
            .flat_map(|i| (0..200).map(move |j| (i, j)))
            .filter(|&(i, j)| {
                cached.get(i, j).to_bits() != computed.get(i, j).to_bits()
                    || fresh.get(i, j).to_bits() != computed.get(i, j).to_bits()
            })
            .count();
        assert_eq!(mismatches, 0);

        // A different dataset must not reuse the stale cache.
        let other = Dataset::from_coords(&[(0.0, 0.0), (3.0, 4.0)]).unwrap();
        let dm = DistanceMatrix::load_or_compute(&other, &path).unwrap();
        assert_eq!(dm.len(), 2);
        assert!((dm.get(0, 1) - 5.0).abs() < 1e-12);

        let _ = std::fs::remove_file(&path);
    }
}
