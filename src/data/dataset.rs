//! City coordinates.
//!
//! A [`Dataset`] is a contiguous, 0-based mapping from city id to `(x, y)`.
//! Data files use the common TSPLIB-like layout of one `id x y` triple per
//! line with 1-based ids, which are shifted to 0-based on load.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A city with a 0-based id and planar coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: usize,
    pub x: f64,
    pub y: f64,
}

impl City {
    pub fn new(id: usize, x: f64, y: f64) -> Self {
        Self { id, x, y }
    }

    /// Euclidean distance to another city.
    pub fn distance_to(&self, other: &City) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A validated set of cities where `cities[i].id == i` for every `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    cities: Vec<City>,
}

impl Dataset {
    /// Builds a dataset from coordinates, assigning ids `0..len` in order.
    ///
    /// # Errors
    /// [`Error::Data`] if `coords` is empty.
    pub fn from_coords(coords: &[(f64, f64)]) -> Result<Self> {
        let cities = coords
            .iter()
            .enumerate()
            .map(|(id, &(x, y))| City::new(id, x, y))
            .collect();
        Self::from_cities(cities)
    }

    /// Builds a dataset from cities in any order.
    ///
    /// Ids must cover `0..len` exactly once.
    ///
    /// # Errors
    /// - [`Error::Data`] if the set is empty, has duplicate ids, or
    ///   non-finite coordinates
    /// - [`Error::CityOutOfRange`] if an id is `>= len`
    pub fn from_cities(mut cities: Vec<City>) -> Result<Self> {
        if cities.is_empty() {
            return Err(Error::Data("dataset contains no cities".into()));
        }
        let len = cities.len();
        let mut seen = vec![false; len];
        for city in &cities {
            if city.id >= len {
                return Err(Error::CityOutOfRange { id: city.id, len });
            }
            if seen[city.id] {
                return Err(Error::Data(format!("duplicate city id {}", city.id)));
            }
            if !city.x.is_finite() || !city.y.is_finite() {
                return Err(Error::Data(format!(
                    "city {} has non-finite coordinates ({}, {})",
                    city.id, city.x, city.y
                )));
            }
            seen[city.id] = true;
        }
        cities.sort_by_key(|c| c.id);
        Ok(Self { cities })
    }

    /// Parses the `id x y` line format with 1-based ids.
    ///
    /// Blank lines and lines starting with `#` are skipped.
    pub fn parse(text: &str) -> Result<Self> {
        let mut cities = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 3 {
                return Err(Error::Data(format!(
                    "line {}: expected `id x y`, got `{line}`",
                    lineno + 1
                )));
            }
            let id: usize = fields[0].parse().map_err(|_| {
                Error::Data(format!("line {}: bad city id `{}`", lineno + 1, fields[0]))
            })?;
            if id == 0 {
                return Err(Error::Data(format!(
                    "line {}: city ids are 1-based, got 0",
                    lineno + 1
                )));
            }
            let x: f64 = parse_coord(fields[1], lineno)?;
            let y: f64 = parse_coord(fields[2], lineno)?;
            cities.push(City::new(id - 1, x, y));
        }
        Self::from_cities(cities)
    }

    /// Reads and parses a data file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&text)
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    /// Looks up a city by id.
    pub fn city(&self, id: usize) -> Result<&City> {
        self.cities.get(id).ok_or(Error::CityOutOfRange {
            id,
            len: self.cities.len(),
        })
    }

    /// Identity of the coordinate set, used to key the distance cache.
    ///
    /// Hex-encoded BLAKE3 digest over the city count and the bit patterns of
    /// every coordinate, in id order.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(self.cities.len() as u64).to_le_bytes());
        for city in &self.cities {
            hasher.update(&city.x.to_bits().to_le_bytes());
            hasher.update(&city.y.to_bits().to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}

fn parse_coord(field: &str, lineno: usize) -> Result<f64> {
    field
        .parse()
        .map_err(|_| Error::Data(format!("line {}: bad coordinate `{field}`", lineno + 1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shifts_ids() {
        let ds = Dataset::parse("1 0.0 0.0\n2 3.0 4.0\n").unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.cities()[1], City::new(1, 3.0, 4.0));
        assert!((ds.cities()[0].distance_to(&ds.cities()[1]) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_out_of_order_and_blank_lines() {
        let ds = Dataset::parse("\n3 2 2\n# comment\n1 0 0\n2 1 1\n").unwrap();
        let ids: Vec<usize> = ds.cities().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(ds.cities()[2].x, 2.0);
    }

    #[test]
    fn test_empty_dataset_is_error() {
        assert!(matches!(Dataset::parse(""), Err(Error::Data(_))));
        assert!(matches!(Dataset::from_coords(&[]), Err(Error::Data(_))));
    }

    #[test]
    fn test_id_gap_is_out_of_range() {
        let err = Dataset::parse("1 0 0\n3 1 1\n").unwrap_err();
        assert!(matches!(err, Error::CityOutOfRange { id: 2, len: 2 }));
    }

    #[test]
    fn test_duplicate_id() {
        let err = Dataset::parse("1 0 0\n1 1 1\n").unwrap_err();
        assert!(matches!(err, Error::Data(_)));
    }

    #[test]
    fn test_malformed_lines() {
        assert!(Dataset::parse("1 0\n").is_err());
        assert!(Dataset::parse("a 0 0\n").is_err());
        assert!(Dataset::parse("1 x 0\n").is_err());
        assert!(Dataset::parse("0 1 1\n").is_err());
    }

    #[test]
    fn test_city_lookup() {
        let ds = Dataset::from_coords(&[(0.0, 0.0), (1.0, 1.0)]).unwrap();
        assert_eq!(ds.city(1).unwrap().y, 1.0);
        assert!(matches!(ds.city(2), Err(Error::CityOutOfRange { id: 2, len: 2 })));
    }

    #[test]
    fn test_fingerprint_tracks_coordinates() {
        let a = Dataset::from_coords(&[(0.0, 0.0), (1.0, 1.0)]).unwrap();
        let b = Dataset::from_coords(&[(0.0, 0.0), (1.0, 1.0)]).unwrap();
        let c = Dataset::from_coords(&[(0.0, 0.0), (1.0, 1.5)]).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
