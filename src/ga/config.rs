//! Run configuration.
//!
//! [`RunConfig`] holds every parameter that controls a run. It is built once,
//! validated against the dataset size, and then shared read-only by all
//! pipeline stages. [`ConfigFile`] is the JSON form read from disk.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Upper bound on resampling attempts for BOX cutting points.
pub const MAX_CUT_ATTEMPTS: usize = 10_000;

/// Recombination operator applied to each mating pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecombinationKind {
    /// Single cut; the tail is filled from the other parent in cyclic order.
    CutCrossfill,
    /// Best-Order Crossover: per-segment order taken from self, mate, or the
    /// best individual of the generation.
    BestOrder,
}

/// Mutation operator applied to each offspring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    PermutationSwap,
    Insertion,
    Inversion,
    TwoOpt,
    Scramble,
    /// Picks one of the other five uniformly per call.
    Cyclic,
}

/// How the starting population is seeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitMethod {
    /// Independent uniform random permutations.
    Random,
    /// Iterative nearest-center clustering with greedy center chaining.
    Cluster,
}

impl RecombinationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecombinationKind::CutCrossfill => "cut_crossfill",
            RecombinationKind::BestOrder => "best_order",
        }
    }
}

impl MutationKind {
    /// The concrete operators that [`MutationKind::Cyclic`] rotates through.
    pub const CONCRETE: [MutationKind; 5] = [
        MutationKind::Scramble,
        MutationKind::Inversion,
        MutationKind::Insertion,
        MutationKind::PermutationSwap,
        MutationKind::TwoOpt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MutationKind::PermutationSwap => "permutation_swap",
            MutationKind::Insertion => "insertion",
            MutationKind::Inversion => "inversion",
            MutationKind::TwoOpt => "two_opt",
            MutationKind::Scramble => "scramble",
            MutationKind::Cyclic => "cyclic",
        }
    }
}

impl InitMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            InitMethod::Random => "random",
            InitMethod::Cluster => "kmeans",
        }
    }
}

impl FromStr for RecombinationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cut_crossfill" => Ok(RecombinationKind::CutCrossfill),
            "best_order" | "box" => Ok(RecombinationKind::BestOrder),
            other => Err(Error::config(
                "recombination",
                other,
                "expected `cut_crossfill` or `best_order`",
            )),
        }
    }
}

impl FromStr for MutationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "permutation_swap" => Ok(MutationKind::PermutationSwap),
            "insertion" | "insertion_mutation" => Ok(MutationKind::Insertion),
            "inversion" | "inversion_swap" => Ok(MutationKind::Inversion),
            "two_opt" | "two_opt_swap" => Ok(MutationKind::TwoOpt),
            "scramble" => Ok(MutationKind::Scramble),
            "cyclic" => Ok(MutationKind::Cyclic),
            other => Err(Error::config(
                "mutation",
                other,
                "expected one of permutation_swap, insertion, inversion, two_opt, scramble, cyclic",
            )),
        }
    }
}

impl FromStr for InitMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "random" => Ok(InitMethod::Random),
            "kmeans" | "cluster" => Ok(InitMethod::Cluster),
            other => Err(Error::config(
                "initialize_method",
                other,
                "expected `random` or `kmeans`",
            )),
        }
    }
}

impl fmt::Display for RecombinationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for InitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for one evolutionary run.
///
/// # Defaults
///
/// ```
/// use tsp_evo::ga::RunConfig;
///
/// let config = RunConfig::default();
/// assert_eq!(config.pop_size, 100);
/// assert_eq!(config.generations, 500);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use tsp_evo::ga::{MutationKind, RecombinationKind, RunConfig};
///
/// let config = RunConfig::default()
///     .with_pop_size(200)
///     .with_mp_size(200)
///     .with_recombination(RecombinationKind::BestOrder)
///     .with_mutation(MutationKind::Cyclic)
///     .with_seed(7);
/// assert!(config.validate(100).is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of individuals kept after survivor selection (μ).
    pub pop_size: usize,

    /// Size of the mating pool, and therefore of the offspring set (λ).
    /// Must be even: parents are consumed in pairs.
    pub mp_size: usize,

    /// Individuals drawn without replacement per tournament.
    pub tournament_size: usize,

    /// Probability that a mating pair is recombined rather than cloned.
    pub crossover_rate: f64,

    /// Probability that an offspring is mutated.
    pub mutation_rate: f64,

    pub recombination: RecombinationKind,

    pub mutation: MutationKind,

    pub init: InitMethod,

    /// Cluster count as a fraction of the city count: `k = floor(f·N)`.
    ///
    /// Also sets the mutation window `floor(N / k)`.
    pub kca_k_fraction: f64,

    /// Center refinement rounds for cluster seeding. Must be non-negative.
    pub kca_iterations: i64,

    /// Number of BOX cutting points `n`, giving `n - 1` segments.
    pub box_cutting_points_n: usize,

    /// Generations per run.
    pub generations: usize,

    /// Base seed. `None` draws one at random when the run starts.
    pub seed: Option<u64>,

    /// Seed the cluster-based population on the rayon thread pool.
    pub parallel: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            pop_size: 100,
            mp_size: 100,
            tournament_size: 3,
            crossover_rate: 0.9,
            mutation_rate: 0.2,
            recombination: RecombinationKind::CutCrossfill,
            mutation: MutationKind::Inversion,
            init: InitMethod::Random,
            kca_k_fraction: 0.1,
            kca_iterations: 2,
            box_cutting_points_n: 6,
            generations: 500,
            seed: None,
            parallel: true,
        }
    }
}

impl RunConfig {
    pub fn with_pop_size(mut self, n: usize) -> Self {
        self.pop_size = n;
        self
    }

    pub fn with_mp_size(mut self, n: usize) -> Self {
        self.mp_size = n;
        self
    }

    pub fn with_tournament_size(mut self, k: usize) -> Self {
        self.tournament_size = k;
        self
    }

    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate;
        self
    }

    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    pub fn with_recombination(mut self, kind: RecombinationKind) -> Self {
        self.recombination = kind;
        self
    }

    pub fn with_mutation(mut self, kind: MutationKind) -> Self {
        self.mutation = kind;
        self
    }

    pub fn with_init(mut self, method: InitMethod) -> Self {
        self.init = method;
        self
    }

    pub fn with_kca_k_fraction(mut self, fraction: f64) -> Self {
        self.kca_k_fraction = fraction;
        self
    }

    pub fn with_kca_iterations(mut self, iterations: i64) -> Self {
        self.kca_iterations = iterations;
        self
    }

    pub fn with_box_cutting_points(mut self, n: usize) -> Self {
        self.box_cutting_points_n = n;
        self
    }

    pub fn with_generations(mut self, n: usize) -> Self {
        self.generations = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Number of clusters `floor(kca_k_fraction · n_cities)`.
    pub fn cluster_count(&self, n_cities: usize) -> usize {
        (self.kca_k_fraction * n_cities as f64).floor().max(0.0) as usize
    }

    /// Mutation window `floor(n_cities / cluster_count)`.
    ///
    /// Only meaningful after [`validate`](Self::validate) has checked that
    /// the cluster count is at least one.
    pub fn mutation_window(&self, n_cities: usize) -> usize {
        n_cities / self.cluster_count(n_cities).max(1)
    }

    /// Checks every parameter against a dataset of `n_cities` cities.
    ///
    /// Rates out of `[0, 1]` are rejected rather than clamped.
    ///
    /// # Errors
    /// [`Error::Config`] naming the first offending parameter.
    pub fn validate(&self, n_cities: usize) -> Result<()> {
        if n_cities < 2 {
            return Err(Error::config(
                "cities",
                n_cities,
                "a tour needs at least 2 cities",
            ));
        }
        if self.pop_size < 2 {
            return Err(Error::config("pop_size", self.pop_size, "must be at least 2"));
        }
        if self.mp_size < 2 || self.mp_size % 2 != 0 {
            return Err(Error::config(
                "mp_size",
                self.mp_size,
                "must be even and at least 2",
            ));
        }
        if self.tournament_size == 0 || self.tournament_size > self.pop_size {
            return Err(Error::config(
                "tournament_size",
                self.tournament_size,
                format!("must be in [1, pop_size = {}]", self.pop_size),
            ));
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(Error::config(
                "crossover_rate",
                self.crossover_rate,
                "must be in [0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(Error::config(
                "mutation_rate",
                self.mutation_rate,
                "must be in [0, 1]",
            ));
        }
        if !self.kca_k_fraction.is_finite() || self.cluster_count(n_cities) < 1 {
            return Err(Error::config(
                "kca_k_fraction",
                self.kca_k_fraction,
                format!("floor(kca_k_fraction * {n_cities}) must be at least 1"),
            ));
        }
        if self.cluster_count(n_cities) > n_cities {
            return Err(Error::config(
                "kca_k_fraction",
                self.kca_k_fraction,
                format!("yields more clusters than the {n_cities} cities"),
            ));
        }
        if self.kca_iterations < 0 {
            return Err(Error::config(
                "kca_iterations",
                self.kca_iterations,
                "must be non-negative",
            ));
        }
        if self.generations == 0 {
            return Err(Error::config("generations", 0, "must be at least 1"));
        }
        if self.recombination == RecombinationKind::BestOrder {
            let n = self.box_cutting_points_n;
            if n < 5 || n > n_cities - 1 {
                return Err(Error::config(
                    "box_cutting_points_n",
                    n,
                    format!("must be in [5, {}] for {n_cities} cities", n_cities - 1),
                ));
            }
        }
        Ok(())
    }
}

/// JSON parameter file, using the historical key names.
///
/// ```
/// use tsp_evo::ga::ConfigFile;
///
/// let file: ConfigFile = serde_json::from_str(r#"{
///     "pop_size": 50, "mp_size": 50, "tournament_size": 4,
///     "crossover_rate": 0.8, "mutation_rate": 0.3,
///     "recombination": "best_order", "mutation": "cyclic",
///     "initialize_method": "kmeans", "kca_k": 0.2, "kca_iterations": 1,
///     "box_cutting_points_n": 6, "generations": 10
/// }"#).unwrap();
/// let config = file.to_run_config().unwrap();
/// assert_eq!(config.pop_size, 50);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub pop_size: usize,
    pub mp_size: usize,
    pub tournament_size: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    pub recombination: String,
    pub mutation: String,
    pub initialize_method: String,
    pub kca_k: f64,
    pub kca_iterations: i64,
    pub box_cutting_points_n: usize,
    pub generations: usize,
    /// Path of the `id x y` data file.
    #[serde(default)]
    pub datafile: Option<PathBuf>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_parallel() -> bool {
    true
}

impl ConfigFile {
    /// Reads a JSON parameter file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| Error::json(path, e))
    }

    /// Resolves operator names into a [`RunConfig`].
    ///
    /// Range checks that depend on the city count happen later in
    /// [`RunConfig::validate`].
    ///
    /// # Errors
    /// [`Error::Config`] for an unknown operator or initialization name.
    pub fn to_run_config(&self) -> Result<RunConfig> {
        Ok(RunConfig {
            pop_size: self.pop_size,
            mp_size: self.mp_size,
            tournament_size: self.tournament_size,
            crossover_rate: self.crossover_rate,
            mutation_rate: self.mutation_rate,
            recombination: self.recombination.parse()?,
            mutation: self.mutation.parse()?,
            init: self.initialize_method.parse()?,
            kca_k_fraction: self.kca_k,
            kca_iterations: self.kca_iterations,
            box_cutting_points_n: self.box_cutting_points_n,
            generations: self.generations,
            seed: self.seed,
            parallel: self.parallel,
        })
    }
}
