//! Seeded random number generation.
//!
//! Every random stream in a run descends from one base seed. Child streams
//! (per run, per initialization worker) are derived with a SplitMix64 step so
//! that sibling workers never share or correlate their seeds, and a run is
//! reproducible regardless of how rayon schedules the workers.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// The RNG type used by every stage of the engine.
pub type EngineRng = StdRng;

/// Creates a deterministic RNG from a 64-bit seed.
pub fn create_rng(seed: u64) -> EngineRng {
    StdRng::seed_from_u64(seed)
}

/// Derives the seed of child stream `index` from a parent seed.
///
/// Uses the SplitMix64 finalizer (Steele, Lea & Flood, 2014) on
/// `parent + (index + 1) * golden_gamma`.
pub fn derive_seed(parent: u64, index: u64) -> u64 {
    const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut z = parent.wrapping_add(index.wrapping_add(1).wrapping_mul(GOLDEN_GAMMA));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
