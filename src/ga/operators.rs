//! Permutation crossover and mutation operators for tours.
//!
//! Every operator takes and returns permutations of `0..n`; none can add,
//! drop, or duplicate a city.
//!
//! # Crossover Operators
//!
//! - [`cut_crossfill`]: single cut, tail filled from the mate in cyclic order
//! - [`best_order`] (BOX): multi-segment, per-segment order from self, mate,
//!   or the best individual of the generation
//!
//! # Mutation Operators
//!
//! - [`swap_mutation`]: exchange two distinct positions, O(1)
//! - [`insertion_mutation`]: move one city to the far end of a window, O(w)
//! - [`inversion_mutation`]: reverse a window, O(w)
//! - [`two_opt_mutation`]: reverse the two edge pairs bracketing a window, O(1)
//! - [`scramble_mutation`]: shuffle a window, O(w)
//!
//! Window operators use a width tied to the cluster size of cluster seeding,
//! so perturbations stay local to roughly one cluster.
//!
//! # References
//!
//! - Eiben & Smith (2015), *Introduction to Evolutionary Computing*, ch. 4
//! - Ibrahim & Tawhid (2019), "Best-order crossover for permutation-based
//!   evolutionary algorithms", *Applied Intelligence* 49, 1427–1445

use super::config::{MutationKind, MAX_CUT_ATTEMPTS};
use super::types::Chromosome;
use crate::error::{Error, Result};
use rand::seq::{index, SliceRandom};
use rand::Rng;

// ============================================================================
// Cut-and-crossfill
// ============================================================================

/// Cut-and-crossfill crossover.
///
/// Picks one cut `c` in `[0, n-2]` and builds both children with
/// [`cut_crossfill_at`].
///
/// # Panics
/// Panics if parents have different lengths or are empty.
pub fn cut_crossfill<R: Rng>(
    parent1: &[usize],
    parent2: &[usize],
    rng: &mut R,
) -> (Chromosome, Chromosome) {
    let n = parent1.len();
    assert_eq!(n, parent2.len(), "parents must have equal length");
    assert!(n > 0, "parents must not be empty");

    if n == 1 {
        return (parent1.to_vec(), parent2.to_vec());
    }

    let cut = rng.random_range(0..=n - 2);
    cut_crossfill_at(parent1, parent2, cut)
}

/// Cut-and-crossfill with a fixed cut.
///
/// Child 1 keeps `parent1[0..=cut]`, then scans `parent2` cyclically from
/// `cut + 1`, appending every city not yet placed. Child 2 is symmetric.
pub fn cut_crossfill_at(
    parent1: &[usize],
    parent2: &[usize],
    cut: usize,
) -> (Chromosome, Chromosome) {
    (
        crossfill_child(parent1, parent2, cut),
        crossfill_child(parent2, parent1, cut),
    )
}

/// Build one child: prefix from `template`, remaining cities from `donor`.
fn crossfill_child(template: &[usize], donor: &[usize], cut: usize) -> Chromosome {
    let n = template.len();
    let mut child = Vec::with_capacity(n);
    let mut placed = vec![false; n];

    for &city in &template[..=cut] {
        child.push(city);
        placed[city] = true;
    }

    // A full cyclic pass over the donor visits every city once, so the fill
    // completes within n steps.
    for offset in 0..n {
        if child.len() == n {
            break;
        }
        let city = donor[(cut + 1 + offset) % n];
        if !placed[city] {
            child.push(city);
            placed[city] = true;
        }
    }

    child
}

// ============================================================================
// Best-Order Crossover (BOX)
// ============================================================================

/// Where a BOX segment takes its allele order from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentOrder {
    /// Keep the parent's own order (r = 1).
    Own,
    /// Reorder to match the other parent (r = 2).
    Mate,
    /// Reorder to match the best individual of the generation (r = 3).
    Best,
}

impl SegmentOrder {
    const ALL: [SegmentOrder; 3] = [SegmentOrder::Own, SegmentOrder::Mate, SegmentOrder::Best];
}

/// Best-Order Crossover.
///
/// Splits both parents at the same `n_points` cutting points into
/// `n_points - 1` segments and, per segment, draws an independent
/// [`SegmentOrder`]. Each child segment holds exactly the cities of the
/// parent's segment; only their order changes.
///
/// # Errors
/// [`Error::Config`] if `n_points` is outside `[5, n-1]` or no valid cutting
/// sequence is found within [`MAX_CUT_ATTEMPTS`] draws.
pub fn best_order<R: Rng>(
    parent1: &[usize],
    parent2: &[usize],
    best: &[usize],
    n_points: usize,
    rng: &mut R,
) -> Result<(Chromosome, Chromosome)> {
    let cuts = cutting_points(parent1.len(), n_points, rng)?;
    let orders: Vec<SegmentOrder> = (0..cuts.len() - 1)
        .map(|_| SegmentOrder::ALL[rng.random_range(0..SegmentOrder::ALL.len())])
        .collect();
    Ok(best_order_with(parent1, parent2, best, &cuts, &orders))
}

/// Draws BOX cutting points `0 = q0 < q1 < … < q(n-1) = len`.
///
/// Interior points are distinct positions in `[1, len)`. Draws are
/// rejected until every segment length is at most `len / 3`.
pub fn cutting_points<R: Rng>(len: usize, n_points: usize, rng: &mut R) -> Result<Vec<usize>> {
    if n_points < 5 || n_points + 1 > len {
        return Err(Error::config(
            "box_cutting_points_n",
            n_points,
            format!("must be in [5, {}] for {len} cities", len.saturating_sub(1)),
        ));
    }
    let max_segment = len / 3;

    for _ in 0..MAX_CUT_ATTEMPTS {
        let mut cuts = Vec::with_capacity(n_points);
        cuts.push(0);
        cuts.extend(index::sample(rng, len - 1, n_points - 2).into_iter().map(|i| i + 1));
        cuts.push(len);
        cuts[1..n_points - 1].sort_unstable();

        if cuts.windows(2).all(|w| w[1] - w[0] <= max_segment) {
            return Ok(cuts);
        }
    }

    Err(Error::config(
        "box_cutting_points_n",
        n_points,
        format!(
            "no cutting sequence with segments <= {max_segment} found in {MAX_CUT_ATTEMPTS} attempts"
        ),
    ))
}

/// BOX with fixed cutting points and per-segment orders.
///
/// `orders.len()` must equal `cuts.len() - 1`.
pub fn best_order_with(
    parent1: &[usize],
    parent2: &[usize],
    best: &[usize],
    cuts: &[usize],
    orders: &[SegmentOrder],
) -> (Chromosome, Chromosome) {
    let n = parent1.len();
    assert_eq!(n, parent2.len(), "parents must have equal length");
    assert_eq!(n, best.len(), "best individual must match parent length");
    assert_eq!(orders.len() + 1, cuts.len(), "one order per segment");

    let rank1 = positions(parent1);
    let rank2 = positions(parent2);
    let rank_best = positions(best);

    let mut child1 = parent1.to_vec();
    let mut child2 = parent2.to_vec();

    for (w, order) in cuts.windows(2).zip(orders) {
        let (start, end) = (w[0], w[1]);
        match order {
            SegmentOrder::Own => {}
            SegmentOrder::Mate => {
                child1[start..end].sort_unstable_by_key(|&c| rank2[c]);
                child2[start..end].sort_unstable_by_key(|&c| rank1[c]);
            }
            SegmentOrder::Best => {
                child1[start..end].sort_unstable_by_key(|&c| rank_best[c]);
                child2[start..end].sort_unstable_by_key(|&c| rank_best[c]);
            }
        }
    }

    (child1, child2)
}

/// Inverse permutation: `positions(tour)[city]` is the index of `city`.
fn positions(tour: &[usize]) -> Vec<usize> {
    let mut pos = vec![0; tour.len()];
    for (i, &city) in tour.iter().enumerate() {
        pos[city] = i;
    }
    pos
}

// ============================================================================
// Mutation operators
// ============================================================================

/// Applies `kind` once. `window` is the width used by window operators.
///
/// [`MutationKind::Cyclic`] draws one concrete operator per call.
pub fn mutate<R: Rng>(perm: &mut Chromosome, kind: MutationKind, window: usize, rng: &mut R) {
    match kind {
        MutationKind::PermutationSwap => swap_mutation(perm, rng),
        MutationKind::Insertion => insertion_mutation(perm, window, rng),
        MutationKind::Inversion => inversion_mutation(perm, window, rng),
        MutationKind::TwoOpt => two_opt_mutation(perm, rng),
        MutationKind::Scramble => scramble_mutation(perm, window, rng),
        // CONCRETE excludes Cyclic, so this recurses exactly once.
        MutationKind::Cyclic => {
            let concrete =
                MutationKind::CONCRETE[rng.random_range(0..MutationKind::CONCRETE.len())];
            mutate(perm, concrete, window, rng);
        }
    }
}

/// Swap mutation: exchange two distinct random positions.
pub fn swap_mutation<R: Rng>(perm: &mut [usize], rng: &mut R) {
    let n = perm.len();
    if n < 2 {
        return;
    }
    let i = rng.random_range(0..n);
    let mut j = rng.random_range(0..n);
    while j == i {
        j = rng.random_range(0..n);
    }
    swap_at(perm, i, j);
}

/// Deterministic core of [`swap_mutation`]: exchanges positions `i` and `j`.
pub fn swap_at(perm: &mut [usize], i: usize, j: usize) {
    perm.swap(i, j);
}

/// Insertion mutation: remove the city at the window start and reinsert it
/// right after the window end.
pub fn insertion_mutation<R: Rng>(perm: &mut [usize], window: usize, rng: &mut R) {
    if perm.len() < 2 {
        return;
    }
    let (lo, hi) = window_bounds(perm.len(), window, rng);
    insert_after(perm, lo, hi);
}

/// Moves `perm[from]` to position `to`, shifting `perm[from+1..=to]` left.
pub fn insert_after(perm: &mut [usize], from: usize, to: usize) {
    perm[from..=to].rotate_left(1);
}

/// Inversion mutation: reverse a window of the given width.
pub fn inversion_mutation<R: Rng>(perm: &mut [usize], window: usize, rng: &mut R) {
    if perm.len() < 2 {
        return;
    }
    let (lo, hi) = window_bounds(perm.len(), window, rng);
    perm[lo..=hi].reverse();
}

/// Two-opt style mutation: reverse the pair at each end of a 4-city window.
///
/// With window `[a, b, c, d]` the result is `[b, a, d, c]`.
pub fn two_opt_mutation<R: Rng>(perm: &mut [usize], rng: &mut R) {
    if perm.len() < 4 {
        return;
    }
    let lo = rng.random_range(0..=perm.len() - 4);
    two_opt_at(perm, lo);
}

/// Deterministic core of [`two_opt_mutation`], window starting at `lo`.
pub fn two_opt_at(perm: &mut [usize], lo: usize) {
    perm.swap(lo, lo + 1);
    perm.swap(lo + 2, lo + 3);
}

/// Scramble mutation: shuffle the window `[lo, hi)`.
pub fn scramble_mutation<R: Rng>(perm: &mut [usize], window: usize, rng: &mut R) {
    if perm.len() < 2 {
        return;
    }
    let (lo, hi) = window_bounds(perm.len(), window, rng);
    perm[lo..hi].shuffle(rng);
}

/// Picks a window `[lo, hi]` of width `window` around a random anchor.
///
/// The anchor is the start, or the end when the window would run past the
/// last position. Windows wider than the tour are cut at position 0.
fn window_bounds<R: Rng>(n: usize, window: usize, rng: &mut R) -> (usize, usize) {
    let anchor = rng.random_range(0..n);
    if anchor + window >= n {
        (anchor.saturating_sub(window), anchor)
    } else {
        (anchor, anchor + window)
    }
}

// ============================================================================
// Tests
// ============================================================================
