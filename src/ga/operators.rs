//! Permutation crossover and mutation operators for the genetic search.
//!
//! All operators work on job-id permutations of any encoding whose values
//! are bounded by the length (`1..=n` in this crate). Every output is again
//! a permutation of the parents' values.
//!
//! # Crossover Operators
//!
//! - [`obx_crossover`] (OBX): random position mask, order fill
//! - [`pmx_crossover`] (PMX): Goldberg & Lingle (1985), segment swap with remapping
//! - [`opx_crossover`] (OPX): one cut point, prefix plus order fill (asymmetric)
//! - [`tpx_crossover`] (TPX, also used for SB2OX): two cut points, circular order fill
//!
//! # Mutation Operators
//!
//! - [`insert_mutation`]: remove and reinsert at a distinct position
//! - [`interchange_mutation`]: exchange two distinct positions
//! - [`swap_mutation`]: exchange two adjacent positions
//!
//! # References
//!
//! - Goldberg & Lingle (1985), "Alleles, Loci, and the Traveling Salesman Problem"
//! - Davis (1985), "Applying Adaptive Algorithms to Epistatic Domains"
//! - Ruiz & Maroto (2006), "A genetic algorithm for hybrid flowshops with
//!   sequence dependent setup times and machine eligibility"

use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::permutation::{distinct_pair, markers, random_segment};

// ============================================================================
// Operator selection
// ============================================================================

/// Crossover operator used by [`GaRunner`](super::GaRunner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Crossover {
    /// Order-based crossover.
    #[default]
    Obx,
    /// Partially mapped crossover.
    Pmx,
    /// Similar-block two-point order crossover. Same rule as [`Crossover::Tpx`].
    Sb2ox,
    /// One-point order crossover.
    Opx,
    /// Two-point order crossover.
    Tpx,
}

impl Crossover {
    /// Recombines two parents into two children.
    ///
    /// # Panics
    /// Panics if the parents have different lengths.
    pub fn apply<R: Rng>(
        &self,
        parent1: &[usize],
        parent2: &[usize],
        rng: &mut R,
    ) -> (Vec<usize>, Vec<usize>) {
        match self {
            Crossover::Obx => obx_crossover(parent1, parent2, rng),
            Crossover::Pmx => pmx_crossover(parent1, parent2, rng),
            Crossover::Opx => opx_crossover(parent1, parent2, rng),
            Crossover::Sb2ox | Crossover::Tpx => tpx_crossover(parent1, parent2, rng),
        }
    }

    pub const ALL: [Crossover; 5] = [
        Crossover::Obx,
        Crossover::Pmx,
        Crossover::Sb2ox,
        Crossover::Opx,
        Crossover::Tpx,
    ];
}

impl fmt::Display for Crossover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Crossover::Obx => "OBX",
            Crossover::Pmx => "PMX",
            Crossover::Sb2ox => "SB2OX",
            Crossover::Opx => "OPX",
            Crossover::Tpx => "TPX",
        };
        f.write_str(name)
    }
}

impl FromStr for Crossover {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_ascii_lowercase().as_str() {
            "obx" => Ok(Crossover::Obx),
            "pmx" => Ok(Crossover::Pmx),
            "sb2ox" => Ok(Crossover::Sb2ox),
            "opx" => Ok(Crossover::Opx),
            "tpx" => Ok(Crossover::Tpx),
            other => Err(Error::InvalidConfig(format!("unknown crossover '{other}'"))),
        }
    }
}

/// Mutation operator used by [`GaRunner`](super::GaRunner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Mutation {
    #[default]
    Insert,
    Interchange,
    Swap,
}

impl Mutation {
    /// Mutates `perm` in place. Permutations shorter than 2 are left alone.
    pub fn apply<R: Rng>(&self, perm: &mut Vec<usize>, rng: &mut R) {
        match self {
            Mutation::Insert => insert_mutation(perm, rng),
            Mutation::Interchange => interchange_mutation(perm, rng),
            Mutation::Swap => swap_mutation(perm, rng),
        }
    }

    pub const ALL: [Mutation; 3] = [Mutation::Insert, Mutation::Interchange, Mutation::Swap];
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mutation::Insert => "Insert",
            Mutation::Interchange => "Interchange",
            Mutation::Swap => "Swap",
        };
        f.write_str(name)
    }
}

impl FromStr for Mutation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_ascii_lowercase().as_str() {
            "insert" => Ok(Mutation::Insert),
            "interchange" => Ok(Mutation::Interchange),
            "swap" => Ok(Mutation::Swap),
            other => Err(Error::InvalidConfig(format!("unknown mutation '{other}'"))),
        }
    }
}

// ============================================================================
// Crossover operators
// ============================================================================

/// Order-based crossover (OBX).
///
/// A random boolean mask marks positions that each child inherits directly
/// from its own parent. The remaining positions are filled left to right
/// with the other parent's values, in that parent's order, skipping values
/// already placed.
///
/// # Complexity
/// O(n) time, O(n) space
pub fn obx_crossover<R: Rng>(
    parent1: &[usize],
    parent2: &[usize],
    rng: &mut R,
) -> (Vec<usize>, Vec<usize>) {
    let n = parent1.len();
    assert_eq!(n, parent2.len(), "parents must have equal length");
    if n < 2 {
        return (parent1.to_vec(), parent2.to_vec());
    }

    let mask: Vec<bool> = (0..n).map(|_| rng.random_bool(0.5)).collect();
    (
        obx_child(parent1, parent2, &mask),
        obx_child(parent2, parent1, &mask),
    )
}

fn obx_child(keeper: &[usize], filler: &[usize], mask: &[bool]) -> Vec<usize> {
    let n = keeper.len();
    let mut child = vec![0; n];
    let mut used = markers(n);

    for i in (0..n).filter(|&i| mask[i]) {
        child[i] = keeper[i];
        used[keeper[i]] = true;
    }

    let free = (0..n).filter(|&i| !mask[i]);
    let fill = filler.iter().copied().filter(|&v| !used[v]);
    for (i, v) in free.zip(fill) {
        child[i] = v;
    }
    child
}

/// Partially mapped crossover (PMX).
///
/// Two cut points delimit a segment that is swapped between the parents:
/// child 1 takes parent 2's segment and parent 1's genes elsewhere, child 2
/// the reverse. Outside genes that collide with the segment are remapped
/// through the segment's value pairs until they no longer collide.
///
/// # Complexity
/// O(n) expected, O(n·k) worst case for mapping chains of length k
pub fn pmx_crossover<R: Rng>(
    parent1: &[usize],
    parent2: &[usize],
    rng: &mut R,
) -> (Vec<usize>, Vec<usize>) {
    let n = parent1.len();
    assert_eq!(n, parent2.len(), "parents must have equal length");
    if n < 2 {
        return (parent1.to_vec(), parent2.to_vec());
    }

    let (start, end) = random_segment(n, rng);
    (
        pmx_child(parent2, parent1, start, end),
        pmx_child(parent1, parent2, start, end),
    )
}

/// PMX child holding `segment`'s genes on `[start, end]` and `outer`'s
/// genes, remapped, everywhere else.
pub(crate) fn pmx_child(segment: &[usize], outer: &[usize], start: usize, end: usize) -> Vec<usize> {
    let n = segment.len();
    let mut mapping = vec![0; n + 1];
    let mut in_segment = markers(n);
    for i in start..=end {
        mapping[segment[i]] = outer[i];
        in_segment[segment[i]] = true;
    }

    let mut child = outer.to_vec();
    child[start..=end].copy_from_slice(&segment[start..=end]);
    for i in (0..start).chain(end + 1..n) {
        let mut v = child[i];
        while in_segment[v] {
            v = mapping[v];
        }
        child[i] = v;
    }
    child
}

/// One-point order crossover (OPX).
///
/// A cut point `c` in `1..n` is drawn; each child keeps its own parent's
/// first `c` genes and appends the other parent's remaining values in that
/// parent's order. The two children are not mirror images of each other.
pub fn opx_crossover<R: Rng>(
    parent1: &[usize],
    parent2: &[usize],
    rng: &mut R,
) -> (Vec<usize>, Vec<usize>) {
    let n = parent1.len();
    assert_eq!(n, parent2.len(), "parents must have equal length");
    if n < 2 {
        return (parent1.to_vec(), parent2.to_vec());
    }

    let cut = rng.random_range(1..n);
    (
        opx_child(parent1, parent2, cut),
        opx_child(parent2, parent1, cut),
    )
}

fn opx_child(head: &[usize], tail: &[usize], cut: usize) -> Vec<usize> {
    let n = head.len();
    let mut used = markers(n);
    let mut child = Vec::with_capacity(n);
    for &v in &head[..cut] {
        used[v] = true;
        child.push(v);
    }
    child.extend(tail.iter().copied().filter(|&v| !used[v]));
    child
}

/// Two-point order crossover (TPX).
///
/// Each child keeps its own parent's segment between two cut points. The
/// other positions are filled circularly starting right after the second
/// cut, taking the other parent's values scanned circularly from the same
/// point and skipping values already in the segment.
pub fn tpx_crossover<R: Rng>(
    parent1: &[usize],
    parent2: &[usize],
    rng: &mut R,
) -> (Vec<usize>, Vec<usize>) {
    let n = parent1.len();
    assert_eq!(n, parent2.len(), "parents must have equal length");
    if n < 2 {
        return (parent1.to_vec(), parent2.to_vec());
    }

    let (start, end) = random_segment(n, rng);
    (
        tpx_child(parent1, parent2, start, end),
        tpx_child(parent2, parent1, start, end),
    )
}

/// TPX child: `segment`'s genes on `[start, end]`, circular fill from `filler`.
pub(crate) fn tpx_child(segment: &[usize], filler: &[usize], start: usize, end: usize) -> Vec<usize> {
    let n = segment.len();
    let mut child = vec![0; n];
    let mut filled = vec![false; n];
    let mut used = markers(n);

    for i in start..=end {
        child[i] = segment[i];
        filled[i] = true;
        used[segment[i]] = true;
    }

    let mut pos = (end + 1) % n;
    for k in 0..n {
        let v = filler[(end + 1 + k) % n];
        if used[v] {
            continue;
        }
        while filled[pos] {
            pos = (pos + 1) % n;
        }
        child[pos] = v;
        filled[pos] = true;
        used[v] = true;
        pos = (pos + 1) % n;
    }
    child
}

// ============================================================================
// Mutation operators
// ============================================================================

/// Insert mutation: remove the gene at one position and reinsert it at a
/// second, distinct position. The target index is taken before removal, so
/// a forward target shifts down by one.
///
/// # Complexity
/// O(n) due to array shifting
pub fn insert_mutation<R: Rng>(perm: &mut Vec<usize>, rng: &mut R) {
    let n = perm.len();
    if n < 2 {
        return;
    }
    let (from, mut to) = distinct_pair(n, rng);
    let item = perm.remove(from);
    if to > from {
        to -= 1;
    }
    perm.insert(to, item);
}

/// Interchange mutation: exchange genes at two distinct positions.
pub fn interchange_mutation<R: Rng>(perm: &mut [usize], rng: &mut R) {
    let n = perm.len();
    if n < 2 {
        return;
    }
    let (i, j) = distinct_pair(n, rng);
    perm.swap(i, j);
}

/// Swap mutation: exchange genes at positions `p` and `p + 1`.
pub fn swap_mutation<R: Rng>(perm: &mut [usize], rng: &mut R) {
    let n = perm.len();
    if n < 2 {
        return;
    }
    let p = rng.random_range(0..n - 1);
    perm.swap(p, p + 1);
}

/// Shuffles the genes occupying a random half of the positions among
/// those positions. The other half stays in place.
pub fn half_genes_shuffle<R: Rng>(perm: &mut [usize], rng: &mut R) {
    let n = perm.len();
    if n == 0 {
        return;
    }
    let half = (n / 2).max(1);

    let mut positions: Vec<usize> = (0..n).collect();
    positions.shuffle(rng);
    positions.truncate(half);

    let mut genes: Vec<usize> = positions.iter().map(|&p| perm[p]).collect();
    genes.shuffle(rng);
    for (&p, g) in positions.iter().zip(genes) {
        perm[p] = g;
    }
}

// ============================================================================
// Tests
// ============================================================================
