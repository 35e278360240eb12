//! Discrete swarm operators.
//!
//! Each crossover yields a single offspring from the particle's working
//! position (`parent1`) and a guide (`parent2`: personal or global best).
//! Each mutation gates itself on the configured mutation probability.

use std::fmt;
use std::str::FromStr;

use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::decoder::Decoder;
use crate::error::Error;
use crate::ga::operators::{pmx_child, tpx_child};
use crate::permutation::{markers, random_segment};

// ============================================================================
// Crossover
// ============================================================================

/// Recombination used to learn from the personal and global bests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PsoCrossover {
    /// Order crossover: segment of `parent1`, circular fill from `parent2`.
    Order,
    /// Segment of `parent2` in place, other positions from `parent1` in order.
    TwoPoint,
    /// Partially mapped crossover keeping `parent1`'s segment.
    Pmx,
    /// Per-position coin flip between the parents, missing jobs appended.
    #[default]
    Ptl,
}

impl PsoCrossover {
    pub const ALL: [PsoCrossover; 4] = [
        PsoCrossover::Order,
        PsoCrossover::TwoPoint,
        PsoCrossover::Pmx,
        PsoCrossover::Ptl,
    ];

    /// Produces one offspring.
    ///
    /// # Panics
    /// Panics if the parents have different lengths.
    pub fn apply<R: Rng>(&self, parent1: &[usize], parent2: &[usize], rng: &mut R) -> Vec<usize> {
        let n = parent1.len();
        assert_eq!(n, parent2.len(), "parents must have equal length");
        if n < 2 {
            return parent1.to_vec();
        }

        match self {
            PsoCrossover::Order => {
                let (start, end) = random_segment(n, rng);
                tpx_child(parent1, parent2, start, end)
            }
            PsoCrossover::TwoPoint => {
                let (start, end) = random_segment(n, rng);
                two_point_child(parent1, parent2, start, end)
            }
            PsoCrossover::Pmx => {
                let (start, end) = random_segment(n, rng);
                pmx_child(parent1, parent2, start, end)
            }
            PsoCrossover::Ptl => ptl_crossover(parent1, parent2, rng),
        }
    }
}

/// `guide`'s genes on `[start, end)`, `base`'s remaining genes elsewhere in
/// `base`'s order.
fn two_point_child(base: &[usize], guide: &[usize], start: usize, end: usize) -> Vec<usize> {
    let n = base.len();
    let mut child = vec![0; n];
    let mut used = markers(n);
    for i in start..end {
        child[i] = guide[i];
        used[guide[i]] = true;
    }

    let free = (0..start).chain(end..n);
    let fill = base.iter().copied().filter(|&v| !used[v]);
    for (i, v) in free.zip(fill) {
        child[i] = v;
    }
    child
}

/// PTL crossover.
///
/// Walks the positions, taking `parent1[i]` or `parent2[i]` with equal
/// probability unless that job is already in the offspring. Jobs never
/// taken are appended in ascending id order.
pub fn ptl_crossover<R: Rng>(parent1: &[usize], parent2: &[usize], rng: &mut R) -> Vec<usize> {
    let n = parent1.len();
    let mut used = markers(n);
    let mut child = Vec::with_capacity(n);

    for i in 0..n {
        let v = if rng.random_bool(0.5) {
            parent1[i]
        } else {
            parent2[i]
        };
        if !used[v] {
            used[v] = true;
            child.push(v);
        }
    }

    let mut missing: Vec<usize> = parent1.iter().copied().filter(|&v| !used[v]).collect();
    missing.sort_unstable();
    child.extend(missing);
    child
}

impl fmt::Display for PsoCrossover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PsoCrossover::Order => "Order",
            PsoCrossover::TwoPoint => "TwoPoint",
            PsoCrossover::Pmx => "PMX",
            PsoCrossover::Ptl => "PTL",
        };
        f.write_str(name)
    }
}

impl FromStr for PsoCrossover {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_ascii_lowercase().as_str() {
            "order" | "ox" | "1" => Ok(PsoCrossover::Order),
            "twopoint" | "two-point" | "2" => Ok(PsoCrossover::TwoPoint),
            "pmx" | "3" => Ok(PsoCrossover::Pmx),
            "ptl" | "4" => Ok(PsoCrossover::Ptl),
            other => Err(Error::InvalidConfig(format!("unknown swarm crossover '{other}'"))),
        }
    }
}

// ============================================================================
// Mutation
// ============================================================================

/// Mutation used to learn from the particle's own history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PsoMutation {
    /// Exchange two random positions (possibly the same one).
    Swap,
    /// Move a random job to a random index of the shortened sequence.
    Insert,
    /// One to three gated swaps.
    MultiSwap,
    /// Move a random job, adjusting a forward target for the removal.
    #[default]
    MultiInsert,
}

impl PsoMutation {
    pub const ALL: [PsoMutation; 4] = [
        PsoMutation::Swap,
        PsoMutation::Insert,
        PsoMutation::MultiSwap,
        PsoMutation::MultiInsert,
    ];

    /// Mutates `perm` with probability `prob`.
    pub fn apply<R: Rng>(&self, perm: &mut Vec<usize>, prob: f64, rng: &mut R) {
        let n = perm.len();
        if n < 2 || rng.random_range(0.0..1.0) > prob {
            return;
        }

        match self {
            PsoMutation::Swap => {
                let i = rng.random_range(0..n);
                let j = rng.random_range(0..n);
                perm.swap(i, j);
            }
            PsoMutation::Insert => {
                let i = rng.random_range(0..n);
                let j = rng.random_range(0..n);
                if i != j {
                    let job = perm.remove(i);
                    perm.insert(j, job);
                }
            }
            PsoMutation::MultiSwap => {
                let swaps = rng.random_range(1..=3);
                for _ in 0..swaps {
                    PsoMutation::Swap.apply(perm, prob, rng);
                }
            }
            PsoMutation::MultiInsert => {
                let from = rng.random_range(0..n);
                let to = rng.random_range(0..n);
                if from != to {
                    let job = perm.remove(from);
                    let at = if to > from { to - 1 } else { to };
                    perm.insert(at, job);
                }
            }
        }
    }
}

impl fmt::Display for PsoMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PsoMutation::Swap => "Swap",
            PsoMutation::Insert => "Insert",
            PsoMutation::MultiSwap => "MultiSwap",
            PsoMutation::MultiInsert => "MultiInsert",
        };
        f.write_str(name)
    }
}

impl FromStr for PsoMutation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_ascii_lowercase().as_str() {
            "swap" | "1" => Ok(PsoMutation::Swap),
            "insert" | "2" => Ok(PsoMutation::Insert),
            "multiswap" | "multi-swap" | "3" => Ok(PsoMutation::MultiSwap),
            "multiinsert" | "multi-insert" | "4" => Ok(PsoMutation::MultiInsert),
            other => Err(Error::InvalidConfig(format!("unknown swarm mutation '{other}'"))),
        }
    }
}

// ============================================================================
// Local search
// ============================================================================

/// Destroy-and-rebuild step: removes a random job and reinserts it at the
/// position that minimizes total tardiness (first minimum on ties).
///
/// Costs `n` decodes. Returns the fitness of the rebuilt permutation.
pub fn iterated_local_search<R: Rng>(
    perm: &mut Vec<usize>,
    decoder: &mut Decoder<'_>,
    rng: &mut R,
) -> f64 {
    let n = perm.len();
    if n == 0 {
        return decoder.evaluate(perm);
    }

    let job = perm.remove(rng.random_range(0..n));
    let mut best_pos = 0;
    let mut best_fitness = f64::INFINITY;
    for pos in 0..n {
        perm.insert(pos, job);
        let fitness = decoder.evaluate(perm);
        perm.remove(pos);
        if fitness < best_fitness {
            best_fitness = fitness;
            best_pos = pos;
        }
    }
    perm.insert(best_pos, job);
    best_fitness
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InstanceGenerator, Problem};
    use crate::permutation::{is_permutation, random_permutation};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn parent_pair() -> impl Strategy<Value = (Vec<usize>, Vec<usize>)> {
        (1usize..40).prop_flat_map(|n| {
            let base: Vec<usize> = (1..=n).collect();
            (Just(base.clone()).prop_shuffle(), Just(base).prop_shuffle())
        })
    }

    #[test]
    fn test_two_point_child_is_repaired() {
        // parent2's segment [1, 3) is 4, 5; parent1 supplies 1, 2, 3 in order
        let child = two_point_child(&[1, 2, 3, 4, 5], &[3, 4, 5, 1, 2], 1, 3);
        assert_eq!(child, vec![1, 4, 5, 2, 3]);
    }

    #[test]
    fn test_two_point_empty_segment_copies_base() {
        let child = two_point_child(&[2, 1, 3], &[3, 2, 1], 1, 1);
        assert_eq!(child, vec![2, 1, 3]);
    }

    #[test]
    fn test_ptl_identical_parents() {
        let mut rng = StdRng::seed_from_u64(1);
        let p = vec![4, 2, 5, 1, 3];
        assert_eq!(ptl_crossover(&p, &p, &mut rng), p);
    }

    #[test]
    fn test_ptl_appends_skipped_jobs() {
        // Position 2 always yields 3; a duplicate pick at 0 and 1 pushes the
        // unplaced job to the tail.
        let allowed = [vec![1, 2, 3], vec![1, 3, 2], vec![2, 1, 3], vec![2, 3, 1]];
        let mut seen = [false; 4];
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..200 {
            let child = ptl_crossover(&[1, 2, 3], &[2, 1, 3], &mut rng);
            let idx = allowed.iter().position(|a| *a == child);
            assert!(idx.is_some(), "unexpected offspring {child:?}");
            seen[idx.unwrap()] = true;
        }
        assert!(seen.iter().all(|&s| s), "not every outcome observed: {seen:?}");
    }

    #[test]
    fn test_mutation_zero_probability_is_noop() {
        let mut rng = StdRng::seed_from_u64(2);
        for op in PsoMutation::ALL {
            let mut perm: Vec<usize> = (1..=10).collect();
            op.apply(&mut perm, 0.0, &mut rng);
            assert_eq!(perm, (1..=10).collect::<Vec<_>>(), "{op} mutated");
        }
    }

    #[test]
    fn test_multi_insert_adjusts_forward_target() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let mut perm: Vec<usize> = (1..=6).collect();
            PsoMutation::MultiInsert.apply(&mut perm, 1.0, &mut rng);
            assert!(is_permutation(&perm, 6));
        }
    }

    #[test]
    fn test_parse_names_and_codes() {
        assert_eq!("ptl".parse::<PsoCrossover>().unwrap(), PsoCrossover::Ptl);
        assert_eq!("1".parse::<PsoCrossover>().unwrap(), PsoCrossover::Order);
        assert_eq!("MultiInsert".parse::<PsoMutation>().unwrap(), PsoMutation::MultiInsert);
        assert_eq!("3".parse::<PsoMutation>().unwrap(), PsoMutation::MultiSwap);
        assert!("cycle".parse::<PsoCrossover>().is_err());
        for op in PsoCrossover::ALL {
            assert_eq!(op.to_string().parse::<PsoCrossover>().unwrap(), op);
        }
        for op in PsoMutation::ALL {
            assert_eq!(op.to_string().parse::<PsoMutation>().unwrap(), op);
        }
    }

    #[test]
    fn test_ils_picks_best_insertion() {
        let problem: Problem = InstanceGenerator::new(21)
            .with_due_date(40)
            .generate(8, &[2, 1])
            .unwrap();
        let mut decoder = Decoder::new(&problem);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let mut perm = random_permutation(8, &mut rng);
            let fitness = iterated_local_search(&mut perm, &mut decoder, &mut rng);
            assert!(is_permutation(&perm, 8));
            assert_eq!(decoder.evaluate(&perm), fitness);
        }
    }

    #[test]
    fn test_ils_does_n_decodes() {
        let problem = InstanceGenerator::new(4).generate(5, &[1]).unwrap();
        let mut decoder = Decoder::new(&problem);
        let mut rng = StdRng::seed_from_u64(3);
        let mut perm = vec![1, 2, 3, 4, 5];
        iterated_local_search(&mut perm, &mut decoder, &mut rng);
        assert_eq!(decoder.evaluations(), 5);
    }

    proptest! {
        #[test]
        fn prop_crossovers_yield_permutations((p1, p2) in parent_pair(), seed in any::<u64>()) {
            let n = p1.len();
            let mut rng = StdRng::seed_from_u64(seed);
            for op in PsoCrossover::ALL {
                let child = op.apply(&p1, &p2, &mut rng);
                prop_assert!(is_permutation(&child, n), "{} produced {:?}", op, child);
                prop_assert!(!child.contains(&0));
            }
        }

        #[test]
        fn prop_mutations_yield_permutations((p, _) in parent_pair(), seed in any::<u64>()) {
            let n = p.len();
            let mut rng = StdRng::seed_from_u64(seed);
            for op in PsoMutation::ALL {
                let mut m = p.clone();
                op.apply(&mut m, 1.0, &mut rng);
                prop_assert!(is_permutation(&m, n), "{} produced {:?}", op, m);
            }
        }
    }
}
