//! Permutation helpers shared by the GA and PSO operators.
//!
//! Operators in this crate accept any permutation whose values are bounded
//! by its length: both `0..n` and the 1-based job ids `1..=n` qualify. A
//! marker vector of `n + 1` flags is therefore enough to track used values.

use rand::seq::SliceRandom;
use rand::Rng;

/// A uniformly random permutation of job ids `1..=n`.
pub fn random_permutation<R: Rng>(n: usize, rng: &mut R) -> Vec<usize> {
    let mut perm: Vec<usize> = (1..=n).collect();
    perm.shuffle(rng);
    perm
}

/// Returns `true` if `perm` holds `n` distinct values, each `<= n`.
///
/// Accepts both 0-based and 1-based encodings.
pub fn is_permutation(perm: &[usize], n: usize) -> bool {
    if perm.len() != n {
        return false;
    }
    let mut seen = vec![false; n + 1];
    for &v in perm {
        if v > n || seen[v] {
            return false;
        }
        seen[v] = true;
    }
    true
}

/// Fresh used-value markers for a permutation of length `n`.
#[inline]
pub(crate) fn markers(n: usize) -> Vec<bool> {
    vec![false; n + 1]
}

/// Pick a random segment `[start, end]` within `0..n` where `start <= end`.
pub(crate) fn random_segment<R: Rng>(n: usize, rng: &mut R) -> (usize, usize) {
    let a = rng.random_range(0..n);
    let b = rng.random_range(0..n);
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Two distinct random positions in `0..n`. Requires `n >= 2`.
pub(crate) fn distinct_pair<R: Rng>(n: usize, rng: &mut R) -> (usize, usize) {
    let a = rng.random_range(0..n);
    let mut b = rng.random_range(0..n);
    while a == b {
        b = rng.random_range(0..n);
    }
    (a, b)
}
