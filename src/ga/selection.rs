//! Parent selection for the GA.
//!
//! Each generation draws a mating pool of population-size parent indices;
//! consecutive pairs of the pool are recombined.
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Goldberg & Deb (1991), "A Comparative Analysis of Selection Schemes
//!   Used in Genetic Algorithms"

use std::fmt;
use std::str::FromStr;

use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Selection strategy for building the mating pool.
///
/// All strategies assume **minimization** (lower tardiness = better).
///
/// # Examples
///
/// ```
/// use u_flowshop::ga::Selection;
/// use rand::SeedableRng;
///
/// let fitness = [30.0, 10.0, 20.0, 40.0];
/// let mut rng = rand::rngs::StdRng::seed_from_u64(1);
/// let pool = Selection::default().select_pool(&fitness, &mut rng);
/// assert_eq!(pool.len(), fitness.len());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Selection {
    /// Draw `k` indices uniformly with replacement and keep the fittest.
    ///
    /// The classic configuration is binary tournament (`k = 2`).
    Tournament(usize),

    /// Fitness-proportionate selection on inverted weights
    /// `w_i = max - f_i + 1`. Degenerates to uniform sampling when every
    /// fitness is equal.
    Roulette,
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Tournament(2)
    }
}

impl Selection {
    /// Draws `fitness.len()` parent indices.
    ///
    /// # Panics
    /// Panics if `fitness` is empty.
    pub fn select_pool<R: Rng>(&self, fitness: &[f64], rng: &mut R) -> Vec<usize> {
        assert!(!fitness.is_empty(), "cannot select from empty population");

        match self {
            Selection::Tournament(k) => (0..fitness.len())
                .map(|_| tournament(fitness, *k, rng))
                .collect(),
            Selection::Roulette => roulette_pool(fitness, rng),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Tournament(2) => f.write_str("Tournament"),
            Selection::Tournament(k) => write!(f, "Tournament({k})"),
            Selection::Roulette => f.write_str("Roulette"),
        }
    }
}

impl FromStr for Selection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_ascii_lowercase().as_str() {
            "tournament" => Ok(Selection::Tournament(2)),
            "roulette" | "roulette-wheel" => Ok(Selection::Roulette),
            other => Err(Error::InvalidConfig(format!("unknown selection '{other}'"))),
        }
    }
}

/// Tournament selection: pick k random individuals, return best.
fn tournament<R: Rng>(fitness: &[f64], k: usize, rng: &mut R) -> usize {
    let k = k.max(1);
    let n = fitness.len();

    let mut best_idx = rng.random_range(0..n);
    for _ in 1..k {
        let idx = rng.random_range(0..n);
        if fitness[idx] < fitness[best_idx] {
            best_idx = idx;
        }
    }
    best_idx
}

/// Roulette wheel selection using inverse fitness transformation.
fn roulette_pool<R: Rng>(fitness: &[f64], rng: &mut R) -> Vec<usize> {
    let n = fitness.len();
    let max = fitness.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = fitness.iter().copied().fold(f64::INFINITY, f64::min);

    if max == min {
        return (0..n).map(|_| rng.random_range(0..n)).collect();
    }

    let weights: Vec<f64> = fitness.iter().map(|&f| max - f + 1.0).collect();
    let total: f64 = weights.iter().sum();

    (0..n)
        .map(|_| {
            let spin = rng.random_range(0.0..total);
            let mut cumulative = 0.0;
            for (i, &w) in weights.iter().enumerate() {
                cumulative += w;
                if cumulative >= spin {
                    return i;
                }
            }
            n - 1 // floating-point fallback
        })
        .collect()
}
