//! Population members of the genetic search.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A candidate schedule: a permutation of job ids and its total tardiness.
///
/// Fitness is `f64::INFINITY` until the individual is evaluated, so an
/// unevaluated individual never wins a comparison.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Individual {
    pub permutation: Vec<usize>,
    pub fitness: f64,
}

impl Individual {
    pub fn new(permutation: Vec<usize>) -> Self {
        Self {
            permutation,
            fitness: f64::INFINITY,
        }
    }

    pub fn with_fitness(permutation: Vec<usize>, fitness: f64) -> Self {
        Self {
            permutation,
            fitness,
        }
    }

    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_finite()
    }

    /// Number of jobs.
    pub fn len(&self) -> usize {
        self.permutation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permutation.is_empty()
    }
}
