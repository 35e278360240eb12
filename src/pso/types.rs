//! Swarm members.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A particle of the discrete swarm.
///
/// The position is a job permutation. There is no velocity: a particle
/// moves by mutation and by recombination with its personal best and the
/// swarm's global best.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Particle {
    pub position: Vec<usize>,
    pub fitness: f64,
    pub best_position: Vec<usize>,
    pub best_fitness: f64,
}

impl Particle {
    /// A particle whose personal best is its starting position.
    pub fn new(position: Vec<usize>, fitness: f64) -> Self {
        Self {
            best_position: position.clone(),
            best_fitness: fitness,
            position,
            fitness,
        }
    }

    /// Moves unconditionally to `position`; the personal best follows only
    /// on strict improvement. Returns `true` if the personal best changed.
    pub fn move_to(&mut self, position: Vec<usize>, fitness: f64) -> bool {
        let improved = fitness < self.best_fitness;
        if improved {
            self.best_position.clone_from(&position);
            self.best_fitness = fitness;
        }
        self.position = position;
        self.fitness = fitness;
        improved
    }
}
