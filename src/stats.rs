//! Per-generation statistics shared by both search engines.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One row of the search history.
///
/// For the GA, `best_fitness` is the best of the current population; for the
/// swarm it is the global best. `avg_fitness` and `worst_fitness` always
/// describe the current population.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GenerationStats {
    pub generation: usize,
    pub best_fitness: f64,
    pub avg_fitness: f64,
    pub worst_fitness: f64,
    /// Wall-clock seconds since the run started.
    pub elapsed_secs: f64,
}

impl GenerationStats {
    /// Summarizes a population's fitness values.
    ///
    /// An empty iterator yields zeros.
    pub fn from_fitness<I>(generation: usize, fitness: I, elapsed_secs: f64) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut best = f64::INFINITY;
        let mut worst = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut count = 0usize;
        for f in fitness {
            best = best.min(f);
            worst = worst.max(f);
            sum += f;
            count += 1;
        }
        if count == 0 {
            return Self {
                generation,
                best_fitness: 0.0,
                avg_fitness: 0.0,
                worst_fitness: 0.0,
                elapsed_secs,
            };
        }
        Self {
            generation,
            best_fitness: best,
            avg_fitness: sum / count as f64,
            worst_fitness: worst,
            elapsed_secs,
        }
    }

    /// `worst - best`: the diversity measure that drives adaptive mutation.
    pub fn spread(&self) -> f64 {
        self.worst_fitness - self.best_fitness
    }
}

/// Index of the lowest fitness, first on ties.
pub(crate) fn argmin<I: IntoIterator<Item = f64>>(fitness: I) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, f) in fitness.into_iter().enumerate() {
        match best {
            Some((_, b)) if f >= b => {}
            _ => best = Some((i, f)),
        }
    }
    best.map(|(i, _)| i)
}

/// Index of the highest fitness, first on ties.
pub(crate) fn argmax<I: IntoIterator<Item = f64>>(fitness: I) -> Option<usize> {
    let mut worst: Option<(usize, f64)> = None;
    for (i, f) in fitness.into_iter().enumerate() {
        match worst {
            Some((_, w)) if f <= w => {}
            _ => worst = Some((i, f)),
        }
    }
    worst.map(|(i, _)| i)
}
