//! Swarm configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::operators::{PsoCrossover, PsoMutation};

/// Configuration for the discrete particle swarm.
///
/// Unlike the GA, the swarm runs for a fixed number of generations.
///
/// ```
/// use u_flowshop::pso::{PsoConfig, PsoCrossover, PsoMutation};
///
/// let config = PsoConfig::default()
///     .with_generations(200)
///     .with_learning(0.3, 0.5)
///     .with_crossover(PsoCrossover::Order)
///     .with_mutation(PsoMutation::Swap);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PsoConfig {
    /// Number of particles.
    pub population_size: usize,

    /// Number of generations to run.
    pub generations: usize,

    /// Probability of recombining with the particle's personal best.
    pub c1: f64,

    /// Probability of recombining with the swarm's global best.
    pub c2: f64,

    /// Probability that the history-learning mutation fires.
    pub mutation_prob: f64,

    pub crossover: PsoCrossover,

    pub mutation: PsoMutation,

    /// Apply the insertion local search to every particle on generations
    /// divisible by this value (0-based, so generation 0 included).
    /// `None` disables it.
    pub local_search_interval: Option<usize>,

    /// Random seed for reproducibility. `None` uses a random seed.
    pub seed: Option<u64>,
}

impl Default for PsoConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            generations: 500,
            c1: 0.2,
            c2: 0.2,
            mutation_prob: 0.9,
            crossover: PsoCrossover::default(),
            mutation: PsoMutation::default(),
            local_search_interval: Some(5),
            seed: None,
        }
    }
}

impl PsoConfig {
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_generations(mut self, n: usize) -> Self {
        self.generations = n;
        self
    }

    /// Sets `c1` and `c2`, each clamped to `[0, 1]`.
    pub fn with_learning(mut self, c1: f64, c2: f64) -> Self {
        self.c1 = c1.clamp(0.0, 1.0);
        self.c2 = c2.clamp(0.0, 1.0);
        self
    }

    pub fn with_mutation_prob(mut self, p: f64) -> Self {
        self.mutation_prob = p.clamp(0.0, 1.0);
        self
    }

    pub fn with_crossover(mut self, crossover: PsoCrossover) -> Self {
        self.crossover = crossover;
        self
    }

    pub fn with_mutation(mut self, mutation: PsoMutation) -> Self {
        self.mutation = mutation;
        self
    }

    pub fn with_local_search_interval(mut self, interval: Option<usize>) -> Self {
        self.local_search_interval = interval;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.population_size == 0 {
            return Err("population_size must be at least 1".into());
        }
        if self.generations == 0 {
            return Err("generations must be at least 1".into());
        }
        for (name, p) in [
            ("c1", self.c1),
            ("c2", self.c2),
            ("mutation_prob", self.mutation_prob),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(format!("{name} must be in [0, 1]"));
            }
        }
        if self.local_search_interval == Some(0) {
            return Err("local_search_interval must be positive or None".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PsoConfig::default();
        assert_eq!(config.population_size, 100);
        assert_eq!(config.generations, 500);
        assert!((config.c1 - 0.2).abs() < 1e-12);
        assert!((config.c2 - 0.2).abs() < 1e-12);
        assert!((config.mutation_prob - 0.9).abs() < 1e-12);
        assert_eq!(config.crossover, PsoCrossover::Ptl);
        assert_eq!(config.mutation, PsoMutation::MultiInsert);
        assert_eq!(config.local_search_interval, Some(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders_clamp() {
        let config = PsoConfig::default()
            .with_learning(-1.0, 3.0)
            .with_mutation_prob(1.5);
        assert_eq!(config.c1, 0.0);
        assert_eq!(config.c2, 1.0);
        assert_eq!(config.mutation_prob, 1.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(PsoConfig::default().with_population_size(0).validate().is_err());
        assert!(PsoConfig::default().with_generations(0).validate().is_err());
        assert!(PsoConfig::default()
            .with_local_search_interval(Some(0))
            .validate()
            .is_err());
        let mut config = PsoConfig::default();
        config.c1 = 1.2;
        assert!(config.validate().is_err());
    }
}
