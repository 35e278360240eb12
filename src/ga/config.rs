//! GA configuration.
//!
//! [`GaConfig`] holds all parameters that control the evolutionary loop.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::operators::{Crossover, Mutation};
use super::selection::Selection;

/// Configuration for the genetic search.
///
/// # Defaults
///
/// ```
/// use u_flowshop::ga::{Crossover, GaConfig, Mutation, Selection};
///
/// let config = GaConfig::default();
/// assert_eq!(config.population_size, 70);
/// assert_eq!(config.selection, Selection::Tournament(2));
/// assert_eq!(config.crossover, Crossover::Obx);
/// assert_eq!(config.mutation, Mutation::Insert);
/// assert_eq!(config.time_limit_ms, 60_000);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_flowshop::ga::{Crossover, GaConfig, Selection};
///
/// let config = GaConfig::default()
///     .with_population_size(110)
///     .with_selection(Selection::Roulette)
///     .with_crossover(Crossover::Pmx)
///     .with_restart_generations(None)
///     .with_time_limit_ms(5_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GaConfig {
    /// Number of individuals in the population. Typical values: 30-150.
    pub population_size: usize,

    /// Strategy for drawing the mating pool.
    pub selection: Selection,

    pub crossover: Crossover,

    pub mutation: Mutation,

    /// Probability of recombining a parent pair (0.0-1.0).
    ///
    /// When crossover is not applied, both parents pass through unchanged.
    pub crossover_prob: f64,

    /// Base per-child mutation probability (0.0-1.0).
    ///
    /// Escalated each generation as the population's fitness spread
    /// collapses; see [`GaConfig::adaptive_mutation_prob`].
    pub mutation_prob: f64,

    /// Generations without improvement of the best-ever fitness before the
    /// population is restarted. `None` never restarts.
    pub restart_generations: Option<usize>,

    /// Run local search on the generation's best every this many
    /// generations. `None` disables local search.
    pub local_search_freq: Option<usize>,

    /// Local search evaluates `intensity * num_jobs` insert neighbors.
    pub local_search_intensity: usize,

    /// Wall-clock budget in milliseconds, checked once per generation.
    pub time_limit_ms: u64,

    /// Optional generation cap.
    ///
    /// When set, the annealing temperature cools against generation
    /// progress instead of elapsed time, which makes seeded runs
    /// reproducible independent of machine speed.
    pub max_generations: Option<usize>,

    /// Random seed for reproducibility. `None` uses a random seed.
    pub seed: Option<u64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 70,
            selection: Selection::default(),
            crossover: Crossover::default(),
            mutation: Mutation::default(),
            crossover_prob: 0.95,
            mutation_prob: 0.03,
            restart_generations: Some(50),
            local_search_freq: Some(10),
            local_search_intensity: 1,
            time_limit_ms: 60_000,
            max_generations: None,
            seed: None,
        }
    }
}

impl GaConfig {
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_crossover(mut self, crossover: Crossover) -> Self {
        self.crossover = crossover;
        self
    }

    pub fn with_mutation(mut self, mutation: Mutation) -> Self {
        self.mutation = mutation;
        self
    }

    /// Sets the crossover probability, clamped to `[0, 1]`.
    pub fn with_crossover_prob(mut self, p: f64) -> Self {
        self.crossover_prob = p.clamp(0.0, 1.0);
        self
    }

    /// Sets the base mutation probability, clamped to `[0, 1]`.
    pub fn with_mutation_prob(mut self, p: f64) -> Self {
        self.mutation_prob = p.clamp(0.0, 1.0);
        self
    }

    pub fn with_restart_generations(mut self, generations: Option<usize>) -> Self {
        self.restart_generations = generations;
        self
    }

    pub fn with_local_search(mut self, freq: Option<usize>, intensity: usize) -> Self {
        self.local_search_freq = freq;
        self.local_search_intensity = intensity;
        self
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = Some(n);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Preset for quick runs: population 30, 5 s budget, restart after 30.
    pub fn fast() -> Self {
        Self {
            population_size: 30,
            restart_generations: Some(30),
            local_search_freq: Some(5),
            time_limit_ms: 5_000,
            ..Self::default()
        }
    }

    /// The default configuration (same as [`Default`]).
    pub fn balanced() -> Self {
        Self::default()
    }

    /// Preset for long runs: population 150, 300 s budget, local search
    /// intensity 5.
    pub fn quality() -> Self {
        Self {
            population_size: 150,
            local_search_intensity: 5,
            time_limit_ms: 300_000,
            ..Self::default()
        }
    }

    /// Picks a preset from the number of jobs.
    ///
    /// - `num_jobs < 20` → [`fast()`](Self::fast)
    /// - `20 ≤ num_jobs < 50` → [`balanced()`](Self::balanced)
    /// - `num_jobs ≥ 50` → [`quality()`](Self::quality)
    pub fn auto_select(num_jobs: usize) -> Self {
        if num_jobs < 20 {
            Self::fast()
        } else if num_jobs < 50 {
            Self::balanced()
        } else {
            Self::quality()
        }
    }

    /// Mutation probability for a generation whose fitness spread
    /// (`worst - best`) is `diversity`.
    ///
    /// | spread | probability |
    /// |--------|-------------|
    /// | ≥ 50 | base |
    /// | < 50 | `min(0.15, 3 * base)` |
    /// | < 10 | `min(0.25, 5 * base)` |
    /// | < 1 | `min(0.40, 10 * base)` |
    pub fn adaptive_mutation_prob(&self, diversity: f64) -> f64 {
        let base = self.mutation_prob;
        if diversity < 1.0 {
            (base * 10.0).min(0.40)
        } else if diversity < 10.0 {
            (base * 5.0).min(0.25)
        } else if diversity < 50.0 {
            (base * 3.0).min(0.15)
        } else {
            base
        }
    }

    /// Validates the configuration.
    ///
    /// Returns `Err` with a description if any parameter is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.population_size < 2 {
            return Err("population_size must be at least 2".into());
        }
        if !(0.0..=1.0).contains(&self.crossover_prob) {
            return Err("crossover_prob must be in [0, 1]".into());
        }
        if !(0.0..=1.0).contains(&self.mutation_prob) {
            return Err("mutation_prob must be in [0, 1]".into());
        }
        if self.restart_generations == Some(0) {
            return Err("restart_generations must be positive or None".into());
        }
        if self.local_search_freq == Some(0) {
            return Err("local_search_freq must be positive or None".into());
        }
        if self.local_search_freq.is_some() && self.local_search_intensity == 0 {
            return Err("local_search_intensity must be at least 1".into());
        }
        if self.time_limit_ms == 0 {
            return Err("time_limit_ms must be positive".into());
        }
        if self.max_generations == Some(0) {
            return Err("max_generations must be positive or None".into());
        }
        if let Selection::Tournament(0) = self.selection {
            return Err("tournament size must be at least 1".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GaConfig::default();
        assert_eq!(config.population_size, 70);
        assert!((config.crossover_prob - 0.95).abs() < 1e-12);
        assert!((config.mutation_prob - 0.03).abs() < 1e-12);
        assert_eq!(config.restart_generations, Some(50));
        assert_eq!(config.local_search_freq, Some(10));
        assert_eq!(config.local_search_intensity, 1);
        assert!(config.max_generations.is_none());
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = GaConfig::default()
            .with_population_size(150)
            .with_selection(Selection::Roulette)
            .with_crossover(Crossover::Opx)
            .with_mutation(Mutation::Swap)
            .with_crossover_prob(0.8)
            .with_mutation_prob(0.05)
            .with_restart_generations(Some(30))
            .with_local_search(Some(5), 5)
            .with_max_generations(200)
            .with_seed(42);

        assert_eq!(config.population_size, 150);
        assert_eq!(config.selection, Selection::Roulette);
        assert_eq!(config.crossover, Crossover::Opx);
        assert_eq!(config.mutation, Mutation::Swap);
        assert_eq!(config.restart_generations, Some(30));
        assert_eq!(config.local_search_freq, Some(5));
        assert_eq!(config.local_search_intensity, 5);
        assert_eq!(config.max_generations, Some(200));
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_clamp_probabilities() {
        let config = GaConfig::default()
            .with_crossover_prob(-0.5)
            .with_mutation_prob(2.0);
        assert_eq!(config.crossover_prob, 0.0);
        assert_eq!(config.mutation_prob, 1.0);
    }

    #[test]
    fn test_adaptive_mutation_prob() {
        let config = GaConfig::default().with_mutation_prob(0.03);
        assert!((config.adaptive_mutation_prob(100.0) - 0.03).abs() < 1e-12);
        assert!((config.adaptive_mutation_prob(49.0) - 0.09).abs() < 1e-12);
        assert!((config.adaptive_mutation_prob(9.0) - 0.15).abs() < 1e-12);
        assert!((config.adaptive_mutation_prob(0.0) - 0.30).abs() < 1e-12);

        let high = GaConfig::default().with_mutation_prob(0.1);
        assert!((high.adaptive_mutation_prob(49.0) - 0.15).abs() < 1e-12);
        assert!((high.adaptive_mutation_prob(9.0) - 0.25).abs() < 1e-12);
        assert!((high.adaptive_mutation_prob(0.5) - 0.40).abs() < 1e-12);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(GaConfig::default().with_population_size(1).validate().is_err());
        assert!(GaConfig::default()
            .with_restart_generations(Some(0))
            .validate()
            .is_err());
        assert!(GaConfig::default().with_local_search(Some(0), 1).validate().is_err());
        assert!(GaConfig::default().with_local_search(Some(5), 0).validate().is_err());
        assert!(GaConfig::default().with_time_limit_ms(0).validate().is_err());
        assert!(GaConfig::default().with_max_generations(0).validate().is_err());
        assert!(GaConfig::default()
            .with_selection(Selection::Tournament(0))
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_disabled_features_ok() {
        let config = GaConfig::default()
            .with_restart_generations(None)
            .with_local_search(None, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        for config in [GaConfig::fast(), GaConfig::balanced(), GaConfig::quality()] {
            assert!(config.validate().is_ok());
        }
        assert_eq!(GaConfig::fast().population_size, 30);
        assert_eq!(GaConfig::balanced(), GaConfig::default());
        assert_eq!(GaConfig::quality().local_search_intensity, 5);
    }

    #[test]
    fn test_auto_select_boundaries() {
        assert_eq!(GaConfig::auto_select(19), GaConfig::fast());
        assert_eq!(GaConfig::auto_select(20), GaConfig::balanced());
        assert_eq!(GaConfig::auto_select(50), GaConfig::quality());
    }
}
