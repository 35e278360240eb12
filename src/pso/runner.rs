//! Swarm loop execution.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::config::PsoConfig;
use super::operators::iterated_local_search;
use super::types::Particle;
use crate::decoder::Decoder;
use crate::error::{Error, Result};
use crate::model::Problem;
use crate::permutation::random_permutation;
use crate::stats::GenerationStats;

/// Result of a swarm run.
#[derive(Debug, Clone)]
pub struct PsoResult {
    /// Global-best position.
    pub best_position: Vec<usize>,

    pub best_fitness: f64,

    /// Generations executed (always the configured count).
    pub generations: usize,

    pub evaluations: u64,

    /// One row per generation; `best_fitness` is the global best.
    pub history: Vec<GenerationStats>,

    /// Global-best fitness after initialization and after each generation.
    pub fitness_history: Vec<f64>,

    /// Final swarm state.
    pub swarm: Vec<Particle>,

    /// The seed the run actually used.
    pub seed: u64,

    pub elapsed: Duration,
}

/// Executes the discrete particle swarm.
///
/// Every generation, each particle:
///
/// 1. mutates its position (learning from history),
/// 2. with probability `c1` recombines it with its personal best,
/// 3. with probability `c2` recombines it with the global best,
/// 4. on local-search generations, reinserts one random job at its best
///    position,
///
/// then moves to the result unconditionally. Personal and global bests
/// follow only on strict improvement.
///
/// ```
/// use u_flowshop::model::InstanceGenerator;
/// use u_flowshop::pso::{PsoConfig, PsoRunner};
///
/// let problem = InstanceGenerator::new(3).generate(6, &[2, 1]).unwrap();
/// let config = PsoConfig::default()
///     .with_population_size(10)
///     .with_generations(15)
///     .with_seed(7);
/// let result = PsoRunner::run(&problem, &config).unwrap();
/// assert_eq!(result.history.len(), 15);
/// ```
pub struct PsoRunner;

impl PsoRunner {
    /// Runs the swarm from uniformly random positions.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] if the configuration is invalid.
    pub fn run(problem: &Problem, config: &PsoConfig) -> Result<PsoResult> {
        Self::execute(problem, config, None)
    }

    /// Runs the swarm with particle 0 starting at `seed`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] for an invalid configuration and
    /// [`Error::InvalidPermutation`] if `seed` is not a permutation of the
    /// problem's job ids.
    pub fn run_with_seed(problem: &Problem, config: &PsoConfig, seed: &[usize]) -> Result<PsoResult> {
        problem.check_permutation(seed)?;
        Self::execute(problem, config, Some(seed))
    }

    fn execute(problem: &Problem, config: &PsoConfig, seed: Option<&[usize]>) -> Result<PsoResult> {
        config.validate().map_err(Error::InvalidConfig)?;

        let start = Instant::now();
        let rng_seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(rng_seed);
        let mut decoder = Decoder::new(problem);
        let n = problem.num_jobs();

        info!(
            jobs = n,
            stages = problem.num_stages(),
            particles = config.population_size,
            generations = config.generations,
            c1 = config.c1,
            c2 = config.c2,
            mutation_prob = config.mutation_prob,
            crossover = %config.crossover,
            mutation = %config.mutation,
            seeded = seed.is_some(),
            rng_seed,
            "starting particle swarm"
        );

        let mut swarm: Vec<Particle> = (0..config.population_size)
            .map(|p| {
                let position = match seed {
                    Some(seed) if p == 0 => seed.to_vec(),
                    _ => random_permutation(n, &mut rng),
                };
                let fitness = decoder.evaluate(&position);
                Particle::new(position, fitness)
            })
            .collect();

        let mut global_position = Vec::new();
        let mut global_fitness = f64::INFINITY;
        for particle in &swarm {
            if particle.fitness < global_fitness {
                global_fitness = particle.fitness;
                global_position.clone_from(&particle.position);
            }
        }

        let mut history = Vec::with_capacity(config.generations);
        let mut fitness_history = Vec::with_capacity(config.generations + 1);
        fitness_history.push(global_fitness);

        for generation in 0..config.generations {
            let local_search = config
                .local_search_interval
                .is_some_and(|k| generation % k == 0);

            for particle in &mut swarm {
                let mut position = particle.position.clone();
                config
                    .mutation
                    .apply(&mut position, config.mutation_prob, &mut rng);

                if rng.random_range(0.0..1.0) < config.c1 {
                    position = config
                        .crossover
                        .apply(&position, &particle.best_position, &mut rng);
                }
                if rng.random_range(0.0..1.0) < config.c2 {
                    position = config
                        .crossover
                        .apply(&position, &global_position, &mut rng);
                }

                let fitness = if local_search {
                    iterated_local_search(&mut position, &mut decoder, &mut rng)
                } else {
                    decoder.evaluate(&position)
                };

                if fitness < global_fitness {
                    global_fitness = fitness;
                    global_position.clone_from(&position);
                }
                particle.move_to(position, fitness);
            }

            let elapsed = start.elapsed().as_secs_f64();
            let mut stats =
                GenerationStats::from_fitness(generation, swarm.iter().map(|p| p.fitness), elapsed);
            stats.best_fitness = global_fitness;
            history.push(stats);
            fitness_history.push(global_fitness);

            if generation % 100 == 0 || generation + 1 == config.generations {
                debug!(
                    generation,
                    best = global_fitness,
                    avg = stats.avg_fitness,
                    worst = stats.worst_fitness,
                    elapsed_secs = elapsed,
                    "generation"
                );
            }
        }

        let elapsed = start.elapsed();
        info!(
            best = global_fitness,
            evaluations = decoder.evaluations(),
            elapsed_secs = elapsed.as_secs_f64(),
            "particle swarm finished"
        );

        Ok(PsoResult {
            best_position: global_position,
            best_fitness: global_fitness,
            generations: config.generations,
            evaluations: decoder.evaluations(),
            history,
            fitness_history,
            swarm,
            seed: rng_seed,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InstanceGenerator;
    use crate::permutation::is_permutation;
    use crate::pso::{PsoCrossover, PsoMutation};

    fn problem() -> Problem {
        InstanceGenerator::new(17)
            .with_due_date(80)
            .generate(9, &[2, 3])
            .unwrap()
    }

    fn config() -> PsoConfig {
        PsoConfig::default()
            .with_population_size(15)
            .with_generations(25)
            .with_seed(42)
    }

    #[test]
    fn test_history_shape() {
        let result = PsoRunner::run(&problem(), &config()).unwrap();
        assert_eq!(result.generations, 25);
        assert_eq!(result.history.len(), 25);
        assert_eq!(result.fitness_history.len(), 26);
        assert_eq!(result.swarm.len(), 15);
        assert_eq!(result.history[0].generation, 0);
    }

    #[test]
    fn test_global_best_is_monotone() {
        let result = PsoRunner::run(&problem(), &config()).unwrap();
        for w in result.fitness_history.windows(2) {
            assert!(w[1] <= w[0], "global best increased: {} -> {}", w[0], w[1]);
        }
        for stats in &result.history {
            assert!(stats.best_fitness <= stats.avg_fitness + 1e-9);
        }
    }

    #[test]
    fn test_global_best_dominates_personal_bests() {
        let problem = problem();
        let result = PsoRunner::run(&problem, &config()).unwrap();
        assert!(is_permutation(&result.best_position, 9));
        assert_eq!(
            crate::decoder::decode(&result.best_position, &problem),
            result.best_fitness
        );
        for particle in &result.swarm {
            assert!(result.best_fitness <= particle.best_fitness);
            assert!(particle.best_fitness <= particle.fitness);
        }
    }

    #[test]
    fn test_seeded_run_is_deterministic() {
        let problem = problem();
        let a = PsoRunner::run(&problem, &config()).unwrap();
        let b = PsoRunner::run(&problem, &config()).unwrap();
        assert_eq!(a.best_position, b.best_position);
        assert_eq!(a.fitness_history, b.fitness_history);
        assert_eq!(a.evaluations, b.evaluations);
    }

    #[test]
    fn test_seed_permutation_bounds_result() {
        let problem = problem();
        let seed: Vec<usize> = (1..=9).collect();
        let seed_fitness = crate::decoder::decode(&seed, &problem);
        let result = PsoRunner::run_with_seed(&problem, &config(), &seed).unwrap();
        assert!(result.fitness_history[0] <= seed_fitness);
    }

    #[test]
    fn test_local_search_generations_cost_n_decodes() {
        let problem = problem();
        let config = config()
            .with_generations(1)
            .with_local_search_interval(Some(5));
        let result = PsoRunner::run(&problem, &config).unwrap();
        // 15 initial decodes, then 9 per particle in generation 0
        assert_eq!(result.evaluations, 15 + 15 * 9);

        let without = PsoRunner::run(&problem, &config.with_local_search_interval(None)).unwrap();
        assert_eq!(without.evaluations, 15 + 15);
    }

    #[test]
    fn test_all_operator_combinations_run() {
        let problem = problem();
        for crossover in PsoCrossover::ALL {
            for mutation in PsoMutation::ALL {
                let config = config()
                    .with_generations(6)
                    .with_learning(0.8, 0.8)
                    .with_crossover(crossover)
                    .with_mutation(mutation);
                let result = PsoRunner::run(&problem, &config).unwrap();
                assert!(is_permutation(&result.best_position, 9));
                for particle in &result.swarm {
                    assert!(is_permutation(&particle.position, 9));
                }
            }
        }
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let problem = problem();
        assert!(matches!(
            PsoRunner::run(&problem, &config().with_generations(0)),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            PsoRunner::run_with_seed(&problem, &config(), &[1, 2]),
            Err(Error::InvalidPermutation(_))
        ));
    }
}
