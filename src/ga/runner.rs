//! GA evolutionary loop execution.
//!
//! [`GaRunner`] orchestrates the search:
//! initialization → selection → crossover → mutation → annealed replacement
//! → local search → restart → repeat, until the time budget (or the optional
//! generation cap) is exhausted.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::config::GaConfig;
use super::operators::{half_genes_shuffle, insert_mutation, Mutation};
use super::types::Individual;
use crate::decoder::Decoder;
use crate::error::{Error, Result};
use crate::model::Problem;
use crate::permutation::random_permutation;
use crate::stats::{argmax, argmin, GenerationStats};

/// Result of a GA optimization run.
#[derive(Debug, Clone)]
pub struct GaResult {
    /// The best individual found during the entire run.
    pub best: Individual,

    /// Best fitness value (same as `best.fitness`).
    pub best_fitness: f64,

    /// Total number of generations executed, excluding initialization.
    pub generations: usize,

    /// Number of population restarts triggered by stagnation.
    pub restarts: usize,

    /// Number of decodes performed.
    pub evaluations: u64,

    /// Population statistics: one row for the initial population, then one
    /// per generation.
    pub history: Vec<GenerationStats>,

    /// Best-ever fitness after initialization and after each generation.
    pub fitness_history: Vec<f64>,

    /// The seed the run actually used.
    pub seed: u64,

    pub elapsed: Duration,
}

/// Executes the GA evolutionary loop.
///
/// # Usage
///
/// ```
/// use u_flowshop::ga::{GaConfig, GaRunner};
/// use u_flowshop::model::InstanceGenerator;
///
/// let problem = InstanceGenerator::new(7).generate(8, &[2, 2]).unwrap();
/// let config = GaConfig::fast().with_max_generations(20).with_seed(42);
/// let result = GaRunner::run(&problem, &config).unwrap();
/// assert_eq!(result.generations, 20);
/// assert_eq!(result.history.len(), 21);
/// ```
pub struct GaRunner;

impl GaRunner {
    /// Runs the GA from uniformly random permutations.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] if the configuration is invalid.
    pub fn run(problem: &Problem, config: &GaConfig) -> Result<GaResult> {
        Self::execute(problem, config, None)
    }

    /// Runs the GA with `seed` in the initial population.
    ///
    /// Individual 0 is `seed` itself; the next 30% of the population are
    /// copies with 1-5 mutations applied; the rest is random.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] for an invalid configuration and
    /// [`Error::InvalidPermutation`] if `seed` is not a permutation of the
    /// problem's job ids.
    pub fn run_with_seed(problem: &Problem, config: &GaConfig, seed: &[usize]) -> Result<GaResult> {
        problem.check_permutation(seed)?;
        Self::execute(problem, config, Some(seed))
    }

    fn execute(problem: &Problem, config: &GaConfig, seed: Option<&[usize]>) -> Result<GaResult> {
        config.validate().map_err(Error::InvalidConfig)?;

        let start = Instant::now();
        let rng_seed = config.seed.unwrap_or_else(rand::random);
        info!(
            jobs = problem.num_jobs(),
            stages = problem.num_stages(),
            population = config.population_size,
            selection = %config.selection,
            crossover = %config.crossover,
            mutation = %config.mutation,
            crossover_prob = config.crossover_prob,
            mutation_prob = config.mutation_prob,
            seeded = seed.is_some(),
            rng_seed,
            "starting genetic search"
        );

        let mut search = Search {
            config,
            decoder: Decoder::new(problem),
            rng: StdRng::seed_from_u64(rng_seed),
            population: Vec::with_capacity(config.population_size),
            best: Individual::new(Vec::new()),
            stagnation: 0,
            restarts: 0,
        };

        match seed {
            Some(seed) => search.seeded_population(seed),
            None => search.random_population(),
        }
        search.evaluate_population();

        let mut history = Vec::new();
        history.push(search.stats(0, start.elapsed()));
        let mut fitness_history = vec![search.best.fitness];

        let time_limit = Duration::from_millis(config.time_limit_ms);
        let mut generation = 0;

        loop {
            let elapsed = start.elapsed();
            if elapsed >= time_limit {
                break;
            }
            if config.max_generations.is_some_and(|max| generation >= max) {
                break;
            }
            generation += 1;

            let progress = match config.max_generations {
                Some(max) => (generation - 1) as f64 / max as f64,
                None => elapsed.as_secs_f64() / time_limit.as_secs_f64(),
            };
            let temperature = (50.0 * (1.0 - progress)).max(1.0);

            let step = search.step(temperature);
            search.update_best();
            history.push(search.stats(generation, elapsed));

            if generation % 100 == 0 {
                let last = history[history.len() - 1];
                debug!(
                    generation,
                    best = search.best.fitness,
                    avg = last.avg_fitness,
                    worst = last.worst_fitness,
                    diversity = step.diversity,
                    temperature,
                    mutation_prob = step.mutation_prob,
                    crossovers = step.crossovers,
                    mutations = step.mutations,
                    replacements = step.replacements,
                    annealed = step.annealed,
                    "generation"
                );
            }

            if config
                .local_search_freq
                .is_some_and(|freq| generation % freq == 0)
            {
                search.local_search_best(generation);
            }

            if config
                .restart_generations
                .is_some_and(|limit| search.stagnation >= limit)
            {
                info!(generation, stagnation = search.stagnation, "restarting population");
                search.restart();
            }

            fitness_history.push(search.best.fitness);
        }

        let elapsed = start.elapsed();
        info!(
            generations = generation,
            best = search.best.fitness,
            restarts = search.restarts,
            evaluations = search.decoder.evaluations(),
            elapsed_secs = elapsed.as_secs_f64(),
            "genetic search finished"
        );

        Ok(GaResult {
            best_fitness: search.best.fitness,
            best: search.best,
            generations: generation,
            restarts: search.restarts,
            evaluations: search.decoder.evaluations(),
            history,
            fitness_history,
            seed: rng_seed,
            elapsed,
        })
    }
}

/// Operator counters of one generation.
#[derive(Debug, Default)]
struct StepReport {
    diversity: f64,
    mutation_prob: f64,
    crossovers: usize,
    mutations: usize,
    replacements: usize,
    annealed: usize,
}

/// Mutable state of one run.
struct Search<'a> {
    config: &'a GaConfig,
    decoder: Decoder<'a>,
    rng: StdRng,
    population: Vec<Individual>,
    /// Best-ever individual, kept outside the replaceable population.
    best: Individual,
    stagnation: usize,
    restarts: usize,
}

impl Search<'_> {
    fn num_jobs(&self) -> usize {
        self.decoder.problem().num_jobs()
    }

    fn random_population(&mut self) {
        let n = self.num_jobs();
        self.population = (0..self.config.population_size)
            .map(|_| Individual::new(random_permutation(n, &mut self.rng)))
            .collect();
    }

    fn seeded_population(&mut self, seed: &[usize]) {
        let size = self.config.population_size;
        let mutated = size * 3 / 10;
        let n = self.num_jobs();

        self.population.clear();
        self.population.push(Individual::new(seed.to_vec()));
        for i in 1..mutated {
            let mut perm = seed.to_vec();
            for _ in 0..1 + i % 5 {
                self.config.mutation.apply(&mut perm, &mut self.rng);
            }
            self.population.push(Individual::new(perm));
        }
        while self.population.len() < size {
            self.population
                .push(Individual::new(random_permutation(n, &mut self.rng)));
        }
    }

    fn evaluate_population(&mut self) {
        for ind in &mut self.population {
            ind.fitness = self.decoder.evaluate(&ind.permutation);
        }
        self.update_best();
    }

    /// Adopts the population's best if it strictly improves the best-ever.
    fn update_best(&mut self) {
        let Some(idx) = argmin(self.population.iter().map(|i| i.fitness)) else {
            return;
        };
        if self.population[idx].fitness < self.best.fitness {
            self.best = self.population[idx].clone();
            self.stagnation = 0;
        } else {
            self.stagnation += 1;
        }
    }

    fn stats(&self, generation: usize, elapsed: Duration) -> GenerationStats {
        GenerationStats::from_fitness(
            generation,
            self.population.iter().map(|i| i.fitness),
            elapsed.as_secs_f64(),
        )
    }

    /// One generation of selection, recombination and replacement.
    fn step(&mut self, temperature: f64) -> StepReport {
        let config = self.config;
        let fitness: Vec<f64> = self.population.iter().map(|i| i.fitness).collect();
        let diversity = self.stats(0, Duration::ZERO).spread();
        let mutation_prob = config.adaptive_mutation_prob(diversity);

        let parents: Vec<Vec<usize>> = config
            .selection
            .select_pool(&fitness, &mut self.rng)
            .into_iter()
            .map(|i| self.population[i].permutation.clone())
            .collect();

        let mut report = StepReport {
            diversity,
            mutation_prob,
            ..StepReport::default()
        };

        for pair in parents.chunks_exact(2) {
            let (mut c1, mut c2) = if self.rng.random_range(0.0..1.0) < config.crossover_prob {
                report.crossovers += 1;
                config.crossover.apply(&pair[0], &pair[1], &mut self.rng)
            } else {
                (pair[0].clone(), pair[1].clone())
            };

            for child in [&mut c1, &mut c2] {
                if self.rng.random_range(0.0..1.0) < mutation_prob {
                    config.mutation.apply(child, &mut self.rng);
                    report.mutations += 1;
                }
            }

            let f1 = self.decoder.evaluate(&c1);
            let f2 = self.decoder.evaluate(&c2);

            for child in [
                Individual::with_fitness(c1, f1),
                Individual::with_fitness(c2, f2),
            ] {
                match self.replace_worst(child, temperature) {
                    Replacement::Improved => report.replacements += 1,
                    Replacement::Annealed => report.annealed += 1,
                    Replacement::Rejected => {}
                }
            }
        }

        report
    }

    /// Puts `child` into the current worst slot if it is no worse, or with
    /// Metropolis probability `exp(-delta / temperature)` otherwise.
    fn replace_worst(&mut self, child: Individual, temperature: f64) -> Replacement {
        let Some(worst) = argmax(self.population.iter().map(|i| i.fitness)) else {
            return Replacement::Rejected;
        };
        let worst_fitness = self.population[worst].fitness;

        if child.fitness <= worst_fitness {
            self.population[worst] = child;
            return Replacement::Improved;
        }

        let delta = child.fitness - worst_fitness;
        if self.rng.random_range(0.0..1.0) < (-delta / temperature).exp() {
            self.population[worst] = child;
            Replacement::Annealed
        } else {
            Replacement::Rejected
        }
    }

    /// Hill-climbs the population's best and writes the result back.
    fn local_search_best(&mut self, generation: usize) {
        let Some(idx) = argmin(self.population.iter().map(|i| i.fitness)) else {
            return;
        };
        let before = self.population[idx].fitness;
        let improved = local_search(
            self.population[idx].clone(),
            self.config.local_search_intensity,
            &mut self.decoder,
            &mut self.rng,
        );
        let after = improved.fitness;
        self.population[idx] = improved;

        if after < self.best.fitness {
            self.best = self.population[idx].clone();
            self.stagnation = 0;
            debug!(generation, before, after, "local search improved best");
        }
    }

    fn restart(&mut self) {
        let n = self.num_jobs();
        restart_population(&mut self.population, self.config.mutation, n, &mut self.rng);
        self.evaluate_population();
        self.stagnation = 0;
        self.restarts += 1;

        debug!(
            best = self.best.fitness,
            population_best = self.population[0].fitness,
            "population restarted"
        );
    }
}

enum Replacement {
    Improved,
    Annealed,
    Rejected,
}

/// Randomized insert-neighborhood hill climb.
///
/// Evaluates `intensity * n` neighbors of the current point and moves only
/// on strict improvement. Never returns anything worse than `start`.
pub(crate) fn local_search<R: Rng>(
    start: Individual,
    intensity: usize,
    decoder: &mut Decoder<'_>,
    rng: &mut R,
) -> Individual {
    let budget = intensity * start.len();
    let mut current = start;
    for _ in 0..budget {
        let mut neighbor = current.permutation.clone();
        insert_mutation(&mut neighbor, rng);
        let fitness = decoder.evaluate(&neighbor);
        if fitness < current.fitness {
            current = Individual::with_fitness(neighbor, fitness);
        }
    }
    current
}

/// Diversifies a stagnated population in place.
///
/// After sorting by fitness, the top `max(1, size / 10)` individuals are
/// kept unchanged. Up to 30% of the population become mutated elite
/// copies, up to 50% elite copies with half their genes shuffled, and the
/// remainder fresh random permutations. Every rebuilt individual is left
/// unevaluated.
pub(crate) fn restart_population<R: Rng>(
    population: &mut [Individual],
    mutation: Mutation,
    num_jobs: usize,
    rng: &mut R,
) {
    let size = population.len();
    if size == 0 {
        return;
    }
    population.sort_by(|a, b| a.fitness.total_cmp(&b.fitness));

    let elite = (size / 10).max(1);
    let mutated_end = (size * 3 / 10).max(elite);
    let shuffled_end = (size / 2).max(elite);

    for i in elite..mutated_end {
        let mut perm = population[rng.random_range(0..elite)].permutation.clone();
        for _ in 0..rng.random_range(1..=3) {
            mutation.apply(&mut perm, rng);
        }
        population[i] = Individual::new(perm);
    }

    for i in mutated_end..shuffled_end {
        let mut perm = population[rng.random_range(0..elite)].permutation.clone();
        half_genes_shuffle(&mut perm, rng);
        population[i] = Individual::new(perm);
    }

    for ind in &mut population[shuffled_end..] {
        *ind = Individual::new(random_permutation(num_jobs, rng));
    }
}

// ============================================================================
// Tests
// ============================================================================
