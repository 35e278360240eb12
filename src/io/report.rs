//! CSV reports: per-generation history and batch summaries.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::Problem;
use crate::stats::GenerationStats;

/// Best fitness changes at or below this are not counted as progress when
/// locating the convergence generation.
pub const CONVERGENCE_THRESHOLD: f64 = 0.01;

const HISTORY_HEADER: &str = "Generation,BestFitness,AvgFitness,WorstFitness,ElapsedTime";

const SUMMARY_HEADER: &str = "Instance,Permutation,Jobs,Stages,InitialFitness,BestFitness,\
WorstFitness,AvgFitness,StdDev,FinalFitness,Improvement(%),RPD(%),ExecutionTime_ms,\
TimePerGen_ms,PopSize,Generations,ConvergenceGen,ConvergencePercent(%),FitnessDiversity,\
BestPermutation,Config";

/// Writes one CSV row per history entry.
pub fn write_history_csv(path: impl AsRef<Path>, history: &[GenerationStats]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_history(&mut out, history)?;
    out.flush()?;
    Ok(())
}

fn write_history<W: Write>(out: &mut W, history: &[GenerationStats]) -> std::io::Result<()> {
    writeln!(out, "{HISTORY_HEADER}")?;
    for row in history {
        writeln!(
            out,
            "{},{:.4},{:.4},{:.4},{:.4}",
            row.generation, row.best_fitness, row.avg_fitness, row.worst_fitness, row.elapsed_secs
        )?;
    }
    Ok(())
}

/// Metrics of one finished run, one row of the batch summary.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunSummary {
    pub instance: String,
    pub permutation_file: Option<String>,
    pub jobs: usize,
    pub stages: usize,

    /// Fitness of the seed, or of the best initial candidate when unseeded.
    pub initial_fitness: f64,
    pub final_fitness: f64,
    /// Worst fitness of the last recorded population.
    pub worst_fitness: f64,
    /// Average fitness of the last recorded population.
    pub avg_fitness: f64,
    /// Spread of the per-generation best around the final average.
    pub std_dev: f64,

    pub improvement_pct: f64,
    /// Relative percentage deviation from a known optimum, 0 when unknown.
    pub rpd_pct: f64,

    pub execution_ms: f64,
    pub time_per_generation_ms: f64,
    pub population_size: usize,
    pub generations: usize,
    pub convergence_generation: usize,
    pub convergence_pct: f64,
    /// `(worst - best) / avg` of the last population.
    pub fitness_diversity: f64,

    pub best_permutation: Vec<usize>,
    /// Free-form description of the configuration used.
    pub config: String,
}

impl RunSummary {
    /// Computes the run metrics from a history.
    ///
    /// `generations` is the number of generations the run executed; it
    /// scales the per-generation time and the convergence percentage.
    ///
    /// ```
    /// use std::time::Duration;
    /// use u_flowshop::io::RunSummary;
    /// use u_flowshop::stats::GenerationStats;
    ///
    /// let history = vec![
    ///     GenerationStats::from_fitness(0, [100.0, 140.0], 0.0),
    ///     GenerationStats::from_fitness(1, [80.0, 120.0], 0.1),
    ///     GenerationStats::from_fitness(2, [80.0, 100.0], 0.2),
    /// ];
    /// let s = RunSummary::from_history(&history, 2, 100.0, 80.0, Duration::from_millis(200));
    /// assert!((s.improvement_pct - 20.0).abs() < 1e-9);
    /// assert_eq!(s.convergence_generation, 1);
    /// ```
    pub fn from_history(
        history: &[GenerationStats],
        generations: usize,
        initial_fitness: f64,
        final_fitness: f64,
        elapsed: Duration,
    ) -> Self {
        let execution_ms = elapsed.as_secs_f64() * 1000.0;

        let (worst_fitness, avg_fitness, std_dev) = match history.last() {
            Some(last) => {
                let avg = last.avg_fitness;
                let sum_sq: f64 = history
                    .iter()
                    .map(|row| (row.best_fitness - avg).powi(2))
                    .sum();
                (last.worst_fitness, avg, (sum_sq / history.len() as f64).sqrt())
            }
            None => (final_fitness, final_fitness, 0.0),
        };

        let convergence_generation = history
            .windows(2)
            .rposition(|w| (w[1].best_fitness - w[0].best_fitness).abs() > CONVERGENCE_THRESHOLD)
            .map_or(0, |i| history[i + 1].generation);

        let per_generation = |value: f64| {
            if generations > 0 {
                value / generations as f64
            } else {
                0.0
            }
        };

        Self {
            initial_fitness,
            final_fitness,
            worst_fitness,
            avg_fitness,
            std_dev,
            improvement_pct: if initial_fitness > 0.0 {
                (initial_fitness - final_fitness) / initial_fitness * 100.0
            } else {
                0.0
            },
            execution_ms,
            time_per_generation_ms: per_generation(execution_ms),
            generations,
            convergence_generation,
            convergence_pct: per_generation(convergence_generation as f64 * 100.0),
            fitness_diversity: if avg_fitness > 0.0 && worst_fitness > 0.0 {
                (worst_fitness - final_fitness) / avg_fitness
            } else {
                0.0
            },
            ..Self::default()
        }
    }

    /// Records the instance name and its dimensions.
    pub fn with_instance(mut self, name: impl Into<String>, problem: &Problem) -> Self {
        self.instance = name.into();
        self.jobs = problem.num_jobs();
        self.stages = problem.num_stages();
        self
    }

    pub fn with_permutation_file(mut self, name: impl Into<String>) -> Self {
        self.permutation_file = Some(name.into());
        self
    }

    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    pub fn with_best_permutation(mut self, permutation: &[usize]) -> Self {
        self.best_permutation = permutation.to_vec();
        self
    }

    pub fn with_config(mut self, config: impl Into<String>) -> Self {
        self.config = config.into();
        self
    }

    /// Sets the relative percentage deviation against a known optimum.
    /// Non-positive optima leave it at 0.
    pub fn with_optimum(mut self, optimum: f64) -> Self {
        self.rpd_pct = if optimum > 0.0 {
            (self.final_fitness - optimum) / optimum * 100.0
        } else {
            0.0
        };
        self
    }
}

/// Writes a batch summary, one row per run.
pub fn write_summary_csv(path: impl AsRef<Path>, runs: &[RunSummary]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_summary(&mut out, runs)?;
    out.flush()?;
    Ok(())
}

fn write_summary<W: Write>(out: &mut W, runs: &[RunSummary]) -> std::io::Result<()> {
    writeln!(out, "{SUMMARY_HEADER}")?;
    for r in runs {
        let permutation = r
            .best_permutation
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(
            out,
            "{},{},{},{},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{},{},{},{:.4},{:.4},[{}],{}",
            r.instance,
            r.permutation_file.as_deref().unwrap_or(""),
            r.jobs,
            r.stages,
            r.initial_fitness,
            r.final_fitness,
            r.worst_fitness,
            r.avg_fitness,
            r.std_dev,
            r.final_fitness,
            r.improvement_pct,
            r.rpd_pct,
            r.execution_ms,
            r.time_per_generation_ms,
            r.population_size,
            r.generations,
            r.convergence_generation,
            r.convergence_pct,
            r.fitness_diversity,
            permutation,
            r.config,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(generation: usize, best: f64, avg: f64, worst: f64) -> GenerationStats {
        GenerationStats {
            generation,
            best_fitness: best,
            avg_fitness: avg,
            worst_fitness: worst,
            elapsed_secs: generation as f64 * 0.5,
        }
    }

    fn history() -> Vec<GenerationStats> {
        vec![
            row(0, 100.0, 150.0, 200.0),
            row(1, 90.0, 120.0, 160.0),
            row(2, 90.005, 110.0, 150.0),
            row(3, 60.0, 90.0, 120.0),
            row(4, 60.0, 80.0, 100.0),
        ]
    }

    #[test]
    fn test_summary_metrics() {
        let s = RunSummary::from_history(&history(), 4, 120.0, 60.0, Duration::from_millis(400));
        assert!((s.improvement_pct - 50.0).abs() < 1e-9);
        assert_eq!(s.worst_fitness, 100.0);
        assert_eq!(s.avg_fitness, 80.0);
        assert!((s.execution_ms - 400.0).abs() < 1e-9);
        assert!((s.time_per_generation_ms - 100.0).abs() < 1e-9);
        // (100 - 60) / 80
        assert!((s.fitness_diversity - 0.5).abs() < 1e-12);
        assert_eq!(s.rpd_pct, 0.0);
    }

    #[test]
    fn test_convergence_ignores_tiny_changes() {
        let s = RunSummary::from_history(&history(), 4, 120.0, 60.0, Duration::ZERO);
        assert_eq!(s.convergence_generation, 3);
        assert!((s.convergence_pct - 75.0).abs() < 1e-9);

        let flat = vec![row(0, 5.0, 5.0, 5.0), row(1, 5.005, 5.0, 5.0)];
        let s = RunSummary::from_history(&flat, 1, 5.0, 5.0, Duration::ZERO);
        assert_eq!(s.convergence_generation, 0);
    }

    #[test]
    fn test_std_dev_around_final_average() {
        let h = vec![row(0, 10.0, 20.0, 30.0), row(1, 30.0, 20.0, 30.0)];
        let s = RunSummary::from_history(&h, 1, 10.0, 10.0, Duration::ZERO);
        assert!((s.std_dev - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_initial_fitness_has_no_improvement() {
        let s = RunSummary::from_history(&[], 0, 0.0, 0.0, Duration::ZERO);
        assert_eq!(s.improvement_pct, 0.0);
        assert_eq!(s.time_per_generation_ms, 0.0);
        assert_eq!(s.fitness_diversity, 0.0);
        assert_eq!(s.std_dev, 0.0);
    }

    #[test]
    fn test_rpd_against_optimum() {
        let s = RunSummary::from_history(&history(), 4, 120.0, 60.0, Duration::ZERO).with_optimum(50.0);
        assert!((s.rpd_pct - 20.0).abs() < 1e-9);
        let s = s.with_optimum(0.0);
        assert_eq!(s.rpd_pct, 0.0);
    }

    #[test]
    fn test_history_csv_layout() {
        let mut buf = Vec::new();
        write_history(&mut buf, &history()[..2]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], HISTORY_HEADER);
        assert_eq!(lines[1], "0,100.0000,150.0000,200.0000,0.0000");
        assert_eq!(lines[2], "1,90.0000,120.0000,160.0000,0.5000");
    }

    #[test]
    fn test_summary_csv_columns() {
        let summary = RunSummary::from_history(&history(), 4, 120.0, 60.0, Duration::ZERO)
            .with_best_permutation(&[2, 1, 3])
            .with_config("tournament|OBX|insert");
        let mut buf = Vec::new();
        write_summary(&mut buf, &[summary]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        let header_cols = lines.next().unwrap().split(',').count();
        let row = lines.next().unwrap();
        assert_eq!(row.split(',').count(), header_cols);
        assert!(row.contains(",[2 1 3],"));
    }
}
