//! Problem definition and builder.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::job::Job;
use crate::error::{Error, Result};

/// Identifies a machine by `(stage, machine)`, both 1-based.
///
/// Ordered by stage first, then machine, which is also the order the
/// decoder breaks simultaneous events in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MachineKey {
    pub stage: usize,
    pub machine: usize,
}

impl MachineKey {
    pub fn new(stage: usize, machine: usize) -> Self {
        Self { stage, machine }
    }
}

impl fmt::Display for MachineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M{}.{}", self.stage, self.machine)
    }
}

/// An immutable hybrid flow shop instance.
///
/// Built through [`ProblemBuilder`], which guarantees that every job has a
/// processing time for every `(stage, machine)` key of the topology. The
/// decoder relies on this and does not re-check it.
///
/// # Examples
///
/// ```
/// use u_flowshop::model::Problem;
///
/// // 2 stages: 2 machines, then 1 machine.
/// let problem = Problem::builder(vec![2, 1])
///     .job(20, vec![vec![5, 6], vec![3]])
///     .job(15, vec![vec![4, 2], vec![8]])
///     .build()
///     .unwrap();
///
/// assert_eq!(problem.num_jobs(), 2);
/// assert_eq!(problem.num_stages(), 2);
/// assert_eq!(problem.job(2).processing_time(1, 2), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Problem {
    machines_per_stage: Vec<usize>,
    jobs: Vec<Job>,
}

impl Problem {
    /// Starts building a problem with the given stage topology.
    pub fn builder(machines_per_stage: Vec<usize>) -> ProblemBuilder {
        ProblemBuilder::new(machines_per_stage)
    }

    /// Number of jobs `n`.
    pub fn num_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Number of stages `m`.
    pub fn num_stages(&self) -> usize {
        self.machines_per_stage.len()
    }

    /// Machine count of every stage, in stage order.
    pub fn machines_per_stage(&self) -> &[usize] {
        &self.machines_per_stage
    }

    /// Machine count of `stage` (1-based).
    #[inline]
    pub fn machines_in_stage(&self, stage: usize) -> usize {
        self.machines_per_stage[stage - 1]
    }

    /// Total machine count over all stages.
    pub fn num_machines(&self) -> usize {
        self.machines_per_stage.iter().sum()
    }

    /// All jobs, ordered by id.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Job with 1-based `id`.
    ///
    /// # Panics
    /// Panics if `id` is 0 or greater than [`num_jobs`](Self::num_jobs).
    #[inline]
    pub fn job(&self, id: usize) -> &Job {
        &self.jobs[id - 1]
    }

    /// Every machine key, stage by stage.
    pub fn machine_keys(&self) -> impl Iterator<Item = MachineKey> + '_ {
        self.machines_per_stage
            .iter()
            .enumerate()
            .flat_map(|(i, &count)| (1..=count).map(move |l| MachineKey::new(i + 1, l)))
    }

    /// Returns a copy with every job's due date set to `due_date`.
    pub fn with_due_date(mut self, due_date: u32) -> Self {
        for job in &mut self.jobs {
            job.set_due_date(due_date);
        }
        self
    }

    /// Returns a copy with per-job due dates, in job-id order.
    pub fn with_due_dates(mut self, due_dates: &[u32]) -> Result<Self> {
        if due_dates.len() != self.jobs.len() {
            return Err(Error::InvalidInstance(format!(
                "expected {} due dates, got {}",
                self.jobs.len(),
                due_dates.len()
            )));
        }
        for (job, &d) in self.jobs.iter_mut().zip(due_dates) {
            job.set_due_date(d);
        }
        Ok(self)
    }

    /// The identity permutation `1, 2, ..., n`.
    pub fn identity_permutation(&self) -> Vec<usize> {
        (1..=self.num_jobs()).collect()
    }

    /// Checks that `permutation` contains every job id exactly once.
    pub fn check_permutation(&self, permutation: &[usize]) -> Result<()> {
        let n = self.num_jobs();
        if permutation.len() != n {
            return Err(Error::InvalidPermutation(format!(
                "expected {n} job ids, got {}",
                permutation.len()
            )));
        }
        let mut seen = vec![false; n + 1];
        for &id in permutation {
            if id == 0 || id > n {
                return Err(Error::InvalidPermutation(format!(
                    "job id {id} out of range 1..={n}"
                )));
            }
            if seen[id] {
                return Err(Error::InvalidPermutation(format!("job id {id} repeated")));
            }
            seen[id] = true;
        }
        Ok(())
    }
}

/// Incremental builder for [`Problem`].
///
/// Jobs receive ids in insertion order starting at 1.
#[derive(Debug, Clone)]
pub struct ProblemBuilder {
    machines_per_stage: Vec<usize>,
    jobs: Vec<Job>,
}

impl ProblemBuilder {
    pub fn new(machines_per_stage: Vec<usize>) -> Self {
        Self {
            machines_per_stage,
            jobs: Vec::new(),
        }
    }

    /// Adds a job with `processing_times[stage][machine]` (0-based indices).
    pub fn job(mut self, due_date: u32, processing_times: Vec<Vec<u32>>) -> Self {
        self.push_job(due_date, processing_times);
        self
    }

    /// Non-consuming variant of [`job`](Self::job), for readers that add jobs in a loop.
    pub fn push_job(&mut self, due_date: u32, processing_times: Vec<Vec<u32>>) {
        let id = self.jobs.len() + 1;
        self.jobs.push(Job::new(id, due_date, processing_times));
    }

    /// Validates the topology and every job matrix.
    pub fn build(self) -> Result<Problem> {
        if self.machines_per_stage.is_empty() {
            return Err(Error::InvalidInstance("at least one stage is required".into()));
        }
        if let Some(stage) = self.machines_per_stage.iter().position(|&h| h == 0) {
            return Err(Error::InvalidInstance(format!(
                "stage {} has no machines",
                stage + 1
            )));
        }
        for job in &self.jobs {
            let times = job.processing_times();
            if times.len() != self.machines_per_stage.len() {
                return Err(Error::InvalidInstance(format!(
                    "job {} has {} stage rows, expected {}",
                    job.id(),
                    times.len(),
                    self.machines_per_stage.len()
                )));
            }
            for (i, (row, &h)) in times.iter().zip(&self.machines_per_stage).enumerate() {
                if row.len() != h {
                    return Err(Error::InvalidInstance(format!(
                        "job {} stage {} has {} processing times, expected {h}",
                        job.id(),
                        i + 1,
                        row.len()
                    )));
                }
            }
        }
        Ok(Problem {
            machines_per_stage: self.machines_per_stage,
            jobs: self.jobs,
        })
    }
}
