//! Random instance generation.
//!
//! Produces benchmark instances with a chosen machine environment:
//!
//! | Type | Processing time of job `j` on machine `l` |
//! |------|-------------------------------------------|
//! | Identical | one draw `p_j`, shared by every machine of the stage |
//! | Uniform | `floor(p_j / s_l)` with speed `s_l ~ U(0.5, 2.0)` |
//! | Unrelated | independent draw per machine |

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::problem::Problem;
use super::DEFAULT_DUE_DATE;
use crate::error::{Error, Result};
use crate::permutation::random_permutation;

/// Machine environment within a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MachineType {
    Identical,
    Uniform,
    #[default]
    Unrelated,
}

impl std::str::FromStr for MachineType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "identical" => Ok(MachineType::Identical),
            "uniform" => Ok(MachineType::Uniform),
            "unrelated" => Ok(MachineType::Unrelated),
            other => Err(Error::InvalidConfig(format!(
                "unknown machine type '{other}'"
            ))),
        }
    }
}

/// Seeded generator of hybrid flow shop instances.
///
/// # Examples
///
/// ```
/// use u_flowshop::model::{InstanceGenerator, MachineType};
///
/// let mut gen = InstanceGenerator::new(42)
///     .with_time_range(10, 50)
///     .with_machine_type(MachineType::Unrelated);
/// let problem = gen.generate(10, &[2, 2, 2]).unwrap();
/// assert_eq!(problem.num_jobs(), 10);
/// assert_eq!(problem.num_machines(), 6);
/// ```
#[derive(Debug, Clone)]
pub struct InstanceGenerator {
    rng: StdRng,
    min_time: u32,
    max_time: u32,
    machine_type: MachineType,
    due_date: u32,
}

impl InstanceGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            min_time: 1,
            max_time: 99,
            machine_type: MachineType::default(),
            due_date: DEFAULT_DUE_DATE,
        }
    }

    /// Inclusive processing time range.
    pub fn with_time_range(mut self, min: u32, max: u32) -> Self {
        self.min_time = min;
        self.max_time = max;
        self
    }

    pub fn with_machine_type(mut self, machine_type: MachineType) -> Self {
        self.machine_type = machine_type;
        self
    }

    /// Due date given to every generated job.
    pub fn with_due_date(mut self, due_date: u32) -> Self {
        self.due_date = due_date;
        self
    }

    /// Generates an instance with `n_jobs` jobs over the given stage topology.
    pub fn generate(&mut self, n_jobs: usize, machines_per_stage: &[usize]) -> Result<Problem> {
        if self.min_time > self.max_time {
            return Err(Error::InvalidConfig(format!(
                "empty processing time range {}..={}",
                self.min_time, self.max_time
            )));
        }

        // Drawn stage by stage, then job by job, matching the file layout.
        let mut times = vec![vec![Vec::new(); machines_per_stage.len()]; n_jobs];
        for (stage, &h) in machines_per_stage.iter().enumerate() {
            for job_times in times.iter_mut() {
                job_times[stage] = self.draw_row(h);
            }
        }

        let mut builder = Problem::builder(machines_per_stage.to_vec());
        for row in times {
            builder.push_job(self.due_date, row);
        }
        builder.build()
    }

    /// A uniformly random 1-based permutation of `n` jobs.
    pub fn initial_permutation(&mut self, n: usize) -> Vec<usize> {
        random_permutation(n, &mut self.rng)
    }

    fn draw_row(&mut self, machines: usize) -> Vec<u32> {
        let range = self.min_time..=self.max_time;
        match self.machine_type {
            MachineType::Identical => {
                let base = self.rng.random_range(range);
                vec![base; machines]
            }
            MachineType::Uniform => {
                let base = self.rng.random_range(range) as f64;
                (0..machines)
                    .map(|_| {
                        let speed: f64 = self.rng.random_range(0.5..=2.0);
                        (base / speed) as u32
                    })
                    .collect()
            }
            MachineType::Unrelated => (0..machines)
                .map(|_| self.rng.random_range(range.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_times_within_range() {
        let mut gen = InstanceGenerator::new(7).with_time_range(10, 50);
        let p = gen.generate(20, &[3, 3, 2]).unwrap();
        for job in p.jobs() {
            for stage in 1..=3 {
                for &t in job.stage_times(stage) {
                    assert!((10..=50).contains(&t), "time {t} out of range");
                }
            }
        }
    }

    #[test]
    fn test_identical_machines_share_times() {
        let mut gen = InstanceGenerator::new(1).with_machine_type(MachineType::Identical);
        let p = gen.generate(5, &[4]).unwrap();
        for job in p.jobs() {
            let row = job.stage_times(1);
            assert!(row.iter().all(|&t| t == row[0]));
        }
    }

    #[test]
    fn test_uniform_machines_bounded_by_speed() {
        let mut gen = InstanceGenerator::new(3)
            .with_time_range(10, 20)
            .with_machine_type(MachineType::Uniform);
        let p = gen.generate(10, &[3]).unwrap();
        for job in p.jobs() {
            for &t in job.stage_times(1) {
                assert!((5..=40).contains(&t), "uniform time {t} outside [5, 40]");
            }
        }
    }

    #[test]
    fn test_same_seed_same_instance() {
        let a = InstanceGenerator::new(42).generate(8, &[2, 3]).unwrap();
        let b = InstanceGenerator::new(42).generate(8, &[2, 3]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_due_date_applied() {
        let p = InstanceGenerator::new(0)
            .with_due_date(250)
            .generate(4, &[1])
            .unwrap();
        assert!(p.jobs().iter().all(|j| j.due_date() == 250));
    }

    #[test]
    fn test_invalid_range_rejected() {
        let mut gen = InstanceGenerator::new(0).with_time_range(9, 3);
        assert!(gen.generate(2, &[1]).is_err());
    }

    #[test]
    fn test_machine_type_from_str() {
        assert_eq!("Identical".parse::<MachineType>().unwrap(), MachineType::Identical);
        assert_eq!("uniform".parse::<MachineType>().unwrap(), MachineType::Uniform);
        assert!("round".parse::<MachineType>().is_err());
    }
}
