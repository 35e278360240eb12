//! Mutable simulation state for one decode.
//!
//! [`SimState`] is allocated once per [`Problem`] and reset before every
//! decode, so no evaluation can observe writes from a previous one.

use crate::model::{MachineKey, Problem};

/// Decode-scoped state of one job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobState {
    /// 1-based position in the permutation being decoded. Lower is served first.
    pub priority: usize,
    /// Completion time per stage, 0 until the job finishes that stage.
    pub completion: Vec<f64>,
    /// `max(0, completion[last] - due_date)`, set by the final pass.
    pub tardiness: f64,
}

/// Decode-scoped state of one machine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MachineState {
    /// Clock value at which the machine becomes free.
    pub available_time: f64,
    pub busy: bool,
    /// Jobs waiting for this machine, unordered.
    pub buffer: Vec<usize>,
    /// Job in service, if any.
    pub current: Option<usize>,
}

impl MachineState {
    fn reset(&mut self) {
        self.available_time = 0.0;
        self.busy = false;
        self.buffer.clear();
        self.current = None;
    }
}

/// Transient job and machine fields for a [`Problem`].
///
/// A machine entry exists for every key of the problem's topology. Lookups
/// with keys outside it panic: that is a broken upstream invariant, not a
/// recoverable condition.
#[derive(Debug, Clone, PartialEq)]
pub struct SimState {
    jobs: Vec<JobState>,
    machines: Vec<Vec<MachineState>>,
}

impl SimState {
    /// Allocates reset state sized for `problem`.
    pub fn new(problem: &Problem) -> Self {
        let stages = problem.num_stages();
        let jobs = (0..problem.num_jobs())
            .map(|_| JobState {
                priority: 0,
                completion: vec![0.0; stages],
                tardiness: 0.0,
            })
            .collect();
        let machines = problem
            .machines_per_stage()
            .iter()
            .map(|&h| vec![MachineState::default(); h])
            .collect();
        Self { jobs, machines }
    }

    /// Zeroes every job field and empties every machine.
    pub fn reset(&mut self) {
        for job in &mut self.jobs {
            job.priority = 0;
            job.completion.iter_mut().for_each(|c| *c = 0.0);
            job.tardiness = 0.0;
        }
        for machine in self.machines.iter_mut().flatten() {
            machine.reset();
        }
    }

    /// Returns `true` if the state is indistinguishable from a fresh one.
    pub fn is_reset(&self) -> bool {
        self.jobs.iter().all(|j| {
            j.priority == 0 && j.tardiness == 0.0 && j.completion.iter().all(|&c| c == 0.0)
        }) && self.machines.iter().flatten().all(|m| {
            m.available_time == 0.0 && !m.busy && m.buffer.is_empty() && m.current.is_none()
        })
    }

    /// State of the job with 1-based `id`.
    #[inline]
    pub fn job(&self, id: usize) -> &JobState {
        &self.jobs[id - 1]
    }

    #[inline]
    pub(crate) fn job_mut(&mut self, id: usize) -> &mut JobState {
        &mut self.jobs[id - 1]
    }

    /// All job states, in job-id order.
    pub fn jobs(&self) -> &[JobState] {
        &self.jobs
    }

    #[inline]
    pub fn machine(&self, key: MachineKey) -> &MachineState {
        &self.machines[key.stage - 1][key.machine - 1]
    }

    #[inline]
    pub(crate) fn machine_mut(&mut self, key: MachineKey) -> &mut MachineState {
        &mut self.machines[key.stage - 1][key.machine - 1]
    }

    /// Completion time of job `id` at `stage` (both 1-based).
    pub fn completion(&self, id: usize, stage: usize) -> f64 {
        self.jobs[id - 1].completion[stage - 1]
    }
}
