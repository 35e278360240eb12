//! Job model.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A job to be processed once on every stage.
///
/// Processing times are stored as `processing_times[stage - 1][machine - 1]`.
/// A job carries no decode state: priority and completion times are derived
/// per evaluation by the decoder.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Job {
    id: usize,
    due_date: u32,
    processing_times: Vec<Vec<u32>>,
}

impl Job {
    /// Creates a job. `id` is 1-based.
    pub fn new(id: usize, due_date: u32, processing_times: Vec<Vec<u32>>) -> Self {
        Self {
            id,
            due_date,
            processing_times,
        }
    }

    /// 1-based job identifier.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Due date `d_j`.
    pub fn due_date(&self) -> u32 {
        self.due_date
    }

    pub(crate) fn set_due_date(&mut self, due_date: u32) {
        self.due_date = due_date;
    }

    /// Processing time on `(stage, machine)`, both 1-based.
    ///
    /// # Panics
    /// Panics if the key is outside the job's matrix.
    #[inline]
    pub fn processing_time(&self, stage: usize, machine: usize) -> u32 {
        self.processing_times[stage - 1][machine - 1]
    }

    /// Processing times of every machine in `stage` (1-based).
    pub fn stage_times(&self, stage: usize) -> &[u32] {
        &self.processing_times[stage - 1]
    }

    /// Full `stage x machine` processing-time matrix.
    pub fn processing_times(&self) -> &[Vec<u32>] {
        &self.processing_times
    }

    /// Tardiness of this job given its completion time at the last stage.
    #[inline]
    pub fn tardiness(&self, completion: f64) -> f64 {
        (completion - self.due_date as f64).max(0.0)
    }
}
