//! Hybrid flow shop problem model.
//!
//! A hybrid flow shop is a production line of `m` stages. Stage `i` has
//! `h_i` parallel (possibly unrelated) machines, and every job visits every
//! stage in order, being processed by exactly one machine per stage.
//!
//! The model here is the immutable problem definition only. Everything that
//! changes while a permutation is being simulated (priorities, completion
//! times, machine buffers) lives in [`SimState`](crate::decoder::SimState).
//!
//! # Identifiers
//!
//! Job ids, stage ids and machine ids are all 1-based, matching the
//! instance files and the permutations handed to the decoder.
//!
//! # Reference
//! Ruiz & Vázquez-Rodríguez (2010), "The hybrid flow shop scheduling problem"

mod generator;
mod job;
mod problem;

pub use generator::{InstanceGenerator, MachineType};
pub use job::Job;
pub use problem::{MachineKey, Problem, ProblemBuilder};

/// Due date applied to every job when an instance file carries none.
pub const DEFAULT_DUE_DATE: u32 = 100;
