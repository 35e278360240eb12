//! Discrete particle swarm over job permutations.
//!
//! Particles carry a permutation position and a personal best. Movement is
//! expressed with permutation operators instead of velocities: a mutation
//! stands in for inertia, and crossovers with the personal and global bests
//! stand in for the cognitive and social terms.
//!
//! # Key Types
//!
//! - [`PsoConfig`]: Swarm parameters
//! - [`PsoRunner`]: Executes the swarm loop
//! - [`PsoResult`]: Global best, history and final swarm
//!
//! # References
//!
//! - Kennedy & Eberhart (1995), "Particle Swarm Optimization"
//! - Pan, Tasgetiren & Liang (2008), "A discrete particle swarm optimization
//!   algorithm for the no-wait flowshop scheduling problem"

mod config;
pub mod operators;
mod runner;
mod types;

pub use config::PsoConfig;
pub use operators::{PsoCrossover, PsoMutation};
pub use runner::{PsoResult, PsoRunner};
pub use types::Particle;
