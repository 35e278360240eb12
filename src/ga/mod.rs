//! Genetic search over job permutations.
//!
//! A steady-state GA tailored to the flow shop decoder: parents come from a
//! mating pool, children replace the current worst individual (accepting
//! worse children with an annealing probability), and the run is
//! diversified by periodic local search and stagnation-triggered restarts.
//!
//! # Key Types
//!
//! - [`GaConfig`]: Algorithm parameters (population size, operators, presets)
//! - [`GaRunner`]: Executes the evolutionary loop
//! - [`GaResult`]: Best individual, history and counters
//!
//! # Submodules
//!
//! - [`operators`]: Permutation crossover (OBX, PMX, OPX, TPX) and mutation operators
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*
//! - Kirkpatrick et al. (1983), "Optimization by Simulated Annealing"

mod config;
pub mod operators;
mod runner;
mod selection;
mod types;

pub use config::GaConfig;
pub use operators::{Crossover, Mutation};
pub use runner::{GaResult, GaRunner};
pub use selection::Selection;
pub use types::Individual;
