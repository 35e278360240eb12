//! Total tardiness minimization in hybrid flow shops.
//!
//! A candidate schedule is a permutation of job ids read as a priority
//! list. A discrete-event simulation turns it into a schedule and scores it
//! by total tardiness. Two permutation searches sit on top of that fitness:
//!
//! - **Decoder**: event-driven simulation with least-workload machine
//!   assignment and priority-ordered buffers.
//! - **Genetic Algorithm (GA)**: steady-state loop with tournament or
//!   roulette selection, five permutation crossovers, adaptive mutation,
//!   annealed replacement, periodic local search and elitist restarts.
//! - **Particle Swarm (PSO)**: velocity-free discrete swarm where particles
//!   move by mutation and crossover with their personal and global bests.
//!
//! # Architecture
//!
//! [`model`] holds the immutable instance; all per-evaluation state lives in
//! [`decoder::SimState`], reset before every decode. Each search run owns a
//! single seeded generator, so a fixed seed reproduces a run. [`io`] reads
//! and writes the plain-text instance, permutation and report formats used
//! by the `u-flowshop` binary (feature `cli`).
//!
//! # Example
//!
//! ```
//! use u_flowshop::ga::{GaConfig, GaRunner};
//! use u_flowshop::model::Problem;
//!
//! let problem = Problem::builder(vec![1])
//!     .job(0, vec![vec![5]])
//!     .job(0, vec![vec![3]])
//!     .job(0, vec![vec![8]])
//!     .build()
//!     .unwrap();
//! assert_eq!(u_flowshop::decoder::decode(&[2, 1, 3], &problem), 27.0);
//!
//! let config = GaConfig::fast().with_max_generations(10).with_seed(1);
//! let result = GaRunner::run(&problem, &config).unwrap();
//! assert!(result.best_fitness <= 27.0);
//! ```

pub mod decoder;
pub mod error;
pub mod ga;
pub mod io;
pub mod model;
pub mod permutation;
pub mod pso;
pub mod stats;

pub use error::{Error, Result};
