//! File formats around the search core.
//!
//! - [`instance`]: the plain-text instance layout (read and write)
//! - [`permutation`]: 0-based seed permutation files
//! - [`report`]: per-generation history and batch summary CSVs
//!
//! Nothing here is needed to decode or search; the runners only consume a
//! [`Problem`](crate::model::Problem) and return results.

pub mod instance;
pub mod permutation;
pub mod report;

pub use instance::{parse_instance, read_instance, write_instance};
pub use permutation::{parse_permutation, read_permutation, write_permutation};
pub use report::{write_history_csv, write_summary_csv, RunSummary};
