//! Error type for recoverable failures.
//!
//! Only the boundaries of the crate fail recoverably: reading instance and
//! permutation files, validating configuration, and validating a caller
//! supplied seed permutation. The decoder and the search loops never return
//! errors; their preconditions are guaranteed by [`Problem`](crate::model::Problem)
//! construction.

use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("invalid instance: {0}")]
    InvalidInstance(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid permutation: {0}")]
    InvalidPermutation(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }
}
