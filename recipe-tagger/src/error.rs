//! Error types for recipe-tagger

use crate::orchestrator::RunStatistics;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for tagger operations
pub type Result<T> = std::result::Result<T, TaggerError>;

#[derive(Error, Debug)]
pub enum TaggerError {
    /// Setup failure from the shared library (config, database open)
    #[error(transparent)]
    Common(#[from] recipe_common::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Input file could not be read
    #[error("Cannot read input {}: {source}", .path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A batch could not be committed; the run stopped
    ///
    /// `statistics` reflects only batches committed before the failure.
    #[error("Batch flush failed after {attempts} attempt(s), {pending} update(s) not committed: {source}")]
    FlushFailed {
        attempts: u32,
        pending: usize,
        statistics: Box<RunStatistics>,
        #[source]
        source: recipe_common::Error,
    },
}
