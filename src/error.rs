//! Stage-level errors for the harvest pipeline.
//!
//! Only these escalate out of a stage. Per-item probe and download failures
//! are reported as outcomes and never become a `PipelineError`.

use std::path::PathBuf;

use thiserror::Error;

use crate::download::{FetchError, PoolError};

/// Errors that stop the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The domain directory could not be retrieved; nothing to harvest.
    #[error("failed to retrieve domain directory: {source}")]
    SourceList {
        /// The fetch failure.
        #[source]
        source: FetchError,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Reading or writing a cache or output file failed.
    #[error("IO error at {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The domain directory or the CSV export could not be processed.
    #[error("CSV error at {path}: {source}")]
    Csv {
        /// The CSV file involved.
        path: PathBuf,
        /// The underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// A pipeline-owned JSON file could not be read or written.
    #[error("JSON error at {path}: {source}")]
    Json {
        /// The JSON file involved.
        path: PathBuf,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// Worker pool failure.
    #[error("worker pool error: {0}")]
    Pool(#[from] PoolError),
}

impl PipelineError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a CSV error.
    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    /// Creates a JSON error.
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}
