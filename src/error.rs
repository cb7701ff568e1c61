// src/error.rs
//! Error kinds raised by the preprocessing stages.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Reading, writing or creating a file or directory failed.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The csv reader or writer failed underneath us.
    #[error("CSV error in {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A date or numeric field could not be parsed.
    #[error("cannot parse {column} {value:?} in {path:?} at line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
        message: String,
    },

    /// Interim files are missing required columns or disagree on their header.
    #[error("schema error in {path:?}: {message}")]
    Schema { path: PathBuf, message: String },

    /// A row violated an invariant while being cleaned.
    #[error("transform failed at row {row}: {message}")]
    Transform { row: usize, message: String },

    /// The YAML configuration was missing or malformed.
    #[error("config error in {path:?}: {message}")]
    Config { path: PathBuf, message: String },
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
