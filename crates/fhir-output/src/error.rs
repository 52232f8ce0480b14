//! Error types for JSON output.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    /// Output file could not be created.
    #[error("failed to create {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing or flushing an output file failed part way; the file on disk
    /// is incomplete.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error from the underlying sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations.
pub type Result<T> = std::result::Result<T, OutputError>;
