//! Error types for input discovery and preparation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while discovering or preparing input files.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Directory not found or not a directory.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create an output directory.
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Parsing Errors ===
    /// File is not valid JSON.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Tab-separated file could not be parsed.
    #[error("failed to parse {path}: {source}")]
    Tabular {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Consolidated demographics file has the wrong shape.
    #[error("unexpected demographics layout in {path}: {reason}")]
    DemographicsLayout { path: PathBuf, reason: String },

    // === Output Errors ===
    #[error(transparent)]
    Output(#[from] fhir_output::OutputError),
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
