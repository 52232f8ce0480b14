//! Error types for bundle assembly and per-file processing.

use std::io;
use std::path::PathBuf;

use fhir_ingest::IngestError;
use fhir_model::ExtractError;
use fhir_output::OutputError;
use thiserror::Error;

/// Errors raised while assembling one patient's bundle.
#[derive(Debug, Error)]
pub enum AssembleError {
    /// The extract has no demographics record to build the Patient from.
    #[error("no demographics data found in {file}")]
    MissingDemographics { file: String },
}

/// Errors that fail a single input file.
///
/// The scheduler turns each into a failed outcome; other files carry on.
#[derive(Debug, Error)]
pub enum WorkerError {
    // === Input ===
    /// The input file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The input file is not a usable extract.
    #[error("invalid extract: {0}")]
    Extract(#[from] ExtractError),

    // === Assembly ===
    #[error(transparent)]
    Assemble(#[from] AssembleError),

    // === Output ===
    /// The bundle could not be written.
    #[error(transparent)]
    Output(#[from] OutputError),

    // === Execution ===
    /// The unit did not finish within the configured timeout.
    #[error("timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The unit's task panicked or was cancelled.
    #[error("task failed: {0}")]
    Task(String),
}

/// Errors that stop a whole run before or between batches.
#[derive(Debug, Error)]
pub enum SchedulerError {
    // === Configuration ===
    /// Attachments mode needs an attachments directory.
    #[error("attachments mode requires an attachments directory")]
    MissingAttachmentsDir,

    /// Concurrency must be at least one.
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,

    // === Preparation ===
    /// Input discovery or demographics expansion failed.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// The output directory could not be created.
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    // === Execution ===
    /// A background task of the scheduler itself failed.
    #[error("scheduler task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
