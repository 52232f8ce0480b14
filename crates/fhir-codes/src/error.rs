use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading code descriptions or the procedure table.
#[derive(Debug, Error)]
pub enum CodesError {
    /// The HTTP request failed before a response arrived.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("download of {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The archive could not be opened or read.
    #[error("archive error: {0}")]
    Archive(String),

    /// The archive does not contain the expected code list.
    #[error("archive has no member named '{member}'")]
    MemberNotFound { member: String },

    #[error("failed to read procedure codes from {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A background task could not be joined.
    #[error("code loading task failed: {0}")]
    Task(String),
}

impl From<reqwest::Error> for CodesError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<zip::result::ZipError> for CodesError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Archive(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CodesError>;
