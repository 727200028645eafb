//! Custom error types for the sync and backup engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    /// Missing or invalid credential/path fields, detected before any I/O.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend unreachable or authentication rejected at connect time.
    /// Fatal to the whole sync run.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Remote directory creation failed. Per-file, recorded in the report.
    #[error("Directory creation failed: {0}")]
    Directory(String),

    /// File transfer failed. Per-file, recorded in the report.
    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Backup not found: {0}")]
    NotFound(String),

    #[error("Invalid backup name: {0}")]
    InvalidName(String),

    /// Candidate path escapes its designated root directory.
    #[error("Path escapes storage root: {0}")]
    PathTraversal(String),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
