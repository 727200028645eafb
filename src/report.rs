//! Value objects returned by sync, backup and restore operations.
//!
//! A [`SyncReport`] distinguishes per-file failures from operation-level
//! failure: connect/configuration errors produce a [`SyncOutcome`] with no
//! report at all, while per-file errors accumulate without aborting the walk.

use chrono::{DateTime, Local};
use serde::Serialize;

/// One successfully transferred file.
#[derive(Debug, Clone, Serialize)]
pub struct SyncedFile {
    pub name: String,
    pub relative_path: String,
    pub size: u64,
}

/// One file that failed during transfer.
#[derive(Debug, Clone, Serialize)]
pub struct SyncFileError {
    pub relative_path: String,
    pub error: String,
}

/// Structured outcome of one sync run.
///
/// Invariant: `files_synced == files.len()` and `files_failed == errors.len()`
/// at all times; a failure on one file never removes a recorded success.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub timestamp: DateTime<Local>,
    pub files_synced: usize,
    pub files_failed: usize,
    pub files: Vec<SyncedFile>,
    pub errors: Vec<SyncFileError>,
}

impl SyncReport {
    pub fn new() -> Self {
        Self {
            timestamp: Local::now(),
            files_synced: 0,
            files_failed: 0,
            files: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn record_success(&mut self, file: SyncedFile) {
        self.files_synced += 1;
        self.files.push(file);
    }

    pub fn record_failure(&mut self, relative_path: impl Into<String>, error: impl Into<String>) {
        self.files_failed += 1;
        self.errors.push(SyncFileError {
            relative_path: relative_path.into(),
            error: error.into(),
        });
    }
}

impl Default for SyncReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one tree sync: either an operation-level failure (nothing was
/// attempted) or a completed walk with a per-file report.
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<SyncReport>,
}

impl SyncOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            report: None,
        }
    }

    pub fn completed(report: SyncReport) -> Self {
        Self {
            success: true,
            message: format!("Synced {} files", report.files_synced),
            report: Some(report),
        }
    }
}

/// Result of the single-file log sync variant.
#[derive(Debug, Clone, Serialize)]
pub struct LogSyncOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<SyncedFile>,
}

impl LogSyncOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            file: None,
        }
    }
}

/// Per-scope results of one sync request.
#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<SyncOutcome>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<LogSyncOutcome>,
}

/// Structured result of a connection test. Never an error: all failure modes
/// convert into `success = false`.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionTest {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

impl ConnectionTest {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            detail: None,
        }
    }
}

/// A stored backup archive.
#[derive(Debug, Clone, Serialize)]
pub struct BackupDescriptor {
    pub name: String,
    pub size: u64,
    pub created: DateTime<Local>,
}

/// Result of restoring an archive into the storage root.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RestoreOutcome {
    /// Entries written under the storage root.
    pub files_restored: usize,
    /// Entries rejected by path validation and skipped.
    pub entries_skipped: usize,
}
