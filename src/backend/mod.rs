//! Sync backend capability interface.
//!
//! Three backends with materially different capability models sit behind one
//! trait: a stateful session protocol with explicit directory creation
//! ([`share`]), stateless HTTP tree operations ([`webdav`]), and direct
//! filesystem calls ([`local`]). The set is closed: backends are selected at
//! construction time from validated configuration, never detected at runtime.

pub mod local;
pub mod share;
pub mod webdav;

use crate::config::BackendConfig;
use crate::utils::errors::Result;
use serde::Serialize;
use std::path::Path;

pub use local::LocalClient;
pub use share::ShareClient;
pub use webdav::WebDavClient;

/// A file accepted by the backend.
#[derive(Debug, Clone, Serialize)]
pub struct UploadedFile {
    pub name: String,
    pub size: u64,
}

/// Result of a pre-flight connection check.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyInfo {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

/// Uniform operations over a remote storage tree.
///
/// `connect` failures abort the whole sync; `ensure_directory` and `upload`
/// failures are per-file and recorded in the report. `disconnect` is invoked
/// exactly once at the end of every sync attempt and never fails.
pub trait RemoteTreeClient {
    /// Establish a session. Validates required fields before any network I/O.
    fn connect(&mut self) -> Result<()>;

    /// Idempotent recursive directory creation: succeeds if the directory
    /// already exists, creates missing ancestors one component at a time.
    fn ensure_directory(&mut self, path: &str) -> Result<()>;

    /// Transfer one file to `remote_path`.
    fn upload(&mut self, local_file: &Path, remote_path: &str) -> Result<UploadedFile>;

    /// Best-effort session teardown. Swallows teardown failures so a prior
    /// success or failure is never masked.
    fn disconnect(&mut self);

    /// Confirm reachability and that the configured share/root exists,
    /// independent of any transfer.
    fn verify(&mut self) -> Result<VerifyInfo>;
}

/// The closed set of sync backends, dispatching [`RemoteTreeClient`] calls to
/// the selected variant.
pub enum SyncBackend {
    Share(ShareClient),
    WebDav(WebDavClient),
    Local(LocalClient),
}

impl SyncBackend {
    /// Build a backend from caller-supplied configuration. Validation and
    /// base-path normalization happen here, before any I/O.
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        let mut config = config.clone();
        config.validate()?;
        Ok(match config {
            BackendConfig::Share(c) => SyncBackend::Share(ShareClient::new(c)),
            BackendConfig::WebDav(c) => SyncBackend::WebDav(WebDavClient::new(c)),
            BackendConfig::Local(c) => SyncBackend::Local(LocalClient::new(c)),
        })
    }

    /// Remote root to sync under, derived from the validated base path.
    pub fn remote_root(&self) -> String {
        match self {
            SyncBackend::Share(c) => c.base_path().to_string(),
            SyncBackend::WebDav(c) => c.base_path().to_string(),
            // The local backend resolves paths under its target directory.
            SyncBackend::Local(_) => String::new(),
        }
    }
}

impl RemoteTreeClient for SyncBackend {
    fn connect(&mut self) -> Result<()> {
        match self {
            SyncBackend::Share(c) => c.connect(),
            SyncBackend::WebDav(c) => c.connect(),
            SyncBackend::Local(c) => c.connect(),
        }
    }

    fn ensure_directory(&mut self, path: &str) -> Result<()> {
        match self {
            SyncBackend::Share(c) => c.ensure_directory(path),
            SyncBackend::WebDav(c) => c.ensure_directory(path),
            SyncBackend::Local(c) => c.ensure_directory(path),
        }
    }

    fn upload(&mut self, local_file: &Path, remote_path: &str) -> Result<UploadedFile> {
        match self {
            SyncBackend::Share(c) => c.upload(local_file, remote_path),
            SyncBackend::WebDav(c) => c.upload(local_file, remote_path),
            SyncBackend::Local(c) => c.upload(local_file, remote_path),
        }
    }

    fn disconnect(&mut self) {
        match self {
            SyncBackend::Share(c) => c.disconnect(),
            SyncBackend::WebDav(c) => c.disconnect(),
            SyncBackend::Local(c) => c.disconnect(),
        }
    }

    fn verify(&mut self) -> Result<VerifyInfo> {
        match self {
            SyncBackend::Share(c) => c.verify(),
            SyncBackend::WebDav(c) => c.verify(),
            SyncBackend::Local(c) => c.verify(),
        }
    }
}

/// Split a forward-slash remote path into its non-empty components.
pub(crate) fn path_components(remote_path: &str) -> impl Iterator<Item = &str> {
    remote_path.split('/').filter(|part| !part.is_empty())
}
