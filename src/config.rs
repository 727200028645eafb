//! Backend configuration types.
//!
//! One variant per sync backend, each carrying only the fields its backend
//! needs. Credentials are constructed per-request from validated input and
//! discarded after the sync call completes.

use crate::utils::errors::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default remote root used when a base path is left empty.
pub const DEFAULT_REMOTE_ROOT: &str = "/DMS";

/// What to sync in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncScope {
    Documents,
    Logs,
    All,
}

impl SyncScope {
    pub fn includes_documents(self) -> bool {
        matches!(self, SyncScope::Documents | SyncScope::All)
    }

    pub fn includes_logs(self) -> bool {
        matches!(self, SyncScope::Logs | SyncScope::All)
    }
}

/// Configuration for one sync backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum BackendConfig {
    Share(ShareConfig),
    WebDav(WebDavConfig),
    Local(LocalConfig),
}

impl BackendConfig {
    /// Validate required fields and normalize paths. Runs before any I/O.
    pub fn validate(&mut self) -> Result<()> {
        match self {
            BackendConfig::Share(c) => c.validate(),
            BackendConfig::WebDav(c) => c.validate(),
            BackendConfig::Local(c) => c.validate(),
        }
    }
}

/// Network-share backend (stateful session protocol).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    pub host: String,
    #[serde(default = "default_share_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Exported share name (top-level directory of the session root).
    pub share: String,
    /// Base path within the share.
    #[serde(default)]
    pub path: String,
}

impl ShareConfig {
    pub fn validate(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(SyncError::Config("share host is required".into()));
        }
        if self.username.trim().is_empty() {
            return Err(SyncError::Config("share username is required".into()));
        }
        if self.password.trim().is_empty() {
            return Err(SyncError::Config("share password is required".into()));
        }
        if self.share.trim().is_empty() {
            return Err(SyncError::Config("share name is required".into()));
        }
        self.path = normalize_base_path(&self.path)?;
        Ok(())
    }
}

fn default_share_port() -> u16 {
    22
}

/// WebDAV backend (stateless HTTP tree operations).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebDavConfig {
    /// Server base URL, e.g. `https://cloud.example.com`.
    pub url: String,
    pub username: String,
    pub password: String,
    /// Base path within the remote tree.
    #[serde(default)]
    pub path: String,
}

impl WebDavConfig {
    pub fn validate(&mut self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(SyncError::Config("WebDAV URL is required".into()));
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(SyncError::Config(
                "WebDAV URL must start with http:// or https://".into(),
            ));
        }
        if self.username.trim().is_empty() {
            return Err(SyncError::Config("WebDAV username is required".into()));
        }
        if self.password.trim().is_empty() {
            return Err(SyncError::Config("WebDAV password is required".into()));
        }
        self.url = self.url.trim_end_matches('/').to_string();
        self.path = normalize_base_path(&self.path)?;
        Ok(())
    }
}

/// Local filesystem mirror backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Target directory on the same or a mounted volume.
    pub target_dir: PathBuf,
}

impl LocalConfig {
    pub fn validate(&mut self) -> Result<()> {
        if self.target_dir.as_os_str().is_empty() {
            return Err(SyncError::Config("target directory is required".into()));
        }
        Ok(())
    }
}

/// Normalize a remote base path, applied identically across backends.
///
/// Rejects traversal sequences, strips the trailing slash, and falls back to
/// [`DEFAULT_REMOTE_ROOT`] when empty.
pub fn normalize_base_path(path: &str) -> Result<String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Ok(DEFAULT_REMOTE_ROOT.to_string());
    }
    if trimmed.starts_with("../") || trimmed.contains("/..") || trimmed.ends_with("..") {
        return Err(SyncError::Config(
            "base path cannot contain \"..\" sequences".into(),
        ));
    }
    let stripped = trimmed.trim_end_matches('/');
    if stripped.is_empty() {
        return Ok(DEFAULT_REMOTE_ROOT.to_string());
    }
    Ok(stripped.to_string())
}

/// Settings supplied by the environment: storage layout, log level and the
/// optional default share backend.
#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub storage_dir: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
    pub share_enabled: bool,
    pub share_host: Option<String>,
    pub share_port: u16,
    pub share_username: Option<String>,
    pub share_password: Option<String>,
    pub share_name: Option<String>,
    pub share_path: String,
}

impl StorageSettings {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let storage_dir = PathBuf::from(
            std::env::var("STORAGE_DIR").unwrap_or_else(|_| "/app/storage/uploads".into()),
        );
        let log_dir = match std::env::var("LOG_DIR") {
            Ok(v) => PathBuf::from(v),
            Err(_) => storage_dir.join("../logs"),
        };

        Self {
            storage_dir,
            log_dir,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            share_enabled: std::env::var("SHARE_ENABLED")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            share_host: std::env::var("SHARE_HOST").ok(),
            share_port: std::env::var("SHARE_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_share_port),
            share_username: std::env::var("SHARE_USERNAME").ok(),
            share_password: std::env::var("SHARE_PASSWORD").ok(),
            share_name: std::env::var("SHARE_NAME").ok(),
            share_path: std::env::var("SHARE_PATH").unwrap_or_default(),
        }
    }

    /// Backend config for the default share target, when one is fully
    /// configured and enabled.
    pub fn default_share_config(&self) -> Option<BackendConfig> {
        if !self.share_enabled {
            return None;
        }
        Some(BackendConfig::Share(ShareConfig {
            host: self.share_host.clone()?,
            port: self.share_port,
            username: self.share_username.clone()?,
            password: self.share_password.clone()?,
            share: self.share_name.clone()?,
            path: self.share_path.clone(),
        }))
    }
}
