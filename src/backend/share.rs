//! Network-share backend over an SSH session with an SFTP channel.
//!
//! The share is the exported top-level directory of the session root; every
//! remote path is addressed as `/<share>/<path>`. The session is stateful:
//! TCP connect, protocol handshake, password authentication, then file
//! operations against the open channel until disconnect.

use crate::backend::{path_components, RemoteTreeClient, UploadedFile, VerifyInfo};
use crate::config::ShareConfig;
use crate::utils::errors::{Result, SyncError};
use serde_json::json;
use std::io::Write;
use std::net::TcpStream;
use std::path::{Path, PathBuf};

pub struct ShareClient {
    config: ShareConfig,
    session: Option<ssh2::Session>,
    sftp: Option<ssh2::Sftp>,
}

impl ShareClient {
    pub fn new(config: ShareConfig) -> Self {
        Self {
            config,
            session: None,
            sftp: None,
        }
    }

    pub fn base_path(&self) -> &str {
        &self.config.path
    }

    /// Absolute path on the session root for a share-relative remote path.
    fn share_path(&self, remote_path: &str) -> PathBuf {
        let mut full = PathBuf::from("/");
        full.push(&self.config.share);
        for part in path_components(remote_path) {
            full.push(part);
        }
        full
    }

    fn sftp(&self) -> Result<&ssh2::Sftp> {
        self.sftp
            .as_ref()
            .ok_or_else(|| SyncError::Connection("share session not connected".into()))
    }

    fn validate(&self) -> Result<()> {
        if self.config.host.trim().is_empty() {
            return Err(SyncError::Config("share host is required".into()));
        }
        if self.config.username.trim().is_empty() {
            return Err(SyncError::Config("share username is required".into()));
        }
        if self.config.password.trim().is_empty() {
            return Err(SyncError::Config("share password is required".into()));
        }
        if self.config.share.trim().is_empty() {
            return Err(SyncError::Config("share name is required".into()));
        }
        Ok(())
    }
}

impl RemoteTreeClient for ShareClient {
    fn connect(&mut self) -> Result<()> {
        self.validate()?;

        let addr = format!("{}:{}", self.config.host, self.config.port);
        let tcp = TcpStream::connect(&addr)
            .map_err(|e| SyncError::Connection(format!("cannot reach {}: {}", addr, e)))?;

        let mut session = ssh2::Session::new()
            .map_err(|e| SyncError::Connection(format!("session init failed: {}", e)))?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| SyncError::Connection(format!("handshake with {} failed: {}", addr, e)))?;
        session
            .userauth_password(&self.config.username, &self.config.password)
            .map_err(|e| SyncError::Connection(format!("authentication rejected: {}", e)))?;
        if !session.authenticated() {
            return Err(SyncError::Connection("authentication rejected".into()));
        }

        let sftp = session
            .sftp()
            .map_err(|e| SyncError::Connection(format!("cannot open file channel: {}", e)))?;

        tracing::debug!(host = %self.config.host, share = %self.config.share, "Share session established");
        self.session = Some(session);
        self.sftp = Some(sftp);
        Ok(())
    }

    fn ensure_directory(&mut self, path: &str) -> Result<()> {
        let sftp = self.sftp()?;
        let share = self.config.share.clone();

        let mut current = PathBuf::from("/");
        current.push(&share);
        for part in path_components(path) {
            current.push(part);
            if sftp.stat(&current).is_ok() {
                continue;
            }
            if let Err(e) = sftp.mkdir(&current, 0o755) {
                // Another writer may have created it between stat and mkdir.
                if sftp.stat(&current).is_err() {
                    return Err(SyncError::Directory(format!(
                        "cannot create {}: {}",
                        current.display(),
                        e
                    )));
                }
            }
        }
        Ok(())
    }

    fn upload(&mut self, local_file: &Path, remote_path: &str) -> Result<UploadedFile> {
        let target = self.share_path(remote_path);
        let data = std::fs::read(local_file)
            .map_err(|e| SyncError::Upload(format!("cannot read {}: {}", local_file.display(), e)))?;

        let sftp = self.sftp()?;
        let mut remote = sftp
            .create(&target)
            .map_err(|e| SyncError::Upload(format!("cannot create {}: {}", target.display(), e)))?;
        remote
            .write_all(&data)
            .map_err(|e| SyncError::Upload(format!("write to {} failed: {}", target.display(), e)))?;

        let name = local_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(UploadedFile {
            name,
            size: data.len() as u64,
        })
    }

    fn disconnect(&mut self) {
        self.sftp = None;
        if let Some(session) = self.session.take() {
            // Teardown failures must never mask an earlier outcome.
            let _ = session.disconnect(None, "sync complete", None);
        }
    }

    fn verify(&mut self) -> Result<VerifyInfo> {
        if self.sftp.is_none() {
            self.connect()?;
        }
        let sftp = self.sftp()?;

        let entries = sftp
            .readdir(Path::new("/"))
            .map_err(|e| SyncError::Connection(format!("cannot enumerate shares: {}", e)))?;
        let shares: Vec<String> = entries
            .iter()
            .filter(|(_, stat)| stat.is_dir())
            .filter_map(|(path, _)| path.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();

        if !shares.iter().any(|s| s == &self.config.share) {
            return Err(SyncError::Connection(format!(
                "share '{}' not found (available: {})",
                self.config.share,
                shares.join(", ")
            )));
        }

        Ok(VerifyInfo {
            message: format!("Connected, share '{}' is available", self.config.share),
            detail: Some(json!({ "available_shares": shares })),
        })
    }
}
