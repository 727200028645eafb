//! Local filesystem mirror backend.
//!
//! Remote paths resolve under the configured target directory; `connect` is
//! a no-op beyond validation and uploads are byte-for-byte copies that keep
//! permissions where the filesystem allows.

use crate::backend::{path_components, RemoteTreeClient, UploadedFile, VerifyInfo};
use crate::config::LocalConfig;
use crate::utils::errors::{Result, SyncError};
use serde_json::json;
use std::path::{Path, PathBuf};

pub struct LocalClient {
    config: LocalConfig,
}

impl LocalClient {
    pub fn new(config: LocalConfig) -> Self {
        Self { config }
    }

    pub fn target_dir(&self) -> &Path {
        &self.config.target_dir
    }

    fn resolve(&self, remote_path: &str) -> PathBuf {
        let mut target = self.config.target_dir.clone();
        for part in path_components(remote_path) {
            target.push(part);
        }
        target
    }
}

impl RemoteTreeClient for LocalClient {
    fn connect(&mut self) -> Result<()> {
        if self.config.target_dir.as_os_str().is_empty() {
            return Err(SyncError::Config("target directory is required".into()));
        }
        std::fs::create_dir_all(&self.config.target_dir).map_err(|e| {
            SyncError::Connection(format!(
                "cannot create target {}: {}",
                self.config.target_dir.display(),
                e
            ))
        })?;
        Ok(())
    }

    fn ensure_directory(&mut self, path: &str) -> Result<()> {
        let dir = self.resolve(path);
        std::fs::create_dir_all(&dir)
            .map_err(|e| SyncError::Directory(format!("cannot create {}: {}", dir.display(), e)))
    }

    fn upload(&mut self, local_file: &Path, remote_path: &str) -> Result<UploadedFile> {
        let target = self.resolve(remote_path);
        let size = std::fs::copy(local_file, &target).map_err(|e| {
            SyncError::Upload(format!(
                "copy {} -> {} failed: {}",
                local_file.display(),
                target.display(),
                e
            ))
        })?;

        let name = local_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(UploadedFile { name, size })
    }

    fn disconnect(&mut self) {}

    fn verify(&mut self) -> Result<VerifyInfo> {
        self.connect()?;

        let metadata = std::fs::metadata(&self.config.target_dir).map_err(|e| {
            SyncError::Connection(format!(
                "cannot stat {}: {}",
                self.config.target_dir.display(),
                e
            ))
        })?;
        if !metadata.is_dir() {
            return Err(SyncError::Connection(format!(
                "{} is not a directory",
                self.config.target_dir.display()
            )));
        }
        if metadata.permissions().readonly() {
            return Err(SyncError::Connection(format!(
                "{} is not writable",
                self.config.target_dir.display()
            )));
        }

        Ok(VerifyInfo {
            message: format!("Target {} is writable", self.config.target_dir.display()),
            detail: Some(json!({ "target_dir": self.config.target_dir })),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_directory_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let mut client = LocalClient::new(LocalConfig {
            target_dir: temp_dir.path().join("mirror"),
        });
        client.connect().unwrap();

        client.ensure_directory("/DMS/sub").unwrap();
        client.ensure_directory("/DMS/sub").unwrap();
        assert!(temp_dir.path().join("mirror/DMS/sub").is_dir());
    }

    #[test]
    fn test_upload_copies_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("a.pdf");
        fs::write(&source, b"0123456789").unwrap();

        let mut client = LocalClient::new(LocalConfig {
            target_dir: temp_dir.path().join("mirror"),
        });
        client.connect().unwrap();
        client.ensure_directory("docs").unwrap();

        let uploaded = client.upload(&source, "docs/a.pdf").unwrap();
        assert_eq!(uploaded.size, 10);
        assert_eq!(uploaded.name, "a.pdf");
        assert_eq!(
            fs::read(temp_dir.path().join("mirror/docs/a.pdf")).unwrap(),
            b"0123456789"
        );
    }

    #[test]
    fn test_verify_creates_missing_target() {
        let temp_dir = TempDir::new().unwrap();
        let mut client = LocalClient::new(LocalConfig {
            target_dir: temp_dir.path().join("fresh"),
        });

        let info = client.verify().unwrap();
        assert!(info.message.contains("writable"));
        assert!(temp_dir.path().join("fresh").is_dir());
    }

    #[test]
    fn test_connect_rejects_empty_target() {
        let mut client = LocalClient::new(LocalConfig {
            target_dir: PathBuf::new(),
        });
        assert!(matches!(client.connect(), Err(SyncError::Config(_))));
    }
}
