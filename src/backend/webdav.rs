//! WebDAV backend over synchronous HTTP.
//!
//! Tree operations map onto DAV verbs: PROPFIND for existence probes, MKCOL
//! for directory creation, PUT for uploads. Requests target the per-user
//! files endpoint (`<base>/remote.php/dav/files/<user>`), the layout used by
//! Nextcloud-style servers.

use crate::backend::{path_components, RemoteTreeClient, UploadedFile, VerifyInfo};
use crate::config::WebDavConfig;
use crate::utils::errors::{Result, SyncError};
use reqwest::blocking::Client;
use reqwest::{Method, StatusCode, Url};
use serde_json::json;
use std::path::Path;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:propfind xmlns:d="DAV:"><d:prop><d:resourcetype/></d:prop></d:propfind>"#;

pub struct WebDavClient {
    config: WebDavConfig,
    http: Option<Client>,
}

impl WebDavClient {
    pub fn new(config: WebDavConfig) -> Self {
        Self { config, http: None }
    }

    pub fn base_path(&self) -> &str {
        &self.config.path
    }

    fn http(&self) -> Result<&Client> {
        self.http
            .as_ref()
            .ok_or_else(|| SyncError::Connection("WebDAV client not connected".into()))
    }

    fn validate(&self) -> Result<()> {
        if self.config.url.trim().is_empty() {
            return Err(SyncError::Config("WebDAV URL is required".into()));
        }
        if self.config.username.trim().is_empty() {
            return Err(SyncError::Config("WebDAV username is required".into()));
        }
        if self.config.password.trim().is_empty() {
            return Err(SyncError::Config("WebDAV password is required".into()));
        }
        Ok(())
    }

    /// URL for a remote path under the user's DAV files endpoint. Segments
    /// are pushed through the URL parser so names get percent-encoded.
    fn dav_url(&self, remote_path: &str) -> Result<Url> {
        let base = format!(
            "{}/remote.php/dav/files/{}",
            self.config.url, self.config.username
        );
        let mut url = Url::parse(&base)
            .map_err(|e| SyncError::Config(format!("invalid WebDAV URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| SyncError::Config("WebDAV URL cannot be a base".into()))?
            .extend(path_components(remote_path));
        Ok(url)
    }

    /// PROPFIND with depth 0; 404 means absent, 207/2xx means present.
    fn exists(&self, remote_path: &str) -> Result<bool> {
        let url = self.dav_url(remote_path)?;
        let response = self
            .http()?
            .request(Method::from_bytes(b"PROPFIND").expect("valid method"), url.clone())
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header("Depth", "0")
            .header("Content-Type", "application/xml; charset=utf-8")
            .body(PROPFIND_BODY)
            .send()
            .map_err(|e| SyncError::Connection(format!("PROPFIND {} failed: {}", url, e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SyncError::Connection(
                "WebDAV authentication rejected".into(),
            )),
            status if status == StatusCode::MULTI_STATUS || status.is_success() => Ok(true),
            status => Err(SyncError::Connection(format!(
                "PROPFIND {} returned {}",
                url, status
            ))),
        }
    }

    fn mkcol(&self, remote_path: &str) -> Result<()> {
        let url = self.dav_url(remote_path)?;
        let response = self
            .http()?
            .request(Method::from_bytes(b"MKCOL").expect("valid method"), url.clone())
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .map_err(|e| SyncError::Directory(format!("MKCOL {} failed: {}", url, e)))?;

        match response.status() {
            // 405 means the collection already exists; the create is idempotent.
            StatusCode::METHOD_NOT_ALLOWED => Ok(()),
            status if status.is_success() => Ok(()),
            status => Err(SyncError::Directory(format!(
                "MKCOL {} returned {}",
                url, status
            ))),
        }
    }
}

impl RemoteTreeClient for WebDavClient {
    fn connect(&mut self) -> Result<()> {
        self.validate()?;

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SyncError::Connection(format!("HTTP client init failed: {}", e)))?;
        self.http = Some(http);

        // Probe the DAV root so credential problems surface at connect time.
        if !self.exists("")? {
            self.http = None;
            return Err(SyncError::Connection(
                "WebDAV root directory not accessible".into(),
            ));
        }

        tracing::debug!(url = %self.config.url, "WebDAV session established");
        Ok(())
    }

    fn ensure_directory(&mut self, path: &str) -> Result<()> {
        let mut current = String::new();
        for part in path_components(path) {
            current.push('/');
            current.push_str(part);
            if !self.exists(&current)? {
                self.mkcol(&current)?;
            }
        }
        Ok(())
    }

    fn upload(&mut self, local_file: &Path, remote_path: &str) -> Result<UploadedFile> {
        let data = std::fs::read(local_file)
            .map_err(|e| SyncError::Upload(format!("cannot read {}: {}", local_file.display(), e)))?;
        let size = data.len() as u64;

        let url = self.dav_url(remote_path)?;
        let response = self
            .http()?
            .put(url.clone())
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header("Content-Type", "application/octet-stream")
            .body(data)
            .send()
            .map_err(|e| SyncError::Upload(format!("PUT {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Upload(format!("PUT {} returned {}", url, status)));
        }

        let name = local_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(UploadedFile { name, size })
    }

    fn disconnect(&mut self) {
        // Stateless protocol: dropping the client is the whole teardown.
        self.http = None;
    }

    fn verify(&mut self) -> Result<VerifyInfo> {
        if self.http.is_none() {
            self.connect()?;
        }

        let base_path = self.config.path.clone();
        if !self.exists(&base_path)? {
            return Err(SyncError::Connection(format!(
                "base path '{}' not reachable",
                self.config.path
            )));
        }

        Ok(VerifyInfo {
            message: "Connected to WebDAV server".to_string(),
            detail: Some(json!({ "url": self.config.url, "username": self.config.username })),
        })
    }
}
