//! Sync orchestration.
//!
//! Walks a source tree and drives a [`RemoteTreeClient`] to replicate it
//! under a backend-specific remote root. Uploads are sequential; a per-file
//! failure is recorded in the report and never aborts the remaining walk,
//! while a connect failure aborts the whole run with a top-level failure.
//! `disconnect` runs exactly once on every exit path that opened a session.

use crate::backend::{RemoteTreeClient, SyncBackend};
use crate::config::{BackendConfig, SyncScope};
use crate::fs::walker::{collect_files, WalkOptions};
use crate::report::{
    ConnectionTest, LogSyncOutcome, SyncOutcome, SyncReport, SyncSummary, SyncedFile,
};
use chrono::Local;
use std::path::Path;

/// Directory under the storage root that holds backup archives. Excluded
/// from document syncs and backups so archives never nest.
pub const BACKUPS_DIR: &str = "backups";

/// Sub-path under the remote root that receives log uploads.
const LOGS_SUBDIR: &str = "logs";

/// Replicate every regular file under `source_dir` to the backend.
pub fn sync_tree(
    client: &mut dyn RemoteTreeClient,
    source_dir: &Path,
    remote_root: &str,
    options: &WalkOptions,
) -> SyncOutcome {
    if !source_dir.exists() {
        return SyncOutcome::failure(format!(
            "Source directory not found: {}",
            source_dir.display()
        ));
    }

    if let Err(e) = client.connect() {
        tracing::error!(error = %e, "Sync aborted: connect failed");
        client.disconnect();
        return SyncOutcome::failure(e.to_string());
    }

    let outcome = walk_and_upload(client, source_dir, remote_root, options);
    client.disconnect();
    outcome
}

fn walk_and_upload(
    client: &mut dyn RemoteTreeClient,
    source_dir: &Path,
    remote_root: &str,
    options: &WalkOptions,
) -> SyncOutcome {
    let files = match collect_files(source_dir, options) {
        Ok(files) => files,
        Err(e) => {
            tracing::error!(error = %e, "Sync aborted: cannot walk source tree");
            return SyncOutcome::failure(format!("Cannot read source directory: {}", e));
        }
    };

    let mut report = SyncReport::new();
    for file in files {
        let relative = to_forward_slash(&file.relative_path);
        let destination = join_remote(remote_root, &relative);
        let parent = destination
            .rsplit_once('/')
            .map(|(dir, _)| dir)
            .unwrap_or("");

        if let Err(e) = client.ensure_directory(parent) {
            tracing::warn!(file = %relative, error = %e, "Skipping file: directory creation failed");
            report.record_failure(relative, e.to_string());
            continue;
        }

        match client.upload(&file.path, &destination) {
            Ok(uploaded) => {
                tracing::debug!(file = %relative, size = uploaded.size, "File synced");
                report.record_success(SyncedFile {
                    name: uploaded.name,
                    relative_path: relative,
                    size: uploaded.size,
                });
            }
            Err(e) => {
                tracing::warn!(file = %relative, error = %e, "Upload failed");
                report.record_failure(relative, e.to_string());
            }
        }
    }

    tracing::info!(
        synced = report.files_synced,
        failed = report.files_failed,
        "Sync run finished"
    );
    SyncOutcome::completed(report)
}

/// Copy a single log file to `<remote_root>/logs`, renamed with a timestamp
/// suffix. Append-only: a prior upload is never overwritten.
pub fn sync_log_file(
    client: &mut dyn RemoteTreeClient,
    log_file: &Path,
    remote_root: &str,
) -> LogSyncOutcome {
    if !log_file.is_file() {
        return LogSyncOutcome::failure(format!("Log file not found: {}", log_file.display()));
    }

    if let Err(e) = client.connect() {
        tracing::error!(error = %e, "Log sync aborted: connect failed");
        client.disconnect();
        return LogSyncOutcome::failure(e.to_string());
    }

    let outcome = upload_log(client, log_file, remote_root);
    client.disconnect();
    outcome
}

fn upload_log(
    client: &mut dyn RemoteTreeClient,
    log_file: &Path,
    remote_root: &str,
) -> LogSyncOutcome {
    let logs_root = join_remote(remote_root, LOGS_SUBDIR);
    if let Err(e) = client.ensure_directory(&logs_root) {
        return LogSyncOutcome::failure(e.to_string());
    }

    let target_name = timestamped_log_name(log_file);
    let destination = join_remote(&logs_root, &target_name);

    match client.upload(log_file, &destination) {
        Ok(uploaded) => LogSyncOutcome {
            success: true,
            message: format!("Log synced: {}", target_name),
            file: Some(SyncedFile {
                name: target_name,
                relative_path: destination,
                size: uploaded.size,
            }),
        },
        Err(e) => {
            tracing::warn!(file = %log_file.display(), error = %e, "Log upload failed");
            LogSyncOutcome::failure(e.to_string())
        }
    }
}

/// `app.log` -> `app_20260830_141503.log`
fn timestamped_log_name(log_file: &Path) -> String {
    let stem = log_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "log".to_string());
    let extension = log_file
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    format!("{}_{}{}", stem, timestamp, extension)
}

/// Run one sync request against the selected backend.
///
/// The documents scope replicates the storage root (excluding the backups
/// directory); the logs scope uploads every `*.log` file in `log_dir`.
pub fn run_sync(
    config: &BackendConfig,
    scope: SyncScope,
    storage_root: &Path,
    log_dir: Option<&Path>,
) -> SyncSummary {
    let mut client = match SyncBackend::from_config(config) {
        Ok(client) => client,
        Err(e) => {
            return SyncSummary {
                success: false,
                message: e.to_string(),
                documents: None,
                logs: Vec::new(),
            }
        }
    };
    let remote_root = client.remote_root();

    let documents = if scope.includes_documents() {
        let options = WalkOptions::excluding([BACKUPS_DIR]);
        Some(sync_tree(&mut client, storage_root, &remote_root, &options))
    } else {
        None
    };

    let mut logs = Vec::new();
    if scope.includes_logs() {
        for log_file in list_log_files(log_dir) {
            logs.push(sync_log_file(&mut client, &log_file, &remote_root));
        }
    }

    let success = documents.as_ref().map_or(true, |d| d.success)
        && logs.iter().all(|l| l.success);
    SyncSummary {
        success,
        message: if success {
            "Sync completed".to_string()
        } else {
            "Sync completed with errors".to_string()
        },
        documents,
        logs,
    }
}

fn list_log_files(log_dir: Option<&Path>) -> Vec<std::path::PathBuf> {
    let Some(dir) = log_dir else {
        return Vec::new();
    };
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut logs: Vec<_> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "log"))
        .collect();
    logs.sort();
    logs
}

/// Pre-flight connection check. Never fails: every error converts into a
/// structured negative result with a sanitized message, while full detail
/// goes to the log.
pub fn test_connection(config: &BackendConfig) -> ConnectionTest {
    let mut client = match SyncBackend::from_config(config) {
        Ok(client) => client,
        Err(e) => return ConnectionTest::failure(e.to_string()),
    };

    let result = client.verify();
    client.disconnect();

    match result {
        Ok(info) => ConnectionTest {
            success: true,
            message: info.message,
            detail: info.detail,
        },
        Err(e) => {
            tracing::error!(error = %e, "Connection test failed");
            ConnectionTest::failure(e.to_string())
        }
    }
}

/// Remote paths always use forward slashes, regardless of host separator.
fn to_forward_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn join_remote(root: &str, relative: &str) -> String {
    format!("{}/{}", root.trim_end_matches('/'), relative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{UploadedFile, VerifyInfo};
    use crate::config::{LocalConfig, ShareConfig};
    use crate::utils::errors::SyncError;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::TempDir;

    /// Fault-injecting client: fails connect, directory creation or uploads
    /// on demand and counts every call.
    #[derive(Default)]
    struct MockClient {
        fail_connect: bool,
        fail_dirs: HashSet<String>,
        fail_uploads: HashSet<String>,
        connects: usize,
        disconnects: usize,
        ensured: Vec<String>,
        uploaded: Vec<String>,
    }

    impl RemoteTreeClient for MockClient {
        fn connect(&mut self) -> crate::Result<()> {
            self.connects += 1;
            if self.fail_connect {
                return Err(SyncError::Connection("mock connect refused".into()));
            }
            Ok(())
        }

        fn ensure_directory(&mut self, path: &str) -> crate::Result<()> {
            if self.fail_dirs.contains(path) {
                return Err(SyncError::Directory(format!("mock mkdir {} refused", path)));
            }
            self.ensured.push(path.to_string());
            Ok(())
        }

        fn upload(&mut self, local_file: &Path, remote_path: &str) -> crate::Result<UploadedFile> {
            if self.fail_uploads.contains(remote_path) {
                return Err(SyncError::Upload(format!("mock put {} refused", remote_path)));
            }
            self.uploaded.push(remote_path.to_string());
            Ok(UploadedFile {
                name: local_file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                size: fs::metadata(local_file).map(|m| m.len()).unwrap_or(0),
            })
        }

        fn disconnect(&mut self) {
            self.disconnects += 1;
        }

        fn verify(&mut self) -> crate::Result<VerifyInfo> {
            Ok(VerifyInfo {
                message: "mock ok".into(),
                detail: None,
            })
        }
    }

    fn sample_tree() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("sub")).unwrap();
        fs::write(temp_dir.path().join("a.pdf"), b"0123456789").unwrap();
        fs::write(temp_dir.path().join("sub/b.pdf"), b"01234567890123456789").unwrap();
        fs::write(temp_dir.path().join(".hidden"), b"01234").unwrap();
        temp_dir
    }

    #[test]
    fn test_missing_source_short_circuits_before_connect() {
        let mut client = MockClient::default();
        let outcome = sync_tree(
            &mut client,
            Path::new("/nonexistent/source"),
            "/DMS",
            &WalkOptions::default(),
        );

        assert!(!outcome.success);
        assert!(outcome.report.is_none());
        assert_eq!(client.connects, 0);
        assert_eq!(client.disconnects, 0);
    }

    #[test]
    fn test_connect_failure_aborts_with_single_disconnect() {
        let temp_dir = sample_tree();
        let mut client = MockClient {
            fail_connect: true,
            ..Default::default()
        };

        let outcome = sync_tree(&mut client, temp_dir.path(), "/DMS", &WalkOptions::default());

        assert!(!outcome.success);
        assert!(outcome.report.is_none());
        assert!(client.uploaded.is_empty());
        assert_eq!(client.disconnects, 1);
    }

    #[test]
    fn test_full_success_uses_forward_slash_destinations() {
        let temp_dir = sample_tree();
        let mut client = MockClient::default();

        let outcome = sync_tree(&mut client, temp_dir.path(), "/DMS", &WalkOptions::default());

        assert!(outcome.success);
        let report = outcome.report.unwrap();
        assert_eq!(report.files_synced, 2);
        assert_eq!(report.files_failed, 0);
        assert_eq!(client.uploaded, vec!["/DMS/a.pdf", "/DMS/sub/b.pdf"]);
        assert_eq!(client.disconnects, 1);
    }

    #[test]
    fn test_directory_failure_skips_upload_but_continues() {
        let temp_dir = sample_tree();
        let mut client = MockClient::default();
        client.fail_dirs.insert("/DMS/sub".to_string());

        let outcome = sync_tree(&mut client, temp_dir.path(), "/DMS", &WalkOptions::default());

        // Connect succeeded, so the run is a success at the operation level.
        assert!(outcome.success);
        let report = outcome.report.unwrap();
        assert_eq!(report.files_synced, 1);
        assert_eq!(report.files_failed, 1);
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files[0].name, "a.pdf");
        assert_eq!(report.files[0].size, 10);
        assert_eq!(report.errors[0].relative_path, "sub/b.pdf");
        // The hidden file was never attempted.
        assert!(!client.uploaded.iter().any(|p| p.contains("hidden")));
        assert_eq!(client.uploaded, vec!["/DMS/a.pdf"]);
    }

    #[test]
    fn test_partial_upload_failures_account_for_every_file() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            fs::write(temp_dir.path().join(name), b"data").unwrap();
        }
        let mut client = MockClient::default();
        client.fail_uploads.insert("/DMS/b.txt".to_string());

        let outcome = sync_tree(&mut client, temp_dir.path(), "/DMS", &WalkOptions::default());

        assert!(outcome.success);
        let report = outcome.report.unwrap();
        assert_eq!(report.files_synced + report.files_failed, 3);
        assert_eq!(report.files.len(), report.files_synced);
        assert_eq!(report.errors.len(), report.files_failed);
        assert_eq!(report.files_failed, 1);
    }

    #[test]
    fn test_log_sync_appends_timestamp_under_logs_dir() {
        let temp_dir = TempDir::new().unwrap();
        let log_file = temp_dir.path().join("app.log");
        fs::write(&log_file, b"log line").unwrap();

        let mut client = MockClient::default();
        let outcome = sync_log_file(&mut client, &log_file, "/DMS");

        assert!(outcome.success);
        let file = outcome.file.unwrap();
        assert!(file.name.starts_with("app_"));
        assert!(file.name.ends_with(".log"));
        assert_ne!(file.name, "app.log");
        assert!(file.relative_path.starts_with("/DMS/logs/"));
        assert!(client.ensured.contains(&"/DMS/logs".to_string()));
        assert_eq!(client.disconnects, 1);
    }

    #[test]
    fn test_log_sync_missing_file_fails_without_connect() {
        let mut client = MockClient::default();
        let outcome = sync_log_file(&mut client, Path::new("/nonexistent/app.log"), "/DMS");

        assert!(!outcome.success);
        assert_eq!(client.connects, 0);
    }

    #[test]
    fn test_run_sync_local_backend_mirrors_documents_and_logs() {
        let storage = sample_tree();
        fs::create_dir(storage.path().join("backups")).unwrap();
        fs::write(storage.path().join("backups/old.zip"), b"zip").unwrap();

        let logs = TempDir::new().unwrap();
        fs::write(logs.path().join("app.log"), b"log line").unwrap();
        fs::write(logs.path().join("notes.txt"), b"not a log").unwrap();

        let mirror = TempDir::new().unwrap();
        let config = BackendConfig::Local(LocalConfig {
            target_dir: mirror.path().join("target"),
        });

        let summary = run_sync(&config, SyncScope::All, storage.path(), Some(logs.path()));

        assert!(summary.success);
        let documents = summary.documents.unwrap();
        assert_eq!(documents.report.unwrap().files_synced, 2);
        assert!(mirror.path().join("target/a.pdf").is_file());
        assert!(mirror.path().join("target/sub/b.pdf").is_file());
        // Backups and hidden files are never mirrored.
        assert!(!mirror.path().join("target/backups").exists());
        assert!(!mirror.path().join("target/.hidden").exists());

        assert_eq!(summary.logs.len(), 1);
        let log_entries: Vec<_> = fs::read_dir(mirror.path().join("target/logs"))
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(log_entries.len(), 1);
        assert!(log_entries[0]
            .file_name()
            .to_string_lossy()
            .starts_with("app_"));
    }

    #[test]
    fn test_run_sync_rejects_invalid_config_before_io() {
        let config = BackendConfig::Share(ShareConfig {
            host: "".into(),
            port: 22,
            username: "user".into(),
            password: "pass".into(),
            share: "documents".into(),
            path: "".into(),
        });

        let summary = run_sync(&config, SyncScope::Documents, Path::new("/tmp"), None);
        assert!(!summary.success);
        assert!(summary.documents.is_none());
    }

    #[test]
    fn test_connection_test_never_errors_on_bad_config() {
        let config = BackendConfig::Share(ShareConfig {
            host: "nas.local".into(),
            port: 22,
            username: "".into(),
            password: "pass".into(),
            share: "documents".into(),
            path: "../escape".into(),
        });

        let result = test_connection(&config);
        assert!(!result.success);
        assert!(!result.message.is_empty());
    }
}
