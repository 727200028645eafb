//! Archive creation, listing and retrieval.
//!
//! Backups are zip archives of the whole storage root, written under
//! `<storage_root>/backups`. Names carry a second-granularity timestamp so
//! lexical sort equals chronological sort and two runs in different seconds
//! never collide.

use crate::engine::BACKUPS_DIR;
use crate::fs::path_guard;
use crate::fs::walker::{collect_files, WalkOptions};
use crate::report::BackupDescriptor;
use crate::utils::errors::{Result, SyncError};
use chrono::{DateTime, Local};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const BACKUP_PREFIX: &str = "DMS_Backup";
const BACKUP_EXTENSION: &str = "zip";

/// Snapshot the storage root into a timestamped archive.
///
/// Every non-hidden file outside the backups directory is added under its
/// path relative to `storage_root`, with forward slashes.
pub fn create_backup(storage_root: &Path) -> Result<BackupDescriptor> {
    let backup_dir = storage_root.join(BACKUPS_DIR);
    std::fs::create_dir_all(&backup_dir)?;

    let created = Local::now();
    let name = format!(
        "{}_{}.{}",
        BACKUP_PREFIX,
        created.format("%Y%m%d_%H%M%S"),
        BACKUP_EXTENSION
    );
    let backup_path = backup_dir.join(&name);

    let files = collect_files(storage_root, &WalkOptions::excluding([BACKUPS_DIR]))?;

    let file = File::create(&backup_path)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in &files {
        let arcname = entry
            .relative_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        zip.start_file(arcname, options)?;
        let data = std::fs::read(&entry.path)?;
        zip.write_all(&data)?;
    }
    zip.finish()?.flush()?;

    let size = std::fs::metadata(&backup_path)?.len();
    tracing::info!(name = %name, files = files.len(), size, "Backup created");

    Ok(BackupDescriptor {
        name,
        size,
        created,
    })
}

/// List stored archives, newest first.
pub fn list_backups(storage_root: &Path) -> Result<Vec<BackupDescriptor>> {
    let backup_dir = storage_root.join(BACKUPS_DIR);
    std::fs::create_dir_all(&backup_dir)?;

    let mut backups = Vec::new();
    for entry in std::fs::read_dir(&backup_dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != BACKUP_EXTENSION) {
            continue;
        }
        let metadata = entry.metadata()?;
        let created: DateTime<Local> = metadata.modified()?.into();
        backups.push(BackupDescriptor {
            name: entry.file_name().to_string_lossy().into_owned(),
            size: metadata.len(),
            created,
        });
    }

    backups.sort_by(|a, b| b.created.cmp(&a.created).then(b.name.cmp(&a.name)));
    Ok(backups)
}

/// Read a stored archive by name, validated against the backups directory.
pub fn fetch_backup(storage_root: &Path, name: &str) -> Result<Vec<u8>> {
    let backup_dir = storage_root.join(BACKUPS_DIR);
    std::fs::create_dir_all(&backup_dir)?;
    if !path_guard::is_safe(&backup_dir, name) {
        return Err(SyncError::InvalidName(name.to_string()));
    }

    let backup_path = backup_dir.join(name);
    if !backup_path.is_file() {
        return Err(SyncError::NotFound(name.to_string()));
    }
    Ok(std::fs::read(backup_path)?)
}
