//! Archive restore with strict path containment.
//!
//! Every entry is validated twice before any byte is written: a component
//! check rejects empty, absolute and `..`-carrying names outright, then the
//! resolved target is re-checked against the storage root with the path
//! guard. A rejected entry is skipped and counted; an underlying I/O fault
//! aborts the whole restore.

use crate::fs::path_guard;
use crate::report::RestoreOutcome;
use crate::utils::errors::Result;
use std::io::{Cursor, Read};
use std::path::{Component, Path};
use zip::ZipArchive;

/// Extract `archive_bytes` into `storage_root`, overwriting existing files.
pub fn restore(storage_root: &Path, archive_bytes: &[u8]) -> Result<RestoreOutcome> {
    let mut archive = ZipArchive::new(Cursor::new(archive_bytes))?;
    let mut outcome = RestoreOutcome::default();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }

        let entry_name = entry.name().to_string();
        if !is_acceptable_entry_name(&entry_name) {
            tracing::warn!(entry = %entry_name, "Skipping archive entry: unsafe name");
            outcome.entries_skipped += 1;
            continue;
        }

        // Defense in depth: the resolved target must still sit under the
        // storage root even if the name check above were bypassed.
        if !path_guard::is_safe(storage_root, &entry_name) {
            tracing::warn!(entry = %entry_name, "Skipping archive entry: escapes storage root");
            outcome.entries_skipped += 1;
            continue;
        }

        let target = storage_root.join(&entry_name);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        std::fs::write(&target, &data)?;
        outcome.files_restored += 1;
    }

    tracing::info!(
        restored = outcome.files_restored,
        skipped = outcome.entries_skipped,
        "Restore finished"
    );
    Ok(outcome)
}

/// Relative, non-empty, and free of `..` components on either separator.
fn is_acceptable_entry_name(name: &str) -> bool {
    if name.is_empty() || name.starts_with('/') || name.starts_with('\\') {
        return false;
    }
    Path::new(name).components().all(|component| {
        matches!(component, Component::Normal(_) | Component::CurDir)
    }) && !name.split('\\').any(|segment| segment == "..")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::archive::create_backup;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn build_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, data) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_restore_writes_entries_under_root() {
        let storage = TempDir::new().unwrap();
        let bytes = build_archive(&[("a.pdf", b"document a"), ("docs/b.pdf", b"document b")]);

        let outcome = restore(storage.path(), &bytes).unwrap();
        assert_eq!(outcome.files_restored, 2);
        assert_eq!(outcome.entries_skipped, 0);
        assert_eq!(fs::read(storage.path().join("a.pdf")).unwrap(), b"document a");
        assert_eq!(
            fs::read(storage.path().join("docs/b.pdf")).unwrap(),
            b"document b"
        );
    }

    #[test]
    fn test_restore_overwrites_existing_files() {
        let storage = TempDir::new().unwrap();
        fs::write(storage.path().join("a.pdf"), b"stale").unwrap();

        let bytes = build_archive(&[("a.pdf", b"fresh")]);
        restore(storage.path(), &bytes).unwrap();

        assert_eq!(fs::read(storage.path().join("a.pdf")).unwrap(), b"fresh");
    }

    #[test]
    fn test_restore_skips_traversal_entries() {
        let parent = TempDir::new().unwrap();
        let storage = parent.path().join("storage");
        fs::create_dir(&storage).unwrap();

        let bytes = build_archive(&[
            ("../../etc/passwd", b"root::0:0"),
            ("../escaped.txt", b"outside"),
            ("/abs/path.txt", b"absolute"),
            ("safe.txt", b"inside"),
        ]);

        let outcome = restore(&storage, &bytes).unwrap();
        assert_eq!(outcome.files_restored, 1);
        assert_eq!(outcome.entries_skipped, 3);
        assert_eq!(fs::read(storage.join("safe.txt")).unwrap(), b"inside");
        // Nothing was written outside the storage root.
        assert!(!parent.path().join("escaped.txt").exists());
        assert!(!parent.path().join("etc").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_restore_skips_entries_routed_through_symlink() {
        let parent = TempDir::new().unwrap();
        let storage = parent.path().join("storage");
        let outside = parent.path().join("outside");
        fs::create_dir(&storage).unwrap();
        fs::create_dir(&outside).unwrap();
        std::os::unix::fs::symlink(&outside, storage.join("link")).unwrap();

        // Entry name is clean of `..`, but its first component is a symlink
        // pointing outside the storage root and the rest does not exist yet.
        let bytes = build_archive(&[("link/sub/evil.txt", b"payload")]);

        let outcome = restore(&storage, &bytes).unwrap();
        assert_eq!(outcome.files_restored, 0);
        assert_eq!(outcome.entries_skipped, 1);
        assert!(!outside.join("sub").exists());
    }

    #[test]
    fn test_backup_restore_round_trip_after_deletion() {
        let storage = TempDir::new().unwrap();
        fs::create_dir(storage.path().join("docs")).unwrap();
        fs::write(storage.path().join("a.pdf"), b"document a").unwrap();
        fs::write(storage.path().join("docs/b.pdf"), b"document b").unwrap();

        let descriptor = create_backup(storage.path()).unwrap();
        let bytes = crate::backup::archive::fetch_backup(storage.path(), &descriptor.name).unwrap();

        // Delete the originals between backup and restore.
        fs::remove_file(storage.path().join("a.pdf")).unwrap();
        fs::remove_file(storage.path().join("docs/b.pdf")).unwrap();

        let outcome = restore(storage.path(), &bytes).unwrap();
        assert_eq!(outcome.files_restored, 2);
        assert_eq!(fs::read(storage.path().join("a.pdf")).unwrap(), b"document a");
        assert_eq!(
            fs::read(storage.path().join("docs/b.pdf")).unwrap(),
            b"document b"
        );
    }

    #[test]
    fn test_restore_rejects_corrupt_archive() {
        let storage = TempDir::new().unwrap();
        assert!(restore(storage.path(), b"not a zip archive").is_err());
    }
}
