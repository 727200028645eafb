//! Deterministic directory traversal for sync and backup runs.
//!
//! Every run performs a full tree walk (no delta detection). Hidden files
//! are always skipped, and directories named in the exclusion list are
//! pruned at the top level so a backup never archives prior backups.

use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Options for directory walking
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Top-level directory names to prune entirely (e.g. `backups`).
    pub exclude_root_dirs: Vec<String>,
}

impl WalkOptions {
    /// Exclude the given top-level directories from the walk.
    pub fn excluding<I, S>(dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            exclude_root_dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }
}

/// Information about a file discovered during walking
#[derive(Debug, Clone)]
pub struct FileInfo {
    /// Full path to the file
    pub path: PathBuf,

    /// Relative path from the root
    pub relative_path: PathBuf,

    /// File size in bytes
    pub size: u64,
}

/// Walk a directory tree and collect every regular, non-hidden file.
///
/// Order is deterministic within one run: entries are visited in lexical
/// directory-then-file order.
pub fn collect_files(root: &Path, options: &WalkOptions) -> std::io::Result<Vec<FileInfo>> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_excluded_root_dir(entry, &options.exclude_root_dirs));

    for entry in walker {
        let entry = entry.map_err(std::io::Error::other)?;

        if !entry.file_type().is_file() {
            continue;
        }
        if is_hidden(&entry) {
            continue;
        }

        let metadata = entry.metadata().map_err(std::io::Error::other)?;
        let path = entry.path().to_path_buf();
        let relative_path = path.strip_prefix(root).unwrap_or(&path).to_path_buf();

        files.push(FileInfo {
            path,
            relative_path,
            size: metadata.len(),
        });
    }

    Ok(files)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn is_excluded_root_dir(entry: &DirEntry, excluded: &[String]) -> bool {
    if entry.depth() != 1 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    excluded.iter().any(|ex| ex.as_str() == name)
}
