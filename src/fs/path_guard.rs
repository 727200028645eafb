//! Path containment checks for archive entries and backup filenames.
//!
//! Defends the restore and backup-download paths against path traversal and
//! zip-slip style attacks: a relative candidate must resolve to a location
//! still under its designated root. Comparison is component-wise on
//! canonicalized paths, never a textual prefix check, so `backups-evil` does
//! not pass as being under `backups` and symlinked escapes are caught.

use std::path::{Component, Path, PathBuf};

/// Returns true only if `candidate`, joined onto `root`, cannot escape `root`.
///
/// Rejects empty candidates, absolute candidates (leading `/` or `\`), and
/// any candidate containing a `..` component. Pure predicate: touches the
/// filesystem only to canonicalize.
pub fn is_safe(root: &Path, candidate: &str) -> bool {
    if candidate.is_empty() {
        return false;
    }
    if candidate.starts_with('/') || candidate.starts_with('\\') {
        return false;
    }
    if has_parent_component(candidate) {
        return false;
    }

    let canonical_root = match root.canonicalize() {
        Ok(p) => p,
        Err(_) => return false,
    };

    let joined = join_normalized(&canonical_root, candidate);

    // Canonicalize the deepest ancestor that exists on disk, so a symlink
    // anywhere along the candidate is resolved even when the components
    // below it are missing. The remaining components carry no `..` or
    // absolute segments, so containment of the ancestor decides.
    let mut ancestor = joined.as_path();
    while ancestor.symlink_metadata().is_err() {
        match ancestor.parent() {
            Some(parent) => ancestor = parent,
            None => return false,
        }
    }
    match ancestor.canonicalize() {
        Ok(resolved) => resolved == canonical_root || resolved.starts_with(&canonical_root),
        // Dangling symlink along the path
        Err(_) => false,
    }
}

/// True if any path component of `candidate` is `..`, on either separator.
fn has_parent_component(candidate: &str) -> bool {
    candidate
        .split(['/', '\\'])
        .any(|segment| segment == "..")
}

/// Join `candidate` onto `root`, dropping empty and `.` segments.
fn join_normalized(root: &Path, candidate: &str) -> PathBuf {
    let mut joined = root.to_path_buf();
    for component in Path::new(candidate).components() {
        if let Component::Normal(part) = component {
            joined.push(part);
        }
    }
    joined
}
