//! Path normalization for stored tree paths
//!
//! Stored paths are `/`-separated, always rooted with a leading `/`, and the
//! repository root is the single separator. Walked paths and paths read back
//! from the store go through the same functions so that diffing compares
//! like with like.

use crate::error::StorageError;
use std::path::{Component, Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// The stored representation of the repository root.
pub const ROOT: &str = "/";

/// Canonicalize a filesystem path (resolves symlinks, `..`, `.`)
pub fn canonicalize_path(path: &Path) -> Result<PathBuf, StorageError> {
    dunce::canonicalize(path).map_err(|e| {
        StorageError::InvalidPath(format!(
            "Failed to canonicalize path {}: {}",
            path.display(),
            e
        ))
    })
}

/// Normalize a directory path relative to the repository root.
///
/// `""` and `"."` map to `/`; every other path gains a leading `/` if it
/// lacks one. Backslashes are treated as separators, empty and `.`
/// segments are dropped, and Unicode is normalized to NFC. The function is
/// idempotent.
pub fn normalize_dir_path(path: &str) -> String {
    let nfc: String = path.nfc().collect();
    let segments: Vec<&str> = nfc
        .split(|c| c == '/' || c == '\\')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();

    if segments.is_empty() {
        return ROOT.to_string();
    }
    format!("/{}", segments.join("/"))
}

/// Stored path of `path` relative to `root`.
pub fn stored_path(root: &Path, path: &Path) -> Result<String, StorageError> {
    let relative = path.strip_prefix(root).map_err(|_| {
        StorageError::InvalidPath(format!(
            "{} is not inside {}",
            path.display(),
            root.display()
        ))
    })?;

    let mut joined = String::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => {
                joined.push('/');
                joined.push_str(&name.to_string_lossy());
            }
            Component::CurDir => {}
            other => {
                return Err(StorageError::InvalidPath(format!(
                    "Unexpected path component {:?} in {}",
                    other,
                    path.display()
                )))
            }
        }
    }
    Ok(normalize_dir_path(&joined))
}

/// Split a stored path into its parent directory and basename.
///
/// The root has no parent; it splits into (`/`, `""`).
pub fn split_parent(stored: &str) -> (String, String) {
    let normalized = normalize_dir_path(stored);
    match normalized.rfind('/') {
        Some(0) => (ROOT.to_string(), normalized[1..].to_string()),
        Some(idx) => (
            normalized[..idx].to_string(),
            normalized[idx + 1..].to_string(),
        ),
        None => (ROOT.to_string(), normalized),
    }
}

/// Join a stored directory path and a basename.
pub fn join_stored(dir: &str, name: &str) -> String {
    normalize_dir_path(&format!("{}/{}", dir, name))
}

/// The directory itself followed by every ancestor, ending with `/`.
pub fn ancestors(dir: &str) -> Vec<String> {
    let mut current = normalize_dir_path(dir);
    let mut chain = vec![current.clone()];
    while current != ROOT {
        current = split_parent(&current).0;
        chain.push(current.clone());
    }
    chain
}

/// Filesystem location of a stored entry inside a working copy.
pub fn local_path(root: &Path, dir: &str, name: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    for segment in normalize_dir_path(dir).split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    if !name.is_empty() {
        path.push(name);
    }
    path
}
