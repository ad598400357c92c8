//! Filesystem walker for traversing a working copy

use crate::error::StorageError;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// Filesystem entry types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// A regular file or a symlink (git stores both as blobs)
    File {
        path: PathBuf,
        size: u64,
        symlink: bool,
    },
    /// A directory entry with its path
    Directory { path: PathBuf },
}

impl Entry {
    pub fn path(&self) -> &Path {
        match self {
            Entry::File { path, .. } | Entry::Directory { path } => path,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Entry::File { .. })
    }
}

/// Filesystem walker configuration
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Whether to follow symbolic links (default: false)
    pub follow_symlinks: bool,
    /// Entry names to prune from the walk, matched against whole components
    pub ignore_patterns: Vec<String>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            ignore_patterns: vec![".git".to_string()],
        }
    }
}

/// Filesystem walker
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given root path
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            config: WalkerConfig::default(),
        }
    }

    /// Create a walker with custom configuration
    pub fn with_config(root: PathBuf, config: WalkerConfig) -> Self {
        Self { root, config }
    }

    /// Walk the filesystem and collect all entries below the root.
    ///
    /// Entries that cannot be read are logged and skipped; only an unreadable
    /// root is an error. Returns entries sorted by path.
    pub fn walk(&self) -> Result<Vec<Entry>, StorageError> {
        let mut entries = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.should_ignore(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(StorageError::IoError(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        format!("Failed to walk {}: {}", self.root.display(), e),
                    )));
                }
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            // The root itself is not an entry
            if entry.depth() == 0 {
                continue;
            }

            let path = entry.path().to_path_buf();
            let file_type = entry.file_type();

            if file_type.is_dir() {
                entries.push(Entry::Directory { path });
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping entry without metadata");
                    continue;
                }
            };

            if file_type.is_file() || file_type.is_symlink() {
                entries.push(Entry::File {
                    path,
                    size: metadata.len(),
                    symlink: file_type.is_symlink(),
                });
            }
            // Sockets, fifos and devices never come out of a checkout
        }

        entries.sort_by(|a, b| a.path().cmp(b.path()));

        Ok(entries)
    }

    /// Check if an entry's name is one of the ignore patterns
    fn should_ignore(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        self.config
            .ignore_patterns
            .iter()
            .any(|pattern| name == pattern.as_str())
    }
}
