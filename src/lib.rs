//! treesync: persisted file-tree index of git repositories
//!
//! Keeps one row per file and non-empty folder of a project's working copy,
//! reconciled against the checked-out commit. Git-LFS pointer files are
//! recognized and indexed with their real object size and oid.

pub mod cli;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod git;
pub mod logging;
pub mod store;
pub mod sync;
pub mod tree;
pub mod types;
