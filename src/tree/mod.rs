//! Local working-copy tree
//!
//! Walks a checked-out repository and describes it the way the index
//! stores it: normalized paths, LFS-aware file classification and folder
//! counters that keep empty directories out.

pub mod aggregate;
pub mod builder;
pub mod path;
pub mod pointer;
pub mod walker;

pub use builder::{LocalTree, LocalTreeBuilder, LocalTreeNode};
