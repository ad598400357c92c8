//! Property-based tests for folder aggregation

use proptest::prelude::*;
use std::collections::BTreeSet;
use treesync::tree::aggregate::{aggregate_paths, WalkedPath};
use treesync::tree::path::{ancestors, split_parent, ROOT};

/// Random file paths plus every directory they imply, like a walk would yield
fn walked_tree() -> impl Strategy<Value = Vec<WalkedPath>> {
    prop::collection::btree_set(prop::collection::vec("[a-c]{1,2}", 1..5), 0..20).prop_map(
        |files| {
            let mut dirs = BTreeSet::new();
            let mut paths = BTreeSet::new();
            for segments in files {
                let file = format!("/{}", segments.join("/"));
                let (parent, _) = split_parent(&file);
                for dir in ancestors(&parent) {
                    if dir != ROOT {
                        dirs.insert(dir);
                    }
                }
                paths.insert(file);
            }
            // A path cannot be both a file and a directory
            let files: Vec<String> = paths.into_iter().filter(|p| !dirs.contains(p)).collect();
            dirs.iter()
                .map(|d| WalkedPath {
                    path: d.clone(),
                    is_file: false,
                })
                .chain(files.into_iter().map(|f| WalkedPath {
                    path: f,
                    is_file: true,
                }))
                .collect()
        },
    )
}

proptest! {
    #[test]
    fn root_counts_every_file(paths in walked_tree()) {
        let files = paths.iter().filter(|p| p.is_file).count() as u64;
        let aggregation = aggregate_paths(&paths);
        let root = aggregation.get(ROOT).map(|s| s.recursive_files).unwrap_or(0);
        prop_assert_eq!(root, files);
    }

    #[test]
    fn parents_contain_at_least_their_children(paths in walked_tree()) {
        let aggregation = aggregate_paths(&paths);
        for (dir, stats) in aggregation.iter() {
            if dir == ROOT {
                continue;
            }
            let (parent, _) = split_parent(dir);
            let parent_stats = aggregation.get(&parent).unwrap();
            prop_assert!(parent_stats.recursive_files >= stats.recursive_files);
        }
    }

    #[test]
    fn materialized_folders_are_nonempty(paths in walked_tree()) {
        let aggregation = aggregate_paths(&paths);
        for (dir, stats) in aggregation.materialized() {
            prop_assert!(dir != ROOT);
            prop_assert!(stats.recursive_files > 0);
        }
    }
}
