//! Integration tests for scanning working copies

use super::test_utils::{lfs_pointer, write_file};
use std::fs;
use tempfile::TempDir;
use treesync::tree::aggregate;
use treesync::tree::walker::{Walker, WalkerConfig};
use treesync::tree::LocalTreeBuilder;
use treesync::types::EntryKind;

/// Test that nested folders get recursive counts and empty ones are dropped
#[test]
fn test_recursive_counts_and_empty_folders() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "a/b/c/file.txt", b"content");
    fs::create_dir_all(root.join("a/empty")).unwrap();

    let entries = Walker::new(root.to_path_buf()).walk().unwrap();
    let folders = aggregate::aggregate(root, &entries).unwrap();

    for dir in ["/a", "/a/b", "/a/b/c"] {
        assert_eq!(folders.get(dir).unwrap().recursive_files, 1, "{}", dir);
    }
    assert_eq!(folders.get("/a/empty").unwrap().recursive_files, 0);
    assert_eq!(folders.get("/").unwrap().recursive_files, 1);

    let materialized: Vec<&String> = folders.materialized().map(|(dir, _)| dir).collect();
    assert_eq!(materialized, vec!["/a", "/a/b", "/a/b/c"]);
}

/// Test that scanning the same tree twice gives the same result
#[test]
fn test_scan_is_deterministic() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    for name in ["z.txt", "a.txt", "m/n.txt", "m/a.txt", "b/c/d.bin"] {
        write_file(root, name, name.as_bytes());
    }

    let first = LocalTreeBuilder::new(root.to_path_buf()).build().unwrap();
    let second = LocalTreeBuilder::new(root.to_path_buf()).build().unwrap();
    assert_eq!(first.nodes, second.nodes);
}

/// Test that pointer and plain files are told apart in a mixed tree
#[test]
fn test_mixed_pointer_and_binary_content() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "tex/diffuse.png", lfs_pointer("aa11", 2048).as_bytes());
    let binary: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
    write_file(root, "tex/raw.bin", &binary);
    write_file(
        root,
        "tex/partial.png",
        b"version https://git-lfs.github.com/spec/v1\nsize 77\n",
    );

    let tree = LocalTreeBuilder::new(root.to_path_buf()).build().unwrap();
    let by_name = |name: &str| tree.nodes.iter().find(|n| n.name == name).unwrap().clone();

    let diffuse = by_name("diffuse.png");
    assert_eq!(diffuse.lfs_oid.as_deref(), Some("aa11"));
    assert_eq!(diffuse.size, Some(2048));

    let raw = by_name("raw.bin");
    assert_eq!(raw.lfs_oid, None);
    assert_eq!(raw.size, Some(1000));

    let partial = by_name("partial.png");
    assert_eq!(partial.lfs_oid, None);
    assert_eq!(partial.size, Some(77));

    let tex = by_name("tex");
    assert_eq!(tex.kind, EntryKind::Folder);
    assert_eq!(tex.size, Some(3));
}

/// Test that .git and configured names are pruned but similar names are kept
#[test]
fn test_ignore_matches_whole_names() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, ".git/config", b"[core]");
    write_file(root, ".gitattributes", b"*.psd filter=lfs");
    write_file(root, "build/out.o", b"obj");

    let config = WalkerConfig {
        ignore_patterns: vec![".git".to_string(), "build".to_string()],
        ..WalkerConfig::default()
    };
    let tree = LocalTreeBuilder::new(root.to_path_buf())
        .with_walker_config(config)
        .build()
        .unwrap();

    let names: Vec<&str> = tree.nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec![".gitattributes"]);
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_plain_files() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "real/target.txt", lfs_pointer("bb22", 10).as_bytes());
    std::os::unix::fs::symlink("real/target.txt", root.join("link.txt")).unwrap();

    let tree = LocalTreeBuilder::new(root.to_path_buf()).build().unwrap();
    let link = tree.nodes.iter().find(|n| n.name == "link.txt").unwrap();
    assert_eq!(link.kind, EntryKind::File);
    assert_eq!(link.lfs_oid, None);
    assert_eq!(link.size, Some("real/target.txt".len() as u64));
}
