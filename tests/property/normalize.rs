//! Property-based tests for directory path normalization

use proptest::prelude::*;
use treesync::tree::path::{join_stored, normalize_dir_path, split_parent};

fn segment() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9_.-]{1,8}",
        Just(".".to_string()),
        Just(String::new()),
        Just("e\u{301}".to_string()),
        Just("\u{e9}".to_string()),
    ]
}

fn raw_path() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(segment(), 0..6),
        prop::sample::select(vec!["/", "\\"]),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(segments, sep, leading, trailing)| {
            let mut path = segments.join(sep);
            if leading {
                path.insert(0, '/');
            }
            if trailing {
                path.push('/');
            }
            path
        })
}

proptest! {
    #[test]
    fn normalize_is_idempotent(path in raw_path()) {
        let once = normalize_dir_path(&path);
        prop_assert_eq!(normalize_dir_path(&once), once);
    }

    #[test]
    fn normalized_paths_are_rooted(path in raw_path()) {
        let normalized = normalize_dir_path(&path);
        prop_assert!(normalized.starts_with('/'));
        prop_assert!(normalized == "/" || !normalized.ends_with('/'));
        prop_assert!(!normalized.contains("//"));
    }

    #[test]
    fn split_then_join_restores_path(path in raw_path()) {
        let normalized = normalize_dir_path(&path);
        prop_assume!(normalized != "/");
        let (parent, name) = split_parent(&normalized);
        prop_assert_eq!(join_stored(&parent, &name), normalized);
    }
}

#[test]
fn test_empty_and_dot_are_root() {
    assert_eq!(normalize_dir_path(""), "/");
    assert_eq!(normalize_dir_path("."), "/");
    assert_eq!(normalize_dir_path(""), normalize_dir_path("."));
}

#[test]
fn test_decomposed_and_composed_forms_agree() {
    assert_eq!(normalize_dir_path("caf\u{65}\u{301}"), normalize_dir_path("caf\u{e9}"));
}
