//! Integration tests for the tree synchronizer

mod test_utils;

mod reconcile;
mod store_integration;
mod tree_scan;
