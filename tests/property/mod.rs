//! Property-based tests for path normalization and folder aggregation

mod aggregation;
mod normalize;
