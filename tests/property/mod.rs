//! Property-based tests for segmentation guarantees

mod segmentation;
