//! Measurement plumbing: per-run data points and the repeat-and-record
//! harness, grounded on the `radix_join::measurement::{data_point, harness}`
//! modules referenced from `reference/radix-join/src/main.rs`.

pub mod data_point;
pub mod harness;
