//! Two-pass radix clustering (`spec.md` §4.F–§4.J).
//!
//! Grounded on `parallel_radix_partition`, `serial_radix_partition`, and the
//! commented `parallel_radix_partition_optimized` (SWWC variant) in
//! `examples/original_source/src/cpu/joins/radix-join-orig.cpp`.

pub mod histogram;
pub mod pass2;
pub mod prefix;
pub mod scatter;
pub mod skew;

/// A half-open range `[start, end)` into a scratch buffer, excluding its
/// trailing padding slots (`spec.md` §3 invariants).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A join-ready partition pair: R and S ranges that agree on their radix
/// bits, each into its own buffer. Produced by pass-2 (or directly by pass-1
/// when `NUM_PASSES == 1`), consumed by the per-partition join (§4.K).
#[derive(Clone, Debug)]
pub struct JoinTask {
    pub r: Vec<crate::types::Tuple>,
    pub s: Vec<crate::types::Tuple>,
}

/// A pass-1 output descriptor: one non-empty `(R_b, S_b)` bucket pair,
/// identified by its pass-1 bucket index, ready to be either re-radixed by
/// pass-2 (`spec.md` §4.I) or routed to the skew queue (§4.J).
#[derive(Clone, Debug)]
pub struct PartitionTask {
    pub bucket: usize,
    pub r: Range,
    pub s: Range,
}
