//! Core data model: tuples, relations, and the per-run configuration.
//!
//! Grounded on `spec.md` §3 and the `tuple_t`/`relation_t` layout in
//! `examples/original_source/src/cpu/joins/radix-join-orig.cpp`.

/// A fixed-width `(key, payload)` pair. Keys are unique on the R (build) side
/// and may repeat on the S (probe) side. Payload `0` is reserved as the
/// "absent" sentinel consumed by the per-partition join (§4.K).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Tuple {
    pub key: i32,
    pub payload: i32,
}

impl Tuple {
    pub fn new(key: i32, payload: i32) -> Self {
        Tuple { key, payload }
    }
}

/// A contiguous relation plus its density metadata.
///
/// `ratio_holes` is the expected ratio of key range to tuple count; it is
/// only meaningful for the R (build) side, which sizes the per-partition
/// probe array from it (§4.K, and the Open Question resolution in
/// `SPEC_FULL.md` §9: S carries the field for symmetry but never reads it).
#[derive(Clone, Debug)]
pub struct Relation {
    tuples: Vec<Tuple>,
    ratio_holes: u32,
}

impl Relation {
    pub fn new(tuples: Vec<Tuple>, ratio_holes: u32) -> Self {
        Relation {
            tuples,
            ratio_holes,
        }
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    pub fn ratio_holes(&self) -> u32 {
        self.ratio_holes
    }

    pub fn as_slice(&self) -> &[Tuple] {
        &self.tuples
    }

    pub fn into_vec(self) -> Vec<Tuple> {
        self.tuples
    }
}

/// Per-run configuration, threaded explicitly through the pipeline rather
/// than kept as process-global state (Open Question, `spec.md` §9).
#[derive(Clone, Debug)]
pub struct RadixJoinConfig {
    /// Total number of low-order key bits consumed across all passes when
    /// `radix_bits_2` is `None` (split evenly between passes); the pass-1
    /// bit width directly when `radix_bits_2` is `Some` (`--radix-bits
    /// B1,B2` on the CLI, `SPEC_FULL.md` §6).
    pub radix_bits: u32,
    /// Explicit pass-2 bit width, overriding the even `radix_bits` split.
    pub radix_bits_2: Option<u32>,
    /// 1 (single-pass) or 2 (two-pass radix clustering).
    pub num_passes: u8,
    /// Number of CPU-pinned worker threads.
    pub nthreads: usize,
    /// Use the software write-combining scatter variant (§4.H).
    pub use_swwc: bool,
    /// Enable the skew splitter (§4.J).
    pub use_skew_handling: bool,
}

impl Default for RadixJoinConfig {
    fn default() -> Self {
        RadixJoinConfig {
            radix_bits: 10,
            radix_bits_2: None,
            num_passes: 2,
            nthreads: 4,
            use_swwc: false,
            use_skew_handling: true,
        }
    }
}

/// The result of one run: match/checksum aggregates plus timing breakdowns,
/// per the invocation contract in `spec.md` §6.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub matches: u64,
    pub checksum: u64,
    pub total_usec: u64,
    pub partition_usec: u64,
    pub join_usec: u64,
}
