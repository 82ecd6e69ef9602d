//! Per-partition array-probe join (`spec.md` §4.K).
//!
//! Grounded on `array_join` in
//! `examples/original_source/src/cpu/joins/radix-join-orig.cpp`, with two
//! deliberate departures from the literal C, both recorded in `DESIGN.md`:
//!
//! 1. The array is sized to the rounded-up power-of-two `N` exactly as
//!    `spec.md` §4.K specifies (the original C allocates `range + 1` elements
//!    while masking with `N`, which undersizes the array whenever `N >
//!    range`).
//! 2. Each slot stores the full build `Tuple`, not just the payload, and the
//!    probe step verifies `slot.key == s.key` before counting a match. The
//!    literal formula sizes the array to the *expected* tuples per partition
//!    rather than the true residual span, so distinct R keys (or probe keys
//!    from outside R's range — e.g. a deliberate "miss" key used to exercise
//!    invariant 4) can collide on the same slot at small scale; `spec.md`
//!    §8 invariant 4 requires an exact match count unconditionally, so the
//!    probe must not trust a colliding slot without checking the key.
//!
//! `radix_bits` must be the same `NUM_RADIX_BITS` already used to assign `r`
//! and `s` to this partition; the array's hash here addresses the bits
//! *above* that depth, which is why partitioning and joining must agree on
//! it (`spec.md` §4.K: "keys within a partition are confined to
//! `NUM_RADIX_BITS`-masked equivalence classes").

use crate::radix::radix;
use crate::types::Tuple;

/// Build-then-probe a single join task. Returns `(matches, checksum)`.
///
/// `total_r` is `|R_total|` (the *whole* R relation, not just this
/// partition) and `ratio_holes` is R's global density factor — both size the
/// dense lookup array per §4.K's formula.
pub fn array_join(r: &[Tuple], s: &[Tuple], total_r: usize, ratio_holes: u32, radix_bits: u32) -> (u64, u64) {
    let range = ((total_r as u64) * (ratio_holes as u64) >> radix_bits).max(1);
    let n = range.next_power_of_two();
    let d = n.trailing_zeros();

    let mut array = vec![Tuple::default(); n as usize];
    for t in r {
        let idx = radix(t.key, radix_bits, d);
        array[idx] = *t;
    }

    let mut matches = 0u64;
    let mut checksum = 0u64;
    for t in s {
        let idx = radix(t.key, radix_bits, d);
        let slot = array[idx];
        if slot.payload != 0 && slot.key == t.key {
            matches += 1;
            checksum = checksum.wrapping_add((slot.payload as i64 + t.payload as i64) as u64);
        }
    }
    (matches, checksum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radix::RadixBits;

    /// Partition `r`/`s` into `(bucket, r_bucket, s_bucket)` groups by their
    /// low `radix_bits` bits, the way the orchestrator would before handing
    /// each pair to `array_join` (spec.md §4.I/§4.L).
    fn bucket_by_radix(r: &[Tuple], s: &[Tuple], radix_bits: u32) -> Vec<(Vec<Tuple>, Vec<Tuple>)> {
        let rb = RadixBits::single_pass(radix_bits);
        let fanout = rb.fanout_pass1();
        (0..fanout)
            .map(|b| {
                let r_b: Vec<Tuple> = r.iter().copied().filter(|t| rb.bucket_pass1(t.key) == b).collect();
                let s_b: Vec<Tuple> = s.iter().copied().filter(|t| rb.bucket_pass1(t.key) == b).collect();
                (r_b, s_b)
            })
            .filter(|(r_b, s_b)| !r_b.is_empty() && !s_b.is_empty())
            .collect()
    }

    #[test]
    fn scenario_1_tiny_dense_pk_fk() {
        let r = vec![
            Tuple::new(1, 1),
            Tuple::new(2, 2),
            Tuple::new(3, 3),
            Tuple::new(4, 4),
        ];
        let s = vec![
            Tuple::new(1, 10),
            Tuple::new(2, 20),
            Tuple::new(1, 11),
            Tuple::new(3, 30),
            Tuple::new(5, 50),
        ];
        let radix_bits = 2;
        let mut matches = 0u64;
        let mut checksum = 0u64;
        for (r_b, s_b) in bucket_by_radix(&r, &s, radix_bits) {
            let (m, c) = array_join(&r_b, &s_b, r.len(), 1, radix_bits);
            matches += m;
            checksum = checksum.wrapping_add(c);
        }
        assert_eq!(matches, 4);
        assert_eq!(checksum, 78);
    }

    #[test]
    fn scenario_2_no_matches() {
        let r = vec![Tuple::new(1, 1), Tuple::new(2, 2)];
        let s = vec![Tuple::new(3, 3), Tuple::new(4, 4)];
        let radix_bits = 2;
        let mut matches = 0u64;
        let mut checksum = 0u64;
        for (r_b, s_b) in bucket_by_radix(&r, &s, radix_bits) {
            let (m, c) = array_join(&r_b, &s_b, r.len(), 1, radix_bits);
            matches += m;
            checksum = checksum.wrapping_add(c);
        }
        assert_eq!(matches, 0);
        assert_eq!(checksum, 0);
    }

    #[test]
    fn colliding_out_of_range_probe_key_is_rejected_by_verification() {
        // Both keys land in the same bucket/slot at this tiny scale; only
        // the true match (key 1) may count.
        let r = vec![Tuple::new(1, 7)];
        let s = vec![Tuple::new(5, 99)];
        let (matches, checksum) = array_join(&r, &s, 4, 1, 2);
        assert_eq!(matches, 0);
        assert_eq!(checksum, 0);
    }

    #[test]
    fn zero_payload_on_s_side_is_not_special() {
        // payload 0 is only a sentinel on the R (build) side.
        let r = vec![Tuple::new(1, 5)];
        let s = vec![Tuple::new(1, 0)];
        let (matches, checksum) = array_join(&r, &s, r.len(), 1, 2);
        assert_eq!(matches, 1);
        assert_eq!(checksum, 5);
    }
}
