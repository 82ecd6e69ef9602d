//! Pass-2 partitioner (`spec.md` §4.I): serial re-radix of one pass-1
//! bucket's R/S slices into pass-2 sub-partitions, each emitted as a join
//! task.
//!
//! Grounded on `serial_radix_partition` in
//! `examples/original_source/src/cpu/joins/radix-join-orig.cpp`, minus its
//! raw-pointer bookkeeping (`SPEC_FULL.md` §9's "natural representation is a
//! pair of slices" resolution): this is single-threaded per task, so the
//! local scratch buffer is plain, non-aligned `Vec<Tuple>` indexing rather
//! than the concurrent `AlignedTupleBuffer` the cooperative passes need.

use crate::partition::histogram::histogram_and_prefix_sum;
use crate::partition::prefix::compose_offsets;
use crate::partition::JoinTask;
use crate::radix::RadixBits;
use crate::types::Tuple;

fn local_cluster(slice: &[Tuple], bucket_of: impl Fn(i32) -> usize, fanout: usize, padding: usize) -> (Vec<Tuple>, Vec<usize>) {
    let hist = histogram_and_prefix_sum(slice, &bucket_of, fanout);
    let offsets = compose_offsets(&[hist], 0, fanout, padding, slice.len());
    let total_len = offsets[fanout];
    let mut buf = vec![Tuple::default(); total_len];
    let mut cursors = offsets[..fanout].to_vec();
    for t in slice {
        let b = bucket_of(t.key);
        buf[cursors[b]] = *t;
        cursors[b] += 1;
    }
    (buf, offsets)
}

/// Re-radix `r_slice`/`s_slice` (a single pass-1 bucket's output) using
/// pass-2 bit width `radix_bits.d2`, and emit one [`JoinTask`] per non-empty
/// `(R_sub, S_sub)` pair. `small_padding` is `SMALL_PADDING_TUPLES` (§6).
pub fn serial_radix_partition(
    r_slice: &[Tuple],
    s_slice: &[Tuple],
    radix_bits: &RadixBits,
    small_padding: usize,
) -> Vec<JoinTask> {
    let fanout = radix_bits.fanout_pass2();
    if fanout <= 1 {
        // NUM_PASSES == 1 degenerate case is handled by the caller directly
        // emitting the pass-1 pair as the join task (spec.md §4.I); this
        // function is only reached when pass-2 genuinely re-radixes.
        return vec![JoinTask {
            r: r_slice.to_vec(),
            s: s_slice.to_vec(),
        }];
    }

    let (r_buf, r_off) = local_cluster(r_slice, |k| radix_bits.bucket_pass2(k), fanout, small_padding);
    let (s_buf, s_off) = local_cluster(s_slice, |k| radix_bits.bucket_pass2(k), fanout, small_padding);

    let mut tasks = Vec::new();
    for b in 0..fanout {
        let r_count = r_off[b + 1] - small_padding - r_off[b];
        let s_count = s_off[b + 1] - small_padding - s_off[b];
        if r_count > 0 && s_count > 0 {
            tasks.push(JoinTask {
                r: r_buf[r_off[b]..r_off[b] + r_count].to_vec(),
                s: s_buf[s_off[b]..s_off[b] + s_count].to_vec(),
            });
        }
    }
    tasks
}
