//! Scatter engine (`spec.md` §4.H): plain scatter and the optional software
//! write-combining (SWWC) variant.
//!
//! Grounded on the copy loop in `parallel_radix_partition` and the commented
//! `parallel_radix_partition_optimized` / `store_nontemp_64B` in
//! `examples/original_source/src/cpu/joins/radix-join-orig.cpp`. The SWWC
//! variant here reproduces the buffering/flush discipline exactly but emits
//! each full line with ordinary stores rather than `movntdq` non-temporal
//! stores: `spec.md` §9 is explicit that the non-temporal instruction is a
//! performance optimization, not a correctness requirement, and portable
//! Rust has no stable non-temporal-store intrinsic outside `std::arch`
//! platform-specific code.

use crate::alloc::AlignedTupleBuffer;
use crate::types::Tuple;

/// For each tuple in `slice`, compute its bucket and write it to
/// `dst[cursors[bucket]]`, advancing that bucket's cursor by one.
///
/// # Safety
/// `cursors` must be disjoint from every other thread's write range into
/// `dst` for the duration of the call (guaranteed by the global prefix
/// composer, §4.G).
pub unsafe fn scatter_plain(
    slice: &[Tuple],
    bucket_of: impl Fn(i32) -> usize,
    mut cursors: Vec<usize>,
    dst: &AlignedTupleBuffer,
) {
    for t in slice {
        let b = bucket_of(t.key);
        dst.write_at(cursors[b], *t);
        cursors[b] += 1;
    }
}

/// Per-bucket cache-line-sized write-combining buffers.
pub struct SwwcBuffers {
    bufs: Vec<Vec<Tuple>>,
    tuples_per_cache_line: usize,
}

impl SwwcBuffers {
    pub fn new(fanout: usize, tuples_per_cache_line: usize) -> Self {
        SwwcBuffers {
            bufs: (0..fanout)
                .map(|_| Vec::with_capacity(tuples_per_cache_line))
                .collect(),
            tuples_per_cache_line,
        }
    }
}

/// Buffer tuples per bucket and flush whole cache lines as they fill.
/// Leftover partial buffers are *not* written here; the caller must cross a
/// barrier (so every worker's full-line writes are visible) and then call
/// [`flush_partial`] with the cursors this function returns.
///
/// # Safety
/// Same obligation as [`scatter_plain`]: `cursors` must describe this
/// worker's exclusive write range.
pub unsafe fn scatter_swwc(
    slice: &[Tuple],
    bucket_of: impl Fn(i32) -> usize,
    mut cursors: Vec<usize>,
    dst: &AlignedTupleBuffer,
    buffers: &mut SwwcBuffers,
) -> Vec<usize> {
    let tpc = buffers.tuples_per_cache_line;
    for t in slice {
        let b = bucket_of(t.key);
        buffers.bufs[b].push(*t);
        if buffers.bufs[b].len() == tpc {
            for (i, buffered) in buffers.bufs[b].drain(..).enumerate() {
                dst.write_at(cursors[b] + i, buffered);
            }
            cursors[b] += tpc;
        }
    }
    cursors
}

/// Flush whatever partial (less-than-a-cache-line) buffers remain after the
/// main scatter loop, once every worker's full-line writes have crossed a
/// barrier.
///
/// # Safety
/// Same obligation as [`scatter_plain`].
pub unsafe fn flush_partial(buffers: SwwcBuffers, cursors: &[usize], dst: &AlignedTupleBuffer) {
    for (b, buf) in buffers.bufs.into_iter().enumerate() {
        for (i, t) in buf.into_iter().enumerate() {
            dst.write_at(cursors[b] + i, t);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::histogram::histogram_and_prefix_sum;
    use crate::partition::prefix::compose_offsets;

    fn bucket(key: i32) -> usize {
        (key & 0b11) as usize
    }

    #[test]
    fn plain_scatter_preserves_all_tuples_in_correct_buckets() {
        let tuples: Vec<Tuple> = (0..40).map(|i| Tuple::new(i, i)).collect();
        let fanout = 4usize;
        let padding = 4usize;
        let hist = histogram_and_prefix_sum(&tuples, bucket, fanout);
        let cursors = compose_offsets(&[hist], 0, fanout, padding, tuples.len());
        let total_len = cursors[fanout];
        let dst = AlignedTupleBuffer::new(total_len).unwrap();

        unsafe {
            scatter_plain(&tuples, bucket, cursors[..fanout].to_vec(), &dst);
        }

        // every non-padding slot should hold a tuple whose bucket matches its region
        let mut found = vec![false; tuples.len()];
        for b in 0..fanout {
            let start = cursors[b];
            let end = cursors[b + 1] - padding;
            for slot in dst.as_slice()[start..end].iter() {
                assert_eq!(bucket(slot.key), b);
                found[slot.key as usize] = true;
            }
        }
        assert!(found.iter().all(|&f| f));
    }

    #[test]
    fn swwc_scatter_matches_plain_scatter() {
        let tuples: Vec<Tuple> = (0..37).map(|i| Tuple::new(i, i * 2)).collect();
        let fanout = 4usize;
        let padding = 32usize; // multiple of tuples_per_cache_line (8)
        let hist = histogram_and_prefix_sum(&tuples, bucket, fanout);
        let cursors = compose_offsets(&[hist], 0, fanout, padding, tuples.len());
        let total_len = cursors[fanout];

        let dst_plain = AlignedTupleBuffer::new(total_len).unwrap();
        unsafe {
            scatter_plain(&tuples, bucket, cursors[..fanout].to_vec(), &dst_plain);
        }

        let dst_swwc = AlignedTupleBuffer::new(total_len).unwrap();
        let mut buffers = SwwcBuffers::new(fanout, 8);
        unsafe {
            let final_cursors = scatter_swwc(
                &tuples,
                bucket,
                cursors[..fanout].to_vec(),
                &dst_swwc,
                &mut buffers,
            );
            flush_partial(buffers, &final_cursors, &dst_swwc);
        }

        for b in 0..fanout {
            let start = cursors[b];
            let end = cursors[b + 1] - padding;
            let mut plain_keys: Vec<i32> = dst_plain.as_slice()[start..end]
                .iter()
                .map(|t| t.key)
                .collect();
            let mut swwc_keys: Vec<i32> = dst_swwc.as_slice()[start..end]
                .iter()
                .map(|t| t.key)
                .collect();
            plain_keys.sort_unstable();
            swwc_keys.sort_unstable();
            assert_eq!(plain_keys, swwc_keys);
        }
    }
}
