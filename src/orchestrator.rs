//! Join orchestrator (`spec.md` §4.L): thread spawn, phase barriers,
//! task-queue handoff, result reduction.
//!
//! Grounded on `join_init_run`/`prj_thread` in
//! `examples/original_source/src/cpu/joins/radix-join-orig.cpp`. The
//! original specializes `prj_thread` at compile time over
//! `(NUM_RADIX_BITS, NUM_PASSES)`; this rewrite promotes both to the runtime
//! `RadixJoinConfig`/`RadixBits` value, per the Design Note in `spec.md` §9
//! ("either monomorphize ... or promote to a small runtime parameter pack —
//! the choice is a performance-tuning knob, not a correctness one").

use crate::alloc::AlignedTupleBuffer;
use crate::cpu_mapping::CpuAffinity;
use crate::error::{Error, ErrorKind, Result};
use crate::join::array_join;
use crate::partition::histogram::histogram_and_prefix_sum;
use crate::partition::prefix::compose_offsets;
use crate::partition::scatter::{flush_partial, scatter_plain, scatter_swwc, SwwcBuffers};
use crate::partition::skew::{fan_split, is_skewed, skew_threshold};
use crate::partition::{pass2, JoinTask, PartitionTask, Range};
use crate::queue::TaskQueue;
use crate::radix::{PartitionLayout, RadixBits};
use crate::types::{Relation, RunStats, Tuple};
use log::debug;
use std::sync::{Barrier, Mutex};
use std::time::Instant;

/// Implementation-chosen `k` in `T1(nthreads) = max(fanout1, fanout2) * k`
/// (`spec.md` §4.J). A partition whose R or S side exceeds this many times
/// the larger fan-out is routed to the skew path instead of plain pass-2.
const SKEW_K: usize = 4;

/// Cache-line-aligned input slicing (`spec.md` §4.L step 2): `N` chunks,
/// remainder tuples distributed to low-id workers a cache line at a time,
/// the last worker absorbing the final sub-line remainder.
fn slice_ranges(len: usize, nthreads: usize, tuples_per_cache_line: usize) -> Vec<(usize, usize)> {
    let tpc = tuples_per_cache_line.max(1);
    let whole_lines = len / tpc;
    let sub_line_remainder = len % tpc;
    let lines_per_thread = whole_lines / nthreads;
    let extra_lines = whole_lines % nthreads;

    let mut bounds = vec![0usize; nthreads + 1];
    let mut cursor = 0usize;
    for (t, bound) in bounds.iter_mut().enumerate().skip(1) {
        let lines = lines_per_thread + if t - 1 < extra_lines { 1 } else { 0 };
        let mut count = lines * tpc;
        if t == nthreads {
            count += sub_line_remainder;
        }
        cursor += count;
        *bound = cursor;
    }
    (0..nthreads).map(|t| (bounds[t], bounds[t + 1])).collect()
}

/// Near-equal slicing for the skew path's "N equal slices" requirement
/// (`spec.md` §4.J) — no cache-line alignment needed since this path already
/// trades throughput for correctness on an outlier partition.
fn equal_ranges(len: usize, nthreads: usize) -> Vec<(usize, usize)> {
    let base = len / nthreads;
    let rem = len % nthreads;
    let mut bounds = vec![0usize; nthreads + 1];
    let mut cursor = 0usize;
    for (t, bound) in bounds.iter_mut().enumerate().skip(1) {
        cursor += base + if t - 1 < rem { 1 } else { 0 };
        *bound = cursor;
    }
    (0..nthreads).map(|t| (bounds[t], bounds[t + 1])).collect()
}

/// Worker-shared state for one cooperative histogram+scatter round
/// (`spec.md` §4.F–§4.H), reused for both the always-run pass-1 and the
/// optional skew cooperative re-partition.
struct CooperativeRound<'a> {
    hist_r_rows: &'a [Mutex<Vec<usize>>],
    hist_s_rows: &'a [Mutex<Vec<usize>>],
    barrier: &'a Barrier,
    tmp_r: &'a AlignedTupleBuffer,
    tmp_s: &'a AlignedTupleBuffer,
    use_swwc: bool,
    tuples_per_cache_line: usize,
}

#[allow(clippy::too_many_arguments)]
fn cooperative_partition(
    tid: usize,
    my_r: &[Tuple],
    my_s: &[Tuple],
    bucket_of: impl Fn(i32) -> usize + Copy,
    fanout: usize,
    padding: usize,
    total_r: usize,
    total_s: usize,
    round: &CooperativeRound,
) -> (Vec<usize>, Vec<usize>) {
    let h_r = histogram_and_prefix_sum(my_r, bucket_of, fanout);
    *round.hist_r_rows[tid].lock().unwrap() = h_r;
    let h_s = histogram_and_prefix_sum(my_s, bucket_of, fanout);
    *round.hist_s_rows[tid].lock().unwrap() = h_s;

    round.barrier.wait();

    let hist_r_all: Vec<Vec<usize>> = round.hist_r_rows.iter().map(|m| m.lock().unwrap().clone()).collect();
    let hist_s_all: Vec<Vec<usize>> = round.hist_s_rows.iter().map(|m| m.lock().unwrap().clone()).collect();
    let offsets_r = compose_offsets(&hist_r_all, tid, fanout, padding, total_r);
    let offsets_s = compose_offsets(&hist_s_all, tid, fanout, padding, total_s);

    if round.use_swwc {
        let mut buf_r = SwwcBuffers::new(fanout, round.tuples_per_cache_line);
        let mut buf_s = SwwcBuffers::new(fanout, round.tuples_per_cache_line);
        // Safety: offsets are disjoint per worker by construction (§4.G).
        let final_r = unsafe { scatter_swwc(my_r, bucket_of, offsets_r[..fanout].to_vec(), round.tmp_r, &mut buf_r) };
        let final_s = unsafe { scatter_swwc(my_s, bucket_of, offsets_s[..fanout].to_vec(), round.tmp_s, &mut buf_s) };
        round.barrier.wait();
        unsafe {
            flush_partial(buf_r, &final_r, round.tmp_r);
            flush_partial(buf_s, &final_s, round.tmp_s);
        }
    } else {
        // Safety: same disjointness guarantee as above.
        unsafe {
            scatter_plain(my_r, bucket_of, offsets_r[..fanout].to_vec(), round.tmp_r);
            scatter_plain(my_s, bucket_of, offsets_s[..fanout].to_vec(), round.tmp_s);
        }
    }
    round.barrier.wait();
    (offsets_r, offsets_s)
}

struct SkewRound {
    tmp_r: AlignedTupleBuffer,
    tmp_s: AlignedTupleBuffer,
    hist_r_rows: Vec<Mutex<Vec<usize>>>,
    hist_s_rows: Vec<Mutex<Vec<usize>>>,
    r_base: Range,
    s_base: Range,
}

#[allow(clippy::too_many_arguments)]
fn worker_loop(
    tid: usize,
    nthreads: usize,
    my_r: &[Tuple],
    my_s: &[Tuple],
    config: &crate::types::RadixJoinConfig,
    radix_bits: &RadixBits,
    layout: &PartitionLayout,
    ratio_holes: u32,
    total_r_len: usize,
    total_s_len: usize,
    barrier: &Barrier,
    hist_r1: &[Mutex<Vec<usize>>],
    hist_s1: &[Mutex<Vec<usize>>],
    tmp_r: &AlignedTupleBuffer,
    tmp_s: &AlignedTupleBuffer,
    part_queue: &TaskQueue<PartitionTask>,
    skew_queue: &TaskQueue<PartitionTask>,
    join_queue: &TaskQueue<JoinTask>,
    skew_round_slot: &Mutex<Option<SkewRound>>,
    cpu_affinity: &CpuAffinity,
    partition_start: Instant,
) -> (u64, u64, u64, u64) {
    cpu_affinity.pin_current_thread(tid);

    let round1 = CooperativeRound {
        hist_r_rows: hist_r1,
        hist_s_rows: hist_s1,
        barrier,
        tmp_r,
        tmp_s,
        use_swwc: config.use_swwc,
        tuples_per_cache_line: layout.tuples_per_cache_line,
    };
    let (offsets_r1, offsets_s1) = cooperative_partition(
        tid,
        my_r,
        my_s,
        |k| radix_bits.bucket_pass1(k),
        radix_bits.fanout_pass1(),
        layout.padding_tuples,
        total_r_len,
        total_s_len,
        &round1,
    );

    barrier.wait();

    if tid == 0 {
        let fanout1 = radix_bits.fanout_pass1();
        let fanout2 = radix_bits.fanout_pass2().max(1);
        let threshold = skew_threshold(fanout1, fanout2, SKEW_K);
        for b in 0..fanout1 {
            let r_count = offsets_r1[b + 1] - layout.padding_tuples - offsets_r1[b];
            let s_count = offsets_s1[b + 1] - layout.padding_tuples - offsets_s1[b];
            if r_count == 0 || s_count == 0 {
                continue;
            }
            let r_range = Range {
                start: offsets_r1[b],
                end: offsets_r1[b] + r_count,
            };
            let s_range = Range {
                start: offsets_s1[b],
                end: offsets_s1[b] + s_count,
            };
            let task = PartitionTask { bucket: b, r: r_range, s: s_range };
            if config.use_skew_handling && (is_skewed(r_count, threshold) || is_skewed(s_count, threshold)) {
                debug!("bucket {} routed to skew queue (r={}, s={})", b, r_count, s_count);
                skew_queue.add(task);
            } else {
                part_queue.add(task);
            }
        }
    }

    barrier.wait();

    while let Some(task) = part_queue.get() {
        let r_slice = &tmp_r.as_slice()[task.r.start..task.r.end];
        let s_slice = &tmp_s.as_slice()[task.s.start..task.s.end];
        if config.num_passes == 1 {
            join_queue.add(JoinTask {
                r: r_slice.to_vec(),
                s: s_slice.to_vec(),
            });
        } else {
            for sub in pass2::serial_radix_partition(r_slice, s_slice, radix_bits, layout.small_padding_tuples) {
                join_queue.add(sub);
            }
        }
    }

    barrier.wait();

    if config.use_skew_handling {
        let fanout2 = radix_bits.fanout_pass2().max(1);
        let threshold = skew_threshold(radix_bits.fanout_pass1(), fanout2, SKEW_K);
        loop {
            if tid == 0 {
                let mut slot = skew_round_slot.lock().unwrap();
                *slot = match skew_queue.get() {
                    Some(task) => {
                        let r_full_len = task.r.len();
                        let s_full_len = task.s.len();
                        let rel_padding = layout.small_padding_tuples * fanout2;
                        Some(SkewRound {
                            tmp_r: AlignedTupleBuffer::new(r_full_len + rel_padding).unwrap(),
                            tmp_s: AlignedTupleBuffer::new(s_full_len + rel_padding).unwrap(),
                            hist_r_rows: (0..nthreads).map(|_| Mutex::new(Vec::new())).collect(),
                            hist_s_rows: (0..nthreads).map(|_| Mutex::new(Vec::new())).collect(),
                            r_base: task.r,
                            s_base: task.s,
                        })
                    }
                    None => None,
                };
            }
            barrier.wait();

            let has_task = skew_round_slot.lock().unwrap().is_some();
            if !has_task {
                barrier.wait();
                break;
            }

            {
                let guard = skew_round_slot.lock().unwrap();
                let round = guard.as_ref().unwrap();
                let r_full = &tmp_r.as_slice()[round.r_base.start..round.r_base.end];
                let s_full = &tmp_s.as_slice()[round.s_base.start..round.s_base.end];
                let r_ranges = equal_ranges(r_full.len(), nthreads);
                let s_ranges = equal_ranges(s_full.len(), nthreads);
                let my_r = &r_full[r_ranges[tid].0..r_ranges[tid].1];
                let my_s = &s_full[s_ranges[tid].0..s_ranges[tid].1];

                let round2 = CooperativeRound {
                    hist_r_rows: &round.hist_r_rows,
                    hist_s_rows: &round.hist_s_rows,
                    barrier,
                    tmp_r: &round.tmp_r,
                    tmp_s: &round.tmp_s,
                    use_swwc: config.use_swwc,
                    tuples_per_cache_line: layout.tuples_per_cache_line,
                };
                let (offsets_r2, offsets_s2) = cooperative_partition(
                    tid,
                    my_r,
                    my_s,
                    |k| radix_bits.bucket_pass2(k),
                    fanout2,
                    layout.small_padding_tuples,
                    r_full.len(),
                    s_full.len(),
                    &round2,
                );

                barrier.wait();

                if tid == 0 {
                    for b in 0..fanout2 {
                        let r_count = offsets_r2[b + 1] - layout.small_padding_tuples - offsets_r2[b];
                        let s_count = offsets_s2[b + 1] - layout.small_padding_tuples - offsets_s2[b];
                        if r_count == 0 || s_count == 0 {
                            continue;
                        }
                        let r_sub = round.tmp_r.as_slice()[offsets_r2[b]..offsets_r2[b] + r_count].to_vec();
                        let s_sub = round.tmp_s.as_slice()[offsets_s2[b]..offsets_s2[b] + s_count].to_vec();
                        if is_skewed(s_count, threshold) {
                            for t in fan_split(&r_sub, &s_sub, nthreads) {
                                join_queue.add(t);
                            }
                        } else {
                            join_queue.add(JoinTask { r: r_sub, s: s_sub });
                        }
                    }
                }
            }
            barrier.wait();
        }
    }

    barrier.wait();

    // Partitioning (histogram, scatter, pass-2, skew) is done; everything
    // from here is the build-then-probe join phase (spec.md §6's
    // `partition_usec` vs `join_usec` split, matching `timer3` vs
    // `timer2`/`timer1` in the original C at
    // `examples/original_source/src/cpu/joins/radix-join-orig.cpp:1173`).
    let partition_usec = partition_start.elapsed().as_micros() as u64;
    let join_start = Instant::now();

    let mut matches = 0u64;
    let mut checksum = 0u64;
    while let Some(task) = join_queue.get() {
        let (m, c) = array_join(&task.r, &task.s, total_r_len, ratio_holes, radix_bits.d1 + radix_bits.d2);
        matches += m;
        checksum = checksum.wrapping_add(c);
    }
    let join_usec = join_start.elapsed().as_micros() as u64;

    barrier.wait();
    (matches, checksum, partition_usec, join_usec)
}

/// Run a full parallel radix hash join of `rel_r` (build) against `rel_s`
/// (probe) per `config`, returning the aggregates and timing breakdown of
/// `spec.md` §6's invocation contract.
pub fn radix_join(rel_r: &Relation, rel_s: &Relation, config: &crate::types::RadixJoinConfig, cpu_affinity: &CpuAffinity) -> Result<RunStats> {
    if config.nthreads == 0 {
        return Err(Error::from(ErrorKind::InvalidArgument("nthreads must be positive".into())));
    }
    let total_start = Instant::now();

    let radix_bits = RadixBits::from_config(config.radix_bits, config.radix_bits_2, config.num_passes);
    let layout = PartitionLayout::new(&radix_bits, std::mem::size_of::<Tuple>());

    let tmp_r = AlignedTupleBuffer::new(rel_r.len() + layout.relation_padding_tuples)?;
    let tmp_s = AlignedTupleBuffer::new(rel_s.len() + layout.relation_padding_tuples)?;

    let barrier = Barrier::new(config.nthreads);
    let hist_r1: Vec<Mutex<Vec<usize>>> = (0..config.nthreads).map(|_| Mutex::new(Vec::new())).collect();
    let hist_s1: Vec<Mutex<Vec<usize>>> = (0..config.nthreads).map(|_| Mutex::new(Vec::new())).collect();
    let part_queue = TaskQueue::new();
    let skew_queue = TaskQueue::new();
    let join_queue = TaskQueue::new();
    let skew_round_slot: Mutex<Option<SkewRound>> = Mutex::new(None);

    let r_ranges = slice_ranges(rel_r.len(), config.nthreads, layout.tuples_per_cache_line);
    let s_ranges = slice_ranges(rel_s.len(), config.nthreads, layout.tuples_per_cache_line);

    let partition_start = Instant::now();

    let results: Vec<(u64, u64, u64, u64)> = crossbeam_utils::thread::scope(|scope| {
        let mut handles = Vec::with_capacity(config.nthreads);
        for tid in 0..config.nthreads {
            let (r_start, r_end) = r_ranges[tid];
            let (s_start, s_end) = s_ranges[tid];
            let my_r = &rel_r.as_slice()[r_start..r_end];
            let my_s = &rel_s.as_slice()[s_start..s_end];
            let barrier = &barrier;
            let hist_r1 = &hist_r1;
            let hist_s1 = &hist_s1;
            let tmp_r = &tmp_r;
            let tmp_s = &tmp_s;
            let part_queue = &part_queue;
            let skew_queue = &skew_queue;
            let join_queue = &join_queue;
            let skew_round_slot = &skew_round_slot;
            let radix_bits = &radix_bits;
            let layout = &layout;
            let rel_r_len = rel_r.len();
            let rel_s_len = rel_s.len();
            let ratio_holes = rel_r.ratio_holes();
            handles.push(scope.spawn(move |_| {
                worker_loop(
                    tid,
                    config.nthreads,
                    my_r,
                    my_s,
                    config,
                    radix_bits,
                    layout,
                    ratio_holes,
                    rel_r_len,
                    rel_s_len,
                    barrier,
                    hist_r1,
                    hist_s1,
                    tmp_r,
                    tmp_s,
                    part_queue,
                    skew_queue,
                    join_queue,
                    skew_round_slot,
                    cpu_affinity,
                    partition_start,
                )
            }));
        }
        handles.into_iter().map(|h| h.join().expect("worker panicked")).collect()
    })
    .expect("worker thread panicked");

    // Workers cross the same barriers, so their individual partition/join
    // windows line up; take the slowest worker's elapsed time for each, the
    // way a wall-clock phase duration should be reported.
    let (matches, checksum, partition_usec, join_usec) = results.into_iter().fold(
        (0u64, 0u64, 0u64, 0u64),
        |(am, ac, ap, aj), (m, c, p, j)| (am + m, ac.wrapping_add(c), ap.max(p), aj.max(j)),
    );

    Ok(RunStats {
        matches,
        checksum,
        total_usec: total_start.elapsed().as_micros() as u64,
        partition_usec,
        join_usec,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_ranges_cover_input_without_gaps_or_overlap() {
        let ranges = slice_ranges(100, 3, 8);
        assert_eq!(ranges[0].0, 0);
        for w in ranges.windows(2) {
            assert_eq!(w[0].1, w[1].0);
        }
        assert_eq!(ranges.last().unwrap().1, 100);
    }

    #[test]
    fn equal_ranges_cover_input_without_gaps_or_overlap() {
        let ranges = equal_ranges(97, 4);
        assert_eq!(ranges[0].0, 0);
        for w in ranges.windows(2) {
            assert_eq!(w[0].1, w[1].0);
        }
        assert_eq!(ranges.last().unwrap().1, 97);
    }
}
