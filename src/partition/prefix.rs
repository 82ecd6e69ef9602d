//! Global prefix composer (`spec.md` §4.G), ported from the offset
//! composition loop in `parallel_radix_partition` in
//! `examples/original_source/src/cpu/joins/radix-join-orig.cpp`.

/// Given every worker's locally prefix-summed histogram (`hist_total[i][b]`
/// is worker `i`'s cumulative tuple count through bucket `b`, produced by
/// [`super::histogram::histogram_and_prefix_sum`]), compute worker `my_tid`'s
/// write-cursor for every bucket plus the total output length at index
/// `fanout`.
///
/// Buckets are concatenated in worker-id order and separated by `padding`
/// untouched slots, so no two workers ever write the same destination index.
pub fn compose_offsets(
    hist_total: &[Vec<usize>],
    my_tid: usize,
    fanout: usize,
    padding: usize,
    total_tuples: usize,
) -> Vec<usize> {
    let nthreads = hist_total.len();
    let mut output = vec![0usize; fanout + 1];

    for hist_i in hist_total.iter().take(my_tid) {
        for j in 0..fanout {
            output[j] += hist_i[j];
        }
    }
    for hist_i in hist_total.iter().take(nthreads).skip(my_tid) {
        for j in 1..fanout {
            output[j] += hist_i[j - 1];
        }
    }
    for (i, out) in output.iter_mut().take(fanout).enumerate() {
        *out += i * padding;
    }
    output[fanout] = total_tuples + fanout * padding;
    output
}
