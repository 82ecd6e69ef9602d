//! Per-thread histogrammer (`spec.md` §4.F).

use crate::types::Tuple;

/// Counts tuples per radix bucket over `slice`, then in-place prefix-sums the
/// histogram so `hist[b]` becomes the worker's local end-offset for bucket
/// `b` within its slice (spec.md §4.F).
pub fn histogram_and_prefix_sum(
    slice: &[Tuple],
    bucket_of: impl Fn(i32) -> usize,
    fanout: usize,
) -> Vec<usize> {
    let mut hist = vec![0usize; fanout];
    for t in slice {
        hist[bucket_of(t.key)] += 1;
    }
    let mut running = 0usize;
    for h in hist.iter_mut() {
        running += *h;
        *h = running;
    }
    hist
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_prefix_sums_buckets() {
        let tuples = vec![
            Tuple::new(0, 1),
            Tuple::new(1, 1),
            Tuple::new(1, 1),
            Tuple::new(3, 1),
        ];
        // bucket = key & 0b11
        let hist = histogram_and_prefix_sum(&tuples, |k| (k & 0b11) as usize, 4);
        // raw counts: [1, 2, 0, 1] -> prefix sums: [1, 3, 3, 4]
        assert_eq!(hist, vec![1, 3, 3, 4]);
    }
}
