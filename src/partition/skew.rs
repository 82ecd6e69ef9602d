//! Skew splitter (`spec.md` §4.J, optional). Detection and fan-split are
//! pure functions here; the cooperative re-partition pass itself reuses
//! [`super::histogram`], [`super::prefix`], and [`super::scatter`] directly
//! from the orchestrator, since it needs the same N-worker barrier
//! choreography as pass-1.

use crate::partition::JoinTask;
use crate::types::Tuple;

/// `T1(nthreads) = max(fanout_pass1, fanout_pass2) * k`.
pub fn skew_threshold(fanout_pass1: usize, fanout_pass2: usize, k: usize) -> usize {
    fanout_pass1.max(fanout_pass2) * k
}

pub fn is_skewed(size: usize, threshold: usize) -> bool {
    size > threshold
}

/// Cut `s` into `nthreads` near-equal chunks, each paired with a clone of the
/// same (still-oversized) `r`, so the join phase absorbs the skew via
/// parallelism rather than further clustering (`spec.md` §4.J).
pub fn fan_split(r: &[Tuple], s: &[Tuple], nthreads: usize) -> Vec<JoinTask> {
    if nthreads == 0 || s.is_empty() {
        return vec![JoinTask {
            r: r.to_vec(),
            s: s.to_vec(),
        }];
    }
    let chunk = (s.len() + nthreads - 1) / nthreads;
    s.chunks(chunk.max(1))
        .filter(|c| !c.is_empty())
        .map(|c| JoinTask {
            r: r.to_vec(),
            s: c.to_vec(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_scales_with_fanout_and_k() {
        assert_eq!(skew_threshold(32, 8, 4), 128);
        assert_eq!(skew_threshold(8, 32, 2), 64);
    }

    #[test]
    fn fan_split_covers_all_of_s_with_full_r_in_each_task() {
        let r: Vec<Tuple> = (0..10).map(|i| Tuple::new(i, i)).collect();
        let s: Vec<Tuple> = (0..97).map(|i| Tuple::new(i % 10, i)).collect();
        let tasks = fan_split(&r, &s, 4);
        assert!(tasks.len() <= 4);
        let total_s: usize = tasks.iter().map(|t| t.s.len()).sum();
        assert_eq!(total_s, 97);
        for t in &tasks {
            assert_eq!(t.r.len(), 10);
        }
    }
}
