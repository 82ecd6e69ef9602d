//! A parallel, cache-conscious radix hash join core, grounded on the
//! two-pass partitioned hash join described in
//! `examples/original_source/src/cpu/joins/radix-join-orig.cpp` and built in
//! the style of `reference/radix-join`/`reference/sql-ops` from the
//! `hvdrk-Triton` teacher repo.
//!
//! The entry point is [`radix_join`]; everything else is exposed so that
//! benchmarks and tests can exercise individual pipeline stages directly.

pub mod alloc;
pub mod cpu_mapping;
pub mod datagen;
pub mod error;
pub mod join;
pub mod measurement;
pub mod orchestrator;
pub mod partition;
pub mod queue;
pub mod radix;
pub mod types;

pub use cpu_mapping::CpuAffinity;
pub use error::{Error, ErrorKind, Result};
pub use types::{RadixJoinConfig, Relation, RunStats, Tuple};

/// Run one parallel radix hash join of `rel_r` (build) against `rel_s`
/// (probe), per `config`. See `SPEC_FULL.md` §6 for the full invocation
/// contract.
pub fn radix_join(rel_r: &Relation, rel_s: &Relation, config: &RadixJoinConfig, cpu_affinity: &CpuAffinity) -> Result<RunStats> {
    orchestrator::radix_join(rel_r, rel_s, config, cpu_affinity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use datagen::{create_relation_fk, create_relation_pk, DataDistribution};

    #[test]
    fn scenario_3_all_matching_two_pass_four_threads() {
        let r = create_relation_pk(1000, 1);
        let s = Relation::new(r.as_slice().to_vec(), 1);
        let config = RadixJoinConfig {
            radix_bits: 8,
            radix_bits_2: None,
            num_passes: 2,
            nthreads: 4,
            use_swwc: false,
            use_skew_handling: true,
        };
        let affinity = CpuAffinity::identity(config.nthreads);
        let stats = radix_join(&r, &s, &config, &affinity).unwrap();
        assert_eq!(stats.matches, 1000);
        let expected_checksum: u64 = (1..=1000u64).map(|k| 2 * k).sum();
        assert_eq!(stats.checksum, expected_checksum);
    }

    #[test]
    fn scenario_5_thread_count_does_not_change_match_count() {
        let r = create_relation_pk(500, 2);
        let s = create_relation_fk(2000, 500, DataDistribution::Uniform, 70, 3);

        let run_with = |nthreads: usize| {
            let config = RadixJoinConfig {
                radix_bits: 6,
                radix_bits_2: None,
                num_passes: 2,
                nthreads,
                use_swwc: false,
                use_skew_handling: true,
            };
            let affinity = CpuAffinity::identity(nthreads);
            radix_join(&r, &s, &config, &affinity).unwrap()
        };

        let one = run_with(1);
        let eight = run_with(8);
        assert_eq!(one.matches, eight.matches);
        assert_eq!(one.checksum, eight.checksum);
    }

    #[test]
    fn scenario_6_pass_count_does_not_change_match_count() {
        let r = create_relation_pk(800, 4);
        let s = create_relation_fk(1600, 800, DataDistribution::Uniform, 60, 5);

        let single_pass = RadixJoinConfig {
            radix_bits: 10,
            radix_bits_2: None,
            num_passes: 1,
            nthreads: 4,
            use_swwc: false,
            use_skew_handling: true,
        };
        let two_pass = RadixJoinConfig {
            radix_bits: 10,
            radix_bits_2: None,
            num_passes: 2,
            nthreads: 4,
            use_swwc: false,
            use_skew_handling: true,
        };
        let affinity = CpuAffinity::identity(4);
        let single = radix_join(&r, &s, &single_pass, &affinity).unwrap();
        let two = radix_join(&r, &s, &two_pass, &affinity).unwrap();
        assert_eq!(single.matches, two.matches);
        assert_eq!(single.checksum, two.checksum);
    }

    #[test]
    fn scenario_6b_explicit_uneven_radix_split_does_not_change_match_count() {
        let r = create_relation_pk(800, 4);
        let s = create_relation_fk(1600, 800, DataDistribution::Uniform, 60, 5);

        let even_split = RadixJoinConfig {
            radix_bits: 8,
            radix_bits_2: None,
            num_passes: 2,
            nthreads: 4,
            use_swwc: false,
            use_skew_handling: true,
        };
        let uneven_split = RadixJoinConfig {
            radix_bits: 5,
            radix_bits_2: Some(3),
            num_passes: 2,
            nthreads: 4,
            use_swwc: false,
            use_skew_handling: true,
        };
        let affinity = CpuAffinity::identity(4);
        let even = radix_join(&r, &s, &even_split, &affinity).unwrap();
        let uneven = radix_join(&r, &s, &uneven_split, &affinity).unwrap();
        assert_eq!(even.matches, uneven.matches);
        assert_eq!(even.checksum, uneven.checksum);
    }

    #[test]
    fn scenario_7_idempotent_reruns_on_the_same_input() {
        let r = create_relation_pk(300, 9);
        let s = create_relation_fk(900, 300, DataDistribution::Uniform, 80, 10);
        let config = RadixJoinConfig {
            radix_bits: 6,
            radix_bits_2: None,
            num_passes: 2,
            nthreads: 4,
            use_swwc: true,
            use_skew_handling: true,
        };
        let affinity = CpuAffinity::identity(4);
        let first = radix_join(&r, &s, &config, &affinity).unwrap();
        let second = radix_join(&r, &s, &config, &affinity).unwrap();
        assert_eq!(first.matches, second.matches);
        assert_eq!(first.checksum, second.checksum);
    }

    #[test]
    fn scenario_4_skewed_foreign_key_is_handled_exactly() {
        let r = create_relation_pk(2000, 11);
        let s = datagen::create_relation_fk_skewed(100_000, 2000, 1, 0.99, 12);
        let config = RadixJoinConfig {
            radix_bits: 8,
            radix_bits_2: None,
            num_passes: 2,
            nthreads: 4,
            use_swwc: false,
            use_skew_handling: true,
        };
        let affinity = CpuAffinity::identity(4);
        let stats = radix_join(&r, &s, &config, &affinity).unwrap();

        // Every S tuple has a key in [1, r_len], so every probe hits exactly
        // one R tuple: matches must equal |S| exactly, skew notwithstanding.
        assert_eq!(stats.matches, 100_000);
    }
}
