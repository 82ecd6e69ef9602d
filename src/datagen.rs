//! Relation generators: `create_relation_pk` / `create_relation_fk`
//! (`spec.md` §6 external collaborators).
//!
//! Grounded on the call sites in `reference/radix-join/src/main.rs`
//! (`datagen::relation::UniformRelation`/`ZipfRelation`) and on
//! `original_source/src/cpu/joins/radix-join-orig.cpp`'s `create_relation_pk`/
//! `create_relation_fk`, which this rewrite re-implements directly rather
//! than depending on the (unavailable in this pack) `datagen` crate.

use crate::types::{Relation, Tuple};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Zipf};

/// Key distribution for the foreign-key (probe) side.
#[derive(Clone, Copy, Debug)]
pub enum DataDistribution {
    Uniform,
    Zipf { exponent: f64 },
}

/// Fills R with a random permutation of `[1..=n]` as keys and matching
/// non-zero payloads (`payload = key`), satisfying the dense-keys /
/// non-zero-payloads requirement from `spec.md` §6.
pub fn create_relation_pk(n: usize, seed: u64) -> Relation {
    let mut keys: Vec<i32> = (1..=n as i32).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    keys.shuffle(&mut rng);
    let tuples = keys.into_iter().map(|k| Tuple::new(k, k)).collect();
    Relation::new(tuples, 1)
}

/// Fills S with `n` tuples whose keys are drawn from `[1..=r_len]` under
/// `distribution`, with non-zero random payloads. `selectivity` (0..=100)
/// controls what fraction of keys fall inside `[1..=r_len]` versus a disjoint
/// "miss" range `[r_len+1 ..= 2*r_len]`, mirroring the teacher's
/// `--selectivity` CLI flag.
pub fn create_relation_fk(
    n: usize,
    r_len: usize,
    distribution: DataDistribution,
    selectivity: u8,
    seed: u64,
) -> Relation {
    let mut rng = StdRng::seed_from_u64(seed);
    let selectivity = selectivity.min(100) as f64 / 100.0;
    let r_len = r_len.max(1) as u64;

    let mut sample_hit = || -> i32 {
        match distribution {
            DataDistribution::Uniform => rng.gen_range(1..=r_len) as i32,
            DataDistribution::Zipf { exponent } => {
                let zipf = Zipf::new(r_len, exponent).expect("valid zipf parameters");
                zipf.sample(&mut rng) as i32
            }
        }
    };

    let tuples = (0..n)
        .map(|_| {
            let key = if rng.gen_bool(selectivity) {
                sample_hit()
            } else {
                r_len as i32 + rng.gen_range(1..=r_len) as i32
            };
            let payload = rng.gen_range(1..=i32::MAX);
            Tuple::new(key, payload)
        })
        .collect();
    Relation::new(tuples, 1)
}

/// A skewed S generator used by the skew-handling testable property
/// (`spec.md` §8 scenario 4): `hot_fraction` of tuples carry `hot_key`, the
/// rest are uniform over `[1..=r_len]`.
pub fn create_relation_fk_skewed(
    n: usize,
    r_len: usize,
    hot_key: i32,
    hot_fraction: f64,
    seed: u64,
) -> Relation {
    let mut rng = StdRng::seed_from_u64(seed);
    let r_len = r_len.max(1) as u64;
    let tuples = (0..n)
        .map(|_| {
            let key = if rng.gen_bool(hot_fraction) {
                hot_key
            } else {
                rng.gen_range(1..=r_len) as i32
            };
            let payload = rng.gen_range(1..=i32::MAX);
            Tuple::new(key, payload)
        })
        .collect();
    Relation::new(tuples, 1)
}
