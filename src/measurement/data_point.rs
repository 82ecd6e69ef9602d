//! One measured run, serialized as a CSV row.
//!
//! Grounded on `DataPoint` in
//! `reference/microbench/src/tlb_latency/data_point.rs`: a flat,
//! `serde`-derived struct built up field by field from the run's
//! configuration, then completed with the measured outcome.

use crate::types::{RadixJoinConfig, RunStats};
use serde::Serialize;

#[derive(Clone, Debug, Default, Serialize)]
pub struct DataPoint {
    pub hostname: String,
    pub inner_rel_tuples: usize,
    pub outer_rel_tuples: usize,
    pub radix_bits: u32,
    pub radix_bits_2: Option<u32>,
    pub num_passes: u8,
    pub threads: usize,
    pub use_swwc: bool,
    pub use_skew_handling: bool,
    pub data_distribution: Option<String>,
    pub zipf_exponent: Option<f64>,
    pub selectivity: Option<u32>,
    pub run: u32,
    pub matches: Option<u64>,
    pub checksum: Option<u64>,
    pub total_usec: Option<u64>,
    pub partition_usec: Option<u64>,
    pub join_usec: Option<u64>,
}

impl DataPoint {
    /// Start a data point template from the run's fixed configuration; the
    /// measured fields are filled in per iteration by [`Self::with_stats`].
    pub fn from_config(config: &RadixJoinConfig, inner_rel_tuples: usize, outer_rel_tuples: usize) -> crate::error::Result<Self> {
        let hostname = hostname::get()
            .map_err(|e| crate::error::Error::from(crate::error::ErrorKind::InvalidArgument(e.to_string())))?
            .into_string()
            .map_err(|_| crate::error::Error::from(crate::error::ErrorKind::InvalidArgument("hostname is not valid UTF-8".into())))?;

        Ok(DataPoint {
            hostname,
            inner_rel_tuples,
            outer_rel_tuples,
            radix_bits: config.radix_bits,
            radix_bits_2: config.radix_bits_2,
            num_passes: config.num_passes,
            threads: config.nthreads,
            use_swwc: config.use_swwc,
            use_skew_handling: config.use_skew_handling,
            ..DataPoint::default()
        })
    }

    pub fn with_stats(&self, run: u32, stats: RunStats) -> Self {
        DataPoint {
            run,
            matches: Some(stats.matches),
            checksum: Some(stats.checksum),
            total_usec: Some(stats.total_usec),
            partition_usec: Some(stats.partition_usec),
            join_usec: Some(stats.join_usec),
            ..self.clone()
        }
    }
}
