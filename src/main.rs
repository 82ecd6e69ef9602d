// Copyright 2019-2022 Clemens Lutz
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use radix_join::cpu_mapping::CpuAffinity;
use radix_join::datagen::{self, DataDistribution};
use radix_join::error::{Error, ErrorKind, Result};
use radix_join::measurement::data_point::DataPoint;
use radix_join::measurement::harness;
use radix_join::types::RadixJoinConfig;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(
    name = "radix-join",
    about = "A parallel, cache-conscious radix hash join core for an analytical query engine"
)]
struct CmdOpt {
    /// Number of times to repeat the benchmark
    #[structopt(short = "r", long = "repeat", default_value = "1")]
    repeat: u32,

    /// Output filename for the measurement CSV file; omit to print to stdout
    #[structopt(long = "csv", parse(from_os_str))]
    csv: Option<PathBuf>,

    /// Size of the inner (build, primary-key) relation in tuples
    #[structopt(long = "inner-rel-tuples", default_value = "1000000")]
    inner_rel_tuples: usize,

    /// Size of the outer (probe, foreign-key) relation in tuples
    #[structopt(long = "outer-rel-tuples", default_value = "1000000")]
    outer_rel_tuples: usize,

    /// Outer relation's key distribution
    #[structopt(
        long = "data-distribution",
        default_value = "uniform",
        possible_values = &["uniform", "zipf"],
        case_insensitive = true
    )]
    data_distribution: String,

    /// Zipf exponent; required when --data-distribution is "zipf"
    #[structopt(long = "zipf-exponent", required_if("data-distribution", "zipf"))]
    zipf_exponent: Option<f64>,

    /// Fraction of outer-relation keys that fall inside the inner relation's
    /// key range, as a percentage [0, 100]
    #[structopt(long = "selectivity", default_value = "100", validator = is_percent)]
    selectivity: u8,

    /// Bits to partition on: either a total `B` split evenly across passes,
    /// or an explicit per-pass `B1,B2` (mirroring the teacher's own
    /// `--radix-bits` convention)
    #[structopt(long = "radix-bits", default_value = "10", parse(try_from_str = parse_radix_bits))]
    radix_bits: (u32, Option<u32>),

    /// Number of partitioning passes: 1 (single-pass) or 2 (two-pass)
    #[structopt(long = "passes", default_value = "2", possible_values = &["1", "2"])]
    num_passes: u8,

    /// Number of CPU worker threads
    #[structopt(short = "t", long = "threads", default_value = "4")]
    threads: usize,

    /// Path to a CPU affinity map file (one physical CPU id per line)
    #[structopt(long = "cpu-affinity", parse(from_os_str))]
    cpu_affinity: Option<PathBuf>,

    /// Disable software write-combining during the scatter phase
    #[structopt(long = "no-swwc")]
    no_swwc: bool,

    /// Disable the skew splitter for oversized partitions
    #[structopt(long = "no-skew-handling")]
    no_skew_handling: bool,

    /// Seed for the relation generators, for reproducible runs
    #[structopt(long = "seed", default_value = "0")]
    seed: u64,
}

/// Parses `--radix-bits` as either a bare total (`"10"`) or a comma-separated
/// per-pass pair (`"8,8"`), matching the teacher's own `RadixBits` CLI
/// convention.
fn parse_radix_bits(s: &str) -> std::result::Result<(u32, Option<u32>), String> {
    let mut parts = s.splitn(2, ',');
    let d1 = parts
        .next()
        .unwrap()
        .trim()
        .parse::<u32>()
        .map_err(|_| "radix-bits: expected an integer or `B1,B2`".to_string())?;
    match parts.next() {
        Some(rest) => {
            let d2 = rest
                .trim()
                .parse::<u32>()
                .map_err(|_| "radix-bits: expected an integer or `B1,B2`".to_string())?;
            Ok((d1, Some(d2)))
        }
        None => Ok((d1, None)),
    }
}

fn is_percent(x: String) -> std::result::Result<(), String> {
    x.parse::<u32>()
        .map_err(|_| "selectivity must be an integer percentage".to_string())
        .and_then(|v| {
            if v <= 100 {
                Ok(())
            } else {
                Err("selectivity must be between 0 and 100".to_string())
            }
        })
}

fn main() -> Result<()> {
    env_logger::init();
    let cmd = CmdOpt::from_args();

    let config = RadixJoinConfig {
        radix_bits: cmd.radix_bits.0,
        radix_bits_2: cmd.radix_bits.1,
        num_passes: cmd.num_passes,
        nthreads: cmd.threads,
        use_swwc: !cmd.no_swwc,
        use_skew_handling: !cmd.no_skew_handling,
    };

    let cpu_affinity = match &cmd.cpu_affinity {
        Some(path) => CpuAffinity::from_file(path)?,
        None => CpuAffinity::identity(config.nthreads),
    };

    let distribution = match cmd.data_distribution.as_str() {
        "zipf" => {
            let exponent = cmd.zipf_exponent.ok_or_else(|| Error::from(ErrorKind::InvalidArgument("--zipf-exponent is required for --data-distribution zipf".into())))?;
            DataDistribution::Zipf { exponent }
        }
        _ => DataDistribution::Uniform,
    };

    let rel_r = datagen::create_relation_pk(cmd.inner_rel_tuples, cmd.seed);
    let rel_s = datagen::create_relation_fk(cmd.outer_rel_tuples, cmd.inner_rel_tuples, distribution, cmd.selectivity, cmd.seed.wrapping_add(1));

    let mut dp = DataPoint::from_config(&config, cmd.inner_rel_tuples, cmd.outer_rel_tuples)?;
    dp.data_distribution = Some(cmd.data_distribution.clone());
    dp.zipf_exponent = cmd.zipf_exponent;
    dp.selectivity = Some(cmd.selectivity as u32);

    harness::measure("radix_join", cmd.repeat, cmd.csv.clone(), dp, || radix_join::radix_join(&rel_r, &rel_s, &config, &cpu_affinity))?;

    Ok(())
}
