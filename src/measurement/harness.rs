//! Repeat-and-record harness, grounded on the `harness::measure` call site in
//! `reference/radix-join/src/main.rs` (`harness::measure("radix_join",
//! cmd.repeat, cmd.csv, dp, hjc)`).
//!
//! Runs a closure `repeat` times, stamps each outcome onto the `DataPoint`
//! template, and writes the rows either to a CSV file or to stdout.

use crate::error::Result;
use crate::measurement::data_point::DataPoint;
use crate::types::RunStats;
use log::info;
use std::path::PathBuf;

/// Run `f` `repeat` times, writing one CSV row per run.
///
/// `f` performs one full join invocation and returns its [`RunStats`]. Errors
/// from `f` abort the whole measurement; a one-shot batch computation has no
/// meaningful notion of a partially failed run.
pub fn measure<F>(name: &str, repeat: u32, csv_path: Option<PathBuf>, template: DataPoint, mut f: F) -> Result<Vec<DataPoint>>
where
    F: FnMut() -> Result<RunStats>,
{
    let mut rows = Vec::with_capacity(repeat as usize);
    for run in 0..repeat {
        info!("{}: run {}/{}", name, run + 1, repeat);
        let stats = f()?;
        rows.push(template.with_stats(run, stats));
    }

    match csv_path {
        Some(path) => {
            let mut writer = csv::Writer::from_path(&path)?;
            for row in &rows {
                writer.serialize(row)?;
            }
            writer.flush().map_err(|e| crate::error::Error::from(crate::error::ErrorKind::InvalidArgument(e.to_string())))?;
        }
        None => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            for row in &rows {
                writer.serialize(row)?;
            }
            writer.flush().map_err(|e| crate::error::Error::from(crate::error::ErrorKind::InvalidArgument(e.to_string())))?;
        }
    }

    Ok(rows)
}
