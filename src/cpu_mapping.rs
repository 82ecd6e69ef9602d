//! "Logical thread id -> CPU id" mapping (`spec.md` §6 external collaborator
//! `get_cpu_id`). Pinning itself is a performance hint, not a correctness
//! requirement (`SPEC_FULL.md` §4 M4): a failure to pin is logged and
//! otherwise ignored.

use log::warn;
use std::fs;
use std::path::Path;

/// A deterministic `logical_id -> physical_id` mapping, read once at startup.
#[derive(Clone, Debug)]
pub struct CpuAffinity {
    mapping: Vec<usize>,
}

impl CpuAffinity {
    /// Identity mapping over `0..nthreads`.
    pub fn identity(nthreads: usize) -> Self {
        CpuAffinity {
            mapping: (0..nthreads).collect(),
        }
    }

    /// Parse one physical CPU id per line, matching the teacher's
    /// `--cpu-affinity <file>` flag.
    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let contents = fs::read_to_string(path).map_err(crate::error::Error::from)?;
        let mapping = contents
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .filter_map(|l| l.parse::<usize>().ok())
            .collect();
        Ok(CpuAffinity { mapping })
    }

    pub fn get_cpu_id(&self, logical_id: usize) -> usize {
        if self.mapping.is_empty() {
            return logical_id;
        }
        self.mapping[logical_id % self.mapping.len()]
    }

    /// Pin the calling thread to the CPU id mapped from `logical_id`. Best
    /// effort: a failure is logged at `warn!` and otherwise swallowed.
    pub fn pin_current_thread(&self, logical_id: usize) {
        let physical_id = self.get_cpu_id(logical_id);
        match core_affinity::get_core_ids() {
            Some(ids) => {
                if let Some(core) = ids.into_iter().find(|c| c.id == physical_id) {
                    if !core_affinity::set_for_current(core) {
                        warn!("failed to pin worker {} to CPU {}", logical_id, physical_id);
                    }
                } else {
                    warn!(
                        "CPU id {} for worker {} not present on this host",
                        physical_id, logical_id
                    );
                }
            }
            None => warn!("could not enumerate CPU core ids; running unpinned"),
        }
    }
}
