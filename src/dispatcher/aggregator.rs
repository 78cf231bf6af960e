//! Result aggregation into the final dispatch summary

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::job::{JobOutcome, JobResult};

/// Final artifact of a dispatch run
///
/// Every submitted job is accounted for exactly once: either under its exit
/// code in the histogram, or in `failures` if its container never produced
/// one (launch failure or lost runtime).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchSummary {
    /// Number of jobs submitted to the run
    pub total_jobs: usize,

    /// Count of jobs per terminal exit code
    pub histogram: BTreeMap<i64, usize>,

    /// Jobs that ended without an exit code
    pub failures: usize,

    /// One result per job, in completion-arrival order
    pub results: Vec<JobResult>,
}

impl DispatchSummary {
    /// Jobs that completed with exit code zero
    pub fn succeeded(&self) -> usize {
        self.histogram.get(&0).copied().unwrap_or(0)
    }

    /// Histogram total plus failures
    pub fn accounted(&self) -> usize {
        self.histogram.values().sum::<usize>() + self.failures
    }

    /// Whether every submitted job reached a terminal state
    pub fn is_fully_accounted(&self) -> bool {
        self.accounted() == self.total_jobs
    }
}

/// Aggregate per-job results into the final summary
pub fn aggregate(results: Vec<JobResult>, total_jobs: usize) -> DispatchSummary {
    let mut histogram = BTreeMap::new();
    let mut failures = 0;

    for result in &results {
        match result.outcome {
            JobOutcome::Completed(code) => *histogram.entry(code).or_insert(0) += 1,
            JobOutcome::LaunchFailed(_) | JobOutcome::RuntimeError(_) => failures += 1,
        }
    }

    DispatchSummary {
        total_jobs,
        histogram,
        failures,
        results,
    }
}
