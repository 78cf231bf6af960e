//! Per-worker tallies

use std::time::{Duration, Instant};

/// Counters tracked by each worker over its lifetime
#[derive(Debug, Default, Clone)]
pub struct WorkerStats {
    /// Jobs whose container reached a terminal state with an exit code
    pub completed: usize,

    /// Jobs that ended in a launch or runtime failure
    pub failed: usize,

    /// Worker start time
    pub started_at: Option<Instant>,

    /// Worker end time
    pub ended_at: Option<Instant>,
}

impl WorkerStats {
    /// Create new empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking (records start time)
    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    /// Stop tracking (records end time)
    pub fn stop(&mut self) {
        self.ended_at = Some(Instant::now());
    }

    /// Total jobs this worker ran (completed + failed)
    pub fn total_jobs(&self) -> usize {
        self.completed + self.failed
    }

    /// Record a job whose container exited
    pub fn record_completed(&mut self) {
        self.completed += 1;
    }

    /// Record a job that failed to launch or lost its runtime
    pub fn record_failed(&mut self) {
        self.failed += 1;
    }

    /// Elapsed time since start (until stop, if recorded)
    pub fn elapsed(&self) -> Option<Duration> {
        self.started_at.map(|start| {
            self.ended_at
                .map(|end| end.duration_since(start))
                .unwrap_or_else(|| start.elapsed())
        })
    }
}
