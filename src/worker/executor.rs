//! Worker execution loop

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::job::{JobConfig, JobOutcome, JobResult, JobSpec, JobSpecBuilder};
use crate::logger::DispatchLogger;
use crate::runtime::{ContainerHandle, ContainerRuntime};

use super::stats::WorkerStats;

/// Worker occupies one admission slot: claim job -> run container -> report
///
/// Workers are tokio tasks managed by the Dispatcher. They share the runtime,
/// spec builder, logger, and job list via Arc, claim job indexes from a
/// shared counter, and send results through an mpsc channel.
pub struct Worker {
    /// Unique worker identifier
    id: usize,

    /// Container runtime (shared across workers via Arc)
    runtime: Arc<dyn ContainerRuntime>,

    /// Caller-supplied job spec builder (shared across workers via Arc)
    spec_builder: Arc<dyn JobSpecBuilder>,

    /// Run-level dispatch logger (shared across workers via Arc)
    logger: Arc<DispatchLogger>,

    /// Container image to launch for every job
    image: String,

    /// Directory receiving this run's per-job log files
    job_log_dir: PathBuf,

    /// Channel sender for job results
    results_tx: mpsc::Sender<JobResult>,

    /// Ordered job list, shared read-only across workers
    jobs: Arc<Vec<JobConfig>>,

    /// Shared claim counter for job distribution
    next_job: Arc<AtomicUsize>,
}

impl Worker {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: usize,
        runtime: Arc<dyn ContainerRuntime>,
        spec_builder: Arc<dyn JobSpecBuilder>,
        logger: Arc<DispatchLogger>,
        image: String,
        job_log_dir: PathBuf,
        results_tx: mpsc::Sender<JobResult>,
        jobs: Arc<Vec<JobConfig>>,
        next_job: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            id,
            runtime,
            spec_builder,
            logger,
            image,
            job_log_dir,
            results_tx,
            jobs,
            next_job,
        }
    }

    /// Run the worker loop until the job list is exhausted
    ///
    /// Every claimed job produces exactly one result, regardless of how it
    /// failed; nothing a single job does can abort the loop early except the
    /// results channel closing.
    pub async fn run(self) -> WorkerStats {
        let mut stats = WorkerStats::new();
        stats.start();

        tracing::debug!(worker_id = self.id, "worker started");

        while let Some(index) = self.claim_next() {
            let config = self.jobs[index].clone();
            let result = self.run_job(index, &config).await;

            match result.outcome {
                JobOutcome::Completed(_) => stats.record_completed(),
                _ => stats.record_failed(),
            }

            // Send errors only happen on shutdown of the collecting side.
            if self.results_tx.send(result).await.is_err() {
                tracing::debug!(worker_id = self.id, "results channel closed, worker stopping");
                break;
            }
        }

        stats.stop();
        tracing::debug!(
            worker_id = self.id,
            completed = stats.completed,
            failed = stats.failed,
            elapsed_ms = ?stats.elapsed().map(|d| d.as_millis()),
            "worker finished"
        );

        stats
    }

    /// Claim the next unstarted job index from the shared counter
    ///
    /// Returns `None` once the job list is exhausted.
    fn claim_next(&self) -> Option<usize> {
        let claimed = self.next_job.fetch_add(1, Ordering::SeqCst);
        if claimed >= self.jobs.len() {
            // Rollback so the counter stays accurate for sibling workers.
            self.next_job.fetch_sub(1, Ordering::SeqCst);
            return None;
        }
        Some(claimed)
    }

    /// Drive one job through its full container lifecycle
    async fn run_job(&self, index: usize, config: &JobConfig) -> JobResult {
        let total = self.jobs.len();
        let ordinal = index + 1;

        // Resolving
        let spec = match self.spec_builder.build(config) {
            Ok(spec) => spec,
            Err(e) => {
                self.logger.log(format!(
                    "job {ordinal}/{total} spec resolution failed for config {config}: {e}"
                ));
                return JobResult {
                    config: config.clone(),
                    outcome: JobOutcome::LaunchFailed(e.to_string()),
                };
            }
        };

        if let Some(announce) = &spec.announce {
            self.logger.log(announce);
        }

        // Launching
        self.logger.log(format!(
            "starting container {ordinal}/{total}: config {config}, binds [{}], args [{}]",
            spec.mounts
                .iter()
                .map(|m| m.bind_arg())
                .collect::<Vec<_>>()
                .join(", "),
            spec.arguments.join(" ")
        ));

        let handle = match self.runtime.start(&self.image, &spec).await {
            Ok(handle) => handle,
            Err(e) => {
                self.logger
                    .log(format!("container {ordinal}/{total} failed to launch: {e}"));
                return JobResult {
                    config: config.clone(),
                    outcome: JobOutcome::LaunchFailed(e.to_string()),
                };
            }
        };

        // Running
        self.logger.log(format!(
            "container {ordinal}/{total} started as {}, waiting for exit...",
            handle.name
        ));

        let exit_code = match self.runtime.wait(&handle).await {
            Ok(code) => code,
            Err(e) => {
                self.logger.log(format!(
                    "lost container {ordinal}/{total} ({}) while waiting: {e}",
                    handle.name
                ));
                // Fate unknown; skip log capture but still release the handle.
                self.remove_best_effort(&handle).await;
                return JobResult {
                    config: config.clone(),
                    outcome: JobOutcome::RuntimeError(e.to_string()),
                };
            }
        };

        self.logger.log(format!(
            "container {ordinal}/{total} ({}) exited with code {exit_code}",
            handle.name
        ));

        self.capture_log(&handle, &spec).await;
        self.remove_best_effort(&handle).await;

        JobResult {
            config: config.clone(),
            outcome: JobOutcome::Completed(exit_code),
        }
    }

    /// Best-effort capture of the container's output into the per-job log
    /// file; failure never changes the job's outcome.
    async fn capture_log(&self, handle: &ContainerHandle, spec: &JobSpec) {
        let path = self.job_log_dir.join(&spec.log_file_name);

        let bytes = match self.runtime.fetch_log(handle).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(container = %handle.name, error = %e, "failed to fetch container log");
                self.logger.log(format!(
                    "warning: could not fetch log for container {}: {e}",
                    handle.name
                ));
                Vec::new()
            }
        };

        if let Err(e) = tokio::fs::write(&path, &bytes).await {
            tracing::warn!(path = %path.display(), error = %e, "failed to write job log file");
            self.logger.log(format!(
                "warning: could not write job log {}: {e}",
                path.display()
            ));
        } else {
            self.logger.log(format!(
                "container {} log written to {}",
                handle.name,
                path.display()
            ));
        }
    }

    /// Best-effort removal; the exit code was already captured by `wait`, so
    /// failure here is only a logged warning.
    async fn remove_best_effort(&self, handle: &ContainerHandle) {
        self.logger.log(format!("removing container {}...", handle.name));
        match self.runtime.remove(handle).await {
            Ok(()) => self.logger.log(format!("container {} removed", handle.name)),
            Err(e) => {
                tracing::warn!(container = %handle.name, error = %e, "failed to remove container");
                self.logger.log(format!(
                    "warning: could not remove container {}: {e}",
                    handle.name
                ));
            }
        }
    }

    /// Get the worker ID
    pub fn id(&self) -> usize {
        self.id
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("image", &self.image)
            .field("jobs", &self.jobs.len())
            .finish()
    }
}
