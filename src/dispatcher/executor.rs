//! Dispatch execution logic

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use tokio::sync::mpsc;

use crate::config::DispatchConfig;
use crate::error::Result;
use crate::job::{JobConfig, JobSpecBuilder};
use crate::logger::{DispatchLogger, PATH_TIMESTAMP};
use crate::runtime::ContainerRuntime;
use crate::worker::WorkerBuilder;

use super::aggregator::{aggregate, DispatchSummary};

/// Dispatcher manages one dispatch run end to end
///
/// Responsible for creating the log trees, spawning the worker pool,
/// collecting results, and producing the final summary. The pool size is the
/// admission limit: a worker runs one container at a time, so at most
/// `max_containers` containers started by this dispatcher are ever running.
pub struct Dispatcher {
    /// Run configuration
    pub(crate) config: DispatchConfig,

    /// Container runtime (shared across workers)
    pub(crate) runtime: Arc<dyn ContainerRuntime>,

    /// Caller-supplied job spec builder (shared across workers)
    pub(crate) spec_builder: Arc<dyn JobSpecBuilder>,
}

impl Dispatcher {
    /// Create a new dispatcher
    ///
    /// Use `DispatcherBuilder` for validated construction.
    pub fn new(
        config: DispatchConfig,
        runtime: Arc<dyn ContainerRuntime>,
        spec_builder: Arc<dyn JobSpecBuilder>,
    ) -> Self {
        Self {
            config,
            runtime,
            spec_builder,
        }
    }

    /// Get the run configuration
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Run the dispatch to completion
    ///
    /// Spawns the worker pool, waits for every submitted job to reach a
    /// terminal state, and returns the summary. One job's failure never
    /// aborts the run; only setup errors (log directories, logger) fail the
    /// whole call.
    pub async fn run(&self, configs: Vec<JobConfig>) -> Result<DispatchSummary> {
        let started = Local::now();
        let clock = Instant::now();
        let total = configs.len();

        let logger = Arc::new(DispatchLogger::create(
            &self.config.dispatch_log_dir,
            &self.config.image,
            started,
        )?);
        let job_log_dir = self
            .config
            .job_log_dir
            .join(started.format(PATH_TIMESTAMP).to_string());
        tokio::fs::create_dir_all(&job_log_dir).await?;

        logger.log(format!(
            "dispatching image {}: {} job(s), at most {} concurrent container(s)",
            self.config.image, total, self.config.max_containers
        ));

        let jobs = Arc::new(configs);
        let next_job = Arc::new(AtomicUsize::new(0));
        let (results_tx, mut results_rx) = mpsc::channel(total.max(1));

        // One worker per admission slot; no point spawning more workers
        // than jobs.
        let pool_size = self.config.max_containers.min(total);
        let mut handles = Vec::with_capacity(pool_size);
        for worker_id in 0..pool_size {
            let worker = WorkerBuilder::new(worker_id)
                .runtime(Arc::clone(&self.runtime))
                .spec_builder(Arc::clone(&self.spec_builder))
                .logger(Arc::clone(&logger))
                .image(self.config.image.clone())
                .job_log_dir(job_log_dir.clone())
                .results_tx(results_tx.clone())
                .jobs(Arc::clone(&jobs))
                .next_job(Arc::clone(&next_job))
                .build()?;

            handles.push(tokio::spawn(worker.run()));
        }
        drop(results_tx);

        logger.log("all jobs submitted, waiting for completion...");

        // Drains until every worker has dropped its sender.
        let mut results = Vec::with_capacity(total);
        while let Some(result) = results_rx.recv().await {
            results.push(result);
        }

        for (worker_id, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(stats) => {
                    tracing::debug!(
                        worker_id,
                        completed = stats.completed,
                        failed = stats.failed,
                        "worker completed"
                    );
                }
                Err(e) => {
                    // A panicked worker loses its in-flight job's result but
                    // must not take down the rest of the run.
                    tracing::error!(worker_id, error = %e, "worker task panicked");
                }
            }
        }

        let summary = aggregate(results, total);
        logger.log(format!(
            "dispatch finished in {:.1}s: {} of {} job(s) accounted for",
            clock.elapsed().as_secs_f64(),
            summary.accounted(),
            summary.total_jobs
        ));
        logger.log(format!(
            "exit code histogram: {:?}, launch/runtime failures: {}",
            summary.histogram, summary.failures
        ));

        Ok(summary)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .finish()
    }
}
