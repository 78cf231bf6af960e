//! Builder pattern for Worker construction

use std::path::PathBuf;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::{DispatchError, Result};
use crate::job::{JobConfig, JobResult, JobSpecBuilder};
use crate::logger::DispatchLogger;
use crate::runtime::ContainerRuntime;

use super::executor::Worker;

/// Builder for creating Worker instances
///
/// Provides ergonomic construction with validation.
///
/// # Example
/// ```ignore
/// let worker = WorkerBuilder::new(0)
///     .runtime(runtime)
///     .spec_builder(spec_builder)
///     .logger(logger)
///     .image("busybox:latest")
///     .job_log_dir(dir)
///     .results_tx(tx)
///     .jobs(jobs)
///     .next_job(counter)
///     .build()?;
/// ```
pub struct WorkerBuilder {
    id: usize,
    runtime: Option<Arc<dyn ContainerRuntime>>,
    spec_builder: Option<Arc<dyn JobSpecBuilder>>,
    logger: Option<Arc<DispatchLogger>>,
    image: Option<String>,
    job_log_dir: Option<PathBuf>,
    results_tx: Option<mpsc::Sender<JobResult>>,
    jobs: Option<Arc<Vec<JobConfig>>>,
    next_job: Option<Arc<AtomicUsize>>,
}

impl WorkerBuilder {
    /// Create a new builder with the given worker ID
    pub fn new(id: usize) -> Self {
        Self {
            id,
            runtime: None,
            spec_builder: None,
            logger: None,
            image: None,
            job_log_dir: None,
            results_tx: None,
            jobs: None,
            next_job: None,
        }
    }

    /// Set the container runtime
    pub fn runtime(mut self, runtime: Arc<dyn ContainerRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Set the job spec builder
    pub fn spec_builder(mut self, spec_builder: Arc<dyn JobSpecBuilder>) -> Self {
        self.spec_builder = Some(spec_builder);
        self
    }

    /// Set the dispatch logger
    pub fn logger(mut self, logger: Arc<DispatchLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Set the container image
    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Set the per-job log directory for this run
    pub fn job_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.job_log_dir = Some(dir.into());
        self
    }

    /// Set the results channel sender
    pub fn results_tx(mut self, tx: mpsc::Sender<JobResult>) -> Self {
        self.results_tx = Some(tx);
        self
    }

    /// Set the shared job list
    pub fn jobs(mut self, jobs: Arc<Vec<JobConfig>>) -> Self {
        self.jobs = Some(jobs);
        self
    }

    /// Set the shared claim counter
    pub fn next_job(mut self, counter: Arc<AtomicUsize>) -> Self {
        self.next_job = Some(counter);
        self
    }

    /// Build the Worker
    ///
    /// # Errors
    /// Returns an error if any required field is missing.
    pub fn build(self) -> Result<Worker> {
        let runtime = self
            .runtime
            .ok_or_else(|| DispatchError::missing_config("runtime"))?;
        let spec_builder = self
            .spec_builder
            .ok_or_else(|| DispatchError::missing_config("spec_builder"))?;
        let logger = self
            .logger
            .ok_or_else(|| DispatchError::missing_config("logger"))?;
        let image = self
            .image
            .ok_or_else(|| DispatchError::missing_config("image"))?;
        let job_log_dir = self
            .job_log_dir
            .ok_or_else(|| DispatchError::missing_config("job_log_dir"))?;
        let results_tx = self
            .results_tx
            .ok_or_else(|| DispatchError::missing_config("results_tx"))?;
        let jobs = self
            .jobs
            .ok_or_else(|| DispatchError::missing_config("jobs"))?;
        let next_job = self
            .next_job
            .ok_or_else(|| DispatchError::missing_config("next_job"))?;

        Ok(Worker::new(
            self.id,
            runtime,
            spec_builder,
            logger,
            image,
            job_log_dir,
            results_tx,
            jobs,
            next_job,
        ))
    }
}
