//! Dispatch run configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for one dispatch run
///
/// Defines the image to launch, the admission budget, and where the two log
/// trees (run-level dispatch log, per-job container logs) are rooted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Container image identifier (e.g. "nipreps/fmriprep:latest")
    pub image: String,

    /// Maximum number of containers running at the same time
    pub max_containers: usize,

    /// Directory receiving the run-level dispatch log file
    pub dispatch_log_dir: PathBuf,

    /// Directory receiving one captured log file per job, under a
    /// per-run timestamp subdirectory
    pub job_log_dir: PathBuf,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            image: String::new(),
            max_containers: 1,
            dispatch_log_dir: PathBuf::from("dispatch-logs"),
            job_log_dir: PathBuf::from("docker-logs"),
        }
    }
}

impl DispatchConfig {
    /// Create a new config for the given image and admission budget
    pub fn new(image: impl Into<String>, max_containers: usize) -> Self {
        Self {
            image: image.into(),
            max_containers,
            ..Default::default()
        }
    }

    /// Set the dispatch log directory
    pub fn with_dispatch_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dispatch_log_dir = dir.into();
        self
    }

    /// Set the per-job log directory
    pub fn with_job_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.job_log_dir = dir.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.image.is_empty() {
            return Err(ConfigError::MissingImage);
        }

        if self.max_containers == 0 {
            return Err(ConfigError::InvalidConcurrency(
                "max_containers must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No container image was given
    #[error("no container image configured")]
    MissingImage,

    /// Invalid admission budget
    #[error("invalid concurrency: {0}")]
    InvalidConcurrency(String),
}
