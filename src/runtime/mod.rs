//! Container runtime boundary
//!
//! Four primitive, possibly-blocking operations against the container
//! runtime: `start`, `wait`, `fetch_log`, `remove`. The trait is the only
//! seam between the dispatcher and the runtime; tests substitute a mock,
//! production uses [`DockerRuntime`]. No operation is retried here — retry
//! policy, if any, belongs to the caller of the dispatcher.

use async_trait::async_trait;
use thiserror::Error;

use crate::job::JobSpec;

mod docker;

pub use docker::DockerRuntime;

/// Runtime-assigned identity of a running container instance
///
/// Removed at job completion regardless of the job's outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHandle {
    /// Runtime-internal container id
    pub id: String,

    /// Human-readable container name, used in log lines
    pub name: String,
}

/// The runtime rejected a start request; the container never ran
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Error from the Docker daemon (bad image, mount path missing,
    /// daemon unreachable)
    #[error("container runtime rejected launch: {0}")]
    Docker(#[from] bollard::errors::Error),

    /// Launch rejected for a runtime-independent reason
    #[error("launch rejected: {0}")]
    Rejected(String),
}

/// The runtime connection was lost mid-wait; the container's fate is unknown
#[derive(Debug, Error)]
pub enum WaitError {
    /// Error from the Docker daemon
    #[error("container runtime lost while waiting: {0}")]
    Docker(#[from] bollard::errors::Error),

    /// Wait failed for a runtime-independent reason
    #[error("wait failed: {0}")]
    Failed(String),
}

/// Log retrieval failed; downgraded to a warning by callers
#[derive(Debug, Error)]
pub enum LogFetchError {
    /// Error from the Docker daemon
    #[error("container log retrieval failed: {0}")]
    Docker(#[from] bollard::errors::Error),

    /// Retrieval failed for a runtime-independent reason
    #[error("log retrieval failed: {0}")]
    Failed(String),
}

/// Container removal failed; downgraded to a warning by callers
#[derive(Debug, Error)]
pub enum RemovalError {
    /// Error from the Docker daemon
    #[error("container removal failed: {0}")]
    Docker(#[from] bollard::errors::Error),

    /// Removal failed for a runtime-independent reason
    #[error("removal failed: {0}")]
    Failed(String),
}

/// The four primitive operations the dispatcher needs from a container
/// runtime
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Launch a detached container instance for one job
    ///
    /// Must return as soon as the container is running; never blocks on
    /// container completion.
    async fn start(&self, image: &str, spec: &JobSpec) -> Result<ContainerHandle, LaunchError>;

    /// Block until the container reaches a terminal state and return its
    /// exit code
    ///
    /// There is no timeout: a hung container blocks the calling worker
    /// indefinitely.
    async fn wait(&self, handle: &ContainerHandle) -> Result<i64, WaitError>;

    /// Retrieve the container's combined, timestamped output
    async fn fetch_log(&self, handle: &ContainerHandle) -> Result<Vec<u8>, LogFetchError>;

    /// Reclaim the container's resources
    async fn remove(&self, handle: &ContainerHandle) -> Result<(), RemovalError>;
}
