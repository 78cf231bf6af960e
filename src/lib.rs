//! container-dispatch: bounded-concurrency dispatching of batch container jobs
//!
//! This crate runs a list of jobs, one isolated container execution per job,
//! against a shared container runtime while enforcing an upper bound on the
//! number of containers running at once. It provides:
//!
//! - A pipeline-agnostic [`Dispatcher`] with pool-based admission control
//! - The [`ContainerRuntime`] boundary (start/wait/fetch_log/remove) and a
//!   Docker implementation
//! - An injectable [`JobSpecBuilder`] that turns opaque job configs into
//!   execution-ready container specs
//! - A run-level [`DispatchLogger`] plus one captured log file per job
//! - A final [`DispatchSummary`] with an exit-code histogram and one result
//!   per submitted job
//!
//! Failures are surfaced, never healed: there are no retries, and one job's
//! failure never blocks its siblings.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod job;
pub mod logger;
pub mod runtime;
pub mod worker;

pub use config::{ConfigError, DispatchConfig};
pub use dispatcher::{aggregate, DispatchSummary, Dispatcher, DispatcherBuilder};
pub use error::{DispatchError, Result};
pub use job::{JobConfig, JobOutcome, JobResult, JobSpec, JobSpecBuilder, Mount, SpecError};
pub use logger::DispatchLogger;
pub use runtime::{
    ContainerHandle, ContainerRuntime, DockerRuntime, LaunchError, LogFetchError, RemovalError,
    WaitError,
};
pub use worker::{Worker, WorkerBuilder, WorkerStats};
