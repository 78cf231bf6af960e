//! Worker module: one admission slot, one job at a time
//!
//! A Worker occupies exactly one of the dispatcher's admission slots. Its
//! loop is intentionally minimal: **claim the next unstarted job -> drive it
//! through its container lifecycle -> report the result -> repeat** until the
//! job list is exhausted. Running each claimed job to completion before
//! claiming another is what bounds concurrency by construction — a pool of N
//! workers can never have more than N containers in flight.
//!
//! Per job the lifecycle is: resolve the spec, log the announce line, start
//! the container, block on its exit, capture its log, remove it. Any error at
//! or before start short-circuits to a `LaunchFailed` result and frees the
//! slot immediately; errors from log capture and removal are downgraded to
//! warnings.
//!
//! # Example
//!
//! ```ignore
//! use container_dispatch::WorkerBuilder;
//!
//! let worker = WorkerBuilder::new(0)
//!     .runtime(runtime)
//!     .spec_builder(spec_builder)
//!     .logger(logger)
//!     .image("busybox:latest")
//!     .job_log_dir(job_log_dir)
//!     .results_tx(tx)
//!     .jobs(jobs)
//!     .next_job(counter)
//!     .build()?;
//!
//! let stats = worker.run().await;
//! println!("completed: {}", stats.completed);
//! ```

mod builder;
mod executor;
mod stats;

pub use builder::WorkerBuilder;
pub use executor::Worker;
pub use stats::WorkerStats;

#[cfg(test)]
mod tests;
