//! Dispatcher for a bounded-concurrency dispatch run
//!
//! The Dispatcher owns the admission control and the run lifecycle:
//! - Spawning a fixed pool of workers, one per admission slot
//! - Distributing jobs to workers through a shared claim counter, so at most
//!   `max_containers` jobs are ever in flight — the dispatcher counts only
//!   its own jobs and never consults host-wide container state
//! - Collecting one result per submitted job, in completion-arrival order
//! - Aggregating the final exit-code histogram
//!
//! # Example
//!
//! ```ignore
//! use container_dispatch::{DispatchConfig, DispatcherBuilder, DockerRuntime};
//!
//! let dispatcher = DispatcherBuilder::new()
//!     .config(DispatchConfig::new("nipreps/fmriprep:latest", 4))
//!     .runtime(Arc::new(DockerRuntime::connect()?))
//!     .spec_builder(spec_builder)
//!     .build()?;
//!
//! let summary = dispatcher.run(configs).await?;
//! println!("{} of {} jobs succeeded", summary.succeeded(), summary.total_jobs);
//! ```

mod aggregator;
mod builder;
mod executor;

pub use aggregator::{aggregate, DispatchSummary};
pub use builder::DispatcherBuilder;
pub use executor::Dispatcher;
