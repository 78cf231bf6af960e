//! Job descriptors: opaque configs, resolved container specs, and results
//!
//! A [`JobConfig`] is whatever the caller submitted (e.g. a subject
//! identifier); the dispatcher never interprets it. A [`JobSpec`] is the
//! execution-ready form produced once per job by an injected
//! [`JobSpecBuilder`]. Exactly one [`JobResult`] exists per submitted config,
//! whether or not the container ever launched.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Opaque per-job configuration, owned by the caller
///
/// An ordered string map so configs can double as lookup keys. Immutable
/// once submitted to the dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobConfig(BTreeMap<String, String>);

impl JobConfig {
    /// Create an empty config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, builder style
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Look up a field
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the config carries no fields
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for JobConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        write!(f, "}}")
    }
}

impl FromIterator<(String, String)> for JobConfig {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A host-path to container-path visibility mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mount {
    /// Path on the host
    pub host: PathBuf,

    /// Path inside the container
    pub container: String,
}

impl Mount {
    /// Create a new bind mount
    pub fn new(host: impl Into<PathBuf>, container: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            container: container.into(),
        }
    }

    /// Render as the runtime's `host:container` bind argument
    pub fn bind_arg(&self) -> String {
        format!("{}:{}", self.host.display(), self.container)
    }
}

/// Resolved, execution-ready job descriptor
///
/// Built once per job by the [`JobSpecBuilder`]; never mutated afterward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    /// File name (not path) for this job's captured container log
    pub log_file_name: String,

    /// Bind mounts granted to the container, in order
    #[serde(default)]
    pub mounts: Vec<Mount>,

    /// Command-line arguments passed to the container, in order
    #[serde(default)]
    pub arguments: Vec<String>,

    /// Optional line written to the dispatch log before launch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub announce: Option<String>,
}

/// Terminal outcome of one job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobOutcome {
    /// The container ran to a terminal state with this exit code
    Completed(i64),

    /// Spec resolution or the launch itself failed; the container never ran
    LaunchFailed(String),

    /// The runtime connection was lost mid-wait; the container's true fate
    /// is unknown
    RuntimeError(String),
}

impl JobOutcome {
    /// Exit code, if the container reached a terminal state
    pub fn exit_code(&self) -> Option<i64> {
        match self {
            JobOutcome::Completed(code) => Some(*code),
            _ => None,
        }
    }

    /// Whether the job completed with exit code zero
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Completed(0))
    }
}

/// Outcome of one submitted job, produced exactly once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    /// The config as submitted
    pub config: JobConfig,

    /// How the job ended
    pub outcome: JobOutcome,
}

/// Errors from an external job-spec builder
///
/// Treated as a job-level launch failure; never aborts sibling jobs.
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    /// The config cannot be mapped to a container spec
    #[error("invalid job config: {0}")]
    InvalidConfig(String),

    /// The config is missing a field the builder requires
    #[error("job config missing field: {0}")]
    MissingField(String),
}

/// Caller-supplied mapping from an opaque [`JobConfig`] to a [`JobSpec`]
///
/// Called concurrently from multiple workers; implementations must not share
/// mutable state between calls. Plain functions and closures implement this
/// trait directly.
pub trait JobSpecBuilder: Send + Sync {
    /// Build the execution-ready spec for one job
    fn build(&self, config: &JobConfig) -> Result<JobSpec, SpecError>;
}

impl<F> JobSpecBuilder for F
where
    F: Fn(&JobConfig) -> Result<JobSpec, SpecError> + Send + Sync,
{
    fn build(&self, config: &JobConfig) -> Result<JobSpec, SpecError> {
        self(config)
    }
}
