//! CLI argument parsing and jobs-file loading for the dispatch driver

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;

use container_dispatch::{JobConfig, JobSpec, JobSpecBuilder, SpecError};

/// Dispatch a list of container jobs with bounded concurrency
#[derive(Parser)]
#[command(name = "container-dispatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Container image to launch for every job
    #[arg(short, long)]
    pub image: String,

    /// Maximum number of containers running at the same time
    #[arg(short, long)]
    pub max_containers: usize,

    /// Path to the JSON jobs file
    #[arg(short, long)]
    pub jobs_file: PathBuf,

    /// Directory for the run-level dispatch log
    #[arg(long, default_value = "dispatch-logs")]
    pub dispatch_log_path: PathBuf,

    /// Directory for the captured per-container log files
    #[arg(long, default_value = "docker-logs")]
    pub docker_log_path: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// One entry of the jobs file: an opaque config plus its resolved spec fields
#[derive(Debug, Deserialize)]
pub struct JobEntry {
    /// Opaque job fields, reported back in the summary
    #[serde(default)]
    pub config: JobConfig,

    /// Execution-ready spec fields (log file name, mounts, arguments)
    #[serde(flatten)]
    pub spec: JobSpec,
}

/// Load and parse the jobs file
pub fn load_jobs(path: &Path) -> anyhow::Result<Vec<JobEntry>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open jobs file {}", path.display()))?;
    let entries: Vec<JobEntry> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse jobs file {}", path.display()))?;
    Ok(entries)
}

/// Spec builder backed by a config-to-spec lookup table
///
/// The driver resolves specs ahead of time from the jobs file; the dispatcher
/// still goes through the builder boundary so it stays pipeline-agnostic.
pub struct TableSpecBuilder {
    specs: BTreeMap<JobConfig, JobSpec>,
}

impl TableSpecBuilder {
    /// Build the lookup table; configs must be unique
    pub fn new(entries: impl IntoIterator<Item = (JobConfig, JobSpec)>) -> anyhow::Result<Self> {
        let mut specs = BTreeMap::new();
        for (index, (config, spec)) in entries.into_iter().enumerate() {
            if specs.insert(config, spec).is_some() {
                anyhow::bail!("duplicate job config at entry {index}");
            }
        }
        Ok(Self { specs })
    }
}

impl JobSpecBuilder for TableSpecBuilder {
    fn build(&self, config: &JobConfig) -> Result<JobSpec, SpecError> {
        self.specs.get(config).cloned().ok_or_else(|| {
            SpecError::InvalidConfig(format!("no spec registered for config {config}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_entry_deserialization() {
        let json = r#"{
            "config": {"subject": "01"},
            "log_file_name": "fmriprep_01.log",
            "mounts": [{"host": "/data/bids", "container": "/data"}],
            "arguments": ["/data", "/out", "participant"],
            "announce": "processing subject 01"
        }"#;

        let entry: JobEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.config.get("subject"), Some("01"));
        assert_eq!(entry.spec.log_file_name, "fmriprep_01.log");
        assert_eq!(entry.spec.mounts.len(), 1);
        assert_eq!(entry.spec.arguments.len(), 3);
    }

    #[test]
    fn test_table_spec_builder_lookup() {
        let config = JobConfig::new().with("subject", "01");
        let spec = JobSpec {
            log_file_name: "a.log".into(),
            mounts: vec![],
            arguments: vec![],
            announce: None,
        };

        let builder = TableSpecBuilder::new([(config.clone(), spec.clone())]).unwrap();
        assert_eq!(builder.build(&config).unwrap(), spec);

        let unknown = JobConfig::new().with("subject", "99");
        assert!(matches!(
            builder.build(&unknown),
            Err(SpecError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_table_spec_builder_rejects_duplicates() {
        let config = JobConfig::new().with("subject", "01");
        let spec = JobSpec {
            log_file_name: "a.log".into(),
            mounts: vec![],
            arguments: vec![],
            announce: None,
        };

        let result =
            TableSpecBuilder::new([(config.clone(), spec.clone()), (config, spec)]);
        assert!(result.is_err());
    }
}
