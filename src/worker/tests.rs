//! Tests for the Worker module

use super::*;
use crate::job::{JobConfig, JobOutcome, JobResult, JobSpec, SpecError};
use crate::logger::DispatchLogger;
use crate::runtime::{
    ContainerHandle, ContainerRuntime, LaunchError, LogFetchError, RemovalError, WaitError,
};

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

// ============================================================================
// Mock ContainerRuntime
// ============================================================================

#[derive(Default)]
struct MockRuntime {
    fail_start: HashSet<String>,
    fail_wait: HashSet<String>,
    fail_fetch: bool,
    fail_remove: bool,
    exit_codes: HashMap<String, i64>,
    started: Mutex<Vec<String>>,
    removed: Mutex<Vec<String>>,
}

impl MockRuntime {
    fn new() -> Self {
        Self::default()
    }

    fn with_fail_start(mut self, job: &str) -> Self {
        self.fail_start.insert(job.to_string());
        self
    }

    fn with_fail_wait(mut self, job: &str) -> Self {
        self.fail_wait.insert(job.to_string());
        self
    }

    fn with_exit_code(mut self, job: &str, code: i64) -> Self {
        self.exit_codes.insert(job.to_string(), code);
        self
    }

    fn with_fail_fetch(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    fn with_fail_remove(mut self) -> Self {
        self.fail_remove = true;
        self
    }

    fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    async fn start(&self, _image: &str, spec: &JobSpec) -> Result<ContainerHandle, LaunchError> {
        let job = spec.arguments.first().cloned().unwrap_or_default();
        if self.fail_start.contains(&job) {
            return Err(LaunchError::Rejected(format!("injected failure for {job}")));
        }
        self.started.lock().unwrap().push(job.clone());
        Ok(ContainerHandle {
            id: format!("id-{job}"),
            name: job,
        })
    }

    async fn wait(&self, handle: &ContainerHandle) -> Result<i64, WaitError> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        if self.fail_wait.contains(&handle.name) {
            return Err(WaitError::Failed(format!(
                "injected wait failure for {}",
                handle.name
            )));
        }
        Ok(self.exit_codes.get(&handle.name).copied().unwrap_or(0))
    }

    async fn fetch_log(&self, handle: &ContainerHandle) -> Result<Vec<u8>, LogFetchError> {
        if self.fail_fetch {
            return Err(LogFetchError::Failed("injected fetch failure".into()));
        }
        Ok(format!("captured output of {}\n", handle.name).into_bytes())
    }

    async fn remove(&self, handle: &ContainerHandle) -> Result<(), RemovalError> {
        if self.fail_remove {
            return Err(RemovalError::Failed("injected remove failure".into()));
        }
        self.removed.lock().unwrap().push(handle.name.clone());
        Ok(())
    }
}

// ============================================================================
// Test fixtures
// ============================================================================

fn subject_spec_builder() -> impl Fn(&JobConfig) -> Result<JobSpec, SpecError> + Send + Sync {
    |config: &JobConfig| {
        let subject = config
            .get("subject")
            .ok_or_else(|| SpecError::MissingField("subject".into()))?;
        Ok(JobSpec {
            log_file_name: format!("job_{subject}.log"),
            mounts: vec![],
            arguments: vec![subject.to_string()],
            announce: Some(format!("processing subject {subject}")),
        })
    }
}

fn configs(subjects: &[&str]) -> Vec<JobConfig> {
    subjects
        .iter()
        .map(|s| JobConfig::new().with("subject", *s))
        .collect()
}

struct Fixture {
    _dir: tempfile::TempDir,
    logger: Arc<DispatchLogger>,
    job_log_dir: std::path::PathBuf,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let logger = Arc::new(
        DispatchLogger::create(&dir.path().join("dispatch"), "busybox", chrono::Local::now())
            .unwrap(),
    );
    let job_log_dir = dir.path().join("jobs");
    std::fs::create_dir_all(&job_log_dir).unwrap();
    Fixture {
        logger,
        job_log_dir,
        _dir: dir,
    }
}

fn build_worker(
    id: usize,
    runtime: Arc<MockRuntime>,
    fx: &Fixture,
    tx: mpsc::Sender<JobResult>,
    jobs: Arc<Vec<JobConfig>>,
    next_job: Arc<AtomicUsize>,
) -> Worker {
    WorkerBuilder::new(id)
        .runtime(runtime)
        .spec_builder(Arc::new(subject_spec_builder()))
        .logger(Arc::clone(&fx.logger))
        .image("busybox")
        .job_log_dir(fx.job_log_dir.clone())
        .results_tx(tx)
        .jobs(jobs)
        .next_job(next_job)
        .build()
        .expect("failed to build worker")
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_single_worker_runs_jobs_in_submission_order() {
    let fx = fixture();
    let runtime = Arc::new(MockRuntime::new());
    let jobs = Arc::new(configs(&["a", "b", "c"]));
    let (tx, mut rx) = mpsc::channel(8);

    let worker = build_worker(
        0,
        Arc::clone(&runtime),
        &fx,
        tx,
        jobs,
        Arc::new(AtomicUsize::new(0)),
    );
    let stats = worker.run().await;

    assert_eq!(stats.completed, 3);
    assert_eq!(stats.failed, 0);
    assert_eq!(runtime.started(), vec!["a", "b", "c"]);
    assert_eq!(runtime.removed(), vec!["a", "b", "c"]);

    let mut results = Vec::new();
    while let Some(result) = rx.recv().await {
        results.push(result);
    }
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.outcome == JobOutcome::Completed(0)));
}

#[tokio::test]
async fn test_per_job_log_files_written() {
    let fx = fixture();
    let runtime = Arc::new(MockRuntime::new());
    let jobs = Arc::new(configs(&["a"]));
    let (tx, _rx) = mpsc::channel(8);

    let worker = build_worker(0, runtime, &fx, tx, jobs, Arc::new(AtomicUsize::new(0)));
    worker.run().await;

    let contents = std::fs::read_to_string(fx.job_log_dir.join("job_a.log")).unwrap();
    assert_eq!(contents, "captured output of a\n");
}

#[tokio::test]
async fn test_spec_builder_error_becomes_launch_failed() {
    let fx = fixture();
    let runtime = Arc::new(MockRuntime::new());
    // Second config lacks the "subject" field the builder requires.
    let jobs = Arc::new(vec![
        JobConfig::new().with("subject", "a"),
        JobConfig::new().with("other", "x"),
        JobConfig::new().with("subject", "c"),
    ]);
    let (tx, mut rx) = mpsc::channel(8);

    let worker = build_worker(
        0,
        Arc::clone(&runtime),
        &fx,
        tx,
        jobs,
        Arc::new(AtomicUsize::new(0)),
    );
    let stats = worker.run().await;

    assert_eq!(stats.completed, 2);
    assert_eq!(stats.failed, 1);
    // The broken job never reached the runtime.
    assert_eq!(runtime.started(), vec!["a", "c"]);

    let mut results = Vec::new();
    while let Some(result) = rx.recv().await {
        results.push(result);
    }
    assert_eq!(results.len(), 3);
    assert!(matches!(results[1].outcome, JobOutcome::LaunchFailed(_)));
}

#[tokio::test]
async fn test_wait_error_becomes_runtime_error_and_container_removed() {
    let fx = fixture();
    let runtime = Arc::new(MockRuntime::new().with_fail_wait("a"));
    let jobs = Arc::new(configs(&["a"]));
    let (tx, mut rx) = mpsc::channel(8);

    let worker = build_worker(
        0,
        Arc::clone(&runtime),
        &fx,
        tx,
        jobs,
        Arc::new(AtomicUsize::new(0)),
    );
    worker.run().await;

    let result = rx.recv().await.unwrap();
    assert!(matches!(result.outcome, JobOutcome::RuntimeError(_)));
    // Handle is released even though the wait failed.
    assert_eq!(runtime.removed(), vec!["a"]);
}

#[tokio::test]
async fn test_fetch_and_remove_failures_keep_exit_code() {
    let fx = fixture();
    let runtime = Arc::new(
        MockRuntime::new()
            .with_exit_code("a", 2)
            .with_fail_fetch()
            .with_fail_remove(),
    );
    let jobs = Arc::new(configs(&["a"]));
    let (tx, mut rx) = mpsc::channel(8);

    let worker = build_worker(0, runtime, &fx, tx, jobs, Arc::new(AtomicUsize::new(0)));
    let stats = worker.run().await;

    assert_eq!(stats.completed, 1);
    let result = rx.recv().await.unwrap();
    assert_eq!(result.outcome, JobOutcome::Completed(2));
}

#[tokio::test]
async fn test_two_workers_share_claim_counter_without_duplication() {
    let fx = fixture();
    let runtime = Arc::new(MockRuntime::new());
    let jobs = Arc::new(configs(&["a", "b", "c", "d", "e"]));
    let next_job = Arc::new(AtomicUsize::new(0));
    let (tx, mut rx) = mpsc::channel(8);

    let w0 = build_worker(
        0,
        Arc::clone(&runtime),
        &fx,
        tx.clone(),
        Arc::clone(&jobs),
        Arc::clone(&next_job),
    );
    let w1 = build_worker(1, Arc::clone(&runtime), &fx, tx, jobs, next_job);

    let (s0, s1) = tokio::join!(
        tokio::spawn(w0.run()),
        tokio::spawn(w1.run())
    );
    let (s0, s1) = (s0.unwrap(), s1.unwrap());

    assert_eq!(s0.completed + s1.completed, 5);

    let mut results = Vec::new();
    while let Some(result) = rx.recv().await {
        results.push(result);
    }
    assert_eq!(results.len(), 5);

    // Every job started exactly once.
    let mut started = runtime.started();
    started.sort();
    assert_eq!(started, vec!["a", "b", "c", "d", "e"]);
}
