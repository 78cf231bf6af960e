//! Run-level dispatch logging
//!
//! One dispatch run produces one append-only log file plus a console mirror.
//! Every line is written atomically under a mutex, so lines from concurrent
//! workers never interleave mid-line. The file path is derived from the run
//! start time and the image name, so concurrent runs never collide.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};

/// Timestamp format for log lines: `[YYYY-MM-DD HH:MM:SS] message`
pub(crate) const LINE_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp format for file and directory names
pub(crate) const PATH_TIMESTAMP: &str = "%Y-%m-%d_%H-%M-%S";

/// Thread-safe dual-sink logger for one dispatch run
pub struct DispatchLogger {
    file: Mutex<File>,
    path: PathBuf,
}

impl DispatchLogger {
    /// Open the run log at
    /// `<dir>/dispatch_<sanitized-image>_<start-timestamp>.log`,
    /// creating the directory if absent.
    pub fn create(
        dir: &Path,
        image: &str,
        started: DateTime<Local>,
    ) -> std::io::Result<Self> {
        fs::create_dir_all(dir)?;
        let file_name = format!(
            "dispatch_{}_{}.log",
            sanitize_image_name(image),
            started.format(PATH_TIMESTAMP)
        );
        let path = dir.join(file_name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    /// Append one timestamped line to the run log and mirror it to the
    /// console sink.
    pub fn log(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        let line = format!("[{}] {}", Local::now().format(LINE_TIMESTAMP), message);

        {
            let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
            if let Err(e) = writeln!(file, "{line}") {
                tracing::warn!(error = %e, path = %self.path.display(), "failed to append to dispatch log");
            }
        }

        tracing::info!(target: "dispatch", "{message}");
    }

    /// Path of the run log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for DispatchLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchLogger")
            .field("path", &self.path)
            .finish()
    }
}

/// Make an image name safe for use in a file name
pub fn sanitize_image_name(image: &str) -> String {
    image.replace(['/', ':'], "-")
}
