//! Diagnostic trail for unattended runs.
//!
//! The agent runs from a timer with nobody watching, so every fetch outcome
//! and per-node delivery decision is appended to log files an operator can
//! read later. The `Recorder` is an injected capability: production code uses
//! [`FileRecorder`], tests use [`NoopRecorder`].

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use chrono::Local;
use tracing::warn;

pub trait Recorder: Send + Sync {
    /// Append a line to the per-run diagnostic trail.
    fn trail(&self, line: &str);

    /// Append a line to the persistent error log (and the trail).
    fn error(&self, line: &str);
}

/// File-backed recorder. The trail file is truncated when opened, so each run
/// starts with a fresh trail; the error log accumulates across runs.
pub struct FileRecorder {
    trail: Mutex<File>,
    errors: Mutex<File>,
}

impl FileRecorder {
    pub fn open(trail_path: &Path, error_path: &Path) -> std::io::Result<Self> {
        let trail = File::create(trail_path)?;
        let errors = OpenOptions::new()
            .create(true)
            .append(true)
            .open(error_path)?;

        Ok(Self {
            trail: Mutex::new(trail),
            errors: Mutex::new(errors),
        })
    }

    fn write_line(file: &Mutex<File>, line: &str) {
        let stamped = format!("[{}] {line}\n", Local::now().format("%Y-%m-%d %H:%M:%S"));
        match file.lock() {
            Ok(mut file) => {
                if let Err(e) = file.write_all(stamped.as_bytes()) {
                    warn!("failed to write diagnostic line: {e}");
                }
            }
            Err(_) => warn!("diagnostic log mutex poisoned, dropping line"),
        }
    }
}

impl Recorder for FileRecorder {
    fn trail(&self, line: &str) {
        Self::write_line(&self.trail, line);
    }

    fn error(&self, line: &str) {
        Self::write_line(&self.trail, line);
        Self::write_line(&self.errors, line);
    }
}

/// Recorder that drops everything.
pub struct NoopRecorder;

impl Recorder for NoopRecorder {
    fn trail(&self, _line: &str) {}

    fn error(&self, _line: &str) {}
}
