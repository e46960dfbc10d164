//! Terminal output for upload sessions.

use engine::{
    ProgressCallback, StatsSnapshot, UploadError, UploadJob, UploadReceipt, UploadSummary,
};
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// How much the CLI prints per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }
}

/// CLI implementation of ProgressCallback for displaying upload progress
pub struct CliProgress {
    verbosity: Verbosity,
    json: bool,
}

impl CliProgress {
    pub fn new(verbosity: Verbosity, json: bool) -> Self {
        CliProgress { verbosity, json }
    }

    /// Line printed after a successful upload, if any.
    fn completion_line(
        &self,
        job: &UploadJob,
        receipt: &UploadReceipt,
        stats: &StatsSnapshot,
    ) -> Option<String> {
        if self.json {
            return None;
        }
        match self.verbosity {
            Verbosity::Quiet => None,
            Verbosity::Normal => Some(format!("✓ {}", job.file_name())),
            Verbosity::Verbose => {
                let mut line = format!(
                    "[{}/{} {}%] {}",
                    stats.completed(),
                    stats.total,
                    stats.percent_complete(),
                    job.path.display()
                );
                if !job.subdir.is_empty() {
                    line.push_str(&format!(" → {}", job.subdir));
                }
                if let Some(message) = &receipt.message {
                    line.push_str(&format!(" ({})", message));
                }
                Some(line)
            }
        }
    }
}

/// Write `text` to stdout. A closed pipe must not take a worker down.
fn emit(text: &str) {
    let mut out = io::stdout().lock();
    if let Err(e) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
        debug!("stdout write failed: {}", e);
    }
}

impl ProgressCallback for CliProgress {
    fn on_session_started(&self, target: &Path, workers: usize) {
        if self.verbosity == Verbosity::Quiet || self.json {
            return;
        }
        if workers > 1 {
            emit(&format!("Uploading {} with {} workers...\n", target.display(), workers));
        } else {
            emit(&format!("Uploading {}...\n", target.display()));
        }
    }

    fn on_file_completed(
        &self,
        job: &UploadJob,
        outcome: &Result<UploadReceipt, UploadError>,
        stats: &StatsSnapshot,
    ) {
        // Failures are reported through tracing by the engine
        if let Ok(receipt) = outcome {
            if let Some(line) = self.completion_line(job, receipt, stats) {
                emit(&format!("{}\n", line));
            }
        }
    }

    fn on_session_completed(&self, summary: &UploadSummary) {
        if !self.json {
            emit(&format_summary(summary));
            return;
        }
        match serde_json::to_string_pretty(summary) {
            Ok(json) => emit(&format!("{}\n", json)),
            Err(e) => {
                warn!("Cannot encode summary as JSON: {}", e);
                emit(&format_summary(summary));
            }
        }
    }
}

/// The block printed at the end of every run, in every verbosity.
pub fn format_summary(summary: &UploadSummary) -> String {
    let mut out = String::new();
    out.push_str("\n=== Upload Summary ===\n");
    out.push_str(&format!("Files uploaded: {}\n", summary.succeeded));
    out.push_str(&format!("Files failed: {}\n", summary.failed));
    if summary.filtered > 0 {
        out.push_str(&format!("Files skipped: {}\n", summary.filtered));
    }
    if summary.total > 0 {
        out.push_str(&format!("Success rate: {:.1}%\n", summary.success_rate()));
    }
    out.push_str(&format!("Bytes uploaded: {}\n", format_bytes(summary.bytes_uploaded)));
    out.push_str(&format!(
        "Elapsed: {} ({}/s)\n",
        format_duration(summary.elapsed),
        format_bytes(summary.throughput() as u64)
    ));
    out.push_str(&format!(
        "Overall result: {}\n",
        if summary.is_success() {
            "SUCCESS"
        } else {
            "PARTIAL/FAILURE"
        }
    ));
    out
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_idx])
}

pub fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {}s", mins, secs)
    } else if elapsed.as_millis() < 1000 {
        format!("{}ms", elapsed.as_millis())
    } else {
        format!("{}s", secs)
    }
}
