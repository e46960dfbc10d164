//! Shared upload statistics.
//!
//! One `UploadStats` exists per session and is shared through an `Arc` by the
//! walker, every worker and the coordinator. All counters live behind a
//! single lock so a snapshot is always internally consistent.

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use serde::Serialize;
use std::time::{Duration, Instant};

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    succeeded: u64,
    failed: u64,
    filtered: u64,
    total: u64,
    bytes_uploaded: u64,
}

/// Aggregate counters for one upload session.
#[derive(Debug)]
pub struct UploadStats {
    counters: Mutex<Counters>,
    started_at: DateTime<Local>,
    started: Instant,
}

/// Point-in-time copy of the session counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Files uploaded with HTTP 200
    pub succeeded: u64,
    /// Files whose upload attempt failed
    pub failed: u64,
    /// Files skipped by the name filter or the include/exclude patterns
    pub filtered: u64,
    /// Files queued for upload so far
    pub total: u64,
    /// Sum of the sizes of successfully uploaded files
    pub bytes_uploaded: u64,
}

impl StatsSnapshot {
    /// Attempts that have finished, successful or not.
    pub fn completed(&self) -> u64 {
        self.succeeded + self.failed
    }

    /// Completion percentage against the currently known total.
    pub fn percent_complete(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed() as f64 / self.total as f64) * 100.0).min(100.0) as u32
    }
}

impl Default for UploadStats {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadStats {
    /// Start a new set of counters; the start time is taken now.
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(Counters::default()),
            started_at: Local::now(),
            started: Instant::now(),
        }
    }

    pub fn record_success(&self, bytes: u64) -> StatsSnapshot {
        let mut counters = self.counters.lock();
        counters.succeeded += 1;
        counters.bytes_uploaded += bytes;
        snapshot_of(&counters)
    }

    pub fn record_failure(&self) -> StatsSnapshot {
        let mut counters = self.counters.lock();
        counters.failed += 1;
        snapshot_of(&counters)
    }

    pub fn record_filtered(&self) {
        self.counters.lock().filtered += 1;
    }

    /// Count one more file accepted into the upload pipeline.
    pub fn record_discovered(&self) {
        self.counters.lock().total += 1;
    }

    /// Overwrite the expected total once enumeration has finished.
    pub fn set_total(&self, total: u64) {
        self.counters.lock().total = total;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        snapshot_of(&self.counters.lock())
    }

    /// Wall-clock time the session started.
    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

fn snapshot_of(counters: &Counters) -> StatsSnapshot {
    StatsSnapshot {
        succeeded: counters.succeeded,
        failed: counters.failed,
        filtered: counters.filtered,
        total: counters.total,
        bytes_uploaded: counters.bytes_uploaded,
    }
}
