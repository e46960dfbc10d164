//! Progress reporting trait.
//!
//! This module defines the ProgressCallback trait, which decouples the upload
//! engine from any specific output technology. The CLI implements it to print
//! per-file notices and the final summary.

use crate::error::UploadError;
use crate::model::{UploadJob, UploadReceipt};
use crate::session::UploadSummary;
use crate::stats::StatsSnapshot;
use std::path::Path;

/// Trait for receiving progress updates from an upload session.
///
/// `on_file_completed` is called from worker threads, concurrently and in
/// no particular order, so implementations must be `Send + Sync` and must
/// not assume completions arrive in enqueue order.
pub trait ProgressCallback: Send + Sync {
    /// Called once the target has been validated, before any upload.
    ///
    /// `workers` is 1 for a single-file target.
    fn on_session_started(&self, target: &Path, workers: usize);

    /// Called after every upload attempt, successful or not.
    ///
    /// `stats` reflects the counters right after this attempt was recorded.
    fn on_file_completed(
        &self,
        job: &UploadJob,
        outcome: &Result<UploadReceipt, UploadError>,
        stats: &StatsSnapshot,
    );

    /// Called when every worker has finished.
    fn on_session_completed(&self, summary: &UploadSummary);
}
