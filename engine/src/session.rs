//! Upload session orchestration.
//!
//! This module ties the pipeline together:
//! - Validating the target path
//! - Uploading a single file directly, without queue or workers
//! - Running the queue, worker pool and directory walker for a directory
//! - Planning a dry run without touching the network
//! - Summarising the session

use crate::config::{UploaderConfig, MAX_PATH_LENGTH};
use crate::error::EngineError;
use crate::executor::Uploader;
use crate::model::{PlannedUpload, UploadJob};
use crate::pool::WorkerPool;
use crate::progress::ProgressCallback;
use crate::queue::JobQueue;
use crate::stats::UploadStats;
use crate::transport::Connector;
use crate::walker::{walk, PlanCollector, WalkOptions};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Final report of an upload session.
#[derive(Debug, Clone, Serialize)]
pub struct UploadSummary {
    /// Unique identifier for this session
    pub session_id: Uuid,

    /// File or directory that was uploaded
    pub target: PathBuf,

    /// When the session started
    pub started_at: DateTime<Local>,

    /// Wall time from start to the last worker exiting
    pub elapsed: Duration,

    /// Files uploaded successfully
    pub succeeded: u64,

    /// Files whose upload failed
    pub failed: u64,

    /// Files skipped by the name filter or the include/exclude patterns
    pub filtered: u64,

    /// Files queued for upload
    pub total: u64,

    /// Bytes uploaded successfully
    pub bytes_uploaded: u64,

    /// Number of workers used (1 for a single file)
    pub workers: usize,

    /// False if the target directory could not be listed
    pub target_ok: bool,
}

impl UploadSummary {
    /// True if the target was processed and no upload failed.
    pub fn is_success(&self) -> bool {
        self.target_ok && self.failed == 0
    }

    /// Percentage of queued files that were uploaded.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.succeeded as f64 / self.total as f64 * 100.0
    }

    /// Average upload speed in bytes per second.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.bytes_uploaded as f64 / secs
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetKind {
    File,
    Directory,
}

/// Validate `target` and tell whether it is a file or a directory.
fn inspect_target(target: &Path) -> Result<TargetKind, EngineError> {
    if target.as_os_str().len() > MAX_PATH_LENGTH {
        return Err(EngineError::PathTooLong {
            path: target.to_path_buf(),
            limit: MAX_PATH_LENGTH,
        });
    }

    let metadata = match fs::metadata(target) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(EngineError::TargetNotFound {
                path: target.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(EngineError::TargetAccess {
                path: target.to_path_buf(),
                source: e,
            });
        }
    };

    if metadata.is_dir() {
        Ok(TargetKind::Directory)
    } else if metadata.is_file() {
        Ok(TargetKind::File)
    } else {
        Err(EngineError::InvalidTarget {
            path: target.to_path_buf(),
        })
    }
}

/// One upload run against a configured endpoint.
pub struct UploadSession<C: Connector> {
    id: Uuid,
    config: UploaderConfig,
    connector: C,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl<C: Connector> UploadSession<C> {
    /// Create a session after validating `config`.
    pub fn new(
        config: UploaderConfig,
        connector: C,
        progress: Option<Arc<dyn ProgressCallback>>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            config,
            connector,
            progress,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &UploaderConfig {
        &self.config
    }

    /// Upload `target` into the server-side `subdir`.
    ///
    /// A single file is uploaded directly. A directory is walked recursively
    /// while `config.jobs` workers upload in parallel. Per-file failures are
    /// reported in the summary, not as errors.
    ///
    /// # Errors
    /// Returns `EngineError` if the target is missing or unusable, a transport
    /// handle cannot be created, or a worker cannot be started or panics.
    pub fn run(&self, target: &Path, subdir: &str) -> Result<UploadSummary, EngineError> {
        let kind = inspect_target(target)?;
        let stats = Arc::new(UploadStats::new());
        let uploader = Arc::new(Uploader::new(
            self.config.url_with_key(),
            Arc::clone(&stats),
            self.progress.clone(),
        ));

        info!(session = %self.id, target = %target.display(), "upload session started");

        let (workers, target_ok) = match kind {
            TargetKind::File => {
                self.notify_started(target, 1);
                let mut handle = self.connector.connect()?;
                stats.set_total(1);
                if let Err(e) = uploader.attempt(&UploadJob::new(target, subdir), &mut handle) {
                    debug!(path = %e.path().display(), "attempt recorded as failed");
                }
                (1, true)
            }
            TargetKind::Directory => {
                self.notify_started(target, self.config.jobs);
                let target_ok = self.upload_directory(target, subdir, &stats, uploader)?;
                (self.config.jobs, target_ok)
            }
        };

        let summary = summarize(self.id, target, &stats, workers, target_ok);
        info!(
            session = %self.id,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "upload session finished"
        );
        if let Some(progress) = &self.progress {
            progress.on_session_completed(&summary);
        }
        Ok(summary)
    }

    /// Run the queue, workers and walker for a directory target.
    ///
    /// Returns false if the directory itself could not be listed.
    fn upload_directory(
        &self,
        target: &Path,
        subdir: &str,
        stats: &Arc<UploadStats>,
        uploader: Arc<Uploader>,
    ) -> Result<bool, EngineError> {
        let options = WalkOptions::from_config(&self.config)?;

        // Handles are created up front so a broken transport fails before any work is queued
        let handles = (0..self.config.jobs)
            .map(|_| self.connector.connect())
            .collect::<Result<Vec<_>, _>>()?;

        let queue = Arc::new(JobQueue::new(self.config.queue_capacity));
        let pool = WorkerPool::spawn(handles, Arc::clone(&queue), uploader)?;

        debug!("Uploading directory: {}", target.display());
        let walked = walk(target, subdir, &options, queue.as_ref(), stats);
        queue.request_shutdown();

        let target_ok = match walked {
            Ok(enqueued) => {
                stats.set_total(enqueued as u64);
                true
            }
            Err(e) => {
                error!("{}", e);
                false
            }
        };

        pool.join()?;
        Ok(target_ok)
    }

    /// List what `run` would upload, without creating any transport handle.
    pub fn plan(&self, target: &Path, subdir: &str) -> Result<Vec<PlannedUpload>, EngineError> {
        match inspect_target(target)? {
            TargetKind::File => {
                let size = fs::metadata(target).map(|m| m.len()).unwrap_or(0);
                Ok(vec![PlannedUpload {
                    job: UploadJob::new(target, subdir),
                    size,
                }])
            }
            TargetKind::Directory => {
                let options = WalkOptions::from_config(&self.config)?;
                let collector = PlanCollector::new();
                walk(target, subdir, &options, &collector, &UploadStats::new())?;
                Ok(collector.into_plan())
            }
        }
    }

    fn notify_started(&self, target: &Path, workers: usize) {
        if let Some(progress) = &self.progress {
            progress.on_session_started(target, workers);
        }
    }
}

fn summarize(
    session_id: Uuid,
    target: &Path,
    stats: &UploadStats,
    workers: usize,
    target_ok: bool,
) -> UploadSummary {
    let snapshot = stats.snapshot();
    UploadSummary {
        session_id,
        target: target.to_path_buf(),
        started_at: stats.started_at(),
        elapsed: stats.elapsed(),
        succeeded: snapshot.succeeded,
        failed: snapshot.failed,
        filtered: snapshot.filtered,
        total: snapshot.total,
        bytes_uploaded: snapshot.bytes_uploaded,
        workers,
        target_ok,
    }
}
