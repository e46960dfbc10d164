//! Single upload attempts.
//!
//! `Uploader` is shared by every worker. It holds the resolved endpoint, the
//! session statistics and the optional progress callback; the transport
//! handle is supplied by the calling worker on every attempt.

use crate::config::MAX_FILE_SIZE;
use crate::error::UploadError;
use crate::model::{UploadJob, UploadReceipt};
use crate::progress::ProgressCallback;
use crate::response::extract_message;
use crate::stats::UploadStats;
use crate::transport::{Transport, TransportError, UploadRequest};
use std::fs;
use std::sync::Arc;
use tracing::{debug, error};

/// Performs upload attempts and records their outcome.
pub struct Uploader {
    url: String,
    stats: Arc<UploadStats>,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl Uploader {
    /// `url` must already carry the `key` parameter.
    pub fn new(
        url: String,
        stats: Arc<UploadStats>,
        progress: Option<Arc<dyn ProgressCallback>>,
    ) -> Self {
        Self {
            url,
            stats,
            progress,
        }
    }

    pub fn stats(&self) -> &Arc<UploadStats> {
        &self.stats
    }

    /// Upload `job` once through `handle`.
    ///
    /// Statistics are updated exactly once and the progress callback is
    /// notified whatever the outcome.
    pub fn attempt<T: Transport>(
        &self,
        job: &UploadJob,
        handle: &mut T,
    ) -> Result<UploadReceipt, UploadError> {
        let outcome = self.send(job, handle);

        let snapshot = match &outcome {
            Ok(receipt) => {
                debug!(
                    path = %job.path.display(),
                    subdir = %job.subdir,
                    bytes = receipt.bytes,
                    message = receipt.message.as_deref().unwrap_or(""),
                    "uploaded"
                );
                self.stats.record_success(receipt.bytes)
            }
            Err(e) => {
                error!("{}", e);
                self.stats.record_failure()
            }
        };

        if let Some(progress) = &self.progress {
            progress.on_file_completed(job, &outcome, &snapshot);
        }
        outcome
    }

    fn send<T: Transport>(
        &self,
        job: &UploadJob,
        handle: &mut T,
    ) -> Result<UploadReceipt, UploadError> {
        let metadata = fs::metadata(&job.path).map_err(|e| UploadError::Unreadable {
            path: job.path.clone(),
            source: e,
        })?;

        let size = metadata.len();
        if size > MAX_FILE_SIZE {
            return Err(UploadError::TooLarge {
                path: job.path.clone(),
                size,
                limit: MAX_FILE_SIZE,
            });
        }

        // Readability check before any network activity
        fs::File::open(&job.path).map_err(|e| UploadError::Unreadable {
            path: job.path.clone(),
            source: e,
        })?;

        let file_name = job.file_name();
        debug!(path = %job.path.display(), subdir = %job.subdir, "uploading");

        let request = UploadRequest {
            url: &self.url,
            path: &job.path,
            file_name: &file_name,
            subdir: &job.subdir,
        };
        let response = handle.submit(&request).map_err(|e| match e {
            TransportError::File(source) => UploadError::Unreadable {
                path: job.path.clone(),
                source,
            },
            TransportError::Http(message) => UploadError::Transport {
                path: job.path.clone(),
                message,
            },
        })?;

        if response.status != 200 {
            debug!(status = response.status, body = %response.body, "server rejected upload");
            return Err(UploadError::Server {
                path: job.path.clone(),
                status: response.status,
                message: extract_message(&response.body),
            });
        }

        Ok(UploadReceipt {
            bytes: size,
            message: extract_message(&response.body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatsSnapshot;
    use crate::transport::mock::MockConnector;
    use crate::transport::Connector;
    use parking_lot::Mutex;
    use std::fs::File;
    use std::path::Path;

    struct RecordingProgress {
        outcomes: Mutex<Vec<Result<UploadReceipt, String>>>,
    }

    impl RecordingProgress {
        fn new() -> Self {
            Self {
                outcomes: Mutex::new(Vec::new()),
            }
        }
    }

    impl ProgressCallback for RecordingProgress {
        fn on_session_started(&self, _target: &Path, _jobs: usize) {}

        fn on_file_completed(
            &self,
            _job: &UploadJob,
            outcome: &Result<UploadReceipt, UploadError>,
            _stats: &StatsSnapshot,
        ) {
            let recorded = match outcome {
                Ok(receipt) => Ok(receipt.clone()),
                Err(e) => Err(e.to_string()),
            };
            self.outcomes.lock().push(recorded);
        }

        fn on_session_completed(&self, _summary: &crate::session::UploadSummary) {}
    }

    fn uploader_with(progress: Option<Arc<dyn ProgressCallback>>) -> Uploader {
        Uploader::new(
            "http://localhost/upload.php?key=secret".to_string(),
            Arc::new(UploadStats::new()),
            progress,
        )
    }

    #[test]
    fn test_attempt_success_records_bytes() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("a.txt");
        std::fs::write(&path, "12345").expect("Failed to write file");

        let connector = MockConnector::ok();
        let mut handle = connector.connect().expect("Failed to connect");
        let uploader = uploader_with(None);

        let receipt = uploader
            .attempt(&UploadJob::new(path, "docs"), &mut handle)
            .expect("Upload should succeed");

        assert_eq!(receipt.bytes, 5);
        assert_eq!(receipt.message, None);
        let snap = uploader.stats().snapshot();
        assert_eq!(snap.succeeded, 1);
        assert_eq!(snap.failed, 0);
        assert_eq!(snap.bytes_uploaded, 5);

        let requests = connector.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].file_name, "a.txt");
        assert_eq!(requests[0].subdir, "docs");
        assert!(requests[0].url.ends_with("?key=secret"));
    }

    #[test]
    fn test_attempt_server_error_extracts_message() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("a.txt");
        std::fs::write(&path, "data").expect("Failed to write file");

        let connector = MockConnector::responding(500, r#"{"message":"disk full"}"#);
        let mut handle = connector.connect().expect("Failed to connect");
        let progress = Arc::new(RecordingProgress::new());
        let callback: Arc<dyn ProgressCallback> = progress.clone();
        let uploader = uploader_with(Some(callback));

        let err = uploader
            .attempt(&UploadJob::new(path, ""), &mut handle)
            .expect_err("Upload should fail");

        match &err {
            UploadError::Server {
                status, message, ..
            } => {
                assert_eq!(*status, 500);
                assert_eq!(message.as_deref(), Some("disk full"));
            }
            other => panic!("Unexpected error: {:?}", other),
        }
        assert!(err.to_string().contains("disk full"));
        assert_eq!(uploader.stats().snapshot().failed, 1);

        let outcomes = progress.outcomes.lock();
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].as_ref().unwrap_err().contains("disk full"));
    }

    #[test]
    fn test_success_carries_server_message() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("a.txt");
        std::fs::write(&path, "data").expect("Failed to write file");

        let connector =
            MockConnector::responding(200, r#"{"success":true,"message":"stored as a.txt"}"#);
        let mut handle = connector.connect().expect("Failed to connect");
        let progress = Arc::new(RecordingProgress::new());
        let callback: Arc<dyn ProgressCallback> = progress.clone();
        let uploader = uploader_with(Some(callback));

        let receipt = uploader
            .attempt(&UploadJob::new(path, ""), &mut handle)
            .expect("Upload should succeed");

        assert_eq!(receipt.bytes, 4);
        assert_eq!(receipt.message.as_deref(), Some("stored as a.txt"));
        let outcomes = progress.outcomes.lock();
        assert_eq!(outcomes.len(), 1);
        let recorded = outcomes[0].as_ref().expect("Outcome should be a success");
        assert_eq!(recorded, &receipt);
    }

    #[test]
    fn test_non_200_success_codes_are_failures() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("a.txt");
        std::fs::write(&path, "data").expect("Failed to write file");

        let connector = MockConnector::responding(201, "created");
        let mut handle = connector.connect().expect("Failed to connect");
        let uploader = uploader_with(None);

        let result = uploader.attempt(&UploadJob::new(path, ""), &mut handle);
        assert!(matches!(
            result,
            Err(UploadError::Server {
                status: 201,
                message: None,
                ..
            })
        ));
    }

    #[test]
    fn test_too_large_file_is_never_sent() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("big.bin");
        let file = File::create(&path).expect("Failed to create file");
        file.set_len(MAX_FILE_SIZE + 1).expect("Failed to extend file");
        drop(file);

        let connector = MockConnector::ok();
        let mut handle = connector.connect().expect("Failed to connect");
        let uploader = uploader_with(None);

        let result = uploader.attempt(&UploadJob::new(path, ""), &mut handle);
        assert!(matches!(result, Err(UploadError::TooLarge { .. })));
        assert_eq!(connector.calls(), 0);
        assert_eq!(uploader.stats().snapshot().failed, 1);
    }

    #[test]
    fn test_file_at_size_limit_is_sent() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("edge.bin");
        let file = File::create(&path).expect("Failed to create file");
        file.set_len(MAX_FILE_SIZE).expect("Failed to extend file");
        drop(file);

        let connector = MockConnector::ok();
        let mut handle = connector.connect().expect("Failed to connect");
        let uploader = uploader_with(None);

        let result = uploader.attempt(&UploadJob::new(path, ""), &mut handle);
        assert_eq!(result.expect("Upload should succeed").bytes, MAX_FILE_SIZE);
        assert_eq!(connector.calls(), 1);
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("gone.txt");

        let connector = MockConnector::ok();
        let mut handle = connector.connect().expect("Failed to connect");
        let uploader = uploader_with(None);

        let result = uploader.attempt(&UploadJob::new(path, ""), &mut handle);
        assert!(matches!(result, Err(UploadError::Unreadable { .. })));
        assert_eq!(connector.calls(), 0);
        assert_eq!(uploader.stats().snapshot().failed, 1);
    }

    #[test]
    fn test_transport_failure_is_counted_once() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("a.txt");
        std::fs::write(&path, "data").expect("Failed to write file");

        let connector = MockConnector::unreachable();
        let mut handle = connector.connect().expect("Failed to connect");
        let uploader = uploader_with(None);

        let result = uploader.attempt(&UploadJob::new(path, ""), &mut handle);
        assert!(matches!(result, Err(UploadError::Transport { .. })));
        assert_eq!(connector.calls(), 1);

        let snap = uploader.stats().snapshot();
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.succeeded, 0);
    }
}
