//! Core data model for upload sessions.
//!
//! - UploadJob: one file to upload together with its server-side subdirectory
//! - UploadReceipt: what a successful upload reports back
//! - PlannedUpload: what a dry run reports for one job

use serde::Serialize;
use std::path::{Path, PathBuf};

/// A single file waiting to be uploaded.
///
/// Jobs are created by the directory walker (or the coordinator for a single
/// file target), moved through the queue and consumed by exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadJob {
    /// Local path of the file
    pub path: PathBuf,

    /// Logical destination subdirectory on the server (may be empty)
    pub subdir: String,
}

impl UploadJob {
    pub fn new(path: impl Into<PathBuf>, subdir: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            subdir: subdir.into(),
        }
    }

    /// Base name announced to the server as the uploaded file name.
    pub fn file_name(&self) -> String {
        display_name(&self.path)
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    /// Size of the uploaded file in bytes
    pub bytes: u64,

    /// `"message"` field of the server's response, if any
    pub message: Option<String>,
}

/// One entry of a dry-run plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedUpload {
    pub job: UploadJob,

    /// Size in bytes at planning time
    pub size: u64,
}

/// Base name of `path`, falling back to the whole path when it has none.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_is_base_name() {
        let job = UploadJob::new("/data/reports/q1.pdf", "reports");
        assert_eq!(job.file_name(), "q1.pdf");
        assert_eq!(job.subdir, "reports");
    }

    #[test]
    fn test_display_name_without_file_name() {
        assert_eq!(display_name(Path::new("/")), "/");
    }
}
