//! Directory traversal and job production.
//!
//! The walker runs on the coordinator thread and feeds a `JobSink` while the
//! workers are already consuming. Problems with individual entries are
//! logged and skipped; only an unreadable root directory is an error.

use crate::config::{UploaderConfig, DEFAULT_MAX_DEPTH, MAX_PATH_LENGTH};
use crate::error::{EngineError, UploadError};
use crate::filter::should_upload;
use crate::model::{PlannedUpload, UploadJob};
use crate::pattern::PathPatterns;
use crate::queue::JobSink;
use crate::stats::UploadStats;
use parking_lot::Mutex;
use std::fs::{self, ReadDir};
use std::path::{Component, Path};
use tracing::{debug, warn};

/// Limits applied while walking a directory tree.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Deepest directory level entered; the root is level 0
    pub max_depth: usize,

    /// Include and exclude lists checked after the name filter
    pub patterns: PathPatterns,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            patterns: PathPatterns::default(),
        }
    }
}

impl WalkOptions {
    pub fn from_config(config: &UploaderConfig) -> Result<Self, EngineError> {
        Ok(Self {
            max_depth: config.max_depth,
            patterns: config.patterns()?,
        })
    }
}

/// Recursively offer every eligible regular file under `root` to `sink`.
///
/// Files found directly in a directory are tagged with that directory's
/// logical prefix: `subdir_prefix` for the root, `subdir_prefix/name` for a
/// child directory `name`, and so on. Returns the number of jobs the sink
/// accepted.
///
/// # Errors
/// Returns `EngineError::Enumeration` if `root` itself cannot be listed.
pub fn walk<S: JobSink + ?Sized>(
    root: &Path,
    subdir_prefix: &str,
    options: &WalkOptions,
    sink: &S,
    stats: &UploadStats,
) -> Result<usize, EngineError> {
    let entries = fs::read_dir(root).map_err(|e| EngineError::Enumeration {
        path: root.to_path_buf(),
        source: e,
    })?;
    let walker = Walker {
        root,
        options,
        sink,
        stats,
    };
    Ok(walker.entries(root, entries, subdir_prefix, 0))
}

struct Walker<'a, S: ?Sized> {
    root: &'a Path,
    options: &'a WalkOptions,
    sink: &'a S,
    stats: &'a UploadStats,
}

impl<S: JobSink + ?Sized> Walker<'_, S> {
    fn dir(&self, dir: &Path, prefix: &str, depth: usize) -> usize {
        if depth > self.options.max_depth {
            debug!(
                "Skipping {} (deeper than {} levels)",
                dir.display(),
                self.options.max_depth
            );
            return 0;
        }
        match fs::read_dir(dir) {
            Ok(entries) => self.entries(dir, entries, prefix, depth),
            Err(e) => {
                warn!("Cannot open directory {}: {}", dir.display(), e);
                0
            }
        }
    }

    fn entries(&self, dir: &Path, entries: ReadDir, prefix: &str, depth: usize) -> usize {
        debug!("Scanning directory: {}", dir.display());
        let mut enqueued = 0;

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Cannot read entry in {}: {}", dir.display(), e);
                    continue;
                }
            };

            let path = entry.path();
            if path.as_os_str().len() > MAX_PATH_LENGTH {
                warn!("{}", UploadError::PathTooLong { path });
                continue;
            }

            // Follows symlinks, like stat(2)
            let metadata = match fs::metadata(&path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!("Cannot stat {}: {}", path.display(), e);
                    continue;
                }
            };

            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();

            if metadata.is_dir() {
                let child_prefix = if prefix.is_empty() {
                    name.to_string()
                } else {
                    format!("{}/{}", prefix, name)
                };
                enqueued += self.dir(&path, &child_prefix, depth + 1);
            } else if metadata.is_file() {
                if !should_upload(&name) {
                    debug!("Skipping {} (filtered)", path.display());
                    self.stats.record_filtered();
                    continue;
                }
                let patterns = &self.options.patterns;
                if !patterns.is_empty() && !patterns.allows(&relative_key(self.root, &path)) {
                    debug!("Skipping {} (pattern)", path.display());
                    self.stats.record_filtered();
                    continue;
                }
                match self.sink.submit(UploadJob::new(path, prefix)) {
                    Ok(()) => {
                        self.stats.record_discovered();
                        enqueued += 1;
                    }
                    Err(e) => warn!("{}", e),
                }
            }
        }

        enqueued
    }
}

/// `path` relative to `root`, `/`-separated.
fn relative_key(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let parts: Vec<_> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();
    parts.join("/")
}

/// Sink that records jobs instead of uploading them (dry runs).
#[derive(Default)]
pub struct PlanCollector {
    planned: Mutex<Vec<PlannedUpload>>,
}

impl PlanCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_plan(self) -> Vec<PlannedUpload> {
        self.planned.into_inner()
    }
}

impl JobSink for PlanCollector {
    fn submit(&self, job: UploadJob) -> Result<(), crate::error::UploadError> {
        let size = fs::metadata(&job.path).map(|m| m.len()).unwrap_or(0);
        self.planned.lock().push(PlannedUpload { job, size });
        Ok(())
    }
}
