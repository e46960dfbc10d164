//! Error types for the upload engine.
//!
//! Two layers of errors exist:
//! - `UploadError` describes why a single file was not uploaded. These are
//!   counted in the session statistics and never abort the run.
//! - `EngineError` describes why a session could not start or finish at all
//!   (missing target, broken configuration, transport initialisation failure,
//!   a worker thread that could not be spawned or panicked).

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a single file was not uploaded.
#[derive(Error, Debug)]
pub enum UploadError {
    /// File exceeds the per-file size ceiling; nothing was sent
    #[error("File {} is too large ({size} bytes, max {limit} bytes)", .path.display())]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    /// File could not be stat'ed or opened for reading
    #[error("Cannot read file {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Connection, timeout or protocol failure before a response arrived
    #[error("Upload failed for {}: {message}", .path.display())]
    Transport { path: PathBuf, message: String },

    /// Server answered with a status other than 200
    #[error("Server error for {}: HTTP {status}{}", .path.display(), server_detail(.message))]
    Server {
        path: PathBuf,
        status: u16,
        message: Option<String>,
    },

    /// The job queue was already shut down when the file was offered
    #[error("Upload queue is shutting down, {} was not queued", .path.display())]
    QueueRejected { path: PathBuf },

    /// Path exceeds the supported length
    #[error("Path too long: {}", .path.display())]
    PathTooLong { path: PathBuf },
}

fn server_detail(message: &Option<String>) -> String {
    match message {
        Some(msg) => format!(" ({})", msg),
        None => String::new(),
    }
}

impl UploadError {
    /// Path of the file this error refers to.
    pub fn path(&self) -> &Path {
        match self {
            Self::TooLarge { path, .. }
            | Self::Unreadable { path, .. }
            | Self::Transport { path, .. }
            | Self::Server { path, .. }
            | Self::QueueRejected { path }
            | Self::PathTooLong { path } => path.as_path(),
        }
    }
}

/// Errors that prevent a session from running.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Upload target does not exist
    #[error("Cannot access path '{}': no such file or directory", .path.display())]
    TargetNotFound { path: PathBuf },

    /// Upload target exists but cannot be stat'ed
    #[error("Cannot access path '{}': {source}", .path.display())]
    TargetAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Upload target is neither a regular file nor a directory
    #[error("'{}' is not a regular file or directory", .path.display())]
    InvalidTarget { path: PathBuf },

    /// Target path exceeds the supported length
    #[error("Path exceeds maximum length of {limit} bytes: {}", .path.display())]
    PathTooLong { path: PathBuf, limit: usize },

    /// Top-level directory could not be listed
    #[error("Cannot open directory {}: {source}", .path.display())]
    Enumeration {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Include or exclude pattern that cannot be compiled
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// HTTP client could not be built
    #[error("Failed to initialize HTTP transport: {0}")]
    TransportInit(String),

    /// Worker thread could not be started
    #[error("Failed to spawn upload worker {id}: {source}")]
    WorkerSpawn {
        id: usize,
        #[source]
        source: io::Error,
    },

    /// Worker thread panicked before draining the queue
    #[error("Upload worker {id} panicked")]
    WorkerPanicked { id: usize },
}
