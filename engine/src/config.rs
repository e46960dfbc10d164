//! Session configuration.
//!
//! The CLI resolves files, environment and flags into an `UploaderConfig`;
//! the engine only sees the validated result.

use crate::error::EngineError;
use crate::pattern::PathPatterns;
use std::time::Duration;

/// Endpoint used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost/upload.php";

/// Largest file that will be sent (100 MiB).
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Longest local path accepted, in bytes.
pub const MAX_PATH_LENGTH: usize = 4096;

/// Default number of concurrent upload workers.
pub const DEFAULT_JOBS: usize = 4;

/// Upper bound for the worker pool size.
pub const MAX_JOBS: usize = 32;

/// Default number of jobs that may wait in the queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Redirect hops followed per request.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Deepest directory level walked below the target (the target is level 0).
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Everything a session needs to know about where and how to upload.
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    /// Upload endpoint, without the key parameter
    pub endpoint: String,

    /// Pre-shared secret appended as `key=<secret>`
    pub key: String,

    /// Number of upload workers for directory targets
    pub jobs: usize,

    /// Maximum number of queued, not yet dequeued jobs
    pub queue_capacity: usize,

    /// Timeout for a whole request, including the body upload
    pub timeout: Duration,

    /// Maximum redirect hops
    pub max_redirects: usize,

    /// Value of the `User-Agent` header
    pub user_agent: String,

    /// Directories nested deeper than this below the target are not walked
    pub max_depth: usize,

    /// Wildcard patterns a walked file must match (empty = everything)
    pub include: Vec<String>,

    /// Wildcard patterns that exclude a walked file
    pub exclude: Vec<String>,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_API_URL.to_string(),
            key: String::new(),
            jobs: DEFAULT_JOBS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            timeout: DEFAULT_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: format!("file-uploader/{}", env!("CARGO_PKG_VERSION")),
            max_depth: DEFAULT_MAX_DEPTH,
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

impl UploaderConfig {
    /// Check the settings before any thread or connection is created.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.key.is_empty() {
            return Err(EngineError::InvalidConfig(
                "secret key is not set".to_string(),
            ));
        }
        if let Err(e) = reqwest::Url::parse(&self.endpoint) {
            return Err(EngineError::InvalidConfig(format!(
                "invalid upload URL '{}': {}",
                self.endpoint, e
            )));
        }
        if self.jobs == 0 || self.jobs > MAX_JOBS {
            return Err(EngineError::InvalidConfig(format!(
                "jobs must be between 1 and {}, got {}",
                MAX_JOBS, self.jobs
            )));
        }
        if self.queue_capacity == 0 {
            return Err(EngineError::InvalidConfig(
                "queue capacity must be at least 1".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(EngineError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        self.patterns()?;
        Ok(())
    }

    /// Compiled include and exclude lists.
    pub fn patterns(&self) -> Result<PathPatterns, EngineError> {
        PathPatterns::compile(&self.include, &self.exclude)
    }

    /// Endpoint with the secret key appended as a query parameter.
    pub fn url_with_key(&self) -> String {
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        format!("{}{}key={}", self.endpoint, separator, self.key)
    }
}
