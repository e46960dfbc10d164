//! # Uploader Engine - Parallel File Upload Library
//!
//! A headless engine that uploads files and directory trees to an HTTP
//! endpoint as multipart form posts. Designed as the foundation for the
//! command line tool and any other front end.
//!
//! ## Overview
//!
//! The engine provides:
//! - Recursive directory enumeration with a file name filter, include and
//!   exclude patterns and a depth limit
//! - A bounded job queue feeding a fixed pool of upload workers
//! - One reusable HTTP transport handle per worker
//! - Per-file error isolation and shared session statistics
//! - Progress reporting via callbacks (decoupled from UI technology)
//!
//! ## Basic Usage
//!
//! ```no_run
//! use engine::{HttpConnector, UploadSession, UploaderConfig};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = UploaderConfig {
//!     key: "secret".to_string(),
//!     ..UploaderConfig::default()
//! };
//! let connector = HttpConnector::new(&config);
//! let session = UploadSession::new(config, connector, None)?;
//!
//! let summary = session.run(Path::new("/srv/photos"), "holiday")?;
//! println!("{} uploaded, {} failed", summary.succeeded, summary.failed);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - **config**: Limits, defaults and session configuration
//! - **error**: Error types and handling
//! - **filter**: File name classifier
//! - **pattern**: Include and exclude wildcard patterns
//! - **model**: Upload jobs, receipts and dry-run plans
//! - **queue**: Bounded job queue
//! - **transport**: HTTP transport seam
//! - **executor**: Single upload attempt
//! - **pool**: Worker threads
//! - **walker**: Directory traversal
//! - **session**: Session orchestration and summary
//! - **stats**: Shared counters
//! - **response**: Server message extraction
//! - **progress**: Progress callback trait

pub mod config;
pub mod error;
pub mod executor;
pub mod filter;
pub mod model;
pub mod pattern;
pub mod pool;
pub mod progress;
pub mod queue;
pub mod response;
pub mod session;
pub mod stats;
pub mod transport;
pub mod walker;

// Re-export main types and functions
pub use config::{UploaderConfig, DEFAULT_MAX_DEPTH, MAX_FILE_SIZE, MAX_JOBS, MAX_PATH_LENGTH};
pub use error::{EngineError, UploadError};
pub use filter::should_upload;
pub use model::{display_name, PlannedUpload, UploadJob, UploadReceipt};
pub use pattern::PathPatterns;
pub use progress::ProgressCallback;
pub use response::extract_message;
pub use session::{UploadSession, UploadSummary};
pub use stats::{StatsSnapshot, UploadStats};
pub use transport::{Connector, HttpConnector, Transport};
