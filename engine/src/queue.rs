//! Bounded job queue with backpressure and close-once shutdown.
//!
//! The queue wraps a bounded crossbeam channel. The queue keeps the only
//! long-lived `Sender` in a slot; `request_shutdown` empties it, which is the
//! single close signal for every consumer. Consumers keep receiving queued
//! jobs after the close and only see "no more work" once the channel is both
//! closed and empty.
//!
//! Producers only send while holding the slot's read lock, so once
//! `request_shutdown` returns no further job can get in. Consumers register
//! through `ConsumerGuard`; when the last one goes away (normally or by
//! unwinding) the queue closes itself so a blocked producer is released.

use crate::error::UploadError;
use crate::model::UploadJob;
use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// How long a blocked producer waits before re-checking for shutdown.
const SHUTDOWN_POLL: Duration = Duration::from_millis(50);

/// Destination for jobs produced by the directory walker.
pub trait JobSink {
    /// Accept `job` or report why it was refused.
    fn submit(&self, job: UploadJob) -> Result<(), UploadError>;
}

/// FIFO of upload jobs with a fixed capacity.
pub struct JobQueue {
    sender: RwLock<Option<Sender<UploadJob>>>,
    receiver: Receiver<UploadJob>,
    capacity: usize,

    /// Number of registered consumers still alive
    consumers: AtomicUsize,
}

impl JobQueue {
    /// Create a queue holding at most `capacity` jobs (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded(capacity);
        Self {
            sender: RwLock::new(Some(sender)),
            receiver,
            capacity,
            consumers: AtomicUsize::new(0),
        }
    }

    /// Append `job`, blocking while the queue is full.
    ///
    /// Fails with `QueueRejected` if shutdown was requested before the job
    /// got in, including while this call was waiting for space.
    pub fn enqueue(&self, mut job: UploadJob) -> Result<(), UploadError> {
        loop {
            let slot = self.sender.read();
            let Some(sender) = slot.as_ref() else {
                return Err(UploadError::QueueRejected { path: job.path });
            };
            match sender.send_timeout(job, SHUTDOWN_POLL) {
                Ok(()) => return Ok(()),
                Err(SendTimeoutError::Timeout(pending)) => job = pending,
                Err(SendTimeoutError::Disconnected(pending)) => {
                    return Err(UploadError::QueueRejected { path: pending.path });
                }
            }
            // Release the read lock so a pending shutdown can take the slot
            drop(slot);
        }
    }

    /// Take the job at the head of the queue, blocking while it is empty.
    ///
    /// Returns `None` once shutdown was requested and every queued job has
    /// been handed out.
    pub fn dequeue(&self) -> Option<UploadJob> {
        self.receiver.recv().ok()
    }

    /// Stop accepting jobs and release every consumer once the backlog drains.
    ///
    /// Calling this more than once has no further effect.
    pub fn request_shutdown(&self) {
        if self.sender.write().take().is_some() {
            debug!(pending = self.receiver.len(), "job queue closed");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.sender.read().is_none()
    }

    /// Register a consumer. The queue closes when the last guard is dropped.
    pub fn register_consumer(self: &Arc<Self>) -> ConsumerGuard {
        self.consumers.fetch_add(1, Ordering::SeqCst);
        ConsumerGuard {
            queue: Arc::clone(self),
        }
    }

    /// Registered consumers that have not exited yet.
    pub fn consumers(&self) -> usize {
        self.consumers.load(Ordering::SeqCst)
    }

    /// Jobs currently waiting.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl JobSink for JobQueue {
    fn submit(&self, job: UploadJob) -> Result<(), UploadError> {
        self.enqueue(job)
    }
}

/// Keeps a consumer counted as alive; dropping it deregisters the consumer.
pub struct ConsumerGuard {
    queue: Arc<JobQueue>,
}

impl Drop for ConsumerGuard {
    fn drop(&mut self) {
        if self.queue.consumers.fetch_sub(1, Ordering::SeqCst) == 1 {
            if !self.queue.is_shut_down() {
                warn!(pending = self.queue.len(), "no consumers left, closing job queue");
            }
            self.queue.request_shutdown();
        }
    }
}
