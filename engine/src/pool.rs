//! Upload worker threads.
//!
//! Each worker:
//! - Owns exactly one transport handle for its whole lifetime
//! - Pulls jobs from the shared queue until it reports "no more work"
//! - Hands every job to the shared `Uploader`
//! - Drops its handle when it exits
//! - Stays registered as a queue consumer until it exits or unwinds

use crate::error::EngineError;
use crate::executor::Uploader;
use crate::queue::JobQueue;
use crate::transport::Transport;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// A single upload worker thread.
struct Worker {
    id: usize,
    handle: JoinHandle<usize>,
}

/// Fixed-size set of upload workers sharing one queue.
pub struct WorkerPool {
    workers: Vec<Worker>,
}

impl WorkerPool {
    /// Start one worker per transport handle.
    ///
    /// If a thread cannot be spawned the queue is shut down so the workers
    /// already running can exit, and the error is returned.
    pub fn spawn<T>(
        handles: Vec<T>,
        queue: Arc<JobQueue>,
        uploader: Arc<Uploader>,
    ) -> Result<Self, EngineError>
    where
        T: Transport + Send + 'static,
    {
        let mut workers = Vec::with_capacity(handles.len());
        for (id, transport) in handles.into_iter().enumerate() {
            let consumer = queue.register_consumer();
            let queue_for_worker = Arc::clone(&queue);
            let uploader = Arc::clone(&uploader);
            let spawned = thread::Builder::new()
                .name(format!("uploader-{}", id))
                .spawn(move || {
                    let _consumer = consumer;
                    worker_loop(id, transport, &queue_for_worker, &uploader)
                });

            match spawned {
                Ok(handle) => workers.push(Worker { id, handle }),
                Err(e) => {
                    queue.request_shutdown();
                    let pool = Self { workers };
                    if let Err(join_err) = pool.join() {
                        warn!(error = %join_err, "worker failed while aborting pool");
                    }
                    return Err(EngineError::WorkerSpawn { id, source: e });
                }
            }
        }
        debug!(count = workers.len(), "upload workers spawned");
        Ok(Self { workers })
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Wait for every worker to exit.
    ///
    /// Returns the number of jobs each worker processed, indexed by worker
    /// id. Every worker is joined even if one of them panicked; the first
    /// panic is reported afterwards.
    pub fn join(self) -> Result<Vec<usize>, EngineError> {
        let mut processed = Vec::with_capacity(self.workers.len());
        let mut first_panic = None;
        for worker in self.workers {
            match worker.handle.join() {
                Ok(count) => processed.push(count),
                Err(_) => {
                    warn!(id = worker.id, "upload worker panicked");
                    processed.push(0);
                    first_panic.get_or_insert(worker.id);
                }
            }
        }
        match first_panic {
            Some(id) => Err(EngineError::WorkerPanicked { id }),
            None => Ok(processed),
        }
    }
}

fn worker_loop<T: Transport>(id: usize, mut transport: T, queue: &JobQueue, uploader: &Uploader) -> usize {
    debug!(id, "worker started");
    let mut processed = 0;
    while let Some(job) = queue.dequeue() {
        if let Err(e) = uploader.attempt(&job, &mut transport) {
            debug!(id, path = %e.path().display(), "attempt recorded as failed");
        }
        processed += 1;
    }
    debug!(id, processed, "worker finished");
    processed
}
