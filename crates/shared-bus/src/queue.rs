//! # Job Queue
//!
//! Bounded mpsc transport for background work, deduplicated by job id while
//! a job with that id is queued or running.

use crate::dedup::InFlightSet;
use crate::DEFAULT_QUEUE_CAPACITY;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

/// A unit of queued work.
pub trait Job: Send + 'static {
    /// Deterministic id; jobs with equal ids are folded while in flight.
    fn job_id(&self) -> String;
}

/// Errors from queue operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The consumer side was dropped.
    #[error("Job queue closed")]
    Closed,

    /// The queue is at capacity (only from `try_enqueue`).
    #[error("Job queue full")]
    Full,
}

/// Result of submitting a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Enqueued,
    /// A job with the same id is already in flight.
    Duplicate,
}

/// Producer handle. Cheap to clone.
pub struct JobQueue<J: Job> {
    sender: mpsc::Sender<J>,
    in_flight: Arc<Mutex<InFlightSet>>,
}

impl<J: Job> Clone for JobQueue<J> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            in_flight: self.in_flight.clone(),
        }
    }
}

/// Consumer handle.
pub struct JobReceiver<J: Job> {
    receiver: mpsc::Receiver<J>,
    in_flight: Arc<Mutex<InFlightSet>>,
}

/// Create a queue with the default capacity and dedup window.
#[must_use]
pub fn job_queue<J: Job>() -> (JobQueue<J>, JobReceiver<J>) {
    JobQueue::with_config(DEFAULT_QUEUE_CAPACITY, InFlightSet::DEFAULT_VALIDITY_WINDOW)
}

impl<J: Job> JobQueue<J> {
    #[must_use]
    pub fn with_config(capacity: usize, dedup_window: Duration) -> (Self, JobReceiver<J>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let in_flight = Arc::new(Mutex::new(InFlightSet::with_config(
            dedup_window,
            InFlightSet::DEFAULT_GC_INTERVAL,
        )));
        (
            Self {
                sender,
                in_flight: in_flight.clone(),
            },
            JobReceiver {
                receiver,
                in_flight,
            },
        )
    }

    /// Submit a job, waiting for capacity.
    pub async fn enqueue(&self, job: J) -> Result<EnqueueOutcome, QueueError> {
        let id = job.job_id();
        if !self.in_flight.lock().admit(&id) {
            debug!(job_id = %id, "Duplicate job folded");
            return Ok(EnqueueOutcome::Duplicate);
        }
        if self.sender.send(job).await.is_err() {
            self.in_flight.lock().release(&id);
            return Err(QueueError::Closed);
        }
        debug!(job_id = %id, "Job enqueued");
        Ok(EnqueueOutcome::Enqueued)
    }

    /// Submit a job without waiting.
    pub fn try_enqueue(&self, job: J) -> Result<EnqueueOutcome, QueueError> {
        let id = job.job_id();
        if !self.in_flight.lock().admit(&id) {
            return Ok(EnqueueOutcome::Duplicate);
        }
        match self.sender.try_send(job) {
            Ok(()) => Ok(EnqueueOutcome::Enqueued),
            Err(e) => {
                self.in_flight.lock().release(&id);
                match e {
                    mpsc::error::TrySendError::Full(_) => Err(QueueError::Full),
                    mpsc::error::TrySendError::Closed(_) => Err(QueueError::Closed),
                }
            }
        }
    }

    /// Number of job ids currently queued or running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }
}

impl<J: Job> JobReceiver<J> {
    /// Next job, or `None` once every producer is dropped and the queue is drained.
    pub async fn recv(&mut self) -> Option<J> {
        self.receiver.recv().await
    }

    /// Mark a job finished (success or dead-lettered).
    pub fn complete(&self, job_id: &str) {
        self.in_flight.lock().release(job_id);
    }

    /// Stop accepting new jobs; queued jobs can still be drained.
    pub fn close(&mut self) {
        self.receiver.close();
    }
}
