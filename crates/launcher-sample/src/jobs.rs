//! Job queue service.
//!
//! Jobs are submitted through a cloneable [`JobQueue`] handle and executed against
//! the shared [`ConnectionPool`]. On stop the service drains what is already queued;
//! the drain is bounded by the stop token's deadline.

use crate::error::SampleError;
use crate::pool::ConnectionPool;
use async_trait::async_trait;
use service_launcher::{BoxError, Service};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: u64,
    pub statement: String,
}

/// Cloneable submission handle.
#[derive(Clone)]
pub struct JobQueue {
    sender: mpsc::Sender<Job>,
}

impl JobQueue {
    pub async fn submit(&self, job: Job) -> Result<(), SampleError> {
        self.sender
            .send(job)
            .await
            .map_err(|_| SampleError::QueueClosed)
    }

    /// Number of jobs waiting to be executed.
    pub fn pending(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }
}

pub struct JobQueueService {
    pool: Arc<ConnectionPool>,
    receiver: Mutex<Option<mpsc::Receiver<Job>>>,
    queue: JobQueue,
    processed: AtomicU64,
    stopped: CancellationToken,
    drained: CancellationToken,
}

impl JobQueueService {
    /// Creates the service and its submission handle.
    pub fn new(pool: Arc<ConnectionPool>, capacity: usize) -> (Self, JobQueue) {
        let (sender, receiver) = mpsc::channel(capacity);
        let queue = JobQueue { sender };
        let service = Self {
            pool,
            receiver: Mutex::new(Some(receiver)),
            queue: queue.clone(),
            processed: AtomicU64::new(0),
            stopped: CancellationToken::new(),
            drained: CancellationToken::new(),
        };
        (service, queue)
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::SeqCst)
    }

    async fn execute(&self, job: Job) {
        debug!(job_id = job.id, "Job");
        match self.pool.execute(&job.statement).await {
            Ok(()) => {
                self.processed.fetch_add(1, Ordering::SeqCst);
            }
            Err(e) => warn!(job_id = job.id, error = %e, "Job failed"),
        }
    }
}

#[async_trait]
impl Service for JobQueueService {
    async fn start(&self, token: CancellationToken) -> Result<(), BoxError> {
        let mut receiver = self
            .receiver
            .lock()
            .await
            .take()
            .ok_or(SampleError::QueueAlreadyStarted)?;
        info!("Job queue started");

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = self.stopped.cancelled() => break,
                job = receiver.recv() => match job {
                    Some(job) => self.execute(job).await,
                    None => break,
                },
            }
        }

        // Refuse new jobs, then finish what is already queued.
        receiver.close();
        while let Some(job) = receiver.recv().await {
            self.execute(job).await;
        }

        self.drained.cancel();
        info!(processed = self.processed(), "Job queue drained");
        Ok(())
    }

    async fn stop(&self, token: CancellationToken) -> Result<(), BoxError> {
        self.stopped.cancel();
        tokio::select! {
            _ = self.drained.cancelled() => Ok(()),
            _ = token.cancelled() => Err(SampleError::DrainTimeout {
                pending: self.queue.pending(),
            }
            .into()),
        }
    }
}
