//! Error types for the sample components.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SampleError {
    /// The connection pool was used before `init` or after it was closed.
    #[error("connection pool is not open")]
    PoolClosed,

    /// The configured database URL is unusable.
    #[error("invalid database url: {0:?}")]
    InvalidUrl(String),

    /// The job queue service was started twice.
    #[error("job queue already started")]
    QueueAlreadyStarted,

    /// The job queue no longer accepts jobs.
    #[error("job queue closed")]
    QueueClosed,

    /// Pending jobs were still queued when the stop deadline passed.
    #[error("job queue drain timed out with {pending} pending jobs")]
    DrainTimeout { pending: usize },
}
