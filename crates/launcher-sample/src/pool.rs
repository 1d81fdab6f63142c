//! A simulated database connection pool.
//!
//! The pool is opened as an [`Initializer`] before any service starts, and closed as
//! a [`Service`] during shutdown. It is shared with the services that need it through
//! an `Arc`.

use crate::error::SampleError;
use async_trait::async_trait;
use service_launcher::{BoxError, Initializer, Service};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Simulated connection latency.
const CONNECT_DELAY: Duration = Duration::from_millis(10);

#[derive(Debug)]
pub struct ConnectionPool {
    url: String,
    size: usize,
    open: AtomicBool,
    executed: AtomicU64,
}

impl ConnectionPool {
    pub fn new(url: impl Into<String>, size: usize) -> Self {
        Self {
            url: url.into(),
            size,
            open: AtomicBool::new(false),
            executed: AtomicU64::new(0),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of statements executed since the pool was opened.
    pub fn executed(&self) -> u64 {
        self.executed.load(Ordering::SeqCst)
    }

    pub async fn execute(&self, statement: &str) -> Result<(), SampleError> {
        if !self.is_open() {
            return Err(SampleError::PoolClosed);
        }
        debug!(statement, "Execute");
        self.executed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    pub fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            info!(url = %self.url, "Connection pool closed");
        }
    }
}

#[async_trait]
impl Initializer for ConnectionPool {
    async fn init(&self, token: CancellationToken) -> Result<(), BoxError> {
        if !self.url.contains("://") {
            return Err(SampleError::InvalidUrl(self.url.clone()).into());
        }

        tokio::select! {
            _ = token.cancelled() => return Err("cancelled while connecting".into()),
            _ = tokio::time::sleep(CONNECT_DELAY) => {}
        }

        self.open.store(true, Ordering::SeqCst);
        info!(url = %self.url, size = self.size, "Connection pool open");
        Ok(())
    }
}

/// Holds the pool open for the lifetime of the run and closes it on stop.
#[async_trait]
impl Service for ConnectionPool {
    async fn start(&self, token: CancellationToken) -> Result<(), BoxError> {
        token.cancelled().await;
        Ok(())
    }

    async fn stop(&self, _token: CancellationToken) -> Result<(), BoxError> {
        self.close();
        Ok(())
    }
}
