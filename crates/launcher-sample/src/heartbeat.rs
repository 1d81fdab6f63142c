//! Periodic heartbeat service.

use async_trait::async_trait;
use service_launcher::{BoxError, Service};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Emits a heartbeat every `period` until stopped.
pub struct HeartbeatService {
    period: Duration,
    beats: AtomicU64,
    stopped: CancellationToken,
}

impl HeartbeatService {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            beats: AtomicU64::new(0),
            stopped: CancellationToken::new(),
        }
    }

    pub fn beats(&self) -> u64 {
        self.beats.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Service for HeartbeatService {
    async fn start(&self, token: CancellationToken) -> Result<(), BoxError> {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period = ?self.period, "Heartbeat started");

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = self.stopped.cancelled() => break,
                _ = ticker.tick() => {
                    let beat = self.beats.fetch_add(1, Ordering::SeqCst) + 1;
                    debug!(beat, "Heartbeat");
                }
            }
        }

        info!(beats = self.beats(), "Heartbeat finished");
        Ok(())
    }

    async fn stop(&self, _token: CancellationToken) -> Result<(), BoxError> {
        self.stopped.cancel();
        Ok(())
    }
}
