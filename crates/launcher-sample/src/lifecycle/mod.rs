//! # Composition Root
//!
//! This module wires the sample components into a [`Launcher`]. It is the only place
//! that knows about every component; nothing registers itself.
//!
//! ## Registration order
//!
//! ```text
//! initializers: ConnectionPool (open)
//! services:     ConnectionPool (close on stop), HeartbeatService, JobQueueService
//! ```
//!
//! The job queue executes statements against the pool, so it is registered after it
//! and therefore stopped before the pool is closed. The heartbeat has no dependencies.
//!
//! ## Configuration
//!
//! [`SampleConfig::from_env`] reads:
//!
//! - `DATABASE_URL` (default `postgres://localhost/sample`)
//! - `HEARTBEAT_INTERVAL` in `humantime` format (default `1s`)
//! - `LAUNCHER_SHUTDOWN_TIMEOUT` through [`LauncherConfig::from_env`]

use crate::heartbeat::HeartbeatService;
use crate::jobs::{JobQueue, JobQueueService};
use crate::pool::ConnectionPool;
use service_launcher::config::parse_duration;
use service_launcher::{ConfigError, Launcher, LauncherConfig, Service};
use std::sync::Arc;
use std::time::Duration;

const DATABASE_URL_ENV: &str = "DATABASE_URL";
const HEARTBEAT_INTERVAL_ENV: &str = "HEARTBEAT_INTERVAL";
const DEFAULT_DATABASE_URL: &str = "postgres://localhost/sample";
const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);
const POOL_SIZE: usize = 8;
const QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub database_url: String,
    pub heartbeat_interval: Duration,
    pub launcher: LauncherConfig,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            launcher: LauncherConfig::default(),
        }
    }
}

impl SampleConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration through an arbitrary key lookup. Unset keys keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            launcher: LauncherConfig::from_lookup(&lookup)?,
            ..Self::default()
        };

        if let Some(url) = lookup(DATABASE_URL_ENV) {
            config.database_url = url;
        }
        if let Some(raw) = lookup(HEARTBEAT_INTERVAL_ENV) {
            config.heartbeat_interval = parse_duration(HEARTBEAT_INTERVAL_ENV, &raw)?;
        }

        Ok(config)
    }
}

/// The wired application: a launcher ready to run plus handles into its components.
pub struct SampleSystem {
    pub launcher: Launcher,
    pub pool: Arc<ConnectionPool>,
    pub heartbeat: Arc<HeartbeatService>,
    pub jobs: Arc<JobQueueService>,
    pub queue: JobQueue,
}

impl SampleSystem {
    pub fn new(config: &SampleConfig) -> Self {
        let pool = Arc::new(ConnectionPool::new(config.database_url.clone(), POOL_SIZE));
        let heartbeat = Arc::new(HeartbeatService::new(config.heartbeat_interval));
        let (jobs, queue) = JobQueueService::new(pool.clone(), QUEUE_CAPACITY);
        let jobs = Arc::new(jobs);

        let mut launcher = Launcher::with_config(config.launcher.clone());
        launcher
            .add_initializer(pool.clone())
            .add_services([
                pool.clone() as Arc<dyn Service>,
                heartbeat.clone() as Arc<dyn Service>,
                jobs.clone() as Arc<dyn Service>,
            ]);

        Self {
            launcher,
            pool,
            heartbeat,
            jobs,
            queue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use service_launcher::config::SHUTDOWN_TIMEOUT_ENV;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn unset_keys_keep_defaults() {
        let config = SampleConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.heartbeat_interval, DEFAULT_HEARTBEAT_INTERVAL);
        assert_eq!(config.launcher, LauncherConfig::default());
    }

    #[test]
    fn reads_every_key() {
        let config = SampleConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db.internal/jobs"),
            ("HEARTBEAT_INTERVAL", "250ms"),
            (SHUTDOWN_TIMEOUT_ENV, "5s"),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "postgres://db.internal/jobs");
        assert_eq!(config.heartbeat_interval, Duration::from_millis(250));
        assert_eq!(config.launcher.shutdown_timeout, Duration::from_secs(5));
    }

    #[test]
    fn rejects_bad_heartbeat_interval() {
        let err = SampleConfig::from_lookup(lookup(&[("HEARTBEAT_INTERVAL", "often")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidDuration { ref key, .. } if key == "HEARTBEAT_INTERVAL"
        ));

        let err =
            SampleConfig::from_lookup(lookup(&[("HEARTBEAT_INTERVAL", "0s")])).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroDuration { .. }));
    }
}
