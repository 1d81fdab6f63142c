//! Launcher configuration.
//!
//! Configuration is a plain value handed to [`Launcher::with_config`](crate::Launcher::with_config).
//! There is no process-wide configuration object. Durations use the human-readable
//! format understood by `humantime` (`"30s"`, `"1m 30s"`, `"500ms"`).

use crate::error::ConfigError;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Environment variable read by [`LauncherConfig::from_env`].
pub const SHUTDOWN_TIMEOUT_ENV: &str = "LAUNCHER_SHUTDOWN_TIMEOUT";

/// Default deadline for the whole shutdown sequence.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LauncherConfig {
    /// Deadline shared by every `stop` call during shutdown.
    #[serde(deserialize_with = "deserialize_duration")]
    pub shutdown_timeout: Duration,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl LauncherConfig {
    /// Loads the configuration from the process environment.
    ///
    /// Unset variables fall back to the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration through an arbitrary key lookup.
    ///
    /// Useful in tests and when the values come from somewhere other than the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(SHUTDOWN_TIMEOUT_ENV) {
            config.shutdown_timeout = parse_duration(SHUTDOWN_TIMEOUT_ENV, &raw)?;
        }

        Ok(config)
    }
}

/// Parses a non-zero `humantime` duration read from `key`.
pub fn parse_duration(key: &str, raw: &str) -> Result<Duration, ConfigError> {
    let duration = humantime::parse_duration(raw.trim()).map_err(|source| {
        ConfigError::InvalidDuration {
            key: key.to_string(),
            source,
        }
    })?;

    if duration.is_zero() {
        return Err(ConfigError::ZeroDuration {
            key: key.to_string(),
        });
    }

    Ok(duration)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_duration("shutdown_timeout", &raw).map_err(serde::de::Error::custom)
}
