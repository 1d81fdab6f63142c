//! # Launcher Errors
//!
//! This module defines the error types surfaced by the launcher. They follow the
//! three phases of a run:
//!
//! - [`LaunchError`] is the single terminal error of a run (initializer failure or
//!   the root-cause service failure).
//! - [`StopError`] is collected per service during shutdown. It is never fatal.
//! - [`ConfigError`] is returned when launcher configuration cannot be loaded.

use std::time::Duration;

/// The error type returned by initializers and services.
///
/// Collaborators are free to return any error; the launcher only needs to
/// display it and keep the chain intact for `source()`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The terminal error of a [`Launcher::run`](crate::Launcher::run).
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// An initializer failed. No service was started.
    #[error("initializer #{index} ({name}) failed: {source}")]
    Initializer {
        index: usize,
        name: String,
        #[source]
        source: BoxError,
    },

    /// A service returned an error from `start`. Reported after shutdown completed.
    #[error("service #{index} ({name}) failed to start: {source}")]
    ServiceStart {
        index: usize,
        name: String,
        #[source]
        source: BoxError,
    },

    /// A service task panicked while running `start`.
    #[error("service #{index} ({name}) panicked: {message}")]
    ServicePanicked {
        index: usize,
        name: String,
        message: String,
    },
}

impl LaunchError {
    /// Registration position of the initializer or service that caused the error.
    pub fn index(&self) -> usize {
        match self {
            LaunchError::Initializer { index, .. }
            | LaunchError::ServiceStart { index, .. }
            | LaunchError::ServicePanicked { index, .. } => *index,
        }
    }

    /// Name of the initializer or service that caused the error.
    pub fn name(&self) -> &str {
        match self {
            LaunchError::Initializer { name, .. }
            | LaunchError::ServiceStart { name, .. }
            | LaunchError::ServicePanicked { name, .. } => name,
        }
    }
}

/// A failure recorded while stopping one service.
#[derive(Debug, thiserror::Error)]
pub enum StopError {
    #[error("service #{index} ({name}) failed to stop: {source}")]
    Failed {
        index: usize,
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("service #{index} ({name}) did not stop within {timeout:?}")]
    TimedOut {
        index: usize,
        name: String,
        timeout: Duration,
    },

    #[error("service #{index} ({name}) panicked while stopping: {message}")]
    Panicked {
        index: usize,
        name: String,
        message: String,
    },
}

impl StopError {
    pub fn index(&self) -> usize {
        match self {
            StopError::Failed { index, .. }
            | StopError::TimedOut { index, .. }
            | StopError::Panicked { index, .. } => *index,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            StopError::Failed { name, .. }
            | StopError::TimedOut { name, .. }
            | StopError::Panicked { name, .. } => name,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, StopError::TimedOut { .. })
    }
}

/// Errors raised while loading a [`LauncherConfig`](crate::LauncherConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid duration in {key}: {source}")]
    InvalidDuration {
        key: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error("{key} must be greater than zero")]
    ZeroDuration { key: String },
}
