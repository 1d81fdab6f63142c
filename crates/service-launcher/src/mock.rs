//! # Mock Components & Testing Guide
//!
//! [`MockInitializer`] and [`MockService`] implement the capability traits entirely
//! in-memory. Every call is recorded in a shared [`CallLog`], so a test can assert on
//! the exact interleaving of `init`, `start` and `stop` calls across components.
//!
//! ## When to use Mocks vs Real Components
//!
//! | Feature | Mocks | Real components |
//! |---------|-------|-----------------|
//! | **Speed** | Instant | Depends on I/O |
//! | **Ordering assertions** | Built in (`CallLog`) | Manual instrumentation |
//! | **Error Injection** | `fail_start`, `fail_stop`, `stop_delay` | Hard to provoke |
//! | **Use Case** | Testing launcher ordering and failure semantics | End-to-end wiring |
//!
//! ## Recorded events
//!
//! Events are plain strings of the form `"init:<name>"`, `"start:<name>"` and
//! `"stop:<name>"`, appended in the order the calls were entered.
//!
//! ## Example
//!
//! ```rust
//! use service_launcher::mock::{CallLog, MockService};
//! use service_launcher::Launcher;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let log = CallLog::new();
//!     let mut launcher = Launcher::new();
//!     launcher
//!         .add_service(MockService::new("db", &log))
//!         .add_service(MockService::new("http", &log).fail_stop("port busy"));
//!
//!     let token = CancellationToken::new();
//!     let handle = tokio::spawn(launcher.run_with_report(token.clone()));
//!
//!     log.wait_for_starts(2).await;
//!     token.cancel();
//!
//!     let report = handle.await.unwrap();
//!     assert!(report.is_ok());
//!     assert_eq!(report.stop_errors.len(), 1);
//!     assert_eq!(log.stops(), vec!["http", "db"]);
//! }
//! ```

use crate::error::BoxError;
use crate::service::{Initializer, Service};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

// =============================================================================
// CALL LOG
// =============================================================================

/// Shared, ordered record of every mock call.
///
/// Cheap to clone; all clones observe the same log.
#[derive(Clone, Default)]
pub struct CallLog {
    events: Arc<Mutex<Vec<String>>>,
    changed: Arc<Notify>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, kind: &str, name: &str) {
        self.events.lock().unwrap().push(format!("{kind}:{name}"));
        self.changed.notify_waiters();
    }

    /// All events in call order.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Names of the components that received `kind` calls, in call order.
    pub fn names(&self, kind: &str) -> Vec<String> {
        let prefix = format!("{kind}:");
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| e.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    pub fn inits(&self) -> Vec<String> {
        self.names("init")
    }

    pub fn starts(&self) -> Vec<String> {
        self.names("start")
    }

    pub fn stops(&self) -> Vec<String> {
        self.names("stop")
    }

    /// Index of the first occurrence of `event` (e.g. `"stop:db"`).
    pub fn position(&self, event: &str) -> Option<usize> {
        self.events.lock().unwrap().iter().position(|e| e == event)
    }

    /// Waits until at least `count` `start` calls have been recorded.
    pub async fn wait_for_starts(&self, count: usize) {
        loop {
            // Register interest before checking, so a record in between is not missed.
            let changed = self.changed.notified();
            if self.starts().len() >= count {
                return;
            }
            changed.await;
        }
    }
}

// =============================================================================
// MOCK INITIALIZER
// =============================================================================

/// An [`Initializer`] that records its call and optionally fails.
pub struct MockInitializer {
    name: String,
    log: CallLog,
    error: Option<String>,
}

impl MockInitializer {
    pub fn new(name: impl Into<String>, log: &CallLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
            error: None,
        }
    }

    /// Makes `init` fail with `message`.
    pub fn fail(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }
}

#[async_trait]
impl Initializer for MockInitializer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&self, _token: CancellationToken) -> Result<(), BoxError> {
        self.log.record("init", &self.name);
        match &self.error {
            Some(message) => Err(message.clone().into()),
            None => Ok(()),
        }
    }
}

// =============================================================================
// MOCK SERVICE
// =============================================================================

/// How a [`MockService`] behaves once `start` is entered.
#[derive(Debug, Clone, PartialEq)]
enum StartBehavior {
    /// Run until the token is cancelled or `stop` is called.
    UntilStopped,
    /// Return `Ok(())` straight away.
    ExitImmediately,
    /// Return an error straight away.
    Fail(String),
    /// Panic on the first poll.
    Panic(String),
    /// Ignore both the token and `stop`.
    Hang,
}

/// A [`Service`] that records its calls and can be scripted to misbehave.
///
/// By default `start` runs until either its token is cancelled or `stop` is called,
/// and `stop` succeeds immediately.
pub struct MockService {
    name: String,
    log: CallLog,
    start: StartBehavior,
    stop_error: Option<String>,
    stop_panic: Option<String>,
    stop_delay: Option<Duration>,
    stopped: CancellationToken,
}

impl MockService {
    pub fn new(name: impl Into<String>, log: &CallLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
            start: StartBehavior::UntilStopped,
            stop_error: None,
            stop_panic: None,
            stop_delay: None,
            stopped: CancellationToken::new(),
        }
    }

    /// Makes `start` return `message` as an error immediately.
    pub fn fail_start(mut self, message: impl Into<String>) -> Self {
        self.start = StartBehavior::Fail(message.into());
        self
    }

    /// Makes `start` return `Ok(())` immediately.
    pub fn exit_immediately(mut self) -> Self {
        self.start = StartBehavior::ExitImmediately;
        self
    }

    pub fn panic_on_start(mut self, message: impl Into<String>) -> Self {
        self.start = StartBehavior::Panic(message.into());
        self
    }

    /// Makes `start` never return on its own.
    pub fn hang_on_start(mut self) -> Self {
        self.start = StartBehavior::Hang;
        self
    }

    /// Makes `stop` fail with `message` (after any configured delay).
    pub fn fail_stop(mut self, message: impl Into<String>) -> Self {
        self.stop_error = Some(message.into());
        self
    }

    /// Makes `stop` panic with `message` after releasing `start`.
    pub fn panic_on_stop(mut self, message: impl Into<String>) -> Self {
        self.stop_panic = Some(message.into());
        self
    }

    /// Makes `stop` sleep for `delay` before returning, ignoring its token.
    pub fn stop_delay(mut self, delay: Duration) -> Self {
        self.stop_delay = Some(delay);
        self
    }
}

#[async_trait]
impl Service for MockService {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self, token: CancellationToken) -> Result<(), BoxError> {
        self.log.record("start", &self.name);
        match &self.start {
            StartBehavior::UntilStopped => {
                tokio::select! {
                    _ = token.cancelled() => {}
                    _ = self.stopped.cancelled() => {}
                }
                Ok(())
            }
            StartBehavior::ExitImmediately => Ok(()),
            StartBehavior::Fail(message) => Err(message.clone().into()),
            StartBehavior::Panic(message) => panic!("{message}"),
            StartBehavior::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }

    async fn stop(&self, _token: CancellationToken) -> Result<(), BoxError> {
        self.log.record("stop", &self.name);
        self.stopped.cancel();
        if let Some(delay) = self.stop_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.stop_panic {
            panic!("{message}");
        }
        match &self.stop_error {
            Some(message) => Err(message.clone().into()),
            None => Ok(()),
        }
    }
}
