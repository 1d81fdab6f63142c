//! # The Launcher
//!
//! This module defines the [`Launcher`], the orchestrator that owns every registered
//! [`Initializer`] and [`Service`] and drives them through one run:
//!
//! 1. **Initializing**: initializers run sequentially in registration order. The first
//!    failure aborts the run before any service starts.
//! 2. **Running**: every service's `start` runs in its own Tokio task. The launcher waits
//!    for the external token to be cancelled or for the first `start` to fail.
//! 3. **ShuttingDown**: services are stopped one at a time in reverse registration
//!    order, under a shared deadline. Stop failures and panics are collected, never fatal.
//! 4. **Terminated**: remaining start tasks are joined (or aborted at the deadline) and
//!    the run returns its single terminal result.
//!
//! # Why reverse order?
//!
//! Later registrations usually depend on earlier ones. An HTTP server registered after
//! its database pool must stop before the pool is torn down.
//!
//! # Usage Pattern
//!
//! ```rust
//! use service_launcher::{service_fn, Launcher};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut launcher = Launcher::new();
//!     launcher
//!         .set_shutdown_timeout(Duration::from_secs(5))
//!         .add_service(service_fn(
//!             "worker",
//!             |token: CancellationToken| async move {
//!                 token.cancelled().await;
//!                 Ok(())
//!             },
//!             |_token| async { Ok(()) },
//!         ));
//!
//!     let token = CancellationToken::new();
//!     token.cancel();
//!     launcher.run(token).await.unwrap();
//! }
//! ```

use crate::config::LauncherConfig;
use crate::error::{BoxError, LaunchError, StopError};
use crate::service::{Initializer, Service};
use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::{poll_fn, Future};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::{self, JoinError, JoinSet};
use tokio::time::{sleep_until, timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// The lifecycle phase of a run, reported on every transition log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Running,
    ShuttingDown,
    Terminated,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Initializing => "initializing",
            Phase::Running => "running",
            Phase::ShuttingDown => "shutting_down",
            Phase::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Outcome of [`Launcher::run_with_report`].
///
/// `result` is what [`Launcher::run`] returns. `stop_errors` holds every failure
/// collected during shutdown, in the order the stops were issued (reverse registration).
#[derive(Debug)]
pub struct RunReport {
    pub result: Result<(), LaunchError>,
    pub stop_errors: Vec<StopError>,
}

impl RunReport {
    pub fn into_result(self) -> Result<(), LaunchError> {
        self.result
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Orchestrates initializers and services through one run.
///
/// Registration calls take `&mut self` and return `&mut Self` so they can be chained
/// at the composition root. [`run`](Launcher::run) consumes the launcher: a launcher
/// runs exactly once.
///
/// Registering the same component (or two components with the same name) twice is
/// allowed. Both registrations are started and stopped by position.
pub struct Launcher {
    initializers: Vec<Box<dyn Initializer>>,
    services: Vec<Arc<dyn Service>>,
    config: LauncherConfig,
}

impl Default for Launcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Launcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Launcher")
            .field(
                "initializers",
                &self.initializers.iter().map(|i| i.name()).collect::<Vec<_>>(),
            )
            .field(
                "services",
                &self.services.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("config", &self.config)
            .finish()
    }
}

impl Launcher {
    /// Creates an empty launcher with the default configuration.
    pub fn new() -> Self {
        Self::with_config(LauncherConfig::default())
    }

    pub fn with_config(config: LauncherConfig) -> Self {
        Self {
            initializers: Vec::new(),
            services: Vec::new(),
            config,
        }
    }

    /// Appends an initializer.
    pub fn add_initializer<I>(&mut self, initializer: I) -> &mut Self
    where
        I: Initializer + 'static,
    {
        self.initializers.push(Box::new(initializer));
        self
    }

    /// Appends several initializers, preserving iteration order.
    pub fn add_initializers<I>(&mut self, initializers: I) -> &mut Self
    where
        I: IntoIterator<Item = Box<dyn Initializer>>,
    {
        self.initializers.extend(initializers);
        self
    }

    /// Appends a service.
    pub fn add_service<S>(&mut self, service: S) -> &mut Self
    where
        S: Service,
    {
        self.services.push(Arc::new(service));
        self
    }

    /// Appends several services, preserving iteration order.
    ///
    /// Services are taken as `Arc` so the caller may keep a handle (e.g. to feed a queue).
    pub fn add_services<I>(&mut self, services: I) -> &mut Self
    where
        I: IntoIterator<Item = Arc<dyn Service>>,
    {
        self.services.extend(services);
        self
    }

    /// Overrides the deadline shared by all `stop` calls.
    pub fn set_shutdown_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.config.shutdown_timeout = timeout;
        self
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.config.shutdown_timeout
    }

    pub fn initializer_count(&self) -> usize {
        self.initializers.len()
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    /// Runs the full lifecycle once.
    ///
    /// # Returns
    ///
    /// - `Ok(())` if shutdown was triggered by `token` and no service failed to start.
    ///   Stop failures are logged but do not turn the result into an error.
    /// - `Err(LaunchError::Initializer)` if an initializer failed.
    /// - `Err(LaunchError::ServiceStart | ServicePanicked)` for the first service that
    ///   failed, returned after every service was stopped.
    pub async fn run(self, token: CancellationToken) -> Result<(), LaunchError> {
        self.run_with_report(token).await.into_result()
    }

    /// Same as [`run`](Launcher::run), also returning the stop failures collected
    /// during shutdown.
    pub async fn run_with_report(self, token: CancellationToken) -> RunReport {
        let span = info_span!(
            "launcher",
            initializers = self.initializers.len(),
            services = self.services.len()
        );
        self.drive(token).instrument(span).await
    }

    async fn drive(self, token: CancellationToken) -> RunReport {
        // =====================================================================
        // Phase 1: Initializers, sequential and fail-fast
        // =====================================================================

        info!(phase = %Phase::Initializing, "Launcher starting");
        if let Err(e) = self.initialize(&token).await {
            error!(phase = %Phase::Initializing, error = %e, "Initialization failed");
            info!(phase = %Phase::Terminated, "Launcher stopped");
            return RunReport {
                result: Err(e),
                stop_errors: Vec::new(),
            };
        }

        // =====================================================================
        // Phase 2: Start every service, wait for the first reason to stop
        // =====================================================================

        // A failing service must be able to cancel its siblings without touching
        // the caller's token.
        let run_token = token.child_token();
        let mut running = self.spawn_services(&run_token).await;
        info!(phase = %Phase::Running, "All services started");

        let root_cause = self.wait_for_trigger(&token, &mut running).await;

        // =====================================================================
        // Phase 3: Stop in reverse order under a shared deadline
        // =====================================================================

        info!(
            phase = %Phase::ShuttingDown,
            timeout = ?self.config.shutdown_timeout,
            failed = root_cause.is_some(),
            "Shutting down"
        );
        run_token.cancel();
        let deadline = Instant::now() + self.config.shutdown_timeout;
        let stop_errors = self.stop_services(deadline).await;
        self.join_remaining(&mut running, deadline).await;

        match &root_cause {
            Some(e) => error!(
                phase = %Phase::Terminated,
                error = %e,
                stop_errors = stop_errors.len(),
                "Launcher stopped after service failure"
            ),
            None => info!(
                phase = %Phase::Terminated,
                stop_errors = stop_errors.len(),
                "Launcher stopped"
            ),
        }

        RunReport {
            result: root_cause.map_or(Ok(()), Err),
            stop_errors,
        }
    }

    async fn initialize(&self, token: &CancellationToken) -> Result<(), LaunchError> {
        for (index, initializer) in self.initializers.iter().enumerate() {
            let name = initializer.name();
            debug!(index, initializer = name, "Init");
            initializer
                .init(token.clone())
                .await
                .map_err(|source| LaunchError::Initializer {
                    index,
                    name: name.to_string(),
                    source,
                })?;
            info!(index, initializer = name, "Initialized");
        }
        Ok(())
    }

    /// Spawns one task per service and returns once every `start` has been polled.
    async fn spawn_services(&self, run_token: &CancellationToken) -> RunningServices {
        let mut running = RunningServices {
            tasks: JoinSet::new(),
            positions: HashMap::with_capacity(self.services.len()),
        };
        let mut ready = Vec::with_capacity(self.services.len());

        for (index, service) in self.services.iter().enumerate() {
            debug!(index, service = service.name(), "Start");
            let service = Arc::clone(service);
            let token = run_token.clone();
            let (ready_tx, ready_rx) = oneshot::channel();
            ready.push(ready_rx);

            let handle = running.tasks.spawn(async move {
                let result = start_service(service.as_ref(), token, ready_tx).await;
                (index, result)
            });
            running.positions.insert(handle.id(), index);
        }

        // A dropped sender means the task panicked on its first poll; it still counts.
        for rx in ready {
            let _ = rx.await;
        }

        running
    }

    async fn wait_for_trigger(
        &self,
        token: &CancellationToken,
        running: &mut RunningServices,
    ) -> Option<LaunchError> {
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!(phase = %Phase::Running, "Cancellation received");
                    return None;
                }
                Some(joined) = running.tasks.join_next_with_id() => {
                    match self.task_outcome(joined, &running.positions) {
                        TaskOutcome::Exited(index) => {
                            warn!(
                                index,
                                service = self.services[index].name(),
                                "Service exited before shutdown"
                            );
                        }
                        TaskOutcome::Failed(e) => {
                            error!(phase = %Phase::Running, error = %e, "Service failed");
                            return Some(e);
                        }
                    }
                }
            }
        }
    }

    async fn stop_services(&self, deadline: Instant) -> Vec<StopError> {
        let shutdown_token = CancellationToken::new();
        let timer = tokio::spawn({
            let token = shutdown_token.clone();
            async move {
                sleep_until(deadline).await;
                token.cancel();
            }
        });

        let mut errors = Vec::new();
        for (index, service) in self.services.iter().enumerate().rev() {
            let name = service.name();
            debug!(index, service = name, "Stop");

            // Services visited after the deadline still get their stop call; a stop
            // that completes on its first poll succeeds.
            let stop = AssertUnwindSafe(service.stop(shutdown_token.clone())).catch_unwind();
            let err = match timeout_at(deadline, stop).await {
                Ok(Ok(Ok(()))) => {
                    info!(index, service = name, "Stopped");
                    continue;
                }
                Ok(Ok(Err(source))) => StopError::Failed {
                    index,
                    name: name.to_string(),
                    source,
                },
                Ok(Err(payload)) => StopError::Panicked {
                    index,
                    name: name.to_string(),
                    message: payload_message(payload),
                },
                Err(_) => StopError::TimedOut {
                    index,
                    name: name.to_string(),
                    timeout: self.config.shutdown_timeout,
                },
            };
            error!(index, service = name, error = %err, "Stop failed");
            errors.push(err);
        }

        timer.abort();
        errors
    }

    /// Waits for start tasks that are still alive, aborting them at the deadline.
    async fn join_remaining(&self, running: &mut RunningServices, deadline: Instant) {
        loop {
            match timeout_at(deadline, running.tasks.join_next_with_id()).await {
                Ok(Some(joined)) => match self.task_outcome(joined, &running.positions) {
                    TaskOutcome::Exited(index) => {
                        debug!(index, service = self.services[index].name(), "Service exited");
                    }
                    TaskOutcome::Failed(e) => {
                        warn!(error = %e, "Service failed during shutdown");
                    }
                },
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        remaining = running.tasks.len(),
                        "Services still running after shutdown deadline, aborting"
                    );
                    running.tasks.shutdown().await;
                    break;
                }
            }
        }
    }

    fn task_outcome(
        &self,
        joined: Result<(task::Id, (usize, Result<(), BoxError>)), JoinError>,
        positions: &HashMap<task::Id, usize>,
    ) -> TaskOutcome {
        match joined {
            Ok((_, (index, Ok(())))) => TaskOutcome::Exited(index),
            Ok((_, (index, Err(source)))) => TaskOutcome::Failed(LaunchError::ServiceStart {
                index,
                name: self.services[index].name().to_string(),
                source,
            }),
            Err(join_error) => {
                // Only abort() cancels a task, and that happens after the deadline.
                let index = positions.get(&join_error.id()).copied().unwrap_or_default();
                TaskOutcome::Failed(LaunchError::ServicePanicked {
                    index,
                    name: self.services[index].name().to_string(),
                    message: panic_message(join_error),
                })
            }
        }
    }
}

struct RunningServices {
    tasks: JoinSet<(usize, Result<(), BoxError>)>,
    positions: HashMap<task::Id, usize>,
}

enum TaskOutcome {
    Exited(usize),
    Failed(LaunchError),
}

/// Drives `start`, signalling `ready` right after its first poll.
async fn start_service(
    service: &dyn Service,
    token: CancellationToken,
    ready: oneshot::Sender<()>,
) -> Result<(), BoxError> {
    let mut start = service.start(token);
    let mut ready = Some(ready);
    poll_fn(|cx| {
        let poll = start.as_mut().poll(cx);
        if let Some(ready) = ready.take() {
            let _ = ready.send(());
        }
        poll
    })
    .await
}

fn panic_message(join_error: JoinError) -> String {
    if join_error.is_cancelled() {
        return "task cancelled".to_string();
    }
    payload_message(join_error.into_panic())
}

fn payload_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
