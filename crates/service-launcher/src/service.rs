//! # Capability Contracts
//!
//! The launcher never looks inside the components it manages. Everything it knows
//! about them is expressed by two traits:
//!
//! - [`Initializer`]: one-shot setup run before any service starts (open a pool,
//!   run migrations, warm a cache).
//! - [`Service`]: a long-running component with an explicit start/stop lifecycle
//!   (an HTTP server, a queue consumer, a metrics exporter).
//!
//! # Cancellation
//!
//! Every hook receives a [`CancellationToken`]. It plays the role of a cancellable
//! context:
//!
//! - `init` and `start` get the run token, cancelled when the launcher is asked to
//!   shut down (external cancellation or another service failing).
//! - `stop` gets the shutdown token, cancelled when the shutdown deadline passes.
//!
//! Implementations are expected to observe the token and return promptly. The
//! launcher does not interrupt a `start` while the stop sequence is running.
//!
//! # Provided Methods
//!
//! [`Initializer::name`] and [`Service::name`] default to the implementing type's
//! name (e.g. `HeartbeatService`). Override them when the same type is registered
//! more than once.

use crate::error::BoxError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One-shot setup executed sequentially before any service starts.
///
/// The launcher calls [`init`](Initializer::init) exactly once, in registration order.
/// A failure aborts the run; there is no retry and no rollback of initializers that
/// already succeeded.
#[async_trait]
pub trait Initializer: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str {
        short_type_name::<Self>()
    }

    async fn init(&self, token: CancellationToken) -> Result<(), BoxError>;
}

/// A long-running component with an explicit start/stop lifecycle.
///
/// # Contract
///
/// - [`start`](Service::start) blocks until the service is stopped or the token is
///   cancelled. Returning `Err` triggers shutdown of the whole launcher. Returning
///   `Ok(())` early is treated as a clean, non-fatal exit.
/// - [`stop`](Service::stop) attempts a graceful shutdown before the token fires.
///   It is called exactly once per run, even if `start` already returned.
///
/// `start` and `stop` may run concurrently on the same instance, so both take `&self`.
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Name used in logs and errors.
    fn name(&self) -> &str {
        short_type_name::<Self>()
    }

    async fn start(&self, token: CancellationToken) -> Result<(), BoxError>;

    async fn stop(&self, token: CancellationToken) -> Result<(), BoxError>;
}

/// Shared components can be registered while the caller keeps a handle.
#[async_trait]
impl<T: Initializer + ?Sized> Initializer for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn init(&self, token: CancellationToken) -> Result<(), BoxError> {
        (**self).init(token).await
    }
}

#[async_trait]
impl<T: Service + ?Sized> Service for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn start(&self, token: CancellationToken) -> Result<(), BoxError> {
        (**self).start(token).await
    }

    async fn stop(&self, token: CancellationToken) -> Result<(), BoxError> {
        (**self).stop(token).await
    }
}

/// Extract just the type name (e.g. "HeartbeatService" instead of "sample::services::HeartbeatService").
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    // Strip generic parameters before splitting on the path separator.
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
