//! # Service Launcher
//!
//! This crate provides a lifecycle orchestrator for long-running processes. A
//! [`Launcher`] sequences one-shot setup tasks, runs a set of independent services
//! concurrently, and coordinates their bounded, ordered teardown on cancellation or
//! failure.
//!
//! ## Architecture Overview
//!
//! The crate separates concerns into three layers:
//!
//! 1. **Contract Layer** ([`Initializer`], [`Service`]) - what the launcher needs from a component
//! 2. **Orchestration Layer** ([`Launcher`]) - ordering, concurrency and shutdown
//! 3. **Ambient Layer** ([`LauncherConfig`], [`signal`], [`tracing`]) - configuration,
//!    cancellation sources and logging
//!
//! ## Lifecycle
//!
//! ```text
//! Created ─► registration ─► Initializing ─► Running ─► ShuttingDown ─► Terminated
//!                              (sequential)   (concurrent)  (reverse, bounded)
//! ```
//!
//! - Initializers run one after another in registration order; the first failure
//!   aborts the run before any service starts.
//! - Every service's `start` runs in its own Tokio task.
//! - The first of {token cancelled, a service failed} moves the run into shutdown.
//! - Services are stopped one at a time in **reverse** registration order, each stop
//!   bounded by a shared deadline (30 seconds by default). Every service gets exactly
//!   one stop call, even when earlier stops fail.
//!
//! ## Composition Root
//!
//! Components are registered explicitly by the application; nothing registers itself.
//!
//! ```rust
//! use async_trait::async_trait;
//! use service_launcher::{init_fn, BoxError, Launcher, Service};
//! use tokio_util::sync::CancellationToken;
//!
//! struct Worker;
//!
//! #[async_trait]
//! impl Service for Worker {
//!     async fn start(&self, token: CancellationToken) -> Result<(), BoxError> {
//!         token.cancelled().await;
//!         Ok(())
//!     }
//!
//!     async fn stop(&self, _token: CancellationToken) -> Result<(), BoxError> {
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut launcher = Launcher::new();
//!     launcher
//!         .add_initializer(init_fn("migrations", |_token| async { Ok(()) }))
//!         .add_service(Worker);
//!
//!     // In a binary this would be `service_launcher::signal::shutdown_token()`.
//!     let token = CancellationToken::new();
//!     token.cancel();
//!
//!     launcher.run(token).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! [`Launcher::run`] returns exactly one of:
//!
//! - `Ok(())` - clean, cancellation-driven shutdown
//! - [`LaunchError::Initializer`] - an initializer failed
//! - [`LaunchError::ServiceStart`] / [`LaunchError::ServicePanicked`] - the first service
//!   failure, reported after every service was stopped
//!
//! Stop failures ([`StopError`]) are logged and available through
//! [`Launcher::run_with_report`]; they never become the run's result.
//!
//! ## Testing
//!
//! The [`mock`] module provides scripted [`mock::MockService`] and
//! [`mock::MockInitializer`] components that record every call in a shared
//! [`mock::CallLog`].

pub mod config;
pub mod error;
pub mod func;
pub mod launcher;
pub mod mock;
pub mod service;
pub mod signal;
pub mod tracing;

// Re-export core types for convenience
pub use config::LauncherConfig;
pub use error::{BoxError, ConfigError, LaunchError, StopError};
pub use func::{init_fn, service_fn, FnInitializer, FnService};
pub use launcher::{Launcher, Phase, RunReport};
pub use service::{Initializer, Service};
