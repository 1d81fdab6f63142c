//! # Observability & Tracing
//!
//! The launcher logs every lifecycle transition through `tracing`. Events carry
//! structured fields so they can be filtered and aggregated:
//!
//! - `phase`: `initializing`, `running`, `shutting_down`, `terminated`
//! - `index`: registration position of the component
//! - `initializer` / `service`: the component name
//! - `error`: the displayed error, on failures
//!
//! All events of a run are nested in a `launcher` span.
//!
//! ## Usage Examples
//!
//! ```bash
//! # Lifecycle transitions only
//! RUST_LOG=info cargo run
//!
//! # Every init/start/stop call
//! RUST_LOG=debug cargo run
//!
//! # Launcher internals only
//! RUST_LOG=service_launcher=debug cargo run
//! ```
//!
//! ## Workflow Trace Example
//!
//! ```text
//! INFO launcher: Launcher starting phase=initializing
//! INFO launcher: Initialized index=0 initializer="ConnectionPool"
//! INFO launcher: All services started phase=running
//! INFO launcher: Cancellation received phase=running
//! INFO launcher: Shutting down phase=shutting_down timeout=30s failed=false
//! INFO launcher: Stopped index=1 service="JobQueueService"
//! INFO launcher: Stopped index=0 service="HeartbeatService"
//! INFO launcher: Launcher stopped phase=terminated stop_errors=0
//! ```

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber.
///
/// Panics if a global subscriber is already set; call it once from `main`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .compact()
        .init();
}

/// Non-panicking variant of [`setup_tracing`] for tests.
///
/// Returns `false` if a subscriber was already installed.
pub fn try_setup_tracing() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .compact()
        .with_test_writer()
        .try_init()
        .is_ok()
}
