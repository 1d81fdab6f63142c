//! Signal-driven cancellation source.
//!
//! The launcher only needs a [`CancellationToken`]. This module produces one that is
//! cancelled when the process receives SIGINT (Ctrl-C) or, on Unix, SIGTERM.

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Returns a token that is cancelled on the first termination signal.
///
/// Must be called from within a Tokio runtime; the listener runs in a background task.
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    cancel_on_signal(token.clone());
    token
}

/// Spawns a task that cancels `token` on the first termination signal.
///
/// The task also exits if the token is cancelled by someone else first.
pub fn cancel_on_signal(token: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            name = wait_for_signal() => {
                info!(event = "os_signal", signal = name, "cancellation started");
                token.cancel();
            }
            _ = token.cancelled() => {}
        }
    });
}

async fn wait_for_signal() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal as unix_signal, SignalKind};

        match unix_signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    name = ctrl_c() => name,
                    _ = sigterm.recv() => "SIGTERM",
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler, listening for SIGINT only");
                ctrl_c().await
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c().await
    }
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = signal::ctrl_c().await {
        // Without a handler the signal can never be observed.
        warn!(error = %e, "failed to listen for SIGINT");
        std::future::pending::<()>().await;
    }
    "SIGINT"
}
