//! # Launcher Sample
//!
//! Runs the sample system until SIGINT/SIGTERM:
//!
//! 1. Opens the connection pool (initializer).
//! 2. Starts the pool holder, the heartbeat and the job queue concurrently.
//! 3. Feeds the job queue from a background producer.
//! 4. On the first signal, stops the job queue, the heartbeat and the pool, in that order.
//!
//! ```bash
//! RUST_LOG=info cargo run -p launcher-sample
//! LAUNCHER_SHUTDOWN_TIMEOUT=5s HEARTBEAT_INTERVAL=250ms cargo run -p launcher-sample
//! ```

use launcher_sample::jobs::Job;
use launcher_sample::lifecycle::{SampleConfig, SampleSystem};
use service_launcher::signal::shutdown_token;
use service_launcher::tracing::setup_tracing;
use std::time::Duration;
use tracing::{info, warn, Instrument};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Setup tracing once for the entire application
    setup_tracing();

    let config = SampleConfig::from_env()?;
    info!(?config, "Starting sample system");

    let system = SampleSystem::new(&config);
    let token = shutdown_token();

    // Demo producer: one job every 500ms until the queue closes.
    let queue = system.queue.clone();
    let producer_token = token.clone();
    tokio::spawn(
        async move {
            let mut id = 0;
            loop {
                tokio::select! {
                    _ = producer_token.cancelled() => break,
                    _ = tokio::time::sleep(Duration::from_millis(500)) => {}
                }
                id += 1;
                let job = Job {
                    id,
                    statement: format!("INSERT INTO events VALUES ({id})"),
                };
                if let Err(e) = queue.submit(job).await {
                    warn!(error = %e, "Producer stopped");
                    break;
                }
            }
        }
        .instrument(tracing::info_span!("producer")),
    );

    let jobs = system.jobs.clone();
    let heartbeat = system.heartbeat.clone();
    system.launcher.run(token).await?;

    info!(
        processed = jobs.processed(),
        beats = heartbeat.beats(),
        "Application completed successfully"
    );
    Ok(())
}
