#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # Launcher Recipe
//!
//! > **A Recipe for Ordered Service Lifecycles in Rust.**
//!
//! This crate demonstrates a pattern for running a process made of several long-lived
//! components with Tokio: one-shot setup first, then every component concurrently, then
//! a bounded, reverse-ordered teardown when the process is asked to stop or one of the
//! components fails.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Why an explicit launcher?
//!
//! - **Deterministic wiring**: components are registered at one composition root, in the
//!   order they depend on each other. Nothing registers itself at import time.
//! - **Explicit dependencies**: configuration and handles are passed as values, not
//!   reached for through globals.
//! - **Predictable teardown**: the last component registered is the first one stopped,
//!   every component is stopped exactly once, and the whole teardown has a deadline.
//!
//! ## 🚀 Core Concepts
//!
//! ### Contracts, not implementations
//! The launcher only knows two traits: [`Initializer`] (`init`) and [`Service`]
//! (`start` / `stop`). Whether a service is an HTTP server or a queue consumer is
//! invisible to it.
//!
//! ### Cancellation tokens
//! A `tokio_util::sync::CancellationToken` plays the role of a cancellable context.
//! The caller owns the token that triggers shutdown; the launcher derives the tokens
//! handed to services.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`service_launcher`])
//! - **Role**: Orchestrates initializers and services through one run.
//! - **Key items**: [`Launcher`], [`Initializer`], [`Service`], [`LaunchError`], [`StopError`].
//!
//! ### 2. The Ambient Layer
//! - [`LauncherConfig`]: shutdown timeout, loadable from the environment.
//! - [`signal`]: a token cancelled on SIGINT / SIGTERM.
//! - [`tracing`]: structured logging setup.
//! - [`mock`]: scripted components for testing ordering and failure semantics.
//!
//! ### 3. The Sample ([`sample`])
//! - **Role**: A composition root wiring a connection pool, a heartbeat and a job queue.
//! - **Key items**: [`sample::lifecycle::SampleSystem`].
//!
//! ## 🚀 Quick Start
//!
//! ### Running the Demo
//!
//! ```bash
//! # Run with info logs, stop with Ctrl-C
//! RUST_LOG=info cargo run -p launcher-sample
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! cargo test --workspace
//! ```

pub use launcher_sample as sample;
pub use service_launcher::*;
