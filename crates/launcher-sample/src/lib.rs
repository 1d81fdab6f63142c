//! # Launcher Sample Library
//!
//! This library exposes the sample components and their composition root for
//! integration testing.
//!
//! - [`pool`]: a simulated connection pool, opened as an initializer and closed as a service
//! - [`heartbeat`]: a periodic heartbeat service
//! - [`jobs`]: a job queue service that drains on stop
//! - [`lifecycle`]: wires everything into a [`service_launcher::Launcher`]

pub mod error;
pub mod heartbeat;
pub mod jobs;
pub mod lifecycle;
pub mod pool;
