//! Closure adapters.
//!
//! Small components rarely deserve a dedicated type. [`init_fn`] and [`service_fn`]
//! wrap async closures so they can be registered directly:
//!
//! ```rust
//! use service_launcher::{init_fn, service_fn, Launcher};
//!
//! let mut launcher = Launcher::new();
//! launcher
//!     .add_initializer(init_fn("migrations", |_token| async { Ok(()) }))
//!     .add_service(service_fn(
//!         "ticker",
//!         |token| async move {
//!             token.cancelled().await;
//!             Ok(())
//!         },
//!         |_token| async { Ok(()) },
//!     ));
//! assert_eq!(launcher.service_count(), 1);
//! ```

use crate::error::BoxError;
use crate::service::{Initializer, Service};
use async_trait::async_trait;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// An [`Initializer`] backed by an async closure. Built with [`init_fn`].
pub struct FnInitializer<F> {
    name: String,
    init: F,
}

/// Builds an [`Initializer`] named `name` from an async closure.
pub fn init_fn<F, Fut>(name: impl Into<String>, init: F) -> FnInitializer<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxError>> + Send,
{
    FnInitializer {
        name: name.into(),
        init,
    }
}

#[async_trait]
impl<F, Fut> Initializer for FnInitializer<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxError>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&self, token: CancellationToken) -> Result<(), BoxError> {
        (self.init)(token).await
    }
}

/// A [`Service`] backed by a pair of async closures. Built with [`service_fn`].
pub struct FnService<S, T> {
    name: String,
    start: S,
    stop: T,
}

/// Builds a [`Service`] named `name` from a `start` and a `stop` closure.
pub fn service_fn<S, SFut, T, TFut>(name: impl Into<String>, start: S, stop: T) -> FnService<S, T>
where
    S: Fn(CancellationToken) -> SFut + Send + Sync + 'static,
    SFut: Future<Output = Result<(), BoxError>> + Send,
    T: Fn(CancellationToken) -> TFut + Send + Sync + 'static,
    TFut: Future<Output = Result<(), BoxError>> + Send,
{
    FnService {
        name: name.into(),
        start,
        stop,
    }
}

#[async_trait]
impl<S, SFut, T, TFut> Service for FnService<S, T>
where
    S: Fn(CancellationToken) -> SFut + Send + Sync + 'static,
    SFut: Future<Output = Result<(), BoxError>> + Send,
    T: Fn(CancellationToken) -> TFut + Send + Sync + 'static,
    TFut: Future<Output = Result<(), BoxError>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self, token: CancellationToken) -> Result<(), BoxError> {
        (self.start)(token).await
    }

    async fn stop(&self, token: CancellationToken) -> Result<(), BoxError> {
        (self.stop)(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn init_fn_runs_closure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let init = init_fn("counter", move |_token| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        assert_eq!(init.name(), "counter");
        init.init(CancellationToken::new()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn service_fn_forwards_start_and_stop() {
        let service = service_fn(
            "echo",
            |token: CancellationToken| async move {
                token.cancelled().await;
                Ok(())
            },
            |_token| async { Err::<(), BoxError>("stop failed".into()) },
        );

        let token = CancellationToken::new();
        token.cancel();
        service.start(token).await.unwrap();

        let err = service.stop(CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "stop failed");
        assert_eq!(service.name(), "echo");
    }
}
