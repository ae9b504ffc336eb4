use std::{fmt, future::Future};

use async_trait::async_trait;

use crate::error::{BoxError, StdSyncSendError};

/// Blocking consumer of delivered batches.
///
/// Runs on tokio's blocking pool, so it may perform synchronous I/O.
pub trait BatchHandler<T>: Send + Sync {
    type Error: StdSyncSendError;

    fn handle(&self, batch: Vec<T>) -> Result<(), Self::Error>;
}

/// Asynchronous consumer of delivered batches.
#[async_trait]
pub trait AsyncBatchHandler<T>: Send + Sync {
    type Error: StdSyncSendError;

    async fn handle(&self, batch: Vec<T>) -> Result<(), Self::Error>;
}

/// Error produced by closure-backed handlers.
#[derive(Debug)]
pub struct FnHandlerError(pub BoxError);

impl fmt::Display for FnHandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for FnHandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

/// Blocking handler backed by a closure. See [`handler_fn`].
pub struct FnHandler<F>(F);

/// Async handler backed by a closure returning a future. See [`async_handler_fn`].
pub struct AsyncFnHandler<F>(F);

/// Wraps a blocking closure into a [`BatchHandler`].
///
/// ```rust,ignore
/// let handler = handler_fn(|batch: Vec<u32>| -> Result<(), std::io::Error> {
///     println!("got {} items", batch.len());
///     Ok(())
/// });
/// ```
pub fn handler_fn<F>(f: F) -> FnHandler<F> {
    FnHandler(f)
}

/// Wraps a closure returning a future into an [`AsyncBatchHandler`].
pub fn async_handler_fn<F>(f: F) -> AsyncFnHandler<F> {
    AsyncFnHandler(f)
}

impl<T, F, E> BatchHandler<T> for FnHandler<F>
where
    F: Fn(Vec<T>) -> Result<(), E> + Send + Sync,
    E: Into<BoxError>,
{
    type Error = FnHandlerError;

    fn handle(&self, batch: Vec<T>) -> Result<(), Self::Error> {
        (self.0)(batch).map_err(|err| FnHandlerError(err.into()))
    }
}

#[async_trait]
impl<T, F, Fut, E> AsyncBatchHandler<T> for AsyncFnHandler<F>
where
    T: Send + 'static,
    F: Fn(Vec<T>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), E>> + Send,
    E: Into<BoxError>,
{
    type Error = FnHandlerError;

    async fn handle(&self, batch: Vec<T>) -> Result<(), Self::Error> {
        (self.0)(batch).await.map_err(|err| FnHandlerError(err.into()))
    }
}
