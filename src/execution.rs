use std::{marker::PhantomData, panic::AssertUnwindSafe, sync::Arc};

use futures::{future::BoxFuture, FutureExt};

use crate::{
    error::HandlerError,
    handler::{AsyncBatchHandler, BatchHandler},
};

/// Handler normalized into an always-asynchronous form.
///
/// Invoking it returns a future that can be awaited and whose failure can be
/// observed, regardless of whether the underlying handler blocks or not.
pub trait Dispatcher<T>: Send + Sync + 'static {
    fn dispatch(&self, batch: Vec<T>) -> BoxFuture<'static, Result<(), HandlerError>>;
}

/// Sync execution mode - runs the handler via `spawn_blocking`.
pub struct SyncExecution<H, T> {
    handler: Arc<H>,
    _m: PhantomData<fn(T)>,
}

/// Async execution mode - polls the handler future on the runtime.
pub struct AsyncExecution<H, T> {
    handler: Arc<H>,
    _m: PhantomData<fn(T)>,
}

impl<H, T> SyncExecution<H, T> {
    pub fn new(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
            _m: PhantomData,
        }
    }
}

impl<H, T> AsyncExecution<H, T> {
    pub fn new(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
            _m: PhantomData,
        }
    }
}

impl<H, T> Dispatcher<T> for SyncExecution<H, T>
where
    H: BatchHandler<T> + 'static,
    T: Send + 'static,
{
    fn dispatch(&self, batch: Vec<T>) -> BoxFuture<'static, Result<(), HandlerError>> {
        let handler = self.handler.clone();

        async move {
            match tokio::task::spawn_blocking(move || handler.handle(batch)).await {
                Ok(resp) => resp.map_err(HandlerError::failed),
                Err(err) if err.is_panic() => Err(HandlerError::from_panic(err.into_panic())),
                Err(_) => Err(HandlerError::Cancelled),
            }
        }
        .boxed()
    }
}

impl<H, T> Dispatcher<T> for AsyncExecution<H, T>
where
    H: AsyncBatchHandler<T> + 'static,
    T: Send + 'static,
{
    fn dispatch(&self, batch: Vec<T>) -> BoxFuture<'static, Result<(), HandlerError>> {
        let handler = self.handler.clone();

        async move {
            let fut = async move { handler.handle(batch).await };

            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(resp) => resp.map_err(HandlerError::failed),
                Err(payload) => Err(HandlerError::from_panic(payload)),
            }
        }
        .boxed()
    }
}
