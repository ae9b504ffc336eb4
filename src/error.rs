use std::time::Duration;

use thiserror::Error;
use tokio::runtime::TryCurrentError;

use crate::config::{MAX_BATCH_SIZE, MAX_WINDOW_MS};

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub trait StdSyncSendError: std::error::Error + Send + Sync + 'static {}
impl<T: std::error::Error + Send + Sync + 'static> StdSyncSendError for T {}

/// Rejected accumulator configuration. Returned from construction only.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("window must be between 1ms and {max}ms, got {0:?}", max = MAX_WINDOW_MS)]
    InvalidWindow(Duration),

    #[error("max batch size must be between 1 and {max}, got {0}", max = MAX_BATCH_SIZE)]
    InvalidBatchSize(usize),

    #[error("batch handler is not set")]
    MissingHandler,

    #[error("accumulator must be created inside a tokio runtime: {0}")]
    NoRuntime(#[from] TryCurrentError),
}

/// Failure of a single handler invocation.
///
/// Never returned to producers; the accumulator hands it to its
/// [`Logger`](crate::Logger) and moves on.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Failed(#[source] BoxError),

    #[error("handler panicked: {0}")]
    Panicked(String),

    #[error("blocking handler task was cancelled")]
    Cancelled,
}

impl HandlerError {
    pub fn failed<E: Into<BoxError>>(err: E) -> Self {
        Self::Failed(err.into())
    }

    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let msg = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };

        Self::Panicked(msg)
    }

    /// Source chain of the error, one cause per line, outermost first.
    pub fn stack(&self) -> Option<String> {
        let mut causes = Vec::new();
        let mut source = std::error::Error::source(self);

        // `Failed` is transparent over its source, skip the duplicate
        if let HandlerError::Failed(_) = self {
            source = source.and_then(|s| s.source());
        }

        while let Some(err) = source {
            causes.push(format!("caused by: {}", err));
            source = err.source();
        }

        if causes.is_empty() {
            None
        } else {
            Some(causes.join("\n"))
        }
    }
}
