use std::{sync::Arc, time::Duration};

use crate::{
    accumulator::BatchAccumulator,
    config::AccumulatorConfig,
    error::ConfigError,
    execution::{AsyncExecution, Dispatcher, SyncExecution},
    handler::{AsyncBatchHandler, BatchHandler},
    logger::{DefaultLogger, Logger},
};

/// Step-by-step construction of a [`BatchAccumulator`].
///
/// ```rust,ignore
/// let acc = BatchAccumulator::builder()
///     .window(Duration::from_millis(200))
///     .max_batch_size(500)
///     .name("bulk-writer")
///     .async_handler(writer)
///     .logger(my_logger)
///     .build()?;
/// ```
#[must_use]
pub struct AccumulatorBuilder<T> {
    config: AccumulatorConfig,
    dispatcher: Option<Arc<dyn Dispatcher<T>>>,
    logger: Option<Arc<dyn Logger>>,
}

impl<T: Send + 'static> Default for AccumulatorBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> AccumulatorBuilder<T> {
    pub fn new() -> Self {
        Self {
            config: AccumulatorConfig::default(),
            dispatcher: None,
            logger: None,
        }
    }

    /// Replaces window, size and name at once.
    pub fn config(mut self, config: AccumulatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn window(mut self, window: Duration) -> Self {
        self.config = self.config.with_window(window);
        self
    }

    pub fn max_batch_size(mut self, size: usize) -> Self {
        self.config = self.config.with_max_batch_size(size);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config = self.config.with_name(name);
        self
    }

    /// Delivers batches to a blocking handler.
    pub fn handler<H>(mut self, handler: H) -> Self
    where
        H: BatchHandler<T> + 'static,
    {
        self.dispatcher = Some(Arc::new(SyncExecution::<H, T>::new(handler)));
        self
    }

    /// Delivers batches to an async handler.
    pub fn async_handler<H>(mut self, handler: H) -> Self
    where
        H: AsyncBatchHandler<T> + 'static,
    {
        self.dispatcher = Some(Arc::new(AsyncExecution::<H, T>::new(handler)));
        self
    }

    pub fn dispatcher(mut self, dispatcher: Arc<dyn Dispatcher<T>>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn logger<L: Logger>(mut self, logger: L) -> Self {
        self.logger = Some(Arc::new(logger));
        self
    }

    pub fn shared_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> Result<BatchAccumulator<T>, ConfigError> {
        self.config.validate()?;
        let dispatcher = self.dispatcher.ok_or(ConfigError::MissingHandler)?;
        let logger = self
            .logger
            .unwrap_or_else(|| Arc::new(DefaultLogger) as Arc<dyn Logger>);

        BatchAccumulator::with_dispatcher(self.config, dispatcher, logger)
    }
}
