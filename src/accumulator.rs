use std::{
    fmt, mem,
    sync::{atomic::Ordering, Arc, Weak},
    time::Duration,
};

use parking_lot::Mutex;
use tokio::{runtime::Handle, sync::Notify, task::JoinHandle};

use crate::{
    builder::AccumulatorBuilder,
    config::AccumulatorConfig,
    error::ConfigError,
    execution::{AsyncExecution, Dispatcher, SyncExecution},
    handler::{AsyncBatchHandler, BatchHandler},
    logger::{DefaultLogger, LogEntry, Logger},
    stats::{Counters, Stats},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    Size,
    Timer,
    Manual,
    Drop,
}

impl fmt::Display for FlushTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FlushTrigger::Size => "size",
            FlushTrigger::Timer => "timer",
            FlushTrigger::Manual => "manual",
            FlushTrigger::Drop => "drop",
        })
    }
}

struct PendingTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

struct State<T> {
    buffer: Vec<T>,
    timer: Option<PendingTimer>,
    generation: u64,
}

impl<T> State<T> {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.handle.abort();
        }
    }
}

/// Everything a detached delivery task needs; outlives the accumulator.
struct Delivery<T> {
    name: String,
    dispatcher: Arc<dyn Dispatcher<T>>,
    logger: Arc<dyn Logger>,
    counters: Counters,
    idle: Notify,
}

struct InFlightGuard<T: 'static>(Arc<Delivery<T>>);

impl<T: 'static> Drop for InFlightGuard<T> {
    fn drop(&mut self) {
        if self.0.counters.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

impl<T: Send + 'static> Delivery<T> {
    fn deliver(self: &Arc<Self>, runtime: &Handle, batch: Vec<T>, trigger: FlushTrigger) {
        let len = batch.len();
        self.logger.debug(
            &LogEntry::new(&self.name, format!("{} flush", trigger)).with_batch_len(len),
        );

        self.counters.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlightGuard(self.clone());
        let fut = self.dispatcher.dispatch(batch);

        runtime.spawn(async move {
            let this = &guard.0;

            if let Err(err) = fut.await {
                Counters::incr(&this.counters.failed_batches);
                this.logger.error(
                    &LogEntry::new(&this.name, format!("batch handler failed: {}", err))
                        .with_stack(err.stack())
                        .with_batch_len(len),
                );
            }
        });
    }
}

struct Inner<T: Send + 'static> {
    window: Duration,
    max_batch_size: usize,
    runtime: Handle,
    state: Mutex<State<T>>,
    delivery: Arc<Delivery<T>>,
}

impl<T: Send + 'static> Inner<T> {
    fn arm_timer(self: &Arc<Self>, state: &mut State<T>) {
        state.generation = state.generation.wrapping_add(1);
        let generation = state.generation;
        let window = self.window;
        let weak: Weak<Self> = Arc::downgrade(self);

        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(window).await;

            if let Some(inner) = weak.upgrade() {
                inner.on_timer(generation);
            }
        });

        state.timer = Some(PendingTimer { generation, handle });
    }

    fn on_timer(&self, generation: u64) {
        let batch = {
            let mut state = self.state.lock();

            // cancelled or superseded while this callback was waking up
            match &state.timer {
                Some(timer) if timer.generation == generation => {}
                _ => return,
            }

            state.timer = None;
            mem::take(&mut state.buffer)
        };

        if batch.is_empty() {
            return;
        }

        Counters::incr(&self.delivery.counters.timer_flushes);
        self.delivery.deliver(&self.runtime, batch, FlushTrigger::Timer);
    }
}

impl<T: Send + 'static> Drop for Inner<T> {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        state.cancel_timer();

        let batch = mem::take(&mut state.buffer);
        if !batch.is_empty() {
            self.delivery.deliver(&self.runtime, batch, FlushTrigger::Drop);
        }
    }
}

/// Collects items and hands them to a handler in batches.
///
/// A batch is delivered as soon as it holds `max_batch_size` items, or once
/// `window` has elapsed since the first item of the batch was added,
/// whichever comes first. Delivery happens on a detached task: producers are
/// never blocked by the handler, and handler failures are reported to the
/// [`Logger`] instead of the producer.
///
/// The handle is cheap to clone; all clones feed the same buffer. When the
/// last clone is dropped, anything still buffered is delivered.
pub struct BatchAccumulator<T: Send + 'static> {
    inner: Arc<Inner<T>>,
}

impl<T: Send + 'static> Clone for BatchAccumulator<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + 'static> fmt::Debug for BatchAccumulator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchAccumulator")
            .field("name", &self.inner.delivery.name)
            .field("window", &self.inner.window)
            .field("max_batch_size", &self.inner.max_batch_size)
            .field("len", &self.len())
            .finish()
    }
}

impl<T: Send + 'static> BatchAccumulator<T> {
    pub fn builder() -> AccumulatorBuilder<T> {
        AccumulatorBuilder::new()
    }

    /// Creates an accumulator delivering to a blocking handler.
    pub fn new_sync<H>(config: AccumulatorConfig, handler: H) -> Result<Self, ConfigError>
    where
        H: BatchHandler<T> + 'static,
    {
        Self::with_dispatcher(
            config,
            Arc::new(SyncExecution::<H, T>::new(handler)),
            Arc::new(DefaultLogger),
        )
    }

    /// Creates an accumulator delivering to an async handler.
    pub fn new_async<H>(config: AccumulatorConfig, handler: H) -> Result<Self, ConfigError>
    where
        H: AsyncBatchHandler<T> + 'static,
    {
        Self::with_dispatcher(
            config,
            Arc::new(AsyncExecution::<H, T>::new(handler)),
            Arc::new(DefaultLogger),
        )
    }

    /// Must be called from within a tokio runtime; timers and deliveries
    /// are spawned onto it.
    pub fn with_dispatcher(
        config: AccumulatorConfig,
        dispatcher: Arc<dyn Dispatcher<T>>,
        logger: Arc<dyn Logger>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let runtime = Handle::try_current()?;

        Ok(Self {
            inner: Arc::new(Inner {
                window: config.window(),
                max_batch_size: config.max_batch_size,
                runtime,
                state: Mutex::new(State {
                    buffer: Vec::new(),
                    timer: None,
                    generation: 0,
                }),
                delivery: Arc::new(Delivery {
                    name: config.resolved_name(),
                    dispatcher,
                    logger,
                    counters: Counters::default(),
                    idle: Notify::new(),
                }),
            }),
        })
    }

    /// Adds an item to the current batch.
    ///
    /// Never blocks and never fails. If the item fills the batch up to
    /// `max_batch_size`, the batch (including this item) is dispatched
    /// immediately and the window timer is cancelled; otherwise the window
    /// timer is armed if it is not already running.
    pub fn add_item(&self, value: T) {
        let inner = &self.inner;
        Counters::incr(&inner.delivery.counters.items_added);

        let batch = {
            let mut state = inner.state.lock();
            state.buffer.push(value);

            if state.buffer.len() >= inner.max_batch_size {
                state.cancel_timer();
                Some(mem::take(&mut state.buffer))
            } else {
                if state.timer.is_none() {
                    inner.arm_timer(&mut state);
                }

                None
            }
        };

        if let Some(batch) = batch {
            Counters::incr(&inner.delivery.counters.size_flushes);
            inner.delivery.deliver(&inner.runtime, batch, FlushTrigger::Size);
        }
    }

    /// Dispatches the current buffer right away, then waits until every
    /// in-flight handler invocation has completed.
    pub async fn flush(&self) {
        let batch = {
            let mut state = self.inner.state.lock();
            state.cancel_timer();
            mem::take(&mut state.buffer)
        };

        if !batch.is_empty() {
            Counters::incr(&self.inner.delivery.counters.manual_flushes);
            let inner = &self.inner;
            inner.delivery.deliver(&inner.runtime, batch, FlushTrigger::Manual);
        }

        self.idle().await;
    }

    /// Waits until every in-flight handler invocation has completed.
    ///
    /// Does not flush; items still buffered stay buffered.
    pub async fn idle(&self) {
        let delivery = &self.inner.delivery;

        loop {
            let notified = delivery.idle.notified();
            if delivery.counters.in_flight.load(Ordering::SeqCst) == 0 {
                return;
            }

            notified.await;
        }
    }

    /// Flushes and waits for the handler. The accumulator stays usable.
    pub async fn close(&self) {
        self.flush().await;

        let delivery = &self.inner.delivery;
        delivery.logger.info(&LogEntry::new(&delivery.name, "closed"));
    }

    pub fn name(&self) -> &str {
        &self.inner.delivery.name
    }

    pub fn window(&self) -> Duration {
        self.inner.window
    }

    pub fn max_batch_size(&self) -> usize {
        self.inner.max_batch_size
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_pending_timer(&self) -> bool {
        self.inner.state.lock().timer.is_some()
    }

    pub fn stats(&self) -> Stats {
        let counters = &self.inner.delivery.counters;
        let (batch_size, timer_pending) = {
            let state = self.inner.state.lock();
            (state.buffer.len(), state.timer.is_some())
        };

        Stats {
            name: self.inner.delivery.name.clone(),
            items_added: Counters::get(&counters.items_added),
            size_flushes: Counters::get(&counters.size_flushes),
            timer_flushes: Counters::get(&counters.timer_flushes),
            manual_flushes: Counters::get(&counters.manual_flushes),
            failed_batches: Counters::get(&counters.failed_batches),
            in_flight: counters.in_flight.load(Ordering::SeqCst),
            batch_size,
            batch_capacity: self.inner.max_batch_size,
            timer_pending,
        }
    }
}
