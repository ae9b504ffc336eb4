//! Statistics for batch accumulators.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of an accumulator's counters and current state.
///
/// Returned by [`BatchAccumulator::stats()`](crate::BatchAccumulator::stats).
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    /// Label of the accumulator.
    pub name: String,

    /// Total number of items passed to `add_item`.
    pub items_added: u64,

    /// Flushes caused by reaching the size threshold.
    pub size_flushes: u64,

    /// Flushes caused by the window elapsing.
    pub timer_flushes: u64,

    /// Flushes requested through `flush`/`close`.
    pub manual_flushes: u64,

    /// Batches whose handler invocation failed or panicked.
    pub failed_batches: u64,

    /// Handler invocations dispatched but not yet completed.
    pub in_flight: u64,

    /// Current number of items in the buffer.
    pub batch_size: usize,

    /// Size threshold.
    pub batch_capacity: usize,

    /// Whether a window timer is currently armed.
    pub timer_pending: bool,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub items_added: AtomicU64,
    pub size_flushes: AtomicU64,
    pub timer_flushes: AtomicU64,
    pub manual_flushes: AtomicU64,
    pub failed_batches: AtomicU64,
    pub in_flight: AtomicU64,
}

impl Counters {
    #[inline]
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}
