use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use serde_derive::Deserialize;

use crate::error::ConfigError;

/// Largest window a timer may be armed with, in milliseconds (`2^31 - 1`).
pub const MAX_WINDOW_MS: u64 = 2_147_483_647;

/// Largest accepted size threshold.
pub const MAX_BATCH_SIZE: usize = 100_000_000;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Static configuration of a [`BatchAccumulator`](crate::BatchAccumulator).
///
/// Can be deserialized from any serde format:
///
/// ```json
/// { "window_ms": 200, "max_batch_size": 500, "name": "bulk-writer" }
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AccumulatorConfig {
    /// Time-based flush trigger, in milliseconds.
    pub window_ms: u64,

    /// Count-based flush trigger and the largest batch ever delivered.
    pub max_batch_size: usize,

    /// Label attached to log entries, no behavioral effect.
    pub name: Option<String>,
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            window_ms: 1000,
            max_batch_size: 10_000,
            name: None,
        }
    }
}

impl AccumulatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        // saturate so an oversized duration fails validation instead of wrapping
        self.window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_window_ms(mut self, ms: u64) -> Self {
        self.window_ms = ms;
        self
    }

    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_WINDOW_MS).contains(&self.window_ms) {
            return Err(ConfigError::InvalidWindow(self.window()));
        }

        if !(1..=MAX_BATCH_SIZE).contains(&self.max_batch_size) {
            return Err(ConfigError::InvalidBatchSize(self.max_batch_size));
        }

        Ok(())
    }

    pub(crate) fn resolved_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("accumulator-{}", NEXT_ID.fetch_add(1, Ordering::Relaxed)),
        }
    }
}
