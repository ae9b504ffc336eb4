//! Diagnostics sink for accumulators.

use std::fmt;

/// A single diagnostic record emitted by an accumulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Name of the accumulator that emitted the entry.
    pub accumulator: String,
    pub message: String,
    /// Cause chain of a handler failure, if it has one.
    pub stack: Option<String>,
    pub batch_len: Option<usize>,
}

impl LogEntry {
    pub fn new(accumulator: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            accumulator: accumulator.into(),
            message: message.into(),
            stack: None,
            batch_len: None,
        }
    }

    pub fn with_stack(mut self, stack: Option<String>) -> Self {
        self.stack = stack;
        self
    }

    pub fn with_batch_len(mut self, len: usize) -> Self {
        self.batch_len = Some(len);
        self
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.accumulator, self.message)?;

        if let Some(len) = self.batch_len {
            write!(f, " (batch of {})", len)?;
        }

        if let Some(stack) = &self.stack {
            write!(f, "\n{}", stack)?;
        }

        Ok(())
    }
}

/// Leveled sink for accumulator diagnostics.
///
/// `error` receives every handler failure; `debug` receives one entry per
/// flush; `info` is used on close.
pub trait Logger: Send + Sync + 'static {
    fn debug(&self, entry: &LogEntry);
    fn info(&self, entry: &LogEntry);
    fn warn(&self, entry: &LogEntry);
    fn error(&self, entry: &LogEntry);
}

/// Forwards entries to the [`log`] facade under the `batch_accumulator` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultLogger;

const TARGET: &str = "batch_accumulator";

impl Logger for DefaultLogger {
    fn debug(&self, entry: &LogEntry) {
        log::debug!(target: TARGET, "{}", entry);
    }

    fn info(&self, entry: &LogEntry) {
        log::info!(target: TARGET, "{}", entry);
    }

    fn warn(&self, entry: &LogEntry) {
        log::warn!(target: TARGET, "{}", entry);
    }

    fn error(&self, entry: &LogEntry) {
        log::error!(target: TARGET, "{}", entry);
    }
}
