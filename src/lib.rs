//! Size- and time-triggered batching of items for a consumer-supplied handler.
//!
//! Producers call [`BatchAccumulator::add_item`]; the accumulator buffers the
//! items and delivers them to the handler as a `Vec` either when the buffer
//! reaches `max_batch_size` or when the window started by the first buffered
//! item elapses. Delivery runs on a detached tokio task, so producers are never
//! blocked, and handler failures are reported to a [`Logger`].
//!
//! ```rust,ignore
//! use batch_accumulator::{async_handler_fn, AccumulatorConfig, BatchAccumulator};
//!
//! let acc = BatchAccumulator::new_async(
//!     AccumulatorConfig::new().with_window_ms(200).with_max_batch_size(500),
//!     async_handler_fn(|rows: Vec<Row>| async move { db.bulk_insert(rows).await }),
//! )?;
//!
//! acc.add_item(row);
//! ```

mod accumulator;
mod builder;
pub mod config;
pub mod error;
pub mod execution;
pub mod handler;
pub mod logger;
pub mod stats;

pub use accumulator::{BatchAccumulator, FlushTrigger};
pub use builder::AccumulatorBuilder;
pub use config::AccumulatorConfig;
pub use error::{ConfigError, HandlerError, StdSyncSendError};
pub use handler::{async_handler_fn, handler_fn, AsyncBatchHandler, BatchHandler};
pub use logger::{DefaultLogger, LogEntry, Logger};
pub use stats::Stats;

pub use async_trait::async_trait;
