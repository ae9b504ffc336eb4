use std::{io, time::Duration};

use batch_accumulator::{
    handler_fn, AccumulatorConfig, BatchAccumulator, BatchHandler, ConfigError,
};

struct Noop;

impl BatchHandler<u64> for Noop {
    type Error = io::Error;

    fn handle(&self, _batch: Vec<u64>) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[tokio::test]
async fn test_zero_window_rejected() {
    let res = BatchAccumulator::new_sync(AccumulatorConfig::new().with_window_ms(0), Noop);
    assert!(matches!(res, Err(ConfigError::InvalidWindow(w)) if w == Duration::ZERO));
}

#[tokio::test]
async fn test_zero_size_rejected() {
    let res = BatchAccumulator::new_sync(AccumulatorConfig::new().with_max_batch_size(0), Noop);
    assert!(matches!(res, Err(ConfigError::InvalidBatchSize(0))));
}

#[tokio::test]
async fn test_oversized_limits_rejected() {
    let res = BatchAccumulator::new_sync(
        AccumulatorConfig::new().with_window_ms(2_147_483_648),
        Noop,
    );
    assert!(matches!(res, Err(ConfigError::InvalidWindow(_))));

    let res = BatchAccumulator::new_sync(
        AccumulatorConfig::new().with_max_batch_size(100_000_001),
        Noop,
    );
    assert!(matches!(res, Err(ConfigError::InvalidBatchSize(100_000_001))));
}

#[tokio::test]
async fn test_builder_without_handler_rejected() {
    let res = BatchAccumulator::<u64>::builder()
        .window(Duration::from_millis(100))
        .max_batch_size(10)
        .build();

    assert!(matches!(res, Err(ConfigError::MissingHandler)));
}

#[tokio::test]
async fn test_builder_validates_limits_before_handler() {
    let res = BatchAccumulator::<u64>::builder().max_batch_size(0).build();
    assert!(matches!(res, Err(ConfigError::InvalidBatchSize(0))));
}

#[tokio::test]
async fn test_builder_applies_config() {
    let acc = BatchAccumulator::builder()
        .window(Duration::from_millis(250))
        .max_batch_size(42)
        .name("orders")
        .handler(Noop)
        .build()
        .unwrap();

    assert_eq!(acc.window(), Duration::from_millis(250));
    assert_eq!(acc.max_batch_size(), 42);
    assert_eq!(acc.name(), "orders");
    assert!(acc.is_empty());
    assert!(!acc.has_pending_timer());

    let stats = acc.stats();
    assert_eq!(stats.name, "orders");
    assert_eq!(stats.batch_capacity, 42);
    assert_eq!(stats.items_added, 0);
}

#[tokio::test]
async fn test_generated_name() {
    let a = BatchAccumulator::new_sync(AccumulatorConfig::default(), Noop).unwrap();
    let b = BatchAccumulator::new_sync(AccumulatorConfig::default(), Noop).unwrap();

    assert!(a.name().starts_with("accumulator-"));
    assert_ne!(a.name(), b.name());
}

#[tokio::test]
async fn test_config_from_json() {
    let config: AccumulatorConfig =
        serde_json::from_str(r#"{ "window_ms": 200, "max_batch_size": 500, "name": "bulk" }"#)
            .unwrap();

    let acc = BatchAccumulator::new_sync(
        config,
        handler_fn(|_: Vec<u8>| -> Result<(), io::Error> { Ok(()) }),
    )
    .unwrap();

    assert_eq!(acc.window(), Duration::from_millis(200));
    assert_eq!(acc.max_batch_size(), 500);
    assert_eq!(acc.name(), "bulk");
}

#[test]
fn test_partial_json_uses_defaults() {
    let config: AccumulatorConfig = serde_json::from_str(r#"{ "max_batch_size": 3 }"#).unwrap();

    assert_eq!(config.window_ms, 1000);
    assert_eq!(config.max_batch_size, 3);
    assert!(config.name.is_none());
}

#[test]
fn test_construction_needs_runtime() {
    let res = BatchAccumulator::new_sync(AccumulatorConfig::default(), Noop);
    assert!(matches!(res, Err(ConfigError::NoRuntime(_))));
}
