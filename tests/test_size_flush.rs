use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use batch_accumulator::{AccumulatorConfig, AsyncBatchHandler, BatchAccumulator};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::time::sleep;

#[derive(Debug, Error)]
enum Error {
    #[error("never happens")]
    Never,
}

struct TmpReceiver {
    batches: Arc<Mutex<Vec<Vec<i32>>>>,
}

#[async_trait]
impl AsyncBatchHandler<i32> for TmpReceiver {
    type Error = Error;

    async fn handle(&self, batch: Vec<i32>) -> Result<(), Self::Error> {
        if batch.is_empty() {
            return Err(Error::Never);
        }

        self.batches.lock().push(batch);
        Ok(())
    }
}

fn accumulator(
    window_ms: u64,
    max_batch_size: usize,
) -> (BatchAccumulator<i32>, Arc<Mutex<Vec<Vec<i32>>>>) {
    let batches = Arc::new(Mutex::new(Vec::new()));

    let acc = BatchAccumulator::builder()
        .window(Duration::from_millis(window_ms))
        .max_batch_size(max_batch_size)
        .async_handler(TmpReceiver {
            batches: batches.clone(),
        })
        .build()
        .unwrap();

    (acc, batches)
}

#[tokio::test(start_paused = true)]
async fn test_size_flush_delivers_full_batches() {
    let (acc, batches) = accumulator(50_000, 10);

    for i in 1..=100 {
        acc.add_item(i);
    }

    assert!(acc.is_empty());
    assert!(!acc.has_pending_timer());

    acc.idle().await;

    let mut lock = batches.lock();
    lock.sort_by(|a, b| a[0].cmp(&b[0]));

    let expected: Vec<Vec<i32>> = (0..10)
        .map(|n| ((n * 10 + 1)..=(n * 10 + 10)).collect())
        .collect();

    assert_eq!(lock.as_slice(), expected.as_slice());
}

#[tokio::test(start_paused = true)]
async fn test_no_timer_flush_after_size_flush() {
    let (acc, batches) = accumulator(1000, 3);

    acc.add_item(1);
    acc.add_item(2);
    assert!(acc.has_pending_timer());

    acc.add_item(3);
    assert!(!acc.has_pending_timer());
    assert!(acc.is_empty());

    sleep(Duration::from_secs(5)).await;

    assert_eq!(batches.lock().as_slice(), &[vec![1, 2, 3]]);

    let stats = acc.stats();
    assert_eq!(stats.size_flushes, 1);
    assert_eq!(stats.timer_flushes, 0);
}

#[tokio::test(start_paused = true)]
async fn test_remainder_goes_out_with_the_window() {
    let (acc, batches) = accumulator(1000, 3);

    for i in 1..=5 {
        acc.add_item(i);
    }

    acc.idle().await;
    assert_eq!(batches.lock().as_slice(), &[vec![1, 2, 3]]);
    assert_eq!(acc.len(), 2);
    assert!(acc.has_pending_timer());

    sleep(Duration::from_millis(1100)).await;
    assert_eq!(batches.lock().as_slice(), &[vec![1, 2, 3], vec![4, 5]]);
    assert!(acc.is_empty());
    assert!(!acc.has_pending_timer());
}

#[tokio::test(start_paused = true)]
async fn test_size_one_never_arms_timer() {
    let (acc, batches) = accumulator(1000, 1);

    for i in 0..5 {
        acc.add_item(i);
        assert!(!acc.has_pending_timer());
        assert!(acc.is_empty());
    }

    acc.idle().await;

    let mut lock = batches.lock();
    lock.sort();
    assert_eq!(lock.as_slice(), &[vec![0], vec![1], vec![2], vec![3], vec![4]]);
}

#[tokio::test(start_paused = true)]
async fn test_mixed_triggers_keep_insertion_order() {
    let (acc, batches) = accumulator(100, 4);

    for i in 0..10 {
        acc.add_item(i);
    }

    sleep(Duration::from_millis(150)).await;

    for i in 10..13 {
        acc.add_item(i);
    }

    sleep(Duration::from_millis(150)).await;

    let mut lock = batches.lock();
    lock.sort_by(|a, b| a[0].cmp(&b[0]));

    assert_eq!(
        lock.as_slice(),
        &[
            vec![0, 1, 2, 3],
            vec![4, 5, 6, 7],
            vec![8, 9],
            vec![10, 11, 12]
        ]
    );

    let stats = acc.stats();
    assert_eq!(stats.items_added, 13);
    assert_eq!(stats.size_flushes, 2);
    assert_eq!(stats.timer_flushes, 2);
    assert_eq!(stats.failed_batches, 0);
}
