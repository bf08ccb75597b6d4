/*!
 * Tests for batch scheduling and cancellation
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use synsync::sync::scheduler::{ScheduleSummary, progress_percent};
use synsync::sync::{BatchScheduler, SchedulerConfig};

#[test]
fn test_batchSizes_withDefaultConfig_shouldSplitIntoTwenties() {
    let scheduler = BatchScheduler::new(SchedulerConfig::default());
    assert_eq!(scheduler.batch_sizes(45), vec![20, 20, 5]);
    assert_eq!(scheduler.batch_sizes(20), vec![20]);
    assert_eq!(scheduler.batch_sizes(1), vec![1]);
}

#[test]
fn test_progressPercent_shouldRoundToNearest() {
    assert_eq!(progress_percent(1, 8), 13);
    assert_eq!(progress_percent(1, 200), 1);
    assert_eq!(progress_percent(7, 8), 88);
}

/// With default pacing, 21 items take 20 item pauses plus one batch pause
#[tokio::test(start_paused = true)]
async fn test_run_withDefaultPacing_shouldWaitBetweenItemsAndBatches() {
    let scheduler = BatchScheduler::new(SchedulerConfig::default());
    let cancel = CancellationToken::new();
    let items: Vec<u32> = (0..21).collect();
    let start = Instant::now();

    let summary = scheduler.run(&items, &cancel, |_| async {}, |_, _, _| {}).await;

    let elapsed = start.elapsed();
    assert_eq!(summary, ScheduleSummary { processed: 21, total: 21, cancelled: false });
    assert!(elapsed >= Duration::from_millis(20 * 1200 + 2000), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(20 * 1200 + 2100), "elapsed {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_run_items_shouldNeverOverlap() {
    let scheduler = BatchScheduler::new(SchedulerConfig::without_delays(3));
    let cancel = CancellationToken::new();
    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_in_flight = Arc::new(AtomicUsize::new(0));

    scheduler
        .run(
            &[1, 2, 3, 4, 5],
            &cancel,
            |_| {
                let in_flight = in_flight.clone();
                let max_in_flight = max_in_flight.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    max_in_flight.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                }
            },
            |_, _, _| {},
        )
        .await;

    assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_run_cancelledDuringBatchPause_shouldReportProcessedCount() {
    let scheduler = BatchScheduler::new(SchedulerConfig {
        batch_size: 2,
        item_delay: Duration::from_millis(100),
        batch_delay: Duration::from_secs(60),
    });
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let summary = scheduler.run(&[1, 2, 3, 4], &cancel, |_| async {}, |_, _, _| {}).await;

    assert_eq!(summary, ScheduleSummary { processed: 2, total: 4, cancelled: true });
}

#[tokio::test]
async fn test_run_withNoItems_shouldReturnImmediately() {
    let scheduler = BatchScheduler::new(SchedulerConfig::default());
    let summary = scheduler
        .run(&Vec::<u32>::new(), &CancellationToken::new(), |_| async {}, |_, _, _| {})
        .await;
    assert_eq!(summary, ScheduleSummary { processed: 0, total: 0, cancelled: false });
}
