/*!
 * Rate-limited batch scheduling.
 *
 * Items are processed strictly one at a time, in fixed-size batches, with a
 * pause after every item and a longer pause between batches. Both remote
 * services enforce global rate limits that these pauses are calibrated
 * against, so nothing here ever runs two items concurrently.
 */

use std::future::Future;
use std::time::Duration;

use log::debug;
use tokio_util::sync::CancellationToken;

/// Default number of items per batch
pub const DEFAULT_BATCH_SIZE: usize = 20;
/// Default pause after each item
pub const DEFAULT_ITEM_DELAY_MS: u64 = 1200;
/// Default additional pause between batches
pub const DEFAULT_BATCH_DELAY_MS: u64 = 2000;

/// Pacing settings for the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Number of items per batch
    pub batch_size: usize,
    /// Pause after every item except the very last one
    pub item_delay: Duration,
    /// Additional pause after the last item of every batch except the last one
    pub batch_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            item_delay: Duration::from_millis(DEFAULT_ITEM_DELAY_MS),
            batch_delay: Duration::from_millis(DEFAULT_BATCH_DELAY_MS),
        }
    }
}

impl SchedulerConfig {
    /// Config without any pauses, for tests and dry runs
    pub fn without_delays(batch_size: usize) -> Self {
        Self {
            batch_size,
            item_delay: Duration::ZERO,
            batch_delay: Duration::ZERO,
        }
    }
}

/// Progress snapshot delivered after each completed item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleProgress {
    /// Items completed so far
    pub completed: usize,
    /// Items in the run
    pub total: usize,
    /// 1-based index of the batch the item belonged to
    pub batch: usize,
    /// Number of batches in the run
    pub batches: usize,
    /// Rounded completion percentage
    pub percent: u8,
}

/// Result of a scheduled run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSummary {
    /// Items whose callback completed
    pub processed: usize,
    /// Items handed to the run
    pub total: usize,
    /// Whether the run stopped because of cancellation
    pub cancelled: bool,
}

/// Completion percentage, rounded, that only reaches 100 once everything is done
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 || completed >= total {
        return 100;
    }
    let rounded = (completed * 200 + total) / (total * 2);
    rounded.min(99) as u8
}

/// Drives items through fixed-size batches with mandatory pauses
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    config: SchedulerConfig,
}

impl BatchScheduler {
    /// Create a scheduler; a batch size of zero is treated as one
    pub fn new(mut config: SchedulerConfig) -> Self {
        config.batch_size = config.batch_size.max(1);
        Self { config }
    }

    /// Pacing settings in use
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Sizes of the batches `total` items are split into
    pub fn batch_sizes(&self, total: usize) -> Vec<usize> {
        let size = self.config.batch_size;
        let full = total / size;
        let mut sizes = vec![size; full];
        if total % size != 0 {
            sizes.push(total % size);
        }
        sizes
    }

    /// Run `on_item` for every item, in order, honouring the pauses
    ///
    /// `cancel` is checked before every item; once it fires no further item is
    /// started and pending pauses are abandoned. `on_done` receives each
    /// item's output together with the progress after that item.
    pub async fn run<T, O, F, Fut, D>(
        &self,
        items: &[T],
        cancel: &CancellationToken,
        mut on_item: F,
        mut on_done: D,
    ) -> ScheduleSummary
    where
        F: FnMut(&T) -> Fut,
        Fut: Future<Output = O>,
        D: FnMut(&T, O, ScheduleProgress),
    {
        let total = items.len();
        let batches: Vec<&[T]> = items.chunks(self.config.batch_size).collect();
        let batch_count = batches.len();
        let mut processed = 0;

        for (batch_index, batch) in batches.iter().enumerate() {
            debug!("Starting batch {} of {} ({} items)", batch_index + 1, batch_count, batch.len());

            for (position, item) in batch.iter().enumerate() {
                if cancel.is_cancelled() {
                    return ScheduleSummary { processed, total, cancelled: true };
                }

                let output = on_item(item).await;
                processed += 1;
                on_done(
                    item,
                    output,
                    ScheduleProgress {
                        completed: processed,
                        total,
                        batch: batch_index + 1,
                        batches: batch_count,
                        percent: progress_percent(processed, total),
                    },
                );

                let last_in_batch = position + 1 == batch.len();
                if last_in_batch && batch_index + 1 == batch_count {
                    break;
                }

                let mut delay = self.config.item_delay;
                if last_in_batch {
                    delay += self.config.batch_delay;
                }
                if !pause(delay, cancel).await {
                    return ScheduleSummary { processed, total, cancelled: true };
                }
            }
        }

        ScheduleSummary { processed, total, cancelled: false }
    }
}

/// Sleep for `delay` unless cancelled first; returns false on cancellation
async fn pause(delay: Duration, cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    if delay.is_zero() {
        return true;
    }
    tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        _ = cancel.cancelled() => false,
    }
}
