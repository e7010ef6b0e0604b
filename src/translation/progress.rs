/*!
 * Progress aggregation for a pipeline run.
 *
 * Counters are independent atomics: concurrent translation tasks increment
 * them without locking each other, and observers read point-in-time
 * snapshots on their own cadence.
 */

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use super::cancel::CancelSignal;

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub units_completed: usize,
    pub characters_translated: u64,
    pub usage_estimate: u64,
}

/// Thread-safe, increment-only progress counters
#[derive(Debug, Default)]
pub struct ProgressAggregator {
    units_completed: AtomicUsize,
    characters_translated: AtomicU64,
    usage_estimate: AtomicU64,
}

impl ProgressAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one successfully translated unit
    ///
    /// `translated_chars` feeds the translated-character counter, `billed_chars`
    /// (the source length the API charges for) feeds the usage estimate.
    pub fn record_completed(&self, translated_chars: u64, billed_chars: u64) {
        self.units_completed.fetch_add(1, Ordering::Relaxed);
        self.characters_translated.fetch_add(translated_chars, Ordering::Relaxed);
        self.usage_estimate.fetch_add(billed_chars, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            units_completed: self.units_completed.load(Ordering::Relaxed),
            characters_translated: self.characters_translated.load(Ordering::Relaxed),
            usage_estimate: self.usage_estimate.load(Ordering::Relaxed),
        }
    }
}

/// Transient state shared by everything taking part in one pipeline run
#[derive(Debug)]
pub struct PipelineRun {
    /// Correlates log lines of one run
    pub id: uuid::Uuid,
    pub progress: ProgressAggregator,
    /// Raised by the user, a hard-stop, or the quota watcher
    pub cancel: CancelSignal,
    /// Stops write-back before the next group; kept apart from `cancel` so a
    /// cancelled translation phase can still apply its partial results
    pub apply_abort: CancelSignal,
    pub started_at: Instant,
}

impl PipelineRun {
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            progress: ProgressAggregator::new(),
            cancel: CancelSignal::new(),
            apply_abort: CancelSignal::new(),
            started_at: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::new()
    }
}
