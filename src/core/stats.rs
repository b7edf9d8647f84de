//! Engine statistics
//!
//! Counters are updated from both producer threads and the drain worker.
//! All of them sit behind one dedicated lock, separate from the queue and
//! configuration locks, so a snapshot is always a state that really existed.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Point-in-time copy of the counters
///
/// # Example
///
/// ```
/// use rust_async_log_engine::StatsRegistry;
/// use std::time::Duration;
///
/// let stats = StatsRegistry::new();
/// stats.record_submitted();
/// stats.record_dispatched(Duration::from_micros(40));
///
/// let snapshot = stats.snapshot();
/// assert_eq!(snapshot.total_submitted, 1);
/// assert_eq!(snapshot.total_write_micros, 40);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogStats {
    /// Records that passed the gate and filters and were offered to the queue
    pub total_submitted: u64,
    /// Records rejected because the queue was full (or already closed)
    pub total_dropped: u64,
    /// Largest queue depth observed
    pub peak_queue_depth: usize,
    /// Wall time spent in sink writes, in microseconds
    pub total_write_micros: u64,
    /// Lines handed to the sinks by the worker
    pub total_dispatched: u64,
    /// Sink writes that failed
    pub sink_errors: u64,
}

impl LogStats {
    /// Drop rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been submitted.
    pub fn drop_rate(&self) -> f64 {
        if self.total_submitted == 0 {
            0.0
        } else {
            (self.total_dropped as f64 / self.total_submitted as f64) * 100.0
        }
    }
}

#[derive(Debug, Default)]
pub struct StatsRegistry {
    inner: Mutex<LogStats>,
}

impl StatsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_submitted(&self) {
        self.inner.lock().total_submitted += 1;
    }

    /// Record a dropped record, returning the new dropped total
    #[inline]
    pub fn record_dropped(&self) -> u64 {
        let mut stats = self.inner.lock();
        stats.total_dropped += 1;
        stats.total_dropped
    }

    #[inline]
    pub fn observe_depth(&self, depth: usize) {
        let mut stats = self.inner.lock();
        if depth > stats.peak_queue_depth {
            stats.peak_queue_depth = depth;
        }
    }

    #[inline]
    pub fn record_dispatched(&self, elapsed: Duration) {
        let mut stats = self.inner.lock();
        stats.total_dispatched += 1;
        stats.total_write_micros = stats
            .total_write_micros
            .saturating_add(u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX));
    }

    #[inline]
    pub fn record_sink_error(&self) {
        self.inner.lock().sink_errors += 1;
    }

    pub fn snapshot(&self) -> LogStats {
        *self.inner.lock()
    }

    pub fn reset(&self) {
        *self.inner.lock() = LogStats::default();
    }
}
