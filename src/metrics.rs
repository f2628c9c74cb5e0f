// Lightweight dispatch metrics, tracked lock-free with atomics.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Counters for the dispatch engine.
///
/// Updated by the worker thread on every executed task and readable from any
/// thread; useful for logging a summary on shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Tasks that executed and returned successfully.
    pub tasks_completed: AtomicUsize,

    /// Tasks that failed with a domain error.
    pub tasks_failed: AtomicUsize,

    /// Cumulative task execution time in milliseconds.
    pub total_execution_time_ms: AtomicU64,

    /// Poller samples broadcast across all pollers.
    pub poller_batches: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            tasks_completed: AtomicUsize::new(0),
            tasks_failed: AtomicUsize::new(0),
            total_execution_time_ms: AtomicU64::new(0),
            poller_batches: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_task_completed(&self) {
        self.tasks_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_task_failed(&self) {
        self.tasks_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_execution_time(&self, duration: Duration) {
        self.total_execution_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_poller_batch(&self) {
        self.poller_batches.fetch_add(1, Ordering::Relaxed);
    }

    /// Time since the metrics (and the service) were created.
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log a one-line summary at info level.
    pub fn log_summary(&self) {
        tracing::info!(
            tasks_completed = self.tasks_completed.load(Ordering::Relaxed),
            tasks_failed = self.tasks_failed.load(Ordering::Relaxed),
            total_execution_time_ms = self.total_execution_time_ms.load(Ordering::Relaxed),
            poller_batches = self.poller_batches.load(Ordering::Relaxed),
            uptime_s = self.uptime().as_secs(),
            "dispatch metrics"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
