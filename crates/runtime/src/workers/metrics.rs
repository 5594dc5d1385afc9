//! Request queue metrics and statistics.
//!
//! Tracks throughput, failure counts and queue depth of the serial worker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Request metrics tracked by [`QueueWorker`](super::QueueWorker).
///
/// Uses atomics for lock-free access across threads.
#[derive(Debug, Default)]
pub struct QueueMetrics {
    /// Requests whose transport call returned a response
    completed: AtomicU64,

    /// Requests whose transport call failed
    failed: AtomicU64,

    /// Requests accepted but not yet started
    queue_depth: AtomicU64,

    /// Peak queue depth observed
    peak_queue_depth: AtomicU64,

    /// Sum of all transport round-trip durations, in nanoseconds
    total_latency_nanos: AtomicU64,
}

impl QueueMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_enqueued(&self) {
        let depth = self.queue_depth.fetch_add(1, Ordering::Relaxed) + 1;

        let mut current_peak = self.peak_queue_depth.load(Ordering::Relaxed);
        while depth > current_peak {
            match self.peak_queue_depth.compare_exchange_weak(
                current_peak,
                depth,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current_peak = actual,
            }
        }
    }

    pub(crate) fn record_dequeued(&self) {
        // Saturating: a push that raced a closed queue never reaches the worker
        let _ = self
            .queue_depth
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |depth| {
                depth.checked_sub(1)
            });
    }

    pub(crate) fn record_success(&self, latency: Duration) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.total_latency_nanos
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn queue_depth(&self) -> u64 {
        self.queue_depth.load(Ordering::Relaxed)
    }

    pub fn peak_queue_depth(&self) -> u64 {
        self.peak_queue_depth.load(Ordering::Relaxed)
    }

    /// Average round-trip time of successful requests.
    pub fn avg_latency(&self) -> Duration {
        let completed = self.completed.load(Ordering::Relaxed);
        if completed == 0 {
            Duration::ZERO
        } else {
            let total_nanos = self.total_latency_nanos.load(Ordering::Relaxed);
            Duration::from_nanos(total_nanos / completed)
        }
    }

    /// Creates a snapshot of all metrics for display/logging.
    ///
    /// Individual fields are read atomically but the snapshot as a whole may
    /// be inconsistent while requests are in flight.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            completed: self.completed(),
            failed: self.failed(),
            queue_depth: self.queue_depth(),
            peak_queue_depth: self.peak_queue_depth(),
            avg_latency: self.avg_latency(),
        }
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub completed: u64,
    pub failed: u64,
    pub queue_depth: u64,
    pub peak_queue_depth: u64,
    pub avg_latency: Duration,
}
