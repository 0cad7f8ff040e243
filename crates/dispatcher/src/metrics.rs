//! Sink metrics for observability

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};

/// Metrics for a single sink
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Current queue length
    queue_len: AtomicUsize,
    /// Total successful writes (headers included)
    write_count: AtomicU64,
    /// Sample records successfully written
    samples_written: AtomicU64,
    /// Total write failures
    failure_count: AtomicU64,
    /// Current run of failed writes
    consecutive_failures: AtomicU32,
    /// Records discarded because the sink was degraded
    skipped_count: AtomicU64,
    degraded: AtomicBool,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current queue length
    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    /// Set current queue length
    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    /// Get total write count
    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    pub fn samples_written(&self) -> u64 {
        self.samples_written.load(Ordering::Relaxed)
    }

    /// Record a successful write; resets the failure run
    pub fn record_write(&self, is_sample: bool) {
        self.write_count.fetch_add(1, Ordering::Relaxed);
        if is_sample {
            self.samples_written.fetch_add(1, Ordering::Relaxed);
        }
        self.consecutive_failures.store(0, Ordering::Relaxed);
    }

    /// Get failure count
    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    /// Record a failed write, returning the new consecutive count
    pub fn record_failure(&self) -> u32 {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn skipped_count(&self) -> u64 {
        self.skipped_count.load(Ordering::Relaxed)
    }

    pub fn inc_skipped_count(&self) {
        self.skipped_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    /// Mark degraded; returns true only for the call that flipped the flag
    pub fn mark_degraded(&self) -> bool {
        !self.degraded.swap(true, Ordering::AcqRel)
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queue_len(),
            write_count: self.write_count(),
            samples_written: self.samples_written(),
            failure_count: self.failure_count(),
            skipped_count: self.skipped_count(),
            degraded: self.is_degraded(),
        }
    }
}

/// Snapshot of sink metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub write_count: u64,
    pub samples_written: u64,
    pub failure_count: u64,
    pub skipped_count: u64,
    pub degraded: bool,
}
