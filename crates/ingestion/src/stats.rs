//! Normalizer counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Normalizer metrics
#[derive(Debug, Default)]
pub struct NormalizeMetrics {
    /// Samples produced
    pub samples: AtomicU64,

    /// Samples missing at least one attached sensor
    pub partial_samples: AtomicU64,

    /// Attached sensors absent from a snapshot
    pub missing_readings: AtomicU64,

    /// Readings for sensors outside the attached set
    pub unattached_readings: AtomicU64,

    /// Raw qualities that were negative or NaN and became 0
    pub clamped_qualities: AtomicU64,
}

impl NormalizeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, missing: u64, unattached: u64) {
        self.samples.fetch_add(1, Ordering::Relaxed);
        if missing > 0 {
            self.partial_samples.fetch_add(1, Ordering::Relaxed);
            self.missing_readings.fetch_add(missing, Ordering::Relaxed);
        }
        if unattached > 0 {
            self.unattached_readings
                .fetch_add(unattached, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_clamped(&self, count: u64) {
        self.clamped_qualities.fetch_add(count, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> NormalizeStats {
        NormalizeStats {
            samples: self.samples.load(Ordering::Relaxed),
            partial_samples: self.partial_samples.load(Ordering::Relaxed),
            missing_readings: self.missing_readings.load(Ordering::Relaxed),
            unattached_readings: self.unattached_readings.load(Ordering::Relaxed),
            clamped_qualities: self.clamped_qualities.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`NormalizeMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub samples: u64,
    pub partial_samples: u64,
    pub missing_readings: u64,
    pub unattached_readings: u64,
    pub clamped_qualities: u64,
}
