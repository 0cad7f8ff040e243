//! Final run report

use std::time::Duration;

use chrono::{DateTime, Local};
use dispatcher::SinkReport;
use observability::MetricsSummary;
use tracker::SourceStats;

use crate::state::ShutdownReason;

/// What one run did
#[derive(Debug, Clone)]
pub struct StreamReport {
    /// Samples dispatched to the sinks
    pub samples: u64,
    pub reason: ShutdownReason,
    pub started_at: DateTime<Local>,
    pub duration: Duration,
    /// Per sink, in closing order
    pub sinks: Vec<SinkReport>,
    pub source: SourceStats,
    /// Samples skipped because they could not be encoded
    pub encode_errors: u64,
    pub summary: MetricsSummary,
}

impl StreamReport {
    /// Samples per second over the run
    pub fn sample_rate(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.samples as f64 / secs
        } else {
            0.0
        }
    }

    /// Whether the run failed before producing anything
    pub fn failed_without_data(&self) -> bool {
        self.reason.is_failure() && self.samples == 0
    }

    pub fn sink(&self, name: &str) -> Option<&SinkReport> {
        self.sinks.iter().find(|s| s.name == name)
    }
}
