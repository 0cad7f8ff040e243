//! StreamSession - state of one streaming run

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use contracts::{AttachedSensors, OutputFormat, Sample};
use dispatcher::SinkManager;
use observability::StreamMetricsAggregator;

/// Created once the source is connected, torn down sinks-first
pub struct StreamSession {
    started: Instant,
    started_at: DateTime<Local>,
    format: OutputFormat,
    attached: AttachedSensors,
    samples: u64,
    encode_errors: u64,
    stats: StreamMetricsAggregator,
    pub(crate) sinks: SinkManager,
}

impl StreamSession {
    pub fn new(format: OutputFormat, attached: AttachedSensors, sinks: SinkManager) -> Self {
        Self {
            started: Instant::now(),
            started_at: Local::now(),
            format,
            attached,
            samples: 0,
            encode_errors: 0,
            stats: StreamMetricsAggregator::new(),
            sinks,
        }
    }

    /// Wall-clock start time
    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn attached(&self) -> &AttachedSensors {
        &self.attached
    }

    /// Samples dispatched so far
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// 1-based sequence number of the next sample
    pub(crate) fn next_sequence(&self) -> u64 {
        self.samples + 1
    }

    /// Count one dispatched sample
    pub(crate) fn record_sample(&mut self, sample: &Sample) -> u64 {
        self.samples += 1;
        self.stats.update(sample, &self.attached);
        self.samples
    }

    /// Samples that could not be encoded
    pub fn encode_errors(&self) -> u64 {
        self.encode_errors
    }

    pub(crate) fn record_encode_error(&mut self) {
        self.encode_errors += 1;
    }

    pub fn stats(&self) -> &StreamMetricsAggregator {
        &self.stats
    }

    pub fn sinks(&self) -> &SinkManager {
        &self.sinks
    }
}
