//! Stream metrics
//!
//! Facade counters for the acquisition loop plus an in-memory aggregator
//! for the end-of-run summary.

use std::collections::HashMap;
use std::fmt;

use contracts::{AttachedSensors, Sample};
use metrics::{counter, gauge, histogram};

/// Record one sample handed to the sinks
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_sample_dispatched;
///
/// let accepted = sinks.dispatch(&record).await;
/// record_sample_dispatched(sample.sensor_count(), accepted);
/// ```
pub fn record_sample_dispatched(sensors: usize, accepted_sinks: usize) {
    counter!("pose_streamer_samples_total").increment(1);
    gauge!("pose_streamer_sensors_in_sample").set(sensors as f64);
    gauge!("pose_streamer_active_sinks").set(accepted_sinks as f64);
}

/// Record a poll that returned no new data
pub fn record_empty_read() {
    counter!("pose_streamer_empty_reads_total").increment(1);
}

/// Record a controller state change
pub fn record_stream_state(state: &str) {
    counter!("pose_streamer_state_transitions_total", "state" => state.to_string()).increment(1);
}

/// Record the time between two consecutive samples
fn record_sample_interval_ms(interval_ms: f64) {
    histogram!("pose_streamer_sample_interval_ms").record(interval_ms);
}

/// Stream metrics aggregator
///
/// Aggregates in memory so the run summary does not need a recorder.
#[derive(Debug, Clone, Default)]
pub struct StreamMetricsAggregator {
    /// Samples seen
    pub total_samples: u64,

    /// Samples missing at least one attached sensor
    pub partial_samples: u64,

    /// Samples with no sensors at all
    pub empty_samples: u64,

    /// Sensors per sample
    pub sensor_stats: RunningStats,

    /// Device time between consecutive samples
    pub interval_stats: RunningStats,

    /// Times each attached sensor was absent
    pub missing_counts: HashMap<String, u64>,

    last_timestamp: Option<f64>,
}

impl StreamMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one sample in
    pub fn update(&mut self, sample: &Sample, attached: &AttachedSensors) {
        self.total_samples += 1;
        self.sensor_stats.push(sample.sensor_count() as f64);

        if sample.sensor_count() == 0 {
            self.empty_samples += 1;
        }
        if sample.sensor_count() < attached.len() {
            self.partial_samples += 1;
            for id in attached.iter().filter(|id| sample.reading(id).is_none()) {
                *self.missing_counts.entry(id.to_string()).or_insert(0) += 1;
            }
        }

        let timestamp = sample.timestamp.as_f64();
        if let Some(previous) = self.last_timestamp {
            let interval = timestamp - previous;
            if interval.is_finite() && interval >= 0.0 {
                self.interval_stats.push(interval);
                record_sample_interval_ms(interval);
            }
        }
        self.last_timestamp = Some(timestamp);
    }

    /// Generate summary report
    pub fn summary(&self) -> MetricsSummary {
        let mut missing: Vec<(String, u64)> = self
            .missing_counts
            .iter()
            .map(|(id, count)| (id.clone(), *count))
            .collect();
        missing.sort();

        MetricsSummary {
            total_samples: self.total_samples,
            partial_samples: self.partial_samples,
            empty_samples: self.empty_samples,
            partial_rate: if self.total_samples > 0 {
                self.partial_samples as f64 / self.total_samples as f64 * 100.0
            } else {
                0.0
            },
            sensors_per_sample: StatsSummary::from(&self.sensor_stats),
            sample_interval: StatsSummary::from(&self.interval_stats),
            sensor_missing_counts: missing,
        }
    }

    /// Reset statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_samples: u64,
    pub partial_samples: u64,
    pub empty_samples: u64,
    pub partial_rate: f64,
    pub sensors_per_sample: StatsSummary,
    pub sample_interval: StatsSummary,
    /// Sorted by sensor id
    pub sensor_missing_counts: Vec<(String, u64)>,
}

impl fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Samples: {}", self.total_samples)?;
        writeln!(
            f,
            "Partial samples: {} ({:.2}%)",
            self.partial_samples, self.partial_rate
        )?;
        writeln!(f, "Empty samples: {}", self.empty_samples)?;
        writeln!(f, "Sensors per sample: {}", self.sensors_per_sample)?;
        writeln!(f, "Sample interval (device units): {}", self.sample_interval)?;

        if !self.sensor_missing_counts.is_empty() {
            writeln!(f, "Missing sensor counts:")?;
            for (sensor, count) in &self.sensor_missing_counts {
                writeln!(f, "  {sensor}: {count}")?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean/variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
