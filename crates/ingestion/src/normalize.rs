//! Snapshot -> Sample

use std::sync::Arc;

use contracts::{AttachedSensors, PoseReading, Sample, Snapshot};
use metrics::counter;
use tracing::trace;

use crate::stats::NormalizeMetrics;

/// Normalize one snapshot against the attached sensor set
///
/// The result holds exactly the attached sensors present in the snapshot, in
/// attached order. Readings for unattached sensors are dropped.
pub fn normalize(snapshot: &Snapshot, attached: &AttachedSensors) -> Sample {
    let readings = attached
        .iter()
        .filter_map(|id| {
            snapshot
                .readings
                .get(id)
                .map(|raw| (id.clone(), PoseReading::from_raw(raw)))
        })
        .collect();

    Sample {
        timestamp: snapshot.timestamp,
        readings,
    }
}

/// Normalizer bound to one connection's attached set
#[derive(Debug)]
pub struct Normalizer {
    attached: AttachedSensors,
    metrics: Arc<NormalizeMetrics>,
}

impl Normalizer {
    pub fn new(attached: AttachedSensors) -> Self {
        Self {
            attached,
            metrics: Arc::new(NormalizeMetrics::new()),
        }
    }

    pub fn attached(&self) -> &AttachedSensors {
        &self.attached
    }

    pub fn metrics(&self) -> Arc<NormalizeMetrics> {
        Arc::clone(&self.metrics)
    }

    /// [`normalize`] plus bookkeeping
    pub fn normalize(&self, snapshot: &Snapshot) -> Sample {
        let sample = normalize(snapshot, &self.attached);

        let missing = (self.attached.len() - sample.sensor_count()) as u64;
        let unattached = (snapshot.readings.len() - sample.sensor_count()) as u64;
        self.metrics.record(missing, unattached);

        if missing > 0 {
            counter!("pose_streamer_partial_samples_total").increment(1);
            trace!(timestamp = %sample.timestamp, missing, "partial sample");
        }
        if unattached > 0 {
            counter!("pose_streamer_unattached_readings_total").increment(unattached);
        }

        let mut clamped = 0;
        for id in sample.sensor_ids() {
            let Some(quality) = snapshot.readings.get(id).map(|raw| raw[6]) else {
                continue;
            };
            if quality.is_nan() || quality < 0.0 {
                trace!(sensor = %id, quality, "quality clamped to 0");
                clamped += 1;
            }
        }
        if clamped > 0 {
            self.metrics.record_clamped(clamped);
        }

        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{RawPose, SensorId, Timestamp};

    fn raw(base: f64) -> RawPose {
        [base, base + 1.0, base + 2.0, 10.0, 20.0, 30.0, 1.0]
    }

    fn attached(ids: &[&str]) -> AttachedSensors {
        AttachedSensors::new(ids.iter().map(|id| SensorId::from(*id)))
    }

    #[test]
    fn test_orders_by_attached_set() {
        let snapshot = Snapshot::new(7u64)
            .with_reading("3", raw(3.0))
            .with_reading("1", raw(1.0))
            .with_reading("2", raw(2.0));

        let sample = normalize(&snapshot, &attached(&["2", "3", "1"]));
        let ids: Vec<&str> = sample.sensor_ids().map(|id| &**id).collect();
        assert_eq!(ids, vec!["2", "3", "1"]);
        assert_eq!(sample.timestamp, Timestamp::Ticks(7));
    }

    #[test]
    fn test_intersection_only() {
        let snapshot = Snapshot::new(1.5)
            .with_reading("1", raw(1.0))
            .with_reading("9", raw(9.0));

        let sample = normalize(&snapshot, &attached(&["1", "2"]));
        assert_eq!(sample.sensor_count(), 1);
        assert!(sample.reading("1").is_some());
        assert!(sample.reading("2").is_none());
        assert!(sample.reading("9").is_none());
    }

    #[test]
    fn test_reading_fields() {
        let snapshot = Snapshot::new(0u64).with_reading("1", [1.0, 2.0, 3.0, -4.0, 5.0, 6.0, 2.7]);
        let sample = normalize(&snapshot, &attached(&["1"]));

        let reading = sample.reading("1").unwrap();
        assert_eq!(reading.position, [1.0, 2.0, 3.0]);
        assert_eq!(reading.orientation, [-4.0, 5.0, 6.0]);
        assert_eq!(reading.quality, 2);
    }

    #[test]
    fn test_empty_snapshot_gives_empty_sample() {
        let sample = normalize(&Snapshot::new(3u64), &attached(&["1", "2"]));
        assert_eq!(sample.sensor_count(), 0);
        assert_eq!(sample.timestamp, Timestamp::Ticks(3));
    }

    #[test]
    fn test_sensor_missing_from_a_window() {
        let set = attached(&["1", "2"]);
        let samples: Vec<Sample> = (0u64..30)
            .map(|i| {
                let mut snapshot = Snapshot::new(i).with_reading("1", raw(1.0));
                if !(10..=20).contains(&i) {
                    snapshot = snapshot.with_reading("2", raw(2.0));
                }
                normalize(&snapshot, &set)
            })
            .collect();

        for (i, sample) in samples.iter().enumerate() {
            let has_s2 = sample.reading("2").is_some();
            assert_eq!(has_s2, !(10..=20).contains(&i), "sample {i}");
            assert!(sample.reading("1").is_some());
        }
    }

    #[test]
    fn test_deterministic() {
        let snapshot = Snapshot::new(1u64)
            .with_reading("a", raw(1.0))
            .with_reading("b", raw(2.0));
        let set = attached(&["b", "a"]);
        assert_eq!(normalize(&snapshot, &set), normalize(&snapshot, &set));
    }

    #[test]
    fn test_normalizer_counts() {
        let normalizer = Normalizer::new(attached(&["1", "2"]));
        normalizer.normalize(&Snapshot::new(0u64).with_reading("1", raw(1.0)).with_reading("2", raw(2.0)));
        normalizer.normalize(&Snapshot::new(1u64).with_reading("1", raw(1.0)).with_reading("5", raw(5.0)));

        let stats = normalizer.metrics().snapshot();
        assert_eq!(stats.samples, 2);
        assert_eq!(stats.partial_samples, 1);
        assert_eq!(stats.missing_readings, 1);
        assert_eq!(stats.unattached_readings, 1);
        assert_eq!(stats.clamped_qualities, 0);
    }

    #[test]
    fn test_negative_quality_clamped_and_counted() {
        let normalizer = Normalizer::new(attached(&["1", "2", "3"]));
        let sample = normalizer.normalize(
            &Snapshot::new(0u64)
                .with_reading("1", [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -3.0])
                .with_reading("2", [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, f64::NAN])
                .with_reading("3", raw(3.0))
                // unattached, never inspected
                .with_reading("9", [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -1.0]),
        );

        assert_eq!(sample.reading("1").unwrap().quality, 0);
        assert_eq!(sample.reading("2").unwrap().quality, 0);
        assert_eq!(sample.reading("3").unwrap().quality, 1);
        assert_eq!(normalizer.metrics().snapshot().clamped_qualities, 2);
    }
}
