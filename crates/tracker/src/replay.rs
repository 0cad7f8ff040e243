//! Replay tracker - plays back a recorded json stream
//!
//! Reads the json-lines output of a previous run and hands the samples back
//! as snapshots, paced by the recorded timestamps (milliseconds) scaled by
//! the replay speed.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::time::{Duration, Instant};

use contracts::{
    ContractError, PoseReading, RawPose, ReplayConfig, SensorId, Snapshot, Timestamp,
    TrackerDriver,
};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use tracing::{debug, info};

/// One recorded line: `{"t": .., "sensors": {"1": {"pos": [..], "ori": [..], "q": 0}}}`
#[derive(Debug, Deserialize)]
struct RecordedSample {
    t: Timestamp,
    sensors: RecordedSensors,
}

#[derive(Debug, Deserialize)]
struct RecordedPose {
    pos: [f64; 3],
    ori: [f64; 3],
    q: u32,
}

/// Sensor map that keeps file order
#[derive(Debug, Default)]
struct RecordedSensors(Vec<(SensorId, RecordedPose)>);

impl<'de> Deserialize<'de> for RecordedSensors {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = RecordedSensors;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of sensor id to pose")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((id, pose)) = map.next_entry::<SensorId, RecordedPose>()? {
                    entries.push((id, pose));
                }
                Ok(RecordedSensors(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

impl RecordedSample {
    fn to_snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::new(self.t);
        for (id, pose) in &self.sensors.0 {
            let raw: RawPose = PoseReading {
                position: pose.pos,
                orientation: pose.ori,
                quality: pose.q,
            }
            .to_raw();
            snapshot.readings.insert(id.clone(), raw);
        }
        snapshot
    }
}

/// Replay tracker
pub struct ReplayTracker {
    config: ReplayConfig,
    samples: Vec<RecordedSample>,
    sensors: Vec<SensorId>,
    cursor: usize,
    started_at: Option<Instant>,
}

impl ReplayTracker {
    /// Create; the recording is loaded on `initialize`
    pub fn new(config: ReplayConfig) -> Self {
        Self {
            config,
            samples: Vec::new(),
            sensors: Vec::new(),
            cursor: 0,
            started_at: None,
        }
    }

    fn load(&mut self) -> Result<(), ContractError> {
        let path = &self.config.path;
        let file = File::open(path).map_err(|e| {
            ContractError::device_unavailable(format!(
                "cannot open recording {}: {e}",
                path.display()
            ))
        })?;

        let mut samples = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let sample: RecordedSample = serde_json::from_str(&line).map_err(|e| {
                ContractError::driver_init("replay", format!("line {}: {e}", idx + 1))
            })?;
            samples.push(sample);
        }

        if samples.is_empty() {
            return Err(ContractError::driver_init(
                "replay",
                format!("recording {} contains no samples", path.display()),
            ));
        }

        // Attached set: every sensor seen, in order of first appearance.
        let mut sensors: Vec<SensorId> = Vec::new();
        for sample in &samples {
            for (id, _) in &sample.sensors.0 {
                if !sensors.contains(id) {
                    sensors.push(id.clone());
                }
            }
        }

        info!(
            path = %path.display(),
            samples = samples.len(),
            sensors = sensors.len(),
            "Recording loaded"
        );

        self.samples = samples;
        self.sensors = sensors;
        Ok(())
    }

    /// Offset of sample `idx` from the first sample, scaled by speed
    fn due_offset(&self, idx: usize) -> Duration {
        let first = self.samples[0].t.as_f64();
        let millis = (self.samples[idx].t.as_f64() - first).max(0.0) / self.config.speed;
        Duration::try_from_secs_f64(millis / 1000.0).unwrap_or(Duration::ZERO)
    }
}

impl TrackerDriver for ReplayTracker {
    fn name(&self) -> &str {
        "replay"
    }

    fn initialize(&mut self) -> Result<(), ContractError> {
        self.load()?;
        self.cursor = 0;
        self.started_at = Some(Instant::now());
        Ok(())
    }

    fn attached_sensors(&self) -> Vec<SensorId> {
        self.sensors.clone()
    }

    fn read_snapshot(&mut self) -> Result<Option<Snapshot>, ContractError> {
        let Some(started_at) = self.started_at else {
            return Err(ContractError::read_fault("replay not initialized"));
        };

        if self.cursor >= self.samples.len() {
            if !self.config.loop_playback {
                return Ok(None);
            }
            debug!("Replay wrapped around");
            self.cursor = 0;
            self.started_at = Some(Instant::now());
            return Ok(None);
        }

        if started_at.elapsed() < self.due_offset(self.cursor) {
            return Ok(None);
        }

        let snapshot = self.samples[self.cursor].to_snapshot();
        self.cursor += 1;
        Ok(Some(snapshot))
    }

    fn close(&mut self) -> Result<(), ContractError> {
        self.started_at = None;
        Ok(())
    }

    fn is_exhausted(&self) -> bool {
        !self.config.loop_playback && !self.samples.is_empty() && self.cursor >= self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const RECORDING: &str = r#"{"t": 0.0, "sensors": {"2": {"pos": [1.0, 2.0, 3.0], "ori": [10.0, 20.0, 30.0], "q": 0}}}
{"t": 1.0, "sensors": {"2": {"pos": [1.5, 2.5, 3.5], "ori": [11.0, 21.0, 31.0], "q": 1}, "1": {"pos": [0.0, 0.0, 0.0], "ori": [0.0, 0.0, 0.0], "q": 2}}}

{"t": 2.0, "sensors": {}}
"#;

    fn recording(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn fast(path: &std::path::Path) -> ReplayConfig {
        ReplayConfig {
            path: path.to_path_buf(),
            speed: 1_000_000.0,
            loop_playback: false,
        }
    }

    #[test]
    fn test_replays_in_order_then_exhausts() {
        let file = recording(RECORDING);
        let mut tracker = ReplayTracker::new(fast(file.path()));
        tracker.initialize().unwrap();

        assert_eq!(tracker.attached_sensors(), vec![SensorId::from("2"), "1".into()]);

        let mut timestamps = Vec::new();
        while !tracker.is_exhausted() {
            if let Some(snapshot) = tracker.read_snapshot().unwrap() {
                timestamps.push(snapshot.timestamp);
            }
        }
        assert_eq!(
            timestamps,
            vec![Timestamp::Real(0.0), Timestamp::Real(1.0), Timestamp::Real(2.0)]
        );
        assert!(tracker.read_snapshot().unwrap().is_none());
    }

    #[test]
    fn test_snapshot_contents() {
        let file = recording(RECORDING);
        let mut tracker = ReplayTracker::new(fast(file.path()));
        tracker.initialize().unwrap();

        let first = tracker.read_snapshot().unwrap().unwrap();
        assert_eq!(first.readings["2"], [1.0, 2.0, 3.0, 10.0, 20.0, 30.0, 0.0]);
    }

    #[test]
    fn test_paced_by_timestamps() {
        let file = recording(RECORDING);
        let mut tracker = ReplayTracker::new(ReplayConfig::new(file.path()));
        tracker.initialize().unwrap();

        assert!(tracker.read_snapshot().unwrap().is_some());
        // second sample is due 1 ms later
        std::thread::sleep(Duration::from_millis(5));
        assert!(tracker.read_snapshot().unwrap().is_some());
    }

    #[test]
    fn test_loop_playback_never_exhausts() {
        let file = recording(RECORDING);
        let mut config = fast(file.path());
        config.loop_playback = true;
        let mut tracker = ReplayTracker::new(config);
        tracker.initialize().unwrap();

        let mut produced = 0;
        for _ in 0..20 {
            if tracker.read_snapshot().unwrap().is_some() {
                produced += 1;
            }
        }
        assert!(produced > 3);
        assert!(!tracker.is_exhausted());
    }

    #[test]
    fn test_missing_file_is_connect_failure() {
        let mut tracker = ReplayTracker::new(ReplayConfig::new("/nonexistent/run.jsonl"));
        let err = tracker.initialize().unwrap_err();
        assert!(err.is_connect_failure());
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let file = recording("{\"t\": 0, \"sensors\": {}}\nnot json\n");
        let mut tracker = ReplayTracker::new(fast(file.path()));
        let err = tracker.initialize().unwrap_err();
        assert!(err.to_string().contains("line 2"), "got: {err}");
    }
}
