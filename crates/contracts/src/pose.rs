//! Pose data - driver output and the normalized sample
//!
//! `Snapshot` is what a tracker driver hands back from one read.
//! `Sample` is the canonical, ordered record the rest of the pipeline sees.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::SensorId;

/// Raw driver tuple: `[x, y, z, azimuth, elevation, roll, quality]`
pub type RawPose = [f64; 7];

/// Device timestamp
///
/// Drivers report either integer ticks or a floating point time. The value
/// is carried as-is and rendered the same way by every wire format, except
/// that non-finite values are `null` in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    /// Integer device ticks
    Ticks(u64),
    /// Floating point time (driver units, usually milliseconds)
    Real(f64),
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::Ticks(0)
    }
}

impl Timestamp {
    /// Value as f64 (used for replay pacing)
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::Ticks(t) => t as f64,
            Self::Real(v) => v,
        }
    }
}

impl From<u64> for Timestamp {
    fn from(ticks: u64) -> Self {
        Self::Ticks(ticks)
    }
}

impl From<f64> for Timestamp {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Ticks(t) => write!(f, "{t}"),
            // Same shortest round-trip text serde_json writes (`12.0`, `1e16`).
            Self::Real(v) => match serde_json::Number::from_f64(v) {
                Some(n) => write!(f, "{n}"),
                None => write!(f, "{v}"),
            },
        }
    }
}

/// One sensor's measurement at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseReading {
    /// x, y, z in device units
    pub position: [f64; 3],

    /// azimuth, elevation, roll in degrees
    pub orientation: [f64; 3],

    /// Measurement quality, 0 = best
    pub quality: u32,
}

impl PoseReading {
    /// Build a reading from the driver tuple.
    ///
    /// Quality is truncated toward zero; negative and NaN values become 0.
    pub fn from_raw(raw: &RawPose) -> Self {
        Self {
            position: [raw[0], raw[1], raw[2]],
            orientation: [raw[3], raw[4], raw[5]],
            quality: raw[6].trunc() as u32,
        }
    }

    /// Inverse of [`PoseReading::from_raw`]
    pub fn to_raw(&self) -> RawPose {
        [
            self.position[0],
            self.position[1],
            self.position[2],
            self.orientation[0],
            self.orientation[1],
            self.orientation[2],
            f64::from(self.quality),
        ]
    }
}

/// Raw multi-sensor read from a tracker driver
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Device timestamp of the read
    pub timestamp: Timestamp,

    /// Sensor ID -> raw pose tuple (may include unattached sensors)
    pub readings: HashMap<SensorId, RawPose>,
}

impl Snapshot {
    /// Create an empty snapshot
    pub fn new(timestamp: impl Into<Timestamp>) -> Self {
        Self {
            timestamp: timestamp.into(),
            readings: HashMap::new(),
        }
    }

    /// Builder-style insert of one sensor reading
    pub fn with_reading(mut self, sensor_id: impl Into<SensorId>, raw: RawPose) -> Self {
        self.readings.insert(sensor_id.into(), raw);
        self
    }
}

/// Canonical normalized sample
///
/// Readings are ordered exactly as the attached sensors were reported at
/// connect time. Never mutated after creation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sample {
    /// Device timestamp, verbatim
    pub timestamp: Timestamp,

    /// (sensor, reading) pairs in attached order
    pub readings: Vec<(SensorId, PoseReading)>,
}

impl Sample {
    /// Number of sensors present in this sample
    pub fn sensor_count(&self) -> usize {
        self.readings.len()
    }

    /// Sensor ids in sample order
    pub fn sensor_ids(&self) -> impl Iterator<Item = &SensorId> {
        self.readings.iter().map(|(id, _)| id)
    }

    /// Look up one sensor's reading
    pub fn reading(&self, sensor_id: &str) -> Option<&PoseReading> {
        self.readings
            .iter()
            .find(|(id, _)| id == sensor_id)
            .map(|(_, reading)| reading)
    }
}

/// Sensors reported by the driver at connect time, in reported order
///
/// Duplicates are dropped, keeping the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachedSensors(Vec<SensorId>);

impl AttachedSensors {
    pub fn new(ids: impl IntoIterator<Item = SensorId>) -> Self {
        let mut unique: Vec<SensorId> = Vec::new();
        for id in ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        Self(unique)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SensorId> {
        self.0.iter()
    }

    pub fn contains(&self, sensor_id: &str) -> bool {
        self.0.iter().any(|id| id == sensor_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a AttachedSensors {
    type Item = &'a SensorId;
    type IntoIter = std::slice::Iter<'a, SensorId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for AttachedSensors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (idx, id) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            f.write_str(id)?;
        }
        f.write_str("]")
    }
}
