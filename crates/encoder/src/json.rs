//! Compact structured encoding
//!
//! `{"t": 12.0, "sensors": {"1": {"pos": [x, y, z], "ori": [az, el, roll], "q": 0}}}`

use std::io;

use contracts::{ContractError, OutputFormat, PoseReading, Sample, SensorId, Timestamp};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::ser::Formatter;

use crate::number::round4;

#[derive(Serialize)]
struct JsonSample<'a> {
    t: Timestamp,
    sensors: JsonSensors<'a>,
}

/// Sensor map in sample order
struct JsonSensors<'a>(&'a [(SensorId, PoseReading)]);

impl Serialize for JsonSensors<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, reading) in self.0 {
            map.serialize_entry(id, &JsonPose::from(reading))?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct JsonPose {
    pos: [f64; 3],
    ori: [f64; 3],
    q: u32,
}

impl From<&PoseReading> for JsonPose {
    fn from(reading: &PoseReading) -> Self {
        Self {
            pos: reading.position.map(round4),
            ori: reading.orientation.map(round4),
            q: reading.quality,
        }
    }
}

/// Single-line output with a space after every `,` and `:`
#[derive(Debug, Default)]
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

/// One line per sample; non-finite values become `null`
pub(crate) fn encode(sample: &Sample) -> Result<Vec<u8>, ContractError> {
    let value = JsonSample {
        t: sample.timestamp,
        sensors: JsonSensors(&sample.readings),
    };

    let mut out = Vec::with_capacity(32 + 96 * sample.sensor_count());
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, SpacedFormatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| ContractError::encode(OutputFormat::Json, e.to_string()))?;
    out.push(b'\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(sample: &Sample) -> String {
        String::from_utf8(encode(sample).unwrap()).unwrap()
    }

    #[test]
    fn test_layout() {
        let sample = Sample {
            timestamp: Timestamp::Real(12.5),
            readings: vec![(
                SensorId::from(2u32),
                PoseReading {
                    position: [1.23456, -2.0, 0.0],
                    orientation: [90.0, -45.00004, 0.5],
                    quality: 3,
                },
            )],
        };

        assert_eq!(
            text(&sample),
            "{\"t\": 12.5, \"sensors\": {\"2\": {\"pos\": [1.2346, -2.0, 0.0], \"ori\": [90.0, -45.0, 0.5], \"q\": 3}}}\n"
        );
    }

    #[test]
    fn test_empty_sample() {
        let sample = Sample {
            timestamp: Timestamp::Ticks(5),
            readings: Vec::new(),
        };
        assert_eq!(text(&sample), "{\"t\": 5, \"sensors\": {}}\n");
    }

    #[test]
    fn test_sensor_order_kept() {
        let reading = PoseReading {
            position: [0.0; 3],
            orientation: [0.0; 3],
            quality: 0,
        };
        let sample = Sample {
            timestamp: Timestamp::Ticks(1),
            readings: vec![
                (SensorId::from("9"), reading),
                (SensorId::from("1"), reading),
            ],
        };
        let line = text(&sample);
        assert!(line.find("\"9\"").unwrap() < line.find("\"1\"").unwrap());
    }

    #[test]
    fn test_non_finite_is_null() {
        let sample = Sample {
            timestamp: Timestamp::Ticks(1),
            readings: vec![(
                SensorId::from(1u32),
                PoseReading {
                    position: [f64::NAN, f64::INFINITY, 1.0],
                    orientation: [0.0; 3],
                    quality: 0,
                },
            )],
        };
        let line = text(&sample);
        assert!(line.contains("\"pos\": [null, null, 1.0]"), "got: {line}");
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert!(parsed["sensors"]["1"]["pos"][0].is_null());
    }

    #[test]
    fn test_many_lines_all_parse() {
        let reading = PoseReading {
            position: [1.0 / 3.0, -2.0 / 7.0, 1e-9],
            orientation: [179.99995, -0.00005, 33.33333],
            quality: 1,
        };
        for i in 0u64..1200 {
            let readings = match i % 3 {
                0 => Vec::new(),
                1 => vec![(SensorId::from(1u32), reading)],
                _ => vec![(SensorId::from(1u32), reading), (SensorId::from(2u32), reading)],
            };
            let sample = Sample {
                timestamp: Timestamp::Real(i as f64 * 12.5),
                readings,
            };
            let line = text(&sample);
            assert!(line.ends_with('\n') && line.matches('\n').count() == 1);
            let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
            assert_eq!(parsed["sensors"].as_object().unwrap().len(), (i % 3) as usize);
        }
    }
}
