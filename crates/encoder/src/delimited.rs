//! Delimited text encoding

use contracts::{ContractError, OutputFormat, Sample};
use csv::{QuoteStyle, Terminator, WriterBuilder};

/// Column header, written once per stream
pub const CSV_HEADER: &str = "timestamp_ms,sensor_id,x,y,z,azimuth,elevation,roll,quality";

pub(crate) fn header_line() -> String {
    format!("{CSV_HEADER}\n")
}

fn encode_error(message: impl Into<String>) -> ContractError {
    ContractError::encode(OutputFormat::Csv, message)
}

/// One line per sensor; an empty sample encodes to an empty payload
pub(crate) fn encode(sample: &Sample) -> Result<Vec<u8>, ContractError> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::with_capacity(64 * sample.sensor_count()));

    let timestamp = sample.timestamp.to_string();
    for (id, reading) in &sample.readings {
        // Fields are never quoted, so ids must not need it.
        if id.contains([',', '\n', '\r', '"']) {
            return Err(encode_error(format!("sensor id {id:?} contains a delimiter")));
        }

        let [x, y, z] = reading.position;
        let [azimuth, elevation, roll] = reading.orientation;
        writer
            .write_record([
                timestamp.clone(),
                id.to_string(),
                format!("{x:.4}"),
                format!("{y:.4}"),
                format!("{z:.4}"),
                format!("{azimuth:.4}"),
                format!("{elevation:.4}"),
                format!("{roll:.4}"),
                reading.quality.to_string(),
            ])
            .map_err(|e| encode_error(e.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| encode_error(e.error().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{PoseReading, SensorId, Timestamp};

    fn text(sample: &Sample) -> String {
        String::from_utf8(encode(sample).unwrap()).unwrap()
    }

    fn reading(position: [f64; 3], orientation: [f64; 3], quality: u32) -> PoseReading {
        PoseReading {
            position,
            orientation,
            quality,
        }
    }

    #[test]
    fn test_four_decimals_everywhere() {
        let sample = Sample {
            timestamp: Timestamp::Real(12.0),
            readings: vec![(
                SensorId::from(3u32),
                reading([0.0, -1.5, 123.456789], [-179.99999, 0.00005, 7.0], 0),
            )],
        };

        assert_eq!(
            text(&sample),
            "12.0,3,0.0000,-1.5000,123.4568,-180.0000,0.0001,7.0000,0\n"
        );
    }

    #[test]
    fn test_one_line_per_sensor_in_order() {
        let sample = Sample {
            timestamp: Timestamp::Ticks(99),
            readings: vec![
                (SensorId::from("b"), reading([1.0; 3], [2.0; 3], 4)),
                (SensorId::from("a"), reading([3.0; 3], [4.0; 3], 1)),
            ],
        };

        let text = text(&sample);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("99,b,"));
        assert!(lines[1].starts_with("99,a,"));
        assert!(lines[0].ends_with(",4"));
    }

    #[test]
    fn test_empty_sample() {
        let sample = Sample {
            timestamp: Timestamp::Ticks(1),
            readings: Vec::new(),
        };
        assert_eq!(text(&sample), "");
    }

    #[test]
    fn test_delimiter_in_sensor_id_rejected() {
        let sample = Sample {
            timestamp: Timestamp::Ticks(1),
            readings: vec![(SensorId::from("a,b"), reading([0.0; 3], [0.0; 3], 0))],
        };
        assert!(matches!(encode(&sample), Err(ContractError::Encode { .. })));
    }
}
