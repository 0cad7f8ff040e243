//! # Encoder
//!
//! Pure `Sample` -> `EncodedRecord` functions, one per wire format.
//!
//! - csv: one line per (sample, sensor), 4 decimal places, header line once
//! - json: one compact object per sample, `", "` / `": "` separators
//!
//! Encoders never touch I/O and give the same bytes for the same sample.

mod delimited;
mod json;
mod number;

use contracts::{ContractError, EncodedRecord, OutputFormat, Sample};

pub use delimited::CSV_HEADER;
pub use number::round4;

/// Encoder for one output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoder {
    Csv,
    Json,
}

impl From<OutputFormat> for Encoder {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Csv => Self::Csv,
            OutputFormat::Json => Self::Json,
        }
    }
}

impl Encoder {
    pub fn format(&self) -> OutputFormat {
        match self {
            Self::Csv => OutputFormat::Csv,
            Self::Json => OutputFormat::Json,
        }
    }

    /// Record to write once before the first sample, if the format has one
    pub fn header(&self) -> Option<EncodedRecord> {
        match self {
            Self::Csv => Some(EncodedRecord::header(OutputFormat::Csv, delimited::header_line())),
            Self::Json => None,
        }
    }

    /// Encode one sample
    ///
    /// `sequence` is the 1-based position of the sample in the stream.
    ///
    /// # Errors
    /// `Encode` when the sample cannot be represented in this format.
    pub fn encode(&self, sample: &Sample, sequence: u64) -> Result<EncodedRecord, ContractError> {
        let payload = match self {
            Self::Csv => delimited::encode(sample)?,
            Self::Json => json::encode(sample)?,
        };
        Ok(EncodedRecord::sample(self.format(), sequence, payload))
    }
}
