//! EncodedRecord - Encoder output, Dispatcher input

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire format of the data stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// One delimited text line per (sample, sensor), with a header line
    #[default]
    Csv,
    /// One compact JSON object per sample, no header
    Json,
}

impl OutputFormat {
    /// Conventional file extension for recordings in this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "jsonl",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => f.write_str("csv"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// What an encoded record carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Format header, written once before any sample
    Header,
    /// One encoded sample
    Sample,
}

/// Format-tagged payload ready to be written by a sink
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRecord {
    format: OutputFormat,
    kind: RecordKind,
    /// 1-based sample sequence number (0 for headers)
    sequence: u64,
    payload: Bytes,
}

impl EncodedRecord {
    /// Header record for `format`
    pub fn header(format: OutputFormat, payload: impl Into<Bytes>) -> Self {
        Self {
            format,
            kind: RecordKind::Header,
            sequence: 0,
            payload: payload.into(),
        }
    }

    /// Sample record with its stream sequence number
    pub fn sample(format: OutputFormat, sequence: u64, payload: impl Into<Bytes>) -> Self {
        Self {
            format,
            kind: RecordKind::Sample,
            sequence,
            payload: payload.into(),
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn is_sample(&self) -> bool {
        self.kind == RecordKind::Sample
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Payload as text (encoders only ever produce UTF-8)
    pub fn as_text(&self) -> &str {
        std::str::from_utf8(&self.payload).unwrap_or_default()
    }
}
