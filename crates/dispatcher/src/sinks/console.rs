//! ConsoleSink - live stream on stdout

use std::io::{self, Stdout, Write};

use contracts::{ContractError, DataSink, EncodedRecord};
use tracing::{debug, instrument};

/// Write-through sink, flushed after every record
///
/// Generic over the writer so the stream can be captured; the binary uses
/// stdout.
pub struct ConsoleSink<W: Write + Send = Stdout> {
    name: String,
    destination: String,
    writer: W,
    closed: bool,
}

impl ConsoleSink<Stdout> {
    /// Console sink on process stdout
    pub fn stdout(name: impl Into<String>) -> Self {
        Self::with_writer(name, "stdout", io::stdout())
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn with_writer(name: impl Into<String>, destination: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            destination: destination.into(),
            writer,
            closed: false,
        }
    }

    /// Take the writer back (for captured output)
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_through(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer.write_all(bytes)?;
        self.writer.flush()
    }
}

impl<W: Write + Send> DataSink for ConsoleSink<W> {
    fn name(&self) -> &str {
        &self.name
    }

    fn destination(&self) -> String {
        self.destination.clone()
    }

    #[instrument(
        name = "console_sink_write",
        skip(self, record),
        fields(sink = %self.name, seq = record.sequence())
    )]
    async fn write(&mut self, record: &EncodedRecord) -> Result<(), ContractError> {
        if self.closed {
            return Err(ContractError::sink_closed(&self.name));
        }
        if record.payload().is_empty() {
            return Ok(());
        }
        self.write_through(record.payload())
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }

    #[instrument(name = "console_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        if self.closed {
            return Ok(());
        }
        self.writer
            .flush()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }

    #[instrument(name = "console_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        debug!(sink = %self.name, "ConsoleSink closed");
        self.writer
            .flush()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }
}
