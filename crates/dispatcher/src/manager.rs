//! SinkManager - ordered fan-out to every active sink

use std::path::Path;

use tracing::{info, instrument, warn};

use contracts::{DataSink, EncodedRecord, StreamConfig};

use crate::error::DispatcherError;
use crate::handle::{SinkHandle, SinkReport};
use crate::metrics::MetricsSnapshot;
use crate::sinks::{ConsoleSink, FileSink};

/// Dispatcher configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Per-sink handoff queue capacity
    pub queue_capacity: usize,
    /// Consecutive failures before a sink is degraded (0 = never)
    pub failure_limit: u32,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            failure_limit: 0,
        }
    }
}

impl From<&StreamConfig> for DispatcherConfig {
    fn from(config: &StreamConfig) -> Self {
        Self {
            queue_capacity: config.sink_queue_capacity,
            failure_limit: config.sink_failure_limit,
        }
    }
}

/// Owns every sink for one stream
///
/// Sinks receive records in the order they were added; they are closed in
/// the reverse order, once.
pub struct SinkManager {
    config: DispatcherConfig,
    handles: Vec<SinkHandle>,
    closed: bool,
}

impl SinkManager {
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            config,
            handles: Vec::new(),
            closed: false,
        }
    }

    /// Console sink on stdout plus a file sink when `output` is set
    ///
    /// Must be called inside a tokio runtime.
    pub fn open_standard(
        config: DispatcherConfig,
        output: Option<&Path>,
    ) -> Result<Self, DispatcherError> {
        let mut manager = Self::new(config);
        manager.add_standard_sinks(output)?;
        Ok(manager)
    }

    /// Append the console sink and, when `output` is set, a file sink
    #[instrument(name = "sink_manager_add_standard", skip_all, fields(output = ?output))]
    pub fn add_standard_sinks(&mut self, output: Option<&Path>) -> Result<(), DispatcherError> {
        self.add_sink(ConsoleSink::stdout("console"))?;

        if let Some(path) = output {
            let sink = FileSink::create("file", path).map_err(|e| {
                DispatcherError::sink_creation("file", format!("{}: {e}", path.display()))
            })?;
            self.add_sink(sink)?;
        }
        Ok(())
    }

    /// Start a worker for `sink`, appending it to the dispatch order
    pub fn add_sink<S: DataSink + Send + 'static>(&mut self, sink: S) -> Result<(), DispatcherError> {
        if self.closed {
            return Err(DispatcherError::Closed);
        }
        let handle = SinkHandle::spawn(sink, self.config.queue_capacity, self.config.failure_limit);
        info!(sink = %handle.name(), destination = %handle.destination(), "Sink opened");
        self.handles.push(handle);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Sinks that still receive records
    pub fn active_count(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_degraded()).count()
    }

    /// (name, destination) of every sink, in dispatch order
    pub fn sinks(&self) -> Vec<(String, String)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.destination().to_string()))
            .collect()
    }

    /// Get metrics for all sinks
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Hand `record` to every active sink, waiting on full queues
    ///
    /// Returns how many sinks accepted it.
    pub async fn dispatch(&self, record: &EncodedRecord) -> usize {
        if self.closed {
            warn!(seq = record.sequence(), "Dispatch after close ignored");
            return 0;
        }
        let mut accepted = 0;
        for handle in &self.handles {
            if handle.send(record.clone()).await {
                accepted += 1;
            }
        }
        accepted
    }

    /// Close every sink in reverse order of opening
    ///
    /// Each sink drains its queue, flushes and closes. A sink that fails to
    /// close does not stop the rest. Calling again returns no reports.
    #[instrument(name = "sink_manager_close_all", skip(self), fields(sinks = self.handles.len()))]
    pub async fn close_all(&mut self) -> Vec<SinkReport> {
        if self.closed {
            return Vec::new();
        }
        self.closed = true;

        let mut reports = Vec::with_capacity(self.handles.len());
        while let Some(handle) = self.handles.pop() {
            let report = handle.shutdown().await;
            match &report.close_error {
                Some(error) => warn!(sink = %report.name, %error, "Sink closed with error"),
                None => info!(
                    sink = %report.name,
                    destination = %report.destination,
                    samples = report.samples_written,
                    "Sink closed"
                ),
            }
            reports.push(report);
        }
        reports
    }
}
