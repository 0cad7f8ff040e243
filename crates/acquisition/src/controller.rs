//! Controller - drives one stream from connect to close

use std::future::Future;

use contracts::{DataSink, Sample, StreamConfig, TrackerDriver};
use dispatcher::{DispatcherConfig, DispatcherError, SinkManager};
use encoder::Encoder;
use ingestion::Normalizer;
use observability::{record_empty_read, record_sample_dispatched, record_stream_state};
use tracing::{debug, error, info, instrument, warn};
use tracker::{FaultPolicy, SourceAdapter};

use crate::error::{AcquisitionError, Result};
use crate::report::StreamReport;
use crate::session::StreamSession;
use crate::state::{ShutdownReason, StreamState};

/// Deferred sink construction; sinks are only opened once the source is up
type SinkOpener = Box<dyn FnOnce(&mut SinkManager) -> std::result::Result<(), DispatcherError> + Send>;

/// Acquisition loop and lifecycle controller
///
/// Owns the source adapter (and through it the device) and, while
/// streaming, the session and its sinks. A controller runs once.
pub struct Controller<D: TrackerDriver> {
    config: StreamConfig,
    adapter: SourceAdapter<D>,
    encoder: Encoder,
    openers: Vec<SinkOpener>,
    state: StreamState,
}

impl<D: TrackerDriver> Controller<D> {
    pub fn new(driver: D, config: StreamConfig) -> Self {
        let policy = FaultPolicy::new(config.max_consecutive_faults);
        Self {
            encoder: Encoder::from(config.format),
            adapter: SourceAdapter::new(driver, policy),
            config,
            openers: Vec::new(),
            state: StreamState::Idle,
        }
    }

    /// Console on stdout, plus the configured output file
    pub fn with_standard_sinks(mut self) -> Self {
        let output = self.config.output.clone();
        self.openers
            .push(Box::new(move |sinks: &mut SinkManager| sinks.add_standard_sinks(output.as_deref())));
        self
    }

    /// Add a sink after any already registered
    pub fn with_sink<S: DataSink + Send + 'static>(mut self, sink: S) -> Self {
        self.openers.push(Box::new(move |sinks: &mut SinkManager| sinks.add_sink(sink)));
        self
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Run until `shutdown` resolves, the source stops, or a limit is hit
    ///
    /// Sinks are always closed before the device is released.
    ///
    /// # Errors
    /// `Connect` if the device cannot be initialized (state stays `Idle`),
    /// `SinkOpen` if a sink cannot be created, `AlreadyRun` if this
    /// controller is not idle.
    #[instrument(
        name = "stream_run",
        skip_all,
        fields(driver = %self.adapter.driver_name(), format = %self.config.format)
    )]
    pub async fn run<F>(&mut self, shutdown: F) -> Result<StreamReport>
    where
        F: Future<Output = ()>,
    {
        if self.state != StreamState::Idle {
            return Err(AcquisitionError::AlreadyRun { state: self.state });
        }

        let attached = self.adapter.connect().map_err(AcquisitionError::Connect)?;
        self.transition(StreamState::Connected);

        let sinks = match self.open_sinks().await {
            Ok(sinks) => sinks,
            Err(e) => {
                error!(error = %e, "Failed to open output");
                self.transition(StreamState::ShuttingDown);
                self.release_source();
                self.transition(StreamState::Closed);
                return Err(AcquisitionError::SinkOpen(e));
            }
        };

        let mut session = StreamSession::new(self.encoder.format(), attached, sinks);
        if let Some(header) = self.encoder.header() {
            session.sinks.dispatch(&header).await;
        }

        self.transition(StreamState::Streaming);
        info!(
            format = %session.format(),
            sensors = %session.attached(),
            sinks = session.sinks().len(),
            "Streaming started. Press Ctrl+C to stop."
        );

        let reason = self.stream(&mut session, shutdown).await;
        info!(reason = %reason, samples = session.samples(), "Stopping stream");

        self.transition(StreamState::ShuttingDown);
        let sink_reports = session.sinks.close_all().await;
        self.release_source();
        self.transition(StreamState::Closed);

        for sink in &sink_reports {
            info!(
                sink = %sink.name,
                destination = %sink.destination,
                samples = sink.samples_written,
                failures = sink.failures,
                "Stopped. {} samples written to {}",
                sink.samples_written,
                sink.destination
            );
        }

        Ok(StreamReport {
            samples: session.samples(),
            reason,
            started_at: session.started_at(),
            duration: session.elapsed(),
            sinks: sink_reports,
            source: self.adapter.stats(),
            encode_errors: session.encode_errors(),
            summary: session.stats().summary(),
        })
    }

    async fn open_sinks(&mut self) -> std::result::Result<SinkManager, DispatcherError> {
        let mut sinks = SinkManager::new(DispatcherConfig::from(&self.config));
        for opener in std::mem::take(&mut self.openers) {
            if let Err(e) = opener(&mut sinks) {
                sinks.close_all().await;
                return Err(e);
            }
        }
        if sinks.is_empty() {
            warn!("No sinks configured - samples will be dropped");
        }
        Ok(sinks)
    }

    /// The polling loop
    async fn stream<F>(&mut self, session: &mut StreamSession, shutdown: F) -> ShutdownReason
    where
        F: Future<Output = ()>,
    {
        let poll_interval = self.config.poll_interval();
        let time_limit = self.config.duration();
        let normalizer = Normalizer::new(session.attached().clone());
        tokio::pin!(shutdown);

        loop {
            if let Some(snapshot) = self.adapter.read_snapshot() {
                let sample = normalizer.normalize(&snapshot);
                self.emit(session, &sample).await;

                if let Some(max) = self.config.max_samples {
                    if session.samples() >= max {
                        info!(samples = max, "Reached max samples limit");
                        return ShutdownReason::MaxSamples;
                    }
                }
            } else if self.adapter.is_failed() {
                error!(
                    consecutive_faults = self.adapter.stats().consecutive_faults,
                    "Tracker keeps failing, giving up"
                );
                return ShutdownReason::SourceFailed;
            } else if self.adapter.is_exhausted() {
                info!("Source has no more data");
                return ShutdownReason::SourceExhausted;
            } else {
                record_empty_read();
            }

            if let Some(limit) = time_limit {
                if session.elapsed() >= limit {
                    info!(secs = limit.as_secs(), "Reached run duration limit");
                    return ShutdownReason::Duration;
                }
            }

            tokio::select! {
                biased;
                () = &mut shutdown => {
                    info!("Interrupt received");
                    return ShutdownReason::Interrupted;
                }
                () = tokio::time::sleep(poll_interval) => {}
            }
        }
    }

    /// Encode, fan out and count one sample
    ///
    /// The handoff is not raced against shutdown: once a sample is counted
    /// every active sink gets it. A sink whose queue stays full therefore
    /// delays interrupt handling until it accepts the record.
    async fn emit(&self, session: &mut StreamSession, sample: &Sample) {
        let sequence = session.next_sequence();
        let record = match self.encoder.encode(sample, sequence) {
            Ok(record) => record,
            Err(e) => {
                session.record_encode_error();
                warn!(timestamp = %sample.timestamp, error = %e, "Sample skipped");
                return;
            }
        };

        let accepted = session.sinks.dispatch(&record).await;
        let count = session.record_sample(sample);
        record_sample_dispatched(sample.sensor_count(), accepted);

        let every = self.config.progress_every;
        if every > 0 && count % every == 0 {
            info!(samples = count, "{count} samples streamed");
        }
    }

    fn release_source(&mut self) {
        if let Err(e) = self.adapter.disconnect() {
            warn!(error = %e, "Error while releasing tracker");
        }
    }

    fn transition(&mut self, next: StreamState) {
        debug!(from = %self.state, to = %next, "Stream state change");
        record_stream_state(next.as_str());
        self.state = next;
    }
}
