//! SinkHandle - manages a sink with isolated queue and worker task

use std::sync::Arc;

use metrics::counter;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{DataSink, EncodedRecord};

use crate::metrics::{MetricsSnapshot, SinkMetrics};

/// Final state of one sink after shutdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkReport {
    pub name: String,
    pub destination: String,
    pub samples_written: u64,
    pub failures: u64,
    pub degraded: bool,
    /// Error returned by flush/close, if any
    pub close_error: Option<String>,
}

/// Handle to a running sink worker
pub struct SinkHandle {
    /// Sink name
    name: String,
    destination: String,
    /// Channel to send records to worker
    tx: mpsc::Sender<EncodedRecord>,
    /// Shared metrics
    metrics: Arc<SinkMetrics>,
    /// Worker task handle
    worker_handle: JoinHandle<Option<String>>,
}

impl SinkHandle {
    /// Create a new SinkHandle and spawn the worker task
    ///
    /// After `failure_limit` consecutive write failures (0 = never) the
    /// sink is degraded and stops receiving records.
    pub fn spawn<S: DataSink + Send + 'static>(
        sink: S,
        queue_capacity: usize,
        failure_limit: u32,
    ) -> Self {
        let name = sink.name().to_string();
        let destination = sink.destination();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new());

        let worker = SinkWorker {
            name: name.clone(),
            metrics: Arc::clone(&metrics),
            failure_limit,
        };
        let worker_handle = tokio::spawn(worker.run(sink, rx));

        Self {
            name,
            destination,
            tx,
            metrics,
            worker_handle,
        }
    }

    /// Get sink name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    pub fn is_degraded(&self) -> bool {
        self.metrics.is_degraded()
    }

    /// Hand a record to the sink, waiting for queue space
    ///
    /// Returns false if the sink is degraded or its worker is gone.
    pub async fn send(&self, record: EncodedRecord) -> bool {
        if self.is_degraded() {
            return false;
        }
        match self.tx.send(record).await {
            Ok(()) => {
                self.metrics
                    .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
                true
            }
            Err(_) => {
                error!(sink = %self.name, "Sink worker closed unexpectedly");
                false
            }
        }
    }

    /// Shutdown the sink worker gracefully
    ///
    /// Drains the queue, then flushes and closes the sink.
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) -> SinkReport {
        // Drop sender to signal worker to stop
        drop(self.tx);
        let close_error = match self.worker_handle.await {
            Ok(close_error) => close_error,
            Err(e) => {
                error!(sink = %self.name, error = ?e, "Worker task panicked");
                Some(format!("worker task failed: {e}"))
            }
        };
        debug!(sink = %self.name, "SinkHandle shutdown complete");

        let snapshot: MetricsSnapshot = self.metrics.snapshot();
        SinkReport {
            name: self.name,
            destination: self.destination,
            samples_written: snapshot.samples_written,
            failures: snapshot.failure_count,
            degraded: snapshot.degraded,
            close_error,
        }
    }
}

struct SinkWorker {
    name: String,
    metrics: Arc<SinkMetrics>,
    failure_limit: u32,
}

impl SinkWorker {
    /// Consume records until the channel closes, then flush and close
    ///
    /// Returns the flush/close error, if any.
    #[instrument(name = "sink_worker_loop", skip_all, fields(sink = %self.name))]
    async fn run<S: DataSink>(
        self,
        mut sink: S,
        mut rx: mpsc::Receiver<EncodedRecord>,
    ) -> Option<String> {
        debug!(sink = %self.name, "Sink worker started");

        while let Some(record) = rx.recv().await {
            self.metrics.set_queue_len(rx.len());

            if self.metrics.is_degraded() {
                self.metrics.inc_skipped_count();
                continue;
            }

            match sink.write(&record).await {
                Ok(()) => {
                    self.metrics.record_write(record.is_sample());
                    counter!("pose_streamer_sink_writes_total", "sink" => self.name.clone())
                        .increment(1);
                }
                Err(e) => self.on_failure(&record, &e),
            }
        }

        let mut close_error = None;
        if let Err(e) = sink.flush().await {
            error!(sink = %self.name, error = %e, "Flush failed on shutdown");
            close_error = Some(e.to_string());
        }
        if let Err(e) = sink.close().await {
            error!(sink = %self.name, error = %e, "Close failed on shutdown");
            close_error = Some(e.to_string());
        }

        debug!(sink = %self.name, "Sink worker stopped");
        close_error
    }

    fn on_failure(&self, record: &EncodedRecord, e: &contracts::ContractError) {
        let consecutive = self.metrics.record_failure();
        counter!("pose_streamer_sink_failures_total", "sink" => self.name.clone()).increment(1);
        error!(
            sink = %self.name,
            seq = record.sequence(),
            consecutive,
            error = %e,
            "Write failed"
        );

        if self.failure_limit > 0
            && consecutive >= self.failure_limit
            && self.metrics.mark_degraded()
        {
            warn!(
                sink = %self.name,
                failures = consecutive,
                "Sink degraded, no further records will be sent to it"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ContractError, OutputFormat};
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::time::{sleep, Duration};

    /// Mock sink for testing
    struct MockSink {
        name: String,
        write_count: Arc<AtomicU64>,
        should_fail: bool,
        delay_ms: u64,
    }

    impl DataSink for MockSink {
        fn name(&self) -> &str {
            &self.name
        }

        fn destination(&self) -> String {
            "mock".to_string()
        }

        async fn write(&mut self, _record: &EncodedRecord) -> Result<(), ContractError> {
            if self.delay_ms > 0 {
                sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.should_fail {
                return Err(ContractError::sink_write(&self.name, "mock failure"));
            }
            self.write_count.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), ContractError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    fn mock(name: &str, should_fail: bool, delay_ms: u64) -> (MockSink, Arc<AtomicU64>) {
        let write_count = Arc::new(AtomicU64::new(0));
        let sink = MockSink {
            name: name.to_string(),
            write_count: Arc::clone(&write_count),
            should_fail,
            delay_ms,
        };
        (sink, write_count)
    }

    fn record(seq: u64) -> EncodedRecord {
        EncodedRecord::sample(OutputFormat::Csv, seq, format!("{seq}\n"))
    }

    #[tokio::test]
    async fn test_sink_handle_basic() {
        let (sink, write_count) = mock("test", false, 0);
        let handle = SinkHandle::spawn(sink, 10, 0);

        for i in 1..=5 {
            assert!(handle.send(record(i)).await);
        }

        let report = handle.shutdown().await;
        assert_eq!(write_count.load(Ordering::Relaxed), 5);
        assert_eq!(report.samples_written, 5);
        assert_eq!(report.destination, "mock");
        assert!(report.close_error.is_none());
    }

    #[tokio::test]
    async fn test_slow_sink_applies_backpressure() {
        let (sink, write_count) = mock("slow", false, 5);
        // Small queue capacity
        let handle = SinkHandle::spawn(sink, 2, 0);

        // More than the queue can hold; every send waits instead of dropping
        for i in 1..=10 {
            assert!(handle.send(record(i)).await);
        }

        let report = handle.shutdown().await;
        assert_eq!(write_count.load(Ordering::Relaxed), 10);
        assert_eq!(report.samples_written, 10);
    }

    #[tokio::test]
    async fn test_sink_handle_failure_isolation() {
        let (sink, _) = mock("failing", true, 0);
        let handle = SinkHandle::spawn(sink, 10, 0);

        for i in 1..=3 {
            assert!(handle.send(record(i)).await);
        }

        let report = handle.shutdown().await;
        assert_eq!(report.failures, 3);
        assert_eq!(report.samples_written, 0);
        assert!(!report.degraded);
    }

    #[tokio::test]
    async fn test_failure_limit_degrades() {
        let (sink, _) = mock("failing", true, 0);
        let handle = SinkHandle::spawn(sink, 1, 2);

        let mut accepted = 0;
        for i in 1..=10 {
            if handle.send(record(i)).await {
                accepted += 1;
            }
            // let the worker catch up so the flag is observed
            sleep(Duration::from_millis(2)).await;
        }

        assert!(handle.is_degraded());
        assert!(accepted < 10);
        let report = handle.shutdown().await;
        assert!(report.degraded);
        assert!(report.failures >= 2);
    }
}
