//! MemorySink - keeps records in memory
//!
//! Used to capture a stream in tests and by callers embedding the pipeline.
//! Can be told to fail writes to exercise sink isolation.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use contracts::{ContractError, DataSink, EncodedRecord};

/// Shared view of what a [`MemorySink`] received
#[derive(Debug, Default)]
pub struct MemoryProbe {
    records: Mutex<Vec<EncodedRecord>>,
    close_calls: AtomicU32,
}

impl MemoryProbe {
    pub fn records(&self) -> MutexGuard<'_, Vec<EncodedRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Everything written, concatenated
    pub fn text(&self) -> String {
        self.records().iter().map(EncodedRecord::as_text).collect()
    }

    /// Sequence numbers of the sample records, in arrival order
    pub fn sample_sequences(&self) -> Vec<u64> {
        self.records()
            .iter()
            .filter(|r| r.is_sample())
            .map(EncodedRecord::sequence)
            .collect()
    }

    pub fn close_calls(&self) -> u32 {
        self.close_calls.load(Ordering::SeqCst)
    }
}

/// In-memory sink
pub struct MemorySink {
    name: String,
    probe: Arc<MemoryProbe>,
    fail_writes: bool,
    write_delay: Option<Duration>,
    events: Option<Arc<Mutex<Vec<String>>>>,
    closed: bool,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            probe: Arc::new(MemoryProbe::default()),
            fail_writes: false,
            write_delay: None,
            events: None,
            closed: false,
        }
    }

    /// Make every write fail
    pub fn failing(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Sleep before every write, like a slow consumer
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    /// Append `sink.close:<name>` to `log` when closed
    pub fn with_event_log(mut self, log: Arc<Mutex<Vec<String>>>) -> Self {
        self.events = Some(log);
        self
    }

    pub fn probe(&self) -> Arc<MemoryProbe> {
        Arc::clone(&self.probe)
    }
}

impl DataSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn destination(&self) -> String {
        "memory".to_string()
    }

    async fn write(&mut self, record: &EncodedRecord) -> Result<(), ContractError> {
        if self.closed {
            return Err(ContractError::sink_closed(&self.name));
        }
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_writes {
            return Err(ContractError::sink_write(&self.name, "injected failure"));
        }
        self.probe.records().push(record.clone());
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        self.probe.close_calls.fetch_add(1, Ordering::SeqCst);
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if let Some(log) = &self.events {
            log.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(format!("sink.close:{}", self.name));
        }
        Ok(())
    }
}
