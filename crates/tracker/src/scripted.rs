//! Scripted tracker
//!
//! Deterministic driver that replays a fixed list of read outcomes. Used by
//! unit and end-to-end tests, supports injecting init failures and read
//! faults, and records how often each lifecycle call was made.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use contracts::{ContractError, SensorId, Snapshot, TrackerDriver};

/// Shared, ordered log of lifecycle events across components
pub type EventLog = Arc<Mutex<Vec<String>>>;

/// Append to an event log, tolerating a poisoned lock
pub fn record_event(log: &EventLog, event: impl Into<String>) {
    log.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(event.into());
}

/// Outcome of one scripted read
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Read returns this snapshot
    Snapshot(Snapshot),
    /// Read returns no new data
    Empty,
    /// Read fails with a read fault
    Fault(String),
}

/// Call counters, readable after the driver has been moved away
#[derive(Debug, Default)]
pub struct ScriptProbe {
    initialize_calls: AtomicU32,
    read_calls: AtomicU32,
    close_calls: AtomicU32,
}

impl ScriptProbe {
    pub fn initialize_calls(&self) -> u32 {
        self.initialize_calls.load(Ordering::SeqCst)
    }

    pub fn read_calls(&self) -> u32 {
        self.read_calls.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> u32 {
        self.close_calls.load(Ordering::SeqCst)
    }
}

/// Scripted tracker driver
pub struct ScriptedTracker {
    sensors: Vec<SensorId>,
    steps: VecDeque<ScriptStep>,
    init_error: Option<ContractError>,
    end_when_drained: bool,
    probe: Arc<ScriptProbe>,
    events: Option<EventLog>,
}

impl ScriptedTracker {
    /// Driver reporting `sensors`, answering reads with `steps` in order and
    /// with "no data" once they run out
    pub fn new(sensors: Vec<SensorId>, steps: Vec<ScriptStep>) -> Self {
        Self {
            sensors,
            steps: steps.into(),
            init_error: None,
            end_when_drained: false,
            probe: Arc::new(ScriptProbe::default()),
            events: None,
        }
    }

    /// Convenience: one step per snapshot
    pub fn from_snapshots(sensors: Vec<SensorId>, snapshots: Vec<Snapshot>) -> Self {
        Self::new(
            sensors,
            snapshots.into_iter().map(ScriptStep::Snapshot).collect(),
        )
    }

    /// Make `initialize` fail with `error`
    pub fn fail_initialize(mut self, error: ContractError) -> Self {
        self.init_error = Some(error);
        self
    }

    /// Report the source as exhausted once all steps are consumed
    pub fn end_when_drained(mut self, end: bool) -> Self {
        self.end_when_drained = end;
        self
    }

    /// Record `tracker.initialize` / `tracker.close` into `log`
    pub fn with_event_log(mut self, log: EventLog) -> Self {
        self.events = Some(log);
        self
    }

    /// Shared call counters
    pub fn probe(&self) -> Arc<ScriptProbe> {
        Arc::clone(&self.probe)
    }

    fn record(&self, event: &str) {
        if let Some(log) = &self.events {
            record_event(log, event);
        }
    }
}

impl TrackerDriver for ScriptedTracker {
    fn name(&self) -> &str {
        "scripted"
    }

    fn initialize(&mut self) -> Result<(), ContractError> {
        self.probe.initialize_calls.fetch_add(1, Ordering::SeqCst);
        self.record("tracker.initialize");
        match self.init_error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn attached_sensors(&self) -> Vec<SensorId> {
        self.sensors.clone()
    }

    fn read_snapshot(&mut self) -> Result<Option<Snapshot>, ContractError> {
        self.probe.read_calls.fetch_add(1, Ordering::SeqCst);
        match self.steps.pop_front() {
            Some(ScriptStep::Snapshot(snapshot)) => Ok(Some(snapshot)),
            Some(ScriptStep::Empty) | None => Ok(None),
            Some(ScriptStep::Fault(message)) => Err(ContractError::read_fault(message)),
        }
    }

    fn close(&mut self) -> Result<(), ContractError> {
        self.probe.close_calls.fetch_add(1, Ordering::SeqCst);
        self.record("tracker.close");
        Ok(())
    }

    fn is_exhausted(&self) -> bool {
        self.end_when_drained && self.steps.is_empty()
    }
}
