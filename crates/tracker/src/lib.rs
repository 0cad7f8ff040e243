//! # Tracker
//!
//! Snapshot source module.
//!
//! Responsibilities:
//! - Own the tracking device lifecycle (connect / disconnect)
//! - Turn driver read errors into empty reads plus warnings
//! - Count consecutive read faults against the configured policy
//! - Provide drivers that need no hardware: simulated, replay, scripted

pub mod adapter;
pub mod error;
pub mod replay;
pub mod scripted;
pub mod simulated;

pub use adapter::{AdapterState, FaultPolicy, SourceAdapter, SourceStats};
pub use contracts::{AttachedSensors, Snapshot, TrackerDriver};
pub use error::{Result, TrackerError};
pub use replay::ReplayTracker;
pub use scripted::{record_event, EventLog, ScriptProbe, ScriptStep, ScriptedTracker};
pub use simulated::SimulatedTracker;

use contracts::SourceConfig;

/// Build the driver selected by configuration
pub fn driver_from_config(source: &SourceConfig) -> Box<dyn TrackerDriver> {
    match source {
        SourceConfig::Simulated(sim) => Box::new(SimulatedTracker::new(sim.clone())),
        SourceConfig::Replay(replay) => Box::new(ReplayTracker::new(replay.clone())),
    }
}
