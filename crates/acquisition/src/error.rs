//! Acquisition error types

use dispatcher::DispatcherError;
use thiserror::Error;
use tracker::TrackerError;

use crate::state::StreamState;

/// Errors that end a run before or instead of streaming
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// Source could not be connected; no session was created
    #[error("connect failed: {0}")]
    Connect(#[source] TrackerError),

    /// A sink could not be opened; the source has been released
    #[error("failed to open sinks: {0}")]
    SinkOpen(#[source] DispatcherError),

    /// `run` called on a controller that is not idle
    #[error("controller is {state}, a run can only start from idle")]
    AlreadyRun { state: StreamState },
}

impl AcquisitionError {
    /// Whether the device never came up
    pub fn is_connect_failure(&self) -> bool {
        matches!(self, Self::Connect(_))
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, AcquisitionError>;
