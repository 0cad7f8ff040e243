//! Tracker error types

use contracts::ContractError;
use thiserror::Error;

/// Tracker specific error
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Device could not be initialized; fatal before streaming
    #[error("failed to connect to tracker '{driver}': {source}")]
    ConnectFailed {
        driver: String,
        #[source]
        source: ContractError,
    },

    /// Operation not valid in the adapter's current state
    #[error("tracker adapter is {state}, cannot {operation}")]
    InvalidState {
        state: &'static str,
        operation: &'static str,
    },

    /// Driver reported an error while releasing the device
    #[error("failed to release tracker '{driver}': {source}")]
    ReleaseFailed {
        driver: String,
        #[source]
        source: ContractError,
    },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl TrackerError {
    /// Create connect error
    pub fn connect_failed(driver: impl Into<String>, source: ContractError) -> Self {
        Self::ConnectFailed {
            driver: driver.into(),
            source,
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, TrackerError>;
