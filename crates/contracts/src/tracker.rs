//! TrackerDriver trait - opaque tracking hardware binding
//!
//! The driver owns device initialization, coordinate frames and the
//! hardware-level synchronous read. Everything above it only sees
//! `Snapshot`s. Simulated, replayed and scripted devices implement the same
//! trait as a hardware binding would.

use crate::{ContractError, SensorId, Snapshot};

/// Tracking device driver
///
/// # Example
///
/// ```ignore
/// let mut driver: Box<dyn TrackerDriver> = open_driver();
/// driver.initialize()?;
/// println!("attached: {:?}", driver.attached_sensors());
/// while let Some(snapshot) = driver.read_snapshot()? {
///     println!("t = {}", snapshot.timestamp);
/// }
/// driver.close()?;
/// ```
pub trait TrackerDriver: Send {
    /// Driver name (used for logging)
    fn name(&self) -> &str;

    /// Initialize the device
    ///
    /// # Errors
    /// `DeviceUnavailable` / `DriverInit` when the device cannot be used.
    fn initialize(&mut self) -> Result<(), ContractError>;

    /// Sensors attached at initialize time, in device order
    fn attached_sensors(&self) -> Vec<SensorId>;

    /// Read the latest multi-sensor snapshot
    ///
    /// Returns `Ok(None)` when no new data is available yet. May block
    /// briefly, never indefinitely.
    fn read_snapshot(&mut self) -> Result<Option<Snapshot>, ContractError>;

    /// Release the device
    fn close(&mut self) -> Result<(), ContractError>;

    /// Whether the source has no more data to give, ever
    ///
    /// Hardware never runs dry; finite sources (recordings) do.
    fn is_exhausted(&self) -> bool {
        false
    }
}

impl<T: TrackerDriver + ?Sized> TrackerDriver for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn initialize(&mut self) -> Result<(), ContractError> {
        (**self).initialize()
    }

    fn attached_sensors(&self) -> Vec<SensorId> {
        (**self).attached_sensors()
    }

    fn read_snapshot(&mut self) -> Result<Option<Snapshot>, ContractError> {
        (**self).read_snapshot()
    }

    fn close(&mut self) -> Result<(), ContractError> {
        (**self).close()
    }

    fn is_exhausted(&self) -> bool {
        (**self).is_exhausted()
    }
}
