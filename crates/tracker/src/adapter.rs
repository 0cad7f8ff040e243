//! SourceAdapter - owns one tracker driver for the life of a stream
//!
//! Read errors never escape `read_snapshot`: they are logged, counted and
//! reported as "no data", so acquisition keeps polling.

use std::fmt;

use contracts::{AttachedSensors, Snapshot, TrackerDriver};
use metrics::counter;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, TrackerError};

/// When repeated read faults escalate to a fatal source error
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultPolicy {
    /// Consecutive faults before the source is declared failed (0 = never)
    pub max_consecutive_faults: u32,
}

impl FaultPolicy {
    pub fn new(max_consecutive_faults: u32) -> Self {
        Self {
            max_consecutive_faults,
        }
    }

    fn is_exceeded(&self, consecutive: u32) -> bool {
        self.max_consecutive_faults > 0 && consecutive >= self.max_consecutive_faults
    }
}

/// Adapter lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    /// Not yet connected (or connect failed)
    Idle,
    /// Device initialized, reads allowed
    Connected,
    /// Device released; terminal
    Released,
}

impl fmt::Display for AdapterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AdapterState {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connected => "connected",
            Self::Released => "released",
        }
    }
}

/// Read counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    /// Reads that produced a snapshot
    pub snapshots: u64,
    /// Reads that produced nothing new
    pub empty_reads: u64,
    /// Reads that failed
    pub faults: u64,
    /// Current run of failed reads
    pub consecutive_faults: u32,
}

/// Snapshot source adapter
///
/// Single owner of the device. Dropping a connected adapter releases the
/// device.
pub struct SourceAdapter<D: TrackerDriver> {
    driver: D,
    state: AdapterState,
    attached: AttachedSensors,
    policy: FaultPolicy,
    stats: SourceStats,
}

impl<D: TrackerDriver> SourceAdapter<D> {
    /// Wrap a driver without touching the device
    pub fn new(driver: D, policy: FaultPolicy) -> Self {
        Self {
            driver,
            state: AdapterState::Idle,
            attached: AttachedSensors::default(),
            policy,
            stats: SourceStats::default(),
        }
    }

    pub fn driver_name(&self) -> &str {
        self.driver.name()
    }

    pub fn state(&self) -> AdapterState {
        self.state
    }

    /// Sensors reported at connect time (empty before connect)
    pub fn attached(&self) -> &AttachedSensors {
        &self.attached
    }

    pub fn stats(&self) -> SourceStats {
        self.stats
    }

    /// Initialize the device and capture the attached sensor set
    ///
    /// # Errors
    /// `ConnectFailed` when the driver cannot initialize; the adapter stays
    /// `Idle`. `InvalidState` when already connected or released.
    #[instrument(name = "source_connect", skip(self), fields(driver = %self.driver.name()))]
    pub fn connect(&mut self) -> Result<AttachedSensors> {
        if self.state != AdapterState::Idle {
            return Err(TrackerError::InvalidState {
                state: self.state.as_str(),
                operation: "connect",
            });
        }

        info!("Initializing tracker...");
        self.driver
            .initialize()
            .map_err(|e| TrackerError::connect_failed(self.driver.name(), e))?;

        self.attached = AttachedSensors::new(self.driver.attached_sensors());
        self.state = AdapterState::Connected;

        if self.attached.is_empty() {
            warn!("Tracker reports no attached sensors, samples will be empty");
        }
        info!(sensors = %self.attached, "Tracker ready");

        Ok(self.attached.clone())
    }

    /// Pull the latest snapshot
    ///
    /// `None` means nothing new: device not connected, no fresh data, or a
    /// read fault (logged).
    pub fn read_snapshot(&mut self) -> Option<Snapshot> {
        if self.state != AdapterState::Connected {
            return None;
        }

        match self.driver.read_snapshot() {
            Ok(Some(snapshot)) => {
                self.stats.snapshots += 1;
                self.stats.consecutive_faults = 0;
                Some(snapshot)
            }
            Ok(None) => {
                self.stats.empty_reads += 1;
                None
            }
            Err(e) => {
                self.stats.faults += 1;
                self.stats.consecutive_faults = self.stats.consecutive_faults.saturating_add(1);
                counter!("pose_streamer_read_faults_total").increment(1);
                warn!(
                    driver = %self.driver.name(),
                    consecutive = self.stats.consecutive_faults,
                    error = %e,
                    "Error reading tracker data"
                );
                None
            }
        }
    }

    /// Whether read faults have crossed the fault policy
    pub fn is_failed(&self) -> bool {
        self.policy.is_exceeded(self.stats.consecutive_faults)
    }

    /// Whether the driver has run out of data for good
    pub fn is_exhausted(&self) -> bool {
        self.state == AdapterState::Connected && self.driver.is_exhausted()
    }

    /// Release the device
    ///
    /// Safe to call any number of times; only the first call on a connected
    /// adapter reaches the driver.
    #[instrument(name = "source_disconnect", skip(self), fields(driver = %self.driver.name()))]
    pub fn disconnect(&mut self) -> Result<()> {
        match self.state {
            AdapterState::Connected => {
                self.state = AdapterState::Released;
                info!("Closing tracker connection...");
                self.driver
                    .close()
                    .map_err(|source| TrackerError::ReleaseFailed {
                        driver: self.driver.name().to_string(),
                        source,
                    })
            }
            AdapterState::Idle => {
                self.state = AdapterState::Released;
                Ok(())
            }
            AdapterState::Released => {
                debug!("Tracker already released");
                Ok(())
            }
        }
    }
}

impl<D: TrackerDriver> Drop for SourceAdapter<D> {
    fn drop(&mut self) {
        if self.state == AdapterState::Connected {
            if let Err(e) = self.disconnect() {
                warn!(error = %e, "Tracker release on drop failed");
            }
        }
    }
}
