//! Simulated tracker
//!
//! Implements `TrackerDriver` without hardware. Each sensor moves on its own
//! slow orbit around the transmitter, new data appears at the configured
//! measurement rate, and reads in between return nothing, like a real
//! device polled faster than it updates.

use std::f64::consts::TAU;
use std::time::{Duration, Instant};

use contracts::{ContractError, RawPose, SensorId, SimulatorConfig, Snapshot, TrackerDriver};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Orbit angular speed (rad/s)
const ORBIT_RATE: f64 = 0.5;

/// Simulated tracker
pub struct SimulatedTracker {
    config: SimulatorConfig,
    rng: StdRng,
    period: Duration,
    started_at: Option<Instant>,
    last_update: Option<Instant>,
}

impl SimulatedTracker {
    /// Create with OS-seeded randomness
    pub fn new(config: SimulatorConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Create with a fixed seed (reproducible dropout/noise)
    pub fn with_seed(config: SimulatorConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: SimulatorConfig, rng: StdRng) -> Self {
        // Unrepresentable periods disable rate limiting.
        let period = if config.update_rate_hz > 0.0 {
            Duration::try_from_secs_f64(1.0 / config.update_rate_hz).unwrap_or(Duration::ZERO)
        } else {
            Duration::ZERO
        };
        Self {
            config,
            rng,
            period,
            started_at: None,
            last_update: None,
        }
    }

    /// Pose of sensor number `index` at `t` seconds
    fn pose_at(&mut self, index: usize, t: f64) -> RawPose {
        let phase = index as f64 * TAU / 4.0;
        let radius = 20.0 + 5.0 * index as f64;
        let angle = ORBIT_RATE * t + phase;

        let mut position = [
            radius * angle.cos(),
            radius * angle.sin(),
            10.0 + 2.0 * (2.0 * angle).sin(),
        ];
        if self.config.jitter > 0.0 && self.config.jitter.is_finite() {
            let jitter = self.config.jitter;
            for axis in &mut position {
                *axis += self.rng.random_range(-jitter..=jitter);
            }
        }

        let azimuth = wrap_degrees(angle.to_degrees() + 90.0);
        let elevation = 15.0 * (0.3 * t + phase).sin();
        let roll = 30.0 * (0.2 * t + phase).cos();
        let quality = f64::from(self.rng.random_range(0u8..4));

        [
            position[0],
            position[1],
            position[2],
            azimuth,
            elevation,
            roll,
            quality,
        ]
    }
}

/// Wrap an angle into [-180, 180)
fn wrap_degrees(deg: f64) -> f64 {
    (deg + 180.0).rem_euclid(360.0) - 180.0
}

impl TrackerDriver for SimulatedTracker {
    fn name(&self) -> &str {
        "simulated"
    }

    fn initialize(&mut self) -> Result<(), ContractError> {
        if self.config.fail_initialize {
            return Err(ContractError::driver_init(
                self.name(),
                "simulated initialization failure",
            ));
        }
        self.started_at = Some(Instant::now());
        self.last_update = None;
        debug!(
            sensors = self.config.sensors.len(),
            update_rate_hz = self.config.update_rate_hz,
            "simulated tracker started"
        );
        Ok(())
    }

    fn attached_sensors(&self) -> Vec<SensorId> {
        self.config.sensors.clone()
    }

    fn read_snapshot(&mut self) -> Result<Option<Snapshot>, ContractError> {
        let Some(started_at) = self.started_at else {
            return Err(ContractError::read_fault("tracker not initialized"));
        };

        let now = Instant::now();
        if let Some(last) = self.last_update {
            if now.duration_since(last) < self.period {
                return Ok(None);
            }
        }
        self.last_update = Some(now);

        if self.config.fault_probability > 0.0
            && self.rng.random_bool(self.config.fault_probability)
        {
            return Err(ContractError::read_fault("simulated transient fault"));
        }

        let elapsed = now.duration_since(started_at);
        let t = elapsed.as_secs_f64();
        let mut snapshot = Snapshot::new(elapsed.as_secs_f64() * 1000.0);

        for index in 0..self.config.sensors.len() {
            if self.config.dropout_probability > 0.0
                && self.rng.random_bool(self.config.dropout_probability)
            {
                continue;
            }
            let raw = self.pose_at(index, t);
            snapshot
                .readings
                .insert(self.config.sensors[index].clone(), raw);
        }

        Ok(Some(snapshot))
    }

    fn close(&mut self) -> Result<(), ContractError> {
        self.started_at = None;
        debug!("simulated tracker stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{PoseReading, Timestamp};

    fn config() -> SimulatorConfig {
        SimulatorConfig {
            sensors: vec![SensorId::from(1u32), SensorId::from(2u32)],
            update_rate_hz: 1000.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_read_before_initialize_faults() {
        let mut tracker = SimulatedTracker::with_seed(config(), 7);
        assert!(tracker.read_snapshot().is_err());
    }

    #[test]
    fn test_first_read_has_all_sensors() {
        let mut tracker = SimulatedTracker::with_seed(config(), 7);
        tracker.initialize().unwrap();

        let snapshot = tracker.read_snapshot().unwrap().expect("first read has data");
        assert_eq!(snapshot.readings.len(), 2);
        assert!(matches!(snapshot.timestamp, Timestamp::Real(t) if t >= 0.0));

        let reading = PoseReading::from_raw(&snapshot.readings["1"]);
        assert!(reading.quality < 4);
        assert!((-180.0..180.0).contains(&reading.orientation[0]));
    }

    #[test]
    fn test_rate_limits_updates() {
        let mut tracker = SimulatedTracker::with_seed(
            SimulatorConfig {
                update_rate_hz: 1.0,
                ..config()
            },
            7,
        );
        tracker.initialize().unwrap();

        assert!(tracker.read_snapshot().unwrap().is_some());
        assert!(tracker.read_snapshot().unwrap().is_none());
    }

    #[test]
    fn test_full_dropout_yields_empty_snapshots() {
        let mut tracker = SimulatedTracker::with_seed(
            SimulatorConfig {
                dropout_probability: 1.0,
                ..config()
            },
            7,
        );
        tracker.initialize().unwrap();

        let snapshot = tracker.read_snapshot().unwrap().unwrap();
        assert!(snapshot.readings.is_empty());
    }

    #[test]
    fn test_fail_initialize() {
        let mut tracker = SimulatedTracker::with_seed(
            SimulatorConfig {
                fail_initialize: true,
                ..config()
            },
            7,
        );
        let err = tracker.initialize().unwrap_err();
        assert!(err.is_connect_failure());
    }

    #[test]
    fn test_degenerate_config_does_not_panic() {
        let mut tracker = SimulatedTracker::with_seed(
            SimulatorConfig {
                update_rate_hz: 1e-300,
                jitter: f64::INFINITY,
                ..config()
            },
            7,
        );
        tracker.initialize().unwrap();

        let snapshot = tracker.read_snapshot().unwrap().unwrap();
        let reading = PoseReading::from_raw(&snapshot.readings["1"]);
        assert!(reading.position.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_wrap_degrees() {
        assert_eq!(wrap_degrees(190.0), -170.0);
        assert_eq!(wrap_degrees(-190.0), 170.0);
        assert_eq!(wrap_degrees(45.0), 45.0);
    }
}
