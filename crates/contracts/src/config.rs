//! StreamConfig - Config Loader output
//!
//! Describes one streaming run: wire format, destinations, loop cadence,
//! fault policy and which tracker driver to open.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::{OutputFormat, SensorId};

/// Complete run configuration
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Wire format for console and file output
    #[serde(default)]
    pub format: OutputFormat,

    /// Optional recording path (truncated on open)
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Sleep between polls, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Emit a progress notice every N samples (0 = never)
    #[serde(default = "default_progress_every")]
    pub progress_every: u64,

    /// Consecutive read faults before the source is declared failed (0 = never)
    #[serde(default)]
    pub max_consecutive_faults: u32,

    /// Bounded handoff queue depth per sink
    #[serde(default = "default_sink_queue_capacity")]
    pub sink_queue_capacity: usize,

    /// Consecutive write failures before a sink is dropped (0 = never)
    #[serde(default)]
    pub sink_failure_limit: u32,

    /// Stop after this many samples
    #[serde(default)]
    pub max_samples: Option<u64>,

    /// Stop after this many seconds
    #[serde(default)]
    pub duration_secs: Option<u64>,

    /// Tracker driver selection
    #[serde(default)]
    pub source: SourceConfig,
}

fn default_poll_interval_ms() -> u64 {
    1
}

fn default_progress_every() -> u64 {
    100
}

fn default_sink_queue_capacity() -> usize {
    256
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            output: None,
            poll_interval_ms: default_poll_interval_ms(),
            progress_every: default_progress_every(),
            max_consecutive_faults: 0,
            sink_queue_capacity: default_sink_queue_capacity(),
            sink_failure_limit: 0,
            max_samples: None,
            duration_secs: None,
            source: SourceConfig::default(),
        }
    }
}

impl StreamConfig {
    /// Poll sleep as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Run time limit, if any
    pub fn duration(&self) -> Option<Duration> {
        self.duration_secs.map(Duration::from_secs)
    }
}

/// Which driver produces snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Synthetic device, no hardware needed
    Simulated(SimulatorConfig),
    /// Play back a recorded json stream
    Replay(ReplayConfig),
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::Simulated(SimulatorConfig::default())
    }
}

/// Simulated tracker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Sensor ids reported as attached
    #[serde(default = "default_sim_sensors")]
    pub sensors: Vec<SensorId>,

    /// Device measurement rate
    #[serde(default = "default_update_rate_hz")]
    pub update_rate_hz: f64,

    /// Probability that a sensor is missing from one snapshot
    #[serde(default)]
    pub dropout_probability: f64,

    /// Probability that one read fails
    #[serde(default)]
    pub fault_probability: f64,

    /// Peak uniform noise added to positions (device units)
    #[serde(default = "default_jitter")]
    pub jitter: f64,

    /// Fail initialize (exercise the connect error path)
    #[serde(default)]
    pub fail_initialize: bool,
}

fn default_sim_sensors() -> Vec<SensorId> {
    vec![SensorId::from(1u32), SensorId::from(2u32)]
}

fn default_update_rate_hz() -> f64 {
    80.0
}

fn default_jitter() -> f64 {
    0.05
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            sensors: default_sim_sensors(),
            update_rate_hz: default_update_rate_hz(),
            dropout_probability: 0.0,
            fault_probability: 0.0,
            jitter: default_jitter(),
            fail_initialize: false,
        }
    }
}

/// Replay settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Recorded json-lines file
    pub path: PathBuf,

    /// Playback speed multiplier (1.0 = recorded timing)
    #[serde(default = "default_replay_speed")]
    pub speed: f64,

    /// Restart from the first record after the last one
    #[serde(default)]
    pub loop_playback: bool,
}

fn default_replay_speed() -> f64 {
    1.0
}

impl ReplayConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            speed: default_replay_speed(),
            loop_playback: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: StreamConfig = toml::from_str("").unwrap();
        assert_eq!(config, StreamConfig::default());
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
        assert_eq!(config.progress_every, 100);
        assert!(config.duration().is_none());
    }

    #[test]
    fn test_replay_source_from_toml() {
        let config: StreamConfig = toml::from_str(
            r#"
format = "json"

[source]
kind = "replay"
path = "session.jsonl"
speed = 2.0
"#,
        )
        .unwrap();

        assert_eq!(config.format, OutputFormat::Json);
        match config.source {
            SourceConfig::Replay(replay) => {
                assert_eq!(replay.path, PathBuf::from("session.jsonl"));
                assert_eq!(replay.speed, 2.0);
                assert!(!replay.loop_playback);
            }
            other => panic!("unexpected source: {other:?}"),
        }
    }

    #[test]
    fn test_simulated_sensors_accept_integers() {
        let config: StreamConfig = toml::from_str(
            r#"
[source]
kind = "simulated"
sensors = [1, 2, 3]
"#,
        )
        .unwrap();

        let SourceConfig::Simulated(sim) = config.source else {
            panic!("expected simulated source");
        };
        assert_eq!(sim.sensors.len(), 3);
        assert_eq!(sim.sensors[2], "3");
        assert_eq!(sim.update_rate_hz, 80.0);
    }
}
