//! Config validation
//!
//! Rules:
//! - poll_interval_ms > 0, sink_queue_capacity > 0
//! - max_samples / duration_secs, when set, > 0
//! - simulator: at least one sensor, unique sensor ids, update_rate_hz > 0
//!   with a representable period, probabilities within [0, 1], finite
//!   jitter >= 0
//! - replay: non-empty path, speed > 0

use std::collections::HashSet;
use std::time::Duration;

use contracts::{ContractError, ReplayConfig, SimulatorConfig, SourceConfig, StreamConfig};

/// Validate a StreamConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &StreamConfig) -> Result<(), ContractError> {
    validate_loop(config)?;
    validate_limits(config)?;
    match &config.source {
        SourceConfig::Simulated(sim) => validate_simulator(sim)?,
        SourceConfig::Replay(replay) => validate_replay(replay)?,
    }
    Ok(())
}

/// Loop cadence and queue sizing
fn validate_loop(config: &StreamConfig) -> Result<(), ContractError> {
    if config.poll_interval_ms == 0 {
        return Err(ContractError::config_validation(
            "poll_interval_ms",
            "poll_interval_ms must be > 0",
        ));
    }
    if config.sink_queue_capacity == 0 {
        return Err(ContractError::config_validation(
            "sink_queue_capacity",
            "sink_queue_capacity must be > 0",
        ));
    }
    Ok(())
}

fn validate_limits(config: &StreamConfig) -> Result<(), ContractError> {
    if config.max_samples == Some(0) {
        return Err(ContractError::config_validation(
            "max_samples",
            "max_samples must be > 0 when set",
        ));
    }
    if config.duration_secs == Some(0) {
        return Err(ContractError::config_validation(
            "duration_secs",
            "duration_secs must be > 0 when set",
        ));
    }
    Ok(())
}

fn validate_simulator(sim: &SimulatorConfig) -> Result<(), ContractError> {
    if sim.sensors.is_empty() {
        return Err(ContractError::config_validation(
            "source.sensors",
            "at least one sensor is required",
        ));
    }

    let mut seen = HashSet::new();
    for sensor in &sim.sensors {
        if sensor.is_empty() {
            return Err(ContractError::config_validation(
                "source.sensors",
                "sensor id cannot be empty",
            ));
        }
        if !seen.insert(sensor.as_str()) {
            return Err(ContractError::config_validation(
                format!("source.sensors[{sensor}]"),
                "duplicate sensor id",
            ));
        }
    }

    if !(sim.update_rate_hz > 0.0) {
        return Err(ContractError::config_validation(
            "source.update_rate_hz",
            format!("update_rate_hz must be > 0, got {}", sim.update_rate_hz),
        ));
    }
    if Duration::try_from_secs_f64(1.0 / sim.update_rate_hz).is_err() {
        return Err(ContractError::config_validation(
            "source.update_rate_hz",
            format!("update_rate_hz {} is too small", sim.update_rate_hz),
        ));
    }

    for (field, value) in [
        ("source.dropout_probability", sim.dropout_probability),
        ("source.fault_probability", sim.fault_probability),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(ContractError::config_validation(
                field,
                format!("probability must be within [0, 1], got {value}"),
            ));
        }
    }

    if !(sim.jitter >= 0.0 && sim.jitter.is_finite()) {
        return Err(ContractError::config_validation(
            "source.jitter",
            format!("jitter must be finite and >= 0, got {}", sim.jitter),
        ));
    }

    Ok(())
}

fn validate_replay(replay: &ReplayConfig) -> Result<(), ContractError> {
    if replay.path.as_os_str().is_empty() {
        return Err(ContractError::config_validation(
            "source.path",
            "replay path cannot be empty",
        ));
    }
    if !(replay.speed > 0.0) {
        return Err(ContractError::config_validation(
            "source.speed",
            format!("speed must be > 0, got {}", replay.speed),
        ));
    }
    Ok(())
}
