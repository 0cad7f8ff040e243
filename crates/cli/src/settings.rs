//! Effective configuration: file (or defaults) plus command-line overrides.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{ReplayConfig, SimulatorConfig, SourceConfig, StreamConfig};
use tracing::info;

use crate::cli::{RunArgs, SourceArgs};

/// Load the config file if one was given, then apply source overrides
pub fn resolve_source(args: &SourceArgs) -> Result<StreamConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration");
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => StreamConfig::default(),
    };

    if let Some(path) = &args.replay {
        info!(replay = %path.display(), "Overriding source with replay from CLI");
        let mut replay = match &config.source {
            SourceConfig::Replay(existing) => ReplayConfig {
                path: path.clone(),
                ..existing.clone()
            },
            SourceConfig::Simulated(_) => ReplayConfig::new(path),
        };
        if let Some(speed) = args.replay_speed {
            replay.speed = speed;
        }
        if args.replay_loop {
            replay.loop_playback = true;
        }
        config.source = SourceConfig::Replay(replay);
    } else if !args.sensors.is_empty() {
        info!(sensors = ?args.sensors, "Overriding simulated sensors from CLI");
        let mut simulator = match &config.source {
            SourceConfig::Simulated(existing) => existing.clone(),
            SourceConfig::Replay(_) => SimulatorConfig::default(),
        };
        simulator.sensors = args.sensors.clone();
        config.source = SourceConfig::Simulated(simulator);
    }

    Ok(config)
}

/// Full `run` configuration, validated after overrides
pub fn resolve_run(args: &RunArgs) -> Result<StreamConfig> {
    let mut config = resolve_source(&args.source)?;

    if let Some(output) = &args.output {
        config.output = Some(output.clone());
    }
    if let Some(format) = args.format {
        config.format = format.into();
    }
    if args.max_samples > 0 {
        config.max_samples = Some(args.max_samples);
    }
    if args.duration > 0 {
        config.duration_secs = Some(args.duration);
    }
    if let Some(poll) = args.poll_interval_ms {
        config.poll_interval_ms = poll;
    }
    if let Some(faults) = args.max_consecutive_faults {
        config.max_consecutive_faults = faults;
    }

    config_loader::validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Short human label for the configured source
pub fn describe_source(source: &SourceConfig) -> String {
    match source {
        SourceConfig::Simulated(sim) => format!(
            "simulated ({} sensors @ {} Hz)",
            sim.sensors.len(),
            sim.update_rate_hz
        ),
        SourceConfig::Replay(replay) => format!(
            "replay of {} (x{}{})",
            replay.path.display(),
            replay.speed,
            if replay.loop_playback { ", looping" } else { "" }
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use contracts::OutputFormat;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["pose-streamer", "run"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Run(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_defaults_without_file() {
        let config = resolve_run(&run_args(&[])).unwrap();
        assert_eq!(config, StreamConfig::default());
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "format = \"json\"\npoll_interval_ms = 5\nmax_samples = 100").unwrap();
        let path = file.path().to_str().unwrap();

        let config = resolve_run(&run_args(&["-c", path, "-f", "csv", "--max-samples", "7"])).unwrap();
        assert_eq!(config.format, OutputFormat::Csv);
        assert_eq!(config.poll_interval_ms, 5);
        assert_eq!(config.max_samples, Some(7));
    }

    #[test]
    fn test_replay_override() {
        let config =
            resolve_run(&run_args(&["--replay", "run.jsonl", "--replay-speed", "4", "--replay-loop"]))
                .unwrap();
        let SourceConfig::Replay(replay) = config.source else {
            panic!("expected replay source");
        };
        assert_eq!(replay.speed, 4.0);
        assert!(replay.loop_playback);
    }

    #[test]
    fn test_sensor_override_validated() {
        let err = resolve_run(&run_args(&["--sensors", "1,1"])).unwrap_err();
        assert!(format!("{err:#}").contains("sensor"), "got: {err:#}");
    }

    #[test]
    fn test_missing_config_file() {
        let err = resolve_run(&run_args(&["-c", "/nonexistent/streamer.toml"])).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
