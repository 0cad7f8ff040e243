//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use contracts::{OutputFormat, SensorId};
use std::path::PathBuf;

/// Pose Streamer - real-time 6DOF pose stream from an EM tracker
#[derive(Parser, Debug)]
#[command(
    name = "pose-streamer",
    author,
    version,
    about = "Stream electromagnetic tracker poses as CSV or JSON lines",
    long_about = "Connects to a tracking device, polls multi-sensor pose snapshots and\n\
                  streams them to stdout, optionally recording the same stream to a file.\n\n\
                  Operator messages go to stderr; stdout carries only data."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "POSE_STREAMER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "POSE_STREAMER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream poses until interrupted
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Connect, list attached sensors, disconnect
    Sensors(SensorsArgs),
}

/// Where snapshots come from; overrides the config file
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, env = "POSE_STREAMER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Replay a recorded JSON-lines stream instead of a live device
    #[arg(long, env = "POSE_STREAMER_REPLAY")]
    pub replay: Option<PathBuf>,

    /// Replay speed multiplier (1.0 = recorded timing)
    #[arg(long, requires = "replay")]
    pub replay_speed: Option<f64>,

    /// Restart the replay when it reaches the end
    #[arg(long, requires = "replay")]
    pub replay_loop: bool,

    /// Sensor ids reported by the simulated tracker (comma separated)
    #[arg(long, value_delimiter = ',', conflicts_with = "replay", env = "POSE_STREAMER_SENSORS")]
    pub sensors: Vec<SensorId>,
}

/// Arguments for the `run` command
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Also record the stream to this file (truncated)
    #[arg(short, long, env = "POSE_STREAMER_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, env = "POSE_STREAMER_FORMAT")]
    pub format: Option<FormatArg>,

    /// Stop after this many samples (0 = unlimited)
    #[arg(long, default_value = "0", env = "POSE_STREAMER_MAX_SAMPLES")]
    pub max_samples: u64,

    /// Stop after this many seconds (0 = no limit)
    #[arg(long, default_value = "0", env = "POSE_STREAMER_DURATION")]
    pub duration: u64,

    /// Sleep between polls in milliseconds
    #[arg(long, env = "POSE_STREAMER_POLL_INTERVAL_MS")]
    pub poll_interval_ms: Option<u64>,

    /// Consecutive read faults before giving up (0 = never)
    #[arg(long, env = "POSE_STREAMER_MAX_FAULTS")]
    pub max_consecutive_faults: Option<u32>,

    /// Validate configuration and exit without streaming
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `sensors` command
#[derive(Args, Debug)]
pub struct SensorsArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Stream format
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    /// One line per sensor, with header
    Csv,
    /// One JSON object per sample
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
