//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{SourceConfig, StreamConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;
use crate::settings::describe_source;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    source: String,
    format: String,
    output: Option<String>,
    poll_interval_ms: u64,
    max_consecutive_faults: u32,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{json}");
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    source: describe_source(&config.source),
                    format: config.format.to_string(),
                    output: config.output.as_ref().map(|p| p.display().to_string()),
                    poll_interval_ms: config.poll_interval_ms,
                    max_consecutive_faults: config.max_consecutive_faults,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Non-fatal issues
fn collect_warnings(config: &StreamConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.max_consecutive_faults == 0 {
        warnings.push(
            "max_consecutive_faults is 0 - read faults never stop the stream".to_string(),
        );
    }
    if config.sink_failure_limit == 0 {
        warnings.push("sink_failure_limit is 0 - failing sinks are never degraded".to_string());
    }

    match &config.source {
        SourceConfig::Simulated(sim) => {
            if sim.dropout_probability >= 1.0 {
                warnings.push("dropout_probability is 1.0 - every sample will be empty".to_string());
            }
            if sim.fail_initialize {
                warnings.push("fail_initialize is set - connect will always fail".to_string());
            }
            let poll_hz = 1000.0 / config.poll_interval_ms as f64;
            if sim.update_rate_hz > poll_hz {
                warnings.push(format!(
                    "update_rate_hz ({}) exceeds the poll rate ({poll_hz:.1} Hz) - updates will be missed",
                    sim.update_rate_hz
                ));
            }
        }
        SourceConfig::Replay(replay) => {
            if !replay.path.exists() {
                warnings.push(format!(
                    "replay file {} does not exist yet",
                    replay.path.display()
                ));
            }
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Source: {}", summary.source);
            println!("  Format: {}", summary.format);
            println!(
                "  Output: {}",
                summary.output.as_deref().unwrap_or("(stdout only)")
            );
            println!("  Poll interval: {} ms", summary.poll_interval_ms);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {warning}");
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {error}");
        }
    }
}
