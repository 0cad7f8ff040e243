//! `run` command implementation.

use acquisition::{Controller, StreamReport};
use anyhow::{Context, Result};
use contracts::StreamConfig;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::settings::{describe_source, resolve_run};

/// Execute the `run` command
pub async fn run_stream(args: &RunArgs) -> Result<()> {
    let config = resolve_run(args)?;

    info!(
        source = %describe_source(&config.source),
        format = %config.format,
        output = ?config.output,
        poll_interval_ms = config.poll_interval_ms,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let driver = tracker::driver_from_config(&config.source);
    let mut controller = Controller::new(driver, config).with_standard_sinks();

    let report = match controller.run(shutdown_signal()).await {
        Ok(report) => report,
        Err(e) if e.is_connect_failure() => {
            return Err(e).context("Could not connect to the tracking device");
        }
        Err(e) => return Err(e).context("Stream failed"),
    };

    print_report(&report);

    if report.failed_without_data() {
        anyhow::bail!("Stream stopped ({}) before any sample was written", report.reason);
    }
    if report.reason.is_failure() {
        warn!(reason = %report.reason, "Stream ended early");
    }
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Run summary, on stderr
fn print_report(report: &StreamReport) {
    eprintln!("\n=== Stream Summary ===\n");
    eprintln!("  Started:   {}", report.started_at.format("%Y-%m-%d %H:%M:%S"));
    eprintln!("  Stopped:   {}", report.reason);
    eprintln!(
        "  Samples:   {} in {:.1}s ({:.1}/s)",
        report.samples,
        report.duration.as_secs_f64(),
        report.sample_rate()
    );
    eprintln!(
        "  Reads:     {} snapshots, {} empty, {} faults",
        report.source.snapshots, report.source.empty_reads, report.source.faults
    );
    if report.encode_errors > 0 {
        eprintln!("  Skipped:   {} unencodable samples", report.encode_errors);
    }

    eprintln!("\nSinks:");
    for sink in &report.sinks {
        let mut line = format!(
            "  - {} -> {}: {} samples",
            sink.name, sink.destination, sink.samples_written
        );
        if sink.failures > 0 {
            line.push_str(&format!(", {} failed writes", sink.failures));
        }
        if sink.degraded {
            line.push_str(" (degraded)");
        }
        if let Some(ref error) = sink.close_error {
            line.push_str(&format!(", close error: {error}"));
        }
        eprintln!("{line}");
    }

    eprintln!("\n{}", report.summary);
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &StreamConfig) {
    eprintln!("\n=== Configuration Summary ===\n");
    eprintln!("  Source:        {}", describe_source(&config.source));
    eprintln!("  Format:        {}", config.format);
    match &config.output {
        Some(path) => eprintln!("  Output file:   {}", path.display()),
        None => eprintln!("  Output file:   (stdout only)"),
    }
    eprintln!("  Poll interval: {} ms", config.poll_interval_ms);
    match config.max_consecutive_faults {
        0 => eprintln!("  Fault limit:   none"),
        n => eprintln!("  Fault limit:   {n} consecutive"),
    }
    if let Some(max) = config.max_samples {
        eprintln!("  Max samples:   {max}");
    }
    if let Some(secs) = config.duration_secs {
        eprintln!("  Duration:      {secs}s");
    }
    eprintln!();
}
