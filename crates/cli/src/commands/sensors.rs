//! `sensors` command implementation.

use anyhow::{Context, Result};
use contracts::{AttachedSensors, SensorId};
use serde::Serialize;
use tracing::warn;
use tracker::{FaultPolicy, SourceAdapter};

use crate::cli::SensorsArgs;
use crate::settings::resolve_source;

#[derive(Serialize)]
struct SensorListing<'a> {
    driver: &'a str,
    count: usize,
    sensors: Vec<&'a SensorId>,
}

/// Execute the `sensors` command
pub fn run_sensors(args: &SensorsArgs) -> Result<()> {
    let config = resolve_source(&args.source)?;
    config_loader::validate(&config).context("Invalid configuration")?;

    let driver = tracker::driver_from_config(&config.source);
    let mut adapter = SourceAdapter::new(driver, FaultPolicy::default());

    let attached = adapter
        .connect()
        .context("Could not connect to the tracking device")?;

    let printed = print_sensors(adapter.driver_name(), &attached, args.json);

    if let Err(e) = adapter.disconnect() {
        warn!(error = %e, "Tracker release failed");
    }
    printed
}

fn print_sensors(driver: &str, attached: &AttachedSensors, json: bool) -> Result<()> {
    if json {
        let listing = SensorListing {
            driver,
            count: attached.len(),
            sensors: attached.iter().collect(),
        };
        let json =
            serde_json::to_string_pretty(&listing).context("Failed to serialize sensor list")?;
        println!("{json}");
    } else if attached.is_empty() {
        println!("No sensors attached ({driver})");
    } else {
        println!("{} sensor(s) attached ({driver}):", attached.len());
        for id in attached.iter() {
            println!("  - {id}");
        }
    }
    Ok(())
}
