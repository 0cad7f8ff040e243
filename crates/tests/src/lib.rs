//! # Integration Tests
//!
//! End-to-end tests across the workspace crates.
//!
//! Covers:
//! - Exact wire output of a full stream (CSV and JSON) as written to disk
//! - Recording a stream and replaying it
//! - Sink failure isolation and configuration-driven runs

#[cfg(test)]
mod contract_tests {
    use contracts::{OutputFormat, StreamConfig};

    #[test]
    fn test_defaults() {
        let config = StreamConfig::default();
        assert_eq!(config.format, OutputFormat::Csv);
        assert!(config_loader::validate(&config).is_ok());
        assert_eq!(encoder::CSV_HEADER.split(',').count(), 9);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::path::Path;

    use acquisition::{Controller, ShutdownReason, StreamReport};
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{OutputFormat, ReplayConfig, SensorId, Snapshot, StreamConfig, TrackerDriver};
    use dispatcher::{FileSink, MemorySink};
    use tempfile::TempDir;
    use tracker::{ReplayTracker, ScriptStep, ScriptedTracker};

    const CSV_EXPECTED: &str = "\
timestamp_ms,sensor_id,x,y,z,azimuth,elevation,roll,quality
0,0,1.0000,2.0000,3.0000,10.0000,20.0000,30.0000,0
0,1,-4.5000,5.2500,6.0000,-90.0000,0.0000,45.5000,2
10,0,2.0000,2.0000,3.0000,10.0000,20.0000,30.0000,0
10,1,-4.5000,5.2500,6.0000,-90.0000,0.0000,45.5000,2
20,0,3.0000,2.0000,3.0000,10.0000,20.0000,30.0000,0
20,1,-4.5000,5.2500,6.0000,-90.0000,0.0000,45.5000,2
";

    const JSON_EXPECTED: &str = r#"{"t": 0, "sensors": {"0": {"pos": [1.0, 2.0, 3.0], "ori": [10.0, 20.0, 30.0], "q": 0}, "1": {"pos": [-4.5, 5.25, 6.0], "ori": [-90.0, 0.0, 45.5], "q": 2}}}
{"t": 10, "sensors": {"0": {"pos": [2.0, 2.0, 3.0], "ori": [10.0, 20.0, 30.0], "q": 0}, "1": {"pos": [-4.5, 5.25, 6.0], "ori": [-90.0, 0.0, 45.5], "q": 2}}}
{"t": 20, "sensors": {"0": {"pos": [3.0, 2.0, 3.0], "ori": [10.0, 20.0, 30.0], "q": 0}, "1": {"pos": [-4.5, 5.25, 6.0], "ori": [-90.0, 0.0, 45.5], "q": 2}}}
"#;

    fn sensors() -> Vec<SensorId> {
        vec![SensorId::from(0u32), SensorId::from(1u32)]
    }

    fn snapshot(i: u64) -> Snapshot {
        Snapshot::new(i * 10)
            .with_reading(0u32, [1.0 + i as f64, 2.0, 3.0, 10.0, 20.0, 30.0, 0.0])
            .with_reading(1u32, [-4.5, 5.25, 6.0, -90.0, 0.0, 45.5, 2.0])
    }

    fn three_samples() -> ScriptedTracker {
        ScriptedTracker::from_snapshots(sensors(), (0..3).map(snapshot).collect())
            .end_when_drained(true)
    }

    fn config(format: OutputFormat) -> StreamConfig {
        StreamConfig {
            format,
            ..Default::default()
        }
    }

    async fn run_to_file<D: TrackerDriver>(
        driver: D,
        config: StreamConfig,
        path: &Path,
    ) -> StreamReport {
        let file = FileSink::create("file", path).unwrap();
        let mut controller = Controller::new(driver, config).with_sink(file);
        controller.run(std::future::pending::<()>()).await.unwrap()
    }

    #[tokio::test]
    async fn test_e2e_csv_file_output() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("poses.csv");

        let report = run_to_file(three_samples(), config(OutputFormat::Csv), &path).await;

        assert_eq!(report.samples, 3);
        assert_eq!(report.reason, ShutdownReason::SourceExhausted);
        assert_eq!(report.sink("file").unwrap().samples_written, 3);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), CSV_EXPECTED);
    }

    #[tokio::test]
    async fn test_e2e_json_file_output() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("poses.jsonl");

        let report = run_to_file(three_samples(), config(OutputFormat::Json), &path).await;

        assert_eq!(report.samples, 3);
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, JSON_EXPECTED);
        for line in content.lines() {
            let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(parsed["sensors"].as_object().unwrap().len(), 2);
        }
    }

    #[tokio::test]
    async fn test_e2e_partial_sample_keeps_present_sensors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.csv");
        let driver = ScriptedTracker::new(
            sensors(),
            vec![
                ScriptStep::Snapshot(
                    Snapshot::new(5u64).with_reading(1u32, [1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 3.0]),
                ),
                ScriptStep::Fault("usb stall".into()),
                ScriptStep::Empty,
                ScriptStep::Snapshot(
                    // sensor 9 is not attached and must not appear
                    Snapshot::new(6u64).with_reading(9u32, [0.0; 7]),
                ),
            ],
        )
        .end_when_drained(true);

        let report = run_to_file(driver, config(OutputFormat::Csv), &path).await;

        assert_eq!(report.samples, 2);
        assert_eq!(report.source.faults, 1);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "timestamp_ms,sensor_id,x,y,z,azimuth,elevation,roll,quality\n\
             5,1,1.0000,1.0000,1.0000,0.0000,0.0000,0.0000,3\n"
        );
        assert_eq!(report.summary.partial_samples, 2);
    }

    #[tokio::test]
    async fn test_e2e_record_then_replay() {
        let dir = TempDir::new().unwrap();
        let recorded = dir.path().join("recorded.jsonl");
        let replayed = dir.path().join("replayed.jsonl");

        run_to_file(three_samples(), config(OutputFormat::Json), &recorded).await;

        let replay = ReplayTracker::new(ReplayConfig {
            path: recorded.clone(),
            speed: 1000.0,
            loop_playback: false,
        });
        let report = run_to_file(replay, config(OutputFormat::Json), &replayed).await;

        assert_eq!(report.samples, 3);
        assert_eq!(report.reason, ShutdownReason::SourceExhausted);
        assert_eq!(
            std::fs::read_to_string(&replayed).unwrap(),
            std::fs::read_to_string(&recorded).unwrap()
        );
    }

    #[tokio::test]
    async fn test_e2e_failing_sink_does_not_starve_others() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("poses.csv");
        let bad = MemorySink::new("bad").failing();
        let bad_probe = bad.probe();

        let config = StreamConfig {
            sink_failure_limit: 2,
            ..config(OutputFormat::Csv)
        };
        let mut controller = Controller::new(three_samples(), config)
            .with_sink(bad)
            .with_sink(FileSink::create("file", &path).unwrap());
        let report = controller.run(std::future::pending::<()>()).await.unwrap();

        assert_eq!(report.samples, 3);
        let bad_report = report.sink("bad").unwrap();
        assert!(bad_report.degraded);
        assert_eq!(bad_report.samples_written, 0);
        assert_eq!(bad_probe.close_calls(), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), CSV_EXPECTED);
    }

    #[tokio::test]
    async fn test_e2e_config_driven_simulated_run() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sim.jsonl");
        let toml = r#"
            format = "json"
            max_samples = 5

            [source]
            kind = "simulated"
            sensors = ["3", "4", "5"]
            update_rate_hz = 500.0
        "#;
        let config = ConfigLoader::load_from_str(toml, ConfigFormat::Toml).unwrap();

        let driver = tracker::driver_from_config(&config.source);
        let report = run_to_file(driver, config, &path).await;

        assert_eq!(report.reason, ShutdownReason::MaxSamples);
        assert_eq!(report.samples, 5);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 5);
        for line in content.lines() {
            let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
            let ids: Vec<&String> = parsed["sensors"].as_object().unwrap().keys().collect();
            assert_eq!(ids, ["3", "4", "5"]);
        }
    }

    #[tokio::test]
    async fn test_e2e_missing_device_produces_no_output() {
        let dir = TempDir::new().unwrap();
        let replay = ReplayTracker::new(ReplayConfig::new(dir.path().join("missing.jsonl")));
        let sink = MemorySink::new("mem");
        let probe = sink.probe();

        let mut controller = Controller::new(replay, config(OutputFormat::Csv)).with_sink(sink);
        let err = controller.run(std::future::pending::<()>()).await.unwrap_err();

        assert!(err.is_connect_failure());
        assert!(probe.records().is_empty());
        assert_eq!(probe.close_calls(), 0);
    }
}
