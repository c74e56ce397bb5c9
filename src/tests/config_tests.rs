// Telemetry configuration loading and validation tests

use std::fs;
use tempfile::tempdir;

use crate::config::*;
use crate::error::TelemetryError;

#[test]
fn test_default_config_is_valid() {
    let config = TelemetryConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.buffers.frame, 1000);
    assert_eq!(config.windows.frame, 60);
    assert_eq!(config.intervals.memory_ms, 1000.0);
    assert_eq!(config.analyzer.history_size, 50);
    assert_eq!(config.analyzer.thresholds.fps, [55.0, 45.0, 30.0, 15.0]);
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let config = TelemetryConfig::from_toml_str(
        r#"
        [buffers]
        frame = 300

        [intervals]
        memory_ms = 250.0

        [analyzer.thresholds]
        network_ceiling_ms = 4000.0
        "#,
    )
    .unwrap();

    assert_eq!(config.buffers.frame, 300);
    assert_eq!(config.buffers.memory, 200);
    assert_eq!(config.intervals.memory_ms, 250.0);
    assert_eq!(config.intervals.resource_ms, 5000.0);
    assert_eq!(config.analyzer.thresholds.network_ceiling_ms, 4000.0);
    assert_eq!(config.analyzer.thresholds.render_time, [16.67, 22.22, 33.33]);
    assert_eq!(config.windows, SnapshotWindows::default());
}

#[test]
fn test_empty_toml_is_default() {
    assert_eq!(
        TelemetryConfig::from_toml_str("").unwrap(),
        TelemetryConfig::default()
    );
}

#[test]
fn test_zero_capacity_is_rejected() {
    let result = TelemetryConfig::from_toml_str("[buffers]\nnetwork = 0\n");
    match result {
        Err(TelemetryError::ConfigError(message)) => assert!(message.contains("buffers.network")),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
fn test_invalid_thresholds_are_rejected() {
    let mut config = TelemetryConfig::default();
    config.analyzer.thresholds.fps = [30.0, 45.0, 55.0, 15.0];
    assert!(matches!(config.validate(), Err(TelemetryError::ConfigError(_))));

    let mut config = TelemetryConfig::default();
    config.analyzer.thresholds.response_time = [100.0, 50.0, 16.0];
    assert!(config.validate().is_err());

    let mut config = TelemetryConfig::default();
    config.intervals.resource_ms = 0.0;
    assert!(config.validate().is_err());

    let mut config = TelemetryConfig::default();
    config.intervals.memory_ms = 1e-12;
    match config.validate() {
        Err(TelemetryError::ConfigError(message)) => {
            assert!(message.contains("intervals.memory_ms"))
        }
        other => panic!("expected config error, got {:?}", other),
    }

    let mut config = TelemetryConfig::default();
    config.intervals.resource_ms = f64::NAN;
    assert!(config.validate().is_err());
    config.intervals.resource_ms = f64::INFINITY;
    assert!(config.validate().is_err());

    let mut config = TelemetryConfig::default();
    config.windows.custom = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_malformed_toml_is_a_parse_error() {
    let result = TelemetryConfig::from_toml_str("[buffers\nframe = ");
    assert!(matches!(result, Err(TelemetryError::ConfigParseError(_))));

    let result = TelemetryConfig::from_toml_str("[buffers]\nframe = \"many\"\n");
    assert!(matches!(result, Err(TelemetryError::ConfigParseError(_))));
}

#[test]
fn test_load_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("telemetry.toml");
    fs::write(&path, "[windows]\nhistory = 25\n").unwrap();

    let config = TelemetryConfig::load(&path).unwrap();
    assert_eq!(config.windows.history, 25);

    let missing = TelemetryConfig::load(&dir.path().join("missing.toml"));
    assert!(matches!(missing, Err(TelemetryError::IoError(_))));
}

#[test]
fn test_toml_round_trip() {
    let mut config = TelemetryConfig::default();
    config.buffers.custom = 42;
    config.analyzer.history_size = 7;

    let text = config.to_toml_string().unwrap();
    assert!(text.contains("[buffers]"));
    assert_eq!(TelemetryConfig::from_toml_str(&text).unwrap(), config);
}

#[test]
fn test_default_path_file_name() {
    if let Some(path) = TelemetryConfig::default_path() {
        assert!(path.ends_with("telemetry.toml"));
    }
}
