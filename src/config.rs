// Telemetry configuration: buffer sizes, snapshot windows, poll intervals and scoring thresholds
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::collectors::MIN_INTERVAL_MS;
use crate::error::{Result, TelemetryError};

const CONFIG_DIR_NAME: &str = "rustation-telemetry";
const CONFIG_FILE_NAME: &str = "telemetry.toml";

/// Complete telemetry configuration. Every field has a default, so a config
/// file only needs the values it overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub buffers: BufferCapacities,
    pub windows: SnapshotWindows,
    pub intervals: PollIntervals,
    pub analyzer: AnalyzerConfig,
}

/// Maximum number of samples each collector retains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferCapacities {
    pub frame: usize,
    pub memory: usize,
    pub render: usize,
    pub network: usize,
    pub interaction: usize,
    pub resource: usize,
    /// Per named metric
    pub custom: usize,
}

impl Default for BufferCapacities {
    fn default() -> Self {
        BufferCapacities {
            frame: 1000,
            memory: 200,
            render: 500,
            network: 100,
            interaction: 200,
            resource: 100,
            custom: 100,
        }
    }
}

/// Number of trailing samples each snapshot is computed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotWindows {
    pub frame: usize,
    pub memory: usize,
    pub render: usize,
    pub network: usize,
    pub interaction: usize,
    pub resource: usize,
    pub custom: usize,
    /// Raw samples exposed in frame, memory and interaction snapshots
    pub history: usize,
    /// Raw samples exposed in render/network snapshots
    pub recent: usize,
}

impl Default for SnapshotWindows {
    fn default() -> Self {
        SnapshotWindows {
            frame: 60,
            memory: 30,
            render: 50,
            network: 20,
            interaction: 50,
            resource: 10,
            custom: 10,
            history: 10,
            recent: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollIntervals {
    pub memory_ms: f64,
    pub resource_ms: f64,
}

impl Default for PollIntervals {
    fn default() -> Self {
        PollIntervals {
            memory_ms: 1000.0,
            resource_ms: 5000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub history_size: usize,
    pub thresholds: ScoreThresholds,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig {
            history_size: 50,
            thresholds: ScoreThresholds::default(),
        }
    }
}

/// Cut points of the per-domain score tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreThresholds {
    /// excellent, good, warning, critical (fps, descending)
    pub fps: [f64; 4],
    /// excellent, good, warning (ms, ascending)
    pub render_time: [f64; 3],
    /// excellent, good, warning (ms, ascending)
    pub response_time: [f64; 3],
    /// Network duration that maps to a zero score
    pub network_ceiling_ms: f64,
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        ScoreThresholds {
            fps: [55.0, 45.0, 30.0, 15.0],
            render_time: [16.67, 22.22, 33.33],
            response_time: [16.0, 50.0, 100.0],
            network_ceiling_ms: 2000.0,
        }
    }
}

impl TelemetryConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: TelemetryConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// `<config dir>/rustation-telemetry/telemetry.toml`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load the default config file, falling back to defaults when it does not exist.
    pub fn load_or_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => {
                log::info!("Loading telemetry config from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| TelemetryError::ConfigError(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        let b = &self.buffers;
        let capacities = [
            ("buffers.frame", b.frame),
            ("buffers.memory", b.memory),
            ("buffers.render", b.render),
            ("buffers.network", b.network),
            ("buffers.interaction", b.interaction),
            ("buffers.resource", b.resource),
            ("buffers.custom", b.custom),
            ("analyzer.history_size", self.analyzer.history_size),
        ];
        for (name, value) in capacities {
            if value == 0 {
                return Err(TelemetryError::ConfigError(format!("{} must be positive", name)));
            }
        }

        let w = &self.windows;
        let windows = [w.frame, w.memory, w.render, w.network, w.interaction, w.resource, w.custom];
        if windows.iter().any(|&size| size == 0) {
            return Err(TelemetryError::ConfigError(
                "snapshot windows must be positive".to_string(),
            ));
        }

        let intervals = [
            ("intervals.memory_ms", self.intervals.memory_ms),
            ("intervals.resource_ms", self.intervals.resource_ms),
        ];
        for (name, value) in intervals {
            if !value.is_finite() || value < MIN_INTERVAL_MS {
                return Err(TelemetryError::ConfigError(format!(
                    "{} must be a finite number of at least {} ms",
                    name, MIN_INTERVAL_MS
                )));
            }
        }

        let t = &self.analyzer.thresholds;
        if !t.fps.windows(2).all(|pair| pair[0] >= pair[1]) {
            return Err(TelemetryError::ConfigError(
                "analyzer.thresholds.fps must be descending".to_string(),
            ));
        }
        if !t.render_time.windows(2).all(|pair| pair[0] <= pair[1])
            || !t.response_time.windows(2).all(|pair| pair[0] <= pair[1])
        {
            return Err(TelemetryError::ConfigError(
                "time thresholds must be ascending".to_string(),
            ));
        }
        if t.network_ceiling_ms <= 0.0 {
            return Err(TelemetryError::ConfigError(
                "analyzer.thresholds.network_ceiling_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
