use std::io;
use thiserror::Error;

pub type Result<T> = ::std::result::Result<T, TelemetryError>;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Input output error: {0}")]
    IoError(#[from] io::Error),
    #[error("Unknown report template: {0}")]
    UnknownTemplate(String),
    #[error("Platform capability `{0}` is not available")]
    CapabilityUnavailable(&'static str),
    #[error("Metrics subscriber for {domain} failed: {reason}")]
    SubscriberFault { domain: String, reason: String },
    #[error("Invalid telemetry configuration: {0}")]
    ConfigError(String),
    #[error("Configuration parse error: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Report export error for {filename}: {reason}")]
    ExportError { filename: String, reason: String },
}
