//! Error classification shared by the telemetry core and the wasm boundary.
//!
//! Collectors never fail on missing platform features, so the only errors that
//! reach callers are configuration mistakes, export failures and serialization
//! problems. This module sorts them into categories for logging and converts
//! them to JavaScript values at the binding layer.

use std::fmt;
use wasm_bindgen::JsValue;

use crate::error::TelemetryError;

// ============================================================================
// Core Error Trait
// ============================================================================

/// Common trait for telemetry errors
pub trait TelemetryFault: fmt::Debug + fmt::Display {
    /// Convert to JavaScript error value for WASM
    fn to_js_error(&self) -> JsValue {
        JsValue::from_str(&self.to_string())
    }

    /// Get error category for logging
    fn category(&self) -> ErrorCategory {
        ErrorCategory::General
    }

    /// Whether the subsystem keeps sampling after this error
    fn is_recoverable(&self) -> bool {
        true
    }

    /// Get suggested developer action if any
    fn user_action(&self) -> Option<&str> {
        None
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    General,
    CapabilityAbsent,
    SubscriberCallback,
    Configuration,
    Export,
    Serialization,
}

// ============================================================================
// Result Type Aliases
// ============================================================================

/// JavaScript-compatible result type
pub type JsResult<T> = Result<T, JsValue>;

/// Trait for converting results to JavaScript results
pub trait ToJsResult<T> {
    fn to_js_result(self) -> JsResult<T>;
}

impl<T, E: TelemetryFault> ToJsResult<T> for Result<T, E> {
    fn to_js_result(self) -> JsResult<T> {
        self.map_err(|e| e.to_js_error())
    }
}

impl TelemetryFault for TelemetryError {
    fn category(&self) -> ErrorCategory {
        match self {
            TelemetryError::UnknownTemplate(_)
            | TelemetryError::ConfigError(_)
            | TelemetryError::ConfigParseError(_) => ErrorCategory::Configuration,
            TelemetryError::CapabilityUnavailable(_) => ErrorCategory::CapabilityAbsent,
            TelemetryError::SubscriberFault { .. } => ErrorCategory::SubscriberCallback,
            TelemetryError::IoError(_) | TelemetryError::ExportError { .. } => {
                ErrorCategory::Export
            }
            TelemetryError::SerializationError(_) => ErrorCategory::Serialization,
        }
    }

    fn is_recoverable(&self) -> bool {
        // An unknown template is a programming error in the caller.
        !matches!(self, TelemetryError::UnknownTemplate(_))
    }

    fn user_action(&self) -> Option<&str> {
        match self {
            TelemetryError::UnknownTemplate(_) => {
                Some("Use one of the registered templates or register it with add_template")
            }
            TelemetryError::ConfigError(_) | TelemetryError::ConfigParseError(_) => {
                Some("Check the [buffers], [windows] and [analyzer] tables of the telemetry config")
            }
            _ => None,
        }
    }
}

/// Log an error once with its category, returning it unchanged.
pub fn log_fault<E: TelemetryFault>(context: &str, error: E) -> E {
    if error.is_recoverable() {
        log::warn!("{} ({:?}): {}", context, error.category(), error);
    } else {
        log::error!("{} ({:?}): {}", context, error.category(), error);
    }
    error
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_template_is_fatal() {
        let error = TelemetryError::UnknownTemplate("weekly".to_string());

        assert_eq!(error.category(), ErrorCategory::Configuration);
        assert!(!error.is_recoverable());
        assert!(error.user_action().is_some());
        assert!(format!("{}", error).contains("weekly"));
    }

    #[test]
    fn test_export_errors_are_recoverable() {
        let error = TelemetryError::ExportError {
            filename: "report.txt".to_string(),
            reason: "read-only".to_string(),
        };

        assert_eq!(error.category(), ErrorCategory::Export);
        assert!(error.is_recoverable());
        assert!(error.user_action().is_none());
    }

    #[test]
    fn test_log_fault_passes_error_through() {
        let error = log_fault(
            "collector",
            TelemetryError::CapabilityUnavailable("performance.memory"),
        );
        assert_eq!(error.category(), ErrorCategory::CapabilityAbsent);
    }
}
