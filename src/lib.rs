//! Performance telemetry for browser games.
//!
//! Seven collectors sample frame timing, heap usage, rendering work, network
//! loads, input latency, DOM/storage footprint and application metrics into
//! bounded buffers. The analyzer turns their snapshots into a scored
//! [`PerformanceAnalysis`] and the reporter renders that as text, JSON or HTML.
//!
//! Platform readings come through the [`MetricsSource`] trait, so the same
//! core runs in the browser (`wasm32`, see the `wasm` module) and natively
//! with [`ManualSource`].

pub mod analysis;
pub mod analyzer;
pub mod buffer;
pub mod collectors;
pub mod config;
pub mod error;
pub mod error_traits;
pub mod export;
pub mod performance_monitor;
pub mod platform;
pub mod reporter;
pub mod samples;
pub mod stats;
pub mod trends;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

include!(concat!(env!("OUT_DIR"), "/version.rs"));

pub use analysis::{
    Bottleneck, BottleneckKind, DomainAnalysis, Grade, HealthStatus, MetricsSnapshot,
    PerformanceAnalysis, Recommendation, Severity,
};
pub use analyzer::PerformanceAnalyzer;
pub use collectors::{Collector, MetricsCallback, SubscriptionId};
pub use config::TelemetryConfig;
pub use error::{Result, TelemetryError};
pub use export::{ExportSummary, FileExporter, LogExporter, ReportExporter};
pub use performance_monitor::PerformanceMonitor;
pub use platform::{ManualSource, MetricsSource};
pub use reporter::{PerformanceReporter, Report, ReportFormat, ReportOptions, ReportTemplate};
pub use samples::{MetricDomain, MetricSample};
pub use trends::TrendReport;

#[cfg(test)]
mod tests;
