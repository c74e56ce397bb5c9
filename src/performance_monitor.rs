// Performance monitor: owns the collectors, the analyzer and the reporter
use chrono::{DateTime, Utc};

use crate::analysis::{MetricsSnapshot, PerformanceAnalysis};
use crate::analyzer::PerformanceAnalyzer;
use crate::collectors::custom::Metadata;
use crate::collectors::*;
use crate::config::TelemetryConfig;
use crate::error::{Result, TelemetryError};
use crate::error_traits::log_fault;
use crate::export::{ExportSummary, ReportExporter};
use crate::platform::{MetricsSource, ObservedEntry, ResourceTiming};
use crate::reporter::{PerformanceReporter, Report, ReportOptions};
use crate::samples::MetricDomain;
use crate::trends::TrendReport;

/// Telemetry hub for one game session.
///
/// The host drives it with three kinds of input: `on_animation_frame` once per
/// display frame, `tick` from a periodic timer, and the `observe_*`/`record_*`
/// calls from passive observers and listeners. None of them block.
pub struct PerformanceMonitor<S: MetricsSource> {
    source: S,
    frame: FrameCollector,
    memory: MemoryCollector,
    render: RenderCollector,
    network: NetworkCollector,
    interaction: InteractionCollector,
    resource: ResourceCollector,
    custom: CustomCollector,
    analyzer: PerformanceAnalyzer,
    reporter: PerformanceReporter,
    running: bool,
}

impl<S: MetricsSource> PerformanceMonitor<S> {
    pub fn new(source: S) -> Self {
        Self::build(source, &TelemetryConfig::default())
    }

    pub fn with_config(source: S, config: &TelemetryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(source, config))
    }

    fn build(source: S, config: &TelemetryConfig) -> Self {
        let buffers = &config.buffers;
        let windows = &config.windows;
        let intervals = &config.intervals;

        PerformanceMonitor {
            source,
            frame: FrameCollector::new(buffers.frame, windows.frame, windows.history),
            memory: MemoryCollector::new(
                buffers.memory,
                windows.memory,
                windows.history,
                intervals.memory_ms,
            ),
            render: RenderCollector::new(buffers.render, windows.render, windows.recent),
            network: NetworkCollector::new(buffers.network, windows.network, windows.recent),
            interaction: InteractionCollector::new(
                buffers.interaction,
                windows.interaction,
                windows.history,
            ),
            resource: ResourceCollector::new(buffers.resource, windows.resource, intervals.resource_ms),
            custom: CustomCollector::new(buffers.custom, windows.custom),
            analyzer: PerformanceAnalyzer::new(&config.analyzer),
            reporter: PerformanceReporter::new(),
            running: false,
        }
    }

    /// Start every collector. Calling it twice has no further effect.
    pub fn initialize(&mut self) {
        if self.running {
            return;
        }
        let source: &dyn MetricsSource = &self.source;
        self.frame.initialize(source);
        self.memory.initialize(source);
        self.render.initialize(source);
        self.network.initialize(source);
        self.interaction.initialize(source);
        self.resource.initialize(source);
        self.custom.initialize(source);
        self.running = true;
        log::info!("Performance monitor initialized");
    }

    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.frame.stop();
        self.memory.stop();
        self.render.stop();
        self.network.stop();
        self.interaction.stop();
        self.resource.stop();
        self.custom.stop();
        self.running = false;
        log::info!("Performance monitor stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Per-frame input: samples frame timing and resolves pending interactions.
    pub fn on_animation_frame(&mut self) {
        let now = self.source.now();
        self.frame.on_animation_frame(now);
        self.interaction.on_animation_frame(now);
    }

    /// Timer input: polls the interval collectors that are due.
    pub fn tick(&mut self) {
        self.memory.tick(&self.source);
        self.resource.tick(&self.source);
    }

    pub fn observe_entry(&mut self, entry: &ObservedEntry) {
        let now = self.source.now();
        self.render.observe_entry(entry, now);
    }

    pub fn observe_resource(&mut self, entry: &ResourceTiming) {
        let now = self.source.now();
        self.network.observe_resource(entry, now);
    }

    pub fn record_interaction(&mut self, event: RawInteraction) {
        let now = self.source.now();
        self.interaction.record_event(event, now);
    }

    pub fn mark_render_start(&mut self, label: &str) {
        let now = self.source.now();
        self.render.mark_start(label, now);
    }

    pub fn mark_render_end(&mut self, label: &str) {
        let now = self.source.now();
        self.render.mark_end(label, now);
    }

    pub fn record_metric(&mut self, name: &str, value: f64, metadata: Metadata) {
        let now = self.source.now();
        self.custom.record_metric(name, value, metadata, now);
    }

    pub fn increment_counter(&mut self, name: &str, amount: f64, metadata: Metadata) {
        let now = self.source.now();
        self.custom.increment_counter(name, amount, metadata, now);
    }

    pub fn record_timing(&mut self, name: &str, start: f64, end: f64, metadata: Metadata) {
        let now = self.source.now();
        self.custom.record_timing(name, start, end, metadata, now);
    }

    /// Subscribe to the samples of one domain.
    pub fn subscribe(&mut self, domain: MetricDomain, callback: MetricsCallback) -> SubscriptionId {
        match domain {
            MetricDomain::Frame => self.frame.on_metrics(callback),
            MetricDomain::Memory => self.memory.on_metrics(callback),
            MetricDomain::Render => self.render.on_metrics(callback),
            MetricDomain::Network => self.network.on_metrics(callback),
            MetricDomain::Interaction => self.interaction.on_metrics(callback),
            MetricDomain::Resource => self.resource.on_metrics(callback),
            MetricDomain::Custom => self.custom.on_metrics(callback),
        }
    }

    pub fn unsubscribe(&mut self, domain: MetricDomain, id: SubscriptionId) -> bool {
        match domain {
            MetricDomain::Frame => self.frame.unsubscribe(id),
            MetricDomain::Memory => self.memory.unsubscribe(id),
            MetricDomain::Render => self.render.unsubscribe(id),
            MetricDomain::Network => self.network.unsubscribe(id),
            MetricDomain::Interaction => self.interaction.unsubscribe(id),
            MetricDomain::Resource => self.resource.unsubscribe(id),
            MetricDomain::Custom => self.custom.unsubscribe(id),
        }
    }

    /// Gather every collector's snapshot, one domain after another.
    pub fn collect_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frame: self.frame.get_metrics(),
            memory: self.memory.get_metrics(),
            render: self.render.get_metrics(),
            network: self.network.get_metrics(),
            interaction: self.interaction.get_metrics(),
            resource: self.resource.get_metrics(),
            custom: self.custom.get_metrics(),
        }
    }

    pub fn analyze(&mut self) -> PerformanceAnalysis {
        let snapshot = self.collect_snapshot();
        self.analyzer.analyze_metrics(&snapshot)
    }

    pub fn analyze_at(&mut self, timestamp: DateTime<Utc>) -> PerformanceAnalysis {
        let snapshot = self.collect_snapshot();
        self.analyzer.analyze_metrics_at(&snapshot, timestamp)
    }

    pub fn trend(&self) -> TrendReport {
        self.analyzer.trend()
    }

    /// Analyze now and render the result with `template`.
    ///
    /// The current trend is attached unless the options already carry one.
    pub fn generate_report(&mut self, template: &str, options: &ReportOptions) -> Result<Report> {
        if self.reporter.template(template).is_none() {
            return Err(log_fault(
                "Report generation failed",
                TelemetryError::UnknownTemplate(template.to_string()),
            ));
        }
        let analysis = self.analyze();
        let mut options = options.clone();
        if options.trend.is_none() {
            options.trend = Some(self.analyzer.trend());
        }
        self.reporter.generate_report(&analysis, template, &options)
    }

    pub fn export_report(
        &self,
        exporter: &mut dyn ReportExporter,
        report: &Report,
        filename: Option<&str>,
    ) -> Result<ExportSummary> {
        exporter.export_report(&report.content, report.format, filename)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn frame(&self) -> &FrameCollector {
        &self.frame
    }

    pub fn memory(&self) -> &MemoryCollector {
        &self.memory
    }

    pub fn render(&self) -> &RenderCollector {
        &self.render
    }

    pub fn network(&self) -> &NetworkCollector {
        &self.network
    }

    pub fn interaction(&self) -> &InteractionCollector {
        &self.interaction
    }

    pub fn resource(&self) -> &ResourceCollector {
        &self.resource
    }

    pub fn custom(&self) -> &CustomCollector {
        &self.custom
    }

    pub fn custom_mut(&mut self) -> &mut CustomCollector {
        &mut self.custom
    }

    pub fn analyzer(&self) -> &PerformanceAnalyzer {
        &self.analyzer
    }

    pub fn reporter(&self) -> &PerformanceReporter {
        &self.reporter
    }

    pub fn reporter_mut(&mut self) -> &mut PerformanceReporter {
        &mut self.reporter
    }
}
