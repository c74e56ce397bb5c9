// Template-driven report rendering (text, JSON, HTML)
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::analysis::*;
use crate::error::{Result, TelemetryError};
use crate::trends::TrendReport;
use crate::VERSION;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ReportFormat {
    Text,
    Json,
    Html,
}

impl ReportFormat {
    /// Parse a format name; anything unrecognised renders as text.
    pub fn resolve(name: &str) -> Self {
        ReportFormat::from_str(name.trim()).unwrap_or_else(|_| {
            log::debug!("Unknown report format '{}', falling back to text", name);
            ReportFormat::Text
        })
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
            ReportFormat::Html => "html",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ReportFormat::Text => "text/plain",
            ReportFormat::Json => "application/json",
            ReportFormat::Html => "text/html",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReportSection {
    Overall,
    Frame,
    Memory,
    Render,
    Network,
    Interaction,
    Resource,
    Custom,
    Bottlenecks,
    Recommendations,
    Trends,
}

impl ReportSection {
    pub fn title(&self) -> &'static str {
        match self {
            ReportSection::Overall => "Overall Performance",
            ReportSection::Frame => "Frame Performance",
            ReportSection::Memory => "Memory Usage",
            ReportSection::Render => "Render Performance",
            ReportSection::Network => "Network Performance",
            ReportSection::Interaction => "User Interactions",
            ReportSection::Resource => "Resource Usage",
            ReportSection::Custom => "Custom Metrics",
            ReportSection::Bottlenecks => "Bottlenecks",
            ReportSection::Recommendations => "Recommendations",
            ReportSection::Trends => "Trends",
        }
    }
}

/// A named, ordered list of sections plus an output format.
///
/// The format is kept as written so that registered templates with an
/// unsupported format still render (as text).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportTemplate {
    pub name: String,
    pub title: String,
    pub sections: Vec<ReportSection>,
    pub format: String,
}

impl ReportTemplate {
    pub fn new(name: &str, title: &str, sections: &[ReportSection], format: &str) -> Self {
        ReportTemplate {
            name: name.to_string(),
            title: title.to_string(),
            sections: sections.to_vec(),
            format: format.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Overrides the template's format
    pub format: Option<String>,
    /// Defaults to the current time
    pub generated_at: Option<DateTime<Utc>>,
    /// Rendered by the `trends` section
    pub trend: Option<TrendReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub content: String,
    pub format: ReportFormat,
    pub template: String,
    pub generated_at: DateTime<Utc>,
}

pub struct PerformanceReporter {
    templates: BTreeMap<String, ReportTemplate>,
}

impl Default for PerformanceReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceReporter {
    pub fn new() -> Self {
        use ReportSection::*;

        let mut reporter = PerformanceReporter {
            templates: BTreeMap::new(),
        };
        reporter.add_template(ReportTemplate::new(
            "summary",
            "Performance Summary",
            &[Overall, Bottlenecks, Recommendations],
            "text",
        ));
        reporter.add_template(ReportTemplate::new(
            "detailed",
            "Detailed Performance Report",
            &[
                Overall, Frame, Memory, Render, Network, Interaction, Resource, Custom,
                Bottlenecks, Recommendations,
            ],
            "text",
        ));
        reporter.add_template(ReportTemplate::new(
            "technical",
            "Technical Analysis Report",
            &[
                Overall, Frame, Memory, Render, Network, Interaction, Resource, Custom,
                Bottlenecks, Recommendations, Trends,
            ],
            "json",
        ));
        reporter
    }

    /// Register a template, replacing any template with the same name.
    pub fn add_template(&mut self, template: ReportTemplate) {
        self.templates.insert(template.name.clone(), template);
    }

    pub fn available_templates(&self) -> Vec<String> {
        self.templates.keys().cloned().collect()
    }

    pub fn template(&self, name: &str) -> Option<&ReportTemplate> {
        self.templates.get(name)
    }

    pub fn generate_report(
        &self,
        analysis: &PerformanceAnalysis,
        template_name: &str,
        options: &ReportOptions,
    ) -> Result<Report> {
        let template = self
            .templates
            .get(template_name)
            .ok_or_else(|| TelemetryError::UnknownTemplate(template_name.to_string()))?;

        let format = ReportFormat::resolve(options.format.as_deref().unwrap_or(&template.format));
        let generated_at = options.generated_at.unwrap_or_else(Utc::now);
        let context = RenderContext {
            analysis,
            template,
            trend: options.trend.as_ref(),
            generated_at,
        };

        let content = match format {
            ReportFormat::Text => render_text(&context),
            ReportFormat::Json => render_json(&context)?,
            ReportFormat::Html => render_html(&context),
        };

        Ok(Report {
            content,
            format,
            template: template.name.clone(),
            generated_at,
        })
    }
}

struct RenderContext<'a> {
    analysis: &'a PerformanceAnalysis,
    template: &'a ReportTemplate,
    trend: Option<&'a TrendReport>,
    generated_at: DateTime<Utc>,
}

impl RenderContext<'_> {
    fn timestamp(&self) -> String {
        self.generated_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Format-neutral content of one section
enum Line {
    Field(&'static str, String),
    Item(String),
    Text(String),
}

struct Fragment {
    title: &'static str,
    class: Option<&'static str>,
    lines: Vec<Line>,
}

fn field(label: &'static str, value: impl ToString) -> Line {
    Line::Field(label, value.to_string())
}

fn no_data(domain: &str) -> Vec<Line> {
    vec![Line::Text(format!("No {} data available.", domain))]
}

fn health_class(status: HealthStatus) -> &'static str {
    match status {
        HealthStatus::Excellent | HealthStatus::Good => "good",
        HealthStatus::Warning => "warning",
        HealthStatus::Critical | HealthStatus::Unknown => "critical",
    }
}

fn severity_class(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical | Severity::High => "critical",
        Severity::Medium | Severity::Low => "warning",
    }
}

fn sub_score(score: Option<f64>) -> String {
    match score {
        Some(score) => format!("{:.2}", score),
        None => "no data".to_string(),
    }
}

fn kilobytes(bytes: f64) -> String {
    format!("{:.1} KB", bytes / 1024.0)
}

fn megabytes(bytes: f64) -> String {
    format!("{:.2} MB", bytes / (1024.0 * 1024.0))
}

fn build_fragment(section: ReportSection, context: &RenderContext) -> Fragment {
    let analysis = context.analysis;
    let mut class = None;

    let lines = match section {
        ReportSection::Overall => {
            let overall = &analysis.overall;
            class = Some(health_class(overall.health_status));
            let breakdown = &overall.breakdown;
            vec![
                Line::Text(format!(
                    "Score: {:.2}/1.00 (Grade: {})",
                    overall.score, overall.grade
                )),
                Line::Text(format!(
                    "Health Status: {}",
                    overall.health_status.as_ref().to_uppercase()
                )),
                field("Coverage", format!("{:.0}%", overall.coverage * 100.0)),
                Line::Text("Breakdown:".to_string()),
                Line::Item(format!("Frame Performance: {}", sub_score(breakdown.frame))),
                Line::Item(format!("Memory Usage: {}", sub_score(breakdown.memory))),
                Line::Item(format!("Render Performance: {}", sub_score(breakdown.render))),
                Line::Item(format!("Network Performance: {}", sub_score(breakdown.network))),
                Line::Item(format!(
                    "User Interactions: {}",
                    sub_score(breakdown.interaction)
                )),
            ]
        }
        ReportSection::Frame => match analysis.frame.analyzed() {
            None => no_data("frame"),
            Some(frame) => vec![
                field("Current FPS", format!("{:.1}", frame.current_fps)),
                field("Average FPS", format!("{:.1}", frame.average_fps)),
                field("Stability", format!("{:.2}", frame.stability)),
                field("Jank Level", format!("{:.1}%", frame.jank_level)),
                field("Assessment", frame.assessment),
                field("Trend", frame.trend),
            ],
        },
        ReportSection::Memory => match analysis.memory.analyzed() {
            None => no_data("memory"),
            Some(memory) => {
                let mut lines = vec![
                    field("Current Usage", megabytes(memory.current_usage)),
                    field("Pressure", format!("{:.1}%", memory.pressure_level * 100.0)),
                    field("Growth Rate", format!("{:.0} B/s", memory.growth_rate)),
                    field("GC Efficiency", format!("{:.2}", memory.gc_efficiency)),
                    field("Leak Risk", memory.leak_risk),
                ];
                lines.extend(memory.notes.iter().cloned().map(Line::Item));
                lines
            }
        },
        ReportSection::Render => match analysis.render.analyzed() {
            None => no_data("render"),
            Some(render) => {
                let mut lines = vec![
                    field(
                        "Average Render Time",
                        format!("{:.2} ms", render.average_render_time),
                    ),
                    field("Efficiency", format!("{:.2}", render.render_efficiency)),
                    field("Paint Events", render.paint_frequency),
                    field("Custom Measures", render.custom_measures),
                ];
                lines.extend(render.bottlenecks.iter().cloned().map(Line::Item));
                lines
            }
        },
        ReportSection::Network => match analysis.network.analyzed() {
            None => no_data("network"),
            Some(network) => {
                let mut lines = vec![
                    field("Total Requests", network.total_requests),
                    field("Total Transfer", kilobytes(network.total_transfer)),
                    field("Average Latency", format!("{:.1} ms", network.average_latency)),
                    field("Efficiency", format!("{:.2}", network.network_efficiency)),
                ];
                for (kind, aggregate) in &network.resource_breakdown {
                    lines.push(Line::Item(format!(
                        "{}: {} requests, {}",
                        kind,
                        aggregate.count,
                        kilobytes(aggregate.total_size)
                    )));
                }
                lines.extend(network.bottlenecks.iter().cloned().map(Line::Item));
                lines
            }
        },
        ReportSection::Interaction => match analysis.interaction.analyzed() {
            None => no_data("interaction"),
            Some(interaction) => {
                let mut lines = vec![
                    field("Total Interactions", interaction.total_interactions),
                    field(
                        "Average Response",
                        format!("{:.1} ms", interaction.average_response_time),
                    ),
                    field("Responsiveness", interaction.responsiveness),
                    field(
                        "Slow Interactions",
                        if interaction.slow_interactions { "yes" } else { "no" },
                    ),
                ];
                for (kind, stats) in &interaction.interaction_types {
                    lines.push(Line::Item(format!(
                        "{}: {} events, {:.1} ms average",
                        kind, stats.count, stats.average_response_time
                    )));
                }
                lines
            }
        },
        ReportSection::Resource => match analysis.resource.analyzed() {
            None => no_data("resource"),
            Some(resource) => {
                class = Some(match resource.resource_health.status {
                    ResourceStatus::Good => "good",
                    ResourceStatus::Warning => "warning",
                    ResourceStatus::Critical => "critical",
                });
                let mut lines = vec![
                    field("DOM Nodes", resource.dom_complexity),
                    field("DOM Growth", resource.dom_growth),
                    field("Storage Usage", format!("{} bytes", resource.storage_usage)),
                    field("Storage Growth", format!("{} bytes", resource.storage_growth)),
                    field("Health", resource.resource_health.status),
                ];
                lines.extend(
                    resource
                        .resource_health
                        .issues
                        .iter()
                        .cloned()
                        .map(Line::Item),
                );
                lines
            }
        },
        ReportSection::Custom => match analysis.custom.analyzed() {
            None => no_data("custom metric"),
            Some(custom) => custom
                .iter()
                .map(|(name, metric)| {
                    Line::Item(format!(
                        "{}: {:.2} ({}, variability {:.2}, {})",
                        name, metric.current, metric.trend, metric.variability, metric.alert_level
                    ))
                })
                .collect(),
        },
        ReportSection::Bottlenecks => {
            if analysis.bottlenecks.is_empty() {
                vec![Line::Text("No significant bottlenecks detected.".to_string())]
            } else {
                class = analysis
                    .bottlenecks
                    .iter()
                    .map(|b| b.severity)
                    .min()
                    .map(severity_class);
                analysis
                    .bottlenecks
                    .iter()
                    .enumerate()
                    .flat_map(|(i, bottleneck)| {
                        vec![
                            Line::Text(format!(
                                "{}. [{}] {}",
                                i + 1,
                                bottleneck.severity.as_ref().to_uppercase(),
                                bottleneck.description
                            )),
                            Line::Item(format!("Impact: {}", bottleneck.impact)),
                        ]
                    })
                    .collect()
            }
        }
        ReportSection::Recommendations => {
            if analysis.recommendations.is_empty() {
                vec![Line::Text(
                    "No specific recommendations at this time.".to_string(),
                )]
            } else {
                analysis
                    .recommendations
                    .iter()
                    .enumerate()
                    .flat_map(|(i, recommendation)| {
                        let mut lines = vec![
                            Line::Text(format!(
                                "{}. {} ({})",
                                i + 1,
                                recommendation.title,
                                recommendation.priority.as_ref().to_uppercase()
                            )),
                            Line::Text(recommendation.description.clone()),
                        ];
                        lines.extend(recommendation.actions.iter().cloned().map(Line::Item));
                        lines
                    })
                    .collect()
            }
        }
        ReportSection::Trends => match context.trend {
            None => no_data("trend"),
            Some(TrendReport::InsufficientData { message, .. }) => {
                vec![Line::Text(message.clone())]
            }
            Some(TrendReport::Available(trend)) => vec![
                field("Overall Trend", trend.overall_trend),
                field(
                    "Score Change",
                    format!(
                        "{:+.1} ({})",
                        trend.score_change.value, trend.score_change.direction
                    ),
                ),
                field(
                    "Error Change",
                    format!(
                        "{:+.0} ({})",
                        trend.error_change.value, trend.error_change.direction
                    ),
                ),
                field(
                    "Warning Change",
                    format!(
                        "{:+.0} ({})",
                        trend.warning_change.value, trend.warning_change.direction
                    ),
                ),
            ],
        },
    };

    Fragment {
        title: section.title(),
        class,
        lines,
    }
}

fn render_text(context: &RenderContext) -> String {
    let mut out = String::new();
    out.push_str("Performance Analysis Report\n");
    out.push_str(&format!("Generated: {}\n", context.timestamp()));
    out.push_str(&format!("Template: {}\n", context.template.title));
    out.push_str(&format!("Version: {}\n\n", VERSION));

    for section in &context.template.sections {
        let fragment = build_fragment(*section, context);
        out.push_str(&format!("=== {} ===\n", fragment.title.to_uppercase()));
        for line in &fragment.lines {
            match line {
                Line::Field(label, value) => out.push_str(&format!("{}: {}\n", label, value)),
                Line::Item(text) => out.push_str(&format!("- {}\n", text)),
                Line::Text(text) => out.push_str(&format!("{}\n", text)),
            }
        }
        out.push('\n');
    }
    out
}

fn section_value(section: ReportSection, context: &RenderContext) -> Result<Value> {
    let analysis = context.analysis;
    let value = match section {
        ReportSection::Overall => serde_json::to_value(&analysis.overall)?,
        ReportSection::Frame => serde_json::to_value(&analysis.frame)?,
        ReportSection::Memory => serde_json::to_value(&analysis.memory)?,
        ReportSection::Render => serde_json::to_value(&analysis.render)?,
        ReportSection::Network => serde_json::to_value(&analysis.network)?,
        ReportSection::Interaction => serde_json::to_value(&analysis.interaction)?,
        ReportSection::Resource => serde_json::to_value(&analysis.resource)?,
        ReportSection::Custom => serde_json::to_value(&analysis.custom)?,
        ReportSection::Bottlenecks => serde_json::to_value(&analysis.bottlenecks)?,
        ReportSection::Recommendations => serde_json::to_value(&analysis.recommendations)?,
        ReportSection::Trends => match context.trend {
            Some(trend) => serde_json::to_value(trend)?,
            None => json!({ "status": "no_data" }),
        },
    };
    Ok(value)
}

fn render_json(context: &RenderContext) -> Result<String> {
    let mut document = Map::new();
    document.insert(
        "metadata".to_string(),
        json!({
            "generatedAt": context.timestamp(),
            "template": context.template.name,
            "title": context.template.title,
            "version": VERSION,
            "analysisTimestamp": context.analysis.timestamp.to_rfc3339(),
        }),
    );
    for section in &context.template.sections {
        document.insert(section.to_string(), section_value(*section, context)?);
    }
    Ok(serde_json::to_string_pretty(&Value::Object(document))?)
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

const HTML_STYLE: &str = "body { font-family: sans-serif; margin: 2em; color: #222; }
section { border-left: 4px solid #888; padding: 0.5em 1em; margin-bottom: 1em; }
.good { border-color: #2e7d32; }
.warning { border-color: #f9a825; }
.critical { border-color: #c62828; }
.meta { color: #666; font-size: 0.9em; }";

fn render_html(context: &RenderContext) -> String {
    let title = escape_html(&context.template.title);
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<title>{}</title>\n", title));
    out.push_str(&format!("<style>\n{}\n</style>\n</head>\n<body>\n", HTML_STYLE));
    out.push_str(&format!("<h1>{}</h1>\n", title));
    out.push_str(&format!(
        "<p class=\"meta\">Generated: {} | Version: {}</p>\n",
        context.timestamp(),
        escape_html(VERSION)
    ));

    for section in &context.template.sections {
        let fragment = build_fragment(*section, context);
        match fragment.class {
            Some(class) => out.push_str(&format!("<section class=\"{}\">\n", class)),
            None => out.push_str("<section>\n"),
        }
        out.push_str(&format!("<h2>{}</h2>\n", fragment.title));

        let mut in_list = false;
        for line in &fragment.lines {
            let is_item = !matches!(line, Line::Text(_));
            if is_item && !in_list {
                out.push_str("<ul>\n");
            } else if !is_item && in_list {
                out.push_str("</ul>\n");
            }
            in_list = is_item;
            match line {
                Line::Field(label, value) => out.push_str(&format!(
                    "<li><strong>{}:</strong> {}</li>\n",
                    label,
                    escape_html(value)
                )),
                Line::Item(text) => out.push_str(&format!("<li>{}</li>\n", escape_html(text))),
                Line::Text(text) => out.push_str(&format!("<p>{}</p>\n", escape_html(text))),
            }
        }
        if in_list {
            out.push_str("</ul>\n");
        }
        out.push_str("</section>\n");
    }

    out.push_str("</body>\n</html>\n");
    out
}
