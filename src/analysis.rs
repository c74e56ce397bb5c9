// Analyzer input and output types
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::collectors::{
    CustomSnapshot, FrameSnapshot, InteractionSnapshot, InteractionTypeStats, MemorySnapshot,
    NetworkSnapshot, RenderSnapshot, ResourceSnapshot, TypeAggregate,
};
use crate::samples::{InteractionKind, ResourceType};

/// Snapshots of every collector taken for one analysis.
///
/// Domains are gathered one after another, so they may reflect slightly
/// different instants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub frame: Option<FrameSnapshot>,
    pub memory: Option<MemorySnapshot>,
    pub render: Option<RenderSnapshot>,
    pub network: Option<NetworkSnapshot>,
    pub interaction: Option<InteractionSnapshot>,
    pub resource: Option<ResourceSnapshot>,
    pub custom: Option<CustomSnapshot>,
}

/// Letter grade of the overall score
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString, AsRefStr, EnumIter,
)]
pub enum Grade {
    #[serde(rename = "A+")]
    #[strum(serialize = "A+")]
    APlus,
    A,
    #[serde(rename = "B+")]
    #[strum(serialize = "B+")]
    BPlus,
    B,
    #[serde(rename = "C+")]
    #[strum(serialize = "C+")]
    CPlus,
    C,
    #[serde(rename = "D+")]
    #[strum(serialize = "D+")]
    DPlus,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 0.9 => Grade::APlus,
            s if s >= 0.8 => Grade::A,
            s if s >= 0.7 => Grade::BPlus,
            s if s >= 0.6 => Grade::B,
            s if s >= 0.5 => Grade::CPlus,
            s if s >= 0.4 => Grade::C,
            s if s >= 0.3 => Grade::DPlus,
            s if s >= 0.2 => Grade::D,
            _ => Grade::F,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HealthStatus {
    Excellent,
    Good,
    Warning,
    Critical,
    /// No scored domain had data
    Unknown,
}

impl HealthStatus {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 0.8 => HealthStatus::Excellent,
            s if s >= 0.6 => HealthStatus::Good,
            s if s >= 0.4 => HealthStatus::Warning,
            _ => HealthStatus::Critical,
        }
    }
}

/// Per-domain sub-scores; `None` for domains without data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub frame: Option<f64>,
    pub memory: Option<f64>,
    pub render: Option<f64>,
    pub network: Option<f64>,
    pub interaction: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallAnalysis {
    pub score: f64,
    pub grade: Grade,
    pub breakdown: ScoreBreakdown,
    pub health_status: HealthStatus,
    /// Sum of the weights of the domains that contributed
    pub coverage: f64,
}

/// Severity of a bottleneck, priority of a recommendation
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BottleneckKind {
    FrameDrops,
    MemoryPressure,
    SlowNetwork,
    SlowInteractions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bottleneck {
    #[serde(rename = "type")]
    pub kind: BottleneckKind,
    pub severity: Severity,
    pub description: String,
    pub impact: String,
    pub metrics: BTreeMap<String, f64>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecommendationCategory {
    Performance,
    Memory,
    Network,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: RecommendationCategory,
    pub priority: Severity,
    pub title: String,
    pub description: String,
    pub actions: Vec<String>,
}

/// Sub-analysis of one domain, `no_data` when its snapshot was absent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DomainAnalysis<T> {
    NoData,
    Analyzed(T),
}

impl<T> DomainAnalysis<T> {
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(analysis) => DomainAnalysis::Analyzed(analysis),
            None => DomainAnalysis::NoData,
        }
    }

    pub fn analyzed(&self) -> Option<&T> {
        match self {
            DomainAnalysis::Analyzed(analysis) => Some(analysis),
            DomainAnalysis::NoData => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, DomainAnalysis::NoData)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Assessment {
    Excellent,
    Good,
    Acceptable,
    Poor,
}

/// Short-term direction of a series
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SeriesTrend {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameAnalysis {
    pub current_fps: f64,
    pub average_fps: f64,
    pub stability: f64,
    pub jank_level: f64,
    pub assessment: Assessment,
    pub trend: SeriesTrend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryAnalysis {
    pub current_usage: f64,
    pub pressure_level: f64,
    pub growth_rate: f64,
    pub gc_efficiency: f64,
    pub leak_risk: RiskLevel,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderAnalysis {
    pub average_render_time: f64,
    pub render_efficiency: f64,
    pub bottlenecks: Vec<String>,
    pub paint_frequency: usize,
    pub custom_measures: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAnalysis {
    pub total_requests: usize,
    pub total_transfer: f64,
    pub average_latency: f64,
    pub network_efficiency: f64,
    pub resource_breakdown: BTreeMap<ResourceType, TypeAggregate>,
    pub bottlenecks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionAnalysis {
    pub total_interactions: usize,
    pub average_response_time: f64,
    pub responsiveness: Assessment,
    pub interaction_types: BTreeMap<InteractionKind, InteractionTypeStats>,
    pub slow_interactions: bool,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ResourceStatus {
    Good,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceHealth {
    pub status: ResourceStatus,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceAnalysis {
    pub dom_complexity: u64,
    pub dom_growth: i64,
    pub storage_usage: u64,
    pub storage_growth: i64,
    pub resource_health: ResourceHealth,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ValueTrend {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VariabilityLevel {
    HighVariability,
    ModerateVariability,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomMetricAnalysis {
    pub current: f64,
    pub trend: ValueTrend,
    pub variability: f64,
    pub alert_level: VariabilityLevel,
}

pub type CustomAnalysis = BTreeMap<String, CustomMetricAnalysis>;

/// Immutable result of one analyzer run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceAnalysis {
    pub timestamp: DateTime<Utc>,
    pub overall: OverallAnalysis,
    pub frame: DomainAnalysis<FrameAnalysis>,
    pub memory: DomainAnalysis<MemoryAnalysis>,
    pub render: DomainAnalysis<RenderAnalysis>,
    pub network: DomainAnalysis<NetworkAnalysis>,
    pub interaction: DomainAnalysis<InteractionAnalysis>,
    pub resource: DomainAnalysis<ResourceAnalysis>,
    pub custom: DomainAnalysis<CustomAnalysis>,
    pub bottlenecks: Vec<Bottleneck>,
    pub recommendations: Vec<Recommendation>,
}

impl PerformanceAnalysis {
    /// Bottlenecks of critical or high severity
    pub fn error_count(&self) -> usize {
        self.bottlenecks
            .iter()
            .filter(|b| b.severity <= Severity::High)
            .count()
    }

    /// Bottlenecks of medium or low severity
    pub fn warning_count(&self) -> usize {
        self.bottlenecks.len() - self.error_count()
    }
}
