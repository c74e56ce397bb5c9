// Raw samples recorded by the collectors
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Telemetry domain a sample or snapshot belongs to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MetricDomain {
    Frame,
    Memory,
    Render,
    Network,
    Interaction,
    Resource,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSample {
    pub frame_number: u64,
    pub timestamp: f64,
    pub frame_time: f64,
    pub fps: f64,
    pub jank: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySample {
    pub timestamp: f64,
    pub used: f64,
    pub total: f64,
    pub limit: f64,
    pub pressure: f64,
    pub available: f64,
    pub gc_detected: bool,
    pub gc_reclaimed: f64,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RenderKind {
    Paint,
    Measure,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSample {
    pub timestamp: f64,
    pub kind: RenderKind,
    pub name: String,
    pub start_time: f64,
    pub duration: f64,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ResourceType {
    Script,
    Stylesheet,
    Image,
    Font,
    Audio,
    Video,
    Xhr,
    Other,
}

impl ResourceType {
    /// Classify a resource by the file extension of its URL path.
    pub fn from_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let file = path.rsplit('/').next().unwrap_or(path);
        let extension = match file.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => return ResourceType::Other,
        };
        match extension.as_str() {
            "js" | "mjs" => ResourceType::Script,
            "css" => ResourceType::Stylesheet,
            "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" => ResourceType::Image,
            "woff" | "woff2" | "ttf" | "otf" => ResourceType::Font,
            "mp3" | "ogg" | "wav" => ResourceType::Audio,
            "mp4" | "webm" => ResourceType::Video,
            "json" => ResourceType::Xhr,
            _ => ResourceType::Other,
        }
    }
}

/// Six-phase breakdown of one resource load, in milliseconds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseTiming {
    pub dns: f64,
    pub tcp: f64,
    pub ssl: f64,
    pub request: f64,
    pub response: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSample {
    pub timestamp: f64,
    pub name: String,
    pub resource_type: ResourceType,
    pub start_time: f64,
    pub duration: f64,
    pub transfer_size: f64,
    pub timing: PhaseTiming,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InteractionKind {
    Click,
    Keydown,
    Scroll,
    Touchstart,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionSample {
    pub timestamp: f64,
    pub event_type: InteractionKind,
    pub target_kind: String,
    pub response_time: f64,
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomCounts {
    pub nodes: u64,
    pub images: u64,
    pub scripts: u64,
    pub stylesheets: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageUsage {
    pub local_bytes: u64,
    pub session_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSample {
    pub timestamp: f64,
    pub dom: DomCounts,
    pub storage: StorageUsage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomSample {
    pub timestamp: f64,
    pub name: String,
    pub value: f64,
    pub metadata: BTreeMap<String, String>,
}

/// One sample of any domain, as delivered to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "domain", rename_all = "lowercase")]
pub enum MetricSample {
    Frame(FrameSample),
    Memory(MemorySample),
    Render(RenderSample),
    Network(NetworkSample),
    Interaction(InteractionSample),
    Resource(ResourceSample),
    Custom(CustomSample),
}

impl MetricSample {
    pub fn domain(&self) -> MetricDomain {
        match self {
            MetricSample::Frame(_) => MetricDomain::Frame,
            MetricSample::Memory(_) => MetricDomain::Memory,
            MetricSample::Render(_) => MetricDomain::Render,
            MetricSample::Network(_) => MetricDomain::Network,
            MetricSample::Interaction(_) => MetricDomain::Interaction,
            MetricSample::Resource(_) => MetricDomain::Resource,
            MetricSample::Custom(_) => MetricDomain::Custom,
        }
    }

    pub fn timestamp(&self) -> f64 {
        match self {
            MetricSample::Frame(s) => s.timestamp,
            MetricSample::Memory(s) => s.timestamp,
            MetricSample::Render(s) => s.timestamp,
            MetricSample::Network(s) => s.timestamp,
            MetricSample::Interaction(s) => s.timestamp,
            MetricSample::Resource(s) => s.timestamp,
            MetricSample::Custom(s) => s.timestamp,
        }
    }
}
