// Performance analyzer: scoring, bottlenecks, recommendations and history
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::analysis::*;
use crate::buffer::BoundedBuffer;
use crate::collectors::{
    CustomSnapshot, FrameSnapshot, InteractionSnapshot, MemorySnapshot, NetworkSnapshot,
    RenderSnapshot, ResourceSnapshot,
};
use crate::config::{AnalyzerConfig, ScoreThresholds};
use crate::stats;
use crate::trends::{self, TrendReport};

/// Weights of the scored domains in the overall score
pub const FRAME_WEIGHT: f64 = 0.30;
pub const MEMORY_WEIGHT: f64 = 0.25;
pub const RENDER_WEIGHT: f64 = 0.20;
pub const NETWORK_WEIGHT: f64 = 0.15;
pub const INTERACTION_WEIGHT: f64 = 0.10;

const JANK_BOTTLENECK_PERCENT: f64 = 10.0;
const MEMORY_BOTTLENECK_PRESSURE: f64 = 0.8;
const NETWORK_BOTTLENECK_RESPONSE_MS: f64 = 1000.0;
const INTERACTION_BOTTLENECK_MS: f64 = 100.0;

const FPS_RECOMMENDATION: f64 = 45.0;
const MEMORY_RECOMMENDATION_PRESSURE: f64 = 0.7;
const NETWORK_RECOMMENDATION_LATENCY_MS: f64 = 500.0;

/// Analyzes metric snapshots and keeps a bounded history of the results
pub struct PerformanceAnalyzer {
    history: BoundedBuffer<PerformanceAnalysis>,
    thresholds: ScoreThresholds,
}

impl Default for PerformanceAnalyzer {
    fn default() -> Self {
        Self::new(&AnalyzerConfig::default())
    }
}

impl PerformanceAnalyzer {
    pub fn new(config: &AnalyzerConfig) -> Self {
        PerformanceAnalyzer {
            history: BoundedBuffer::new(config.history_size),
            thresholds: config.thresholds.clone(),
        }
    }

    pub fn analyze_metrics(&mut self, snapshot: &MetricsSnapshot) -> PerformanceAnalysis {
        self.analyze_metrics_at(snapshot, Utc::now())
    }

    /// Analyze with an explicit timestamp; identical inputs give identical results.
    pub fn analyze_metrics_at(
        &mut self,
        snapshot: &MetricsSnapshot,
        timestamp: DateTime<Utc>,
    ) -> PerformanceAnalysis {
        let analysis = PerformanceAnalysis {
            timestamp,
            overall: overall_assessment(snapshot, &self.thresholds),
            frame: DomainAnalysis::from_option(snapshot.frame.as_ref().map(analyze_frame)),
            memory: DomainAnalysis::from_option(snapshot.memory.as_ref().map(analyze_memory)),
            render: DomainAnalysis::from_option(snapshot.render.as_ref().map(analyze_render)),
            network: DomainAnalysis::from_option(snapshot.network.as_ref().map(analyze_network)),
            interaction: DomainAnalysis::from_option(
                snapshot.interaction.as_ref().map(analyze_interaction),
            ),
            resource: DomainAnalysis::from_option(snapshot.resource.as_ref().map(analyze_resource)),
            custom: DomainAnalysis::from_option(snapshot.custom.as_ref().map(analyze_custom)),
            bottlenecks: identify_bottlenecks(snapshot),
            recommendations: generate_recommendations(snapshot),
        };

        log::debug!(
            "Analysis complete: score {:.2} ({}), {} bottlenecks",
            analysis.overall.score,
            analysis.overall.grade,
            analysis.bottlenecks.len()
        );
        self.history.push(analysis.clone());
        analysis
    }

    /// Retained analyses, oldest first
    pub fn analysis_history(&self) -> Vec<PerformanceAnalysis> {
        self.history.iter().cloned().collect()
    }

    pub fn latest_analysis(&self) -> Option<&PerformanceAnalysis> {
        self.history.latest()
    }

    pub fn trend(&self) -> TrendReport {
        let recent: Vec<PerformanceAnalysis> = self.history.trailing_vec(2);
        match trends::analyze_trend(&recent) {
            TrendReport::InsufficientData { message, .. } => TrendReport::InsufficientData {
                message,
                retained: self.history.len(),
            },
            report => report,
        }
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn thresholds(&self) -> &ScoreThresholds {
        &self.thresholds
    }
}

pub fn score_frame(frame: &FrameSnapshot, thresholds: &ScoreThresholds) -> f64 {
    let fps = frame.average.fps;
    let [excellent, good, warning, critical] = thresholds.fps;
    if fps >= excellent {
        1.0
    } else if fps >= good {
        0.8
    } else if fps >= warning {
        0.6
    } else if fps >= critical {
        0.4
    } else {
        0.2
    }
}

pub fn score_memory(memory: &MemorySnapshot) -> f64 {
    (1.0 - memory.current.pressure).clamp(0.0, 1.0)
}

pub fn score_render(render: &RenderSnapshot, thresholds: &ScoreThresholds) -> f64 {
    banded_latency_score(render.statistics.average_duration, &thresholds.render_time)
}

pub fn score_network(network: &NetworkSnapshot, thresholds: &ScoreThresholds) -> f64 {
    if thresholds.network_ceiling_ms <= 0.0 {
        return 0.0;
    }
    (1.0 - network.summary.average_duration / thresholds.network_ceiling_ms).clamp(0.0, 1.0)
}

pub fn score_interaction(interaction: &InteractionSnapshot, thresholds: &ScoreThresholds) -> f64 {
    banded_latency_score(
        interaction.summary.average_response_time,
        &thresholds.response_time,
    )
}

fn banded_latency_score(value: f64, bands: &[f64; 3]) -> f64 {
    if value <= bands[0] {
        1.0
    } else if value <= bands[1] {
        0.8
    } else if value <= bands[2] {
        0.6
    } else {
        0.4
    }
}

/// Weighted overall score over the domains that have data.
pub fn overall_assessment(snapshot: &MetricsSnapshot, thresholds: &ScoreThresholds) -> OverallAnalysis {
    let breakdown = ScoreBreakdown {
        frame: snapshot.frame.as_ref().map(|f| score_frame(f, thresholds)),
        memory: snapshot.memory.as_ref().map(score_memory),
        render: snapshot.render.as_ref().map(|r| score_render(r, thresholds)),
        network: snapshot.network.as_ref().map(|n| score_network(n, thresholds)),
        interaction: snapshot
            .interaction
            .as_ref()
            .map(|i| score_interaction(i, thresholds)),
    };

    let weighted = [
        (breakdown.frame, FRAME_WEIGHT),
        (breakdown.memory, MEMORY_WEIGHT),
        (breakdown.render, RENDER_WEIGHT),
        (breakdown.network, NETWORK_WEIGHT),
        (breakdown.interaction, INTERACTION_WEIGHT),
    ];
    let (total, coverage) = weighted
        .iter()
        .filter_map(|(score, weight)| score.map(|s| (s * weight, *weight)))
        .fold((0.0, 0.0), |(total, coverage), (s, w)| (total + s, coverage + w));

    if coverage <= 0.0 {
        return OverallAnalysis {
            score: 0.0,
            grade: Grade::F,
            breakdown,
            health_status: HealthStatus::Unknown,
            coverage: 0.0,
        };
    }

    let score = (total / coverage).clamp(0.0, 1.0);
    OverallAnalysis {
        score,
        grade: Grade::from_score(score),
        breakdown,
        health_status: HealthStatus::from_score(score),
        coverage,
    }
}

fn metrics(values: &[(&str, f64)]) -> BTreeMap<String, f64> {
    values
        .iter()
        .map(|(name, value)| (name.to_string(), *value))
        .collect()
}

pub fn identify_bottlenecks(snapshot: &MetricsSnapshot) -> Vec<Bottleneck> {
    let mut bottlenecks = Vec::new();

    if let Some(frame) = &snapshot.frame {
        let jank = frame.performance.jank_percentage;
        if jank > JANK_BOTTLENECK_PERCENT {
            bottlenecks.push(Bottleneck {
                kind: BottleneckKind::FrameDrops,
                severity: Severity::High,
                description: "Frequent frame drops detected".to_string(),
                impact: "Visual stuttering and poor user experience".to_string(),
                metrics: metrics(&[
                    ("jankPercentage", jank),
                    ("averageFps", frame.average.fps),
                ]),
            });
        }
    }

    if let Some(memory) = &snapshot.memory {
        let pressure = memory.current.pressure;
        if pressure > MEMORY_BOTTLENECK_PRESSURE {
            bottlenecks.push(Bottleneck {
                kind: BottleneckKind::MemoryPressure,
                severity: Severity::Critical,
                description: "High memory pressure".to_string(),
                impact: "Risk of crashes and performance degradation".to_string(),
                metrics: metrics(&[("pressure", pressure), ("used", memory.current.used)]),
            });
        }
    }

    if let Some(network) = &snapshot.network {
        let response = network.timing.average_response;
        if response > NETWORK_BOTTLENECK_RESPONSE_MS {
            bottlenecks.push(Bottleneck {
                kind: BottleneckKind::SlowNetwork,
                severity: Severity::Medium,
                description: "Slow network responses".to_string(),
                impact: "Poor user experience and loading delays".to_string(),
                metrics: metrics(&[
                    ("averageResponse", response),
                    ("averageTotal", network.timing.average_total),
                ]),
            });
        }
    }

    if let Some(interaction) = &snapshot.interaction {
        let response = interaction.summary.average_response_time;
        if response > INTERACTION_BOTTLENECK_MS {
            bottlenecks.push(Bottleneck {
                kind: BottleneckKind::SlowInteractions,
                severity: Severity::Medium,
                description: "Slow interaction responses".to_string(),
                impact: "Unresponsive interface".to_string(),
                metrics: metrics(&[
                    ("averageResponseTime", response),
                    ("maxResponseTime", interaction.summary.max_response_time),
                ]),
            });
        }
    }

    bottlenecks
}

fn actions(items: &[&str]) -> Vec<String> {
    items.iter().map(|a| a.to_string()).collect()
}

pub fn generate_recommendations(snapshot: &MetricsSnapshot) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if let Some(frame) = &snapshot.frame {
        if frame.current.fps < FPS_RECOMMENDATION {
            recommendations.push(Recommendation {
                category: RecommendationCategory::Performance,
                priority: Severity::High,
                title: "Improve Frame Rate".to_string(),
                description: "Consider reducing visual effects or optimizing rendering"
                    .to_string(),
                actions: actions(&[
                    "Reduce particle count",
                    "Lower graphics quality",
                    "Optimize shaders",
                ]),
            });
        }
    }

    if let Some(memory) = &snapshot.memory {
        if memory.current.pressure > MEMORY_RECOMMENDATION_PRESSURE {
            recommendations.push(Recommendation {
                category: RecommendationCategory::Memory,
                priority: Severity::High,
                title: "Reduce Memory Usage".to_string(),
                description: "High memory pressure detected".to_string(),
                actions: actions(&[
                    "Clear unused caches",
                    "Optimize object pooling",
                    "Review memory leaks",
                ]),
            });
        }
    }

    if let Some(network) = &snapshot.network {
        if network.summary.average_duration > NETWORK_RECOMMENDATION_LATENCY_MS {
            recommendations.push(Recommendation {
                category: RecommendationCategory::Network,
                priority: Severity::Medium,
                title: "Optimize Network Requests".to_string(),
                description: "Network latency is affecting performance".to_string(),
                actions: actions(&["Enable compression", "Use CDN", "Implement caching"]),
            });
        }
    }

    recommendations
}

pub fn analyze_frame(frame: &FrameSnapshot) -> FrameAnalysis {
    let frame_times: Vec<f64> = frame.history.iter().map(|f| f.frame_time).collect();
    let stability = if frame_times.len() < 2 {
        1.0
    } else {
        let average = stats::mean(&frame_times);
        if average > 0.0 {
            (1.0 - stats::std_dev(&frame_times) / average).max(0.0)
        } else {
            1.0
        }
    };

    let fps = frame.average.fps;
    let jank = frame.performance.jank_percentage;
    let assessment = if fps >= 55.0 && jank < 5.0 {
        Assessment::Excellent
    } else if fps >= 45.0 && jank < 10.0 {
        Assessment::Good
    } else if fps >= 30.0 && jank < 20.0 {
        Assessment::Acceptable
    } else {
        Assessment::Poor
    };

    let trend = if frame.history.len() < 3 {
        SeriesTrend::InsufficientData
    } else {
        let recent = &frame.history[frame.history.len() - 3..];
        let change = recent[2].fps - recent[0].fps;
        if change > 5.0 {
            SeriesTrend::Improving
        } else if change < -5.0 {
            SeriesTrend::Declining
        } else {
            SeriesTrend::Stable
        }
    };

    FrameAnalysis {
        current_fps: frame.current.fps,
        average_fps: fps,
        stability,
        jank_level: jank,
        assessment,
        trend,
    }
}

pub fn analyze_memory(memory: &MemorySnapshot) -> MemoryAnalysis {
    let growth = memory.trends.growth_rate;
    let gc_frequency = memory.gc.frequency;
    let gc_efficiency = if gc_frequency > 0 && memory.current.used > 0.0 {
        memory.gc.average_reclaimed / memory.current.used
    } else {
        1.0
    };

    let leak_risk = if growth > 1000.0 && gc_frequency < 2 {
        RiskLevel::High
    } else if growth > 500.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let mut notes = Vec::new();
    if memory.current.pressure > 0.8 {
        notes.push("Memory pressure is high, consider freeing unused objects".to_string());
    }
    if growth > 1000.0 {
        notes.push("Memory usage is growing rapidly, check for leaks".to_string());
    }
    if gc_frequency > 10 {
        notes.push("Frequent garbage collection, reduce short-lived allocations".to_string());
    }

    MemoryAnalysis {
        current_usage: memory.current.used,
        pressure_level: memory.current.pressure,
        growth_rate: growth,
        gc_efficiency,
        leak_risk,
        notes,
    }
}

pub fn analyze_render(render: &RenderSnapshot) -> RenderAnalysis {
    let statistics = &render.statistics;
    let spread = if statistics.max_duration > 0.0 {
        statistics.min_duration / statistics.max_duration
    } else {
        1.0
    };
    let speed = (1.0 - statistics.average_duration / 50.0).max(0.0);

    let mut bottlenecks = Vec::new();
    if statistics.average_duration > 30.0 {
        bottlenecks.push("Long average render time".to_string());
    }
    if statistics.max_duration > 100.0 {
        bottlenecks.push("Render spikes detected".to_string());
    }

    RenderAnalysis {
        average_render_time: statistics.average_duration,
        render_efficiency: (spread + speed) / 2.0,
        bottlenecks,
        paint_frequency: statistics.paint_events,
        custom_measures: statistics.custom_measures,
    }
}

pub fn analyze_network(network: &NetworkSnapshot) -> NetworkAnalysis {
    let timing = &network.timing;
    let overhead = timing.average_dns + timing.average_tcp + timing.average_request
        + timing.average_response;
    let network_efficiency = if overhead > 0.0 {
        timing.average_response / overhead
    } else {
        1.0
    };

    let mut bottlenecks = Vec::new();
    if timing.average_dns > 100.0 {
        bottlenecks.push("Slow DNS resolution".to_string());
    }
    if timing.average_tcp > 200.0 {
        bottlenecks.push("Slow connection establishment".to_string());
    }
    if timing.average_request > 500.0 {
        bottlenecks.push("Slow request processing".to_string());
    }
    if timing.average_response > 1000.0 {
        bottlenecks.push("Slow server response".to_string());
    }

    NetworkAnalysis {
        total_requests: network.summary.total_requests,
        total_transfer: network.summary.total_transfer,
        average_latency: network.summary.average_duration,
        network_efficiency,
        resource_breakdown: network.summary.by_type.clone(),
        bottlenecks,
    }
}

pub fn analyze_interaction(interaction: &InteractionSnapshot) -> InteractionAnalysis {
    let summary = &interaction.summary;
    let responsiveness = match summary.average_response_time {
        t if t <= 16.0 => Assessment::Excellent,
        t if t <= 50.0 => Assessment::Good,
        t if t <= 100.0 => Assessment::Acceptable,
        _ => Assessment::Poor,
    };

    InteractionAnalysis {
        total_interactions: summary.total_interactions,
        average_response_time: summary.average_response_time,
        responsiveness,
        interaction_types: summary.by_type.clone(),
        slow_interactions: summary.slow_interactions,
    }
}

pub fn analyze_resource(resource: &ResourceSnapshot) -> ResourceAnalysis {
    let nodes = resource.current.dom.nodes;
    let storage = resource.current.storage.local_bytes;

    let mut issues = Vec::new();
    if nodes > 5000 {
        issues.push("High DOM complexity".to_string());
    }
    if resource.trends.dom_growth > 100 {
        issues.push("DOM growing rapidly".to_string());
    }
    if storage > 5_000_000 {
        issues.push("High storage usage".to_string());
    }

    let status = match issues.len() {
        0 => ResourceStatus::Good,
        1 => ResourceStatus::Warning,
        _ => ResourceStatus::Critical,
    };

    ResourceAnalysis {
        dom_complexity: nodes,
        dom_growth: resource.trends.dom_growth,
        storage_usage: storage,
        storage_growth: resource.trends.storage_growth,
        resource_health: ResourceHealth { status, issues },
    }
}

pub fn analyze_custom(custom: &CustomSnapshot) -> CustomAnalysis {
    custom
        .iter()
        .map(|(name, summary)| {
            let values: Vec<f64> = summary.recent.iter().map(|s| s.value).collect();
            let trend = match (values.first(), values.last()) {
                (Some(&first), Some(&last)) if values.len() >= 2 => {
                    let base = if first == 0.0 { 1.0 } else { first.abs() };
                    let change = (last - first) / base;
                    if change > 0.1 {
                        ValueTrend::Increasing
                    } else if change < -0.1 {
                        ValueTrend::Decreasing
                    } else {
                        ValueTrend::Stable
                    }
                }
                _ => ValueTrend::Stable,
            };

            let variability = stats::variability(&values);
            let alert_level = if variability > 0.5 {
                VariabilityLevel::HighVariability
            } else if variability > 0.2 {
                VariabilityLevel::ModerateVariability
            } else {
                VariabilityLevel::Stable
            };

            (
                name.clone(),
                CustomMetricAnalysis {
                    current: summary.current,
                    trend,
                    variability,
                    alert_level,
                },
            )
        })
        .collect()
}
