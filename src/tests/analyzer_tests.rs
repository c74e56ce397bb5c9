// Analyzer scoring, bottleneck, recommendation and trend tests

use chrono::{DateTime, Duration, TimeZone, Utc};

use super::fixtures::*;
use crate::analysis::*;
use crate::analyzer::*;
use crate::collectors::*;
use crate::config::{AnalyzerConfig, ScoreThresholds};
use crate::samples::{CustomSample, DomCounts, ResourceSample, StorageUsage};
use crate::trends::*;

fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap() + Duration::minutes(minutes)
}

fn memory_only(pressure: f64) -> MetricsSnapshot {
    MetricsSnapshot {
        memory: Some(memory_snapshot(pressure)),
        ..MetricsSnapshot::default()
    }
}

#[test]
fn test_grade_table() {
    assert_eq!(Grade::from_score(0.95), Grade::APlus);
    assert_eq!(Grade::from_score(0.85), Grade::A);
    assert_eq!(Grade::from_score(0.55), Grade::CPlus);
    assert_eq!(Grade::from_score(0.15), Grade::F);

    assert_eq!(Grade::from_score(0.9), Grade::APlus);
    assert_eq!(Grade::from_score(0.8999), Grade::A);
    assert_eq!(Grade::from_score(0.7), Grade::BPlus);
    assert_eq!(Grade::from_score(0.2), Grade::D);
    assert_eq!(Grade::from_score(0.1999), Grade::F);

    assert_eq!(Grade::APlus.to_string(), "A+");
    assert_eq!(Grade::BPlus.to_string(), "B+");
    assert_eq!(Grade::C.to_string(), "C");
}

#[test]
fn test_health_status_bands() {
    assert_eq!(HealthStatus::from_score(0.8), HealthStatus::Excellent);
    assert_eq!(HealthStatus::from_score(0.6), HealthStatus::Good);
    assert_eq!(HealthStatus::from_score(0.4), HealthStatus::Warning);
    assert_eq!(HealthStatus::from_score(0.39), HealthStatus::Critical);
}

#[test]
fn test_domain_scores_stay_in_unit_range() {
    let thresholds = ScoreThresholds::default();
    for step in 0..=30 {
        let x = step as f64 * 10.0;
        let scores = [
            score_frame(&frame_snapshot(x.max(1.0), x.max(1.0), 0.0), &thresholds),
            score_memory(&memory_snapshot(step as f64 / 20.0)),
            score_render(&render_snapshot(x, 0.0, x), &thresholds),
            score_network(&network_snapshot(x * 10.0, x), &thresholds),
            score_interaction(&interaction_snapshot(x), &thresholds),
        ];
        for score in scores {
            assert!((0.0..=1.0).contains(&score), "score {} out of range", score);
        }
    }
}

#[test]
fn test_frame_score_is_monotonic_in_fps() {
    let thresholds = ScoreThresholds::default();
    let mut previous = 0.0;
    for fps in 1..=120 {
        let fps = fps as f64;
        let score = score_frame(&frame_snapshot(fps, fps, 0.0), &thresholds);
        assert!(score >= previous);
        previous = score;
    }
    assert_eq!(score_frame(&frame_snapshot(60.0, 60.0, 0.0), &thresholds), 1.0);
    assert_eq!(score_frame(&frame_snapshot(50.0, 50.0, 0.0), &thresholds), 0.8);
    assert_eq!(score_frame(&frame_snapshot(10.0, 10.0, 0.0), &thresholds), 0.2);
}

#[test]
fn test_latency_score_bands() {
    let thresholds = ScoreThresholds::default();
    assert_eq!(score_render(&render_snapshot(10.0, 5.0, 15.0), &thresholds), 1.0);
    assert_eq!(score_render(&render_snapshot(20.0, 5.0, 25.0), &thresholds), 0.8);
    assert_eq!(score_render(&render_snapshot(30.0, 5.0, 35.0), &thresholds), 0.6);
    assert_eq!(score_render(&render_snapshot(80.0, 5.0, 95.0), &thresholds), 0.4);

    assert_eq!(score_interaction(&interaction_snapshot(16.0), &thresholds), 1.0);
    assert_eq!(score_interaction(&interaction_snapshot(150.0), &thresholds), 0.4);

    let network = score_network(&network_snapshot(500.0, 100.0), &thresholds);
    assert!((network - 0.75).abs() < 1e-9);
    assert_eq!(score_network(&network_snapshot(5000.0, 100.0), &thresholds), 0.0);
}

#[test]
fn test_healthy_session_scores_excellent() {
    let mut analyzer = PerformanceAnalyzer::default();
    let snapshot = MetricsSnapshot {
        frame: Some(frame_snapshot(60.0, 60.0, 2.0)),
        memory: Some(memory_snapshot(0.1)),
        ..MetricsSnapshot::default()
    };

    let analysis = analyzer.analyze_metrics_at(&snapshot, at(0));
    assert!(analysis.overall.score >= 0.9);
    assert_eq!(analysis.overall.grade, Grade::APlus);
    assert_eq!(analysis.overall.health_status, HealthStatus::Excellent);
    assert!((analysis.overall.coverage - 0.55).abs() < 1e-9);
    assert!(analysis.bottlenecks.is_empty());
    assert!(analysis.recommendations.is_empty());

    assert_eq!(analysis.overall.breakdown.frame, Some(1.0));
    assert!(analysis.overall.breakdown.render.is_none());
    assert!(analysis.render.is_no_data());
    assert!(analysis.frame.analyzed().is_some());
}

#[test]
fn test_memory_pressure_is_a_critical_bottleneck() {
    let mut analyzer = PerformanceAnalyzer::default();
    let snapshot = MetricsSnapshot {
        frame: Some(frame_snapshot(60.0, 60.0, 2.0)),
        memory: Some(memory_snapshot(0.85)),
        ..MetricsSnapshot::default()
    };

    let analysis = analyzer.analyze_metrics_at(&snapshot, at(0));
    assert_eq!(analysis.bottlenecks.len(), 1);
    let bottleneck = &analysis.bottlenecks[0];
    assert_eq!(bottleneck.kind, BottleneckKind::MemoryPressure);
    assert_eq!(bottleneck.severity, Severity::Critical);
    assert!((bottleneck.metrics["pressure"] - 0.85).abs() < 1e-9);

    assert_eq!(analysis.error_count(), 1);
    assert_eq!(analysis.warning_count(), 0);
    assert_eq!(analysis.recommendations.len(), 1);
    assert_eq!(analysis.recommendations[0].category, RecommendationCategory::Memory);
}

#[test]
fn test_slow_network_is_a_medium_bottleneck() {
    let mut analyzer = PerformanceAnalyzer::default();
    let snapshot = MetricsSnapshot {
        network: Some(network_snapshot(400.0, 1500.0)),
        ..MetricsSnapshot::default()
    };

    let analysis = analyzer.analyze_metrics_at(&snapshot, at(0));
    let slow: Vec<&Bottleneck> = analysis
        .bottlenecks
        .iter()
        .filter(|b| b.kind == BottleneckKind::SlowNetwork)
        .collect();
    assert_eq!(slow.len(), 1);
    assert_eq!(slow[0].severity, Severity::Medium);
    assert_eq!(analysis.warning_count(), 1);

    // Recommendations look at total duration, not response time
    assert!(analysis.recommendations.is_empty());
}

#[test]
fn test_jank_and_slow_interactions_are_flagged() {
    let snapshot = MetricsSnapshot {
        frame: Some(frame_snapshot(40.0, 40.0, 25.0)),
        interaction: Some(interaction_snapshot(180.0)),
        ..MetricsSnapshot::default()
    };
    let bottlenecks = identify_bottlenecks(&snapshot);
    let kinds: Vec<BottleneckKind> = bottlenecks.iter().map(|b| b.kind).collect();
    assert_eq!(
        kinds,
        vec![BottleneckKind::FrameDrops, BottleneckKind::SlowInteractions]
    );
    assert_eq!(bottlenecks[0].severity, Severity::High);
    assert_eq!(bottlenecks[0].metrics["averageFps"], 40.0);
}

#[test]
fn test_recommendations_do_not_depend_on_bottlenecks() {
    let snapshot = MetricsSnapshot {
        frame: Some(frame_snapshot(40.0, 60.0, 0.0)),
        network: Some(network_snapshot(800.0, 100.0)),
        ..MetricsSnapshot::default()
    };
    assert!(identify_bottlenecks(&snapshot).is_empty());

    let recommendations = generate_recommendations(&snapshot);
    let titles: Vec<&str> = recommendations.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Improve Frame Rate", "Optimize Network Requests"]);
    assert_eq!(recommendations[0].priority, Severity::High);
    assert_eq!(recommendations[0].actions.len(), 3);
}

#[test]
fn test_analysis_is_deterministic() {
    let mut analyzer = PerformanceAnalyzer::default();
    let snapshot = MetricsSnapshot {
        frame: Some(frame_snapshot(50.0, 48.0, 12.0)),
        memory: Some(memory_snapshot(0.75)),
        render: Some(render_snapshot(18.0, 4.0, 40.0)),
        network: Some(network_snapshot(600.0, 1200.0)),
        interaction: Some(interaction_snapshot(60.0)),
        ..MetricsSnapshot::default()
    };

    let first = analyzer.analyze_metrics_at(&snapshot, at(0));
    let second = analyzer.analyze_metrics_at(&snapshot, at(0));
    assert_eq!(first, second);
    assert!((first.overall.coverage - 1.0).abs() < 1e-9);
}

#[test]
fn test_empty_snapshot_has_no_data() {
    let mut analyzer = PerformanceAnalyzer::default();
    let analysis = analyzer.analyze_metrics_at(&MetricsSnapshot::default(), at(0));

    assert_eq!(analysis.overall.score, 0.0);
    assert_eq!(analysis.overall.grade, Grade::F);
    assert_eq!(analysis.overall.health_status, HealthStatus::Unknown);
    assert_eq!(analysis.overall.coverage, 0.0);
    assert!(analysis.frame.is_no_data());
    assert!(analysis.custom.is_no_data());
    assert!(analysis.bottlenecks.is_empty());
    assert!(analysis.recommendations.is_empty());
}

#[test]
fn test_missing_domains_are_excluded_not_penalized() {
    let analysis = PerformanceAnalyzer::default().analyze_metrics_at(&memory_only(0.5), at(0));
    assert!((analysis.overall.score - 0.5).abs() < 1e-9);
    assert!((analysis.overall.coverage - MEMORY_WEIGHT).abs() < 1e-9);
    assert_eq!(analysis.overall.breakdown.memory, Some(0.5));
    assert!(analysis.overall.breakdown.frame.is_none());
}

#[test]
fn test_no_data_serializes_as_status() {
    let analysis = PerformanceAnalyzer::default().analyze_metrics_at(&memory_only(0.15), at(0));
    let value = serde_json::to_value(&analysis).unwrap();
    assert_eq!(value["frame"]["status"], "no_data");
    assert_eq!(value["memory"]["status"], "analyzed");
    assert_eq!(value["overall"]["grade"], "A");
    assert_eq!(value["overall"]["healthStatus"], "excellent");
}

#[test]
fn test_frame_sub_analysis() {
    let mut steady = frame_snapshot(60.0, 60.0, 2.0);
    steady.history = frame_history(&[60.0, 60.0, 60.0]);
    let analysis = analyze_frame(&steady);
    assert_eq!(analysis.assessment, Assessment::Excellent);
    assert_eq!(analysis.trend, SeriesTrend::Stable);
    assert!((analysis.stability - 1.0).abs() < 1e-9);

    let mut rising = frame_snapshot(60.0, 50.0, 8.0);
    rising.history = frame_history(&[40.0, 50.0, 60.0]);
    let analysis = analyze_frame(&rising);
    assert_eq!(analysis.assessment, Assessment::Good);
    assert_eq!(analysis.trend, SeriesTrend::Improving);
    assert!(analysis.stability < 1.0);

    let analysis = analyze_frame(&frame_snapshot(20.0, 20.0, 60.0));
    assert_eq!(analysis.assessment, Assessment::Poor);
    assert_eq!(analysis.trend, SeriesTrend::InsufficientData);
}

#[test]
fn test_memory_sub_analysis() {
    let mut memory = memory_snapshot(0.9);
    memory.trends.growth_rate = 2000.0;
    let analysis = analyze_memory(&memory);
    assert_eq!(analysis.leak_risk, RiskLevel::High);
    assert_eq!(analysis.notes.len(), 2);
    assert_eq!(analysis.gc_efficiency, 1.0);

    let analysis = analyze_memory(&memory_snapshot(0.3));
    assert_eq!(analysis.leak_risk, RiskLevel::Low);
    assert!(analysis.notes.is_empty());
}

#[test]
fn test_render_and_interaction_sub_analysis() {
    let analysis = analyze_render(&render_snapshot(10.0, 5.0, 20.0));
    assert!((analysis.render_efficiency - 0.525).abs() < 1e-9);
    assert!(analysis.bottlenecks.is_empty());
    assert_eq!(analysis.paint_frequency, 4);

    let analysis = analyze_render(&render_snapshot(40.0, 5.0, 150.0));
    assert_eq!(analysis.bottlenecks.len(), 2);

    assert_eq!(
        analyze_interaction(&interaction_snapshot(10.0)).responsiveness,
        Assessment::Excellent
    );
    assert_eq!(
        analyze_interaction(&interaction_snapshot(75.0)).responsiveness,
        Assessment::Acceptable
    );
}

#[test]
fn test_network_sub_analysis() {
    let mut network = network_snapshot(300.0, 80.0);
    network.timing.average_dns = 150.0;
    let analysis = analyze_network(&network);
    assert_eq!(analysis.total_requests, 4);
    assert_eq!(analysis.average_latency, 300.0);
    assert_eq!(analysis.bottlenecks, vec!["Slow DNS resolution".to_string()]);
    assert!((analysis.network_efficiency - 80.0 / 230.0).abs() < 1e-9);
}

#[test]
fn test_resource_sub_analysis() {
    let snapshot = ResourceSnapshot {
        current: ResourceSample {
            timestamp: 0.0,
            dom: DomCounts {
                nodes: 6000,
                images: 10,
                scripts: 4,
                stylesheets: 2,
            },
            storage: StorageUsage {
                local_bytes: 1024,
                session_bytes: 0,
            },
        },
        trends: ResourceTrends {
            dom_growth: 200,
            storage_growth: 0,
        },
        history: Vec::new(),
    };
    let analysis = analyze_resource(&snapshot);
    assert_eq!(analysis.dom_complexity, 6000);
    assert_eq!(analysis.resource_health.status, ResourceStatus::Critical);
    assert_eq!(analysis.resource_health.issues.len(), 2);
}

fn custom_summary(values: &[f64]) -> CustomMetricSummary {
    let recent: Vec<CustomSample> = values
        .iter()
        .enumerate()
        .map(|(i, &value)| CustomSample {
            timestamp: i as f64,
            name: "load".to_string(),
            value,
            metadata: Default::default(),
        })
        .collect();
    CustomMetricSummary {
        current: values.last().copied().unwrap_or(0.0),
        count: values.len(),
        recent,
        statistics: CustomStatistics::default(),
    }
}

#[test]
fn test_custom_sub_analysis() {
    let mut snapshot = CustomSnapshot::new();
    snapshot.insert("flat".to_string(), custom_summary(&[10.0, 10.0, 10.0]));
    snapshot.insert("rising".to_string(), custom_summary(&[10.0, 20.0]));
    let analysis = analyze_custom(&snapshot);

    assert_eq!(analysis["flat"].trend, ValueTrend::Stable);
    assert_eq!(analysis["flat"].alert_level, VariabilityLevel::Stable);
    assert_eq!(analysis["rising"].trend, ValueTrend::Increasing);
    assert_eq!(analysis["rising"].alert_level, VariabilityLevel::ModerateVariability);
    assert_eq!(analysis["rising"].current, 20.0);
}

#[test]
fn test_history_is_bounded() {
    let mut analyzer = PerformanceAnalyzer::new(&AnalyzerConfig {
        history_size: 3,
        ..AnalyzerConfig::default()
    });
    for minute in 0..5 {
        analyzer.analyze_metrics_at(&memory_only(0.5), at(minute));
    }
    let history = analyzer.analysis_history();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].timestamp, at(2));
    assert_eq!(analyzer.latest_analysis().unwrap().timestamp, at(4));
}

#[test]
fn test_trend_needs_two_analyses() {
    let mut analyzer = PerformanceAnalyzer::default();
    match analyzer.trend() {
        TrendReport::InsufficientData { retained, .. } => assert_eq!(retained, 0),
        other => panic!("unexpected trend {:?}", other),
    }

    analyzer.analyze_metrics_at(&memory_only(0.5), at(0));
    match analyzer.trend() {
        TrendReport::InsufficientData { message, retained } => {
            assert_eq!(retained, 1);
            assert!(message.contains("two analyses"));
        }
        other => panic!("unexpected trend {:?}", other),
    }
}

#[test]
fn test_improving_trend() {
    let mut analyzer = PerformanceAnalyzer::default();
    analyzer.analyze_metrics_at(&memory_only(0.5), at(0));
    analyzer.analyze_metrics_at(&memory_only(0.3), at(1));

    let report = analyzer.trend();
    let trend = report.analysis().unwrap();
    assert_eq!(trend.score_change.direction, ChangeDirection::Improvement);
    assert!((trend.score_change.value - 20.0).abs() < 1e-9);
    assert!((trend.score_change.percentage - 40.0).abs() < 1e-9);
    assert_eq!(trend.error_change.direction, ChangeDirection::Stable);
    assert_eq!(trend.overall_trend, OverallTrend::Improving);
    assert_eq!(trend.previous_timestamp, at(0));
    assert_eq!(trend.current_timestamp, at(1));
}

#[test]
fn test_declining_and_stable_trends() {
    let mut analyzer = PerformanceAnalyzer::default();
    let healthy = analyzer.analyze_metrics_at(&memory_only(0.3), at(0));
    let strained = analyzer.analyze_metrics_at(&memory_only(0.85), at(1));

    let declining = compare_analyses(&healthy, &strained);
    assert_eq!(declining.score_change.direction, ChangeDirection::Decline);
    assert_eq!(declining.error_change.direction, ChangeDirection::Decline);
    assert_eq!(declining.overall_trend, OverallTrend::Declining);

    let stable = compare_analyses(&healthy, &healthy);
    assert_eq!(stable.overall_trend, OverallTrend::Stable);
    assert_eq!(stable.score_change.direction, ChangeDirection::Stable);
}

#[test]
fn test_change_direction_noise_threshold() {
    assert_eq!(change_direction(100.5, 100.0), ChangeDirection::Stable);
    assert_eq!(change_direction(102.0, 100.0), ChangeDirection::Improvement);
    assert_eq!(change_direction(98.0, 100.0), ChangeDirection::Decline);
    assert_eq!(change_direction(1.0, 0.0), ChangeDirection::Improvement);
    assert_eq!(change_direction(0.0, 0.0), ChangeDirection::Stable);
}

#[test]
fn test_clear_history() {
    let mut analyzer = PerformanceAnalyzer::default();
    analyzer.analyze_metrics_at(&memory_only(0.5), at(0));
    analyzer.analyze_metrics_at(&memory_only(0.4), at(1));
    assert!(analyzer.trend().analysis().is_some());

    analyzer.clear_history();
    assert!(analyzer.latest_analysis().is_none());
    assert!(analyzer.trend().analysis().is_none());
}
