// Comparison of two successive analyses
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::analysis::PerformanceAnalysis;

/// Relative change below this counts as stable
pub const NOISE_THRESHOLD: f64 = 0.01;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChangeDirection {
    Improvement,
    Decline,
    Stable,
}

impl ChangeDirection {
    fn weight(self) -> i32 {
        match self {
            ChangeDirection::Improvement => 1,
            ChangeDirection::Decline => -1,
            ChangeDirection::Stable => 0,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OverallTrend {
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendChange {
    pub value: f64,
    pub direction: ChangeDirection,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysis {
    pub previous_timestamp: DateTime<Utc>,
    pub current_timestamp: DateTime<Utc>,
    pub score_change: TrendChange,
    pub error_change: TrendChange,
    pub warning_change: TrendChange,
    pub overall_trend: OverallTrend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrendReport {
    InsufficientData { message: String, retained: usize },
    Available(TrendAnalysis),
}

impl TrendReport {
    pub fn analysis(&self) -> Option<&TrendAnalysis> {
        match self {
            TrendReport::Available(trend) => Some(trend),
            TrendReport::InsufficientData { .. } => None,
        }
    }
}

/// Direction of a higher-is-better quantity moving from `previous` to `current`.
pub fn change_direction(current: f64, previous: f64) -> ChangeDirection {
    let base = if previous == 0.0 { 1.0 } else { previous.abs() };
    let change = (current - previous).abs() / base;
    if change < NOISE_THRESHOLD {
        ChangeDirection::Stable
    } else if current > previous {
        ChangeDirection::Improvement
    } else {
        ChangeDirection::Decline
    }
}

fn percentage(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (current - previous) / previous.abs() * 100.0
    }
}

fn higher_is_better(current: f64, previous: f64) -> TrendChange {
    TrendChange {
        value: current - previous,
        direction: change_direction(current, previous),
        percentage: percentage(current, previous),
    }
}

fn lower_is_better(current: f64, previous: f64) -> TrendChange {
    TrendChange {
        value: current - previous,
        direction: change_direction(previous, current),
        percentage: percentage(current, previous),
    }
}

/// Compare two analyses. Scores are compared on a 0-100 scale.
pub fn compare_analyses(
    previous: &PerformanceAnalysis,
    current: &PerformanceAnalysis,
) -> TrendAnalysis {
    let score_change = higher_is_better(current.overall.score * 100.0, previous.overall.score * 100.0);
    let error_change = lower_is_better(current.error_count() as f64, previous.error_count() as f64);
    let warning_change = lower_is_better(
        current.warning_count() as f64,
        previous.warning_count() as f64,
    );

    let weighted = score_change.direction.weight() * 3
        + error_change.direction.weight() * 2
        + warning_change.direction.weight();
    let overall_trend = if weighted > 2 {
        OverallTrend::Improving
    } else if weighted < -2 {
        OverallTrend::Declining
    } else {
        OverallTrend::Stable
    };

    TrendAnalysis {
        previous_timestamp: previous.timestamp,
        current_timestamp: current.timestamp,
        score_change,
        error_change,
        warning_change,
        overall_trend,
    }
}

/// Trend over the two most recent entries of `history` (oldest first).
pub fn analyze_trend(history: &[PerformanceAnalysis]) -> TrendReport {
    match history {
        [.., previous, current] => TrendReport::Available(compare_analyses(previous, current)),
        _ => TrendReport::InsufficientData {
            message: "At least two analyses are required for trend analysis".to_string(),
            retained: history.len(),
        },
    }
}
