// Render timing collector: passive paint/measure entries plus explicit marks
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Collector, MetricsCallback, SubscriptionId, Subscribers};
use crate::buffer::BoundedBuffer;
use crate::platform::{MetricsSource, ObservedEntry};
use crate::samples::{MetricDomain, MetricSample, RenderKind, RenderSample};
use crate::stats;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderStatistics {
    pub total_renders: usize,
    pub paint_events: usize,
    pub measure_events: usize,
    pub custom_measures: usize,
    pub average_duration: f64,
    pub max_duration: f64,
    pub min_duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    pub recent: Vec<RenderSample>,
    pub statistics: RenderStatistics,
}

pub struct RenderCollector {
    history: BoundedBuffer<RenderSample>,
    window: usize,
    recent_window: usize,
    open_marks: HashMap<String, f64>,
    observing: bool,
    collecting: bool,
    subscribers: Subscribers,
}

impl RenderCollector {
    pub fn new(capacity: usize, window: usize, recent_window: usize) -> Self {
        RenderCollector {
            history: BoundedBuffer::new(capacity),
            window: window.max(1),
            recent_window,
            open_marks: HashMap::new(),
            observing: false,
            collecting: false,
            subscribers: Subscribers::new(),
        }
    }

    /// Feed one passively observed entry. Only `paint` and `measure` entries are kept.
    pub fn observe_entry(&mut self, entry: &ObservedEntry, now: f64) -> Option<RenderSample> {
        if !self.collecting || !self.observing {
            return None;
        }
        let kind = match entry.entry_type.as_str() {
            "paint" => RenderKind::Paint,
            "measure" => RenderKind::Measure,
            _ => return None,
        };
        let sample = RenderSample {
            timestamp: now,
            kind,
            name: entry.name.clone(),
            start_time: entry.start_time,
            duration: entry.duration,
        };
        Some(self.record(sample))
    }

    /// Open a custom-instrumented section. Re-marking a label restarts it.
    pub fn mark_start(&mut self, label: &str, now: f64) {
        if !self.collecting {
            return;
        }
        self.open_marks.insert(label.to_string(), now);
    }

    /// Close a section opened with `mark_start`; ignored without a matching start.
    pub fn mark_end(&mut self, label: &str, now: f64) -> Option<RenderSample> {
        let start = self.open_marks.remove(label)?;
        if !self.collecting {
            return None;
        }
        let sample = RenderSample {
            timestamp: now,
            kind: RenderKind::Custom,
            name: label.to_string(),
            start_time: start,
            duration: (now - start).max(0.0),
        };
        Some(self.record(sample))
    }

    pub fn is_observing(&self) -> bool {
        self.observing
    }

    fn record(&mut self, sample: RenderSample) -> RenderSample {
        self.history.push(sample.clone());
        self.subscribers.notify(&MetricSample::Render(sample.clone()));
        sample
    }
}

impl Collector for RenderCollector {
    type Snapshot = RenderSnapshot;

    fn domain(&self) -> MetricDomain {
        MetricDomain::Render
    }

    fn initialize(&mut self, source: &dyn MetricsSource) {
        if self.collecting {
            return;
        }
        self.collecting = true;
        self.observing = source.supports_observation();
        if !self.observing {
            log::warn!("Paint observation unavailable, only explicit render marks are recorded");
        }
        log::info!("Render metrics collector initialized");
    }

    fn get_metrics(&self) -> Option<RenderSnapshot> {
        if self.history.is_empty() {
            return None;
        }
        let recent: Vec<&RenderSample> = self.history.trailing(self.window).collect();
        let durations: Vec<f64> = recent.iter().map(|r| r.duration).collect();
        let count_of = |kind: RenderKind| recent.iter().filter(|r| r.kind == kind).count();

        let skip = recent.len().saturating_sub(self.recent_window);
        Some(RenderSnapshot {
            recent: recent[skip..].iter().map(|r| (*r).clone()).collect(),
            statistics: RenderStatistics {
                total_renders: recent.len(),
                paint_events: count_of(RenderKind::Paint),
                measure_events: count_of(RenderKind::Measure),
                custom_measures: count_of(RenderKind::Custom),
                average_duration: stats::mean(&durations),
                max_duration: stats::max(&durations),
                min_duration: stats::min(&durations),
            },
        })
    }

    fn on_metrics(&mut self, callback: MetricsCallback) -> SubscriptionId {
        self.subscribers.add(callback)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    fn stop(&mut self) {
        self.collecting = false;
        self.observing = false;
        self.open_marks.clear();
    }

    fn is_collecting(&self) -> bool {
        self.collecting
    }

    fn sample_count(&self) -> usize {
        self.history.len()
    }
}
