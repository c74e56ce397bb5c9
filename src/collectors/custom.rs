// Application-defined metrics: named series of values, counters and timings
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Collector, MetricsCallback, SubscriptionId, Subscribers};
use crate::buffer::KeyedRingTable;
use crate::platform::MetricsSource;
use crate::samples::{CustomSample, MetricDomain, MetricSample};
use crate::stats;

pub type Metadata = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomStatistics {
    pub min: f64,
    pub max: f64,
    pub average: f64,
    pub sum: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomMetricSummary {
    pub current: f64,
    /// Samples retained for this metric, not only the window
    pub count: usize,
    pub recent: Vec<CustomSample>,
    pub statistics: CustomStatistics,
}

/// Per-metric summaries keyed by metric name
pub type CustomSnapshot = BTreeMap<String, CustomMetricSummary>;

pub struct CustomCollector {
    metrics: KeyedRingTable<CustomSample>,
    window: usize,
    collecting: bool,
    subscribers: Subscribers,
}

impl CustomCollector {
    pub fn new(series_capacity: usize, window: usize) -> Self {
        CustomCollector {
            metrics: KeyedRingTable::new(series_capacity),
            window: window.max(1),
            collecting: false,
            subscribers: Subscribers::new(),
        }
    }

    pub fn record_metric(
        &mut self,
        name: &str,
        value: f64,
        metadata: Metadata,
        now: f64,
    ) -> Option<CustomSample> {
        if !self.collecting {
            return None;
        }
        let sample = CustomSample {
            timestamp: now,
            name: name.to_string(),
            value,
            metadata,
        };
        self.metrics.push(name, sample.clone());
        self.subscribers.notify(&MetricSample::Custom(sample.clone()));
        Some(sample)
    }

    /// Record `latest + amount` (starting from zero) as a counter value.
    pub fn increment_counter(
        &mut self,
        name: &str,
        amount: f64,
        mut metadata: Metadata,
        now: f64,
    ) -> Option<CustomSample> {
        let current = self.latest_value(name).unwrap_or(0.0);
        metadata.insert("type".to_string(), "counter".to_string());
        metadata.insert("increment".to_string(), amount.to_string());
        self.record_metric(name, current + amount, metadata, now)
    }

    /// Record `end - start` as a timing value.
    pub fn record_timing(
        &mut self,
        name: &str,
        start: f64,
        end: f64,
        mut metadata: Metadata,
        now: f64,
    ) -> Option<CustomSample> {
        metadata.insert("type".to_string(), "timing".to_string());
        metadata.insert("startTime".to_string(), start.to_string());
        metadata.insert("endTime".to_string(), end.to_string());
        self.record_metric(name, end - start, metadata, now)
    }

    pub fn latest_value(&self, name: &str) -> Option<f64> {
        self.metrics.get(name)?.latest().map(|sample| sample.value)
    }

    pub fn clear_metric(&mut self, name: &str) -> bool {
        self.metrics.remove(name)
    }

    pub fn clear_all_metrics(&mut self) {
        self.metrics.clear();
    }

    pub fn metric_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.metrics.iter().map(|(name, _)| name.to_string()).collect();
        names.sort();
        names
    }
}

impl Collector for CustomCollector {
    type Snapshot = CustomSnapshot;

    fn domain(&self) -> MetricDomain {
        MetricDomain::Custom
    }

    fn initialize(&mut self, _source: &dyn MetricsSource) {
        if self.collecting {
            return;
        }
        self.collecting = true;
        log::info!("Custom metrics collector initialized");
    }

    fn get_metrics(&self) -> Option<CustomSnapshot> {
        let mut snapshot = CustomSnapshot::new();
        for (name, series) in self.metrics.iter() {
            let recent = series.trailing_vec(self.window);
            let values: Vec<f64> = recent.iter().map(|m| m.value).collect();
            let current = match values.last() {
                Some(&value) => value,
                None => continue,
            };
            snapshot.insert(
                name.to_string(),
                CustomMetricSummary {
                    current,
                    count: series.len(),
                    recent,
                    statistics: CustomStatistics {
                        min: stats::min(&values),
                        max: stats::max(&values),
                        average: stats::mean(&values),
                        sum: stats::sum(&values),
                    },
                },
            );
        }
        if snapshot.is_empty() {
            None
        } else {
            Some(snapshot)
        }
    }

    fn on_metrics(&mut self, callback: MetricsCallback) -> SubscriptionId {
        self.subscribers.add(callback)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    fn stop(&mut self) {
        self.collecting = false;
        log::info!("Custom metrics collector stopped");
    }

    fn is_collecting(&self) -> bool {
        self.collecting
    }

    fn sample_count(&self) -> usize {
        self.metrics.iter().map(|(_, series)| series.len()).sum()
    }
}
