// Network collector: passively observed resource loads
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Collector, MetricsCallback, SubscriptionId, Subscribers};
use crate::buffer::BoundedBuffer;
use crate::platform::{MetricsSource, ResourceTiming};
use crate::samples::{MetricDomain, MetricSample, NetworkSample, PhaseTiming, ResourceType};
use crate::stats;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeAggregate {
    pub count: usize,
    pub total_size: f64,
    pub total_time: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSummary {
    pub total_requests: usize,
    pub total_transfer: f64,
    pub average_duration: f64,
    pub by_type: BTreeMap<ResourceType, TypeAggregate>,
}

/// Trailing averages of each load phase, in milliseconds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseAverages {
    pub average_dns: f64,
    pub average_tcp: f64,
    pub average_ssl: f64,
    pub average_request: f64,
    pub average_response: f64,
    pub average_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub recent: Vec<NetworkSample>,
    pub summary: NetworkSummary,
    pub timing: PhaseAverages,
}

impl PhaseTiming {
    pub fn from_resource(entry: &ResourceTiming) -> Self {
        PhaseTiming {
            dns: entry.domain_lookup_end - entry.domain_lookup_start,
            tcp: entry.connect_end - entry.connect_start,
            ssl: if entry.secure_connection_start > 0.0 {
                entry.connect_end - entry.secure_connection_start
            } else {
                0.0
            },
            request: entry.response_start - entry.request_start,
            response: entry.response_end - entry.response_start,
            total: entry.response_end - entry.start_time,
        }
    }
}

pub struct NetworkCollector {
    history: BoundedBuffer<NetworkSample>,
    window: usize,
    recent_window: usize,
    observing: bool,
    collecting: bool,
    subscribers: Subscribers,
}

impl NetworkCollector {
    pub fn new(capacity: usize, window: usize, recent_window: usize) -> Self {
        NetworkCollector {
            history: BoundedBuffer::new(capacity),
            window: window.max(1),
            recent_window,
            observing: false,
            collecting: false,
            subscribers: Subscribers::new(),
        }
    }

    /// Feed one completed resource load.
    pub fn observe_resource(&mut self, entry: &ResourceTiming, now: f64) -> Option<NetworkSample> {
        if !self.collecting || !self.observing {
            return None;
        }
        let sample = NetworkSample {
            timestamp: now,
            name: entry.name.clone(),
            resource_type: ResourceType::from_url(&entry.name),
            start_time: entry.start_time,
            duration: entry.duration,
            transfer_size: entry.transfer_size.max(0.0),
            timing: PhaseTiming::from_resource(entry),
        };
        self.history.push(sample.clone());
        self.subscribers.notify(&MetricSample::Network(sample.clone()));
        Some(sample)
    }

    pub fn is_observing(&self) -> bool {
        self.observing
    }
}

impl Collector for NetworkCollector {
    type Snapshot = NetworkSnapshot;

    fn domain(&self) -> MetricDomain {
        MetricDomain::Network
    }

    fn initialize(&mut self, source: &dyn MetricsSource) {
        if self.collecting {
            return;
        }
        self.collecting = true;
        self.observing = source.supports_observation();
        if !self.observing {
            log::warn!("Resource observation unavailable, network metrics disabled");
        }
        log::info!("Network metrics collector initialized");
    }

    fn get_metrics(&self) -> Option<NetworkSnapshot> {
        if self.history.is_empty() {
            return None;
        }
        let recent: Vec<&NetworkSample> = self.history.trailing(self.window).collect();

        let mut by_type: BTreeMap<ResourceType, TypeAggregate> = BTreeMap::new();
        for entry in &recent {
            let aggregate = by_type.entry(entry.resource_type).or_default();
            aggregate.count += 1;
            aggregate.total_size += entry.transfer_size;
            aggregate.total_time += entry.duration;
        }

        let phase = |pick: fn(&PhaseTiming) -> f64| {
            let values: Vec<f64> = recent.iter().map(|n| pick(&n.timing)).collect();
            stats::mean(&values)
        };
        let durations: Vec<f64> = recent.iter().map(|n| n.duration).collect();
        let transfers: Vec<f64> = recent.iter().map(|n| n.transfer_size).collect();

        let skip = recent.len().saturating_sub(self.recent_window);
        Some(NetworkSnapshot {
            recent: recent[skip..].iter().map(|n| (*n).clone()).collect(),
            summary: NetworkSummary {
                total_requests: recent.len(),
                total_transfer: stats::sum(&transfers),
                average_duration: stats::mean(&durations),
                by_type,
            },
            timing: PhaseAverages {
                average_dns: phase(|t| t.dns),
                average_tcp: phase(|t| t.tcp),
                average_ssl: phase(|t| t.ssl),
                average_request: phase(|t| t.request),
                average_response: phase(|t| t.response),
                average_total: phase(|t| t.total),
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
    }

    fn is_collecting(&self) -> bool {
        self.collecting
    }

    fn sample_count(&self) -> usize {
        self.history.len()
    }
}
