// Input responsiveness collector
//
// Response time is measured from the raw input event to the next rendering
// opportunity (the next animation frame), not the handler's own run time.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Collector, MetricsCallback, SubscriptionId, Subscribers};
use crate::buffer::BoundedBuffer;
use crate::platform::MetricsSource;
use crate::samples::{Coordinates, InteractionKind, InteractionSample, MetricDomain, MetricSample};
use crate::stats;

/// Interactions slower than this (ms) flag the window as slow
pub const SLOW_INTERACTION_MS: f64 = 100.0;

/// An input event as seen by a passive listener
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInteraction {
    pub kind: InteractionKind,
    pub target_kind: String,
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionTypeStats {
    pub count: usize,
    pub total_response_time: f64,
    pub average_response_time: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionSummary {
    pub total_interactions: usize,
    pub average_response_time: f64,
    pub max_response_time: f64,
    pub min_response_time: f64,
    pub by_type: BTreeMap<InteractionKind, InteractionTypeStats>,
    pub slow_interactions: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionSnapshot {
    pub recent: Vec<InteractionSample>,
    pub summary: InteractionSummary,
}

pub struct InteractionCollector {
    history: BoundedBuffer<InteractionSample>,
    pending: BoundedBuffer<(RawInteraction, f64)>,
    window: usize,
    recent_window: usize,
    collecting: bool,
    subscribers: Subscribers,
}

impl InteractionCollector {
    pub fn new(capacity: usize, window: usize, recent_window: usize) -> Self {
        InteractionCollector {
            history: BoundedBuffer::new(capacity),
            pending: BoundedBuffer::new(capacity),
            window: window.max(1),
            recent_window,
            collecting: false,
            subscribers: Subscribers::new(),
        }
    }

    /// Note an input event at `now`; it is resolved on the next frame.
    pub fn record_event(&mut self, event: RawInteraction, now: f64) {
        if !self.collecting {
            return;
        }
        self.pending.push((event, now));
    }

    /// Resolve every pending event against this rendering opportunity.
    pub fn on_animation_frame(&mut self, now: f64) -> Vec<InteractionSample> {
        if self.pending.is_empty() {
            return Vec::new();
        }
        let pending: Vec<(RawInteraction, f64)> = self.pending.iter().cloned().collect();
        self.pending.clear();

        let mut resolved = Vec::with_capacity(pending.len());
        for (event, started) in pending {
            let sample = InteractionSample {
                timestamp: started,
                event_type: event.kind,
                target_kind: event.target_kind,
                response_time: (now - started).max(0.0),
                coordinates: event.coordinates,
            };
            self.history.push(sample.clone());
            self.subscribers
                .notify(&MetricSample::Interaction(sample.clone()));
            resolved.push(sample);
        }
        resolved
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Collector for InteractionCollector {
    type Snapshot = InteractionSnapshot;

    fn domain(&self) -> MetricDomain {
        MetricDomain::Interaction
    }

    fn initialize(&mut self, _source: &dyn MetricsSource) {
        if self.collecting {
            return;
        }
        self.collecting = true;
        log::info!("User interaction collector initialized");
    }

    fn get_metrics(&self) -> Option<InteractionSnapshot> {
        if self.history.is_empty() {
            return None;
        }
        let recent: Vec<&InteractionSample> = self.history.trailing(self.window).collect();
        let responses: Vec<f64> = recent.iter().map(|i| i.response_time).collect();

        let mut by_type: BTreeMap<InteractionKind, InteractionTypeStats> = BTreeMap::new();
        for interaction in &recent {
            let entry = by_type.entry(interaction.event_type).or_default();
            entry.count += 1;
            entry.total_response_time += interaction.response_time;
        }
        for entry in by_type.values_mut() {
            entry.average_response_time = entry.total_response_time / entry.count as f64;
        }

        let max_response_time = stats::max(&responses);
        let skip = recent.len().saturating_sub(self.recent_window);
        Some(InteractionSnapshot {
            recent: recent[skip..].iter().map(|i| (*i).clone()).collect(),
            summary: InteractionSummary {
                total_interactions: recent.len(),
                average_response_time: stats::mean(&responses),
                max_response_time,
                min_response_time: stats::min(&responses),
                by_type,
                slow_interactions: max_response_time > SLOW_INTERACTION_MS,
            },
        })
    }

    fn on_metrics(&mut self, callback: MetricsCallback) -> SubscriptionId {
        self.subscribers.add(callback)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    /// Events already queued still resolve on the next frame.
    fn stop(&mut self) {
        self.collecting = false;
    }

    fn is_collecting(&self) -> bool {
        self.collecting
    }

    fn sample_count(&self) -> usize {
        self.history.len()
    }
}
