// DOM and storage footprint collector, polled on a fixed interval
use serde::{Deserialize, Serialize};

use super::{Collector, IntervalTimer, MetricsCallback, SubscriptionId, Subscribers};
use crate::buffer::BoundedBuffer;
use crate::platform::MetricsSource;
use crate::samples::{MetricDomain, MetricSample, ResourceSample};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTrends {
    /// Node count change versus the oldest sample in the window
    pub dom_growth: i64,
    /// Local storage byte change versus the oldest sample in the window
    pub storage_growth: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub current: ResourceSample,
    pub trends: ResourceTrends,
    pub history: Vec<ResourceSample>,
}

pub struct ResourceCollector {
    history: BoundedBuffer<ResourceSample>,
    window: usize,
    timer: IntervalTimer,
    collecting: bool,
    subscribers: Subscribers,
}

impl ResourceCollector {
    pub fn new(capacity: usize, window: usize, interval_ms: f64) -> Self {
        ResourceCollector {
            history: BoundedBuffer::new(capacity),
            window: window.max(1),
            timer: IntervalTimer::new(interval_ms),
            collecting: false,
            subscribers: Subscribers::new(),
        }
    }

    pub fn tick(&mut self, source: &dyn MetricsSource) -> Option<ResourceSample> {
        if !self.collecting || !self.timer.fire(source.now()) {
            return None;
        }
        self.poll(source)
    }

    /// Take one reading now. `None` when neither DOM nor storage can be queried.
    pub fn poll(&mut self, source: &dyn MetricsSource) -> Option<ResourceSample> {
        if !self.collecting {
            return None;
        }
        let dom = source.dom_counts();
        let storage = source.storage_usage();
        if dom.is_none() && storage.is_none() {
            return None;
        }

        let sample = ResourceSample {
            timestamp: source.now(),
            dom: dom.unwrap_or_default(),
            storage: storage.unwrap_or_default(),
        };
        self.history.push(sample.clone());
        self.subscribers.notify(&MetricSample::Resource(sample.clone()));
        Some(sample)
    }
}

impl Collector for ResourceCollector {
    type Snapshot = ResourceSnapshot;

    fn domain(&self) -> MetricDomain {
        MetricDomain::Resource
    }

    fn initialize(&mut self, source: &dyn MetricsSource) {
        if self.collecting {
            return;
        }
        self.collecting = true;
        self.timer.start(source.now());
        log::info!("Resource metrics collector initialized");
    }

    fn get_metrics(&self) -> Option<ResourceSnapshot> {
        let current = self.history.latest()?;
        let history = self.history.trailing_vec(self.window);
        let oldest = &history[0];

        let trends = if history.len() > 1 {
            ResourceTrends {
                dom_growth: current.dom.nodes as i64 - oldest.dom.nodes as i64,
                storage_growth: current.storage.local_bytes as i64
                    - oldest.storage.local_bytes as i64,
            }
        } else {
            ResourceTrends::default()
        };

        Some(ResourceSnapshot {
            current: current.clone(),
            trends,
            history,
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
        self.timer.stop();
    }

    fn is_collecting(&self) -> bool {
        self.collecting
    }

    fn sample_count(&self) -> usize {
        self.history.len()
    }
}
