// Heap usage collector, polled on a fixed interval
use serde::{Deserialize, Serialize};

use super::{Collector, IntervalTimer, MetricsCallback, SubscriptionId, Subscribers};
use crate::buffer::BoundedBuffer;
use crate::platform::MetricsSource;
use crate::samples::{MemorySample, MetricDomain, MetricSample};
use crate::stats;

/// A drop below this fraction of the previous reading counts as a GC
const GC_DROP_RATIO: f64 = 0.9;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryReading {
    pub used: f64,
    pub total: f64,
    pub pressure: f64,
    pub available: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryTrends {
    /// Bytes per second over the trailing window
    pub growth_rate: f64,
    pub peak_usage: f64,
    pub average_usage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GcStats {
    pub frequency: usize,
    pub total_reclaimed: f64,
    pub average_reclaimed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    pub current: MemoryReading,
    pub trends: MemoryTrends,
    pub gc: GcStats,
    pub history: Vec<MemorySample>,
}

pub struct MemoryCollector {
    history: BoundedBuffer<MemorySample>,
    window: usize,
    history_window: usize,
    timer: IntervalTimer,
    collecting: bool,
    subscribers: Subscribers,
}

impl MemoryCollector {
    pub fn new(capacity: usize, window: usize, history_window: usize, interval_ms: f64) -> Self {
        MemoryCollector {
            history: BoundedBuffer::new(capacity),
            window: window.max(1),
            history_window,
            timer: IntervalTimer::new(interval_ms),
            collecting: false,
            subscribers: Subscribers::new(),
        }
    }

    /// Advance the poll timer; samples once per elapsed interval.
    pub fn tick(&mut self, source: &dyn MetricsSource) -> Option<MemorySample> {
        if !self.collecting || !self.timer.fire(source.now()) {
            return None;
        }
        self.poll(source)
    }

    /// Take one reading immediately. `None` when the platform has no heap introspection.
    pub fn poll(&mut self, source: &dyn MetricsSource) -> Option<MemorySample> {
        if !self.collecting {
            return None;
        }
        let heap = source.heap_usage()?;

        let (gc_detected, gc_reclaimed) = match self.history.latest() {
            Some(previous) if heap.used < previous.used * GC_DROP_RATIO => {
                (true, previous.used - heap.used)
            }
            _ => (false, 0.0),
        };

        let sample = MemorySample {
            timestamp: source.now(),
            used: heap.used,
            total: heap.total,
            limit: heap.limit,
            pressure: if heap.limit > 0.0 { heap.used / heap.limit } else { 0.0 },
            available: (heap.limit - heap.used).max(0.0),
            gc_detected,
            gc_reclaimed,
        };
        if gc_detected {
            log::debug!("GC detected, {} bytes reclaimed", gc_reclaimed);
        }

        self.history.push(sample.clone());
        self.subscribers.notify(&MetricSample::Memory(sample.clone()));
        Some(sample)
    }
}

impl Collector for MemoryCollector {
    type Snapshot = MemorySnapshot;

    fn domain(&self) -> MetricDomain {
        MetricDomain::Memory
    }

    fn initialize(&mut self, source: &dyn MetricsSource) {
        if self.collecting {
            return;
        }
        self.collecting = true;
        self.timer.start(source.now());
        if source.heap_usage().is_none() {
            log::info!("Heap introspection unavailable, memory metrics disabled");
        } else {
            log::info!("Memory metrics collector initialized");
        }
    }

    fn get_metrics(&self) -> Option<MemorySnapshot> {
        let current = self.history.latest()?;
        let recent: Vec<&MemorySample> = self.history.trailing(self.window).collect();

        let first = recent[0];
        let time_span = current.timestamp - first.timestamp;
        let growth_rate = if time_span > 0.0 {
            (current.used - first.used) / time_span * 1000.0
        } else {
            0.0
        };

        let usage: Vec<f64> = recent.iter().map(|m| m.used).collect();
        let reclaimed: Vec<f64> = recent
            .iter()
            .filter(|m| m.gc_detected)
            .map(|m| m.gc_reclaimed)
            .collect();
        let total_reclaimed = stats::sum(&reclaimed);

        Some(MemorySnapshot {
            current: MemoryReading {
                used: current.used,
                total: current.total,
                pressure: current.pressure,
                available: current.available,
            },
            trends: MemoryTrends {
                growth_rate,
                peak_usage: stats::max(&usage),
                average_usage: stats::mean(&usage),
            },
            gc: GcStats {
                frequency: reclaimed.len(),
                total_reclaimed,
                average_reclaimed: stats::mean(&reclaimed),
            },
            history: self.history.trailing_vec(self.history_window),
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
