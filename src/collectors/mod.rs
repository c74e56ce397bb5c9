//! Metric collectors.
//!
//! Every collector owns one bounded buffer and is fed by one of three inputs:
//! the per-frame callback, an interval timer, or passive observation. All
//! inputs run to completion on the host's event loop, so buffers need no
//! locking. Snapshots are computed on demand from the trailing window.

pub mod custom;
pub mod frame;
pub mod interaction;
pub mod memory;
pub mod network;
pub mod render;
pub mod resource;

pub use custom::{CustomCollector, CustomMetricSummary, CustomSnapshot, CustomStatistics};
pub use frame::{FrameCollector, FrameReading, FrameSnapshot, JankStats};
pub use interaction::{
    InteractionCollector, InteractionSnapshot, InteractionSummary, InteractionTypeStats,
    RawInteraction,
};
pub use memory::{GcStats, MemoryCollector, MemoryReading, MemorySnapshot, MemoryTrends};
pub use network::{NetworkCollector, NetworkSnapshot, NetworkSummary, PhaseAverages, TypeAggregate};
pub use render::{RenderCollector, RenderSnapshot, RenderStatistics};
pub use resource::{ResourceCollector, ResourceSnapshot, ResourceTrends};

use std::error::Error;
use std::panic::{self, AssertUnwindSafe};

use crate::error::TelemetryError;
use crate::platform::MetricsSource;
use crate::samples::{MetricDomain, MetricSample};

pub type CallbackResult = Result<(), Box<dyn Error>>;

/// Push subscription callback, receives every new sample of a collector
pub type MetricsCallback = Box<dyn FnMut(MetricDomain, &MetricSample) -> CallbackResult>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Shared contract of the seven collectors
pub trait Collector {
    type Snapshot;

    fn domain(&self) -> MetricDomain;

    /// Begin sampling. Calling it again while collecting does nothing.
    fn initialize(&mut self, source: &dyn MetricsSource);

    /// Snapshot of the trailing window, `None` until a sample exists
    fn get_metrics(&self) -> Option<Self::Snapshot>;

    fn on_metrics(&mut self, callback: MetricsCallback) -> SubscriptionId;

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;

    /// Halt future sampling; retained samples stay readable.
    fn stop(&mut self);

    fn is_collecting(&self) -> bool;

    fn sample_count(&self) -> usize;
}

/// Subscriber list with per-callback fault isolation
#[derive(Default)]
pub struct Subscribers {
    callbacks: Vec<(SubscriptionId, MetricsCallback)>,
    next_id: u64,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, callback: MetricsCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, callback));
        id
    }

    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(existing, _)| *existing != id);
        self.callbacks.len() != before
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Deliver a sample to every subscriber. Errors and panics are logged and
    /// counted; they never reach the collector or skip later subscribers.
    pub fn notify(&mut self, sample: &MetricSample) -> usize {
        let domain = sample.domain();
        let mut failures = 0;
        for (id, callback) in self.callbacks.iter_mut() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| callback(domain, sample)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failures += 1;
                    let fault = TelemetryError::SubscriberFault {
                        domain: domain.to_string(),
                        reason: format!("callback {:?} returned an error: {}", id, e),
                    };
                    log::error!("{}", fault);
                }
                Err(_) => {
                    failures += 1;
                    let fault = TelemetryError::SubscriberFault {
                        domain: domain.to_string(),
                        reason: format!("callback {:?} panicked", id),
                    };
                    log::error!("{}", fault);
                }
            }
        }
        failures
    }
}

/// Shortest poll interval a timer accepts.
pub const MIN_INTERVAL_MS: f64 = 1.0;

/// Fixed-interval timer driven by the host clock.
///
/// Missed periods are skipped rather than replayed, so a stalled host
/// produces one sample on resume, not a burst.
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    interval_ms: f64,
    next_due: Option<f64>,
}

impl IntervalTimer {
    pub fn new(interval_ms: f64) -> Self {
        IntervalTimer {
            interval_ms: interval_ms.max(MIN_INTERVAL_MS),
            next_due: None,
        }
    }

    pub fn start(&mut self, now: f64) {
        if self.next_due.is_none() {
            self.next_due = Some(now + self.interval_ms);
        }
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Returns true when a period elapsed since the last firing.
    pub fn fire(&mut self, now: f64) -> bool {
        let due = match self.next_due {
            Some(due) if now >= due => due,
            _ => return false,
        };
        let periods = ((now - due) / self.interval_ms).floor() + 1.0;
        let mut next = due + periods * self.interval_ms;
        if next <= now {
            next = now + self.interval_ms;
        }
        self.next_due = Some(next);
        true
    }
}
