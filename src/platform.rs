//! Platform capabilities consumed by the collectors.
//!
//! Only the clock is required. Heap introspection, DOM queries, storage size
//! estimation and passive observation are optional; a source that lacks one
//! simply returns `None` and the matching collector reports no data.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

use crate::samples::{DomCounts, StorageUsage};

/// Heap figures in bytes, as reported by the runtime
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeapUsage {
    pub used: f64,
    pub total: f64,
    pub limit: f64,
}

/// A paint or measure entry delivered by a passive observer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservedEntry {
    pub entry_type: String,
    pub name: String,
    pub start_time: f64,
    pub duration: f64,
}

/// Resource-load timing delivered by a passive observer (milliseconds
/// relative to the time origin; zero when the phase did not happen)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTiming {
    pub name: String,
    pub start_time: f64,
    pub duration: f64,
    pub transfer_size: f64,
    pub domain_lookup_start: f64,
    pub domain_lookup_end: f64,
    pub connect_start: f64,
    pub connect_end: f64,
    pub secure_connection_start: f64,
    pub request_start: f64,
    pub response_start: f64,
    pub response_end: f64,
}

/// Source of platform readings for the collectors
pub trait MetricsSource {
    /// Monotonic clock in milliseconds
    fn now(&self) -> f64;

    fn heap_usage(&self) -> Option<HeapUsage> {
        None
    }

    fn dom_counts(&self) -> Option<DomCounts> {
        None
    }

    fn storage_usage(&self) -> Option<StorageUsage> {
        None
    }

    /// Whether paint/measure/resource entries will be delivered passively
    fn supports_observation(&self) -> bool {
        false
    }
}

#[derive(Debug, Default)]
struct ManualState {
    now: f64,
    heap: Option<HeapUsage>,
    dom: Option<DomCounts>,
    storage: Option<StorageUsage>,
    observation: bool,
}

/// Source whose readings are set by the host.
///
/// Native game loops and tests use it to feed the monitor. Clones share the
/// same state, so the host keeps one handle while the monitor owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualSource {
    state: Rc<RefCell<ManualState>>,
}

impl ManualSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_now(&self, now: f64) {
        self.state.borrow_mut().now = now;
    }

    pub fn advance(&self, delta_ms: f64) -> f64 {
        let mut state = self.state.borrow_mut();
        state.now += delta_ms;
        state.now
    }

    pub fn set_heap_usage(&self, heap: Option<HeapUsage>) {
        self.state.borrow_mut().heap = heap;
    }

    pub fn set_dom_counts(&self, dom: Option<DomCounts>) {
        self.state.borrow_mut().dom = dom;
    }

    pub fn set_storage_usage(&self, storage: Option<StorageUsage>) {
        self.state.borrow_mut().storage = storage;
    }

    pub fn set_observation(&self, supported: bool) {
        self.state.borrow_mut().observation = supported;
    }
}

impl MetricsSource for ManualSource {
    fn now(&self) -> f64 {
        self.state.borrow().now
    }

    fn heap_usage(&self) -> Option<HeapUsage> {
        self.state.borrow().heap
    }

    fn dom_counts(&self) -> Option<DomCounts> {
        self.state.borrow().dom.clone()
    }

    fn storage_usage(&self) -> Option<StorageUsage> {
        self.state.borrow().storage.clone()
    }

    fn supports_observation(&self) -> bool {
        self.state.borrow().observation
    }
}
