// Browser binding: drives the monitor from the page's event loop
use js_sys::{Array, Object, Reflect};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    AddEventListenerOptions, Blob, BlobPropertyBag, Document, Element, Event, HtmlAnchorElement,
    MouseEvent, Performance, PerformanceEntry, PerformanceObserver, PerformanceObserverEntryList,
    PerformanceObserverInit, PerformanceResourceTiming, Storage, TouchEvent, Url, Window,
};

use crate::collectors::custom::Metadata;
use crate::collectors::RawInteraction;
use crate::config::TelemetryConfig;
use crate::error::{Result, TelemetryError};
use crate::error_traits::{log_fault, JsResult, ToJsResult};
use crate::export::{resolve_filename, ExportSummary, LogExporter, ReportExporter};
use crate::performance_monitor::PerformanceMonitor;
use crate::platform::{HeapUsage, MetricsSource, ObservedEntry, ResourceTiming};
use crate::reporter::{ReportFormat, ReportOptions};
use crate::samples::{Coordinates, DomCounts, InteractionKind, StorageUsage};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);

    #[wasm_bindgen(js_namespace = console)]
    fn error(s: &str);
}

macro_rules! console_log {
    ($($t:tt)*) => (log(&format_args!($($t)*).to_string()))
}

macro_rules! console_error {
    ($($t:tt)*) => (error(&format_args!($($t)*).to_string()))
}

const OBSERVED_ENTRY_TYPES: [&str; 3] = ["paint", "measure", "resource"];
const INTERACTION_EVENTS: [&str; 4] = ["click", "keydown", "scroll", "touchstart"];

/// Route `log` records to the browser console.
#[wasm_bindgen]
pub fn init_logging() {
    wasm_logger::init(wasm_logger::Config::new(log::Level::Info));
}

fn js_number(target: &JsValue, key: &str) -> Option<f64> {
    Reflect::get(target, &JsValue::from_str(key)).ok()?.as_f64()
}

/// Platform readings from `performance`, `document` and web storage
pub struct BrowserSource {
    window: Window,
    performance: Performance,
}

impl BrowserSource {
    pub fn new() -> Result<Self> {
        let window = web_sys::window()
            .ok_or(TelemetryError::CapabilityUnavailable("window"))?;
        let performance = window
            .performance()
            .ok_or(TelemetryError::CapabilityUnavailable("performance"))?;
        Ok(BrowserSource {
            window,
            performance,
        })
    }

    fn document(&self) -> Option<Document> {
        self.window.document()
    }

    fn storage_size(storage: Option<Storage>) -> u64 {
        let storage = match storage {
            Some(storage) => storage,
            None => return 0,
        };
        let length = storage.length().unwrap_or(0);
        let mut size = 0u64;
        for index in 0..length {
            if let Ok(Some(key)) = storage.key(index) {
                let value = storage.get_item(&key).ok().flatten().unwrap_or_default();
                size += (key.encode_utf16().count() + value.encode_utf16().count()) as u64;
            }
        }
        size
    }
}

impl MetricsSource for BrowserSource {
    fn now(&self) -> f64 {
        self.performance.now()
    }

    fn heap_usage(&self) -> Option<HeapUsage> {
        let memory = Reflect::get(&self.performance, &JsValue::from_str("memory")).ok()?;
        if memory.is_undefined() || memory.is_null() {
            return None;
        }
        Some(HeapUsage {
            used: js_number(&memory, "usedJSHeapSize")?,
            total: js_number(&memory, "totalJSHeapSize")?,
            limit: js_number(&memory, "jsHeapSizeLimit")?,
        })
    }

    fn dom_counts(&self) -> Option<DomCounts> {
        let document = self.document()?;
        Some(DomCounts {
            nodes: document.get_elements_by_tag_name("*").length() as u64,
            images: document.images().length() as u64,
            scripts: document.scripts().length() as u64,
            stylesheets: document.style_sheets().length() as u64,
        })
    }

    fn storage_usage(&self) -> Option<StorageUsage> {
        let local = self.window.local_storage().ok()?;
        let session = self.window.session_storage().ok().flatten();
        Some(StorageUsage {
            local_bytes: Self::storage_size(local),
            session_bytes: Self::storage_size(session),
        })
    }

    fn supports_observation(&self) -> bool {
        Reflect::has(&self.window, &JsValue::from_str("PerformanceObserver")).unwrap_or(false)
    }
}

/// Saves reports through a temporary object URL and a download link
pub struct BrowserDownloadExporter {
    document: Document,
}

impl BrowserDownloadExporter {
    pub fn new(document: Document) -> Self {
        BrowserDownloadExporter { document }
    }

    fn download(
        &self,
        content: &str,
        format: ReportFormat,
        filename: &str,
    ) -> std::result::Result<(), JsValue> {
        let parts = Array::of1(&JsValue::from_str(content));
        let options = Object::new();
        Reflect::set(&options, &"type".into(), &format.mime_type().into())?;
        let blob = Blob::new_with_str_sequence_and_options(
            &parts,
            options.unchecked_ref::<BlobPropertyBag>(),
        )?;
        let url = Url::create_object_url_with_blob(&blob)?;

        let anchor: HtmlAnchorElement = self.document.create_element("a")?.dyn_into()?;
        anchor.set_href(&url);
        anchor.set_download(filename);
        anchor.click();
        Url::revoke_object_url(&url)
    }
}

impl ReportExporter for BrowserDownloadExporter {
    fn export_report(
        &mut self,
        content: &str,
        format: ReportFormat,
        filename: Option<&str>,
    ) -> Result<ExportSummary> {
        let filename = resolve_filename(filename, format);
        self.download(content, format, &filename)
            .map_err(|e| TelemetryError::ExportError {
                filename: filename.clone(),
                reason: format!("{:?}", e),
            })?;
        Ok(ExportSummary {
            size: content.len(),
            filename,
            format,
        })
    }
}

type SharedMonitor = Rc<RefCell<PerformanceMonitor<BrowserSource>>>;

fn with_monitor(monitor: &SharedMonitor, f: impl FnOnce(&mut PerformanceMonitor<BrowserSource>)) {
    match monitor.try_borrow_mut() {
        Ok(mut monitor) => f(&mut monitor),
        Err(_) => log::warn!("Monitor busy, dropping callback"),
    }
}

fn resource_timing(entry: &PerformanceResourceTiming) -> ResourceTiming {
    ResourceTiming {
        name: entry.name(),
        start_time: entry.start_time(),
        duration: entry.duration(),
        transfer_size: entry.transfer_size(),
        domain_lookup_start: entry.domain_lookup_start(),
        domain_lookup_end: entry.domain_lookup_end(),
        connect_start: entry.connect_start(),
        connect_end: entry.connect_end(),
        secure_connection_start: entry.secure_connection_start(),
        request_start: entry.request_start(),
        response_start: entry.response_start(),
        response_end: entry.response_end(),
    }
}

fn raw_interaction(kind: InteractionKind, event: &Event) -> RawInteraction {
    let target_kind = event
        .target()
        .and_then(|target| target.dyn_into::<Element>().ok())
        .map(|element| element.tag_name().to_lowercase())
        .unwrap_or_else(|| "unknown".to_string());

    let coordinates = if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
        Some(Coordinates {
            x: mouse.client_x() as f64,
            y: mouse.client_y() as f64,
        })
    } else if let Some(touch) = event.dyn_ref::<TouchEvent>() {
        touch.touches().get(0).map(|t| Coordinates {
            x: t.client_x() as f64,
            y: t.client_y() as f64,
        })
    } else {
        None
    };

    RawInteraction {
        kind,
        target_kind,
        coordinates,
    }
}

/// Telemetry handle exported to JavaScript
#[wasm_bindgen]
pub struct WasmTelemetry {
    window: Window,
    monitor: SharedMonitor,
    tick_interval_ms: f64,
    running: Rc<Cell<bool>>,
    frame_request: Rc<Cell<Option<i32>>>,
    frame_callback: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
    interval: Option<(i32, Closure<dyn FnMut()>)>,
    observer: Option<(PerformanceObserver, Closure<dyn FnMut(PerformanceObserverEntryList, PerformanceObserver)>)>,
    listeners: Vec<(&'static str, Closure<dyn FnMut(Event)>)>,
}

#[wasm_bindgen]
impl WasmTelemetry {
    #[wasm_bindgen(constructor)]
    pub fn new() -> JsResult<WasmTelemetry> {
        Self::build(TelemetryConfig::default()).to_js_result()
    }

    /// Create with a TOML configuration document.
    pub fn with_config(toml: &str) -> JsResult<WasmTelemetry> {
        TelemetryConfig::from_toml_str(toml)
            .and_then(Self::build)
            .to_js_result()
    }

    pub fn start(&mut self) -> JsResult<()> {
        if self.running.get() {
            return Ok(());
        }
        self.monitor.borrow_mut().initialize();
        self.running.set(true);
        self.start_frame_loop()?;
        self.start_interval()?;
        if self.monitor.borrow().source().supports_observation() {
            self.start_observer()?;
        }
        self.start_listeners()?;
        console_log!("Performance telemetry started");
        Ok(())
    }

    pub fn stop(&mut self) {
        if !self.running.get() {
            return;
        }
        self.running.set(false);

        if let Some(id) = self.frame_request.take() {
            let _ = self.window.cancel_animation_frame(id);
        }
        self.frame_callback.borrow_mut().take();
        if let Some((id, _callback)) = self.interval.take() {
            self.window.clear_interval_with_handle(id);
        }
        if let Some((observer, _callback)) = self.observer.take() {
            observer.disconnect();
        }
        for (name, callback) in self.listeners.drain(..) {
            let _ = self
                .window
                .remove_event_listener_with_callback(name, callback.as_ref().unchecked_ref());
        }

        self.monitor.borrow_mut().stop();
        console_log!("Performance telemetry stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn record_metric(&self, name: &str, value: f64) {
        with_monitor(&self.monitor, |m| m.record_metric(name, value, Metadata::new()));
    }

    pub fn increment_counter(&self, name: &str, amount: f64) {
        with_monitor(&self.monitor, |m| m.increment_counter(name, amount, Metadata::new()));
    }

    pub fn record_timing(&self, name: &str, start: f64, end: f64) {
        with_monitor(&self.monitor, |m| m.record_timing(name, start, end, Metadata::new()));
    }

    pub fn mark_render_start(&self, label: &str) {
        with_monitor(&self.monitor, |m| m.mark_render_start(label));
    }

    pub fn mark_render_end(&self, label: &str) {
        with_monitor(&self.monitor, |m| m.mark_render_end(label));
    }

    /// Run one analysis and return it as JSON.
    pub fn analyze_json(&self) -> JsResult<String> {
        let analysis = self.monitor.borrow_mut().analyze();
        serde_json::to_string(&analysis)
            .map_err(TelemetryError::from)
            .to_js_result()
    }

    pub fn trend_json(&self) -> JsResult<String> {
        let trend = self.monitor.borrow().trend();
        serde_json::to_string(&trend)
            .map_err(TelemetryError::from)
            .to_js_result()
    }

    pub fn available_templates(&self) -> Vec<JsValue> {
        self.monitor
            .borrow()
            .reporter()
            .available_templates()
            .into_iter()
            .map(JsValue::from)
            .collect()
    }

    pub fn generate_report(&self, template: &str, format: Option<String>) -> JsResult<String> {
        let options = ReportOptions {
            format,
            ..ReportOptions::default()
        };
        let report = self
            .monitor
            .borrow_mut()
            .generate_report(template, &options)
            .to_js_result()?;
        Ok(report.content)
    }

    /// Render and download a report; logs it when no document is available.
    /// Returns the export summary as JSON.
    pub fn export_report(&self, template: &str, filename: Option<String>) -> JsResult<String> {
        let mut monitor = self.monitor.borrow_mut();
        let report = monitor
            .generate_report(template, &ReportOptions::default())
            .to_js_result()?;

        let summary = match self.window.document() {
            Some(document) => {
                let mut exporter = BrowserDownloadExporter::new(document);
                monitor.export_report(&mut exporter, &report, filename.as_deref())
            }
            None => {
                let mut exporter = LogExporter::new();
                monitor.export_report(&mut exporter, &report, filename.as_deref())
            }
        }
        .map_err(|e| log_fault("Report export failed", e))
        .to_js_result()?;

        serde_json::to_string(&summary)
            .map_err(TelemetryError::from)
            .to_js_result()
    }
}

impl WasmTelemetry {
    fn build(config: TelemetryConfig) -> Result<WasmTelemetry> {
        let source = BrowserSource::new()?;
        let window = source.window.clone();
        let tick_interval_ms = config.intervals.memory_ms.min(config.intervals.resource_ms);
        let monitor = PerformanceMonitor::with_config(source, &config)?;

        Ok(WasmTelemetry {
            window,
            monitor: Rc::new(RefCell::new(monitor)),
            tick_interval_ms,
            running: Rc::new(Cell::new(false)),
            frame_request: Rc::new(Cell::new(None)),
            frame_callback: Rc::new(RefCell::new(None)),
            interval: None,
            observer: None,
            listeners: Vec::new(),
        })
    }

    fn start_frame_loop(&mut self) -> JsResult<()> {
        let window = self.window.clone();
        let monitor = self.monitor.clone();
        let running = self.running.clone();
        let request = self.frame_request.clone();
        let slot: Weak<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::downgrade(&self.frame_callback);

        let callback = Closure::wrap(Box::new(move || {
            request.set(None);
            if !running.get() {
                return;
            }
            with_monitor(&monitor, |m| m.on_animation_frame());

            if let Some(slot) = slot.upgrade() {
                if let Some(next) = slot.borrow().as_ref() {
                    match window.request_animation_frame(next.as_ref().unchecked_ref()) {
                        Ok(id) => request.set(Some(id)),
                        Err(e) => console_error!("requestAnimationFrame failed: {:?}", e),
                    }
                }
            }
        }) as Box<dyn FnMut()>);

        let id = self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())?;
        self.frame_request.set(Some(id));
        *self.frame_callback.borrow_mut() = Some(callback);
        Ok(())
    }

    fn start_interval(&mut self) -> JsResult<()> {
        let monitor = self.monitor.clone();
        let callback = Closure::wrap(Box::new(move || {
            with_monitor(&monitor, |m| m.tick());
        }) as Box<dyn FnMut()>);

        let id = self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                self.tick_interval_ms.max(1.0) as i32,
            )?;
        self.interval = Some((id, callback));
        Ok(())
    }

    fn start_observer(&mut self) -> JsResult<()> {
        let monitor = self.monitor.clone();
        let callback = Closure::wrap(Box::new(
            move |list: PerformanceObserverEntryList, _observer: PerformanceObserver| {
                for value in list.get_entries().iter() {
                    let entry: PerformanceEntry = value.unchecked_into();
                    let entry_type = entry.entry_type();
                    if entry_type == "resource" {
                        let timing = resource_timing(entry.unchecked_ref::<PerformanceResourceTiming>());
                        with_monitor(&monitor, |m| m.observe_resource(&timing));
                    } else {
                        let observed = ObservedEntry {
                            entry_type,
                            name: entry.name(),
                            start_time: entry.start_time(),
                            duration: entry.duration(),
                        };
                        with_monitor(&monitor, |m| m.observe_entry(&observed));
                    }
                }
            },
        )
            as Box<dyn FnMut(PerformanceObserverEntryList, PerformanceObserver)>);

        let observer = PerformanceObserver::new(callback.as_ref().unchecked_ref())?;
        let entry_types: Array = OBSERVED_ENTRY_TYPES.iter().map(|t| JsValue::from_str(t)).collect();
        let options = Object::new();
        Reflect::set(&options, &"entryTypes".into(), &entry_types)?;
        observer.observe_with_options(options.unchecked_ref::<PerformanceObserverInit>());

        self.observer = Some((observer, callback));
        Ok(())
    }

    fn start_listeners(&mut self) -> JsResult<()> {
        let options = Object::new();
        Reflect::set(&options, &"passive".into(), &JsValue::TRUE)?;
        let options: &AddEventListenerOptions = options.unchecked_ref();

        for name in INTERACTION_EVENTS {
            let kind = match name.parse::<InteractionKind>() {
                Ok(kind) => kind,
                Err(_) => continue,
            };
            let monitor = self.monitor.clone();
            let callback = Closure::wrap(Box::new(move |event: Event| {
                let raw = raw_interaction(kind, &event);
                with_monitor(&monitor, |m| m.record_interaction(raw));
            }) as Box<dyn FnMut(Event)>);

            self.window
                .add_event_listener_with_callback_and_add_event_listener_options(
                    name,
                    callback.as_ref().unchecked_ref(),
                    options,
                )?;
            self.listeners.push((name, callback));
        }
        Ok(())
    }
}

impl Drop for WasmTelemetry {
    fn drop(&mut self) {
        self.stop();
    }
}

