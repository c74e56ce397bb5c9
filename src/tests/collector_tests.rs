// Collector tests, driven through a manual platform source

use std::cell::Cell;
use std::rc::Rc;

use crate::collectors::custom::Metadata;
use crate::collectors::*;
use crate::platform::*;
use crate::samples::*;

const MB: f64 = 1024.0 * 1024.0;

fn heap(used_mb: f64) -> Option<HeapUsage> {
    Some(HeapUsage {
        used: used_mb * MB,
        total: used_mb * MB,
        limit: 100.0 * MB,
    })
}

#[test]
fn test_frame_collector_measures_fps_and_jank() {
    let source = ManualSource::new();
    let mut frames = FrameCollector::new(100, 60, 10);
    frames.initialize(&source);

    for _ in 0..10 {
        let now = source.advance(10.0);
        frames.on_animation_frame(now);
    }
    for _ in 0..10 {
        let now = source.advance(40.0);
        frames.on_animation_frame(now);
    }

    let snapshot = frames.get_metrics().unwrap();
    assert!((snapshot.current.fps - 25.0).abs() < 1e-9);
    assert!((snapshot.average.frame_time - 25.0).abs() < 1e-9);
    assert!((snapshot.average.fps - 40.0).abs() < 1e-9);
    assert_eq!(snapshot.performance.jank_frames, 10);
    assert_eq!(snapshot.performance.smooth_frames, 10);
    assert!((snapshot.performance.jank_percentage - 50.0).abs() < 1e-9);
    assert_eq!(snapshot.history.len(), 10);
    assert_eq!(frames.frame_count(), 20);
}

#[test]
fn test_frame_collector_ignores_frames_before_initialize_and_zero_intervals() {
    let source = ManualSource::new();
    let mut frames = FrameCollector::new(100, 60, 10);
    assert!(frames.on_animation_frame(16.0).is_none());
    assert!(frames.get_metrics().is_none());

    frames.initialize(&source);
    assert!(frames.on_animation_frame(0.0).is_none());
    assert!(frames.on_animation_frame(16.0).is_some());
    assert!(frames.on_animation_frame(16.0).is_none());
    assert_eq!(frames.sample_count(), 1);
}

#[test]
fn test_frame_history_respects_capacity() {
    let source = ManualSource::new();
    let mut frames = FrameCollector::new(5, 60, 10);
    frames.initialize(&source);
    for _ in 0..20 {
        let now = source.advance(16.0);
        frames.on_animation_frame(now);
    }
    assert_eq!(frames.sample_count(), 5);
    assert_eq!(frames.get_metrics().unwrap().history.len(), 5);
}

#[test]
fn test_memory_collector_without_heap_reports_no_data() {
    let source = ManualSource::new();
    let mut memory = MemoryCollector::new(10, 30, 10, 1000.0);
    memory.initialize(&source);

    assert!(memory.poll(&source).is_none());
    assert!(memory.get_metrics().is_none());
}

#[test]
fn test_memory_collector_pressure_and_gc() {
    let source = ManualSource::new();
    let mut memory = MemoryCollector::new(10, 30, 10, 1000.0);
    memory.initialize(&source);

    source.set_heap_usage(heap(50.0));
    let first = memory.poll(&source).unwrap();
    assert!((first.pressure - 0.5).abs() < 1e-9);
    assert!(!first.gc_detected);

    source.advance(1000.0);
    source.set_heap_usage(heap(40.0));
    let second = memory.poll(&source).unwrap();
    assert!(second.gc_detected);
    assert!((second.gc_reclaimed - 10.0 * MB).abs() < 1.0);

    let snapshot = memory.get_metrics().unwrap();
    assert_eq!(snapshot.gc.frequency, 1);
    assert!((snapshot.trends.peak_usage - 50.0 * MB).abs() < 1.0);
    assert!((snapshot.trends.growth_rate + 10.0 * MB).abs() < 1.0);
    assert!((snapshot.current.available - 60.0 * MB).abs() < 1.0);
}

#[test]
fn test_memory_collector_polls_on_interval() {
    let source = ManualSource::new();
    source.set_heap_usage(heap(10.0));
    let mut memory = MemoryCollector::new(10, 30, 10, 1000.0);
    memory.initialize(&source);

    source.set_now(500.0);
    assert!(memory.tick(&source).is_none());
    source.set_now(1000.0);
    assert!(memory.tick(&source).is_some());
    source.set_now(1500.0);
    assert!(memory.tick(&source).is_none());

    // A stalled host gets one sample, not a burst
    source.set_now(3500.0);
    assert!(memory.tick(&source).is_some());
    assert!(memory.tick(&source).is_none());
    source.set_now(3900.0);
    assert!(memory.tick(&source).is_none());
    source.set_now(4000.0);
    assert!(memory.tick(&source).is_some());

    memory.stop();
    source.set_now(9000.0);
    assert!(memory.tick(&source).is_none());
    assert_eq!(memory.sample_count(), 3);
}

#[test]
fn test_interval_timer_skips_missed_periods() {
    let mut timer = IntervalTimer::new(100.0);
    assert!(!timer.fire(1000.0));

    timer.start(0.0);
    assert!(timer.is_running());
    assert!(!timer.fire(99.0));
    assert!(timer.fire(100.0));
    assert!(timer.fire(450.0));
    assert!(!timer.fire(499.0));
    assert!(timer.fire(500.0));

    timer.stop();
    assert!(!timer.fire(10_000.0));
}

#[test]
fn test_interval_timer_tiny_interval_after_long_gap() {
    let mut timer = IntervalTimer::new(1e-12);
    assert_eq!(timer.interval_ms(), MIN_INTERVAL_MS);

    timer.start(0.0);
    assert!(timer.fire(1_000_000_000.0));
    assert!(!timer.fire(1_000_000_000.0));
    assert!(timer.fire(1_000_000_001.0));
}

#[test]
fn test_zero_window_collectors_do_not_panic() {
    let source = ManualSource::new();
    source.set_heap_usage(heap(10.0));
    let mut memory = MemoryCollector::new(200, 0, 10, 1000.0);
    memory.initialize(&source);
    memory.poll(&source);
    let snapshot = memory.get_metrics().unwrap();
    assert_eq!(snapshot.trends.growth_rate, 0.0);

    source.set_dom_counts(Some(DomCounts {
        nodes: 10,
        images: 0,
        scripts: 0,
        stylesheets: 0,
    }));
    let mut resources = ResourceCollector::new(100, 0, 5000.0);
    resources.initialize(&source);
    resources.poll(&source);
    assert_eq!(resources.get_metrics().unwrap().trends.dom_growth, 0);

    let mut frames = FrameCollector::new(100, 0, 10);
    frames.initialize(&source);
    for _ in 0..3 {
        let now = source.advance(40.0);
        frames.on_animation_frame(now);
    }
    let jank = frames.get_metrics().unwrap().performance;
    assert!(jank.jank_percentage.is_finite());
    assert_eq!(jank.jank_percentage, 100.0);
}

#[test]
fn test_render_marks_without_observation() {
    let source = ManualSource::new();
    let mut render = RenderCollector::new(50, 50, 5);
    render.initialize(&source);
    assert!(!render.is_observing());

    let paint = ObservedEntry {
        entry_type: "paint".to_string(),
        name: "first-paint".to_string(),
        start_time: 5.0,
        duration: 0.0,
    };
    assert!(render.observe_entry(&paint, 10.0).is_none());

    assert!(render.mark_end("never-started", 10.0).is_none());
    render.mark_start("scene", 100.0);
    let sample = render.mark_end("scene", 125.0).unwrap();
    assert_eq!(sample.kind, RenderKind::Custom);
    assert!((sample.duration - 25.0).abs() < 1e-9);

    let snapshot = render.get_metrics().unwrap();
    assert_eq!(snapshot.statistics.total_renders, 1);
    assert_eq!(snapshot.statistics.custom_measures, 1);
}

#[test]
fn test_render_observation_keeps_paint_and_measure() {
    let source = ManualSource::new();
    source.set_observation(true);
    let mut render = RenderCollector::new(50, 50, 2);
    render.initialize(&source);

    let entry = |entry_type: &str, duration: f64| ObservedEntry {
        entry_type: entry_type.to_string(),
        name: "entry".to_string(),
        start_time: 0.0,
        duration,
    };
    assert!(render.observe_entry(&entry("paint", 4.0), 1.0).is_some());
    assert!(render.observe_entry(&entry("measure", 12.0), 2.0).is_some());
    assert!(render.observe_entry(&entry("measure", 20.0), 3.0).is_some());
    assert!(render.observe_entry(&entry("navigation", 99.0), 4.0).is_none());

    let stats = render.get_metrics().unwrap().statistics;
    assert_eq!(stats.total_renders, 3);
    assert_eq!(stats.paint_events, 1);
    assert_eq!(stats.measure_events, 2);
    assert!((stats.average_duration - 12.0).abs() < 1e-9);
    assert!((stats.max_duration - 20.0).abs() < 1e-9);
    assert!((stats.min_duration - 4.0).abs() < 1e-9);
    assert_eq!(render.get_metrics().unwrap().recent.len(), 2);
}

#[test]
fn test_resource_type_classification() {
    assert_eq!(ResourceType::from_url("https://cdn.example.com/app.js?v=3"), ResourceType::Script);
    assert_eq!(ResourceType::from_url("/img/logo.PNG#top"), ResourceType::Image);
    assert_eq!(ResourceType::from_url("/styles/main.css"), ResourceType::Stylesheet);
    assert_eq!(ResourceType::from_url("/fonts/ui.woff2"), ResourceType::Font);
    assert_eq!(ResourceType::from_url("/sfx/hit.ogg"), ResourceType::Audio);
    assert_eq!(ResourceType::from_url("/intro.webm"), ResourceType::Video);
    assert_eq!(ResourceType::from_url("/levels.json"), ResourceType::Xhr);
    assert_eq!(ResourceType::from_url("/api/scores"), ResourceType::Other);
}

fn resource(name: &str, duration: f64, size: f64) -> ResourceTiming {
    ResourceTiming {
        name: name.to_string(),
        start_time: 100.0,
        duration,
        transfer_size: size,
        domain_lookup_start: 100.0,
        domain_lookup_end: 110.0,
        connect_start: 110.0,
        connect_end: 130.0,
        secure_connection_start: 0.0,
        request_start: 130.0,
        response_start: 160.0,
        response_end: 100.0 + duration,
    }
}

#[test]
fn test_phase_timing_from_resource() {
    let timing = PhaseTiming::from_resource(&resource("/app.js", 200.0, 1024.0));
    assert!((timing.dns - 10.0).abs() < 1e-9);
    assert!((timing.tcp - 20.0).abs() < 1e-9);
    assert_eq!(timing.ssl, 0.0);
    assert!((timing.request - 30.0).abs() < 1e-9);
    assert!((timing.response - 140.0).abs() < 1e-9);
    assert!((timing.total - 200.0).abs() < 1e-9);

    let mut secure = resource("/app.js", 200.0, 1024.0);
    secure.secure_connection_start = 120.0;
    assert!((PhaseTiming::from_resource(&secure).ssl - 10.0).abs() < 1e-9);
}

#[test]
fn test_network_collector_summary() {
    let source = ManualSource::new();
    source.set_observation(true);
    let mut network = NetworkCollector::new(100, 20, 5);
    network.initialize(&source);

    network.observe_resource(&resource("/app.js", 200.0, 1000.0), 1.0);
    network.observe_resource(&resource("/vendor.js", 400.0, 3000.0), 2.0);
    network.observe_resource(&resource("/logo.png", 300.0, 500.0), 3.0);

    let snapshot = network.get_metrics().unwrap();
    assert_eq!(snapshot.summary.total_requests, 3);
    assert!((snapshot.summary.total_transfer - 4500.0).abs() < 1e-9);
    assert!((snapshot.summary.average_duration - 300.0).abs() < 1e-9);

    let scripts = &snapshot.summary.by_type[&ResourceType::Script];
    assert_eq!(scripts.count, 2);
    assert!((scripts.total_size - 4000.0).abs() < 1e-9);
    assert!((scripts.total_time - 600.0).abs() < 1e-9);
    assert!((snapshot.timing.average_dns - 10.0).abs() < 1e-9);
}

#[test]
fn test_network_collector_without_observation() {
    let source = ManualSource::new();
    let mut network = NetworkCollector::new(100, 20, 5);
    network.initialize(&source);
    assert!(network.observe_resource(&resource("/app.js", 200.0, 1.0), 1.0).is_none());
    assert!(network.get_metrics().is_none());
}

#[test]
fn test_interaction_latency_resolves_on_next_frame() {
    let source = ManualSource::new();
    let mut interactions = InteractionCollector::new(100, 50, 10);
    interactions.initialize(&source);

    interactions.record_event(
        RawInteraction {
            kind: InteractionKind::Click,
            target_kind: "canvas".to_string(),
            coordinates: Some(Coordinates { x: 10.0, y: 20.0 }),
        },
        100.0,
    );
    interactions.record_event(
        RawInteraction {
            kind: InteractionKind::Keydown,
            target_kind: "body".to_string(),
            coordinates: None,
        },
        105.0,
    );
    assert_eq!(interactions.pending_count(), 2);
    assert!(interactions.get_metrics().is_none());

    let resolved = interactions.on_animation_frame(120.0);
    assert_eq!(resolved.len(), 2);
    assert_eq!(resolved[0].timestamp, 100.0);
    assert!((resolved[0].response_time - 20.0).abs() < 1e-9);
    assert!((resolved[1].response_time - 15.0).abs() < 1e-9);
    assert_eq!(interactions.pending_count(), 0);

    let summary = interactions.get_metrics().unwrap().summary;
    assert_eq!(summary.total_interactions, 2);
    assert!((summary.average_response_time - 17.5).abs() < 1e-9);
    assert_eq!(summary.by_type[&InteractionKind::Click].count, 1);
    assert!(!summary.slow_interactions);
}

#[test]
fn test_slow_interaction_flag() {
    let source = ManualSource::new();
    let mut interactions = InteractionCollector::new(100, 50, 10);
    interactions.initialize(&source);
    interactions.record_event(
        RawInteraction {
            kind: InteractionKind::Touchstart,
            target_kind: "button".to_string(),
            coordinates: None,
        },
        0.0,
    );
    interactions.on_animation_frame(150.0);
    assert!(interactions.get_metrics().unwrap().summary.slow_interactions);
}

#[test]
fn test_queued_interactions_resolve_after_stop() {
    let source = ManualSource::new();
    let mut interactions = InteractionCollector::new(100, 50, 10);
    interactions.initialize(&source);
    let click = || RawInteraction {
        kind: InteractionKind::Click,
        target_kind: "canvas".to_string(),
        coordinates: None,
    };
    interactions.record_event(click(), 0.0);

    interactions.stop();
    interactions.record_event(click(), 4.0);
    assert_eq!(interactions.pending_count(), 1);

    let resolved = interactions.on_animation_frame(16.0);
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].response_time, 16.0);
    assert_eq!(interactions.get_metrics().unwrap().summary.total_interactions, 1);
}

#[test]
fn test_resource_collector_growth() {
    let source = ManualSource::new();
    let mut resources = ResourceCollector::new(100, 10, 5000.0);
    resources.initialize(&source);
    assert!(resources.poll(&source).is_none());

    let dom = |nodes: u64| DomCounts {
        nodes,
        images: 3,
        scripts: 2,
        stylesheets: 1,
    };
    source.set_dom_counts(Some(dom(100)));
    source.set_storage_usage(Some(StorageUsage {
        local_bytes: 1000,
        session_bytes: 10,
    }));
    resources.poll(&source);

    source.set_dom_counts(Some(dom(250)));
    source.set_storage_usage(Some(StorageUsage {
        local_bytes: 800,
        session_bytes: 10,
    }));
    resources.poll(&source);

    let snapshot = resources.get_metrics().unwrap();
    assert_eq!(snapshot.current.dom.nodes, 250);
    assert_eq!(snapshot.trends.dom_growth, 150);
    assert_eq!(snapshot.trends.storage_growth, -200);
    assert_eq!(snapshot.history.len(), 2);
}

#[test]
fn test_custom_counters_and_timings() {
    let source = ManualSource::new();
    let mut custom = CustomCollector::new(100, 10);
    custom.initialize(&source);

    custom.increment_counter("enemies_spawned", 1.0, Metadata::new(), 1.0);
    let sample = custom
        .increment_counter("enemies_spawned", 2.0, Metadata::new(), 2.0)
        .unwrap();
    assert_eq!(sample.value, 3.0);
    assert_eq!(sample.metadata["type"], "counter");
    assert_eq!(custom.latest_value("enemies_spawned"), Some(3.0));

    let timing = custom
        .record_timing("level_load", 10.0, 35.0, Metadata::new(), 40.0)
        .unwrap();
    assert_eq!(timing.value, 25.0);
    assert_eq!(timing.metadata["type"], "timing");

    assert_eq!(custom.metric_names(), vec!["enemies_spawned", "level_load"]);
    assert_eq!(custom.sample_count(), 3);
}

#[test]
fn test_custom_snapshot_statistics() {
    let source = ManualSource::new();
    let mut custom = CustomCollector::new(100, 3);
    assert!(custom.record_metric("ignored", 1.0, Metadata::new(), 0.0).is_none());
    custom.initialize(&source);
    assert!(custom.get_metrics().is_none());

    for (i, value) in [1.0, 2.0, 4.0, 6.0].iter().enumerate() {
        custom.record_metric("latency", *value, Metadata::new(), i as f64);
    }
    let snapshot = custom.get_metrics().unwrap();
    let latency = &snapshot["latency"];
    assert_eq!(latency.current, 6.0);
    assert_eq!(latency.count, 4);
    assert_eq!(latency.recent.len(), 3);
    assert_eq!(latency.statistics.min, 2.0);
    assert_eq!(latency.statistics.max, 6.0);
    assert_eq!(latency.statistics.sum, 12.0);
    assert!((latency.statistics.average - 4.0).abs() < 1e-9);

    assert!(custom.clear_metric("latency"));
    assert!(custom.latest_value("latency").is_none());
    custom.record_metric("a", 1.0, Metadata::new(), 5.0);
    custom.clear_all_metrics();
    assert!(custom.get_metrics().is_none());
}

#[test]
fn test_subscriber_faults_are_isolated() {
    let source = ManualSource::new();
    let mut frames = FrameCollector::new(100, 60, 10);
    frames.initialize(&source);

    let delivered = Rc::new(Cell::new(0));
    frames.on_metrics(Box::new(|_, _| Err("subscriber failed".into())));
    frames.on_metrics(Box::new(|_, _| panic!("subscriber panicked")));
    let counter = delivered.clone();
    let id = frames.on_metrics(Box::new(move |domain, sample| {
        assert_eq!(domain, MetricDomain::Frame);
        assert_eq!(sample.domain(), MetricDomain::Frame);
        counter.set(counter.get() + 1);
        Ok(())
    }));

    assert!(frames.on_animation_frame(16.0).is_some());
    assert_eq!(delivered.get(), 1);
    assert_eq!(frames.sample_count(), 1);

    assert!(frames.unsubscribe(id));
    assert!(!frames.unsubscribe(id));
    frames.on_animation_frame(32.0);
    assert_eq!(delivered.get(), 1);
    assert_eq!(frames.sample_count(), 2);
}

#[test]
fn test_subscribers_count_failures() {
    let mut subscribers = Subscribers::new();
    subscribers.add(Box::new(|_, _| Err("no".into())));
    subscribers.add(Box::new(|_, _| Ok(())));
    assert_eq!(subscribers.len(), 2);

    let sample = MetricSample::Custom(CustomSample {
        timestamp: 1.0,
        name: "x".to_string(),
        value: 1.0,
        metadata: Default::default(),
    });
    assert_eq!(subscribers.notify(&sample), 1);
}
