// Frame timing collector, fed by the per-display-frame callback
use serde::{Deserialize, Serialize};

use super::{Collector, MetricsCallback, SubscriptionId, Subscribers};
use crate::buffer::BoundedBuffer;
use crate::platform::MetricsSource;
use crate::samples::{FrameSample, MetricDomain, MetricSample};
use crate::stats;

/// Frame budget at 60 FPS, in milliseconds
pub const FRAME_BUDGET_MS: f64 = 16.67;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameReading {
    pub fps: f64,
    pub frame_time: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JankStats {
    pub jank_percentage: f64,
    pub jank_frames: usize,
    pub smooth_frames: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub current: FrameReading,
    pub average: FrameReading,
    pub performance: JankStats,
    pub history: Vec<FrameSample>,
}

pub struct FrameCollector {
    history: BoundedBuffer<FrameSample>,
    window: usize,
    history_window: usize,
    last_sample_time: Option<f64>,
    frame_count: u64,
    collecting: bool,
    subscribers: Subscribers,
}

impl FrameCollector {
    pub fn new(capacity: usize, window: usize, history_window: usize) -> Self {
        FrameCollector {
            history: BoundedBuffer::new(capacity),
            window: window.max(1),
            history_window,
            last_sample_time: None,
            frame_count: 0,
            collecting: false,
            subscribers: Subscribers::new(),
        }
    }

    /// Record one display frame at `now` (milliseconds).
    pub fn on_animation_frame(&mut self, now: f64) -> Option<FrameSample> {
        if !self.collecting {
            return None;
        }
        let last = match self.last_sample_time {
            Some(last) => last,
            None => {
                self.last_sample_time = Some(now);
                return None;
            }
        };
        let frame_time = now - last;
        if frame_time <= 0.0 {
            return None;
        }

        let sample = FrameSample {
            frame_number: self.frame_count,
            timestamp: now,
            frame_time,
            fps: 1000.0 / frame_time,
            jank: (frame_time - FRAME_BUDGET_MS).max(0.0),
        };
        self.frame_count += 1;
        self.last_sample_time = Some(now);
        self.history.push(sample.clone());
        self.subscribers.notify(&MetricSample::Frame(sample.clone()));
        Some(sample)
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Collector for FrameCollector {
    type Snapshot = FrameSnapshot;

    fn domain(&self) -> MetricDomain {
        MetricDomain::Frame
    }

    fn initialize(&mut self, source: &dyn MetricsSource) {
        if self.collecting {
            return;
        }
        self.collecting = true;
        self.last_sample_time = Some(source.now());
        log::info!("Frame metrics collector initialized");
    }

    fn get_metrics(&self) -> Option<FrameSnapshot> {
        let latest = self.history.latest()?;
        let recent: Vec<&FrameSample> = self.history.trailing(self.window).collect();

        let frame_times: Vec<f64> = recent.iter().map(|f| f.frame_time).collect();
        let average_frame_time = stats::mean(&frame_times);
        let average_fps = if average_frame_time > 0.0 {
            1000.0 / average_frame_time
        } else {
            0.0
        };

        let jank_frames = recent.iter().filter(|f| f.jank > 0.0).count();
        let jank_percentage = jank_frames as f64 / recent.len() as f64 * 100.0;

        Some(FrameSnapshot {
            current: FrameReading {
                fps: latest.fps,
                frame_time: latest.frame_time,
            },
            average: FrameReading {
                fps: average_fps,
                frame_time: average_frame_time,
            },
            performance: JankStats {
                jank_percentage,
                jank_frames,
                smooth_frames: recent.len() - jank_frames,
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
        self.last_sample_time = None;
    }

    fn is_collecting(&self) -> bool {
        self.collecting
    }

    fn sample_count(&self) -> usize {
        self.history.len()
    }
}
