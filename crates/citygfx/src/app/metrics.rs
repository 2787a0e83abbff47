use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

static POISON_WARNED: AtomicBool = AtomicBool::new(false);

/// Per-interval view statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameMetricsSnapshot {
    pub fps: f32,
    pub frame_time_ms: f32,
    pub pictures_per_frame: f32,
    pub peak_pictures: u32,
    /// Overlays and trees removed by clear-land events during the interval.
    pub tiles_cleared: u32,
}

/// Shared view of the latest frame metrics, readable from outside the loop.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    latest: Arc<RwLock<FrameMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> FrameMetricsSnapshot {
        *self
            .latest
            .read()
            .unwrap_or_else(|poisoned| recover("read", poisoned))
    }

    pub(crate) fn publish(&self, snapshot: FrameMetricsSnapshot) {
        *self
            .latest
            .write()
            .unwrap_or_else(|poisoned| recover("write", poisoned)) = snapshot;
    }
}

fn recover<G>(operation: &'static str, poisoned: PoisonError<G>) -> G {
    if !POISON_WARNED.swap(true, Ordering::Relaxed) {
        warn!(operation, "metrics_lock_poisoned");
    }
    poisoned.into_inner()
}

/// What one presented frame contributed.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FrameSample {
    pub(crate) dt: Duration,
    pub(crate) pictures: u32,
    pub(crate) tiles_cleared: usize,
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    window_start: Instant,
    window: Duration,
    frames: u32,
    busy: Duration,
    pictures: u64,
    peak_pictures: u32,
    tiles_cleared: u32,
}

impl MetricsAccumulator {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            window_start: Instant::now(),
            window,
            frames: 0,
            busy: Duration::ZERO,
            pictures: 0,
            peak_pictures: 0,
            tiles_cleared: 0,
        }
    }

    pub(crate) fn record(&mut self, sample: FrameSample) {
        self.frames = self.frames.saturating_add(1);
        self.busy = self.busy.saturating_add(sample.dt);
        self.pictures = self.pictures.saturating_add(u64::from(sample.pictures));
        self.peak_pictures = self.peak_pictures.max(sample.pictures);
        let cleared = u32::try_from(sample.tiles_cleared).unwrap_or(u32::MAX);
        self.tiles_cleared = self.tiles_cleared.saturating_add(cleared);
    }

    /// Closes the window once it has elapsed and starts a new one at `now`.
    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<FrameMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.window {
            return None;
        }

        let frames = self.frames.max(1) as f32;
        let snapshot = FrameMetricsSnapshot {
            fps: self.frames as f32 / elapsed.as_secs_f32().max(f32::EPSILON),
            frame_time_ms: self.busy.as_secs_f32() * 1000.0 / frames,
            pictures_per_frame: self.pictures as f32 / frames,
            peak_pictures: self.peak_pictures,
            tiles_cleared: self.tiles_cleared,
        };
        *self = Self {
            window_start: now,
            ..Self::new(self.window)
        };
        Some(snapshot)
    }
}
