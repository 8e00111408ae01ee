//! Frame timing statistics.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Frame phases that are timed separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Viewport bookkeeping and render-data allocation.
    Prepare,
    /// Vertex mapping.
    Download,
    /// Column index construction.
    Index,
    /// Compute pass recording.
    Raster,
    /// Software decoration painting.
    Paint,
    /// Decoration and density texture uploads.
    TextureUpload,
    /// Render pass recording.
    Composite,
}

/// Accumulated timings since the renderer was created.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderStats {
    pub frames: u64,
    pub prepare: Duration,
    pub download: Duration,
    pub index: Duration,
    pub raster: Duration,
    pub paint: Duration,
    pub texture_upload: Duration,
    pub composite: Duration,
    /// Whole `render_frame` calls.
    pub render: Duration,
    /// Time between the starts of consecutive frames.
    pub inter_frame: Duration,
    /// Frames that hit at least one GPU validation error.
    pub gpu_error_frames: u64,
}

impl RenderStats {
    pub fn add(&mut self, stage: Stage, elapsed: Duration) {
        let slot = match stage {
            Stage::Prepare => &mut self.prepare,
            Stage::Download => &mut self.download,
            Stage::Index => &mut self.index,
            Stage::Raster => &mut self.raster,
            Stage::Paint => &mut self.paint,
            Stage::TextureUpload => &mut self.texture_upload,
            Stage::Composite => &mut self.composite,
        };
        *slot += elapsed;
    }

    /// Mean whole-frame render time.
    pub fn mean_render(&self) -> Duration {
        mean(self.render, self.frames)
    }

    /// Mean time between frames.
    pub fn mean_inter_frame(&self) -> Duration {
        mean(self.inter_frame, self.frames.saturating_sub(1))
    }
}

fn mean(total: Duration, count: u64) -> Duration {
    match u32::try_from(count) {
        Ok(0) => Duration::ZERO,
        Ok(n) => total / n,
        Err(_) => Duration::from_secs_f64(total.as_secs_f64() / count as f64),
    }
}

/// Shared read access to the renderer's stats for profiling hosts.
#[derive(Debug, Clone, Default)]
pub struct StatsHandle(Arc<Mutex<RenderStats>>);

impl StatsHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current totals.
    pub fn snapshot(&self) -> RenderStats {
        self.0.lock().clone()
    }

    pub fn reset(&self) {
        *self.0.lock() = RenderStats::default();
    }

    fn update(&self, f: impl FnOnce(&mut RenderStats)) {
        f(&mut self.0.lock());
    }
}

/// Collects one frame's stage timings and folds them into a [`StatsHandle`].
#[derive(Debug)]
pub struct FrameTimer {
    handle: StatsHandle,
    log_interval: Option<Duration>,
    last_log: Option<Instant>,
    last_frame_start: Option<Instant>,
    frame_start: Option<Instant>,
    pending: RenderStats,
}

impl FrameTimer {
    /// `log_interval_ms == 0` disables periodic logging.
    pub fn new(handle: StatsHandle, log_interval_ms: u64) -> Self {
        Self {
            handle,
            log_interval: (log_interval_ms > 0).then(|| Duration::from_millis(log_interval_ms)),
            last_log: None,
            last_frame_start: None,
            frame_start: None,
            pending: RenderStats::default(),
        }
    }

    pub fn set_log_interval(&mut self, log_interval_ms: u64) {
        self.log_interval = (log_interval_ms > 0).then(|| Duration::from_millis(log_interval_ms));
    }

    pub fn begin_frame(&mut self) {
        let now = Instant::now();
        self.pending = RenderStats::default();
        if let Some(prev) = self.last_frame_start {
            self.pending.inter_frame = now.duration_since(prev);
        }
        self.last_frame_start = Some(now);
        self.frame_start = Some(now);
    }

    pub fn record(&mut self, stage: Stage, elapsed: Duration) {
        self.pending.add(stage, elapsed);
    }

    /// Time `f` and attribute it to `stage`.
    pub fn time<T>(&mut self, stage: Stage, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let value = f();
        self.record(stage, start.elapsed());
        value
    }

    pub fn note_gpu_error(&mut self) {
        self.pending.gpu_error_frames = 1;
    }

    /// Publish this frame and log the totals if the interval has elapsed.
    pub fn end_frame(&mut self) {
        if let Some(start) = self.frame_start.take() {
            self.pending.render = start.elapsed();
        }
        let frame = std::mem::take(&mut self.pending);
        let mut totals = None;
        self.handle.update(|stats| {
            stats.frames += 1;
            stats.prepare += frame.prepare;
            stats.download += frame.download;
            stats.index += frame.index;
            stats.raster += frame.raster;
            stats.paint += frame.paint;
            stats.texture_upload += frame.texture_upload;
            stats.composite += frame.composite;
            stats.render += frame.render;
            stats.inter_frame += frame.inter_frame;
            stats.gpu_error_frames += frame.gpu_error_frames;
            totals = Some(stats.clone());
        });

        let Some(interval) = self.log_interval else {
            return;
        };
        let now = Instant::now();
        let due = self
            .last_log
            .is_none_or(|last| now.duration_since(last) >= interval);
        if let (true, Some(stats)) = (due, totals) {
            self.last_log = Some(now);
            tracing::debug!(
                "render stats: {} frames, mean {:.3} ms/frame, mean interval {:.3} ms, \
                 raster {:.3} ms, composite {:.3} ms, {} frames with GPU errors",
                stats.frames,
                stats.mean_render().as_secs_f64() * 1e3,
                stats.mean_inter_frame().as_secs_f64() * 1e3,
                stats.raster.as_secs_f64() * 1e3,
                stats.composite.as_secs_f64() * 1e3,
                stats.gpu_error_frames,
            );
        }
    }
}
