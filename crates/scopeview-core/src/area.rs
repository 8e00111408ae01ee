//! Waveform areas and the groups that share a time axis.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use crate::capture::{Capture, CaptureKind};
use crate::channel::{Channel, ChannelId, YAxisUnit};
use crate::config::ViewerConfig;
use crate::geometry::{GeometryParams, TraceStyle};
use crate::hit_test::Layout;
use crate::input::{RouterAction, TriggerControl};
use crate::overlay::PaintContext;
use crate::view::{CoordinateMapper, TimeAxis, ViewState};

/// Vertical cursor configuration of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CursorMode {
    #[default]
    None,
    Single,
    Dual,
}

/// Areas stacked on a common time axis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaveformGroup {
    pub time: TimeAxis,
    pub cursor_mode: CursorMode,
    /// Cursor positions in axis units.
    pub cursors: [f64; 2],
}

impl WaveformGroup {
    pub fn new(time: TimeAxis) -> Self {
        Self {
            time,
            ..Self::default()
        }
    }
}

/// Process-unique identity of a waveform area. Clones of an area share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AreaId(pub u32);

impl AreaId {
    fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "area{}", self.0)
    }
}

/// One plot: a main channel plus the decoder overlays drawn on top of it.
#[derive(Debug, Clone)]
pub struct WaveformArea {
    id: AreaId,
    pub view: ViewState,
    pub layout: Layout,
    pub main: Channel,
    overlays: Vec<Channel>,
    /// Persistence display enabled.
    pub persistence: bool,
    persistence_clear_pending: bool,
    geometry_dirty: bool,
    parallel_threshold: usize,
}

impl WaveformArea {
    pub fn new(main: Channel, width: u32, height: u32, config: &ViewerConfig) -> Self {
        let mut view = ViewState::new(width, height);
        view.trace_alpha = config.trace_alpha;
        view.padding = config.padding;
        Self {
            id: AreaId::next(),
            view,
            layout: Layout::new(width as f32),
            main,
            overlays: Vec::new(),
            persistence: false,
            persistence_clear_pending: false,
            geometry_dirty: true,
            parallel_threshold: config.parallel_geometry_threshold,
        }
    }

    pub fn id(&self) -> AreaId {
        self.id
    }

    /// Take over the rendering settings of `config`.
    ///
    /// Returns true if anything changed; changes that affect geometry mark
    /// it dirty.
    pub fn apply_config(&mut self, config: &ViewerConfig) -> bool {
        let alpha_changed = self.view.trace_alpha != config.trace_alpha;
        let geometry_changed = self.view.padding != config.padding
            || self.parallel_threshold != config.parallel_geometry_threshold;
        self.view.trace_alpha = config.trace_alpha;
        self.view.padding = config.padding;
        self.parallel_threshold = config.parallel_geometry_threshold;
        if geometry_changed {
            self.mark_geometry_dirty();
        }
        alpha_changed || geometry_changed
    }

    /// Apply a new viewport size.
    ///
    /// Returns the grid size the main channel's density decoder should produce,
    /// if it is an eye or waterfall.
    pub fn resize(&mut self, width: u32, height: u32) -> Option<(u32, u32)> {
        self.view.width = width;
        self.view.height = height;
        self.view.plot_right = width;
        self.layout.plot_right = width as f32;
        self.mark_geometry_dirty();
        self.main
            .capture_kind()
            .and_then(|kind| density_grid_size(kind, width, height))
    }

    /// Recompute pixels-per-volt from the main channel's range.
    pub fn refresh_vertical_scale(&mut self) {
        self.view.update_vertical_scale(self.main.voltage_range());
    }

    /// New capture on the main channel.
    pub fn on_data_ready(&mut self, group: &mut WaveformGroup) -> Vec<RouterAction> {
        if let Some(Capture::Eye { ui_width, .. }) = self.main.capture.as_deref() {
            // Two unit intervals span the plot, centered on the eye.
            let eye_width = 2.0 * ui_width;
            if group.time.set_scale(self.view.width as f64 / eye_width) {
                group.time.x_axis_offset = -ui_width;
            }
        }
        self.mark_geometry_dirty();
        vec![RouterAction::Redraw, RouterAction::RedrawTimeline]
    }

    pub fn mark_geometry_dirty(&mut self) {
        self.geometry_dirty = true;
    }

    pub fn is_geometry_dirty(&self) -> bool {
        self.geometry_dirty
    }

    /// Consume the dirty flag.
    pub fn take_geometry_dirty(&mut self) -> bool {
        std::mem::take(&mut self.geometry_dirty)
    }

    pub fn clear_persistence(&mut self) {
        self.persistence_clear_pending = true;
    }

    /// Consume a pending persistence clear.
    pub fn take_persistence_clear(&mut self) -> bool {
        std::mem::take(&mut self.persistence_clear_pending)
    }

    pub fn toggle_persistence(&mut self) {
        self.persistence = !self.persistence;
    }

    /// Main channel shows an eye pattern.
    pub fn is_eye(&self) -> bool {
        self.main.is_eye()
    }

    /// Main channel renders through the density path.
    pub fn is_density(&self) -> bool {
        self.main.is_eye() || self.main.is_waterfall()
    }

    pub fn overlays(&self) -> &[Channel] {
        &self.overlays
    }

    pub fn add_overlay(&mut self, channel: Channel) {
        self.overlays.push(channel);
        self.mark_geometry_dirty();
    }

    /// Drop an overlay and everything the layout knows about it.
    pub fn remove_overlay(&mut self, id: ChannelId) -> Option<Channel> {
        let pos = self.overlays.iter().position(|c| c.id == id)?;
        self.layout.remove_overlay(id);
        Some(self.overlays.remove(pos))
    }

    /// Main channel or one of the overlays.
    pub fn channel(&self, id: ChannelId) -> Option<&Channel> {
        if self.main.id == id {
            return Some(&self.main);
        }
        self.overlays.iter().find(|c| c.id == id)
    }

    pub fn channel_mut(&mut self, id: ChannelId) -> Option<&mut Channel> {
        if self.main.id == id {
            return Some(&mut self.main);
        }
        self.overlays.iter_mut().find(|c| c.id == id)
    }

    /// Mapper for the main channel.
    pub fn mapper<'a>(&'a self, time: &'a TimeAxis) -> CoordinateMapper<'a> {
        CoordinateMapper::new(time, &self.view, self.main.offset)
    }

    /// Window y of the trigger level, when the main channel is the trigger source.
    pub fn trigger_handle_y(&self, time: &TimeAxis, scope: &dyn TriggerControl) -> Option<f32> {
        let index = self.main.hardware_index()?;
        if scope.trigger_channel() != Some(index) {
            return None;
        }
        Some(self.mapper(time).volts_to_pixel(scope.trigger_voltage()))
    }

    /// Geometry inputs for the main trace.
    pub fn main_geometry_params(&self, time: &TimeAxis) -> GeometryParams {
        let style = match self.main.y_unit {
            YAxisUnit::Decibels => TraceStyle::Spectrum,
            YAxisUnit::Volts => TraceStyle::Analog,
        };
        self.params_with(time, self.main.offset, style)
    }

    /// Geometry inputs for the overlay in registration slot `slot`.
    pub fn overlay_geometry_params(&self, time: &TimeAxis, slot: usize) -> Option<GeometryParams> {
        let channel = self.overlays.get(slot)?;
        let position = self.layout.overlay_position(channel.id, slot);
        Some(self.params_with(
            time,
            channel.offset,
            TraceStyle::Digital { position },
        ))
    }

    fn params_with(&self, time: &TimeAxis, offset: f32, style: TraceStyle) -> GeometryParams {
        GeometryParams {
            parallel_threshold: self.parallel_threshold,
            ..GeometryParams::new(time, &self.view, offset, style)
        }
    }

    /// Split the area into what a decoration painter reads and the layout it writes.
    pub fn paint_context<'a>(
        &'a mut self,
        group: &'a WaveformGroup,
        trigger_voltage: Option<f32>,
    ) -> PaintContext<'a> {
        PaintContext {
            view: &self.view,
            group,
            main: &self.main,
            overlays: &self.overlays,
            layout: &mut self.layout,
            trigger_voltage,
        }
    }
}

/// Decoder grid size for a density capture drawn in a `width`×`height` area.
pub fn density_grid_size(kind: CaptureKind, width: u32, height: u32) -> Option<(u32, u32)> {
    match kind {
        CaptureKind::Eye => Some((width / 4, height)),
        CaptureKind::Waterfall => Some((width, height)),
        CaptureKind::Analog | CaptureKind::Digital => None,
    }
}
