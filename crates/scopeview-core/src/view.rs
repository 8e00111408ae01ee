//! View state and coordinate mapping between axis units and pixels.
//!
//! Two pixel spaces are in play:
//! - **window space** (pointer events, hit testing): origin top-left, y down;
//! - **raster space** (trace geometry): origin bottom-left, y up.
//!
//! Every conversion here is a pure function of the current [`TimeAxis`],
//! [`ViewState`] and channel parameters. Nothing is cached.

use serde::{Deserialize, Serialize};

/// Dynamic range of spectrum plots in dB. Not user configurable.
pub const DB_RANGE: f32 = 70.0;

/// Horizontal zoom factor per scroll step.
pub const ZOOM_STEP: f64 = 1.5;

/// Horizontal scale and origin, shared by every area in a group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeAxis {
    pixels_per_x_unit: f64,
    /// Axis time at the left edge of the plot.
    pub x_axis_offset: f64,
}

impl Default for TimeAxis {
    fn default() -> Self {
        Self {
            pixels_per_x_unit: 1.0,
            x_axis_offset: 0.0,
        }
    }
}

impl TimeAxis {
    /// Create a time axis. Falls back to 1 px/unit for an invalid scale.
    pub fn new(pixels_per_x_unit: f64, x_axis_offset: f64) -> Self {
        let mut axis = Self {
            x_axis_offset,
            ..Self::default()
        };
        axis.set_scale(pixels_per_x_unit);
        axis
    }

    pub fn pixels_per_x_unit(&self) -> f64 {
        self.pixels_per_x_unit
    }

    /// Set the horizontal scale. The scale must stay strictly positive and
    /// finite for the pixel/time maps to be invertible; other values are
    /// ignored.
    pub fn set_scale(&mut self, pixels_per_x_unit: f64) -> bool {
        if !(pixels_per_x_unit.is_finite() && pixels_per_x_unit > 0.0) {
            tracing::debug!("ignoring horizontal scale {pixels_per_x_unit}");
            return false;
        }
        self.pixels_per_x_unit = pixels_per_x_unit;
        true
    }

    /// Window x of axis time `t`.
    pub fn time_to_pixel(&self, t: f64) -> f32 {
        ((t - self.x_axis_offset) * self.pixels_per_x_unit) as f32
    }

    /// Axis time at window x `p`.
    pub fn pixel_to_time(&self, p: f32) -> f64 {
        self.x_axis_offset + p as f64 / self.pixels_per_x_unit
    }

    /// Multiply the scale by `factor`, keeping the time under `anchor_px` fixed.
    pub fn zoom(&mut self, factor: f64, anchor_px: f32) -> bool {
        let anchor_time = self.pixel_to_time(anchor_px);
        if !self.set_scale(self.pixels_per_x_unit * factor) {
            return false;
        }
        self.x_axis_offset = anchor_time - anchor_px as f64 / self.pixels_per_x_unit;
        true
    }
}

/// Per-area viewport state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub width: u32,
    pub height: u32,
    /// Right edge of the plot area; the vertical scale gutter starts here.
    pub plot_right: u32,
    /// Derived every frame as `height / voltage_range`.
    pub pixels_per_volt: f32,
    /// Top/bottom padding of spectrum plots.
    pub padding: f32,
    /// Global trace alpha, 0..=1.
    pub trace_alpha: f32,
}

impl ViewState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            plot_right: width,
            pixels_per_volt: 1.0,
            padding: 2.0,
            trace_alpha: 0.5,
        }
    }

    /// Recompute pixels-per-volt from the channel's range. Ranges are kept
    /// strictly positive by [`crate::channel::Channel::set_voltage_range`].
    pub fn update_vertical_scale(&mut self, voltage_range: f32) {
        self.pixels_per_volt = self.height as f32 / voltage_range;
    }

    /// Vertical center of the plot, in pixels.
    pub fn mid_y(&self) -> f32 {
        self.height as f32 / 2.0
    }

    /// Raster y of a dB value on a spectrum plot.
    pub fn db_to_pixel(&self, db: f32) -> f32 {
        db_to_pixel(db, self.height, self.padding)
    }
}

/// Map a dB value onto a plot of the given height with a fixed 70 dB range.
pub fn db_to_pixel(db: f32, height: u32, padding: f32) -> f32 {
    let plot_height = height as f32 - 2.0 * padding;
    padding - (db / DB_RANGE * plot_height)
}

/// Borrowed view of everything needed to convert one channel's coordinates.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateMapper<'a> {
    pub time: &'a TimeAxis,
    pub view: &'a ViewState,
    /// Vertical offset of the channel, in volts.
    pub channel_offset: f32,
}

impl<'a> CoordinateMapper<'a> {
    pub fn new(time: &'a TimeAxis, view: &'a ViewState, channel_offset: f32) -> Self {
        Self {
            time,
            view,
            channel_offset,
        }
    }

    pub fn time_to_pixel(&self, t: f64) -> f32 {
        self.time.time_to_pixel(t)
    }

    pub fn pixel_to_time(&self, p: f32) -> f64 {
        self.time.pixel_to_time(p)
    }

    /// Window y of voltage `v`. Zero volts (after offset) sits mid-plot.
    pub fn volts_to_pixel(&self, v: f32) -> f32 {
        self.view.mid_y() - (v + self.channel_offset) * self.view.pixels_per_volt
    }

    /// Voltage at window y `p`.
    pub fn pixel_to_volts(&self, p: f32) -> f32 {
        -(p - self.view.mid_y()) / self.view.pixels_per_volt - self.channel_offset
    }

    pub fn db_to_pixel(&self, db: f32) -> f32 {
        self.view.db_to_pixel(db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-6;

    #[test]
    fn test_time_roundtrip() {
        for &scale in &[1e-6, 0.25, 1.0, 3.7, 1e4] {
            let axis = TimeAxis::new(scale, -1234.5);
            for &t in &[-1e5, -1.0, 0.0, 17.25, 9_999.0] {
                let p = axis.time_to_pixel(t);
                let back = axis.pixel_to_time(p);
                let tol = EPSILON.max(t.abs() * 1e-6) + 1.0 / scale * 1e-3;
                assert!((back - t).abs() <= tol, "scale {scale} t {t} -> {back}");
            }
        }
    }

    #[test]
    fn test_volts_roundtrip() {
        let time = TimeAxis::default();
        let mut view = ViewState::new(800, 600);
        view.update_vertical_scale(2.0);
        let mapper = CoordinateMapper::new(&time, &view, 0.25);
        for &v in &[-3.0f32, -1.0, 0.0, 0.5, 1.0, 7.5] {
            let back = mapper.pixel_to_volts(mapper.volts_to_pixel(v));
            assert!((back - v).abs() < 1e-4, "{v} -> {back}");
        }
    }

    #[test]
    fn test_volts_map_is_sign_flipped_about_center() {
        let time = TimeAxis::default();
        let mut view = ViewState::new(800, 600);
        view.update_vertical_scale(2.0);
        assert_eq!(view.pixels_per_volt, 300.0);
        let mapper = CoordinateMapper::new(&time, &view, 0.0);
        assert_eq!(mapper.volts_to_pixel(0.0), 300.0);
        assert_eq!(mapper.volts_to_pixel(1.0), 0.0);
        assert_eq!(mapper.volts_to_pixel(-1.0), 600.0);
    }

    #[test]
    fn test_db_map_spans_padded_plot() {
        let view = ViewState {
            padding: 10.0,
            ..ViewState::new(100, 200)
        };
        assert_eq!(view.db_to_pixel(0.0), 10.0);
        assert!((view.db_to_pixel(-DB_RANGE) - 190.0).abs() < 1e-4);
    }

    #[test]
    fn test_invalid_scale_is_ignored() {
        let mut axis = TimeAxis::new(2.0, 0.0);
        assert!(!axis.set_scale(0.0));
        assert!(!axis.set_scale(-1.0));
        assert!(!axis.set_scale(f64::INFINITY));
        assert_eq!(axis.pixels_per_x_unit(), 2.0);
        assert_eq!(TimeAxis::new(0.0, 5.0).pixels_per_x_unit(), 1.0);
    }

    #[test]
    fn test_zoom_keeps_anchor_time_fixed() {
        let mut axis = TimeAxis::new(1.0, 100.0);
        let before = axis.pixel_to_time(250.0);
        assert!(axis.zoom(ZOOM_STEP, 250.0));
        assert!((axis.pixels_per_x_unit() - 1.5).abs() < EPSILON);
        assert!((axis.pixel_to_time(250.0) - before).abs() < 1e-3);
        assert!(axis.zoom(1.0 / ZOOM_STEP, 250.0));
        assert!((axis.pixels_per_x_unit() - 1.0).abs() < EPSILON);
    }
}
