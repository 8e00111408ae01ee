//! Software-rendered decoration layers.
//!
//! Each frame paints two [`OverlaySurface`]s through a [`DecorationPainter`]:
//! the underlay (grid, background) starts opaque black, the overlay (cursors,
//! labels) starts fully transparent. Surfaces store premultiplied RGBA8 so the
//! GPU can composite the overlay with `One, OneMinusSrcAlpha` directly.

use image::{Rgba, RgbaImage};
use palette::Srgba;

use crate::area::{CursorMode, WaveformGroup};
use crate::channel::Channel;
use crate::hit_test::{Layout, OVERLAY_SPACING, Rect};
use crate::input::TriggerControl;
use crate::view::{CoordinateMapper, TimeAxis, ViewState};

/// Which decoration layer a surface holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPass {
    Underlay,
    Overlay,
}

impl OverlayPass {
    fn clear_color(self) -> Rgba<u8> {
        match self {
            Self::Underlay => Rgba([0, 0, 0, 255]),
            Self::Overlay => Rgba([0, 0, 0, 0]),
        }
    }
}

/// Premultiplied RGBA8 drawing surface.
#[derive(Debug, Clone)]
pub struct OverlaySurface {
    pass: OverlayPass,
    image: RgbaImage,
}

impl OverlaySurface {
    pub fn new(pass: OverlayPass, width: u32, height: u32) -> Self {
        Self {
            pass,
            image: RgbaImage::from_pixel(width, height, pass.clear_color()),
        }
    }

    /// Clear for a new frame, reallocating if the size changed.
    pub fn reset(&mut self, width: u32, height: u32) {
        let clear = self.pass.clear_color();
        if self.image.dimensions() != (width, height) {
            self.image = RgbaImage::from_pixel(width, height, clear);
        } else {
            for px in self.image.pixels_mut() {
                *px = clear;
            }
        }
    }

    pub fn pass(&self) -> OverlayPass {
        self.pass
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Raw premultiplied bytes, row-major, top row first.
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Composite one straight-alpha color over pixel `(x, y)`.
    pub fn blend_pixel(&mut self, x: i64, y: i64, color: Srgba<u8>) {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return;
        }
        let src = premultiply(color);
        let dst = self.image.get_pixel_mut(x as u32, y as u32);
        let inv = 255 - src[3] as u32;
        for c in 0..4 {
            dst.0[c] = (src[c] as u32 + (dst.0[c] as u32 * inv + 127) / 255).min(255) as u8;
        }
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Srgba<u8>) {
        let x0 = rect.x.floor() as i64;
        let y0 = rect.y.floor() as i64;
        let x1 = (rect.x + rect.width).ceil() as i64;
        let y1 = (rect.y + rect.height).ceil() as i64;
        for y in y0.max(0)..y1.min(self.height() as i64) {
            for x in x0.max(0)..x1.min(self.width() as i64) {
                self.blend_pixel(x, y, color);
            }
        }
    }

    pub fn hline(&mut self, y: f32, x0: f32, x1: f32, color: Srgba<u8>) {
        let (a, b) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
        self.fill_rect(Rect::new(a, y.round(), b - a, 1.0), color);
    }

    pub fn vline(&mut self, x: f32, y0: f32, y1: f32, color: Srgba<u8>) {
        let (a, b) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };
        self.fill_rect(Rect::new(x.round(), a, 1.0, b - a), color);
    }
}

fn premultiply(color: Srgba<u8>) -> [u8; 4] {
    let a = color.alpha as u32;
    let scale = |c: u8| ((c as u32 * a + 127) / 255) as u8;
    [
        scale(color.color.red),
        scale(color.color.green),
        scale(color.color.blue),
        color.alpha,
    ]
}

/// What a painter may read, plus the layout it publishes for hit testing.
pub struct PaintContext<'a> {
    pub view: &'a ViewState,
    pub group: &'a WaveformGroup,
    pub main: &'a Channel,
    pub overlays: &'a [Channel],
    pub layout: &'a mut Layout,
    /// Trigger level of the main channel, in volts, if it is the trigger source.
    pub trigger_voltage: Option<f32>,
}

impl PaintContext<'_> {
    pub fn time(&self) -> &TimeAxis {
        &self.group.time
    }

    pub fn mapper(&self) -> CoordinateMapper<'_> {
        CoordinateMapper::new(&self.group.time, self.view, self.main.offset)
    }
}

/// Draws grid, cursors and labels. Called once per pass per frame.
pub trait DecorationPainter {
    fn paint_underlay(&mut self, surface: &mut OverlaySurface, ctx: &mut PaintContext<'_>);
    fn paint_overlay(&mut self, surface: &mut OverlaySurface, ctx: &mut PaintContext<'_>);
}

/// Minimal decorations: a graticule, cursor lines, label swatches and the
/// trigger marker.
#[derive(Debug, Clone)]
pub struct BasicDecorations {
    pub divisions: u32,
    pub grid_color: Srgba<u8>,
    pub axis_color: Srgba<u8>,
    pub cursor_colors: [Srgba<u8>; 2],
}

impl Default for BasicDecorations {
    fn default() -> Self {
        Self {
            divisions: 10,
            grid_color: Srgba::new(0x40, 0x40, 0x40, 0xff),
            axis_color: Srgba::new(0x80, 0x80, 0x80, 0xff),
            cursor_colors: [
                Srgba::new(0xff, 0xff, 0x00, 0xc0),
                Srgba::new(0xff, 0x80, 0x00, 0xc0),
            ],
        }
    }
}

const LABEL_HEIGHT: f32 = 16.0;
const LABEL_CHAR_WIDTH: f32 = 7.0;
const LABEL_MARGIN: f32 = 4.0;

fn label_rect(name: &str, x: f32, y: f32) -> Rect {
    let width = name.chars().count() as f32 * LABEL_CHAR_WIDTH + 2.0 * LABEL_MARGIN;
    Rect::new(x, y, width, LABEL_HEIGHT)
}

impl DecorationPainter for BasicDecorations {
    fn paint_underlay(&mut self, surface: &mut OverlaySurface, ctx: &mut PaintContext<'_>) {
        let right = ctx.view.plot_right as f32;
        let height = ctx.view.height as f32;
        let n = self.divisions.max(1);

        for i in 1..n {
            let y = height * i as f32 / n as f32;
            surface.hline(y, 0.0, right, self.grid_color);
            let x = right * i as f32 / n as f32;
            surface.vline(x, 0.0, height, self.grid_color);
        }

        // Zero volt line of the main channel.
        let zero = ctx.mapper().volts_to_pixel(0.0);
        surface.hline(zero, 0.0, right, self.axis_color);
        surface.vline(right, 0.0, height, self.axis_color);
    }

    fn paint_overlay(&mut self, surface: &mut OverlaySurface, ctx: &mut PaintContext<'_>) {
        let right = ctx.view.plot_right as f32;
        let height = ctx.view.height as f32;

        let ncursors = match ctx.group.cursor_mode {
            CursorMode::None => 0,
            CursorMode::Single => 1,
            CursorMode::Dual => 2,
        };
        for (i, &t) in ctx.group.cursors.iter().take(ncursors).enumerate() {
            let x = ctx.time().time_to_pixel(t);
            if (0.0..=right).contains(&x) {
                surface.vline(x, 0.0, height, self.cursor_colors[i]);
            }
        }

        if let Some(volts) = ctx.trigger_voltage {
            let y = ctx.mapper().volts_to_pixel(volts);
            surface.fill_rect(
                Rect::new(right + 1.0, y - 4.0, 10.0, 8.0),
                with_alpha(ctx.main.color, 0xff),
            );
        }

        let main_box = label_rect(&ctx.main.name, LABEL_MARGIN, LABEL_MARGIN);
        surface.fill_rect(main_box, with_alpha(ctx.main.color, 0xc0));
        ctx.layout.info_box = Some(main_box);

        let overlays = ctx.overlays;
        let mut y = main_box.y + main_box.height + LABEL_MARGIN;
        for (slot, ch) in overlays.iter().enumerate() {
            let rect = label_rect(&ch.name, LABEL_MARGIN, y);
            surface.fill_rect(rect, with_alpha(ch.color, 0xc0));
            ctx.layout.set_overlay_box(ch.id, rect);
            if !ctx.layout.overlay_positions.iter().any(|(id, _)| *id == ch.id) {
                ctx.layout
                    .overlay_positions
                    .push((ch.id, OVERLAY_SPACING * (slot as f32 + 1.0)));
            }
            y += LABEL_HEIGHT + LABEL_MARGIN;
        }
    }
}

fn with_alpha(color: palette::Srgb<u8>, alpha: u8) -> Srgba<u8> {
    Srgba::new(color.red, color.green, color.blue, alpha)
}

/// Read the trigger level to draw, when the main channel is the source.
pub fn trigger_marker(main: &Channel, scope: Option<&dyn TriggerControl>) -> Option<f32> {
    let scope = scope?;
    let index = main.hardware_index()?;
    (scope.trigger_channel() == Some(index)).then(|| scope.trigger_voltage())
}

#[cfg(test)]
mod tests {
    use palette::Srgb;

    use super::*;
    use crate::channel::ChannelId;

    fn context<'a>(
        view: &'a ViewState,
        group: &'a WaveformGroup,
        main: &'a Channel,
        overlays: &'a [Channel],
        layout: &'a mut Layout,
    ) -> PaintContext<'a> {
        PaintContext {
            view,
            group,
            main,
            overlays,
            layout,
            trigger_voltage: None,
        }
    }

    #[test]
    fn test_surfaces_start_cleared_per_pass() {
        let under = OverlaySurface::new(OverlayPass::Underlay, 4, 4);
        let over = OverlaySurface::new(OverlayPass::Overlay, 4, 4);
        assert_eq!(under.image().get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(over.image().get_pixel(3, 3).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_blend_is_premultiplied_over() {
        let mut s = OverlaySurface::new(OverlayPass::Overlay, 2, 1);
        s.blend_pixel(0, 0, Srgba::new(255, 0, 0, 128));
        assert_eq!(s.image().get_pixel(0, 0).0, [128, 0, 0, 128]);

        // Second half-transparent layer over the first.
        s.blend_pixel(0, 0, Srgba::new(0, 0, 255, 128));
        let px = s.image().get_pixel(0, 0).0;
        assert_eq!(px[2], 128);
        assert_eq!(px[0], 64);
        assert_eq!(px[3], 192);
    }

    #[test]
    fn test_opaque_over_opaque_replaces() {
        let mut s = OverlaySurface::new(OverlayPass::Underlay, 1, 1);
        s.blend_pixel(0, 0, Srgba::new(10, 20, 30, 255));
        assert_eq!(s.image().get_pixel(0, 0).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_drawing_is_clipped() {
        let mut s = OverlaySurface::new(OverlayPass::Overlay, 8, 8);
        s.fill_rect(Rect::new(-5.0, -5.0, 100.0, 100.0), Srgba::new(255, 255, 255, 255));
        s.blend_pixel(-1, 3, Srgba::new(0, 0, 0, 255));
        s.blend_pixel(3, 8, Srgba::new(0, 0, 0, 255));
        assert!(s.image().pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn test_reset_reallocates_on_resize() {
        let mut s = OverlaySurface::new(OverlayPass::Overlay, 4, 4);
        s.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0), Srgba::new(1, 2, 3, 255));
        s.reset(4, 4);
        assert!(s.image().pixels().all(|p| p.0 == [0, 0, 0, 0]));
        s.reset(6, 2);
        assert_eq!((s.width(), s.height()), (6, 2));
    }

    #[test]
    fn test_basic_overlay_publishes_label_boxes() {
        let view = ViewState::new(400, 300);
        let group = WaveformGroup {
            cursor_mode: CursorMode::Dual,
            cursors: [10.0, 20.0],
            ..WaveformGroup::default()
        };
        let main = Channel::physical(ChannelId(1), "CH1", 0, Srgb::new(255, 255, 0));
        let overlays = vec![Channel::decoder(ChannelId(2), "UART", true, Srgb::new(0, 255, 0))];
        let mut layout = Layout::new(400.0);
        let mut surface = OverlaySurface::new(OverlayPass::Overlay, 400, 300);
        let mut painter = BasicDecorations::default();

        let mut ctx = context(&view, &group, &main, &overlays, &mut layout);
        painter.paint_overlay(&mut surface, &mut ctx);

        let info = layout.info_box.expect("main label published");
        assert_eq!(layout.overlay_boxes.len(), 1);
        assert!(layout.overlay_boxes[0].1.y > info.y);
        assert_eq!(layout.overlay_positions, vec![(ChannelId(2), OVERLAY_SPACING)]);

        // Cursor lines land at their pixel columns.
        assert_ne!(surface.image().get_pixel(10, 200).0[3], 0);
        assert_ne!(surface.image().get_pixel(20, 200).0[3], 0);
        assert_eq!(surface.image().get_pixel(30, 200).0[3], 0);
    }

    #[test]
    fn test_basic_underlay_draws_zero_line() {
        let mut view = ViewState::new(200, 100);
        view.update_vertical_scale(2.0);
        let group = WaveformGroup::default();
        let main = Channel::physical(ChannelId(1), "CH1", 0, Srgb::new(255, 255, 0));
        let mut layout = Layout::new(200.0);
        let mut surface = OverlaySurface::new(OverlayPass::Underlay, 200, 100);
        let mut painter = BasicDecorations {
            divisions: 1,
            ..BasicDecorations::default()
        };

        let mut ctx = context(&view, &group, &main, &[], &mut layout);
        painter.paint_underlay(&mut surface, &mut ctx);
        assert_eq!(surface.image().get_pixel(5, 50).0, [0x80, 0x80, 0x80, 0xff]);
        assert_eq!(surface.image().get_pixel(5, 20).0, [0, 0, 0, 0xff]);
    }
}
