//! Pointer hit testing against the current area layout.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::channel::ChannelId;

/// Distance from the trigger level, in pixels, that still grabs the trigger handle.
pub const TRIGGER_HANDLE_RADIUS: f32 = 20.0;

/// Default spacing between stacked digital overlays, in pixels.
pub const OVERLAY_SPACING: f32 = 30.0;

/// Axis-aligned rectangle in window pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True if `p` lies inside the rectangle (edges included).
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }
}

/// Semantic region under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClickLocation {
    /// Waveform plot area.
    Plot,
    /// Vertical scale gutter right of the plot.
    VerticalScale,
    /// Trigger level handle in the gutter.
    Trigger,
    /// A channel name label.
    ChannelName,
    #[default]
    None,
}

/// Screen rectangles published by the decoration painter each frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    /// Right edge of the plot area.
    pub plot_right: f32,
    /// Name label of the area's main channel.
    pub info_box: Option<Rect>,
    /// Overlay name labels, in registration order.
    pub overlay_boxes: Vec<(ChannelId, Rect)>,
    /// Window y of each digital overlay row.
    pub overlay_positions: Vec<(ChannelId, f32)>,
}

impl Layout {
    pub fn new(plot_right: f32) -> Self {
        Self {
            plot_right,
            ..Self::default()
        }
    }

    /// Replace (or add) the label box of one overlay, keeping its order.
    pub fn set_overlay_box(&mut self, id: ChannelId, rect: Rect) {
        match self.overlay_boxes.iter_mut().find(|(c, _)| *c == id) {
            Some((_, r)) => *r = rect,
            None => self.overlay_boxes.push((id, rect)),
        }
    }

    /// Forget everything published for a removed overlay.
    pub fn remove_overlay(&mut self, id: ChannelId) {
        self.overlay_boxes.retain(|(c, _)| *c != id);
        self.overlay_positions.retain(|(c, _)| *c != id);
    }

    /// Position of an overlay, falling back to stacking by registration slot.
    pub fn overlay_position(&self, id: ChannelId, slot: usize) -> f32 {
        self.overlay_positions
            .iter()
            .find(|(c, _)| *c == id)
            .map(|(_, y)| *y)
            .unwrap_or(OVERLAY_SPACING * (slot as f32 + 1.0))
    }
}

/// Classification of one pointer position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitResult {
    pub location: ClickLocation,
    /// Channel the click applies to.
    pub selected: ChannelId,
}

/// Classify `point` against `layout`.
///
/// `main` is selected unless the pointer is on an overlay label; overlay boxes
/// are checked in registration order and the first match wins.
/// `trigger_handle_y` is the window y of the trigger level, and must only be
/// given when the area's main channel is the scope's trigger source.
pub fn hit_test(
    layout: &Layout,
    point: Vec2,
    main: ChannelId,
    trigger_handle_y: Option<f32>,
) -> HitResult {
    let hit = |location, selected| HitResult { location, selected };

    if layout.info_box.is_some_and(|r| r.contains(point)) {
        return hit(ClickLocation::ChannelName, main);
    }

    if let Some((id, _)) = layout
        .overlay_boxes
        .iter()
        .find(|(_, r)| r.contains(point))
    {
        return hit(ClickLocation::ChannelName, *id);
    }

    if point.x > layout.plot_right {
        if let Some(vy) = trigger_handle_y {
            if (point.y - vy).abs() < TRIGGER_HANDLE_RADIUS
                && point.x < layout.plot_right + TRIGGER_HANDLE_RADIUS
            {
                return hit(ClickLocation::Trigger, main);
            }
        }
        return hit(ClickLocation::VerticalScale, main);
    }

    hit(ClickLocation::Plot, main)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN: ChannelId = ChannelId(1);

    fn layout() -> Layout {
        let mut layout = Layout::new(700.0);
        layout.info_box = Some(Rect::new(10.0, 10.0, 80.0, 20.0));
        layout.set_overlay_box(ChannelId(2), Rect::new(10.0, 500.0, 80.0, 20.0));
        layout.set_overlay_box(ChannelId(3), Rect::new(50.0, 510.0, 80.0, 20.0));
        layout
    }

    #[test]
    fn test_point_in_plot() {
        let r = hit_test(&layout(), Vec2::new(300.0, 300.0), MAIN, None);
        assert_eq!(r.location, ClickLocation::Plot);
        assert_eq!(r.selected, MAIN);
    }

    #[test]
    fn test_main_label_selects_main() {
        let r = hit_test(&layout(), Vec2::new(20.0, 15.0), MAIN, None);
        assert_eq!(r.location, ClickLocation::ChannelName);
        assert_eq!(r.selected, MAIN);
    }

    #[test]
    fn test_overlay_label_selects_overlay() {
        let r = hit_test(&layout(), Vec2::new(20.0, 505.0), MAIN, None);
        assert_eq!(r.location, ClickLocation::ChannelName);
        assert_eq!(r.selected, ChannelId(2));
    }

    #[test]
    fn test_overlapping_labels_first_registered_wins() {
        // (60, 515) is inside both overlay boxes.
        let r = hit_test(&layout(), Vec2::new(60.0, 515.0), MAIN, None);
        assert_eq!(r.selected, ChannelId(2));
    }

    #[test]
    fn test_right_of_plot_is_never_plot() {
        let layout = layout();
        for x in [700.5, 710.0, 750.0, 799.0] {
            for y in [0.0, 300.0, 599.0] {
                let r = hit_test(&layout, Vec2::new(x, y), MAIN, Some(300.0));
                assert_ne!(r.location, ClickLocation::Plot, "({x}, {y})");
            }
        }
    }

    #[test]
    fn test_trigger_handle_radius() {
        let layout = layout();
        let near = hit_test(&layout, Vec2::new(710.0, 310.0), MAIN, Some(300.0));
        assert_eq!(near.location, ClickLocation::Trigger);

        let far_y = hit_test(&layout, Vec2::new(710.0, 325.0), MAIN, Some(300.0));
        assert_eq!(far_y.location, ClickLocation::VerticalScale);

        let far_x = hit_test(&layout, Vec2::new(725.0, 300.0), MAIN, Some(300.0));
        assert_eq!(far_x.location, ClickLocation::VerticalScale);
    }

    #[test]
    fn test_no_trigger_handle_when_not_trigger_source() {
        let r = hit_test(&layout(), Vec2::new(710.0, 300.0), MAIN, None);
        assert_eq!(r.location, ClickLocation::VerticalScale);
    }

    #[test]
    fn test_overlay_position_fallback_and_removal() {
        let mut layout = layout();
        layout.overlay_positions.push((ChannelId(3), 75.0));
        assert_eq!(layout.overlay_position(ChannelId(3), 1), 75.0);
        assert_eq!(layout.overlay_position(ChannelId(2), 0), OVERLAY_SPACING);

        layout.remove_overlay(ChannelId(3));
        assert_eq!(layout.overlay_boxes.len(), 1);
        assert_eq!(layout.overlay_position(ChannelId(3), 1), 2.0 * OVERLAY_SPACING);
    }
}
