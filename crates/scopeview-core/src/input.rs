//! Pointer, scroll and menu handling for one waveform area.
//!
//! The router owns only the drag state. Everything it changes lives in the
//! [`InputContext`] it is handed per event, and everything it cannot do itself
//! (redraws, dialogs, menus) comes back as [`RouterAction`] values.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::area::{CursorMode, WaveformArea, WaveformGroup};
use crate::channel::{Channel, ChannelColorAllocator, ChannelId, ChannelKind, Coupling};
use crate::hit_test::{ClickLocation, HitResult, hit_test};
use crate::view::ZOOM_STEP;

/// Voltage range multiplier per scroll step over the vertical scale.
pub const VSCALE_STEP: f32 = 0.9;

/// Half height of an overlay row that still selects it, in pixels.
const OVERLAY_ROW_HALF_HEIGHT: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    DraggingCursor,
    DraggingTrigger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    Single,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other,
}

/// Edge the scope triggers on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TriggerType {
    #[default]
    Rising,
    Falling,
    Either,
}

/// Trigger settings of the attached instrument.
pub trait TriggerControl {
    fn trigger_voltage(&self) -> f32;
    fn set_trigger_voltage(&mut self, volts: f32);
    /// Hardware index of the trigger source, if any.
    fn trigger_channel(&self) -> Option<usize>;
    fn set_trigger_channel(&mut self, index: usize);
    fn trigger_type(&self) -> TriggerType;
    fn set_trigger_type(&mut self, kind: TriggerType);
}

/// Requests the router hands back to the hosting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterAction {
    /// Repaint this area.
    Redraw,
    /// Repaint every area in the group.
    RedrawGroup,
    /// Repaint the group's timeline.
    RedrawTimeline,
    /// Drop accumulated persistence in every area.
    ClearPersistence,
    /// Fit the time axis to the capture.
    AutofitHorizontal,
    ShowContextMenu(ChannelId),
    OpenChannelProperties(ChannelId),
    OpenDecoderConfig(ChannelId),
    /// An overlay was removed; its render resources can go.
    OverlayRemoved(ChannelId),
    /// The main channel was hidden; the whole area goes.
    RemoveArea,
    /// A decoder needs an area of its own.
    NewArea(ChannelId),
}

/// Mutable state one event may touch.
pub struct InputContext<'a> {
    pub area: &'a mut WaveformArea,
    pub group: &'a mut WaveformGroup,
    pub scope: Option<&'a mut dyn TriggerControl>,
}

impl<'a> InputContext<'a> {
    pub fn new(area: &'a mut WaveformArea, group: &'a mut WaveformGroup) -> Self {
        Self {
            area,
            group,
            scope: None,
        }
    }

    pub fn with_scope(mut self, scope: &'a mut dyn TriggerControl) -> Self {
        self.scope = Some(scope);
        self
    }

    fn hit(&self, pos: Vec2) -> HitResult {
        let handle = self
            .scope
            .as_deref()
            .and_then(|s| self.area.trigger_handle_y(&self.group.time, s));
        hit_test(&self.area.layout, pos, self.area.main.id, handle)
    }

    fn set_trigger_from_y(&mut self, y: f32) -> bool {
        let volts = self.area.mapper(&self.group.time).pixel_to_volts(y);
        match self.scope.as_deref_mut() {
            Some(scope) => {
                scope.set_trigger_voltage(volts);
                true
            }
            None => false,
        }
    }
}

/// Input state machine of one waveform area.
#[derive(Debug, Clone)]
pub struct InputRouter {
    drag: DragState,
    /// Last known pointer position, window space.
    pointer: Vec2,
    selected: Option<ChannelId>,
}

impl Default for InputRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl InputRouter {
    pub fn new() -> Self {
        Self {
            drag: DragState::Idle,
            pointer: Vec2::ZERO,
            selected: None,
        }
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    /// Channel picked by the last press, falling back to the main channel.
    pub fn selected(&self, area: &WaveformArea) -> ChannelId {
        self.selected.unwrap_or(area.main.id)
    }

    // ── Pointer ──

    pub fn button_press(
        &mut self,
        ctx: &mut InputContext<'_>,
        pos: Vec2,
        button: PointerButton,
        click: ClickKind,
    ) -> Vec<RouterAction> {
        self.pointer = pos;
        let hit = ctx.hit(pos);
        let mut selected = hit.selected;

        // Pressing on a digital overlay row selects that overlay.
        for (id, y) in &ctx.area.layout.overlay_positions {
            if (pos.y - y).abs() <= OVERLAY_ROW_HALF_HEIGHT {
                selected = *id;
            }
        }
        self.selected = Some(selected);

        match click {
            ClickKind::Single => self.single_click(ctx, hit.location, pos, button, selected),
            ClickKind::Double => Self::double_click(ctx, hit.location, selected),
        }
    }

    fn single_click(
        &mut self,
        ctx: &mut InputContext<'_>,
        location: ClickLocation,
        pos: Vec2,
        button: PointerButton,
        selected: ChannelId,
    ) -> Vec<RouterAction> {
        match (location, button) {
            (ClickLocation::Plot, PointerButton::Left) => {
                let t = ctx.group.time.pixel_to_time(pos.x);
                let mode = ctx.group.cursor_mode;
                if mode == CursorMode::Dual {
                    self.drag = DragState::DraggingCursor;
                    ctx.group.cursors[1] = t;
                }
                if matches!(mode, CursorMode::Single | CursorMode::Dual) {
                    ctx.group.cursors[0] = t;
                }
                if mode == CursorMode::None {
                    Vec::new()
                } else {
                    vec![RouterAction::RedrawGroup]
                }
            }
            (ClickLocation::Plot, PointerButton::Middle) => vec![RouterAction::AutofitHorizontal],
            (ClickLocation::Plot, PointerButton::Right) => {
                vec![RouterAction::ShowContextMenu(selected)]
            }
            (ClickLocation::Trigger, PointerButton::Left) => {
                self.drag = DragState::DraggingTrigger;
                vec![RouterAction::Redraw]
            }
            _ => Vec::new(),
        }
    }

    fn double_click(
        ctx: &mut InputContext<'_>,
        location: ClickLocation,
        selected: ChannelId,
    ) -> Vec<RouterAction> {
        if location != ClickLocation::ChannelName {
            return Vec::new();
        }
        match ctx.area.channel(selected).map(|c| &c.kind) {
            Some(ChannelKind::Physical { .. }) => vec![RouterAction::OpenChannelProperties(selected)],
            Some(ChannelKind::Decoder { .. }) => vec![RouterAction::OpenDecoderConfig(selected)],
            None => Vec::new(),
        }
    }

    pub fn motion(&mut self, ctx: &mut InputContext<'_>, pos: Vec2) -> Vec<RouterAction> {
        self.pointer = pos;
        match self.drag {
            DragState::DraggingTrigger => {
                if !ctx.set_trigger_from_y(pos.y) {
                    return Vec::new();
                }
                ctx.area.clear_persistence();
                vec![RouterAction::ClearPersistence, RouterAction::Redraw]
            }
            DragState::DraggingCursor if ctx.group.cursor_mode == CursorMode::Dual => {
                ctx.group.cursors[1] = ctx.group.time.pixel_to_time(pos.x);
                vec![RouterAction::RedrawGroup]
            }
            _ => Vec::new(),
        }
    }

    pub fn button_release(
        &mut self,
        ctx: &mut InputContext<'_>,
        pos: Vec2,
        button: PointerButton,
    ) -> Vec<RouterAction> {
        self.pointer = pos;
        let mut actions = Vec::new();
        match self.drag {
            DragState::DraggingTrigger if button == PointerButton::Left => {
                if ctx.set_trigger_from_y(pos.y) {
                    ctx.area.clear_persistence();
                    actions.push(RouterAction::ClearPersistence);
                }
            }
            DragState::DraggingCursor if ctx.group.cursor_mode == CursorMode::Dual => {
                ctx.group.cursors[1] = ctx.group.time.pixel_to_time(pos.x);
                actions.push(RouterAction::RedrawGroup);
            }
            _ => {}
        }

        if self.drag != DragState::Idle {
            self.drag = DragState::Idle;
            actions.push(RouterAction::Redraw);
        }
        actions
    }

    pub fn scroll(
        &mut self,
        ctx: &mut InputContext<'_>,
        pos: Vec2,
        direction: ScrollDirection,
    ) -> Vec<RouterAction> {
        self.pointer = pos;
        match ctx.hit(pos).location {
            ClickLocation::Plot => {
                if ctx.area.is_eye() {
                    return Vec::new();
                }
                let factor = match direction {
                    ScrollDirection::Up => ZOOM_STEP,
                    ScrollDirection::Down => 1.0 / ZOOM_STEP,
                    ScrollDirection::Left | ScrollDirection::Right => {
                        tracing::trace!("horizontal scroll ignored");
                        return Vec::new();
                    }
                };
                if !ctx.group.time.zoom(factor, pos.x) {
                    return Vec::new();
                }
                ctx.area.mark_geometry_dirty();
                vec![RouterAction::RedrawGroup, RouterAction::RedrawTimeline]
            }
            ClickLocation::VerticalScale => {
                let range = ctx.area.main.voltage_range();
                let new_range = match direction {
                    ScrollDirection::Up => range * VSCALE_STEP,
                    ScrollDirection::Down => range / VSCALE_STEP,
                    ScrollDirection::Left | ScrollDirection::Right => return Vec::new(),
                };
                ctx.area.main.set_voltage_range(new_range);
                ctx.area.mark_geometry_dirty();
                vec![RouterAction::Redraw]
            }
            _ => Vec::new(),
        }
    }

    pub fn key_press(&mut self, key: Key) -> Vec<RouterAction> {
        match (key, self.drag) {
            (Key::Escape, DragState::DraggingCursor | DragState::DraggingTrigger) => {
                self.drag = DragState::Idle;
                vec![RouterAction::Redraw]
            }
            _ => Vec::new(),
        }
    }

    // ── Menu commands ──

    pub fn set_cursor_mode(&self, group: &mut WaveformGroup, mode: CursorMode) -> Vec<RouterAction> {
        group.cursor_mode = mode;
        vec![RouterAction::RedrawGroup]
    }

    /// Trigger on the area's main channel with the given edge.
    pub fn set_trigger_mode(
        &self,
        ctx: &mut InputContext<'_>,
        kind: TriggerType,
    ) -> Vec<RouterAction> {
        let Some(index) = ctx.area.main.hardware_index() else {
            tracing::debug!("{}: not a hardware channel, trigger mode ignored", ctx.area.main.id);
            return Vec::new();
        };
        let Some(scope) = ctx.scope.as_deref_mut() else {
            return Vec::new();
        };
        scope.set_trigger_channel(index);
        scope.set_trigger_type(kind);
        ctx.area.clear_persistence();
        vec![RouterAction::ClearPersistence]
    }

    pub fn set_bandwidth_limit(&self, area: &mut WaveformArea, mhz: u32) -> Vec<RouterAction> {
        self.with_selected(area, |ch| ch.set_bandwidth_limit(mhz))
    }

    pub fn set_attenuation(&self, area: &mut WaveformArea, factor: f32) -> Vec<RouterAction> {
        self.with_selected(area, |ch| ch.set_attenuation(factor))
    }

    pub fn set_coupling(&self, area: &mut WaveformArea, coupling: Coupling) -> Vec<RouterAction> {
        self.with_selected(area, |ch| ch.set_coupling(coupling))
    }

    fn with_selected(
        &self,
        area: &mut WaveformArea,
        apply: impl FnOnce(&mut Channel) -> bool,
    ) -> Vec<RouterAction> {
        let id = self.selected(area);
        let changed = area.channel_mut(id).is_some_and(apply);
        if !changed {
            return Vec::new();
        }
        area.clear_persistence();
        vec![RouterAction::ClearPersistence, RouterAction::Redraw]
    }

    pub fn toggle_persistence(&self, area: &mut WaveformArea) -> Vec<RouterAction> {
        area.toggle_persistence();
        vec![RouterAction::Redraw]
    }

    /// Hide the selected channel: drop an overlay, or the whole area for the main channel.
    pub fn hide_selected(&mut self, area: &mut WaveformArea) -> Vec<RouterAction> {
        let id = self.selected(area);
        if id == area.main.id {
            return vec![RouterAction::RemoveArea];
        }
        self.selected = None;
        match area.remove_overlay(id) {
            Some(_) => vec![RouterAction::OverlayRemoved(id), RouterAction::Redraw],
            None => Vec::new(),
        }
    }

    /// Place a newly configured decoder, assigning it the next default color.
    ///
    /// Overlay decoders join this area. Others are handed back in
    /// [`DecoderPlacement::NewArea`] for the host to give them an area.
    pub fn add_decoder(
        &self,
        area: &mut WaveformArea,
        mut decoder: Channel,
        colors: &mut ChannelColorAllocator,
    ) -> DecoderPlacement {
        decoder.color = colors.advance();
        match decoder.kind {
            ChannelKind::Decoder { overlay: true } => {
                area.add_overlay(decoder);
                DecoderPlacement::Overlay
            }
            _ => DecoderPlacement::NewArea(Box::new(decoder)),
        }
    }
}

/// Where [`InputRouter::add_decoder`] put a decoder.
#[derive(Debug)]
pub enum DecoderPlacement {
    Overlay,
    NewArea(Box<Channel>),
}

impl DecoderPlacement {
    pub fn actions(&self) -> Vec<RouterAction> {
        match self {
            Self::Overlay => vec![RouterAction::Redraw],
            Self::NewArea(ch) => vec![RouterAction::NewArea(ch.id)],
        }
    }
}

#[cfg(test)]
mod tests {
    use palette::Srgb;

    use super::*;
    use crate::config::ViewerConfig;
    use crate::hit_test::Rect;
    use crate::view::TimeAxis;

    const EPSILON: f32 = 1e-4;

    #[derive(Default)]
    struct MockScope {
        voltage: f32,
        channel: Option<usize>,
        kind: TriggerType,
    }

    impl TriggerControl for MockScope {
        fn trigger_voltage(&self) -> f32 {
            self.voltage
        }
        fn set_trigger_voltage(&mut self, volts: f32) {
            self.voltage = volts;
        }
        fn trigger_channel(&self) -> Option<usize> {
            self.channel
        }
        fn set_trigger_channel(&mut self, index: usize) {
            self.channel = Some(index);
        }
        fn trigger_type(&self) -> TriggerType {
            self.kind
        }
        fn set_trigger_type(&mut self, kind: TriggerType) {
            self.kind = kind;
        }
    }

    fn area() -> WaveformArea {
        let ch = Channel::physical(ChannelId(1), "CH1", 0, Srgb::new(255, 255, 0));
        let mut area = WaveformArea::new(ch, 800, 600, &ViewerConfig::default());
        area.resize(800, 600);
        area.view.plot_right = 700;
        area.layout.plot_right = 700.0;
        area.layout.info_box = Some(Rect::new(10.0, 10.0, 60.0, 20.0));
        area.main.set_voltage_range(2.0);
        area.refresh_vertical_scale();
        area
    }

    fn decoder(id: u32, overlay: bool) -> Channel {
        Channel::decoder(ChannelId(id), "UART", overlay, Srgb::new(0, 0, 0))
    }

    #[test]
    fn test_scroll_on_vertical_scale_changes_range() {
        let mut area = area();
        area.main.set_voltage_range(5.0);
        let mut group = WaveformGroup::default();
        let mut router = InputRouter::new();
        let gutter = Vec2::new(750.0, 300.0);

        area.take_geometry_dirty();
        let mut ctx = InputContext::new(&mut area, &mut group);
        router.scroll(&mut ctx, gutter, ScrollDirection::Up);
        assert!((area.main.voltage_range() - 4.5).abs() < EPSILON);
        assert!(area.take_geometry_dirty());

        let mut ctx = InputContext::new(&mut area, &mut group);
        router.scroll(&mut ctx, gutter, ScrollDirection::Down);
        assert!((area.main.voltage_range() - 5.0).abs() < EPSILON);
        assert!(area.take_geometry_dirty());

        area.main.set_voltage_range(5.0);
        let mut ctx = InputContext::new(&mut area, &mut group);
        router.scroll(&mut ctx, gutter, ScrollDirection::Down);
        assert!((area.main.voltage_range() - 5.0 / 0.9).abs() < EPSILON);
    }

    #[test]
    fn test_dual_cursor_press_starts_drag() {
        let mut area = area();
        let mut group = WaveformGroup {
            time: TimeAxis::new(1.0, 0.0),
            cursor_mode: CursorMode::Dual,
            cursors: [0.0, 0.0],
        };
        let mut router = InputRouter::new();
        let mut ctx = InputContext::new(&mut area, &mut group);

        let actions = router.button_press(
            &mut ctx,
            Vec2::new(500.0, 300.0),
            PointerButton::Left,
            ClickKind::Single,
        );
        assert_eq!(group.cursors, [500.0, 500.0]);
        assert_eq!(router.drag_state(), DragState::DraggingCursor);
        assert_eq!(actions, vec![RouterAction::RedrawGroup]);
    }

    #[test]
    fn test_single_cursor_press_places_first_cursor_only() {
        let mut area = area();
        let mut group = WaveformGroup {
            cursor_mode: CursorMode::Single,
            cursors: [1.0, 2.0],
            ..WaveformGroup::default()
        };
        let mut router = InputRouter::new();
        let mut ctx = InputContext::new(&mut area, &mut group);
        router.button_press(&mut ctx, Vec2::new(250.0, 300.0), PointerButton::Left, ClickKind::Single);
        assert_eq!(group.cursors, [250.0, 2.0]);
        assert_eq!(router.drag_state(), DragState::Idle);
    }

    #[test]
    fn test_cursor_drag_follows_pointer_until_release() {
        let mut area = area();
        let mut group = WaveformGroup {
            cursor_mode: CursorMode::Dual,
            ..WaveformGroup::default()
        };
        let mut router = InputRouter::new();
        let mut ctx = InputContext::new(&mut area, &mut group);
        router.button_press(&mut ctx, Vec2::new(100.0, 300.0), PointerButton::Left, ClickKind::Single);
        router.motion(&mut ctx, Vec2::new(150.0, 300.0));
        assert_eq!(ctx.group.cursors, [100.0, 150.0]);
        router.button_release(&mut ctx, Vec2::new(175.0, 300.0), PointerButton::Left);
        assert_eq!(ctx.group.cursors, [100.0, 175.0]);
        assert_eq!(router.drag_state(), DragState::Idle);

        router.motion(&mut ctx, Vec2::new(400.0, 300.0));
        assert_eq!(ctx.group.cursors[1], 175.0);
    }

    #[test]
    fn test_trigger_drag_sets_voltage_and_clears_persistence() {
        let mut area = area();
        let mut group = WaveformGroup::default();
        let mut scope = MockScope {
            voltage: 0.0,
            channel: Some(0),
            ..MockScope::default()
        };
        let mut router = InputRouter::new();
        let mut ctx = InputContext::new(&mut area, &mut group).with_scope(&mut scope);

        // 0 V sits at y = 300.
        router.button_press(&mut ctx, Vec2::new(705.0, 305.0), PointerButton::Left, ClickKind::Single);
        assert_eq!(router.drag_state(), DragState::DraggingTrigger);

        let actions = router.motion(&mut ctx, Vec2::new(705.0, 150.0));
        assert!(actions.contains(&RouterAction::ClearPersistence));
        assert!(ctx.area.take_persistence_clear());

        let actions = router.button_release(&mut ctx, Vec2::new(705.0, 0.0), PointerButton::Left);
        assert!(actions.contains(&RouterAction::ClearPersistence));
        assert_eq!(router.drag_state(), DragState::Idle);
        assert!((scope.voltage - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_no_trigger_handle_on_other_channel() {
        let mut area = area();
        let mut group = WaveformGroup::default();
        let mut scope = MockScope {
            channel: Some(3),
            ..MockScope::default()
        };
        let mut router = InputRouter::new();
        let mut ctx = InputContext::new(&mut area, &mut group).with_scope(&mut scope);
        router.button_press(&mut ctx, Vec2::new(705.0, 300.0), PointerButton::Left, ClickKind::Single);
        assert_eq!(router.drag_state(), DragState::Idle);
    }

    #[test]
    fn test_escape_cancels_drag() {
        let mut area = area();
        let mut group = WaveformGroup {
            cursor_mode: CursorMode::Dual,
            ..WaveformGroup::default()
        };
        let mut router = InputRouter::new();
        let mut ctx = InputContext::new(&mut area, &mut group);
        router.button_press(&mut ctx, Vec2::new(100.0, 300.0), PointerButton::Left, ClickKind::Single);
        assert_eq!(router.key_press(Key::Escape), vec![RouterAction::Redraw]);
        assert_eq!(router.drag_state(), DragState::Idle);
        assert!(router.key_press(Key::Escape).is_empty());
    }

    #[test]
    fn test_plot_scroll_zooms_except_for_eye() {
        let mut area = area();
        let mut group = WaveformGroup::default();
        let mut router = InputRouter::new();
        let mut ctx = InputContext::new(&mut area, &mut group);
        let actions = router.scroll(&mut ctx, Vec2::new(200.0, 300.0), ScrollDirection::Up);
        assert_eq!(actions, vec![RouterAction::RedrawGroup, RouterAction::RedrawTimeline]);
        assert!((group.time.pixels_per_x_unit() - ZOOM_STEP).abs() < 1e-9);

        area.main.capture = Some(std::sync::Arc::new(crate::capture::Capture::Eye {
            grid: crate::capture::DensityGrid::new(1, 1),
            ui_width: 10.0,
        }));
        let mut ctx = InputContext::new(&mut area, &mut group);
        assert!(router.scroll(&mut ctx, Vec2::new(200.0, 300.0), ScrollDirection::Up).is_empty());
        assert!((group.time.pixels_per_x_unit() - ZOOM_STEP).abs() < 1e-9);
    }

    #[test]
    fn test_double_click_opens_dialog_by_kind() {
        let mut area = area();
        area.add_overlay(decoder(5, true));
        area.layout.set_overlay_box(ChannelId(5), Rect::new(10.0, 40.0, 60.0, 20.0));
        let mut group = WaveformGroup::default();
        let mut router = InputRouter::new();
        let mut ctx = InputContext::new(&mut area, &mut group);

        let main = router.button_press(&mut ctx, Vec2::new(20.0, 20.0), PointerButton::Left, ClickKind::Double);
        assert_eq!(main, vec![RouterAction::OpenChannelProperties(ChannelId(1))]);

        let dec = router.button_press(&mut ctx, Vec2::new(20.0, 50.0), PointerButton::Left, ClickKind::Double);
        assert_eq!(dec, vec![RouterAction::OpenDecoderConfig(ChannelId(5))]);
    }

    #[test]
    fn test_middle_and_right_clicks() {
        let mut area = area();
        let mut group = WaveformGroup::default();
        let mut router = InputRouter::new();
        let mut ctx = InputContext::new(&mut area, &mut group);
        let p = Vec2::new(300.0, 300.0);
        assert_eq!(
            router.button_press(&mut ctx, p, PointerButton::Middle, ClickKind::Single),
            vec![RouterAction::AutofitHorizontal]
        );
        assert_eq!(
            router.button_press(&mut ctx, p, PointerButton::Right, ClickKind::Single),
            vec![RouterAction::ShowContextMenu(ChannelId(1))]
        );
    }

    #[test]
    fn test_trigger_mode_targets_main_channel() {
        let mut area = area();
        let mut group = WaveformGroup::default();
        let mut scope = MockScope::default();
        let router = InputRouter::new();
        let mut ctx = InputContext::new(&mut area, &mut group).with_scope(&mut scope);
        let actions = router.set_trigger_mode(&mut ctx, TriggerType::Falling);
        assert_eq!(actions, vec![RouterAction::ClearPersistence]);
        assert_eq!(scope.channel, Some(0));
        assert_eq!(scope.kind, TriggerType::Falling);
    }

    #[test]
    fn test_unsupported_bandwidth_is_ignored() {
        let mut area = area();
        let router = InputRouter::new();
        assert!(router.set_bandwidth_limit(&mut area, 350).is_empty());
        assert!(!area.take_persistence_clear());
        assert_eq!(
            router.set_bandwidth_limit(&mut area, 20),
            vec![RouterAction::ClearPersistence, RouterAction::Redraw]
        );
    }

    #[test]
    fn test_hide_overlay_then_main() {
        let mut area = area();
        area.add_overlay(decoder(5, true));
        area.layout.overlay_positions.push((ChannelId(5), 500.0));
        let mut group = WaveformGroup::default();
        let mut router = InputRouter::new();
        let mut ctx = InputContext::new(&mut area, &mut group);
        router.button_press(&mut ctx, Vec2::new(300.0, 505.0), PointerButton::Right, ClickKind::Single);
        assert_eq!(router.selected(&area), ChannelId(5));

        let actions = router.hide_selected(&mut area);
        assert_eq!(actions, vec![RouterAction::OverlayRemoved(ChannelId(5)), RouterAction::Redraw]);
        assert!(area.overlays().is_empty());
        assert_eq!(router.hide_selected(&mut area), vec![RouterAction::RemoveArea]);
    }

    #[test]
    fn test_add_decoder_assigns_colors_in_order() {
        let mut area = area();
        let router = InputRouter::new();
        let mut colors = ChannelColorAllocator::new();
        let first = colors.peek();

        let placed = router.add_decoder(&mut area, decoder(5, true), &mut colors);
        assert_eq!(placed.actions(), vec![RouterAction::Redraw]);
        assert_eq!(area.overlays()[0].color, first);

        let second = colors.peek();
        match router.add_decoder(&mut area, decoder(6, false), &mut colors) {
            DecoderPlacement::NewArea(ch) => assert_eq!(ch.color, second),
            DecoderPlacement::Overlay => panic!("non-overlay decoder joined the area"),
        }
        assert_eq!(colors.assigned(), 2);
    }
}
