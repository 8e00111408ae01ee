//! Scopeview Core: domain layer for oscilloscope waveform viewing.
//!
//! This crate contains capture and channel models, coordinate mapping, hit
//! testing, trace geometry preparation, the pointer input state machine and
//! the software overlay surfaces. No GPU or framework dependencies.

pub mod area;
pub mod capture;
pub mod channel;
pub mod config;
pub mod geometry;
pub mod hit_test;
pub mod input;
pub mod overlay;
pub mod ramp;
pub mod view;

// Re-exports for convenience.
pub use area::{AreaId, CursorMode, WaveformArea, WaveformGroup};
pub use capture::{Capture, CaptureKind, DensityGrid, SampledCapture};
pub use channel::{Channel, ChannelColorAllocator, ChannelId, ChannelKind};
pub use config::{ConfigError, ViewerConfig};
pub use geometry::{GeometryError, GeometryParams, TraceGeometry, TraceStyle};
pub use hit_test::{ClickLocation, HitResult, Layout, Rect};
pub use input::{DragState, InputContext, InputRouter, RouterAction, TriggerControl, TriggerType};
pub use overlay::{BasicDecorations, DecorationPainter, OverlayPass, OverlaySurface, PaintContext};
pub use ramp::EyeColorRamp;
pub use view::{CoordinateMapper, TimeAxis, ViewState};
