//! Physical and derived channels as seen by the rendering core.

use std::fmt;
use std::sync::Arc;

use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::capture::{Capture, CaptureKind};

/// Bandwidth limits offered for physical channels, in MHz. `0` = full bandwidth.
pub const SUPPORTED_BANDWIDTH_LIMITS_MHZ: [u32; 3] = [0, 20, 200];

/// Probe attenuation factors offered for physical channels.
pub const SUPPORTED_ATTENUATIONS: [f32; 3] = [1.0, 10.0, 20.0];

/// Default trace colors, assigned to new decoders in order.
const DEFAULT_COLORS: [(u8, u8, u8); 12] = [
    (0xa6, 0xce, 0xe3),
    (0x1f, 0x78, 0xb4),
    (0xb2, 0xdf, 0x8a),
    (0x33, 0xa0, 0x2c),
    (0xfb, 0x9a, 0x99),
    (0xe3, 0x1a, 0x1c),
    (0xfd, 0xbf, 0x6f),
    (0xff, 0x7f, 0x00),
    (0xca, 0xb2, 0xd6),
    (0x6a, 0x3d, 0x9a),
    (0xff, 0xff, 0x99),
    (0xb1, 0x59, 0x28),
];

/// Stable identity of a channel, used to key per-channel render resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub u32);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.0)
    }
}

/// Input coupling of a physical channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Coupling {
    /// DC, 1 MΩ.
    Dc1M,
    /// AC, 1 MΩ.
    Ac1M,
    /// DC, 50 Ω.
    Dc50,
    /// Grounded input.
    Gnd,
}

/// What a channel is: a scope input or a decoder output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChannelKind {
    Physical {
        /// Hardware channel index, compared against the trigger source.
        index: usize,
        coupling: Coupling,
        attenuation: f32,
        bandwidth_limit_mhz: u32,
    },
    Decoder {
        /// Drawn on top of its input's area instead of getting its own.
        overlay: bool,
    },
}

/// Units of the vertical axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum YAxisUnit {
    #[default]
    Volts,
    /// Magnitude spectrum, plotted in dB.
    Decibels,
}

/// A signal displayed by a waveform area.
#[derive(Debug, Clone)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    pub kind: ChannelKind,
    pub color: Srgb<u8>,
    /// Vertical offset in volts.
    pub offset: f32,
    voltage_range: f32,
    pub y_unit: YAxisUnit,
    pub capture: Option<Arc<Capture>>,
}

impl Channel {
    /// Create a physical input channel with DC 1 MΩ coupling and full bandwidth.
    pub fn physical(id: ChannelId, name: impl Into<String>, index: usize, color: Srgb<u8>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: ChannelKind::Physical {
                index,
                coupling: Coupling::Dc1M,
                attenuation: 1.0,
                bandwidth_limit_mhz: 0,
            },
            color,
            offset: 0.0,
            voltage_range: 1.0,
            y_unit: YAxisUnit::Volts,
            capture: None,
        }
    }

    /// Create a decoder output channel.
    pub fn decoder(id: ChannelId, name: impl Into<String>, overlay: bool, color: Srgb<u8>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: ChannelKind::Decoder { overlay },
            color,
            offset: 0.0,
            voltage_range: 1.0,
            y_unit: YAxisUnit::Volts,
            capture: None,
        }
    }

    /// Display color as opaque normalized RGBA.
    pub fn display_rgba(&self) -> [f32; 4] {
        let c = self.color.into_format::<f32>();
        [c.red, c.green, c.blue, 1.0]
    }

    /// Hardware index for physical channels.
    pub fn hardware_index(&self) -> Option<usize> {
        match self.kind {
            ChannelKind::Physical { index, .. } => Some(index),
            ChannelKind::Decoder { .. } => None,
        }
    }

    /// Full-scale vertical range in volts.
    pub fn voltage_range(&self) -> f32 {
        self.voltage_range
    }

    /// Set the vertical range. Non-positive or non-finite ranges are ignored.
    pub fn set_voltage_range(&mut self, range: f32) -> bool {
        if !(range.is_finite() && range > 0.0) {
            tracing::debug!("{}: ignoring voltage range {range}", self.id);
            return false;
        }
        self.voltage_range = range;
        true
    }

    /// Kind of the current capture, if any.
    pub fn capture_kind(&self) -> Option<CaptureKind> {
        self.capture.as_deref().map(Capture::kind)
    }

    pub fn is_eye(&self) -> bool {
        self.capture_kind() == Some(CaptureKind::Eye)
    }

    pub fn is_waterfall(&self) -> bool {
        self.capture_kind() == Some(CaptureKind::Waterfall)
    }

    /// Set the bandwidth limit. Values with no matching menu entry are ignored.
    pub fn set_bandwidth_limit(&mut self, mhz: u32) -> bool {
        match &mut self.kind {
            ChannelKind::Physical {
                bandwidth_limit_mhz,
                ..
            } if SUPPORTED_BANDWIDTH_LIMITS_MHZ.contains(&mhz) => {
                *bandwidth_limit_mhz = mhz;
                true
            }
            _ => {
                tracing::debug!("{}: ignoring bandwidth limit {mhz} MHz", self.id);
                false
            }
        }
    }

    /// Set probe attenuation. Values with no matching menu entry are ignored.
    pub fn set_attenuation(&mut self, factor: f32) -> bool {
        match &mut self.kind {
            ChannelKind::Physical { attenuation, .. }
                if SUPPORTED_ATTENUATIONS.contains(&factor) =>
            {
                *attenuation = factor;
                true
            }
            _ => {
                tracing::debug!("{}: ignoring attenuation {factor}x", self.id);
                false
            }
        }
    }

    /// Set input coupling. Ignored for decoder channels.
    pub fn set_coupling(&mut self, new: Coupling) -> bool {
        match &mut self.kind {
            ChannelKind::Physical { coupling, .. } => {
                *coupling = new;
                true
            }
            ChannelKind::Decoder { .. } => false,
        }
    }
}

/// Hands out default trace colors to newly created decoders.
///
/// The sequence only advances when a decoder is actually added, so a
/// cancelled configuration does not consume a color.
#[derive(Debug, Clone, Default)]
pub struct ChannelColorAllocator {
    assigned: usize,
}

impl ChannelColorAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Color the next decoder will get.
    pub fn peek(&self) -> Srgb<u8> {
        let (r, g, b) = DEFAULT_COLORS[self.assigned % DEFAULT_COLORS.len()];
        Srgb::new(r, g, b)
    }

    /// Commit the current color and move to the next one.
    pub fn advance(&mut self) -> Srgb<u8> {
        let color = self.peek();
        self.assigned += 1;
        color
    }

    /// How many colors have been committed.
    pub fn assigned(&self) -> usize {
        self.assigned
    }
}
