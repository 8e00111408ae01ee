//! Capture buffers produced by acquisition and decoders.
//!
//! A capture is immutable once produced and is replaced wholesale on every
//! new acquisition, so channels share them as `Arc<Capture>`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse type discriminator for a [`Capture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaptureKind {
    /// Timed analog voltage samples.
    Analog,
    /// Timed boolean samples.
    Digital,
    /// Eye pattern density grid.
    Eye,
    /// Scrolling spectrum density grid.
    Waterfall,
}

impl fmt::Display for CaptureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Analog => write!(f, "analog"),
            Self::Digital => write!(f, "digital"),
            Self::Eye => write!(f, "eye"),
            Self::Waterfall => write!(f, "waterfall"),
        }
    }
}

/// Ordered timed samples for one channel.
///
/// Sample `j` starts at `offsets[j] * timescale + trigger_phase` in axis units.
/// Offsets are expected to be non-decreasing; this is not re-validated.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledCapture<T> {
    /// Axis units per offset tick.
    pub timescale: f64,
    /// Sub-tick trigger alignment, in axis units.
    pub trigger_phase: f64,
    /// Start of each sample, in ticks.
    pub offsets: Vec<i64>,
    /// Sample values. Same length as `offsets`.
    pub samples: Vec<T>,
}

/// Analog voltage capture.
pub type AnalogCapture = SampledCapture<f32>;
/// Digital (boolean) capture.
pub type DigitalCapture = SampledCapture<bool>;

impl<T> SampledCapture<T> {
    /// Create an empty capture with the given timescale.
    pub fn new(timescale: f64) -> Self {
        Self {
            timescale,
            trigger_phase: 0.0,
            offsets: Vec::new(),
            samples: Vec::new(),
        }
    }

    /// Build a capture from explicit `(offset, value)` pairs.
    pub fn from_points(timescale: f64, points: impl IntoIterator<Item = (i64, T)>) -> Self {
        let (offsets, samples): (Vec<i64>, Vec<T>) = points.into_iter().unzip();
        Self {
            timescale,
            trigger_phase: 0.0,
            offsets,
            samples,
        }
    }

    /// Build a uniformly sampled capture (one sample per tick).
    pub fn uniform(timescale: f64, samples: Vec<T>) -> Self {
        let offsets = (0..samples.len() as i64).collect();
        Self {
            timescale,
            trigger_phase: 0.0,
            offsets,
            samples,
        }
    }

    /// Append one sample.
    pub fn push(&mut self, offset: i64, value: T) {
        self.offsets.push(offset);
        self.samples.push(value);
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len().min(self.offsets.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start time of sample `j` in axis units.
    pub fn sample_start(&self, j: usize) -> f64 {
        self.offsets[j] as f64 * self.timescale + self.trigger_phase
    }
}

/// Row-major 2D float grid produced by eye and waterfall decoders.
///
/// Row 0 is the bottom of the plot.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    pub width: u32,
    pub height: u32,
    /// `width * height` normalized densities.
    pub data: Vec<f32>,
}

impl DensityGrid {
    /// Zero-filled grid.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; (width as usize) * (height as usize)],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.len() < self.cell_count()
    }

    /// Expected element count.
    pub fn cell_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

/// One channel's capture, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Capture {
    Analog(AnalogCapture),
    Digital(DigitalCapture),
    Eye {
        grid: DensityGrid,
        /// Width of one unit interval in axis units.
        ui_width: f64,
    },
    Waterfall(DensityGrid),
}

impl Capture {
    pub fn kind(&self) -> CaptureKind {
        match self {
            Self::Analog(_) => CaptureKind::Analog,
            Self::Digital(_) => CaptureKind::Digital,
            Self::Eye { .. } => CaptureKind::Eye,
            Self::Waterfall(_) => CaptureKind::Waterfall,
        }
    }

    /// Number of samples (or grid cells for density captures).
    pub fn len(&self) -> usize {
        match self {
            Self::Analog(c) => c.len(),
            Self::Digital(c) => c.len(),
            Self::Eye { grid, .. } | Self::Waterfall(grid) => grid.cell_count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Analog(c) => c.is_empty(),
            Self::Digital(c) => c.is_empty(),
            Self::Eye { grid, .. } | Self::Waterfall(grid) => grid.is_empty(),
        }
    }

    /// The density grid for eye/waterfall captures.
    pub fn density_grid(&self) -> Option<&DensityGrid> {
        match self {
            Self::Eye { grid, .. } | Self::Waterfall(grid) => Some(grid),
            _ => None,
        }
    }
}
