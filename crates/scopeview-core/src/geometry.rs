//! Trace geometry preparation: sample → pixel vertices and the per-column
//! sample index consumed by the compute rasterizer.
//!
//! # Algorithm
//! 1. Every sample is mapped to a raster-space `(x, y)` vertex. There is no
//!    cross-sample dependency, so large captures are mapped in parallel.
//! 2. A single forward scan over columns and samples (O(columns + samples))
//!    records, for each pixel column, the last sample starting at or before
//!    that column. Columns left of the first sample get the sentinel value
//!    `depth`, meaning "draw nothing here".
//!
//! Samples are expected in non-decreasing x order. Gaps wider than a pixel are
//! not interpolated: the rasterizer draws the segment between the two
//! neighbouring samples and nothing else.

use rayon::prelude::*;

use crate::capture::{Capture, CaptureKind, SampledCapture};
use crate::view::{DB_RANGE, TimeAxis, ViewState, db_to_pixel};

/// Height of a digital trace's high level above its low level, in pixels.
const DIGITAL_SWING: f32 = 20.0;
/// Low level of a digital trace above its baseline, in pixels.
const DIGITAL_LOW: f32 = 5.0;
/// Gap between a digital overlay's position and its baseline, in pixels.
const DIGITAL_BASELINE_GAP: f32 = 15.0;
/// Smallest magnitude fed to the dB conversion.
const MIN_MAGNITUDE: f32 = 1e-12;

/// Why no geometry was produced for a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    #[error("capture has no samples")]
    Empty,
    #[error("{0} captures are not drawn as line traces")]
    Unsupported(CaptureKind),
}

/// How sample values map to raster y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TraceStyle {
    /// Volts, centered on the plot.
    Analog,
    /// Magnitudes plotted on the fixed dB scale.
    Spectrum,
    /// Two-level trace stacked at `position` pixels below the top.
    Digital { position: f32 },
}

/// Everything the builder reads from the current view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryParams {
    pub pixels_per_x_unit: f64,
    pub x_axis_offset: f64,
    /// Number of columns in the index buffer.
    pub width: u32,
    pub height: u32,
    pub pixels_per_volt: f32,
    /// Channel vertical offset, in volts.
    pub channel_offset: f32,
    pub padding: f32,
    pub style: TraceStyle,
    /// Captures at least this long are mapped with rayon.
    pub parallel_threshold: usize,
}

impl GeometryParams {
    /// Params for a channel drawn in `view` on `time`.
    pub fn new(time: &TimeAxis, view: &ViewState, channel_offset: f32, style: TraceStyle) -> Self {
        Self {
            pixels_per_x_unit: time.pixels_per_x_unit(),
            x_axis_offset: time.x_axis_offset,
            width: view.width,
            height: view.height,
            pixels_per_volt: view.pixels_per_volt,
            channel_offset,
            padding: view.padding,
            style,
            parallel_threshold: 1 << 14,
        }
    }
}

/// Renderable representation of one capture.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceGeometry {
    /// Raster-space `(x, y)` per sample.
    pub vertices: Vec<[f32; 2]>,
    /// Per-column index of the first sample to draw, or `depth`.
    pub column_index: Vec<u32>,
    /// Sample count.
    pub depth: u32,
}

impl TraceGeometry {
    /// Sentinel column entry.
    pub fn sentinel(&self) -> u32 {
        self.depth
    }
}

/// Build vertices and column index for `capture`.
pub fn build_geometry(
    capture: &Capture,
    params: &GeometryParams,
) -> Result<TraceGeometry, GeometryError> {
    let vertices = compute_vertices(capture, params)?;
    let column_index = build_column_index(&vertices, params.width);
    Ok(TraceGeometry {
        depth: vertices.len() as u32,
        vertices,
        column_index,
    })
}

/// Map every sample of `capture` to a raster-space vertex.
pub fn compute_vertices(
    capture: &Capture,
    params: &GeometryParams,
) -> Result<Vec<[f32; 2]>, GeometryError> {
    if capture.is_empty() {
        return Err(GeometryError::Empty);
    }

    let ybase = params.height as f32 / 2.0;
    match capture {
        Capture::Analog(cap) => Ok(match params.style {
            TraceStyle::Spectrum => map_samples(cap, params, |&v| {
                let db = -DB_RANGE - 20.0 * v.max(MIN_MAGNITUDE).log10();
                db_to_pixel(db, params.height, params.padding)
            }),
            _ => map_samples(cap, params, |&v| {
                params.pixels_per_volt * (v + params.channel_offset) + ybase
            }),
        }),
        Capture::Digital(cap) => {
            let position = match params.style {
                TraceStyle::Digital { position } => position,
                _ => 0.0,
            };
            let base = params.height as f32 - (position + DIGITAL_BASELINE_GAP);
            Ok(map_samples(cap, params, |&bit| {
                base + DIGITAL_LOW + if bit { DIGITAL_SWING } else { 0.0 }
            }))
        }
        other => Err(GeometryError::Unsupported(other.kind())),
    }
}

fn map_samples<T, F>(cap: &SampledCapture<T>, params: &GeometryParams, y: F) -> Vec<[f32; 2]>
where
    T: Sync,
    F: Fn(&T) -> f32 + Sync,
{
    let xscale = cap.timescale * params.pixels_per_x_unit;
    let xoff = (cap.trigger_phase - params.x_axis_offset) * params.pixels_per_x_unit;
    let n = cap.len();
    let vertex = |(&offset, value): (&i64, &T)| [(offset as f64 * xscale + xoff) as f32, y(value)];

    if n >= params.parallel_threshold {
        cap.offsets[..n]
            .par_iter()
            .zip(cap.samples[..n].par_iter())
            .map(vertex)
            .collect()
    } else {
        cap.offsets[..n]
            .iter()
            .zip(cap.samples[..n].iter())
            .map(vertex)
            .collect()
    }
}

/// For each of `width` columns, the index of the last vertex with `x <= column`.
///
/// A vertex landing exactly on a column belongs to that column. When several
/// vertices fall before the same column the latest one wins. Columns before the
/// first vertex get `vertices.len()`.
pub fn build_column_index(vertices: &[[f32; 2]], width: u32) -> Vec<u32> {
    let count = vertices.len();
    let sentinel = count as u32;
    let mut index = vec![sentinel; width as usize];
    if count == 0 {
        return index;
    }

    let mut nsample = 0usize;
    for (col, entry) in index.iter_mut().enumerate() {
        let col = col as f32;
        while nsample + 1 < count && vertices[nsample + 1][0] <= col {
            nsample += 1;
        }
        if vertices[nsample][0] <= col {
            *entry = nsample as u32;
        }
    }
    index
}
