//! Per-stage GPU validation reporting.
//!
//! wgpu reports API misuse through error scopes rather than return codes.
//! Each stage of a frame runs inside its own scope so a failure names the
//! stage that caused it.

use std::fmt;

/// Stages of a frame that touch the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuStage {
    TextureAllocation,
    GeometryUpload,
    DensityUpload,
    Rasterize,
    OverlayUpload,
    Composite,
}

impl fmt::Display for GpuStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TextureAllocation => "texture allocation",
            Self::GeometryUpload => "geometry upload",
            Self::DensityUpload => "density upload",
            Self::Rasterize => "rasterize",
            Self::OverlayUpload => "overlay upload",
            Self::Composite => "composite",
        };
        f.write_str(name)
    }
}

/// Run `f` inside a validation error scope.
///
/// Returns `f`'s value and whether the stage completed without a
/// validation error. Errors are logged, never raised.
pub fn with_error_scope<T>(
    device: &wgpu::Device,
    stage: GpuStage,
    f: impl FnOnce() -> T,
) -> (T, bool) {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = f();
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => {
            tracing::warn!("GPU error during {stage}: {err}");
            (value, false)
        }
        None => (value, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(GpuStage::Rasterize.to_string(), "rasterize");
        assert_eq!(GpuStage::TextureAllocation.to_string(), "texture allocation");
    }
}
