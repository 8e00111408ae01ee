//! Scopeview GPU: wgpu rasterization and compositing of waveform areas.
//!
//! This crate owns every GPU resource. It exposes a plain wgpu API: the host
//! hands [`WaveformRenderer`] a device, a queue and a target view per frame.

pub mod buffers;
pub mod compositor;
pub mod density;
pub mod diagnostics;
pub mod overlay_layer;
pub mod rasterizer;
pub mod readback;
pub mod renderer;
pub mod stats;

use std::sync::Arc;

pub use buffers::{RenderData, RenderDataMap, RenderKey};
pub use diagnostics::GpuStage;
pub use renderer::{FrameReport, WaveformRenderer};
pub use stats::{RenderStats, StatsHandle};

#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("GPU poll failed: {0}")]
    Poll(#[from] wgpu::PollError),
    #[error("buffer mapping failed: {0}")]
    Map(#[from] wgpu::BufferAsyncError),
}

/// Features the renderer needs beyond the WebGPU baseline.
pub fn required_features() -> wgpu::Features {
    wgpu::Features::empty()
}

/// Device and queue shared by the renderer and its host.
#[derive(Clone)]
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
}

impl GpuContext {
    /// Pick an adapter and open a device, blocking on the futures.
    pub fn create_blocking() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            ..Default::default()
        }))?;

        let info = adapter.get_info();
        tracing::info!("GPU adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("scopeview_device"),
            required_features: required_features(),
            required_limits: wgpu::Limits::default(),
            ..Default::default()
        }))?;

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }
}
