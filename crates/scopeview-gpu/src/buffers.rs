//! Per-channel GPU resources for line-trace rendering.

use std::collections::HashMap;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use scopeview_core::{AreaId, Capture, ChannelId, GeometryParams, TraceGeometry};

/// Format of trace intensity textures.
pub const INTENSITY_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;

/// Smallest storage buffer allocated, in bytes.
const MIN_STORAGE_BYTES: u64 = 256;

/// Rasterizer uniform. Matches `TraceConfig` in `rasterize_trace.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TraceConfigGpu {
    pub window_height: u32,
    pub plot_width: u32,
    pub depth: u32,
    /// Trace alpha on a 0..=256 scale.
    pub alpha: f32,
}

/// Compositor uniform. Matches `TraceColor` in `colormap.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TraceColorGpu {
    pub color: [f32; 4],
}

/// Inputs the uploaded geometry was built from.
///
/// Holding the capture keeps its allocation alive, so pointer identity
/// cannot be confused with a later capture.
#[derive(Debug, Clone)]
pub(crate) struct GeometryKey {
    pub params: GeometryParams,
    pub capture: Arc<Capture>,
}

impl GeometryKey {
    pub fn matches(&self, params: &GeometryParams, capture: &Arc<Capture>) -> bool {
        self.params == *params && Arc::ptr_eq(&self.capture, capture)
    }
}

/// Texture and buffers for one rendered channel.
pub struct RenderData {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub vertices: wgpu::Buffer,
    pub config: wgpu::Buffer,
    pub column_index: wgpu::Buffer,
    pub color: wgpu::Buffer,
    /// False when the last geometry build produced nothing drawable.
    pub geometry_ok: bool,
    width: u32,
    height: u32,
    depth: u32,
    plot_width: u32,
    pub(crate) key: Option<GeometryKey>,
}

impl RenderData {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let (texture, view) = create_intensity_texture(device, width, height);
        Self {
            texture,
            view,
            vertices: storage_buffer(device, "scopeview_trace_vertices", MIN_STORAGE_BYTES),
            config: uniform_buffer(device, "scopeview_trace_config"),
            column_index: storage_buffer(device, "scopeview_trace_index", MIN_STORAGE_BYTES),
            color: uniform_buffer(device, "scopeview_trace_color"),
            geometry_ok: false,
            width,
            height,
            depth: 0,
            plot_width: 0,
            key: None,
        }
    }

    /// Texture dimensions.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Sample count of the uploaded geometry.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Columns the rasterizer will cover.
    pub fn plot_width(&self) -> u32 {
        self.plot_width
    }

    /// Reallocate the texture if the viewport changed. Returns true if it did.
    pub fn ensure_size(&mut self, device: &wgpu::Device, width: u32, height: u32) -> bool {
        if (self.width, self.height) == (width, height) {
            return false;
        }
        self.texture.destroy();
        let (texture, view) = create_intensity_texture(device, width, height);
        self.texture = texture;
        self.view = view;
        self.width = width;
        self.height = height;
        self.key = None;
        true
    }

    /// Upload vertices and column index, growing buffers as needed.
    pub fn upload_geometry(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        geometry: &TraceGeometry,
    ) {
        let vertex_bytes: &[u8] = bytemuck::cast_slice(&geometry.vertices);
        let index_bytes: &[u8] = bytemuck::cast_slice(&geometry.column_index);

        grow(device, &mut self.vertices, "scopeview_trace_vertices", vertex_bytes.len() as u64);
        grow(device, &mut self.column_index, "scopeview_trace_index", index_bytes.len() as u64);

        queue.write_buffer(&self.vertices, 0, vertex_bytes);
        queue.write_buffer(&self.column_index, 0, index_bytes);
        self.depth = geometry.depth;
        self.geometry_ok = geometry.depth > 0;
    }

    /// Mark the geometry unusable for this frame.
    pub fn invalidate(&mut self) {
        self.geometry_ok = false;
        self.depth = 0;
        self.key = None;
    }

    /// Write the rasterizer uniform. `plot_width` is clamped to the texture.
    pub fn write_config(&mut self, queue: &wgpu::Queue, plot_width: u32, alpha: f32) {
        self.plot_width = plot_width.min(self.width);
        let config = TraceConfigGpu {
            window_height: self.height,
            plot_width: self.plot_width,
            depth: self.depth,
            alpha,
        };
        queue.write_buffer(&self.config, 0, bytemuck::bytes_of(&config));
    }

    pub fn write_color(&self, queue: &wgpu::Queue, rgba: [f32; 4]) {
        queue.write_buffer(&self.color, 0, bytemuck::bytes_of(&TraceColorGpu { color: rgba }));
    }

    fn destroy(&self) {
        self.texture.destroy();
        self.vertices.destroy();
        self.config.destroy();
        self.column_index.destroy();
        self.color.destroy();
    }
}

/// Identifies one channel as drawn in one area.
pub type RenderKey = (AreaId, ChannelId);

/// Render data keyed by area and channel, created on first use and destroyed
/// on removal.
#[derive(Default)]
pub struct RenderDataMap {
    entries: HashMap<RenderKey, RenderData>,
}

impl RenderDataMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a channel's render data, creating it at the given size if absent.
    pub fn get_or_create(
        &mut self,
        device: &wgpu::Device,
        key: RenderKey,
        width: u32,
        height: u32,
    ) -> &mut RenderData {
        self.entries.entry(key).or_insert_with(|| {
            tracing::debug!("{}/{}: creating render data {width}x{height}", key.0, key.1);
            RenderData::new(device, width, height)
        })
    }

    pub fn get(&self, key: RenderKey) -> Option<&RenderData> {
        self.entries.get(&key)
    }

    pub fn get_mut(&mut self, key: RenderKey) -> Option<&mut RenderData> {
        self.entries.get_mut(&key)
    }

    /// Destroy a channel's GPU resources. Returns false if it had none.
    pub fn remove(&mut self, key: RenderKey) -> bool {
        match self.entries.remove(&key) {
            Some(data) => {
                tracing::debug!("{}/{}: destroying render data", key.0, key.1);
                data.destroy();
                true
            }
            None => false,
        }
    }

    /// Destroy the entries of `area` whose channel is not in `keep`.
    /// Other areas are untouched.
    pub fn retain_area(&mut self, area: AreaId, keep: &[ChannelId]) {
        let stale: Vec<RenderKey> = self
            .entries
            .keys()
            .copied()
            .filter(|&(a, id)| a == area && !keep.contains(&id))
            .collect();
        for key in stale {
            self.remove(key);
        }
    }

    /// Destroy everything belonging to `area`. Returns how many entries went.
    pub fn remove_area(&mut self, area: AreaId) -> usize {
        let keys: Vec<RenderKey> = self
            .entries
            .keys()
            .copied()
            .filter(|&(a, _)| a == area)
            .collect();
        for &key in &keys {
            self.remove(key);
        }
        keys.len()
    }

    pub fn contains(&self, key: RenderKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RenderKey, &RenderData)> {
        self.entries.iter()
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn create_intensity_texture(
    device: &wgpu::Device,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("scopeview_trace_intensity"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: INTENSITY_FORMAT,
        usage: wgpu::TextureUsages::STORAGE_BINDING
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

fn storage_buffer(device: &wgpu::Device, label: &str, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn uniform_buffer(device: &wgpu::Device, label: &str) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: 16,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Replace `buffer` with a larger one if `needed` bytes do not fit.
fn grow(device: &wgpu::Device, buffer: &mut wgpu::Buffer, label: &str, needed: u64) {
    if buffer.size() >= needed {
        return;
    }
    let size = needed.next_power_of_two().max(MIN_STORAGE_BYTES);
    buffer.destroy();
    *buffer = storage_buffer(device, label, size);
}
