//! Textures for eye pattern and waterfall rendering.

use bytemuck::{Pod, Zeroable};
use scopeview_core::DensityGrid;
use scopeview_core::ramp::RAMP_SIZE;

/// Matches `DensityParams` in `density.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DensityParamsGpu {
    pub viewport: [f32; 2],
    pub grid: [f32; 2],
}

/// Density grid texture, color ramp and their uniform.
pub struct DensityLayer {
    grid: Option<(wgpu::Texture, wgpu::TextureView)>,
    grid_size: (u32, u32),
    ramp_view: wgpu::TextureView,
    ramp: wgpu::Texture,
    params: wgpu::Buffer,
}

impl DensityLayer {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, ramp: &[[u8; 4]]) -> Self {
        let ramp_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("scopeview_density_ramp"),
            size: wgpu::Extent3d {
                width: RAMP_SIZE as u32,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let ramp_view = ramp_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let params = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scopeview_density_params"),
            size: std::mem::size_of::<DensityParamsGpu>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let layer = Self {
            grid: None,
            grid_size: (0, 0),
            ramp_view,
            ramp: ramp_texture,
            params,
        };
        layer.upload_ramp(queue, ramp);
        layer
    }

    /// Replace the color ramp. Short ramps leave the tail unchanged.
    pub fn upload_ramp(&self, queue: &wgpu::Queue, ramp: &[[u8; 4]]) {
        let n = ramp.len().min(RAMP_SIZE) as u32;
        if n == 0 {
            return;
        }
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.ramp,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(&ramp[..n as usize]),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * n),
                rows_per_image: Some(1),
            },
            wgpu::Extent3d {
                width: n,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Copy a decoder grid straight into the grid texture.
    ///
    /// Empty or short grids drop the texture so nothing is drawn.
    pub fn upload_grid(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        grid: &DensityGrid,
        viewport: (u32, u32),
    ) {
        if grid.is_empty() {
            self.grid = None;
            self.grid_size = (0, 0);
            return;
        }

        let size = (grid.width, grid.height);
        if self.grid.is_none() || self.grid_size != size {
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some("scopeview_density_grid"),
                size: wgpu::Extent3d {
                    width: grid.width,
                    height: grid.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::R32Float,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            self.grid = Some((texture, view));
            self.grid_size = size;
        }

        if let Some((texture, _)) = &self.grid {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                bytemuck::cast_slice(&grid.data[..grid.cell_count()]),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * grid.width),
                    rows_per_image: Some(grid.height),
                },
                wgpu::Extent3d {
                    width: grid.width,
                    height: grid.height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let params = DensityParamsGpu {
            viewport: [viewport.0.max(1) as f32, viewport.1.max(1) as f32],
            grid: [grid.width as f32, grid.height as f32],
        };
        queue.write_buffer(&self.params, 0, bytemuck::bytes_of(&params));
    }

    /// Forget the current grid.
    pub fn clear(&mut self) {
        self.grid = None;
        self.grid_size = (0, 0);
    }

    pub fn has_grid(&self) -> bool {
        self.grid.is_some()
    }

    pub fn grid_size(&self) -> (u32, u32) {
        self.grid_size
    }

    /// Only valid while [`Self::has_grid`] is true.
    pub(crate) fn grid_view(&self) -> &wgpu::TextureView {
        match &self.grid {
            Some((_, view)) => view,
            None => &self.ramp_view,
        }
    }

    pub(crate) fn ramp_view(&self) -> &wgpu::TextureView {
        &self.ramp_view
    }

    pub(crate) fn params(&self) -> &wgpu::Buffer {
        &self.params
    }
}
