//! Upload of software-painted decoration surfaces.

use scopeview_core::{OverlayPass, OverlaySurface};

/// GPU copy of one [`OverlaySurface`].
pub struct OverlayLayer {
    pass: OverlayPass,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl OverlayLayer {
    pub fn new(device: &wgpu::Device, pass: OverlayPass, width: u32, height: u32) -> Self {
        let (texture, view) = create_layer_texture(device, pass, width, height);
        Self {
            pass,
            texture,
            view,
            width,
            height,
        }
    }

    pub fn pass(&self) -> OverlayPass {
        self.pass
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Copy `surface` into the texture, reallocating on a size change.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, surface: &OverlaySurface) {
        let (width, height) = (surface.width(), surface.height());
        if width == 0 || height == 0 {
            return;
        }
        if (width, height) != (self.width, self.height) {
            self.texture.destroy();
            let (texture, view) = create_layer_texture(device, self.pass, width, height);
            self.texture = texture;
            self.view = view;
            self.width = width;
            self.height = height;
        }

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            surface.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }
}

fn create_layer_texture(
    device: &wgpu::Device,
    pass: OverlayPass,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let label = match pass {
        OverlayPass::Underlay => "scopeview_underlay_texture",
        OverlayPass::Overlay => "scopeview_overlay_texture",
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}
