//! Blocking texture downloads, used by tests and screenshot hosts.

use std::sync::mpsc;

use crate::GpuError;

/// Copy a whole single-mip texture back to host memory, tightly packed.
///
/// Blocks until the copy completes. `bytes_per_pixel` must match the
/// texture format.
pub fn read_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    bytes_per_pixel: u32,
) -> Result<Vec<u8>, GpuError> {
    let (width, height) = (texture.width(), texture.height());
    let row_bytes = width * bytes_per_pixel;
    let padded_row = row_bytes.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
        * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("scopeview_readback_staging"),
        size: u64::from(padded_row) * u64::from(height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("scopeview_readback_encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let (tx, rx) = mpsc::channel();
    staging.slice(..).map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::PollType::wait_indefinitely())?;
    match rx.recv() {
        Ok(result) => result?,
        Err(_) => return Err(GpuError::Map(wgpu::BufferAsyncError)),
    }

    let mut out = Vec::with_capacity((row_bytes * height) as usize);
    {
        let mapped = staging.slice(..).get_mapped_range();
        for row in mapped.chunks_exact(padded_row as usize) {
            out.extend_from_slice(&row[..row_bytes as usize]);
        }
    }
    staging.unmap();
    staging.destroy();
    Ok(out)
}

/// Download an `R32Float` intensity texture as one value per pixel.
///
/// Rows come back in texture order, so row 0 is the top of the display.
pub fn read_intensity(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
) -> Result<Vec<f32>, GpuError> {
    let bytes = read_texture(device, queue, texture, 4)?;
    Ok(bytemuck::pod_collect_to_vec(&bytes))
}
