//! Fullscreen passes that composite layers onto the display target.
//!
//! Every draw is a single fullscreen triangle reading its source with
//! `textureLoad`, so sources must match the viewport pixel for pixel (the
//! density grid is the exception and is scaled in its shader).

use std::num::NonZeroU64;

use scopeview_core::OverlayPass;

use crate::buffers::RenderData;
use crate::density::DensityLayer;
use crate::overlay_layer::OverlayLayer;

const FULLSCREEN_WGSL: &str = include_str!("../shaders/fullscreen.wgsl");

/// Render pipelines for trace, decoration and density layers.
pub struct Compositor {
    trace_pipeline: wgpu::RenderPipeline,
    trace_layout: wgpu::BindGroupLayout,
    underlay_pipeline: wgpu::RenderPipeline,
    overlay_pipeline: wgpu::RenderPipeline,
    layer_layout: wgpu::BindGroupLayout,
    density_pipeline: wgpu::RenderPipeline,
    density_layout: wgpu::BindGroupLayout,
}

impl Compositor {
    pub fn new(device: &wgpu::Device, target_format: wgpu::TextureFormat) -> Self {
        let trace_layout = create_layout(
            device,
            "colormap",
            &[texture_entry(0, false), uniform_entry(1, 16)],
        );
        let trace_pipeline = create_fullscreen_pipeline(
            device,
            "colormap",
            include_str!("../shaders/colormap.wgsl"),
            &trace_layout,
            target_format,
            Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
        );

        let layer_layout = create_layout(device, "layer", &[texture_entry(0, true)]);
        let layer_src = include_str!("../shaders/layer.wgsl");
        let underlay_pipeline = create_fullscreen_pipeline(
            device,
            "layer",
            layer_src,
            &layer_layout,
            target_format,
            None,
        );
        let overlay_pipeline = create_fullscreen_pipeline(
            device,
            "layer",
            layer_src,
            &layer_layout,
            target_format,
            Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
        );

        let density_layout = create_layout(
            device,
            "density",
            &[
                texture_entry(0, false),
                texture_entry(1, true),
                uniform_entry(2, 16),
            ],
        );
        let density_pipeline = create_fullscreen_pipeline(
            device,
            "density",
            include_str!("../shaders/density.wgsl"),
            &density_layout,
            target_format,
            Some(wgpu::BlendState::ALPHA_BLENDING),
        );

        Self {
            trace_pipeline,
            trace_layout,
            underlay_pipeline,
            overlay_pipeline,
            layer_layout,
            density_pipeline,
            density_layout,
        }
    }

    /// Draw one trace's intensity texture in its color, clipped to the plot.
    ///
    /// Returns false without drawing when the channel has no geometry.
    pub fn draw_trace(
        &self,
        device: &wgpu::Device,
        pass: &mut wgpu::RenderPass<'_>,
        data: &RenderData,
        plot_right: u32,
    ) -> bool {
        let (width, height) = data.size();
        let scissor_width = plot_right.min(width);
        if !data.geometry_ok || scissor_width == 0 || height == 0 {
            return false;
        }

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scopeview_colormap_bg"),
            layout: &self.trace_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&data.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: data.color.as_entire_binding(),
                },
            ],
        });

        pass.set_scissor_rect(0, 0, scissor_width, height);
        pass.set_pipeline(&self.trace_pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
        pass.set_scissor_rect(0, 0, width, height);
        true
    }

    /// Draw a decoration layer: the underlay overwrites, the overlay blends.
    pub fn draw_layer(
        &self,
        device: &wgpu::Device,
        pass: &mut wgpu::RenderPass<'_>,
        layer: &OverlayLayer,
    ) {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scopeview_layer_bg"),
            layout: &self.layer_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(layer.view()),
            }],
        });

        let pipeline = match layer.pass() {
            OverlayPass::Underlay => &self.underlay_pipeline,
            OverlayPass::Overlay => &self.overlay_pipeline,
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
    }

    /// Draw an eye or waterfall grid through its color ramp.
    pub fn draw_density(
        &self,
        device: &wgpu::Device,
        pass: &mut wgpu::RenderPass<'_>,
        layer: &DensityLayer,
    ) -> bool {
        if !layer.has_grid() {
            return false;
        }
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scopeview_density_bg"),
            layout: &self.density_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(layer.grid_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(layer.ramp_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: layer.params().as_entire_binding(),
                },
            ],
        });
        pass.set_pipeline(&self.density_pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
        true
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn texture_entry(binding: u32, filterable: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn uniform_entry(binding: u32, min_size: u64) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(min_size),
        },
        count: None,
    }
}

fn create_layout(
    device: &wgpu::Device,
    name: &str,
    entries: &[wgpu::BindGroupLayoutEntry],
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(&format!("scopeview_{name}_layout")),
        entries,
    })
}

fn create_fullscreen_pipeline(
    device: &wgpu::Device,
    name: &str,
    fragment_src: &str,
    bind_group_layout: &wgpu::BindGroupLayout,
    target_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
) -> wgpu::RenderPipeline {
    let source = format!("{FULLSCREEN_WGSL}\n{fragment_src}");
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("scopeview_{name}_shader")),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("scopeview_{name}_pipeline_layout")),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    let fragment_entry = format!("fs_{name}");
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("scopeview_{name}_pipeline")),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_fullscreen"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some(&fragment_entry),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: target_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        // No depth, no culling.
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
