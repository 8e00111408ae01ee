//! Frame orchestration for waveform areas.
//!
//! A frame rebuilds trace geometry where its inputs changed, rasterizes every
//! line trace in one compute encoder, paints the decoration layers on the CPU
//! and composites everything in one render pass. Both command buffers go out
//! in a single ordered submit so compute writes land before they are sampled.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use scopeview_core::geometry::{build_column_index, compute_vertices};
use scopeview_core::overlay::trigger_marker;
use scopeview_core::{
    AreaId, Capture, ChannelId, DecorationPainter, GeometryParams, OverlayPass, OverlaySurface,
    TraceGeometry, TriggerControl, ViewerConfig, WaveformArea, WaveformGroup,
};

use crate::buffers::{GeometryKey, RenderData, RenderDataMap};
use crate::compositor::Compositor;
use crate::density::DensityLayer;
use crate::diagnostics::{GpuStage, with_error_scope};
use crate::overlay_layer::OverlayLayer;
use crate::rasterizer::TraceRasterizer;
use crate::stats::{FrameTimer, Stage, StatsHandle};

/// What a frame drew.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Line traces composited, main and overlays.
    pub trace_draw_calls: u32,
    /// Line traces dispatched to the rasterizer.
    pub rasterized: u32,
    /// The main channel was drawn as an eye or waterfall.
    pub density_drawn: bool,
    /// Some stage hit a GPU validation error.
    pub gpu_errors: bool,
}

/// One line trace to bring up to date this frame.
struct TraceJob {
    id: ChannelId,
    capture: Option<Arc<Capture>>,
    params: GeometryParams,
    color: [f32; 4],
}

/// Decoration surfaces and density textures of one area.
struct AreaLayers {
    underlay_surface: OverlaySurface,
    overlay_surface: OverlaySurface,
    underlay: OverlayLayer,
    overlay: OverlayLayer,
    density: DensityLayer,
}

impl AreaLayers {
    fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        ramp: &[[u8; 4]],
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            underlay_surface: OverlaySurface::new(OverlayPass::Underlay, width, height),
            overlay_surface: OverlaySurface::new(OverlayPass::Overlay, width, height),
            underlay: OverlayLayer::new(device, OverlayPass::Underlay, width, height),
            overlay: OverlayLayer::new(device, OverlayPass::Overlay, width, height),
            density: DensityLayer::new(device, queue, ramp),
        }
    }
}

/// Draws waveform areas into caller-provided targets.
///
/// Created once per display target format and shared by any number of
/// areas. GPU resources are kept per area until [`Self::on_area_removed`].
/// The renderer's [`ViewerConfig`] is applied to every area it draws.
pub struct WaveformRenderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: ViewerConfig,
    ramp: Vec<[u8; 4]>,
    rasterizer: TraceRasterizer,
    compositor: Compositor,
    render_data: RenderDataMap,
    layers: HashMap<AreaId, AreaLayers>,
    stats: StatsHandle,
    timer: FrameTimer,
}

impl WaveformRenderer {
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        target_format: wgpu::TextureFormat,
        config: &ViewerConfig,
    ) -> Self {
        tracing::info!("waveform renderer targeting {target_format:?}");
        let rasterizer = TraceRasterizer::new(&device);
        let compositor = Compositor::new(&device, target_format);
        let stats = StatsHandle::new();
        let timer = FrameTimer::new(stats.clone(), config.stats_log_interval_ms);

        Self {
            device,
            queue,
            config: config.clone(),
            ramp: config.eye_color_ramp.build(),
            rasterizer,
            compositor,
            render_data: RenderDataMap::new(),
            layers: HashMap::new(),
            stats,
            timer,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Apply a new configuration. Areas pick it up on their next frame.
    pub fn set_config(&mut self, config: &ViewerConfig) {
        if config.eye_color_ramp != self.config.eye_color_ramp {
            self.ramp = config.eye_color_ramp.build();
            for layers in self.layers.values() {
                layers.density.upload_ramp(&self.queue, &self.ramp);
            }
        }
        self.timer.set_log_interval(config.stats_log_interval_ms);
        self.config = config.clone();
    }

    /// Handle for reading frame timings from another thread.
    pub fn stats(&self) -> StatsHandle {
        self.stats.clone()
    }

    pub fn render_data(&self, area: AreaId, id: ChannelId) -> Option<&RenderData> {
        self.render_data.get((area, id))
    }

    pub fn render_data_map(&self) -> &RenderDataMap {
        &self.render_data
    }

    pub fn density_layer(&self, area: AreaId) -> Option<&DensityLayer> {
        self.layers.get(&area).map(|layers| &layers.density)
    }

    /// Destroy the GPU resources of an overlay removed from `area`.
    pub fn on_overlay_removed(&mut self, area: AreaId, id: ChannelId) -> bool {
        self.render_data.remove((area, id))
    }

    /// Destroy everything held for a closed area.
    pub fn on_area_removed(&mut self, area: AreaId) -> bool {
        let traces = self.render_data.remove_area(area);
        let layers = self.layers.remove(&area).is_some();
        tracing::debug!("{area}: released {traces} traces");
        traces > 0 || layers
    }

    /// Render one frame of `area` into `target`.
    ///
    /// `target` must be the size of the area's viewport and use the format
    /// the renderer was created with.
    pub fn render_frame(
        &mut self,
        area: &mut WaveformArea,
        group: &WaveformGroup,
        painter: &mut dyn DecorationPainter,
        scope: Option<&dyn TriggerControl>,
        target: &wgpu::TextureView,
    ) -> FrameReport {
        self.timer.begin_frame();
        let device = Arc::clone(&self.device);
        let queue = Arc::clone(&self.queue);
        let mut report = FrameReport::default();
        let mut clean = true;

        // ── Prepare ──
        let start = Instant::now();
        let area_id = area.id();
        let (width, height) = (area.view.width, area.view.height);
        area.apply_config(&self.config);
        area.refresh_vertical_scale();
        if area.take_persistence_clear() {
            tracing::trace!("{area_id}: persistence cleared");
        }
        let force_rebuild = area.take_geometry_dirty();
        let density = area.is_density();
        let jobs = trace_jobs(area, group);
        let live: Vec<ChannelId> = jobs.iter().map(|job| job.id).collect();

        let layers = self
            .layers
            .entry(area_id)
            .or_insert_with(|| AreaLayers::new(&device, &queue, &self.ramp, width, height));

        let ((), ok) = with_error_scope(&device, GpuStage::TextureAllocation, || {
            self.render_data.retain_area(area_id, &live);
            for &id in &live {
                self.render_data
                    .get_or_create(&device, (area_id, id), width, height)
                    .ensure_size(&device, width, height);
            }
        });
        clean &= ok;
        self.timer.record(Stage::Prepare, start.elapsed());

        // ── Geometry ──
        if density {
            let start = Instant::now();
            let ((), ok) = with_error_scope(&device, GpuStage::DensityUpload, || {
                match area.main.capture.as_deref().and_then(Capture::density_grid) {
                    Some(grid) => layers
                        .density
                        .upload_grid(&device, &queue, grid, (width, height)),
                    None => layers.density.clear(),
                }
            });
            clean &= ok;
            self.timer.record(Stage::TextureUpload, start.elapsed());
        } else {
            layers.density.clear();
        }

        let ((), ok) = with_error_scope(&device, GpuStage::GeometryUpload, || {
            for job in &jobs {
                update_geometry(
                    &mut self.render_data,
                    &mut self.timer,
                    (&device, &queue),
                    area_id,
                    job,
                    force_rebuild,
                );
            }
        });
        clean &= ok;

        // ── Rasterize ──
        let start = Instant::now();
        let alpha = self.config.alpha_scaled();
        let plot_right = area.view.plot_right;
        let mut compute = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("scopeview_rasterize_encoder"),
        });
        let (rasterized, ok) = with_error_scope(&device, GpuStage::Rasterize, || {
            let mut count = 0;
            for job in &jobs {
                let Some(data) = self.render_data.get_mut((area_id, job.id)) else {
                    continue;
                };
                data.write_config(&queue, plot_right, alpha);
                data.write_color(&queue, job.color);
                if self.rasterizer.dispatch(&device, &mut compute, data) {
                    count += 1;
                }
            }
            count
        });
        report.rasterized = rasterized;
        clean &= ok;
        self.timer.record(Stage::Raster, start.elapsed());

        // ── Decorations ──
        let trigger_voltage = trigger_marker(&area.main, scope);
        self.timer.time(Stage::Paint, || {
            layers.underlay_surface.reset(width, height);
            layers.overlay_surface.reset(width, height);
            let mut ctx = area.paint_context(group, trigger_voltage);
            painter.paint_underlay(&mut layers.underlay_surface, &mut ctx);
            painter.paint_overlay(&mut layers.overlay_surface, &mut ctx);
        });

        let start = Instant::now();
        let ((), ok) = with_error_scope(&device, GpuStage::OverlayUpload, || {
            layers
                .underlay
                .upload(&device, &queue, &layers.underlay_surface);
            layers
                .overlay
                .upload(&device, &queue, &layers.overlay_surface);
        });
        clean &= ok;
        self.timer.record(Stage::TextureUpload, start.elapsed());

        // ── Composite ──
        let start = Instant::now();
        let (drawn, ok) = with_error_scope(&device, GpuStage::Composite, || {
            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scopeview_composite_encoder"),
            });
            let mut drawn = (0u32, false);
            {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("scopeview_composite_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: target,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });

                self.compositor
                    .draw_layer(&device, &mut pass, &layers.underlay);
                if density {
                    drawn.1 = self
                        .compositor
                        .draw_density(&device, &mut pass, &layers.density);
                }
                for job in &jobs {
                    let Some(data) = self.render_data.get((area_id, job.id)) else {
                        continue;
                    };
                    if self.compositor.draw_trace(&device, &mut pass, data, plot_right) {
                        drawn.0 += 1;
                    }
                }
                self.compositor
                    .draw_layer(&device, &mut pass, &layers.overlay);
            }
            // Compute first: the composite samples what it wrote.
            queue.submit([compute.finish(), encoder.finish()]);
            drawn
        });
        (report.trace_draw_calls, report.density_drawn) = drawn;
        clean &= ok;
        self.timer.record(Stage::Composite, start.elapsed());

        if !clean {
            report.gpu_errors = true;
            self.timer.note_gpu_error();
        }
        self.timer.end_frame();
        report
    }
}

/// Rebuild and upload a trace's geometry if its inputs changed.
fn update_geometry(
    render_data: &mut RenderDataMap,
    timer: &mut FrameTimer,
    (device, queue): (&wgpu::Device, &wgpu::Queue),
    area: AreaId,
    job: &TraceJob,
    force: bool,
) {
    let Some(data) = render_data.get_mut((area, job.id)) else {
        return;
    };
    let Some(capture) = &job.capture else {
        tracing::trace!("{area}/{}: no capture", job.id);
        data.invalidate();
        return;
    };
    if !force
        && data
            .key
            .as_ref()
            .is_some_and(|key| key.matches(&job.params, capture))
    {
        return;
    }

    let vertices = timer.time(Stage::Download, || compute_vertices(capture, &job.params));
    let vertices = match vertices {
        Ok(vertices) => vertices,
        Err(err) => {
            tracing::trace!("{area}/{}: skipping geometry: {err}", job.id);
            data.invalidate();
            return;
        }
    };
    let column_index = timer.time(Stage::Index, || {
        build_column_index(&vertices, job.params.width)
    });

    let geometry = TraceGeometry {
        depth: vertices.len() as u32,
        vertices,
        column_index,
    };
    data.upload_geometry(device, queue, &geometry);
    data.key = Some(GeometryKey {
        params: job.params,
        capture: Arc::clone(capture),
    });
}

/// Line traces of `area` in composite order: main (unless it is a density
/// plot) then overlays in registration order.
fn trace_jobs(area: &WaveformArea, group: &WaveformGroup) -> Vec<TraceJob> {
    let mut jobs = Vec::with_capacity(1 + area.overlays().len());
    if !area.is_density() {
        jobs.push(TraceJob {
            id: area.main.id,
            capture: area.main.capture.clone(),
            params: area.main_geometry_params(&group.time),
            color: area.main.display_rgba(),
        });
    }
    for (slot, channel) in area.overlays().iter().enumerate() {
        if let Some(params) = area.overlay_geometry_params(&group.time, slot) {
            jobs.push(TraceJob {
                id: channel.id,
                capture: channel.capture.clone(),
                params,
                color: channel.display_rgba(),
            });
        }
    }
    jobs
}
