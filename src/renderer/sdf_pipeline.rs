//! SDF-based WebGPU render pipeline
//!
//! Paints the composed sphere in a fragment shader over a full-screen
//! triangle. Each layer is a circle distance field filled with a solid colour
//! or a canvas-style radial gradient; everything outside the ball stays fully
//! transparent so the desktop shows through.

use anyhow::Context;
use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::compositor::{Fill, LAYER_COUNT, Layer, SphereFrame};

/// Gradient stops per layer the shader can read
const MAX_STOPS: usize = 4;

// ============================================================================
// GPU DATA STRUCTURES (must match shader)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct Globals {
    resolution: [f32; 2], // offset 0
    layer_count: u32,     // offset 8
    premultiplied: u32,   // offset 12 - 1 if the surface expects premultiplied output
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub(crate) struct LayerData {
    /// centre.xy, radius, blur
    shape: [f32; 4],
    /// start.xy, start radius, stop count
    gradient_start: [f32; 4],
    /// end.xy, end radius, fill kind (0 solid, 1 radial)
    gradient_end: [f32; 4],
    offsets: [f32; 4],
    /// Premultiplied stop colours
    colors: [[f32; 4]; MAX_STOPS],
}

impl From<&Layer> for LayerData {
    fn from(layer: &Layer) -> Self {
        let shape = [layer.center.x, layer.center.y, layer.radius, layer.blur];
        match layer.fill {
            Fill::Solid(color) => {
                let mut colors = [[0.0; 4]; MAX_STOPS];
                colors[0] = color.premultiplied();
                Self {
                    shape,
                    gradient_start: [layer.center.x, layer.center.y, 0.0, 1.0],
                    gradient_end: [layer.center.x, layer.center.y, layer.radius, 0.0],
                    offsets: [0.0; 4],
                    colors,
                }
            }
            Fill::Radial(g) => {
                if g.stops.len() > MAX_STOPS {
                    log::warn!(
                        "{:?} layer has {} gradient stops, shader reads {}",
                        layer.kind,
                        g.stops.len(),
                        MAX_STOPS
                    );
                }
                let count = g.stops.len().min(MAX_STOPS);
                let mut offsets = [0.0; 4];
                let mut colors = [[0.0; 4]; MAX_STOPS];
                for (i, s) in g.stops.iter().take(count).enumerate() {
                    offsets[i] = s.offset;
                    colors[i] = s.color.premultiplied();
                }
                Self {
                    shape,
                    gradient_start: [g.start.x, g.start.y, g.start_radius, count as f32],
                    gradient_end: [g.end.x, g.end.y, g.end_radius, 1.0],
                    offsets,
                    colors,
                }
            }
        }
    }
}

fn layer_data(frame: &SphereFrame) -> [LayerData; LAYER_COUNT] {
    std::array::from_fn(|i| LayerData::from(&frame.layers[i]))
}

/// Alpha mode the overlay can composite with, and whether it wants
/// premultiplied output
fn pick_alpha_mode(modes: &[wgpu::CompositeAlphaMode]) -> (wgpu::CompositeAlphaMode, bool) {
    use wgpu::CompositeAlphaMode::*;

    if modes.contains(&PreMultiplied) {
        (PreMultiplied, true)
    } else if modes.contains(&PostMultiplied) {
        (PostMultiplied, false)
    } else {
        let fallback = modes.first().copied().unwrap_or(Auto);
        log::warn!(
            "Surface has no transparent alpha mode ({:?}); the overlay will not be see-through",
            modes
        );
        (fallback, false)
    }
}

// ============================================================================
// SDF RENDER STATE
// ============================================================================

pub struct SdfRenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub pipeline: wgpu::RenderPipeline,

    globals_buffer: wgpu::Buffer,
    layers_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,

    premultiplied: bool,
    pub size: (u32, u32),
}

impl SdfRenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
    ) -> anyhow::Result<Self> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("sdf-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await
            .context("requesting GPU device")?;

        let surface_caps = surface.get_capabilities(adapter);
        log::debug!("Surface formats: {:?}", surface_caps.formats);
        log::debug!("Surface alpha modes: {:?}", surface_caps.alpha_modes);

        // Colours blend in sRGB space like a 2D canvas, so write them unconverted
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no texture formats")?;
        let (alpha_mode, premultiplied) = pick_alpha_mode(&surface_caps.alpha_modes);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        log::info!(
            "Surface config: {}x{}, format: {:?}, alpha: {:?}",
            config.width,
            config.height,
            config.format,
            config.alpha_mode
        );
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sphere_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("sphere_shader.wgsl").into()),
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&Globals {
                resolution: [config.width as f32, config.height as f32],
                layer_count: 0,
                premultiplied: premultiplied as u32,
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let layers_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("layers"),
            size: (std::mem::size_of::<LayerData>() * LAYER_COUNT) as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sdf_bind_group_layout"),
            entries: &[uniform_entry(0), uniform_entry(1)],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sdf_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: layers_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sdf_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sdf_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[], // No vertex buffers - fullscreen triangle
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    // The shader composites every layer itself
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Ok(Self {
            size: (config.width, config.height),
            surface,
            device,
            queue,
            config,
            pipeline,
            globals_buffer,
            layers_buffer,
            bind_group,
            premultiplied,
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.reconfigure();
        }
    }

    /// Re-apply the current configuration after the surface was lost
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Upload the frame's layers and paint them
    pub fn render(&mut self, frame: &SphereFrame) -> Result<(), wgpu::SurfaceError> {
        let globals = Globals {
            resolution: [self.size.0 as f32, self.size.1 as f32],
            layer_count: LAYER_COUNT as u32,
            premultiplied: self.premultiplied as u32,
        };
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));
        self.queue.write_buffer(
            &self.layers_buffer,
            0,
            bytemuck::cast_slice(&layer_data(frame)),
        );

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sdf_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sdf_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.draw(0..3, 0..1); // Fullscreen triangle
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
