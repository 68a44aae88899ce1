//! GPU half of the batch renderer: owns the staging-target buffers, the
//! shared bind group layout, the pipelines, and turns every finished batch
//! into one indirect multi-draw.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use anyhow::Context;
use glam::Mat4;

use crate::camera::CameraUniform;
use crate::rendering::batch::{
    BatchSink, DrawCommand, FinishedBatch, MAX_DRAW_COMMANDS, MAX_INDEX_COUNT, MAX_TEXTURE_SLOTS,
    MAX_VERTEX_COUNT,
};
use crate::rendering::vertex::{Vertex, VERTEX_LAYOUT};
use crate::texture::{Texture, TextureId};

const BATCH_SHADER_SOURCE: &str = include_str!("../shaders/batch.wgsl");

static NEXT_SHADER_ID: AtomicU32 = AtomicU32::new(0);

/// A compiled batch shader: the fill pipeline plus, when the adapter supports
/// line polygon mode, a wireframe variant.
pub struct BatchShader {
    fill: wgpu::RenderPipeline,
    wireframe: Option<wgpu::RenderPipeline>,
    id: u32,
}

impl BatchShader {
    pub fn id(&self) -> u32 {
        self.id
    }
}

/// Device features the batch renderer cannot run without. Request these
/// unconditionally; an adapter that lacks them must fail device creation
/// rather than panic later in pipeline or bind-group setup.
pub fn required_features() -> wgpu::Features {
    wgpu::Features::MULTI_DRAW_INDIRECT
        | wgpu::Features::INDIRECT_FIRST_INSTANCE
        | wgpu::Features::TEXTURE_BINDING_ARRAY
        | wgpu::Features::SAMPLED_TEXTURE_AND_STORAGE_BUFFER_ARRAY_NON_UNIFORM_INDEXING
}

/// Features the renderer degrades gracefully without: wireframe falls back to
/// filled drawing when line polygon mode is missing. Intersect with the
/// adapter's features before requesting.
pub fn optional_features() -> wgpu::Features {
    wgpu::Features::POLYGON_MODE_LINE
}

/// Requests an adapter and device with [`required_features`] plus whatever of
/// [`optional_features`] the adapter offers, blocking on the async wgpu
/// calls. Convenience for hosts without their own device setup.
pub fn request_device_blocking() -> anyhow::Result<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .context("no compatible adapter")?;

    let features = required_features() | (optional_features() & adapter.features());

    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        required_features: features,
        required_limits: wgpu::Limits::default(),
        label: None,
        memory_hints: Default::default(),
        trace: wgpu::Trace::Off,
    }))
    .context("failed to request device")?;

    Ok((device, queue))
}

/// Owns the GPU resources behind the batcher and implements [`BatchSink`] by
/// uploading the staged data and issuing `multi_draw_indexed_indirect` over
/// the command table.
pub struct GpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,

    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    indirect_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,

    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,
    white: Texture,

    /// Views for every texture the host has registered, looked up by slot id
    /// at bind-group build time.
    texture_views: HashMap<TextureId, wgpu::TextureView>,

    default_shader: Arc<BatchShader>,
    shader: Arc<BatchShader>,
    surface_format: wgpu::TextureFormat,

    // Per-frame state captured by `begin_frame`.
    target: Option<wgpu::TextureView>,
    proj_view: Mat4,
    wireframe: bool,
    warned_wireframe: bool,
}

impl GpuContext {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) -> anyhow::Result<Self> {
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("glint batch vertex buffer"),
            size: (MAX_VERTEX_COUNT * std::mem::size_of::<Vertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let index_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("glint batch index buffer"),
            size: (MAX_INDEX_COUNT * std::mem::size_of::<u32>()) as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let indirect_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("glint draw command buffer"),
            size: (MAX_DRAW_COMMANDS * std::mem::size_of::<DrawCommand>()) as u64,
            usage: wgpu::BufferUsages::INDIRECT | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_buffer = CameraUniform::default().create_buffer(&device);

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("glint batch bind group layout"),
                entries: &[
                    // Camera uniform
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    // Texture slot array
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: NonZeroU32::new(MAX_TEXTURE_SLOTS as u32),
                    },
                    // Shared sampler
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("glint batch pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("glint batch sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let white = Texture::white(&device, &queue)?;

        let default_shader = Arc::new(create_shader_with(
            &device,
            &pipeline_layout,
            surface_format,
            BATCH_SHADER_SOURCE,
            "glint batch shader",
        ));

        Ok(Self {
            device,
            queue,
            vertex_buffer,
            index_buffer,
            indirect_buffer,
            camera_buffer,
            bind_group_layout,
            pipeline_layout,
            sampler,
            white,
            texture_views: HashMap::new(),
            shader: default_shader.clone(),
            default_shader,
            surface_format,
            target: None,
            proj_view: Mat4::IDENTITY,
            wireframe: false,
            warned_wireframe: false,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Compiles a caller-provided WGSL shader against the batch vertex layout
    /// and bind group. The returned shader can be activated with
    /// [`GpuContext::set_shader`].
    pub fn create_shader(&self, source: &str, label: &str) -> Arc<BatchShader> {
        Arc::new(create_shader_with(
            &self.device,
            &self.pipeline_layout,
            self.surface_format,
            source,
            label,
        ))
    }

    pub fn set_shader(&mut self, shader: Arc<BatchShader>) {
        self.shader = shader;
    }

    pub fn set_default_shader(&mut self) {
        self.shader = self.default_shader.clone();
    }

    pub fn shader_id(&self) -> u32 {
        self.shader.id
    }

    /// Makes a texture's view available for slot binding. Must be called
    /// before geometry referencing the texture is flushed.
    pub fn register_texture(&mut self, texture: &Texture) {
        self.texture_views
            .insert(texture.id(), texture.view().clone());
    }

    pub fn begin_frame(&mut self, proj_view: Mat4, wireframe: bool, target: &wgpu::TextureView) {
        self.proj_view = proj_view;
        self.wireframe = wireframe;
        self.target = Some(target.clone());
    }

    pub fn end_frame(&mut self) {
        self.target = None;
    }

    /// Draws caller-owned vertex/index buffers immediately with the active
    /// shader, bypassing the batcher. The buffers must use the batch vertex
    /// layout.
    pub fn submit_direct(
        &mut self,
        vertex_buffer: &wgpu::Buffer,
        index_buffer: &wgpu::Buffer,
        index_count: u32,
    ) {
        let Some(target) = self.target.clone() else {
            log::warn!("submit_direct outside a frame; dropping draw");
            return;
        };

        CameraUniform::new(self.proj_view).update_buffer(&self.queue, &self.camera_buffer);
        let bind_group = self.build_bind_group(&[]);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("glint direct encoder"),
            });

        {
            let mut pass = self.begin_pass(&mut encoder, &target);
            pass.set_pipeline(self.active_pipeline());
            pass.set_bind_group(0, &bind_group, &[]);
            pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..index_count, 0, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn active_pipeline(&self) -> &wgpu::RenderPipeline {
        if self.wireframe {
            if let Some(wireframe) = &self.shader.wireframe {
                return wireframe;
            }
        }
        &self.shader.fill
    }

    fn begin_pass<'a>(
        &self,
        encoder: &'a mut wgpu::CommandEncoder,
        target: &'a wgpu::TextureView,
    ) -> wgpu::RenderPass<'a> {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("glint batch pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    // Batches compose over whatever the host already drew.
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        })
    }

    /// Builds the per-batch bind group: occupied slots get their registered
    /// views, the rest are padded with the white texture.
    fn build_bind_group(&self, texture_slots: &[TextureId]) -> wgpu::BindGroup {
        let mut views: Vec<&wgpu::TextureView> = Vec::with_capacity(MAX_TEXTURE_SLOTS);
        for id in texture_slots {
            match self.texture_views.get(id) {
                Some(view) => views.push(view),
                None => {
                    log::warn!("texture {id:?} was never registered; binding white");
                    views.push(self.white.view());
                }
            }
        }
        while views.len() < MAX_TEXTURE_SLOTS {
            views.push(self.white.view());
        }

        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("glint batch bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureViewArray(&views),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }
}

impl BatchSink for GpuContext {
    fn submit(&mut self, batch: &FinishedBatch<'_>) {
        if self.wireframe && self.shader.wireframe.is_none() && !self.warned_wireframe {
            log::warn!("wireframe requested but POLYGON_MODE_LINE is unavailable; drawing filled");
            self.warned_wireframe = true;
        }

        let Some(target) = self.target.clone() else {
            log::warn!("batch flushed outside a frame; dropping {} commands", batch.command_count);
            return;
        };

        self.queue
            .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(batch.vertices));
        self.queue
            .write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(batch.indices));
        // The whole table goes up; only the leading command_count entries are
        // drawn.
        self.queue.write_buffer(
            &self.indirect_buffer,
            0,
            bytemuck::cast_slice(&batch.commands[..]),
        );
        CameraUniform::new(self.proj_view).update_buffer(&self.queue, &self.camera_buffer);

        let bind_group = self.build_bind_group(batch.texture_slots);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("glint batch encoder"),
            });

        {
            let mut pass = self.begin_pass(&mut encoder, &target);
            pass.set_pipeline(self.active_pipeline());
            pass.set_bind_group(0, &bind_group, &[]);
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.multi_draw_indexed_indirect(&self.indirect_buffer, 0, batch.command_count as u32);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

fn create_shader_with(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    surface_format: wgpu::TextureFormat,
    source: &str,
    label: &str,
) -> BatchShader {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let fill = create_pipeline(
        device,
        layout,
        &module,
        surface_format,
        wgpu::PolygonMode::Fill,
        label,
    );

    let wireframe = device
        .features()
        .contains(wgpu::Features::POLYGON_MODE_LINE)
        .then(|| {
            create_pipeline(
                device,
                layout,
                &module,
                surface_format,
                wgpu::PolygonMode::Line,
                label,
            )
        });

    BatchShader {
        fill,
        wireframe,
        id: NEXT_SHADER_ID.fetch_add(1, Ordering::Relaxed),
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    surface_format: wgpu::TextureFormat,
    polygon_mode: wgpu::PolygonMode,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[VERTEX_LAYOUT],
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mandatory_features_are_requested_regardless_of_adapter_support() {
        // An adapter advertising no features still gets the full mandatory
        // set in the request, so device creation fails up front instead of
        // panicking later in bind-group or pipeline setup.
        let adapter_features = wgpu::Features::empty();
        let requested = required_features() | (optional_features() & adapter_features);

        assert!(requested.contains(wgpu::Features::MULTI_DRAW_INDIRECT));
        assert!(requested.contains(wgpu::Features::INDIRECT_FIRST_INSTANCE));
        assert!(requested.contains(wgpu::Features::TEXTURE_BINDING_ARRAY));
        assert!(requested.contains(
            wgpu::Features::SAMPLED_TEXTURE_AND_STORAGE_BUFFER_ARRAY_NON_UNIFORM_INDEXING
        ));
        // Wireframe support is the only feature allowed to drop out.
        assert!(!requested.contains(wgpu::Features::POLYGON_MODE_LINE));
    }
}
