//! Public renderer facade: the scene bracket, the draw_* entry points, and
//! the shader/material state that spans them. Owns a [`Batcher`] for staging
//! and a [`GpuContext`] that consumes its flushes.

use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::camera::Camera;
use crate::font::{layout_text, Font};
use crate::rendering::batch::{Batcher, RenderFlags};
use crate::rendering::gpu::{BatchShader, GpuContext};
use crate::rendering::primitives::{line_matrix, model_matrix, rotated, QUAD_UVS};
use crate::texture::{Texture, TextureId};

const DEFAULT_LINE_WIDTH: f32 = 1.0;

/// Rotation applied to a primitive after it is positioned and sized.
#[derive(Debug, Clone, Copy)]
pub struct Rotation {
    pub degrees: f32,
    pub axis: Vec3,
}

impl Rotation {
    pub fn around_z(degrees: f32) -> Self {
        Self {
            degrees,
            axis: Vec3::Z,
        }
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::around_z(0.0)
    }
}

/// Texture argument for the draw calls: either a texture the caller owns
/// (registered on first use) or the id of one registered earlier.
#[derive(Clone, Copy)]
pub enum TextureRef<'a> {
    Owned(&'a Texture),
    Handle(TextureId),
}

pub struct QuadDesc<'a> {
    pub position: Vec3,
    pub size: Vec2,
    pub color: Vec4,
    pub texture: Option<TextureRef<'a>>,
    /// Per-corner texture coordinates; defaults to the full texture.
    pub uv: Option<[Vec2; 4]>,
    pub rotation: Option<Rotation>,
}

impl Default for QuadDesc<'_> {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            size: Vec2::ONE,
            color: Vec4::ONE,
            texture: None,
            uv: None,
            rotation: None,
        }
    }
}

pub struct TriangleDesc {
    pub position: Vec3,
    pub size: Vec2,
    pub color: Vec4,
    pub rotation: Option<Rotation>,
}

impl Default for TriangleDesc {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            size: Vec2::ONE,
            color: Vec4::ONE,
            rotation: None,
        }
    }
}

pub struct CubeDesc<'a> {
    pub position: Vec3,
    pub size: Vec3,
    pub color: Vec4,
    pub texture: Option<TextureRef<'a>>,
    pub uv: Option<[Vec2; 4]>,
}

impl Default for CubeDesc<'_> {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            size: Vec3::ONE,
            color: Vec4::ONE,
            texture: None,
            uv: None,
        }
    }
}

pub struct Renderer {
    batcher: Batcher,
    gpu: GpuContext,
    line_width: f32,
}

impl Renderer {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) -> anyhow::Result<Self> {
        let gpu = GpuContext::new(device, queue, surface_format)?;
        Ok(Self {
            batcher: Batcher::new(),
            gpu,
            line_width: DEFAULT_LINE_WIDTH,
        })
    }

    /// Opens a scene: captures the camera's combined matrix and the flags,
    /// and rewinds the batcher. Draw calls are only valid between
    /// `begin_scene` and `end_scene`.
    pub fn begin_scene(&mut self, camera: &Camera, flags: RenderFlags, target: &wgpu::TextureView) {
        self.gpu
            .begin_frame(camera.proj_view(), flags.wireframe, target);
        self.batcher.begin_scene(flags);
    }

    /// Closes the scene, flushing whatever the batcher still holds.
    pub fn end_scene(&mut self) {
        self.batcher.flush(&mut self.gpu);
        self.gpu.end_frame();
    }

    pub fn draw_quad(&mut self, desc: &QuadDesc<'_>) {
        let transform = self.shape_transform(desc.position, desc.size, desc.rotation);
        let texture = self.resolve_texture(desc.texture);
        let uvs = desc.uv.unwrap_or(QUAD_UVS);
        self.batcher
            .quad(&mut self.gpu, &transform, desc.color, texture, &uvs);
    }

    /// Draws a quad under an arbitrary model transform, skipping the
    /// position/size/rotation builder.
    pub fn draw_quad_with_transform(
        &mut self,
        transform: &Mat4,
        color: Vec4,
        texture: Option<TextureRef<'_>>,
    ) {
        let texture = self.resolve_texture(texture);
        self.batcher
            .quad(&mut self.gpu, transform, color, texture, &QUAD_UVS);
    }

    pub fn draw_triangle(&mut self, desc: &TriangleDesc) {
        let transform = self.shape_transform(desc.position, desc.size, desc.rotation);
        self.batcher.triangle(&mut self.gpu, &transform, desc.color);
    }

    /// Draws a line segment as a rotated quad of the current line width.
    pub fn draw_line(&mut self, p1: Vec2, p2: Vec2, color: Vec4) {
        self.draw_line_with_width(p1, p2, self.line_width, color);
    }

    pub fn draw_line_with_width(&mut self, p1: Vec2, p2: Vec2, width: f32, color: Vec4) {
        let transform = line_matrix(p1, p2, width);
        self.batcher
            .quad(&mut self.gpu, &transform, color, None, &QUAD_UVS);
    }

    /// Draws a cube. `position` always names the center; the top-left-origin
    /// flag only applies to 2D shapes.
    pub fn draw_cube(&mut self, desc: &CubeDesc<'_>) {
        let transform = Mat4::from_translation(desc.position) * Mat4::from_scale(desc.size);
        let texture = self.resolve_texture(desc.texture);
        let uvs = desc.uv.unwrap_or(QUAD_UVS);
        self.batcher
            .cube(&mut self.gpu, &transform, desc.color, texture, &uvs);
    }

    /// Lays out `text` against the font's glyph metrics and stages one
    /// atlas-textured quad per glyph. Characters without a glyph are skipped.
    pub fn draw_text(&mut self, font: &Font, text: &str, position: Vec2, scale: Vec2, color: Vec4) {
        self.gpu.register_texture(&font.atlas);
        let atlas_id = font.atlas.id();

        for glyph in layout_text(&font.metrics, text, position, scale) {
            self.batcher
                .textured_quad(&mut self.gpu, &glyph.corners, color, atlas_id, &glyph.uvs);
        }
    }

    /// Switches the material id stamped into subsequent vertices. Splits the
    /// open draw command when the id actually changes.
    pub fn set_material(&mut self, material: Option<u32>) {
        self.batcher.set_material(&mut self.gpu, material);
    }

    /// Activates a shader compiled with [`Renderer::create_shader`].
    /// Geometry staged so far still draws with the previous shader, so a
    /// non-empty batch is flushed first.
    pub fn set_shader(&mut self, shader: Arc<BatchShader>) {
        self.flush_before_state_change();
        self.gpu.set_shader(shader);
    }

    pub fn set_default_shader(&mut self) {
        self.flush_before_state_change();
        self.gpu.set_default_shader();
    }

    pub fn shader_id(&self) -> u32 {
        self.gpu.shader_id()
    }

    pub fn create_shader(&self, source: &str, label: &str) -> Arc<BatchShader> {
        self.gpu.create_shader(source, label)
    }

    pub fn set_line_width(&mut self, width: f32) {
        self.line_width = width;
    }

    pub fn line_width(&self) -> f32 {
        self.line_width
    }

    /// Makes a texture drawable via [`TextureRef::Handle`].
    pub fn register_texture(&mut self, texture: &Texture) {
        self.gpu.register_texture(texture);
    }

    /// Immediately draws caller-owned buffers with the active shader,
    /// bypassing the batcher. Pending batched geometry is flushed first so
    /// ordering is preserved.
    pub fn submit_direct(
        &mut self,
        vertex_buffer: &wgpu::Buffer,
        index_buffer: &wgpu::Buffer,
        index_count: u32,
    ) {
        self.flush_before_state_change();
        self.gpu
            .submit_direct(vertex_buffer, index_buffer, index_count);
    }

    pub fn device(&self) -> &wgpu::Device {
        self.gpu.device()
    }

    pub fn queue(&self) -> &wgpu::Queue {
        self.gpu.queue()
    }

    fn flush_before_state_change(&mut self) {
        if !self.batcher.is_empty() {
            self.batcher.flush(&mut self.gpu);
        }
    }

    fn shape_transform(&self, position: Vec3, size: Vec2, rotation: Option<Rotation>) -> Mat4 {
        let model = model_matrix(position, size, self.batcher.flags().top_left_origin);
        match rotation {
            Some(r) if r.degrees != 0.0 => rotated(model, r.axis, r.degrees),
            _ => model,
        }
    }

    fn resolve_texture(&mut self, texture: Option<TextureRef<'_>>) -> Option<TextureId> {
        match texture {
            Some(TextureRef::Owned(texture)) => {
                self.gpu.register_texture(texture);
                Some(texture.id())
            }
            Some(TextureRef::Handle(id)) => Some(id),
            None => None,
        }
    }
}
