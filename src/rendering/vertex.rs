use std::mem::offset_of;

use bytemuck::{Pod, Zeroable};

/// Texture slot sentinel for untextured geometry; the shader falls back to the
/// vertex color when the slot is negative.
pub const UNTEXTURED_SLOT: f32 = -1.0;

/// Material id sentinel stamped while no material is active.
pub const UNSET_MATERIAL: f32 = -1.0;

/// One vertex of batched geometry. Positions are already multiplied by the
/// primitive's model transform when the vertex is staged; only the camera
/// projection*view is applied on the GPU.
///
/// This must match the vertex input struct in `shaders/batch.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub tex_coords: [f32; 2],
    /// Sampler-array index within the batch, or [`UNTEXTURED_SLOT`].
    pub tex_index: f32,
    /// Active material id, or [`UNSET_MATERIAL`].
    pub material: f32,
}

pub const VERTEX_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, position) as wgpu::BufferAddress,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, color) as wgpu::BufferAddress,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x4,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, tex_coords) as wgpu::BufferAddress,
            shader_location: 2,
            format: wgpu::VertexFormat::Float32x2,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, tex_index) as wgpu::BufferAddress,
            shader_location: 3,
            format: wgpu::VertexFormat::Float32,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, material) as wgpu::BufferAddress,
            shader_location: 4,
            format: wgpu::VertexFormat::Float32,
        },
    ],
};
