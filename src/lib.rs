//! A batching 2D/3D renderer on wgpu.
//!
//! Draw calls between [`Renderer::begin_scene`] and [`Renderer::end_scene`]
//! stage vertices into CPU buffers; geometry reaches the GPU in large
//! batches, each submitted as a single indirect multi-draw. Capacity limits
//! (vertices, indices, texture slots, draw commands) are handled by flushing
//! mid-scene and restarting, so callers never see a failed draw.

pub mod camera;
pub mod font;
pub mod rendering;
pub mod texture;

pub use camera::Camera;
pub use font::{Font, FontMetrics, Glyph};
pub use rendering::batch::{
    RenderFlags, MAX_DRAW_COMMANDS, MAX_INDEX_COUNT, MAX_QUADS, MAX_TEXTURE_SLOTS,
    MAX_VERTEX_COUNT,
};
pub use rendering::gpu::{
    optional_features, request_device_blocking, required_features, BatchShader,
};
pub use rendering::renderer::{
    CubeDesc, QuadDesc, Renderer, Rotation, TextureRef, TriangleDesc,
};
pub use texture::{Texture, TextureId};
