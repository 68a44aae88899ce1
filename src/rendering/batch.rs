//! The batching core: CPU staging buffers for vertices and indices, the
//! bounded texture-slot table, the indirect draw-command table, and the
//! lifecycle that decides when accumulated geometry is handed to a
//! [`BatchSink`] for submission.
//!
//! Everything here is plain CPU state; the GPU side lives in
//! [`crate::rendering::gpu`] behind the [`BatchSink`] seam.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::rendering::primitives::{CUBE_CORNERS, QUAD_CORNERS, TRIANGLE_CORNERS};
use crate::rendering::vertex::{Vertex, UNSET_MATERIAL, UNTEXTURED_SLOT};
use crate::texture::TextureId;

/// Upper bound on quads per batch; the vertex and index capacities derive
/// from it.
pub const MAX_QUADS: usize = 10_000;
pub const MAX_VERTEX_COUNT: usize = MAX_QUADS * QUAD_VERTEX_COUNT;
pub const MAX_INDEX_COUNT: usize = MAX_QUADS * QUAD_INDEX_COUNT;
/// Bounded sampler-array size; must match the array length in `batch.wgsl`.
pub const MAX_TEXTURE_SLOTS: usize = 16;
pub const MAX_DRAW_COMMANDS: usize = 64;

pub const QUAD_VERTEX_COUNT: usize = 4;
pub const QUAD_INDEX_COUNT: usize = 6;
pub const TRIANGLE_VERTEX_COUNT: usize = 3;
pub const TRIANGLE_INDEX_COUNT: usize = 3;
pub const CUBE_FACES: usize = 6;
pub const CUBE_VERTEX_COUNT: usize = CUBE_FACES * QUAD_VERTEX_COUNT;
pub const CUBE_INDEX_COUNT: usize = CUBE_FACES * QUAD_INDEX_COUNT;

/// Scene-wide render flags, captured at `begin_scene`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenderFlags {
    /// Draw every flush with the wireframe pipeline variant.
    pub wireframe: bool,
    /// 2D positions name a shape's top-left corner instead of its center.
    pub top_left_origin: bool,
}

/// One indirect draw descriptor. Field order and widths match
/// `wgpu::wgt::DrawIndexedIndirectArgs` so the table can be uploaded to the
/// indirect buffer as-is.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawCommand {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub base_vertex: i32,
    /// Command ordinal within the batch; the shader uses it to fetch
    /// per-draw data.
    pub base_instance: u32,
}

/// Borrowed view of a batch at flush time.
pub struct FinishedBatch<'a> {
    pub vertices: &'a [Vertex],
    pub indices: &'a [u32],
    /// Full command table; only `command_count` leading entries are valid.
    pub commands: &'a [DrawCommand; MAX_DRAW_COMMANDS],
    pub command_count: usize,
    /// Occupied texture slots, in slot order.
    pub texture_slots: &'a [TextureId],
}

/// Receives finished batches. The GPU context implements this with buffer
/// uploads plus one indirect multi-draw; tests implement it with a recorder.
pub trait BatchSink {
    fn submit(&mut self, batch: &FinishedBatch<'_>);
}

/// Accumulates geometry for the current batch.
///
/// Emitters never fail: when a capacity limit (vertices, indices, texture
/// slots, draw commands) would be exceeded, the batch is flushed to the sink
/// and restarted, and the triggering primitive lands in the fresh batch.
pub struct Batcher {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,

    texture_slots: Vec<TextureId>,

    commands: [DrawCommand; MAX_DRAW_COMMANDS],
    command_count: usize,

    /// Indices accumulated in the open (not yet finalized) command.
    command_index_count: u32,
    /// Vertex count at the open command's start, for base-vertex chaining.
    command_start_vertex: usize,
    /// Index count at the open command's start; becomes its `first_index`.
    command_start_index: usize,
    /// Next relative index value within the open command.
    index_offset: u32,
    /// Running base-vertex accumulator across finalized commands.
    base_vertex: i32,

    material: f32,
    flags: RenderFlags,
}

impl Default for Batcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Batcher {
    pub fn new() -> Self {
        Self {
            vertices: Vec::with_capacity(MAX_VERTEX_COUNT),
            indices: Vec::with_capacity(MAX_INDEX_COUNT),
            texture_slots: Vec::with_capacity(MAX_TEXTURE_SLOTS),
            commands: [DrawCommand::default(); MAX_DRAW_COMMANDS],
            command_count: 0,
            command_index_count: 0,
            command_start_vertex: 0,
            command_start_index: 0,
            index_offset: 0,
            base_vertex: 0,
            material: UNSET_MATERIAL,
            flags: RenderFlags::default(),
        }
    }

    pub fn begin_scene(&mut self, flags: RenderFlags) {
        self.flags = flags;
        self.material = UNSET_MATERIAL;
        self.start_batch();
    }

    /// Rewinds every write cursor and clears the slot and command state.
    /// Nothing is retained across this reset.
    pub fn start_batch(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.texture_slots.clear();
        self.command_count = 0;
        self.command_index_count = 0;
        self.command_start_vertex = 0;
        self.command_start_index = 0;
        self.index_offset = 0;
        self.base_vertex = 0;
    }

    /// Finalizes the open command, submits the batch, and rewinds for the
    /// next one. Flushing an empty batch submits nothing, so repeated
    /// flushes without new geometry are no-ops.
    pub fn flush(&mut self, sink: &mut dyn BatchSink) {
        if self.command_index_count > 0 {
            self.finalize_command();
        }
        if self.command_count == 0 {
            return;
        }

        log::trace!(
            "flushing batch: {} vertices, {} indices, {} commands, {} texture slots",
            self.vertices.len(),
            self.indices.len(),
            self.command_count,
            self.texture_slots.len()
        );

        sink.submit(&FinishedBatch {
            vertices: &self.vertices,
            indices: &self.indices,
            commands: &self.commands,
            command_count: self.command_count,
            texture_slots: &self.texture_slots,
        });

        self.start_batch();
    }

    /// Writes the open command into the table and advances the bookkeeping:
    /// `base_vertex` grows by the vertex count drawn under the command, and
    /// the next command's indices restart at zero relative to its own
    /// vertices, beginning at `first_index` past everything written so far.
    fn finalize_command(&mut self) {
        debug_assert!(self.command_count < MAX_DRAW_COMMANDS);

        let command_vertices = (self.vertices.len() - self.command_start_vertex) as i32;
        self.commands[self.command_count] = DrawCommand {
            index_count: self.command_index_count,
            instance_count: 1,
            first_index: self.command_start_index as u32,
            base_vertex: self.base_vertex,
            base_instance: self.command_count as u32,
        };

        self.command_count += 1;
        self.base_vertex += command_vertices;
        self.command_start_vertex = self.vertices.len();
        self.command_start_index = self.indices.len();
        self.command_index_count = 0;
        self.index_offset = 0;
    }

    /// Switches the active material id. A material change closes the open
    /// command so the new geometry draws under its own descriptor; a full
    /// command table forces a flush-and-restart.
    pub fn set_material(&mut self, sink: &mut dyn BatchSink, material: Option<u32>) {
        let material = material.map_or(UNSET_MATERIAL, |id| id as f32);
        if material != self.material && self.command_index_count > 0 {
            self.finalize_command();
            if self.command_count == MAX_DRAW_COMMANDS {
                self.flush(sink);
            }
        }
        self.material = material;
    }

    /// Returns the sampler-array slot for `id`, deduplicating within the
    /// batch. An unknown texture that finds the table full flushes first, so
    /// the returned slot is always valid for the batch it is stamped into.
    pub fn slot_for(&mut self, sink: &mut dyn BatchSink, id: TextureId) -> f32 {
        if let Some(slot) = self.texture_slots.iter().position(|&t| t == id) {
            return slot as f32;
        }

        if self.texture_slots.len() == MAX_TEXTURE_SLOTS {
            self.flush(sink);
        }
        self.texture_slots.push(id);
        (self.texture_slots.len() - 1) as f32
    }

    fn resolve_slot(&mut self, sink: &mut dyn BatchSink, texture: Option<TextureId>) -> f32 {
        match texture {
            Some(id) => self.slot_for(sink, id),
            None => UNTEXTURED_SLOT,
        }
    }

    /// Appends a quad under `transform`: 6 indices (`[0,1,2,2,3,0]` relative
    /// to the running offset), then the 4 transformed unit-quad corners.
    pub fn quad(
        &mut self,
        sink: &mut dyn BatchSink,
        transform: &Mat4,
        color: Vec4,
        texture: Option<TextureId>,
        uvs: &[Vec2; 4],
    ) {
        self.ensure_capacity(sink, QUAD_VERTEX_COUNT, QUAD_INDEX_COUNT);
        let slot = self.resolve_slot(sink, texture);
        let corners = QUAD_CORNERS.map(|c| transform.transform_point3(c));
        self.push_quad(&corners, color, slot, uvs);
    }

    /// Appends a pre-positioned textured quad (used per text glyph).
    pub fn textured_quad(
        &mut self,
        sink: &mut dyn BatchSink,
        corners: &[Vec3; 4],
        color: Vec4,
        texture: TextureId,
        uvs: &[Vec2; 4],
    ) {
        self.ensure_capacity(sink, QUAD_VERTEX_COUNT, QUAD_INDEX_COUNT);
        let slot = self.slot_for(sink, texture);
        self.push_quad(corners, color, slot, uvs);
    }

    pub fn triangle(&mut self, sink: &mut dyn BatchSink, transform: &Mat4, color: Vec4) {
        self.ensure_capacity(sink, TRIANGLE_VERTEX_COUNT, TRIANGLE_INDEX_COUNT);

        self.push_triangle_indices();
        for corner in TRIANGLE_CORNERS {
            self.push_vertex(
                transform.transform_point3(corner),
                color,
                Vec2::ZERO,
                UNTEXTURED_SLOT,
            );
        }
        self.command_index_count += TRIANGLE_INDEX_COUNT as u32;
    }

    /// Appends a cube as 6 independently index-generated quad faces; all
    /// faces share the same 4 UV corners.
    pub fn cube(
        &mut self,
        sink: &mut dyn BatchSink,
        transform: &Mat4,
        color: Vec4,
        texture: Option<TextureId>,
        uvs: &[Vec2; 4],
    ) {
        self.ensure_capacity(sink, CUBE_VERTEX_COUNT, CUBE_INDEX_COUNT);
        let slot = self.resolve_slot(sink, texture);

        for _ in 0..CUBE_FACES {
            self.push_quad_indices();
        }
        for (i, corner) in CUBE_CORNERS.iter().enumerate() {
            self.push_vertex(
                transform.transform_point3(*corner),
                color,
                uvs[i % QUAD_VERTEX_COUNT],
                slot,
            );
        }
        self.command_index_count += CUBE_INDEX_COUNT as u32;
    }

    /// Flushes and restarts if the next primitive would overflow the vertex
    /// or index staging buffers. The triggering geometry is never dropped;
    /// it is split into the following submission.
    fn ensure_capacity(&mut self, sink: &mut dyn BatchSink, vertices: usize, indices: usize) {
        if self.vertices.len() + vertices > MAX_VERTEX_COUNT
            || self.indices.len() + indices > MAX_INDEX_COUNT
        {
            self.flush(sink);
        }
    }

    fn push_quad(&mut self, corners: &[Vec3; 4], color: Vec4, slot: f32, uvs: &[Vec2; 4]) {
        self.push_quad_indices();
        for (corner, uv) in corners.iter().zip(uvs) {
            self.push_vertex(*corner, color, *uv, slot);
        }
        self.command_index_count += QUAD_INDEX_COUNT as u32;
    }

    fn push_quad_indices(&mut self) {
        let base = self.index_offset;
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        self.index_offset += QUAD_VERTEX_COUNT as u32;
    }

    fn push_triangle_indices(&mut self) {
        let base = self.index_offset;
        self.indices.extend_from_slice(&[base, base + 1, base + 2]);
        self.index_offset += TRIANGLE_VERTEX_COUNT as u32;
    }

    fn push_vertex(&mut self, position: Vec3, color: Vec4, uv: Vec2, slot: f32) {
        debug_assert!(self.vertices.len() < MAX_VERTEX_COUNT);
        self.vertices.push(Vertex {
            position: position.to_array(),
            color: color.to_array(),
            tex_coords: uv.to_array(),
            tex_index: slot,
            material: self.material,
        });
    }

    pub fn flags(&self) -> RenderFlags {
        self.flags
    }

    /// Vertices staged in the current batch.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn texture_slot_count(&self) -> usize {
        self.texture_slots.len()
    }

    /// True when nothing has been staged since the last restart.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.command_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;

    use crate::rendering::primitives::QUAD_UVS;

    fn init_logging() {
        let _ = pretty_env_logger::try_init();
    }

    fn tex(raw: u32) -> TextureId {
        TextureId::from_raw(raw)
    }

    /// Owned copy of one submission.
    struct Submission {
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        commands: Vec<DrawCommand>,
        texture_slots: Vec<TextureId>,
    }

    #[derive(Default)]
    struct RecordingSink {
        submissions: Vec<Submission>,
    }

    impl BatchSink for RecordingSink {
        fn submit(&mut self, batch: &FinishedBatch<'_>) {
            self.submissions.push(Submission {
                vertices: batch.vertices.to_vec(),
                indices: batch.indices.to_vec(),
                commands: batch.commands[..batch.command_count].to_vec(),
                texture_slots: batch.texture_slots.to_vec(),
            });
        }
    }

    fn scene() -> (Batcher, RecordingSink) {
        init_logging();
        let mut batcher = Batcher::new();
        batcher.begin_scene(RenderFlags::default());
        (batcher, RecordingSink::default())
    }

    fn draw_quads(batcher: &mut Batcher, sink: &mut RecordingSink, n: usize) {
        for _ in 0..n {
            batcher.quad(sink, &Mat4::IDENTITY, Vec4::ONE, None, &QUAD_UVS);
        }
    }

    #[test]
    fn quads_within_capacity_flush_once_at_scene_end() {
        let (mut batcher, mut sink) = scene();
        let n = 100;
        draw_quads(&mut batcher, &mut sink, n);
        assert!(sink.submissions.is_empty());

        batcher.flush(&mut sink);
        assert_eq!(sink.submissions.len(), 1);
        let sub = &sink.submissions[0];
        assert_eq!(sub.vertices.len(), n * QUAD_VERTEX_COUNT);
        assert_eq!(sub.indices.len(), n * QUAD_INDEX_COUNT);
    }

    #[test]
    fn overflowing_by_one_quad_yields_two_submissions() {
        let (mut batcher, mut sink) = scene();
        draw_quads(&mut batcher, &mut sink, MAX_QUADS + 1);
        batcher.flush(&mut sink);

        assert_eq!(sink.submissions.len(), 2);
        assert_eq!(sink.submissions[0].vertices.len(), MAX_VERTEX_COUNT);
        assert_eq!(sink.submissions[1].vertices.len(), QUAD_VERTEX_COUNT);
    }

    #[test]
    fn geometry_is_conserved_across_implicit_flushes() {
        let (mut batcher, mut sink) = scene();
        let n = MAX_QUADS * 2 + 17;
        draw_quads(&mut batcher, &mut sink, n);
        batcher.flush(&mut sink);

        let total_vertices: usize = sink.submissions.iter().map(|s| s.vertices.len()).sum();
        let total_indices: usize = sink.submissions.iter().map(|s| s.indices.len()).sum();
        assert_eq!(total_vertices, n * QUAD_VERTEX_COUNT);
        assert_eq!(total_indices, n * QUAD_INDEX_COUNT);
    }

    #[test]
    fn single_quad_index_sequence() {
        let (mut batcher, mut sink) = scene();
        draw_quads(&mut batcher, &mut sink, 1);
        batcher.flush(&mut sink);

        assert_eq!(sink.submissions[0].indices, vec![0, 1, 2, 2, 3, 0]);
    }

    #[test]
    fn second_quad_indices_are_offset_by_four() {
        let (mut batcher, mut sink) = scene();
        draw_quads(&mut batcher, &mut sink, 2);
        batcher.flush(&mut sink);

        assert_eq!(
            sink.submissions[0].indices[6..],
            [4, 5, 6, 6, 7, 4]
        );
    }

    #[test]
    fn triangle_counts_and_indices() {
        let (mut batcher, mut sink) = scene();
        batcher.triangle(&mut sink, &Mat4::IDENTITY, Vec4::ONE);
        batcher.flush(&mut sink);

        let sub = &sink.submissions[0];
        assert_eq!(sub.vertices.len(), TRIANGLE_VERTEX_COUNT);
        assert_eq!(sub.indices, vec![0, 1, 2]);
        assert_eq!(sub.commands[0].index_count, TRIANGLE_INDEX_COUNT as u32);
    }

    #[test]
    fn triangle_vertices_are_untextured() {
        let (mut batcher, mut sink) = scene();
        batcher.triangle(&mut sink, &Mat4::IDENTITY, Vec4::ONE);
        batcher.flush(&mut sink);

        for v in &sink.submissions[0].vertices {
            assert_eq!(v.tex_index, UNTEXTURED_SLOT);
        }
    }

    #[test]
    fn cube_emits_24_vertices_and_36_indices() {
        let (mut batcher, mut sink) = scene();
        batcher.cube(&mut sink, &Mat4::IDENTITY, Vec4::ONE, None, &QUAD_UVS);
        batcher.flush(&mut sink);

        let sub = &sink.submissions[0];
        assert_eq!(sub.vertices.len(), CUBE_VERTEX_COUNT);
        assert_eq!(sub.indices.len(), CUBE_INDEX_COUNT);
        // Each face is its own quad in the index stream.
        assert_eq!(sub.indices[6..12], [4, 5, 6, 6, 7, 4]);
        assert_eq!(sub.indices[30..36], [20, 21, 22, 22, 23, 20]);
    }

    #[test]
    fn cube_faces_share_uv_corners() {
        let (mut batcher, mut sink) = scene();
        let uvs = [
            vec2(0.25, 0.25),
            vec2(0.75, 0.25),
            vec2(0.75, 0.75),
            vec2(0.25, 0.75),
        ];
        batcher.cube(&mut sink, &Mat4::IDENTITY, Vec4::ONE, None, &uvs);
        batcher.flush(&mut sink);

        let vertices = &sink.submissions[0].vertices;
        for (i, v) in vertices.iter().enumerate() {
            assert_eq!(v.tex_coords, uvs[i % 4].to_array());
        }
    }

    #[test]
    fn repeated_texture_occupies_one_slot() {
        let (mut batcher, mut sink) = scene();
        for _ in 0..50 {
            batcher.quad(&mut sink, &Mat4::IDENTITY, Vec4::ONE, Some(tex(7)), &QUAD_UVS);
        }
        batcher.flush(&mut sink);

        assert_eq!(sink.submissions.len(), 1);
        assert_eq!(sink.submissions[0].texture_slots, vec![tex(7)]);
    }

    #[test]
    fn distinct_textures_occupy_consecutive_slots() {
        let (mut batcher, mut sink) = scene();
        for i in 0..4 {
            batcher.quad(&mut sink, &Mat4::IDENTITY, Vec4::ONE, Some(tex(i)), &QUAD_UVS);
        }
        batcher.flush(&mut sink);

        let sub = &sink.submissions[0];
        assert_eq!(sub.texture_slots.len(), 4);
        for (i, v) in sub.vertices.chunks(4).enumerate() {
            assert!(v.iter().all(|v| v.tex_index == i as f32));
        }
    }

    #[test]
    fn slot_table_overflow_flushes_and_restarts_at_slot_zero() {
        let (mut batcher, mut sink) = scene();
        for i in 0..MAX_TEXTURE_SLOTS as u32 {
            batcher.quad(&mut sink, &Mat4::IDENTITY, Vec4::ONE, Some(tex(i)), &QUAD_UVS);
        }
        assert!(sink.submissions.is_empty());

        // One more distinct texture forces the flush.
        batcher.quad(&mut sink, &Mat4::IDENTITY, Vec4::ONE, Some(tex(999)), &QUAD_UVS);
        assert_eq!(sink.submissions.len(), 1);
        assert_eq!(sink.submissions[0].texture_slots.len(), MAX_TEXTURE_SLOTS);

        batcher.flush(&mut sink);
        let second = &sink.submissions[1];
        assert_eq!(second.texture_slots, vec![tex(999)]);
        assert!(second.vertices.iter().all(|v| v.tex_index == 0.0));
    }

    #[test]
    fn command_table_entries_chain_base_vertex_and_first_index() {
        let (mut batcher, mut sink) = scene();
        draw_quads(&mut batcher, &mut sink, 3);
        batcher.set_material(&mut sink, Some(1));
        draw_quads(&mut batcher, &mut sink, 2);
        batcher.set_material(&mut sink, Some(2));
        batcher.triangle(&mut sink, &Mat4::IDENTITY, Vec4::ONE);
        batcher.flush(&mut sink);

        let commands = &sink.submissions[0].commands;
        assert_eq!(commands.len(), 3);

        assert_eq!(commands[0].index_count, 18);
        assert_eq!(commands[0].first_index, 0);
        assert_eq!(commands[0].base_vertex, 0);
        assert_eq!(commands[0].base_instance, 0);

        assert_eq!(commands[1].index_count, 12);
        assert_eq!(commands[1].first_index, 18);
        assert_eq!(commands[1].base_vertex, 12);
        assert_eq!(commands[1].base_instance, 1);

        assert_eq!(commands[2].index_count, 3);
        assert_eq!(commands[2].first_index, 30);
        assert_eq!(commands[2].base_vertex, 20);
        assert_eq!(commands[2].base_instance, 2);

        // Every command draws with instance count 1.
        assert!(commands.iter().all(|c| c.instance_count == 1));
    }

    #[test]
    fn indices_restart_per_command() {
        let (mut batcher, mut sink) = scene();
        draw_quads(&mut batcher, &mut sink, 1);
        batcher.set_material(&mut sink, Some(1));
        draw_quads(&mut batcher, &mut sink, 1);
        batcher.flush(&mut sink);

        let indices = &sink.submissions[0].indices;
        // Second command's indices are relative to its own vertices; the
        // draw command's base_vertex carries the offset.
        assert_eq!(indices[..6], [0, 1, 2, 2, 3, 0]);
        assert_eq!(indices[6..], [0, 1, 2, 2, 3, 0]);
    }

    #[test]
    fn material_id_is_stamped_per_vertex() {
        let (mut batcher, mut sink) = scene();
        draw_quads(&mut batcher, &mut sink, 1);
        batcher.set_material(&mut sink, Some(5));
        draw_quads(&mut batcher, &mut sink, 1);
        batcher.set_material(&mut sink, None);
        draw_quads(&mut batcher, &mut sink, 1);
        batcher.flush(&mut sink);

        let vertices = &sink.submissions[0].vertices;
        assert!(vertices[..4].iter().all(|v| v.material == UNSET_MATERIAL));
        assert!(vertices[4..8].iter().all(|v| v.material == 5.0));
        assert!(vertices[8..].iter().all(|v| v.material == UNSET_MATERIAL));
    }

    #[test]
    fn redundant_material_change_does_not_split_command() {
        let (mut batcher, mut sink) = scene();
        draw_quads(&mut batcher, &mut sink, 1);
        batcher.set_material(&mut sink, None);
        draw_quads(&mut batcher, &mut sink, 1);
        batcher.flush(&mut sink);

        assert_eq!(sink.submissions[0].commands.len(), 1);
    }

    #[test]
    fn full_command_table_forces_flush() {
        let (mut batcher, mut sink) = scene();
        for i in 0..MAX_DRAW_COMMANDS as u32 {
            batcher.set_material(&mut sink, Some(i));
            draw_quads(&mut batcher, &mut sink, 1);
        }
        assert!(sink.submissions.is_empty());

        // Closing the MAX_DRAW_COMMANDS-th command fills the table.
        batcher.set_material(&mut sink, Some(u32::MAX));
        assert_eq!(sink.submissions.len(), 1);
        assert_eq!(sink.submissions[0].commands.len(), MAX_DRAW_COMMANDS);

        draw_quads(&mut batcher, &mut sink, 1);
        batcher.flush(&mut sink);
        assert_eq!(sink.submissions.len(), 2);
        assert_eq!(sink.submissions[1].commands.len(), 1);
    }

    #[test]
    fn empty_scene_submits_nothing() {
        let (mut batcher, mut sink) = scene();
        batcher.flush(&mut sink);
        assert!(sink.submissions.is_empty());
    }

    #[test]
    fn repeated_flush_submits_the_batch_once() {
        let (mut batcher, mut sink) = scene();
        draw_quads(&mut batcher, &mut sink, 3);

        batcher.flush(&mut sink);
        batcher.flush(&mut sink);
        assert_eq!(sink.submissions.len(), 1);
        assert!(batcher.is_empty());
    }

    #[test]
    fn start_batch_resets_all_cursors() {
        let (mut batcher, mut sink) = scene();
        draw_quads(&mut batcher, &mut sink, 5);
        batcher.quad(&mut sink, &Mat4::IDENTITY, Vec4::ONE, Some(tex(1)), &QUAD_UVS);
        assert!(!batcher.is_empty());

        batcher.start_batch();
        assert!(batcher.is_empty());
        assert_eq!(batcher.vertex_count(), 0);
        assert_eq!(batcher.index_count(), 0);
        assert_eq!(batcher.texture_slot_count(), 0);
    }

    #[test]
    fn quad_transform_positions_corners() {
        let (mut batcher, mut sink) = scene();
        let transform = Mat4::from_translation(Vec3::new(10.0, 20.0, 0.0))
            * Mat4::from_scale(Vec3::new(2.0, 2.0, 1.0));
        batcher.quad(&mut sink, &transform, Vec4::ONE, None, &QUAD_UVS);
        batcher.flush(&mut sink);

        let vertices = &sink.submissions[0].vertices;
        assert_eq!(vertices[0].position, [9.0, 19.0, 0.0]);
        assert_eq!(vertices[2].position, [11.0, 21.0, 0.0]);
    }
}
