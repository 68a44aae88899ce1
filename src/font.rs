//! Glyph metrics and pure text layout.
//!
//! Fonts are loaded elsewhere; this module only consumes the per-character
//! metrics (pixel size, bearing, 1/64-pixel advance, atlas offset) and turns
//! a string into positioned glyph quads for the batcher.

use std::collections::HashMap;

use glam::{IVec2, Vec2, Vec3};

use crate::texture::Texture;

/// Metrics for one character in a font's shared atlas.
#[derive(Debug, Clone, Copy)]
pub struct Glyph {
    /// Glyph bitmap size in pixels.
    pub size: Vec2,
    /// Offset from the baseline to the bitmap's top-left, in pixels.
    pub bearing: Vec2,
    /// Cursor advance in 1/64-pixel fixed point (FreeType convention).
    pub advance: IVec2,
    /// Normalized horizontal offset of the glyph within the atlas.
    pub atlas_offset: f32,
}

/// The CPU side of a font: glyph table plus atlas dimensions. Kept separate
/// from the atlas texture so layout stays GPU-free.
#[derive(Debug, Default)]
pub struct FontMetrics {
    pub glyphs: HashMap<char, Glyph>,
    /// Atlas dimensions in pixels.
    pub atlas_width: f32,
    pub atlas_height: f32,
    /// Nominal font pixel size; also scales the UV bleed biases.
    pub size: f32,
}

impl FontMetrics {
    pub fn glyph(&self, c: char) -> Option<&Glyph> {
        self.glyphs.get(&c)
    }
}

/// A font ready for rendering: metrics plus the bound atlas texture.
pub struct Font {
    pub metrics: FontMetrics,
    pub atlas: Texture,
}

/// Normalized UV coordinate of a pixel position within an atlas.
pub fn atlas_uv(pixel: Vec2, atlas_width: f32, atlas_height: f32) -> Vec2 {
    Vec2::new(pixel.x / atlas_width, pixel.y / atlas_height)
}

/// One laid-out glyph: quad corners in screen units (bottom-left winding
/// matching the quad emitters) and the glyph's atlas UV rectangle.
#[derive(Debug, Clone, Copy)]
pub struct GlyphQuad {
    pub corners: [Vec3; 4],
    pub uvs: [Vec2; 4],
}

/// Lays out `text` left to right starting at `position`.
///
/// Per character: screen placement from bearing and size, the UV rectangle
/// from the glyph's atlas offset and normalized width (with small
/// size-proportional biases so samples never bleed into a neighboring
/// glyph), then a cursor advance of `(advance.x >> 6) * scale.x`.
///
/// Characters missing from the glyph table are skipped.
pub fn layout_text(
    metrics: &FontMetrics,
    text: &str,
    position: Vec2,
    scale: Vec2,
) -> Vec<GlyphQuad> {
    let mut quads = Vec::with_capacity(text.len());
    let mut cursor_x = position.x;

    for c in text.chars() {
        let Some(glyph) = metrics.glyph(c) else {
            log::debug!("no glyph for {c:?}; skipping");
            continue;
        };

        let normalized_width =
            atlas_uv(Vec2::new(glyph.size.x, 0.0), metrics.atlas_width, metrics.atlas_height).x
                - 0.00002 * metrics.size;
        let clean = 0.00001 * metrics.size;

        let xpos = cursor_x + glyph.bearing.x * scale.x;
        let ypos = position.y - (glyph.size.y - glyph.bearing.y) * scale.y;
        let w = glyph.size.x * scale.x;
        let h = glyph.size.y * scale.y;

        let u0 = glyph.atlas_offset + clean;
        let u1 = glyph.atlas_offset + normalized_width + clean;

        quads.push(GlyphQuad {
            corners: [
                Vec3::new(xpos, ypos, 0.0),
                Vec3::new(xpos + w, ypos, 0.0),
                Vec3::new(xpos + w, ypos + h, 0.0),
                Vec3::new(xpos, ypos + h, 0.0),
            ],
            uvs: [
                Vec2::new(u0, 1.0),
                Vec2::new(u1, 1.0),
                Vec2::new(u1, 0.0),
                Vec2::new(u0, 0.0),
            ],
        });

        cursor_x += (glyph.advance.x >> 6) as f32 * scale.x;
    }

    quads
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_metrics() -> FontMetrics {
        let mut glyphs = HashMap::new();
        glyphs.insert(
            'A',
            Glyph {
                size: Vec2::new(10.0, 12.0),
                bearing: Vec2::new(1.0, 12.0),
                advance: IVec2::new(11 << 6, 0),
                atlas_offset: 0.0,
            },
        );
        glyphs.insert(
            'B',
            Glyph {
                size: Vec2::new(8.0, 12.0),
                bearing: Vec2::new(2.0, 12.0),
                advance: IVec2::new(9 << 6, 0),
                atlas_offset: 0.25,
            },
        );
        FontMetrics {
            glyphs,
            atlas_width: 256.0,
            atlas_height: 16.0,
            size: 16.0,
        }
    }

    #[test]
    fn two_glyphs_emit_in_order_with_advance_offset() {
        let metrics = test_metrics();
        let scale = Vec2::new(2.0, 2.0);
        let quads = layout_text(&metrics, "AB", Vec2::new(100.0, 50.0), scale);
        assert_eq!(quads.len(), 2);

        let a = metrics.glyph('A').unwrap();
        let b = metrics.glyph('B').unwrap();

        let a_left = 100.0 + a.bearing.x * scale.x;
        assert_eq!(quads[0].corners[0].x, a_left);

        // B starts one A-advance (in whole pixels) past the cursor.
        let advance = (a.advance.x >> 6) as f32 * scale.x;
        let b_left = 100.0 + advance + b.bearing.x * scale.x;
        assert_eq!(quads[1].corners[0].x, b_left);
    }

    #[test]
    fn glyph_quad_spans_scaled_size() {
        let metrics = test_metrics();
        let quads = layout_text(&metrics, "A", Vec2::ZERO, Vec2::new(3.0, 3.0));
        let q = &quads[0];
        assert_eq!(q.corners[1].x - q.corners[0].x, 30.0);
        assert_eq!(q.corners[3].y - q.corners[0].y, 36.0);
    }

    #[test]
    fn descender_free_glyph_sits_on_baseline() {
        let metrics = test_metrics();
        // bearing.y == size.y, so the quad bottom is exactly the baseline.
        let quads = layout_text(&metrics, "A", Vec2::new(0.0, 40.0), Vec2::ONE);
        assert_eq!(quads[0].corners[0].y, 40.0);
    }

    #[test]
    fn missing_glyph_is_skipped() {
        let metrics = test_metrics();
        let quads = layout_text(&metrics, "A?B", Vec2::ZERO, Vec2::ONE);
        assert_eq!(quads.len(), 2);
    }

    #[test]
    fn uv_rectangle_starts_at_atlas_offset_with_bias() {
        let metrics = test_metrics();
        let quads = layout_text(&metrics, "B", Vec2::ZERO, Vec2::ONE);
        let b = metrics.glyph('B').unwrap();
        let clean = 0.00001 * metrics.size;

        let uvs = quads[0].uvs;
        assert!((uvs[0].x - (b.atlas_offset + clean)).abs() < 1e-7);
        // Right edge is biased slightly inside the glyph's atlas cell.
        let cell_right = b.atlas_offset + b.size.x / metrics.atlas_width;
        assert!(uvs[1].x < cell_right);
        assert!(uvs[1].x > uvs[0].x);
        // Top of the glyph bitmap is V=0, bottom is V=1.
        assert_eq!(uvs[0].y, 1.0);
        assert_eq!(uvs[2].y, 0.0);
    }
}
