//! Unit geometry shared by the primitive emitters, plus the model-matrix
//! builders that position it.

use glam::{Mat4, Vec2, Vec3};

/// Unit quad centered at the origin, extent ±0.5 on X/Y, Z = 0.
/// Corner order matches [`QUAD_UVS`] and the `[0,1,2,2,3,0]` index pattern.
pub const QUAD_CORNERS: [Vec3; 4] = [
    Vec3::new(-0.5, -0.5, 0.0),
    Vec3::new(0.5, -0.5, 0.0),
    Vec3::new(0.5, 0.5, 0.0),
    Vec3::new(-0.5, 0.5, 0.0),
];

/// Default texture coordinates covering the full texture.
pub const QUAD_UVS: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(0.0, 1.0),
];

/// Unit triangle: base on Y = −0.5, apex at the top center.
pub const TRIANGLE_CORNERS: [Vec3; 3] = [
    Vec3::new(-0.5, -0.5, 0.0),
    Vec3::new(0.5, -0.5, 0.0),
    Vec3::new(0.0, 0.5, 0.0),
];

/// Unit cube as 6 independent faces × 4 corners, each face wound like
/// [`QUAD_CORNERS`] so it can be index-generated as a quad. All faces reuse
/// the same 4 UV corners.
pub const CUBE_CORNERS: [Vec3; 24] = [
    // front (+Z)
    Vec3::new(-0.5, -0.5, 0.5),
    Vec3::new(0.5, -0.5, 0.5),
    Vec3::new(0.5, 0.5, 0.5),
    Vec3::new(-0.5, 0.5, 0.5),
    // back (−Z)
    Vec3::new(0.5, -0.5, -0.5),
    Vec3::new(-0.5, -0.5, -0.5),
    Vec3::new(-0.5, 0.5, -0.5),
    Vec3::new(0.5, 0.5, -0.5),
    // left (−X)
    Vec3::new(-0.5, -0.5, -0.5),
    Vec3::new(-0.5, -0.5, 0.5),
    Vec3::new(-0.5, 0.5, 0.5),
    Vec3::new(-0.5, 0.5, -0.5),
    // right (+X)
    Vec3::new(0.5, -0.5, 0.5),
    Vec3::new(0.5, -0.5, -0.5),
    Vec3::new(0.5, 0.5, -0.5),
    Vec3::new(0.5, 0.5, 0.5),
    // bottom (−Y)
    Vec3::new(-0.5, -0.5, -0.5),
    Vec3::new(0.5, -0.5, -0.5),
    Vec3::new(0.5, -0.5, 0.5),
    Vec3::new(-0.5, -0.5, 0.5),
    // top (+Y)
    Vec3::new(-0.5, 0.5, 0.5),
    Vec3::new(0.5, 0.5, 0.5),
    Vec3::new(0.5, 0.5, -0.5),
    Vec3::new(-0.5, 0.5, -0.5),
];

/// Builds the model matrix for a 2D shape of `size` at `position`.
///
/// With `top_left_origin`, `position` names the shape's top-left corner and
/// the translation is offset by half the size; otherwise `position` is the
/// shape's center.
pub fn model_matrix(position: Vec3, size: Vec2, top_left_origin: bool) -> Mat4 {
    let translation = if top_left_origin {
        Vec3::new(
            position.x + size.x / 2.0,
            position.y + size.y / 2.0,
            position.z,
        )
    } else {
        position
    };

    Mat4::from_translation(translation) * Mat4::from_scale(Vec3::new(size.x, size.y, 1.0))
}

/// Applies an axis-angle rotation under `model`, so the shape rotates about
/// its own center before it is sized and positioned.
pub fn rotated(model: Mat4, axis: Vec3, degrees: f32) -> Mat4 {
    model * Mat4::from_axis_angle(axis, degrees.to_radians())
}

/// Builds the transform that maps the unit quad onto the segment `p1 → p2`
/// drawn `width` units thick: translate to the midpoint, rotate by
/// `atan2(dy, dx)` about Z, scale by (length, width, 1).
pub fn line_matrix(p1: Vec2, p2: Vec2, width: f32) -> Mat4 {
    let d = p2 - p1;
    let midpoint = Vec3::new(p1.x + d.x / 2.0, p1.y + d.y / 2.0, 0.0);

    Mat4::from_translation(midpoint)
        * Mat4::from_rotation_z(d.y.atan2(d.x))
        * Mat4::from_scale(Vec3::new(d.length(), width, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_origin_translates_to_position() {
        let m = model_matrix(Vec3::new(10.0, 20.0, 0.0), Vec2::new(4.0, 6.0), false);
        assert_eq!(m.w_axis.truncate(), Vec3::new(10.0, 20.0, 0.0));
    }

    #[test]
    fn top_left_origin_offsets_by_half_size() {
        let m = model_matrix(Vec3::new(10.0, 20.0, 0.0), Vec2::new(4.0, 6.0), true);
        assert_eq!(m.w_axis.truncate(), Vec3::new(12.0, 23.0, 0.0));
    }

    #[test]
    fn model_matrix_scales_unit_quad_to_size() {
        let m = model_matrix(Vec3::ZERO, Vec2::new(4.0, 6.0), false);
        let corner = m.transform_point3(QUAD_CORNERS[2]);
        assert_eq!(corner, Vec3::new(2.0, 3.0, 0.0));
    }

    #[test]
    fn rotation_spins_shape_about_its_center() {
        let model = model_matrix(Vec3::new(10.0, 0.0, 0.0), Vec2::new(2.0, 2.0), false);
        let m = rotated(model, Vec3::Z, 90.0);
        // 90° about Z maps the bottom-right unit corner to the top-right,
        // then the size and position apply as usual.
        let corner = m.transform_point3(QUAD_CORNERS[1]);
        assert!((corner - Vec3::new(11.0, 1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn line_matrix_translation_is_midpoint() {
        let m = line_matrix(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), 2.0);
        assert_eq!(m.w_axis.truncate(), Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn line_matrix_spans_segment() {
        let m = line_matrix(Vec2::new(1.0, 1.0), Vec2::new(4.0, 5.0), 1.0);
        // Unit quad X extent ±0.5 maps onto the segment endpoints.
        let a = m.transform_point3(Vec3::new(-0.5, 0.0, 0.0));
        let b = m.transform_point3(Vec3::new(0.5, 0.0, 0.0));
        assert!((a - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-5);
        assert!((b - Vec3::new(4.0, 5.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn cube_has_six_quad_faces() {
        assert_eq!(CUBE_CORNERS.len(), 24);
        // Every face must be an axis-aligned unit square on the ±0.5 shell.
        for face in CUBE_CORNERS.chunks(4) {
            let edge_a = face[1] - face[0];
            let edge_b = face[3] - face[0];
            assert!((edge_a.length() - 1.0).abs() < 1e-6);
            assert!((edge_b.length() - 1.0).abs() < 1e-6);
            assert!(edge_a.dot(edge_b).abs() < 1e-6);
        }
    }
}
