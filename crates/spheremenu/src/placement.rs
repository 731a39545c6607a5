//! Per-frame billboard transforms and item lookup.

use cgmath::{InnerSpace, Matrix4, Quaternion, Vector3, Vector4};
use float_ord::FloatOrd;
use itertools::Itertools;

use crate::MenuTuning;
use crate::control::FRONT;

/// Returns the scale multiplier for a billboard whose center has world-space
/// Z coordinate `world_z`. Billboards nearer the view axis (front or back)
/// are larger.
pub fn depth_scale(world_z: f32, tuning: &MenuTuning) -> f32 {
    let k = tuning.depth_scale_intensity;
    world_z.abs() / tuning.sphere_radius * k + (1.0 - k)
}

/// Returns a rotation taking +Z to `direction`, keeping +Y as close to world
/// up as possible.
fn billboard_basis(direction: Vector3<f32>) -> Matrix4<f32> {
    let z = direction.normalize();
    let x = Vector3::unit_y().cross(z);
    let x = if x.magnitude2() < 1e-10 {
        Vector3::unit_x()
    } else {
        x.normalize()
    };
    let y = z.cross(x);
    Matrix4::from_cols(x.extend(0.0), y.extend(0.0), z.extend(0.0), Vector4::unit_w())
}

/// Returns the transform for the billboard belonging to the vertex at
/// `world_position` (already rotated into world space).
///
/// The unit quad is scaled, pushed back by the sphere radius, turned to face
/// outward along `world_position`, and translated to it. Its center ends up
/// on the same ray at distance `(1 - s) * radius` from the origin, where `s`
/// is the final scale.
pub fn instance_transform(world_position: Vector3<f32>, tuning: &MenuTuning) -> Matrix4<f32> {
    let radius = tuning.sphere_radius;
    let scale = depth_scale(world_position.z, tuning) * tuning.billboard_scale;
    Matrix4::from_translation(world_position)
        * billboard_basis(world_position)
        * Matrix4::from_scale(scale)
        * Matrix4::from_translation(Vector3::new(0.0, 0.0, -radius))
}

/// Recomputes every billboard transform into `out`.
pub fn instance_transforms(
    base_positions: &[Vector3<f32>],
    orientation: Quaternion<f32>,
    tuning: &MenuTuning,
    out: &mut Vec<Matrix4<f32>>,
) {
    out.clear();
    out.extend(
        base_positions
            .iter()
            .map(|&p| instance_transform(orientation * p, tuning)),
    );
}

/// Returns the index of the vertex nearest to the camera-facing direction.
///
/// Ties resolve deterministically. Returns 0 if there are no vertices.
pub fn nearest_vertex_index(base_positions: &[Vector3<f32>], orientation: Quaternion<f32>) -> usize {
    let facing = orientation.conjugate() * FRONT;
    base_positions
        .iter()
        .position_max_by_key(|p| FloatOrd(p.dot(facing)))
        .unwrap_or(0)
}

/// Returns the item shown on the billboard for vertex `vertex_index`.
///
/// Items repeat cyclically when there are fewer items than vertices.
pub fn item_index_for_vertex(vertex_index: usize, item_count: usize) -> usize {
    vertex_index % item_count.max(1)
}

/// Returns how many items can ever appear on a sphere with `vertex_count`
/// vertices. Items at or beyond this index are never shown.
pub fn visible_item_count(vertex_count: usize, item_count: usize) -> usize {
    item_count.min(vertex_count)
}

#[cfg(test)]
mod tests {
    use cgmath::{Rad, Rotation3, SquareMatrix, Transform};
    use proptest::prelude::*;

    use super::*;
    use crate::Geometry;

    fn icosphere() -> Vec<Vector3<f32>> {
        let mut geo = Geometry::icosahedron();
        geo.subdivide(1).spherize(2.0);
        geo.vertices().iter().map(|v| v.position).collect()
    }

    proptest! {
        #[test]
        fn proptest_item_mapping_is_modulo(vertices in 1..200_usize, items in 1..300_usize) {
            let used = (0..vertices).map(|i| item_index_for_vertex(i, items)).collect_vec();
            for (i, &item) in used.iter().enumerate() {
                prop_assert_eq!(item, i % items);
            }
            if items >= vertices {
                prop_assert!(used.iter().all_unique());
                prop_assert!(used.iter().all(|&item| item < visible_item_count(vertices, items)));
            }
        }
    }

    #[test]
    fn test_depth_scale() {
        let tuning = MenuTuning::default();
        assert!((depth_scale(2.0, &tuning) - 1.0).abs() < 1e-6);
        assert!((depth_scale(-2.0, &tuning) - 1.0).abs() < 1e-6);
        assert!((depth_scale(0.0, &tuning) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_billboard_sits_on_its_ray_and_faces_out() {
        let tuning = MenuTuning::default();
        for p in icosphere() {
            let m = instance_transform(p, &tuning);
            let s = depth_scale(p.z, &tuning) * tuning.billboard_scale;

            let center = m.transform_point(cgmath::Point3::new(0.0, 0.0, 0.0));
            let expected = p.normalize() * (1.0 - s) * tuning.sphere_radius;
            assert!((cgmath::EuclideanSpace::to_vec(center) - expected).magnitude() < 1e-4);

            let normal = m.transform_vector(Vector3::unit_z()).normalize();
            assert!((normal - p.normalize()).magnitude() < 1e-4);

            // No mirroring, so the triangle winding stays counterclockwise.
            assert!(m.determinant() > 0.0);
        }
    }

    #[test]
    fn test_nearest_vertex_is_stable_at_rest() {
        let positions = icosphere();
        let identity = Quaternion::new(1.0, 0.0, 0.0, 0.0);
        let first = nearest_vertex_index(&positions, identity);
        let best_z = positions.iter().map(|p| FloatOrd(p.z)).max().unwrap().0;
        assert_eq!(positions[first].z, best_z);
        for _ in 0..10 {
            assert_eq!(nearest_vertex_index(&positions, identity), first);
        }
    }

    #[test]
    fn test_nearest_vertex_follows_rotation() {
        let positions = icosphere();
        for (i, p) in positions.iter().enumerate() {
            let n = p.normalize();
            // Rotate vertex `i` to the front.
            let axis = n.cross(FRONT);
            let q = if axis.magnitude2() < 1e-10 {
                if n.z > 0.0 {
                    Quaternion::new(1.0, 0.0, 0.0, 0.0)
                } else {
                    Quaternion::from_angle_y(Rad(std::f32::consts::PI))
                }
            } else {
                Quaternion::from_axis_angle(axis.normalize(), Rad(n.dot(FRONT).acos()))
            };
            assert_eq!(nearest_vertex_index(&positions, q), i);
        }
        assert_eq!(nearest_vertex_index(&[], Quaternion::new(1.0, 0.0, 0.0, 0.0)), 0);
    }
}
