use cgmath::{InnerSpace, Quaternion, Rad, Rotation3, Vector3};
use proptest::prelude::*;

use super::*;
use crate::Geometry;
use crate::control::{ArcballControl, ArcballState, FRONT};
use crate::placement::nearest_vertex_index;

fn sphere_positions() -> Vec<Vector3<f32>> {
    let mut sphere = Geometry::icosahedron();
    sphere.subdivide(1).spherize(2.0);
    sphere.vertices().iter().map(|v| v.position).collect()
}

/// Angle in radians between the front and the vertex nearest to it.
fn snap_error(positions: &[Vector3<f32>], orientation: Quaternion<f32>) -> f32 {
    let i = nearest_vertex_index(positions, orientation);
    let world = (orientation * positions[i]).normalize();
    world.dot(FRONT).clamp(-1.0, 1.0).acos()
}

/// Advances `control` by one target frame with the pointer released, the
/// same way the menu does.
fn coast(control: &mut ArcballControl, positions: &[Vector3<f32>], tuning: &MenuTuning) {
    let state = control.state();
    let i = nearest_vertex_index(positions, state.orientation);
    let target = state.to_world(positions[i]);
    control.update(FRAME_MS as f32, Some(target), tuning);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn proptest_snap_settles_on_a_vertex(
        axis in (-1.0_f32..1.0, -1.0_f32..1.0, -1.0_f32..1.0),
        angle in 0.0_f32..std::f32::consts::TAU,
    ) {
        let axis = Vector3::new(axis.0, axis.1, axis.2);
        prop_assume!(axis.magnitude() > 0.1);

        let positions = sphere_positions();
        let tuning = MenuTuning::default();
        let mut control = ArcballControl::new();
        control.set_state(ArcballState {
            orientation: Quaternion::from_axis_angle(axis.normalize(), Rad(angle)),
            ..ArcballState::default()
        });

        for _ in 0..600 {
            coast(&mut control, &positions, &tuning);
        }
        prop_assert!(snap_error(&positions, control.state().orientation) < 0.01);

        for _ in 0..300 {
            coast(&mut control, &positions, &tuning);
            prop_assert!(snap_error(&positions, control.state().orientation) < 0.01);
        }
    }
}

#[test]
fn test_menu_settles_after_fling() {
    let positions = sphere_positions();
    let (mut menu, _log) = new_menu(7);
    let mut t = 0.0;

    drag(&mut menu, &mut t, 35.0, 8);
    assert!(menu.is_moving());
    run_frames(&mut menu, &mut t, 600);

    assert!(!menu.is_moving());
    assert!(menu.rotation().velocity.abs() < menu.tuning().moving_threshold);
    assert!(snap_error(&positions, menu.rotation().orientation) < 0.01);
}
