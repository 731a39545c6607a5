//! Arcball rotation driven by pointer drags, with inertia and snapping.
//!
//! Physics lives in the pure function [`step()`]. [`ArcballControl`] is a
//! thin shell that records pointer events between frames and feeds a
//! consistent snapshot of them into [`step()`] once per frame.

use cgmath::{InnerSpace, Point2, Quaternion, Rad, Rotation3, Vector3};

use crate::MenuTuning;

/// Direction from the sphere center toward the camera, in world space.
pub const FRONT: Vector3<f32> = Vector3::new(0.0, 0.0, 1.0);

/// Rotation state integrated once per frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ArcballState {
    /// Accumulated rotation of the sphere. Always unit length.
    pub orientation: Quaternion<f32>,
    /// Angular velocity in radians per target frame.
    pub velocity: f32,
    /// Unit axis of rotation in world space.
    pub axis: Vector3<f32>,
}
impl Default for ArcballState {
    fn default() -> Self {
        Self {
            orientation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
            velocity: 0.0,
            axis: Vector3::unit_x(),
        }
    }
}
impl ArcballState {
    /// Returns the model-space direction that currently faces the camera.
    pub fn facing(&self) -> Vector3<f32> {
        self.orientation.conjugate() * FRONT
    }
    /// Returns `v` rotated from model space into world space.
    pub fn to_world(&self, v: Vector3<f32>) -> Vector3<f32> {
        self.orientation * v
    }
}

/// Pointer state as seen by one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerSnapshot {
    /// Whether the primary button is held.
    pub down: bool,
    /// Latest pointer position in logical pixels, Y down.
    pub position: Point2<f32>,
    /// Pointer position consumed by the previous frame.
    pub last_position: Point2<f32>,
}
impl Default for PointerSnapshot {
    fn default() -> Self {
        Self {
            down: false,
            position: Point2::new(0.0, 0.0),
            last_position: Point2::new(0.0, 0.0),
        }
    }
}

/// Advances the rotation by one frame lasting `dt_ms` milliseconds.
///
/// While the pointer is down, angular velocity tracks pointer movement
/// directly. Otherwise it decays exponentially, unless `snap_target` (the
/// world-space direction of the item to settle on) is far enough from
/// [`FRONT`], in which case the sphere is steered to bring it to the front.
pub fn step(
    state: ArcballState,
    pointer: &PointerSnapshot,
    snap_target: Option<Vector3<f32>>,
    dt_ms: f32,
    tuning: &MenuTuning,
) -> ArcballState {
    let ArcballState {
        orientation,
        mut velocity,
        mut axis,
    } = state;

    let time_scale = tuning.time_scale(dt_ms);
    let decay = tuning.decay_base.powf(time_scale);

    if pointer.down {
        let delta = pointer.position - pointer.last_position;
        let dist = delta.magnitude();
        if dist > 0.0 {
            // Perpendicular to the drag in screen space; screen Y points down.
            axis = Vector3::new(delta.y / dist, delta.x / dist, 0.0);
            velocity = dist * tuning.drag_sensitivity;
        } else {
            velocity *= decay;
        }
    } else {
        match snap_target.and_then(|target| homing_axis_angle(target, tuning.snap_epsilon)) {
            Some((homing_axis, angle)) => {
                let snap_velocity = angle * tuning.snap_gain;
                velocity += (snap_velocity - velocity) * tuning.snap_response * time_scale;
                axis = homing_axis;
            }
            None => velocity *= decay,
        }
    }

    let q = Quaternion::from_axis_angle(axis, Rad(velocity * time_scale));
    ArcballState {
        orientation: (q * orientation).normalize(),
        velocity,
        axis,
    }
}

/// Returns the axis and angle that rotate `target` onto [`FRONT`], or `None`
/// if they are already within `epsilon` radians or the axis is undefined.
fn homing_axis_angle(target: Vector3<f32>, epsilon: f32) -> Option<(Vector3<f32>, f32)> {
    let target = target.normalize();
    let angle = target.dot(FRONT).clamp(-1.0, 1.0).acos();
    let cross = target.cross(FRONT);
    (angle > epsilon && cross.magnitude2() > 0.0).then(|| (cross.normalize(), angle))
}

/// Raw pointer input.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PointerEvent {
    /// Primary button pressed at a position in logical pixels.
    Down(Point2<f32>),
    /// Pointer moved to a position in logical pixels.
    Move(Point2<f32>),
    /// Primary button released.
    Up,
}

/// Stateful wrapper around [`step()`] that records pointer events.
///
/// Events only record state. Rotation changes only in
/// [`ArcballControl::update()`].
#[derive(Debug, Clone)]
pub struct ArcballControl {
    state: ArcballState,
    pointer: PointerSnapshot,
    attached: bool,
}
impl Default for ArcballControl {
    fn default() -> Self {
        Self::new()
    }
}
impl ArcballControl {
    /// Constructs a control at rest with identity orientation.
    pub fn new() -> Self {
        Self {
            state: ArcballState::default(),
            pointer: PointerSnapshot::default(),
            attached: true,
        }
    }

    /// Returns the current rotation state.
    pub fn state(&self) -> &ArcballState {
        &self.state
    }
    /// Replaces the rotation state, for example to restore a saved
    /// orientation.
    pub fn set_state(&mut self, state: ArcballState) {
        self.state = state;
    }
    /// Returns whether the primary button is held.
    pub fn is_pointer_down(&self) -> bool {
        self.pointer.down
    }
    /// Returns whether the control still accepts pointer events.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Records a pointer event. Ignored once detached.
    pub fn handle_event(&mut self, event: PointerEvent) {
        if !self.attached {
            return;
        }
        match event {
            PointerEvent::Down(pos) => {
                self.pointer.down = true;
                self.pointer.position = pos;
                self.pointer.last_position = pos;
            }
            PointerEvent::Move(pos) => {
                if self.pointer.down {
                    self.pointer.position = pos;
                }
            }
            PointerEvent::Up => self.pointer.down = false,
        }
    }

    /// Integrates one frame.
    pub fn update(&mut self, dt_ms: f32, snap_target: Option<Vector3<f32>>, tuning: &MenuTuning) {
        self.state = step(self.state, &self.pointer, snap_target, dt_ms, tuning);
        self.pointer.last_position = self.pointer.position;
    }

    /// Stops accepting pointer events and releases any held button.
    pub fn detach(&mut self) {
        self.attached = false;
        self.pointer.down = false;
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const FRAME: f32 = 1000.0 / 60.0;

    fn idle() -> PointerSnapshot {
        PointerSnapshot::default()
    }

    fn coasting(velocity: f32) -> ArcballState {
        ArcballState {
            velocity,
            axis: Vector3::unit_y(),
            ..Default::default()
        }
    }

    proptest! {
        #[test]
        fn proptest_coasting_velocity_strictly_decreases(
            v0 in 0.001..1.0_f32,
            dt in 1.0..32.0_f32,
        ) {
            let tuning = MenuTuning::default();
            let mut state = coasting(v0);
            let mut frames = 0;
            while state.velocity > 1e-6 {
                let next = step(state, &idle(), None, dt, &tuning);
                prop_assert!(next.velocity < state.velocity);
                prop_assert!(next.velocity >= 0.0);
                state = next;
                frames += 1;
                prop_assert!(frames < 10_000, "velocity never decayed");
            }
        }
    }

    #[test]
    fn test_drag_moves_front_with_pointer() {
        let tuning = MenuTuning::default();
        let pointer = PointerSnapshot {
            down: true,
            position: Point2::new(110.0, 50.0),
            last_position: Point2::new(100.0, 50.0),
        };
        let state = step(ArcballState::default(), &pointer, None, FRAME, &tuning);

        assert!((state.velocity - 10.0 * tuning.drag_sensitivity).abs() < 1e-6);
        assert!((state.axis - Vector3::unit_y()).magnitude() < 1e-6);
        // Dragging right carries the front of the sphere to the right.
        assert!(state.to_world(FRONT).x > 0.0);

        let pointer = PointerSnapshot {
            down: true,
            position: Point2::new(100.0, 60.0),
            last_position: Point2::new(100.0, 50.0),
        };
        let state = step(ArcballState::default(), &pointer, None, FRAME, &tuning);
        // Dragging down (screen Y) carries it down (world Y).
        assert!(state.to_world(FRONT).y < 0.0);
    }

    #[test]
    fn test_stationary_drag_decays() {
        let tuning = MenuTuning::default();
        let pointer = PointerSnapshot {
            down: true,
            ..Default::default()
        };
        let state = step(coasting(0.1), &pointer, None, FRAME, &tuning);
        assert!(state.velocity < 0.1);
        assert!(state.velocity > 0.07);
    }

    #[test]
    fn test_homing_turns_target_toward_front() {
        let tuning = MenuTuning::default();
        let target = Vector3::new(0.3, 0.0, 1.0).normalize();
        let state = step(ArcballState::default(), &idle(), Some(target), FRAME, &tuning);
        assert!(state.velocity > 0.0);
        let moved = state.to_world(target);
        assert!(moved.dot(FRONT) > target.dot(FRONT));

        // Aligned targets don't inject velocity.
        let state = step(coasting(0.0), &idle(), Some(FRONT), FRAME, &tuning);
        assert_eq!(state.velocity, 0.0);
    }

    #[test]
    fn test_frame_rate_independence() {
        let tuning = MenuTuning::default();
        let pointer = PointerSnapshot {
            down: true,
            position: Point2::new(4.0, 0.0),
            last_position: Point2::new(0.0, 0.0),
        };
        // One long frame rotates as far as two short frames at the same
        // velocity.
        let once = step(ArcballState::default(), &pointer, None, 2.0 * FRAME, &tuning);
        let half = step(ArcballState::default(), &pointer, None, FRAME, &tuning);
        let twice = step(half, &pointer, None, FRAME, &tuning);

        let angle_once = once.facing().dot(FRONT).clamp(-1.0, 1.0).acos();
        let angle_twice = twice.facing().dot(FRONT).clamp(-1.0, 1.0).acos();
        assert!((angle_once - angle_twice).abs() < 1e-3);
    }

    #[test]
    fn test_control_records_without_rotating() {
        let tuning = MenuTuning::default();
        let mut control = ArcballControl::new();
        control.handle_event(PointerEvent::Move(Point2::new(5.0, 5.0)));
        control.handle_event(PointerEvent::Down(Point2::new(0.0, 0.0)));
        control.handle_event(PointerEvent::Move(Point2::new(20.0, 0.0)));
        assert_eq!(*control.state(), ArcballState::default());

        control.update(FRAME, None, &tuning);
        assert!(control.state().velocity > 0.0);

        // No further movement, so the next frame sees zero displacement.
        let v = control.state().velocity;
        control.update(FRAME, None, &tuning);
        assert!(control.state().velocity < v);

        control.detach();
        assert!(!control.is_pointer_down());
        control.handle_event(PointerEvent::Down(Point2::new(0.0, 0.0)));
        assert!(!control.is_pointer_down());
    }
}
