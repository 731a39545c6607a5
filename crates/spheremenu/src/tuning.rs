use serde::{Deserialize, Serialize};

/// Tunable constants for geometry, physics, camera, and rendering.
///
/// The defaults reproduce the stock look and feel. Several of these (notably
/// [`MenuTuning::depth_scale_intensity`]) are stylistic and have no physical
/// derivation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MenuTuning {
    /// Radius of the geodesic sphere.
    pub sphere_radius: f32,
    /// Number of times the icosahedron is subdivided.
    pub subdivisions: usize,

    /// Base scale of each billboard.
    pub billboard_scale: f32,
    /// How much nearer billboards grow relative to farther ones, from 0 (no
    /// change) to 1.
    pub depth_scale_intensity: f32,

    /// Angular velocity per logical pixel of pointer movement.
    pub drag_sensitivity: f32,
    /// Fraction of angular velocity retained per target frame while coasting.
    pub decay_base: f32,
    /// Homing velocity per radian of misalignment.
    pub snap_gain: f32,
    /// Fraction of the homing velocity error corrected per target frame.
    pub snap_response: f32,
    /// Misalignment in radians below which homing stops.
    pub snap_epsilon: f32,
    /// Angular velocity above which the menu counts as moving.
    pub moving_threshold: f32,

    /// Frame duration in milliseconds that all per-frame rates are
    /// normalized against.
    pub target_frame_ms: f32,
    /// Longest frame duration in milliseconds that will be integrated.
    pub max_frame_ms: f32,

    /// Camera distance from the sphere center at rest, before applying the
    /// menu scale factor.
    pub camera_distance: f32,
    /// Extra camera distance while dragging.
    pub drag_pullback: f32,
    /// Extra camera distance per unit of angular velocity while dragging.
    pub drag_pullback_velocity: f32,
    /// Camera easing divisor while idle.
    pub camera_damping_idle: f32,
    /// Camera easing divisor while dragging.
    pub camera_damping_drag: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,

    /// Edge length of one atlas cell in pixels. May be reduced to fit the
    /// GPU's texture size limit.
    pub atlas_cell_size: u32,
    /// Multiplier applied to the angular velocity passed to the shader.
    pub rim_velocity_gain: f32,
    /// Background color as linear RGBA.
    pub clear_color: [f32; 4],
}
impl Default for MenuTuning {
    fn default() -> Self {
        Self {
            sphere_radius: 2.0,
            subdivisions: 1,

            billboard_scale: 0.25,
            depth_scale_intensity: 0.6,

            drag_sensitivity: 0.005,
            decay_base: 0.8,
            snap_gain: 0.1,
            snap_response: 0.2,
            snap_epsilon: 0.001,
            moving_threshold: 0.01,

            target_frame_ms: 1000.0 / 60.0,
            max_frame_ms: 32.0,

            camera_distance: 3.0,
            drag_pullback: 2.5,
            drag_pullback_velocity: 80.0,
            camera_damping_idle: 5.0,
            camera_damping_drag: 7.0,
            near: 0.1,
            far: 40.0,

            atlas_cell_size: 512,
            rim_velocity_gain: 1.1,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}
impl MenuTuning {
    /// Returns the frame-rate normalization factor for a frame lasting
    /// `dt_ms` milliseconds. Never zero.
    pub fn time_scale(&self, dt_ms: f32) -> f32 {
        dt_ms / self.target_frame_ms + 0.0001
    }
}
