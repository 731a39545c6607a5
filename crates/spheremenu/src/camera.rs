use cgmath::{EuclideanSpace, Matrix4, Point3, Rad, SquareMatrix, Vector3};

/// Converts OpenGL clip space (depth from -1 to 1) to WGPU clip space (depth
/// from 0 to 1).
#[rustfmt::skip]
const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Perspective camera on the +Z axis looking at the sphere center.
///
/// The field of view is not fixed. It is solved from the sphere radius and
/// the camera's rest distance so that the sphere covers the same share of
/// the viewport regardless of zoom, widening on portrait viewports so items
/// don't crowd the narrow axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position.
    pub position: Point3<f32>,
    /// Point the camera looks at.
    pub target: Point3<f32>,
    /// Up direction.
    pub up: Vector3<f32>,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,

    sphere_radius: f32,
    rest_distance: f32,
    aspect: f32,
    fov: Rad<f32>,

    view: Matrix4<f32>,
    projection: Matrix4<f32>,
}
impl Camera {
    /// Constructs a camera at `rest_distance` from the center of a sphere
    /// with radius `sphere_radius`, with a square viewport.
    pub fn new(sphere_radius: f32, rest_distance: f32, near: f32, far: f32) -> Self {
        let mut ret = Self {
            position: Point3::new(0.0, 0.0, rest_distance),
            target: Point3::origin(),
            up: Vector3::unit_y(),
            near,
            far,

            sphere_radius,
            rest_distance,
            aspect: 1.0,
            fov: Rad(0.0),

            view: Matrix4::identity(),
            projection: Matrix4::identity(),
        };
        ret.update_view_matrix();
        ret.update_projection_matrix();
        ret
    }

    /// Returns the view matrix.
    pub fn view(&self) -> Matrix4<f32> {
        self.view
    }
    /// Returns the projection matrix, in WGPU clip space.
    pub fn projection(&self) -> Matrix4<f32> {
        self.projection
    }
    /// Returns the vertical field of view.
    pub fn fov(&self) -> Rad<f32> {
        self.fov
    }
    /// Returns the viewport aspect ratio (width / height).
    pub fn aspect(&self) -> f32 {
        self.aspect
    }
    /// Returns the distance that the field of view is solved against.
    pub fn rest_distance(&self) -> f32 {
        self.rest_distance
    }
    /// Returns the current distance from the camera to its target.
    pub fn distance(&self) -> f32 {
        (self.position - self.target).z
    }

    /// Sets the viewport size and recomputes the projection. Returns `false`
    /// and does nothing if either dimension is zero or not finite.
    pub fn set_viewport(&mut self, width: f32, height: f32) -> bool {
        let aspect = width / height;
        if !(width > 0.0 && height > 0.0 && aspect.is_finite()) {
            return false;
        }
        self.aspect = aspect;
        self.update_projection_matrix();
        true
    }

    /// Sets the rest distance and recomputes the projection. The camera
    /// itself is not moved; see [`Camera::ease_toward()`].
    pub fn set_rest_distance(&mut self, distance: f32) {
        self.rest_distance = distance;
        self.update_projection_matrix();
    }

    /// Moves the camera `1/damping` of the way from its current distance to
    /// `distance` and updates the view matrix.
    pub fn ease_toward(&mut self, distance: f32, damping: f32) {
        self.position.z += (distance - self.position.z) / damping.max(1.0);
        self.update_view_matrix();
    }

    /// Recomputes the view matrix from the position, target, and up vector.
    pub fn update_view_matrix(&mut self) {
        self.view = Matrix4::look_at_rh(self.position, self.target, self.up);
    }

    /// Recomputes the field of view and projection matrix.
    pub fn update_projection_matrix(&mut self) {
        self.fov = solve_fov(self.sphere_radius, self.rest_distance, self.aspect);
        self.projection =
            OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fov, self.aspect, self.near, self.far);
    }
}

/// Returns the vertical field of view at which half the sphere's radius
/// spans half the viewport's shorter axis when viewed from `distance`.
pub fn solve_fov(sphere_radius: f32, distance: f32, aspect: f32) -> Rad<f32> {
    let height = sphere_radius * 0.5;
    if aspect > 1.0 {
        Rad(2.0 * (height / distance).atan())
    } else {
        Rad(2.0 * (height / aspect / distance).atan())
    }
}
