use cgmath::{Matrix4, Point3, Vector3};
use image::RgbaImage;

use crate::Geometry;

/// Per-frame values shared by every billboard.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameUniforms {
    /// Global transform applied to the whole sphere.
    pub world: Matrix4<f32>,
    /// View matrix.
    pub view: Matrix4<f32>,
    /// Projection matrix, in WGPU clip space.
    pub projection: Matrix4<f32>,
    /// Camera position in world space.
    pub camera_position: Point3<f32>,
    /// Current rotation axis.
    pub rotation_axis: Vector3<f32>,
    /// Current angular velocity, scaled for display.
    pub rotation_velocity: f32,
    /// Number of distinct items.
    pub item_count: u32,
    /// Number of atlas cells along each edge.
    pub atlas_grid_size: u32,
    /// Frames elapsed since the menu started, normalized to the target frame
    /// rate.
    pub frames: f32,
    /// Menu scale factor.
    pub scale_factor: f32,
    /// Background color as linear RGBA.
    pub clear_color: [f32; 4],
}

/// Everything needed to draw one frame.
#[derive(Debug, Copy, Clone)]
pub struct Frame<'a> {
    /// Shared values.
    pub uniforms: FrameUniforms,
    /// One transform per billboard, recomputed every frame.
    pub instances: &'a [Matrix4<f32>],
}

/// Backend that draws the menu.
///
/// Dropping the renderer releases all of its resources.
pub trait MenuRenderer {
    /// Returns the largest texture edge length the backend supports.
    fn max_texture_dimension(&self) -> u32;

    /// Uploads the mesh drawn once per billboard.
    fn set_billboard_mesh(&mut self, mesh: &Geometry) -> eyre::Result<()>;

    /// Reallocates size-dependent resources for a new backing size in
    /// physical pixels. Both dimensions are nonzero.
    fn resize(&mut self, width: u32, height: u32);

    /// Replaces the atlas texture.
    fn upload_atlas(&mut self, atlas: &RgbaImage);

    /// Draws one frame with a single instanced draw call.
    fn render(&mut self, frame: &Frame<'_>) -> eyre::Result<()>;
}
