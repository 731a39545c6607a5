//! Structs shared between the CPU and GPU (vertices, uniforms, etc.).

use cgmath::Matrix4;

use crate::{FrameUniforms, Geometry};

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, bytemuck::NoUninit, bytemuck::Zeroable)]
pub(super) struct BillboardVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}
impl BillboardVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![
            0 => Float32x3,
            1 => Float32x2,
        ],
    };

    pub fn from_geometry(mesh: &Geometry) -> Vec<Self> {
        mesh.vertices()
            .iter()
            .map(|v| Self {
                position: v.position.into(),
                uv: v.uv.into(),
            })
            .collect()
    }
}

/// Model matrix of one billboard, as four column vectors.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, bytemuck::NoUninit, bytemuck::Zeroable)]
pub(super) struct InstanceRaw {
    pub model: [[f32; 4]; 4],
}
impl InstanceRaw {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &wgpu::vertex_attr_array![
            2 => Float32x4,
            3 => Float32x4,
            4 => Float32x4,
            5 => Float32x4,
        ],
    };
}
impl From<&Matrix4<f32>> for InstanceRaw {
    fn from(m: &Matrix4<f32>) -> Self {
        Self { model: (*m).into() }
    }
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, bytemuck::NoUninit, bytemuck::Zeroable)]
pub(super) struct MenuUniforms {
    pub world: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    /// XYZ = camera position; W is unused
    pub camera_position: [f32; 4],
    /// XYZ = rotation axis; W = rotation velocity
    pub rotation_axis_velocity: [f32; 4],
    pub item_count: u32,
    pub atlas_grid_size: u32,
    pub frames: f32,
    pub scale_factor: f32,
}
impl From<&FrameUniforms> for MenuUniforms {
    fn from(u: &FrameUniforms) -> Self {
        let [x, y, z] = u.camera_position.into();
        let [ax, ay, az] = u.rotation_axis.into();
        Self {
            world: u.world.into(),
            view: u.view.into(),
            projection: u.projection.into(),
            camera_position: [x, y, z, 1.0],
            rotation_axis_velocity: [ax, ay, az, u.rotation_velocity],
            item_count: u.item_count,
            atlas_grid_size: u.atlas_grid_size,
            frames: u.frames,
            scale_factor: u.scale_factor,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_uniform_layout_matches_wgsl() {
        // Three mat4x4, two vec4, then four scalars.
        assert_eq!(size_of::<MenuUniforms>(), 3 * 64 + 2 * 16 + 4 * 4);
        assert_eq!(size_of::<MenuUniforms>() % 16, 0);
        assert_eq!(size_of::<InstanceRaw>(), 64);
    }

    #[test]
    fn test_billboard_vertices_from_plane() {
        let verts = BillboardVertex::from_geometry(&Geometry::plane(1.0, 1.0));
        assert_eq!(verts.len(), 4);
        assert_eq!(verts[0].position, [-0.5, 0.5, 0.0]);
        assert_eq!(verts[0].uv, [0.0, 1.0]);
        assert_eq!(verts[3].uv, [1.0, 0.0]);
    }
}
