use std::sync::Arc;

use eyre::Result;
use image::RgbaImage;

use super::bindings::WgpuPassExt;
use super::pipelines::render_discs;
use super::structs::{BillboardVertex, InstanceRaw, MenuUniforms};
use super::{CachedTexture, GraphicsState};
use crate::{Frame, Geometry, MenuRenderer};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const ATLAS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

struct MeshBuffers {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// [`MenuRenderer`] that draws onto a WGPU surface.
pub struct WgpuMenuRenderer {
    gfx: Arc<GraphicsState>,

    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,

    mesh: Option<MeshBuffers>,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    instance_data: Vec<InstanceRaw>,
    uniform_buffer: wgpu::Buffer,

    /// Transparent until the real atlas is uploaded.
    atlas_texture: CachedTexture,
    depth_texture: CachedTexture,
}
impl std::fmt::Debug for WgpuMenuRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuMenuRenderer")
            .field("surface_config", &self.surface_config)
            .field("instance_capacity", &self.instance_capacity)
            .finish_non_exhaustive()
    }
}
impl WgpuMenuRenderer {
    /// Constructs a renderer that draws onto `surface`. The surface is
    /// configured immediately using `surface_config`, whose format must
    /// match [`GraphicsState::target_format`].
    pub fn new(
        gfx: Arc<GraphicsState>,
        surface: wgpu::Surface<'static>,
        surface_config: wgpu::SurfaceConfiguration,
    ) -> Result<Self> {
        eyre::ensure!(
            surface_config.format == gfx.target_format,
            "surface format {:?} does not match pipeline format {:?}",
            surface_config.format,
            gfx.target_format,
        );
        surface.configure(&gfx.device, &surface_config);

        let instance_buffer = gfx.create_buffer::<InstanceRaw>(
            "billboard_instances",
            1,
            wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        );
        let uniform_buffer = gfx.create_uniform_buffer::<MenuUniforms>("menu_uniforms");

        let atlas_texture = CachedTexture::new(
            Arc::clone(&gfx),
            "atlas_texture",
            ATLAS_FORMAT,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );
        let mut depth_texture = CachedTexture::new(
            Arc::clone(&gfx),
            "depth_texture",
            DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
        depth_texture.set_size([surface_config.width, surface_config.height]);

        Ok(Self {
            gfx,

            surface,
            surface_config,

            mesh: None,
            instance_buffer,
            instance_capacity: 1,
            instance_data: vec![],
            uniform_buffer,

            atlas_texture,
            depth_texture,
        })
    }

    /// Returns the graphics state shared with other renderers.
    pub fn gfx(&self) -> &Arc<GraphicsState> {
        &self.gfx
    }

    fn write_instances(&mut self, instances: &[cgmath::Matrix4<f32>]) {
        self.instance_data.clear();
        self.instance_data
            .extend(instances.iter().map(InstanceRaw::from));

        if self.instance_data.len() > self.instance_capacity {
            self.instance_capacity = self.instance_data.len().next_power_of_two();
            self.instance_buffer = self.gfx.create_buffer::<InstanceRaw>(
                "billboard_instances",
                self.instance_capacity,
                wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            );
        }
        self.gfx
            .write_buffer(&self.instance_buffer, 0, &self.instance_data);
    }
}
impl MenuRenderer for WgpuMenuRenderer {
    fn max_texture_dimension(&self) -> u32 {
        self.gfx.max_texture_dimension()
    }

    fn set_billboard_mesh(&mut self, mesh: &Geometry) -> Result<()> {
        let vertices = BillboardVertex::from_geometry(mesh);
        let indices = mesh.index_data();
        eyre::ensure!(!indices.is_empty(), "billboard mesh has no faces");

        self.mesh = Some(MeshBuffers {
            vertex_buffer: self.gfx.create_buffer_init(
                "billboard_vertices",
                &vertices,
                wgpu::BufferUsages::VERTEX,
            ),
            index_buffer: self.gfx.create_buffer_init(
                "billboard_indices",
                &indices,
                wgpu::BufferUsages::INDEX,
            ),
            index_count: indices.len() as u32,
        });
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.gfx.device, &self.surface_config);
        self.depth_texture.set_size([width, height]);
    }

    fn upload_atlas(&mut self, atlas: &RgbaImage) {
        let (width, height) = atlas.dimensions();
        let max = self.max_texture_dimension();
        if width == 0 || height == 0 || width > max || height > max {
            log::error!("refusing to upload {width}x{height} atlas (limit is {max})");
            return;
        }
        self.atlas_texture
            .write_rgba8([width, height], atlas.as_raw());
    }

    fn render(&mut self, frame: &Frame<'_>) -> Result<()> {
        if self.mesh.is_none() {
            return Ok(());
        }

        let surface_texture = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost or outdated; reconfiguring");
                self.surface.configure(&self.gfx.device, &self.surface_config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("timed out acquiring surface texture; skipping frame");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        self.write_instances(frame.instances);
        self.gfx.write_buffer(
            &self.uniform_buffer,
            0,
            &[MenuUniforms::from(&frame.uniforms)],
        );

        let Some(mesh) = &self.mesh else {
            return Ok(());
        };
        let pipeline = &self.gfx.pipelines.render_discs;
        let bind_groups = pipeline.bind_groups(render_discs::Bindings {
            menu_uniforms: &self.uniform_buffer,
            atlas_texture: &self.atlas_texture.view,
            atlas_sampler: &self.gfx.atlas_sampler,
        });

        let target = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render_menu"),
            });
        {
            let mut render_pass = render_discs::PassParams {
                clear_color: frame.uniforms.clear_color,
                target: &target,
                depth_texture: &self.depth_texture.view,
            }
            .begin_pass(&mut encoder);

            render_pass.set_pipeline(&pipeline.pipeline);
            render_pass.set_bind_groups(&bind_groups);
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.index_count, 0, 0..frame.instances.len() as u32);
        }
        self.gfx.queue.submit([encoder.finish()]);
        surface_texture.present();

        Ok(())
    }
}
