use std::fmt;

use eyre::{Result, bail};
use wgpu::util::DeviceExt;

use super::pipelines::Pipelines;

/// WGPU graphics state.
#[allow(missing_docs)]
pub struct GraphicsState {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    /// Format of the surface that the menu is drawn onto.
    pub target_format: wgpu::TextureFormat,

    pub(super) pipelines: Pipelines,

    pub(super) atlas_sampler: wgpu::Sampler,
}
impl fmt::Debug for GraphicsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphicsState")
            .field("target_format", &self.target_format)
            .finish_non_exhaustive()
    }
}
impl GraphicsState {
    /// Constructs a new [`GraphicsState`], compiling the shader and every
    /// pipeline.
    ///
    /// Returns an error if the shader fails to compile or a pipeline fails
    /// validation.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target_format: wgpu::TextureFormat,
    ) -> Result<Self> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipelines = Pipelines::new(device, target_format);
        if let Some(e) = pollster::block_on(device.pop_error_scope()) {
            bail!("error creating render pipelines: {e}");
        }

        let atlas_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("atlas_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Ok(Self {
            device: device.clone(),
            queue: queue.clone(),
            target_format,

            pipelines,

            atlas_sampler,
        })
    }

    /// Returns the largest supported edge length of a 2D texture.
    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    pub(super) fn create_buffer_init<T: Default + bytemuck::NoUninit>(
        &self,
        label: impl fmt::Display,
        contents: &[T],
        usage: wgpu::BufferUsages,
    ) -> wgpu::Buffer {
        let mut contents = contents.to_vec();
        super::pad_buffer_to_wgpu_copy_buffer_alignment(&mut contents);

        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&label.to_string()),
                contents: bytemuck::cast_slice::<T, u8>(contents.as_slice()),
                usage,
            })
    }
    pub(super) fn create_buffer<T>(
        &self,
        label: impl fmt::Display,
        len: usize,
        usage: wgpu::BufferUsages,
    ) -> wgpu::Buffer {
        let size = size_of::<T>() * std::cmp::max(1, len); // don't make an empty buffer
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&label.to_string()),
            size: wgpu::util::align_to(size as u64, wgpu::COPY_BUFFER_ALIGNMENT),
            usage,
            mapped_at_creation: false,
        })
    }

    pub(super) fn create_uniform_buffer<T>(&self, label: impl fmt::Display) -> wgpu::Buffer {
        self.create_buffer::<T>(
            label,
            1,
            wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::UNIFORM,
        )
    }

    pub(super) fn create_texture(&self, mut desc: wgpu::TextureDescriptor<'_>) -> wgpu::Texture {
        // Respect texture limits.
        let max = self.max_texture_dimension();
        desc.size.width = desc.size.width.clamp(1, max);
        desc.size.height = desc.size.height.clamp(1, max);

        self.device.create_texture(&desc)
    }

    pub(super) fn write_buffer<T: bytemuck::NoUninit>(
        &self,
        buffer: &wgpu::Buffer,
        offset: wgpu::BufferAddress,
        data: &[T],
    ) {
        self.queue
            .write_buffer(buffer, offset, bytemuck::cast_slice(data));
    }
}
