use crate::gfx::structs::{BillboardVertex, InstanceRaw};

pub(in crate::gfx) mod render_discs;

#[rustfmt::skip]
mod bindings {
    use wgpu::BufferBindingType::Uniform;
    use wgpu::SamplerBindingType::Filtering;
    use wgpu::TextureSampleType::Float;
    use wgpu::TextureViewDimension::D2;

    use crate::gfx::bindings::{buffer, sampler, texture, BindingMetadata};

    // Per-frame parameters
    pub const MENU_UNIFORMS: BindingMetadata = buffer(0, 0, Uniform);

    // Item images
    pub const ATLAS_TEXTURE: BindingMetadata = texture(1, 0, D2, Float { filterable: true });
    pub const ATLAS_SAMPLER: BindingMetadata = sampler(1, 1, Filtering);
}

pub(in crate::gfx) struct Pipelines {
    /// Render every billboard in one instanced draw.
    pub render_discs: render_discs::Pipeline,
}
impl Pipelines {
    pub(super) fn new(device: &wgpu::Device, target_format: wgpu::TextureFormat) -> Self {
        let shader_module = &device.create_shader_module(wgpu::include_wgsl!("../shader.wgsl"));

        Self {
            render_discs: render_discs::Pipeline::new(
                device,
                shader_module,
                render_discs::PipelineParams { target_format },
            ),
        }
    }
}

#[derive(Default)]
struct RenderPipelineDescriptor<'a> {
    label: &'a str,
    vertex_buffers: &'a [wgpu::VertexBufferLayout<'a>],
    primitive: wgpu::PrimitiveState,
    depth_stencil: Option<wgpu::DepthStencilState>,
    multisample: wgpu::MultisampleState,
    fragment_target: Option<wgpu::ColorTargetState>,
}
impl RenderPipelineDescriptor<'_> {
    fn create_pipeline(
        self,
        device: &wgpu::Device,
        shader_module: &wgpu::ShaderModule,
        pipeline_layout: &wgpu::PipelineLayout,
    ) -> wgpu::RenderPipeline {
        let vertex_entry_point = format!("{}_vertex", self.label);
        let fragment_entry_point = format!("{}_fragment", self.label);

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{}_pipeline", self.label)),
            layout: Some(pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader_module,
                entry_point: Some(&vertex_entry_point),
                compilation_options: Default::default(),
                buffers: self.vertex_buffers,
            },
            primitive: self.primitive,
            depth_stencil: self.depth_stencil,
            multisample: self.multisample,
            fragment: Some(wgpu::FragmentState {
                module: shader_module,
                entry_point: Some(&fragment_entry_point),
                compilation_options: Default::default(),
                targets: &[self.fragment_target],
            }),
            multiview: None,
            cache: None,
        })
    }
}
