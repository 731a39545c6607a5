use super::*;

render_pipeline!(pub(in crate::gfx) struct Pipeline {
    struct Bindings<'a> {
        menu_uniforms: &'a wgpu::Buffer      = pub(VERTEX_FRAGMENT) bindings::MENU_UNIFORMS,
        atlas_texture: &'a wgpu::TextureView = pub(FRAGMENT) bindings::ATLAS_TEXTURE,
        atlas_sampler: &'a wgpu::Sampler     = pub(FRAGMENT) bindings::ATLAS_SAMPLER,
    }

    struct PipelineParams {
        target_format: wgpu::TextureFormat,
    }

    let pipeline_descriptor = RenderPipelineDescriptor {
        label: "render_discs",
        vertex_buffers: &[BillboardVertex::LAYOUT, InstanceRaw::LAYOUT],
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: wgpu::TextureFormat::Depth32Float,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        fragment_target: Some(wgpu::ColorTargetState {
            format: target_format,
            blend: Some(wgpu::BlendState {
                color: blend_component!(Add(src * SrcAlpha, dst * OneMinusSrcAlpha)),
                alpha: blend_component!(Add(src * One, dst * OneMinusSrcAlpha)),
            }),
            write_mask: wgpu::ColorWrites::ALL,
        }),
        ..Default::default()
    };
});

pub(in crate::gfx) struct PassParams<'tex> {
    pub clear_color: [f32; 4],
    pub target: &'tex wgpu::TextureView,
    pub depth_texture: &'tex wgpu::TextureView,
}
impl<'pass> PassParams<'pass> {
    pub fn begin_pass(self, encoder: &'pass mut wgpu::CommandEncoder) -> wgpu::RenderPass<'pass> {
        let [r, g, b, a] = self.clear_color.map(f64::from);
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("render_discs"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: self.target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: self.depth_texture,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        })
    }
}
