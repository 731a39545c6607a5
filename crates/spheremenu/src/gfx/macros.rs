macro_rules! blend_component {
    ($operation:ident(src * $src_factor:ident, dst * $dst_factor:ident)) => {
        ::wgpu::BlendComponent {
            src_factor: ::wgpu::BlendFactor::$src_factor,
            dst_factor: ::wgpu::BlendFactor::$dst_factor,
            operation: ::wgpu::BlendOperation::$operation,
        }
    };
}

/// Declares a render pipeline along with its bindings struct and the
/// parameters its descriptor depends on.
macro_rules! render_pipeline {
    ($vis:vis struct $pipeline_name:ident {
        struct $bindings_name:ident<$lt:lifetime> {
            $($binding:ident: $binding_type:ty = pub($stages:ident) $metadata:expr),* $(,)?
        }

        struct $params_name:ident {
            $($param:ident: $param_type:ty),* $(,)?
        }

        let pipeline_descriptor = $descriptor:expr;
    }) => {
        $vis struct $bindings_name<$lt> {
            $(pub $binding: $binding_type),*
        }
        impl<$lt> $crate::gfx::bindings::BindGroupsTrait<$lt> for $bindings_name<$lt> {
            const BINDINGS: &'static [$crate::gfx::bindings::BindingMetadata] = &[$(
                $crate::gfx::bindings::BindingMetadata {
                    visibility: ::wgpu::ShaderStages::$stages,
                    ..$metadata
                }
            ),*];

            fn binding_resources(self) -> Vec<::wgpu::BindingResource<$lt>> {
                vec![$($crate::gfx::bindings::IntoBindingResource::into_binding_resource(self.$binding)),*]
            }
        }

        $vis struct $params_name {
            $(pub $param: $param_type),*
        }

        $vis struct $pipeline_name {
            pub pipeline: ::wgpu::RenderPipeline,
            device: ::wgpu::Device,
            label: String,
            bind_group_layouts: Vec<::wgpu::BindGroupLayout>,
        }
        impl $pipeline_name {
            pub fn new(
                device: &::wgpu::Device,
                shader_module: &::wgpu::ShaderModule,
                params: $params_name,
            ) -> Self {
                let $params_name { $($param),* } = params;
                let desc = $descriptor;

                let label = desc.label.to_string();
                let (pipeline_layout, bind_group_layouts) =
                    <$bindings_name<'static> as $crate::gfx::bindings::BindGroupsTrait<'static>>::pipeline_layout(
                        device, &label,
                    );

                Self {
                    pipeline: desc.create_pipeline(device, shader_module, &pipeline_layout),
                    device: device.clone(),
                    label,
                    bind_group_layouts,
                }
            }

            pub fn bind_groups(&self, bindings: $bindings_name<'_>) -> $crate::gfx::bindings::BindGroups {
                $crate::gfx::bindings::BindGroupsTrait::bind_groups(
                    bindings,
                    &self.device,
                    &self.label,
                    &self.bind_group_layouts,
                )
            }
        }
    };
}
