use itertools::Itertools;

pub(in crate::gfx) const fn buffer(
    group: u32,
    binding: u32,
    ty: wgpu::BufferBindingType,
) -> BindingMetadata {
    BindingMetadata {
        group,
        binding,
        ty: wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        visibility: wgpu::ShaderStages::NONE,
    }
}
pub(in crate::gfx) const fn texture(
    group: u32,
    binding: u32,
    view_dimension: wgpu::TextureViewDimension,
    sample_type: wgpu::TextureSampleType,
) -> BindingMetadata {
    BindingMetadata {
        group,
        binding,
        ty: wgpu::BindingType::Texture {
            sample_type,
            view_dimension,
            multisampled: false,
        },
        visibility: wgpu::ShaderStages::NONE,
    }
}
pub(in crate::gfx) const fn sampler(
    group: u32,
    binding: u32,
    ty: wgpu::SamplerBindingType,
) -> BindingMetadata {
    BindingMetadata {
        group,
        binding,
        ty: wgpu::BindingType::Sampler(ty),
        visibility: wgpu::ShaderStages::NONE,
    }
}

pub(in crate::gfx) struct BindingMetadata {
    pub group: u32,
    pub binding: u32,
    pub ty: wgpu::BindingType,
    pub visibility: wgpu::ShaderStages,
}

pub(in crate::gfx) struct BindGroups {
    bind_groups: Vec<wgpu::BindGroup>,
}

/// Splits `items` into one list per bind group, dropping trailing empty
/// groups.
fn group_by_index<T>(
    max_bind_groups: u32,
    items: impl IntoIterator<Item = (u32, T)>,
) -> Vec<Vec<T>> {
    let mut groups: Vec<Vec<T>> = std::iter::repeat_with(Vec::new)
        .take(max_bind_groups as usize)
        .collect();
    for (group, item) in items {
        let Some(entries) = groups.get_mut(group as usize) else {
            log::error!("bind group index {group} out of range (max {max_bind_groups})");
            continue;
        };
        entries.push(item);
    }
    while groups.last().is_some_and(|group| group.is_empty()) {
        groups.pop();
    }
    groups
}

pub(in crate::gfx) trait BindGroupsTrait<'a>: Sized {
    const BINDINGS: &'static [BindingMetadata];

    fn binding_resources(self) -> Vec<wgpu::BindingResource<'a>>;

    fn bind_groups(
        self,
        device: &wgpu::Device,
        label: &str,
        bind_group_layouts: &[wgpu::BindGroupLayout],
    ) -> BindGroups {
        let bind_group_entries = group_by_index(
            device.limits().max_bind_groups,
            Self::BINDINGS
                .iter()
                .zip(self.binding_resources())
                .map(|(metadata, resource)| {
                    let entry = wgpu::BindGroupEntry {
                        binding: metadata.binding,
                        resource,
                    };
                    (metadata.group, entry)
                }),
        );

        let bind_groups = bind_group_entries
            .into_iter()
            .zip(bind_group_layouts)
            .enumerate()
            .map(|(i, (entries, layout))| {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("{label}_bind_group_{i}")),
                    layout,
                    entries: &entries,
                })
            })
            .collect_vec();

        BindGroups { bind_groups }
    }

    fn pipeline_layout(
        device: &wgpu::Device,
        label: &str,
    ) -> (wgpu::PipelineLayout, Vec<wgpu::BindGroupLayout>) {
        let bind_group_layout_entries = group_by_index(
            device.limits().max_bind_groups,
            Self::BINDINGS.iter().map(|binding| {
                let entry = wgpu::BindGroupLayoutEntry {
                    binding: binding.binding,
                    visibility: binding.visibility,
                    ty: binding.ty,
                    count: None,
                };
                (binding.group, entry)
            }),
        );

        let bind_group_layouts = bind_group_layout_entries
            .iter()
            .enumerate()
            .map(|(i, entries)| {
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(&format!("{label}_pipeline_bind_group_layout_{i}")),
                    entries,
                })
            })
            .collect_vec();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{label}_pipeline_layout")),
            bind_group_layouts: &bind_group_layouts.iter().collect_vec(),
            push_constant_ranges: &[],
        });
        (pipeline_layout, bind_group_layouts)
    }
}

pub(in crate::gfx) trait WgpuPassExt {
    fn set_bind_groups(&mut self, bind_groups: &BindGroups);
}
impl WgpuPassExt for wgpu::RenderPass<'_> {
    fn set_bind_groups(&mut self, bind_groups: &BindGroups) {
        for (i, bind_group) in bind_groups.bind_groups.iter().enumerate() {
            self.set_bind_group(i as u32, bind_group, &[]);
        }
    }
}

pub(in crate::gfx) trait IntoBindingResource<'a> {
    fn into_binding_resource(self) -> wgpu::BindingResource<'a>;
}
impl<'a> IntoBindingResource<'a> for &'a wgpu::Buffer {
    fn into_binding_resource(self) -> wgpu::BindingResource<'a> {
        self.as_entire_binding()
    }
}
impl<'a> IntoBindingResource<'a> for &'a wgpu::Sampler {
    fn into_binding_resource(self) -> wgpu::BindingResource<'a> {
        wgpu::BindingResource::Sampler(self)
    }
}
impl<'a> IntoBindingResource<'a> for &'a wgpu::TextureView {
    fn into_binding_resource(self) -> wgpu::BindingResource<'a> {
        wgpu::BindingResource::TextureView(self)
    }
}
