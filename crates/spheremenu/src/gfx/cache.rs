use std::sync::Arc;

use super::GraphicsState;

/// 2D texture that is recreated whenever its size changes.
pub(crate) struct CachedTexture {
    gfx: Arc<GraphicsState>,
    label: String,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
    size: [u32; 2],

    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}
impl CachedTexture {
    /// Constructs a 1x1 texture.
    pub fn new(
        gfx: Arc<GraphicsState>,
        label: impl Into<String>,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> Self {
        let label = label.into();
        let size = [1, 1];
        let (texture, view) = create_texture(&gfx, &label, format, usage, size);
        Self {
            gfx,
            label,
            format,
            usage,
            size,

            texture,
            view,
        }
    }

    pub fn set_size(&mut self, size: [u32; 2]) {
        if size != self.size {
            self.size = size;
            (self.texture, self.view) =
                create_texture(&self.gfx, &self.label, self.format, self.usage, size);
        }
    }

    /// Resizes the texture to fit a tightly packed RGBA8 image and uploads
    /// it.
    pub fn write_rgba8(&mut self, size: [u32; 2], data: &[u8]) {
        self.set_size(size);
        let [width, height] = size;
        self.gfx.queue.write_texture(
            self.texture.as_image_copy(),
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            extent([width, height]),
        );
    }
}

fn extent([width, height]: [u32; 2]) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    }
}

fn create_texture(
    gfx: &GraphicsState,
    label: &str,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
    size: [u32; 2],
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = gfx.create_texture(wgpu::TextureDescriptor {
        label: Some(label),
        size: extent(size),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_is_single_layer() {
        let e = extent([640, 480]);
        assert_eq!((e.width, e.height, e.depth_or_array_layers), (640, 480, 1));
    }
}
