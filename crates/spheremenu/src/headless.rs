//! Renderer that records what it would draw instead of drawing it.

use std::sync::Arc;

use image::RgbaImage;
use parking_lot::Mutex;

use crate::{Frame, FrameUniforms, Geometry, MenuRenderer};

/// Call made on a [`RecordingRenderer`].
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum RenderCall {
    SetBillboardMesh { vertex_count: usize, index_count: usize },
    Resize { width: u32, height: u32 },
    UploadAtlas { width: u32, height: u32 },
    Draw { index_count: usize, instance_count: usize, uniforms: FrameUniforms },
    Released,
}

/// Shared list of calls made on a [`RecordingRenderer`], readable after the
/// renderer has been moved or dropped.
pub type RenderLog = Arc<Mutex<Vec<RenderCall>>>;

/// [`MenuRenderer`] that needs no GPU.
#[derive(Debug)]
pub struct RecordingRenderer {
    log: RenderLog,
    index_count: usize,
    max_texture_dimension: u32,
}
impl Default for RecordingRenderer {
    fn default() -> Self {
        Self::new()
    }
}
impl RecordingRenderer {
    /// Constructs a renderer with a typical texture size limit.
    pub fn new() -> Self {
        Self::with_max_texture_dimension(8192)
    }
    /// Constructs a renderer that reports the given texture size limit.
    pub fn with_max_texture_dimension(max_texture_dimension: u32) -> Self {
        Self {
            log: RenderLog::default(),
            index_count: 0,
            max_texture_dimension,
        }
    }

    /// Returns a handle to the call log.
    pub fn log(&self) -> RenderLog {
        Arc::clone(&self.log)
    }

    fn record(&self, call: RenderCall) {
        self.log.lock().push(call);
    }
}
impl MenuRenderer for RecordingRenderer {
    fn max_texture_dimension(&self) -> u32 {
        self.max_texture_dimension
    }

    fn set_billboard_mesh(&mut self, mesh: &Geometry) -> eyre::Result<()> {
        self.index_count = mesh.index_data().len();
        self.record(RenderCall::SetBillboardMesh {
            vertex_count: mesh.vertices().len(),
            index_count: self.index_count,
        });
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.record(RenderCall::Resize { width, height });
    }

    fn upload_atlas(&mut self, atlas: &RgbaImage) {
        self.record(RenderCall::UploadAtlas {
            width: atlas.width(),
            height: atlas.height(),
        });
    }

    fn render(&mut self, frame: &Frame<'_>) -> eyre::Result<()> {
        self.record(RenderCall::Draw {
            index_count: self.index_count,
            instance_count: frame.instances.len(),
            uniforms: frame.uniforms,
        });
        Ok(())
    }
}
impl Drop for RecordingRenderer {
    fn drop(&mut self) {
        self.record(RenderCall::Released);
    }
}
