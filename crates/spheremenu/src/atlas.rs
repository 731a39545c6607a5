//! Texture atlas: one square image holding every item in a grid.

use std::path::Path;
use std::sync::{Arc, Weak};
use std::time::Duration;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbaImage};
use parking_lot::Mutex;
use rayon::prelude::*;

/// Largest image body that will be downloaded.
const MAX_IMAGE_BYTES: u64 = 64 * 1024 * 1024;
/// Timeout for a single image download.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Grid layout of an atlas.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AtlasLayout {
    /// Number of items in the atlas.
    pub item_count: usize,
    /// Number of cells along each edge.
    pub grid_size: u32,
    /// Edge length of each cell in pixels.
    pub cell_size: u32,
}
impl AtlasLayout {
    /// Constructs a layout for `item_count` items with cells of
    /// `cell_size` pixels, shrinking the cells if necessary so that the
    /// whole atlas fits within `max_dimension` pixels.
    pub fn new(item_count: usize, cell_size: u32, max_dimension: u32) -> Self {
        let grid_size = (item_count.max(1) as f64).sqrt().ceil() as u32;
        let cell_size = cell_size.min(max_dimension / grid_size).max(1);
        Self {
            item_count,
            grid_size,
            cell_size,
        }
    }

    /// Returns the edge length of the atlas in pixels.
    pub fn dimension(&self) -> u32 {
        self.grid_size * self.cell_size
    }

    /// Returns the pixel coordinates of the top left corner of a cell.
    pub fn cell_origin(&self, index: usize) -> [u32; 2] {
        let index = index as u32;
        [
            index % self.grid_size * self.cell_size,
            index / self.grid_size * self.cell_size,
        ]
    }

    /// Returns the texture coordinate rectangle `[u0, v0, u1, v1]` of a
    /// cell, with V pointing down.
    pub fn uv_rect(&self, index: usize) -> [f32; 4] {
        let [x, y] = self.cell_origin(index);
        let dim = self.dimension() as f32;
        let cell = self.cell_size as f32;
        [
            x as f32 / dim,
            y as f32 / dim,
            (x as f32 + cell) / dim,
            (y as f32 + cell) / dim,
        ]
    }
}

/// Pixel rectangle within a source image.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Returns the largest centered square within a `width` by `height` image.
///
/// Scaling that square to fill a cell is a cover fit: the cell is filled
/// completely, aspect ratio is preserved, and overflow is cropped evenly
/// from both sides.
pub fn cover_fit_crop(width: u32, height: u32) -> CropRect {
    let side = width.min(height);
    CropRect {
        x: (width - side) / 2,
        y: (height - side) / 2,
        width: side,
        height: side,
    }
}

/// Scales `image` to cover a `cell_size` square cell.
pub fn cover_fit(image: &DynamicImage, cell_size: u32) -> RgbaImage {
    let (w, h) = image.dimensions();
    let CropRect {
        x,
        y,
        width,
        height,
    } = cover_fit_crop(w, h);
    image
        .crop_imm(x, y, width, height)
        .resize_exact(cell_size, cell_size, FilterType::Triangle)
        .to_rgba8()
}

/// Error fetching or decoding an item image.
#[derive(thiserror::Error, Debug)]
#[allow(missing_docs)]
pub enum FetchError {
    #[error("{0}")]
    Http(#[from] ureq::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode error: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image is empty")]
    Empty,
}

/// Source of item images.
pub trait ImageFetcher: Send + Sync {
    /// Loads and decodes the image at `source`.
    ///
    /// **This method may block and is called from background threads.**
    fn fetch(&self, source: &str) -> Result<DynamicImage, FetchError>;
}

/// Fetches `http://` and `https://` URLs over the network and treats
/// anything else as a local path, with or without a `file://` prefix.
#[derive(Debug, Clone)]
pub struct DefaultImageFetcher {
    agent: ureq::Agent,
}
impl Default for DefaultImageFetcher {
    fn default() -> Self {
        Self {
            agent: ureq::config::Config::builder()
                .timeout_global(Some(FETCH_TIMEOUT))
                .build()
                .into(),
        }
    }
}
impl ImageFetcher for DefaultImageFetcher {
    fn fetch(&self, source: &str) -> Result<DynamicImage, FetchError> {
        if source.starts_with("http://") || source.starts_with("https://") {
            let bytes = self
                .agent
                .get(source)
                .call()?
                .into_body()
                .with_config()
                .limit(MAX_IMAGE_BYTES)
                .read_to_vec()?;
            Ok(image::load_from_memory(&bytes)?)
        } else {
            let path = source.strip_prefix("file://").unwrap_or(source);
            Ok(image::ImageReader::open(Path::new(path))?
                .with_guessed_format()?
                .decode()?)
        }
    }
}

/// Fetches every image in parallel and composes the atlas.
///
/// Images that fail to load are logged and leave their cell transparent.
pub fn build_atlas(sources: &[String], layout: AtlasLayout, fetcher: &dyn ImageFetcher) -> RgbaImage {
    let cells: Vec<Option<RgbaImage>> = sources
        .par_iter()
        .enumerate()
        .map(|(i, source)| {
            let result = fetcher.fetch(source).and_then(|img| match img.dimensions() {
                (0, _) | (_, 0) => Err(FetchError::Empty),
                _ => Ok(cover_fit(&img, layout.cell_size)),
            });
            match result {
                Ok(cell) => Some(cell),
                Err(e) => {
                    log::warn!("error loading image {i} from {source:?}: {e}");
                    None
                }
            }
        })
        .collect();

    let mut atlas = RgbaImage::new(layout.dimension(), layout.dimension());
    for (i, cell) in cells.into_iter().enumerate() {
        if let Some(cell) = cell {
            let [x, y] = layout.cell_origin(i);
            image::imageops::replace(&mut atlas, &cell, x.into(), y.into());
        }
    }
    atlas
}

/// Atlas being built on a background thread.
///
/// The result is published exactly once. Dropping the handle before then
/// makes the background thread discard its result.
#[derive(Debug)]
pub struct PendingAtlas {
    slot: Arc<Mutex<Option<RgbaImage>>>,
}
impl PendingAtlas {
    /// Starts building an atlas in the background.
    pub fn spawn(
        sources: Vec<String>,
        layout: AtlasLayout,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> eyre::Result<Self> {
        let slot = Arc::new(Mutex::new(None));
        let weak_slot: Weak<Mutex<Option<RgbaImage>>> = Arc::downgrade(&slot);

        std::thread::Builder::new()
            .name("atlas".to_string())
            .spawn(move || {
                let atlas = build_atlas(&sources, layout, &*fetcher);
                match weak_slot.upgrade() {
                    Some(slot) => *slot.lock() = Some(atlas),
                    None => log::debug!("atlas finished after its menu was destroyed"),
                }
            })?;

        Ok(Self { slot })
    }

    /// Returns the finished atlas if it is ready. Returns `Some` at most
    /// once. Never blocks on the background thread.
    pub fn take(&self) -> Option<RgbaImage> {
        self.slot.try_lock()?.take()
    }
}

#[cfg(test)]
mod tests {
    use image::Rgba;
    use pretty_assertions::assert_eq;

    use super::*;

    /// Serves solid-color images sized from the source string, `"WxH"`.
    struct SolidFetcher;
    impl ImageFetcher for SolidFetcher {
        fn fetch(&self, source: &str) -> Result<DynamicImage, FetchError> {
            let (w, h) = source
                .split_once('x')
                .and_then(|(w, h)| Some((w.parse().ok()?, h.parse().ok()?)))
                .ok_or_else(|| std::io::Error::other("bad source"))?;
            Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                w,
                h,
                Rgba([255, 0, 0, 255]),
            )))
        }
    }

    #[test]
    fn test_layout_grid_size() {
        for (items, grid) in [(0, 1), (1, 1), (2, 2), (4, 2), (5, 3), (9, 3), (10, 4), (42, 7)] {
            assert_eq!(AtlasLayout::new(items, 512, 8192).grid_size, grid, "{items} items");
        }
    }

    #[test]
    fn test_layout_respects_texture_limit() {
        let layout = AtlasLayout::new(42, 512, 2048);
        assert_eq!(layout.cell_size, 2048 / 7);
        assert!(layout.dimension() <= 2048);
    }

    #[test]
    fn test_layout_cells() {
        let layout = AtlasLayout::new(5, 100, 8192);
        assert_eq!(layout.cell_origin(0), [0, 0]);
        assert_eq!(layout.cell_origin(2), [200, 0]);
        assert_eq!(layout.cell_origin(4), [100, 100]);
        assert_eq!(layout.uv_rect(4), [1.0 / 3.0, 1.0 / 3.0, 2.0 / 3.0, 2.0 / 3.0]);
    }

    #[test]
    fn test_cover_fit_crop() {
        assert_eq!(
            cover_fit_crop(1600, 900),
            CropRect {
                x: 350,
                y: 0,
                width: 900,
                height: 900,
            },
        );
        assert_eq!(
            cover_fit_crop(300, 500),
            CropRect {
                x: 0,
                y: 100,
                width: 300,
                height: 300,
            },
        );
        assert_eq!(cover_fit_crop(64, 64).width, 64);
    }

    #[test]
    fn test_build_atlas_leaves_failed_cells_blank() {
        let sources = ["40x20", "bogus", "10x30"].map(String::from);
        let layout = AtlasLayout::new(sources.len(), 16, 8192);
        let atlas = build_atlas(&sources, layout, &SolidFetcher);

        assert_eq!(atlas.dimensions(), (32, 32));
        assert_eq!(*atlas.get_pixel(8, 8), Rgba([255, 0, 0, 255]));
        assert_eq!(*atlas.get_pixel(24, 8), Rgba([0, 0, 0, 0]));
        assert_eq!(*atlas.get_pixel(8, 24), Rgba([255, 0, 0, 255]));
        assert_eq!(*atlas.get_pixel(24, 24), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_pending_atlas_publishes_once() {
        let layout = AtlasLayout::new(1, 8, 8192);
        let pending = PendingAtlas::spawn(vec!["8x8".to_string()], layout, Arc::new(SolidFetcher))
            .unwrap();
        let start = std::time::Instant::now();
        let atlas = loop {
            if let Some(atlas) = pending.take() {
                break atlas;
            }
            assert!(start.elapsed() < Duration::from_secs(10), "atlas never finished");
            std::thread::sleep(Duration::from_millis(5));
        };
        assert_eq!(atlas.dimensions(), (8, 8));
        assert!(pending.take().is_none());
    }
}
