use std::sync::Arc;

use cgmath::Point2;
use image::{DynamicImage, Rgba, RgbaImage};

use crate::atlas::{FetchError, ImageFetcher};
use crate::headless::{RecordingRenderer, RenderLog};
use crate::{InfiniteGridMenu, ManualScheduler, MenuItem, MenuOptions, MenuTuning, SurfaceSize};

mod engine;
mod physics;

/// Duration of one frame at the target frame rate, in milliseconds.
const FRAME_MS: f64 = 1000.0 / 60.0;

type TestMenu = InfiniteGridMenu<RecordingRenderer, ManualScheduler>;

/// Serves an opaque square for every source except `"missing"`.
struct SolidFetcher;
impl ImageFetcher for SolidFetcher {
    fn fetch(&self, source: &str) -> Result<DynamicImage, FetchError> {
        match source {
            "missing" => Err(std::io::Error::from(std::io::ErrorKind::NotFound).into()),
            _ => Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                8,
                8,
                Rgba([10, 20, 30, 255]),
            ))),
        }
    }
}

fn items(n: usize) -> Vec<MenuItem> {
    (0..n)
        .map(|i| MenuItem {
            image: format!("image-{i}"),
            link: format!("https://example.com/{i}"),
            title: format!("Item {i}"),
            description: String::new(),
        })
        .collect()
}

fn size(width: f32, height: f32) -> SurfaceSize {
    SurfaceSize {
        width,
        height,
        device_pixel_ratio: 1.0,
    }
}

fn options() -> MenuOptions {
    MenuOptions {
        scale: 1.0,
        tuning: MenuTuning {
            atlas_cell_size: 16,
            ..MenuTuning::default()
        },
        image_fetcher: Arc::new(SolidFetcher),
    }
}

fn new_menu(item_count: usize) -> (TestMenu, RenderLog) {
    let renderer = RecordingRenderer::new();
    let log = renderer.log();
    let menu = InfiniteGridMenu::new(
        items(item_count),
        size(800.0, 600.0),
        renderer,
        ManualScheduler::default(),
        options(),
    )
    .unwrap();
    (menu, log)
}

/// Runs `n` frames at the target frame rate, starting at `*t` milliseconds.
fn run_frames(menu: &mut TestMenu, t: &mut f64, n: usize) {
    for _ in 0..n {
        menu.run(*t).unwrap();
        *t += FRAME_MS;
    }
}

/// Drags the pointer horizontally by `dx` logical pixels per frame.
fn drag(menu: &mut TestMenu, t: &mut f64, dx: f32, frames: usize) {
    let mut pos = Point2::new(400.0, 300.0);
    menu.handle_pointer(crate::PointerEvent::Down(pos));
    for _ in 0..frames {
        pos.x += dx;
        menu.handle_pointer(crate::PointerEvent::Move(pos));
        run_frames(menu, t, 1);
    }
    menu.handle_pointer(crate::PointerEvent::Up);
}
