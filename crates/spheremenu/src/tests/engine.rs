use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use super::*;
use crate::headless::RenderCall;
use crate::placement::{item_index_for_vertex, nearest_vertex_index};
use crate::{FrameScheduler, Geometry};

#[test]
fn test_empty_items_is_an_error() {
    let result = InfiniteGridMenu::new(
        vec![],
        size(800.0, 600.0),
        RecordingRenderer::new(),
        ManualScheduler::default(),
        options(),
    );
    assert!(result.is_err());
}

#[test]
fn test_bad_scale_is_an_error() {
    for scale in [0.0, -1.0, f32::NAN] {
        let result = InfiniteGridMenu::new(
            items(3),
            size(800.0, 600.0),
            RecordingRenderer::new(),
            ManualScheduler::default(),
            MenuOptions { scale, ..options() },
        );
        assert!(result.is_err(), "scale {scale}");
    }
}

#[test]
fn test_construction_uploads_mesh_and_sizes_viewport() {
    let (menu, log) = new_menu(5);
    assert_eq!(
        log.lock()[..2],
        [
            RenderCall::SetBillboardMesh {
                vertex_count: 4,
                index_count: 6,
            },
            RenderCall::Resize {
                width: 800,
                height: 600,
            },
        ],
    );
    assert_eq!(menu.instances().len(), 42);
    assert_eq!(menu.scheduler().requested, 0);
}

#[test]
fn test_first_frame_draws_every_billboard_once() {
    let (mut menu, log) = new_menu(5);
    menu.run(0.0).unwrap();

    let draws = log
        .lock()
        .iter()
        .filter_map(|call| match call {
            RenderCall::Draw {
                index_count,
                instance_count,
                uniforms,
            } => Some((*index_count, *instance_count, uniforms.item_count)),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(draws, [(6, 42, 5)]);
    assert_eq!(menu.scheduler().requested, 1);
    assert!(menu.scheduler().pending);
}

#[test]
fn test_resize_is_idempotent() {
    let (mut menu, log) = new_menu(5);
    let projection = menu.camera().projection();
    let resize_count = || {
        log.lock()
            .iter()
            .filter(|call| matches!(call, RenderCall::Resize { .. }))
            .count()
    };

    menu.resize(size(800.0, 600.0));
    assert_eq!(resize_count(), 1);
    assert_eq!(menu.camera().projection(), projection);

    menu.resize(size(0.0, 600.0));
    assert_eq!(resize_count(), 1);
    assert_eq!(menu.camera().projection(), projection);

    // Same backing store, different logical size.
    menu.resize(SurfaceSize {
        width: 400.0,
        height: 300.0,
        device_pixel_ratio: 2.0,
    });
    assert_eq!(resize_count(), 1);

    menu.resize(size(600.0, 600.0));
    assert_eq!(resize_count(), 2);
    assert_ne!(menu.camera().projection(), projection);
}

#[test]
fn test_destroy_stops_everything() {
    let (mut menu, log) = new_menu(5);
    let mut t = 0.0;
    run_frames(&mut menu, &mut t, 3);
    let requested = menu.scheduler().requested;

    menu.destroy();
    menu.destroy();
    assert!(menu.is_destroyed());
    assert!(menu.renderer().is_none());
    assert!(menu.scheduler().cancelled);
    assert!(!menu.scheduler().pending);

    run_frames(&mut menu, &mut t, 3);
    menu.handle_pointer(crate::PointerEvent::Down(Point2::new(0.0, 0.0)));
    menu.resize(size(100.0, 100.0));
    assert_eq!(menu.scheduler().requested, requested);

    let log = log.lock();
    assert_eq!(log.last(), Some(&RenderCall::Released));
    assert_eq!(
        log.iter().filter(|call| **call == RenderCall::Released).count(),
        1,
    );
}

/// Holds every fetch until the sender is dropped.
struct GatedFetcher {
    gate: parking_lot::Mutex<std::sync::mpsc::Receiver<()>>,
}
impl ImageFetcher for GatedFetcher {
    fn fetch(&self, source: &str) -> Result<DynamicImage, FetchError> {
        let _ = self.gate.lock().recv();
        SolidFetcher.fetch(source)
    }
}

#[test]
fn test_atlas_finishing_after_destroy_is_discarded() {
    let (release, gate) = std::sync::mpsc::channel();
    let fetcher = Arc::new(GatedFetcher {
        gate: parking_lot::Mutex::new(gate),
    });
    let renderer = RecordingRenderer::new();
    let log = renderer.log();
    let mut menu = InfiniteGridMenu::new(
        items(3),
        size(800.0, 600.0),
        renderer,
        ManualScheduler::default(),
        MenuOptions {
            image_fetcher: Arc::clone(&fetcher) as Arc<dyn ImageFetcher>,
            ..options()
        },
    )
    .unwrap();
    let mut t = 0.0;
    run_frames(&mut menu, &mut t, 2);

    menu.destroy();
    drop(release);

    // The background thread holds the other reference until it has tried to
    // publish its result.
    let start = std::time::Instant::now();
    while Arc::strong_count(&fetcher) > 1 {
        assert!(start.elapsed() < Duration::from_secs(10), "atlas never finished");
        std::thread::sleep(Duration::from_millis(5));
    }
    run_frames(&mut menu, &mut t, 5);
    drop(menu);

    let log = log.lock();
    assert!(
        !log.iter().any(|call| matches!(call, RenderCall::UploadAtlas { .. })),
        "{log:?}",
    );
    assert_eq!(log.last(), Some(&RenderCall::Released));
}

#[test]
fn test_scheduler_ignores_requests_after_cancel() {
    let mut scheduler = ManualScheduler::default();
    scheduler.request_frame();
    scheduler.cancel_frame();
    assert!(!scheduler.pending);
    assert_eq!(scheduler.requested, 1);
}

#[test]
fn test_callbacks_fire_on_change_only() {
    let (mut menu, _log) = new_menu(5);
    let movement = Rc::new(RefCell::new(vec![]));
    let active = Rc::new(RefCell::new(vec![]));
    menu.on_movement_changed({
        let movement = Rc::clone(&movement);
        move |moving| movement.borrow_mut().push(moving)
    });
    menu.on_active_item_changed({
        let active = Rc::clone(&active);
        move |i| active.borrow_mut().push(i)
    });

    let mut t = 0.0;
    run_frames(&mut menu, &mut t, 10);
    assert_eq!(*movement.borrow(), Vec::<bool>::new());
    assert_eq!(*active.borrow(), vec![menu.nearest_item_index()]);

    drag(&mut menu, &mut t, 20.0, 10);
    run_frames(&mut menu, &mut t, 600);
    assert_eq!(*movement.borrow(), vec![true, false]);
    assert!(!menu.is_moving());

    let active = active.borrow();
    assert!(active.windows(2).all(|w| w[0] != w[1]));
    assert_eq!(active.last(), Some(&menu.nearest_item_index()));
}

#[test]
fn test_nearest_item_wraps_around_items() {
    let mut sphere = Geometry::icosahedron();
    sphere.subdivide(1).spherize(2.0);
    let positions = sphere.vertices().iter().map(|v| v.position).collect::<Vec<_>>();

    let (mut menu, _log) = new_menu(5);
    let mut t = 0.0;
    for _ in 0..5 {
        drag(&mut menu, &mut t, 15.0, 5);
        run_frames(&mut menu, &mut t, 5);
        let vertex = nearest_vertex_index(&positions, menu.rotation().orientation);
        assert_eq!(menu.nearest_item_index(), item_index_for_vertex(vertex, 5));
        assert!(menu.nearest_item_index() < 5);
    }
}

#[test]
fn test_atlas_is_uploaded_once_ready() {
    let (mut menu, log) = new_menu(5);
    let mut t = 0.0;
    let start = std::time::Instant::now();
    let uploads = loop {
        run_frames(&mut menu, &mut t, 1);
        let uploads = log
            .lock()
            .iter()
            .filter_map(|call| match call {
                RenderCall::UploadAtlas { width, height } => Some([*width, *height]),
                _ => None,
            })
            .collect::<Vec<_>>();
        if !uploads.is_empty() {
            break uploads;
        }
        assert!(start.elapsed() < Duration::from_secs(10), "atlas never uploaded");
        std::thread::sleep(Duration::from_millis(5));
    };
    // 5 items need a 3x3 grid of 16-pixel cells.
    assert_eq!(uploads, [[48, 48]]);

    run_frames(&mut menu, &mut t, 5);
    let upload_count = log
        .lock()
        .iter()
        .filter(|call| matches!(call, RenderCall::UploadAtlas { .. }))
        .count();
    assert_eq!(upload_count, 1);
}

#[test]
fn test_atlas_grid_respects_renderer_limit() {
    let renderer = RecordingRenderer::with_max_texture_dimension(64);
    let menu = InfiniteGridMenu::new(
        items(50),
        size(800.0, 600.0),
        renderer,
        ManualScheduler::default(),
        MenuOptions {
            tuning: MenuTuning::default(),
            ..options()
        },
    )
    .unwrap();
    let layout = menu.atlas_layout();
    assert_eq!(layout.grid_size, 8);
    assert!(layout.dimension() <= 64);
}

#[test]
fn test_drag_pulls_camera_back() {
    let (mut menu, _log) = new_menu(5);
    let mut t = 0.0;
    run_frames(&mut menu, &mut t, 1);
    let rest = menu.camera().rest_distance();
    assert_eq!(menu.camera().distance(), rest);

    drag(&mut menu, &mut t, 10.0, 30);
    assert!(menu.camera().distance() > rest + 1.0);

    run_frames(&mut menu, &mut t, 600);
    assert!((menu.camera().distance() - rest).abs() < 0.01);
}

#[test]
fn test_set_scale_moves_rest_distance() {
    let (mut menu, _log) = new_menu(5);
    let rest = menu.camera().rest_distance();
    menu.set_scale(2.0);
    assert_eq!(menu.camera().rest_distance(), rest * 2.0);
    menu.set_scale(-1.0);
    assert_eq!(menu.camera().rest_distance(), rest * 2.0);
}
