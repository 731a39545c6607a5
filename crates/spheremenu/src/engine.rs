use std::fmt;
use std::sync::Arc;

use cgmath::{Matrix4, SquareMatrix, Vector3};
use eyre::{Result, ensure};
use itertools::Itertools;

use crate::atlas::{AtlasLayout, DefaultImageFetcher, ImageFetcher, PendingAtlas};
use crate::control::{ArcballControl, ArcballState, PointerEvent};
use crate::placement::{self, item_index_for_vertex, nearest_vertex_index, visible_item_count};
use crate::{Camera, Frame, FrameScheduler, FrameUniforms, Geometry, MenuItem, MenuRenderer, MenuTuning};

/// Size of the drawable region.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SurfaceSize {
    /// Width in logical pixels.
    pub width: f32,
    /// Height in logical pixels.
    pub height: f32,
    /// Physical pixels per logical pixel.
    pub device_pixel_ratio: f32,
}
impl SurfaceSize {
    /// Returns the size of the backing store in physical pixels.
    pub fn backing_size(self) -> [u32; 2] {
        let dpr = if self.device_pixel_ratio > 0.0 {
            self.device_pixel_ratio
        } else {
            1.0
        };
        [
            (self.width * dpr).floor().max(0.0) as u32,
            (self.height * dpr).floor().max(0.0) as u32,
        ]
    }
}

/// Construction parameters for [`InfiniteGridMenu`].
pub struct MenuOptions {
    /// Overall zoom. Larger values move the camera farther away.
    pub scale: f32,
    /// Tunable constants.
    pub tuning: MenuTuning,
    /// Loader for item images.
    pub image_fetcher: Arc<dyn ImageFetcher>,
}
impl Default for MenuOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            tuning: MenuTuning::default(),
            image_fetcher: Arc::new(DefaultImageFetcher::default()),
        }
    }
}
impl fmt::Debug for MenuOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuOptions")
            .field("scale", &self.scale)
            .field("tuning", &self.tuning)
            .finish_non_exhaustive()
    }
}

/// Spherical menu of items that the user spins by dragging.
///
/// The host calls [`InfiniteGridMenu::run()`] whenever the
/// [`FrameScheduler`] asks for a frame, forwards pointer events to
/// [`InfiniteGridMenu::handle_pointer()`], and calls
/// [`InfiniteGridMenu::resize()`] when the drawable changes size.
pub struct InfiniteGridMenu<R, S> {
    items: Vec<MenuItem>,
    tuning: MenuTuning,
    scale_factor: f32,

    /// Sphere vertices in model space, one billboard each.
    base_positions: Vec<Vector3<f32>>,
    /// Billboard transforms for the current frame.
    instances: Vec<Matrix4<f32>>,
    atlas_layout: AtlasLayout,
    pending_atlas: Option<PendingAtlas>,

    camera: Camera,
    control: ArcballControl,
    renderer: Option<R>,
    scheduler: S,

    surface_size: Option<SurfaceSize>,
    last_time: Option<f64>,
    frames: f32,

    movement_active: bool,
    active_item: Option<usize>,
    on_active_item_changed: Option<Box<dyn FnMut(usize)>>,
    on_movement_changed: Option<Box<dyn FnMut(bool)>>,

    destroyed: bool,
}
impl<R, S> fmt::Debug for InfiniteGridMenu<R, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfiniteGridMenu")
            .field("items", &self.items.len())
            .field("instances", &self.instances.len())
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}
impl<R: MenuRenderer, S: FrameScheduler> InfiniteGridMenu<R, S> {
    /// Builds the sphere, uploads the billboard mesh, starts loading the
    /// atlas in the background, and sizes the viewport.
    ///
    /// Returns an error if `items` is empty, the scale is not positive, or
    /// the renderer rejects the mesh.
    pub fn new(
        items: Vec<MenuItem>,
        size: SurfaceSize,
        mut renderer: R,
        scheduler: S,
        options: MenuOptions,
    ) -> Result<Self> {
        let MenuOptions {
            scale,
            tuning,
            image_fetcher,
        } = options;
        ensure!(!items.is_empty(), "menu needs at least one item");
        ensure!(scale.is_finite() && scale > 0.0, "bad menu scale {scale}");

        let mut sphere = Geometry::icosahedron();
        sphere
            .subdivide(tuning.subdivisions)
            .spherize(tuning.sphere_radius);
        let base_positions = sphere.vertices().iter().map(|v| v.position).collect_vec();

        renderer.set_billboard_mesh(&Geometry::plane(1.0, 1.0))?;

        let atlas_layout = AtlasLayout::new(
            items.len(),
            tuning.atlas_cell_size,
            renderer.max_texture_dimension(),
        );
        let sources = items
            .iter()
            .take(visible_item_count(base_positions.len(), items.len()))
            .map(|item| item.image.clone())
            .collect();
        let pending_atlas = PendingAtlas::spawn(sources, atlas_layout, image_fetcher)?;

        let camera = Camera::new(
            tuning.sphere_radius,
            tuning.camera_distance * scale,
            tuning.near,
            tuning.far,
        );

        log::debug!(
            "menu with {} items on {} billboards, {}x{} atlas grid",
            items.len(),
            base_positions.len(),
            atlas_layout.grid_size,
            atlas_layout.grid_size,
        );

        let mut ret = Self {
            items,
            tuning,
            scale_factor: scale,

            instances: Vec::with_capacity(base_positions.len()),
            base_positions,
            atlas_layout,
            pending_atlas: Some(pending_atlas),

            camera,
            control: ArcballControl::new(),
            renderer: Some(renderer),
            scheduler,

            surface_size: None,
            last_time: None,
            frames: 0.0,

            movement_active: false,
            active_item: None,
            on_active_item_changed: None,
            on_movement_changed: None,

            destroyed: false,
        };
        ret.update_instances();
        ret.resize(size);
        Ok(ret)
    }

    /// Sets the callback invoked when the centered item changes.
    pub fn on_active_item_changed(&mut self, f: impl FnMut(usize) + 'static) {
        self.on_active_item_changed = Some(Box::new(f));
    }
    /// Sets the callback invoked when the menu starts or stops moving.
    pub fn on_movement_changed(&mut self, f: impl FnMut(bool) + 'static) {
        self.on_movement_changed = Some(Box::new(f));
    }

    /// Returns the items.
    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }
    /// Returns the tunable constants.
    pub fn tuning(&self) -> &MenuTuning {
        &self.tuning
    }
    /// Returns the camera.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }
    /// Returns the rotation state.
    pub fn rotation(&self) -> &ArcballState {
        self.control.state()
    }
    /// Returns the atlas layout.
    pub fn atlas_layout(&self) -> AtlasLayout {
        self.atlas_layout
    }
    /// Returns the billboard transforms for the most recent frame.
    pub fn instances(&self) -> &[Matrix4<f32>] {
        &self.instances
    }
    /// Returns the renderer, or `None` once destroyed.
    pub fn renderer(&self) -> Option<&R> {
        self.renderer.as_ref()
    }
    /// Returns the frame scheduler.
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }
    /// Returns whether the menu is being dragged or is still spinning.
    pub fn is_moving(&self) -> bool {
        self.movement_active
    }
    /// Returns whether [`InfiniteGridMenu::destroy()`] has been called.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Returns the index of the item nearest the front of the sphere.
    pub fn nearest_item_index(&self) -> usize {
        let vertex = nearest_vertex_index(&self.base_positions, self.control.state().orientation);
        item_index_for_vertex(vertex, self.items.len())
    }

    /// Records a pointer event. It takes effect on the next frame.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        if self.destroyed {
            return;
        }
        self.control.handle_event(event);
    }

    /// Changes the zoom, moving the camera's rest distance.
    pub fn set_scale(&mut self, scale: f32) {
        if self.destroyed {
            return;
        }
        if !(scale.is_finite() && scale > 0.0) {
            log::warn!("ignoring bad menu scale {scale}");
            return;
        }
        self.scale_factor = scale;
        self.camera
            .set_rest_distance(self.tuning.camera_distance * scale);
    }

    /// Updates the viewport for a new drawable size.
    ///
    /// Does nothing if the size is unchanged or has zero area. Reallocates
    /// renderer resources only if the backing size in physical pixels
    /// changed.
    pub fn resize(&mut self, size: SurfaceSize) {
        if self.destroyed || self.surface_size == Some(size) {
            return;
        }
        let [width, height] = size.backing_size();
        if width == 0 || height == 0 || !self.camera.set_viewport(size.width, size.height) {
            log::trace!("ignoring resize to {size:?}");
            return;
        }

        let old_backing_size = self.surface_size.map(SurfaceSize::backing_size);
        self.surface_size = Some(size);
        if old_backing_size != Some([width, height]) {
            log::debug!("resizing menu to {width}x{height}");
            if let Some(renderer) = &mut self.renderer {
                renderer.resize(width, height);
            }
        }
    }

    /// Advances and draws one frame, then schedules the next one.
    ///
    /// `time_ms` is a monotonic timestamp in milliseconds. Does nothing once
    /// destroyed.
    pub fn run(&mut self, time_ms: f64) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }

        let dt = match self.last_time {
            Some(last) => (time_ms - last).clamp(0.0, self.tuning.max_frame_ms as f64) as f32,
            None => 0.0,
        };
        self.last_time = Some(time_ms);
        self.frames += dt / self.tuning.target_frame_ms;

        self.poll_atlas();
        self.animate(dt);
        self.render()?;

        if !self.destroyed {
            self.scheduler.request_frame();
        }
        Ok(())
    }

    /// Stops the frame loop and releases the renderer, the pending atlas,
    /// and the pointer listeners. Safe to call more than once.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        self.scheduler.cancel_frame();
        self.control.detach();
        self.pending_atlas = None;
        self.renderer = None;
        self.on_active_item_changed = None;
        self.on_movement_changed = None;

        log::debug!("menu destroyed");
    }

    fn poll_atlas(&mut self) {
        let Some(atlas) = self.pending_atlas.as_ref().and_then(|p| p.take()) else {
            return;
        };
        self.pending_atlas = None;
        if let Some(renderer) = &mut self.renderer {
            log::debug!("uploading {}x{} atlas", atlas.width(), atlas.height());
            renderer.upload_atlas(&atlas);
        }
    }

    fn animate(&mut self, dt: f32) {
        let pointer_down = self.control.is_pointer_down();

        let snap_target = (!pointer_down).then(|| {
            let state = self.control.state();
            let i = nearest_vertex_index(&self.base_positions, state.orientation);
            state.to_world(self.base_positions[i])
        });
        self.control.update(dt, snap_target, &self.tuning);
        let velocity = self.control.state().velocity;

        // Pull the camera back while dragging so more of the sphere is visible.
        let time_scale = self.tuning.time_scale(dt);
        let rest = self.camera.rest_distance();
        let (target_distance, damping) = if pointer_down {
            let pullback = velocity * self.tuning.drag_pullback_velocity + self.tuning.drag_pullback;
            (rest + pullback, self.tuning.camera_damping_drag)
        } else {
            (rest, self.tuning.camera_damping_idle)
        };
        self.camera
            .ease_toward(target_distance, damping / time_scale);

        let moving = pointer_down || velocity.abs() > self.tuning.moving_threshold;
        if moving != self.movement_active {
            self.movement_active = moving;
            if let Some(f) = &mut self.on_movement_changed {
                f(moving);
            }
        }

        let item = self.nearest_item_index();
        if self.active_item != Some(item) {
            self.active_item = Some(item);
            if let Some(f) = &mut self.on_active_item_changed {
                f(item);
            }
        }

        self.update_instances();
    }

    fn update_instances(&mut self) {
        placement::instance_transforms(
            &self.base_positions,
            self.control.state().orientation,
            &self.tuning,
            &mut self.instances,
        );
    }

    fn frame_uniforms(&self) -> FrameUniforms {
        let state = self.control.state();
        FrameUniforms {
            world: Matrix4::identity(),
            view: self.camera.view(),
            projection: self.camera.projection(),
            camera_position: self.camera.position,
            rotation_axis: state.axis,
            rotation_velocity: state.velocity * self.tuning.rim_velocity_gain,
            item_count: self.items.len() as u32,
            atlas_grid_size: self.atlas_layout.grid_size,
            frames: self.frames,
            scale_factor: self.scale_factor,
            clear_color: self.tuning.clear_color,
        }
    }

    fn render(&mut self) -> Result<()> {
        let uniforms = self.frame_uniforms();
        match &mut self.renderer {
            Some(renderer) => renderer.render(&Frame {
                uniforms,
                instances: &self.instances,
            }),
            None => Ok(()),
        }
    }
}
