use std::sync::Arc;
use std::time::Duration;

use cgmath::{MetricSpace, Point2};
use eyre::{OptionExt, Result};
use spheremenu::{
    FrameScheduler, GraphicsState, InfiniteGridMenu, MenuItem, MenuOptions, PointerEvent,
    SurfaceSize, WgpuMenuRenderer,
};
use web_time::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseButton, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::TITLE;
use crate::config::ViewerConfig;

/// Opens the menu in a window and runs until the window is closed.
pub(crate) fn run(config: ViewerConfig, items: Vec<MenuItem>, scale: f32) -> Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App {
        config,
        scale,
        items,
        state: None,
        error: None,
    };
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Requests redraws from the window until cancelled.
struct WindowScheduler {
    window: Arc<Window>,
    cancelled: bool,
}
impl FrameScheduler for WindowScheduler {
    fn request_frame(&mut self) {
        if !self.cancelled {
            self.window.request_redraw();
        }
    }
    fn cancel_frame(&mut self) {
        self.cancelled = true;
    }
}

struct App {
    config: ViewerConfig,
    scale: f32,
    items: Vec<MenuItem>,
    state: Option<AppState>,
    /// Fatal error to report after the event loop exits.
    error: Option<eyre::Report>,
}

struct AppState {
    window: Arc<Window>,
    menu: InfiniteGridMenu<WgpuMenuRenderer, WindowScheduler>,
    start_time: Instant,

    /// Latest cursor position in logical pixels.
    cursor: Point2<f32>,
    /// Time and position of the last press that has not yet been part of a
    /// double-click.
    last_press: Option<(Instant, Point2<f32>)>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        match self.init(event_loop) {
            Ok(state) => self.state = Some(state),
            Err(e) => {
                log::error!("error initializing menu: {e:#}");
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(state) = &mut self.state else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                state.menu.destroy();
                event_loop.exit();
            }

            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                state.menu.resize(surface_size(&state.window));
            }

            WindowEvent::RedrawRequested => {
                let time_ms = state.start_time.elapsed().as_secs_f64() * 1000.0;
                if let Err(e) = state.menu.run(time_ms) {
                    log::error!("error rendering frame: {e:#}");
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                let position = position.to_logical::<f32>(state.window.scale_factor());
                state.cursor = Point2::new(position.x, position.y);
                state.menu.handle_pointer(PointerEvent::Move(state.cursor));
            }

            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } => match button_state {
                ElementState::Pressed => {
                    state.press(&self.config);
                    state.menu.handle_pointer(PointerEvent::Down(state.cursor));
                }
                ElementState::Released => state.menu.handle_pointer(PointerEvent::Up),
            },

            WindowEvent::Touch(touch) => {
                let position = touch.location.to_logical::<f32>(state.window.scale_factor());
                state.cursor = Point2::new(position.x, position.y);
                let event = match touch.phase {
                    TouchPhase::Started => {
                        state.press(&self.config);
                        PointerEvent::Down(state.cursor)
                    }
                    TouchPhase::Moved => PointerEvent::Move(state.cursor),
                    TouchPhase::Ended | TouchPhase::Cancelled => PointerEvent::Up,
                };
                state.menu.handle_pointer(event);
            }

            _ => (),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &mut self.state {
            state.menu.destroy();
        }
    }
}

impl App {
    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<AppState> {
        let attributes = Window::default_attributes()
            .with_title(TITLE)
            .with_inner_size(LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = Arc::new(event_loop.create_window(attributes)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance.create_surface(Arc::clone(&window))?;
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        }))?;
        log::info!("using graphics adapter {:?}", adapter.get_info().name);
        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("spheremenu_device"),
            required_limits: adapter.limits(),
            ..Default::default()
        }))?;

        let capabilities = surface.get_capabilities(&adapter);
        let format = capabilities
            .formats
            .iter()
            .copied()
            .find(|format| format.is_srgb())
            .or_else(|| capabilities.formats.first().copied())
            .ok_or_eyre("surface is incompatible with the graphics adapter")?;
        let physical_size = window.inner_size();
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: physical_size.width.max(1),
            height: physical_size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            desired_maximum_frame_latency: 2,
            alpha_mode: capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };

        let gfx = Arc::new(GraphicsState::new(&device, &queue, format)?);
        let renderer = WgpuMenuRenderer::new(gfx, surface, surface_config)?;
        let scheduler = WindowScheduler {
            window: Arc::clone(&window),
            cancelled: false,
        };

        let items = std::mem::take(&mut self.items);
        let titles = items
            .iter()
            .enumerate()
            .map(|(i, item)| match item.title.trim() {
                "" => format!("Item {}", i + 1),
                title => title.to_owned(),
            })
            .collect::<Vec<_>>();

        let mut menu = InfiniteGridMenu::new(
            items,
            surface_size(&window),
            renderer,
            scheduler,
            MenuOptions {
                scale: self.scale,
                tuning: self.config.tuning.clone(),
                ..MenuOptions::default()
            },
        )?;
        menu.on_active_item_changed({
            let window = Arc::clone(&window);
            move |i| {
                let title = titles.get(i).map(String::as_str).unwrap_or_default();
                log::debug!("active item is {i} ({title})");
                window.set_title(&format!("{TITLE} - {title}"));
            }
        });
        menu.on_movement_changed(|moving| log::trace!("moving: {moving}"));

        window.request_redraw();

        Ok(AppState {
            window,
            menu,
            start_time: Instant::now(),

            cursor: Point2::new(0.0, 0.0),
            last_press: None,
        })
    }
}

impl AppState {
    /// Records a primary press and activates the front item on a
    /// double-click.
    fn press(&mut self, config: &ViewerConfig) {
        let now = Instant::now();
        let max_interval = Duration::from_millis(config.double_click.max_interval_ms);
        let is_double_click = self.last_press.is_some_and(|(time, position)| {
            now.duration_since(time) <= max_interval
                && position.distance(self.cursor) <= config.double_click.max_distance
        });

        if is_double_click {
            self.last_press = None;
            self.activate();
        } else {
            self.last_press = Some((now, self.cursor));
        }
    }

    fn activate(&self) {
        let index = self.menu.nearest_item_index();
        let Some(item) = self.menu.items().get(index) else {
            return;
        };
        log::info!("activated item {index}: {:?}", item.title);
        if let Some(link) = item.activation_link() {
            if let Err(e) = opener::open(link) {
                log::warn!("error opening {link:?}: {e}");
            }
        }
    }
}

/// Returns the logical size and pixel density of the window.
fn surface_size(window: &Window) -> SurfaceSize {
    let scale_factor = window.scale_factor();
    let logical = window.inner_size().to_logical::<f32>(scale_factor);
    SurfaceSize {
        width: logical.width,
        height: logical.height,
        device_pixel_ratio: scale_factor as f32,
    }
}
