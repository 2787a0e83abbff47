use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::camera::{Camera, DEFAULT_SCROLL_SPEED_PX};
use crate::city::City;
use crate::geometry::TilePos;
use crate::input::{InputEvent, Key};
use crate::layer::{LayerKind, LayerSettings};
use crate::view::CityView;
use crate::{resolve_app_paths, StartupError};

use super::input::InputCollector;
use super::metrics::{FrameSample, MetricsAccumulator};
use super::{MetricsHandle, Renderer};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    /// Camera pan speed in pixels per frame.
    pub scroll_speed: i32,
    pub layer_settings: LayerSettings,
    /// Tile the camera starts centered on; the map center when unset.
    pub start_tile: Option<TilePos>,
    pub metrics_log_interval: Duration,
    pub max_render_fps: Option<u32>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "City View".to_string(),
            window_width: 1280,
            window_height: 720,
            scroll_speed: DEFAULT_SCROLL_SPEED_PX,
            layer_settings: LayerSettings::default(),
            start_tile: None,
            metrics_log_interval: Duration::from_secs(1),
            max_render_fps: Some(60),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(config: LoopConfig, city: City) -> Result<(), AppError> {
    run_app_with_metrics(config, city, MetricsHandle::default())
}

pub fn run_app_with_metrics(
    config: LoopConfig,
    city: City,
    metrics_handle: MetricsHandle,
) -> Result<(), AppError> {
    let app_paths = resolve_app_paths()?;
    info!(
        root = %app_paths.root.display(),
        assets_dir = %app_paths.assets_dir.display(),
        "startup"
    );

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let window_for_loop = Arc::clone(&window);
    let mut renderer =
        Renderer::new(window, app_paths.assets_dir.clone()).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let start_tile = config
        .start_tile
        .unwrap_or_else(|| map_center(city.tilemap().width(), city.tilemap().height()));
    let mut camera = Camera::new(renderer.size()).with_scroll_speed(config.scroll_speed);
    camera.center_on(start_tile);
    let mut view = CityView::new(city, camera, config.layer_settings.clone());
    info!(
        width = view.city().tilemap().width(),
        height = view.city().tilemap().height(),
        overlays = view.city().overlays().len(),
        walkers = view.city().walkers().len(),
        start_i = start_tile.i,
        start_j = start_tile.j,
        "city_loaded"
    );

    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let mut pacer = FramePacer::new(normalize_render_fps_cap(config.max_render_fps));
    info!(
        scroll_speed = view.camera().scroll_speed(),
        shift_multiplier = config.layer_settings.shift_multiplier,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        render_fps_cap = %format_render_cap(pacer.cap),
        "loop_config"
    );

    let mut input_collector = InputCollector::new();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window_for_loop.id() => {
                let input = match event {
                    WindowEvent::CloseRequested => {
                        info!(reason = "window_close", "shutdown_requested");
                        window_target.exit();
                        None
                    }
                    WindowEvent::Resized(new_size) => {
                        resize_view(&mut renderer, &mut view, new_size.width, new_size.height);
                        None
                    }
                    WindowEvent::ScaleFactorChanged { .. } => {
                        let size = window_for_loop.inner_size();
                        resize_view(&mut renderer, &mut view, size.width, size.height);
                        None
                    }
                    WindowEvent::ModifiersChanged(modifiers) => {
                        input_collector.set_modifiers(modifiers.state());
                        None
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        Some(input_collector.handle_cursor_moved(position.x, position.y))
                    }
                    WindowEvent::MouseInput { state, button, .. } => {
                        input_collector.handle_mouse_input(button, state)
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        input_collector.handle_key(event.physical_key, &event.logical_key, event.state)
                    }
                    WindowEvent::RedrawRequested => {
                        let (now, dt) = pacer.begin_frame();
                        match present_frame(&mut renderer, &mut view, dt) {
                            Ok(sample) => {
                                pacer.mark_presented();
                                metrics_accumulator.record(sample);
                            }
                            Err(error) => {
                                warn!(error = %error, "renderer_draw_failed");
                                window_target.exit();
                            }
                        }
                        if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                            metrics_handle.publish(snapshot);
                            info!(
                                fps = snapshot.fps,
                                frame_time_ms = snapshot.frame_time_ms,
                                pictures_per_frame = snapshot.pictures_per_frame,
                                peak_pictures = snapshot.peak_pictures,
                                tiles_cleared = snapshot.tiles_cleared,
                                cached_pictures = renderer.cached_pictures(),
                                layer = ?view.layer_kind(),
                                "loop_metrics"
                            );
                        }
                        None
                    }
                    _ => None,
                };

                if let Some(input) = input {
                    if is_quit_request(&input, view.layer_kind()) {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                        return;
                    }
                    view.handle_event(&input);
                }
            }
            Event::AboutToWait => {
                window_for_loop.request_redraw();
            }
            Event::LoopExiting => {
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// One frame of the view: advance, draw, then apply the events the layers
/// dispatched while handling input and drawing.
fn present_frame(
    renderer: &mut Renderer,
    view: &mut CityView,
    dt: Duration,
) -> Result<FrameSample, PixelsError> {
    view.update();
    let pictures = renderer.render_view(view)?;
    let tiles_cleared = view.apply_events();
    Ok(FrameSample {
        dt,
        pictures,
        tiles_cleared,
    })
}

/// Sleeps out the remainder of the frame budget when a render cap is set.
struct FramePacer {
    cap: Option<u32>,
    target: Option<Duration>,
    last_frame: Instant,
    last_present: Instant,
}

impl FramePacer {
    fn new(cap: Option<u32>) -> Self {
        let now = Instant::now();
        Self {
            cap,
            target: target_frame_duration(cap),
            last_frame: now,
            last_present: now,
        }
    }

    /// Waits for the frame budget, then returns the frame start and the time
    /// since the previous frame start.
    fn begin_frame(&mut self) -> (Instant, Duration) {
        let since_present = Instant::now().saturating_duration_since(self.last_present);
        let sleep = compute_cap_sleep(since_present, self.target);
        if !sleep.is_zero() {
            thread::sleep(sleep);
        }
        let now = Instant::now();
        let dt = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        (now, dt)
    }

    fn mark_presented(&mut self) {
        self.last_present = Instant::now();
    }
}

fn resize_view(renderer: &mut Renderer, view: &mut CityView, width: u32, height: u32) {
    match renderer.resize(width, height) {
        Ok(()) => view.camera_mut().set_viewport(renderer.size()),
        Err(error) => warn!(error = %error, width, height, "renderer_resize_failed"),
    }
}

/// Escape leaves the demolition tool first and only quits from the plain view.
fn is_quit_request(input: &InputEvent, layer: LayerKind) -> bool {
    matches!(input, InputEvent::Keyboard(keyboard) if keyboard.pressed && keyboard.key == Key::Escape)
        && layer == LayerKind::Simple
}

fn map_center(width: u32, height: u32) -> TilePos {
    TilePos::new(width as i32 / 2, height as i32 / 2)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}
