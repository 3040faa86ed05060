// Window host for the starwake scene
// The simulation records a display list each frame; this binary replays it
// into a triangle batch and draws it with a single wgpu draw call.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use winit::{
    event::{ElementState, Event as WinitEvent, KeyEvent, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use starwake::engine::debug_overlay::{ship_debug_draws, DebugOverlay, DebugStats, FrameTimes};
use starwake::engine::renderer::Renderer;
use starwake::engine::resize::ResizeDebouncer;
use starwake::engine::shapes::ShapeBatch;
use starwake::engine::{CanvasSize, ConfigResult, Rgb, Scene, SceneConfig};

const DEFAULT_CONFIG_PATH: &str = "starwake.toml";

// ============================================================================
// APPLICATION STATE
// ============================================================================

struct State {
    window: Arc<Window>,
    renderer: Renderer,
    overlay: DebugOverlay,
    batch: ShapeBatch,

    scene: Scene,
    config: SceneConfig,
    resize: ResizeDebouncer,

    last_update: Instant,
    frame_times: FrameTimes,
}

impl State {
    fn new(window: Arc<Window>, renderer: Renderer, config: SceneConfig) -> Self {
        let size = renderer.size();
        let overlay = DebugOverlay::new(&window, renderer.device(), renderer.surface_format());
        let canvas = CanvasSize::new(size.width as f32, size.height as f32);
        let batch = ShapeBatch::new(canvas.as_vec2(), Rgb::BLACK.opaque());

        let mut scene = Scene::new();
        if let Err(e) = scene.initialize(canvas, config.clone()) {
            // A zero-sized window at startup; the first resize builds the scene.
            log::warn!("Deferring scene build: {e}");
        }

        let now = Instant::now();
        Self {
            window,
            renderer,
            overlay,
            batch,
            scene,
            config,
            resize: ResizeDebouncer::default(),
            last_update: now,
            frame_times: FrameTimes::new(now),
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.renderer.resize(new_size);
        let canvas = CanvasSize::new(new_size.width as f32, new_size.height as f32);
        self.batch.set_viewport(canvas.as_vec2());
        self.resize.notify(canvas, Instant::now());
    }

    /// Reconfigure the surface at its current size after it was lost.
    fn reconfigure(&mut self) {
        let size = self.renderer.size();
        self.renderer.resize(size);
    }

    fn rebuild(&mut self, size: CanvasSize) {
        match self.scene.initialize(size, self.config.clone()) {
            Ok(()) => log::debug!("Rebuilt scene at {}x{}", size.width, size.height),
            Err(e) => log::warn!("Scene rebuild failed: {e}"),
        }
    }

    fn update(&mut self) {
        let now = Instant::now();
        let frame_time = now - self.last_update;
        self.last_update = now;
        self.frame_times.record(frame_time, now);

        if let Some(size) = self.resize.poll(now) {
            self.rebuild(size);
        }

        self.scene.tick(frame_time.as_secs_f32());

        self.batch.reset();
        self.scene.draw_list().replay(&mut self.batch);
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let size = self.renderer.size();
        let pixels_per_point = self.window.scale_factor() as f32;
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [size.width, size.height],
            pixels_per_point,
        };

        let stats = self.overlay.visible.then(|| {
            DebugStats::new(
                &self.frame_times,
                &self.scene.stats(),
                (size.width, size.height),
                self.config.seed,
                self.batch.vertices().len(),
            )
        });
        let ship_draws = if self.overlay.show_ships {
            self.scene.swarm().map(|swarm| ship_debug_draws(swarm, pixels_per_point))
        } else {
            None
        };

        let overlay = &mut self.overlay;
        let window = &self.window;
        self.renderer.render(&self.batch, |device, queue, encoder, view| {
            if overlay.is_active() {
                overlay.render(
                    device,
                    queue,
                    encoder,
                    window,
                    view,
                    &screen_descriptor,
                    stats.as_ref(),
                    ship_draws.as_deref(),
                );
            }
        })
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::F3 => self.overlay.toggle(),
            KeyCode::F4 => self.overlay.toggle_ships(),
            KeyCode::KeyR => {
                let size = self.renderer.size();
                self.rebuild(CanvasSize::new(size.width as f32, size.height as f32));
            }
            _ => {}
        }
    }
}

// ============================================================================
// CONFIG
// ============================================================================

/// First CLI argument, else `starwake.toml` if it exists, else defaults.
fn load_config() -> ConfigResult<SceneConfig> {
    if let Some(path) = std::env::args_os().nth(1) {
        return SceneConfig::load(Path::new(&path));
    }
    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        SceneConfig::load(default_path)
    } else {
        log::info!("No {DEFAULT_CONFIG_PATH} found, using built-in defaults");
        Ok(SceneConfig::default())
    }
}

// ============================================================================
// MAIN
// ============================================================================

fn main() {
    env_logger::init();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(config: SceneConfig) -> Result<(), Box<dyn std::error::Error>> {
    let event_loop = EventLoop::new()?;

    let window_attributes = Window::default_attributes()
        .with_title("starwake")
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

    let window = Arc::new(event_loop.create_window(window_attributes)?);

    let renderer = pollster::block_on(Renderer::new(window.clone()))?;
    let mut state = State::new(window.clone(), renderer, config);

    event_loop.run(move |event, control_flow| {
        match event {
            WinitEvent::WindowEvent {
                ref event,
                window_id,
            } if window_id == window.id() => {
                if state.overlay.is_active() {
                    let _ = state.overlay.handle_window_event(&window, event);
                }
                match event {
                    WindowEvent::CloseRequested
                    | WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                state: ElementState::Pressed,
                                physical_key: PhysicalKey::Code(KeyCode::Escape),
                                ..
                            },
                        ..
                    } => control_flow.exit(),
                    WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                state: ElementState::Pressed,
                                physical_key: PhysicalKey::Code(code),
                                repeat: false,
                                ..
                            },
                        ..
                    } => state.handle_key(*code),
                    WindowEvent::Resized(physical_size) => {
                        state.resize(*physical_size);
                    }
                    WindowEvent::RedrawRequested => {
                        state.update();
                        match state.render() {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost) => state.reconfigure(),
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                log::error!("GPU out of memory");
                                control_flow.exit()
                            }
                            Err(e) => log::warn!("Surface error: {e:?}"),
                        }
                    }
                    _ => {}
                }
            }
            WinitEvent::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
