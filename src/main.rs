use std::sync::Arc;
use std::time::Instant;

use glam::{UVec2, Vec2};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::WindowId;

use tilesheets::camera::{Camera, world_to_cell};
use tilesheets::input::{ActionMap, InputState, ViewerAction, default_bindings};
use tilesheets::renderer::Renderer;
use tilesheets::window::{ViewerConfig, window_attributes};
use tilesheets::{PlaceSpritesEvent, Tilesheets, load_tilesheets, place_sprites};

/// Keyboard pan speed in screen pixels per second.
const PAN_SPEED: f32 = 600.0;
/// Zoom factor per wheel notch.
const ZOOM_STEP: f32 = 1.1;

// ── App (winit ApplicationHandler) ──────────────────────────────────────────

struct App {
    config: ViewerConfig,
    tilesheets: Option<Tilesheets>,
    event: PlaceSpritesEvent,
    renderer: Option<Renderer>,
    camera: Camera,
    input: InputState,
    actions: ActionMap<ViewerAction>,
    last_instant: Option<Instant>,
    hovered: Option<UVec2>,
}

impl App {
    fn new(config: ViewerConfig, tilesheets: Tilesheets, event: PlaceSpritesEvent) -> Self {
        // Start with the map's top-left cell in the upper-left quarter.
        let camera = Camera::new(config.width as f32 * 0.25, -(config.height as f32) * 0.25);
        Self {
            config,
            tilesheets: Some(tilesheets),
            event,
            renderer: None,
            camera,
            input: InputState::new(),
            actions: default_bindings(),
            last_instant: None,
            hovered: None,
        }
    }

    /// Draw the loaded event on the current z-level.
    fn place(&mut self) {
        match place_sprites(self.tilesheets.as_mut(), &self.event) {
            Ok(report) if !report.is_clean() => {
                log::warn!("{} sprites could not be placed", report.skipped.len());
            }
            Ok(report) => log::info!("placed {} sprites", report.drawn),
            Err(e) => log::error!("placing sprites failed: {e}"),
        }
    }

    fn change_z_level(&mut self, delta: i32) {
        let Some(tilesheets) = self.tilesheets.as_mut() else { return };
        let z = tilesheets.z_level() + delta;
        if tilesheets.switch_z_level(z) {
            log::info!("z-level {z}");
            self.place();
        }
    }

    fn reload(&mut self) {
        let Some(path) = self.config.sprites_path.clone() else { return };
        match PlaceSpritesEvent::read(&path) {
            Ok(event) => {
                self.event = event;
                if let Some(tilesheets) = self.tilesheets.as_mut() {
                    tilesheets.clear_all();
                }
                self.place();
            }
            Err(e) => log::error!("reloading {} failed: {e}", path.display()),
        }
    }

    fn handle_actions(&mut self, dt: f32) {
        let held = |a| self.actions.is_held(a, &self.input);
        let mut pan = Vec2::ZERO;
        if held(ViewerAction::PanUp) { pan.y -= 1.0; }
        if held(ViewerAction::PanDown) { pan.y += 1.0; }
        if held(ViewerAction::PanLeft) { pan.x -= 1.0; }
        if held(ViewerAction::PanRight) { pan.x += 1.0; }
        let dragging = held(ViewerAction::Drag);

        self.camera.pan(pan * PAN_SPEED * dt);
        if dragging {
            // Dragging moves the map with the cursor.
            let [dx, dy] = self.input.mouse_delta();
            self.camera.pan(Vec2::new(-dx, -dy));
        }
        if self.input.mouse_wheel != 0.0 {
            self.camera.zoom_by(ZOOM_STEP.powf(self.input.mouse_wheel));
        }

        if self.actions.is_pressed(ViewerAction::ZLevelUp, &self.input) {
            self.change_z_level(1);
        }
        if self.actions.is_pressed(ViewerAction::ZLevelDown, &self.input) {
            self.change_z_level(-1);
        }
        if self.actions.is_pressed(ViewerAction::ClearAll, &self.input) {
            if let Some(tilesheets) = self.tilesheets.as_mut() {
                tilesheets.clear_all();
                log::info!("cleared all sprites");
            }
        }
        if self.actions.is_pressed(ViewerAction::Reload, &self.input) {
            self.reload();
        }
    }

    /// Show the cell under the cursor in the window title.
    fn update_hover(&mut self) {
        let (Some(renderer), Some(tilesheets)) = (&self.renderer, &self.tilesheets) else { return };
        let size = renderer.size();
        let viewport = Vec2::new(size.width as f32, size.height as f32);
        let world = self.camera.screen_to_world(Vec2::from(self.input.mouse_pos), viewport);
        let cell = world_to_cell(world, tilesheets.tile_size());
        if cell == self.hovered {
            return;
        }
        self.hovered = cell;
        let title = match cell {
            Some(c) => format!("{} - {},{} (z {})", self.config.title, c.x, c.y, tilesheets.z_level()),
            None => self.config.title.clone(),
        };
        renderer.window.set_title(&title);
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = self
            .last_instant
            .map_or(0.0, |prev| now.duration_since(prev).as_secs_f32().min(0.25));
        self.last_instant = Some(now);

        self.handle_actions(dt);
        self.update_hover();
        self.camera.tick(dt);

        let (Some(renderer), Some(tilesheets)) = (self.renderer.as_mut(), self.tilesheets.as_mut())
        else {
            return;
        };

        // One animation tick per rendered frame.
        let z = tilesheets.z_level();
        let report = tilesheets.update_animated_sprites(z);
        if !report.is_clean() {
            log::warn!(
                "animation tick on z {z}: {} drawn, {} dropped",
                report.drawn,
                report.skipped.len()
            );
        }

        let size = renderer.size();
        let uniform = self.camera.build_view_proj(size.width as f32, size.height as f32);
        renderer.update_camera(&uniform);

        match renderer.render(tilesheets) {
            Ok(_) => {}
            Err(wgpu::SurfaceError::Lost) => {
                let size = renderer.window.inner_size();
                renderer.resize(size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("out of GPU memory, exiting");
                event_loop.exit();
            }
            Err(e) => log::warn!("render error: {e}"),
        }

        self.input.clear_frame_state();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }
        let window = match event_loop.create_window(window_attributes(&self.config)) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };
        let renderer = pollster::block_on(Renderer::new(window));
        if let Some(tilesheets) = self.tilesheets.as_mut() {
            renderer.attach(tilesheets);
        }
        self.renderer = Some(renderer);
        self.place();
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(renderer) = self.renderer.as_ref() {
            renderer.window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                if let Some(tilesheets) = self.tilesheets.take() {
                    tilesheets.dispose();
                }
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size);
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.input.mouse_pos = [position.x as f32, position.y as f32];
            }

            WindowEvent::MouseInput { button, state, .. } => match state {
                ElementState::Pressed => self.input.press_mouse(button),
                ElementState::Released => self.input.release_mouse(button),
            },

            WindowEvent::MouseWheel { delta, .. } => {
                self.input.mouse_wheel = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => (pos.y / 100.0) as f32,
                };
            }

            WindowEvent::KeyboardInput {
                event: KeyEvent { physical_key: PhysicalKey::Code(code), state, .. },
                ..
            } => match state {
                ElementState::Pressed => self.input.press_key(code),
                ElementState::Released => self.input.release_key(code),
            },

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("wgpu_hal", log::LevelFilter::Error)
        .init();

    let config = ViewerConfig::from_args(std::env::args().skip(1))?;
    let tilesheets = load_tilesheets(&config.tilesheets_config())?;
    let event = match &config.sprites_path {
        Some(path) => PlaceSpritesEvent::read(path)?,
        None => PlaceSpritesEvent::default(),
    };
    log::info!("z-levels in event: {:?}", event.z_levels());

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, tilesheets, event);
    event_loop.run_app(&mut app)?;
    Ok(())
}
