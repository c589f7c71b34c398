use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

use deferred_core::settings::RuntimeSettings;

use crate::config::DemoConfig;
use crate::error::{FrameError, SetupError};
use crate::gpu::init_gpu;
use crate::input::{Action, InputState};
use crate::renderer::DeferredRenderer;

/// Longest frame delta fed to the orbit clock, in milliseconds.
const MAX_FRAME_DELTA_MS: f64 = 100.0;

/// Skipped frames in a row before the surface is reported as stuck.
const SKIP_WARN_THRESHOLD: u32 = 60;

/// The size to request when the window no longer matches the surface.
/// The G-buffer is fixed for the run, so the window is held at its size.
pub fn restore_size(
    current: PhysicalSize<u32>,
    surface: PhysicalSize<u32>,
) -> Option<PhysicalSize<u32>> {
    (current != surface).then_some(surface)
}

/// Window and frame-loop driver around a `DeferredRenderer`.
pub struct App {
    config: DemoConfig,
    settings: RuntimeSettings,
    input: InputState,
    renderer: Option<DeferredRenderer>,
    last_frame_time: Option<instant::Instant>,
    fatal: Option<SetupError>,
}

impl App {
    pub fn new(config: DemoConfig) -> Self {
        let settings = config.initial_settings();
        let input = InputState::new(&config.bindings);
        Self {
            config,
            settings,
            input,
            renderer: None,
            last_frame_time: None,
            fatal: None,
        }
    }

    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    /// The setup error that stopped the loop, if any.
    pub fn take_fatal(&mut self) -> Option<SetupError> {
        self.fatal.take()
    }

    fn init_renderer(&self, event_loop: &ActiveEventLoop) -> Result<DeferredRenderer, SetupError> {
        let window_attrs = Window::default_attributes()
            .with_title(self.config.window.title.as_str())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ))
            .with_resizable(false);

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .map_err(SetupError::Window)?,
        );

        let gpu = pollster::block_on(init_gpu(Arc::clone(&window), self.config.window.vsync))?;
        DeferredRenderer::new(gpu, &self.config)
    }

    fn apply_action(&mut self, action: Action, event_loop: &ActiveEventLoop) {
        let capacity = self.config.lights.capacity;
        let step = self.config.lights.step as i64;
        match action {
            Action::TogglePause => {
                let paused = self.settings.toggle_pause();
                tracing::info!("{}", if paused { "Paused" } else { "Resumed" });
            }
            Action::ToggleRenderMode => {
                let mode = self.settings.toggle_render_mode();
                tracing::info!("Render mode: {}", mode);
            }
            Action::MoreLights | Action::FewerLights => {
                let delta = if action == Action::MoreLights { step } else { -step };
                let count = self.settings.adjust_lights(delta, capacity);
                tracing::info!("Active lights: {}", count);
                if let Some(renderer) = &mut self.renderer {
                    if let Err(e) = renderer.apply_settings(&self.settings) {
                        tracing::warn!("Light count rejected: {}", e);
                    }
                }
            }
            Action::Quit => {
                tracing::info!("Quit requested, exiting");
                event_loop.exit();
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = instant::Instant::now();
        let dt_ms = match self.last_frame_time {
            Some(last) => (now.duration_since(last).as_secs_f64() * 1000.0).min(MAX_FRAME_DELTA_MS),
            None => 0.0,
        };
        self.last_frame_time = Some(now);

        let Some(renderer) = &mut self.renderer else {
            return;
        };
        match renderer.render_frame(&self.settings, dt_ms) {
            Ok(()) => {}
            Err(FrameError::SurfaceReconfigured) => {
                tracing::debug!("Surface lost or outdated, reconfigured");
                if renderer.consecutive_skips() == SKIP_WARN_THRESHOLD {
                    tracing::warn!(
                        "{} frames skipped in a row; surface keeps reporting lost or outdated",
                        SKIP_WARN_THRESHOLD
                    );
                }
            }
            Err(FrameError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                tracing::error!("Surface out of memory, exiting");
                event_loop.exit();
            }
            Err(FrameError::Surface(e)) => {
                tracing::warn!("Skipping frame: {}", e);
            }
            Err(e @ FrameError::Sequence(_)) => {
                tracing::error!("{}", e);
                event_loop.exit();
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        tracing::info!("Application resumed, initializing GPU");
        match self.init_renderer(event_loop) {
            Ok(renderer) => {
                tracing::info!(
                    "Rendering {} of {} lights in {} mode",
                    renderer.active_lights(),
                    renderer.light_capacity(),
                    self.settings.render_mode
                );
                self.renderer = Some(renderer);
            }
            Err(e) => {
                tracing::error!("Setup failed: {}", e);
                self.fatal = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        self.input.handle_window_event(&event);
        for action in self.input.drain_actions() {
            self.apply_action(action, event_loop);
        }

        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Close requested, exiting");
                event_loop.exit();
            }
            WindowEvent::ScaleFactorChanged {
                scale_factor,
                mut inner_size_writer,
            } => {
                if let Some(renderer) = &self.renderer {
                    tracing::info!(
                        "Scale factor changed to {}, keeping {}x{}",
                        scale_factor,
                        renderer.surface_size().width,
                        renderer.surface_size().height
                    );
                    if let Err(e) = inner_size_writer.request_inner_size(renderer.surface_size()) {
                        tracing::warn!("Could not keep window size: {}", e);
                    }
                }
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = &self.renderer {
                    if let Some(target) = restore_size(size, renderer.surface_size()) {
                        tracing::debug!(
                            "Window resized to {}x{}, restoring {}x{}",
                            size.width,
                            size.height,
                            target.width,
                            target.height
                        );
                        let _ = renderer.window().request_inner_size(target);
                    }
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(renderer) = &self.renderer {
            renderer.window().request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(renderer) = &self.renderer {
            tracing::info!("Presented {} frames", renderer.frames());
        }
    }
}

/// Run the demo until the window closes. Setup failures are returned after
/// the event loop stops.
pub fn run(config: DemoConfig) -> Result<(), SetupError> {
    let event_loop = EventLoop::new().map_err(SetupError::EventLoop)?;
    event_loop.set_control_flow(winit::event_loop::ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app).map_err(SetupError::EventLoop)?;

    match app.take_fatal() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deferred_core::settings::RenderMode;

    #[test]
    fn test_app_starts_from_config() {
        let mut config = DemoConfig::default();
        config.lights.count = 256;
        config.render_mode = RenderMode::GBufferView;
        config.paused = true;

        let mut app = App::new(config);
        assert_eq!(app.settings().active_lights, 256);
        assert_eq!(app.settings().render_mode, RenderMode::GBufferView);
        assert!(app.settings().paused);
        assert!(app.take_fatal().is_none());
    }

    #[test]
    fn test_restore_size_only_on_mismatch() {
        let surface = PhysicalSize::new(1280, 720);
        assert_eq!(restore_size(surface, surface), None);
        assert_eq!(
            restore_size(PhysicalSize::new(2560, 1440), surface),
            Some(surface)
        );
    }
}
