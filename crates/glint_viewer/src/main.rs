use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use glint_core::Scene;
use glint_viewport::{InputState, Viewport};
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

/// Application state
struct App {
    window: Option<Arc<Window>>,
    viewport: Option<Viewport>,
    input: InputState,
    last_frame_time: Instant,
}

impl App {
    fn new() -> Self {
        Self {
            window: None,
            viewport: None,
            input: InputState::new(),
            last_frame_time: Instant::now(),
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_attrs = Window::default_attributes()
            .with_title("Glint")
            .with_inner_size(winit::dpi::PhysicalSize::new(1600, 900));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let viewport = pollster::block_on(Viewport::new(window.clone(), Scene::showcase()))?;

        self.window = Some(window);
        self.viewport = Some(viewport);
        self.last_frame_time = Instant::now();

        log::info!("Window and viewport initialized");
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let delta_time = (now - self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;

        let (Some(viewport), Some(window)) = (&mut self.viewport, &self.window) else {
            return;
        };

        viewport.update(delta_time, &mut self.input);
        self.input.apply_cursor_mode(window);

        if let Err(e) = viewport.render(window) {
            match e.downcast_ref::<wgpu::SurfaceError>() {
                Some(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    viewport.resize(viewport.size);
                }
                Some(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Out of memory!");
                    event_loop.exit();
                }
                Some(surface_err) => log::error!("Surface error: {:?}", surface_err),
                None => log::error!("Render error: {:?}", e),
            }
        }

        window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init(event_loop) {
                log::error!("Failed to initialize viewer: {:#}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        // egui sees every event first
        let consumed_by_ui = match (&mut self.viewport, &self.window) {
            (Some(viewport), Some(window)) => viewport.handle_egui_event(window, &event),
            _ => false,
        };

        // While flying, the camera owns the keyboard even if a widget has focus
        self.input
            .handle_window_event(&event, consumed_by_ui && !self.input.is_active());

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(viewport) = &mut self.viewport {
                    viewport.resize((physical_size.width, physical_size.height));
                    log::info!("Resized to {}x{}", physical_size.width, physical_size.height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        self.input.handle_device_event(&event);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        // Progressive rendering keeps refining, so redraw continuously
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Starting Glint");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();

    log::info!("Running event loop");
    event_loop.run_app(&mut app)?;

    Ok(())
}
