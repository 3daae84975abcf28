//! Interactive viewport for the Glint path tracer.
//!
//! Owns the window surface, the egui UI and the CPU render loop. Each frame the
//! scene is path traced into the renderer's RGBA buffer, uploaded as an egui
//! texture and drawn in the central panel.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use glint_core::{Scene, SceneError};
use glint_renderer::{Camera, RenderSettings, Renderer};
use wgpu::{Device, Instance, Queue, Surface, SurfaceConfiguration};
use winit::window::Window;

pub mod export;
pub mod input;
pub mod panels;

pub use input::InputState;
use panels::{FrameStats, SettingsActions};

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.1,
    b: 0.1,
    a: 1.0,
};

/// Window surface, UI and progressive renderer.
pub struct Viewport {
    surface: Surface<'static>,
    device: Device,
    queue: Queue,
    config: SurfaceConfiguration,
    pub size: (u32, u32),

    // egui state
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,

    pub scene: Scene,
    pub camera: Camera,
    pub renderer: Renderer,

    /// Render output shown in the central panel
    image_texture: Option<egui::TextureHandle>,
    /// Size of the central panel in physical pixels, measured last frame
    viewport_pixels: (u32, u32),
    last_scene_error: Option<SceneError>,

    // Stats
    pub fps: f32,
    frame_count: u32,
    fps_update_timer: f32,
    last_render_ms: f32,
}

impl Viewport {
    /// Create a viewport for the given window, rendering `scene`.
    pub async fn new(window: Arc<Window>, scene: Scene) -> Result<Self> {
        let size = window.inner_size();

        let instance = Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("Failed to find suitable GPU adapter"))?;

        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Glint Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("Surface reports no supported formats"))?;

        let config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            // The CPU renderer sets the pace; don't block on vsync
            present_mode: wgpu::PresentMode::AutoNoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(&device, config.format, None, 1, false);

        log::info!("egui initialized");
        log::info!(
            "Scene: {} spheres, {} materials",
            scene.spheres.len(),
            scene.materials.len()
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size: (size.width, size.height),
            egui_ctx,
            egui_state,
            egui_renderer,
            scene,
            camera: Camera::default(),
            renderer: Renderer::new(RenderSettings::default()),
            image_texture: None,
            viewport_pixels: (0, 0),
            last_scene_error: None,
            fps: 0.0,
            frame_count: 0,
            fps_update_timer: 0.0,
            last_render_ms: 0.0,
        })
    }

    /// Handle window resize
    pub fn resize(&mut self, new_size: (u32, u32)) {
        if new_size.0 > 0 && new_size.1 > 0 {
            self.size = new_size;
            self.config.width = new_size.0;
            self.config.height = new_size.1;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Handle egui window event - returns true if event was consumed by egui
    pub fn handle_egui_event(&mut self, window: &Window, event: &winit::event::WindowEvent) -> bool {
        let response = self.egui_state.on_window_event(window, event);
        response.consumed
    }

    /// Advance the camera and frame stats. Moving the camera restarts accumulation.
    pub fn update(&mut self, delta_time: f32, input: &mut InputState) {
        self.update_fps(delta_time);

        if self.camera.on_update(delta_time, input) {
            self.renderer.reset_frame_index();
        }
    }

    fn update_fps(&mut self, delta_time: f32) {
        self.frame_count += 1;
        self.fps_update_timer += delta_time;

        if self.fps_update_timer >= 0.5 {
            self.fps = self.frame_count as f32 / self.fps_update_timer;
            self.frame_count = 0;
            self.fps_update_timer = 0.0;
        }
    }

    /// Warn once per distinct scene problem; rendering falls back regardless.
    fn check_scene(&mut self) {
        match self.scene.validate() {
            Ok(()) => self.last_scene_error = None,
            Err(e) => {
                if self.last_scene_error.as_ref() != Some(&e) {
                    log::warn!("{}", e);
                    self.last_scene_error = Some(e);
                }
            }
        }
    }

    /// Path trace one frame at the last measured viewport size.
    fn render_scene(&mut self) {
        let (width, height) = self.viewport_pixels;
        self.renderer.fit_viewport(&mut self.camera, width, height);

        if width == 0 || height == 0 {
            return;
        }

        let start = Instant::now();
        self.renderer.render(&self.scene, &self.camera);
        self.last_render_ms = start.elapsed().as_secs_f32() * 1000.0;

        let image = egui::ColorImage::from_rgba_unmultiplied(
            [width as usize, height as usize],
            self.renderer.image_bytes(),
        );
        match &mut self.image_texture {
            Some(texture) => texture.set(image, egui::TextureOptions::NEAREST),
            None => {
                self.image_texture = Some(self.egui_ctx.load_texture(
                    "render",
                    image,
                    egui::TextureOptions::NEAREST,
                ));
            }
        }
    }

    fn save_snapshot(&self) {
        let (width, height) = self.renderer.size();
        let path = export::snapshot_path(self.renderer.frames_rendered());
        if let Err(e) = export::save_png(&path, width, height, self.renderer.image_bytes()) {
            log::error!("Save failed: {:#}", e);
        }
    }

    /// Render the scene, run the UI and present.
    pub fn render(&mut self, window: &Window) -> Result<()> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.check_scene();
        self.render_scene();

        let raw_input = self.egui_state.take_egui_input(window);

        let stats = FrameStats {
            last_render_ms: self.last_render_ms,
            fps: self.fps,
            frame_index: self.renderer.frame_index(),
            resolution: self.renderer.size(),
        };
        let pixels_per_point = window.scale_factor() as f32;
        let image = self.image_texture.as_ref().map(|texture| {
            let [w, h] = texture.size();
            (texture.id(), egui::vec2(w as f32, h as f32) / pixels_per_point)
        });

        // Split borrows so the closure doesn't capture all of self
        let settings = &mut self.renderer.settings;
        let scene = &mut self.scene;
        let camera = &self.camera;
        let mut actions = SettingsActions::default();
        let mut scene_changed = false;
        let mut viewport_points = egui::Vec2::ZERO;

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            egui::SidePanel::left("settings_panel")
                .default_width(260.0)
                .show(ctx, |ui| {
                    actions = panels::settings_panel(ui, settings, &stats, camera);
                });

            egui::SidePanel::right("scene_panel")
                .default_width(300.0)
                .show(ctx, |ui| {
                    scene_changed = panels::scene_panel(ui, scene);
                });

            egui::CentralPanel::default()
                .frame(egui::Frame::none())
                .show(ctx, |ui| {
                    viewport_points = ui.available_size();
                    if let Some((id, size)) = image {
                        ui.image(egui::load::SizedTexture::new(id, size));
                    }
                });
        });

        self.viewport_pixels = (
            (viewport_points.x * pixels_per_point).round().max(0.0) as u32,
            (viewport_points.y * pixels_per_point).round().max(0.0) as u32,
        );

        if scene_changed || actions.reset {
            self.renderer.reset_frame_index();
        }
        if actions.save_png {
            self.save_snapshot();
        }

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point,
        };

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        {
            let mut egui_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime(); // egui_wgpu wants a 'static pass

            self.egui_renderer
                .render(&mut egui_pass, &paint_jobs, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
