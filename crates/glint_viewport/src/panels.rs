//! egui panels: render settings and live scene editing.

use glint_core::{Material, Scene, Sphere};
use glint_math::{Color, Vec3};
use glint_renderer::{Camera, RenderSettings};

/// Per-frame numbers shown in the Settings panel.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStats {
    /// Wall time of the last `Renderer::render` call
    pub last_render_ms: f32,
    pub fps: f32,
    /// Frame index the next render will average with
    pub frame_index: u32,
    /// Render resolution in pixels
    pub resolution: (u32, u32),
}

impl FrameStats {
    /// Samples averaged into the image on screen.
    pub fn accumulated_frames(&self) -> u32 {
        self.frame_index.saturating_sub(1)
    }
}

/// Buttons pressed in the Settings panel this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsActions {
    pub reset: bool,
    pub save_png: bool,
}

/// Render settings, timing and camera readout.
pub fn settings_panel(
    ui: &mut egui::Ui,
    settings: &mut RenderSettings,
    stats: &FrameStats,
    camera: &Camera,
) -> SettingsActions {
    let mut actions = SettingsActions::default();

    ui.heading("Settings");
    ui.separator();

    ui.label(format!("Last render: {:.3}ms", stats.last_render_ms));
    ui.label(format!("FPS: {:.1}", stats.fps));
    ui.label(format!("Accumulated frames: {}", stats.accumulated_frames()));
    ui.label(format!("Resolution: {}x{}", stats.resolution.0, stats.resolution.1));
    ui.separator();

    ui.checkbox(&mut settings.accumulate, "Accumulate");
    ui.checkbox(&mut settings.parallel, "Multithreaded");

    ui.horizontal(|ui| {
        if ui.button("Reset").clicked() {
            actions.reset = true;
        }
        if ui.button("Save PNG").clicked() {
            actions.save_png = true;
        }
    });

    ui.separator();

    ui.collapsing("Camera", |ui| {
        let position = camera.position();
        let direction = camera.direction();
        ui.label(format!(
            "Position: ({:.2}, {:.2}, {:.2})",
            position.x, position.y, position.z
        ));
        ui.label(format!(
            "Direction: ({:.2}, {:.2}, {:.2})",
            direction.x, direction.y, direction.z
        ));
        ui.label(format!("FOV: {:.1}°", camera.vertical_fov()));
    });

    ui.collapsing("Controls", |ui| {
        ui.label("🖱️ Right Mouse (hold): Look around");
        ui.label("⌨️ W/S: Move forward/back");
        ui.label("⌨️ A/D: Move left/right");
        ui.label("⌨️ Left Ctrl/Space: Move down/up");
    });

    actions
}

fn drag_vec3(ui: &mut egui::Ui, value: &mut Vec3, speed: f32) -> bool {
    let mut changed = false;
    ui.horizontal(|ui| {
        changed |= ui.add(egui::DragValue::new(&mut value.x).speed(speed)).changed();
        changed |= ui.add(egui::DragValue::new(&mut value.y).speed(speed)).changed();
        changed |= ui.add(egui::DragValue::new(&mut value.z).speed(speed)).changed();
    });
    changed
}

fn color_edit(ui: &mut egui::Ui, color: &mut Color) -> bool {
    let mut rgb = color.to_array();
    let changed = ui.color_edit_button_rgb(&mut rgb).changed();
    if changed {
        *color = Color::from_array(rgb);
    }
    changed
}

fn sphere_editor(ui: &mut egui::Ui, sphere: &mut Sphere, material_count: usize) -> bool {
    let mut changed = false;

    ui.horizontal(|ui| {
        ui.label("Position");
        changed |= drag_vec3(ui, &mut sphere.position, 0.1);
    });
    ui.horizontal(|ui| {
        ui.label("Radius");
        changed |= ui
            .add(egui::DragValue::new(&mut sphere.radius).speed(0.1).range(0.01..=f32::MAX))
            .changed();
    });
    ui.horizontal(|ui| {
        ui.label("Material");
        let max_index = material_count.saturating_sub(1);
        changed |= ui
            .add(egui::DragValue::new(&mut sphere.material_index).speed(1.0).range(0..=max_index))
            .changed();
    });

    changed
}

fn material_editor(ui: &mut egui::Ui, material: &mut Material) -> bool {
    let mut changed = false;

    ui.horizontal(|ui| {
        ui.label("Albedo");
        changed |= color_edit(ui, &mut material.albedo);
    });
    changed |= ui
        .add(egui::Slider::new(&mut material.roughness, 0.0..=1.0).text("Roughness"))
        .changed();
    changed |= ui
        .add(egui::Slider::new(&mut material.metallic, 0.0..=1.0).text("Metallic"))
        .changed();
    ui.horizontal(|ui| {
        ui.label("Emission");
        changed |= color_edit(ui, &mut material.emission_color);
    });
    changed |= ui
        .add(
            egui::DragValue::new(&mut material.emission_power)
                .speed(0.05)
                .range(0.0..=f32::MAX)
                .prefix("Power: "),
        )
        .changed();

    changed
}

/// Edit spheres and materials in place. Returns true if anything changed.
pub fn scene_panel(ui: &mut egui::Ui, scene: &mut Scene) -> bool {
    let mut changed = false;

    ui.heading("Scene");
    ui.separator();

    egui::ScrollArea::vertical().show(ui, |ui| {
        let material_count = scene.materials.len();

        ui.collapsing(format!("Spheres ({})", scene.spheres.len()), |ui| {
            for (i, sphere) in scene.spheres.iter_mut().enumerate() {
                ui.push_id(("sphere", i), |ui| {
                    ui.label(egui::RichText::new(format!("Sphere {}", i)).strong());
                    changed |= sphere_editor(ui, sphere, material_count);
                    ui.separator();
                });
            }
            if ui.button("Add Sphere").clicked() {
                scene.add_sphere(Sphere::default());
                changed = true;
            }
        });

        ui.collapsing(format!("Materials ({})", scene.materials.len()), |ui| {
            for (i, material) in scene.materials.iter_mut().enumerate() {
                ui.push_id(("material", i), |ui| {
                    ui.label(egui::RichText::new(format!("Material {}", i)).strong());
                    changed |= material_editor(ui, material);
                    ui.separator();
                });
            }
            if ui.button("Add Material").clicked() {
                scene.add_material(Material::default());
                changed = true;
            }
        });
    });

    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulated_frames_counts_averaged_samples() {
        let fresh = FrameStats { frame_index: 1, ..Default::default() };
        assert_eq!(fresh.accumulated_frames(), 0);

        let warmed = FrameStats { frame_index: 8, ..Default::default() };
        assert_eq!(warmed.accumulated_frames(), 7);

        // Before the first render the index may still be zero
        assert_eq!(FrameStats::default().accumulated_frames(), 0);
    }

    #[test]
    fn test_panels_without_input_change_nothing() {
        let ctx = egui::Context::default();
        let mut scene = Scene::showcase();
        let original = scene.clone();
        let mut settings = RenderSettings::default();
        let camera = Camera::default();

        let mut scene_changed = true;
        let mut actions = SettingsActions { reset: true, save_png: true };

        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::SidePanel::left("settings").show(ctx, |ui| {
                actions = settings_panel(ui, &mut settings, &FrameStats::default(), &camera);
            });
            egui::CentralPanel::default().show(ctx, |ui| {
                scene_changed = scene_panel(ui, &mut scene);
            });
        });

        assert!(!scene_changed);
        assert_eq!(actions, SettingsActions::default());
        assert_eq!(scene, original);
        assert_eq!(settings, RenderSettings::default());
    }
}
