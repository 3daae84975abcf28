//! Progressive path tracing renderer.
//!
//! Implements a simple bounce-and-accumulate path tracer with:
//! - One ray per pixel per frame, up to [`MAX_BOUNCES`] bounces
//! - A single directional light with no shadow rays
//! - Roughness-perturbed mirror reflection for glossy/diffuse looks
//! - Running average across frames while the camera is still

use crate::camera::Camera;
use crate::hit::trace_ray;
use glint_core::{Material, Scene};
use glint_math::{reflect, Color, Ray, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rayon::prelude::*;

/// Bounce limit per path.
pub const MAX_BOUNCES: u32 = 5;

/// Energy kept after each bounce.
pub const BOUNCE_ATTENUATION: f32 = 0.5;

/// Offset along the normal for the next bounce origin, to avoid self-hits.
pub const SURFACE_EPSILON: f32 = 0.0001;

/// Sky color returned by rays that leave the scene.
pub const BACKGROUND: Color = Color::new(0.6, 0.7, 0.9);

/// Used when a sphere's material index does not resolve.
const FALLBACK_MATERIAL: Material = Material {
    albedo: Color::ONE,
    roughness: 1.0,
    metallic: 0.0,
    emission_color: Color::ZERO,
    emission_power: 0.0,
};

/// Direction the single directional light travels in.
#[inline]
pub fn light_direction() -> Vec3 {
    Vec3::new(-1.0, -1.0, -1.0).normalize()
}

/// Render settings, toggled from the viewer's Settings panel.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    /// Average samples across frames while the camera is still
    pub accumulate: bool,
    /// Shade rows on the rayon thread pool
    pub parallel: bool,
    /// Base seed for the per-row random streams
    pub seed: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            accumulate: true,
            parallel: true,
            seed: 0,
        }
    }
}

/// Result of tracing one path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSample {
    /// Linear, unclamped color
    pub color: Color,
    /// Number of bounce iterations executed (1..=MAX_BOUNCES)
    pub bounces: u32,
}

/// Trace one path and report how many bounces it took.
pub fn trace_path(ray: Ray, scene: &Scene, rng: &mut dyn RngCore) -> PathSample {
    let mut ray = ray;
    let mut color = Color::ZERO;
    let mut multiplier = 1.0;
    let mut bounces = 0;

    while bounces < MAX_BOUNCES {
        bounces += 1;

        let payload = trace_ray(&ray, scene);
        if !payload.is_hit() {
            color += BACKGROUND * multiplier;
            break;
        }

        let light_intensity = payload.world_normal.dot(-light_direction()).max(0.0);

        let sphere = &scene.spheres[payload.object_index];
        let material = scene.material_for(sphere).unwrap_or(&FALLBACK_MATERIAL);

        color += (material.albedo * light_intensity + material.emission()) * multiplier;
        multiplier *= BOUNCE_ATTENUATION;

        let perturbation = Vec3::new(
            rng.gen_range(-0.5..0.5),
            rng.gen_range(-0.5..0.5),
            rng.gen_range(-0.5..0.5),
        );
        ray = Ray::new(
            payload.world_position + payload.world_normal * SURFACE_EPSILON,
            reflect(
                ray.direction,
                payload.world_normal + material.roughness * perturbation,
            ),
        );
    }

    PathSample { color, bounces }
}

/// Compute the color for a single camera ray.
#[inline]
pub fn per_pixel(ray: Ray, scene: &Scene, rng: &mut dyn RngCore) -> Color {
    trace_path(ray, scene, rng).color
}

/// Random stream for one row of one frame.
///
/// Rows never share a stream, so rows can be shaded in any order (or in
/// parallel) and still produce the same image for a given seed.
pub fn row_rng(seed: u64, frame: u64, row: u32) -> StdRng {
    let stream = frame
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(row as u64);
    StdRng::seed_from_u64(seed ^ stream)
}

/// Convert a linear color to packed RGBA8.
///
/// Channels are clamped to [0, 1] and rounded; alpha is always opaque.
/// The little-endian bytes of the result are `[r, g, b, a]`.
pub fn color_to_rgba(color: Color) -> u32 {
    let c = color.clamp(Color::ZERO, Color::ONE);
    let r = (c.x * 255.0).round() as u8;
    let g = (c.y * 255.0).round() as u8;
    let b = (c.z * 255.0).round() as u8;
    u32::from_le_bytes([r, g, b, 255])
}

/// Shade one row: add a fresh sample to each accumulator and write the
/// averaged, packed color.
fn render_row(
    scene: &Scene,
    origin: Vec3,
    directions: &[Vec3],
    accumulation_row: &mut [Color],
    image_row: &mut [u32],
    frame_index: u32,
    rng: &mut dyn RngCore,
) {
    let inv_frame = 1.0 / frame_index as f32;

    for ((direction, accumulated), pixel) in directions
        .iter()
        .zip(accumulation_row.iter_mut())
        .zip(image_row.iter_mut())
    {
        let color = per_pixel(Ray::new(origin, *direction), scene, rng);
        *accumulated += color;
        *pixel = color_to_rgba(*accumulated * inv_frame);
    }
}

/// The progressive renderer.
///
/// Owns the output image and the accumulation buffer; both are resized
/// only when the viewport size changes.
pub struct Renderer {
    pub settings: RenderSettings,

    width: u32,
    height: u32,
    image_data: Vec<u32>,
    accumulation: Vec<Color>,

    frame_index: u32,
    frames_rendered: u64,
}

impl Renderer {
    /// Create a renderer with empty buffers.
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            width: 0,
            height: 0,
            image_data: Vec::new(),
            accumulation: Vec::new(),
            frame_index: 1,
            frames_rendered: 0,
        }
    }

    /// Match the viewport size. No-op if the size is unchanged.
    ///
    /// Reallocated buffers start zeroed; the frame index is left alone.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }

        self.width = width;
        self.height = height;

        let pixel_count = width as usize * height as usize;
        self.image_data = vec![0; pixel_count];
        self.accumulation = vec![Color::ZERO; pixel_count];

        log::debug!("Render buffers resized to {}x{}", width, height);
    }

    /// Resize the camera and the render buffers together.
    ///
    /// A size change zeroes the accumulation buffer, so the frame index
    /// restarts with it.
    pub fn fit_viewport(&mut self, camera: &mut Camera, width: u32, height: u32) {
        camera.on_resize(width, height);

        if self.size() != (width, height) {
            self.on_resize(width, height);
            self.reset_frame_index();
        }
    }

    /// Restart accumulation on the next frame.
    pub fn reset_frame_index(&mut self) {
        self.frame_index = 1;
    }

    /// Render one frame of `scene` as seen by `camera`.
    ///
    /// The camera must already be resized to the renderer's viewport.
    pub fn render(&mut self, scene: &Scene, camera: &Camera) {
        let width = self.width as usize;
        let pixel_count = self.image_data.len();

        let (camera_width, camera_height) = camera.viewport_size();
        if pixel_count > 0 && (camera_width, camera_height) != (self.width, self.height) {
            log::warn!(
                "Camera viewport {}x{} does not match render buffers {}x{}, skipping frame",
                camera_width,
                camera_height,
                self.width,
                self.height
            );
            return;
        }

        if self.frame_index == 1 {
            self.accumulation.fill(Color::ZERO);
        }

        if pixel_count > 0 {
            let frame_index = self.frame_index;
            let frame = self.frames_rendered;
            let seed = self.settings.seed;
            let origin = camera.position();
            let directions = camera.ray_directions();

            let shade = |(y, (accumulation_row, image_row)): (usize, (&mut [Color], &mut [u32]))| {
                let mut rng = row_rng(seed, frame, y as u32);
                let row_directions = &directions[y * width..(y + 1) * width];
                render_row(
                    scene,
                    origin,
                    row_directions,
                    accumulation_row,
                    image_row,
                    frame_index,
                    &mut rng,
                );
            };

            if self.settings.parallel {
                self.accumulation
                    .par_chunks_mut(width)
                    .zip(self.image_data.par_chunks_mut(width))
                    .enumerate()
                    .for_each(shade);
            } else {
                self.accumulation
                    .chunks_mut(width)
                    .zip(self.image_data.chunks_mut(width))
                    .enumerate()
                    .for_each(shade);
            }
        }

        self.frames_rendered += 1;
        if self.settings.accumulate {
            self.frame_index += 1;
        } else {
            self.frame_index = 1;
        }
    }

    /// Packed RGBA8 pixels, row-major, row 0 = top.
    pub fn image(&self) -> &[u32] {
        &self.image_data
    }

    /// The same pixels as raw `[r, g, b, a]` bytes.
    pub fn image_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.image_data)
    }

    /// Running per-pixel sum of linear samples.
    pub fn accumulation(&self) -> &[Color] {
        &self.accumulation
    }

    /// Index the next frame will be averaged with.
    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    /// Total frames rendered since creation.
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(RenderSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_core::Sphere;

    fn single_sphere_scene(roughness: f32) -> Scene {
        let mut scene = Scene::new();
        let mat = scene.add_material(Material::new(Color::new(0.8, 0.3, 0.2), roughness));
        scene.add_sphere(Sphere::new(Vec3::ZERO, 1.0, mat));
        scene
    }

    fn camera_for(width: u32, height: u32) -> Camera {
        let mut camera = Camera::default();
        camera.on_resize(width, height);
        camera
    }

    /// Replays `frames` single-frame samples for every pixel, the same way
    /// `Renderer::render` draws them.
    fn expected_samples(scene: &Scene, camera: &Camera, seed: u64, frames: std::ops::Range<u64>) -> Vec<Vec<Color>> {
        let (width, height) = camera.viewport_size();
        frames
            .map(|frame| {
                let mut samples = Vec::with_capacity((width * height) as usize);
                for y in 0..height {
                    let mut rng = row_rng(seed, frame, y);
                    for x in 0..width {
                        let direction = camera.ray_directions()[(y * width + x) as usize];
                        let ray = Ray::new(camera.position(), direction);
                        samples.push(per_pixel(ray, scene, &mut rng));
                    }
                }
                samples
            })
            .collect()
    }

    #[test]
    fn test_color_to_rgba() {
        let packed = color_to_rgba(Color::new(1.0, 0.5, 0.0));
        assert_eq!(packed.to_le_bytes(), [255, 128, 0, 255]);

        // Out of range channels clamp
        let packed = color_to_rgba(Color::new(2.0, -1.0, 0.2));
        assert_eq!(packed.to_le_bytes(), [255, 0, 51, 255]);
    }

    #[test]
    fn test_miss_returns_background() {
        let mut scene = Scene::new();
        let mat = scene.add_material(Material::default());
        scene.add_sphere(Sphere::new(Vec3::ZERO, 0.5, mat));
        scene.add_sphere(Sphere::new(Vec3::new(0.0, 0.0, -0.1), 0.5, mat));

        let mut rng = StdRng::seed_from_u64(1);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Y);
        let sample = trace_path(ray, &scene, &mut rng);

        assert_eq!(sample.color, BACKGROUND);
        assert_eq!(sample.bounces, 1);
    }

    #[test]
    fn test_bounce_cutoff_between_mirrors() {
        let mut scene = Scene::new();
        let mirror = scene.add_material(Material::new(Color::ONE, 0.0));
        scene.add_sphere(Sphere::new(Vec3::new(0.0, 0.0, -3.0), 1.0, mirror));
        scene.add_sphere(Sphere::new(Vec3::new(0.0, 0.0, 3.0), 1.0, mirror));

        let mut rng = StdRng::seed_from_u64(7);
        let sample = trace_path(Ray::new(Vec3::ZERO, Vec3::NEG_Z), &scene, &mut rng);

        assert_eq!(sample.bounces, MAX_BOUNCES);
        assert!(sample.color.is_finite());

        // Only the +Z facing hits (1st, 3rd, 5th) see the light
        let lit = Vec3::Z.dot(-light_direction());
        let expected = lit * (1.0 + 0.25 + 0.0625);
        assert!((sample.color.x - expected).abs() < 1e-4);
    }

    #[test]
    fn test_emission_adds_to_hit() {
        let mut scene = Scene::new();
        let mat = scene.add_material(
            Material::new(Color::ZERO, 0.0).with_emission(Color::new(1.0, 0.0, 0.0), 2.0),
        );
        scene.add_sphere(Sphere::new(Vec3::ZERO, 1.0, mat));

        let mut rng = StdRng::seed_from_u64(3);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let sample = trace_path(ray, &scene, &mut rng);

        // Emission at full weight, then the reflection heads back out to the sky
        let expected = Color::new(2.0, 0.0, 0.0) + BACKGROUND * 0.5;
        assert!((sample.color - expected).length() < 1e-4);
        assert_eq!(sample.bounces, 2);
    }

    #[test]
    fn test_missing_material_falls_back() {
        let mut scene = Scene::new();
        scene.add_sphere(Sphere::new(Vec3::ZERO, 1.0, 42));

        let mut rng = StdRng::seed_from_u64(5);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let sample = trace_path(ray, &scene, &mut rng);

        assert!(sample.color.is_finite());
        assert!(sample.color.length() > 0.0);
    }

    #[test]
    fn test_resize_allocates_buffers() {
        let mut renderer = Renderer::default();
        renderer.on_resize(16, 9);

        assert_eq!(renderer.size(), (16, 9));
        assert_eq!(renderer.image().len(), 16 * 9);
        assert_eq!(renderer.image_bytes().len(), 16 * 9 * 4);
        assert_eq!(renderer.accumulation().len(), 16 * 9);
        assert_eq!(renderer.frame_index(), 1);
    }

    #[test]
    fn test_zero_size_render_is_harmless() {
        let scene = single_sphere_scene(0.5);
        let camera = camera_for(0, 0);
        let mut renderer = Renderer::default();
        renderer.on_resize(0, 0);

        renderer.render(&scene, &camera);

        assert!(renderer.image().is_empty());
        assert_eq!(renderer.frame_index(), 2);
    }

    #[test]
    fn test_accumulation_averages_frames() {
        let scene = single_sphere_scene(0.6);
        let camera = camera_for(8, 6);
        let settings = RenderSettings {
            accumulate: true,
            parallel: false,
            seed: 1234,
        };
        let mut renderer = Renderer::new(settings);
        renderer.on_resize(8, 6);

        const FRAMES: u32 = 4;
        for _ in 0..FRAMES {
            renderer.render(&scene, &camera);
        }
        assert_eq!(renderer.frame_index(), FRAMES + 1);

        let samples = expected_samples(&scene, &camera, 1234, 0..FRAMES as u64);
        for (i, pixel) in renderer.image().iter().enumerate() {
            let sum = samples.iter().fold(Color::ZERO, |acc, frame| acc + frame[i]);
            let mean = sum * (1.0 / FRAMES as f32);
            assert_eq!(*pixel, color_to_rgba(mean), "pixel {}", i);
        }
    }

    #[test]
    fn test_accumulation_disabled_uses_latest_sample_only() {
        let scene = single_sphere_scene(0.6);
        let camera = camera_for(8, 6);
        let settings = RenderSettings {
            accumulate: false,
            parallel: false,
            seed: 99,
        };
        let mut renderer = Renderer::new(settings);
        renderer.on_resize(8, 6);

        renderer.render(&scene, &camera);
        assert_eq!(renderer.frame_index(), 1);
        renderer.render(&scene, &camera);
        assert_eq!(renderer.frame_index(), 1);

        let samples = expected_samples(&scene, &camera, 99, 1..2);
        let expected: Vec<u32> = samples[0].iter().map(|c| color_to_rgba(*c)).collect();
        assert_eq!(renderer.image(), expected.as_slice());
    }

    #[test]
    fn test_reset_restarts_accumulation() {
        let scene = single_sphere_scene(0.6);
        let camera = camera_for(4, 4);
        let mut renderer = Renderer::new(RenderSettings {
            parallel: false,
            ..Default::default()
        });
        renderer.on_resize(4, 4);

        renderer.render(&scene, &camera);
        renderer.render(&scene, &camera);
        assert_eq!(renderer.frame_index(), 3);

        renderer.reset_frame_index();
        renderer.render(&scene, &camera);
        assert_eq!(renderer.frame_index(), 2);

        // Only the third frame's samples remain in the accumulator
        let samples = expected_samples(&scene, &camera, 0, 2..3);
        assert_eq!(renderer.accumulation(), samples[0].as_slice());
    }

    #[test]
    fn test_parallel_matches_serial() {
        let scene = Scene::showcase();
        let camera = camera_for(24, 16);

        let mut serial = Renderer::new(RenderSettings {
            parallel: false,
            seed: 5,
            ..Default::default()
        });
        let mut parallel = Renderer::new(RenderSettings {
            parallel: true,
            seed: 5,
            ..Default::default()
        });
        serial.on_resize(24, 16);
        parallel.on_resize(24, 16);

        for _ in 0..3 {
            serial.render(&scene, &camera);
            parallel.render(&scene, &camera);
        }

        assert_eq!(serial.image(), parallel.image());
    }

    #[test]
    fn test_mismatched_camera_skips_frame() {
        let scene = single_sphere_scene(0.5);
        let camera = camera_for(4, 4);
        let mut renderer = Renderer::default();
        renderer.on_resize(8, 8);

        renderer.render(&scene, &camera);

        assert_eq!(renderer.frames_rendered(), 0);
        assert!(renderer.image().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_resize_keeps_frame_index() {
        let scene = single_sphere_scene(0.5);
        let camera = camera_for(4, 4);
        let mut renderer = Renderer::new(RenderSettings {
            parallel: false,
            ..Default::default()
        });
        renderer.on_resize(4, 4);
        renderer.render(&scene, &camera);
        assert_eq!(renderer.frame_index(), 2);

        renderer.on_resize(4, 4);
        assert_eq!(renderer.frame_index(), 2);
    }

    #[test]
    fn test_fit_viewport_restarts_accumulation_on_size_change() {
        // Every sample is exactly the background, so any averaging error shows
        let scene = Scene::new();
        let mut camera = Camera::default();
        let mut renderer = Renderer::new(RenderSettings {
            parallel: false,
            ..Default::default()
        });

        renderer.fit_viewport(&mut camera, 8, 8);
        for _ in 0..9 {
            renderer.render(&scene, &camera);
        }
        assert_eq!(renderer.frame_index(), 10);

        renderer.fit_viewport(&mut camera, 10, 8);
        assert_eq!(renderer.frame_index(), 1);
        renderer.render(&scene, &camera);

        let background = color_to_rgba(BACKGROUND);
        assert_eq!(renderer.image().len(), 80);
        assert!(renderer.image().iter().all(|&p| p == background));
    }

    #[test]
    fn test_fit_viewport_same_size_keeps_accumulating() {
        let scene = Scene::new();
        let mut camera = Camera::default();
        let mut renderer = Renderer::default();

        renderer.fit_viewport(&mut camera, 4, 4);
        renderer.render(&scene, &camera);
        renderer.render(&scene, &camera);

        renderer.fit_viewport(&mut camera, 4, 4);
        assert_eq!(renderer.frame_index(), 3);
        assert_eq!(camera.viewport_size(), (4, 4));
    }
}
