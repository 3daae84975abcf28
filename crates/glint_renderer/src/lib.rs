//! Glint Renderer - progressive CPU path tracing.
//!
//! One ray per pixel per frame, averaged across frames while the camera is
//! still. The [`Camera`] caches per-pixel ray directions; the [`Renderer`]
//! owns the accumulation and output buffers.

mod camera;
mod hit;
mod renderer;

pub use camera::{Camera, CameraInput, CursorMode, MoveKey};
pub use hit::{trace_ray, HitPayload};
pub use renderer::{
    color_to_rgba, light_direction, per_pixel, row_rng, trace_path, PathSample, RenderSettings,
    Renderer, BACKGROUND, BOUNCE_ATTENUATION, MAX_BOUNCES, SURFACE_EPSILON,
};

/// Re-export the scene and math types the renderer works with
pub use glint_core::{Material, Scene, Sphere};
pub use glint_math::{Color, Ray, Vec3};
