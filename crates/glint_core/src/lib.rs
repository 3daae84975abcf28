//! Glint Core - Scene description for the Glint path tracer.
//!
//! This crate provides:
//!
//! - **Scene types**: `Scene`, `Sphere`, `Material`
//! - **Validation**: `Scene::validate` and the `SceneError` it reports
//!
//! # Example
//!
//! ```
//! use glint_core::{Material, Scene, Sphere};
//! use glint_math::Vec3;
//!
//! let mut scene = Scene::new();
//! let red = scene.add_material(Material::new(Vec3::new(1.0, 0.0, 0.0), 0.2));
//! scene.add_sphere(Sphere::new(Vec3::ZERO, 1.0, red));
//! assert!(scene.validate().is_ok());
//! ```

pub mod scene;

// Re-export commonly used types
pub use scene::{Material, Scene, SceneError, SceneResult, Sphere};
