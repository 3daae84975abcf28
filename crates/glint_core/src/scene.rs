//! Scene types for Glint.
//!
//! A scene is plain data: a list of spheres and a list of materials the
//! spheres refer to by index. The renderer only ever reads it; editing
//! happens by direct field mutation from the viewer UI.

use glint_math::{Color, Vec3};
use thiserror::Error;

/// Errors reported by [`Scene::validate`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("Sphere {index} has invalid radius {radius}")]
    InvalidRadius { index: usize, radius: f32 },

    #[error("Sphere {index} references material {material_index}, but the scene has {material_count} materials")]
    MissingMaterial {
        index: usize,
        material_index: usize,
        material_count: usize,
    },
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// Surface description shared by any number of spheres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    /// Diffuse reflectance (RGB, 0-1)
    pub albedo: Color,

    /// Roughness factor (0=mirror, 1=fully scattered)
    pub roughness: f32,

    /// Metallic factor (0=dielectric, 1=metal)
    pub metallic: f32,

    /// Emitted color (RGB, for light-emitting surfaces)
    pub emission_color: Color,

    /// Scale applied to `emission_color`
    pub emission_power: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            albedo: Color::ONE,
            roughness: 1.0,
            metallic: 0.0,
            emission_color: Color::ZERO,
            emission_power: 0.0,
        }
    }
}

impl Material {
    /// Create a non-emissive material with the given albedo and roughness.
    pub fn new(albedo: Color, roughness: f32) -> Self {
        Self {
            albedo,
            roughness,
            ..Default::default()
        }
    }

    /// Make this material emit `color * power`.
    pub fn with_emission(mut self, color: Color, power: f32) -> Self {
        self.emission_color = color;
        self.emission_power = power;
        self
    }

    /// Emitted radiance.
    pub fn emission(&self) -> Color {
        self.emission_color * self.emission_power
    }

    /// Check if this material emits any light.
    pub fn is_emissive(&self) -> bool {
        self.emission().length_squared() > 0.0
    }
}

/// A sphere in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
    pub position: Vec3,
    pub radius: f32,
    /// Index into [`Scene::materials`]
    pub material_index: usize,
}

impl Default for Sphere {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            radius: 0.5,
            material_index: 0,
        }
    }
}

impl Sphere {
    /// Create a new sphere.
    pub fn new(position: Vec3, radius: f32, material_index: usize) -> Self {
        Self {
            position,
            radius,
            material_index,
        }
    }
}

/// A complete scene: spheres plus the materials they reference.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    pub spheres: Vec<Sphere>,
    pub materials: Vec<Material>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// The three-sphere scene the viewer starts with: a pink mirror ball,
    /// a huge blue ground sphere and an orange light.
    pub fn showcase() -> Self {
        let mut scene = Self::new();

        let pink = scene.add_material(Material::new(Color::new(1.0, 0.0, 1.0), 0.0));
        let blue = scene.add_material(Material::new(Color::new(0.2, 0.3, 1.0), 0.1));
        let orange_color = Color::new(0.8, 0.5, 0.2);
        let orange = scene.add_material(
            Material::new(orange_color, 0.1).with_emission(orange_color, 2.0),
        );

        scene.add_sphere(Sphere::new(Vec3::ZERO, 1.0, pink));
        scene.add_sphere(Sphere::new(Vec3::new(0.0, -101.0, 0.0), 100.0, blue));
        scene.add_sphere(Sphere::new(Vec3::new(2.0, 0.0, 0.0), 1.0, orange));

        scene
    }

    /// Add a sphere and return its index.
    pub fn add_sphere(&mut self, sphere: Sphere) -> usize {
        let index = self.spheres.len();
        self.spheres.push(sphere);
        index
    }

    /// Add a material and return its index.
    pub fn add_material(&mut self, material: Material) -> usize {
        let index = self.materials.len();
        self.materials.push(material);
        index
    }

    /// Get the material a sphere refers to, if the index resolves.
    pub fn material_for(&self, sphere: &Sphere) -> Option<&Material> {
        self.materials.get(sphere.material_index)
    }

    /// Check every sphere has a positive radius and a resolvable material.
    ///
    /// Returns the first problem found, in sphere order.
    pub fn validate(&self) -> SceneResult<()> {
        for (index, sphere) in self.spheres.iter().enumerate() {
            if !sphere.radius.is_finite() || sphere.radius <= 0.0 {
                return Err(SceneError::InvalidRadius {
                    index,
                    radius: sphere.radius,
                });
            }
            if sphere.material_index >= self.materials.len() {
                return Err(SceneError::MissingMaterial {
                    index,
                    material_index: sphere.material_index,
                    material_count: self.materials.len(),
                });
            }
        }
        Ok(())
    }
}
