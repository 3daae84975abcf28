// Re-export glam for convenience
pub use glam::*;

// Glint math types
mod ray;
pub use ray::Ray;

/// Color type alias (linear RGB, typically 0-1)
pub type Color = Vec3;

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}
