//! Ray-scene intersection.
//!
//! A flat linear scan over the scene's spheres; scenes are small enough that
//! an acceleration structure would cost more than it saves.

use glint_core::Scene;
use glint_math::{Ray, Vec3};

/// Result of a ray-scene query.
///
/// A miss is signalled by `hit_distance < 0.0`; the other fields are
/// meaningless in that case.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitPayload {
    /// Ray parameter of the hit
    pub hit_distance: f32,
    /// World-space hit point
    pub world_position: Vec3,
    /// World-space unit outward normal
    pub world_normal: Vec3,
    /// Index of the hit sphere in `Scene::spheres`
    pub object_index: usize,
}

impl HitPayload {
    /// The miss sentinel.
    pub fn miss() -> Self {
        Self {
            hit_distance: -1.0,
            world_position: Vec3::ZERO,
            world_normal: Vec3::ZERO,
            object_index: 0,
        }
    }

    #[inline]
    pub fn is_hit(&self) -> bool {
        self.hit_distance >= 0.0
    }
}

/// Find the nearest sphere in front of the ray origin.
///
/// Only the near root of each sphere is considered, so rays starting inside
/// a sphere do not hit it. On an exact distance tie the sphere listed first
/// wins.
pub fn trace_ray(ray: &Ray, scene: &Scene) -> HitPayload {
    let a = ray.direction.length_squared();
    // A zero direction would divide by zero below
    if !(a > 0.0 && a.is_finite()) {
        return HitPayload::miss();
    }

    let mut closest_sphere = None;
    let mut hit_distance = f32::MAX;

    for (index, sphere) in scene.spheres.iter().enumerate() {
        let origin = ray.origin - sphere.position;

        // (d.d) t^2 + 2 (o.d) t + (o.o - r^2) = 0
        let b = 2.0 * origin.dot(ray.direction);
        let c = origin.length_squared() - sphere.radius * sphere.radius;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            continue;
        }

        let closest_t = (-b - discriminant.sqrt()) / (2.0 * a);
        if closest_t > 0.0 && closest_t < hit_distance {
            hit_distance = closest_t;
            closest_sphere = Some(index);
        }
    }

    match closest_sphere {
        Some(index) => closest_hit(ray, hit_distance, index, scene),
        None => HitPayload::miss(),
    }
}

fn closest_hit(ray: &Ray, hit_distance: f32, object_index: usize, scene: &Scene) -> HitPayload {
    let sphere = &scene.spheres[object_index];

    // Work relative to the sphere, then move back into world space
    let origin = ray.origin - sphere.position;
    let local_position = origin + ray.direction * hit_distance;
    let world_normal = local_position.normalize();

    HitPayload {
        hit_distance,
        world_position: local_position + sphere.position,
        world_normal,
        object_index,
    }
}
