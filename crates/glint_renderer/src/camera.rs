//! Interactive fly camera with a cached per-pixel ray-direction table.
//!
//! Ray directions are expensive relative to a single bounce, so they are
//! computed once per pose/viewport change and reused every frame in between.

use glint_math::{Mat4, Quat, Vec2, Vec3, Vec4};

/// Translation speed in world units per second.
const MOVE_SPEED: f32 = 5.0;
/// Radians of rotation per unit of scaled pointer delta.
const ROTATION_SPEED: f32 = 0.3;
/// Scale applied to raw pointer deltas (window pixels).
const MOUSE_SENSITIVITY: f32 = 0.002;

const WORLD_UP: Vec3 = Vec3::Y;

/// Largest |forward.y| pitching may reach; the view basis needs a horizontal component.
const MAX_PITCH_Y: f32 = 0.999;

/// Keys the camera polls while the look button is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKey {
    Forward,
    Backward,
    Left,
    Right,
    Down,
    Up,
}

/// Pointer capture state requested by the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorMode {
    #[default]
    Normal,
    /// Confined to the window and hidden
    Locked,
}

/// Input polled by [`Camera::on_update`].
///
/// Implemented by the windowing layer; tests use a scripted version.
pub trait CameraInput {
    /// Pointer position in window coordinates.
    fn mouse_position(&self) -> Vec2;

    /// Whether the camera-control button is held.
    fn is_look_button_down(&self) -> bool;

    /// Whether a movement key is held.
    fn is_key_down(&self, key: MoveKey) -> bool;

    /// Request a pointer capture mode.
    fn set_cursor_mode(&mut self, mode: CursorMode);
}

/// Perspective fly camera.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    forward_direction: Vec3,

    vertical_fov: f32, // degrees
    near_clip: f32,
    far_clip: f32,

    viewport_width: u32,
    viewport_height: u32,

    projection: Mat4,
    inverse_projection: Mat4,
    view: Mat4,
    inverse_view: Mat4,

    // Cached world-space ray directions, row-major, row 0 = top
    ray_directions: Vec<Vec3>,

    last_mouse_position: Vec2,
}

impl Camera {
    /// Create a camera at (0, 0, 6) looking down -Z.
    ///
    /// The ray-direction cache stays empty until the first [`Camera::on_resize`].
    pub fn new(vertical_fov: f32, near_clip: f32, far_clip: f32) -> Self {
        let mut camera = Self {
            position: Vec3::new(0.0, 0.0, 6.0),
            forward_direction: Vec3::NEG_Z,
            vertical_fov,
            near_clip,
            far_clip,
            viewport_width: 0,
            viewport_height: 0,
            projection: Mat4::IDENTITY,
            inverse_projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            inverse_view: Mat4::IDENTITY,
            ray_directions: Vec::new(),
            last_mouse_position: Vec2::ZERO,
        };
        camera.recalculate_view();
        camera
    }

    /// Place the camera and aim it along `forward`.
    ///
    /// Refreshes the view matrix and, if a viewport is set, the ray cache.
    pub fn with_pose(mut self, position: Vec3, forward: Vec3) -> Self {
        self.position = position;
        self.forward_direction = forward.try_normalize().unwrap_or(Vec3::NEG_Z);
        self.recalculate_view();
        self.recalculate_ray_directions();
        self
    }

    /// Poll input and fly the camera.
    ///
    /// Returns true if the camera moved or rotated, in which case the view
    /// and ray directions have already been recomputed and any accumulated
    /// samples are stale.
    pub fn on_update(&mut self, ts: f32, input: &mut dyn CameraInput) -> bool {
        let mouse_pos = input.mouse_position();
        let delta = (mouse_pos - self.last_mouse_position) * MOUSE_SENSITIVITY;
        self.last_mouse_position = mouse_pos;

        if !input.is_look_button_down() {
            input.set_cursor_mode(CursorMode::Normal);
            return false;
        }

        input.set_cursor_mode(CursorMode::Locked);

        let mut moved = false;

        let right_direction = self.right_direction();

        let step = MOVE_SPEED * ts;

        // Movement
        if input.is_key_down(MoveKey::Forward) {
            self.position += self.forward_direction * step;
            moved = true;
        } else if input.is_key_down(MoveKey::Backward) {
            self.position -= self.forward_direction * step;
            moved = true;
        }
        if input.is_key_down(MoveKey::Left) {
            self.position -= right_direction * step;
            moved = true;
        } else if input.is_key_down(MoveKey::Right) {
            self.position += right_direction * step;
            moved = true;
        }
        if input.is_key_down(MoveKey::Down) {
            self.position -= WORLD_UP * step;
            moved = true;
        } else if input.is_key_down(MoveKey::Up) {
            self.position += WORLD_UP * step;
            moved = true;
        }

        // Rotation
        if delta.x != 0.0 || delta.y != 0.0 {
            let pitch_delta = delta.y * ROTATION_SPEED;
            let yaw_delta = delta.x * ROTATION_SPEED;

            let yaw = Quat::from_axis_angle(WORLD_UP, -yaw_delta);
            let q = (Quat::from_axis_angle(right_direction, -pitch_delta) * yaw).normalize();
            let rotated = (q * self.forward_direction).normalize();
            let yawed = (yaw * self.forward_direction).normalize();

            // Drop a pitch step that would carry forward over or too close to a pole
            let flipped = rotated.x * yawed.x + rotated.z * yawed.z < 0.0;
            let toward_pole = rotated.y.abs() > self.forward_direction.y.abs();
            let too_steep = rotated.y.abs() > MAX_PITCH_Y && toward_pole;
            self.forward_direction = if flipped || too_steep { yawed } else { rotated };

            moved = true;
        }

        if moved {
            self.recalculate_view();
            self.recalculate_ray_directions();
        }

        moved
    }

    /// Match the viewport size. No-op if the size is unchanged.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        if width == self.viewport_width && height == self.viewport_height {
            return;
        }

        self.viewport_width = width;
        self.viewport_height = height;

        if width == 0 || height == 0 {
            self.ray_directions.clear();
            return;
        }

        self.recalculate_projection();
        self.recalculate_ray_directions();
        log::debug!("Camera viewport resized to {}x{}", width, height);
    }

    /// Camera right vector. Falls back to world X when looking straight up or down.
    fn right_direction(&self) -> Vec3 {
        self.forward_direction
            .cross(WORLD_UP)
            .try_normalize()
            .unwrap_or(Vec3::X)
    }

    /// Up vector for the view matrix, kept off the forward axis.
    fn up_direction(&self) -> Vec3 {
        if self.forward_direction.cross(WORLD_UP).length_squared() > 1e-12 {
            WORLD_UP
        } else {
            self.right_direction().cross(self.forward_direction)
        }
    }

    fn recalculate_projection(&mut self) {
        let aspect = self.viewport_width as f32 / self.viewport_height as f32;
        self.projection = Mat4::perspective_rh(
            self.vertical_fov.to_radians(),
            aspect,
            self.near_clip,
            self.far_clip,
        );
        self.inverse_projection = self.projection.inverse();
    }

    fn recalculate_view(&mut self) {
        self.view = Mat4::look_at_rh(
            self.position,
            self.position + self.forward_direction,
            self.up_direction(),
        );
        self.inverse_view = self.view.inverse();
    }

    fn recalculate_ray_directions(&mut self) {
        let width = self.viewport_width as usize;
        let height = self.viewport_height as usize;

        self.ray_directions.clear();
        if width == 0 || height == 0 {
            return;
        }
        self.ray_directions.reserve(width * height);

        for y in 0..height {
            for x in 0..width {
                // Row 0 maps to the top of the view (+1 in NDC)
                let ndc_x = x as f32 / width as f32 * 2.0 - 1.0;
                let ndc_y = 1.0 - y as f32 / height as f32 * 2.0;

                let target = self.inverse_projection * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
                let view_dir = (target.truncate() / target.w).normalize();

                // Rotation only: directions ignore the camera translation
                let ray_direction = self.inverse_view.transform_vector3(view_dir);
                self.ray_directions.push(ray_direction);
            }
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn direction(&self) -> Vec3 {
        self.forward_direction
    }

    pub fn vertical_fov(&self) -> f32 {
        self.vertical_fov
    }

    pub fn viewport_size(&self) -> (u32, u32) {
        (self.viewport_width, self.viewport_height)
    }

    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    pub fn inverse_projection(&self) -> &Mat4 {
        &self.inverse_projection
    }

    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    pub fn inverse_view(&self) -> &Mat4 {
        &self.inverse_view
    }

    /// World-space unit ray direction for every pixel, row-major, row 0 = top.
    pub fn ray_directions(&self) -> &[Vec3] {
        &self.ray_directions
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(45.0, 0.1, 100.0)
    }
}
