use glam::{Mat4, Vec3};

use crate::input::KeySet;

/// A first-person camera: a position plus yaw/pitch in degrees.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(-7.0, 2.0, 0.0),
            yaw: 0.0,
            pitch: 0.0,
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Camera {
    pub const MAX_PITCH: f32 = 89.0;

    /// Unit vector the camera looks along.
    pub fn front(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.front().cross(Vec3::Y).normalize()
    }

    pub fn up(&self) -> Vec3 {
        self.right().cross(self.front()).normalize()
    }

    /// Applies a mouse-look delta; pitch is clamped so the view never flips.
    pub fn rotate(&mut self, d_yaw: f32, d_pitch: f32) {
        self.yaw += d_yaw;
        self.pitch = (self.pitch - d_pitch).clamp(-Self::MAX_PITCH, Self::MAX_PITCH);
    }

    /// World -> View
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front(), Vec3::Y)
    }

    /// View -> Clip (perspective, depth in [0, 1])
    pub fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            aspect_ratio,
            self.near,
            self.far,
        )
    }
}

/// Moves a [`Camera`] from held keys.
#[derive(Clone, Debug)]
pub struct FlyController {
    /// World units per millisecond.
    pub move_speed: f32,
    /// Degrees per pixel of mouse travel.
    pub sensitivity: f32,
    pub speed_multiplier: f32,
}

impl Default for FlyController {
    fn default() -> Self {
        Self {
            move_speed: 0.004,
            sensitivity: 0.15,
            speed_multiplier: 3.0,
        }
    }
}

impl FlyController {
    pub fn look(&self, camera: &mut Camera, dx: f32, dy: f32) {
        camera.rotate(dx * self.sensitivity, dy * self.sensitivity);
    }

    pub fn update(&self, camera: &mut Camera, keys: KeySet, delta_ms: f32) {
        let (front, right, up) = (camera.front(), camera.right(), camera.up());

        let mut direction = Vec3::ZERO;
        if keys.contains(KeySet::FORWARD) {
            direction += front;
        }
        if keys.contains(KeySet::BACKWARD) {
            direction -= front;
        }
        if keys.contains(KeySet::LEFT) {
            direction -= right;
        }
        if keys.contains(KeySet::RIGHT) {
            direction += right;
        }
        if keys.contains(KeySet::DOWN) {
            direction -= up;
        }
        if keys.contains(KeySet::UP) {
            direction += up;
        }

        let mut speed = self.move_speed * delta_ms;
        if keys.contains(KeySet::FAST) {
            speed *= self.speed_multiplier;
        }
        if keys.contains(KeySet::SLOW) {
            speed /= self.speed_multiplier;
        }

        if direction.length_squared() > 0.0 {
            camera.position += direction.normalize() * speed;
        }
    }
}
