//! Mouse look: yaw → контейнер камеры, pitch → сама камера

use std::f32::consts::FRAC_PI_2;

use bevy::math::{EulerRot, Quat, Vec2, Vec3};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LookState {
    pub yaw: f32,
    /// Всегда в [-π/2, π/2]
    pub pitch: f32,
}

impl LookState {
    /// Накопить pointer delta (пиксели × sensitivity → радианы)
    pub fn apply(&mut self, delta: Vec2, sensitivity: f32) {
        self.yaw -= delta.x * sensitivity;
        self.pitch = (self.pitch - delta.y * sensitivity).clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    /// Поворот контейнера камеры (только yaw)
    pub fn body_rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw)
    }

    /// Полный поворот камеры (yaw контейнера + pitch камеры)
    pub fn camera_rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Направление взгляда в мировых координатах
    pub fn view_direction(&self) -> Vec3 {
        self.camera_rotation() * Vec3::NEG_Z
    }
}
