//! Player controller: input + camera basis + grounded → velocity command
//!
//! Чистые функции без доступа к физическому миру. Session читает velocity
//! тела, прогоняет через `compute_velocity` и пишет результат обратно
//! (один раз за кадр, до physics step).

use bevy::math::Vec3;

use crate::config::PlayerConfig;

/// Нажатые клавиши движения + состояние pointer lock
///
/// Core не видит сырых событий платформы: только этот "is pressed" срез.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputState {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub pointer_locked: bool,
}

impl InputState {
    pub fn any_movement(&self) -> bool {
        self.forward || self.back || self.left || self.right
    }
}

/// Горизонтальный базис камеры (проекция yaw на плоскость XZ)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub forward: Vec3,
    pub right: Vec3,
}

impl CameraBasis {
    /// yaw = 0 смотрит в -Z (right = +X)
    pub fn from_yaw(yaw: f32) -> Self {
        let (sin, cos) = yaw.sin_cos();
        Self {
            forward: Vec3::new(-sin, 0.0, -cos),
            right: Vec3::new(cos, 0.0, -sin),
        }
    }

    /// Нормализованное направление по нажатым клавишам (ZERO если нет / взаимно гасятся)
    pub fn direction(&self, input: &InputState) -> Vec3 {
        let mut dir = Vec3::ZERO;
        if input.forward {
            dir += self.forward;
        }
        if input.back {
            dir -= self.forward;
        }
        if input.right {
            dir += self.right;
        }
        if input.left {
            dir -= self.right;
        }
        dir.normalize_or_zero()
    }
}

/// Новая linear velocity игрока
///
/// - есть ввод: base speed (на земле) или speed × air_control (в воздухе)
/// - нет ввода в воздухе: горизонталь × air_deceleration (экспоненциальное затухание)
/// - нет ввода на земле: без изменений (трение: забота физики)
///
/// Y компонента всегда возвращается как есть.
pub fn compute_velocity(
    input: &InputState,
    basis: &CameraBasis,
    grounded: bool,
    current: Vec3,
    config: &PlayerConfig,
) -> Vec3 {
    let direction = basis.direction(input);

    if direction != Vec3::ZERO {
        let speed = if grounded {
            config.speed
        } else {
            config.speed * config.air_control
        };
        return Vec3::new(direction.x * speed, current.y, direction.z * speed);
    }

    if grounded {
        current
    } else {
        Vec3::new(
            current.x * config.air_deceleration,
            current.y,
            current.z * config.air_deceleration,
        )
    }
}

/// Импульс прыжка, если игрок стоит хотя бы на одном static теле
pub fn try_jump(grounded: bool, config: &PlayerConfig) -> Option<Vec3> {
    grounded.then(|| Vec3::Y * config.jump_impulse)
}

/// Горизонтальное ограничение арены (игрок и враги)
///
/// Позиция за пределами ±half_extent по X/Z прижимается к границе; скорость
/// по оси обнуляется только если направлена наружу. `None`: clamp не нужен.
pub fn clamp_to_arena(position: Vec3, velocity: Vec3, half_extent: f32) -> Option<(Vec3, Vec3)> {
    let mut position = position;
    let mut velocity = velocity;
    let mut clamped = false;

    for axis in [0, 2] {
        if position[axis] > half_extent {
            position[axis] = half_extent;
            if velocity[axis] > 0.0 {
                velocity[axis] = 0.0;
            }
            clamped = true;
        } else if position[axis] < -half_extent {
            position[axis] = -half_extent;
            if velocity[axis] < 0.0 {
                velocity[axis] = 0.0;
            }
            clamped = true;
        }
    }

    clamped.then_some((position, velocity))
}
