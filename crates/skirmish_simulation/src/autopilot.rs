//! Seeded input driver для headless прогонов
//!
//! Заменяет игрока: случайно (но детерминированно через `DeterministicRng`)
//! зажимает клавиши, крутит камеру, стреляет и прыгает.

use bevy::prelude::*;
use rand::Rng;

use crate::plugin::{drive_session, PlayerInput};
use crate::DeterministicRng;

/// Вероятности действий за кадр
#[derive(Resource, Debug, Clone)]
pub struct AutopilotConfig {
    pub fire_chance: f64,
    pub jump_chance: f64,
    /// Как часто меняется набор зажатых клавиш
    pub retarget_chance: f64,
    /// Максимальный pointer delta по X за кадр (пиксели)
    pub max_turn: f32,
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            fire_chance: 0.2,
            jump_chance: 0.02,
            retarget_chance: 0.05,
            max_turn: 40.0,
        }
    }
}

pub struct AutopilotPlugin;

impl Plugin for AutopilotPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AutopilotConfig>()
            .add_systems(Update, autopilot_input.before(drive_session));
    }
}

/// Заполнить `PlayerInput` на текущий кадр
pub fn autopilot_input(
    config: Res<AutopilotConfig>,
    mut rng: ResMut<DeterministicRng>,
    mut input: ResMut<PlayerInput>,
) {
    let rng = &mut rng.rng;

    input.start = true;
    input.movement.pointer_locked = true;

    if rng.gen_bool(config.retarget_chance) {
        input.movement.forward = rng.gen_bool(0.7);
        input.movement.back = !input.movement.forward && rng.gen_bool(0.3);
        input.movement.left = rng.gen_bool(0.3);
        input.movement.right = !input.movement.left && rng.gen_bool(0.3);
    }

    let turn = rng.gen_range(-config.max_turn..=config.max_turn);
    input.look_delta = Vec2::new(turn, 0.0);
    input.fire = rng.gen_bool(config.fire_chance);
    input.jump = rng.gen_bool(config.jump_chance);
}
