//! Skirmish Simulation Core
//!
//! Real-time simulation loop для arena shooter:
//! input → physics forces → fixed step → collision events → mark/defer
//! removal → render sync.
//!
//! Архитектура:
//! - `Session` владеет физическим миром, коллекциями и collaborators
//! - `PhysicsWorld` trait: rapier backend (игра) + scripted backend (тесты)
//! - Bevy = host (`SimulationPlugin`, headless app, детерминированный RNG)

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod actor;
pub mod autopilot;
pub mod clock;
pub mod config;
pub mod enemy;
pub mod logger;
pub mod physics;
pub mod player;
pub mod plugin;
pub mod projectile;
pub mod registry;
pub mod render_sync;
pub mod services;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

// Re-export для удобства
pub use actor::{Health, Lifecycle};
pub use autopilot::{AutopilotConfig, AutopilotPlugin};
pub use config::{ConfigError, GameConfig};
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, log_with_level, set_log_level, set_logger,
    set_logger_if_needed, ConsoleLogger, LogLevel, LogPrinter,
};
pub use physics::{PhysicsWorld, RapierWorld, ScriptedWorld};
pub use player::InputState;
pub use plugin::{ActiveSession, PlayerInput, ScoreChanged, SessionEnded, SimulationPlugin};
pub use registry::{EnemyId, EntityId, ProjectileId};
pub use services::Services;
pub use session::{EndReason, FrameReport, Session, SessionSnapshot, SessionState};

/// Шаг виртуального времени headless app (60 Hz)
pub const HEADLESS_FRAME: f32 = 1.0 / 60.0;

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время виртуальное: каждый `app.update()` продвигает ровно `HEADLESS_FRAME`.
/// Session и плагины добавляет вызывающий код.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
            HEADLESS_FRAME,
        )));

    app
}
