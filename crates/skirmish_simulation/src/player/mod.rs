//! Player domain: единственный управляемый актор сессии
//!
//! Содержит:
//! - controller: input → velocity, прыжок, boundary clamp
//! - look: yaw/pitch камеры
//! - PlayerActor: body + visuals + контакты + здоровье

pub mod controller;
pub mod look;


pub use controller::{clamp_to_arena, compute_velocity, try_jump, CameraBasis, InputState};
pub use look::LookState;

use std::time::Duration;

use bevy::math::Vec3;

use crate::actor::Health;
use crate::clock::seconds;
use crate::config::PlayerConfig;
use crate::physics::{BodyHandle, ContactCounter};
use crate::services::{SoundCue, VisualHandle};

/// Игрок: один на сессию, живёт от build до teardown
#[derive(Debug, Clone)]
pub struct PlayerActor {
    pub body: BodyHandle,
    pub visual: VisualHandle,
    pub camera: VisualHandle,
    pub contacts: ContactCounter,
    pub look: LookState,
    pub health: Health,
    /// Session time, до которого контакт с врагом не наносит урон
    pub invulnerable_until: Duration,
}

impl PlayerActor {
    pub fn new(
        body: BodyHandle,
        visual: VisualHandle,
        camera: VisualHandle,
        config: &PlayerConfig,
    ) -> Self {
        Self {
            body,
            visual,
            camera,
            contacts: ContactCounter::new(),
            look: LookState::default(),
            health: Health::new(config.max_health),
            invulnerable_until: Duration::ZERO,
        }
    }

    pub fn is_grounded(&self) -> bool {
        self.contacts.is_grounded()
    }

    /// Позиция глаз (камеры) относительно центра тела
    pub fn eye_position(&self, body_position: Vec3, config: &PlayerConfig) -> Vec3 {
        body_position + Vec3::Y * config.eye_height
    }

    /// Контактный урон от врага (с окном неуязвимости)
    ///
    /// Возвращает звук, который нужно проиграть, или `None` если удар
    /// пришёлся на окно неуязвимости.
    pub fn hurt(&mut self, now: Duration, config: &PlayerConfig) -> Option<SoundCue> {
        if now < self.invulnerable_until || !self.health.is_alive() {
            return None;
        }

        self.health.take_damage(1);
        self.invulnerable_until = now.saturating_add(seconds(config.hit_cooldown));
        crate::log(&format!(
            "💥 Player hurt: {}/{} HP",
            self.health.current, self.health.max
        ));
        Some(SoundCue::Hurt)
    }
}
