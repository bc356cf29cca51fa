//! Collision router: единственный contact listener сессии
//!
//! Тело → entity через `BodyRegistry`, дальше dispatch по типу entity.
//! Каждая сторона контакта обрабатывается отдельно: снаряд реагирует на
//! то, во что попал, игрок считает static контакты и получает урон от врагов.

use std::time::Duration;

use crate::config::PlayerConfig;
use crate::enemy::EnemySet;
use crate::physics::{ContactBody, ContactEvent, ContactListener, ContactPhase, StepCommands};
use crate::player::PlayerActor;
use crate::projectile::{on_projectile_contact, ProjectileSet};
use crate::registry::{BodyRegistry, EntityId};
use crate::services::AudioBus;

pub(crate) struct CollisionRouter<'a> {
    pub registry: &'a BodyRegistry,
    pub player: &'a mut PlayerActor,
    pub projectiles: &'a mut ProjectileSet,
    pub enemies: &'a mut EnemySet,
    pub score: &'a mut u32,
    pub audio: &'a mut AudioBus,
    pub player_config: &'a PlayerConfig,
    /// Session time текущего кадра
    pub now: Duration,
}

impl CollisionRouter<'_> {
    fn dispatch(
        &mut self,
        phase: ContactPhase,
        this: Option<EntityId>,
        other_body: ContactBody,
        other: Option<EntityId>,
        commands: &mut StepCommands,
    ) {
        match this {
            Some(EntityId::Player) => self.player_contact(phase, other_body, other),
            Some(EntityId::Projectile(id)) if phase == ContactPhase::Begin => {
                on_projectile_contact(
                    self.projectiles,
                    id,
                    other,
                    self.enemies,
                    self.score,
                    self.audio,
                    commands,
                );
            }
            _ => {}
        }
    }

    fn player_contact(
        &mut self,
        phase: ContactPhase,
        other_body: ContactBody,
        other: Option<EntityId>,
    ) {
        if other_body.is_static {
            match phase {
                ContactPhase::Begin => self.player.contacts.begin(),
                ContactPhase::End => self.player.contacts.end(),
            }
        }

        let Some(EntityId::Enemy(enemy_id)) = other else {
            return;
        };
        if phase != ContactPhase::Begin {
            return;
        }
        let attacker_active = self
            .enemies
            .get(enemy_id)
            .is_some_and(|enemy| enemy.state.is_active());
        if !attacker_active {
            return;
        }

        if let Some(cue) = self.player.hurt(self.now, self.player_config) {
            self.audio.play(cue, None);
        }
    }
}

impl ContactListener for CollisionRouter<'_> {
    fn on_contact(&mut self, contact: &ContactEvent, commands: &mut StepCommands) {
        let a = self.registry.lookup(contact.a.handle);
        let b = self.registry.lookup(contact.b.handle);

        self.dispatch(contact.phase, a, contact.b, b, commands);
        self.dispatch(contact.phase, b, contact.a, a, commands);
    }
}
