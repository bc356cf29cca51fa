//! Body registry: `BodyHandle → EntityId`
//!
//! Вместо user-data слота внутри физического тела держим явную карту
//! рядом с миром. Регистрация = подписка entity на свои контакты;
//! `unregister` отключает listener (вызывается только в deferred removal).

use std::collections::HashMap;

use crate::physics::BodyHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(pub u32);

/// Чем является тело для игровой логики
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityId {
    Player,
    Ground,
    Obstacle(u32),
    Projectile(ProjectileId),
    Enemy(EnemyId),
}

#[derive(Debug, Default)]
pub struct BodyRegistry {
    entries: HashMap<BodyHandle, EntityId>,
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, body: BodyHandle, entity: EntityId) {
        if let Some(previous) = self.entries.insert(body, entity) {
            crate::log_warning(&format!(
                "Body {:?} re-registered: {:?} → {:?}",
                body, previous, entity
            ));
        }
    }

    pub fn unregister(&mut self, body: BodyHandle) -> Option<EntityId> {
        self.entries.remove(&body)
    }

    pub fn lookup(&self, body: BodyHandle) -> Option<EntityId> {
        self.entries.get(&body).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
