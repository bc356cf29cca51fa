//! Projectile subsystem
//!
//! Lifecycle: `Active → MarkedForRemoval → Removed`.
//! - fire: body + visual + регистрация в BodyRegistry
//! - aging pass (до step): lifetime / range / bounds / depth
//! - contact (внутри step): любой solid surface помечает снаряд
//! - deferred removal (после step): единственное место, где снаряд уничтожается

use std::collections::BTreeMap;
use std::time::Duration;

use bevy::math::{Quat, Vec3};
use bevy::prelude::Transform;

use crate::actor::Lifecycle;
use crate::clock::seconds;
use crate::config::{ArenaConfig, ProjectileConfig};
use crate::enemy::{damage_enemy, EnemySet};
use crate::physics::{
    BodyDesc, BodyHandle, BodyShape, CollisionLayer, PhysicsWorld, StepCommands,
};
use crate::registry::{BodyRegistry, EntityId, ProjectileId};
use crate::services::{AssetCatalog, AudioBus, Scene, SoundCue, VisualHandle, VisualKind};

#[cfg(test)]
mod projectile_tests;

#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: ProjectileId,
    pub body: BodyHandle,
    pub visual: VisualHandle,
    /// Session time выстрела
    pub created_at: Duration,
    pub origin: Vec3,
    pub state: Lifecycle,
}

/// Почему снаряд помечен в aging pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpireReason {
    Lifetime,
    Range,
    OutOfBounds,
    BelowKillDepth,
}

impl Projectile {
    /// Первое сработавшее условие истечения (порядок проверок фиксирован)
    pub fn expire_reason(
        &self,
        position: Vec3,
        now: Duration,
        config: &ProjectileConfig,
        arena: &ArenaConfig,
    ) -> Option<ExpireReason> {
        if now.saturating_sub(self.created_at) >= seconds(config.lifetime) {
            Some(ExpireReason::Lifetime)
        } else if position.distance(self.origin) > config.max_range {
            Some(ExpireReason::Range)
        } else if position.x.abs() > arena.half_extent || position.z.abs() > arena.half_extent {
            Some(ExpireReason::OutOfBounds)
        } else if position.y < arena.kill_depth {
            Some(ExpireReason::BelowKillDepth)
        } else {
            None
        }
    }
}

/// Откуда и куда стреляем (мировые координаты камеры)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Muzzle {
    pub position: Vec3,
    /// Unit vector
    pub direction: Vec3,
}

/// Живая коллекция снарядов (arena по id)
#[derive(Debug, Default)]
pub struct ProjectileSet {
    items: BTreeMap<ProjectileId, Projectile>,
    next_id: u32,
    last_fired_at: Option<Duration>,
}

impl ProjectileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: ProjectileId) -> Option<&Projectile> {
        self.items.get(&id)
    }

    pub fn get_mut(&mut self, id: ProjectileId) -> Option<&mut Projectile> {
        self.items.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.items.values()
    }

    pub fn marked_count(&self) -> usize {
        self.items.values().filter(|p| p.state.is_marked()).count()
    }

    /// Готово ли оружие (cooldown между выстрелами)
    pub fn can_fire(&self, now: Duration, config: &ProjectileConfig) -> bool {
        match self.last_fired_at {
            Some(last) => now.saturating_sub(last) >= seconds(config.cooldown),
            None => true,
        }
    }

    /// Удалить всё без deferred pass (teardown сессии)
    pub fn drain(&mut self) -> Vec<Projectile> {
        self.last_fired_at = None;
        std::mem::take(&mut self.items).into_values().collect()
    }
}

/// Выстрел: dynamic body со скоростью direction × speed, visual, fire sound
///
/// `None` если оружие ещё на cooldown.
#[allow(clippy::too_many_arguments)]
pub fn fire(
    set: &mut ProjectileSet,
    muzzle: Muzzle,
    now: Duration,
    config: &ProjectileConfig,
    physics: &mut dyn PhysicsWorld,
    registry: &mut BodyRegistry,
    scene: &mut dyn Scene,
    assets: &AssetCatalog,
    audio: &mut AudioBus,
) -> Option<ProjectileId> {
    if !set.can_fire(now, config) {
        return None;
    }

    let direction = muzzle.direction.normalize_or_zero();
    let position = muzzle.position + direction * config.muzzle_offset;

    let desc = BodyDesc::dynamic(BodyShape::Ball { radius: config.radius }, config.mass, position)
        .with_linvel(direction * config.speed)
        .with_damping(config.linear_damping)
        .in_layer(CollisionLayer::Projectile);
    let body = physics.add_body(&desc);

    let visual = scene.spawn(
        VisualKind::Projectile,
        assets.material("projectile"),
        Transform::from_translation(position).with_rotation(Quat::IDENTITY),
    );

    set.next_id += 1;
    let id = ProjectileId(set.next_id);
    registry.register(body, EntityId::Projectile(id));
    set.items.insert(
        id,
        Projectile {
            id,
            body,
            visual,
            created_at: now,
            origin: position,
            state: Lifecycle::Active,
        },
    );
    set.last_fired_at = Some(now);

    audio.play(SoundCue::Fire, Some(position));
    Some(id)
}

/// Aging pass (до physics step). Возвращает число помеченных снарядов.
pub fn age_projectiles(
    set: &mut ProjectileSet,
    physics: &dyn PhysicsWorld,
    now: Duration,
    config: &ProjectileConfig,
    arena: &ArenaConfig,
) -> usize {
    let mut marked = 0;

    for projectile in set.items.values_mut() {
        if projectile.state.is_marked() {
            continue;
        }
        let Some(body) = physics.body(projectile.body) else {
            continue;
        };

        if let Some(reason) = projectile.expire_reason(body.position, now, config, arena) {
            projectile.state.mark();
            marked += 1;
            crate::log(&format!("Projectile {:?} expired: {:?}", projectile.id, reason));
        }
    }

    marked
}

/// Что произошло при контакте снаряда
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileHit {
    /// Снаряд уже помечен: контакт проигнорирован
    Ignored,
    /// Ground / obstacle / неизвестное тело
    Surface,
    Enemy { killed: bool },
}

/// Contact handler снаряда (вызывается из collision router внутри step)
///
/// Снаряд одноразовый: любой контакт с solid surface помечает его.
/// Попадание во врага: минус 1 HP через `damage_enemy`.
pub fn on_projectile_contact(
    set: &mut ProjectileSet,
    id: ProjectileId,
    other: Option<EntityId>,
    enemies: &mut EnemySet,
    score: &mut u32,
    audio: &mut AudioBus,
    commands: &mut StepCommands,
) -> ProjectileHit {
    let Some(projectile) = set.items.get_mut(&id) else {
        return ProjectileHit::Ignored;
    };
    if !projectile.state.mark() {
        return ProjectileHit::Ignored;
    }

    match other {
        Some(EntityId::Enemy(enemy_id)) => {
            let killed = match enemies.get_mut(enemy_id) {
                Some(enemy) => damage_enemy(enemy, score, audio, commands).is_kill(),
                None => false,
            };
            ProjectileHit::Enemy { killed }
        }
        _ => ProjectileHit::Surface,
    }
}

/// Deferred removal (после step): listener, visual, body, запись в коллекции
pub fn remove_marked_projectiles(
    set: &mut ProjectileSet,
    physics: &mut dyn PhysicsWorld,
    registry: &mut BodyRegistry,
    scene: &mut dyn Scene,
) -> usize {
    let marked: Vec<ProjectileId> = set
        .items
        .values()
        .filter(|p| p.state.is_marked())
        .map(|p| p.id)
        .collect();

    for id in &marked {
        if let Some(projectile) = set.items.remove(id) {
            release(&projectile, physics, registry, scene);
        }
    }

    marked.len()
}

/// Освободить ресурсы снаряда (listener → visual → body)
pub(crate) fn release(
    projectile: &Projectile,
    physics: &mut dyn PhysicsWorld,
    registry: &mut BodyRegistry,
    scene: &mut dyn Scene,
) {
    registry.unregister(projectile.body);
    scene.despawn(projectile.visual);
    physics.remove_body(projectile.body);
}
