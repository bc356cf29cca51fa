//! Enemy subsystem
//!
//! Та же схема lifecycle что у снарядов (`Active → MarkedForRemoval → Removed`)
//! плюс seek AI. Урон приходит только из contact handler снаряда.

use std::collections::BTreeMap;

use bevy::math::{Quat, Vec3};
use bevy::prelude::Transform;

use crate::actor::{Health, Lifecycle};
use crate::config::GameConfig;
use crate::physics::{BodyDesc, BodyHandle, BodyShape, CollisionLayer, PhysicsWorld, StepCommands};
use crate::player::clamp_to_arena;
use crate::registry::{BodyRegistry, EnemyId, EntityId};
use crate::services::{AssetCatalog, AudioBus, Scene, SoundCue, VisualHandle, VisualKind};


/// Коэффициент slerp поворота к игроку за один кадр
pub const FACING_SLERP: f32 = 0.1;

#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: EnemyId,
    pub body: BodyHandle,
    pub visual: VisualHandle,
    /// Ключ type template в `enemy_types`
    pub kind: String,
    pub speed: f32,
    pub score_value: u32,
    pub health: Health,
    pub facing: Quat,
    /// Позиция на последнем AI pass (для позиционного звука внутри step)
    pub last_position: Vec3,
    pub state: Lifecycle,
}

/// Результат попадания по врагу
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Враг уже помечен (мёртв): урон не применяется
    Ignored,
    Wounded { remaining: u32 },
    Killed { score_value: u32 },
}

impl DamageOutcome {
    pub fn is_kill(&self) -> bool {
        matches!(self, DamageOutcome::Killed { .. })
    }
}

#[derive(Debug, Default)]
pub struct EnemySet {
    items: BTreeMap<EnemyId, Enemy>,
    next_id: u32,
}

impl EnemySet {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: EnemyId) -> Option<&Enemy> {
        self.items.get(&id)
    }

    pub fn get_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.items.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.items.values()
    }

    pub fn drain(&mut self) -> Vec<Enemy> {
        std::mem::take(&mut self.items).into_values().collect()
    }
}

/// Создать врагов из placements + type templates
///
/// Placement с неизвестным типом логируется и пропускается.
pub fn spawn_enemies(
    config: &GameConfig,
    physics: &mut dyn PhysicsWorld,
    registry: &mut BodyRegistry,
    scene: &mut dyn Scene,
    assets: &AssetCatalog,
) -> EnemySet {
    let mut set = EnemySet::default();

    for placement in &config.enemies {
        let Some(template) = config.enemy_type(&placement.type_name) else {
            crate::log_warning(&format!(
                "⚠️ Unknown enemy type `{}` at {:?}, skipped",
                placement.type_name, placement.position
            ));
            continue;
        };

        let position = Vec3::from_array(placement.position);
        let desc = BodyDesc::dynamic(
            BodyShape::Cuboid {
                half_extents: template.half_extents(),
            },
            template.mass,
            position,
        )
        .locked_rotations()
        .in_layer(CollisionLayer::Enemy);
        let body = physics.add_body(&desc);

        let visual = scene.spawn(
            VisualKind::Enemy,
            assets.material(&template.texture),
            Transform::from_translation(position),
        );

        set.next_id += 1;
        let id = EnemyId(set.next_id);
        registry.register(body, EntityId::Enemy(id));
        set.items.insert(
            id,
            Enemy {
                id,
                body,
                visual,
                kind: placement.type_name.clone(),
                speed: template.speed,
                score_value: template.score_value,
                health: Health::new(template.health),
                facing: Quat::IDENTITY,
                last_position: position,
                state: Lifecycle::Active,
            },
        );
    }

    crate::log_info(&format!(
        "👾 Spawned {}/{} enemies",
        set.len(),
        config.enemies.len()
    ));
    set
}

/// Seek AI (до physics step)
///
/// Порядок на врага: boundary clamp → горизонтальная скорость к игроку →
/// slerp facing к yaw направления. Y скорость оставлена гравитации.
pub fn update_enemy_ai(
    set: &mut EnemySet,
    physics: &mut dyn PhysicsWorld,
    player_position: Vec3,
    half_extent: f32,
) {
    for enemy in set.items.values_mut() {
        if enemy.state.is_marked() {
            continue;
        }
        let Some(body) = physics.body(enemy.body) else {
            continue;
        };

        let mut position = body.position;
        let mut velocity = body.linvel;
        if let Some((clamped, clamped_velocity)) = clamp_to_arena(position, velocity, half_extent) {
            physics.set_translation(enemy.body, clamped);
            position = clamped;
            velocity = clamped_velocity;
        }
        enemy.last_position = position;

        let to_player = Vec3::new(
            player_position.x - position.x,
            0.0,
            player_position.z - position.z,
        );
        let direction = to_player.normalize_or_zero();
        if direction == Vec3::ZERO {
            physics.set_linvel(enemy.body, Vec3::new(0.0, velocity.y, 0.0));
            continue;
        }

        physics.set_linvel(
            enemy.body,
            Vec3::new(direction.x * enemy.speed, velocity.y, direction.z * enemy.speed),
        );

        let target = Quat::from_rotation_y(direction.x.atan2(direction.z));
        enemy.facing = enemy.facing.slerp(target, FACING_SLERP);
        physics.set_rotation(enemy.body, enemy.facing);
    }
}

/// Минус 1 HP. На переходе в 0: mark, score, death sound, disable body.
///
/// Mark идемпотентен, поэтому score начисляется ровно один раз.
pub fn damage_enemy(
    enemy: &mut Enemy,
    score: &mut u32,
    audio: &mut AudioBus,
    commands: &mut StepCommands,
) -> DamageOutcome {
    if enemy.state.is_marked() {
        return DamageOutcome::Ignored;
    }

    enemy.health.take_damage(1);
    audio.play(SoundCue::Hit, Some(enemy.last_position));

    if enemy.health.is_alive() {
        return DamageOutcome::Wounded {
            remaining: enemy.health.current,
        };
    }

    enemy.state.mark();
    *score = score.saturating_add(enemy.score_value);
    audio.play(SoundCue::Death, Some(enemy.last_position));
    commands.disable_body(enemy.body);
    crate::log(&format!(
        "☠️ Enemy {:?} ({}) destroyed, +{}",
        enemy.id, enemy.kind, enemy.score_value
    ));

    DamageOutcome::Killed {
        score_value: enemy.score_value,
    }
}

/// Deferred removal (после step)
pub fn remove_marked_enemies(
    set: &mut EnemySet,
    physics: &mut dyn PhysicsWorld,
    registry: &mut BodyRegistry,
    scene: &mut dyn Scene,
) -> usize {
    let marked: Vec<EnemyId> = set
        .items
        .values()
        .filter(|e| e.state.is_marked())
        .map(|e| e.id)
        .collect();

    for id in &marked {
        if let Some(enemy) = set.items.remove(id) {
            release(&enemy, physics, registry, scene);
        }
    }

    marked.len()
}

pub(crate) fn release(
    enemy: &Enemy,
    physics: &mut dyn PhysicsWorld,
    registry: &mut BodyRegistry,
    scene: &mut dyn Scene,
) {
    registry.unregister(enemy.body);
    scene.despawn(enemy.visual);
    physics.remove_body(enemy.body);
}
