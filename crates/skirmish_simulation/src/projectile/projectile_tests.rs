//! Tests for projectile subsystem.

use bevy::math::Vec3;

use super::*;
use crate::config::{ArenaConfig, ProjectileConfig};
use crate::enemy::spawn_enemies;
use crate::physics::{BodyDesc, BodyShape, PhysicsWorld, ScriptedWorld};
use crate::services::{AudioLog, SceneBuffer, SoundCue, VisualKind};
use crate::testing::{at, audio_bus, config_with_grunts, zero_gravity_world};

fn projectile_at(created_at: f32, origin: Vec3) -> Projectile {
    Projectile {
        id: ProjectileId(1),
        body: BodyHandle(1),
        visual: VisualHandle(1),
        created_at: at(created_at),
        origin,
        state: Lifecycle::Active,
    }
}

fn muzzle() -> Muzzle {
    Muzzle {
        position: Vec3::new(0.0, 1.6, 0.0),
        direction: Vec3::NEG_Z,
    }
}

/// Всё, что нужно `fire` и contact handler
struct Armory {
    config: ProjectileConfig,
    physics: ScriptedWorld,
    registry: BodyRegistry,
    scene: SceneBuffer,
    audio: AudioBus,
    log: AudioLog,
    assets: AssetCatalog,
    set: ProjectileSet,
}

impl Armory {
    fn new(config: ProjectileConfig) -> Self {
        let (audio, log) = audio_bus();
        let assets = audio.catalog().clone();
        Self {
            config,
            physics: zero_gravity_world(),
            registry: BodyRegistry::new(),
            scene: SceneBuffer::default(),
            audio,
            log,
            assets,
            set: ProjectileSet::new(),
        }
    }

    fn shoot(&mut self, now: f32) -> Option<ProjectileId> {
        fire(
            &mut self.set,
            muzzle(),
            at(now),
            &self.config,
            &mut self.physics,
            &mut self.registry,
            &mut self.scene,
            &self.assets,
            &mut self.audio,
        )
    }

    fn hit(
        &mut self,
        id: ProjectileId,
        other: EntityId,
        enemies: &mut EnemySet,
        score: &mut u32,
        commands: &mut StepCommands,
    ) -> ProjectileHit {
        on_projectile_contact(
            &mut self.set,
            id,
            Some(other),
            enemies,
            score,
            &mut self.audio,
            commands,
        )
    }

    fn age(&mut self, now: f32) -> usize {
        age_projectiles(
            &mut self.set,
            &self.physics,
            at(now),
            &self.config,
            &ArenaConfig::default(),
        )
    }

    fn remove_marked(&mut self) -> usize {
        remove_marked_projectiles(
            &mut self.set,
            &mut self.physics,
            &mut self.registry,
            &mut self.scene,
        )
    }
}

#[test]
fn test_lifetime_boundary() {
    // created t=0, lifetime 2.0: Active на 1.9, помечен на первом pass ≥ 2.0
    let config = ProjectileConfig {
        lifetime: 2.0,
        ..Default::default()
    };
    let arena = ArenaConfig::default();
    let projectile = projectile_at(0.0, Vec3::ZERO);

    assert_eq!(projectile.expire_reason(Vec3::ZERO, at(1.9), &config, &arena), None);
    assert_eq!(
        projectile.expire_reason(Vec3::ZERO, at(2.0), &config, &arena),
        Some(ExpireReason::Lifetime)
    );
}

#[test]
fn test_lifetime_counted_from_late_spawn() {
    // Выстрел на первом кадре 60 Hz: ровно 120 кадров спустя возраст = lifetime
    let config = ProjectileConfig::default();
    let arena = ArenaConfig::default();
    let frame = at(1.0 / 60.0);
    let projectile = Projectile {
        created_at: frame,
        ..projectile_at(0.0, Vec3::ZERO)
    };

    let now_at = |frames: u32| frame * (frames + 1);
    assert_eq!(projectile.expire_reason(Vec3::ZERO, now_at(119), &config, &arena), None);
    assert_eq!(
        projectile.expire_reason(Vec3::ZERO, now_at(120), &config, &arena),
        Some(ExpireReason::Lifetime)
    );
}

#[test]
fn test_expire_first_match_wins() {
    let config = ProjectileConfig::default();
    let arena = ArenaConfig::default();
    let projectile = projectile_at(0.0, Vec3::ZERO);

    // И время вышло, и за пределами арены, и ниже kill depth → Lifetime
    let far_below = Vec3::new(40.0, -20.0, 0.0);
    assert_eq!(
        projectile.expire_reason(far_below, at(5.0), &config, &arena),
        Some(ExpireReason::Lifetime)
    );

    // Range проверяется раньше bounds
    assert_eq!(
        projectile.expire_reason(Vec3::new(0.0, 0.0, -61.0), at(0.5), &config, &arena),
        Some(ExpireReason::Range)
    );
}

#[test]
fn test_expire_bounds_and_depth() {
    let config = ProjectileConfig::default();
    let arena = ArenaConfig::default();

    let near_edge = projectile_at(0.0, Vec3::new(24.0, 1.0, 0.0));
    assert_eq!(
        near_edge.expire_reason(Vec3::new(26.0, 1.0, 0.0), at(0.1), &config, &arena),
        Some(ExpireReason::OutOfBounds)
    );

    let centre = projectile_at(0.0, Vec3::ZERO);
    assert_eq!(
        centre.expire_reason(Vec3::new(0.0, -11.0, 0.0), at(0.1), &config, &arena),
        Some(ExpireReason::BelowKillDepth)
    );
    let inside = Vec3::new(3.0, 0.5, 3.0);
    assert_eq!(centre.expire_reason(inside, at(0.1), &config, &arena), None);
}

#[test]
fn test_fire_spawns_body_visual_and_sound() {
    let mut armory = Armory::new(ProjectileConfig::default());

    let id = armory.shoot(0.0).unwrap();

    let projectile = armory.set.get(id).unwrap();
    let body = armory.physics.body(projectile.body).unwrap();
    assert_eq!(body.linvel, Vec3::new(0.0, 0.0, -30.0));
    assert!((projectile.origin - Vec3::new(0.0, 1.6, -0.7)).length() < 1e-5);
    assert_eq!(
        armory.registry.lookup(projectile.body),
        Some(EntityId::Projectile(id))
    );
    assert_eq!(armory.scene.count(VisualKind::Projectile), 1);
    assert_eq!(armory.log.count(SoundCue::Fire), 1);
}

#[test]
fn test_fire_respects_cooldown() {
    let mut armory = Armory::new(ProjectileConfig {
        cooldown: 0.5,
        ..Default::default()
    });

    assert!(armory.shoot(0.0).is_some());
    assert!(armory.shoot(0.2).is_none());
    assert!(armory.shoot(0.5).is_some());
    assert_eq!(armory.set.len(), 2);
}

#[test]
fn test_aging_marks_and_skips_marked() {
    let mut armory = Armory::new(ProjectileConfig::default());

    armory.shoot(0.0);
    armory.shoot(1.0);

    // t = 2.5: первый истёк (2.5 ≥ 2.0), второй ещё жив (1.5)
    assert_eq!(armory.age(2.5), 1);
    assert_eq!(armory.set.marked_count(), 1);

    // Повторный pass не помечает уже помеченный
    assert_eq!(armory.age(2.5), 0);
    assert_eq!(armory.set.len(), 2);
}

#[test]
fn test_contact_is_idempotent() {
    let game = config_with_grunts(3, &[[0.0, 1.0, -5.0]]);
    let mut armory = Armory::new(ProjectileConfig::default());

    let mut enemies = spawn_enemies(
        &game,
        &mut armory.physics,
        &mut armory.registry,
        &mut armory.scene,
        &armory.assets,
    );
    let enemy_id = enemies.iter().next().unwrap().id;

    let id = armory.shoot(0.0).unwrap();
    let mut score = 0;
    let mut commands = StepCommands::default();
    let other = EntityId::Enemy(enemy_id);

    let first = armory.hit(id, other, &mut enemies, &mut score, &mut commands);
    let second = armory.hit(id, other, &mut enemies, &mut score, &mut commands);

    assert_eq!(first, ProjectileHit::Enemy { killed: false });
    assert_eq!(second, ProjectileHit::Ignored);
    assert_eq!(enemies.get(enemy_id).unwrap().health.current, 2);
    assert_eq!(armory.log.count(SoundCue::Hit), 1);
    assert!(armory.set.get(id).unwrap().state.is_marked());
}

#[test]
fn test_surface_contact_marks_projectile() {
    let mut armory = Armory::new(ProjectileConfig::default());
    let mut enemies = EnemySet::default();
    let mut score = 0;
    let mut commands = StepCommands::default();

    let ground = armory.shoot(0.0).unwrap();
    let obstacle = armory.shoot(1.0).unwrap();

    let hit_ground = armory.hit(ground, EntityId::Ground, &mut enemies, &mut score, &mut commands);
    let hit_obstacle = armory.hit(
        obstacle,
        EntityId::Obstacle(0),
        &mut enemies,
        &mut score,
        &mut commands,
    );

    assert_eq!(hit_ground, ProjectileHit::Surface);
    assert_eq!(hit_obstacle, ProjectileHit::Surface);
    assert_eq!(armory.set.marked_count(), 2);
    assert_eq!(score, 0);
}

#[test]
fn test_removal_only_touches_marked() {
    let mut armory = Armory::new(ProjectileConfig::default());

    // Чужое тело в мире: не должно пострадать
    let wall = armory.physics.add_body(&BodyDesc::fixed(
        BodyShape::Cuboid {
            half_extents: Vec3::ONE,
        },
        Vec3::ZERO,
    ));

    let kept = armory.shoot(0.0).unwrap();
    let doomed = armory.shoot(1.0).unwrap();
    let doomed_body = armory.set.get(doomed).unwrap().body;
    armory.set.get_mut(doomed).unwrap().state.mark();

    assert_eq!(armory.remove_marked(), 1);
    assert_eq!(armory.set.len(), 1);
    assert!(armory.set.get(kept).is_some());
    assert!(!armory.physics.contains(doomed_body));
    assert!(armory.physics.contains(wall));
    assert_eq!(armory.registry.lookup(doomed_body), None);
    assert_eq!(armory.scene.count(VisualKind::Projectile), 1);

    // Повторный pass ничего не делает
    assert_eq!(armory.remove_marked(), 0);
}
