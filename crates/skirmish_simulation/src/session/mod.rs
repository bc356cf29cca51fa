//! Session: явный владелец всего состояния одной игры
//!
//! Frame scheduler (только в `Playing`), фиксированный порядок:
//! 1. player velocity
//! 2. projectile aging (mark)
//! 3. enemy AI
//! 4. physics step × N sub-steps (контакты → CollisionRouter)
//! 5. projectile deferred removal
//! 6. enemy deferred removal
//! 7. player boundary clamp
//! 8. render sync
//!
//! Bodies добавляются/удаляются только вне шага 4.

mod router;

use std::sync::Arc;
use std::time::Duration;

use bevy::math::{Vec2, Vec3};
use bevy::prelude::Transform;

use crate::clock::seconds;
use crate::config::GameConfig;
use crate::enemy::{self, remove_marked_enemies, spawn_enemies, update_enemy_ai, EnemySet};
use crate::physics::{
    BodyDesc, BodyHandle, BodyShape, CollisionLayer, FixedStepper, PhysicsWorld, RapierWorld,
};
use crate::player::{
    clamp_to_arena, compute_velocity, try_jump, CameraBasis, InputState, PlayerActor,
};
use crate::projectile::{self, age_projectiles, remove_marked_projectiles, Muzzle, ProjectileSet};
use crate::registry::{BodyRegistry, EnemyId, EntityId, ProjectileId};
use crate::render_sync::sync_visuals;
use crate::services::{
    AssetCatalog, AudioBus, Overlay, Scene, Services, SoundCue, VisualHandle, VisualKind,
};

use router::CollisionRouter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Title,
    Playing,
    GameOver,
}

/// Почему сессия закончилась
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    PlayerKilled,
    FellOutOfArena,
    ArenaCleared,
}

/// Что произошло за один `frame`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub substeps: u32,
    pub expired_projectiles: usize,
    pub removed_projectiles: usize,
    pub removed_enemies: usize,
    pub score_gained: u32,
    pub ended: Option<EndReason>,
}

/// Сравнимый срез состояния (детерминизм, отладка)
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub score: u32,
    pub elapsed: f32,
    pub player_position: Vec3,
    pub player_health: u32,
    pub projectiles: Vec<(ProjectileId, Vec3)>,
    pub enemies: Vec<(EnemyId, Vec3, u32)>,
}

/// Static тело арены (ground / obstacle)
#[derive(Debug, Clone, Copy)]
struct StaticProp {
    body: BodyHandle,
    visual: VisualHandle,
}

/// Всё, что создаётся при (пере)сборке арены
struct Arena {
    player: PlayerActor,
    props: Vec<StaticProp>,
    enemies: EnemySet,
}

pub struct Session<W: PhysicsWorld> {
    config: Arc<GameConfig>,
    physics: W,
    registry: BodyRegistry,
    player: PlayerActor,
    projectiles: ProjectileSet,
    enemies: EnemySet,
    props: Vec<StaticProp>,
    score: u32,
    state: SessionState,
    end_reason: Option<EndReason>,
    /// Session time (сумма dt кадров в Playing)
    clock: Duration,
    stepper: FixedStepper,
    started_with_enemies: bool,
    assets: AssetCatalog,
    audio: AudioBus,
    overlay: Box<dyn Overlay>,
    scene: Box<dyn Scene>,
}

impl Session<RapierWorld> {
    /// Session на rapier backend с гравитацией из config
    pub fn with_rapier(config: Arc<GameConfig>, services: Services) -> Self {
        let gravity = Vec3::new(0.0, config.session.gravity, 0.0);
        Self::new(config, RapierWorld::new(gravity), services)
    }
}

impl<W: PhysicsWorld> Session<W> {
    /// Собрать арену и показать title. Frame scheduler стоит до `start()`.
    pub fn new(config: Arc<GameConfig>, mut physics: W, services: Services) -> Self {
        let Services {
            audio,
            mut overlay,
            mut scene,
            assets,
        } = services;

        let mut registry = BodyRegistry::new();
        let arena = build_arena(&config, &mut physics, &mut registry, scene.as_mut(), &assets);
        let stepper = FixedStepper::new(config.session.fixed_timestep, config.session.max_substeps);
        let started_with_enemies = !arena.enemies.is_empty();

        overlay.show_title();
        crate::log_info(&format!("🎮 Session \"{}\" ready", config.session.title));

        Self {
            physics,
            registry,
            player: arena.player,
            projectiles: ProjectileSet::new(),
            enemies: arena.enemies,
            props: arena.props,
            score: 0,
            state: SessionState::Title,
            end_reason: None,
            clock: Duration::ZERO,
            stepper,
            started_with_enemies,
            audio: AudioBus::new(audio, assets.clone()),
            assets,
            overlay,
            scene,
            config,
        }
    }

    /// Title → Playing. `false` в любом другом состоянии.
    pub fn start(&mut self) -> bool {
        if self.state != SessionState::Title {
            return false;
        }
        self.state = SessionState::Playing;
        self.overlay.show_hud();
        self.overlay.update_score(self.score);
        crate::log_info("▶️ Session started");
        true
    }

    /// Снести арену и начать заново (из любого состояния)
    pub fn restart(&mut self) {
        self.teardown();

        let arena = build_arena(
            &self.config,
            &mut self.physics,
            &mut self.registry,
            self.scene.as_mut(),
            &self.assets,
        );
        self.started_with_enemies = !arena.enemies.is_empty();
        self.player = arena.player;
        self.enemies = arena.enemies;
        self.props = arena.props;

        self.score = 0;
        self.clock = Duration::ZERO;
        self.end_reason = None;
        self.stepper.reset();
        self.state = SessionState::Playing;
        self.overlay.show_hud();
        self.overlay.update_score(0);
        crate::log_info("🔄 Session restarted");
    }

    /// Один кадр frame scheduler. Вне `Playing` ничего не делает.
    pub fn frame(&mut self, dt: f32, input: &InputState) -> FrameReport {
        if self.state != SessionState::Playing {
            return FrameReport::default();
        }

        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.clock = self.clock.saturating_add(seconds(dt));
        let now = self.clock;
        let score_before = self.score;
        let mut report = FrameReport::default();

        // 1. Player velocity
        let player_position = match self.physics.body(self.player.body) {
            Some(body) => {
                let basis = CameraBasis::from_yaw(self.player.look.yaw);
                let velocity = compute_velocity(
                    input,
                    &basis,
                    self.player.is_grounded(),
                    body.linvel,
                    &self.config.player,
                );
                self.physics.set_linvel(self.player.body, velocity);
                body.position
            }
            None => self.config.player.spawn_position(),
        };

        // 2. Projectile aging (mark only)
        report.expired_projectiles = age_projectiles(
            &mut self.projectiles,
            &self.physics,
            now,
            &self.config.projectile,
            &self.config.arena,
        );

        // 3. Enemy AI
        update_enemy_ai(
            &mut self.enemies,
            &mut self.physics,
            player_position,
            self.config.arena.half_extent,
        );

        // 4. Physics step: контакты синхронно внутри step
        report.substeps = self.stepper.advance(dt);
        let step = self.stepper.step();
        for _ in 0..report.substeps {
            let mut router = CollisionRouter {
                registry: &self.registry,
                player: &mut self.player,
                projectiles: &mut self.projectiles,
                enemies: &mut self.enemies,
                score: &mut self.score,
                audio: &mut self.audio,
                player_config: &self.config.player,
                now,
            };
            self.physics.step(step, &mut router);
        }

        // 5-6. Deferred removal (строго после step)
        report.removed_projectiles = remove_marked_projectiles(
            &mut self.projectiles,
            &mut self.physics,
            &mut self.registry,
            self.scene.as_mut(),
        );
        report.removed_enemies = remove_marked_enemies(
            &mut self.enemies,
            &mut self.physics,
            &mut self.registry,
            self.scene.as_mut(),
        );

        // 7. Player boundary clamp
        if let Some(body) = self.physics.body(self.player.body) {
            let clamped = clamp_to_arena(body.position, body.linvel, self.config.arena.half_extent);
            if let Some((position, velocity)) = clamped {
                self.physics.set_translation(self.player.body, position);
                self.physics.set_linvel(self.player.body, velocity);
            }
        }

        // 8. Render sync
        sync_visuals(
            &self.player,
            &self.projectiles,
            &self.enemies,
            &self.physics,
            self.scene.as_mut(),
            self.config.player.eye_height,
        );

        report.score_gained = self.score - score_before;
        if report.score_gained > 0 {
            self.overlay.update_score(self.score);
        }

        if let Some(reason) = self.check_end() {
            self.finish(reason);
            report.ended = Some(reason);
        }

        report
    }

    /// Jump edge: только на земле; vertical velocity обнуляется перед импульсом
    pub fn jump(&mut self) -> bool {
        if self.state != SessionState::Playing {
            return false;
        }
        let Some(impulse) = try_jump(self.player.is_grounded(), &self.config.player) else {
            return false;
        };
        let Some(body) = self.physics.body(self.player.body) else {
            return false;
        };

        self.physics
            .set_linvel(self.player.body, Vec3::new(body.linvel.x, 0.0, body.linvel.z));
        self.physics.apply_impulse(self.player.body, impulse);
        self.audio.play(SoundCue::Jump, Some(body.position));
        true
    }

    /// Fire edge: снаряд из камеры по направлению взгляда
    pub fn fire(&mut self) -> Option<ProjectileId> {
        if self.state != SessionState::Playing {
            return None;
        }
        let body = self.physics.body(self.player.body)?;
        let muzzle = Muzzle {
            position: self.player.eye_position(body.position, &self.config.player),
            direction: self.player.look.view_direction(),
        };

        projectile::fire(
            &mut self.projectiles,
            muzzle,
            self.clock,
            &self.config.projectile,
            &mut self.physics,
            &mut self.registry,
            self.scene.as_mut(),
            &self.assets,
            &mut self.audio,
        )
    }

    /// Pointer delta: только при pointer lock и в `Playing`
    pub fn look(&mut self, delta: Vec2, pointer_locked: bool) -> bool {
        if self.state != SessionState::Playing || !pointer_locked {
            return false;
        }
        self.player
            .look
            .apply(delta, self.config.player.look_sensitivity);
        true
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn elapsed(&self) -> f32 {
        self.clock.as_secs_f32()
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn player(&self) -> &PlayerActor {
        &self.player
    }

    pub fn projectiles(&self) -> &ProjectileSet {
        &self.projectiles
    }

    pub fn enemies(&self) -> &EnemySet {
        &self.enemies
    }

    pub fn registry(&self) -> &BodyRegistry {
        &self.registry
    }

    pub fn physics(&self) -> &W {
        &self.physics
    }

    /// Прямой доступ к backend (тесты: очередь контактов ScriptedWorld).
    /// Добавлять/удалять тела через него нельзя.
    pub fn physics_mut(&mut self) -> &mut W {
        &mut self.physics
    }

    pub fn scene(&self) -> &dyn Scene {
        self.scene.as_ref()
    }

    /// Handle тела статики арены (ground первым, дальше obstacles)
    pub fn prop_bodies(&self) -> Vec<BodyHandle> {
        self.props.iter().map(|prop| prop.body).collect()
    }

    pub fn player_position(&self) -> Option<Vec3> {
        self.physics.body(self.player.body).map(|body| body.position)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            score: self.score,
            elapsed: self.clock.as_secs_f32(),
            player_position: self.player_position().unwrap_or(Vec3::NAN),
            player_health: self.player.health.current,
            projectiles: self
                .projectiles
                .iter()
                .filter_map(|p| self.physics.body(p.body).map(|b| (p.id, b.position)))
                .collect(),
            enemies: self
                .enemies
                .iter()
                .filter_map(|e| {
                    self.physics
                        .body(e.body)
                        .map(|b| (e.id, b.position, e.health.current))
                })
                .collect(),
        }
    }

    fn check_end(&self) -> Option<EndReason> {
        if !self.player.health.is_alive() {
            return Some(EndReason::PlayerKilled);
        }
        let fell = self
            .player_position()
            .is_some_and(|position| position.y < self.config.arena.kill_depth);
        if fell {
            return Some(EndReason::FellOutOfArena);
        }
        if self.started_with_enemies && self.enemies.is_empty() {
            return Some(EndReason::ArenaCleared);
        }
        None
    }

    fn finish(&mut self, reason: EndReason) {
        self.state = SessionState::GameOver;
        self.end_reason = Some(reason);
        self.overlay.show_game_over(self.score);
        crate::log_info(&format!(
            "🏁 Game over ({:?}), final score {}",
            reason, self.score
        ));
    }

    /// Освободить все тела и visuals (вне step)
    fn teardown(&mut self) {
        for shot in self.projectiles.drain() {
            projectile::release(&shot, &mut self.physics, &mut self.registry, self.scene.as_mut());
        }
        for foe in self.enemies.drain() {
            enemy::release(&foe, &mut self.physics, &mut self.registry, self.scene.as_mut());
        }
        for prop in self.props.drain(..) {
            self.physics.remove_body(prop.body);
            self.scene.despawn(prop.visual);
        }

        self.physics.remove_body(self.player.body);
        self.scene.despawn(self.player.visual);
        self.scene.despawn(self.player.camera);
        self.registry.clear();
    }
}

/// Ground, obstacles, игрок, враги
fn build_arena(
    config: &GameConfig,
    physics: &mut dyn PhysicsWorld,
    registry: &mut BodyRegistry,
    scene: &mut dyn Scene,
    assets: &AssetCatalog,
) -> Arena {
    let arena = &config.arena;
    let mut props = Vec::with_capacity(config.obstacles.len() + 1);

    // Ground: верхняя грань на y = 0
    let ground_extents = Vec3::new(arena.half_extent, 0.5, arena.half_extent);
    let ground_position = Vec3::new(0.0, -0.5, 0.0);
    let body = physics.add_body(
        &BodyDesc::fixed(
            BodyShape::Cuboid {
                half_extents: ground_extents,
            },
            ground_position,
        )
        .with_friction(arena.ground_friction),
    );
    registry.register(body, EntityId::Ground);
    let visual = scene.spawn(
        VisualKind::Ground,
        assets.material("ground"),
        Transform::from_translation(ground_position),
    );
    props.push(StaticProp { body, visual });

    for (index, obstacle) in config.obstacles.iter().enumerate() {
        let position = Vec3::from_array(obstacle.position);
        let body = physics.add_body(&BodyDesc::fixed(
            BodyShape::Cuboid {
                half_extents: Vec3::from_array(obstacle.half_extents),
            },
            position,
        ));
        registry.register(body, EntityId::Obstacle(index as u32));
        let visual = scene.spawn(
            VisualKind::Obstacle,
            assets.material(&obstacle.texture),
            Transform::from_translation(position),
        );
        props.push(StaticProp { body, visual });
    }

    let player_config = &config.player;
    let spawn = player_config.spawn_position();
    let body = physics.add_body(
        &BodyDesc::dynamic(
            BodyShape::Ball {
                radius: player_config.radius,
            },
            player_config.mass,
            spawn,
        )
        .with_damping(player_config.linear_damping)
        .with_friction(arena.ground_friction)
        .locked_rotations()
        .in_layer(CollisionLayer::Player),
    );
    registry.register(body, EntityId::Player);
    let visual = scene.spawn(
        VisualKind::Player,
        assets.material("player"),
        Transform::from_translation(spawn),
    );
    let camera = scene.spawn(
        VisualKind::CameraRig,
        assets.material("player"),
        Transform::from_translation(spawn + Vec3::Y * player_config.eye_height),
    );
    let player = PlayerActor::new(body, visual, camera, player_config);

    let enemies = spawn_enemies(config, physics, registry, scene, assets);

    Arena {
        player,
        props,
        enemies,
    }
}
