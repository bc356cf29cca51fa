//! Render sync: physics → visual transforms (one-way, после step)

use bevy::math::Vec3;
use bevy::prelude::Transform;

use crate::enemy::EnemySet;
use crate::physics::PhysicsWorld;
use crate::player::PlayerActor;
use crate::projectile::ProjectileSet;
use crate::services::Scene;

/// Скопировать transforms тел на visuals
///
/// Помеченные снаряды/враги пропускаются: их тела уже могут быть отключены,
/// а visual всё равно исчезнет в следующем removal pass.
pub fn sync_visuals(
    player: &PlayerActor,
    projectiles: &ProjectileSet,
    enemies: &EnemySet,
    physics: &dyn PhysicsWorld,
    scene: &mut dyn Scene,
    eye_height: f32,
) -> usize {
    let mut synced = 0;

    if let Some(body) = physics.body(player.body) {
        scene.set_transform(
            player.visual,
            Transform::from_translation(body.position).with_rotation(player.look.body_rotation()),
        );
        scene.set_transform(
            player.camera,
            Transform::from_translation(body.position + Vec3::Y * eye_height)
                .with_rotation(player.look.camera_rotation()),
        );
        synced += 1;
    }

    let projectile_bodies = projectiles
        .iter()
        .filter(|p| p.state.is_active())
        .map(|p| (p.body, p.visual));
    let enemy_bodies = enemies
        .iter()
        .filter(|e| e.state.is_active())
        .map(|e| (e.body, e.visual));

    for (handle, visual) in projectile_bodies.chain(enemy_bodies) {
        if let Some(body) = physics.body(handle) {
            scene.set_transform(
                visual,
                Transform::from_translation(body.position).with_rotation(body.rotation),
            );
            synced += 1;
        }
    }

    synced
}
