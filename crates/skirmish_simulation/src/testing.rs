//! Общие fixtures для unit тестов

use std::time::Duration;

use bevy::math::Vec3;

use crate::clock::seconds;
use crate::config::{AssetManifest, EnemyPlacement, EnemyTypeConfig, GameConfig};
use crate::physics::ScriptedWorld;
use crate::services::{AssetCatalog, AudioBus, AudioLog, InMemoryAssets, SoundCue};

/// Каталог, в котором загружены все звуки (текстур нет → flat colors)
pub fn catalog_with_sounds() -> AssetCatalog {
    let mut manifest = AssetManifest::default();
    for cue in [
        SoundCue::Fire,
        SoundCue::Hit,
        SoundCue::Death,
        SoundCue::Jump,
        SoundCue::Hurt,
    ] {
        manifest
            .sounds
            .insert(cue.asset_key().to_string(), format!("sounds/{}.ogg", cue.asset_key()));
    }
    AssetCatalog::preload(&manifest, &mut InMemoryAssets::new())
}

/// AudioBus + разделяемый журнал проигранных звуков
pub fn audio_bus() -> (AudioBus, AudioLog) {
    let log = AudioLog::default();
    (AudioBus::new(Box::new(log.clone()), catalog_with_sounds()), log)
}

/// Session time из секунд (короткая запись для тестов)
pub fn at(secs: f32) -> Duration {
    seconds(secs)
}

pub fn zero_gravity_world() -> ScriptedWorld {
    ScriptedWorld::new(Vec3::ZERO)
}

/// Config с одним типом "grunt" и заданными placements
pub fn config_with_grunts(health: u32, positions: &[[f32; 3]]) -> GameConfig {
    let mut config = GameConfig::default();
    config.enemy_types.insert(
        "grunt".to_string(),
        EnemyTypeConfig {
            health,
            score_value: 100,
            speed: 3.0,
            ..Default::default()
        },
    );
    config.enemies = positions
        .iter()
        .map(|position| EnemyPlacement {
            type_name: "grunt".to_string(),
            position: *position,
        })
        .collect();
    config
}
