//! Game configuration (config.json)
//!
//! Загружается один раз до старта Session, дальше только read-only
//! (Session держит `Arc<GameConfig>`).
//!
//! Ошибка загрузки фатальна: host показывает сообщение и не запускает
//! frame scheduler. Retry нет.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ошибки загрузки конфигурации
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Корневой документ конфигурации
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub session: SessionConfig,
    pub arena: ArenaConfig,
    pub player: PlayerConfig,
    pub projectile: ProjectileConfig,
    /// Type templates: имя → параметры (общие для всех instances)
    pub enemy_types: BTreeMap<String, EnemyTypeConfig>,
    /// Декларативные placements врагов на уровне
    pub enemies: Vec<EnemyPlacement>,
    pub obstacles: Vec<ObstacleConfig>,
    pub assets: AssetManifest,
}

/// Параметры физического шага
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub title: String,
    /// Фиксированный sub-step (секунды)
    pub fixed_timestep: f32,
    /// Максимум sub-steps за кадр (ограничивает стоимость кадра при просадках FPS)
    pub max_substeps: u32,
    /// Ускорение свободного падения (m/s², по Y)
    pub gravity: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            title: "Skirmish".to_string(),
            fixed_timestep: 1.0 / 60.0,
            max_substeps: 3,
            gravity: -9.82,
        }
    }
}

/// Размеры арены
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Половина стороны квадратной арены (X и Z)
    pub half_extent: f32,
    /// Ниже этой высоты projectile удаляется, игрок считается упавшим
    pub kill_depth: f32,
    pub ground_friction: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            half_extent: 25.0,
            kill_depth: -10.0,
            ground_friction: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Базовая горизонтальная скорость (m/s)
    pub speed: f32,
    /// Множитель скорости в воздухе (< 1)
    pub air_control: f32,
    /// Затухание горизонтальной скорости в воздухе без input (< 1, за кадр)
    pub air_deceleration: f32,
    pub jump_impulse: f32,
    pub mass: f32,
    pub radius: f32,
    pub linear_damping: f32,
    /// Высота камеры над центром тела
    pub eye_height: f32,
    /// Радианы на единицу pointer delta
    pub look_sensitivity: f32,
    pub spawn: [f32; 3],
    pub max_health: u32,
    /// Неуязвимость после контактного урона (секунды)
    pub hit_cooldown: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: 10.0,
            air_control: 0.5,
            air_deceleration: 0.95,
            jump_impulse: 6.0,
            mass: 1.0,
            radius: 0.5,
            linear_damping: 0.1,
            eye_height: 0.6,
            look_sensitivity: 0.002,
            spawn: [0.0, 1.0, 0.0],
            max_health: 3,
            hit_cooldown: 1.0,
        }
    }
}

impl PlayerConfig {
    pub fn spawn_position(&self) -> Vec3 {
        Vec3::from_array(self.spawn)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    pub speed: f32,
    pub mass: f32,
    pub radius: f32,
    pub linear_damping: f32,
    /// Время жизни (секунды)
    pub lifetime: f32,
    /// Максимальная дистанция от точки выстрела
    pub max_range: f32,
    /// Минимальный интервал между выстрелами (секунды)
    pub cooldown: f32,
    /// Смещение точки спавна вдоль направления камеры
    pub muzzle_offset: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            speed: 30.0,
            mass: 0.1,
            radius: 0.1,
            linear_damping: 0.0,
            lifetime: 2.0,
            max_range: 60.0,
            cooldown: 0.15,
            muzzle_offset: 0.7,
        }
    }
}

/// Type template врага
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTypeConfig {
    pub half_extents: [f32; 3],
    pub speed: f32,
    pub health: u32,
    pub score_value: u32,
    pub mass: f32,
    /// Ключ материала в asset manifest
    pub texture: String,
}

impl Default for EnemyTypeConfig {
    fn default() -> Self {
        Self {
            half_extents: [0.5, 0.5, 0.5],
            speed: 3.0,
            health: 3,
            score_value: 100,
            mass: 5.0,
            texture: "enemy".to_string(),
        }
    }
}

impl EnemyTypeConfig {
    pub fn half_extents(&self) -> Vec3 {
        Vec3::from_array(self.half_extents)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyPlacement {
    #[serde(rename = "type")]
    pub type_name: String,
    pub position: [f32; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObstacleConfig {
    pub position: [f32; 3],
    pub half_extents: [f32; 3],
    #[serde(default = "default_obstacle_texture")]
    pub texture: String,
}

fn default_obstacle_texture() -> String {
    "obstacle".to_string()
}

/// Asset manifest: логическое имя → путь
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetManifest {
    pub textures: BTreeMap<String, String>,
    pub sounds: BTreeMap<String, String>,
}

impl GameConfig {
    /// Загрузить и провалидировать config из JSON файла
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::Invalid {
                field,
                reason: reason.into(),
            }
        }

        if !(self.session.fixed_timestep > 0.0) {
            return Err(invalid("session.fixed_timestep", "must be positive"));
        }
        if self.session.max_substeps == 0 {
            return Err(invalid("session.max_substeps", "must be at least 1"));
        }
        if !(self.arena.half_extent > 0.0) {
            return Err(invalid("arena.half_extent", "must be positive"));
        }
        if !(self.player.air_control > 0.0 && self.player.air_control <= 1.0) {
            return Err(invalid("player.air_control", "must be in (0, 1]"));
        }
        if !(self.player.air_deceleration > 0.0 && self.player.air_deceleration < 1.0) {
            return Err(invalid("player.air_deceleration", "must be in (0, 1)"));
        }
        if !(self.player.mass > 0.0) {
            return Err(invalid("player.mass", "player body must be dynamic"));
        }
        if !(self.projectile.mass > 0.0) {
            return Err(invalid("projectile.mass", "projectile body must be dynamic"));
        }
        if !(self.projectile.lifetime > 0.0) {
            return Err(invalid("projectile.lifetime", "must be positive"));
        }
        for (name, template) in &self.enemy_types {
            if template.health == 0 {
                return Err(invalid(
                    "enemy_types.health",
                    format!("type `{}` spawns already dead", name),
                ));
            }
            if !(template.mass > 0.0) {
                return Err(invalid(
                    "enemy_types.mass",
                    format!("type `{}` must be a dynamic body", name),
                ));
            }
        }
        Ok(())
    }

    pub fn enemy_type(&self, name: &str) -> Option<&EnemyTypeConfig> {
        self.enemy_types.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_bundled_config_parses() {
        let config = GameConfig::from_json_str(include_str!("../../assets/config.json"))
            .expect("bundled config must be valid");

        assert!(config.enemy_type("grunt").is_some());
        assert!(!config.enemies.is_empty());
        assert_eq!(config.session.max_substeps, 3);
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let config = GameConfig::from_json_str(r#"{ "player": { "speed": 12.0 } }"#).unwrap();

        assert_eq!(config.player.speed, 12.0);
        assert_eq!(config.player.air_control, PlayerConfig::default().air_control);
        assert_eq!(config.arena.half_extent, 25.0);
    }

    #[test]
    fn test_invalid_air_control_rejected() {
        let result = GameConfig::from_json_str(r#"{ "player": { "air_control": 1.5 } }"#);

        match result {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "player.air_control"),
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_static_enemy_type_rejected() {
        // mass 0 → fixed body: не двигается и считался бы землёй для игрока
        let result = GameConfig::from_json_str(r#"{ "enemy_types": { "rock": { "mass": 0.0 } } }"#);

        match result {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "enemy_types.mass"),
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            GameConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = GameConfig::load("/definitely/not/here/config.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("config.json"));
    }
}
