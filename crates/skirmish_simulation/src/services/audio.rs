//! Audio collaborator (fire-and-forget)

use std::sync::{Arc, Mutex};

use bevy::math::Vec3;
use thiserror::Error;

use super::{AssetCatalog, SoundHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    Fire,
    Hit,
    Death,
    Jump,
    Hurt,
}

impl SoundCue {
    /// Ключ в `assets.sounds`
    pub fn asset_key(&self) -> &'static str {
        match self {
            SoundCue::Fire => "fire",
            SoundCue::Hit => "hit",
            SoundCue::Death => "death",
            SoundCue::Jump => "jump",
            SoundCue::Hurt => "hurt",
        }
    }
}

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("playback refused: {0}")]
    Refused(String),

    #[error("audio device unavailable")]
    Unavailable,
}

pub trait AudioSink: Send + Sync {
    fn play(
        &mut self,
        cue: SoundCue,
        sound: SoundHandle,
        position: Option<Vec3>,
    ) -> Result<(), AudioError>;
}

/// Sink, который только запоминает что играло (headless / тесты)
///
/// Clone разделяет один и тот же журнал.
#[derive(Debug, Clone, Default)]
pub struct AudioLog {
    played: Arc<Mutex<Vec<(SoundCue, Option<Vec3>)>>>,
    refuse: bool,
}

impl AudioLog {
    /// Sink, который отказывает на каждый play (например autoplay denied)
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    pub fn played(&self) -> Vec<(SoundCue, Option<Vec3>)> {
        self.played.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn count(&self, cue: SoundCue) -> usize {
        self.played().iter().filter(|(c, _)| *c == cue).count()
    }
}

impl AudioSink for AudioLog {
    fn play(
        &mut self,
        cue: SoundCue,
        _sound: SoundHandle,
        position: Option<Vec3>,
    ) -> Result<(), AudioError> {
        if self.refuse {
            return Err(AudioError::Refused("autoplay denied".to_string()));
        }
        if let Ok(mut played) = self.played.lock() {
            played.push((cue, position));
        }
        Ok(())
    }
}

/// Обёртка над sink: резолвит handle из каталога, глотает ошибки
pub struct AudioBus {
    sink: Box<dyn AudioSink>,
    catalog: AssetCatalog,
}

impl AudioBus {
    pub fn new(sink: Box<dyn AudioSink>, catalog: AssetCatalog) -> Self {
        Self { sink, catalog }
    }

    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    pub fn play(&mut self, cue: SoundCue, position: Option<Vec3>) {
        let Some(sound) = self.catalog.sound(cue.asset_key()) else {
            return;
        };

        if let Err(err) = self.sink.play(cue, sound, position) {
            crate::log_warning(&format!("🔇 {:?} not played: {}", cue, err));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssetManifest;
    use crate::services::InMemoryAssets;

    fn catalog_with(sounds: &[&str]) -> AssetCatalog {
        let mut manifest = AssetManifest::default();
        for name in sounds {
            manifest.sounds.insert(name.to_string(), format!("sounds/{}.ogg", name));
        }
        AssetCatalog::preload(&manifest, &mut InMemoryAssets::new())
    }

    #[test]
    fn test_bus_plays_loaded_sound() {
        let log = AudioLog::default();
        let mut bus = AudioBus::new(Box::new(log.clone()), catalog_with(&["fire"]));

        bus.play(SoundCue::Fire, Some(Vec3::ONE));
        assert_eq!(log.played(), vec![(SoundCue::Fire, Some(Vec3::ONE))]);
    }

    #[test]
    fn test_bus_skips_unloaded_sound() {
        let log = AudioLog::default();
        let mut bus = AudioBus::new(Box::new(log.clone()), catalog_with(&["fire"]));

        bus.play(SoundCue::Death, None);
        assert!(log.played().is_empty());
    }

    #[test]
    fn test_bus_swallows_refusal() {
        let mut bus = AudioBus::new(Box::new(AudioLog::refusing()), catalog_with(&["hit"]));

        // Не паникует и не возвращает ошибку наружу
        bus.play(SoundCue::Hit, None);
    }
}
