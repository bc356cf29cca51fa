//! Asset collaborator
//!
//! Декодирование ассетов: не наша задача. Здесь только:
//! manifest → handles, per-asset ошибки логируются, entity получает
//! flat color вместо текстуры, звук без handle просто не играет.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use thiserror::Error;

use crate::config::AssetManifest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundHandle(pub u32);

/// Материал visual instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    Texture(TextureHandle),
    /// Fallback: linear RGB
    Flat([f32; 3]),
}

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("asset `{name}` not found at {path}")]
    NotFound { name: String, path: PathBuf },

    #[error("failed to read asset `{name}`: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("asset `{0}` rejected by loader")]
    Rejected(String),
}

pub trait AssetLoader {
    fn load_texture(&mut self, name: &str, path: &str) -> Result<TextureHandle, AssetError>;
    fn load_sound(&mut self, name: &str, path: &str) -> Result<SoundHandle, AssetError>;
}

/// Проверяет наличие файлов под root директорией (содержимое не декодируется)
pub struct FsAssetLoader {
    root: PathBuf,
    next_id: u32,
}

impl FsAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            next_id: 0,
        }
    }

    fn check(&mut self, name: &str, path: &str) -> Result<u32, AssetError> {
        let full = self.root.join(path);
        match std::fs::metadata(&full) {
            Ok(meta) if meta.is_file() => {
                self.next_id += 1;
                Ok(self.next_id)
            }
            Ok(_) => Err(AssetError::NotFound {
                name: name.to_string(),
                path: full,
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(AssetError::NotFound {
                name: name.to_string(),
                path: full,
            }),
            Err(source) => Err(AssetError::Io {
                name: name.to_string(),
                source,
            }),
        }
    }
}

impl AssetLoader for FsAssetLoader {
    fn load_texture(&mut self, name: &str, path: &str) -> Result<TextureHandle, AssetError> {
        self.check(name, path).map(TextureHandle)
    }

    fn load_sound(&mut self, name: &str, path: &str) -> Result<SoundHandle, AssetError> {
        self.check(name, path).map(SoundHandle)
    }
}

/// Loader без файловой системы: всё загружается, кроме явно "сломанных" имён
#[derive(Debug, Default)]
pub struct InMemoryAssets {
    broken: BTreeSet<String>,
    next_id: u32,
}

impl InMemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_broken(mut self, name: impl Into<String>) -> Self {
        self.broken.insert(name.into());
        self
    }

    fn check(&mut self, name: &str) -> Result<u32, AssetError> {
        if self.broken.contains(name) {
            return Err(AssetError::Rejected(name.to_string()));
        }
        self.next_id += 1;
        Ok(self.next_id)
    }
}

impl AssetLoader for InMemoryAssets {
    fn load_texture(&mut self, name: &str, _path: &str) -> Result<TextureHandle, AssetError> {
        self.check(name).map(TextureHandle)
    }

    fn load_sound(&mut self, name: &str, _path: &str) -> Result<SoundHandle, AssetError> {
        self.check(name).map(SoundHandle)
    }
}

/// Результат preload: materials + sounds по логическому имени
#[derive(Debug, Clone, Default)]
pub struct AssetCatalog {
    textures: BTreeMap<String, TextureHandle>,
    sounds: BTreeMap<String, SoundHandle>,
}

impl AssetCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Загрузить весь manifest. Ошибки не фатальны.
    pub fn preload(manifest: &AssetManifest, loader: &mut dyn AssetLoader) -> Self {
        let mut catalog = Self::default();

        for (name, path) in &manifest.textures {
            match loader.load_texture(name, path) {
                Ok(handle) => {
                    catalog.textures.insert(name.clone(), handle);
                }
                Err(err) => crate::log_warning(&format!(
                    "🖼️ Texture `{}` failed, using flat color: {}",
                    name, err
                )),
            }
        }

        for (name, path) in &manifest.sounds {
            match loader.load_sound(name, path) {
                Ok(handle) => {
                    catalog.sounds.insert(name.clone(), handle);
                }
                Err(err) => crate::log_warning(&format!("🔇 Sound `{}` skipped: {}", name, err)),
            }
        }

        crate::log_info(&format!(
            "Assets ready: {}/{} textures, {}/{} sounds",
            catalog.textures.len(),
            manifest.textures.len(),
            catalog.sounds.len(),
            manifest.sounds.len()
        ));
        catalog
    }

    /// Материал по имени; без текстуры: flat color
    pub fn material(&self, name: &str) -> Material {
        match self.textures.get(name) {
            Some(handle) => Material::Texture(*handle),
            None => Material::Flat(fallback_color(name)),
        }
    }

    pub fn sound(&self, name: &str) -> Option<SoundHandle> {
        self.sounds.get(name).copied()
    }
}

fn fallback_color(name: &str) -> [f32; 3] {
    match name {
        "ground" => [0.3, 0.5, 0.3],
        "obstacle" | "crate" => [0.55, 0.5, 0.45],
        "player" => [0.2, 0.4, 0.9],
        "projectile" => [1.0, 0.9, 0.2],
        n if n.starts_with("enemy") => [0.85, 0.15, 0.15],
        _ => [1.0, 0.0, 1.0],
    }
}
