//! Внешние collaborators frame loop
//!
//! Core вызывает их через узкие интерфейсы и никогда не читает состояние
//! обратно (кроме Scene transform для тестов/отладки):
//! - audio: fire-and-forget, ошибки глотаются и логируются
//! - overlay: one-way UI вызовы (title / hud / game over / score)
//! - scene: visual handles и их transforms
//! - assets: manifest → materials/sounds с fallback

pub mod assets;
pub mod audio;
pub mod overlay;
pub mod scene;

pub use assets::{
    AssetCatalog, AssetError, AssetLoader, FsAssetLoader, InMemoryAssets, Material, SoundHandle,
    TextureHandle,
};
pub use audio::{AudioBus, AudioError, AudioLog, AudioSink, SoundCue};
pub use overlay::{Overlay, OverlayCall, OverlayLog};
pub use scene::{Scene, SceneBuffer, SceneNode, VisualHandle, VisualKind};

/// Набор collaborators, которые Session получает при создании
pub struct Services {
    pub audio: Box<dyn AudioSink>,
    pub overlay: Box<dyn Overlay>,
    pub scene: Box<dyn Scene>,
    pub assets: AssetCatalog,
}

impl Services {
    /// Headless набор: in-memory scene, логирующие audio/overlay
    pub fn headless(assets: AssetCatalog) -> Self {
        Self {
            audio: Box::new(AudioLog::default()),
            overlay: Box::new(OverlayLog::default()),
            scene: Box::new(SceneBuffer::default()),
            assets,
        }
    }
}
