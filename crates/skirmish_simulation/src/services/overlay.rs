//! UI overlay collaborator (one-way)

use std::sync::{Arc, Mutex};

pub trait Overlay: Send + Sync {
    fn show_title(&mut self);
    fn show_hud(&mut self);
    fn show_game_over(&mut self, final_score: u32);
    fn update_score(&mut self, score: u32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayCall {
    Title,
    Hud,
    GameOver(u32),
    Score(u32),
}

/// Overlay-журнал (headless / тесты). Clone разделяет журнал.
#[derive(Debug, Clone, Default)]
pub struct OverlayLog {
    calls: Arc<Mutex<Vec<OverlayCall>>>,
}

impl OverlayLog {
    pub fn calls(&self) -> Vec<OverlayCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<OverlayCall> {
        self.calls().last().copied()
    }

    fn push(&self, call: OverlayCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl Overlay for OverlayLog {
    fn show_title(&mut self) {
        self.push(OverlayCall::Title);
    }

    fn show_hud(&mut self) {
        self.push(OverlayCall::Hud);
    }

    fn show_game_over(&mut self, final_score: u32) {
        self.push(OverlayCall::GameOver(final_score));
    }

    fn update_score(&mut self, score: u32) {
        self.push(OverlayCall::Score(score));
    }
}
