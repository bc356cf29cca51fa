//! Bevy host: SimulationPlugin гоняет Session раз в `Update`
//!
//! Flow:
//! 1. Input layer (autopilot / платформа) пишет `PlayerInput`
//! 2. `drive_session`: edges (start/restart/fire/jump) → look → frame(dt)
//! 3. Изменения score/state публикуются как events

use bevy::prelude::*;

use crate::physics::RapierWorld;
use crate::player::InputState;
use crate::session::{EndReason, Session, SessionState};

/// Активная сессия (rapier backend)
#[derive(Resource)]
pub struct ActiveSession(pub Session<RapierWorld>);

/// Ввод текущего кадра
///
/// `movement`: удерживаемое состояние; edge-флаги сбрасываются после
/// каждого `drive_session`.
#[derive(Resource, Debug, Clone, Default)]
pub struct PlayerInput {
    pub movement: InputState,
    pub look_delta: Vec2,
    pub start: bool,
    pub restart: bool,
    pub fire: bool,
    pub jump: bool,
}

impl PlayerInput {
    fn clear_edges(&mut self) {
        self.look_delta = Vec2::ZERO;
        self.start = false;
        self.restart = false;
        self.fire = false;
        self.jump = false;
    }
}

/// Event: счёт изменился
#[derive(Event, Debug, Clone)]
pub struct ScoreChanged {
    pub score: u32,
}

/// Event: сессия перешла в GameOver
#[derive(Event, Debug, Clone)]
pub struct SessionEnded {
    pub reason: EndReason,
    pub final_score: u32,
}

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlayerInput>()
            .add_event::<ScoreChanged>()
            .add_event::<SessionEnded>()
            .add_systems(Update, drive_session);
    }
}

/// Один кадр Session. Без `ActiveSession` ничего не делает.
pub fn drive_session(
    time: Res<Time>,
    session: Option<ResMut<ActiveSession>>,
    mut input: ResMut<PlayerInput>,
    mut score_events: EventWriter<ScoreChanged>,
    mut end_events: EventWriter<SessionEnded>,
) {
    let Some(mut session) = session else {
        return;
    };
    let session = &mut session.0;

    if input.restart {
        session.restart();
    } else if input.start {
        session.start();
    }
    if input.fire {
        session.fire();
    }
    if input.jump {
        session.jump();
    }
    session.look(input.look_delta, input.movement.pointer_locked);

    let report = session.frame(time.delta_secs(), &input.movement);
    input.clear_edges();

    if report.score_gained > 0 {
        score_events.write(ScoreChanged {
            score: session.score(),
        });
    }
    if let Some(reason) = report.ended {
        debug_assert_eq!(session.state(), SessionState::GameOver);
        end_events.write(SessionEnded {
            reason,
            final_score: session.score(),
        });
    }
}
