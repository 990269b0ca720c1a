//! Render output
//!
//! Drawing belongs to the host. Once per tick the loop hands a read-only
//! `Snapshot` to a `RenderSink`; nothing flows back into the game state.

use serde::Serialize;

use crate::gaze::{GazeReadout, SignalProcessor};
use crate::sim::{Ball, GamePhase, GameState, Paddle, Score};

/// Everything the host needs to draw one frame
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub timestamp_ms: f64,
    pub phase: GamePhase,
    pub score: Score,
    pub ball: Ball,
    pub human: Paddle,
    pub cpu: Paddle,
    /// Serve countdown digit
    pub countdown: Option<u32>,
    /// Show the "tracking lost" badge
    pub tracking_lost: bool,
    /// Overlay text (pause reason or match result)
    pub message: Option<String>,
    /// Raw/smoothed gaze readout, debug mode only
    pub gaze: Option<GazeReadout>,
}

impl Snapshot {
    pub fn capture(state: &GameState, gaze: &SignalProcessor, now_ms: f64) -> Self {
        let message = match state.phase {
            GamePhase::Paused => state.pause_reason.map(|r| r.message().to_string()),
            GamePhase::GameOver => state
                .winner_message()
                .map(|winner| format!("{} Play again?", winner)),
            _ => None,
        };

        Self {
            timestamp_ms: now_ms,
            phase: state.phase,
            score: state.score,
            ball: state.ball.clone(),
            human: state.human.clone(),
            cpu: state.cpu.clone(),
            countdown: state.countdown(now_ms),
            tracking_lost: state.tracking_lost,
            message,
            gaze: if state.settings.debug {
                gaze.readout(now_ms)
            } else {
                None
            },
        }
    }

    /// Scoreboard line
    pub fn scoreline(&self) -> String {
        format!("CPU ↑ {} — {} YOU ↓", self.score.cpu, self.score.human)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Receives one snapshot per tick
pub trait RenderSink {
    fn render(&mut self, snapshot: &Snapshot);
}

impl<F: FnMut(&Snapshot)> RenderSink for F {
    fn render(&mut self, snapshot: &Snapshot) {
        self(snapshot)
    }
}

/// Discards every frame
#[derive(Debug, Default)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn render(&mut self, _snapshot: &Snapshot) {}
}

/// Logs phase and score changes; per-frame detail at trace level
#[derive(Debug, Default)]
pub struct LogSink {
    last_phase: Option<GamePhase>,
    last_score: Option<Score>,
    frames: u64,
}

impl LogSink {
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl RenderSink for LogSink {
    fn render(&mut self, snapshot: &Snapshot) {
        self.frames += 1;
        if self.last_phase != Some(snapshot.phase) {
            log::info!(
                "[{:>7.0}ms] phase {:?}{}",
                snapshot.timestamp_ms,
                snapshot.phase,
                snapshot
                    .message
                    .as_deref()
                    .map(|m| format!(" - {}", m))
                    .unwrap_or_default()
            );
            self.last_phase = Some(snapshot.phase);
        }
        if self.last_score != Some(snapshot.score) {
            log::info!("{}", snapshot.scoreline());
            self.last_score = Some(snapshot.score);
        }
        log::trace!(
            "ball=({:.1},{:.1}) human={:.1} cpu={:.1} countdown={:?}",
            snapshot.ball.pos.x,
            snapshot.ball.pos.y,
            snapshot.human.x,
            snapshot.cpu.x,
            snapshot.countdown
        );
    }
}
