//! Frame-driven simulation tick
//!
//! Called once per display refresh with the refresh timestamp. The step order
//! is fixed: serve release, human paddle, CPU paddle, ball physics (scoring
//! handled inline), tracking-lost check, render.

use super::control::{FallbackKeys, HumanControl, steer_cpu, steer_human};
use super::physics;
use super::state::{GamePhase, GameState, PauseReason};
use crate::consts::*;
use crate::gaze::{Axis, SignalProcessor, ViewportBounds};
use crate::render::{RenderSink, Snapshot};

/// Host input that persists between ticks
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Held arrow keys (used only in debug mode)
    pub fallback: FallbackKeys,
    /// Canvas rectangle for uncalibrated gaze mapping
    pub viewport: Option<ViewportBounds>,
}

/// Elapsed time as a fraction of a 60 Hz frame, capped at `MAX_DT`
pub fn frame_dt(last_ms: Option<f64>, now_ms: f64) -> f32 {
    match last_ms {
        Some(last) => ((now_ms - last) / FRAME_MS).clamp(0.0, MAX_DT as f64) as f32,
        None => 0.0,
    }
}

/// Advance the match by one frame
///
/// Does nothing while the loop is stopped. Returns `true` if a frame was
/// simulated (and rendered).
pub fn tick(
    state: &mut GameState,
    gaze: &mut SignalProcessor,
    input: &TickInput,
    timestamp_ms: f64,
    sink: &mut dyn RenderSink,
) -> bool {
    if !state.running {
        return false;
    }

    let dt = frame_dt(state.last_frame_ms, timestamp_ms);
    state.last_frame_ms = Some(timestamp_ms);

    state.release_serve(timestamp_ms);

    // Human paddle
    let gaze_x = gaze
        .resolve(
            Axis::X,
            input.viewport.as_ref(),
            ARENA_W as f64,
            timestamp_ms,
        )
        .map(|x| x as f32);
    if gaze_x.is_some() {
        state.last_gaze_ms = timestamp_ms;
    }
    let control = HumanControl {
        smoothing: state.settings.eye_smoothing,
        deadband: state.settings.eye_deadband,
    };
    let fallback = state.settings.debug.then_some(input.fallback);
    steer_human(&mut state.human, gaze_x, fallback, control, dt);
    state.tracking_lost = state.camera_active && gaze.is_stale(gaze.stale_ms(), timestamp_ms);

    // CPU paddle
    steer_cpu(&mut state.cpu, state.ball.pos.x, state.settings.cpu_speed(), dt);

    if let Some(scorer) = physics::advance(&mut state.ball, &state.human, &state.cpu, dt) {
        state.handle_score(scorer, timestamp_ms);
    }

    if state.running
        && state.phase == GamePhase::Playing
        && state.freeze_until_ms.is_none()
        && state.camera_active
        && timestamp_ms - state.last_gaze_ms > state.settings.tracking_lost_ms
    {
        state.pause(PauseReason::TrackingLost, timestamp_ms);
    }

    sink.render(&Snapshot::capture(state, gaze, timestamp_ms));
    true
}
