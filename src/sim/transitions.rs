//! Phase transitions
//!
//! Every entry point the host can trigger (start, pause, resume, recalibrate,
//! quit, play again) plus the transitions the loop makes on its own (serve,
//! point scored, match over). Invalid requests are ignored and reported as
//! `false`.

use super::physics;
use super::state::{CalibrationContext, GamePhase, GameState, PauseReason, Scorer};

/// First serve of a match goes up, toward the CPU
const OPENING_SERVE: f32 = -1.0;

impl GameState {
    /// Schedule the loop; a no-op if it is already running
    pub fn start_loop(&mut self, now_ms: f64) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.last_frame_ms = None;
        self.last_gaze_ms = now_ms;
        true
    }

    /// Unschedule the loop; safe to call repeatedly
    pub fn stop_loop(&mut self) {
        self.running = false;
    }

    /// Freeze the ball at centre and arm the serve timer
    pub fn prepare_serve(&mut self, direction: f32, now_ms: f64) {
        physics::reset_ball(&mut self.ball);
        self.serve_direction = direction;
        self.freeze_until_ms = Some(now_ms + self.settings.freeze_ms);
        self.frozen_remaining_ms = None;
        self.phase = GamePhase::Countdown;
    }

    /// Serve if the freeze has elapsed; returns true on serve
    pub(crate) fn release_serve(&mut self, now_ms: f64) -> bool {
        let Some(until) = self.freeze_until_ms else {
            return false;
        };
        if now_ms < until || !self.ball.is_frozen() {
            return false;
        }
        physics::serve(&mut self.ball, self.serve_direction, &mut self.rng);
        self.freeze_until_ms = None;
        self.phase = GamePhase::Playing;
        log::debug!("Served toward {}", if self.serve_direction > 0.0 { "human" } else { "cpu" });
        true
    }

    /// Fresh match: scores zeroed, objects centred, opening serve armed
    pub fn start_match(&mut self, now_ms: f64) {
        self.reset_objects();
        self.score = Default::default();
        self.pause_reason = None;
        self.prepare_serve(OPENING_SERVE, now_ms);
        self.start_loop(now_ms);
        log::info!("Match started ({})", self.settings.difficulty.as_str());
    }

    /// Play again after a match (or restart one in progress)
    pub fn reset_match(&mut self, now_ms: f64) {
        self.start_match(now_ms);
    }

    /// Stop play and remember where to come back to
    ///
    /// Only a countdown or a rally can be paused. A paused countdown keeps its
    /// remaining freeze time.
    pub fn pause(&mut self, reason: PauseReason, now_ms: f64) -> bool {
        if !matches!(self.phase, GamePhase::Countdown | GamePhase::Playing) {
            return false;
        }
        self.stop_loop();
        if let Some(remaining) = self.freeze_until_ms.take().map(|until| (until - now_ms).max(0.0)) {
            self.frozen_remaining_ms = Some(remaining);
        }
        self.resume_phase = self.phase;
        self.phase = GamePhase::Paused;
        self.pause_reason = Some(reason);
        log::info!("Paused: {}", reason.message());
        true
    }

    /// Continue from a pause
    ///
    /// A recalibration pause only ends through `finish_calibration`.
    pub fn resume(&mut self, now_ms: f64) -> bool {
        if self.phase != GamePhase::Paused
            || self.pause_reason == Some(PauseReason::Recalibrating)
        {
            return false;
        }
        if let Some(remaining) = self.frozen_remaining_ms.take() {
            self.freeze_until_ms = Some(now_ms + remaining);
        }
        self.phase = self.resume_phase;
        self.pause_reason = None;
        self.start_loop(now_ms);
        log::info!("Resumed");
        true
    }

    /// Host is about to run calibration again mid-match
    pub fn request_recalibration(&mut self, now_ms: f64) {
        self.calibration_context = CalibrationContext::Recalibrate;
        if !self.pause(PauseReason::Recalibrating, now_ms) {
            self.stop_loop();
        }
    }

    /// Host is about to run the first calibration
    pub fn begin_calibration(&mut self, context: CalibrationContext) {
        self.calibration_context = context;
    }

    /// Calibration committed (or skipped in debug mode)
    pub fn finish_calibration(&mut self, now_ms: f64) {
        match self.calibration_context {
            CalibrationContext::Initial => self.start_match(now_ms),
            CalibrationContext::Recalibrate => self.resume_after_calibration(now_ms),
        }
    }

    /// Re-serve the current match with the pending serve direction
    fn resume_after_calibration(&mut self, now_ms: f64) {
        self.pause_reason = None;
        self.prepare_serve(self.serve_direction, now_ms);
        self.start_loop(now_ms);
        log::info!("Recalibrated, re-serving");
    }

    /// Credit a point, arm the next serve, end the match at the win score
    pub(crate) fn handle_score(&mut self, scorer: Scorer, now_ms: f64) {
        self.score.credit(scorer);
        log::info!(
            "Point {:?}: CPU {} - {} You",
            scorer,
            self.score.cpu,
            self.score.human
        );
        self.prepare_serve(scorer.next_serve_direction(), now_ms);
        if self.score.winner(self.settings.win_score).is_some() {
            self.end_match();
        }
    }

    fn end_match(&mut self) {
        self.stop_loop();
        self.freeze_until_ms = None;
        self.phase = GamePhase::GameOver;
        log::info!("Match over: {}", self.winner_message().unwrap_or_default());
    }

    /// "You win!" / "CPU wins!" once the match is over
    pub fn winner_message(&self) -> Option<&'static str> {
        if self.phase != GamePhase::GameOver {
            return None;
        }
        Some(if self.score.human > self.score.cpu {
            "You win!"
        } else {
            "CPU wins!"
        })
    }

    /// Back to the title screen
    pub fn quit(&mut self) {
        self.stop_loop();
        self.pause_reason = None;
        self.freeze_until_ms = None;
        self.frozen_remaining_ms = None;
        self.phase = GamePhase::Splash;
    }

    /// Camera switched off by the player
    pub fn camera_off(&mut self) {
        self.camera_active = false;
        self.tracking_lost = false;
        self.quit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    fn state() -> GameState {
        GameState::new(42, Settings::default())
    }

    #[test]
    fn test_start_match_enters_countdown() {
        let mut s = state();
        s.score.cpu = 3;
        s.start_match(100.0);
        assert_eq!(s.phase, GamePhase::Countdown);
        assert_eq!(s.score, Default::default());
        assert_eq!(s.serve_direction, -1.0);
        assert_eq!(s.freeze_until_ms, Some(1100.0));
        assert!(s.running);
        assert!(s.ball.is_frozen());
    }

    #[test]
    fn test_release_serve_after_freeze() {
        let mut s = state();
        s.start_match(0.0);
        assert!(!s.release_serve(999.0));
        assert!(s.release_serve(1000.0));
        assert_eq!(s.phase, GamePhase::Playing);
        assert_eq!(s.ball.vel.y, -6.0);
        assert!(s.freeze_until_ms.is_none());
    }

    #[test]
    fn test_pause_only_from_active_phases() {
        let mut s = state();
        assert!(!s.pause(PauseReason::User, 0.0));
        assert!(!s.resume(0.0));

        s.start_match(0.0);
        s.release_serve(1000.0);
        assert!(s.pause(PauseReason::User, 1200.0));
        assert!(!s.running);
        assert!(!s.pause(PauseReason::TrackingLost, 1300.0));
        assert_eq!(s.pause_reason, Some(PauseReason::User));

        assert!(s.resume(5000.0));
        assert_eq!(s.phase, GamePhase::Playing);
        assert!(s.running);
        assert_eq!(s.last_gaze_ms, 5000.0);
        assert!(!s.resume(5001.0));
    }

    #[test]
    fn test_paused_countdown_keeps_remaining_freeze() {
        let mut s = state();
        s.start_match(0.0);
        s.pause(PauseReason::User, 400.0);
        assert_eq!(s.countdown(10_000.0), Some(1));

        s.resume(10_000.0);
        assert_eq!(s.phase, GamePhase::Countdown);
        assert_eq!(s.freeze_until_ms, Some(10_600.0));
    }

    #[test]
    fn test_scoring_alternates_serve_and_ends_match() {
        let mut s = state();
        s.start_match(0.0);
        s.release_serve(1000.0);

        s.handle_score(Scorer::Cpu, 2000.0);
        assert_eq!(s.serve_direction, 1.0);
        assert_eq!(s.phase, GamePhase::Countdown);
        s.handle_score(Scorer::Human, 3000.0);
        assert_eq!(s.serve_direction, -1.0);

        for i in 0..4 {
            s.handle_score(Scorer::Human, 4000.0 + i as f64);
        }
        assert_eq!(s.phase, GamePhase::GameOver);
        assert!(!s.running);
        assert_eq!(s.winner_message(), Some("You win!"));
        assert_eq!(s.countdown(4000.0), None);

        s.reset_match(9000.0);
        assert_eq!(s.score, Default::default());
        assert_eq!(s.phase, GamePhase::Countdown);
    }

    #[test]
    fn test_recalibration_flow() {
        let mut s = state();
        s.start_match(0.0);
        s.release_serve(1000.0);
        s.handle_score(Scorer::Cpu, 1500.0);
        s.release_serve(2500.0);

        s.request_recalibration(3000.0);
        assert_eq!(s.phase, GamePhase::Paused);
        assert_eq!(s.pause_reason, Some(PauseReason::Recalibrating));

        s.finish_calibration(8000.0);
        assert_eq!(s.phase, GamePhase::Countdown);
        assert_eq!(s.score.cpu, 1);
        assert_eq!(s.serve_direction, 1.0);
        assert!(s.running);
        assert!(s.pause_reason.is_none());
    }

    #[test]
    fn test_recalibration_pause_ignores_resume() {
        let mut s = state();
        s.start_match(0.0);
        s.release_serve(1000.0);
        s.request_recalibration(2000.0);

        assert!(!s.resume(2500.0));
        assert_eq!(s.phase, GamePhase::Paused);
        assert_eq!(s.pause_reason, Some(PauseReason::Recalibrating));
        assert!(!s.running);

        s.finish_calibration(3000.0);
        assert_eq!(s.phase, GamePhase::Countdown);
        assert!(s.running);
    }

    #[test]
    fn test_initial_calibration_starts_match() {
        let mut s = state();
        s.begin_calibration(CalibrationContext::Initial);
        s.finish_calibration(0.0);
        assert_eq!(s.phase, GamePhase::Countdown);
        assert!(s.running);
    }

    #[test]
    fn test_quit_and_camera_off() {
        let mut s = state();
        s.camera_active = true;
        s.start_match(0.0);
        s.quit();
        assert_eq!(s.phase, GamePhase::Splash);
        assert!(!s.running);

        s.start_match(0.0);
        s.camera_off();
        assert_eq!(s.phase, GamePhase::Splash);
        assert!(!s.camera_active);
    }

    #[test]
    fn test_loop_start_stop_idempotent() {
        let mut s = state();
        assert!(s.start_loop(0.0));
        assert!(!s.start_loop(1.0));
        s.stop_loop();
        s.stop_loop();
        assert!(!s.running);
    }
}
