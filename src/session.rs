//! Owned game context
//!
//! A `Session` bundles the state machine, the gaze signal processor and the
//! input that persists between frames. Hosts (the browser bridge, the native
//! demo, tests) hold one and route every UI event and frame callback through
//! it.

use std::task::Poll;

use crate::consts::*;
use crate::gaze::{
    Axis, AxisMapping, CaptureError, CaptureSession, CaptureSource, RawGaze, SignalProcessor,
    ViewportBounds,
};
use crate::render::{RenderSink, Snapshot};
use crate::settings::Settings;
use crate::sim::{CalibrationContext, FallbackKeys, GamePhase, GameState, PauseReason, TickInput};

#[derive(Debug, Clone)]
pub struct Session {
    state: GameState,
    gaze: SignalProcessor,
    input: TickInput,
}

impl Session {
    pub fn new(seed: u64, settings: Settings) -> Self {
        let gaze = SignalProcessor::new(&settings);
        log::info!(
            "Session created (difficulty={}, debug={})",
            settings.difficulty.as_str(),
            settings.debug
        );
        Self {
            state: GameState::new(seed, settings),
            gaze,
            input: TickInput::default(),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn gaze(&self) -> &SignalProcessor {
        &self.gaze
    }

    pub fn gaze_mut(&mut self) -> &mut SignalProcessor {
        &mut self.gaze
    }

    pub fn settings(&self) -> &Settings {
        &self.state.settings
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    // --- gaze ---

    /// Push a tracker sample (`None` when the tracker reports no face)
    pub fn ingest(&mut self, raw: Option<RawGaze>, now_ms: f64) {
        self.gaze.ingest(raw, now_ms);
    }

    /// Arena coordinate for `axis`, or `None` if no fresh sample can be mapped
    pub fn resolve(&mut self, axis: Axis, now_ms: f64) -> Option<f64> {
        let extent = match axis {
            Axis::X => ARENA_W,
            Axis::Y => ARENA_H,
        };
        self.gaze
            .resolve(axis, self.input.viewport.as_ref(), extent as f64, now_ms)
    }

    /// No sample, or the newest is older than `threshold_ms` (default: `stale_ms`)
    pub fn is_stale(&self, threshold_ms: Option<f64>, now_ms: f64) -> bool {
        let threshold = threshold_ms.unwrap_or_else(|| self.gaze.stale_ms());
        self.gaze.is_stale(threshold, now_ms)
    }

    // --- calibration ---

    pub fn record_calibration_pair(&mut self, axis: Axis, raw: f64, target: f64) {
        self.gaze.record_calibration_pair(axis, raw, target);
    }

    pub fn fit_axis(&self, axis: Axis) -> Option<AxisMapping> {
        self.gaze.fit_axis(axis)
    }

    /// Install fitted mappings for both axes; `false` keeps the previous ones
    pub fn commit_calibration(&mut self) -> bool {
        self.gaze.commit_calibration()
    }

    pub fn reset_calibration(&mut self) {
        self.gaze.reset_calibration();
    }

    /// Enter the calibration screen with an empty sample set
    pub fn begin_calibration(&mut self, context: CalibrationContext) {
        self.gaze.reset_calibration();
        self.state.begin_calibration(context);
    }

    /// Leave the calibration screen: start the match or re-serve the current one
    pub fn finish_calibration(&mut self, now_ms: f64) {
        self.state.finish_calibration(now_ms);
    }

    /// Pause the match and prepare a fresh calibration run
    pub fn request_recalibration(&mut self, now_ms: f64) {
        self.state.request_recalibration(now_ms);
        self.gaze.reset_calibration();
    }

    // --- loop ---

    /// Advance one frame; returns `false` while the loop is stopped
    pub fn tick(&mut self, timestamp_ms: f64, sink: &mut dyn RenderSink) -> bool {
        crate::sim::tick(
            &mut self.state,
            &mut self.gaze,
            &self.input,
            timestamp_ms,
            sink,
        )
    }

    pub fn snapshot(&self, now_ms: f64) -> Snapshot {
        Snapshot::capture(&self.state, &self.gaze, now_ms)
    }

    pub fn start_match(&mut self, now_ms: f64) {
        self.state.start_match(now_ms);
    }

    pub fn reset_match(&mut self, now_ms: f64) {
        self.state.reset_match(now_ms);
    }

    pub fn pause(&mut self, reason: PauseReason, now_ms: f64) -> bool {
        self.state.pause(reason, now_ms)
    }

    pub fn resume(&mut self, now_ms: f64) -> bool {
        self.state.resume(now_ms)
    }

    pub fn quit(&mut self) {
        self.state.quit();
    }

    // --- capture ---

    /// Drive a pending capture start; marks the camera active once it is ready
    pub fn poll_capture<S: CaptureSource>(
        &mut self,
        capture: &mut CaptureSession<S>,
        now_ms: f64,
    ) -> Poll<Result<(), CaptureError>> {
        let poll = capture.poll(now_ms);
        if let Poll::Ready(result) = &poll {
            self.set_camera_active(result.is_ok());
        }
        poll
    }

    /// Whether a capture failure still lets the player continue
    ///
    /// Only debug mode carries on (on the keyboard fallback).
    pub fn can_continue_without_camera(&self, error: &CaptureError) -> bool {
        if self.state.settings.debug {
            log::warn!("Continuing without camera ({})", error.code());
            true
        } else {
            false
        }
    }

    pub fn set_camera_active(&mut self, active: bool) {
        self.state.camera_active = active;
        if !active {
            self.state.tracking_lost = false;
        }
    }

    /// Player switched the camera off: stop capture and return to the title
    pub fn camera_off<S: CaptureSource>(&mut self, capture: &mut CaptureSession<S>) {
        capture.stop(&mut self.gaze);
        self.state.camera_off();
        log::info!("Camera off");
    }

    // --- host input ---

    pub fn set_viewport(&mut self, viewport: Option<ViewportBounds>) {
        self.input.viewport = viewport;
    }

    pub fn set_fallback_keys(&mut self, keys: FallbackKeys) {
        self.input.fallback = keys;
    }
}
