//! Browser bridge
//!
//! The page owns the canvas, the camera and the gaze tracker library. It
//! forwards tracker callbacks and UI events to a `WebGame` and draws whatever
//! snapshot JSON comes back from `frame`.

use std::task::Poll;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::consts::*;
use crate::gaze::{
    CalibrationProgress, CalibrationSampler, CaptureError, CaptureSession, CaptureSource, RawGaze,
    SamplerStatus, ViewportBounds, calibration_targets,
};
use crate::session::Session;
use crate::settings::Settings;
use crate::sim::{CalibrationContext, FallbackKeys, PauseReason};

/// Milliseconds from the page's performance clock
fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

/// Gaze tracker object supplied by the page
///
/// Expected shape: `begin()`, `end()`, optional `pause()` / `resume()`, and a
/// `status` property that reads `"pending"`, `"ready"`, `"denied"` or
/// `"unavailable"`.
struct JsTracker {
    handle: JsValue,
}

impl JsTracker {
    fn call(&self, name: &str) -> Result<(), JsValue> {
        let method = js_sys::Reflect::get(&self.handle, &JsValue::from_str(name))?;
        match method.dyn_into::<js_sys::Function>() {
            Ok(f) => f.call0(&self.handle).map(|_| ()),
            Err(_) => Ok(()),
        }
    }

    fn status(&self) -> String {
        js_sys::Reflect::get(&self.handle, &JsValue::from_str("status"))
            .ok()
            .and_then(|v| v.as_string())
            .unwrap_or_else(|| "unavailable".into())
    }
}

fn describe(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}

impl CaptureSource for JsTracker {
    fn begin(&mut self) -> Result<(), CaptureError> {
        self.call("begin")
            .map_err(|e| CaptureError::Unavailable(describe(&e)))
    }

    fn poll_ready(&mut self) -> Poll<Result<(), CaptureError>> {
        match self.status().as_str() {
            "pending" => Poll::Pending,
            "ready" => Poll::Ready(Ok(())),
            "denied" => Poll::Ready(Err(CaptureError::Denied("camera permission".into()))),
            other => Poll::Ready(Err(CaptureError::Unavailable(other.to_string()))),
        }
    }

    fn end(&mut self) {
        if let Err(e) = self.call("end") {
            log::warn!("Tracker end failed: {}", describe(&e));
        }
    }

    fn pause(&mut self) {
        let _ = self.call("pause");
    }

    fn resume(&mut self) {
        let _ = self.call("resume");
    }
}

/// Game instance handed to the page
#[wasm_bindgen]
pub struct WebGame {
    session: Session,
    capture: Option<CaptureSession<JsTracker>>,
    targets: Vec<(f64, f64)>,
    progress: CalibrationProgress,
    sampler: Option<(usize, CalibrationSampler)>,
}

#[wasm_bindgen]
impl WebGame {
    /// `query` is the page's `location.search`
    #[wasm_bindgen(constructor)]
    pub fn new(query: &str) -> WebGame {
        let settings = Settings::from_query(query);
        let seed = (js_sys::Math::random() * u32::MAX as f64) as u64;
        let targets = calibration_targets(ARENA_W, ARENA_H);
        let progress = CalibrationProgress::new(targets.len());
        WebGame {
            session: Session::new(seed, settings),
            capture: None,
            targets,
            progress,
            sampler: None,
        }
    }

    /// Debug mode flag (enables arrow keys and the gaze readout)
    pub fn debug(&self) -> bool {
        self.session.settings().debug
    }

    /// Active settings as JSON, for the debug panel
    pub fn settings(&self) -> String {
        self.session.settings().to_json()
    }

    // --- camera ---

    /// Start the tracker; poll `poll_camera` every frame afterwards
    pub fn start_camera(&mut self, tracker: JsValue) -> Result<(), JsValue> {
        let timeout = self.session.settings().capture_timeout_ms;
        let capture = self
            .capture
            .get_or_insert_with(|| CaptureSession::new(JsTracker { handle: tracker }, timeout));
        capture
            .start(now_ms())
            .map_err(|e| JsValue::from_str(e.code()))
    }

    /// `"pending"`, `"ready"`, or the failure code
    pub fn poll_camera(&mut self) -> String {
        let Some(capture) = self.capture.as_mut() else {
            return "unavailable".into();
        };
        match self.session.poll_capture(capture, now_ms()) {
            Poll::Pending => "pending".into(),
            Poll::Ready(Ok(())) => "ready".into(),
            Poll::Ready(Err(e)) => e.code().into(),
        }
    }

    /// True if the page may continue after a capture failure
    pub fn continue_without_camera(&self, code: &str) -> bool {
        let error = match code {
            "denied" => CaptureError::Denied(code.into()),
            "timeout" => CaptureError::TimedOut {
                after_ms: self.session.settings().capture_timeout_ms,
            },
            _ => CaptureError::Unavailable(code.into()),
        };
        self.session.can_continue_without_camera(&error)
    }

    pub fn camera_off(&mut self) -> String {
        if let Some(mut capture) = self.capture.take() {
            self.session.camera_off(&mut capture);
        } else {
            self.session.quit();
        }
        self.snapshot()
    }

    // --- gaze input ---

    /// Tracker callback; pass `undefined` coordinates when no face is found
    pub fn ingest(&mut self, x: Option<f64>, y: Option<f64>) {
        let raw = x.zip(y).map(|(x, y)| RawGaze::new(x, y));
        self.session.ingest(raw, now_ms());
    }

    /// Canvas `getBoundingClientRect()` in page coordinates
    pub fn set_viewport(&mut self, left: f64, top: f64, width: f64, height: f64) {
        self.session
            .set_viewport(Some(ViewportBounds::new(left, top, width, height)));
    }

    pub fn set_keys(&mut self, left: bool, right: bool) {
        self.session.set_fallback_keys(FallbackKeys { left, right });
    }

    // --- calibration ---

    /// Targets as a JSON array of `[x, y]` arena coordinates
    pub fn calibration_targets(&self) -> String {
        serde_json::to_string(&self.targets).unwrap_or_default()
    }

    pub fn begin_calibration(&mut self, recalibrate: bool) {
        let context = if recalibrate {
            CalibrationContext::Recalibrate
        } else {
            CalibrationContext::Initial
        };
        self.session.begin_calibration(context);
        self.progress.reset();
        self.sampler = None;
    }

    /// Player clicked target `index`; any point still sampling is cancelled
    pub fn sample_point(&mut self, index: usize) -> bool {
        let Some(&target) = self.targets.get(index) else {
            return false;
        };
        if let Some((_, sampler)) = self.sampler.as_mut() {
            sampler.cancel();
        }
        self.sampler = Some((index, CalibrationSampler::new(target, now_ms())));
        true
    }

    /// `"idle"`, `"pending"`, `"done"`, `"failed"` or `"cancelled"`
    pub fn poll_sampler(&mut self) -> String {
        let Some((index, sampler)) = self.sampler.as_mut() else {
            return "idle".into();
        };
        let status = sampler.poll(self.session.gaze_mut(), now_ms());
        let label = match status {
            SamplerStatus::Pending => return "pending".into(),
            SamplerStatus::Done(true) => {
                self.progress.mark(*index);
                "done"
            }
            SamplerStatus::Done(false) => "failed",
            SamplerStatus::Cancelled => "cancelled",
        };
        self.sampler = None;
        label.into()
    }

    /// Whether target `index` has been sampled successfully
    pub fn point_done(&self, index: usize) -> bool {
        self.progress.is_completed(index)
    }

    /// Number of completed targets
    pub fn calibrated_points(&self) -> usize {
        self.progress.completed()
    }

    /// All targets done, or debug mode lets the player skip
    pub fn calibration_ready(&self) -> bool {
        self.progress.ready() || self.debug()
    }

    /// Fit and install the mappings; the page shows an error on `false`
    pub fn commit_calibration(&mut self) -> bool {
        self.session.commit_calibration()
    }

    pub fn finish_calibration(&mut self) -> String {
        if let Some((_, sampler)) = self.sampler.as_mut() {
            sampler.cancel();
        }
        self.sampler = None;
        self.session.finish_calibration(now_ms());
        self.snapshot()
    }

    pub fn recalibrate(&mut self) -> String {
        self.session.request_recalibration(now_ms());
        self.progress.reset();
        self.snapshot()
    }

    // --- match control ---

    /// Called from `requestAnimationFrame`; returns the snapshot to draw
    pub fn frame(&mut self, timestamp: f64) -> String {
        let mut json = None;
        let mut sink = |s: &crate::render::Snapshot| json = Some(s.to_json());
        self.session.tick(timestamp, &mut sink);
        json.unwrap_or_else(|| self.session.snapshot(timestamp).to_json())
    }

    pub fn snapshot(&self) -> String {
        self.session.snapshot(now_ms()).to_json()
    }

    /// Whether the page should keep requesting animation frames
    pub fn running(&self) -> bool {
        self.session.state().running
    }

    pub fn start_match(&mut self) -> String {
        self.session.start_match(now_ms());
        self.snapshot()
    }

    pub fn reset_match(&mut self) -> String {
        self.session.reset_match(now_ms());
        self.snapshot()
    }

    pub fn pause(&mut self) -> String {
        if self.session.pause(PauseReason::User, now_ms()) {
            if let Some(capture) = self.capture.as_mut() {
                capture.pause();
            }
        }
        self.snapshot()
    }

    pub fn resume(&mut self) -> String {
        if self.session.resume(now_ms()) {
            if let Some(capture) = self.capture.as_mut() {
                capture.resume();
            }
        }
        self.snapshot()
    }

    pub fn quit(&mut self) -> String {
        self.session.quit();
        self.snapshot()
    }
}

#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialised".into());
    }
    log::info!("Gaze Pong starting...");
}
