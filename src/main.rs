//! Gaze Pong entry point
//!
//! The browser build is driven by the page through `platform::web`. The native
//! build runs a headless match against a synthetic tracker: it calibrates,
//! plays until someone wins (or the frame cap hits) and logs the result.
//!
//! Usage: `gaze-pong [query] [seed]`, e.g. `gaze-pong "hard=1&debug=1" 42`

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::task::Poll;

    use gaze_pong::consts::*;
    use gaze_pong::gaze::{
        CalibrationProgress, CalibrationSampler, CaptureError, CaptureSession, CaptureSource,
        RawGaze, SamplerStatus, calibration_targets,
    };
    use gaze_pong::render::LogSink;
    use gaze_pong::sim::{CalibrationContext, GamePhase, PauseReason};
    use gaze_pong::{Session, Settings};
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    /// Give up after this many frames (about five minutes at 60 Hz)
    const MAX_FRAMES: u64 = 60 * 60 * 5;
    /// Tracker callback rate
    const GAZE_INTERVAL_MS: f64 = 33.0;
    /// Simulated look-away: no samples between these frames
    const LOOK_AWAY: std::ops::Range<u64> = 900..1080;

    /// Tracker that comes up after a few polls
    #[derive(Debug, Default)]
    struct SyntheticTracker {
        polls: u32,
    }

    impl CaptureSource for SyntheticTracker {
        fn begin(&mut self) -> Result<(), CaptureError> {
            log::info!("Synthetic tracker warming up");
            Ok(())
        }

        fn poll_ready(&mut self) -> Poll<Result<(), CaptureError>> {
            self.polls += 1;
            if self.polls > 20 {
                Poll::Ready(Ok(()))
            } else {
                Poll::Pending
            }
        }

        fn end(&mut self) {
            log::info!("Synthetic tracker shut down");
        }
    }

    /// A player's eye as seen by an uncalibrated tracker: scaled, offset, noisy
    struct Eye {
        rng: Pcg32,
    }

    impl Eye {
        fn look_at(&mut self, x: f64, y: f64) -> RawGaze {
            let jitter_x = self.rng.random_range(-5.0..5.0);
            let jitter_y = self.rng.random_range(-5.0..5.0);
            RawGaze::new(0.6 * x + 180.0 + jitter_x, 0.7 * y + 95.0 + jitter_y)
        }
    }

    pub fn run() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

        let mut args = std::env::args().skip(1);
        let settings = Settings::from_query(&args.next().unwrap_or_default());
        let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(1);
        log::info!("Gaze Pong (native) starting, seed {}", seed);

        let mut session = Session::new(seed, settings);
        let mut eye = Eye {
            rng: Pcg32::seed_from_u64(seed ^ 0x5eed),
        };
        let mut now = 0.0;

        // Camera
        let mut capture = CaptureSession::new(
            SyntheticTracker::default(),
            session.settings().capture_timeout_ms,
        );
        if let Err(e) = capture.start(now) {
            log::error!("Camera start failed: {}", e);
            return;
        }
        loop {
            match session.poll_capture(&mut capture, now) {
                Poll::Pending => now += FRAME_MS,
                Poll::Ready(Ok(())) => break,
                Poll::Ready(Err(e)) => {
                    if session.can_continue_without_camera(&e) {
                        break;
                    }
                    log::error!("Camera unavailable ({}): {}", e.code(), e);
                    return;
                }
            }
        }

        // Calibration
        session.begin_calibration(CalibrationContext::Initial);
        let targets = calibration_targets(ARENA_W, ARENA_H);
        let mut progress = CalibrationProgress::new(targets.len());
        for (index, &target) in targets.iter().enumerate() {
            let mut sampler = CalibrationSampler::new(target, now);
            loop {
                session.ingest(Some(eye.look_at(target.0, target.1)), now);
                match sampler.poll(session.gaze_mut(), now) {
                    SamplerStatus::Pending => now += 10.0,
                    SamplerStatus::Done(true) => {
                        progress.mark(index);
                        break;
                    }
                    SamplerStatus::Done(false) | SamplerStatus::Cancelled => break,
                }
            }
        }
        log::info!(
            "Calibrated {}/{} points",
            progress.completed(),
            progress.required()
        );
        if !session.commit_calibration() && !session.settings().debug {
            log::error!("Calibration failed");
            capture.stop(session.gaze_mut());
            return;
        }
        session.finish_calibration(now);

        // Match
        let mut sink = LogSink::default();
        let mut next_gaze = now;
        let mut frame: u64 = 0;
        while frame < MAX_FRAMES {
            frame += 1;
            now += FRAME_MS;

            if !LOOK_AWAY.contains(&frame) && now >= next_gaze {
                let ball = session.state().ball.pos;
                session.ingest(Some(eye.look_at(ball.x as f64, ball.y as f64)), now);
                next_gaze = now + GAZE_INTERVAL_MS;
            }

            if !session.tick(now, &mut sink) {
                match session.phase() {
                    GamePhase::GameOver => break,
                    GamePhase::Paused
                        if session.state().pause_reason == Some(PauseReason::TrackingLost)
                            && !LOOK_AWAY.contains(&frame) =>
                    {
                        session.resume(now);
                    }
                    _ => {}
                }
            }
        }

        let snapshot = session.snapshot(now);
        log::info!(
            "{} after {} frames{}",
            snapshot.scoreline(),
            sink.frames(),
            snapshot
                .message
                .as_deref()
                .map(|m| format!(": {}", m))
                .unwrap_or_default()
        );

        capture.stop(session.gaze_mut());
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    demo::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::wasm_main, this is just to satisfy the compiler
}
