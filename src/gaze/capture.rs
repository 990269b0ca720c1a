//! Capture source lifecycle
//!
//! The tracker itself is provided by the host. Starting it can take an
//! unbounded amount of time (camera permission prompt, model download), so the
//! session polls it from the frame loop and gives up after a timeout.

use std::task::Poll;

use thiserror::Error;

use super::signal::SignalProcessor;

/// Why a capture source could not be started
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CaptureError {
    #[error("tracker unavailable: {0}")]
    Unavailable(String),
    #[error("camera access denied: {0}")]
    Denied(String),
    #[error("timed out waiting for tracker after {after_ms:.0}ms")]
    TimedOut { after_ms: f64 },
}

impl CaptureError {
    /// Stable identifier for hosts that switch on the failure kind
    pub fn code(&self) -> &'static str {
        match self {
            CaptureError::Unavailable(_) => "unavailable",
            CaptureError::Denied(_) => "denied",
            CaptureError::TimedOut { .. } => "timeout",
        }
    }
}

/// External gaze tracker
///
/// Samples are pushed by the host straight into the `SignalProcessor`; this
/// trait only covers the lifecycle.
pub trait CaptureSource {
    /// Kick off initialization
    fn begin(&mut self) -> Result<(), CaptureError>;

    /// Report initialization progress
    fn poll_ready(&mut self) -> Poll<Result<(), CaptureError>>;

    /// Shut the tracker down
    fn end(&mut self);

    fn pause(&mut self) {}

    fn resume(&mut self) {}
}

/// Lifecycle state of a capture session
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    Idle,
    Starting { since_ms: f64 },
    Active,
    Failed(CaptureError),
}

/// Drives a `CaptureSource` through start, timeout and stop
#[derive(Debug)]
pub struct CaptureSession<S: CaptureSource> {
    source: S,
    state: CaptureState,
    timeout_ms: f64,
}

impl<S: CaptureSource> CaptureSession<S> {
    pub fn new(source: S, timeout_ms: f64) -> Self {
        Self {
            source,
            state: CaptureState::Idle,
            timeout_ms,
        }
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == CaptureState::Active
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Begin starting the source; a no-op if it is already starting or active
    pub fn start(&mut self, now_ms: f64) -> Result<(), CaptureError> {
        match self.state {
            CaptureState::Active | CaptureState::Starting { .. } => return Ok(()),
            CaptureState::Idle | CaptureState::Failed(_) => {}
        }

        if let Err(e) = self.source.begin() {
            log::warn!("Capture start failed: {}", e);
            self.state = CaptureState::Failed(e.clone());
            return Err(e);
        }
        self.state = CaptureState::Starting { since_ms: now_ms };
        Ok(())
    }

    /// Advance a pending start
    ///
    /// Returns `Pending` while the source is still coming up, then the final
    /// outcome once. Idle and failed sessions report their state immediately.
    pub fn poll(&mut self, now_ms: f64) -> Poll<Result<(), CaptureError>> {
        let since_ms = match &self.state {
            CaptureState::Starting { since_ms } => *since_ms,
            CaptureState::Active => return Poll::Ready(Ok(())),
            CaptureState::Failed(e) => return Poll::Ready(Err(e.clone())),
            CaptureState::Idle => {
                return Poll::Ready(Err(CaptureError::Unavailable("not started".into())));
            }
        };

        match self.source.poll_ready() {
            Poll::Ready(Ok(())) => {
                log::info!("Capture ready after {:.0}ms", now_ms - since_ms);
                self.state = CaptureState::Active;
                Poll::Ready(Ok(()))
            }
            Poll::Ready(Err(e)) => {
                log::warn!("Capture failed: {}", e);
                self.state = CaptureState::Failed(e.clone());
                Poll::Ready(Err(e))
            }
            Poll::Pending if now_ms - since_ms > self.timeout_ms => {
                let e = CaptureError::TimedOut {
                    after_ms: self.timeout_ms,
                };
                log::warn!("{}", e);
                self.source.end();
                self.state = CaptureState::Failed(e.clone());
                Poll::Ready(Err(e))
            }
            Poll::Pending => Poll::Pending,
        }
    }

    /// Stop the source and wipe gaze state; safe to call repeatedly
    pub fn stop(&mut self, gaze: &mut SignalProcessor) {
        if matches!(
            self.state,
            CaptureState::Active | CaptureState::Starting { .. }
        ) {
            self.source.end();
            log::info!("Capture stopped");
        }
        self.state = CaptureState::Idle;
        gaze.clear();
    }

    pub fn pause(&mut self) {
        if self.is_active() {
            self.source.pause();
        }
    }

    pub fn resume(&mut self) {
        if self.is_active() {
            self.source.resume();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gaze::signal::RawGaze;

    /// Becomes ready after a fixed number of polls
    #[derive(Debug, Default)]
    struct FakeTracker {
        polls_until_ready: Option<u32>,
        refuse: bool,
        begins: u32,
        ends: u32,
    }

    impl CaptureSource for FakeTracker {
        fn begin(&mut self) -> Result<(), CaptureError> {
            self.begins += 1;
            if self.refuse {
                return Err(CaptureError::Denied("user said no".into()));
            }
            Ok(())
        }

        fn poll_ready(&mut self) -> Poll<Result<(), CaptureError>> {
            match self.polls_until_ready.as_mut() {
                Some(0) => Poll::Ready(Ok(())),
                Some(n) => {
                    *n -= 1;
                    Poll::Pending
                }
                None => Poll::Pending,
            }
        }

        fn end(&mut self) {
            self.ends += 1;
        }
    }

    #[test]
    fn test_start_then_ready() {
        let tracker = FakeTracker {
            polls_until_ready: Some(2),
            ..Default::default()
        };
        let mut session = CaptureSession::new(tracker, 3500.0);
        session.start(0.0).unwrap();
        assert!(session.poll(10.0).is_pending());
        assert!(session.poll(20.0).is_pending());
        assert_eq!(session.poll(30.0), Poll::Ready(Ok(())));
        assert!(session.is_active());

        // Second start is a no-op
        session.start(40.0).unwrap();
        assert_eq!(session.source().begins, 1);
    }

    #[test]
    fn test_start_times_out() {
        let mut session = CaptureSession::new(FakeTracker::default(), 3500.0);
        session.start(0.0).unwrap();
        assert!(session.poll(3500.0).is_pending());
        let Poll::Ready(Err(e)) = session.poll(3501.0) else {
            panic!("expected timeout");
        };
        assert_eq!(e.code(), "timeout");
        assert_eq!(session.source().ends, 1);
        assert!(matches!(session.state(), CaptureState::Failed(_)));
    }

    #[test]
    fn test_denied_is_distinguishable() {
        let tracker = FakeTracker {
            refuse: true,
            ..Default::default()
        };
        let mut session = CaptureSession::new(tracker, 3500.0);
        let err = session.start(0.0).unwrap_err();
        assert_eq!(err.code(), "denied");
        assert_eq!(session.poll(1.0), Poll::Ready(Err(err)));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let tracker = FakeTracker {
            polls_until_ready: Some(0),
            ..Default::default()
        };
        let mut session = CaptureSession::new(tracker, 3500.0);
        let mut gaze = SignalProcessor::default();

        // Never started
        session.stop(&mut gaze);
        assert_eq!(session.source().ends, 0);

        session.start(0.0).unwrap();
        assert!(session.poll(1.0).is_ready());
        gaze.ingest(Some(RawGaze::new(10.0, 10.0)), 1.0);

        session.stop(&mut gaze);
        let once = (session.state().clone(), gaze.last_sample(), gaze.smoothed_sample());
        session.stop(&mut gaze);
        let twice = (session.state().clone(), gaze.last_sample(), gaze.smoothed_sample());

        assert_eq!(once, twice);
        assert_eq!(once, (CaptureState::Idle, None, None));
        assert_eq!(session.source().ends, 1);
    }
}
