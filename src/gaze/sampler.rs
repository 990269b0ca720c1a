//! Calibration point sampling
//!
//! While the player fixates a calibration target, the host polls a sampler
//! from its frame loop. Every `SAMPLE_INTERVAL_MS` the sampler copies the
//! latest raw sample into the calibration set, stopping at `SAMPLES_PER_POINT`
//! or `MAX_ATTEMPTS`, whichever comes first.

use super::signal::SignalProcessor;

/// Samples wanted per calibration point
pub const SAMPLES_PER_POINT: u32 = 15;
/// Polls before giving up on a point
pub const MAX_ATTEMPTS: u32 = SAMPLES_PER_POINT * 4;
/// Spacing between polls
pub const SAMPLE_INTERVAL_MS: f64 = 30.0;

/// Normalized calibration target layout (4x4 grid)
pub const CALIBRATION_GRID: [(f32, f32); 16] = [
    (0.08, 0.12),
    (0.35, 0.12),
    (0.65, 0.12),
    (0.92, 0.12),
    (0.08, 0.38),
    (0.35, 0.38),
    (0.65, 0.38),
    (0.92, 0.38),
    (0.08, 0.68),
    (0.35, 0.68),
    (0.65, 0.68),
    (0.92, 0.68),
    (0.08, 0.9),
    (0.35, 0.9),
    (0.65, 0.9),
    (0.92, 0.9),
];

/// Arena-space targets for the calibration grid
pub fn calibration_targets(arena_w: f32, arena_h: f32) -> Vec<(f64, f64)> {
    CALIBRATION_GRID
        .iter()
        .map(|&(nx, ny)| ((nx * arena_w) as f64, (ny * arena_h) as f64))
        .collect()
}

/// Outcome of polling a sampler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerStatus {
    /// Still collecting
    Pending,
    /// Finished; `true` if the point can count as calibrated
    Done(bool),
    Cancelled,
}

/// Bounded polling loop for one calibration target
#[derive(Debug, Clone)]
pub struct CalibrationSampler {
    target: (f64, f64),
    collected: u32,
    attempts: u32,
    next_due_ms: f64,
    status: SamplerStatus,
}

impl CalibrationSampler {
    /// The first poll happens immediately
    pub fn new(target: (f64, f64), now_ms: f64) -> Self {
        Self {
            target,
            collected: 0,
            attempts: 0,
            next_due_ms: now_ms,
            status: SamplerStatus::Pending,
        }
    }

    pub fn target(&self) -> (f64, f64) {
        self.target
    }

    pub fn collected(&self) -> u32 {
        self.collected
    }

    pub fn status(&self) -> SamplerStatus {
        self.status
    }

    /// Abandon the point; later polls do nothing
    pub fn cancel(&mut self) {
        if self.status == SamplerStatus::Pending {
            self.status = SamplerStatus::Cancelled;
        }
    }

    /// Take at most one attempt if one is due by `now_ms`
    ///
    /// Missed attempts are not made up; the next one is due a full interval
    /// after this poll.
    pub fn poll(&mut self, gaze: &mut SignalProcessor, now_ms: f64) -> SamplerStatus {
        if self.status == SamplerStatus::Pending && now_ms >= self.next_due_ms {
            self.attempt(gaze);
            self.next_due_ms = now_ms + SAMPLE_INTERVAL_MS;
        }
        self.status
    }

    fn attempt(&mut self, gaze: &mut SignalProcessor) {
        self.attempts += 1;
        if let Some(raw) = gaze.last_sample() {
            gaze.add_calibration_sample(&raw, self.target);
            self.collected += 1;
        }

        if self.collected >= SAMPLES_PER_POINT {
            self.status = SamplerStatus::Done(true);
        } else if self.attempts >= MAX_ATTEMPTS {
            log::debug!(
                "Calibration point {:?} gave up with {} samples",
                self.target,
                self.collected
            );
            self.status = SamplerStatus::Done(self.collected > 0);
        }
    }
}

/// Progress across the whole calibration grid
#[derive(Debug, Clone)]
pub struct CalibrationProgress {
    completed: Vec<bool>,
}

impl CalibrationProgress {
    pub fn new(points: usize) -> Self {
        Self {
            completed: vec![false; points],
        }
    }

    pub fn mark(&mut self, index: usize) {
        if let Some(done) = self.completed.get_mut(index) {
            *done = true;
        }
    }

    pub fn is_completed(&self, index: usize) -> bool {
        self.completed.get(index).copied().unwrap_or(false)
    }

    pub fn completed(&self) -> usize {
        self.completed.iter().filter(|&&c| c).count()
    }

    pub fn required(&self) -> usize {
        self.completed.len()
    }

    /// Every point done; the host may offer to commit
    pub fn ready(&self) -> bool {
        self.completed() >= self.required()
    }

    pub fn reset(&mut self) {
        self.completed.iter_mut().for_each(|c| *c = false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gaze::signal::RawGaze;

    /// Poll every `step_ms` until the sampler finishes
    fn run(sampler: &mut CalibrationSampler, gaze: &mut SignalProcessor, step_ms: f64) -> f64 {
        let mut now = 0.0;
        while sampler.poll(gaze, now) == SamplerStatus::Pending {
            now += step_ms;
        }
        now
    }

    #[test]
    fn test_collects_up_to_sample_count() {
        let mut gaze = SignalProcessor::default();
        gaze.ingest(Some(RawGaze::new(300.0, 200.0)), 0.0);

        let mut sampler = CalibrationSampler::new((72.0, 72.0), 0.0);
        assert_eq!(sampler.target(), (72.0, 72.0));
        // Attempts at 0, 30, ..., 14 * 30
        let finished = run(&mut sampler, &mut gaze, 10.0);
        assert_eq!(finished, 14.0 * 30.0);
        assert_eq!(sampler.status(), SamplerStatus::Done(true));
        assert_eq!(sampler.collected(), SAMPLES_PER_POINT);
        assert_eq!(gaze.calibration_count(), SAMPLES_PER_POINT as usize);

        // Finished samplers stay put
        assert_eq!(sampler.poll(&mut gaze, 10_000.0), SamplerStatus::Done(true));
        assert_eq!(gaze.calibration_count(), SAMPLES_PER_POINT as usize);
    }

    #[test]
    fn test_late_poll_takes_one_sample() {
        let mut gaze = SignalProcessor::default();
        gaze.ingest(Some(RawGaze::new(300.0, 200.0)), 0.0);

        let mut sampler = CalibrationSampler::new((72.0, 72.0), 0.0);
        assert_eq!(sampler.poll(&mut gaze, 0.0), SamplerStatus::Pending);
        assert_eq!(sampler.poll(&mut gaze, 500.0), SamplerStatus::Pending);
        assert_eq!(sampler.collected(), 2);
        assert_eq!(gaze.calibration_count(), 2);

        // Schedule restarts from the late poll
        assert_eq!(sampler.poll(&mut gaze, 529.0), SamplerStatus::Pending);
        assert_eq!(sampler.collected(), 2);
        sampler.poll(&mut gaze, 530.0);
        assert_eq!(sampler.collected(), 3);
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let mut gaze = SignalProcessor::default();
        let mut sampler = CalibrationSampler::new((0.0, 0.0), 0.0);
        let finished = run(&mut sampler, &mut gaze, SAMPLE_INTERVAL_MS);
        assert_eq!(sampler.status(), SamplerStatus::Done(false));
        assert_eq!(finished, (MAX_ATTEMPTS - 1) as f64 * SAMPLE_INTERVAL_MS);
        assert_eq!(gaze.calibration_count(), 0);
    }

    #[test]
    fn test_partial_samples_still_count() {
        let mut gaze = SignalProcessor::default();
        let mut sampler = CalibrationSampler::new((0.0, 0.0), 0.0);
        assert_eq!(sampler.poll(&mut gaze, 0.0), SamplerStatus::Pending);

        gaze.ingest(Some(RawGaze::new(5.0, 5.0)), 0.0);
        assert_eq!(sampler.poll(&mut gaze, 30.0), SamplerStatus::Pending);
        gaze.ingest(None, 31.0);

        let mut now = 60.0;
        while sampler.poll(&mut gaze, now) == SamplerStatus::Pending {
            now += SAMPLE_INTERVAL_MS;
        }
        assert_eq!(sampler.status(), SamplerStatus::Done(true));
        assert_eq!(sampler.collected(), 1);
    }

    #[test]
    fn test_cancel_stops_sampling() {
        let mut gaze = SignalProcessor::default();
        gaze.ingest(Some(RawGaze::new(5.0, 5.0)), 0.0);
        let mut sampler = CalibrationSampler::new((0.0, 0.0), 0.0);
        sampler.poll(&mut gaze, 0.0);
        sampler.cancel();
        assert_eq!(sampler.poll(&mut gaze, 1000.0), SamplerStatus::Cancelled);
        assert_eq!(sampler.collected(), 1);
    }

    #[test]
    fn test_progress() {
        let targets = calibration_targets(900.0, 600.0);
        assert_eq!(targets.len(), 16);
        assert!((targets[0].0 - 72.0).abs() < 1e-3);

        let mut progress = CalibrationProgress::new(targets.len());
        for i in 0..15 {
            progress.mark(i);
        }
        assert!(!progress.ready());
        assert!(!progress.is_completed(15));
        progress.mark(15);
        assert!(progress.is_completed(15));
        progress.mark(99);
        assert!(progress.ready());
        progress.reset();
        assert_eq!(progress.completed(), 0);
    }
}
