//! Gaze signal processing
//!
//! Raw estimates arrive at the tracker's own cadence and are written into a
//! single slot (last write wins). Each write also advances an exponential
//! filter. Readers ask for a calibrated arena coordinate, which is absent
//! whenever the newest sample is too old.

use serde::{Deserialize, Serialize};

use super::calibration::{Axis, AxisMapping, Calibration};
use crate::settings::Settings;

/// Minimum spacing between debug sample logs
const DEBUG_SAMPLE_INTERVAL_MS: f64 = 800.0;
/// Minimum spacing between debug stale-sample logs
const DEBUG_STALE_INTERVAL_MS: f64 = 1500.0;

/// Raw point reported by the tracker, in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawGaze {
    pub x: f64,
    pub y: f64,
}

impl RawGaze {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A gaze point stamped with its arrival time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub timestamp_ms: f64,
}

impl Sample {
    fn axis(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }
}

/// On-page rectangle of the game canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportBounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewportBounds {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Position of `value` within the rectangle along `axis`, 0..1 when inside
    fn ratio(&self, axis: Axis, value: f64) -> Option<f64> {
        let (origin, extent) = match axis {
            Axis::X => (self.left, self.width),
            Axis::Y => (self.top, self.height),
        };
        (extent > 0.0).then(|| (value - origin) / extent)
    }
}

/// Debug view of the signal state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazeReadout {
    pub raw: Sample,
    pub smoothed: Option<Sample>,
    pub age_ms: f64,
    pub stale: bool,
}

/// Single-slot gaze state plus calibration
#[derive(Debug, Clone)]
pub struct SignalProcessor {
    last: Option<Sample>,
    smoothed: Option<Sample>,
    calibration: Calibration,
    alpha: f64,
    stale_ms: f64,
    debug: bool,
    last_sample_log_ms: f64,
    last_stale_log_ms: f64,
}

impl Default for SignalProcessor {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl SignalProcessor {
    pub fn new(settings: &Settings) -> Self {
        Self {
            last: None,
            smoothed: None,
            calibration: Calibration::new(),
            alpha: settings.filter_alpha,
            stale_ms: settings.stale_ms,
            debug: settings.debug,
            last_sample_log_ms: f64::NEG_INFINITY,
            last_stale_log_ms: f64::NEG_INFINITY,
        }
    }

    /// Staleness threshold used by `resolve`
    pub fn stale_ms(&self) -> f64 {
        self.stale_ms
    }

    /// Record a tracker event; `None` means the tracker lost the face
    pub fn ingest(&mut self, raw: Option<RawGaze>, now_ms: f64) {
        let Some(raw) = raw else {
            self.clear();
            return;
        };

        let sample = Sample {
            x: raw.x,
            y: raw.y,
            timestamp_ms: now_ms,
        };
        let prev = self.smoothed.unwrap_or(sample);
        self.smoothed = Some(Sample {
            x: prev.x + (raw.x - prev.x) * self.alpha,
            y: prev.y + (raw.y - prev.y) * self.alpha,
            timestamp_ms: now_ms,
        });
        self.last = Some(sample);
        self.log_sample(now_ms);
    }

    /// Forget the raw and smoothed samples
    pub fn clear(&mut self) {
        self.last = None;
        self.smoothed = None;
    }

    pub fn last_sample(&self) -> Option<Sample> {
        self.last
    }

    pub fn smoothed_sample(&self) -> Option<Sample> {
        self.smoothed
    }

    /// True when there is no sample or the newest is older than `threshold_ms`
    pub fn is_stale(&self, threshold_ms: f64, now_ms: f64) -> bool {
        match self.last {
            Some(sample) => now_ms - sample.timestamp_ms > threshold_ms,
            None => true,
        }
    }

    /// Calibrated arena coordinate along `axis`, clamped to `[0, logical_extent]`
    ///
    /// Falls back to the sample's proportional position inside `viewport` when
    /// the axis has no committed mapping.
    pub fn resolve(
        &mut self,
        axis: Axis,
        viewport: Option<&ViewportBounds>,
        logical_extent: f64,
        now_ms: f64,
    ) -> Option<f64> {
        let sample = self.smoothed.or(self.last)?;
        let age = now_ms - sample.timestamp_ms;
        if age > self.stale_ms {
            self.log_stale(age, now_ms);
            return None;
        }

        let raw = sample.axis(axis);
        if let Some(mapping) = self.calibration.mapping(axis) {
            return Some(mapping.apply(raw).clamp(0.0, logical_extent));
        }

        let ratio = viewport?.ratio(axis, raw)?;
        Some((ratio * logical_extent).clamp(0.0, logical_extent))
    }

    pub fn record_calibration_pair(&mut self, axis: Axis, raw: f64, target: f64) {
        self.calibration.record(axis, raw, target);
    }

    /// Record one observation for both axes at once
    pub fn add_calibration_sample(&mut self, raw: &Sample, target: (f64, f64)) {
        self.calibration.record(Axis::X, raw.x, target.0);
        self.calibration.record(Axis::Y, raw.y, target.1);
    }

    pub fn calibration_count(&self) -> usize {
        self.calibration.count()
    }

    pub fn fit_axis(&self, axis: Axis) -> Option<AxisMapping> {
        self.calibration.fit_axis(axis)
    }

    pub fn mapping(&self, axis: Axis) -> Option<AxisMapping> {
        self.calibration.mapping(axis)
    }

    pub fn commit_calibration(&mut self) -> bool {
        self.calibration.commit()
    }

    pub fn reset_calibration(&mut self) {
        self.calibration.reset();
    }

    pub fn readout(&self, now_ms: f64) -> Option<GazeReadout> {
        let raw = self.last?;
        Some(GazeReadout {
            raw,
            smoothed: self.smoothed,
            age_ms: now_ms - raw.timestamp_ms,
            stale: self.is_stale(self.stale_ms, now_ms),
        })
    }

    fn log_sample(&mut self, now_ms: f64) {
        if !self.debug || now_ms - self.last_sample_log_ms < DEBUG_SAMPLE_INTERVAL_MS {
            return;
        }
        if let Some(sample) = self.last {
            self.last_sample_log_ms = now_ms;
            log::debug!(
                "[Gaze] sample update x={:.0} y={:.0} ts={:.0}",
                sample.x,
                sample.y,
                now_ms
            );
        }
    }

    fn log_stale(&mut self, age_ms: f64, now_ms: f64) {
        if !self.debug || now_ms - self.last_stale_log_ms < DEBUG_STALE_INTERVAL_MS {
            return;
        }
        self.last_stale_log_ms = now_ms;
        log::debug!("[Gaze] ignoring stale sample ({:.0}ms old)", age_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> ViewportBounds {
        ViewportBounds::new(100.0, 50.0, 900.0, 600.0)
    }

    #[test]
    fn test_first_sample_seeds_filter() {
        let mut gaze = SignalProcessor::default();
        gaze.ingest(Some(RawGaze::new(400.0, 300.0)), 0.0);
        let s = gaze.smoothed_sample().unwrap();
        assert_eq!((s.x, s.y), (400.0, 300.0));

        gaze.ingest(Some(RawGaze::new(800.0, 300.0)), 16.0);
        let s = gaze.smoothed_sample().unwrap();
        assert!((s.x - 500.0).abs() < 1e-9);
        assert_eq!(gaze.last_sample().unwrap().x, 800.0);
    }

    #[test]
    fn test_signal_loss_clears_state() {
        let mut gaze = SignalProcessor::default();
        gaze.ingest(Some(RawGaze::new(400.0, 300.0)), 0.0);
        gaze.ingest(None, 10.0);
        assert!(gaze.last_sample().is_none());
        assert!(gaze.smoothed_sample().is_none());

        // Filter reseeds after loss
        gaze.ingest(Some(RawGaze::new(100.0, 100.0)), 20.0);
        assert_eq!(gaze.smoothed_sample().unwrap().x, 100.0);
    }

    #[test]
    fn test_stale_after_threshold() {
        let mut gaze = SignalProcessor::default();
        assert!(gaze.is_stale(300.0, 0.0));

        gaze.ingest(Some(RawGaze::new(550.0, 350.0)), 1000.0);
        assert!(!gaze.is_stale(300.0, 1200.0));
        assert!(gaze.resolve(Axis::X, Some(&viewport()), 900.0, 1200.0).is_some());

        assert!(gaze.is_stale(300.0, 1350.0));
        assert!(gaze.resolve(Axis::X, Some(&viewport()), 900.0, 1350.0).is_none());
    }

    #[test]
    fn test_proportional_fallback() {
        let mut gaze = SignalProcessor::default();
        gaze.ingest(Some(RawGaze::new(550.0, 350.0)), 0.0);
        let x = gaze.resolve(Axis::X, Some(&viewport()), 900.0, 0.0).unwrap();
        assert!((x - 450.0).abs() < 1e-9);
        let y = gaze.resolve(Axis::Y, Some(&viewport()), 600.0, 0.0).unwrap();
        assert!((y - 300.0).abs() < 1e-9);

        // Outside the canvas clamps to the edge
        gaze.ingest(None, 1.0);
        gaze.ingest(Some(RawGaze::new(0.0, 2000.0)), 2.0);
        assert_eq!(gaze.resolve(Axis::X, Some(&viewport()), 900.0, 2.0), Some(0.0));
        assert_eq!(gaze.resolve(Axis::Y, Some(&viewport()), 600.0, 2.0), Some(600.0));

        // No mapping and no viewport
        assert_eq!(gaze.resolve(Axis::X, None, 900.0, 2.0), None);
    }

    #[test]
    fn test_mapping_overrides_viewport() {
        let mut gaze = SignalProcessor::default();
        for (raw, target) in [(100.0, 0.0), (200.0, 100.0), (300.0, 200.0)] {
            gaze.record_calibration_pair(Axis::X, raw, target);
            gaze.record_calibration_pair(Axis::Y, raw, target);
        }
        assert!(gaze.commit_calibration());

        gaze.ingest(Some(RawGaze::new(350.0, 1200.0)), 0.0);
        assert_eq!(gaze.resolve(Axis::X, None, 900.0, 0.0), Some(250.0));
        assert_eq!(gaze.resolve(Axis::Y, None, 600.0, 0.0), Some(600.0));

        gaze.reset_calibration();
        assert!(gaze.mapping(Axis::X).is_none());
        assert_eq!(gaze.resolve(Axis::X, None, 900.0, 0.0), None);
    }

    #[test]
    fn test_add_calibration_sample_counts_both_axes() {
        let mut gaze = SignalProcessor::default();
        let s = Sample {
            x: 10.0,
            y: 20.0,
            timestamp_ms: 0.0,
        };
        gaze.add_calibration_sample(&s, (72.0, 72.0));
        gaze.record_calibration_pair(Axis::X, 1.0, 2.0);
        assert_eq!(gaze.calibration_count(), 1);
    }

    #[test]
    fn test_readout() {
        let mut gaze = SignalProcessor::default();
        assert!(gaze.readout(0.0).is_none());
        gaze.ingest(Some(RawGaze::new(1.0, 2.0)), 100.0);
        let r = gaze.readout(500.0).unwrap();
        assert_eq!(r.age_ms, 400.0);
        assert!(r.stale);
    }
}
