//! Per-axis linear calibration
//!
//! Each axis maps raw page coordinates onto the logical arena with
//! `canvas = slope * raw + intercept`, fitted by ordinary least squares over
//! the pairs gathered while the player looks at known targets.

use serde::{Deserialize, Serialize};

/// Screen axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

/// One raw observation tied to a known on-screen target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPair {
    pub raw: f64,
    pub target: f64,
}

/// Fitted linear model for one axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisMapping {
    pub slope: f64,
    pub intercept: f64,
}

impl AxisMapping {
    #[inline]
    pub fn apply(&self, raw: f64) -> f64 {
        self.slope * raw + self.intercept
    }
}

/// Ordinary least squares over `pairs`
///
/// Returns `None` with fewer than two pairs or when every raw value is the
/// same (zero denominator).
pub fn fit(pairs: &[CalibrationPair]) -> Option<AxisMapping> {
    if pairs.len() < 2 {
        return None;
    }

    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
    for p in pairs {
        sum_x += p.raw;
        sum_y += p.target;
        sum_xy += p.raw * p.target;
        sum_xx += p.raw * p.raw;
    }

    let n = pairs.len() as f64;
    let denom = n * sum_xx - sum_x * sum_x;
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / n;
    Some(AxisMapping { slope, intercept })
}

/// Accumulated pairs and committed mappings for both axes
#[derive(Debug, Clone, Default)]
pub struct Calibration {
    pairs_x: Vec<CalibrationPair>,
    pairs_y: Vec<CalibrationPair>,
    mapping_x: Option<AxisMapping>,
    mapping_y: Option<AxisMapping>,
}

impl Calibration {
    pub fn new() -> Self {
        Self::default()
    }

    fn pairs(&self, axis: Axis) -> &[CalibrationPair] {
        match axis {
            Axis::X => &self.pairs_x,
            Axis::Y => &self.pairs_y,
        }
    }

    pub fn record(&mut self, axis: Axis, raw: f64, target: f64) {
        let pair = CalibrationPair { raw, target };
        match axis {
            Axis::X => self.pairs_x.push(pair),
            Axis::Y => self.pairs_y.push(pair),
        }
    }

    /// Pairs recorded for `axis` since the last reset or commit
    pub fn pair_count(&self, axis: Axis) -> usize {
        self.pairs(axis).len()
    }

    /// Number of complete (x, y) observations
    pub fn count(&self) -> usize {
        self.pairs_x.len().min(self.pairs_y.len())
    }

    pub fn fit_axis(&self, axis: Axis) -> Option<AxisMapping> {
        fit(self.pairs(axis))
    }

    pub fn mapping(&self, axis: Axis) -> Option<AxisMapping> {
        match axis {
            Axis::X => self.mapping_x,
            Axis::Y => self.mapping_y,
        }
    }

    /// Install both mappings, or neither
    ///
    /// On failure the previous mappings and the gathered pairs stay in place so
    /// the caller can collect more samples and retry.
    pub fn commit(&mut self) -> bool {
        let (Some(map_x), Some(map_y)) = (self.fit_axis(Axis::X), self.fit_axis(Axis::Y)) else {
            log::warn!(
                "Calibration commit failed ({} x pairs, {} y pairs)",
                self.pairs_x.len(),
                self.pairs_y.len()
            );
            return false;
        };

        log::info!(
            "Calibration committed: x = {:.3}*raw + {:.1}, y = {:.3}*raw + {:.1}",
            map_x.slope,
            map_x.intercept,
            map_y.slope,
            map_y.intercept
        );
        self.mapping_x = Some(map_x);
        self.mapping_y = Some(map_y);
        self.pairs_x.clear();
        self.pairs_y.clear();
        true
    }

    /// Drop all pairs and both mappings
    pub fn reset(&mut self) {
        self.pairs_x.clear();
        self.pairs_y.clear();
        self.mapping_x = None;
        self.mapping_y = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pairs(points: &[(f64, f64)]) -> Vec<CalibrationPair> {
        points
            .iter()
            .map(|&(raw, target)| CalibrationPair { raw, target })
            .collect()
    }

    #[test]
    fn test_fit_offset_line() {
        let m = fit(&pairs(&[(100.0, 0.0), (200.0, 100.0), (300.0, 200.0)])).unwrap();
        assert!((m.slope - 1.0).abs() < 1e-9);
        assert!((m.intercept + 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_rejects_degenerate_input() {
        assert!(fit(&[]).is_none());
        assert!(fit(&pairs(&[(10.0, 5.0)])).is_none());
        assert!(fit(&pairs(&[(10.0, 5.0), (10.0, 50.0), (10.0, 90.0)])).is_none());
    }

    #[test]
    fn test_commit_requires_both_axes() {
        let mut cal = Calibration::new();
        cal.record(Axis::X, 0.0, 0.0);
        cal.record(Axis::X, 10.0, 20.0);
        cal.record(Axis::Y, 5.0, 5.0);
        assert!(!cal.commit());
        assert!(cal.mapping(Axis::X).is_none());
        assert_eq!(cal.pair_count(Axis::X), 2);
    }

    #[test]
    fn test_failed_commit_keeps_previous_mapping() {
        let mut cal = Calibration::new();
        for (raw, target) in [(0.0, 0.0), (100.0, 50.0)] {
            cal.record(Axis::X, raw, target);
            cal.record(Axis::Y, raw, target * 2.0);
        }
        assert!(cal.commit());
        assert_eq!(cal.count(), 0);
        let before = cal.mapping(Axis::X).unwrap();

        cal.record(Axis::X, 7.0, 1.0);
        cal.record(Axis::Y, 7.0, 1.0);
        assert!(!cal.commit());
        assert_eq!(cal.mapping(Axis::X), Some(before));
        assert!(cal.mapping(Axis::Y).is_some());
    }

    #[test]
    fn test_reset_clears_pairs_and_mappings() {
        let mut cal = Calibration::new();
        for raw in [0.0, 50.0, 100.0] {
            cal.record(Axis::X, raw, raw);
            cal.record(Axis::Y, raw, raw);
        }
        assert!(cal.commit());
        cal.record(Axis::X, 1.0, 1.0);
        cal.reset();
        assert_eq!(cal.pair_count(Axis::X), 0);
        assert!(cal.mapping(Axis::X).is_none());
        assert!(cal.mapping(Axis::Y).is_none());
    }

    proptest! {
        #[test]
        fn prop_fit_recovers_exact_line(
            m in prop_oneof![-5.0f64..-0.01, 0.01f64..5.0],
            b in -500.0f64..500.0,
            raws in prop::collection::vec(-1000.0f64..2000.0, 2..20),
        ) {
            let spread = raws.iter().cloned().fold(f64::MIN, f64::max)
                - raws.iter().cloned().fold(f64::MAX, f64::min);
            prop_assume!(spread > 10.0);

            let pts: Vec<_> = raws.iter().map(|&r| CalibrationPair { raw: r, target: m * r + b }).collect();
            let fitted = fit(&pts).unwrap();
            prop_assert!((fitted.slope - m).abs() < 1e-6);
            prop_assert!((fitted.intercept - b).abs() < 1e-4 * (1.0 + b.abs()) + 1e-3);
        }
    }
}
