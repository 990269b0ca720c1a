//! Gaze input
//!
//! Turns noisy, intermittent tracker output into a stable arena coordinate.
//! Nothing here depends on the simulation.

pub mod calibration;
pub mod capture;
pub mod sampler;
pub mod signal;

pub use calibration::{Axis, AxisMapping, Calibration, CalibrationPair, fit};
pub use capture::{CaptureError, CaptureSession, CaptureSource, CaptureState};
pub use sampler::{
    CALIBRATION_GRID, CalibrationProgress, CalibrationSampler, SamplerStatus, calibration_targets,
};
pub use signal::{GazeReadout, RawGaze, Sample, SignalProcessor, ViewportBounds};
