//! Gaze Pong - human vs. CPU paddle game steered by gaze
//!
//! Core modules:
//! - `gaze`: Signal processing, calibration and capture lifecycle
//! - `sim`: Deterministic simulation (physics, paddle control, game state)
//! - `session`: Owned context bundling everything the host talks to
//! - `render`: Read-only snapshot handed to the drawing host
//! - `platform`: Browser bridge
//! - `settings`: Tunables and difficulty presets

pub mod gaze;
pub mod platform;
pub mod render;
pub mod session;
pub mod settings;
pub mod sim;

pub use render::{RenderSink, Snapshot};
pub use session::Session;
pub use settings::{Difficulty, Settings};

/// Arena geometry and ball tuning
pub mod consts {
    /// Duration of one reference frame (60 Hz) in milliseconds
    pub const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Frame ratio cap; bounds the effect of a single long stall
    pub const MAX_DT: f32 = 2.0;

    /// Arena dimensions (logical units)
    pub const ARENA_W: f32 = 900.0;
    pub const ARENA_H: f32 = 600.0;

    /// Paddle geometry
    pub const PADDLE_W: f32 = 120.0;
    pub const PADDLE_H: f32 = 18.0;
    /// Distance from the arena edge to a paddle's centre line
    pub const PADDLE_INSET: f32 = 50.0;

    /// Ball defaults
    pub const BALL_SIZE: f32 = 12.0;
    pub const BALL_SPEED_INIT: f32 = 6.0;
    pub const BALL_SPEED_MAX: f32 = 12.0;
    /// Speed added on each paddle return
    pub const BALL_ACCEL: f32 = 0.05;
    /// Horizontal velocity added at the paddle edge
    pub const DEFLECTION_GAIN: f32 = 3.0;
    /// Serve vx is drawn from [-SERVE_VX_RANGE, SERVE_VX_RANGE)
    pub const SERVE_VX_RANGE: f32 = 3.0;

    /// CPU paddle stops chasing inside this distance
    pub const CPU_SNAP_MARGIN: f32 = 4.0;
    /// Keyboard fallback speed (units per reference frame, before the x60 boost)
    pub const FALLBACK_KEY_SPEED: f32 = 9.0;
}

/// Lower and upper bound for a paddle centre
#[inline]
pub fn paddle_bounds() -> (f32, f32) {
    let half = consts::PADDLE_W / 2.0;
    (half, consts::ARENA_W - half)
}

/// Move `current` toward `target` by `smoothing`, holding still inside `deadband`
#[inline]
pub fn lerp_with_deadband(current: f32, target: f32, smoothing: f32, deadband: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= deadband {
        return current;
    }
    current + delta * smoothing
}
