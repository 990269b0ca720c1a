//! Deterministic simulation module
//!
//! All gameplay logic lives here:
//! - Variable timestep scaled to 60 Hz frames, capped per frame
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod control;
pub mod physics;
pub mod state;
pub mod tick;
pub mod transitions;

pub use control::{FallbackKeys, HumanControl, follow, steer_cpu, steer_human};
pub use physics::{advance, reset_ball, serve};
pub use state::{
    Ball, CalibrationContext, GamePhase, GameState, Paddle, PauseReason, Score, Scorer, Side,
};
pub use tick::{TickInput, frame_dt, tick};
