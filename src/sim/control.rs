//! Paddle control
//!
//! The human paddle chases a target taken from gaze (or, in debug builds,
//! held arrow keys). The CPU paddle chases the ball at a capped speed.

use serde::{Deserialize, Serialize};

use super::state::Paddle;
use crate::consts::*;
use crate::{lerp_with_deadband, paddle_bounds};

/// Held keys for the keyboard fallback
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackKeys {
    pub left: bool,
    pub right: bool,
}

/// Human paddle tuning
#[derive(Debug, Clone, Copy)]
pub struct HumanControl {
    pub smoothing: f32,
    pub deadband: f32,
}

/// Step the human paddle toward its target
///
/// A live `gaze_x` replaces the target. Without one the previous target is
/// kept, unless `fallback` keys are supplied, which nudge it left or right.
pub fn steer_human(
    paddle: &mut Paddle,
    gaze_x: Option<f32>,
    fallback: Option<FallbackKeys>,
    control: HumanControl,
    dt: f32,
) {
    let (min_x, max_x) = paddle_bounds();
    let mut target = paddle.target_x;

    if let Some(x) = gaze_x {
        target = x.clamp(min_x, max_x);
    } else if let Some(keys) = fallback {
        let step = FALLBACK_KEY_SPEED * dt * 60.0;
        if keys.left {
            target -= step;
        }
        if keys.right {
            target += step;
        }
        target = target.clamp(min_x, max_x);
    }

    paddle.target_x = target;
    paddle.x = lerp_with_deadband(paddle.x, target, control.smoothing, control.deadband)
        .clamp(min_x, max_x);
}

/// Move `current` toward `target` at `speed * dt`, snapping inside `margin`
pub fn follow(current: f32, target: f32, speed: f32, dt: f32, margin: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= margin {
        return target;
    }
    current + delta.signum() * speed * dt
}

/// Step the CPU paddle toward the ball
pub fn steer_cpu(paddle: &mut Paddle, ball_x: f32, speed: f32, dt: f32) {
    let (min_x, max_x) = paddle_bounds();
    paddle.target_x = ball_x;
    paddle.x = follow(paddle.x, ball_x, speed, dt, CPU_SNAP_MARGIN).clamp(min_x, max_x);
}
