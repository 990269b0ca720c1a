//! Ball motion, wall and paddle collisions, scoring
//!
//! Everything is axis-aligned: the ball is a square of side `size` and the
//! paddles are `PADDLE_W` x `PADDLE_H` boxes.

use glam::Vec2;
use rand::Rng;

use super::state::{Ball, Paddle, Scorer, Side};
use crate::consts::*;

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Rect {
    fn around(center: Vec2, half_w: f32, half_h: f32) -> Self {
        Self {
            left: center.x - half_w,
            right: center.x + half_w,
            top: center.y - half_h,
            bottom: center.y + half_h,
        }
    }

    /// Strict overlap; touching edges do not count
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left < other.right
            && self.right > other.left
            && self.top < other.bottom
            && self.bottom > other.top
    }
}

pub fn ball_rect(ball: &Ball) -> Rect {
    let half = ball.half();
    Rect::around(ball.pos, half, half)
}

pub fn paddle_rect(paddle: &Paddle) -> Rect {
    Rect::around(
        Vec2::new(paddle.x, paddle.y),
        PADDLE_W / 2.0,
        PADDLE_H / 2.0,
    )
}

/// Centre the ball and stop it
pub fn reset_ball(ball: &mut Ball) {
    ball.pos = Vec2::new(ARENA_W / 2.0, ARENA_H / 2.0);
    ball.vel = Vec2::ZERO;
}

/// Launch the ball vertically at serve speed with a random horizontal drift
///
/// `direction` is +1 (down, toward the human) or -1 (up, toward the CPU).
pub fn serve<R: Rng>(ball: &mut Ball, direction: f32, rng: &mut R) {
    let vx = rng.random_range(-SERVE_VX_RANGE..SERVE_VX_RANGE);
    ball.vel = Vec2::new(vx, direction * BALL_SPEED_INIT);
}

/// Bounce off a paddle face and speed up
fn reflect_from_paddle(ball: &mut Ball, paddle: &Paddle) {
    let half = ball.half();
    ball.pos.y = match paddle.side {
        Side::Top => paddle.y + PADDLE_H / 2.0 + half,
        Side::Bottom => paddle.y - PADDLE_H / 2.0 - half,
    };
    ball.vel.y = -ball.vel.y;

    let offset = ((ball.pos.x - paddle.x) / (PADDLE_W / 2.0)).clamp(-1.0, 1.0);
    ball.vel.x += offset * DEFLECTION_GAIN;

    let speed = ball.vel.length();
    let speed = if speed > 0.0 { speed } else { 1.0 };
    let target = (speed + BALL_ACCEL).clamp(BALL_SPEED_INIT, BALL_SPEED_MAX);
    ball.vel *= target / speed;
}

/// Advance the ball by `dt` reference frames
///
/// Returns the player credited when the ball fully leaves the arena through
/// the top or bottom edge. The ball is left where it is; resetting is up to
/// the caller.
pub fn advance(ball: &mut Ball, human: &Paddle, cpu: &Paddle, dt: f32) -> Option<Scorer> {
    if dt == 0.0 {
        return None;
    }
    ball.pos += ball.vel * dt;

    let half = ball.half();
    if ball.pos.x - half <= 0.0 && ball.vel.x < 0.0 {
        ball.pos.x = half;
        ball.vel.x = -ball.vel.x;
    } else if ball.pos.x + half >= ARENA_W && ball.vel.x > 0.0 {
        ball.pos.x = ARENA_W - half;
        ball.vel.x = -ball.vel.x;
    }

    // Only the paddle the ball is heading for can be hit
    let rect = ball_rect(ball);
    if ball.vel.y > 0.0 && rect.overlaps(&paddle_rect(human)) {
        reflect_from_paddle(ball, human);
    } else if ball.vel.y < 0.0 && rect.overlaps(&paddle_rect(cpu)) {
        reflect_from_paddle(ball, cpu);
    }

    if ball.pos.y + half < 0.0 {
        return Some(Scorer::Human);
    }
    if ball.pos.y - half > ARENA_H {
        return Some(Scorer::Cpu);
    }
    None
}
