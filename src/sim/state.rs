//! Game state and core simulation types

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::settings::Settings;

/// Current phase of the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, no match running
    Splash,
    /// Ball frozen at centre waiting to be served
    Countdown,
    /// Active rally
    Playing,
    /// Loop stopped, see `GameState::pause_reason`
    Paused,
    /// One side reached the win score
    GameOver,
}

/// Why the match is paused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PauseReason {
    User,
    TrackingLost,
    Recalibrating,
}

impl PauseReason {
    pub fn message(&self) -> &'static str {
        match self {
            PauseReason::User => "Paused",
            PauseReason::TrackingLost => "Tracking lost. Recenter & Resume.",
            PauseReason::Recalibrating => "Recalibrating…",
        }
    }
}

/// What a successful calibration leads to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CalibrationContext {
    /// First calibration: start a fresh match
    #[default]
    Initial,
    /// Mid-match: re-serve and carry on
    Recalibrate,
}

/// Arena edge a paddle defends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Top,
    Bottom,
}

/// Player credited with a point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scorer {
    Human,
    Cpu,
}

impl Scorer {
    /// Direction of the next serve: toward the side that just conceded
    pub fn next_serve_direction(&self) -> f32 {
        match self {
            Scorer::Human => -1.0,
            Scorer::Cpu => 1.0,
        }
    }
}

/// The ball
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
}

impl Default for Ball {
    fn default() -> Self {
        Self {
            pos: Vec2::new(ARENA_W / 2.0, ARENA_H / 2.0),
            vel: Vec2::ZERO,
            size: BALL_SIZE,
        }
    }
}

impl Ball {
    #[inline]
    pub fn half(&self) -> f32 {
        self.size / 2.0
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.vel == Vec2::ZERO
    }
}

/// A paddle; `y` never changes after construction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    pub x: f32,
    pub y: f32,
    /// Where the controller wants the paddle centre to be
    pub target_x: f32,
    pub side: Side,
}

impl Paddle {
    pub fn new(side: Side) -> Self {
        let y = match side {
            Side::Top => PADDLE_INSET,
            Side::Bottom => ARENA_H - PADDLE_INSET,
        };
        Self {
            x: ARENA_W / 2.0,
            y,
            target_x: ARENA_W / 2.0,
            side,
        }
    }

    /// Recentre horizontally
    pub fn reset(&mut self) {
        self.x = ARENA_W / 2.0;
        self.target_x = ARENA_W / 2.0;
    }
}

/// Match tally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub cpu: u32,
    pub human: u32,
}

impl Score {
    pub fn credit(&mut self, scorer: Scorer) {
        match scorer {
            Scorer::Human => self.human += 1,
            Scorer::Cpu => self.cpu += 1,
        }
    }

    /// The player that reached `win_score`, if any
    pub fn winner(&self, win_score: u32) -> Option<Scorer> {
        if self.human >= win_score {
            Some(Scorer::Human)
        } else if self.cpu >= win_score {
            Some(Scorer::Cpu)
        } else {
            None
        }
    }
}

/// Complete match state
#[derive(Debug, Clone)]
pub struct GameState {
    pub settings: Settings,
    pub phase: GamePhase,
    pub pause_reason: Option<PauseReason>,
    /// Phase to return to on resume
    pub(crate) resume_phase: GamePhase,
    pub score: Score,
    pub ball: Ball,
    pub human: Paddle,
    pub cpu: Paddle,
    /// Direction of the pending or last serve (+1 down, -1 up)
    pub serve_direction: f32,
    /// Serve freeze deadline (ms), `None` once served
    pub freeze_until_ms: Option<f64>,
    /// Freeze time left when a countdown was paused
    pub(crate) frozen_remaining_ms: Option<f64>,
    /// Loop is scheduled
    pub running: bool,
    pub(crate) last_frame_ms: Option<f64>,
    /// Last tick at which the human paddle followed a live gaze sample
    pub last_gaze_ms: f64,
    /// A capture source is feeding samples
    pub camera_active: bool,
    /// Tracking-lost indicator
    pub tracking_lost: bool,
    pub calibration_context: CalibrationContext,
    pub(crate) rng: Pcg32,
}

impl GameState {
    pub fn new(seed: u64, settings: Settings) -> Self {
        Self {
            settings,
            phase: GamePhase::Splash,
            pause_reason: None,
            resume_phase: GamePhase::Playing,
            score: Score::default(),
            ball: Ball::default(),
            human: Paddle::new(Side::Bottom),
            cpu: Paddle::new(Side::Top),
            serve_direction: 1.0,
            freeze_until_ms: None,
            frozen_remaining_ms: None,
            running: false,
            last_frame_ms: None,
            last_gaze_ms: 0.0,
            camera_active: false,
            tracking_lost: false,
            calibration_context: CalibrationContext::Initial,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Recentre paddles and freeze the ball at centre
    pub fn reset_objects(&mut self) {
        self.human.reset();
        self.cpu.reset();
        super::physics::reset_ball(&mut self.ball);
    }

    /// Remaining serve freeze in milliseconds
    pub fn freeze_remaining(&self, now_ms: f64) -> Option<f64> {
        self.freeze_until_ms
            .map(|until| (until - now_ms).max(0.0))
            .or(self.frozen_remaining_ms)
    }

    /// Countdown digit shown during the serve freeze
    pub fn countdown(&self, now_ms: f64) -> Option<u32> {
        let remaining = self.freeze_remaining(now_ms)?;
        (remaining > 0.0).then(|| (remaining / 1000.0).ceil() as u32)
    }
}
