//! Game settings and difficulty presets
//!
//! Tunables that are independent of arena geometry. Loaded from JSON or from
//! page query flags (`?debug=1&hard=1`).

use serde::{Deserialize, Serialize};

/// CPU difficulty levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "medium" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// CPU paddle speed (units per reference frame)
    pub fn cpu_speed(&self) -> f32 {
        match self {
            Difficulty::Easy => 5.0,
            Difficulty::Normal => 7.0,
            Difficulty::Hard => 9.0,
        }
    }
}

/// Game settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: Difficulty,

    /// Keyboard fallback, verbose gaze logging and the debug readout
    pub debug: bool,

    // === Gaze signal ===
    /// Exponential filter weight for new raw samples
    pub filter_alpha: f64,
    /// A sample older than this is ignored by `resolve`
    pub stale_ms: f64,
    /// No fresh gaze for this long during play pauses the match
    pub tracking_lost_ms: f64,

    // === Human paddle ===
    pub eye_smoothing: f32,
    pub eye_deadband: f32,

    // === Match ===
    pub win_score: u32,
    /// Serve freeze after entering the countdown
    pub freeze_ms: f64,

    // === Capture ===
    pub capture_timeout_ms: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,
            debug: false,

            filter_alpha: 0.25,
            stale_ms: 300.0,
            tracking_lost_ms: 2000.0,

            eye_smoothing: 0.15,
            eye_deadband: 6.0,

            win_score: 5,
            freeze_ms: 1000.0,

            capture_timeout_ms: 3500.0,
        }
    }
}

impl Settings {
    /// Create settings for a difficulty preset
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    /// Parse page query flags: `debug=1`, `easy=1`, `hard=1`
    ///
    /// `easy` wins over `hard` when both are present. Unknown keys are ignored.
    pub fn from_query(query: &str) -> Self {
        let query = query.trim_start_matches('?');
        let mut debug = false;
        let mut easy = false;
        let mut hard = false;
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let on = value == "1";
            match key {
                "debug" => debug = on,
                "easy" => easy = on,
                "hard" => hard = on,
                _ => {}
            }
        }

        let difficulty = if easy {
            Difficulty::Easy
        } else if hard {
            Difficulty::Hard
        } else {
            Difficulty::Normal
        };

        Self {
            debug,
            ..Self::from_difficulty(difficulty)
        }
    }

    /// Load settings from JSON, falling back to defaults on malformed input
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(settings) => {
                log::info!("Loaded settings from JSON");
                settings
            }
            Err(e) => {
                log::warn!("Ignoring malformed settings ({}), using defaults", e);
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// CPU paddle speed for the current difficulty
    pub fn cpu_speed(&self) -> f32 {
        self.difficulty.cpu_speed()
    }
}
