//! In-session score keeping.

use crate::settings::Difficulty;
use serde::{Deserialize, Serialize};

/// Points awarded for a correct answer at `difficulty`
pub fn points_for(difficulty: Difficulty) -> u32 {
    difficulty.points_multiplier()
}

/// Score, attempts and correct answers for the current session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub score: u32,
    pub attempts: u32,
    pub correct: u32,
}

impl Scoreboard {
    /// Record one answer, returning the points it earned
    pub fn record(&mut self, correct: bool, difficulty: Difficulty) -> u32 {
        self.attempts += 1;
        if !correct {
            return 0;
        }
        let points = points_for(difficulty);
        self.correct += 1;
        self.score += points;
        points
    }

    /// round(correct / attempts * 100), 0 before the first attempt
    pub fn accuracy_percent(&self) -> u32 {
        if self.attempts == 0 {
            return 0;
        }
        ((self.correct as f64 / self.attempts as f64) * 100.0).round() as u32
    }

    pub fn reset(&mut self) {
        *self = Scoreboard::default();
    }
}
