//! Player statistics and the patches that update them.
//!
//! Stats are mutated only through `PlayerStats::merge`, which also restores
//! the `max_streak >= streak` invariant and rejects patches that would leave
//! more correct answers than questions.

use crate::error::{PaeError, PaeResult};
use crate::settings::{Difficulty, GameMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Accumulated gameplay statistics for one player
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerStats {
    pub total_questions: u32,
    pub correct_answers: u32,
    pub streak: u32,
    pub max_streak: u32,
    pub quizzes_completed: u32,
    /// Seconds
    pub total_play_time: u64,
    pub proteins_explored: BTreeSet<String>,
    pub difficulties_completed: BTreeSet<String>,
    pub game_modes_used: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_play_date: Option<DateTime<Utc>>,
}

/// Partial update for `PlayerStats`.
///
/// Scalar fields overwrite when present. Set fields are unioned into the
/// existing sets, never replacing them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsPatch {
    pub total_questions: Option<u32>,
    pub correct_answers: Option<u32>,
    pub streak: Option<u32>,
    pub max_streak: Option<u32>,
    pub quizzes_completed: Option<u32>,
    pub total_play_time: Option<u64>,
    pub proteins_explored: BTreeSet<String>,
    pub difficulties_completed: BTreeSet<String>,
    pub game_modes_used: BTreeSet<String>,
    pub last_play_date: Option<DateTime<Utc>>,
}

impl StatsPatch {
    pub fn is_empty(&self) -> bool {
        *self == StatsPatch::default()
    }
}

/// One answered question, as reported by the game loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEvent {
    pub protein_id: String,
    pub difficulty: Difficulty,
    pub game_mode: GameMode,
    pub correct: bool,
    pub at: DateTime<Utc>,
}

impl PlayerStats {
    /// Apply a patch, returning the merged stats
    pub fn merge(&self, patch: &StatsPatch) -> PaeResult<PlayerStats> {
        let mut merged = self.clone();

        if let Some(v) = patch.total_questions {
            merged.total_questions = v;
        }
        if let Some(v) = patch.correct_answers {
            merged.correct_answers = v;
        }
        if let Some(v) = patch.streak {
            merged.streak = v;
        }
        if let Some(v) = patch.max_streak {
            merged.max_streak = v;
        }
        if let Some(v) = patch.quizzes_completed {
            merged.quizzes_completed = v;
        }
        if let Some(v) = patch.total_play_time {
            merged.total_play_time = v;
        }
        if patch.last_play_date.is_some() {
            merged.last_play_date = patch.last_play_date;
        }
        merged.proteins_explored.extend(patch.proteins_explored.iter().cloned());
        merged.difficulties_completed.extend(patch.difficulties_completed.iter().cloned());
        merged.game_modes_used.extend(patch.game_modes_used.iter().cloned());

        merged.max_streak = merged.max_streak.max(merged.streak);

        if merged.correct_answers > merged.total_questions {
            return Err(PaeError::InvalidInput(format!(
                "correct answers ({}) exceed total questions ({})",
                merged.correct_answers, merged.total_questions
            )));
        }

        Ok(merged)
    }

    /// Patch recording one answered question
    pub fn answer_patch(&self, event: &AnswerEvent) -> StatsPatch {
        let (correct_answers, streak) = if event.correct {
            (self.correct_answers + 1, self.streak + 1)
        } else {
            (self.correct_answers, 0)
        };

        StatsPatch {
            total_questions: Some(self.total_questions + 1),
            correct_answers: Some(correct_answers),
            streak: Some(streak),
            max_streak: Some(self.max_streak.max(streak)),
            proteins_explored: BTreeSet::from([event.protein_id.clone()]),
            difficulties_completed: BTreeSet::from([event.difficulty.as_str().to_string()]),
            game_modes_used: BTreeSet::from([event.game_mode.as_str().to_string()]),
            last_play_date: Some(event.at),
            ..Default::default()
        }
    }

    /// Patch recording a finished quiz
    pub fn quiz_completed_patch(&self, at: DateTime<Utc>) -> StatsPatch {
        StatsPatch {
            quizzes_completed: Some(self.quizzes_completed + 1),
            last_play_date: Some(at),
            ..Default::default()
        }
    }

    /// Patch adding play time in seconds
    pub fn play_time_patch(&self, seconds: u64) -> StatsPatch {
        StatsPatch {
            total_play_time: Some(self.total_play_time.saturating_add(seconds)),
            ..Default::default()
        }
    }

    /// Correct answers as a 0-100 percentage, 0 when nothing was answered
    pub fn accuracy_percent(&self) -> u32 {
        if self.total_questions == 0 {
            0
        } else {
            ((self.correct_answers as f64 / self.total_questions as f64) * 100.0).round() as u32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(protein: &str, correct: bool) -> AnswerEvent {
        AnswerEvent {
            protein_id: protein.to_string(),
            difficulty: Difficulty::Beginner,
            game_mode: GameMode::Challenge,
            correct,
            at: Utc::now(),
        }
    }

    fn record(stats: &PlayerStats, e: &AnswerEvent) -> PlayerStats {
        stats.merge(&stats.answer_patch(e)).unwrap()
    }

    #[test]
    fn test_answer_patch_streaks() {
        let mut stats = PlayerStats::default();
        for _ in 0..3 {
            stats = record(&stats, &event("p1", true));
        }
        assert_eq!(stats.streak, 3);
        assert_eq!(stats.max_streak, 3);

        stats = record(&stats, &event("p1", false));
        assert_eq!(stats.streak, 0);
        assert_eq!(stats.max_streak, 3);
        assert_eq!(stats.total_questions, 4);
        assert_eq!(stats.correct_answers, 3);
    }

    #[test]
    fn test_sets_are_unioned() {
        let mut stats = PlayerStats::default();
        stats = record(&stats, &event("p1", true));
        stats = record(&stats, &event("p2", true));
        stats = record(&stats, &event("p1", false));
        assert_eq!(stats.proteins_explored.len(), 2);
        assert!(stats.difficulties_completed.contains("beginner"));
        assert!(stats.game_modes_used.contains("challenge"));
    }

    #[test]
    fn test_merge_raises_max_streak() {
        let stats = PlayerStats::default();
        let patch = StatsPatch {
            total_questions: Some(10),
            correct_answers: Some(7),
            streak: Some(7),
            ..Default::default()
        };
        let merged = stats.merge(&patch).unwrap();
        assert_eq!(merged.max_streak, 7);
    }

    #[test]
    fn test_merge_rejects_more_correct_than_total() {
        let stats = PlayerStats::default();
        let patch = StatsPatch {
            correct_answers: Some(2),
            ..Default::default()
        };
        assert!(matches!(stats.merge(&patch), Err(PaeError::InvalidInput(_))));
    }

    #[test]
    fn test_empty_patch_is_noop() {
        let mut stats = PlayerStats::default();
        stats = record(&stats, &event("p3", true));
        let patch = StatsPatch::default();
        assert!(patch.is_empty());
        assert_eq!(stats.merge(&patch).unwrap(), stats);
    }

    #[test]
    fn test_quiz_and_play_time_patches() {
        let stats = PlayerStats::default();
        let stats = stats.merge(&stats.quiz_completed_patch(Utc::now())).unwrap();
        let stats = stats.merge(&stats.play_time_patch(90)).unwrap();
        assert_eq!(stats.quizzes_completed, 1);
        assert_eq!(stats.total_play_time, 90);
        assert!(stats.last_play_date.is_some());
    }

    #[test]
    fn test_accuracy_percent() {
        let mut stats = PlayerStats::default();
        assert_eq!(stats.accuracy_percent(), 0);
        stats.total_questions = 3;
        stats.correct_answers = 2;
        assert_eq!(stats.accuracy_percent(), 67);
    }

    #[test]
    fn test_stats_json_uses_camel_case() {
        let mut stats = PlayerStats::default();
        stats.proteins_explored.insert("p1".to_string());
        let json = serde_json::to_value(&stats).unwrap();
        assert!(json.get("proteinsExplored").is_some());
        assert!(json.get("maxStreak").is_some());
        assert!(json.get("lastPlayDate").is_none());
    }
}
