//! Experience, levels and achievement unlocks.
//!
//! ## Leveling curve
//!
//! Reaching level L+1 from level L costs `100 * L` experience. Experience is
//! carried within the current level: on level-up the threshold is subtracted
//! and the next threshold is computed. There is no level cap.
//!
//! ## Unlocks
//!
//! Achievements are evaluated against the merged stats after every update.
//! An unlocked id is never evaluated again and never revoked, even when its
//! condition later stops holding (a streak reset does not take back a streak
//! badge).

use crate::achievements::{AchievementCatalog, AchievementRule};
use crate::error::PaeResult;
use crate::progress_store::ProgressStore;
use crate::stats::{PlayerStats, StatsPatch};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Experience per level step
pub const XP_PER_LEVEL: u64 = 100;

/// Experience needed to go from `level` to `level + 1`
pub fn xp_for_level(level: u32) -> u64 {
    XP_PER_LEVEL * level as u64
}

/// Persistent player progression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressTracker {
    pub level: u32,
    /// Experience within the current level
    pub experience: u64,
    pub experience_to_next: u64,
    #[serde(rename = "unlockedAchievements", alias = "unlockedAchievementIds", default)]
    pub unlocked_achievement_ids: BTreeSet<String>,
    #[serde(default)]
    pub stats: PlayerStats,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self {
            level: 1,
            experience: 0,
            experience_to_next: xp_for_level(1),
            unlocked_achievement_ids: BTreeSet::new(),
            stats: PlayerStats::default(),
        }
    }
}

impl ProgressTracker {
    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked_achievement_ids.contains(id)
    }

    /// Fraction of the current level completed (0.0-1.0)
    pub fn level_progress(&self) -> f64 {
        if self.experience_to_next == 0 {
            return 0.0;
        }
        (self.experience as f64 / self.experience_to_next as f64).clamp(0.0, 1.0)
    }

    /// Repair a tracker read from storage: clamp level/threshold to valid
    /// values and drop unlocked ids the catalog does not know.
    ///
    /// Returns the dropped ids.
    fn reconcile(&mut self, catalog: &AchievementCatalog) -> Vec<String> {
        if self.level == 0 {
            self.level = 1;
        }
        if self.experience_to_next == 0 {
            self.experience_to_next = xp_for_level(self.level);
        }
        let unknown: Vec<String> = self
            .unlocked_achievement_ids
            .iter()
            .filter(|id| !catalog.contains(id))
            .cloned()
            .collect();
        for id in &unknown {
            self.unlocked_achievement_ids.remove(id);
        }
        unknown
    }
}

/// Result of one `update_stats` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub tracker: ProgressTracker,
    /// Rules unlocked by this update, in catalog order
    pub unlocked: Vec<AchievementRule>,
    pub experience_gained: u64,
    pub levels_gained: u32,
}

impl ProgressUpdate {
    pub fn leveled_up(&self) -> bool {
        self.levels_gained > 0
    }
}

// ============================================================================
// Pure steps
// ============================================================================

/// Rules not yet unlocked whose condition holds for `stats`, in catalog order
pub fn evaluate_unlocks(
    previously_unlocked: &BTreeSet<String>,
    stats: &PlayerStats,
    catalog: &AchievementCatalog,
) -> Vec<AchievementRule> {
    catalog
        .rules()
        .iter()
        .filter(|rule| !previously_unlocked.contains(&rule.id))
        .filter(|rule| rule.condition.is_met(stats))
        .cloned()
        .collect()
}

/// Award the points of `newly_unlocked` and apply level-ups.
///
/// Pure; `ProgressEngine::apply_progress` adds persistence.
pub fn advance(tracker: &ProgressTracker, newly_unlocked: &[AchievementRule]) -> ProgressTracker {
    let gained: u64 = newly_unlocked.iter().map(|r| r.points as u64).sum();

    let mut level = tracker.level;
    let mut experience = tracker.experience + gained;
    let mut experience_to_next = tracker.experience_to_next;

    while experience >= experience_to_next {
        experience -= experience_to_next;
        level += 1;
        experience_to_next = xp_for_level(level);
    }

    let mut unlocked = tracker.unlocked_achievement_ids.clone();
    unlocked.extend(newly_unlocked.iter().map(|r| r.id.clone()));

    ProgressTracker {
        level,
        experience,
        experience_to_next,
        unlocked_achievement_ids: unlocked,
        stats: tracker.stats.clone(),
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Applies stat updates to a tracker and persists the result
#[derive(Clone)]
pub struct ProgressEngine {
    catalog: Arc<AchievementCatalog>,
    store: Arc<dyn ProgressStore>,
}

impl ProgressEngine {
    pub fn new(catalog: AchievementCatalog, store: Arc<dyn ProgressStore>) -> Self {
        Self {
            catalog: Arc::new(catalog),
            store,
        }
    }

    pub fn catalog(&self) -> &AchievementCatalog {
        &self.catalog
    }

    /// Stored tracker, or the default tracker when nothing is stored
    pub fn load_or_default(&self) -> PaeResult<ProgressTracker> {
        match self.store.load()? {
            Some(mut tracker) => {
                let dropped = tracker.reconcile(&self.catalog);
                if !dropped.is_empty() {
                    warn!(
                        "Ignoring unknown achievements in stored progress: {}",
                        dropped.join(", ")
                    );
                }
                Ok(tracker)
            }
            None => {
                debug!("No stored progress, starting fresh");
                Ok(ProgressTracker::default())
            }
        }
    }

    /// `advance` followed by a save; the save completes before returning
    pub fn apply_progress(
        &self,
        tracker: &ProgressTracker,
        newly_unlocked: &[AchievementRule],
    ) -> PaeResult<ProgressTracker> {
        let next = advance(tracker, newly_unlocked);
        self.store.save(&next)?;
        Ok(next)
    }

    /// Merge `patch` into the tracker's stats, unlock achievements, level up
    /// and persist. This is the entry point for game code.
    pub fn update_stats(
        &self,
        tracker: &ProgressTracker,
        patch: &StatsPatch,
    ) -> PaeResult<ProgressUpdate> {
        let stats = tracker.stats.merge(patch)?;
        let unlocked = evaluate_unlocks(&tracker.unlocked_achievement_ids, &stats, &self.catalog);

        let merged = ProgressTracker {
            stats,
            ..tracker.clone()
        };
        let next = self.apply_progress(&merged, &unlocked)?;

        let experience_gained = unlocked.iter().map(|r| r.points as u64).sum();
        let levels_gained = next.level - tracker.level;

        for rule in &unlocked {
            info!("Achievement unlocked: {} (+{} XP)", rule.id, rule.points);
        }
        if levels_gained > 0 {
            info!("Level up: {} -> {}", tracker.level, next.level);
        }

        Ok(ProgressUpdate {
            tracker: next,
            unlocked,
            experience_gained,
            levels_gained,
        })
    }

    /// Replace stored progress with the default tracker
    pub fn reset(&self) -> PaeResult<ProgressTracker> {
        let tracker = ProgressTracker::default();
        self.store.save(&tracker)?;
        info!("Progress reset");
        Ok(tracker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievements::{Category, Condition};
    use crate::progress_store::MemoryStore;

    fn rule(id: &str, points: u32, condition: Condition) -> AchievementRule {
        AchievementRule::new(id, id, id, "*", points, Category::Learning, condition)
    }

    fn engine() -> (ProgressEngine, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (ProgressEngine::new(AchievementCatalog::default(), store.clone()), store)
    }

    #[test]
    fn test_default_tracker() {
        let t = ProgressTracker::default();
        assert_eq!((t.level, t.experience, t.experience_to_next), (1, 0, 100));
        assert!(t.unlocked_achievement_ids.is_empty());
        assert_eq!(t.stats, PlayerStats::default());
    }

    #[test]
    fn test_advance_no_unlocks_is_noop() {
        let mut t = ProgressTracker::default();
        t.level = 2;
        t.experience = 57;
        t.experience_to_next = 200;
        let next = advance(&t, &[]);
        assert_eq!(next, t);
    }

    #[test]
    fn test_advance_multi_level_jump() {
        let mut t = ProgressTracker::default();
        t.experience = 90;
        let big = rule("big", 250, Condition::CorrectAnswersAtLeast(1));
        let next = advance(&t, &[big]);
        assert_eq!((next.level, next.experience, next.experience_to_next), (3, 40, 300));
        assert!(next.is_unlocked("big"));
    }

    #[test]
    fn test_advance_exact_threshold_levels_up() {
        let t = ProgressTracker::default();
        let r = rule("r", 100, Condition::CorrectAnswersAtLeast(1));
        let next = advance(&t, &[r]);
        assert_eq!((next.level, next.experience, next.experience_to_next), (2, 0, 200));
    }

    #[test]
    fn test_evaluate_unlocks_skips_previous_and_keeps_order() {
        let catalog = AchievementCatalog::default();
        let mut stats = PlayerStats::default();
        stats.total_questions = 30;
        stats.correct_answers = 25;
        stats.max_streak = 5;

        let previous = BTreeSet::from(["first_steps".to_string()]);
        let ids: Vec<String> = evaluate_unlocks(&previous, &stats, &catalog)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["streak_starter", "confidence_master"]);
    }

    #[test]
    fn test_update_stats_unlocks_and_saves() {
        let (engine, store) = engine();
        let tracker = ProgressTracker::default();
        let patch = StatsPatch {
            total_questions: Some(1),
            correct_answers: Some(1),
            streak: Some(1),
            ..Default::default()
        };

        let update = engine.update_stats(&tracker, &patch).unwrap();
        assert_eq!(update.unlocked.len(), 1);
        assert_eq!(update.unlocked[0].id, "first_steps");
        assert_eq!(update.experience_gained, 10);
        assert_eq!(update.tracker.experience, 10);
        assert!(!update.leveled_up());
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.load().unwrap(), Some(update.tracker.clone()));
    }

    #[test]
    fn test_update_stats_never_reawards() {
        let (engine, _store) = engine();
        let patch = StatsPatch {
            total_questions: Some(1),
            correct_answers: Some(1),
            ..Default::default()
        };
        let first = engine.update_stats(&ProgressTracker::default(), &patch).unwrap();
        let second = engine.update_stats(&first.tracker, &patch).unwrap();
        assert!(second.unlocked.is_empty());
        assert_eq!(second.tracker.experience, first.tracker.experience);
    }

    #[test]
    fn test_streak_badge_survives_reset() {
        let (engine, _store) = engine();
        let hot = StatsPatch {
            total_questions: Some(5),
            correct_answers: Some(5),
            streak: Some(5),
            ..Default::default()
        };
        let t = engine.update_stats(&ProgressTracker::default(), &hot).unwrap().tracker;
        assert!(t.is_unlocked("streak_starter"));

        let cold = StatsPatch {
            total_questions: Some(6),
            streak: Some(0),
            ..Default::default()
        };
        let t = engine.update_stats(&t, &cold).unwrap().tracker;
        assert!(t.is_unlocked("streak_starter"));
        assert_eq!(t.stats.streak, 0);
        assert_eq!(t.stats.max_streak, 5);
    }

    #[test]
    fn test_update_stats_invalid_patch_does_not_save() {
        let (engine, store) = engine();
        let patch = StatsPatch {
            correct_answers: Some(3),
            ..Default::default()
        };
        assert!(engine.update_stats(&ProgressTracker::default(), &patch).is_err());
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn test_load_or_default_drops_unknown_ids() {
        let mut stored = ProgressTracker::default();
        stored.unlocked_achievement_ids.insert("first_steps".to_string());
        stored.unlocked_achievement_ids.insert("retired_badge".to_string());
        let store = Arc::new(MemoryStore::with_tracker(stored));
        let engine = ProgressEngine::new(AchievementCatalog::default(), store);

        let loaded = engine.load_or_default().unwrap();
        assert!(loaded.is_unlocked("first_steps"));
        assert!(!loaded.is_unlocked("retired_badge"));
    }

    #[test]
    fn test_load_or_default_repairs_zero_threshold() {
        let mut stored = ProgressTracker::default();
        stored.level = 0;
        stored.experience_to_next = 0;
        let engine = ProgressEngine::new(
            AchievementCatalog::default(),
            Arc::new(MemoryStore::with_tracker(stored)),
        );
        let loaded = engine.load_or_default().unwrap();
        assert_eq!((loaded.level, loaded.experience_to_next), (1, 100));
    }

    #[test]
    fn test_level_progress() {
        let mut t = ProgressTracker::default();
        t.experience = 25;
        assert!((t.level_progress() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_tracker_reads_browser_shape() {
        let json = r#"{
            "level": 2,
            "experience": 35,
            "experienceToNext": 200,
            "unlockedAchievements": ["first_steps", "curious_explorer"],
            "stats": {
                "totalQuestions": 4,
                "correctAnswers": 3,
                "streak": 2,
                "maxStreak": 3,
                "proteinsExplored": ["p1", "p2", "p3"],
                "difficultiesCompleted": ["beginner"],
                "gameModesUsed": ["challenge"],
                "quizzesCompleted": 0,
                "totalPlayTime": 0,
                "lastPlayDate": "2024-05-01T12:00:00Z"
            }
        }"#;
        let t: ProgressTracker = serde_json::from_str(json).unwrap();
        assert_eq!(t.level, 2);
        assert_eq!(t.unlocked_achievement_ids.len(), 2);
        assert_eq!(t.stats.proteins_explored.len(), 3);
        assert!(t.stats.last_play_date.is_some());
    }
}
