//! Achievement rules and the achievement catalog.
//!
//! Unlock conditions are a closed set of stat thresholds, so a catalog is
//! plain data: it can be loaded from TOML and validated up front.

use crate::error::{PaeError, PaeResult};
use crate::stats::PlayerStats;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Learning,
    Exploration,
    Mastery,
    Consistency,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Learning => "learning",
            Category::Exploration => "exploration",
            Category::Mastery => "mastery",
            Category::Consistency => "consistency",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stat threshold that unlocks an achievement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Condition {
    CorrectAnswersAtLeast(u32),
    TotalQuestionsAtLeast(u32),
    StreakAtLeast(u32),
    MaxStreakAtLeast(u32),
    ProteinsExploredAtLeast(usize),
    DifficultiesCompletedAtLeast(usize),
    GameModesUsedAtLeast(usize),
    QuizzesCompletedAtLeast(u32),
    /// Seconds
    PlayTimeAtLeast(u64),
}

impl Condition {
    pub fn is_met(&self, stats: &PlayerStats) -> bool {
        match *self {
            Condition::CorrectAnswersAtLeast(n) => stats.correct_answers >= n,
            Condition::TotalQuestionsAtLeast(n) => stats.total_questions >= n,
            Condition::StreakAtLeast(n) => stats.streak >= n,
            Condition::MaxStreakAtLeast(n) => stats.max_streak >= n,
            Condition::ProteinsExploredAtLeast(n) => stats.proteins_explored.len() >= n,
            Condition::DifficultiesCompletedAtLeast(n) => stats.difficulties_completed.len() >= n,
            Condition::GameModesUsedAtLeast(n) => stats.game_modes_used.len() >= n,
            Condition::QuizzesCompletedAtLeast(n) => stats.quizzes_completed >= n,
            Condition::PlayTimeAtLeast(secs) => stats.total_play_time >= secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementRule {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub points: u32,
    pub category: Category,
    pub condition: Condition,
}

impl AchievementRule {
    pub fn new(
        id: &str,
        name: &str,
        description: &str,
        icon: &str,
        points: u32,
        category: Category,
        condition: Condition,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            points,
            category,
            condition,
        }
    }
}

/// Validated, ordered set of achievement rules.
///
/// Catalog order is display order and the tie-break for simultaneous unlocks.
#[derive(Debug, Clone, PartialEq)]
pub struct AchievementCatalog {
    rules: Vec<AchievementRule>,
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(rename = "achievement", default)]
    achievements: Vec<AchievementRule>,
}

impl AchievementCatalog {
    /// Build a catalog, failing on duplicate or empty ids and zero points
    pub fn new(rules: Vec<AchievementRule>) -> PaeResult<Self> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if rule.id.trim().is_empty() {
                return Err(PaeError::Config(format!(
                    "achievement '{}' has an empty id",
                    rule.name
                )));
            }
            if rule.points == 0 {
                return Err(PaeError::Config(format!(
                    "achievement '{}' awards no points",
                    rule.id
                )));
            }
            if !seen.insert(rule.id.as_str()) {
                return Err(PaeError::Config(format!("duplicate achievement id '{}'", rule.id)));
            }
        }
        Ok(Self { rules })
    }

    /// Parse `[[achievement]]` tables
    pub fn from_toml(contents: &str) -> PaeResult<Self> {
        let file: CatalogFile = toml::from_str(contents)
            .map_err(|e| PaeError::Config(format!("invalid achievement catalog: {}", e)))?;
        Self::new(file.achievements)
    }

    pub fn from_path(path: &Path) -> PaeResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn rules(&self) -> &[AchievementRule] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&AchievementRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Sum of all points on offer
    pub fn total_points(&self) -> u64 {
        self.rules.iter().map(|r| r.points as u64).sum()
    }
}

impl Default for AchievementCatalog {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

/// The game's standard achievements
pub fn default_rules() -> Vec<AchievementRule> {
    use Category::*;
    use Condition::*;

    vec![
        AchievementRule::new(
            "first_steps",
            "First Steps",
            "Answer your first question correctly",
            "🌟",
            10,
            Learning,
            CorrectAnswersAtLeast(1),
        ),
        AchievementRule::new(
            "curious_explorer",
            "Curious Explorer",
            "Explore 3 different proteins",
            "🔍",
            25,
            Exploration,
            ProteinsExploredAtLeast(3),
        ),
        AchievementRule::new(
            "streak_starter",
            "Streak Starter",
            "Get 5 questions correct in a row",
            "⚡",
            20,
            Consistency,
            MaxStreakAtLeast(5),
        ),
        AchievementRule::new(
            "knowledge_seeker",
            "Knowledge Seeker",
            "Complete your first protein quiz",
            "📚",
            15,
            Learning,
            QuizzesCompletedAtLeast(1),
        ),
        AchievementRule::new(
            "confidence_master",
            "Confidence Master",
            "Answer 25 questions correctly",
            "🎯",
            50,
            Mastery,
            CorrectAnswersAtLeast(25),
        ),
        AchievementRule::new(
            "difficulty_climber",
            "Difficulty Climber",
            "Try all three difficulty levels",
            "🏔️",
            30,
            Exploration,
            DifficultiesCompletedAtLeast(3),
        ),
        AchievementRule::new(
            "protein_expert",
            "Protein Expert",
            "Explore 10 different proteins",
            "🧬",
            75,
            Mastery,
            ProteinsExploredAtLeast(10),
        ),
        AchievementRule::new(
            "quiz_champion",
            "Quiz Champion",
            "Complete 5 protein quizzes",
            "🏆",
            40,
            Mastery,
            QuizzesCompletedAtLeast(5),
        ),
    ]
}

/// Format a single achievement for an unlock notification
pub fn format_unlock(rule: &AchievementRule) -> String {
    format!(
        "{} Achievement unlocked: {} - {} (+{} XP)",
        rule.icon, rule.name, rule.description, rule.points
    )
}
