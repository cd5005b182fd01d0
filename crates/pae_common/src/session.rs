//! One player's game session.
//!
//! Holds the current settings and grid, the in-session scoreboard, the
//! persistent tracker and the question waiting for an answer. Every state
//! change that affects the grid re-runs `project` over `select_matrix`.

use crate::achievements::AchievementRule;
use crate::confidence::ConfidenceBand;
use crate::config::{check_grid_size, GameDefaults};
use crate::error::{PaeError, PaeResult};
use crate::grid::{project, DisplayGrid};
use crate::progress::{ProgressEngine, ProgressTracker, ProgressUpdate};
use crate::protein::{select_matrix, Protein, ProteinCatalog};
use crate::question_client::{question_or_fallback, quiz_or_fallback, Generated, QuestionSource};
use crate::questions::{Question, QuestionRequest, QuizQuestion};
use crate::scoring::Scoreboard;
use crate::settings::{Audience, Difficulty, GameMode, MapType};
use crate::stats::AnswerEvent;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Question asked for a grid cell, awaiting an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingQuestion {
    pub row: usize,
    pub col: usize,
    pub confidence: ConfidenceBand,
    pub question: Question,
}

/// Result of answering the pending question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    pub correct: bool,
    pub points: u32,
    pub correct_answer: String,
    pub unlocked: Vec<AchievementRule>,
    pub leveled_up: bool,
    pub level: u32,
}

pub struct GameSession {
    catalog: Arc<ProteinCatalog>,
    protein_id: String,
    map_type: MapType,
    grid_size: usize,
    pub difficulty: Difficulty,
    pub audience: Audience,
    pub game_mode: GameMode,
    grid: DisplayGrid,
    scoreboard: Scoreboard,
    tracker: ProgressTracker,
    pending: Option<PendingQuestion>,
}

impl GameSession {
    pub fn new(
        catalog: Arc<ProteinCatalog>,
        defaults: &GameDefaults,
        tracker: ProgressTracker,
    ) -> PaeResult<Self> {
        check_grid_size(defaults.grid_size)?;
        let protein = catalog.get_or_first(&defaults.protein);
        let protein_id = protein.id.clone();
        let grid = project(select_matrix(protein, defaults.map_type), defaults.grid_size)?;

        Ok(Self {
            catalog,
            protein_id,
            map_type: defaults.map_type,
            grid_size: defaults.grid_size,
            difficulty: defaults.difficulty,
            audience: defaults.audience,
            game_mode: defaults.game_mode,
            grid,
            scoreboard: Scoreboard::default(),
            tracker,
            pending: None,
        })
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn protein(&self) -> &Protein {
        self.catalog.get_or_first(&self.protein_id)
    }

    pub fn map_type(&self) -> MapType {
        self.map_type
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    pub fn grid(&self) -> &DisplayGrid {
        &self.grid
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub fn pending(&self) -> Option<&PendingQuestion> {
        self.pending.as_ref()
    }

    // ------------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------------

    /// Switch protein; unknown ids select the first protein
    pub fn select_protein(&mut self, id: &str) -> PaeResult<()> {
        let protein = self.catalog.get_or_first(id);
        if protein.id != id {
            warn!("Unknown protein '{}', using '{}'", id, protein.id);
        }
        let grid = project(select_matrix(protein, self.map_type), self.grid_size)?;
        self.protein_id = protein.id.clone();
        self.install(grid);
        Ok(())
    }

    pub fn set_map_type(&mut self, map_type: MapType) -> PaeResult<()> {
        let grid = project(select_matrix(self.protein(), map_type), self.grid_size)?;
        self.map_type = map_type;
        self.install(grid);
        Ok(())
    }

    /// Fails with `InvalidInput` outside `1..=MAX_GRID_SIZE`, leaving the
    /// session unchanged
    pub fn set_grid_size(&mut self, size: usize) -> PaeResult<()> {
        check_grid_size(size)?;
        let grid = project(select_matrix(self.protein(), self.map_type), size)?;
        self.grid_size = size;
        self.install(grid);
        Ok(())
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    fn install(&mut self, grid: DisplayGrid) {
        debug!(
            "Grid for {} ({}, {}x{})",
            self.protein_id, self.map_type, grid.size, grid.size
        );
        self.grid = grid;
        self.pending = None;
    }

    // ------------------------------------------------------------------------
    // Questions
    // ------------------------------------------------------------------------

    fn request(&self, confidence: ConfidenceBand) -> QuestionRequest {
        let protein = self.protein();
        QuestionRequest {
            confidence,
            difficulty: self.difficulty,
            audience: self.audience,
            game_mode: self.game_mode,
            protein_name: Some(protein.name.clone()),
            protein_function: Some(protein.function.for_audience(self.audience).to_string()),
        }
    }

    /// Ask about the cell at (`row`, `col`); replaces any pending question
    pub fn ask(
        &mut self,
        row: usize,
        col: usize,
        source: Option<&dyn QuestionSource>,
    ) -> PaeResult<Generated<Question>> {
        let cell = self.grid.cell(row, col).copied().ok_or_else(|| {
            PaeError::InvalidInput(format!(
                "cell ({}, {}) is outside the {}x{} grid",
                row, col, self.grid_size, self.grid_size
            ))
        })?;

        let generated = question_or_fallback(source, &self.request(cell.confidence));
        self.pending = Some(PendingQuestion {
            row,
            col,
            confidence: cell.confidence,
            question: generated.content.clone(),
        });
        Ok(generated)
    }

    /// Score the pending question and push the result through the engine
    pub fn answer(&mut self, answer: &str, engine: &ProgressEngine) -> PaeResult<AnswerOutcome> {
        let pending = self.pending.as_ref().ok_or_else(|| {
            PaeError::InvalidInput("no question is waiting for an answer".to_string())
        })?;

        let correct = pending.question.is_correct(answer);
        let correct_answer = pending.question.correct_answer.clone();
        let event = AnswerEvent {
            protein_id: self.protein_id.clone(),
            difficulty: self.difficulty,
            game_mode: self.game_mode,
            correct,
            at: Utc::now(),
        };

        let patch = self.tracker.stats.answer_patch(&event);
        let update = engine.update_stats(&self.tracker, &patch)?;

        let points = self.scoreboard.record(correct, self.difficulty);
        self.pending = None;
        self.tracker = update.tracker;

        Ok(AnswerOutcome {
            correct,
            points,
            correct_answer,
            leveled_up: update.levels_gained > 0,
            level: self.tracker.level,
            unlocked: update.unlocked,
        })
    }

    /// Most common band on the current grid; ties go to the higher band
    pub fn dominant_band(&self) -> ConfidenceBand {
        let counts = self.grid.band_counts();
        ConfidenceBand::ALL
            .into_iter()
            .fold(ConfidenceBand::High, |best, band| {
                if counts.get(band) > counts.get(best) {
                    band
                } else {
                    best
                }
            })
    }

    /// Quiz about the current protein's dominant band
    pub fn quiz(
        &self,
        source: Option<&dyn QuestionSource>,
        count: usize,
    ) -> Generated<Vec<QuizQuestion>> {
        quiz_or_fallback(source, &self.request(self.dominant_band()), count)
    }

    pub fn complete_quiz(&mut self, engine: &ProgressEngine) -> PaeResult<ProgressUpdate> {
        let patch = self.tracker.stats.quiz_completed_patch(Utc::now());
        let update = engine.update_stats(&self.tracker, &patch)?;
        self.tracker = update.tracker.clone();
        Ok(update)
    }

    /// Add `seconds` to the total play time; zero is a no-op
    pub fn record_play_time(
        &mut self,
        seconds: u64,
        engine: &ProgressEngine,
    ) -> PaeResult<ProgressUpdate> {
        if seconds == 0 {
            return Ok(ProgressUpdate {
                tracker: self.tracker.clone(),
                unlocked: Vec::new(),
                experience_gained: 0,
                levels_gained: 0,
            });
        }
        let patch = self.tracker.stats.play_time_patch(seconds);
        let update = engine.update_stats(&self.tracker, &patch)?;
        self.tracker = update.tracker.clone();
        Ok(update)
    }

    /// Clear the scoreboard and pending question; the tracker is kept
    pub fn reset(&mut self) -> PaeResult<()> {
        let grid = project(select_matrix(self.protein(), self.map_type), self.grid_size)?;
        self.scoreboard.reset();
        self.install(grid);
        Ok(())
    }
}
