//! Core types for PAE Quest: confidence grids, player progress and the
//! question contract shared by the daemon and the terminal client.

pub mod achievements;
pub mod confidence;
pub mod config;
pub mod error;
pub mod grid;
pub mod progress;
pub mod progress_store;
pub mod protein;
pub mod question_client;
pub mod questions;
pub mod scoring;
pub mod session;
pub mod settings;
pub mod stats;

/// Crate version shared by both binaries
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use achievements::{AchievementCatalog, AchievementRule, Category, Condition};
pub use confidence::{classify, ConfidenceBand};
pub use config::GameConfig;
pub use error::{PaeError, PaeResult};
pub use grid::{project, DisplayCell, DisplayGrid, ErrorMatrix};
pub use progress::{evaluate_unlocks, ProgressEngine, ProgressTracker, ProgressUpdate};
pub use progress_store::{JsonFileStore, MemoryStore, ProgressStore};
pub use protein::{select_matrix, Protein, ProteinCatalog};
pub use question_client::{FakeQuestionSource, HttpQuestionClient, QuestionOrigin, QuestionSource};
pub use questions::{Question, QuestionRequest, QuizQuestion};
pub use scoring::Scoreboard;
pub use session::GameSession;
pub use settings::{Audience, Difficulty, GameMode, MapType};
pub use stats::{PlayerStats, StatsPatch};
