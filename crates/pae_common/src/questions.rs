//! Question contract and deterministic fallbacks.
//!
//! The question service returns `{question, options, correctAnswer}` for a
//! single cell and an array of the same plus `explanation` for a quiz. When
//! the service cannot be used, the fallbacks below are derived only from the
//! confidence band and the difficulty.

use crate::confidence::ConfidenceBand;
use crate::error::{PaeError, PaeResult};
use crate::settings::{Audience, Difficulty, GameMode};
use serde::{Deserialize, Serialize};

/// Request body sent to the question service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRequest {
    pub confidence: ConfidenceBand,
    pub difficulty: Difficulty,
    pub audience: Audience,
    pub game_mode: GameMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein_function: Option<String>,
}

impl QuestionRequest {
    pub fn new(confidence: ConfidenceBand, difficulty: Difficulty) -> Self {
        Self {
            confidence,
            difficulty,
            audience: Audience::default(),
            game_mode: GameMode::default(),
            protein_name: None,
            protein_function: None,
        }
    }
}

/// Multiple-choice question for one grid cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

impl Question {
    pub fn validate(&self) -> PaeResult<()> {
        validate_choice(&self.question, &self.options, &self.correct_answer)
    }

    /// Exact match against the correct answer
    pub fn is_correct(&self, answer: &str) -> bool {
        answer == self.correct_answer
    }
}

/// Quiz question; the explanation is shown after answering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: String,
}

impl QuizQuestion {
    pub fn validate(&self) -> PaeResult<()> {
        validate_choice(&self.question, &self.options, &self.correct_answer)
    }

    pub fn is_correct(&self, answer: &str) -> bool {
        answer == self.correct_answer
    }
}

fn validate_choice(question: &str, options: &[String], correct: &str) -> PaeResult<()> {
    if question.trim().is_empty() {
        return Err(PaeError::InvalidInput("question text is empty".to_string()));
    }
    if options.len() < 2 {
        return Err(PaeError::InvalidInput(format!(
            "question needs at least two options, got {}",
            options.len()
        )));
    }
    if !options.iter().any(|o| o == correct) {
        return Err(PaeError::InvalidInput(format!(
            "correct answer '{}' is not among the options",
            correct
        )));
    }
    Ok(())
}

// ============================================================================
// Fallbacks
// ============================================================================

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

const FALLBACK_PROMPT: &str =
    "What does this part of the PAE map tell us about the protein structure?";

/// Fallback question for a cell
pub fn fallback_question(confidence: ConfidenceBand, difficulty: Difficulty) -> Question {
    use ConfidenceBand::*;

    if difficulty == Difficulty::Beginner {
        let (options, correct) = match confidence {
            High => (["Very confident", "Not confident"], "Very confident"),
            Medium => (["Somewhat confident", "Not confident"], "Somewhat confident"),
            Low => (["Very confident", "Not confident"], "Not confident"),
        };
        return Question {
            question: "How confident are we about this part of the protein?".to_string(),
            options: strings(&options),
            correct_answer: correct.to_string(),
        };
    }

    let (options, correct) = match confidence {
        High => (
            [
                "This region is well-predicted",
                "This region has high uncertainty",
                "This region may have errors",
            ],
            "This region is well-predicted",
        ),
        Medium => (
            [
                "This region is somewhat flexible",
                "This region is completely disordered",
                "This region is rigid",
            ],
            "This region is somewhat flexible",
        ),
        Low => (
            [
                "This region has high uncertainty",
                "This region is well-predicted",
                "This region is rigid",
            ],
            "This region has high uncertainty",
        ),
    };
    Question {
        question: FALLBACK_PROMPT.to_string(),
        options: strings(&options),
        correct_answer: correct.to_string(),
    }
}

/// Three-question fallback quiz for a band
pub fn fallback_quiz(confidence: ConfidenceBand, difficulty: Difficulty) -> Vec<QuizQuestion> {
    use ConfidenceBand::*;

    let band_answer = match confidence {
        High => "High confidence",
        Medium => "Medium confidence",
        Low => "Low confidence",
    };
    let band_question = match difficulty {
        Difficulty::Beginner => "What color group does this part of the map belong to?".to_string(),
        _ => format!("Which confidence band does a {} PAE region fall into?", confidence),
    };

    let range_question = match difficulty {
        Difficulty::Beginner => "How big is the expected error here?".to_string(),
        Difficulty::Intermediate => {
            "What range of predicted aligned error matches this band?".to_string()
        }
        Difficulty::Advanced => {
            "Which expected positional error range (in Angstroms) defines this band?".to_string()
        }
    };

    let (reading, reading_options, reading_explanation) = match confidence {
        High => (
            "The relative position of these residues can be trusted",
            [
                "The relative position of these residues can be trusted",
                "These residues are probably disordered",
                "The model has no information about these residues",
            ],
            "Low error means AlphaFold trusts how these parts sit relative to each other.",
        ),
        Medium => (
            "These residues are placed roughly right but may move",
            [
                "These residues are placed roughly right but may move",
                "The relative position of these residues can be trusted",
                "These residues are probably disordered",
            ],
            "Moderate error often points to flexible linkers or loosely packed domains.",
        ),
        Low => (
            "The relative position of these residues is uncertain",
            [
                "The relative position of these residues is uncertain",
                "The relative position of these residues can be trusted",
                "These residues form a rigid core",
            ],
            "High error means the model cannot tell how these parts are arranged.",
        ),
    };

    vec![
        QuizQuestion {
            question: band_question,
            options: strings(&["High confidence", "Medium confidence", "Low confidence"]),
            correct_answer: band_answer.to_string(),
            explanation: format!(
                "PAE {} is classed as {} confidence.",
                confidence.range_label(),
                confidence
            ),
        },
        QuizQuestion {
            question: range_question,
            options: ConfidenceBand::ALL
                .iter()
                .map(|b| b.range_label().to_string())
                .collect(),
            correct_answer: confidence.range_label().to_string(),
            explanation: "Bands split at 5 Å and 15 Å of expected positional error.".to_string(),
        },
        QuizQuestion {
            question: "How should you read this region of the PAE map?".to_string(),
            options: strings(&reading_options),
            correct_answer: reading.to_string(),
            explanation: reading_explanation.to_string(),
        },
    ]
}
