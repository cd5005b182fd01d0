//! API routes for paed
//!
//! Handlers return `(StatusCode, String)` on failure: 400 for bad input,
//! 404 for unknown proteins, 500 for everything else.

use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use pae_common::config::check_grid_size;
use pae_common::grid::BandCounts;
use pae_common::protein::{available_map_types, ProteinSummary};
use pae_common::question_client::{question_or_fallback, quiz_or_fallback};
use pae_common::scoring::points_for;
use pae_common::stats::AnswerEvent;
use pae_common::{
    project, select_matrix, AchievementRule, Audience, ConfidenceBand, Difficulty, DisplayGrid,
    GameMode, MapType, PaeError, PaeResult, ProgressEngine, ProgressTracker, Protein, Question,
    QuestionOrigin, QuestionRequest, QuizQuestion,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

type AppStateArc = Arc<AppState>;
type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

/// Largest quiz a client may request
const MAX_QUIZ_LENGTH: usize = 10;

fn api_error(e: PaeError) -> (StatusCode, String) {
    if e.is_client_error() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else {
        error!("  Request failed ({}): {}", e.code(), e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

/// Run an engine call on the blocking pool; saves touch the filesystem
async fn run_engine<T, F>(engine: &ProgressEngine, f: F) -> Result<T, (StatusCode, String)>
where
    T: Send + 'static,
    F: FnOnce(&ProgressEngine) -> PaeResult<T> + Send + 'static,
{
    let engine = engine.clone();
    tokio::task::spawn_blocking(move || f(&engine))
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Progress task failed: {}", e),
            )
        })?
        .map_err(api_error)
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: pae_common::VERSION.to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

// ============================================================================
// Protein Routes
// ============================================================================

pub fn protein_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/proteins", get(list_proteins))
        .route("/v1/proteins/:id", get(get_protein))
        .route("/v1/grid", get(get_grid))
}

async fn list_proteins(State(state): State<AppStateArc>) -> Json<Vec<ProteinSummary>> {
    Json(state.proteins.summaries())
}

async fn get_protein(
    State(state): State<AppStateArc>,
    Path(id): Path<String>,
) -> ApiResult<Protein> {
    state
        .proteins
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Protein '{}' not found", id)))
}

#[derive(Debug, Deserialize)]
pub struct GridQuery {
    pub protein: Option<String>,
    pub map: Option<MapType>,
    pub size: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridResponse {
    pub protein_id: String,
    pub protein_name: String,
    pub map_type: MapType,
    pub available_maps: Vec<MapType>,
    pub grid: DisplayGrid,
    pub counts: BandCounts,
}

async fn get_grid(
    State(state): State<AppStateArc>,
    Query(query): Query<GridQuery>,
) -> ApiResult<GridResponse> {
    let size = query.size.unwrap_or(state.config.game.grid_size);
    check_grid_size(size).map_err(api_error)?;

    let requested = query.protein.as_deref().unwrap_or(state.config.game.protein.as_str());
    let protein = state.proteins.get_or_first(requested);
    let map_type = query.map.unwrap_or(state.config.game.map_type);

    let grid = project(select_matrix(protein, map_type), size).map_err(api_error)?;
    let counts = grid.band_counts();

    Ok(Json(GridResponse {
        protein_id: protein.id.clone(),
        protein_name: protein.name.clone(),
        map_type,
        available_maps: available_map_types(protein),
        grid,
        counts,
    }))
}

// ============================================================================
// Question Routes
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionBody {
    pub confidence: ConfidenceBand,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub audience: Audience,
    #[serde(default)]
    pub game_mode: GameMode,
    #[serde(default)]
    pub protein_id: Option<String>,
    /// Quiz length; ignored for single questions
    #[serde(default)]
    pub count: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionResponse {
    #[serde(flatten)]
    pub question: Question,
    pub origin: QuestionOrigin,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuizResponse {
    pub questions: Vec<QuizQuestion>,
    pub origin: QuestionOrigin,
}

pub fn question_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/question", post(generate_question))
        .route("/v1/quiz", post(generate_quiz))
}

fn question_request(state: &AppState, body: &QuestionBody) -> QuestionRequest {
    let protein = body.protein_id.as_deref().and_then(|id| state.proteins.get(id));
    QuestionRequest {
        confidence: body.confidence,
        difficulty: body.difficulty,
        audience: body.audience,
        game_mode: body.game_mode,
        protein_name: protein.map(|p| p.name.clone()),
        protein_function: protein.map(|p| p.function.for_audience(body.audience).to_string()),
    }
}

async fn generate_question(
    State(state): State<AppStateArc>,
    Json(body): Json<QuestionBody>,
) -> ApiResult<QuestionResponse> {
    let request = question_request(&state, &body);
    let source = state.questions.clone();

    let generated =
        tokio::task::spawn_blocking(move || question_or_fallback(source.as_deref(), &request))
            .await
            .map_err(|e| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Question task failed: {}", e),
                )
            })?;

    Ok(Json(QuestionResponse {
        question: generated.content,
        origin: generated.origin,
    }))
}

async fn generate_quiz(
    State(state): State<AppStateArc>,
    Json(body): Json<QuestionBody>,
) -> ApiResult<QuizResponse> {
    let count = body
        .count
        .unwrap_or(state.config.question_service.quiz_length)
        .clamp(1, MAX_QUIZ_LENGTH);
    let request = question_request(&state, &body);
    let source = state.questions.clone();

    let generated =
        tokio::task::spawn_blocking(move || quiz_or_fallback(source.as_deref(), &request, count))
            .await
            .map_err(|e| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Quiz task failed: {}", e),
                )
            })?;

    Ok(Json(QuizResponse {
        questions: generated.content,
        origin: generated.origin,
    }))
}

// ============================================================================
// Progress Routes
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerBody {
    pub protein_id: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub game_mode: GameMode,
    pub question: Question,
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    #[serde(flatten)]
    pub tracker: ProgressTracker,
    pub level_progress: f64,
    pub accuracy_percent: u32,
}

impl From<ProgressTracker> for ProgressResponse {
    fn from(tracker: ProgressTracker) -> Self {
        Self {
            level_progress: tracker.level_progress(),
            accuracy_percent: tracker.stats.accuracy_percent(),
            tracker,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    pub correct: bool,
    pub points: u32,
    pub correct_answer: String,
    pub unlocked: Vec<AchievementRule>,
    pub leveled_up: bool,
    pub progress: ProgressResponse,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    pub unlocked: Vec<AchievementRule>,
    pub leveled_up: bool,
    pub progress: ProgressResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AchievementStatus {
    #[serde(flatten)]
    pub rule: AchievementRule,
    pub unlocked: bool,
}

pub fn progress_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/answer", post(submit_answer))
        .route("/v1/quiz/complete", post(complete_quiz))
        .route("/v1/progress", get(get_progress))
        .route("/v1/progress/reset", post(reset_progress))
        .route("/v1/achievements", get(list_achievements))
}

async fn submit_answer(
    State(state): State<AppStateArc>,
    Json(body): Json<AnswerBody>,
) -> ApiResult<AnswerResponse> {
    body.question.validate().map_err(api_error)?;

    let protein_id = match state.proteins.get(&body.protein_id) {
        Some(p) => p.id.clone(),
        None => {
            warn!("  Answer for unknown protein '{}'", body.protein_id);
            state.proteins.first().id.clone()
        }
    };

    let correct = body.question.is_correct(&body.answer);
    let event = AnswerEvent {
        protein_id,
        difficulty: body.difficulty,
        game_mode: body.game_mode,
        correct,
        at: Utc::now(),
    };

    let mut tracker = state.tracker.write().await;
    let patch = tracker.stats.answer_patch(&event);
    let current = tracker.clone();
    let update = run_engine(&state.engine, move |engine| {
        engine.update_stats(&current, &patch)
    })
    .await?;
    *tracker = update.tracker.clone();

    if !update.unlocked.is_empty() {
        info!("  Unlocked {} achievement(s)", update.unlocked.len());
    }

    Ok(Json(AnswerResponse {
        correct,
        points: if correct { points_for(body.difficulty) } else { 0 },
        correct_answer: body.question.correct_answer,
        leveled_up: update.leveled_up(),
        unlocked: update.unlocked,
        progress: update.tracker.into(),
    }))
}

async fn complete_quiz(State(state): State<AppStateArc>) -> ApiResult<UpdateResponse> {
    let mut tracker = state.tracker.write().await;
    let patch = tracker.stats.quiz_completed_patch(Utc::now());
    let current = tracker.clone();
    let update = run_engine(&state.engine, move |engine| {
        engine.update_stats(&current, &patch)
    })
    .await?;
    *tracker = update.tracker.clone();

    Ok(Json(UpdateResponse {
        leveled_up: update.leveled_up(),
        unlocked: update.unlocked,
        progress: update.tracker.into(),
    }))
}

async fn get_progress(State(state): State<AppStateArc>) -> Json<ProgressResponse> {
    let tracker = state.tracker.read().await;
    Json(tracker.clone().into())
}

async fn reset_progress(State(state): State<AppStateArc>) -> ApiResult<ProgressResponse> {
    let mut tracker = state.tracker.write().await;
    *tracker = run_engine(&state.engine, |engine| engine.reset()).await?;
    Ok(Json(tracker.clone().into()))
}

async fn list_achievements(State(state): State<AppStateArc>) -> Json<Vec<AchievementStatus>> {
    let tracker = state.tracker.read().await;
    let list = state
        .engine
        .catalog()
        .rules()
        .iter()
        .map(|rule| AchievementStatus {
            unlocked: tracker.is_unlocked(&rule.id),
            rule: rule.clone(),
        })
        .collect();
    Json(list)
}
