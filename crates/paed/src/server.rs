//! HTTP server for paed

use crate::routes;
use anyhow::{Context, Result};
use axum::Router;
use pae_common::{
    GameConfig, HttpQuestionClient, JsonFileStore, PaeResult, ProgressEngine, ProgressTracker,
    ProteinCatalog, QuestionSource,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers
pub struct AppState {
    pub config: GameConfig,
    pub proteins: Arc<ProteinCatalog>,
    pub engine: ProgressEngine,
    /// Single writer for progress updates; last writer wins on disk
    pub tracker: RwLock<ProgressTracker>,
    /// None when the question service is disabled
    pub questions: Option<Arc<dyn QuestionSource>>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: GameConfig,
        proteins: ProteinCatalog,
        engine: ProgressEngine,
        questions: Option<Arc<dyn QuestionSource>>,
    ) -> PaeResult<Self> {
        let tracker = engine.load_or_default()?;
        Ok(Self {
            config,
            proteins: Arc::new(proteins),
            engine,
            tracker: RwLock::new(tracker),
            questions,
            start_time: Instant::now(),
        })
    }

    /// Build catalogs, store and question client from configuration
    pub fn from_config(config: GameConfig) -> Result<Self> {
        let proteins = config.protein_catalog()?;
        let achievements = config.achievement_catalog()?;

        let data_dir = config.data_dir()?;
        let store = Arc::new(JsonFileStore::new(&data_dir));
        info!("  Progress file: {}", store.path().display());
        let engine = ProgressEngine::new(achievements, store);

        let questions: Option<Arc<dyn QuestionSource>> = if config.question_service.enabled {
            let client = HttpQuestionClient::new(config.question_service.clone())?;
            info!("  Question service: {}", config.question_service.endpoint);
            Some(Arc::new(client))
        } else {
            info!("  Question service disabled, using built-in questions");
            None
        };

        Self::new(config, proteins, engine, questions).context("Failed to load stored progress")
    }
}

/// Router with all API routes, CORS and request tracing
pub fn create_router(state: Arc<AppState>) -> Router {
    // The browser UI is served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::health_routes())
        .merge(routes::protein_routes())
        .merge(routes::question_routes())
        .merge(routes::progress_routes())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server
pub async fn run(state: AppState) -> Result<()> {
    let addr = state.config.server.bind.clone();
    let app = create_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("  Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down gracefully");
    }
}
