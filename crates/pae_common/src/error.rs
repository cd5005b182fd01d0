//! Error types for PAE Quest.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaeError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Question service error: {0}")]
    ExternalService(String),

    #[error("Progress store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PaeError {
    /// Stable numeric code, used by the HTTP layer and in logs
    pub fn code(&self) -> i32 {
        match self {
            PaeError::InvalidInput(_) => -32602,
            PaeError::Config(_) => -32010,
            PaeError::ExternalService(_) => -32020,
            PaeError::Store(_) => -32030,
            PaeError::Io(_) => -32031,
            PaeError::Json(_) => -32700,
        }
    }

    /// True for errors caused by the caller's input rather than the system
    pub fn is_client_error(&self) -> bool {
        matches!(self, PaeError::InvalidInput(_))
    }
}

pub type PaeResult<T> = Result<T, PaeError>;
