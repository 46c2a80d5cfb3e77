//! Error types for the hybrid query orchestrator

use thiserror::Error;

/// Result type alias for orchestrator operations
pub type Result<T> = std::result::Result<T, OrchestrationError>;

#[derive(Error, Debug)]
pub enum OrchestrationError {

    // =============================
    // Source Outages
    // =============================

    /// Structured store unreachable or a lookup failed.
    /// Absorbed by the orchestrator as "zero rows for this domain".
    #[error("Data source unavailable: {0}")]
    DataSourceUnavailable(String),

    /// Vector index unreachable or never initialised.
    /// Absorbed by the orchestrator as "no passages".
    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    /// Generative model call failed. Terminal for the request.
    #[error("Generation unavailable: {0}")]
    GenerationUnavailable(String),

    // =============================
    // Core Pipeline Errors
    // =============================

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl OrchestrationError {
    /// True for outages the orchestrator degrades around instead of failing.
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            OrchestrationError::DataSourceUnavailable(_) | OrchestrationError::IndexUnavailable(_)
        )
    }
}

impl From<sqlx::Error> for OrchestrationError {
    fn from(err: sqlx::Error) -> Self {
        OrchestrationError::DataSourceUnavailable(err.to_string())
    }
}
