//! Error types for the taskroute engine
//!
//! Provides comprehensive error handling with context propagation
//! across extraction, scoring, ledger, and persistence layers.

use thiserror::Error;

/// Main error type for the classification engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Request validation errors (rejected before extraction)
    #[error("Invalid request: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// Weight vector construction errors
    #[error("Invalid weight vector: weights sum to {sum}, expected 1.0")]
    InvalidWeights { sum: f64 },

    /// Threshold configuration errors
    #[error("Invalid threshold configuration: {0}")]
    InvalidThresholds(String),

    /// Override application errors
    #[error("Override rejected: {0}")]
    OverrideRejected(String),

    /// Unknown agent lookups
    #[error("No trust history for agent: {agent_id}")]
    UnknownAgent { agent_id: String },

    /// Persistence failures after bounded retries
    #[error("Persistence failed after {attempts} attempts: {reason}")]
    Persistence { attempts: u32, reason: String },

    /// NLU client errors (non-fatal; callers degrade instead of failing)
    #[error("NLU extraction error: {0}")]
    NluError(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Convert anyhow errors from the config layer
impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        EngineError::ConfigError(err.to_string())
    }
}
