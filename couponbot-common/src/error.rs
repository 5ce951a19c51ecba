// ================================================================
// File: couponbot-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level failure talking to the reward endpoint
    /// (connection error, timeout, a body that is not JSON).
    #[error("Request failed: {0}")]
    RewardRequest(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}
