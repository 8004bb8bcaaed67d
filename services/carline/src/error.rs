//! Error types for the carline service

/// Message shown to staff for every failure, whatever the cause
pub const USER_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Errors that can occur in the carline service
#[derive(Debug, thiserror::Error)]
pub enum CarlineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown timezone: {0}")]
    Timezone(String),

    #[error("Dashboard error: {0}")]
    Dashboard(String),
}

impl CarlineError {
    /// The string surfaced to users. Details stay in the logs.
    pub fn user_message(&self) -> &'static str {
        USER_ERROR_MESSAGE
    }
}

/// Result type alias for carline operations
pub type Result<T> = std::result::Result<T, CarlineError>;
