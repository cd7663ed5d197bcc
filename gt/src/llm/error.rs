//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during LLM operations
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("LLM configuration error: {0}")]
    Config(String),
}

impl LlmError {
    /// Check if this error is worth retrying
    ///
    /// Rate limits are not: the provider has told us to back off.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::ApiError { status, .. } => is_retryable_status(*status),
            LlmError::Network(_) => true,
            LlmError::RateLimited { .. } | LlmError::InvalidResponse(_) | LlmError::Config(_) => false,
        }
    }
}

/// Request timeouts and server errors
fn is_retryable_status(status: u16) -> bool {
    status == 408 || (500..=599).contains(&status)
}
