//! Router error types

use thiserror::Error;

use crate::llm::LlmError;

/// Errors that can occur while routing an utterance
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("Nothing to route: the message is empty")]
    EmptyUtterance,

    #[error("Could not understand the model's response: {0}")]
    ParseError(String),

    #[error("Language model request failed: {0}")]
    ProviderError(#[from] LlmError),

    #[error("Prompt error: {0}")]
    Prompt(String),
}

impl RouterError {
    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        RouterError::ParseError(msg.into())
    }
}
