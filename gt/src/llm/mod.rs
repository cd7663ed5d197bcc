//! LLM client module for GoalTracker
//!
//! Provides completion requests against OpenAI-compatible and Anthropic
//! endpoints behind one trait.

use std::sync::Arc;

use tracing::debug;

mod anthropic;
pub mod client;
mod error;
mod openai;
mod retry;
mod types;

pub use anthropic::AnthropicClient;
pub use client::LlmClient;
pub use error::LlmError;
pub use openai::OpenAIClient;
pub use types::{
    CompletionRequest, CompletionResponse, Message, Role, StopReason, TokenUsage, ToolCall, ToolDefinition,
};

use crate::config::{LlmConfig, Provider};

/// Message sent by the connectivity check
pub const PING_MESSAGE: &str = "Please respond with the string 'Pong'";

/// Create an LLM client based on the provider specified in config
///
/// `openai` and `ollama` share the Chat Completions client.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    let resolved = config.resolve();
    debug!(provider = %resolved.provider, model = %resolved.model, "create_client: called");
    match resolved.provider {
        Provider::Anthropic => {
            debug!("create_client: creating Anthropic client");
            Ok(Arc::new(AnthropicClient::from_config(&resolved)?))
        }
        Provider::OpenAI | Provider::Ollama => {
            debug!("create_client: creating OpenAI-compatible client");
            Ok(Arc::new(OpenAIClient::from_config(&resolved)?))
        }
    }
}

/// Ask the model to answer `Pong`; returns its reply
///
/// Fails with `InvalidResponse` when the reply does not contain `Pong`.
pub async fn ping(llm: &Arc<dyn LlmClient>) -> Result<String, LlmError> {
    debug!("ping: called");
    let request = CompletionRequest {
        system_prompt: String::new(),
        messages: vec![Message::user(PING_MESSAGE)],
        tools: vec![],
        max_tokens: 16,
    };

    let reply = llm.complete(request).await?.content.unwrap_or_default();
    if reply.contains("Pong") {
        Ok(reply)
    } else {
        debug!(%reply, "ping: unexpected reply");
        Err(LlmError::InvalidResponse(format!(
            "connection test failed with response: \"{}\"",
            reply
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockLlmClient;

    #[tokio::test]
    async fn test_ping_ok() {
        let llm: Arc<dyn LlmClient> = Arc::new(MockLlmClient::new(vec![CompletionResponse::text("Pong")]));
        assert_eq!(ping(&llm).await.unwrap(), "Pong");
    }

    #[tokio::test]
    async fn test_ping_unexpected_reply() {
        let llm: Arc<dyn LlmClient> = Arc::new(MockLlmClient::new(vec![CompletionResponse::text("Hello!")]));
        assert!(matches!(ping(&llm).await, Err(LlmError::InvalidResponse(_))));
    }

    #[test]
    fn test_create_client_ollama_without_key() {
        let config = LlmConfig {
            provider: Provider::Ollama,
            ..Default::default()
        };
        assert!(create_client(&config).is_ok());
    }

    #[test]
    fn test_create_client_anthropic_inline_key() {
        let config = LlmConfig {
            provider: Provider::Anthropic,
            api_key: Some("sk-ant-test".to_string()),
            ..Default::default()
        };
        assert!(create_client(&config).is_ok());
    }

    #[test]
    fn test_create_client_missing_key() {
        let config = LlmConfig {
            provider: Provider::OpenAI,
            api_key_env: Some("GOALTRACKER_TEST_NO_SUCH_KEY".to_string()),
            ..Default::default()
        };
        assert!(matches!(create_client(&config), Err(LlmError::Config(_))));
    }
}
