//! Intent router
//!
//! Turns one user utterance into exactly one [`Action`], or a clarifying
//! question when the model is unsure. The router never touches storage: it
//! sees the goal list only to describe it to the model.

mod action;
mod error;
pub mod tools;

pub use action::Action;
pub use error::RouterError;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use goalstore::Goal;

use crate::config::Config;
use crate::llm::{CompletionRequest, CompletionResponse, LlmClient, Message, Role, ToolDefinition};
use crate::prompts::{PromptLoader, RouterContext};

/// Outcome of routing an utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// A validated action to apply to the store
    Action(Action),
    /// The model needs more information; the text is its question
    Clarify(String),
}

/// Maps utterances to actions through a language model
pub struct IntentRouter {
    llm: Arc<dyn LlmClient>,
    prompts: PromptLoader,
    tools: Vec<ToolDefinition>,
    max_tokens: u32,
    history_turns: usize,
}

impl IntentRouter {
    /// Create a router using the configured prompt override and limits
    pub fn new(llm: Arc<dyn LlmClient>, config: &Config) -> Self {
        debug!("IntentRouter::new: called");
        Self::with_prompts(llm, PromptLoader::new(config.prompt.system_template_path()), config)
    }

    pub fn with_prompts(llm: Arc<dyn LlmClient>, prompts: PromptLoader, config: &Config) -> Self {
        Self {
            llm,
            prompts,
            tools: tools::goal_tools(),
            max_tokens: config.llm.max_tokens,
            history_turns: config.prompt.history_turns,
        }
    }

    /// Route one utterance given the prior conversation and the current goals
    pub async fn route(&self, utterance: &str, history: &[Message], goals: &[Goal]) -> Result<Routed, RouterError> {
        debug!(%utterance, history = history.len(), goals = goals.len(), "route: called");
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return Err(RouterError::EmptyUtterance);
        }

        let system_prompt = self
            .prompts
            .render_router(&RouterContext::today(goals))
            .map_err(|e| RouterError::Prompt(e.to_string()))?;

        let mut messages = recent_history(history, self.history_turns);
        messages.push(Message::user(utterance));

        let request = CompletionRequest {
            system_prompt,
            messages,
            tools: self.tools.clone(),
            max_tokens: self.max_tokens,
        };

        let response = self.llm.complete(request).await?;
        let routed = parse_response(response)?;
        match &routed {
            Routed::Action(action) => info!(action = action.name(), "Routed utterance"),
            Routed::Clarify(_) => info!("Model asked for clarification"),
        }
        Ok(routed)
    }
}

/// Interpret a model response as an action or a clarifying question
pub fn parse_response(response: CompletionResponse) -> Result<Routed, RouterError> {
    debug!(tool_calls = response.tool_calls.len(), has_text = response.content.is_some(), "parse_response: called");
    if let Some(call) = response.tool_calls.first() {
        if response.tool_calls.len() > 1 {
            let ignored: Vec<&str> = response.tool_calls[1..].iter().map(|c| c.name.as_str()).collect();
            warn!(used = %call.name, ?ignored, "Model returned several tool calls; using the first");
        }
        return Action::from_tool_call(&call.name, &call.input).map(Routed::Action);
    }

    let text = response.content.as_deref().map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Err(RouterError::parse("the model returned neither a tool call nor text"));
    }

    if let Ok(value) = serde_json::from_str::<Value>(strip_code_fence(text))
        && value.is_object()
    {
        debug!("parse_response: text is a JSON object");
        return Action::from_json(&value).map(Routed::Action);
    }

    Ok(Routed::Clarify(text.to_string()))
}

/// Remove a surrounding Markdown code fence, if any
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. `json`) on the opening line
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// The last `turns` exchanges, starting on a user message
fn recent_history(history: &[Message], turns: usize) -> Vec<Message> {
    let start = history.len().saturating_sub(turns.saturating_mul(2));
    history[start..]
        .iter()
        .skip_while(|m| m.role != Role::User)
        .cloned()
        .collect()
}
