//! Conversation driver
//!
//! The assistant owns the conversation history and the goal store. Each turn
//! routes the utterance, applies the resulting action, and answers with a
//! reply plus the goal list. Errors never escape a turn: they become reply
//! text, and the goal list falls back to the last one read successfully.

use tracing::{debug, info, warn};

use goalstore::{Goal, GoalStatus, GoalStore, StoreError};

use crate::llm::Message;
use crate::router::{Action, IntentRouter, Routed, RouterError};

/// Reply when the model's output could not be turned into an action
pub const REPHRASE_REPLY: &str = "Sorry, I didn't quite get that. Could you rephrase it?";

/// Result of one conversational turn
#[derive(Debug, Clone)]
pub struct Turn {
    pub reply: String,
    /// Goal list after the turn (last known-good on storage errors)
    pub goals: Vec<Goal>,
    /// The action that was applied, if any
    pub action: Option<Action>,
}

/// Routes utterances and applies them to the goal store
pub struct Assistant {
    router: IntentRouter,
    store: Box<dyn GoalStore>,
    history: Vec<Message>,
    goals: Vec<Goal>,
}

impl Assistant {
    pub fn new(router: IntentRouter, store: Box<dyn GoalStore>) -> Self {
        debug!(backend = store.backend(), "Assistant::new: called");
        Self {
            router,
            store,
            history: Vec::new(),
            goals: Vec::new(),
        }
    }

    /// Last goal list read from the store
    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        debug!("clear_history: called");
        self.history.clear();
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Re-read the goal list; on failure the previous list is kept
    pub async fn refresh(&mut self) -> Result<&[Goal], StoreError> {
        debug!("refresh: called");
        self.goals = self.store.list().await?;
        Ok(&self.goals)
    }

    /// Handle one user utterance
    pub async fn respond(&mut self, utterance: &str) -> Turn {
        debug!(%utterance, "respond: called");
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "Failed to read goals before routing; using last known list");
        }

        let (reply, action) = match self.router.route(utterance, &self.history, &self.goals).await {
            Ok(Routed::Action(action)) => {
                let reply = match self.apply(&action).await {
                    Ok(reply) => reply,
                    Err(e) => store_error_reply(e),
                };
                (reply, Some(action))
            }
            Ok(Routed::Clarify(question)) => (question, None),
            Err(e) => (router_error_reply(e), None),
        };

        if action.as_ref().is_some_and(Action::is_mutation)
            && let Err(e) = self.refresh().await
        {
            warn!(error = %e, "Failed to re-read goals; showing last known list");
        }

        let utterance = utterance.trim();
        if !utterance.is_empty() {
            self.history.push(Message::user(utterance));
            self.history.push(Message::assistant(reply.clone()));
        }

        Turn {
            reply,
            goals: self.goals.clone(),
            action,
        }
    }

    /// Apply an action to the store, returning the success reply
    async fn apply(&mut self, action: &Action) -> Result<String, StoreError> {
        debug!(action = action.name(), "apply: called");
        match action {
            Action::AddGoal {
                name,
                expected_duration,
            } => {
                let goal = self.store.create(name, expected_duration.as_deref()).await?;
                Ok(format!("Goal '{}' logged successfully!", goal.name))
            }
            Action::ListGoals => {
                let goals = self.refresh().await?;
                Ok(summarize(goals))
            }
            Action::CompleteGoal { goal } => {
                let goal = self.store.update_status(goal, GoalStatus::Completed).await?;
                Ok(format!("Goal '{}' marked as completed!", goal.name))
            }
            Action::DeleteGoal { goal } => {
                let goal = self.store.delete(goal).await?;
                Ok(format!("Goal '{}' has been deleted successfully.", goal.name))
            }
            Action::UpdateGoal { goal, updates } => {
                let updated = self.store.update_fields(goal, updates.clone()).await?;
                // Name the goal as it was before a rename
                let before = self
                    .goals
                    .iter()
                    .find(|g| g.id == updated.id)
                    .map(|g| g.name.as_str())
                    .unwrap_or(&updated.name);
                Ok(format!("Goal '{}' updated: {}", before, updates.describe()))
            }
        }
    }
}

/// One-line overview of the goal list
pub fn summarize(goals: &[Goal]) -> String {
    if goals.is_empty() {
        return "You have no goals yet.".to_string();
    }
    let completed = goals.iter().filter(|g| g.is_completed()).count();
    let pending = goals.len() - completed;
    let noun = if goals.len() == 1 { "goal" } else { "goals" };
    format!(
        "You have {} {}: {} pending, {} completed.",
        goals.len(),
        noun,
        pending,
        completed
    )
}

fn store_error_reply(err: StoreError) -> String {
    match err {
        StoreError::InvalidTransition {
            name,
            from: GoalStatus::Completed,
            ..
        } => format!("Goal '{}' is already completed.", name),
        err if err.is_unavailable() => {
            warn!(error = %err, "Goal storage failed");
            format!("I couldn't reach your goal storage: {}", err)
        }
        err => {
            info!(error = %err, "Goal operation rejected");
            err.to_string()
        }
    }
}

fn router_error_reply(err: RouterError) -> String {
    match err {
        RouterError::EmptyUtterance => "Please type a message.".to_string(),
        RouterError::ParseError(reason) => {
            info!(%reason, "Could not parse model response");
            REPHRASE_REPLY.to_string()
        }
        RouterError::ProviderError(e) => {
            warn!(error = %e, "Language model request failed");
            format!("I couldn't reach the language model: {}", e)
        }
        RouterError::Prompt(e) => {
            warn!(error = %e, "Prompt template failed");
            format!("My prompt template is broken: {}", e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize() {
        assert_eq!(summarize(&[]), "You have no goals yet.");
        assert_eq!(
            summarize(&[Goal::new("Run", None)]),
            "You have 1 goal: 1 pending, 0 completed."
        );

        let mut done = Goal::new("Swim", None);
        done.complete_at(done.created_at);
        assert_eq!(
            summarize(&[Goal::new("Run", None), done]),
            "You have 2 goals: 1 pending, 1 completed."
        );
    }

    #[test]
    fn test_already_completed_reply() {
        let reply = store_error_reply(StoreError::InvalidTransition {
            name: "Exercise".to_string(),
            from: GoalStatus::Completed,
            to: GoalStatus::Completed,
        });
        assert_eq!(reply, "Goal 'Exercise' is already completed.");
    }

    #[test]
    fn test_store_error_replies_use_error_text() {
        let reply = store_error_reply(StoreError::GoalNotFound {
            reference: "Exercise".to_string(),
        });
        assert_eq!(reply, "Goal 'Exercise' not found.");

        let reply = store_error_reply(StoreError::StorageUnavailable("sheet offline".to_string()));
        assert!(reply.contains("sheet offline"));
    }

    #[test]
    fn test_router_error_replies() {
        assert_eq!(router_error_reply(RouterError::ParseError("bad".to_string())), REPHRASE_REPLY);
        assert!(router_error_reply(RouterError::EmptyUtterance).contains("message"));
    }
}
