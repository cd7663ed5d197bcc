//! Actions the router can emit
//!
//! An action is only built from model output that passes validation: the tool
//! name must be known, required fields must be non-blank strings, and optional
//! fields must be strings when present.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use goalstore::GoalUpdate;

use super::error::RouterError;
use super::tools;

/// A single operation on the goal store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    AddGoal {
        name: String,
        expected_duration: Option<String>,
    },
    ListGoals,
    CompleteGoal {
        goal: String,
    },
    DeleteGoal {
        goal: String,
    },
    UpdateGoal {
        goal: String,
        updates: GoalUpdate,
    },
}

#[derive(Deserialize)]
struct AddGoalArgs {
    name: String,
    #[serde(default)]
    expected_duration: Option<String>,
}

#[derive(Deserialize)]
struct GoalArgs {
    goal: String,
}

#[derive(Deserialize)]
struct UpdateGoalArgs {
    goal: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    expected_duration: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

impl Action {
    /// Validate a tool call into an action
    pub fn from_tool_call(name: &str, input: &Value) -> Result<Self, RouterError> {
        debug!(%name, %input, "Action::from_tool_call: called");
        match name {
            tools::ADD_GOAL => {
                let args: AddGoalArgs = parse_args(name, input)?;
                Ok(Action::AddGoal {
                    name: required(name, "name", args.name)?,
                    expected_duration: optional(args.expected_duration),
                })
            }
            tools::LIST_GOALS => {
                if !(input.is_object() || input.is_null()) {
                    return Err(RouterError::parse(format!("arguments for {} must be an object", name)));
                }
                Ok(Action::ListGoals)
            }
            tools::COMPLETE_GOAL => {
                let args: GoalArgs = parse_args(name, input)?;
                Ok(Action::CompleteGoal {
                    goal: required(name, "goal", args.goal)?,
                })
            }
            tools::DELETE_GOAL => {
                let args: GoalArgs = parse_args(name, input)?;
                Ok(Action::DeleteGoal {
                    goal: required(name, "goal", args.goal)?,
                })
            }
            tools::UPDATE_GOAL => {
                let args: UpdateGoalArgs = parse_args(name, input)?;
                Ok(Action::UpdateGoal {
                    goal: required(name, "goal", args.goal)?,
                    updates: GoalUpdate {
                        name: args.name,
                        expected_duration: args.expected_duration,
                        notes: args.notes,
                    }
                    .normalized(),
                })
            }
            other => Err(RouterError::parse(format!("unknown action '{}'", other))),
        }
    }

    /// Validate a JSON object tagged with `action`, e.g. `{"action": "list_goals"}`
    pub fn from_json(value: &Value) -> Result<Self, RouterError> {
        debug!(%value, "Action::from_json: called");
        let Some(object) = value.as_object() else {
            return Err(RouterError::parse("expected a JSON object"));
        };
        let Some(action) = object.get("action").and_then(Value::as_str) else {
            return Err(RouterError::parse("JSON object has no 'action' string"));
        };

        let mut args = object.clone();
        args.remove("action");
        Self::from_tool_call(action, &Value::Object(args))
    }

    /// Tool name for this action
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddGoal { .. } => tools::ADD_GOAL,
            Action::ListGoals => tools::LIST_GOALS,
            Action::CompleteGoal { .. } => tools::COMPLETE_GOAL,
            Action::DeleteGoal { .. } => tools::DELETE_GOAL,
            Action::UpdateGoal { .. } => tools::UPDATE_GOAL,
        }
    }

    /// Whether applying this action changes stored goals
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Action::ListGoals)
    }
}

fn parse_args<T: DeserializeOwned>(tool: &str, input: &Value) -> Result<T, RouterError> {
    if !input.is_object() {
        return Err(RouterError::parse(format!("arguments for {} must be a JSON object, got {}", tool, input)));
    }
    serde_json::from_value(input.clone())
        .map_err(|e| RouterError::parse(format!("invalid arguments for {}: {}", tool, e)))
}

fn required(tool: &str, field: &str, value: String) -> Result<String, RouterError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(RouterError::parse(format!("{} requires a non-empty '{}'", tool, field)));
    }
    Ok(value.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
