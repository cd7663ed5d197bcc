//! Tool definitions offered to the model, one per action

use serde_json::json;

use crate::llm::ToolDefinition;

pub const ADD_GOAL: &str = "add_goal";
pub const LIST_GOALS: &str = "list_goals";
pub const COMPLETE_GOAL: &str = "complete_goal";
pub const DELETE_GOAL: &str = "delete_goal";
pub const UPDATE_GOAL: &str = "update_goal";

const GOAL_REFERENCE: &str =
    "The goal's id from the current goal list, or its name as the user refers to it.";

/// All goal tools, in the order they are offered
pub fn goal_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            ADD_GOAL,
            "Log a new goal.",
            json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Short, distinctive name for the goal."
                    },
                    "expected_duration": {
                        "type": "string",
                        "description": "How long the user expects the goal to take, e.g. '2 weeks'. Omit if not mentioned."
                    }
                },
                "required": ["name"]
            }),
        ),
        ToolDefinition::new(
            LIST_GOALS,
            "Show all logged goals.",
            json!({"type": "object", "properties": {}}),
        ),
        ToolDefinition::new(
            COMPLETE_GOAL,
            "Mark a goal as completed.",
            json!({
                "type": "object",
                "properties": {"goal": {"type": "string", "description": GOAL_REFERENCE}},
                "required": ["goal"]
            }),
        ),
        ToolDefinition::new(
            DELETE_GOAL,
            "Delete a goal from the tracker.",
            json!({
                "type": "object",
                "properties": {"goal": {"type": "string", "description": GOAL_REFERENCE}},
                "required": ["goal"]
            }),
        ),
        ToolDefinition::new(
            UPDATE_GOAL,
            "Rename a goal or change its expected duration or notes. Pass only the fields that change.",
            json!({
                "type": "object",
                "properties": {
                    "goal": {"type": "string", "description": GOAL_REFERENCE},
                    "name": {"type": "string", "description": "New name for the goal."},
                    "expected_duration": {"type": "string", "description": "New expected duration."},
                    "notes": {"type": "string", "description": "New notes for the goal."}
                },
                "required": ["goal"]
            }),
        ),
    ]
}
