//! Integration tests for GoalTracker
//!
//! These drive the assistant end to end with a scripted language model and a
//! real CSV store in a scratch directory, and run the `gt` binary for the
//! commands that need no model.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use assert_cmd::Command;
use async_trait::async_trait;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

use goalstore::{CsvStore, GoalStatus, GoalStore, Matcher};
use goaltracker::assistant::REPHRASE_REPLY;
use goaltracker::config::Config;
use goaltracker::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, Role};
use goaltracker::{Action, Assistant, IntentRouter};

/// Language model that replays a fixed script and records what it was sent
struct ScriptedLlm {
    script: Mutex<VecDeque<CompletionResponse>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    fn new(script: Vec<CompletionResponse>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LlmError::ApiError {
                status: 503,
                message: "model offline".to_string(),
            })
    }
}

fn open_store(dir: &Path) -> Box<dyn GoalStore> {
    Box::new(CsvStore::open(dir.join("goals.csv"), Matcher::default()).expect("Failed to open store"))
}

fn assistant(temp_dir: &TempDir, llm: Arc<ScriptedLlm>) -> Assistant {
    let router = IntentRouter::new(llm, &Config::default());
    Assistant::new(router, open_store(temp_dir.path()))
}

fn add(name: &str) -> CompletionResponse {
    CompletionResponse::tool_call("add_goal", json!({ "name": name }))
}

fn complete(goal: &str) -> CompletionResponse {
    CompletionResponse::tool_call("complete_goal", json!({ "goal": goal }))
}

fn delete(goal: &str) -> CompletionResponse {
    CompletionResponse::tool_call("delete_goal", json!({ "goal": goal }))
}

// =============================================================================
// Assistant Replies
// =============================================================================

#[tokio::test]
async fn test_add_goal_reply_and_list() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let llm = ScriptedLlm::new(vec![CompletionResponse::tool_call(
        "add_goal",
        json!({"name": "Read a book", "expected_duration": "2 weeks"}),
    )]);
    let mut assistant = assistant(&temp_dir, llm);

    let turn = assistant.respond("I want to read a book in the next two weeks").await;

    assert_eq!(turn.reply, "Goal 'Read a book' logged successfully!");
    assert_eq!(turn.goals.len(), 1);
    assert_eq!(turn.goals[0].name, "Read a book");
    assert_eq!(turn.goals[0].expected_duration.as_deref(), Some("2 weeks"));
    assert_eq!(turn.goals[0].status, GoalStatus::Pending);
    assert!(matches!(turn.action, Some(Action::AddGoal { .. })));
}

#[tokio::test]
async fn test_duplicate_goal_reply() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let llm = ScriptedLlm::new(vec![add("Exercise"), add("exercise")]);
    let mut assistant = assistant(&temp_dir, llm);

    assistant.respond("add exercise").await;
    let turn = assistant.respond("add exercise again").await;

    assert_eq!(turn.reply, "Goal 'Exercise' already exists!");
    assert_eq!(turn.goals.len(), 1);
}

#[tokio::test]
async fn test_complete_then_complete_again() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let llm = ScriptedLlm::new(vec![add("Exercise"), complete("exercise"), complete("Exercise")]);
    let mut assistant = assistant(&temp_dir, llm);

    assistant.respond("add exercise").await;
    let turn = assistant.respond("I exercised today").await;
    assert_eq!(turn.reply, "Goal 'Exercise' marked as completed!");
    assert_eq!(turn.goals[0].status, GoalStatus::Completed);
    assert!(turn.goals[0].completed_at.unwrap() >= turn.goals[0].created_at);

    let turn = assistant.respond("I exercised today").await;
    assert_eq!(turn.reply, "Goal 'Exercise' is already completed.");
}

#[tokio::test]
async fn test_missing_goal_replies() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let llm = ScriptedLlm::new(vec![complete("Exercise"), delete("Exercise")]);
    let mut assistant = assistant(&temp_dir, llm);

    assert_eq!(assistant.respond("done exercising").await.reply, "Goal 'Exercise' not found.");
    assert_eq!(assistant.respond("delete exercise").await.reply, "Goal 'Exercise' not found.");
}

#[tokio::test]
async fn test_update_goal_reply() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let llm = ScriptedLlm::new(vec![
        add("Run"),
        CompletionResponse::tool_call("update_goal", json!({"goal": "run", "name": "Run a 5k", "notes": "mornings"})),
    ]);
    let mut assistant = assistant(&temp_dir, llm);

    assistant.respond("add run").await;
    let turn = assistant.respond("rename run to run a 5k, I'll do it in the mornings").await;

    assert_eq!(turn.reply, "Goal 'Run' updated: name → Run a 5k, notes → mornings");
    assert_eq!(turn.goals[0].name, "Run a 5k");
    assert_eq!(turn.goals[0].notes.as_deref(), Some("mornings"));
}

#[tokio::test]
async fn test_list_goals_reply() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let llm = ScriptedLlm::new(vec![add("Swim"), CompletionResponse::tool_call("list_goals", json!({}))]);
    let mut assistant = assistant(&temp_dir, llm);

    assistant.respond("add swim").await;
    let turn = assistant.respond("what are my goals?").await;

    assert_eq!(turn.reply, "You have 1 goal: 1 pending, 0 completed.");
    assert_eq!(turn.action, Some(Action::ListGoals));
}

#[tokio::test]
async fn test_exercise_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let llm = ScriptedLlm::new(vec![add("Exercise"), complete("Exercise"), delete("Exercise")]);
    let mut assistant = assistant(&temp_dir, llm);

    assistant.respond("add exercise").await;
    assistant.respond("finished exercising").await;
    let turn = assistant.respond("remove exercise").await;

    assert_eq!(turn.reply, "Goal 'Exercise' has been deleted successfully.");
    assert!(turn.goals.is_empty());
    assert!(open_store(temp_dir.path()).list().await.unwrap().is_empty());
}

// =============================================================================
// Clarification and Failures
// =============================================================================

#[tokio::test]
async fn test_clarification_passes_through() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let llm = ScriptedLlm::new(vec![
        CompletionResponse::text("Which book would you like to read?"),
        add("Read Dune"),
    ]);
    let mut assistant = assistant(&temp_dir, llm.clone());

    let turn = assistant.respond("I want to read a book").await;
    assert_eq!(turn.reply, "Which book would you like to read?");
    assert!(turn.action.is_none());
    assert!(turn.goals.is_empty());

    let turn = assistant.respond("Dune").await;
    assert_eq!(turn.reply, "Goal 'Read Dune' logged successfully!");

    // The follow-up carries the earlier exchange
    let second = &llm.requests()[1];
    let roles: Vec<Role> = second.messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
    assert_eq!(second.messages[1].content, "Which book would you like to read?");
}

#[tokio::test]
async fn test_malformed_response_asks_to_rephrase() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let llm = ScriptedLlm::new(vec![CompletionResponse::tool_call("add_goal", json!({"name": ""}))]);
    let mut assistant = assistant(&temp_dir, llm);

    let turn = assistant.respond("add").await;

    assert_eq!(turn.reply, REPHRASE_REPLY);
    assert!(turn.action.is_none());
    assert!(turn.goals.is_empty());
}

#[tokio::test]
async fn test_provider_failure_keeps_goal_list() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let llm = ScriptedLlm::new(vec![add("Exercise")]);
    let mut assistant = assistant(&temp_dir, llm);

    assistant.respond("add exercise").await;
    let turn = assistant.respond("and swimming").await;

    assert!(turn.reply.contains("model offline"), "reply was: {}", turn.reply);
    assert_eq!(turn.goals.len(), 1);
    assert_eq!(assistant.history().len(), 4);
}

#[tokio::test]
async fn test_empty_utterance_skips_model() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let llm = ScriptedLlm::new(vec![]);
    let mut assistant = assistant(&temp_dir, llm.clone());

    let turn = assistant.respond("   ").await;

    assert!(turn.action.is_none());
    assert!(llm.requests().is_empty());
    assert!(assistant.history().is_empty());
}

// =============================================================================
// CLI
// =============================================================================

fn write_config(temp_dir: &TempDir) -> std::path::PathBuf {
    let config_path = temp_dir.path().join("goaltracker.yml");
    let csv_path = temp_dir.path().join("goals.csv");
    std::fs::write(
        &config_path,
        format!(
            "llm:\n  provider: ollama\n  api-key: secret-test-key\nstorage:\n  csv-file: {}\n",
            csv_path.display()
        ),
    )
    .unwrap();
    config_path
}

fn gt(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("gt").unwrap();
    cmd.env("XDG_DATA_HOME", temp_dir.path())
        .current_dir(temp_dir.path())
        .arg("-c")
        .arg(write_config(temp_dir));
    cmd
}

#[test]
fn test_cli_add_complete_list() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    gt(&temp_dir)
        .args(["add", "Read a book", "--expected", "2 weeks"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Goal 'Read a book' logged successfully!"));

    gt(&temp_dir)
        .args(["complete", "read a book"])
        .assert()
        .success()
        .stdout(predicate::str::contains("marked as completed!"));

    gt(&temp_dir)
        .args(["list", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Read a book,Completed"));
}

#[test]
fn test_cli_delete_missing_goal_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    gt(&temp_dir)
        .args(["delete", "Exercise"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Goal 'Exercise' not found."));
}

#[test]
fn test_cli_config_hides_api_key() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    gt(&temp_dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("provider: ollama").and(predicate::str::contains("secret-test-key").not()));
}
