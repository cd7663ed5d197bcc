//! Prompt loader implementation

use std::path::PathBuf;

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use goalstore::Goal;

use super::embedded;

/// One goal as shown to the model
#[derive(Debug, Clone, Serialize)]
pub struct GoalSummary {
    pub id: String,
    pub name: String,
    pub status: String,
    pub expected_duration: Option<String>,
}

impl From<&Goal> for GoalSummary {
    fn from(goal: &Goal) -> Self {
        Self {
            id: goal.id.to_string(),
            name: goal.name.clone(),
            status: goal.status.to_string(),
            expected_duration: goal.expected_duration.clone(),
        }
    }
}

/// Variables available to the router template
#[derive(Debug, Clone, Serialize)]
pub struct RouterContext {
    /// Current local date, `YYYY-MM-DD`
    pub today: String,
    pub goals: Vec<GoalSummary>,
}

impl RouterContext {
    pub fn new(today: impl Into<String>, goals: &[Goal]) -> Self {
        Self {
            today: today.into(),
            goals: goals.iter().map(GoalSummary::from).collect(),
        }
    }

    /// Context stamped with today's local date
    pub fn today(goals: &[Goal]) -> Self {
        Self::new(chrono::Local::now().format("%Y-%m-%d").to_string(), goals)
    }
}

/// Loads prompt templates and renders them with Handlebars
pub struct PromptLoader {
    hbs: Handlebars<'static>,
    /// File replacing the embedded router template
    router_override: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader, optionally overriding the router template with a file
    pub fn new(router_override: Option<PathBuf>) -> Self {
        debug!(?router_override, "PromptLoader::new: called");
        let mut hbs = Handlebars::new();
        // Prompts are plain text, not HTML
        hbs.register_escape_fn(handlebars::no_escape);
        Self { hbs, router_override }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        Self::new(None)
    }

    /// Load a template by name, preferring the configured override for `router`
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        if name == "router"
            && let Some(path) = &self.router_override
        {
            debug!(?path, "PromptLoader::load_template: using override");
            return std::fs::read_to_string(path)
                .map_err(|e| eyre!("Failed to read prompt template {}: {}", path.display(), e));
        }

        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| eyre!("Prompt template not found: {}", name))
    }

    /// Render the router system prompt
    pub fn render_router(&self, context: &RouterContext) -> Result<String> {
        debug!(goals = context.goals.len(), "PromptLoader::render_router: called");
        let template = self.load_template("router")?;
        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template router: {}", e))
    }

    /// Greeting for a new chat session
    pub fn welcome(&self) -> Result<String> {
        self.load_template("welcome")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_router_lists_goals() {
        let mut done = Goal::new("Learn Rust", None);
        done.complete_at(done.created_at);
        let goals = vec![Goal::new("Read a book", Some("2 weeks".to_string())), done];

        let prompt = PromptLoader::embedded_only()
            .render_router(&RouterContext::new("2025-03-01", &goals))
            .unwrap();

        assert!(prompt.contains("Today is 2025-03-01."));
        assert!(prompt.contains(&format!("[{}] Read a book (Pending, expected: 2 weeks)", goals[0].id)));
        assert!(prompt.contains("Learn Rust (Completed)"));
        assert!(!prompt.contains("no goals yet"));
    }

    #[test]
    fn test_render_router_empty_list() {
        let prompt = PromptLoader::embedded_only()
            .render_router(&RouterContext::new("2025-03-01", &[]))
            .unwrap();
        assert!(prompt.contains("The user has no goals yet."));
    }

    #[test]
    fn test_render_does_not_html_escape() {
        let goals = vec![Goal::new("Don't quit <ever>", None)];
        let prompt = PromptLoader::embedded_only()
            .render_router(&RouterContext::new("2025-03-01", &goals))
            .unwrap();
        assert!(prompt.contains("Don't quit <ever>"));
    }

    #[test]
    fn test_override_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("router.pmt");
        std::fs::write(&path, "Goals: {{#each goals}}{{name}};{{/each}}").unwrap();

        let goals = vec![Goal::new("Run", None), Goal::new("Swim", None)];
        let prompt = PromptLoader::new(Some(path))
            .render_router(&RouterContext::new("2025-03-01", &goals))
            .unwrap();
        assert_eq!(prompt, "Goals: Run;Swim;");
    }

    #[test]
    fn test_missing_override_is_an_error() {
        let loader = PromptLoader::new(Some(PathBuf::from("/nonexistent/router.pmt")));
        assert!(loader.render_router(&RouterContext::new("2025-03-01", &[])).is_err());
    }

    #[test]
    fn test_welcome() {
        assert!(PromptLoader::embedded_only().welcome().unwrap().contains("Welcome"));
    }
}
