//! Goal list rendering for the terminal

use colored::Colorize;
use eyre::{Context, Result};

use goalstore::{Goal, GoalStatus};

/// Output format for goal lists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// Render goals in the requested format
pub fn render_goals(goals: &[Goal], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(goal_table(goals)),
        OutputFormat::Json => serde_json::to_string_pretty(goals).context("Failed to serialize goals"),
        OutputFormat::Csv => {
            let mut buf = Vec::new();
            goalstore::csvfile::write_csv(&mut buf, goals).context("Failed to write CSV")?;
            String::from_utf8(buf).context("CSV output is not UTF-8")
        }
    }
}

const NAME_WIDTH: usize = 32;

/// Fixed-width goal table with colored status
pub fn goal_table(goals: &[Goal]) -> String {
    if goals.is_empty() {
        return format!("{}\n", "No goals yet.".dimmed());
    }

    let mut out = format!(
        "{}\n",
        format!(
            "{:<10} {:<name$} {:<10} {:<12} {:<12} {:<10} {}",
            "ID",
            "GOAL",
            "STATUS",
            "CREATED",
            "COMPLETED",
            "EXPECTED",
            "TOOK",
            name = NAME_WIDTH
        )
        .bold()
    );

    for goal in goals {
        // Pad before coloring; escape codes would break the alignment
        let status = format!("{:<10}", goal.status.to_string());
        let status = match goal.status {
            GoalStatus::Pending => status.yellow(),
            GoalStatus::Completed => status.green(),
        };
        let completed = goal
            .completed_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!(
            "{:<10} {:<name$} {} {:<12} {:<12} {:<10} {}\n",
            goal.id.hex_prefix(),
            truncate(&goal.name, NAME_WIDTH),
            status,
            goal.created_at.format("%Y-%m-%d").to_string(),
            completed,
            goal.expected_duration.as_deref().unwrap_or("-"),
            goal.duration.as_deref().unwrap_or("-"),
            name = NAME_WIDTH
        ));
        if let Some(notes) = &goal.notes {
            out.push_str(&format!("{:<10} {}\n", "", notes.dimmed()));
        }
    }
    out
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}
