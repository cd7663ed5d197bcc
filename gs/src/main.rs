//! GoalStore CLI
//!
//! Direct create/list/complete/delete/update over the configured backend.

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use goalstore::cli::{Cli, Command};
use goalstore::config::Config;
use goalstore::{Goal, GoalStatus, GoalUpdate, open_store};

fn setup_logging() {
    // Command output owns stdout; logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(storage_type = %config.storage.storage_type, "gs loaded config");

    let store = open_store(&config.storage).await.context("Failed to open goal store")?;

    match cli.command {
        Command::List => {
            let goals = store.list().await?;
            print_goals(&goals);
        }
        Command::Add { name, expected } => {
            let goal = store.create(&name, expected.as_deref()).await?;
            println!("{} Goal '{}' logged ({})", "✓".green(), goal.name, goal.id.as_str().dimmed());
        }
        Command::Complete { reference } => {
            let goal = store.update_status(&reference, GoalStatus::Completed).await?;
            let took = goal.duration.as_deref().unwrap_or("0s");
            println!("{} Goal '{}' marked as completed (took {})", "✓".green(), goal.name, took);
        }
        Command::Delete { reference } => {
            let goal = store.delete(&reference).await?;
            println!("{} Goal '{}' deleted", "✓".green(), goal.name);
        }
        Command::Update {
            reference,
            name,
            expected,
            notes,
        } => {
            let update = GoalUpdate {
                name,
                expected_duration: expected,
                notes,
            };
            let changes = update.clone().normalized().describe();
            let goal = store.update_fields(&reference, update).await?;
            println!("{} Goal '{}' updated: {}", "✓".green(), goal.name, changes);
        }
    }

    Ok(())
}

fn print_goals(goals: &[Goal]) {
    if goals.is_empty() {
        println!("{}", "No goals yet.".dimmed());
        return;
    }

    for goal in goals {
        let status = match goal.status {
            GoalStatus::Pending => goal.status.to_string().yellow(),
            GoalStatus::Completed => goal.status.to_string().green(),
        };
        let mut line = format!("{:<10} {:<30} {}", goal.id.hex_prefix(), goal.name, status);
        if let Some(expected) = &goal.expected_duration {
            line.push_str(&format!("  expected: {}", expected));
        }
        if let Some(duration) = &goal.duration {
            line.push_str(&format!("  took: {}", duration));
        }
        println!("{}", line);
    }
}
