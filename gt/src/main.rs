//! GoalTracker - conversational goal tracker
//!
//! CLI entry point: the chat REPL, one-shot questions and direct goal commands.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use goalstore::{GoalStatus, GoalStore, open_store};
use goaltracker::assistant::Assistant;
use goaltracker::cli::{Cli, Command};
use goaltracker::config::Config;
use goaltracker::llm::{create_client, ping};
use goaltracker::prompts::PromptLoader;
use goaltracker::render::{OutputFormat, render_goals};
use goaltracker::repl;
use goaltracker::router::IntentRouter;

fn setup_logging(verbose: bool) -> Result<()> {
    // The terminal belongs to the REPL, so logs go to a file
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("goaltracker")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("goaltracker.log"))
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

async fn open_goal_store(config: &Config) -> Result<Box<dyn GoalStore>> {
    config.storage.validate().context("Invalid storage configuration")?;
    open_store(&config.storage).await.context("Failed to open goal store")
}

async fn build_assistant(config: &Config) -> Result<Assistant> {
    config.validate()?;
    let llm = create_client(&config.llm).context("Failed to create LLM client")?;
    let store = open_goal_store(config).await?;
    let router = IntentRouter::new(llm, config);
    Ok(Assistant::new(router, store))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Keys may live in .env; a missing file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(
        provider = %config.llm.provider,
        storage = %config.storage.storage_type,
        "GoalTracker loaded config"
    );

    let command = cli.command.unwrap_or(Command::Chat { message: None });
    debug!(?command, "main: dispatching command");

    match command {
        Command::Chat { message } => {
            let assistant = build_assistant(&config).await?;
            let prompts = PromptLoader::new(config.prompt.system_template_path());
            repl::run_interactive(assistant, &prompts, message).await?;
        }
        Command::Ask { message, format } => {
            let mut assistant = build_assistant(&config).await?;
            let turn = assistant.respond(&message).await;
            if format == OutputFormat::Json {
                let out = serde_json::json!({
                    "reply": turn.reply,
                    "action": turn.action.as_ref().map(|a| a.name()),
                    "goals": turn.goals,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("{}", turn.reply);
                println!();
                print!("{}", render_goals(&turn.goals, format)?);
            }
        }
        Command::List { format } => {
            let store = open_goal_store(&config).await?;
            let goals = store.list().await?;
            print!("{}", render_goals(&goals, format)?);
        }
        Command::Add { name, expected } => {
            let store = open_goal_store(&config).await?;
            let goal = store.create(&name, expected.as_deref()).await?;
            println!("{} Goal '{}' logged successfully!", "✓".green(), goal.name);
        }
        Command::Complete { reference } => {
            let store = open_goal_store(&config).await?;
            let goal = store.update_status(&reference, GoalStatus::Completed).await?;
            println!("{} Goal '{}' marked as completed!", "✓".green(), goal.name);
        }
        Command::Delete { reference } => {
            let store = open_goal_store(&config).await?;
            let goal = store.delete(&reference).await?;
            println!("{} Goal '{}' has been deleted successfully.", "✓".green(), goal.name);
        }
        Command::Check => {
            config.validate()?;
            let resolved = config.llm.resolve();
            let llm = create_client(&config.llm).context("Failed to create LLM client")?;
            let reply = ping(&llm).await.context("LLM connection test failed")?;
            println!(
                "{} {} ({}) replied: {}",
                "✓".green(),
                resolved.provider,
                resolved.model,
                reply.trim()
            );
        }
        Command::Config => {
            print!("{}", serde_yaml::to_string(&config).context("Failed to serialize config")?);
        }
    }

    Ok(())
}
