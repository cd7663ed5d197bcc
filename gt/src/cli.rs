//! CLI command definitions for the `gt` binary

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::render::OutputFormat;

/// GoalTracker - a conversational goal tracker
#[derive(Parser)]
#[command(
    name = "gt",
    about = "Track goals by chatting with an assistant, backed by a CSV file or Google Sheet",
    version,
    after_help = "Logs are written to ~/.local/share/goaltracker/logs/goaltracker.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute (defaults to `chat`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start an interactive chat session
    Chat {
        /// First message to send
        message: Option<String>,
    },

    /// Send a single message and print the reply
    Ask {
        /// Message for the assistant
        message: String,

        /// Output format for the goal list
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// List all goals
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Log a new goal without going through the assistant
    Add {
        /// Goal name
        name: String,

        /// Expected duration, free text (e.g. "2 weeks")
        #[arg(short, long)]
        expected: Option<String>,
    },

    /// Mark a goal as completed
    Complete {
        /// Goal ID or name
        #[arg(value_name = "GOAL")]
        reference: String,
    },

    /// Delete a goal
    Delete {
        /// Goal ID or name
        #[arg(value_name = "GOAL")]
        reference: String,
    },

    /// Check that the language model is reachable
    Check,

    /// Print the effective configuration
    Config,
}
