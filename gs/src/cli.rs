//! CLI command definitions for the `gs` binary

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// GoalStore - direct goal CRUD over the configured backend
#[derive(Parser)]
#[command(
    name = "gs",
    about = "Manage goals directly in the configured CSV file or Google Sheet",
    version,
    after_help = "Config is read from ./goalstore.yml or ~/.config/goalstore/goalstore.yml"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// List all goals
    List,

    /// Log a new goal
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

    /// Edit a goal's name, expected duration or notes
    Update {
        /// Goal ID or name
        #[arg(value_name = "GOAL")]
        reference: String,

        /// New name
        #[arg(short, long)]
        name: Option<String>,

        /// New expected duration
        #[arg(short, long)]
        expected: Option<String>,

        /// New notes
        #[arg(long)]
        notes: Option<String>,
    },
}
