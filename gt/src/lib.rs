//! GoalTracker - track goals by chatting with an assistant
//!
//! Each user utterance is sent to a language model together with the current
//! goal list. The model answers with a tool call that the [`router`] validates
//! into an [`router::Action`], which the [`assistant`] applies to a
//! [`goalstore::GoalStore`]. Replies and the refreshed goal list are printed by
//! the REPL or the one-shot `ask` command.
//!
//! # Modules
//!
//! - [`config`] - Application configuration
//! - [`llm`] - Language model clients
//! - [`prompts`] - System prompt templates
//! - [`router`] - Utterance to action routing
//! - [`assistant`] - Applying actions and composing replies
//! - [`render`] - Goal list output formats
//! - [`repl`] - Interactive chat session

pub mod assistant;
pub mod cli;
pub mod config;
pub mod llm;
pub mod prompts;
pub mod render;
pub mod repl;
pub mod router;

pub use assistant::{Assistant, Turn};
pub use config::Config;
pub use router::{Action, IntentRouter, Routed, RouterError};
