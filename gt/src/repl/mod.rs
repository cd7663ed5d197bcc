//! Interactive chat REPL
//!
//! Reads utterances with line editing, routes each through the assistant and
//! prints the reply followed by the goal table.

mod session;

pub use session::{ReplSession, SlashResult};

use eyre::Result;

use crate::assistant::Assistant;
use crate::prompts::PromptLoader;

/// Run the interactive REPL
///
/// This is the entry point for `gt chat`.
pub async fn run_interactive(assistant: Assistant, prompts: &PromptLoader, initial: Option<String>) -> Result<()> {
    let welcome = prompts.welcome()?;
    let mut session = ReplSession::new(assistant, welcome);
    session.run(initial).await
}
