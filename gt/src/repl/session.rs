//! REPL session management

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, warn};

use crate::assistant::Assistant;
use crate::llm::Role;
use crate::render::goal_table;

/// Outcome of a slash command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashResult {
    Continue,
    Quit,
}

/// Interactive chat session
pub struct ReplSession {
    assistant: Assistant,
    welcome: String,
}

impl ReplSession {
    pub fn new(assistant: Assistant, welcome: String) -> Self {
        Self { assistant, welcome }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self, initial: Option<String>) -> Result<()> {
        self.print_welcome().await;

        if let Some(message) = initial {
            println!("{} {}", ">".bright_green(), message);
            self.process_user_input(&message).await;
        }

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", ">".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input).await {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    } else {
                        self.process_user_input(input).await;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C - just show new prompt
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    async fn print_welcome(&mut self) {
        println!();
        println!("{}", self.welcome.trim_end().bright_cyan());
        println!();
        println!(
            "Storage: {}. Type {} for help, {} to quit",
            self.assistant.backend(),
            "/help".yellow(),
            "/quit".yellow()
        );
        println!();
        self.print_goals().await;
    }

    /// Route one utterance and print the outcome
    async fn process_user_input(&mut self, input: &str) {
        debug!(%input, "process_user_input: called");
        let turn = self.assistant.respond(input).await;
        println!();
        println!("{}", turn.reply.bright_blue());
        println!();
        print!("{}", goal_table(&turn.goals));
        println!();
    }

    /// Handle slash commands
    pub async fn handle_slash_command(&mut self, input: &str) -> SlashResult {
        let cmd = input.split_whitespace().next().unwrap_or("");

        match cmd {
            "/help" | "/h" => {
                self.print_help();
                SlashResult::Continue
            }
            "/quit" | "/q" | "/exit" => SlashResult::Quit,
            "/goals" | "/g" => {
                self.print_goals().await;
                SlashResult::Continue
            }
            "/clear" | "/c" => {
                self.assistant.clear_history();
                println!("{}", "Conversation cleared.".dimmed());
                SlashResult::Continue
            }
            "/history" => {
                self.print_history();
                SlashResult::Continue
            }
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
                SlashResult::Continue
            }
        }
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:14} Show this help", "/help".yellow());
        println!("  {:14} Show the goal list", "/goals".yellow());
        println!("  {:14} Clear conversation history", "/clear".yellow());
        println!("  {:14} Show conversation history", "/history".yellow());
        println!("  {:14} Exit", "/quit".yellow());
        println!();
        println!("Anything else is sent to the assistant, e.g. {}", "\"I want to run a 5k\"".dimmed());
        println!();
    }

    async fn print_goals(&mut self) {
        if let Err(e) = self.assistant.refresh().await {
            warn!(error = %e, "Failed to list goals");
            println!("{} {}", "Could not read goals:".red(), e);
        }
        print!("{}", goal_table(self.assistant.goals()));
        println!();
    }

    fn print_history(&self) {
        let history = self.assistant.history();
        if history.is_empty() {
            println!("{}", "No conversation history.".dimmed());
            return;
        }

        println!();
        println!("{}", "Conversation History:".bright_cyan());
        for (i, msg) in history.iter().enumerate() {
            let role = match msg.role {
                Role::User => "User".bright_green(),
                Role::Assistant => "Assistant".bright_blue(),
            };
            let preview: String = msg.content.chars().take(60).collect();
            let ellipsis = if msg.content.chars().count() > 60 { "..." } else { "" };
            println!("  {}. [{}] {}{}", i + 1, role, preview, ellipsis);
        }
        println!();
    }
}
