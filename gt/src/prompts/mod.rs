//! Prompt templates
//!
//! The router system prompt is a Handlebars template. It is loaded from the
//! configured `prompt.system-template` file when one is set, otherwise from
//! the copy embedded in the binary.

pub mod embedded;
mod loader;

pub use loader::{GoalSummary, PromptLoader, RouterContext};
