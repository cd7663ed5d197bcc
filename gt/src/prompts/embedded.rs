//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Router system prompt
pub const ROUTER: &str = include_str!("../../prompts/router.pmt");

/// Greeting shown when a chat session starts
pub const WELCOME: &str = include_str!("../../prompts/welcome.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "router" => Some(ROUTER),
        "welcome" => Some(WELCOME),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_embedded_router() {
        let router = get_embedded("router").unwrap();
        for tool in ["add_goal", "list_goals", "complete_goal", "delete_goal", "update_goal"] {
            assert!(router.contains(tool), "router prompt should mention {}", tool);
        }
        assert!(router.contains("{{today}}"));
    }

    #[test]
    fn test_get_embedded_welcome() {
        assert!(get_embedded("welcome").unwrap().contains("Welcome"));
    }

    #[test]
    fn test_get_embedded_unknown() {
        assert!(get_embedded("unknown-template").is_none());
    }
}
