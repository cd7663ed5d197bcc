//! Goal store error types

use thiserror::Error;

use crate::goal::GoalStatus;

/// Errors that can occur during goal store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Goal '{name}' already exists!")]
    DuplicateGoal { name: String },

    #[error("Goal '{reference}' not found.")]
    GoalNotFound { reference: String },

    #[error("'{reference}' matches several goals: {}", .candidates.join(", "))]
    AmbiguousGoal { reference: String, candidates: Vec<String> },

    #[error("Goal '{name}' is already {from}; it cannot become {to}.")]
    InvalidTransition { name: String, from: GoalStatus, to: GoalStatus },

    #[error("Invalid goal: {0}")]
    InvalidGoal(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Stored goal data is corrupt: {0}")]
    Corrupt(String),

    #[error("Storage configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Check if the backend itself failed, rather than the request
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::StorageUnavailable(_) | StoreError::Io(_))
    }
}

impl From<csv::Error> for StoreError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(io) => StoreError::Io(io),
                other => StoreError::Corrupt(format!("{:?}", other)),
            }
        } else {
            StoreError::Corrupt(err.to_string())
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Corrupt(err.to_string())
        } else {
            StoreError::StorageUnavailable(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_message() {
        let err = StoreError::DuplicateGoal {
            name: "Exercise".to_string(),
        };
        assert_eq!(err.to_string(), "Goal 'Exercise' already exists!");
    }

    #[test]
    fn test_ambiguous_message_lists_candidates() {
        let err = StoreError::AmbiguousGoal {
            reference: "read".to_string(),
            candidates: vec!["Read a book".to_string(), "Read a paper".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("Read a book"));
        assert!(msg.contains("Read a paper"));
    }

    #[test]
    fn test_is_unavailable() {
        assert!(StoreError::StorageUnavailable("down".to_string()).is_unavailable());
        assert!(StoreError::Io(std::io::Error::other("disk")).is_unavailable());
        assert!(
            !StoreError::GoalNotFound {
                reference: "x".to_string()
            }
            .is_unavailable()
        );
    }
}
