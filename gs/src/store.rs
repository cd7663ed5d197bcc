//! GoalStore trait definition

use async_trait::async_trait;

use crate::error::StoreError;
use crate::goal::{Goal, GoalStatus, GoalUpdate};

/// Uniform interface over the goal persistence backends
///
/// Every mutating call persists before it returns; a failed call leaves the
/// stored goals as they were.
#[async_trait]
pub trait GoalStore: Send + Sync {
    /// Short backend name for logs and the UI
    fn backend(&self) -> &'static str;

    /// Add a new pending goal
    async fn create(&self, name: &str, expected_duration: Option<&str>) -> Result<Goal, StoreError>;

    /// All goals in insertion order
    async fn list(&self) -> Result<Vec<Goal>, StoreError>;

    /// Move the referenced goal to `status` (only Pending → Completed is legal)
    async fn update_status(&self, reference: &str, status: GoalStatus) -> Result<Goal, StoreError>;

    /// Edit name, expected duration or notes of the referenced goal
    async fn update_fields(&self, reference: &str, update: GoalUpdate) -> Result<Goal, StoreError>;

    /// Remove the referenced goal, returning it
    async fn delete(&self, reference: &str) -> Result<Goal, StoreError>;
}
