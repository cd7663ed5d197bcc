//! Backend-independent goal edits
//!
//! Each function validates a request against the current goal list and
//! returns the record to persist, without touching storage. Backends load,
//! call one of these, then write.

use tracing::debug;

use crate::error::StoreError;
use crate::goal::{Goal, GoalId, GoalStatus, GoalUpdate, now};
use crate::matcher::Matcher;

/// Build a new goal, rejecting blank names and active duplicates
pub fn create(
    matcher: &Matcher,
    goals: &[Goal],
    name: &str,
    expected_duration: Option<&str>,
) -> Result<Goal, StoreError> {
    debug!(%name, ?expected_duration, "create: called");
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::InvalidGoal("goal name cannot be empty".to_string()));
    }

    if let Some(existing) = matcher.find_duplicate(goals, name, None) {
        debug!(existing = %existing.id, "create: duplicate");
        return Err(StoreError::DuplicateGoal {
            name: existing.name.clone(),
        });
    }

    let mut goal = Goal::new(name, expected_duration.map(|d| d.trim().to_string()));
    while goals.iter().any(|g| g.id == goal.id) {
        debug!(id = %goal.id, "create: ID collision, regenerating");
        goal.id = GoalId::generate(name);
    }
    Ok(goal)
}

/// Resolve `reference` and apply a status change; returns (index, updated goal)
pub fn update_status(
    matcher: &Matcher,
    goals: &[Goal],
    reference: &str,
    status: GoalStatus,
) -> Result<(usize, Goal), StoreError> {
    debug!(%reference, %status, "update_status: called");
    let idx = matcher.resolve_preferring(goals, reference, |g| g.status.can_transition_to(status))?;
    let mut goal = goals[idx].clone();

    if !goal.status.can_transition_to(status) {
        return Err(StoreError::InvalidTransition {
            name: goal.name,
            from: goal.status,
            to: status,
        });
    }

    match status {
        GoalStatus::Completed => goal.complete_at(now()),
        GoalStatus::Pending => goal.status = GoalStatus::Pending,
    }
    Ok((idx, goal))
}

/// Resolve `reference` and apply field edits; returns (index, updated goal)
pub fn update_fields(
    matcher: &Matcher,
    goals: &[Goal],
    reference: &str,
    update: GoalUpdate,
) -> Result<(usize, Goal), StoreError> {
    debug!(%reference, ?update, "update_fields: called");
    let update = update.normalized();
    if update.is_empty() {
        return Err(StoreError::InvalidGoal("no fields to update".to_string()));
    }

    let idx = matcher.resolve(goals, reference)?;
    let mut goal = goals[idx].clone();

    if let Some(new_name) = update.name.as_deref()
        && !goal.is_completed()
        && let Some(existing) = matcher.find_duplicate(goals, new_name, Some(idx))
    {
        return Err(StoreError::DuplicateGoal {
            name: existing.name.clone(),
        });
    }

    goal.apply(&update);
    Ok((idx, goal))
}
