//! Goal records and identifiers
//!
//! Goal IDs use the format: `{8-char-hex}-{slug}`
//! Example: `3fa2c91b-read-a-book`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Longest slug kept in a goal ID
const MAX_SLUG_LEN: usize = 32;

/// Slugify a goal name for use in IDs
fn slugify(name: &str) -> String {
    let slug = name
        .to_lowercase()
        .chars()
        // Strip apostrophes entirely, replace other non-alphanumeric with hyphens
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c == '\'' || c == '\u{2019}' || c == '\u{2018}' {
                None
            } else {
                Some('-')
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    let truncated: String = slug.chars().take(MAX_SLUG_LEN).collect();
    truncated.trim_end_matches('-').to_string()
}

/// Goal ID wrapper for type-safe ID handling
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoalId(String);

impl GoalId {
    /// Generate a new ID for a goal name
    pub fn generate(name: &str) -> Self {
        // The tail of a v7 UUID is random; the head is the timestamp
        Self::with_uuid(uuid::Uuid::now_v7(), name)
    }

    /// Stable ID for a stored goal that has none, from its name and creation time
    ///
    /// Rows from older files carry no ID column; deriving the ID keeps it
    /// the same across reads until a rewrite stores it.
    pub fn derive(name: &str, created_at: &DateTime<Utc>) -> Self {
        let seed = format!("{}\n{}", name, created_at.timestamp());
        Self::with_uuid(uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, seed.as_bytes()), name)
    }

    fn with_uuid(uuid: uuid::Uuid, name: &str) -> Self {
        let uuid = uuid.simple().to_string();
        let hex = &uuid[uuid.len() - 8..];
        let slug = slugify(name);
        if slug.is_empty() {
            Self(hex.to_string())
        } else {
            Self(format!("{}-{}", hex, slug))
        }
    }

    /// Create from an existing ID string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the full ID string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the hex prefix
    pub fn hex_prefix(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}

impl std::fmt::Display for GoalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Goal status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoalStatus {
    Pending,
    Completed,
}

impl GoalStatus {
    /// Whether moving from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: GoalStatus) -> bool {
        matches!((self, next), (GoalStatus::Pending, GoalStatus::Completed))
    }
}

impl std::fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Completed => write!(f, "Completed"),
        }
    }
}

impl std::str::FromStr for GoalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" | "" => Ok(Self::Pending),
            "completed" | "complete" | "done" => Ok(Self::Completed),
            _ => Err(format!("Unknown status: {}. Use: pending or completed", s)),
        }
    }
}

/// A tracked goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub name: String,
    pub status: GoalStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Free text, e.g. "2 weeks"
    pub expected_duration: Option<String>,
    /// Elapsed time from creation to completion, e.g. "1d 2h 5m"
    pub duration: Option<String>,
    pub notes: Option<String>,
}

impl Goal {
    /// Create a new pending goal stamped with the current time
    pub fn new(name: impl Into<String>, expected_duration: Option<String>) -> Self {
        let name = name.into();
        debug!(%name, "Goal::new: called");
        Self {
            id: GoalId::generate(&name),
            name,
            status: GoalStatus::Pending,
            created_at: now(),
            completed_at: None,
            expected_duration: expected_duration.filter(|d| !d.trim().is_empty()),
            duration: None,
            notes: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == GoalStatus::Completed
    }

    /// Mark completed at `at`, recording the elapsed duration
    pub fn complete_at(&mut self, at: DateTime<Utc>) {
        debug!(id = %self.id, "Goal::complete_at: called");
        // Clock skew must never produce completed_at < created_at
        let at = at.max(self.created_at);
        self.status = GoalStatus::Completed;
        self.completed_at = Some(at);
        self.duration = Some(format_elapsed(at - self.created_at));
    }

    /// Apply the fields present in `update`
    pub fn apply(&mut self, update: &GoalUpdate) {
        debug!(id = %self.id, ?update, "Goal::apply: called");
        if let Some(name) = update.name.as_deref() {
            self.name = name.trim().to_string();
        }
        if let Some(expected) = update.expected_duration.as_deref() {
            self.expected_duration = Some(expected.trim().to_string());
        }
        if let Some(notes) = update.notes.as_deref() {
            self.notes = Some(notes.trim().to_string());
        }
    }
}

/// Editable goal fields; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl GoalUpdate {
    /// Drop blank fields
    pub fn normalized(self) -> Self {
        fn keep(v: Option<String>) -> Option<String> {
            v.filter(|s| !s.trim().is_empty())
        }
        Self {
            name: keep(self.name),
            expected_duration: keep(self.expected_duration),
            notes: keep(self.notes),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.expected_duration.is_none() && self.notes.is_none()
    }

    /// Human-readable list of the changes, e.g. `name → Run, notes → daily`
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(name) = &self.name {
            parts.push(format!("name → {}", name));
        }
        if let Some(expected) = &self.expected_duration {
            parts.push(format!("expected duration → {}", expected));
        }
        if let Some(notes) = &self.notes {
            parts.push(format!("notes → {}", notes));
        }
        parts.join(", ")
    }
}

/// Current time truncated to whole seconds, matching the stored precision
pub fn now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now)
}

/// Format an elapsed duration as `1d 2h 5m`, `3m 10s` or `0s`
pub fn format_elapsed(elapsed: chrono::TimeDelta) -> String {
    let total = elapsed.num_seconds().max(0);
    let (days, hours, minutes, seconds) = (total / 86_400, (total % 86_400) / 3600, (total % 3600) / 60, total % 60);

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    // Seconds only matter for short spans
    if days == 0 && hours == 0 && (seconds > 0 || parts.is_empty()) {
        parts.push(format!("{}s", seconds));
    }
    parts.join(" ")
}
