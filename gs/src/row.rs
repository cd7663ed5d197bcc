//! Flat row encoding shared by the tabular backends
//!
//! Both the CSV file and the spreadsheet hold one goal per row under the
//! header `HEADER`. Cells are plain strings; this module owns the mapping
//! between those strings and [`Goal`].

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::goal::{Goal, GoalId, GoalStatus};

/// Column names, in storage order
pub const HEADER: [&str; 8] = [
    "id",
    "name",
    "status",
    "created_at",
    "completed_at",
    "expected_duration",
    "duration",
    "notes",
];

/// Format used by older files that stored local wall-clock time
const LEGACY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One stored row; every column is text
///
/// Aliases accept the title-case headers of older goal sheets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalRow {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "Goal")]
    pub name: String,
    #[serde(default, alias = "Status")]
    pub status: String,
    #[serde(default, alias = "Created At")]
    pub created_at: String,
    #[serde(default, alias = "Completed At")]
    pub completed_at: String,
    #[serde(default, alias = "Expected Duration")]
    pub expected_duration: String,
    #[serde(default, alias = "Duration")]
    pub duration: String,
    #[serde(default, alias = "Notes")]
    pub notes: String,
}

impl GoalRow {
    /// Build a row from positional cells (missing trailing cells are empty)
    pub fn from_cells(cells: &[String]) -> Self {
        let cell = |i: usize| cells.get(i).cloned().unwrap_or_default();
        Self {
            id: cell(0),
            name: cell(1),
            status: cell(2),
            created_at: cell(3),
            completed_at: cell(4),
            expected_duration: cell(5),
            duration: cell(6),
            notes: cell(7),
        }
    }

    /// Positional cells in `HEADER` order
    pub fn into_cells(self) -> Vec<String> {
        vec![
            self.id,
            self.name,
            self.status,
            self.created_at,
            self.completed_at,
            self.expected_duration,
            self.duration,
            self.notes,
        ]
    }

    pub fn is_blank(&self) -> bool {
        self.id.trim().is_empty() && self.name.trim().is_empty()
    }
}

/// Where each goal field sits in a stored row
///
/// Files and sheets written here use `HEADER` order. Older sheets use
/// title-case names in another order and have no `id` column; reading the
/// header tells the two apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    /// For each stored column, its index in `HEADER`
    columns: Vec<usize>,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            columns: (0..HEADER.len()).collect(),
        }
    }
}

impl ColumnLayout {
    /// Map a header row to fields; unknown columns and a missing name column are errors
    pub fn from_header(header: &[String]) -> Result<Self, StoreError> {
        let mut cells: Vec<&str> = header.iter().map(|h| h.trim()).collect();
        while cells.last().is_some_and(|h| h.is_empty()) {
            cells.pop();
        }

        let mut columns = Vec::with_capacity(cells.len());
        for cell in &cells {
            let field = field_index(cell).ok_or_else(|| bad_header(header))?;
            if columns.contains(&field) {
                return Err(bad_header(header));
            }
            columns.push(field);
        }

        if !columns.contains(&NAME_FIELD) {
            return Err(bad_header(header));
        }
        Ok(Self { columns })
    }

    /// Number of stored columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Build a row from cells laid out per this layout
    pub fn read(&self, cells: &[String]) -> GoalRow {
        let mut ordered = vec![String::new(); HEADER.len()];
        for (col, field) in self.columns.iter().enumerate() {
            if let Some(cell) = cells.get(col) {
                ordered[*field] = cell.clone();
            }
        }
        GoalRow::from_cells(&ordered)
    }

    /// Lay a row out as cells; fields without a column are dropped
    pub fn write(&self, row: GoalRow) -> Vec<String> {
        let ordered = row.into_cells();
        self.columns.iter().map(|field| ordered[*field].clone()).collect()
    }
}

const NAME_FIELD: usize = 1;

/// `HEADER` index for a header cell, accepting the older title-case names
fn field_index(cell: &str) -> Option<usize> {
    let key = cell.to_lowercase().replace(' ', "_");
    let key = if key == "goal" { "name" } else { key.as_str() };
    HEADER.iter().position(|h| *h == key)
}

fn bad_header(header: &[String]) -> StoreError {
    StoreError::Corrupt(format!(
        "unexpected header row [{}], expected [{}]",
        header.join(", "),
        HEADER.join(", ")
    ))
}

impl From<&Goal> for GoalRow {
    fn from(goal: &Goal) -> Self {
        Self {
            id: goal.id.to_string(),
            name: escape_cell(&goal.name),
            status: goal.status.to_string(),
            created_at: format_timestamp(&goal.created_at),
            completed_at: goal.completed_at.as_ref().map(format_timestamp).unwrap_or_default(),
            expected_duration: escape_opt(&goal.expected_duration),
            duration: goal.duration.clone().unwrap_or_default(),
            notes: escape_opt(&goal.notes),
        }
    }
}

impl TryFrom<GoalRow> for Goal {
    type Error = StoreError;

    fn try_from(row: GoalRow) -> Result<Self, Self::Error> {
        let name = unescape_cell(&row.name);
        if name.trim().is_empty() {
            return Err(StoreError::Corrupt(format!("row '{}' has no goal name", row.id)));
        }

        let status: GoalStatus = row.status.parse().map_err(StoreError::Corrupt)?;
        let created_at = parse_timestamp(&row.created_at)?;
        let completed_at = match row.completed_at.trim() {
            "" => None,
            ts => Some(parse_timestamp(ts)?),
        };

        // Older files have no ID column; the next rewrite persists this one
        let id = match row.id.trim() {
            "" => GoalId::derive(&name, &created_at),
            id => GoalId::from_string(id),
        };

        Ok(Goal {
            id,
            name,
            status,
            created_at,
            completed_at,
            expected_duration: non_empty(unescape_cell(&row.expected_duration)),
            duration: non_empty(row.duration),
            notes: non_empty(unescape_cell(&row.notes)),
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() { None } else { Some(value) }
}

fn escape_opt(value: &Option<String>) -> String {
    value.as_deref().map(escape_cell).unwrap_or_default()
}

/// Guard a cell against spreadsheet formula evaluation
///
/// Text starting with `=`, `+`, `-`, `@` or `'` gets a leading `'`.
pub fn escape_cell(value: &str) -> String {
    match value.chars().next() {
        Some('=' | '+' | '-' | '@' | '\'') => format!("'{}", value),
        _ => value.to_string(),
    }
}

/// Inverse of [`escape_cell`]
///
/// Also unwraps the `'name'` quoting older sheets used for every goal name.
pub fn unescape_cell(value: &str) -> String {
    let Some(rest) = value.strip_prefix('\'') else {
        return value.to_string();
    };
    match rest.chars().next() {
        Some('=' | '+' | '-' | '@' | '\'') | None => rest.to_string(),
        Some(_) => rest.strip_suffix('\'').unwrap_or(rest).to_string(),
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse RFC 3339, or the legacy `YYYY-MM-DD HH:MM:SS` form (read as UTC)
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, LEGACY_TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| StoreError::Corrupt(format!("invalid timestamp '{}': {}", value, e)))
}
