//! Local CSV goal store
//!
//! One row per goal under the `row::HEADER` header. The file is re-read on
//! every call and rewritten in full on every mutation (temp file + rename), so
//! a failed write never leaves a half-written file behind.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::edit;
use crate::error::StoreError;
use crate::goal::{Goal, GoalStatus, GoalUpdate};
use crate::matcher::Matcher;
use crate::row::{GoalRow, HEADER};
use crate::store::GoalStore;

/// CSV-file goal store
pub struct CsvStore {
    path: PathBuf,
    matcher: Matcher,
}

impl CsvStore {
    /// Open the store, creating the file (and parent dirs) with a header if missing
    pub fn open(path: impl AsRef<Path>, matcher: Matcher) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        debug!(path = %path.display(), "CsvStore::open: called");

        let needs_header = match fs::metadata(&path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };

        let store = Self { path, matcher };
        if needs_header {
            if let Some(parent) = store.path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }
            store.save(&[])?;
            info!(path = %store.path.display(), "Created goal file");
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<Goal>, StoreError> {
        debug!(path = %self.path.display(), "load: called");
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(&self.path)?;
        let mut goals = Vec::new();
        for result in reader.deserialize::<GoalRow>() {
            let row = result?;
            if row.is_blank() {
                continue;
            }
            goals.push(Goal::try_from(row)?);
        }

        debug!(count = goals.len(), "load: done");
        Ok(goals)
    }

    fn save(&self, goals: &[Goal]) -> Result<(), StoreError> {
        debug!(count = goals.len(), "save: called");
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        write_csv(tmp.as_file_mut(), goals)?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

/// Write `goals` as CSV, header first, in the on-disk format
pub fn write_csv<W: std::io::Write>(writer: W, goals: &[Goal]) -> Result<(), StoreError> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(HEADER)?;
    for goal in goals {
        writer.write_record(GoalRow::from(goal).into_cells())?;
    }
    writer.flush()?;
    Ok(())
}

#[async_trait]
impl GoalStore for CsvStore {
    fn backend(&self) -> &'static str {
        "csv"
    }

    async fn create(&self, name: &str, expected_duration: Option<&str>) -> Result<Goal, StoreError> {
        let mut goals = self.load()?;
        let goal = edit::create(&self.matcher, &goals, name, expected_duration)?;
        goals.push(goal.clone());
        self.save(&goals)?;
        info!(id = %goal.id, name = %goal.name, "Goal logged");
        Ok(goal)
    }

    async fn list(&self) -> Result<Vec<Goal>, StoreError> {
        self.load()
    }

    async fn update_status(&self, reference: &str, status: GoalStatus) -> Result<Goal, StoreError> {
        let mut goals = self.load()?;
        let (idx, goal) = edit::update_status(&self.matcher, &goals, reference, status)?;
        goals[idx] = goal.clone();
        self.save(&goals)?;
        info!(id = %goal.id, %status, "Goal status updated");
        Ok(goal)
    }

    async fn update_fields(&self, reference: &str, update: GoalUpdate) -> Result<Goal, StoreError> {
        let mut goals = self.load()?;
        let (idx, goal) = edit::update_fields(&self.matcher, &goals, reference, update)?;
        goals[idx] = goal.clone();
        self.save(&goals)?;
        info!(id = %goal.id, "Goal fields updated");
        Ok(goal)
    }

    async fn delete(&self, reference: &str) -> Result<Goal, StoreError> {
        let mut goals = self.load()?;
        let idx = self.matcher.resolve(&goals, reference)?;
        let goal = goals.remove(idx);
        self.save(&goals)?;
        info!(id = %goal.id, "Goal deleted");
        Ok(goal)
    }
}
