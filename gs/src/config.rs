//! Storage configuration and backend selection

use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::csvfile::CsvStore;
use crate::error::StoreError;
use crate::matcher::{DEFAULT_DUPLICATE_THRESHOLD, DEFAULT_MATCH_THRESHOLD, Matcher};
use crate::sheets::SheetsStore;
use crate::store::GoalStore;

/// Default spreadsheet name
pub const DEFAULT_SPREADSHEET_NAME: &str = "SQUAD GOALS";

/// Which backend holds the goals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageType {
    #[default]
    Csv,
    #[serde(alias = "google_sheets", alias = "sheets")]
    GoogleSheets,
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::GoogleSheets => write!(f, "google-sheets"),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend type
    #[serde(rename = "type")]
    pub storage_type: StorageType,

    /// CSV file path (csv backend); `~/` is expanded
    #[serde(rename = "csv-file")]
    pub csv_file: String,

    /// Service-account key file (google-sheets backend)
    #[serde(rename = "credentials-file")]
    pub credentials_file: Option<String>,

    /// Spreadsheet looked up by name when no ID is given
    #[serde(rename = "spreadsheet-name")]
    pub spreadsheet_name: String,

    /// Spreadsheet ID; skips the name lookup
    #[serde(rename = "spreadsheet-id")]
    pub spreadsheet_id: Option<String>,

    /// Similarity needed to resolve a fuzzy goal reference
    #[serde(rename = "match-threshold")]
    pub match_threshold: f64,

    /// Similarity at which a new name counts as a duplicate (1.0 = exact only)
    #[serde(rename = "duplicate-threshold")]
    pub duplicate_threshold: f64,

    /// HTTP timeout for the remote backend in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/goaltracker on Linux)
        let csv_file = dirs::data_dir()
            .map(|d| d.join("goaltracker").join("goals.csv"))
            .unwrap_or_else(|| PathBuf::from("goals.csv"))
            .to_string_lossy()
            .into_owned();

        Self {
            storage_type: StorageType::Csv,
            csv_file,
            credentials_file: None,
            spreadsheet_name: DEFAULT_SPREADSHEET_NAME.to_string(),
            spreadsheet_id: None,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            duplicate_threshold: DEFAULT_DUPLICATE_THRESHOLD,
            timeout_ms: 30_000,
        }
    }
}

impl StorageConfig {
    /// Check the settings the selected backend needs
    pub fn validate(&self) -> Result<(), StoreError> {
        for (key, value) in [
            ("match-threshold", self.match_threshold),
            ("duplicate-threshold", self.duplicate_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(StoreError::Config(format!("{} must be between 0.0 and 1.0", key)));
            }
        }

        match self.storage_type {
            StorageType::Csv if self.csv_file.trim().is_empty() => {
                Err(StoreError::Config("csv-file is required for csv storage".to_string()))
            }
            StorageType::GoogleSheets if self.credentials_file.is_none() => Err(StoreError::Config(
                "credentials-file is required for google-sheets storage".to_string(),
            )),
            StorageType::GoogleSheets
                if self.spreadsheet_id.is_none() && self.spreadsheet_name.trim().is_empty() =>
            {
                Err(StoreError::Config(
                    "spreadsheet-name or spreadsheet-id is required for google-sheets storage".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Matcher built from the configured thresholds
    pub fn matcher(&self) -> Matcher {
        Matcher::new(self.match_threshold, self.duplicate_threshold)
    }

    /// CSV path with `~/` expanded
    pub fn csv_path(&self) -> PathBuf {
        expand_home(&self.csv_file)
    }

    /// Credentials path with `~/` expanded
    pub fn credentials_path(&self) -> Option<PathBuf> {
        self.credentials_file.as_deref().map(expand_home)
    }
}

/// Expand a leading `~/` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

/// Open the configured backend
///
/// The backend is fixed for the lifetime of the returned store.
pub async fn open_store(config: &StorageConfig) -> Result<Box<dyn GoalStore>, StoreError> {
    debug!(storage_type = %config.storage_type, "open_store: called");
    config.validate()?;

    let store: Box<dyn GoalStore> = match config.storage_type {
        StorageType::Csv => Box::new(CsvStore::open(config.csv_path(), config.matcher())?),
        StorageType::GoogleSheets => Box::new(SheetsStore::connect(config).await?),
    };

    info!(backend = store.backend(), "Opened goal store");
    Ok(store)
}

/// Config file for the standalone `gs` binary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
}

impl Config {
    /// Load config from file, or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            return Self::load_from_file(config_path)
                .context(format!("Failed to load config from {}", config_path.display()));
        }

        // Try default locations
        let default_paths = [
            Some(PathBuf::from("goalstore.yml")),
            dirs::config_dir().map(|p| p.join("goalstore").join("goalstore.yml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                return Self::load_from_file(path);
            }
        }

        Ok(Config::default())
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        info!("Loaded config from: {}", path.display());
        Ok(config)
    }
}
