//! GoalStore - goal records over interchangeable backends
//!
//! A goal is a named objective with a status (Pending or Completed), timestamps
//! and a few optional free-text fields. The same [`GoalStore`] interface is
//! served by a local CSV file or a Google Sheets spreadsheet; the backend is
//! chosen once, from configuration, when the store is opened.
//!
//! # Modules
//!
//! - [`goal`] - Goal record, status and field updates
//! - [`store`] - The `GoalStore` trait
//! - [`csvfile`] - CSV file backend
//! - [`sheets`] - Google Sheets backend
//! - [`matcher`] - Resolving free-text goal references
//! - [`config`] - Storage configuration and backend selection

pub mod cli;
pub mod config;
pub mod csvfile;
pub mod edit;
pub mod error;
pub mod goal;
pub mod matcher;
pub mod row;
pub mod sheets;
pub mod store;

pub use config::{StorageConfig, StorageType, open_store};
pub use csvfile::CsvStore;
pub use error::StoreError;
pub use goal::{Goal, GoalId, GoalStatus, GoalUpdate};
pub use matcher::Matcher;
pub use sheets::SheetsStore;
pub use store::GoalStore;
