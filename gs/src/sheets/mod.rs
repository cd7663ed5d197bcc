//! Google Sheets goal store
//!
//! Goals live in the first worksheet of a spreadsheet, one row per goal under
//! the shared header (or the older title-case one, whose column order is kept). Reads fetch the whole sheet; each mutation touches a
//! single row (append, overwrite or delete) after validating against a fresh
//! read.

mod auth;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

pub use auth::{SCOPES, ServiceAccountKey, TokenProvider};

use crate::config::StorageConfig;
use crate::edit;
use crate::error::StoreError;
use crate::goal::{Goal, GoalStatus, GoalUpdate};
use crate::matcher::Matcher;
use crate::row::{ColumnLayout, GoalRow, HEADER};
use crate::store::GoalStore;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_FILES_API: &str = "https://www.googleapis.com/drive/v3/files";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

/// Worksheet the goals live in
#[derive(Debug, Clone, PartialEq, Eq)]
struct SheetRef {
    id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct Spreadsheet {
    #[serde(default)]
    sheets: Vec<Sheet>,
}

#[derive(Debug, Deserialize)]
struct Sheet {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    #[serde(rename = "sheetId")]
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Authenticated HTTP access to the Google APIs
struct Api {
    http: Client,
    auth: TokenProvider,
}

impl Api {
    /// Attach the bearer token, send, and map failure statuses
    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let token = self.auth.token().await?;
        let response = request.bearer_auth(token).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(%status, "send: request failed");
        Err(status_error(status.as_u16(), &body))
    }

    async fn find_spreadsheet(&self, name: &str, client_email: &str) -> Result<String, StoreError> {
        debug!(%name, "find_spreadsheet: called");
        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            escape_query(name),
            SPREADSHEET_MIME
        );
        let request = self
            .http
            .get(DRIVE_FILES_API)
            .query(&[("q", query.as_str()), ("fields", "files(id,name)")]);
        let list: DriveFileList = self.send(request).await?.json().await?;

        let mut files = list.files.into_iter();
        let Some(first) = files.next() else {
            return Err(StoreError::StorageUnavailable(format!(
                "spreadsheet '{}' not found; share it with {}",
                name, client_email
            )));
        };
        if files.next().is_some() {
            warn!(%name, id = %first.id, "Several spreadsheets share this name; using the first");
        }
        debug!(id = %first.id, name = %first.name, "find_spreadsheet: found");
        Ok(first.id)
    }

    async fn first_sheet(&self, spreadsheet_id: &str) -> Result<SheetRef, StoreError> {
        debug!(%spreadsheet_id, "first_sheet: called");
        let url = api_url(&[spreadsheet_id])?;
        let request = self.http.get(url).query(&[("fields", "sheets.properties(sheetId,title)")]);
        let spreadsheet: Spreadsheet = self.send(request).await?.json().await?;

        spreadsheet
            .sheets
            .into_iter()
            .next()
            .map(|sheet| SheetRef {
                id: sheet.properties.sheet_id,
                title: sheet.properties.title,
            })
            .ok_or_else(|| StoreError::Corrupt("spreadsheet has no worksheets".to_string()))
    }
}

/// Google Sheets goal store
pub struct SheetsStore {
    api: Api,
    spreadsheet_id: String,
    sheet: SheetRef,
    matcher: Matcher,
}

impl SheetsStore {
    /// Authenticate, locate the spreadsheet, and make sure it has a header row
    pub async fn connect(config: &StorageConfig) -> Result<Self, StoreError> {
        debug!(spreadsheet_name = %config.spreadsheet_name, "SheetsStore::connect: called");
        let path = config
            .credentials_path()
            .ok_or_else(|| StoreError::Config("credentials-file is required for google-sheets storage".to_string()))?;
        let key = ServiceAccountKey::from_file(&path)?;
        let client_email = key.client_email.clone();

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| StoreError::Config(format!("failed to build HTTP client: {}", e)))?;
        let api = Api {
            auth: TokenProvider::new(key, http.clone())?,
            http,
        };

        let spreadsheet_id = match &config.spreadsheet_id {
            Some(id) => id.clone(),
            None => api.find_spreadsheet(&config.spreadsheet_name, &client_email).await?,
        };
        let sheet = api.first_sheet(&spreadsheet_id).await?;

        let store = Self {
            api,
            spreadsheet_id,
            sheet,
            matcher: config.matcher(),
        };
        store.ensure_header().await?;

        info!(spreadsheet_id = %store.spreadsheet_id, sheet = %store.sheet.title, "Connected to Google Sheets");
        Ok(store)
    }

    async fn ensure_header(&self) -> Result<(), StoreError> {
        let rows = self.read_range(&format!("{}!1:1", quote_sheet_title(&self.sheet.title))).await?;
        if rows.iter().all(|row| row.iter().all(|cell| cell.trim().is_empty())) {
            info!(sheet = %self.sheet.title, "Writing header row to empty sheet");
            let header: Vec<String> = HEADER.iter().map(|h| h.to_string()).collect();
            self.write_row(1, header).await?;
        }
        Ok(())
    }

    async fn read_range(&self, range: &str) -> Result<Vec<Vec<String>>, StoreError> {
        debug!(%range, "read_range: called");
        let url = api_url(&[&self.spreadsheet_id, "values", range])?;
        let request = self.api.http.get(url).query(&[("majorDimension", "ROWS")]);
        let values: ValueRange = self.api.send(request).await?.json().await?;
        Ok(values.values)
    }

    /// The sheet's column layout and its goals paired with their 1-based row
    async fn load(&self) -> Result<(ColumnLayout, Vec<(u32, Goal)>), StoreError> {
        let range = format!("{}!A:{}", quote_sheet_title(&self.sheet.title), column_letter(HEADER.len()));
        let rows = self.read_range(&range).await?;
        parse_rows(rows)
    }

    async fn append_row(&self, cells: Vec<String>) -> Result<(), StoreError> {
        let range = format!("{}!A1:{}1", quote_sheet_title(&self.sheet.title), column_letter(cells.len()));
        let url = api_url(&[&self.spreadsheet_id, "values", &format!("{}:append", range)])?;
        let request = self
            .api
            .http
            .post(url)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&json!({ "majorDimension": "ROWS", "values": [cells] }));
        self.api.send(request).await?;
        Ok(())
    }

    async fn write_row(&self, row: u32, cells: Vec<String>) -> Result<(), StoreError> {
        let range = row_range(&self.sheet.title, row, cells.len());
        debug!(%range, "write_row: called");
        let url = api_url(&[&self.spreadsheet_id, "values", &range])?;
        let request = self
            .api
            .http
            .put(url)
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({ "range": range, "majorDimension": "ROWS", "values": [cells] }));
        self.api.send(request).await?;
        Ok(())
    }

    async fn delete_row(&self, row: u32) -> Result<(), StoreError> {
        debug!(row, "delete_row: called");
        let url = api_url(&[&format!("{}:batchUpdate", self.spreadsheet_id)])?;
        let request = self.api.http.post(url).json(&delete_row_request(self.sheet.id, row));
        self.api.send(request).await?;
        Ok(())
    }
}

#[async_trait]
impl GoalStore for SheetsStore {
    fn backend(&self) -> &'static str {
        "google-sheets"
    }

    async fn create(&self, name: &str, expected_duration: Option<&str>) -> Result<Goal, StoreError> {
        let (layout, loaded) = self.load().await?;
        let goals = goals_only(loaded);
        let goal = edit::create(&self.matcher, &goals, name, expected_duration)?;
        self.append_row(layout.write(GoalRow::from(&goal))).await?;
        info!(id = %goal.id, name = %goal.name, "Goal logged");
        Ok(goal)
    }

    async fn list(&self) -> Result<Vec<Goal>, StoreError> {
        let (_, loaded) = self.load().await?;
        Ok(goals_only(loaded))
    }

    async fn update_status(&self, reference: &str, status: GoalStatus) -> Result<Goal, StoreError> {
        let (layout, loaded) = self.load().await?;
        let rows: Vec<u32> = loaded.iter().map(|(row, _)| *row).collect();
        let goals = goals_only(loaded);

        let (idx, goal) = edit::update_status(&self.matcher, &goals, reference, status)?;
        self.write_row(rows[idx], layout.write(GoalRow::from(&goal))).await?;
        info!(id = %goal.id, %status, "Goal status updated");
        Ok(goal)
    }

    async fn update_fields(&self, reference: &str, update: GoalUpdate) -> Result<Goal, StoreError> {
        let (layout, loaded) = self.load().await?;
        let rows: Vec<u32> = loaded.iter().map(|(row, _)| *row).collect();
        let goals = goals_only(loaded);

        let (idx, goal) = edit::update_fields(&self.matcher, &goals, reference, update)?;
        self.write_row(rows[idx], layout.write(GoalRow::from(&goal))).await?;
        info!(id = %goal.id, "Goal fields updated");
        Ok(goal)
    }

    async fn delete(&self, reference: &str) -> Result<Goal, StoreError> {
        let (_, mut loaded) = self.load().await?;
        let goals: Vec<Goal> = loaded.iter().map(|(_, goal)| goal.clone()).collect();

        let idx = self.matcher.resolve(&goals, reference)?;
        let (row, goal) = loaded.swap_remove(idx);
        self.delete_row(row).await?;
        info!(id = %goal.id, row, "Goal deleted");
        Ok(goal)
    }
}

fn goals_only(loaded: Vec<(u32, Goal)>) -> Vec<Goal> {
    loaded.into_iter().map(|(_, goal)| goal).collect()
}

/// Turn sheet rows (header first) into goals with their 1-based row numbers
///
/// Blank rows are skipped but still counted, so row numbers stay exact.
fn parse_rows(rows: Vec<Vec<String>>) -> Result<(ColumnLayout, Vec<(u32, Goal)>), StoreError> {
    let mut rows = rows.into_iter();
    let Some(header) = rows.next() else {
        return Ok((ColumnLayout::default(), Vec::new()));
    };
    let layout = ColumnLayout::from_header(&header)?;

    let mut goals = Vec::new();
    for (offset, cells) in rows.enumerate() {
        let row = layout.read(&cells);
        if row.is_blank() {
            continue;
        }
        goals.push((offset as u32 + 2, Goal::try_from(row)?));
    }
    Ok((layout, goals))
}

fn status_error(status: u16, body: &str) -> StoreError {
    match status {
        401 | 403 => StoreError::StorageUnavailable(format!("access denied ({}): {}", status, body)),
        404 => StoreError::StorageUnavailable("spreadsheet not found or not shared with the service account".to_string()),
        429 => StoreError::StorageUnavailable("rate limited by Google Sheets; try again shortly".to_string()),
        _ => StoreError::StorageUnavailable(format!("Google API error {}: {}", status, body)),
    }
}

fn api_url(segments: &[&str]) -> Result<Url, StoreError> {
    let mut url = Url::parse(SHEETS_API).map_err(|e| StoreError::Config(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| StoreError::Config(format!("cannot extend URL {}", SHEETS_API)))?
        .extend(segments);
    Ok(url)
}

/// Letter of the last column in a row `width` cells wide
fn column_letter(width: usize) -> char {
    (b'A' + width.clamp(1, 26) as u8 - 1) as char
}

/// Quote a worksheet title for A1 notation
fn quote_sheet_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// A1 range covering one goal row `width` cells wide
fn row_range(title: &str, row: u32, width: usize) -> String {
    format!("{}!A{row}:{}{row}", quote_sheet_title(title), column_letter(width))
}

fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn delete_row_request(sheet_id: i64, row: u32) -> serde_json::Value {
    json!({
        "requests": [{
            "deleteDimension": {
                "range": {
                    "sheetId": sheet_id,
                    "dimension": "ROWS",
                    "startIndex": row - 1,
                    "endIndex": row,
                }
            }
        }]
    })
}
