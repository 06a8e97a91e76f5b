//! Google Sheets v4 REST client.
//!
//! The client is blocking from the caller's point of view: it owns a
//! private Tokio runtime and drives an async `reqwest` client with
//! `block_on`. Credentials are resolved when the client is built, but a
//! failure there is kept rather than returned, so every call in the pass
//! reports it and records stay unsynced.

use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::debug;

use super::auth::TokenProvider;
use super::credentials::{CredentialSource, ServiceAccountKey};
use super::{SheetClient, SheetError, SheetResult};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Spreadsheet the trial data is mirrored to unless configured otherwise.
pub const DEFAULT_SPREADSHEET_ID: &str = "1ducwMEA-YrN9BAD6VJ-a9xNIxLr6wqNbVkg_7_UKggs";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Blocking client for one spreadsheet.
pub struct GoogleSheetsClient {
    runtime: tokio::runtime::Runtime,
    api: SheetsApi,
}

struct SheetsApi {
    http: reqwest::Client,
    root: Url,
    spreadsheet_id: String,
    auth: Result<TokenProvider, String>,
    // Worksheet title -> numeric sheet id
    sheet_ids: HashMap<String, i64>,
}

impl GoogleSheetsClient {
    /// Build a client for `spreadsheet_id` using the given credentials.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::Runtime`] if the HTTP runtime cannot start.
    pub fn new(spreadsheet_id: &str, credentials: &CredentialSource) -> SheetResult<Self> {
        Self::with_key(spreadsheet_id, credentials.load())
    }

    /// Build a client from an already loaded key (or the reason there is none).
    ///
    /// # Errors
    ///
    /// See [`GoogleSheetsClient::new`].
    pub fn with_key(
        spreadsheet_id: &str,
        key: SheetResult<ServiceAccountKey>,
    ) -> SheetResult<Self> {
        let runtime = tokio::runtime::Runtime::new()?;
        let root = Url::parse(SHEETS_API)
            .map_err(|e| SheetError::Decode(format!("invalid API root: {e}")))?;

        let auth = match key {
            Ok(key) => Ok(TokenProvider::new(key)),
            Err(SheetError::Credentials(message)) => Err(message),
            Err(other) => Err(other.to_string()),
        };

        Ok(Self {
            runtime,
            api: SheetsApi {
                http: reqwest::Client::new(),
                root,
                spreadsheet_id: spreadsheet_id.to_string(),
                auth,
                sheet_ids: HashMap::new(),
            },
        })
    }

    /// Whether a service-account key was loaded.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.api.auth.is_ok()
    }
}

impl SheetClient for GoogleSheetsClient {
    fn header(&mut self, sheet: &str) -> SheetResult<Vec<String>> {
        self.runtime.block_on(self.api.header(sheet))
    }

    fn insert_row(&mut self, sheet: &str, row: &[String], index: usize) -> SheetResult<()> {
        self.runtime.block_on(self.api.insert_row(sheet, row, index))
    }

    fn column_values(&mut self, sheet: &str, column: usize) -> SheetResult<Vec<String>> {
        self.runtime.block_on(self.api.column_values(sheet, column))
    }

    fn append_row(&mut self, sheet: &str, row: &[String]) -> SheetResult<()> {
        self.runtime.block_on(self.api.append_row(sheet, row))
    }
}

impl SheetsApi {
    async fn header(&mut self, sheet: &str) -> SheetResult<Vec<String>> {
        let range = a1_range(sheet, "1:1");
        let url = self.values_url(&range, "", &[])?;
        let body: ValueRange = self.send(Method::GET, url, None).await?;
        Ok(body
            .values
            .into_iter()
            .next()
            .map(|row| row.iter().map(cell_text).collect())
            .unwrap_or_default())
    }

    async fn insert_row(&mut self, sheet: &str, row: &[String], index: usize) -> SheetResult<()> {
        if index == 0 {
            return Err(SheetError::Decode("row indexes start at 1".into()));
        }

        let sheet_id = self.sheet_id(sheet).await?;
        let url = self.url(":batchUpdate", &[])?;
        let request = insert_row_request(sheet_id, row, index);
        let _: Value = self.send(Method::POST, url, Some(request)).await?;
        Ok(())
    }

    async fn column_values(&mut self, sheet: &str, column: usize) -> SheetResult<Vec<String>> {
        let letter = column_letter(column);
        let range = a1_range(sheet, &format!("{letter}:{letter}"));
        let url = self.values_url(&range, "", &[("majorDimension", "COLUMNS")])?;
        let body: ValueRange = self.send(Method::GET, url, None).await?;
        Ok(body
            .values
            .into_iter()
            .next()
            .map(|column| column.iter().map(cell_text).collect())
            .unwrap_or_default())
    }

    async fn append_row(&mut self, sheet: &str, row: &[String]) -> SheetResult<()> {
        let range = a1_range(sheet, "A1");
        let url = self.values_url(
            &range,
            ":append",
            &[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ],
        )?;
        let _: Value = self
            .send(Method::POST, url, Some(json!({ "values": [row] })))
            .await?;
        Ok(())
    }

    async fn sheet_id(&mut self, title: &str) -> SheetResult<i64> {
        if let Some(id) = self.sheet_ids.get(title) {
            return Ok(*id);
        }

        let url = self.url("", &[("fields", "sheets.properties(sheetId,title)")])?;
        let meta: SpreadsheetMeta = self.send(Method::GET, url, None).await?;
        self.sheet_ids = meta
            .sheets
            .into_iter()
            .map(|s| (s.properties.title, s.properties.sheet_id))
            .collect();

        self.sheet_ids
            .get(title)
            .copied()
            .ok_or_else(|| SheetError::SheetNotFound(title.to_string()))
    }

    /// URL of the spreadsheet itself, with an optional `:method` suffix.
    fn url(&self, suffix: &str, query: &[(&str, &str)]) -> SheetResult<Url> {
        let spreadsheet = format!("{}{suffix}", self.spreadsheet_id);
        self.build_url(&[spreadsheet.as_str()], query)
    }

    /// URL under `values/` for an A1 range, the range encoded as one segment.
    fn values_url(&self, range: &str, suffix: &str, query: &[(&str, &str)]) -> SheetResult<Url> {
        let range = format!("{range}{suffix}");
        self.build_url(&[self.spreadsheet_id.as_str(), "values", range.as_str()], query)
    }

    fn build_url(&self, segments: &[&str], query: &[(&str, &str)]) -> SheetResult<Url> {
        let mut url = self.root.clone();
        url.path_segments_mut()
            .map_err(|()| SheetError::Decode("API root cannot take a path".into()))?
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn send<T>(&mut self, method: Method, url: Url, body: Option<Value>) -> SheetResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let auth = self
            .auth
            .as_mut()
            .map_err(|message| SheetError::Credentials(message.clone()))?;
        let token = auth.token(&self.http).await?;

        debug!(%method, path = url.path(), "Sheets API request");

        let mut request = self.http.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(api_error(status, &text));
        }

        response
            .json()
            .await
            .map_err(|e| SheetError::Decode(e.to_string()))
    }
}

/// One `batchUpdate` body that opens a row at 1-based `index` and fills it
/// with `row` as literal strings. Both changes apply together or not at all.
fn insert_row_request(sheet_id: i64, row: &[String], index: usize) -> Value {
    let start = index - 1;
    let cells: Vec<Value> = row
        .iter()
        .map(|cell| json!({ "userEnteredValue": { "stringValue": cell } }))
        .collect();

    json!({
        "requests": [
            {
                "insertDimension": {
                    "range": {
                        "sheetId": sheet_id,
                        "dimension": "ROWS",
                        "startIndex": start,
                        "endIndex": start + 1,
                    },
                    "inheritFromBefore": false,
                }
            },
            {
                "updateCells": {
                    "start": { "sheetId": sheet_id, "rowIndex": start, "columnIndex": 0 },
                    "rows": [{ "values": cells }],
                    "fields": "userEnteredValue",
                }
            }
        ]
    })
}

fn api_error(status: StatusCode, body: &str) -> SheetError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map_or_else(|_| body.trim().to_string(), |e| e.error.message);
    SheetError::Api {
        status: status.as_u16(),
        message,
    }
}

/// A1 notation with the worksheet title quoted (`'Growth (Field)'!A1`).
fn a1_range(sheet: &str, cells: &str) -> String {
    format!("'{}'!{cells}", sheet.replace('\'', "''"))
}

/// Column letters for a 1-based index (1 -> A, 27 -> AA).
fn column_letter(mut index: usize) -> String {
    let mut letters = Vec::new();
    while index > 0 {
        let rem = (index - 1) % 26;
        letters.push(char::from(b'A' + u8::try_from(rem).unwrap_or(0)));
        index = (index - 1) / 26;
    }
    letters.iter().rev().collect()
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
