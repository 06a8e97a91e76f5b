//! Spreadsheet client used by the sync engine.
//!
//! The engine talks to worksheets through the [`SheetClient`] trait, which
//! covers the four calls a sync needs: read the header, insert a row at a
//! position, read one column and append a row. Rows and indexes are
//! 1-based, the way the Sheets API counts.
//!
//! - [`google`] - Google Sheets v4 REST implementation
//! - [`memory`] - In-memory implementation for tests and dry runs
//! - [`auth`] - Service-account token exchange
//! - [`credentials`] - Service-account key loading

pub mod auth;
pub mod credentials;
pub mod google;
pub mod memory;

pub use credentials::{CredentialSource, ServiceAccountKey};
pub use google::GoogleSheetsClient;
pub use memory::{CallCounts, MemorySheetClient};

use thiserror::Error;

/// Result type for spreadsheet calls.
pub type SheetResult<T> = std::result::Result<T, SheetError>;

/// Errors raised by a [`SheetClient`].
#[derive(Error, Debug)]
pub enum SheetError {
    /// No usable service-account key.
    #[error("Credentials unavailable: {0}")]
    Credentials(String),

    /// The token endpoint rejected the signed assertion.
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Sheets API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Worksheet not found: {0}")]
    SheetNotFound(String),

    #[error("HTTP runtime unavailable: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// Access to the worksheets of one spreadsheet.
pub trait SheetClient {
    /// Values of row 1, or an empty vector when the sheet has no header.
    ///
    /// # Errors
    ///
    /// Returns an error if the sheet cannot be read.
    fn header(&mut self, sheet: &str) -> SheetResult<Vec<String>>;

    /// Insert `row` so that it becomes row `index`, shifting rows below.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn insert_row(&mut self, sheet: &str, row: &[String], index: usize) -> SheetResult<()>;

    /// All values of column `column`, top to bottom, header included.
    ///
    /// # Errors
    ///
    /// Returns an error if the sheet cannot be read.
    fn column_values(&mut self, sheet: &str, column: usize) -> SheetResult<Vec<String>>;

    /// Append `row` after the last data row. Values are entered as a user
    /// would type them, so numbers and dates are coerced by the sheet.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn append_row(&mut self, sheet: &str, row: &[String]) -> SheetResult<()>;
}
