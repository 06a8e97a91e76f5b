//! Command implementations.

pub mod completions;
pub mod dashboard;
pub mod init;
pub mod record;
pub mod sync;
pub mod version;

use std::path::PathBuf;

use tracing::warn;

use crate::cli::SheetOptions;
use crate::config::{default_actor, resolve_credentials, resolve_db_path, resolve_spreadsheet_id};
use crate::error::{Error, Result};
use crate::model::RecordKind;
use crate::sheets::{GoogleSheetsClient, MemorySheetClient, SheetClient};
use crate::storage::SqliteStorage;

/// Open the database, which must already exist.
fn open_storage(db_path: Option<&PathBuf>) -> Result<SqliteStorage> {
    let db_path =
        resolve_db_path(db_path.map(PathBuf::as_path)).ok_or(Error::NotInitialized)?;

    if !db_path.exists() {
        return Err(Error::NotInitialized);
    }

    SqliteStorage::open(&db_path)
}

fn parse_kind(kind: &str) -> Result<RecordKind> {
    kind.parse()
}

fn resolve_actor(actor: Option<&str>) -> String {
    actor.map_or_else(default_actor, str::to_string)
}

/// Client for the configured spreadsheet.
///
/// Missing credentials do not fail here; they make every sync in the pass
/// report `failed`. If the HTTP client cannot be built at all, an
/// unauthenticated stand-in is returned so records still save.
fn sheet_client(options: &SheetOptions) -> Box<dyn SheetClient> {
    let spreadsheet_id = resolve_spreadsheet_id(options.sheet_id.as_deref());
    let credentials = resolve_credentials(options.credentials.as_deref());

    match GoogleSheetsClient::new(&spreadsheet_id, &credentials) {
        Ok(client) => {
            if !client.has_credentials() {
                warn!("No Google credentials configured; records will stay pending");
            }
            Box::new(client)
        }
        Err(e) => {
            warn!(error = %e, "Sheets client unavailable; records will stay pending");
            Box::new(MemorySheetClient::unauthenticated())
        }
    }
}

/// Client for the configured spreadsheet, refusing to run without a key.
///
/// Used when the user asked for one specific push, where a missing key is
/// an error worth an exit code rather than a pending record.
fn checked_sheet_client(options: &SheetOptions) -> Result<Box<dyn SheetClient>> {
    let spreadsheet_id = resolve_spreadsheet_id(options.sheet_id.as_deref());
    let key = resolve_credentials(options.credentials.as_deref()).load()?;
    let client = GoogleSheetsClient::with_key(&spreadsheet_id, Ok(key))?;
    Ok(Box::new(client))
}
