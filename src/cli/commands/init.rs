//! Create the local DataCollect database.
//!
//! The database lives at `~/.datacollect/app.sqlite` unless `--db`,
//! `DATACOLLECT_DB` or `DC_TEST_DB` say otherwise. Init creates the parent
//! directory and applies the schema.

use crate::cli::SheetOptions;
use crate::config::{resolve_credentials, resolve_db_path, resolve_spreadsheet_id};
use crate::error::{Error, Result};
use crate::storage::SqliteStorage;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

#[derive(Serialize)]
struct InitOutput {
    database: PathBuf,
    spreadsheet_id: String,
    credentials: String,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns [`Error::AlreadyInitialized`] if the database exists and
/// `force` is not set, or an error if the directory or database cannot be
/// created.
pub fn execute(
    db_path: Option<&PathBuf>,
    sheets: &SheetOptions,
    force: bool,
    json: bool,
) -> Result<()> {
    let db_path = resolve_db_path(db_path.map(PathBuf::as_path))
        .ok_or_else(|| Error::Config("Could not determine the data directory".to_string()))?;

    if db_path.exists() {
        if !force {
            return Err(Error::AlreadyInitialized { path: db_path });
        }
        fs::remove_file(&db_path)?;
        for suffix in ["-wal", "-shm"] {
            let mut side = db_path.clone().into_os_string();
            side.push(suffix);
            let side = PathBuf::from(side);
            if side.exists() {
                fs::remove_file(side)?;
            }
        }
    }

    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Opening applies the schema
    SqliteStorage::open(&db_path)?;

    let spreadsheet_id = resolve_spreadsheet_id(sheets.sheet_id.as_deref());
    let credentials = resolve_credentials(sheets.credentials.as_deref());

    if json {
        let output = InitOutput {
            database: db_path,
            spreadsheet_id,
            credentials: credentials.describe(),
        };
        let payload = serde_json::to_string(&output)?;
        println!("{payload}");
    } else {
        println!("Initialized DataCollect database");
        println!("  Database:    {}", db_path.display());
        println!("  Spreadsheet: {spreadsheet_id}");
        println!("  Credentials: {}", credentials.describe());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordKind;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_database_and_parent() {
        let temp = TempDir::new().unwrap();
        let db = temp.path().join("nested").join("app.sqlite");

        execute(Some(&db), &SheetOptions::default(), false, true).unwrap();

        assert!(db.exists());
        let storage = SqliteStorage::open(&db).unwrap();
        assert_eq!(storage.count_records(RecordKind::Agronomic).unwrap(), 0);
    }

    #[test]
    fn test_init_fails_if_already_initialized() {
        let temp = TempDir::new().unwrap();
        let db = temp.path().join("app.sqlite");

        assert!(execute(Some(&db), &SheetOptions::default(), false, true).is_ok());
        let result = execute(Some(&db), &SheetOptions::default(), false, true);
        assert!(matches!(result, Err(Error::AlreadyInitialized { .. })));
    }

    #[test]
    fn test_init_force_starts_over() {
        let temp = TempDir::new().unwrap();
        let db = temp.path().join("app.sqlite");
        execute(Some(&db), &SheetOptions::default(), false, true).unwrap();

        {
            let mut storage = SqliteStorage::open(&db).unwrap();
            storage
                .insert_record(
                    crate::model::Observation::empty(RecordKind::Disease),
                    "tester",
                )
                .unwrap();
        }

        execute(Some(&db), &SheetOptions::default(), true, true).unwrap();
        let storage = SqliteStorage::open(&db).unwrap();
        assert_eq!(storage.count_records(RecordKind::Disease).unwrap(), 0);
    }
}
