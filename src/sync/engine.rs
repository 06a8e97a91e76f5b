//! Pushes a single record to its worksheet.
//!
//! The engine never returns an error. Every failure becomes
//! [`SyncOutcome::Failed`] and is reported to the observer; the caller
//! decides what to do with the local `synced` flag.

use crate::model::{Record, ID_COLUMN};
use crate::sheets::{SheetClient, SheetResult};

use super::observer::SyncObserver;
use super::types::SyncOutcome;

/// Syncs records through one client handle.
///
/// Build one per pass and reuse it for every record, so authentication
/// happens at most once.
pub struct SyncEngine<'a> {
    client: &'a mut dyn SheetClient,
    observer: &'a dyn SyncObserver,
}

impl<'a> SyncEngine<'a> {
    #[must_use]
    pub fn new(client: &'a mut dyn SheetClient, observer: &'a dyn SyncObserver) -> Self {
        Self { client, observer }
    }

    /// Observer this engine reports to.
    #[must_use]
    pub fn observer(&self) -> &'a dyn SyncObserver {
        self.observer
    }

    /// Push `record` to the worksheet of its kind.
    pub fn sync_record(&mut self, record: &Record) -> SyncOutcome {
        self.sync_one(record, record.kind.sheet_name())
    }

    /// Push `record` to `sheet`.
    ///
    /// Writes the header first if row 1 is empty, then appends the row
    /// unless a row with the same id is already there. Makes at most one
    /// header write and one append.
    pub fn sync_one(&mut self, record: &Record, sheet: &str) -> SyncOutcome {
        match self.push(record, sheet) {
            Ok(outcome) => outcome,
            Err(error) => {
                self.observer.record_failed(record, sheet, &error);
                SyncOutcome::Failed
            }
        }
    }

    fn push(&mut self, record: &Record, sheet: &str) -> SheetResult<SyncOutcome> {
        let columns = record.kind.sheet_columns();

        let header = self.client.header(sheet)?;
        if header.iter().all(|cell| cell.trim().is_empty()) {
            let header_row: Vec<String> = columns.iter().map(|c| (*c).to_string()).collect();
            self.client.insert_row(sheet, &header_row, 1)?;
            self.observer.header_created(sheet);
        }

        let row = record.sheet_row();
        let id = record.id.to_string();

        let id_column = record.kind.column_index(ID_COLUMN).unwrap_or(1);
        let existing = self.client.column_values(sheet, id_column)?;
        if existing.iter().any(|value| value.trim() == id) {
            self.observer.record_already_present(record, sheet);
            return Ok(SyncOutcome::AlreadyPresent);
        }

        self.client.append_row(sheet, &row)?;
        self.observer.record_synced(record, sheet);
        Ok(SyncOutcome::Synced)
    }
}
