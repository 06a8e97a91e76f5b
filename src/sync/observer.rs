//! Sync progress reporting.
//!
//! The engine and the batch pass report what they do through a
//! [`SyncObserver`] instead of printing. [`TracingObserver`] turns the
//! callbacks into `tracing` events.

use tracing::{debug, info, warn};

use crate::error::Error;
use crate::model::{Record, RecordKind};
use crate::sheets::SheetError;

/// Receives sync progress. Every method has a no-op default.
pub trait SyncObserver {
    /// A header row was written to an empty sheet.
    fn header_created(&self, _sheet: &str) {}

    /// A record was appended.
    fn record_synced(&self, _record: &Record, _sheet: &str) {}

    /// A record's id was already in the sheet.
    fn record_already_present(&self, _record: &Record, _sheet: &str) {}

    /// A record could not be pushed and stays unsynced.
    fn record_failed(&self, _record: &Record, _sheet: &str, _error: &SheetError) {}

    /// A kind's synced flags were committed.
    fn kind_committed(&self, _kind: RecordKind, _count: usize) {}

    /// The pass stopped on a local storage failure.
    fn pass_aborted(&self, _kind: RecordKind, _error: &Error) {}
}

/// Logs sync progress with `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SyncObserver for TracingObserver {
    fn header_created(&self, sheet: &str) {
        info!(sheet, "Created header row");
    }

    fn record_synced(&self, record: &Record, sheet: &str) {
        debug!(sheet, id = record.id, "Appended record");
    }

    fn record_already_present(&self, record: &Record, sheet: &str) {
        debug!(sheet, id = record.id, "Record already in sheet");
    }

    fn record_failed(&self, record: &Record, sheet: &str, error: &SheetError) {
        warn!(sheet, id = record.id, %error, "Sync failed, record stays pending");
    }

    fn kind_committed(&self, kind: RecordKind, count: usize) {
        info!(sheet = kind.sheet_name(), count, "Marked records synced");
    }

    fn pass_aborted(&self, kind: RecordKind, error: &Error) {
        warn!(sheet = kind.sheet_name(), %error, "Sync pass stopped");
    }
}

/// Discards every callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl SyncObserver for NullObserver {}
