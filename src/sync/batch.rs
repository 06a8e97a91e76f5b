//! Batch sync of every pending record.
//!
//! Kinds are processed in [`RecordKind::ALL`] order. Within a kind each
//! unsynced record goes through the engine, and the successful ids are
//! marked synced in one transaction once the kind is done. A storage
//! failure stops the pass; kinds committed before it keep their flags and
//! their counts stay in the report.

use tracing::{info, info_span};
use uuid::Uuid;

use crate::error::Result;
use crate::model::{Record, RecordKind};
use crate::storage::SqliteStorage;

use super::engine::SyncEngine;
use super::types::{SyncOutcome, SyncReport};

/// The local side of a sync: where pending records come from and where
/// their flags go.
pub trait RecordStore {
    /// Unsynced records of one kind, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn unsynced(&self, kind: RecordKind) -> Result<Vec<Record>>;

    /// Mark `ids` synced, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; no flag changes in that case.
    fn commit_synced(&mut self, kind: RecordKind, ids: &[i64], actor: &str) -> Result<usize>;
}

impl RecordStore for SqliteStorage {
    fn unsynced(&self, kind: RecordKind) -> Result<Vec<Record>> {
        self.get_unsynced_records(kind)
    }

    fn commit_synced(&mut self, kind: RecordKind, ids: &[i64], actor: &str) -> Result<usize> {
        self.mark_synced(kind, ids, actor)
    }
}

/// Sync every unsynced record of every kind.
///
/// Never fails: a storage error ends the pass and is carried in
/// [`SyncReport::error`].
pub fn sync_all_unsynced(
    store: &mut dyn RecordStore,
    engine: &mut SyncEngine<'_>,
    actor: &str,
) -> SyncReport {
    let pass_id = Uuid::new_v4();
    let span = info_span!("sync_pass", %pass_id);
    let _guard = span.enter();

    let mut report = SyncReport::default();

    for &kind in RecordKind::ALL {
        match sync_kind(store, engine, kind, actor) {
            Ok(count) => {
                if count > 0 {
                    engine.observer().kind_committed(kind, count);
                }
                report.record(kind.sheet_name(), count);
            }
            Err(error) => {
                engine.observer().pass_aborted(kind, &error);
                report.error = Some(error.to_string());
                break;
            }
        }
    }

    info!(
        total = report.total_synced,
        complete = report.is_complete(),
        "Sync pass finished"
    );
    report
}

fn sync_kind(
    store: &mut dyn RecordStore,
    engine: &mut SyncEngine<'_>,
    kind: RecordKind,
    actor: &str,
) -> Result<usize> {
    let records = store.unsynced(kind)?;
    if records.is_empty() {
        return Ok(0);
    }

    let ids: Vec<i64> = records
        .iter()
        .filter(|record| engine.sync_record(record).is_success())
        .map(|record| record.id)
        .collect();

    if ids.is_empty() {
        return Ok(0);
    }

    // Rows another pass flagged in the meantime are not counted
    store.commit_synced(kind, &ids, actor)
}

/// Sync one stored record and mark it synced on success.
///
/// This is the path taken right after a record is saved.
///
/// # Errors
///
/// Returns an error only if the flag cannot be written. A failed push is
/// reported as [`SyncOutcome::Failed`].
pub fn sync_saved_record(
    store: &mut dyn RecordStore,
    engine: &mut SyncEngine<'_>,
    record: &Record,
    actor: &str,
) -> Result<SyncOutcome> {
    let outcome = engine.sync_record(record);
    if outcome.is_success() && !record.synced {
        store.commit_synced(record.kind, &[record.id], actor)?;
    }
    Ok(outcome)
}
