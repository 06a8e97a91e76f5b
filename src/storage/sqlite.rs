//! SQLite storage implementation.
//!
//! This module provides the record store for DataCollect. It follows the
//! MutationContext pattern: every write runs inside an IMMEDIATE
//! transaction and writes its audit events before committing.

use crate::error::{Error, Result};
use crate::model::{FieldValue, Observation, Record, RecordKind};
use crate::storage::events::{insert_event, Event, EventType};
use crate::storage::schema::apply_schema;
use rusqlite::{Connection, OptionalExtension, Transaction};
use std::path::Path;
use std::time::Duration;

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

/// Context for a mutation operation, tracking side effects.
///
/// Passed to mutation closures to collect audit events that are written
/// at the end of the transaction.
pub struct MutationContext {
    /// Name of the operation being performed.
    pub op_name: String,
    /// Actor performing the operation (user, device, etc.).
    pub actor: String,
    /// Events to write at the end of the transaction.
    pub events: Vec<Event>,
}

impl MutationContext {
    /// Create a new mutation context.
    #[must_use]
    pub fn new(op_name: &str, actor: &str) -> Self {
        Self {
            op_name: op_name.to_string(),
            actor: actor.to_string(),
            events: Vec::new(),
        }
    }

    /// Record an event for this operation.
    pub fn record_event(&mut self, kind: RecordKind, id: i64, event_type: EventType) {
        self.events.push(
            Event::new(kind.slug(), &id.to_string(), event_type, &self.actor)
                .with_comment(&self.op_name),
        );
    }
}

/// Total and unsynced counts for one record kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct KindCounts {
    pub total: usize,
    pub unsynced: usize,
}

impl SqliteStorage {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Default 5 second timeout
        let timeout = timeout_ms.map_or(Duration::from_secs(5), Duration::from_millis);
        conn.busy_timeout(timeout)?;

        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Get a reference to the underlying connection (for read operations).
    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Execute a mutation with the transaction protocol.
    ///
    /// This method:
    /// 1. Begins an IMMEDIATE transaction (for write locking)
    /// 2. Executes the mutation closure
    /// 3. Writes audit events
    /// 4. Commits (or rolls back on error)
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails. The transaction is rolled back on error.
    pub fn mutate<F, R>(&mut self, op: &str, actor: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction, &mut MutationContext) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let mut ctx = MutationContext::new(op, actor);

        // Dropping `tx` on the error path rolls back
        let result = f(&tx, &mut ctx)?;

        for event in &ctx.events {
            insert_event(&tx, event)?;
        }

        tx.commit()?;

        Ok(result)
    }

    // =================
    // Record Operations
    // =================

    /// Insert a new record.
    ///
    /// The identifier is assigned by SQLite and the creation time is taken
    /// now. The record starts unsynced.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_record(&mut self, observation: Observation, actor: &str) -> Result<Record> {
        let kind = observation.kind();
        let created_at = chrono::Utc::now().timestamp_millis();

        let fields = kind.fields();
        let placeholders = (1..=fields.len() + 1)
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}, created_at, synced) VALUES ({placeholders}, 0)",
            kind.table(),
            fields.join(", "),
        );

        let mut params = observation.values();
        params.push(FieldValue::Integer(created_at));

        let id = self.mutate("insert_record", actor, |tx, ctx| {
            tx.execute(&sql, rusqlite::params_from_iter(params.iter()))?;
            let id = tx.last_insert_rowid();
            ctx.record_event(kind, id, EventType::RecordCreated);
            Ok(id)
        })?;

        Ok(Record {
            id,
            kind,
            created_at,
            synced: false,
            observation,
        })
    }

    /// Get a record by kind and ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_record(&self, kind: RecordKind, id: i64) -> Result<Option<Record>> {
        let sql = format!("{} WHERE id = ?1", select_sql(kind));
        let record = self
            .conn
            .query_row(&sql, [id], |row| map_record_row(kind, row))
            .optional()?;
        Ok(record)
    }

    /// List records of one kind, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_records(
        &self,
        kind: RecordKind,
        unsynced_only: bool,
        limit: Option<u32>,
    ) -> Result<Vec<Record>> {
        let filter = if unsynced_only { "WHERE synced = 0" } else { "" };
        let sql = format!(
            "{} {filter} ORDER BY created_at DESC, id DESC LIMIT ?1",
            select_sql(kind)
        );
        let limit = limit.map_or(-1, i64::from);
        self.query_records(kind, &sql, limit)
    }

    /// Records of one kind that have not been confirmed in their sheet,
    /// in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_unsynced_records(&self, kind: RecordKind) -> Result<Vec<Record>> {
        let sql = format!("{} WHERE synced = 0 ORDER BY id ASC LIMIT ?1", select_sql(kind));
        self.query_records(kind, &sql, -1)
    }

    /// The `limit` most recently created records of one kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn recent_records(&self, kind: RecordKind, limit: u32) -> Result<Vec<Record>> {
        self.list_records(kind, false, Some(limit))
    }

    fn query_records(&self, kind: RecordKind, sql: &str, limit: i64) -> Result<Vec<Record>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([limit], |row| map_record_row(kind, row))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    /// Mark records as synced in one transaction.
    ///
    /// Records that are already synced are left alone. Returns the number of
    /// records whose flag changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails; no flag is changed in that case.
    pub fn mark_synced(&mut self, kind: RecordKind, ids: &[i64], actor: &str) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "UPDATE {} SET synced = 1 WHERE id = ?1 AND synced = 0",
            kind.table()
        );

        self.mutate("mark_synced", actor, |tx, _ctx| {
            let mut stmt = tx.prepare(&sql)?;
            let mut changed = 0;
            for &id in ids {
                changed += stmt.execute([id])?;
            }
            Ok(changed)
        })
    }

    // ================
    // Count Operations
    // ================

    /// Count all records of one kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_records(&self, kind: RecordKind) -> Result<usize> {
        self.count(kind, "")
    }

    /// Count unsynced records of one kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_unsynced(&self, kind: RecordKind) -> Result<usize> {
        self.count(kind, "WHERE synced = 0")
    }

    /// Total and unsynced counts for one kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn kind_counts(&self, kind: RecordKind) -> Result<KindCounts> {
        Ok(KindCounts {
            total: self.count_records(kind)?,
            unsynced: self.count_unsynced(kind)?,
        })
    }

    fn count(&self, kind: RecordKind, filter: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {} {filter}", kind.table()),
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Creation time of the newest record of one kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn latest_created_at(&self, kind: RecordKind) -> Result<Option<i64>> {
        let latest = self.conn.query_row(
            &format!("SELECT MAX(created_at) FROM {}", kind.table()),
            [],
            |row| row.get(0),
        )?;
        Ok(latest)
    }
}

fn select_sql(kind: RecordKind) -> String {
    format!(
        "SELECT id, {}, created_at, synced FROM {}",
        kind.fields().join(", "),
        kind.table()
    )
}

fn map_record_row(kind: RecordKind, row: &rusqlite::Row) -> rusqlite::Result<Record> {
    let field_count = kind.fields().len();
    let values = (1..=field_count)
        .map(|i| row.get::<_, FieldValue>(i))
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(Record {
        id: row.get(0)?,
        kind,
        created_at: row.get(field_count + 1)?,
        synced: row.get(field_count + 2)?,
        observation: Observation::from_values(kind, values),
    })
}
