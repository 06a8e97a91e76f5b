//! Database schema definitions.
//!
//! One table per observation kind, plus the audit `events` table and
//! migration bookkeeping. Column order in each observation table matches
//! the field order declared in [`crate::model::record`], which is also the
//! sheet column order.

use rusqlite::{Connection, Result};

/// Current schema version for migration tracking.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the DataCollect database.
///
/// Timestamps are stored as INTEGER (Unix milliseconds). Dates entered on
/// forms are stored as TEXT in `YYYY-MM-DD` form.
pub const SCHEMA_SQL: &str = r#"
-- ====================
-- Schema Version Tracking
-- ====================

CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at INTEGER NOT NULL
);

-- ====================
-- Observation Tables
-- ====================
--
-- synced: 0 until the record is confirmed present in its worksheet.
-- Triggers keep it from ever going back to 0.

-- Agronomic & morphological traits
CREATE TABLE IF NOT EXISTS agronomic_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    crop TEXT,
    block TEXT,
    replication TEXT,
    plot_number TEXT,
    genotype TEXT,
    days_heading INTEGER,
    days_maturity INTEGER,
    plant_height REAL,
    tillers INTEGER,
    panicle_length REAL,
    grain_yield REAL,
    grain_weight REAL,
    spikelets_total INTEGER,
    spikelets_filled INTEGER,
    fertility REAL,
    observation_date TEXT,
    observer TEXT,
    remarks TEXT,
    created_at INTEGER NOT NULL,
    synced INTEGER NOT NULL DEFAULT 0 CHECK (synced IN (0, 1))
);

CREATE INDEX IF NOT EXISTS idx_agronomic_synced ON agronomic_records(synced);
CREATE INDEX IF NOT EXISTS idx_agronomic_created ON agronomic_records(created_at DESC);

CREATE TRIGGER IF NOT EXISTS agronomic_synced_is_final
BEFORE UPDATE OF synced ON agronomic_records
WHEN OLD.synced = 1 AND NEW.synced = 0
BEGIN
    SELECT RAISE(ABORT, 'synced flag cannot be reverted');
END;

CREATE TRIGGER IF NOT EXISTS agronomic_created_at_is_final
BEFORE UPDATE OF created_at ON agronomic_records
WHEN NEW.created_at <> OLD.created_at
BEGIN
    SELECT RAISE(ABORT, 'created_at is immutable');
END;

-- Disease incidence and severity
CREATE TABLE IF NOT EXISTS disease_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    crop TEXT,
    block TEXT,
    genotype TEXT,
    replication TEXT,
    plot_number TEXT,
    panicles_t1 INTEGER,
    infected_t1 INTEGER,
    incidence_t1 REAL,
    panicles_t2 INTEGER,
    infected_t2 INTEGER,
    incidence_t2 REAL,
    panicles_t3 INTEGER,
    infected_t3 INTEGER,
    incidence_t3 REAL,
    severity_t1 INTEGER,
    severity_t2 INTEGER,
    severity_t3 INTEGER,
    days_first_symptom INTEGER,
    notes TEXT,
    created_at INTEGER NOT NULL,
    synced INTEGER NOT NULL DEFAULT 0 CHECK (synced IN (0, 1))
);

CREATE INDEX IF NOT EXISTS idx_disease_synced ON disease_records(synced);
CREATE INDEX IF NOT EXISTS idx_disease_created ON disease_records(created_at DESC);

CREATE TRIGGER IF NOT EXISTS disease_synced_is_final
BEFORE UPDATE OF synced ON disease_records
WHEN OLD.synced = 1 AND NEW.synced = 0
BEGIN
    SELECT RAISE(ABORT, 'synced flag cannot be reverted');
END;

CREATE TRIGGER IF NOT EXISTS disease_created_at_is_final
BEFORE UPDATE OF created_at ON disease_records
WHEN NEW.created_at <> OLD.created_at
BEGIN
    SELECT RAISE(ABORT, 'created_at is immutable');
END;

-- Field conditions
CREATE TABLE IF NOT EXISTS field_condition_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    crop TEXT,
    block TEXT,
    genotype TEXT,
    replication TEXT,
    date TEXT,
    location TEXT,
    soil_type TEXT,
    fertility_status TEXT,
    temp_min REAL,
    temp_max REAL,
    temp_avg REAL,
    humidity REAL,
    rainfall REAL,
    notes TEXT,
    created_at INTEGER NOT NULL,
    synced INTEGER NOT NULL DEFAULT 0 CHECK (synced IN (0, 1))
);

CREATE INDEX IF NOT EXISTS idx_field_condition_synced ON field_condition_records(synced);
CREATE INDEX IF NOT EXISTS idx_field_condition_created ON field_condition_records(created_at DESC);

CREATE TRIGGER IF NOT EXISTS field_condition_synced_is_final
BEFORE UPDATE OF synced ON field_condition_records
WHEN OLD.synced = 1 AND NEW.synced = 0
BEGIN
    SELECT RAISE(ABORT, 'synced flag cannot be reverted');
END;

CREATE TRIGGER IF NOT EXISTS field_condition_created_at_is_final
BEFORE UPDATE OF created_at ON field_condition_records
WHEN NEW.created_at <> OLD.created_at
BEGIN
    SELECT RAISE(ABORT, 'created_at is immutable');
END;

-- Greenhouse conditions
CREATE TABLE IF NOT EXISTS greenhouse_condition_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    crop TEXT,
    genotype TEXT,
    replication TEXT,
    date TEXT,
    location TEXT,
    temp_min REAL,
    temp_max REAL,
    temp_avg REAL,
    humidity REAL,
    light_intensity TEXT,
    inoculum TEXT,
    spray_timing TEXT,
    spray_frequency INTEGER,
    notes TEXT,
    created_at INTEGER NOT NULL,
    synced INTEGER NOT NULL DEFAULT 0 CHECK (synced IN (0, 1))
);

CREATE INDEX IF NOT EXISTS idx_greenhouse_condition_synced ON greenhouse_condition_records(synced);
CREATE INDEX IF NOT EXISTS idx_greenhouse_condition_created ON greenhouse_condition_records(created_at DESC);

CREATE TRIGGER IF NOT EXISTS greenhouse_condition_synced_is_final
BEFORE UPDATE OF synced ON greenhouse_condition_records
WHEN OLD.synced = 1 AND NEW.synced = 0
BEGIN
    SELECT RAISE(ABORT, 'synced flag cannot be reverted');
END;

CREATE TRIGGER IF NOT EXISTS greenhouse_condition_created_at_is_final
BEFORE UPDATE OF created_at ON greenhouse_condition_records
WHEN NEW.created_at <> OLD.created_at
BEGIN
    SELECT RAISE(ABORT, 'created_at is immutable');
END;

-- Growth (field)
CREATE TABLE IF NOT EXISTS growth_field_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    crop TEXT,
    block TEXT,
    genotype TEXT,
    replication TEXT,
    plot_number TEXT,
    days_flowering INTEGER,
    days_maturity INTEGER,
    plant_height REAL,
    tillers INTEGER,
    notes TEXT,
    created_at INTEGER NOT NULL,
    synced INTEGER NOT NULL DEFAULT 0 CHECK (synced IN (0, 1))
);

CREATE INDEX IF NOT EXISTS idx_growth_field_synced ON growth_field_records(synced);
CREATE INDEX IF NOT EXISTS idx_growth_field_created ON growth_field_records(created_at DESC);

CREATE TRIGGER IF NOT EXISTS growth_field_synced_is_final
BEFORE UPDATE OF synced ON growth_field_records
WHEN OLD.synced = 1 AND NEW.synced = 0
BEGIN
    SELECT RAISE(ABORT, 'synced flag cannot be reverted');
END;

CREATE TRIGGER IF NOT EXISTS growth_field_created_at_is_final
BEFORE UPDATE OF created_at ON growth_field_records
WHEN NEW.created_at <> OLD.created_at
BEGIN
    SELECT RAISE(ABORT, 'created_at is immutable');
END;

-- Growth (greenhouse)
CREATE TABLE IF NOT EXISTS growth_greenhouse_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    crop TEXT,
    genotype TEXT,
    replication TEXT,
    greenhouse_id TEXT,
    days_flowering INTEGER,
    days_maturity INTEGER,
    plant_height REAL,
    tillers INTEGER,
    notes TEXT,
    created_at INTEGER NOT NULL,
    synced INTEGER NOT NULL DEFAULT 0 CHECK (synced IN (0, 1))
);

CREATE INDEX IF NOT EXISTS idx_growth_greenhouse_synced ON growth_greenhouse_records(synced);
CREATE INDEX IF NOT EXISTS idx_growth_greenhouse_created ON growth_greenhouse_records(created_at DESC);

CREATE TRIGGER IF NOT EXISTS growth_greenhouse_synced_is_final
BEFORE UPDATE OF synced ON growth_greenhouse_records
WHEN OLD.synced = 1 AND NEW.synced = 0
BEGIN
    SELECT RAISE(ABORT, 'synced flag cannot be reverted');
END;

CREATE TRIGGER IF NOT EXISTS growth_greenhouse_created_at_is_final
BEFORE UPDATE OF created_at ON growth_greenhouse_records
WHEN NEW.created_at <> OLD.created_at
BEGIN
    SELECT RAISE(ABORT, 'created_at is immutable');
END;

-- Yield (field)
CREATE TABLE IF NOT EXISTS yield_field_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    crop TEXT,
    block TEXT,
    genotype TEXT,
    replication TEXT,
    plot_number TEXT,
    panicles INTEGER,
    panicle_length REAL,
    filled_grains INTEGER,
    unfilled_grains INTEGER,
    grain_weight REAL,
    yield_plant REAL,
    yield_plot REAL,
    notes TEXT,
    created_at INTEGER NOT NULL,
    synced INTEGER NOT NULL DEFAULT 0 CHECK (synced IN (0, 1))
);

CREATE INDEX IF NOT EXISTS idx_yield_field_synced ON yield_field_records(synced);
CREATE INDEX IF NOT EXISTS idx_yield_field_created ON yield_field_records(created_at DESC);

CREATE TRIGGER IF NOT EXISTS yield_field_synced_is_final
BEFORE UPDATE OF synced ON yield_field_records
WHEN OLD.synced = 1 AND NEW.synced = 0
BEGIN
    SELECT RAISE(ABORT, 'synced flag cannot be reverted');
END;

CREATE TRIGGER IF NOT EXISTS yield_field_created_at_is_final
BEFORE UPDATE OF created_at ON yield_field_records
WHEN NEW.created_at <> OLD.created_at
BEGIN
    SELECT RAISE(ABORT, 'created_at is immutable');
END;

-- Yield (greenhouse)
CREATE TABLE IF NOT EXISTS yield_greenhouse_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    crop TEXT,
    genotype TEXT,
    replication TEXT,
    greenhouse_id TEXT,
    panicles INTEGER,
    panicle_length REAL,
    filled_grains INTEGER,
    unfilled_grains INTEGER,
    grain_weight REAL,
    yield_plant REAL,
    yield_tray REAL,
    notes TEXT,
    created_at INTEGER NOT NULL,
    synced INTEGER NOT NULL DEFAULT 0 CHECK (synced IN (0, 1))
);

CREATE INDEX IF NOT EXISTS idx_yield_greenhouse_synced ON yield_greenhouse_records(synced);
CREATE INDEX IF NOT EXISTS idx_yield_greenhouse_created ON yield_greenhouse_records(created_at DESC);

CREATE TRIGGER IF NOT EXISTS yield_greenhouse_synced_is_final
BEFORE UPDATE OF synced ON yield_greenhouse_records
WHEN OLD.synced = 1 AND NEW.synced = 0
BEGIN
    SELECT RAISE(ABORT, 'synced flag cannot be reverted');
END;

CREATE TRIGGER IF NOT EXISTS yield_greenhouse_created_at_is_final
BEFORE UPDATE OF created_at ON yield_greenhouse_records
WHEN NEW.created_at <> OLD.created_at
BEGIN
    SELECT RAISE(ABORT, 'created_at is immutable');
END;

-- ====================
-- Audit Events
-- ====================

CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_type TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    event_type TEXT NOT NULL,
    actor TEXT NOT NULL,
    old_value TEXT,
    new_value TEXT,
    comment TEXT,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id);
CREATE INDEX IF NOT EXISTS idx_events_created ON events(created_at DESC);
"#;

/// Apply the schema to the database.
///
/// This uses `execute_batch` to run the entire DDL script.
/// It is idempotent because all statements use `IF NOT EXISTS`.
///
/// # Errors
///
/// Returns an error if the SQL execution fails or pragmas cannot be set.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;

    conn.execute_batch(SCHEMA_SQL)?;

    // Run migrations for databases created by older releases
    super::migrations::run_migrations(conn)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
        rusqlite::params![
            format!("v{CURRENT_SCHEMA_VERSION}"),
            chrono::Utc::now().timestamp_millis()
        ],
    )?;

    Ok(())
}
