//! Database migrations embedded at compile time.
//!
//! Migrations are sourced from `/migrations/` at the crate root and
//! embedded into the binary using `include_str!`. This keeps the
//! binary self-contained with no runtime file dependencies.

use rusqlite::{Connection, Result};
use tracing::{info, warn};

/// A single migration with version identifier and SQL content.
struct Migration {
    version: &'static str,
    sql: &'static str,
}

/// All migrations in order, embedded at compile time.
///
/// Version names match the SQL filenames (without .sql extension).
/// The `schema_migrations` table tracks which have been applied.
const MIGRATIONS: &[Migration] = &[Migration {
    version: "001_add_trial_layout_columns",
    sql: include_str!("../../migrations/001_add_trial_layout_columns.sql"),
}];

/// Run all pending migrations on the database.
///
/// Migrations are applied in order. Already-applied migrations (tracked in
/// the `schema_migrations` table) are skipped. This is idempotent and safe
/// to call on every database open.
///
/// # Errors
///
/// Returns an error if a migration statement fails. `ALTER TABLE` statements
/// that hit an existing column are skipped with a warning, since the base
/// schema of a fresh database already carries every column.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let applied: std::collections::HashSet<String> = conn
        .prepare("SELECT version FROM schema_migrations")?
        .query_map([], |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    for migration in MIGRATIONS {
        if applied.contains(migration.version) {
            continue;
        }

        info!(version = migration.version, "Applying migration");

        let skipped = apply_statements(conn, migration.sql)?;
        if skipped > 0 {
            warn!(
                version = migration.version,
                skipped, "Migration partially applied (columns exist), marking complete"
            );
        }

        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            rusqlite::params![migration.version, chrono::Utc::now().timestamp_millis()],
        )?;

        info!(version = migration.version, "Migration complete");
    }

    Ok(())
}

/// Run each statement of `sql` on its own, skipping `ADD COLUMN`s that hit
/// an existing column. Returns the number skipped.
fn apply_statements(conn: &Connection, sql: &str) -> Result<usize> {
    let mut skipped = 0usize;
    for statement in statements(sql) {
        if let Err(e) = conn.execute_batch(&statement) {
            if e.to_string().contains("duplicate column name") {
                skipped += 1;
            } else {
                return Err(e);
            }
        }
    }
    Ok(skipped)
}

/// Split migration SQL into statements.
///
/// `--` comments are dropped first so a `;` inside one does not end a
/// statement. Migrations carry no string literals containing `--` or `;`.
fn statements(sql: &str) -> Vec<String> {
    let uncommented = sql
        .lines()
        .map(|line| line.split_once("--").map_or(line, |(code, _)| code))
        .collect::<Vec<_>>()
        .join("\n");

    uncommented
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::SCHEMA_SQL;

    fn column_names(conn: &Connection, table: &str) -> Vec<String> {
        conn.prepare(&format!("SELECT name FROM pragma_table_info('{table}')"))
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_migrations_compile() {
        // Fails to compile if an include_str! path is wrong
        assert_eq!(MIGRATIONS.len(), 1);
    }

    #[test]
    fn test_semicolon_in_comment_does_not_split() {
        let sql = "-- Columns from the base schema; each one is skipped\n\
                   ALTER TABLE t ADD COLUMN b TEXT; -- trailing; note\n\
                   \n\
                   ALTER TABLE t ADD COLUMN c TEXT;\n";
        assert_eq!(
            statements(sql),
            ["ALTER TABLE t ADD COLUMN b TEXT", "ALTER TABLE t ADD COLUMN c TEXT"]
        );

        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (a TEXT, b TEXT)").unwrap();
        assert_eq!(apply_statements(&conn, sql).unwrap(), 1);
        assert_eq!(column_names(&conn, "t"), ["a", "b", "c"]);
    }

    #[test]
    fn test_shipped_migrations_split_cleanly() {
        for migration in MIGRATIONS {
            for statement in statements(migration.sql) {
                assert!(
                    statement.starts_with("ALTER TABLE"),
                    "{}: unexpected statement {statement:?}",
                    migration.version
                );
            }
        }
    }

    #[test]
    fn test_run_migrations_fresh_db() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_SQL).expect("Base schema should apply");
        run_migrations(&conn).expect("Migrations should apply to fresh database");

        let count: i32 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_run_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();

        run_migrations(&conn).expect("First run should succeed");
        run_migrations(&conn).expect("Second run should succeed (idempotent)");

        let count: i32 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_adds_layout_columns_to_first_season_tables() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();

        // Rebuild one table the way the first release created it
        conn.execute_batch(
            "DROP TABLE growth_greenhouse_records;
             CREATE TABLE growth_greenhouse_records (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 genotype TEXT,
                 replication TEXT,
                 greenhouse_id TEXT,
                 days_flowering INTEGER,
                 days_maturity INTEGER,
                 plant_height REAL,
                 tillers INTEGER,
                 notes TEXT,
                 created_at INTEGER NOT NULL,
                 synced INTEGER NOT NULL DEFAULT 0
             );",
        )
        .unwrap();
        assert!(!column_names(&conn, "growth_greenhouse_records").contains(&"crop".to_string()));

        run_migrations(&conn).unwrap();

        assert!(column_names(&conn, "growth_greenhouse_records").contains(&"crop".to_string()));
    }
}
