//! Record command implementations.
//!
//! `record add` is the form submission: it saves the record, then pushes it
//! to the kind's worksheet straight away. A failed push leaves the record
//! pending for the next `sync all`.

use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use super::{open_storage, parse_kind, resolve_actor, sheet_client};
use crate::cli::{AddArgs, RecordCommands, SheetOptions};
use crate::error::{Error, Result};
use crate::model::{Observation, Record, RecordKind};
use crate::sync::{sync_saved_record, SyncEngine, SyncOutcome, TracingObserver};

#[derive(Serialize)]
struct AddOutput<'a> {
    record: &'a Record,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<SyncOutcome>,
}

/// Execute record commands.
///
/// # Errors
///
/// Returns an error if the database is missing, the kind or a field is
/// unknown, a value does not parse, or a query fails.
pub fn execute(
    command: &RecordCommands,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    sheets: &SheetOptions,
    json: bool,
) -> Result<()> {
    match command {
        RecordCommands::Add(args) => add(args, db_path, actor, sheets, json),
        RecordCommands::List {
            kind,
            unsynced,
            limit,
        } => list(kind, *unsynced, *limit, db_path, json),
        RecordCommands::Show { kind, id } => show(kind, *id, db_path, json),
        RecordCommands::Fields { kind } => fields(kind, json),
    }
}

/// Build an observation from `name=value` pairs.
fn parse_assignments(kind: RecordKind, assignments: &[String]) -> Result<Observation> {
    let mut observation = Observation::empty(kind);
    for assignment in assignments {
        let (name, value) = assignment.split_once('=').ok_or_else(|| {
            Error::InvalidArgument(format!("expected FIELD=VALUE, got '{assignment}'"))
        })?;
        observation.set_field(name.trim(), value)?;
    }
    Ok(observation)
}

fn add(
    args: &AddArgs,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    sheets: &SheetOptions,
    json: bool,
) -> Result<()> {
    let kind = parse_kind(&args.kind)?;
    let observation = parse_assignments(kind, &args.fields)?;

    let mut storage = open_storage(db_path)?;
    let actor = resolve_actor(actor);
    let mut record = storage.insert_record(observation, &actor)?;

    let outcome = if args.no_sync {
        None
    } else {
        let mut client = sheet_client(sheets);
        let mut engine = SyncEngine::new(client.as_mut(), &TracingObserver);
        let outcome = sync_saved_record(&mut storage, &mut engine, &record, &actor)?;
        record.synced = outcome.is_success();
        Some(outcome)
    };

    if json {
        let output = AddOutput {
            record: &record,
            outcome,
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    let label = format!("{} record {}", kind.sheet_name(), record.id);
    if record.synced {
        println!("{} {label} saved & synced", "✓".green());
    } else {
        println!("{} {label} saved (pending sync)", "●".yellow());
        if outcome == Some(SyncOutcome::Failed) {
            println!(
                "  {}",
                "Could not reach the spreadsheet; run `datacollect sync all` later.".dimmed()
            );
        }
    }
    Ok(())
}

fn list(
    kind: &str,
    unsynced: bool,
    limit: u32,
    db_path: Option<&PathBuf>,
    json: bool,
) -> Result<()> {
    let kind = parse_kind(kind)?;
    let storage = open_storage(db_path)?;
    let records = storage.list_records(kind, unsynced, Some(limit))?;

    if json {
        let output = serde_json::json!({
            "kind": kind,
            "count": records.len(),
            "records": records,
        });
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No {} records.", kind.sheet_name());
        return Ok(());
    }

    let identifier = kind.identifier_field();
    println!("{} records ({}):", kind.sheet_name(), records.len());
    println!();
    for record in &records {
        let marker = if record.synced {
            "✓".green()
        } else {
            "●".yellow()
        };
        let created = record
            .created_local()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let ident = record
            .field(identifier)
            .map(|v| v.to_cell())
            .unwrap_or_default();
        println!(
            "  {marker} {:>5}  {}  {identifier}: {}",
            record.id,
            created.dimmed(),
            if ident.is_empty() { "—" } else { ident.as_str() }
        );
    }
    Ok(())
}

fn show(kind: &str, id: i64, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let kind = parse_kind(kind)?;
    let storage = open_storage(db_path)?;
    let record = storage
        .get_record(kind, id)?
        .ok_or_else(|| Error::RecordNotFound {
            kind: kind.slug().to_string(),
            id,
        })?;

    if json {
        println!("{}", serde_json::to_string(&record)?);
        return Ok(());
    }

    println!("{} #{}", kind.sheet_name().bold(), record.id);
    if let Some(created) = record.created_local() {
        println!("  {:<20} {}", "created", created.format("%Y-%m-%d %H:%M"));
    }
    let status = if record.synced {
        "synced".green()
    } else {
        "pending".yellow()
    };
    println!("  {:<20} {status}", "sheet");
    println!();
    for (name, value) in kind.fields().iter().zip(record.observation.values()) {
        let cell = value.to_cell();
        if cell.is_empty() {
            println!("  {name:<20} {}", "—".dimmed());
        } else {
            println!("  {name:<20} {cell}");
        }
    }
    Ok(())
}

fn fields(kind: &str, json: bool) -> Result<()> {
    let kind = parse_kind(kind)?;
    let columns = kind.sheet_columns();

    if json {
        let output = serde_json::json!({
            "kind": kind,
            "sheet": kind.sheet_name(),
            "columns": columns,
        });
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("{} ({})", kind.sheet_name().bold(), kind.slug());
    for (i, column) in columns.iter().enumerate() {
        println!("  {:>2}. {column}", i + 1);
    }
    Ok(())
}
