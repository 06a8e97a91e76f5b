//! Sync command implementations (records to Google Sheets).
//!
//! One spreadsheet client is built per invocation and shared by every
//! record in the pass, so the service account authenticates once.

use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use super::{checked_sheet_client, open_storage, parse_kind, resolve_actor, sheet_client};
use crate::cli::{SheetOptions, SyncCommands};
use crate::config::{resolve_credentials, resolve_spreadsheet_id};
use crate::error::{Error, Result};
use crate::model::RecordKind;
use crate::storage::{KindCounts, SqliteStorage};
use crate::sync::{sync_all_unsynced, sync_saved_record, SyncEngine, SyncOutcome, TracingObserver};

/// Execute sync commands.
///
/// # Errors
///
/// Returns an error if the database is missing or a local query fails, and
/// a credential error from `sync one` when no usable key is configured.
/// Other spreadsheet failures are reported, not returned.
pub fn execute(
    command: &SyncCommands,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    sheets: &SheetOptions,
    json: bool,
) -> Result<()> {
    match command {
        SyncCommands::All => all(db_path, actor, sheets, json),
        SyncCommands::One { kind, id } => one(kind, *id, db_path, actor, sheets, json),
        SyncCommands::Status => status(db_path, sheets, json),
    }
}

fn pending_total(storage: &SqliteStorage) -> Result<usize> {
    RecordKind::ALL
        .iter()
        .map(|kind| storage.count_unsynced(*kind))
        .sum()
}

fn all(
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    sheets: &SheetOptions,
    json: bool,
) -> Result<()> {
    let mut storage = open_storage(db_path)?;
    let actor = resolve_actor(actor);

    let mut client = sheet_client(sheets);
    let report = {
        let mut engine = SyncEngine::new(client.as_mut(), &TracingObserver);
        sync_all_unsynced(&mut storage, &mut engine, &actor)
    };
    let pending = pending_total(&storage)?;

    if json {
        let output = serde_json::json!({
            "success": report.is_complete(),
            "report": report,
            "pending": pending,
        });
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if report.total_synced == 0 && pending == 0 && report.is_complete() {
        println!("Nothing to sync.");
        return Ok(());
    }

    if report.total_synced > 0 {
        println!("{} Synced {} records", "✓".green(), report.total_synced);
        for (sheet, count) in &report.per_variant_synced {
            println!("  {sheet:<22} {count}");
        }
    }

    if let Some(error) = &report.error {
        println!("{} Sync stopped: {error}", "✗".red());
    }

    if pending > 0 {
        println!(
            "{} {pending} records still pending; they will be retried on the next sync.",
            "●".yellow()
        );
    }
    Ok(())
}

fn one(
    kind: &str,
    id: i64,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    sheets: &SheetOptions,
    json: bool,
) -> Result<()> {
    let kind = parse_kind(kind)?;
    let mut storage = open_storage(db_path)?;
    let actor = resolve_actor(actor);

    let record = storage
        .get_record(kind, id)?
        .ok_or_else(|| Error::RecordNotFound {
            kind: kind.slug().to_string(),
            id,
        })?;

    let mut client = checked_sheet_client(sheets)?;
    let outcome = {
        let mut engine = SyncEngine::new(client.as_mut(), &TracingObserver);
        sync_saved_record(&mut storage, &mut engine, &record, &actor)?
    };

    if json {
        let output = serde_json::json!({
            "kind": kind,
            "id": id,
            "sheet": kind.sheet_name(),
            "outcome": outcome,
        });
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    let label = format!("{} record {id}", kind.sheet_name());
    match outcome {
        SyncOutcome::Synced => println!("{} {label} synced", "✓".green()),
        SyncOutcome::AlreadyPresent => {
            println!("{} {label} already in sheet", "✓".green());
        }
        SyncOutcome::Failed => {
            println!("{} {label} could not be synced (still pending)", "✗".red());
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct KindStatus {
    kind: RecordKind,
    sheet: &'static str,
    #[serde(flatten)]
    counts: KindCounts,
}

fn status(db_path: Option<&PathBuf>, sheets: &SheetOptions, json: bool) -> Result<()> {
    let storage = open_storage(db_path)?;
    let kinds = RecordKind::ALL
        .iter()
        .map(|&kind| {
            Ok(KindStatus {
                kind,
                sheet: kind.sheet_name(),
                counts: storage.kind_counts(kind)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let spreadsheet_id = resolve_spreadsheet_id(sheets.sheet_id.as_deref());
    let credentials = resolve_credentials(sheets.credentials.as_deref()).describe();
    let pending: usize = kinds.iter().map(|k| k.counts.unsynced).sum();

    if json {
        let output = serde_json::json!({
            "spreadsheet_id": spreadsheet_id,
            "credentials": credentials,
            "pending": pending,
            "kinds": kinds,
        });
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("Sync Status");
    println!("  Spreadsheet: {spreadsheet_id}");
    println!("  Credentials: {credentials}");
    println!();
    println!("  {:<22} {:>8} {:>8}", "Sheet", "Pending", "Total");
    for k in &kinds {
        let pending = if k.counts.unsynced > 0 {
            k.counts.unsynced.to_string().yellow()
        } else {
            k.counts.unsynced.to_string().normal()
        };
        println!("  {:<22} {:>8} {:>8}", k.sheet, pending, k.counts.total);
    }
    println!();
    if pending == 0 {
        println!("{} Everything is in the sheet.", "✓".green());
    } else {
        println!("Run 'datacollect sync all' to push {pending} pending records.");
    }
    Ok(())
}
