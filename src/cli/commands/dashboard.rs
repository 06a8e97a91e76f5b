//! Dashboard command implementation.

use colored::Colorize;
use std::path::PathBuf;

use super::open_storage;
use crate::dashboard;
use crate::error::Result;

/// Print the dashboard.
///
/// # Errors
///
/// Returns an error if the database is missing or a query fails.
pub fn execute(db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let storage = open_storage(db_path)?;
    let summary = dashboard::build(&storage)?;

    if json {
        println!("{}", serde_json::to_string(&summary)?);
        return Ok(());
    }

    println!("{}", "DataCollect".cyan().bold());
    println!();
    println!("  Total records:   {}", summary.total_records);
    println!("  Genotypes:       {}", summary.total_genotypes);
    println!(
        "  Last entry:      {}",
        summary.last_entry.as_deref().unwrap_or(dashboard::ABSENT)
    );
    println!();

    println!("{}", "Forms".cyan().bold());
    for kind in &summary.kinds {
        let pending = if kind.unsynced > 0 {
            format!("{} pending", kind.unsynced).yellow()
        } else {
            "synced".green()
        };
        println!("  {:<22} {:>5}  {pending}", kind.label, kind.total);
    }

    if !summary.recent_entries.is_empty() {
        println!();
        println!("{}", "Recent entries".cyan().bold());
        for entry in &summary.recent_entries {
            println!(
                "  {}  {:<22} {:<12} {}",
                entry.date.dimmed(),
                entry.label,
                entry.identifier,
                entry.observer.dimmed()
            );
        }
    }

    Ok(())
}
