//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for list/query commands.
#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table (default)
    #[default]
    Table,
    /// JSON (same as --json)
    Json,
}

pub mod commands;

/// DataCollect - field trial data entry with Google Sheets sync
#[derive(Parser, Debug)]
#[command(name = "datacollect", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ~/.datacollect/app.sqlite)
    #[arg(long, global = true, env = "DATACOLLECT_DB")]
    pub db: Option<PathBuf>,

    /// Actor name for audit trail
    #[arg(long, global = true, env = "DATACOLLECT_ACTOR")]
    pub actor: Option<String>,

    /// Spreadsheet id to sync to
    #[arg(long, global = true, env = "GOOGLE_SHEET_ID")]
    pub sheet_id: Option<String>,

    /// Service account key file (GOOGLE_CREDENTIALS takes precedence)
    #[arg(long, global = true, env = "DATACOLLECT_CREDENTIALS")]
    pub credentials: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Output format (table, json)
    #[arg(long, value_enum, global = true, default_value_t)]
    pub format: OutputFormat,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Spreadsheet settings shared by every command that syncs.
#[derive(Debug, Clone, Default)]
pub struct SheetOptions {
    pub sheet_id: Option<String>,
    pub credentials: Option<PathBuf>,
}

impl Cli {
    #[must_use]
    pub fn sheet_options(&self) -> SheetOptions {
        SheetOptions {
            sheet_id: self.sheet_id.clone(),
            credentials: self.credentials.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the local database
    Init {
        /// Overwrite existing database
        #[arg(long)]
        force: bool,
    },

    /// Print version information
    Version,

    /// Enter and inspect observation records
    Record {
        #[command(subcommand)]
        command: RecordCommands,
    },

    /// Sync records to Google Sheets
    Sync {
        #[command(subcommand)]
        command: SyncCommands,
    },

    /// Summary of collected data
    Dashboard,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Record Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum RecordCommands {
    /// Save a record, then sync it
    Add(AddArgs),

    /// List records of one kind, newest first
    List {
        /// Record kind (agronomic, disease, field-condition, ...)
        kind: String,

        /// Only records not yet in the sheet
        #[arg(long)]
        unsynced: bool,

        /// Maximum records to show
        #[arg(long, short = 'n', default_value = "20")]
        limit: u32,
    },

    /// Show one record
    Show {
        /// Record kind
        kind: String,

        /// Record id
        id: i64,
    },

    /// List the fields of a kind in sheet column order
    Fields {
        /// Record kind
        kind: String,
    },
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Record kind (agronomic, disease, field-condition, ...)
    pub kind: String,

    /// Field value as `name=value` (repeatable). Empty values are left blank.
    #[arg(long = "set", short = 's', value_name = "FIELD=VALUE")]
    pub fields: Vec<String>,

    /// Save only; leave the record for the next `sync all`
    #[arg(long)]
    pub no_sync: bool,
}

// ============================================================================
// Sync Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum SyncCommands {
    /// Push every unsynced record
    All,

    /// Push one record, even if it is already marked synced
    One {
        /// Record kind
        kind: String,

        /// Record id
        id: i64,
    },

    /// Show pending records per kind
    Status,
}
