//! Error types for DataCollect.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=db, 3=not_found, 4=validation, etc.)
//! - Retryability flags for scripted callers
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

use crate::sheets::SheetError;

/// Result type alias for DataCollect operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on the string or on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database (exit 2)
    NotInitialized,
    AlreadyInitialized,
    DatabaseError,

    // Not Found (exit 3)
    RecordNotFound,

    // Validation (exit 4)
    UnknownKind,
    UnknownField,
    InvalidField,
    InvalidArgument,

    // Sync (exit 6)
    CredentialError,
    SheetsError,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::RecordNotFound => "RECORD_NOT_FOUND",
            Self::UnknownKind => "UNKNOWN_KIND",
            Self::UnknownField => "UNKNOWN_FIELD",
            Self::InvalidField => "INVALID_FIELD",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::CredentialError => "CREDENTIAL_ERROR",
            Self::SheetsError => "SHEETS_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized | Self::AlreadyInitialized | Self::DatabaseError => 2,
            Self::RecordNotFound => 3,
            Self::UnknownKind
            | Self::UnknownField
            | Self::InvalidField
            | Self::InvalidArgument => 4,
            Self::CredentialError | Self::SheetsError => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether a caller should retry.
    ///
    /// True for validation errors (retry with corrected input) and for
    /// transient spreadsheet failures (retry later; the next sync pass
    /// picks the record up again).
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::UnknownKind
                | Self::UnknownField
                | Self::InvalidField
                | Self::InvalidArgument
                | Self::DatabaseError
                | Self::SheetsError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in DataCollect operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `datacollect init` first")]
    NotInitialized,

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("{kind} record not found: {id}")]
    RecordNotFound { kind: String, id: i64 },

    #[error("Unknown record kind: {0}")]
    UnknownKind(String),

    #[error("Unknown field '{field}' for {kind} records")]
    UnknownField { kind: String, field: String },

    #[error("Invalid value for '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Sheets error: {0}")]
    Sheets(#[from] SheetError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::RecordNotFound { .. } => ErrorCode::RecordNotFound,
            Self::UnknownKind(_) => ErrorCode::UnknownKind,
            Self::UnknownField { .. } => ErrorCode::UnknownField,
            Self::InvalidField { .. } => ErrorCode::InvalidField,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Sheets(SheetError::Credentials(_)) => ErrorCode::CredentialError,
            Self::Sheets(_) => ErrorCode::SheetsError,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => {
                Some("Run `datacollect init` to create the local database".to_string())
            }

            Self::AlreadyInitialized { path } => Some(format!(
                "Database already exists at {}. Use `--force` to reinitialize.",
                path.display()
            )),

            Self::RecordNotFound { kind, .. } => Some(format!(
                "Use `datacollect record list {kind}` to see available records."
            )),

            Self::UnknownKind(_) => Some(format!(
                "Valid kinds: {}",
                crate::model::RecordKind::ALL
                    .iter()
                    .map(|k| k.slug())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),

            Self::UnknownField { kind, .. } => crate::model::RecordKind::from_slug(kind)
                .map(|k| format!("Fields for {kind}: {}", k.fields().join(", "))),

            Self::Sheets(SheetError::Credentials(_)) => Some(
                "Set GOOGLE_CREDENTIALS to the service account JSON, \
                 or place credentials.json in the data directory. \
                 Records stay saved locally and sync on the next pass."
                    .to_string(),
            ),

            Self::Sheets(_) => Some(
                "The record is saved locally. Run `datacollect sync all` to retry.".to_string(),
            ),

            Self::InvalidField { .. }
            | Self::InvalidArgument(_)
            | Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Config(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_errors_map_to_sync_category() {
        let err = Error::from(SheetError::Credentials("missing".into()));
        assert_eq!(err.error_code(), ErrorCode::CredentialError);
        assert_eq!(err.exit_code(), 6);
        assert!(!err.error_code().is_retryable());
        assert!(err.hint().is_some());
    }

    #[test]
    fn test_structured_json_includes_hint() {
        let err = Error::UnknownKind("weather".into());
        let json = err.to_structured_json();
        assert_eq!(json["error"]["code"], "UNKNOWN_KIND");
        assert_eq!(json["error"]["exit_code"], 4);
        assert!(json["error"]["hint"].as_str().unwrap().contains("agronomic"));
    }

    #[test]
    fn test_record_not_found_hint_names_kind() {
        let err = Error::RecordNotFound {
            kind: "disease".into(),
            id: 7,
        };
        assert_eq!(err.to_string(), "disease record not found: 7");
        assert!(err.hint().unwrap().contains("record list disease"));
    }
}
