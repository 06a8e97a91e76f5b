//! Configuration management.
//!
//! This module resolves where DataCollect keeps its data and how it
//! reaches the spreadsheet:
//! - **Database**: `~/.datacollect/app.sqlite` unless overridden
//! - **Spreadsheet**: the trial workbook id, overridable per run
//! - **Credentials**: a Google service-account key, inline or on disk
//!
//! Every value follows the same priority: explicit flag, then environment,
//! then the default location.

use std::path::{Path, PathBuf};

use crate::sheets::credentials::{CredentialSource, CREDENTIALS_ENV};
use crate::sheets::google::DEFAULT_SPREADSHEET_ID;

/// Environment variable overriding the database path.
pub const DB_ENV: &str = "DATACOLLECT_DB";

/// Environment variable enabling the isolated test database.
pub const TEST_DB_ENV: &str = "DC_TEST_DB";

/// Environment variable overriding the spreadsheet id.
pub const SHEET_ID_ENV: &str = "GOOGLE_SHEET_ID";

/// Environment variable naming a service-account key file.
pub const CREDENTIALS_FILE_ENV: &str = "DATACOLLECT_CREDENTIALS";

/// Environment variable naming the actor recorded in audit events.
pub const ACTOR_ENV: &str = "DATACOLLECT_ACTOR";

const DB_FILE: &str = "app.sqlite";
const CREDENTIALS_FILE: &str = "credentials.json";

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// The DataCollect data directory, `~/.datacollect/`.
#[must_use]
pub fn data_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".datacollect"))
}

/// Check if test mode is enabled.
///
/// Test mode is enabled by setting `DC_TEST_DB=1` (or any value other than
/// `0`/`false`). It redirects the database to an isolated file.
#[must_use]
pub fn is_test_mode() -> bool {
    env_var(TEST_DB_ENV).is_some_and(|v| is_truthy(&v))
}

fn is_truthy(value: &str) -> bool {
    value != "0" && !value.eq_ignore_ascii_case("false")
}

/// Get the test database path, `~/.datacollect/test/app.sqlite`.
#[must_use]
pub fn test_db_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("test").join(DB_FILE))
}

/// Resolve the database path.
///
/// Priority:
/// 1. `explicit_path` (the `--db` flag)
/// 2. `DC_TEST_DB` → test database
/// 3. `DATACOLLECT_DB`
/// 4. `~/.datacollect/app.sqlite`
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if is_test_mode() {
        return test_db_path();
    }

    if let Some(path) = env_var(DB_ENV) {
        return Some(PathBuf::from(path));
    }

    data_dir().map(|dir| dir.join(DB_FILE))
}

/// Resolve the spreadsheet id: flag, then `GOOGLE_SHEET_ID`, then the
/// trial workbook.
#[must_use]
pub fn resolve_spreadsheet_id(explicit: Option<&str>) -> String {
    explicit
        .filter(|id| !id.trim().is_empty())
        .map(str::to_string)
        .or_else(|| env_var(SHEET_ID_ENV))
        .unwrap_or_else(|| DEFAULT_SPREADSHEET_ID.to_string())
}

/// Resolve the service-account key source.
///
/// Priority:
/// 1. `GOOGLE_CREDENTIALS` holding the key JSON itself
/// 2. `explicit_file` (the `--credentials` flag)
/// 3. `DATACOLLECT_CREDENTIALS`
/// 4. `credentials.json` in the working directory
/// 5. `~/.datacollect/credentials.json`
#[must_use]
pub fn resolve_credentials(explicit_file: Option<&Path>) -> CredentialSource {
    let cwd_file = PathBuf::from(CREDENTIALS_FILE);
    let home_file = data_dir().map(|dir| dir.join(CREDENTIALS_FILE));

    let file = explicit_file
        .map(Path::to_path_buf)
        .or_else(|| env_var(CREDENTIALS_FILE_ENV).map(PathBuf::from))
        .or_else(|| cwd_file.is_file().then_some(cwd_file))
        .or_else(|| home_file.filter(|p| p.is_file()));

    CredentialSource::resolve(env_var(CREDENTIALS_ENV), file)
}

/// Get the default actor name.
///
/// Priority:
/// 1. `DATACOLLECT_ACTOR` environment variable
/// 2. System username
/// 3. "unknown"
#[must_use]
pub fn default_actor() -> String {
    env_var(ACTOR_ENV)
        .or_else(|| env_var("USER"))
        .or_else(|| env_var("USERNAME"))
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_actor() {
        let actor = default_actor();
        assert!(!actor.is_empty());
    }

    #[test]
    fn test_resolve_db_path_with_explicit() {
        let explicit = PathBuf::from("/custom/path/app.sqlite");
        let result = resolve_db_path(Some(&explicit));
        assert_eq!(result, Some(explicit));
    }

    #[test]
    fn test_test_db_path_is_separate() {
        let dir = data_dir().unwrap();
        let test = test_db_path().unwrap();

        assert!(test.ends_with("test/app.sqlite"));
        assert_ne!(dir.join(DB_FILE), test);
    }

    #[test]
    fn test_truthy_values() {
        for value in ["1", "true", "yes"] {
            assert!(is_truthy(value), "{value}");
        }
        for value in ["0", "false", "FALSE"] {
            assert!(!is_truthy(value), "{value}");
        }
    }

    #[test]
    fn test_explicit_spreadsheet_id_wins() {
        assert_eq!(resolve_spreadsheet_id(Some("abc123")), "abc123");
        // A blank flag falls through to env or the default
        assert!(!resolve_spreadsheet_id(Some("  ")).trim().is_empty());
    }

    #[test]
    fn test_explicit_credentials_file_used_without_inline_key() {
        let path = PathBuf::from("/tmp/datacollect-test-key.json");
        let source = resolve_credentials(Some(&path));
        match source {
            CredentialSource::File(p) => assert_eq!(p, path),
            // GOOGLE_CREDENTIALS set in the environment takes over
            CredentialSource::Inline(_) => {}
            CredentialSource::Missing => panic!("explicit file ignored"),
        }
    }
}
