//! Sync result types.

use serde::Serialize;
use std::collections::BTreeMap;

/// Result of pushing one record to its sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The row was appended.
    Synced,
    /// A row with this id was already in the sheet; nothing was written.
    AlreadyPresent,
    /// Some step failed; the record stays unsynced.
    Failed,
}

impl SyncOutcome {
    /// Whether the record may be marked synced.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Synced | Self::AlreadyPresent)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Synced => "synced",
            Self::AlreadyPresent => "already_present",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of one batch pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Records newly marked synced across all kinds.
    pub total_synced: usize,
    /// Sheet name to count; kinds with nothing synced are left out.
    pub per_variant_synced: BTreeMap<String, usize>,
    /// Set when the pass stopped early on a local storage failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncReport {
    /// Add a committed kind's count. Zero counts are not recorded.
    pub fn record(&mut self, sheet: &str, count: usize) {
        if count == 0 {
            return;
        }
        *self.per_variant_synced.entry(sheet.to_string()).or_default() += count;
        self.total_synced += count;
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_success() {
        assert!(SyncOutcome::Synced.is_success());
        assert!(SyncOutcome::AlreadyPresent.is_success());
        assert!(!SyncOutcome::Failed.is_success());
    }

    #[test]
    fn test_report_skips_zero_counts() {
        let mut report = SyncReport::default();
        report.record("Agronomic", 3);
        report.record("Disease", 0);

        assert_eq!(report.total_synced, 3);
        assert_eq!(report.per_variant_synced.len(), 1);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["per_variant_synced"]["Agronomic"], 3);
        assert!(json.get("error").is_none());
    }
}
