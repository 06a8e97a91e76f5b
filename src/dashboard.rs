//! Dashboard summary of the local database.
//!
//! Counts per kind, pending sync counts, the newest entry and a short list
//! of recent entries across all kinds. Times are shown in the trial site's
//! zone.

use chrono::DateTime;
use serde::Serialize;

use crate::error::Result;
use crate::model::{field_timezone, Record, RecordKind};
use crate::storage::SqliteStorage;

/// Display format for entry times.
pub const ENTRY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Shown when an identifier or observer is blank.
pub const ABSENT: &str = "—";

/// Shown for kinds that have no observer field.
pub const NOT_RECORDED: &str = "-";

/// Recent entries taken from each kind before merging.
const RECENT_PER_KIND: u32 = 3;

/// Recent entries kept after merging.
const RECENT_TOTAL: usize = 5;

/// Counts for one record kind.
#[derive(Debug, Clone, Serialize)]
pub struct KindSummary {
    pub kind: RecordKind,
    pub label: &'static str,
    pub total: usize,
    pub unsynced: usize,
}

/// One line of the recent entries list.
#[derive(Debug, Clone, Serialize)]
pub struct RecentEntry {
    pub kind: RecordKind,
    pub label: &'static str,
    pub id: i64,
    pub identifier: String,
    pub observer: String,
    pub date: String,
    #[serde(skip)]
    created_at: i64,
}

impl RecentEntry {
    fn from_record(record: &Record) -> Self {
        let kind = record.kind;
        let text = |field: &str| {
            record
                .field(field)
                .map(|v| v.to_cell())
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| ABSENT.to_string())
        };

        // Only agronomic forms record who observed
        let observer = if kind == RecordKind::Agronomic {
            text("observer")
        } else {
            NOT_RECORDED.to_string()
        };

        Self {
            kind,
            label: kind.sheet_name(),
            id: record.id,
            identifier: text(kind.identifier_field()),
            observer,
            date: format_entry_time(record.created_at).unwrap_or_default(),
            created_at: record.created_at,
        }
    }
}

/// Everything the dashboard shows.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub kinds: Vec<KindSummary>,
    pub total_records: usize,
    pub total_unsynced: usize,
    /// One agronomic record is taken per genotype.
    pub total_genotypes: usize,
    pub last_entry: Option<String>,
    pub recent_entries: Vec<RecentEntry>,
}

/// Format Unix milliseconds in the site's zone.
#[must_use]
pub fn format_entry_time(millis: i64) -> Option<String> {
    DateTime::from_timestamp_millis(millis).map(|dt| {
        dt.with_timezone(&field_timezone())
            .format(ENTRY_TIME_FORMAT)
            .to_string()
    })
}

/// Build the dashboard from the local database.
///
/// # Errors
///
/// Returns an error if any query fails.
pub fn build(storage: &SqliteStorage) -> Result<Dashboard> {
    let mut kinds = Vec::with_capacity(RecordKind::ALL.len());
    let mut latest: Option<i64> = None;
    let mut recent = Vec::new();

    for &kind in RecordKind::ALL {
        let counts = storage.kind_counts(kind)?;
        kinds.push(KindSummary {
            kind,
            label: kind.sheet_name(),
            total: counts.total,
            unsynced: counts.unsynced,
        });

        if let Some(at) = storage.latest_created_at(kind)? {
            latest = Some(latest.map_or(at, |l| l.max(at)));
        }

        recent.extend(
            storage
                .recent_records(kind, RECENT_PER_KIND)?
                .iter()
                .map(RecentEntry::from_record),
        );
    }

    // Stable: equal times keep kind order
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent.truncate(RECENT_TOTAL);

    let total_genotypes = kinds
        .iter()
        .find(|k| k.kind == RecordKind::Agronomic)
        .map_or(0, |k| k.total);

    Ok(Dashboard {
        total_records: kinds.iter().map(|k| k.total).sum(),
        total_unsynced: kinds.iter().map(|k| k.unsynced).sum(),
        total_genotypes,
        last_entry: latest.and_then(format_entry_time),
        recent_entries: recent,
        kinds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Observation;

    fn insert(storage: &mut SqliteStorage, kind: RecordKind, fields: &[(&str, &str)]) -> Record {
        let mut obs = Observation::empty(kind);
        for (name, value) in fields {
            obs.set_field(name, value).unwrap();
        }
        storage.insert_record(obs, "tester").unwrap()
    }

    #[test]
    fn test_empty_database() {
        let storage = SqliteStorage::open_memory().unwrap();
        let dashboard = build(&storage).unwrap();

        assert_eq!(dashboard.kinds.len(), 8);
        assert_eq!(dashboard.total_records, 0);
        assert_eq!(dashboard.total_genotypes, 0);
        assert!(dashboard.last_entry.is_none());
        assert!(dashboard.recent_entries.is_empty());
    }

    #[test]
    fn test_counts_and_genotypes() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let first = insert(&mut storage, RecordKind::Agronomic, &[("plot_number", "P1")]);
        insert(&mut storage, RecordKind::Agronomic, &[("plot_number", "P2")]);
        insert(&mut storage, RecordKind::Disease, &[("plot_number", "P1")]);
        storage
            .mark_synced(RecordKind::Agronomic, &[first.id], "tester")
            .unwrap();

        let dashboard = build(&storage).unwrap();
        assert_eq!(dashboard.total_records, 3);
        assert_eq!(dashboard.total_unsynced, 2);
        assert_eq!(dashboard.total_genotypes, 2);
        assert_eq!(dashboard.kinds[0].unsynced, 1);
        assert!(dashboard.last_entry.is_some());
    }

    #[test]
    fn test_recent_entries_labels_and_placeholders() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        insert(
            &mut storage,
            RecordKind::Agronomic,
            &[("plot_number", "P7"), ("observer", "Okello")],
        );
        insert(&mut storage, RecordKind::Agronomic, &[]);
        insert(&mut storage, RecordKind::GrowthGreenhouse, &[("greenhouse_id", "GH-3")]);

        let dashboard = build(&storage).unwrap();
        let entries = &dashboard.recent_entries;
        assert_eq!(entries.len(), 3);

        let named = entries.iter().find(|e| e.identifier == "P7").unwrap();
        assert_eq!(named.label, "Agronomic");
        assert_eq!(named.observer, "Okello");

        let blank = entries
            .iter()
            .find(|e| e.kind == RecordKind::Agronomic && e.identifier == ABSENT)
            .unwrap();
        assert_eq!(blank.observer, ABSENT);

        let greenhouse = entries.iter().find(|e| e.identifier == "GH-3").unwrap();
        assert_eq!(greenhouse.label, "Growth (Greenhouse)");
        assert_eq!(greenhouse.observer, NOT_RECORDED);
    }

    #[test]
    fn test_recent_entries_capped() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        for &kind in RecordKind::ALL {
            for _ in 0..4 {
                insert(&mut storage, kind, &[]);
            }
        }

        let dashboard = build(&storage).unwrap();
        assert_eq!(dashboard.recent_entries.len(), RECENT_TOTAL);
        assert!(dashboard
            .recent_entries
            .windows(2)
            .all(|w| w[0].created_at >= w[1].created_at));
    }

    #[test]
    fn test_entry_time_in_site_zone() {
        // 2024-03-01 09:30 UTC is 12:30 in Kampala
        let millis = 1_709_285_400_000;
        assert_eq!(format_entry_time(millis).unwrap(), "2024-03-01 12:30");
    }
}
