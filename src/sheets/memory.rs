//! In-memory spreadsheet.
//!
//! Behaves like a spreadsheet whose worksheets are plain row vectors. It
//! counts every call and can be told to fail, which is what the sync
//! tests need to check header-once and partial-failure behavior.

use std::collections::{BTreeMap, HashSet};

use super::{SheetClient, SheetError, SheetResult};

/// Number of calls made per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub header: usize,
    pub insert_row: usize,
    pub column_values: usize,
    pub append_row: usize,
}

impl CallCounts {
    /// Calls that wrote to a sheet.
    #[must_use]
    pub const fn writes(&self) -> usize {
        self.insert_row + self.append_row
    }
}

/// Spreadsheet held in memory.
#[derive(Debug, Default)]
pub struct MemorySheetClient {
    sheets: BTreeMap<String, Vec<Vec<String>>>,
    calls: CallCounts,
    unauthenticated: bool,
    failing_sheets: HashSet<String>,
    // First cell values whose append is refused
    failing_ids: HashSet<String>,
}

impl MemorySheetClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A client whose every call fails as if no key were configured.
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self {
            unauthenticated: true,
            ..Self::default()
        }
    }

    /// Make every call against `sheet` fail with an API error.
    pub fn fail_sheet(&mut self, sheet: &str) {
        self.failing_sheets.insert(sheet.to_string());
    }

    /// Stop failing calls against `sheet`.
    pub fn restore_sheet(&mut self, sheet: &str) {
        self.failing_sheets.remove(sheet);
    }

    /// Refuse appends of rows whose first cell is `id`.
    pub fn fail_append_of(&mut self, id: &str) {
        self.failing_ids.insert(id.to_string());
    }

    /// Put a row at the bottom of `sheet` without counting a call.
    pub fn seed_row(&mut self, sheet: &str, row: Vec<String>) {
        self.sheets.entry(sheet.to_string()).or_default().push(row);
    }

    /// All rows of `sheet`, header included.
    #[must_use]
    pub fn rows(&self, sheet: &str) -> &[Vec<String>] {
        self.sheets.get(sheet).map(Vec::as_slice).unwrap_or_default()
    }

    /// Rows of `sheet` whose first cell is `id`.
    #[must_use]
    pub fn rows_with_id(&self, sheet: &str, id: &str) -> usize {
        self.rows(sheet)
            .iter()
            .filter(|row| row.first().is_some_and(|cell| cell == id))
            .count()
    }

    #[must_use]
    pub const fn calls(&self) -> CallCounts {
        self.calls
    }

    fn check(&self, sheet: &str) -> SheetResult<()> {
        if self.unauthenticated {
            return Err(SheetError::Credentials("no service account key".into()));
        }
        if self.failing_sheets.contains(sheet) {
            return Err(SheetError::Api {
                status: 503,
                message: format!("{sheet} is unavailable"),
            });
        }
        Ok(())
    }
}

impl SheetClient for MemorySheetClient {
    fn header(&mut self, sheet: &str) -> SheetResult<Vec<String>> {
        self.calls.header += 1;
        self.check(sheet)?;
        Ok(self.rows(sheet).first().cloned().unwrap_or_default())
    }

    fn insert_row(&mut self, sheet: &str, row: &[String], index: usize) -> SheetResult<()> {
        self.calls.insert_row += 1;
        self.check(sheet)?;
        let rows = self.sheets.entry(sheet.to_string()).or_default();
        let at = index.saturating_sub(1).min(rows.len());
        rows.insert(at, row.to_vec());
        Ok(())
    }

    fn column_values(&mut self, sheet: &str, column: usize) -> SheetResult<Vec<String>> {
        self.calls.column_values += 1;
        self.check(sheet)?;
        let Some(offset) = column.checked_sub(1) else {
            return Ok(Vec::new());
        };
        Ok(self
            .rows(sheet)
            .iter()
            .map(|row| row.get(offset).cloned().unwrap_or_default())
            .collect())
    }

    fn append_row(&mut self, sheet: &str, row: &[String]) -> SheetResult<()> {
        self.calls.append_row += 1;
        self.check(sheet)?;
        if row.first().is_some_and(|id| self.failing_ids.contains(id)) {
            return Err(SheetError::Api {
                status: 500,
                message: "append rejected".into(),
            });
        }
        self.sheets
            .entry(sheet.to_string())
            .or_default()
            .push(row.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| (*c).to_string()).collect()
    }

    #[test]
    fn test_insert_header_above_existing_rows() {
        let mut client = MemorySheetClient::new();
        client.seed_row("Disease", row(&["7", "rice"]));

        client.insert_row("Disease", &row(&["id", "crop"]), 1).unwrap();

        assert_eq!(client.header("Disease").unwrap(), row(&["id", "crop"]));
        assert_eq!(client.column_values("Disease", 1).unwrap(), row(&["id", "7"]));
        assert_eq!(client.calls().insert_row, 1);
    }

    #[test]
    fn test_empty_sheet_reads_empty() {
        let mut client = MemorySheetClient::new();
        assert!(client.header("Agronomic").unwrap().is_empty());
        assert!(client.column_values("Agronomic", 1).unwrap().is_empty());
    }

    #[test]
    fn test_failure_injection() {
        let mut client = MemorySheetClient::new();
        client.fail_sheet("Agronomic");
        assert!(matches!(
            client.header("Agronomic"),
            Err(SheetError::Api { status: 503, .. })
        ));
        client.restore_sheet("Agronomic");
        assert!(client.header("Agronomic").is_ok());

        client.fail_append_of("3");
        assert!(client.append_row("Agronomic", &row(&["3"])).is_err());
        assert!(client.append_row("Agronomic", &row(&["4"])).is_ok());
        assert_eq!(client.rows_with_id("Agronomic", "4"), 1);

        let mut locked = MemorySheetClient::unauthenticated();
        assert!(matches!(
            locked.append_row("Agronomic", &row(&["1"])),
            Err(SheetError::Credentials(_))
        ));
    }
}
