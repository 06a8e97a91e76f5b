//! Typed field values and their spreadsheet cell encoding.
//!
//! Every domain field of an observation record is one of a handful of
//! primitive types. [`FieldValue`] is the common currency between the
//! record structs, the SQLite layer and the sheet renderer.

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::Serialize;

/// Date format used by the entry forms and stored in SQLite.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Date(NaiveDate),
}

impl FieldValue {
    /// Render the value as a spreadsheet cell.
    ///
    /// - booleans become the literals `TRUE` / `FALSE`
    /// - absent values become the empty string
    /// - dates use ISO-8601 (`2024-03-01`)
    /// - floats keep a trailing `.0` when integral (`90.0`, not `90`)
    #[must_use]
    pub fn to_cell(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(true) => "TRUE".to_string(),
            Self::Bool(false) => "FALSE".to_string(),
            Self::Integer(v) => v.to_string(),
            Self::Real(v) => format_real(*v),
            Self::Text(s) => s.clone(),
            Self::Date(d) => d.format(DATE_FORMAT).to_string(),
        }
    }
}

fn format_real(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Null => ToSqlOutput::from(rusqlite::types::Null),
            Self::Bool(b) => ToSqlOutput::from(*b),
            Self::Integer(v) => ToSqlOutput::from(*v),
            Self::Real(v) => ToSqlOutput::from(*v),
            Self::Text(s) => ToSqlOutput::from(s.as_str()),
            Self::Date(d) => ToSqlOutput::from(d.format(DATE_FORMAT).to_string()),
        })
    }
}

impl FromSql for FieldValue {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(v) => Self::Integer(v),
            ValueRef::Real(v) => Self::Real(v),
            ValueRef::Text(_) => Self::Text(value.as_str()?.to_string()),
            ValueRef::Blob(_) => return Err(rusqlite::types::FromSqlError::InvalidType),
        })
    }
}

/// A Rust type that can back an observation field.
///
/// Implemented for the four primitive field types. `parse_form` follows the
/// entry-form rules: the caller has already mapped empty input to "absent",
/// so only non-empty input reaches it.
pub trait Column: Sized {
    /// Short type name used in validation messages.
    const TYPE_NAME: &'static str;

    /// Parse non-empty form input.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the input does not parse.
    fn parse_form(raw: &str) -> std::result::Result<Self, String>;

    /// Wrap into a [`FieldValue`].
    fn into_field(self) -> FieldValue;

    /// Unwrap from a stored [`FieldValue`]; `None` for null or mismatched values.
    fn from_field(value: FieldValue) -> Option<Self>;
}

impl Column for String {
    const TYPE_NAME: &'static str = "text";

    fn parse_form(raw: &str) -> std::result::Result<Self, String> {
        Ok(raw.to_string())
    }

    fn into_field(self) -> FieldValue {
        FieldValue::Text(self)
    }

    fn from_field(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Text(s) => Some(s),
            FieldValue::Integer(v) => Some(v.to_string()),
            FieldValue::Real(v) => Some(format_real(v)),
            _ => None,
        }
    }
}

impl Column for i64 {
    const TYPE_NAME: &'static str = "integer";

    fn parse_form(raw: &str) -> std::result::Result<Self, String> {
        raw.trim()
            .parse()
            .map_err(|_| format!("'{raw}' is not a whole number"))
    }

    fn into_field(self) -> FieldValue {
        FieldValue::Integer(self)
    }

    fn from_field(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Integer(v) => Some(v),
            _ => None,
        }
    }
}

impl Column for f64 {
    const TYPE_NAME: &'static str = "number";

    fn parse_form(raw: &str) -> std::result::Result<Self, String> {
        raw.trim()
            .parse()
            .map_err(|_| format!("'{raw}' is not a number"))
    }

    fn into_field(self) -> FieldValue {
        FieldValue::Real(self)
    }

    #[allow(clippy::cast_precision_loss)]
    fn from_field(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Real(v) => Some(v),
            FieldValue::Integer(v) => Some(v as f64),
            _ => None,
        }
    }
}

impl Column for NaiveDate {
    const TYPE_NAME: &'static str = "date";

    fn parse_form(raw: &str) -> std::result::Result<Self, String> {
        NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
            .map_err(|_| format!("'{raw}' is not a date (expected YYYY-MM-DD)"))
    }

    fn into_field(self) -> FieldValue {
        FieldValue::Date(self)
    }

    fn from_field(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Date(d) => Some(d),
            FieldValue::Text(s) => NaiveDate::parse_from_str(&s, DATE_FORMAT).ok(),
            _ => None,
        }
    }
}
