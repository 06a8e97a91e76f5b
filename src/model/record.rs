//! Observation records for the eight field-trial forms.
//!
//! Each record kind is declared once in the `observations!` table below.
//! The declaration drives everything that depends on column order: the
//! struct fields, the SQLite column list, form-field parsing and the sheet
//! header. The sheet columns of a kind are always `id` followed by the
//! declared fields, in declaration order. `created_at` and `synced` are
//! local bookkeeping and never leave the database.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};

use super::value::{Column, FieldValue};
use crate::error::{Error, Result};

/// Name of the identifier column, always the first sheet column.
pub const ID_COLUMN: &str = "id";

/// UTC offset of the trial site (Africa/Kampala, no daylight saving).
pub const FIELD_UTC_OFFSET_SECS: i32 = 3 * 3600;

/// Fixed time zone in which creation timestamps are shown.
#[must_use]
pub fn field_timezone() -> FixedOffset {
    FixedOffset::east_opt(FIELD_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

macro_rules! observations {
    ($(
        $(#[$meta:meta])*
        $kind:ident($ty:ident) {
            slug: $slug:literal,
            table: $table:literal,
            sheet: $sheet:literal,
            identifier: $ident:literal,
            fields: { $($field:ident: $fty:ty),+ $(,)? }
        }
    )+) => {
        /// The eight observation forms.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum RecordKind {
            $($kind,)+
        }

        impl RecordKind {
            /// All kinds, in sync order.
            pub const ALL: &'static [Self] = &[$(Self::$kind,)+];

            /// Command-line name (`growth-field`).
            #[must_use]
            pub const fn slug(self) -> &'static str {
                match self { $(Self::$kind => $slug,)+ }
            }

            /// SQLite table holding this kind.
            #[must_use]
            pub const fn table(self) -> &'static str {
                match self { $(Self::$kind => $table,)+ }
            }

            /// Name of the worksheet this kind is mirrored to.
            ///
            /// Doubles as the human label on the dashboard.
            #[must_use]
            pub const fn sheet_name(self) -> &'static str {
                match self { $(Self::$kind => $sheet,)+ }
            }

            /// Field that identifies a record on the dashboard.
            #[must_use]
            pub const fn identifier_field(self) -> &'static str {
                match self { $(Self::$kind => $ident,)+ }
            }

            /// Domain fields in column order (without `id`).
            #[must_use]
            pub const fn fields(self) -> &'static [&'static str] {
                match self { $(Self::$kind => $ty::FIELDS,)+ }
            }

            /// Parse a command-line name.
            #[must_use]
            pub fn from_slug(s: &str) -> Option<Self> {
                let normalized = s.trim().to_lowercase().replace('_', "-");
                match normalized.as_str() {
                    $($slug => Some(Self::$kind),)+
                    _ => None,
                }
            }
        }

        /// Domain fields of one record, by kind.
        #[derive(Debug, Clone, PartialEq, Serialize)]
        #[serde(untagged)]
        pub enum Observation {
            $($kind($ty),)+
        }

        impl Observation {
            /// An observation with every field absent.
            #[must_use]
            pub fn empty(kind: RecordKind) -> Self {
                match kind { $(RecordKind::$kind => Self::$kind($ty::default()),)+ }
            }

            /// Rebuild from stored values in column order.
            #[must_use]
            pub fn from_values(kind: RecordKind, values: Vec<FieldValue>) -> Self {
                match kind { $(RecordKind::$kind => Self::$kind($ty::from_values(values)),)+ }
            }

            #[must_use]
            pub const fn kind(&self) -> RecordKind {
                match self { $(Self::$kind(_) => RecordKind::$kind,)+ }
            }

            /// Field values in column order (without `id`).
            #[must_use]
            pub fn values(&self) -> Vec<FieldValue> {
                match self { $(Self::$kind(o) => o.values(),)+ }
            }

            /// Set one field from raw form input.
            ///
            /// Empty or whitespace-only input clears the field.
            ///
            /// # Errors
            ///
            /// Returns [`Error::UnknownField`] for a name the kind does not have
            /// and [`Error::InvalidField`] if the input does not parse.
            pub fn set_field(&mut self, name: &str, raw: &str) -> Result<()> {
                match self { $(Self::$kind(o) => o.set_field(name, raw),)+ }
            }
        }

        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
            pub struct $ty {
                $(pub $field: Option<$fty>,)+
            }

            impl $ty {
                /// Domain fields in column order.
                pub const FIELDS: &'static [&'static str] = &[$(stringify!($field),)+];

                #[must_use]
                pub fn values(&self) -> Vec<FieldValue> {
                    vec![$(self.$field.clone().map_or(FieldValue::Null, Column::into_field),)+]
                }

                #[must_use]
                pub fn from_values(values: Vec<FieldValue>) -> Self {
                    let mut values = values.into_iter();
                    Self {
                        $($field: values.next().and_then(<$fty as Column>::from_field),)+
                    }
                }

                fn set_field(&mut self, name: &str, raw: &str) -> Result<()> {
                    match name {
                        $(stringify!($field) => {
                            self.$field = parse_input::<$fty>(name, raw)?;
                        })+
                        _ => {
                            return Err(Error::UnknownField {
                                kind: $slug.to_string(),
                                field: name.to_string(),
                            });
                        }
                    }
                    Ok(())
                }
            }
        )+
    };
}

fn parse_input<T: Column>(name: &str, raw: &str) -> Result<Option<T>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    T::parse_form(raw).map(Some).map_err(|message| Error::InvalidField {
        field: name.to_string(),
        message: format!("{message} ({} expected)", T::TYPE_NAME),
    })
}

observations! {
    /// Agronomic and morphological traits.
    Agronomic(AgronomicRecord) {
        slug: "agronomic",
        table: "agronomic_records",
        sheet: "Agronomic",
        identifier: "plot_number",
        fields: {
            crop: String,
            block: String,
            replication: String,
            plot_number: String,
            genotype: String,
            days_heading: i64,
            days_maturity: i64,
            plant_height: f64,
            tillers: i64,
            panicle_length: f64,
            grain_yield: f64,
            grain_weight: f64,
            spikelets_total: i64,
            spikelets_filled: i64,
            fertility: f64,
            observation_date: NaiveDate,
            observer: String,
            remarks: String,
        }
    }

    /// Disease incidence and severity over three scoring rounds.
    Disease(DiseaseRecord) {
        slug: "disease",
        table: "disease_records",
        sheet: "Disease",
        identifier: "plot_number",
        fields: {
            crop: String,
            block: String,
            genotype: String,
            replication: String,
            plot_number: String,
            panicles_t1: i64,
            infected_t1: i64,
            incidence_t1: f64,
            panicles_t2: i64,
            infected_t2: i64,
            incidence_t2: f64,
            panicles_t3: i64,
            infected_t3: i64,
            incidence_t3: f64,
            severity_t1: i64,
            severity_t2: i64,
            severity_t3: i64,
            days_first_symptom: i64,
            notes: String,
        }
    }

    /// Field weather and soil conditions.
    FieldCondition(FieldConditionRecord) {
        slug: "field-condition",
        table: "field_condition_records",
        sheet: "Field Condition",
        identifier: "location",
        fields: {
            crop: String,
            block: String,
            genotype: String,
            replication: String,
            date: NaiveDate,
            location: String,
            soil_type: String,
            fertility_status: String,
            temp_min: f64,
            temp_max: f64,
            temp_avg: f64,
            humidity: f64,
            rainfall: f64,
            notes: String,
        }
    }

    /// Greenhouse climate and inoculation schedule.
    GreenhouseCondition(GreenhouseConditionRecord) {
        slug: "greenhouse-condition",
        table: "greenhouse_condition_records",
        sheet: "Greenhouse Condition",
        identifier: "location",
        fields: {
            crop: String,
            genotype: String,
            replication: String,
            date: NaiveDate,
            location: String,
            temp_min: f64,
            temp_max: f64,
            temp_avg: f64,
            humidity: f64,
            light_intensity: String,
            inoculum: String,
            spray_timing: String,
            spray_frequency: i64,
            notes: String,
        }
    }

    /// Growth stages measured in the field.
    GrowthField(GrowthFieldRecord) {
        slug: "growth-field",
        table: "growth_field_records",
        sheet: "Growth (Field)",
        identifier: "plot_number",
        fields: {
            crop: String,
            block: String,
            genotype: String,
            replication: String,
            plot_number: String,
            days_flowering: i64,
            days_maturity: i64,
            plant_height: f64,
            tillers: i64,
            notes: String,
        }
    }

    /// Growth stages measured in the greenhouse.
    GrowthGreenhouse(GrowthGreenhouseRecord) {
        slug: "growth-greenhouse",
        table: "growth_greenhouse_records",
        sheet: "Growth (Greenhouse)",
        identifier: "greenhouse_id",
        fields: {
            crop: String,
            genotype: String,
            replication: String,
            greenhouse_id: String,
            days_flowering: i64,
            days_maturity: i64,
            plant_height: f64,
            tillers: i64,
            notes: String,
        }
    }

    /// Yield components from field plots.
    YieldField(YieldFieldRecord) {
        slug: "yield-field",
        table: "yield_field_records",
        sheet: "Yield (Field)",
        identifier: "plot_number",
        fields: {
            crop: String,
            block: String,
            genotype: String,
            replication: String,
            plot_number: String,
            panicles: i64,
            panicle_length: f64,
            filled_grains: i64,
            unfilled_grains: i64,
            grain_weight: f64,
            yield_plant: f64,
            yield_plot: f64,
            notes: String,
        }
    }

    /// Yield components from greenhouse trays.
    YieldGreenhouse(YieldGreenhouseRecord) {
        slug: "yield-greenhouse",
        table: "yield_greenhouse_records",
        sheet: "Yield (Greenhouse)",
        identifier: "greenhouse_id",
        fields: {
            crop: String,
            genotype: String,
            replication: String,
            greenhouse_id: String,
            panicles: i64,
            panicle_length: f64,
            filled_grains: i64,
            unfilled_grains: i64,
            grain_weight: f64,
            yield_plant: f64,
            yield_tray: f64,
            notes: String,
        }
    }
}

impl RecordKind {
    /// Sheet header: `id` followed by the domain fields.
    #[must_use]
    pub fn sheet_columns(self) -> Vec<&'static str> {
        std::iter::once(ID_COLUMN)
            .chain(self.fields().iter().copied())
            .collect()
    }

    /// 1-based sheet column index of a field, as the Sheets API counts.
    #[must_use]
    pub fn column_index(self, field: &str) -> Option<usize> {
        self.sheet_columns()
            .iter()
            .position(|c| *c == field)
            .map(|i| i + 1)
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

impl std::str::FromStr for RecordKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_slug(s).ok_or_else(|| Error::UnknownKind(s.to_string()))
    }
}

/// A stored observation record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub id: i64,
    pub kind: RecordKind,
    /// Creation timestamp (Unix milliseconds).
    pub created_at: i64,
    pub synced: bool,
    #[serde(flatten)]
    pub observation: Observation,
}

impl Record {
    /// Creation time in the trial site's local time.
    #[must_use]
    pub fn created_local(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::from_timestamp_millis(self.created_at).map(|dt| dt.with_timezone(&field_timezone()))
    }

    /// Value of a domain field by name; `None` for unknown names.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        self.kind
            .fields()
            .iter()
            .position(|f| *f == name)
            .and_then(|i| self.observation.values().into_iter().nth(i))
    }

    /// Render as a sheet row in [`RecordKind::sheet_columns`] order.
    #[must_use]
    pub fn sheet_row(&self) -> Vec<String> {
        std::iter::once(FieldValue::Integer(self.id))
            .chain(self.observation.values())
            .map(|v| v.to_cell())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_distinct_sheet_and_table() {
        let mut sheets: Vec<_> = RecordKind::ALL.iter().map(|k| k.sheet_name()).collect();
        let mut tables: Vec<_> = RecordKind::ALL.iter().map(|k| k.table()).collect();
        sheets.sort_unstable();
        sheets.dedup();
        tables.sort_unstable();
        tables.dedup();
        assert_eq!(RecordKind::ALL.len(), 8);
        assert_eq!(sheets.len(), 8);
        assert_eq!(tables.len(), 8);
    }

    #[test]
    fn test_sheet_columns_start_with_id_and_skip_bookkeeping() {
        for kind in RecordKind::ALL {
            let columns = kind.sheet_columns();
            assert_eq!(columns[0], ID_COLUMN);
            assert_eq!(kind.column_index(ID_COLUMN), Some(1));
            assert!(!columns.contains(&"created_at"));
            assert!(!columns.contains(&"synced"));
            assert!(kind.fields().contains(&kind.identifier_field()));
        }
    }

    #[test]
    fn test_slug_round_trip() {
        for kind in RecordKind::ALL {
            assert_eq!(RecordKind::from_slug(kind.slug()), Some(*kind));
        }
        assert_eq!(
            "growth_greenhouse".parse::<RecordKind>().unwrap(),
            RecordKind::GrowthGreenhouse
        );
        assert!("weather".parse::<RecordKind>().is_err());
    }

    #[test]
    fn test_set_field_parses_by_type() {
        let mut obs = Observation::empty(RecordKind::Agronomic);
        obs.set_field("plant_height", "88.5").unwrap();
        obs.set_field("tillers", "12").unwrap();
        obs.set_field("observation_date", "2024-03-01").unwrap();
        obs.set_field("remarks", "").unwrap();

        let Observation::Agronomic(a) = &obs else {
            panic!("wrong kind");
        };
        assert_eq!(a.plant_height, Some(88.5));
        assert_eq!(a.tillers, Some(12));
        assert_eq!(a.observation_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(a.remarks, None);

        assert!(matches!(
            obs.set_field("tillers", "a dozen"),
            Err(Error::InvalidField { .. })
        ));
        assert!(matches!(
            obs.set_field("yield_tray", "1.0"),
            Err(Error::UnknownField { .. })
        ));
    }

    #[test]
    fn test_sheet_row_encodes_absent_fields_as_empty() {
        let mut obs = Observation::empty(RecordKind::Agronomic);
        obs.set_field("plant_height", "88.5").unwrap();
        let record = Record {
            id: 42,
            kind: RecordKind::Agronomic,
            created_at: 0,
            synced: false,
            observation: obs,
        };

        let row = record.sheet_row();
        let columns = RecordKind::Agronomic.sheet_columns();
        assert_eq!(row.len(), columns.len());
        assert_eq!(row[0], "42");

        let height = RecordKind::Agronomic.column_index("plant_height").unwrap() - 1;
        let remarks = RecordKind::Agronomic.column_index("remarks").unwrap() - 1;
        assert_eq!(row[height], "88.5");
        assert_eq!(row[remarks], "");
    }

    #[test]
    fn test_values_round_trip_through_from_values() {
        let mut obs = Observation::empty(RecordKind::YieldGreenhouse);
        obs.set_field("greenhouse_id", "GH-2").unwrap();
        obs.set_field("panicles", "14").unwrap();
        obs.set_field("yield_tray", "310.25").unwrap();

        let rebuilt = Observation::from_values(RecordKind::YieldGreenhouse, obs.values());
        assert_eq!(rebuilt, obs);
    }

    #[test]
    fn test_created_local_uses_site_offset() {
        let record = Record {
            id: 1,
            kind: RecordKind::Disease,
            created_at: 0,
            synced: false,
            observation: Observation::empty(RecordKind::Disease),
        };
        let local = record.created_local().unwrap();
        assert_eq!(local.format("%Y-%m-%d %H:%M").to_string(), "1970-01-01 03:00");
    }
}
