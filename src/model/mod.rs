//! Data models for DataCollect.
//!
//! - [`record`] - The eight observation kinds and the stored [`Record`]
//! - [`value`] - Typed field values and their sheet cell encoding

pub mod record;
pub mod value;

pub use record::{
    field_timezone, AgronomicRecord, DiseaseRecord, FieldConditionRecord,
    GreenhouseConditionRecord, GrowthFieldRecord, GrowthGreenhouseRecord, Observation, Record,
    RecordKind, YieldFieldRecord, YieldGreenhouseRecord, ID_COLUMN,
};
pub use value::{Column, FieldValue, DATE_FORMAT};
