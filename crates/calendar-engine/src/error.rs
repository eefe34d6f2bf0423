//! Error types for calendar-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),

    #[error("Invalid ordinal date: {0}")]
    InvalidOrdinalDate(String),

    #[error("Invalid date: {0}")]
    InvalidAstYmd(String),

    #[error("Invalid time: {0}")]
    InvalidHms(String),

    #[error("Invalid shift start: {0}")]
    InvalidStart(String),

    #[error("Unknown era: {0}")]
    UnknownEra(String),

    #[error("Illegal unit: {0}")]
    IllegalUnit(String),

    #[error("Out of range: {0}")]
    OutOfRange(String),

    #[error("Conversion missing: {0}")]
    ConversionMissing(String),

    #[error("Conflicting conversion: {0}")]
    ConflictingConversion(String),

    #[error("Invalid weekday: {0}")]
    InvalidWeekday(String),

    #[error("Invalid date text: {0}")]
    InvalidHrDate(String),

    #[error("Invalid time text: {0}")]
    InvalidHrTime(String),
}

pub type Result<T> = std::result::Result<T, CalendarError>;
