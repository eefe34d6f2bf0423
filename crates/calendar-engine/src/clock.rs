//! Clock definitions: how a civil day divides into hours, minutes, seconds.

use std::collections::HashSet;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, Result};

/// Longest accepted day, in seconds.
pub const MAX_SECONDS_IN_DAY: u64 = u32::MAX as u64;

fn default_separator() -> char {
    ':'
}

/// The ingestion schema of a clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockSchema {
    pub seconds_in_minute: u32,
    pub minutes_in_hour: u32,
    pub hours_in_day: u32,
    /// Optional day-part labels (e.g. AM / PM) partitioning the day into
    /// equal segments.
    #[serde(default)]
    pub hour_labels: Vec<String>,
    #[serde(default = "default_separator")]
    pub separator: char,
}

/// A clock whose schema satisfies every structural invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ClockSchema", into = "ClockSchema")]
pub struct ClockDefinition {
    schema: ClockSchema,
}

impl ClockDefinition {
    /// A clock with the given units, no hour labels, and `:` as separator.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidDefinition`] if any unit count is zero.
    pub fn new(seconds_in_minute: u32, minutes_in_hour: u32, hours_in_day: u32) -> Result<Self> {
        Self::try_from(ClockSchema {
            seconds_in_minute,
            minutes_in_hour,
            hours_in_day,
            hour_labels: Vec::new(),
            separator: default_separator(),
        })
    }

    /// Parse and validate a JSON clock definition.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CalendarError::InvalidDefinition(e.to_string()))
    }

    pub(crate) fn preset(schema: ClockSchema) -> Self {
        debug_assert_eq!(validate(&schema), Ok(()));
        Self { schema }
    }

    pub fn schema(&self) -> &ClockSchema {
        &self.schema
    }

    pub fn into_schema(self) -> ClockSchema {
        self.schema
    }

    pub fn seconds_in_hour(&self) -> u64 {
        u64::from(self.schema.seconds_in_minute) * u64::from(self.schema.minutes_in_hour)
    }

    pub fn seconds_in_day(&self) -> u64 {
        self.seconds_in_hour() * u64::from(self.schema.hours_in_day)
    }

    /// Hours in each labelled segment, `None` for an unlabelled clock.
    pub fn hours_per_label(&self) -> Option<u32> {
        let labels = u32::try_from(self.schema.hour_labels.len()).ok()?;
        (labels > 0).then(|| self.schema.hours_in_day / labels)
    }
}

impl Deref for ClockDefinition {
    type Target = ClockSchema;

    fn deref(&self) -> &ClockSchema {
        &self.schema
    }
}

impl From<ClockDefinition> for ClockSchema {
    fn from(def: ClockDefinition) -> Self {
        def.schema
    }
}

impl TryFrom<ClockSchema> for ClockDefinition {
    type Error = CalendarError;

    fn try_from(schema: ClockSchema) -> Result<Self> {
        validate(&schema)?;
        let def = Self { schema };
        tracing::debug!(
            seconds_in_day = def.seconds_in_day(),
            "validated clock definition"
        );
        Ok(def)
    }
}

fn validate(s: &ClockSchema) -> Result<()> {
    for (field, value) in [
        ("seconds_in_minute", s.seconds_in_minute),
        ("minutes_in_hour", s.minutes_in_hour),
        ("hours_in_day", s.hours_in_day),
    ] {
        if value == 0 {
            return Err(CalendarError::InvalidDefinition(format!(
                "clock: {field} must be at least 1"
            )));
        }
    }

    let day = [s.seconds_in_minute, s.minutes_in_hour, s.hours_in_day]
        .into_iter()
        .try_fold(1u64, |acc, n| acc.checked_mul(u64::from(n)))
        .filter(|&day| day <= MAX_SECONDS_IN_DAY);
    if day.is_none() {
        return Err(CalendarError::InvalidDefinition(format!(
            "clock: a day of {} × {} × {} seconds exceeds {MAX_SECONDS_IN_DAY}",
            s.hours_in_day, s.minutes_in_hour, s.seconds_in_minute
        )));
    }

    if !s.hour_labels.is_empty() {
        let labels = s.hour_labels.len();
        if s.hours_in_day as usize % labels != 0 {
            return Err(CalendarError::InvalidDefinition(format!(
                "clock: {} hours cannot be split evenly across {labels} hour labels",
                s.hours_in_day
            )));
        }
        let mut seen = HashSet::new();
        for label in &s.hour_labels {
            if label.is_empty() || label.contains(s.separator) {
                return Err(CalendarError::InvalidDefinition(format!(
                    "clock: hour label '{label}' is empty or contains the separator"
                )));
            }
            if !seen.insert(label.as_str()) {
                return Err(CalendarError::InvalidDefinition(format!(
                    "clock: duplicate hour label '{label}'"
                )));
            }
        }
    }

    if s.separator.is_ascii_digit() {
        return Err(CalendarError::InvalidDefinition(
            "clock: separator must not be a digit".to_string(),
        ));
    }
    Ok(())
}
