//! Calendar definitions as validated, immutable data.
//!
//! A calendar is described entirely by a [`CalendarSchema`]: month tables,
//! week structure, leap rule, eras, and the Julian Day of its epoch. The
//! schema is what hosts serialize; [`CalendarDefinition`] is the same data
//! after every structural invariant has been checked. Nothing downstream
//! ever re-validates a definition.
//!
//! # Leap rule
//!
//! The `leap_year_*` fields describe a single rule covering both
//! divisibility-style calendars (Gregorian: one cycle of 400 with the leap
//! positions enumerated) and tabulated ones (a 30-year Hijri cycle with 11
//! listed positions). See [`crate::leap`] for how a year is placed in the
//! super-cycle.
//!
//! # Eras
//!
//! Era ranges are half-open in human numbering with an exclusive `end`.
//! Era 0 is the proleptic era: it is unbounded toward the past and counts
//! downward, so astronomical year 0 carries the label `end + 1`. The
//! remaining eras follow each other from astronomical year 1 onward; the
//! last one is unbounded toward the future.

use std::collections::{BTreeSet, HashSet};
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, Result};
use crate::types::{ORDINAL_LIMIT, YEAR_LIMIT};

/// Longest accepted leap super-cycle, in years.
pub const MAX_LEAP_CYCLE: u32 = 100_000;

/// Longest accepted year, in days.
pub const MAX_YEAR_DAYS: u32 = 100_000;

/// One era's human-readable span. `None` marks the unbounded ends (the
/// start of the first era, the end of the last).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EraRange {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl EraRange {
    pub fn new(start: Option<i64>, end: Option<i64>) -> Self {
        Self { start, end }
    }

    /// Whether human numbering counts downward through this era.
    pub fn is_descending(&self) -> bool {
        match (self.start, self.end) {
            (None, _) => true,
            (Some(start), Some(end)) => start > end,
            (Some(_), None) => false,
        }
    }

    /// Number of years in the era, `None` when unbounded.
    pub fn len(&self) -> Option<i64> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some((end - start).abs()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }
}

/// The ingestion schema of a calendar: every field a host supplies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSchema {
    pub name: String,

    #[serde(default)]
    pub weekday_names: Vec<String>,
    #[serde(default)]
    pub epoch_weekday: Option<usize>,
    #[serde(default)]
    pub weekday_start: Option<usize>,
    #[serde(default)]
    pub weekends: BTreeSet<usize>,

    #[serde(default)]
    pub common_year_month_names: Vec<String>,
    pub days_in_common_year_months: Vec<u32>,
    #[serde(default)]
    pub leap_year_month_names: Vec<String>,
    #[serde(default)]
    pub days_in_leap_year_months: Vec<u32>,

    #[serde(default)]
    pub has_leap_year: bool,
    #[serde(default)]
    pub leap_year_cycles: Vec<u32>,
    #[serde(default)]
    pub leap_year_cycle_start: Option<u32>,
    #[serde(default)]
    pub leap_year_cycle_ordinals: BTreeSet<u32>,
    #[serde(default)]
    pub leap_year_offset: Option<i64>,
    #[serde(default)]
    pub special_common_years: BTreeSet<i64>,
    #[serde(default)]
    pub special_leap_years: BTreeSet<i64>,

    pub eras: Vec<String>,
    pub era_ranges: Vec<EraRange>,

    pub jd_epoch: i64,
}

/// A calendar whose schema satisfies every structural invariant.
///
/// Construct with [`CalendarDefinition::try_from`] or
/// [`CalendarDefinition::from_json`]; read fields through `Deref` to the
/// schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CalendarSchema", into = "CalendarSchema")]
pub struct CalendarDefinition {
    schema: CalendarSchema,
}

impl CalendarDefinition {
    /// Parse and validate a JSON calendar definition.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidDefinition`] if the JSON is malformed
    /// or the schema violates an invariant.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CalendarError::InvalidDefinition(e.to_string()))
    }

    /// Wrap a built-in schema. Presets are checked by the test suite, so
    /// only debug builds re-validate them here.
    pub(crate) fn preset(schema: CalendarSchema) -> Self {
        debug_assert_eq!(validate(&schema), Ok(()), "preset '{}'", schema.name);
        Self { schema }
    }

    pub fn schema(&self) -> &CalendarSchema {
        &self.schema
    }

    pub fn into_schema(self) -> CalendarSchema {
        self.schema
    }

    pub fn is_monthless(&self) -> bool {
        self.schema.common_year_month_names.is_empty()
    }

    pub fn is_weekless(&self) -> bool {
        self.schema.weekday_names.is_empty()
    }

    /// Month lengths of a leap (`true`) or common year.
    pub fn month_days(&self, leap: bool) -> &[u32] {
        if leap {
            &self.schema.days_in_leap_year_months
        } else {
            &self.schema.days_in_common_year_months
        }
    }

    /// Month names of a leap (`true`) or common year; empty when monthless.
    pub fn month_names(&self, leap: bool) -> &[String] {
        if leap {
            &self.schema.leap_year_month_names
        } else {
            &self.schema.common_year_month_names
        }
    }

    pub fn common_year_days(&self) -> u32 {
        self.schema.days_in_common_year_months.iter().sum()
    }

    /// Length of a leap year; equals the common length when there is none.
    pub fn leap_year_days(&self) -> u32 {
        if self.schema.has_leap_year {
            self.schema.days_in_leap_year_months.iter().sum()
        } else {
            self.common_year_days()
        }
    }

    /// Length of the leap super-cycle (1 for calendars without leap years).
    pub fn leap_cycle_length(&self) -> u32 {
        if self.schema.has_leap_year {
            self.schema.leap_year_cycles.iter().sum()
        } else {
            1
        }
    }
}

impl Deref for CalendarDefinition {
    type Target = CalendarSchema;

    fn deref(&self) -> &CalendarSchema {
        &self.schema
    }
}

impl From<CalendarDefinition> for CalendarSchema {
    fn from(def: CalendarDefinition) -> Self {
        def.schema
    }
}

impl TryFrom<CalendarSchema> for CalendarDefinition {
    type Error = CalendarError;

    fn try_from(schema: CalendarSchema) -> Result<Self> {
        validate(&schema)?;
        tracing::debug!(calendar = %schema.name, "validated calendar definition");
        Ok(Self { schema })
    }
}

// ── Validation ──────────────────────────────────────────────────────────────

fn invalid(name: &str, msg: impl std::fmt::Display) -> CalendarError {
    CalendarError::InvalidDefinition(format!("calendar '{name}': {msg}"))
}

fn validate(s: &CalendarSchema) -> Result<()> {
    let name = s.name.as_str();
    if name.trim().is_empty() {
        return Err(invalid(name, "name must not be empty"));
    }
    if s.jd_epoch.unsigned_abs() > ORDINAL_LIMIT as u64 {
        return Err(invalid(
            name,
            format!("jd_epoch {} exceeds ±{ORDINAL_LIMIT}", s.jd_epoch),
        ));
    }
    validate_weeks(s)?;
    validate_months(
        name,
        "common",
        &s.common_year_month_names,
        &s.days_in_common_year_months,
    )?;
    validate_leap_rule(s)?;
    validate_eras(s)?;
    Ok(())
}

fn validate_weeks(s: &CalendarSchema) -> Result<()> {
    let name = s.name.as_str();
    let week_len = s.weekday_names.len();
    if week_len == 0 {
        if s.epoch_weekday.is_some() || s.weekday_start.is_some() {
            return Err(invalid(
                name,
                "epoch_weekday and weekday_start require weekday_names",
            ));
        }
        if !s.weekends.is_empty() {
            return Err(invalid(name, "weekends require weekday_names"));
        }
        return Ok(());
    }

    let epoch = s
        .epoch_weekday
        .ok_or_else(|| invalid(name, "epoch_weekday is required when weekdays exist"))?;
    let start = s
        .weekday_start
        .ok_or_else(|| invalid(name, "weekday_start is required when weekdays exist"))?;
    if epoch >= week_len {
        return Err(invalid(
            name,
            format!("epoch_weekday {epoch} outside a {week_len}-day week"),
        ));
    }
    if start >= week_len {
        return Err(invalid(
            name,
            format!("weekday_start {start} outside a {week_len}-day week"),
        ));
    }
    if s.weekends.is_empty() {
        return Err(invalid(name, "weekends must not be empty when weekdays exist"));
    }
    if let Some(bad) = s.weekends.iter().find(|&&d| d >= week_len) {
        return Err(invalid(
            name,
            format!("weekend {bad} outside a {week_len}-day week"),
        ));
    }
    Ok(())
}

fn validate_months(name: &str, kind: &str, names: &[String], days: &[u32]) -> Result<()> {
    if names.is_empty() {
        if days.len() != 1 {
            return Err(invalid(
                name,
                format!("a monthless {kind} year needs exactly one day count, got {}", days.len()),
            ));
        }
    } else if names.len() != days.len() {
        return Err(invalid(
            name,
            format!(
                "{} {kind} month names but {} month lengths",
                names.len(),
                days.len()
            ),
        ));
    }
    if days.contains(&0) {
        return Err(invalid(name, format!("{kind} month lengths must be positive")));
    }
    let total: u64 = days.iter().map(|&d| u64::from(d)).sum();
    if total > u64::from(MAX_YEAR_DAYS) {
        return Err(invalid(
            name,
            format!("a {kind} year of {total} days exceeds {MAX_YEAR_DAYS}"),
        ));
    }
    Ok(())
}

fn validate_leap_rule(s: &CalendarSchema) -> Result<()> {
    let name = s.name.as_str();
    if !s.has_leap_year {
        let unused = !s.leap_year_month_names.is_empty()
            || !s.days_in_leap_year_months.is_empty()
            || !s.leap_year_cycles.is_empty()
            || !s.leap_year_cycle_ordinals.is_empty()
            || s.leap_year_cycle_start.is_some()
            || s.leap_year_offset.is_some()
            || !s.special_common_years.is_empty()
            || !s.special_leap_years.is_empty();
        if unused {
            return Err(invalid(
                name,
                "leap year fields must be empty when has_leap_year is false",
            ));
        }
        return Ok(());
    }

    validate_months(
        name,
        "leap",
        &s.leap_year_month_names,
        &s.days_in_leap_year_months,
    )?;
    if s.leap_year_month_names.is_empty() != s.common_year_month_names.is_empty() {
        return Err(invalid(
            name,
            "common and leap years must both have months or both be monthless",
        ));
    }

    if s.leap_year_cycles.is_empty() {
        return Err(invalid(name, "leap_year_cycles must not be empty"));
    }
    if s.leap_year_cycles.contains(&0) {
        return Err(invalid(name, "leap year cycle lengths must be at least 1"));
    }
    let super_cycle: u64 = s.leap_year_cycles.iter().map(|&c| u64::from(c)).sum();
    if super_cycle > u64::from(MAX_LEAP_CYCLE) {
        return Err(invalid(
            name,
            format!("leap super-cycle of {super_cycle} years exceeds {MAX_LEAP_CYCLE}"),
        ));
    }
    if let Some(bad) = s
        .leap_year_cycle_ordinals
        .iter()
        .find(|&&o| o == 0 || u64::from(o) > super_cycle)
    {
        return Err(invalid(
            name,
            format!("leap ordinal {bad} outside the super-cycle 1..={super_cycle}"),
        ));
    }

    if let Some(offset) = s.leap_year_offset.filter(|o| o.unsigned_abs() > YEAR_LIMIT as u64) {
        return Err(invalid(
            name,
            format!("leap_year_offset {offset} exceeds ±{YEAR_LIMIT}"),
        ));
    }
    if let Some(far) = s
        .special_common_years
        .iter()
        .chain(&s.special_leap_years)
        .find(|y| y.unsigned_abs() > YEAR_LIMIT as u64)
    {
        return Err(invalid(
            name,
            format!("special year {far} exceeds ±{YEAR_LIMIT}"),
        ));
    }
    if let Some(both) = s
        .special_common_years
        .intersection(&s.special_leap_years)
        .next()
    {
        return Err(invalid(
            name,
            format!("year {both} is listed as both a special common and a special leap year"),
        ));
    }
    Ok(())
}

fn validate_eras(s: &CalendarSchema) -> Result<()> {
    let name = s.name.as_str();
    if s.eras.len() < 2 {
        return Err(invalid(name, "at least two eras are required"));
    }
    if s.eras.len() != s.era_ranges.len() {
        return Err(invalid(
            name,
            format!("{} eras but {} era ranges", s.eras.len(), s.era_ranges.len()),
        ));
    }

    let mut labels = HashSet::new();
    for label in &s.eras {
        if label.trim().is_empty() {
            return Err(invalid(name, "era labels must not be empty"));
        }
        if label.trim() != label {
            return Err(invalid(
                name,
                format!("era label '{label}' has surrounding whitespace"),
            ));
        }
        if !labels.insert(label.as_str()) {
            return Err(invalid(name, format!("duplicate era label '{label}'")));
        }
    }

    let last = s.era_ranges.len() - 1;
    for (i, range) in s.era_ranges.iter().enumerate() {
        let label = &s.eras[i];
        match (i == 0, range.start) {
            (true, Some(_)) => {
                return Err(invalid(name, format!("era '{label}' must start unbounded")));
            }
            (false, None) => {
                return Err(invalid(name, format!("era '{label}' needs a finite start")));
            }
            _ => {}
        }
        match (i == last, range.end) {
            (true, Some(_)) => {
                return Err(invalid(name, format!("era '{label}' must end unbounded")));
            }
            (false, None) => {
                return Err(invalid(name, format!("era '{label}' needs a finite end")));
            }
            _ => {}
        }
        if let Some(bad) = [range.start, range.end].into_iter().flatten().find(|&v| v < 0) {
            return Err(invalid(
                name,
                format!("era '{label}' has a negative endpoint {bad}"),
            ));
        }
        if let Some(bad) = [range.start, range.end]
            .into_iter()
            .flatten()
            .find(|&v| v > YEAR_LIMIT)
        {
            return Err(invalid(
                name,
                format!("era '{label}' endpoint {bad} exceeds {YEAR_LIMIT}"),
            ));
        }
        if i > 0 && range.is_empty() {
            return Err(invalid(name, format!("era '{label}' spans no years")));
        }
    }
    Ok(())
}
