//! Plain value types shared by the date, time, and date-time operations.
//!
//! Everything here is `Copy` and carries no reference to a definition: a
//! value only becomes meaningful (and checkable) when handed to the ops
//! bound to a particular calendar or clock.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Largest astronomical year magnitude accepted by any operation.
pub const YEAR_LIMIT: i64 = 10_000_000;

/// Largest ordinal magnitude accepted by any operation: 2^53, the largest
/// integer an `f64` holds exactly.
///
/// An ordinal decimal near this bound has no fractional bits left. Whole
/// seconds survive only while `|ordinal| < 2^52 / seconds_in_day`, about
/// 5 × 10^10 days on an 86 400-second clock, which every Gregorian date
/// within [`YEAR_LIMIT`] satisfies.
pub const ORDINAL_LIMIT: i64 = 1 << 53;

// ── Dates ───────────────────────────────────────────────────────────────────

/// An astronomical year-month-day.
///
/// `year` is signed with no gap at zero (year 0 is the last proleptic year).
/// `month` is `None` exactly when the calendar has no months, in which case
/// `day` is the day of the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AstYmd {
    pub year: i64,
    pub month: Option<u32>,
    pub day: u32,
}

impl AstYmd {
    /// A date in a calendar with months.
    pub fn new(year: i64, month: u32, day: u32) -> Self {
        Self {
            year,
            month: Some(month),
            day,
        }
    }

    /// A date in a monthless calendar.
    pub fn monthless(year: i64, day: u32) -> Self {
        Self {
            year,
            month: None,
            day,
        }
    }
}

impl fmt::Display for AstYmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.month {
            Some(month) => write!(f, "{}-{}-{}", self.year, month, self.day),
            None => write!(f, "{}-{}", self.year, self.day),
        }
    }
}

/// A (year, day-of-year) pair; `day` starts at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrdinalDate {
    pub year: i64,
    pub day: u32,
}

impl OrdinalDate {
    pub fn new(year: i64, day: u32) -> Self {
        Self { year, day }
    }
}

impl fmt::Display for OrdinalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.year, self.day)
    }
}

/// A human-readable year: a non-negative number within an era.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HrYear {
    pub year: i64,
    /// Index into the calendar's era list.
    pub era: usize,
}

impl HrYear {
    pub fn new(year: i64, era: usize) -> Self {
        Self { year, era }
    }
}

/// A human-readable date: era-labelled year, optional month, day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HrDate {
    pub year: i64,
    pub month: Option<u32>,
    pub day: u32,
    pub era: usize,
}

// ── Time of day ─────────────────────────────────────────────────────────────

/// Hour, minute, and second of a civil day, all zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Hms {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl Hms {
    pub fn new(hour: u32, minute: u32, second: u32) -> Self {
        Self {
            hour,
            minute,
            second,
        }
    }

    pub fn midnight() -> Self {
        Self::default()
    }
}

impl fmt::Display for Hms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.hour, self.minute, self.second)
    }
}

// ── Intervals ───────────────────────────────────────────────────────────────

/// The unit of a shift or display interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Era,
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl Unit {
    /// Whether the unit is applied by the calendar (as opposed to the clock).
    pub fn is_date_unit(&self) -> bool {
        matches!(self, Unit::Era | Unit::Year | Unit::Month | Unit::Day)
    }

    pub fn is_time_unit(&self) -> bool {
        !self.is_date_unit()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Unit::Era => "era",
            Unit::Year => "year",
            Unit::Month => "month",
            Unit::Day => "day",
            Unit::Hour => "hour",
            Unit::Minute => "minute",
            Unit::Second => "second",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A signed number of units, e.g. `(-3, Month)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub delta: i64,
    pub unit: Unit,
}

impl Interval {
    pub fn new(delta: i64, unit: Unit) -> Self {
        Self { delta, unit }
    }

    pub fn eras(delta: i64) -> Self {
        Self::new(delta, Unit::Era)
    }

    pub fn years(delta: i64) -> Self {
        Self::new(delta, Unit::Year)
    }

    pub fn months(delta: i64) -> Self {
        Self::new(delta, Unit::Month)
    }

    pub fn days(delta: i64) -> Self {
        Self::new(delta, Unit::Day)
    }

    pub fn hours(delta: i64) -> Self {
        Self::new(delta, Unit::Hour)
    }

    pub fn minutes(delta: i64) -> Self {
        Self::new(delta, Unit::Minute)
    }

    pub fn seconds(delta: i64) -> Self {
        Self::new(delta, Unit::Second)
    }

    /// The same unit with the delta scaled by `factor`.
    pub fn scaled(&self, factor: i64) -> Self {
        Self::new(self.delta.saturating_mul(factor), self.unit)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+} {}", self.delta, self.unit)
    }
}
