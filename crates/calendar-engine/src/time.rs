//! Time-of-day arithmetic over a clock definition.
//!
//! [`ClockOps`] converts between [`Hms`], seconds into the day, day
//! fractions, and the `HH:MM:SS[:LABEL]` text form. Shifts by hours,
//! minutes, or seconds wrap around the day and report how many whole days
//! were crossed so the caller can carry them into a date.

use std::sync::Arc;

use crate::clock::ClockDefinition;
use crate::error::{CalendarError, Result};
use crate::types::{Hms, Interval, Unit};

/// Number of decimal digits needed to print `n`.
fn digits(n: u32) -> usize {
    n.checked_ilog10().map_or(1, |d| d as usize + 1)
}

/// Pure time-of-day operations bound to one clock.
#[derive(Debug, Clone)]
pub struct ClockOps {
    def: Arc<ClockDefinition>,
}

impl ClockOps {
    pub fn new(def: ClockDefinition) -> Self {
        Self::from_shared(Arc::new(def))
    }

    pub fn from_shared(def: Arc<ClockDefinition>) -> Self {
        Self { def }
    }

    pub fn definition(&self) -> &ClockDefinition {
        &self.def
    }

    pub fn seconds_in_day(&self) -> u64 {
        self.def.seconds_in_day()
    }

    pub fn is_valid_hms(&self, hms: Hms) -> bool {
        hms.hour < self.def.hours_in_day
            && hms.minute < self.def.minutes_in_hour
            && hms.second < self.def.seconds_in_minute
    }

    fn require_hms(&self, hms: Hms) -> Result<()> {
        if !self.is_valid_hms(hms) {
            return Err(CalendarError::InvalidHms(format!(
                "{hms} outside a {}h/{}m/{}s clock",
                self.def.hours_in_day, self.def.minutes_in_hour, self.def.seconds_in_minute
            )));
        }
        Ok(())
    }

    // ── Seconds and fractions ───────────────────────────────────────────────

    /// Seconds elapsed since midnight.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidHms`] if any field is out of range.
    pub fn hms_to_seconds(&self, hms: Hms) -> Result<u64> {
        self.require_hms(hms)?;
        Ok(u64::from(hms.hour) * self.def.seconds_in_hour()
            + u64::from(hms.minute) * u64::from(self.def.seconds_in_minute)
            + u64::from(hms.second))
    }

    /// The time of day `seconds` after midnight, wrapping around the day in
    /// either direction.
    pub fn seconds_to_hms(&self, seconds: i64) -> Hms {
        let day = self.seconds_in_day() as i128;
        let secs = i128::from(seconds).rem_euclid(day) as u64;
        let per_hour = self.def.seconds_in_hour();
        let per_minute = u64::from(self.def.seconds_in_minute);
        let hms = Hms::new(
            (secs / per_hour) as u32,
            ((secs % per_hour) / per_minute) as u32,
            (secs % per_minute) as u32,
        );
        debug_assert!(self.is_valid_hms(hms));
        hms
    }

    /// Fraction of the day elapsed at `hms`, in `[0, 1)`.
    pub fn hms_to_fraction(&self, hms: Hms) -> Result<f64> {
        Ok(self.hms_to_seconds(hms)? as f64 / self.seconds_in_day() as f64)
    }

    /// The time of day at `fraction` of the day, rounded to the nearest
    /// second, with the number of days carried when rounding reaches the
    /// next midnight (0 or 1).
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::OutOfRange`] unless `0 <= fraction < 1`.
    pub fn fraction_to_hms(&self, fraction: f64) -> Result<(Hms, i64)> {
        if !(0.0..1.0).contains(&fraction) {
            return Err(CalendarError::OutOfRange(format!(
                "day fraction {fraction} outside [0, 1)"
            )));
        }
        let day = self.seconds_in_day();
        let seconds = (fraction * day as f64).round() as u64;
        if seconds >= day {
            return Ok((Hms::midnight(), 1));
        }
        Ok((self.seconds_to_hms(seconds as i64), 0))
    }

    // ── Text form ───────────────────────────────────────────────────────────

    /// Format as `HH:MM:SS`, each field zero-padded to the width of its
    /// largest value.
    ///
    /// With `labeled` set on a clock that has hour labels, the day is split
    /// into equal segments and the hour is shown within its segment
    /// (1 through segment length, midnight and noon showing as the segment
    /// length), followed by the label: `02:05:09:PM`. `labeled` has no
    /// effect on a clock without labels.
    pub fn hms_to_hr_time(&self, hms: Hms, labeled: bool) -> Result<String> {
        self.require_hms(hms)?;
        let sep = self.def.separator;
        let mw = digits(self.def.minutes_in_hour - 1);
        let sw = digits(self.def.seconds_in_minute - 1);

        match self.def.hours_per_label().filter(|_| labeled) {
            Some(segment) => {
                let label = &self.def.hour_labels[(hms.hour / segment) as usize];
                let hour = match hms.hour % segment {
                    0 => segment,
                    h => h,
                };
                let hw = digits(segment);
                Ok(format!(
                    "{hour:0hw$}{sep}{:0mw$}{sep}{:0sw$}{sep}{label}",
                    hms.minute, hms.second
                ))
            }
            None => {
                let hw = digits(self.def.hours_in_day - 1);
                Ok(format!(
                    "{:0hw$}{sep}{:0mw$}{sep}{:0sw$}",
                    hms.hour, hms.minute, hms.second
                ))
            }
        }
    }

    /// Parse either text form produced by [`hms_to_hr_time`](Self::hms_to_hr_time).
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidHrTime`] for malformed text or an
    /// unknown label, and [`CalendarError::InvalidHms`] if the fields are
    /// out of range.
    pub fn hr_time_to_hms(&self, text: &str) -> Result<Hms> {
        let sep = self.def.separator;
        let parts: Vec<&str> = text.trim().split(sep).map(str::trim).collect();
        let number = |s: &str| -> Result<u32> {
            s.parse::<u32>().map_err(|_| {
                CalendarError::InvalidHrTime(format!("'{s}' is not a number in '{text}'"))
            })
        };

        let hms = match parts.as_slice() {
            [h, m, s] => Hms::new(number(*h)?, number(*m)?, number(*s)?),
            [h, m, s, label] => {
                let segment = self.def.hours_per_label().ok_or_else(|| {
                    CalendarError::InvalidHrTime(format!("clock has no hour labels: '{text}'"))
                })?;
                let index = self
                    .def
                    .hour_labels
                    .iter()
                    .position(|l| l.as_str() == *label)
                    .ok_or_else(|| {
                        CalendarError::InvalidHrTime(format!("unknown hour label '{label}'"))
                    })?;
                let hour = number(*h)?;
                if hour == 0 || hour > segment {
                    return Err(CalendarError::InvalidHms(format!(
                        "labelled hour {hour} outside 1..={segment}"
                    )));
                }
                Hms::new(
                    index as u32 * segment + hour % segment,
                    number(*m)?,
                    number(*s)?,
                )
            }
            _ => {
                return Err(CalendarError::InvalidHrTime(format!(
                    "expected HH{sep}MM{sep}SS[{sep}LABEL], got '{text}'"
                )));
            }
        };
        self.require_hms(hms)?;
        Ok(hms)
    }

    // ── Shifting ────────────────────────────────────────────────────────────

    /// Seconds in one `unit`, for the time units only.
    pub fn unit_seconds(&self, unit: Unit) -> Result<u64> {
        match unit {
            Unit::Hour => Ok(self.def.seconds_in_hour()),
            Unit::Minute => Ok(u64::from(self.def.seconds_in_minute)),
            Unit::Second => Ok(1),
            other => Err(CalendarError::IllegalUnit(format!(
                "{other} cannot shift a time of day"
            ))),
        }
    }

    /// Shift by one interval, returning the new time and the signed
    /// number of midnights crossed.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidHms`] for an invalid start and
    /// [`CalendarError::IllegalUnit`] for a date unit.
    pub fn next_hms(&self, hms: Hms, interval: Interval) -> Result<(Hms, i64)> {
        let start = i128::from(self.hms_to_seconds(hms)?);
        let per_unit = i128::from(self.unit_seconds(interval.unit)?);
        let day = i128::from(self.seconds_in_day());

        let total = start + i128::from(interval.delta) * per_unit;
        let days = i64::try_from(total.div_euclid(day)).map_err(|_| {
            CalendarError::OutOfRange(format!("{hms} {interval} overflows the day count"))
        })?;
        let seconds = total.rem_euclid(day) as i64;
        Ok((self.seconds_to_hms(seconds), days))
    }

    /// Apply `intervals` left to right, summing the days crossed.
    pub fn shift_hms(&self, hms: Hms, intervals: &[Interval]) -> Result<(Hms, i64)> {
        intervals
            .iter()
            .try_fold((hms, 0i64), |(acc, days), &interval| {
                let (next, crossed) = self.next_hms(acc, interval)?;
                let days = days.checked_add(crossed).ok_or_else(|| {
                    CalendarError::OutOfRange(format!("{interval} overflows the day count"))
                })?;
                Ok((next, days))
            })
    }
}
