//! Combined date and time arithmetic on ordinal decimals.
//!
//! An ordinal decimal packs a moment into one `f64`: the integer part is
//! the ordinal of the day and the fractional part the share of the day
//! elapsed. [`DateTimeOps`] pairs a calendar with a clock to pack, unpack,
//! shift, and format such values, and decides how a zoomable timeline
//! steps between display intervals.

use crate::date::{check_ordinal, CalendarOps};
use crate::error::{CalendarError, Result};
use crate::time::ClockOps;
use crate::types::{AstYmd, Hms, Interval, Unit};

const DAY_STEPS: [i64; 6] = [1, 5, 10, 15, 20, 25];

const YEAR_STEPS: [i64; 20] = [
    1, 2, 5, 10, 25, 50, 75, 100, 250, 500, 750, 1_000, 2_500, 5_000, 7_500, 10_000, 25_000,
    50_000, 75_000, 100_000,
];

/// Divisors of `n` smaller than `n` itself.
fn exclusive_divisors(n: u32) -> impl Iterator<Item = i64> {
    (1..n).filter(move |d| n % d == 0).map(i64::from)
}

/// Date and time operations over one calendar and one clock.
#[derive(Debug, Clone)]
pub struct DateTimeOps {
    calendar: CalendarOps,
    clock: ClockOps,
    /// Display intervals ordered by strictly increasing nominal seconds.
    ladder: Vec<(Interval, i128)>,
}

impl DateTimeOps {
    pub fn new(calendar: CalendarOps, clock: ClockOps) -> Self {
        let mut ops = Self {
            calendar,
            clock,
            ladder: Vec::new(),
        };
        ops.ladder = ops.build_ladder();
        ops
    }

    pub fn calendar(&self) -> &CalendarOps {
        &self.calendar
    }

    pub fn clock(&self) -> &ClockOps {
        &self.clock
    }

    // ── Ordinal decimals ────────────────────────────────────────────────────

    /// Pack a date and time of day into an ordinal decimal.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidAstYmd`] or
    /// [`CalendarError::InvalidHms`] for invalid components.
    pub fn ast_ymd_to_od(&self, ymd: AstYmd, hms: Hms) -> Result<f64> {
        let ordinal = self.calendar.ast_ymd_to_ordinal(ymd)?;
        let fraction = self.clock.hms_to_fraction(hms)?;
        Ok(ordinal as f64 + fraction)
    }

    /// Unpack an ordinal decimal, rounding the time to the nearest second.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::OutOfRange`] for non-finite input or an
    /// ordinal beyond the supported range.
    pub fn od_to_ast_ymd(&self, od: f64) -> Result<(AstYmd, Hms)> {
        if !od.is_finite() {
            return Err(CalendarError::OutOfRange(format!(
                "ordinal decimal {od} is not finite"
            )));
        }
        let day = od.floor();
        if day.abs() > (1u64 << 53) as f64 {
            return Err(CalendarError::OutOfRange(format!(
                "ordinal decimal {od} exceeds the ordinal range"
            )));
        }
        let (hms, carry) = self.clock.fraction_to_hms(od - day)?;
        let ordinal = day as i64 + carry;
        check_ordinal(ordinal)?;
        let ymd = self.calendar.ordinal_to_ast_ymd(ordinal)?;
        Ok((ymd, hms))
    }

    /// Shift an ordinal decimal. Date intervals are applied first, in
    /// order, then time intervals; midnights crossed by the time part move
    /// the date by whole days.
    pub fn shift_od(&self, od: f64, intervals: &[Interval]) -> Result<f64> {
        let (ymd, hms) = self.od_to_ast_ymd(od)?;
        let (date, time): (Vec<Interval>, Vec<Interval>) =
            intervals.iter().partition(|i| i.unit.is_date_unit());

        let ymd = self.calendar.shift_ast_ymd(ymd, &date)?;
        let (hms, days) = self.clock.shift_hms(hms, &time)?;
        let ordinal = self
            .calendar
            .ast_ymd_to_ordinal(ymd)?
            .checked_add(days)
            .ok_or_else(|| CalendarError::OutOfRange(format!("{days} days from {ymd}")))?;
        check_ordinal(ordinal)?;
        Ok(ordinal as f64 + self.clock.hms_to_fraction(hms)?)
    }

    /// Widen `[start, end]` by `factor` intervals on each side.
    pub fn extend_span(
        &self,
        start: f64,
        end: f64,
        interval: Interval,
        factor: i64,
    ) -> Result<(f64, f64)> {
        let start = self.shift_od(start, &[interval.scaled(-factor)])?;
        let end = self.shift_od(end, &[interval.scaled(factor)])?;
        Ok((start, end))
    }

    /// `"<hr date> <hr time>"`, e.g. `2024/3/5/CE 02:05:09:PM`.
    pub fn format_od(&self, od: f64, labeled: bool) -> Result<String> {
        let (ymd, hms) = self.od_to_ast_ymd(od)?;
        Ok(format!(
            "{} {}",
            self.calendar.format_hr_date(ymd)?,
            self.clock.hms_to_hr_time(hms, labeled)?
        ))
    }

    // ── Display intervals ───────────────────────────────────────────────────

    /// Nominal length of `interval` in seconds: months and years count at
    /// their shortest length in this calendar.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::IllegalUnit`] for `Era`, which has no fixed
    /// length, and for `Month` on a monthless calendar.
    pub fn interval_seconds(&self, interval: Interval) -> Result<i128> {
        let def = self.calendar.definition();
        let day = i128::from(self.clock.seconds_in_day());
        let unit = match interval.unit {
            Unit::Second | Unit::Minute | Unit::Hour => {
                i128::from(self.clock.unit_seconds(interval.unit)?)
            }
            Unit::Day => day,
            Unit::Month => {
                let shortest = self.shortest_month().ok_or_else(|| {
                    CalendarError::IllegalUnit(format!(
                        "'{}' has no months",
                        self.calendar.name()
                    ))
                })?;
                i128::from(shortest) * day
            }
            Unit::Year => i128::from(def.common_year_days().min(def.leap_year_days())) * day,
            Unit::Era => {
                return Err(CalendarError::IllegalUnit(
                    "an era has no fixed length".to_string(),
                ));
            }
        };
        Ok(i128::from(interval.delta) * unit)
    }

    /// The next coarser (`increase`) or finer display interval.
    ///
    /// Intervals form one ladder ordered by nominal length: second steps
    /// dividing the minute, then minute, hour, day, month steps, and a
    /// fixed ladder of year steps up to 100 000 years. Stepping past
    /// either end stays at the end. An interval that is not on the ladder
    /// moves to the nearest rung in the requested direction.
    ///
    /// ```
    /// use calendar_engine::{presets, CalendarOps, ClockOps, DateTimeOps, Interval};
    ///
    /// let ops = DateTimeOps::new(
    ///     CalendarOps::new(presets::gregorian()),
    ///     ClockOps::new(presets::earth_clock()),
    /// );
    /// assert_eq!(ops.change_interval(Interval::days(1), false).unwrap(), Interval::hours(12));
    /// assert_eq!(ops.change_interval(Interval::months(6), true).unwrap(), Interval::years(1));
    /// ```
    pub fn change_interval(&self, interval: Interval, increase: bool) -> Result<Interval> {
        let current = self.interval_seconds(interval)?;
        let last = self.ladder.len() - 1;
        let index = match self.ladder.iter().position(|&(rung, _)| rung == interval) {
            Some(i) if increase => (i + 1).min(last),
            Some(i) => i.saturating_sub(1),
            None if increase => self
                .ladder
                .iter()
                .position(|&(_, secs)| secs > current)
                .unwrap_or(last),
            None => self
                .ladder
                .iter()
                .rposition(|&(_, secs)| secs < current)
                .unwrap_or(0),
        };
        Ok(self.ladder[index].0)
    }

    /// Every rung of the display-interval ladder, finest first.
    pub fn intervals(&self) -> impl Iterator<Item = Interval> + '_ {
        self.ladder.iter().map(|&(interval, _)| interval)
    }

    fn shortest_month(&self) -> Option<u32> {
        let def = self.calendar.definition();
        if def.is_monthless() {
            return None;
        }
        let leap: &[u32] = if def.has_leap_year {
            def.month_days(true)
        } else {
            &[]
        };
        def.month_days(false).iter().chain(leap).copied().min()
    }

    fn fewest_months(&self) -> Option<u32> {
        let def = self.calendar.definition();
        if def.is_monthless() {
            return None;
        }
        let common = def.month_days(false).len();
        let months = if def.has_leap_year {
            common.min(def.month_days(true).len())
        } else {
            common
        };
        u32::try_from(months).ok()
    }

    fn build_ladder(&self) -> Vec<(Interval, i128)> {
        let clock = self.clock.definition();
        let def = self.calendar.definition();

        let mut candidates: Vec<Interval> = Vec::new();
        candidates.push(Interval::seconds(1));
        candidates.extend(exclusive_divisors(clock.seconds_in_minute).map(Interval::seconds));
        candidates.extend(exclusive_divisors(clock.minutes_in_hour).map(Interval::minutes));
        candidates.extend(exclusive_divisors(clock.hours_in_day).map(Interval::hours));

        let day_limit = self
            .shortest_month()
            .unwrap_or_else(|| def.common_year_days().min(def.leap_year_days()));
        candidates.extend(
            DAY_STEPS
                .iter()
                .copied()
                .filter(|&d| d == 1 || d < i64::from(day_limit))
                .map(Interval::days),
        );
        if let Some(months) = self.fewest_months() {
            candidates.extend(exclusive_divisors(months).map(Interval::months));
        }
        candidates.extend(YEAR_STEPS.iter().copied().map(Interval::years));

        let mut ladder: Vec<(Interval, i128)> = candidates
            .into_iter()
            .filter_map(|i| self.interval_seconds(i).ok().map(|secs| (i, secs)))
            .collect();
        ladder.sort_by_key(|&(_, secs)| secs);
        ladder.dedup_by_key(|&mut (_, secs)| secs);
        ladder
    }
}
