//! Date arithmetic over a single calendar definition.
//!
//! [`CalendarOps`] binds one [`CalendarDefinition`] and exposes every
//! conversion between the date representations the engine knows about:
//!
//! - [`AstYmd`]: astronomical year / month / day
//! - [`OrdinalDate`]: year and day of year
//! - ordinal: signed day count, day 1 being 1/1/1
//! - [`HrYear`] / [`HrDate`]: era-labelled, human-readable forms
//!
//! Each pair of conversions is an exact inverse; in debug builds the
//! round trip is asserted on every call.
//!
//! All operations are pure. A `CalendarOps` is cheap to clone and can be
//! shared across threads.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};

use crate::conversion::ConversionRegistry;
use crate::definition::CalendarDefinition;
use crate::error::{CalendarError, Result};
use crate::leap::YearTable;
use crate::types::{
    AstYmd, HrDate, HrYear, Interval, OrdinalDate, Unit, ORDINAL_LIMIT, YEAR_LIMIT,
};

/// Julian Day Number of 0001-01-01 in the proleptic Gregorian calendar,
/// minus one (chrono counts that day as day 1 of the common era).
const JDN_BEFORE_CE: i64 = 1_721_425;

const DEFAULT_SEPARATOR: char = '/';

pub(crate) fn check_year(year: i64) -> Result<()> {
    if year.unsigned_abs() > YEAR_LIMIT as u64 {
        return Err(CalendarError::OutOfRange(format!(
            "year {year} exceeds ±{YEAR_LIMIT}"
        )));
    }
    Ok(())
}

pub(crate) fn check_ordinal(ordinal: i64) -> Result<()> {
    if ordinal.unsigned_abs() > ORDINAL_LIMIT as u64 {
        return Err(CalendarError::OutOfRange(format!(
            "ordinal {ordinal} exceeds ±{ORDINAL_LIMIT}"
        )));
    }
    Ok(())
}

/// Where an era sits on the astronomical year line.
#[derive(Debug, Clone, Copy)]
struct EraSpan {
    /// First astronomical year of the era; for the proleptic era, year 0
    /// (which it covers together with every earlier year).
    anchor_year: i64,
    /// Human-readable number of `anchor_year`.
    anchor_label: i64,
    /// +1 when human numbering ascends with astronomical years, -1 otherwise.
    step: i64,
    /// Years covered; `None` when unbounded.
    len: Option<i64>,
    descending: bool,
}

impl EraSpan {
    /// Astronomical year whose human number is `label`, if inside the era.
    fn year_of(&self, label: i64, proleptic: bool) -> Option<i64> {
        if label < 0 {
            return None;
        }
        let offset = label.checked_sub(self.anchor_label)? * self.step;
        let inside = if proleptic {
            offset <= 0
        } else {
            offset >= 0 && self.len.is_none_or(|len| offset < len)
        };
        if inside {
            self.anchor_year.checked_add(offset)
        } else {
            None
        }
    }

    fn label_of(&self, year: i64) -> i64 {
        self.anchor_label + self.step * (year - self.anchor_year)
    }

    /// Astronomically latest year of the era.
    fn last_year(&self, proleptic: bool) -> Option<i64> {
        if proleptic {
            Some(self.anchor_year)
        } else {
            self.len.map(|len| self.anchor_year + len - 1)
        }
    }
}

/// Pure date operations bound to one calendar.
#[derive(Debug, Clone)]
pub struct CalendarOps {
    def: Arc<CalendarDefinition>,
    years: YearTable,
    eras: Vec<EraSpan>,
    separator: char,
}

impl CalendarOps {
    pub fn new(def: CalendarDefinition) -> Self {
        Self::from_shared(Arc::new(def))
    }

    /// Bind to a definition shared with other ops instances.
    pub fn from_shared(def: Arc<CalendarDefinition>) -> Self {
        let years = YearTable::new(&def);
        let eras = era_spans(&def);
        Self {
            def,
            years,
            eras,
            separator: DEFAULT_SEPARATOR,
        }
    }

    /// Use `separator` between the fields of formatted dates (default `/`).
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    pub fn definition(&self) -> &CalendarDefinition {
        &self.def
    }

    pub fn shared_definition(&self) -> Arc<CalendarDefinition> {
        Arc::clone(&self.def)
    }

    /// The calendar's identity, as used by the conversion registry.
    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    // ── Years and months ────────────────────────────────────────────────────

    pub fn is_leap_year(&self, year: i64) -> bool {
        self.years.is_leap(year)
    }

    pub fn days_in_year(&self, year: i64) -> u32 {
        if self.is_leap_year(year) {
            self.def.leap_year_days()
        } else {
            self.def.common_year_days()
        }
    }

    /// Number of months in `year`; `None` for a monthless calendar.
    pub fn months_in_year(&self, year: i64) -> Option<u32> {
        if self.def.is_monthless() {
            None
        } else {
            u32::try_from(self.month_table(year).len()).ok()
        }
    }

    pub fn month_name(&self, year: i64, month: u32) -> Option<&str> {
        let names = self.def.month_names(self.is_leap_year(year));
        let index = usize::try_from(month).ok()?.checked_sub(1)?;
        names.get(index).map(String::as_str)
    }

    /// Days in `month` of `year`; for a monthless calendar pass `None` and
    /// get the year length.
    pub fn days_in_month(&self, year: i64, month: Option<u32>) -> Result<u32> {
        check_year(year)?;
        if !self.is_valid_month(year, month) {
            return Err(CalendarError::InvalidAstYmd(format!(
                "month {month:?} does not exist in year {year} of '{}'",
                self.name()
            )));
        }
        Ok(self.month_length(year, month))
    }

    fn month_table(&self, year: i64) -> &[u32] {
        self.def.month_days(self.is_leap_year(year))
    }

    fn month_count(&self, year: i64) -> i64 {
        self.month_table(year).len() as i64
    }

    /// Length of a month known to be valid.
    fn month_length(&self, year: i64, month: Option<u32>) -> u32 {
        match month {
            None => self.days_in_year(year),
            Some(m) => self.month_table(year)[m as usize - 1],
        }
    }

    // ── Validity ────────────────────────────────────────────────────────────

    /// Whether `month` is a legal month component for `year`. A monthless
    /// calendar only accepts `None`; a calendar with months never does.
    pub fn is_valid_month(&self, year: i64, month: Option<u32>) -> bool {
        match (self.def.is_monthless(), month) {
            (true, None) => true,
            (false, Some(m)) => m >= 1 && m as usize <= self.month_table(year).len(),
            _ => false,
        }
    }

    pub fn is_valid_ast_ymd(&self, ymd: AstYmd) -> bool {
        check_year(ymd.year).is_ok()
            && self.is_valid_month(ymd.year, ymd.month)
            && ymd.day >= 1
            && ymd.day <= self.month_length(ymd.year, ymd.month)
    }

    pub fn is_valid_ordinal_date(&self, date: OrdinalDate) -> bool {
        check_year(date.year).is_ok()
            && date.day >= 1
            && date.day <= self.days_in_year(date.year)
    }

    fn require_ast_ymd(&self, ymd: AstYmd) -> Result<()> {
        check_year(ymd.year)?;
        if !self.is_valid_ast_ymd(ymd) {
            return Err(CalendarError::InvalidAstYmd(format!(
                "{ymd} is not a date in '{}'",
                self.name()
            )));
        }
        Ok(())
    }

    fn require_ordinal_date(&self, date: OrdinalDate) -> Result<()> {
        check_year(date.year)?;
        if !self.is_valid_ordinal_date(date) {
            return Err(CalendarError::InvalidOrdinalDate(format!(
                "day {} is outside year {} of '{}' ({} days)",
                date.day,
                date.year,
                self.name(),
                self.days_in_year(date.year)
            )));
        }
        Ok(())
    }

    // ── Ordinal arithmetic ──────────────────────────────────────────────────

    /// Day count of `date` since the epoch (1/1/1 is ordinal 1, the last
    /// day of year 0 is ordinal 0).
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidOrdinalDate`] if the day of year is
    /// outside `1..=days_in_year`, or [`CalendarError::OutOfRange`] for a
    /// year beyond [`YEAR_LIMIT`].
    pub fn ordinal_date_to_ordinal(&self, date: OrdinalDate) -> Result<i64> {
        self.require_ordinal_date(date)?;
        Ok(self.years.days_before(date.year) + i64::from(date.day))
    }

    /// The (year, day of year) of an ordinal.
    pub fn ordinal_to_ordinal_date(&self, ordinal: i64) -> Result<OrdinalDate> {
        check_ordinal(ordinal)?;
        let (year, before) = self.years.locate(ordinal);
        check_year(year)?;
        let day = u32::try_from(ordinal - before).map_err(|_| {
            CalendarError::OutOfRange(format!("ordinal {ordinal} has no day of year"))
        })?;
        let date = OrdinalDate::new(year, day);
        debug_assert_eq!(self.ordinal_date_to_ordinal(date), Ok(ordinal));
        Ok(date)
    }

    pub fn ast_ymd_to_ordinal_date(&self, ymd: AstYmd) -> Result<OrdinalDate> {
        self.require_ast_ymd(ymd)?;
        let day = match ymd.month {
            None => ymd.day,
            Some(m) => {
                self.month_table(ymd.year)[..m as usize - 1]
                    .iter()
                    .sum::<u32>()
                    + ymd.day
            }
        };
        Ok(OrdinalDate::new(ymd.year, day))
    }

    pub fn ordinal_date_to_ast_ymd(&self, date: OrdinalDate) -> Result<AstYmd> {
        self.require_ordinal_date(date)?;
        if self.def.is_monthless() {
            return Ok(AstYmd::monthless(date.year, date.day));
        }

        let table = self.month_table(date.year);
        let mut day = date.day;
        let mut month = table.len();
        for (i, &len) in table.iter().enumerate() {
            if day <= len {
                month = i + 1;
                break;
            }
            day -= len;
        }
        let ymd = AstYmd::new(date.year, month as u32, day);
        debug_assert_eq!(self.ast_ymd_to_ordinal_date(ymd), Ok(date));
        Ok(ymd)
    }

    pub fn ast_ymd_to_ordinal(&self, ymd: AstYmd) -> Result<i64> {
        self.ordinal_date_to_ordinal(self.ast_ymd_to_ordinal_date(ymd)?)
    }

    pub fn ordinal_to_ast_ymd(&self, ordinal: i64) -> Result<AstYmd> {
        self.ordinal_date_to_ast_ymd(self.ordinal_to_ordinal_date(ordinal)?)
    }

    // ── Eras ────────────────────────────────────────────────────────────────

    pub fn era_count(&self) -> usize {
        self.def.eras.len()
    }

    pub fn era_name(&self, era: usize) -> Option<&str> {
        self.def.eras.get(era).map(String::as_str)
    }

    pub fn era_index(&self, label: &str) -> Option<usize> {
        self.def.eras.iter().position(|e| e == label)
    }

    /// The era and human-readable number of an astronomical year.
    ///
    /// Years up to and including 0 always belong to era 0.
    pub fn ast_to_hr(&self, year: i64) -> Result<HrYear> {
        check_year(year)?;
        let era = if year <= 0 {
            Some(0)
        } else {
            (1..self.eras.len()).find(|&i| {
                let span = &self.eras[i];
                year >= span.anchor_year
                    && span.len.is_none_or(|len| year < span.anchor_year + len)
            })
        };
        let era = era.ok_or_else(|| {
            CalendarError::UnknownEra(format!(
                "no era of '{}' contains year {year}",
                self.name()
            ))
        })?;
        Ok(HrYear::new(self.eras[era].label_of(year), era))
    }

    /// The astronomical year of a human-readable year.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::UnknownEra`] if the era does not exist or
    /// the year number falls outside it.
    pub fn hr_to_ast(&self, hr: HrYear) -> Result<i64> {
        let span = self.eras.get(hr.era).ok_or_else(|| {
            CalendarError::UnknownEra(format!(
                "'{}' has no era #{} ({} eras)",
                self.name(),
                hr.era,
                self.era_count()
            ))
        })?;
        let year = span.year_of(hr.year, hr.era == 0).ok_or_else(|| {
            CalendarError::UnknownEra(format!(
                "year {} is not part of era '{}'",
                hr.year, self.def.eras[hr.era]
            ))
        })?;
        check_year(year)?;
        debug_assert_eq!(self.ast_to_hr(year), Ok(hr));
        Ok(year)
    }

    pub fn ast_ymd_to_hr_date(&self, ymd: AstYmd) -> Result<HrDate> {
        self.require_ast_ymd(ymd)?;
        let hr = self.ast_to_hr(ymd.year)?;
        Ok(HrDate {
            year: hr.year,
            month: ymd.month,
            day: ymd.day,
            era: hr.era,
        })
    }

    pub fn hr_date_to_ast_ymd(&self, date: HrDate) -> Result<AstYmd> {
        let year = self.hr_to_ast(HrYear::new(date.year, date.era))?;
        let ymd = AstYmd {
            year,
            month: date.month,
            day: date.day,
        };
        self.require_ast_ymd(ymd)?;
        Ok(ymd)
    }

    /// Format as `<year>/<month>/<day>/<era>` (or `<year>/<day>/<era>` when
    /// monthless), using the configured separator.
    pub fn format_hr_date(&self, ymd: AstYmd) -> Result<String> {
        let hr = self.ast_ymd_to_hr_date(ymd)?;
        let sep = self.separator;
        let era = &self.def.eras[hr.era];
        Ok(match hr.month {
            Some(month) => format!("{}{sep}{month}{sep}{}{sep}{era}", hr.year, hr.day),
            None => format!("{}{sep}{}{sep}{era}", hr.year, hr.day),
        })
    }

    /// Inverse of [`format_hr_date`](Self::format_hr_date).
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidHrDate`] for malformed text,
    /// [`CalendarError::UnknownEra`] for an unknown era label, and
    /// [`CalendarError::InvalidAstYmd`] if the fields name no real date.
    pub fn parse_hr_date(&self, text: &str) -> Result<AstYmd> {
        let monthless = self.def.is_monthless();
        let fields = if monthless { 3 } else { 4 };
        let parts: Vec<&str> = text.trim().splitn(fields, self.separator).collect();
        if parts.len() != fields {
            return Err(CalendarError::InvalidHrDate(format!(
                "expected {fields} fields separated by '{}' in '{text}'",
                self.separator
            )));
        }

        let number = |s: &str| -> Result<i64> {
            s.trim().parse::<i64>().map_err(|_| {
                CalendarError::InvalidHrDate(format!("'{s}' is not a number in '{text}'"))
            })
        };
        let small = |s: &str| -> Result<u32> {
            s.trim().parse::<u32>().map_err(|_| {
                CalendarError::InvalidHrDate(format!("'{s}' is not a month or day in '{text}'"))
            })
        };

        let year = number(parts[0])?;
        let (month, day) = if monthless {
            (None, small(parts[1])?)
        } else {
            (Some(small(parts[1])?), small(parts[2])?)
        };
        let label = parts[fields - 1].trim();
        let era = self.era_index(label).ok_or_else(|| {
            CalendarError::UnknownEra(format!("'{label}' is not an era of '{}'", self.name()))
        })?;

        self.hr_date_to_ast_ymd(HrDate {
            year,
            month,
            day,
            era,
        })
    }

    // ── Shifting ────────────────────────────────────────────────────────────

    /// Shift a date by one interval.
    ///
    /// - `Era` moves to the first day of the destination era, or to the
    ///   last day of its latest year if the era counts downward.
    /// - `Year` keeps month and day, clamped into the destination year.
    /// - `Month` carries across years and clamps the day.
    /// - `Day` moves by whole days.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidStart`] if `ymd` is not a valid date,
    /// [`CalendarError::IllegalUnit`] for time units or `Month` on a
    /// monthless calendar, and [`CalendarError::OutOfRange`] if the result
    /// leaves the supported range or the era list.
    pub fn next_ast_ymd(&self, ymd: AstYmd, interval: Interval) -> Result<AstYmd> {
        if !self.is_valid_ast_ymd(ymd) {
            return Err(CalendarError::InvalidStart(format!(
                "{ymd} is not a date in '{}'",
                self.name()
            )));
        }
        match interval.unit {
            Unit::Month if self.def.is_monthless() => {
                return Err(CalendarError::IllegalUnit(format!(
                    "'{}' has no months",
                    self.name()
                )));
            }
            unit if unit.is_time_unit() => {
                return Err(CalendarError::IllegalUnit(format!(
                    "{unit} cannot shift a date"
                )));
            }
            _ => {}
        }
        if interval.delta == 0 {
            return Ok(ymd);
        }

        match interval.unit {
            Unit::Era => self.shift_eras(ymd, interval.delta),
            Unit::Year => self.shift_years(ymd, interval.delta),
            Unit::Month => self.shift_months(ymd, interval.delta),
            _ => self.shift_days(ymd, interval.delta),
        }
    }

    /// Apply `intervals` left to right.
    pub fn shift_ast_ymd(&self, ymd: AstYmd, intervals: &[Interval]) -> Result<AstYmd> {
        intervals
            .iter()
            .try_fold(ymd, |acc, &interval| self.next_ast_ymd(acc, interval))
    }

    /// The nearest valid date to (`year`, `month`, `day`), clamping month
    /// and day down.
    fn clamp(&self, year: i64, month: Option<u32>, day: u32) -> AstYmd {
        let month = month.map(|m| m.min(self.month_table(year).len() as u32));
        let day = day.min(self.month_length(year, month));
        AstYmd { year, month, day }
    }

    fn shift_eras(&self, ymd: AstYmd, delta: i64) -> Result<AstYmd> {
        let current = self.ast_to_hr(ymd.year)?.era;
        let target = (current as i64)
            .checked_add(delta)
            .filter(|&t| t >= 0 && (t as usize) < self.eras.len())
            .ok_or_else(|| {
                CalendarError::OutOfRange(format!(
                    "no era {delta:+} from '{}' in '{}'",
                    self.def.eras[current],
                    self.name()
                ))
            })? as usize;

        let span = self.eras[target];
        if span.descending {
            let year = span.last_year(target == 0).ok_or_else(|| {
                CalendarError::OutOfRange(format!(
                    "era '{}' has no last year",
                    self.def.eras[target]
                ))
            })?;
            check_year(year)?;
            let month = self.months_in_year(year);
            Ok(AstYmd {
                year,
                month,
                day: self.month_length(year, month),
            })
        } else {
            let year = span.anchor_year;
            check_year(year)?;
            let month = (!self.def.is_monthless()).then_some(1);
            Ok(AstYmd { year, month, day: 1 })
        }
    }

    fn shift_years(&self, ymd: AstYmd, delta: i64) -> Result<AstYmd> {
        let year = ymd
            .year
            .checked_add(delta)
            .ok_or_else(|| CalendarError::OutOfRange(format!("{ymd} {delta:+} years")))?;
        check_year(year)?;
        Ok(self.clamp(year, ymd.month, ymd.day))
    }

    fn shift_months(&self, ymd: AstYmd, delta: i64) -> Result<AstYmd> {
        let max_months = self
            .def
            .month_days(false)
            .len()
            .max(self.def.month_days(true).len()) as u64;
        if delta.unsigned_abs() / max_months.max(1) > 2 * YEAR_LIMIT as u64 {
            return Err(CalendarError::OutOfRange(format!("{ymd} {delta:+} months")));
        }

        let mut year = ymd.year;
        let mut month = i64::from(ymd.month.unwrap_or(1)) + delta;
        while month > self.month_count(year) {
            month -= self.month_count(year);
            year += 1;
            check_year(year)?;
        }
        while month < 1 {
            year -= 1;
            check_year(year)?;
            month += self.month_count(year);
        }
        // Day overflow always clamps to the destination month's last day,
        // in both directions.
        Ok(self.clamp(year, Some(month as u32), ymd.day))
    }

    fn shift_days(&self, ymd: AstYmd, delta: i64) -> Result<AstYmd> {
        let ordinal = self.ast_ymd_to_ordinal(ymd)?;
        let target = ordinal
            .checked_add(delta)
            .ok_or_else(|| CalendarError::OutOfRange(format!("{ymd} {delta:+} days")))?;
        self.ordinal_to_ast_ymd(target)
    }

    // ── Weeks ───────────────────────────────────────────────────────────────

    /// Days per week; 0 for a weekless calendar.
    pub fn week_length(&self) -> usize {
        self.def.weekday_names.len()
    }

    /// Index into `weekday_names` of the day `ordinal`, `None` if weekless.
    pub fn day_of_week(&self, ordinal: i64) -> Option<usize> {
        let epoch = self.def.epoch_weekday? as i64;
        let week = self.week_length() as i64;
        (week > 0).then(|| (ordinal.rem_euclid(week) + epoch - 1).rem_euclid(week) as usize)
    }

    pub fn weekday_name(&self, ordinal: i64) -> Option<&str> {
        self.day_of_week(ordinal)
            .map(|d| self.def.weekday_names[d].as_str())
    }

    pub fn is_weekend(&self, ordinal: i64) -> bool {
        self.day_of_week(ordinal)
            .is_some_and(|d| self.def.weekends.contains(&d))
    }

    /// Ordinal of the first day of the week containing `ordinal`, weeks
    /// beginning on `weekday_start`.
    pub fn start_of_week(&self, ordinal: i64) -> Option<i64> {
        let start = self.def.weekday_start? as i64;
        let day = self.day_of_week(ordinal)? as i64;
        ordinal.checked_sub((day - start).rem_euclid(self.week_length() as i64))
    }

    /// Ordinal of an occurrence of weekday `target` relative to `ordinal`.
    ///
    /// - `skip > 0`: the `skip`-th occurrence strictly after `ordinal`
    /// - `skip < 0`: the `|skip|`-th occurrence strictly before `ordinal`
    /// - `skip == 0`: `ordinal` itself if it falls on `target`, otherwise
    ///   the next occurrence
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::IllegalUnit`] for a weekless calendar and
    /// [`CalendarError::InvalidWeekday`] if `target` is not a weekday index.
    pub fn shift_n_weekdays(&self, ordinal: i64, target: usize, skip: i64) -> Result<i64> {
        let current = self.day_of_week(ordinal).ok_or_else(|| {
            CalendarError::IllegalUnit(format!("'{}' has no weeks", self.name()))
        })? as i64;
        let week = self.week_length() as i64;
        if target >= self.week_length() {
            return Err(CalendarError::InvalidWeekday(format!(
                "weekday {target} outside a {week}-day week"
            )));
        }
        let target = target as i64;
        let overflow =
            || CalendarError::OutOfRange(format!("{skip} weeks from ordinal {ordinal}"));

        let ahead = (target - current).rem_euclid(week);
        let result = match skip {
            0 => ordinal.checked_add(ahead),
            s if s > 0 => {
                let first = if ahead == 0 { week } else { ahead };
                (s - 1)
                    .checked_mul(week)
                    .and_then(|extra| ordinal.checked_add(first + extra))
            }
            s => {
                let behind = (current - target).rem_euclid(week);
                let first = if behind == 0 { week } else { behind };
                (-(s + 1))
                    .checked_mul(week)
                    .and_then(|extra| ordinal.checked_sub(first + extra))
            }
        }
        .ok_or_else(overflow)?;
        check_ordinal(result)?;
        Ok(result)
    }

    // ── Julian Day bridge ───────────────────────────────────────────────────

    /// Julian Day Number of `ordinal`.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::OutOfRange`] for an ordinal beyond
    /// [`ORDINAL_LIMIT`].
    pub fn ordinal_to_jdn(&self, ordinal: i64) -> Result<i64> {
        check_ordinal(ordinal)?;
        // jd_epoch is bounded by ORDINAL_LIMIT at validation.
        Ok(self.def.jd_epoch + ordinal - 1)
    }

    /// Ordinal of the day with Julian Day Number `jdn`.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::OutOfRange`] if the ordinal would fall
    /// beyond [`ORDINAL_LIMIT`].
    pub fn jdn_to_ordinal(&self, jdn: i64) -> Result<i64> {
        let ordinal = jdn
            .checked_sub(self.def.jd_epoch)
            .and_then(|d| d.checked_add(1))
            .ok_or_else(|| CalendarError::OutOfRange(format!("Julian Day {jdn}")))?;
        check_ordinal(ordinal)?;
        Ok(ordinal)
    }

    /// The proleptic Gregorian [`NaiveDate`] of `ordinal`, or `None` outside
    /// chrono's range.
    pub fn ordinal_to_naive_date(&self, ordinal: i64) -> Option<NaiveDate> {
        let days = self.ordinal_to_jdn(ordinal).ok()? - JDN_BEFORE_CE;
        i32::try_from(days)
            .ok()
            .and_then(NaiveDate::from_num_days_from_ce_opt)
    }

    pub fn naive_date_to_ordinal(&self, date: NaiveDate) -> i64 {
        // chrono's range is a few hundred million days, far inside the
        // bound on jd_epoch.
        i64::from(date.num_days_from_ce()) + JDN_BEFORE_CE - self.def.jd_epoch + 1
    }

    // ── Cross-calendar conversion ───────────────────────────────────────────

    /// Express a date of the `foreign` calendar in this calendar, through
    /// the synchronizing ordinals registered for the pair.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::ConversionMissing`] if `registry` has no
    /// entry linking the two calendars, or any error from validating
    /// `foreign_ymd`.
    pub fn convert_ast_ymd(
        &self,
        foreign_ymd: AstYmd,
        foreign: &CalendarOps,
        registry: &ConversionRegistry,
    ) -> Result<AstYmd> {
        let foreign_ordinal = foreign.ast_ymd_to_ordinal(foreign_ymd)?;
        let native_ordinal =
            registry.convert_ordinal(self.name(), foreign.name(), foreign_ordinal)?;
        self.ordinal_to_ast_ymd(native_ordinal)
    }
}

fn era_spans(def: &CalendarDefinition) -> Vec<EraSpan> {
    let mut spans = Vec::with_capacity(def.era_ranges.len());
    let mut next_year = 1i64;
    for (i, range) in def.era_ranges.iter().enumerate() {
        if i == 0 {
            spans.push(EraSpan {
                anchor_year: 0,
                anchor_label: range.end.unwrap_or(0) + 1,
                step: -1,
                len: None,
                descending: true,
            });
            continue;
        }
        let descending = range.is_descending();
        let len = range.len();
        spans.push(EraSpan {
            anchor_year: next_year,
            anchor_label: range.start.unwrap_or(0),
            step: if descending { -1 } else { 1 },
            len,
            descending,
        });
        next_year += len.unwrap_or(0);
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{CalendarSchema, EraRange};
    use crate::presets;

    fn gregorian() -> CalendarOps {
        CalendarOps::new(presets::gregorian())
    }

    fn ymd(y: i64, m: u32, d: u32) -> AstYmd {
        AstYmd::new(y, m, d)
    }

    /// A 19-year cycle with a 13th month in 7 of the years.
    fn lunisolar() -> CalendarOps {
        let months: Vec<String> = (1..=12).map(|m| format!("M{m}")).collect();
        let mut leap_months = months.clone();
        leap_months.insert(5, "M6b".to_string());
        let schema = CalendarSchema {
            name: "Lunisolar".to_string(),
            weekday_names: Vec::new(),
            epoch_weekday: None,
            weekday_start: None,
            weekends: Default::default(),
            common_year_month_names: months,
            days_in_common_year_months: vec![30, 29, 30, 29, 30, 29, 30, 29, 30, 29, 30, 29],
            leap_year_month_names: leap_months,
            days_in_leap_year_months: vec![30, 29, 30, 29, 30, 30, 29, 30, 29, 30, 29, 30, 29],
            has_leap_year: true,
            leap_year_cycles: vec![19],
            leap_year_cycle_start: Some(1),
            leap_year_cycle_ordinals: [3, 6, 8, 11, 14, 17, 19].into_iter().collect(),
            leap_year_offset: Some(0),
            special_common_years: Default::default(),
            special_leap_years: Default::default(),
            eras: vec!["BW".to_string(), "AW".to_string()],
            era_ranges: vec![EraRange::new(None, Some(0)), EraRange::new(Some(1), None)],
            jd_epoch: 347_998,
        };
        CalendarOps::new(CalendarDefinition::try_from(schema).unwrap())
    }

    /// Monthless, weekless, with a descending middle era.
    fn tally() -> CalendarOps {
        let schema = CalendarSchema {
            name: "Tally".to_string(),
            weekday_names: Vec::new(),
            epoch_weekday: None,
            weekday_start: None,
            weekends: Default::default(),
            common_year_month_names: Vec::new(),
            days_in_common_year_months: vec![100],
            leap_year_month_names: Vec::new(),
            days_in_leap_year_months: vec![101],
            has_leap_year: true,
            leap_year_cycles: vec![5],
            leap_year_cycle_start: Some(1),
            leap_year_cycle_ordinals: [5].into_iter().collect(),
            leap_year_offset: Some(0),
            special_common_years: Default::default(),
            special_leap_years: Default::default(),
            eras: vec![
                "Dawn".to_string(),
                "Countdown".to_string(),
                "Age".to_string(),
            ],
            era_ranges: vec![
                EraRange::new(None, Some(0)),
                EraRange::new(Some(10), Some(0)),
                EraRange::new(Some(1), None),
            ],
            jd_epoch: 2_000_000,
        };
        CalendarOps::new(CalendarDefinition::try_from(schema).unwrap())
    }

    // ── Ordinals ────────────────────────────────────────────────────────

    #[test]
    fn test_ordinal_scenarios() {
        let cal = gregorian();
        let ord = |y, d| cal.ordinal_date_to_ordinal(OrdinalDate::new(y, d)).unwrap();
        assert_eq!(ord(1, 1), 1);
        assert_eq!(ord(2, 365), 730);
        assert_eq!(ord(0, 366), 0);
        assert_eq!(ord(-1, 365), -366);
    }

    #[test]
    fn test_year_zero_boundaries() {
        let cal = gregorian();
        assert_eq!(cal.ordinal_to_ordinal_date(0).unwrap(), OrdinalDate::new(0, 366));
        // N = days_in_year(0) - 1
        let n = i64::from(cal.days_in_year(0)) - 1;
        assert_eq!(cal.ordinal_to_ordinal_date(-n).unwrap(), OrdinalDate::new(0, 1));
        assert_eq!(
            cal.ordinal_to_ordinal_date(-n - 1).unwrap(),
            OrdinalDate::new(-1, 365)
        );
        assert_eq!(cal.ordinal_to_ast_ymd(0).unwrap(), ymd(0, 12, 31));
        assert_eq!(cal.ordinal_to_ast_ymd(1).unwrap(), ymd(1, 1, 1));
    }

    #[test]
    fn test_invalid_ordinal_date() {
        let cal = gregorian();
        for date in [
            OrdinalDate::new(2021, 0),
            OrdinalDate::new(2021, 366),
            OrdinalDate::new(1900, 366),
        ] {
            let err = cal.ordinal_date_to_ordinal(date).unwrap_err();
            assert!(matches!(err, CalendarError::InvalidOrdinalDate(_)), "{date}");
        }
        assert!(cal.ordinal_date_to_ordinal(OrdinalDate::new(2000, 366)).is_ok());
    }

    #[test]
    fn test_out_of_range_year() {
        let cal = gregorian();
        let err = cal
            .ordinal_date_to_ordinal(OrdinalDate::new(YEAR_LIMIT + 1, 1))
            .unwrap_err();
        assert!(matches!(err, CalendarError::OutOfRange(_)));
        let err = cal.ordinal_to_ordinal_date(i64::MAX).unwrap_err();
        assert!(matches!(err, CalendarError::OutOfRange(_)));
    }

    #[test]
    fn test_ymd_to_ordinal_date() {
        let cal = gregorian();
        assert_eq!(
            cal.ast_ymd_to_ordinal_date(ymd(2020, 3, 1)).unwrap(),
            OrdinalDate::new(2020, 61)
        );
        assert_eq!(
            cal.ast_ymd_to_ordinal_date(ymd(2021, 3, 1)).unwrap(),
            OrdinalDate::new(2021, 60)
        );
        assert_eq!(
            cal.ordinal_date_to_ast_ymd(OrdinalDate::new(2020, 366)).unwrap(),
            ymd(2020, 12, 31)
        );
        assert_eq!(
            cal.ordinal_date_to_ast_ymd(OrdinalDate::new(2020, 60)).unwrap(),
            ymd(2020, 2, 29)
        );
    }

    #[test]
    fn test_month_sentinel_required() {
        let cal = gregorian();
        assert!(!cal.is_valid_ast_ymd(AstYmd::monthless(2020, 1)));
        assert!(!cal.is_valid_month(2020, Some(0)));
        assert!(!cal.is_valid_month(2020, Some(13)));

        let tally = tally();
        assert!(tally.is_valid_ast_ymd(AstYmd::monthless(3, 100)));
        assert!(!tally.is_valid_ast_ymd(AstYmd::new(3, 1, 1)));
        assert!(!tally.is_valid_ast_ymd(AstYmd::monthless(3, 101)));
        assert!(tally.is_valid_ast_ymd(AstYmd::monthless(5, 101)));
        assert_eq!(
            tally.ast_ymd_to_ordinal_date(AstYmd::monthless(5, 42)).unwrap(),
            OrdinalDate::new(5, 42)
        );
    }

    #[test]
    fn test_leap_months_vary_month_count() {
        let cal = lunisolar();
        assert_eq!(cal.months_in_year(1), Some(12));
        assert_eq!(cal.months_in_year(3), Some(13));
        assert_eq!(cal.month_name(3, 6), Some("M6b"));
        assert_eq!(cal.month_name(2, 6), Some("M6"));
        assert_eq!(cal.days_in_year(3), 384);
        assert_eq!(cal.days_in_year(2), 354);
        assert!(cal.is_valid_ast_ymd(ymd(3, 13, 29)));
        assert!(!cal.is_valid_ast_ymd(ymd(2, 13, 1)));
    }

    #[test]
    fn test_days_in_month() {
        let cal = gregorian();
        assert_eq!(cal.days_in_month(2020, Some(2)).unwrap(), 29);
        assert_eq!(cal.days_in_month(2019, Some(2)).unwrap(), 28);
        assert!(cal.days_in_month(2019, None).is_err());
        assert_eq!(tally().days_in_month(4, None).unwrap(), 100);
    }

    // ── Eras ────────────────────────────────────────────────────────────

    #[test]
    fn test_gregorian_eras() {
        let cal = gregorian();
        assert_eq!(cal.ast_to_hr(1).unwrap(), HrYear::new(1, 1));
        assert_eq!(cal.era_name(1), Some("CE"));
        assert_eq!(cal.ast_to_hr(0).unwrap(), HrYear::new(1, 0));
        assert_eq!(cal.era_name(0), Some("BCE"));
        assert_eq!(cal.ast_to_hr(-1).unwrap(), HrYear::new(2, 0));
        assert_eq!(cal.hr_to_ast(HrYear::new(44, 0)).unwrap(), -43);
        assert_eq!(cal.hr_to_ast(HrYear::new(2024, 1)).unwrap(), 2024);
    }

    #[test]
    fn test_hr_year_outside_era() {
        let cal = gregorian();
        for hr in [HrYear::new(0, 0), HrYear::new(0, 1), HrYear::new(-3, 1), HrYear::new(5, 2)] {
            let err = cal.hr_to_ast(hr).unwrap_err();
            assert!(matches!(err, CalendarError::UnknownEra(_)), "{hr:?}");
        }
    }

    #[test]
    fn test_descending_middle_era() {
        let cal = tally();
        // Countdown covers astronomical years 1..=10 labelled 10 down to 1.
        assert_eq!(cal.ast_to_hr(0).unwrap(), HrYear::new(1, 0));
        assert_eq!(cal.ast_to_hr(1).unwrap(), HrYear::new(10, 1));
        assert_eq!(cal.ast_to_hr(10).unwrap(), HrYear::new(1, 1));
        assert_eq!(cal.ast_to_hr(11).unwrap(), HrYear::new(1, 2));
        assert_eq!(cal.ast_to_hr(20).unwrap(), HrYear::new(10, 2));
        for year in -30..40 {
            let hr = cal.ast_to_hr(year).unwrap();
            assert_eq!(cal.hr_to_ast(hr).unwrap(), year);
        }
        assert!(cal.hr_to_ast(HrYear::new(11, 1)).is_err());
        assert!(cal.hr_to_ast(HrYear::new(0, 1)).is_err());
    }

    #[test]
    fn test_format_and_parse_hr_date() {
        let cal = gregorian();
        assert_eq!(cal.format_hr_date(ymd(2024, 3, 5)).unwrap(), "2024/3/5/CE");
        assert_eq!(cal.format_hr_date(ymd(-43, 3, 15)).unwrap(), "44/3/15/BCE");
        assert_eq!(cal.parse_hr_date("44/3/15/BCE").unwrap(), ymd(-43, 3, 15));

        let dashed = gregorian().with_separator('-');
        assert_eq!(dashed.format_hr_date(ymd(1, 1, 1)).unwrap(), "1-1-1-CE");
        assert_eq!(dashed.parse_hr_date("1-1-1-CE").unwrap(), ymd(1, 1, 1));

        let tally = tally();
        assert_eq!(
            tally.format_hr_date(AstYmd::monthless(2, 7)).unwrap(),
            "9/7/Countdown"
        );
        assert_eq!(
            tally.parse_hr_date("9/7/Countdown").unwrap(),
            AstYmd::monthless(2, 7)
        );
    }

    #[test]
    fn test_parse_hr_date_errors() {
        let cal = gregorian();
        assert!(matches!(
            cal.parse_hr_date("2024/3/CE"),
            Err(CalendarError::InvalidHrDate(_))
        ));
        assert!(matches!(
            cal.parse_hr_date("2024/x/1/CE"),
            Err(CalendarError::InvalidHrDate(_))
        ));
        assert!(matches!(
            cal.parse_hr_date("2024/3/1/AD"),
            Err(CalendarError::UnknownEra(_))
        ));
        assert!(matches!(
            cal.parse_hr_date("2023/2/29/CE"),
            Err(CalendarError::InvalidAstYmd(_))
        ));
    }

    // ── Shifting ────────────────────────────────────────────────────────

    #[test]
    fn test_shift_scenarios() {
        let cal = gregorian();
        assert_eq!(
            cal.shift_ast_ymd(ymd(2020, 1, 31), &[Interval::months(1)]).unwrap(),
            ymd(2020, 2, 29)
        );
        assert_eq!(
            cal.shift_ast_ymd(ymd(2020, 2, 29), &[Interval::years(1)]).unwrap(),
            ymd(2021, 2, 28)
        );
        assert_eq!(
            cal.shift_ast_ymd(ymd(2020, 2, 29), &[Interval::years(-1)]).unwrap(),
            ymd(2019, 2, 28)
        );
    }

    #[test]
    fn test_zero_shift_is_identity() {
        let cal = gregorian();
        let start = ymd(2020, 2, 29);
        for unit in [Unit::Era, Unit::Year, Unit::Month, Unit::Day] {
            assert_eq!(cal.next_ast_ymd(start, Interval::new(0, unit)).unwrap(), start);
        }
    }

    #[test]
    fn test_month_shift_across_years() {
        let cal = gregorian();
        assert_eq!(
            cal.next_ast_ymd(ymd(2020, 11, 15), Interval::months(3)).unwrap(),
            ymd(2021, 2, 15)
        );
        assert_eq!(
            cal.next_ast_ymd(ymd(2020, 3, 31), Interval::months(-1)).unwrap(),
            ymd(2020, 2, 29)
        );
        assert_eq!(
            cal.next_ast_ymd(ymd(2020, 1, 31), Interval::months(-14)).unwrap(),
            ymd(2018, 11, 30)
        );
        assert_eq!(
            cal.next_ast_ymd(ymd(1, 1, 1), Interval::months(-1)).unwrap(),
            ymd(0, 12, 1)
        );
    }

    #[test]
    fn test_month_shift_through_leap_month() {
        let cal = lunisolar();
        // Year 3 has 13 months, so 12 months from 3/1 is still in year 3.
        assert_eq!(
            cal.next_ast_ymd(ymd(3, 1, 1), Interval::months(12)).unwrap(),
            ymd(3, 13, 1)
        );
        assert_eq!(
            cal.next_ast_ymd(ymd(3, 13, 29), Interval::years(1)).unwrap(),
            ymd(4, 12, 29)
        );
    }

    #[test]
    fn test_day_shift_spills_across_months_and_years() {
        let cal = gregorian();
        assert_eq!(
            cal.next_ast_ymd(ymd(2020, 2, 28), Interval::days(2)).unwrap(),
            ymd(2020, 3, 1)
        );
        assert_eq!(
            cal.next_ast_ymd(ymd(2021, 1, 1), Interval::days(-1)).unwrap(),
            ymd(2020, 12, 31)
        );
        assert_eq!(
            cal.next_ast_ymd(ymd(2020, 1, 1), Interval::days(366)).unwrap(),
            ymd(2021, 1, 1)
        );
    }

    #[test]
    fn test_era_shift() {
        let cal = gregorian();
        assert_eq!(
            cal.next_ast_ymd(ymd(2020, 6, 15), Interval::eras(-1)).unwrap(),
            ymd(0, 12, 31)
        );
        assert_eq!(
            cal.next_ast_ymd(ymd(-500, 6, 15), Interval::eras(1)).unwrap(),
            ymd(1, 1, 1)
        );
        let err = cal
            .next_ast_ymd(ymd(2020, 6, 15), Interval::eras(1))
            .unwrap_err();
        assert!(matches!(err, CalendarError::OutOfRange(_)));

        let tally = tally();
        assert_eq!(
            tally
                .next_ast_ymd(AstYmd::monthless(15, 3), Interval::eras(-1))
                .unwrap(),
            AstYmd::monthless(10, 101)
        );
        assert_eq!(
            tally
                .next_ast_ymd(AstYmd::monthless(-15, 3), Interval::eras(2))
                .unwrap(),
            AstYmd::monthless(11, 1)
        );
    }

    #[test]
    fn test_shift_errors() {
        let cal = gregorian();
        assert!(matches!(
            cal.next_ast_ymd(ymd(2021, 2, 29), Interval::days(1)),
            Err(CalendarError::InvalidStart(_))
        ));
        assert!(matches!(
            cal.next_ast_ymd(ymd(2021, 2, 1), Interval::hours(1)),
            Err(CalendarError::IllegalUnit(_))
        ));
        assert!(matches!(
            tally().next_ast_ymd(AstYmd::monthless(1, 1), Interval::months(1)),
            Err(CalendarError::IllegalUnit(_))
        ));
        assert!(matches!(
            cal.next_ast_ymd(ymd(2021, 2, 1), Interval::years(YEAR_LIMIT)),
            Err(CalendarError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_year_shifts_commute() {
        let cal = gregorian();
        let start = ymd(2019, 8, 17);
        let a = cal
            .shift_ast_ymd(start, &[Interval::years(3), Interval::years(-5)])
            .unwrap();
        let b = cal
            .shift_ast_ymd(start, &[Interval::years(-5), Interval::years(3)])
            .unwrap();
        assert_eq!(a, b);
    }

    // ── Weeks ───────────────────────────────────────────────────────────

    #[test]
    fn test_day_of_week() {
        let cal = gregorian();
        // 0001-01-01 was a Monday; 2000-01-01 a Saturday.
        assert_eq!(cal.weekday_name(1), Some("Monday"));
        let y2k = cal.ast_ymd_to_ordinal(ymd(2000, 1, 1)).unwrap();
        assert_eq!(cal.weekday_name(y2k), Some("Saturday"));
        assert!(cal.is_weekend(y2k));
        assert!(!cal.is_weekend(y2k + 2));
        assert_eq!(cal.day_of_week(0), Some(6));
        assert_eq!(tally().day_of_week(5), None);
    }

    #[test]
    fn test_shift_n_weekdays() {
        let cal = gregorian();
        // 2026-02-18 is a Wednesday (index 2).
        let wed = cal.ast_ymd_to_ordinal(ymd(2026, 2, 18)).unwrap();
        assert_eq!(cal.day_of_week(wed), Some(2));
        assert_eq!(cal.shift_n_weekdays(wed, 0, 1).unwrap(), wed + 5);
        assert_eq!(cal.shift_n_weekdays(wed, 2, 1).unwrap(), wed + 7);
        assert_eq!(cal.shift_n_weekdays(wed, 4, 2).unwrap(), wed + 9);
        assert_eq!(cal.shift_n_weekdays(wed, 0, -1).unwrap(), wed - 2);
        assert_eq!(cal.shift_n_weekdays(wed, 2, -1).unwrap(), wed - 7);
        assert_eq!(cal.shift_n_weekdays(wed, 2, 0).unwrap(), wed);
        assert_eq!(cal.shift_n_weekdays(wed, 3, 0).unwrap(), wed + 1);
        assert!(matches!(
            cal.shift_n_weekdays(wed, 7, 1),
            Err(CalendarError::InvalidWeekday(_))
        ));
        assert!(matches!(
            tally().shift_n_weekdays(1, 0, 1),
            Err(CalendarError::IllegalUnit(_))
        ));
    }

    #[test]
    fn test_start_of_week() {
        let cal = gregorian();
        let wed = cal.ast_ymd_to_ordinal(ymd(2026, 2, 18)).unwrap();
        assert_eq!(cal.start_of_week(wed), Some(wed - 2));
        let mon = wed - 2;
        assert_eq!(cal.start_of_week(mon), Some(mon));
    }

    // ── Julian Day bridge ───────────────────────────────────────────────

    #[test]
    fn test_jdn_bridge() {
        let cal = gregorian();
        let y2k = cal.ast_ymd_to_ordinal(ymd(2000, 1, 1)).unwrap();
        assert_eq!(cal.ordinal_to_jdn(y2k).unwrap(), 2_451_545);
        assert_eq!(cal.jdn_to_ordinal(2_451_545).unwrap(), y2k);
        let date = cal.ordinal_to_naive_date(y2k).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        assert_eq!(cal.naive_date_to_ordinal(date), y2k);

        let julian = CalendarOps::new(presets::julian());
        let o = julian.ast_ymd_to_ordinal(ymd(1582, 10, 4)).unwrap();
        assert_eq!(
            julian.ordinal_to_naive_date(o + 1),
            NaiveDate::from_ymd_opt(1582, 10, 15)
        );
    }

    #[test]
    fn test_jdn_bridge_extremes() {
        let cal = gregorian();
        for jdn in [i64::MIN, i64::MAX] {
            let err = cal.jdn_to_ordinal(jdn).unwrap_err();
            assert!(matches!(err, CalendarError::OutOfRange(_)), "got: {err}");
        }
        assert!(matches!(
            cal.ordinal_to_jdn(i64::MAX),
            Err(CalendarError::OutOfRange(_))
        ));
        assert_eq!(cal.ordinal_to_naive_date(i64::MIN), None);
        // i64::MAX ≡ 0 and i64::MIN ≡ 6 (mod 7).
        assert_eq!(cal.day_of_week(i64::MAX), Some(6));
        assert_eq!(cal.day_of_week(i64::MIN), Some(5));
        assert_eq!(cal.start_of_week(i64::MIN), None);
    }
}
