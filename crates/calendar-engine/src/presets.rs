//! Ready-made definitions for common historical calendars and the Earth
//! clock.
//!
//! Every preset counts weekdays Monday-first and is anchored to the Julian
//! Day of its epoch, so [`standard_registry`] can synchronize them all.
//!
//! The Solar Hijri preset uses the arithmetic 33-year cycle. It agrees with
//! the astronomical calendar in use today for most, but not all, years.

use std::collections::BTreeSet;

use crate::clock::{ClockDefinition, ClockSchema};
use crate::conversion::{CalendarConversion, ConversionRegistry};
use crate::definition::{CalendarDefinition, CalendarSchema, EraRange};
use crate::error::Result;

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const ROMAN_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const ROMAN_COMMON: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
const ROMAN_LEAP: [u32; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Positions 4, 8, … 400 of a 400-year cycle, except 100, 200, 300.
fn gregorian_ordinals() -> BTreeSet<u32> {
    (1..=400)
        .filter(|y| y % 4 == 0 && (y % 100 != 0 || y % 400 == 0))
        .collect()
}

/// The common shape of every preset: a week, a leap cycle, and two eras
/// split at the epoch.
struct Preset<'a> {
    name: &'a str,
    months: &'a [&'a str],
    common: &'a [u32],
    leap: &'a [u32],
    cycles: Vec<u32>,
    cycle_start: u32,
    ordinals: BTreeSet<u32>,
    offset: i64,
    eras: [&'a str; 2],
    epoch_weekday: usize,
    weekday_start: usize,
    weekends: &'a [usize],
    jd_epoch: i64,
}

impl Preset<'_> {
    fn build(self) -> CalendarDefinition {
        CalendarDefinition::preset(CalendarSchema {
            name: self.name.to_string(),
            weekday_names: names(&WEEKDAYS),
            epoch_weekday: Some(self.epoch_weekday),
            weekday_start: Some(self.weekday_start),
            weekends: self.weekends.iter().copied().collect(),
            common_year_month_names: names(self.months),
            days_in_common_year_months: self.common.to_vec(),
            leap_year_month_names: names(self.months),
            days_in_leap_year_months: self.leap.to_vec(),
            has_leap_year: true,
            leap_year_cycles: self.cycles,
            leap_year_cycle_start: Some(self.cycle_start),
            leap_year_cycle_ordinals: self.ordinals,
            leap_year_offset: Some(self.offset),
            special_common_years: BTreeSet::new(),
            special_leap_years: BTreeSet::new(),
            eras: names(&self.eras),
            era_ranges: vec![EraRange::new(None, Some(0)), EraRange::new(Some(1), None)],
            jd_epoch: self.jd_epoch,
        })
    }
}

/// Proleptic Gregorian; 1/1/1 is Monday, JDN 1721426.
pub fn gregorian() -> CalendarDefinition {
    Preset {
        name: "Gregorian",
        months: &ROMAN_MONTHS,
        common: &ROMAN_COMMON,
        leap: &ROMAN_LEAP,
        cycles: vec![400],
        cycle_start: 1,
        ordinals: gregorian_ordinals(),
        offset: 0,
        eras: ["BCE", "CE"],
        epoch_weekday: 0,
        weekday_start: 0,
        weekends: &[5, 6],
        jd_epoch: 1_721_426,
    }
    .build()
}

/// Proleptic Julian; 1/1/1 is Saturday, JDN 1721424.
pub fn julian() -> CalendarDefinition {
    Preset {
        name: "Julian",
        months: &ROMAN_MONTHS,
        common: &ROMAN_COMMON,
        leap: &ROMAN_LEAP,
        cycles: vec![4],
        cycle_start: 1,
        ordinals: [4].into_iter().collect(),
        offset: 0,
        eras: ["BC", "AD"],
        epoch_weekday: 5,
        weekday_start: 6,
        weekends: &[5, 6],
        jd_epoch: 1_721_424,
    }
    .build()
}

/// Coptic (Era of Martyrs); 1 Thout 1 AM is 29 August 284 (Julian).
pub fn coptic() -> CalendarDefinition {
    const MONTHS: [&str; 13] = [
        "Thout",
        "Paopi",
        "Hathor",
        "Koiak",
        "Tobi",
        "Meshir",
        "Paremhat",
        "Parmouti",
        "Pashons",
        "Paoni",
        "Epip",
        "Mesori",
        "Pi Kogi Enavot",
    ];
    Preset {
        name: "Coptic",
        months: &MONTHS,
        common: &[30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 5],
        leap: &[30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 6],
        cycles: vec![4],
        cycle_start: 1,
        ordinals: [3].into_iter().collect(),
        offset: 0,
        eras: ["BAM", "AM"],
        epoch_weekday: 4,
        weekday_start: 6,
        weekends: &[5, 6],
        jd_epoch: 1_825_030,
    }
    .build()
}

/// Tabular Islamic calendar with the common 30-year leap pattern and the
/// civil (Friday) epoch.
pub fn lunar_hijri() -> CalendarDefinition {
    const MONTHS: [&str; 12] = [
        "Muharram",
        "Safar",
        "Rabi al-Awwal",
        "Rabi al-Thani",
        "Jumada al-Awwal",
        "Jumada al-Thani",
        "Rajab",
        "Shaban",
        "Ramadan",
        "Shawwal",
        "Dhu al-Qadah",
        "Dhu al-Hijjah",
    ];
    Preset {
        name: "Lunar Hijri",
        months: &MONTHS,
        common: &[30, 29, 30, 29, 30, 29, 30, 29, 30, 29, 30, 29],
        leap: &[30, 29, 30, 29, 30, 29, 30, 29, 30, 29, 30, 30],
        cycles: vec![30],
        cycle_start: 1,
        ordinals: [2, 5, 7, 10, 13, 16, 18, 21, 24, 26, 29].into_iter().collect(),
        offset: 0,
        eras: ["BH", "AH"],
        epoch_weekday: 4,
        weekday_start: 5,
        weekends: &[4, 5],
        jd_epoch: 1_948_440,
    }
    .build()
}

/// Indian national calendar (Saka era). Saka year `y` is leap exactly when
/// Gregorian year `y + 78` is.
pub fn indian_civil() -> CalendarDefinition {
    const MONTHS: [&str; 12] = [
        "Chaitra",
        "Vaishakha",
        "Jyeshtha",
        "Ashadha",
        "Shravana",
        "Bhadra",
        "Ashwin",
        "Kartika",
        "Agrahayana",
        "Pausha",
        "Magha",
        "Phalguna",
    ];
    Preset {
        name: "Indian Civil",
        months: &MONTHS,
        common: &[30, 31, 31, 31, 31, 31, 30, 30, 30, 30, 30, 30],
        leap: &[31, 31, 31, 31, 31, 31, 30, 30, 30, 30, 30, 30],
        cycles: vec![400],
        cycle_start: 1,
        ordinals: gregorian_ordinals(),
        offset: -78,
        eras: ["BSE", "SE"],
        epoch_weekday: 2,
        weekday_start: 6,
        weekends: &[6],
        jd_epoch: 1_749_995,
    }
    .build()
}

/// Solar Hijri with the 33-year arithmetic leap cycle.
pub fn solar_hijri() -> CalendarDefinition {
    const MONTHS: [&str; 12] = [
        "Farvardin",
        "Ordibehesht",
        "Khordad",
        "Tir",
        "Mordad",
        "Shahrivar",
        "Mehr",
        "Aban",
        "Azar",
        "Dey",
        "Bahman",
        "Esfand",
    ];
    Preset {
        name: "Solar Hijri",
        months: &MONTHS,
        common: &[31, 31, 31, 31, 31, 31, 30, 30, 30, 30, 30, 29],
        leap: &[31, 31, 31, 31, 31, 31, 30, 30, 30, 30, 30, 30],
        cycles: vec![33],
        cycle_start: 0,
        ordinals: [2, 6, 10, 14, 18, 23, 27, 31].into_iter().collect(),
        offset: 0,
        eras: ["BSH", "SH"],
        epoch_weekday: 4,
        weekday_start: 5,
        weekends: &[4],
        jd_epoch: 1_948_321,
    }
    .build()
}

/// Every calendar preset, Gregorian first.
pub fn all() -> Vec<CalendarDefinition> {
    vec![
        gregorian(),
        julian(),
        coptic(),
        lunar_hijri(),
        indian_civil(),
        solar_hijri(),
    ]
}

/// 24 hours of 60 minutes of 60 seconds, split into AM and PM.
pub fn earth_clock() -> ClockDefinition {
    ClockDefinition::preset(ClockSchema {
        seconds_in_minute: 60,
        minutes_in_hour: 60,
        hours_in_day: 24,
        hour_labels: names(&["AM", "PM"]),
        separator: ':',
    })
}

/// A registry connecting every preset through its Julian Day epoch.
///
/// ```
/// use calendar_engine::{presets, AstYmd, CalendarOps};
///
/// let registry = presets::standard_registry().unwrap();
/// let gregorian = CalendarOps::new(presets::gregorian());
/// let julian = CalendarOps::new(presets::julian());
/// let date = julian
///     .convert_ast_ymd(AstYmd::new(1582, 10, 15), &gregorian, &registry)
///     .unwrap();
/// assert_eq!(date, AstYmd::new(1582, 10, 5));
/// ```
pub fn standard_registry() -> Result<ConversionRegistry> {
    let calendars = all();
    let (anchor, rest) = calendars.split_at(1);
    ConversionRegistry::from_conversions(
        rest.iter()
            .map(|def| CalendarConversion::from_jd_epochs(&anchor[0], def)),
    )
}
