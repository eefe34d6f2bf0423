//! Leap-year placement and cumulative year lengths.
//!
//! The `leap_year_*` fields of a definition describe one super-cycle of
//! length `L = Σ leap_year_cycles`. The 1-based positions `1..=L` are
//! rotated right by `leap_year_offset`, and a positive year `y` lands on
//! index `(y - leap_year_cycle_start) mod L` of the rotated sequence. The
//! year is leap when the value found there is one of
//! `leap_year_cycle_ordinals`.
//!
//! Non-positive years walk the reversed super-cycle backwards from year 0,
//! at index `(|y| - (L - start + 1)) mod L`, or `|y| mod L` when the cycle
//! starts at year 0. For a cycle starting at year 1 or later this is the
//! periodic continuation of the positive rule. For a cycle starting at
//! year 0 it is not: year 0 takes the last position, so the first position
//! is skipped once between years 0 and 1. In forward terms both cases are
//! a second phase, `proleptic_phase`, used for years `<= 0`.
//!
//! Explicit special years override the cycle. Because they are finite and
//! few, day counts are computed from the periodic rule in O(1) and then
//! corrected by the special years that fall in between.

use crate::definition::CalendarDefinition;

/// Precomputed leap table and day offsets for one calendar.
#[derive(Debug, Clone)]
pub(crate) struct YearTable {
    cycle_len: i64,
    /// A year `y >= 1` sits at index `(y - phase) mod cycle_len`.
    phase: i64,
    /// Phase of the years `y <= 0`.
    proleptic_phase: i64,
    leap_at: Vec<bool>,
    /// `days_before[r]`: days in cycle positions `0..r`.
    days_before: Vec<i64>,
    cycle_days: i64,
    common_days: i64,
    leap_days: i64,
    special_common: Vec<i64>,
    special_leap: Vec<i64>,
    /// Special years whose length differs from the periodic rule, with the
    /// signed difference in days. Sorted by year.
    corrections: Vec<(i64, i64)>,
    /// Σ corrections strictly before year 1.
    corrections_before_one: i64,
}

impl YearTable {
    pub(crate) fn new(def: &CalendarDefinition) -> Self {
        let common_days = i64::from(def.common_year_days());
        let leap_days = i64::from(def.leap_year_days());

        if !def.has_leap_year {
            return Self {
                cycle_len: 1,
                phase: 0,
                proleptic_phase: 0,
                leap_at: vec![false],
                days_before: vec![0, common_days],
                cycle_days: common_days,
                common_days,
                leap_days,
                special_common: Vec::new(),
                special_leap: Vec::new(),
                corrections: Vec::new(),
                corrections_before_one: 0,
            };
        }

        let cycle_len = i64::from(def.leap_cycle_length());
        let start = i64::from(def.leap_year_cycle_start.unwrap_or(0));
        let offset = def.leap_year_offset.unwrap_or(0);
        // Reversed index k holds forward index L - 1 - k. With start 0 the
        // reversed index |y| mod L is the forward index (y - 1) mod L.
        let proleptic_phase = if start == 0 { 1 } else { start };

        // After rotating [1..=L] right by `offset`, index j holds
        // ((j - offset) mod L) + 1.
        let leap_at: Vec<bool> = (0..cycle_len)
            .map(|j| {
                let value = (j - offset).rem_euclid(cycle_len) + 1;
                u32::try_from(value)
                    .map(|v| def.leap_year_cycle_ordinals.contains(&v))
                    .unwrap_or(false)
            })
            .collect();

        let mut days_before = Vec::with_capacity(leap_at.len() + 1);
        let mut acc = 0i64;
        days_before.push(acc);
        for &leap in &leap_at {
            acc += if leap { leap_days } else { common_days };
            days_before.push(acc);
        }

        let mut table = Self {
            cycle_len,
            phase: start,
            proleptic_phase,
            leap_at,
            days_before,
            cycle_days: acc,
            common_days,
            leap_days,
            special_common: def.special_common_years.iter().copied().collect(),
            special_leap: def.special_leap_years.iter().copied().collect(),
            corrections: Vec::new(),
            corrections_before_one: 0,
        };

        let mut corrections: Vec<(i64, i64)> = table
            .special_common
            .iter()
            .filter(|&&y| table.periodic_is_leap(y))
            .map(|&y| (y, common_days - leap_days))
            .chain(
                table
                    .special_leap
                    .iter()
                    .filter(|&&y| !table.periodic_is_leap(y))
                    .map(|&y| (y, leap_days - common_days)),
            )
            .filter(|&(_, diff)| diff != 0)
            .collect();
        corrections.sort_unstable();
        table.corrections_before_one = corrections
            .iter()
            .filter(|&&(y, _)| y < 1)
            .map(|&(_, d)| d)
            .sum();
        table.corrections = corrections;
        table
    }

    fn phase_of(&self, year: i64) -> i64 {
        if year >= 1 {
            self.phase
        } else {
            self.proleptic_phase
        }
    }

    fn position(&self, year: i64) -> usize {
        // Reduce before subtracting so no year can overflow; the result is
        // in 0..cycle_len, which indexes leap_at.
        let len = self.cycle_len;
        (year.rem_euclid(len) - self.phase_of(year).rem_euclid(len)).rem_euclid(len) as usize
    }

    fn periodic_is_leap(&self, year: i64) -> bool {
        self.leap_at[self.position(year)]
    }

    pub(crate) fn is_leap(&self, year: i64) -> bool {
        if self.special_common.binary_search(&year).is_ok() {
            return false;
        }
        if self.special_leap.binary_search(&year).is_ok() {
            return true;
        }
        self.periodic_is_leap(year)
    }

    pub(crate) fn days_in_year(&self, year: i64) -> i64 {
        if self.is_leap(year) {
            self.leap_days
        } else {
            self.common_days
        }
    }

    /// Days from the start of the cycle-aligned year `phase` to the start
    /// of `year`, continuing the periodic rule of that phase.
    fn periodic_days_from(&self, phase: i64, year: i64) -> i64 {
        let rel = year - phase;
        let cycles = rel.div_euclid(self.cycle_len);
        let pos = rel.rem_euclid(self.cycle_len) as usize;
        cycles * self.cycle_days + self.days_before[pos]
    }

    fn corrections_before(&self, year: i64) -> i64 {
        self.corrections
            .iter()
            .take_while(|&&(y, _)| y < year)
            .map(|&(_, d)| d)
            .sum()
    }

    /// Ordinal of the last day of the year before `year`.
    ///
    /// Equals `Σ days_in_year(1..year)` for `year >= 1` and
    /// `-Σ days_in_year(year..=0)` otherwise, so `days_before(1) == 0`.
    pub(crate) fn days_before(&self, year: i64) -> i64 {
        // Years 1..year all follow `phase`, years year..=0 all follow
        // `proleptic_phase`, so each side is one periodic span.
        let phase = self.phase_of(year);
        self.periodic_days_from(phase, year) - self.periodic_days_from(phase, 1)
            + self.corrections_before(year)
            - self.corrections_before_one
    }

    /// The year containing `ordinal` together with the ordinal of its
    /// last preceding day.
    pub(crate) fn locate(&self, ordinal: i64) -> (i64, i64) {
        // Zero-based day index counted from the start of year `phase`,
        // using the phase of the side of year 1 the ordinal falls on.
        let phase = if ordinal >= 1 {
            self.phase
        } else {
            self.proleptic_phase
        };
        let t = ordinal - 1 + self.periodic_days_from(phase, 1);
        let cycles = t.div_euclid(self.cycle_days);
        let rem = t.rem_euclid(self.cycle_days);
        let pos = self.days_before.partition_point(|&d| d <= rem) - 1;
        let mut year = phase + cycles * self.cycle_len + pos as i64;

        // Special years shift boundaries by a few days at most.
        let mut before = self.days_before(year);
        while before >= ordinal {
            year -= 1;
            before = self.days_before(year);
        }
        loop {
            let next = before + self.days_in_year(year);
            if next >= ordinal {
                break;
            }
            year += 1;
            before = next;
        }
        (year, before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{CalendarDefinition, CalendarSchema};
    use crate::presets;

    fn table(def: &CalendarDefinition) -> YearTable {
        YearTable::new(def)
    }

    fn with_leap_rule(
        cycles: Vec<u32>,
        start: u32,
        offset: i64,
        ordinals: &[u32],
    ) -> CalendarDefinition {
        let mut schema: CalendarSchema = presets::julian().into_schema();
        schema.leap_year_cycles = cycles;
        schema.leap_year_cycle_start = Some(start);
        schema.leap_year_offset = Some(offset);
        schema.leap_year_cycle_ordinals = ordinals.iter().copied().collect();
        CalendarDefinition::try_from(schema).unwrap()
    }

    #[test]
    fn test_gregorian_rule() {
        let t = table(&presets::gregorian());
        for (year, leap) in [
            (2000, true),
            (1900, false),
            (2020, true),
            (2021, false),
            (2100, false),
            (2400, true),
            (4, true),
            (0, true),
            (-1, false),
            (-4, true),
            (-100, false),
            (-400, true),
        ] {
            assert_eq!(t.is_leap(year), leap, "year {year}");
        }
    }

    #[test]
    fn test_julian_rule() {
        let t = table(&presets::julian());
        for year in -20..20 {
            assert_eq!(t.is_leap(year), year.rem_euclid(4) == 0, "year {year}");
        }
        assert!(t.is_leap(1900));
    }

    #[test]
    fn test_offset_rotates_cycle() {
        // Without offset, year 4 is the leap year of each 4-year cycle;
        // rotating right by one moves the leap to year 1.
        let base = table(&with_leap_rule(vec![4], 1, 0, &[4]));
        let rotated = table(&with_leap_rule(vec![4], 1, 1, &[4]));
        assert!(base.is_leap(4));
        assert!(!base.is_leap(1));
        assert!(rotated.is_leap(1));
        assert!(rotated.is_leap(5));
        assert!(!rotated.is_leap(4));
    }

    #[test]
    fn test_cycles_concatenate() {
        // Two sub-cycles 2 + 3 form a super-cycle of 5.
        let t = table(&with_leap_rule(vec![2, 3], 1, 0, &[2, 5]));
        let leaps: Vec<i64> = (1..=10).filter(|&y| t.is_leap(y)).collect();
        assert_eq!(leaps, vec![2, 5, 7, 10]);
    }

    /// Leap status written out directly: positive years index the
    /// rotated super-cycle, non-positive years index its reverse.
    fn reference_is_leap(
        cycle_len: i64,
        start: i64,
        offset: i64,
        ordinals: &[u32],
        year: i64,
    ) -> bool {
        let mut forward: Vec<i64> = (1..=cycle_len).collect();
        forward.rotate_right(offset.rem_euclid(cycle_len) as usize);
        let value = if year > 0 {
            forward[(year - start).rem_euclid(cycle_len) as usize]
        } else {
            let reversed: Vec<i64> = forward.iter().rev().copied().collect();
            let shift = if start == 0 { 0 } else { cycle_len - start + 1 };
            reversed[(year.abs() - shift).rem_euclid(cycle_len) as usize]
        };
        ordinals.contains(&(value as u32))
    }

    #[test]
    fn test_solar_hijri_proleptic_years() {
        let t = table(&presets::solar_hijri());
        let leaps: Vec<i64> = (-7..=-1).filter(|&y| t.is_leap(y)).collect();
        assert_eq!(leaps, vec![-6, -2]);
        assert!(!t.is_leap(0));
        assert!(t.is_leap(1));
        assert_eq!(t.days_before(0), -365);
        assert_eq!(t.days_before(-1), -730);
        assert_eq!(t.days_before(-2), -1096);
    }

    #[test]
    fn test_leap_rule_matches_reversed_cycle() {
        for (cycles, start, offset, ordinals) in [
            (vec![33], 0, 0, vec![2, 6, 10, 14, 18, 23, 27, 31]),
            (vec![3, 4], 0, 2, vec![1, 5]),
            (vec![4], 1, 0, vec![4]),
            (vec![19], 3, 5, vec![3, 6, 8, 11, 14, 17, 19]),
            (vec![5], 5, -2, vec![1]),
        ] {
            let len: u32 = cycles.iter().sum();
            let t = table(&with_leap_rule(cycles, start, offset, &ordinals));
            for year in -200..200 {
                assert_eq!(
                    t.is_leap(year),
                    reference_is_leap(i64::from(len), i64::from(start), offset, &ordinals, year),
                    "start {start} offset {offset} year {year}"
                );
            }
        }
    }

    #[test]
    fn test_locate_across_year_zero_with_cycle_start_zero() {
        let mut schema = presets::solar_hijri().into_schema();
        schema.special_common_years.insert(-2);
        schema.special_leap_years.insert(0);
        let def = CalendarDefinition::try_from(schema).unwrap();
        let t = table(&def);
        assert_eq!(t.days_before(1), 0);
        assert_eq!(t.days_before(0), -366);
        for ordinal in -30_000..30_000 {
            let (year, before) = t.locate(ordinal);
            assert_eq!(before, t.days_before(year), "ordinal {ordinal}");
            assert!(before < ordinal && ordinal <= before + t.days_in_year(year));
        }
    }

    #[test]
    fn test_extreme_years_do_not_overflow() {
        let t = table(&presets::solar_hijri());
        let _ = t.is_leap(i64::MIN);
        let _ = t.is_leap(i64::MAX);
    }

    #[test]
    fn test_special_years_override() {
        let mut schema = presets::julian().into_schema();
        schema.special_common_years.insert(8);
        schema.special_leap_years.insert(9);
        let def = CalendarDefinition::try_from(schema).unwrap();
        let t = table(&def);
        assert!(!t.is_leap(8));
        assert!(t.is_leap(9));
        assert!(t.is_leap(12));
        assert_eq!(t.days_before(10), 9 * 365 + 2);
    }

    #[test]
    fn test_days_before_anchors() {
        let t = table(&presets::gregorian());
        assert_eq!(t.days_before(1), 0);
        assert_eq!(t.days_before(2), 365);
        assert_eq!(t.days_before(0), -366);
        assert_eq!(t.days_before(-1), -731);
        assert_eq!(t.days_before(401), 146_097);
    }

    #[test]
    fn test_locate_matches_days_before() {
        let t = table(&presets::gregorian());
        for ordinal in [-800, -731, -730, -366, -365, 0, 1, 365, 366, 730, 731, 146_097] {
            let (year, before) = t.locate(ordinal);
            assert_eq!(before, t.days_before(year));
            assert!(before < ordinal && ordinal <= before + t.days_in_year(year));
        }
    }

    #[test]
    fn test_locate_across_special_years() {
        let mut schema = presets::julian().into_schema();
        schema.special_common_years.extend([-4, 4, 8]);
        schema.special_leap_years.extend([-3, 5]);
        let def = CalendarDefinition::try_from(schema).unwrap();
        let t = table(&def);
        for ordinal in -3000..3000 {
            let (year, before) = t.locate(ordinal);
            assert_eq!(before, t.days_before(year), "ordinal {ordinal}");
            assert!(before < ordinal && ordinal <= before + t.days_in_year(year));
        }
    }
}
