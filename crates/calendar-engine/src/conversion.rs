//! Cross-calendar synchronization.
//!
//! A [`CalendarConversion`] states that day `ordinal_a` of calendar A and
//! day `ordinal_b` of calendar B are the same day. The
//! [`ConversionRegistry`] keeps those pairs symmetric and closed under
//! composition: after inserting A↔B and B↔C, A↔C is available directly.
//!
//! The registry is filled at setup time and read-only afterwards; lookups
//! take `&self` and need no locking.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::date::check_ordinal;
use crate::definition::CalendarDefinition;
use crate::error::{CalendarError, Result};

/// One synchronizing pair of ordinals between two calendars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarConversion {
    pub calendar_a: String,
    pub ordinal_a: i64,
    pub calendar_b: String,
    pub ordinal_b: i64,
}

impl CalendarConversion {
    pub fn new(
        calendar_a: impl Into<String>,
        ordinal_a: i64,
        calendar_b: impl Into<String>,
        ordinal_b: i64,
    ) -> Self {
        Self {
            calendar_a: calendar_a.into(),
            ordinal_a,
            calendar_b: calendar_b.into(),
            ordinal_b,
        }
    }

    /// Synchronize two definitions through their Julian Day epochs: A's
    /// day 1 is paired with whatever day of B shares its Julian Day.
    ///
    /// ```
    /// use calendar_engine::{presets, CalendarConversion};
    ///
    /// let conv = CalendarConversion::from_jd_epochs(&presets::gregorian(), &presets::julian());
    /// assert_eq!((conv.ordinal_a, conv.ordinal_b), (1, 3));
    /// ```
    pub fn from_jd_epochs(a: &CalendarDefinition, b: &CalendarDefinition) -> Self {
        Self::new(a.name.clone(), 1, b.name.clone(), a.jd_epoch - b.jd_epoch + 1)
    }

    /// `d` such that B's ordinal of any day is A's ordinal plus `d`.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::OutOfRange`] if either ordinal lies beyond
    /// [`ORDINAL_LIMIT`](crate::types::ORDINAL_LIMIT).
    pub fn offset(&self) -> Result<i64> {
        check_ordinal(self.ordinal_a)?;
        check_ordinal(self.ordinal_b)?;
        Ok(self.ordinal_b - self.ordinal_a)
    }
}

/// Symmetric, transitively closed store of synchronizing ordinals.
#[derive(Debug, Clone, Default)]
pub struct ConversionRegistry {
    /// `sync[a][b]` is A's ordinal of a day whose B ordinal is
    /// `sync[b][a]`. Both directions are always present together.
    sync: BTreeMap<String, BTreeMap<String, i64>>,
}

impl ConversionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of conversions, inserting in order.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::ConflictingConversion`] if two entries
    /// disagree, directly or through derived pairs.
    pub fn from_conversions<I>(conversions: I) -> Result<Self>
    where
        I: IntoIterator<Item = CalendarConversion>,
    {
        let mut registry = Self::new();
        for conversion in conversions {
            registry.insert(conversion)?;
        }
        Ok(registry)
    }

    /// Register a conversion and derive a direct pair between every
    /// calendar now reachable from either side.
    ///
    /// Re-inserting a pair that is already known (directly or by
    /// derivation) is accepted when it agrees and rejected otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::ConflictingConversion`] if the calendars
    /// are already connected with a different offset, and
    /// [`CalendarError::OutOfRange`] if an ordinal or a derived offset
    /// leaves the supported range. A failed insert leaves the registry
    /// unchanged.
    pub fn insert(&mut self, conversion: CalendarConversion) -> Result<()> {
        let offset = conversion.offset()?;
        let CalendarConversion {
            calendar_a: a,
            ordinal_a,
            calendar_b: b,
            ordinal_b,
        } = conversion;

        let known = if a == b { Some(0) } else { self.offset(&a, &b) };
        if let Some(known) = known {
            if known != offset {
                return Err(CalendarError::ConflictingConversion(format!(
                    "'{a}' → '{b}' is already offset by {known} days, not {offset}"
                )));
            }
            return Ok(());
        }

        // Offsets into a from its side, and out of b on the other.
        let left: Vec<(String, i64)> = self
            .component(&a)
            .map(|x| {
                let d = self.offset(&x, &a).unwrap_or(0);
                (x, d)
            })
            .collect();
        let right: Vec<(String, i64)> = self
            .component(&b)
            .map(|y| {
                let d = self.offset(&b, &y).unwrap_or(0);
                (y, d)
            })
            .collect();

        let mut derived = Vec::with_capacity(left.len() * right.len());
        for (x, to_a) in &left {
            for (y, from_b) in &right {
                if *x == a && *y == b {
                    continue;
                }
                let d = to_a
                    .checked_add(offset)
                    .and_then(|d| d.checked_add(*from_b))
                    .filter(|d| check_ordinal(*d).is_ok())
                    .ok_or_else(|| {
                        CalendarError::OutOfRange(format!(
                            "offset from '{x}' to '{y}' leaves the ordinal range"
                        ))
                    })?;
                derived.push((x, y, d));
            }
        }

        tracing::debug!(from = %a, to = %b, offset, "registering calendar conversion");
        self.set_pair(&a, ordinal_a, &b, ordinal_b);
        for (x, y, d) in derived {
            tracing::debug!(from = %x, to = %y, offset = d, "derived calendar conversion");
            self.set_pair(x, 1 - d, y, 1);
        }
        Ok(())
    }

    fn set_pair(&mut self, a: &str, ordinal_a: i64, b: &str, ordinal_b: i64) {
        self.sync
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string(), ordinal_a);
        self.sync
            .entry(b.to_string())
            .or_default()
            .insert(a.to_string(), ordinal_b);
    }

    /// `name` and every calendar it is connected to.
    fn component(&self, name: &str) -> impl Iterator<Item = String> + '_ {
        std::iter::once(name.to_string()).chain(
            self.sync
                .get(name)
                .into_iter()
                .flat_map(|peers| peers.keys().cloned()),
        )
    }

    /// `d` such that `b`'s ordinal of any day is `a`'s ordinal plus `d`.
    fn offset(&self, a: &str, b: &str) -> Option<i64> {
        if a == b {
            return Some(0);
        }
        Some(self.sync_ordinal(b, a)? - self.sync_ordinal(a, b)?)
    }

    /// The ordinal, in `native`, of the day registered as the sync point
    /// with `other`; `None` if the two are not connected.
    pub fn sync_ordinal(&self, native: &str, other: &str) -> Option<i64> {
        self.sync.get(native)?.get(other).copied()
    }

    pub fn is_connected(&self, a: &str, b: &str) -> bool {
        a == b || self.sync_ordinal(a, b).is_some()
    }

    /// Every calendar named in at least one conversion, sorted.
    pub fn calendars(&self) -> impl Iterator<Item = &str> {
        self.sync.keys().map(String::as_str)
    }

    /// Translate `foreign_ordinal` of calendar `foreign` into an ordinal of
    /// calendar `native`.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::ConversionMissing`] if the calendars are not
    /// connected.
    pub fn convert_ordinal(
        &self,
        native: &str,
        foreign: &str,
        foreign_ordinal: i64,
    ) -> Result<i64> {
        if native == foreign {
            return Ok(foreign_ordinal);
        }
        let missing = || {
            CalendarError::ConversionMissing(format!(
                "no conversion between '{foreign}' and '{native}'"
            ))
        };
        let native_sync = self.sync_ordinal(native, foreign).ok_or_else(missing)?;
        let foreign_sync = self.sync_ordinal(foreign, native).ok_or_else(missing)?;
        foreign_ordinal
            .checked_sub(foreign_sync)
            .and_then(|delta| native_sync.checked_add(delta))
            .ok_or_else(|| {
            CalendarError::OutOfRange(format!(
                "ordinal {foreign_ordinal} of '{foreign}' overflows in '{native}'"
                ))
            })
    }
}
