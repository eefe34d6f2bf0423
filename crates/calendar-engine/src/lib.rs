//! # calendar-engine
//!
//! Data-driven calendrical computation.
//!
//! Calendars and clocks are plain data: month tables, a leap-year cycle,
//! eras, week structure, and a Julian Day epoch. From one definition the
//! engine derives exact, reversible conversions between date forms, shifts
//! by eras, years, months, days, and time units, and converts dates
//! between any calendars linked by a synchronizing pair of ordinals.
//!
//! ## Modules
//!
//! - [`definition`] — Calendar schema, validation, and JSON ingestion
//! - [`clock`] — Clock schema (units per day, hour labels)
//! - [`date`] — Ordinal arithmetic, eras, shifting, weekdays, Julian Day bridge
//! - [`time`] — Time-of-day arithmetic and `HH:MM:SS` text
//! - [`datetime`] — Ordinal decimals and the display-interval ladder
//! - [`conversion`] — Cross-calendar synchronization registry
//! - [`presets`] — Gregorian, Julian, Coptic, Hijri, Indian, Persian calendars
//! - [`types`] — Shared value types
//! - [`error`] — Error types
//!
//! ```
//! use calendar_engine::{presets, AstYmd, CalendarOps, Interval};
//!
//! let gregorian = CalendarOps::new(presets::gregorian());
//! let date = gregorian
//!     .shift_ast_ymd(AstYmd::new(2020, 1, 31), &[Interval::months(1)])
//!     .unwrap();
//! assert_eq!(date, AstYmd::new(2020, 2, 29));
//! assert_eq!(gregorian.format_hr_date(date).unwrap(), "2020/2/29/CE");
//! ```

pub mod clock;
pub mod conversion;
pub mod date;
pub mod datetime;
pub mod definition;
pub mod error;
mod leap;
pub mod presets;
pub mod time;
pub mod types;

pub use clock::{ClockDefinition, ClockSchema, MAX_SECONDS_IN_DAY};
pub use conversion::{CalendarConversion, ConversionRegistry};
pub use date::CalendarOps;
pub use datetime::DateTimeOps;
pub use definition::{
    CalendarDefinition, CalendarSchema, EraRange, MAX_LEAP_CYCLE, MAX_YEAR_DAYS,
};
pub use error::{CalendarError, Result};
pub use time::ClockOps;
pub use types::{
    AstYmd, Hms, HrDate, HrYear, Interval, OrdinalDate, Unit, ORDINAL_LIMIT, YEAR_LIMIT,
};
