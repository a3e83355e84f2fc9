//! Recurrence rules over the Hijri (Islamic) calendar.
//!
//! This crate evaluates RFC 5545 style recurrence rules against a lunar
//! Hijri calendar instead of the Gregorian one. Rules are built from
//! [`PartialOptions`] or parsed from the two-line textual form (a
//! `DTSTART` line extended with a `CALENDAR` parameter, and an `RRULE`
//! line extended with the `SKIP` parameter of RFC 7529), and expand into
//! a lazy ascending stream of [`HijriDate`] values.
//!
//! Two calendar back-ends are provided: the table-driven [Umm al-Qura]
//! calendar used for civil purposes in Saudi Arabia (1356–1500 AH, with
//! an arithmetic fallback outside the table), and the purely arithmetic
//! tabular calendar with the 30-year leap cycle.
//!
//! [Umm al-Qura]: https://en.wikipedia.org/wiki/Islamic_calendar#Saudi_Arabia's_Umm_al-Qura_calendar
//!
//! # Examples
//!
//! The first of Ramadan for three years running:
//!
//! ```
//! use hilal::{Frequency, HijriCalendar, HijriDate, PartialOptions, RRule};
//!
//! let rule = RRule::new(PartialOptions {
//!     freq: Some(Frequency::Yearly),
//!     dtstart: Some(HijriDate::new_in(HijriCalendar::UmmAlQura, 1446, 9, 1)?.into()),
//!     bymonth: vec![9],
//!     bymonthday: vec![1],
//!     count: Some(3),
//!     calendar: Some(HijriCalendar::UmmAlQura),
//!     ..Default::default()
//! })?;
//!
//! let ramadans = rule.all()?;
//! assert_eq!(ramadans.len(), 3);
//! assert_eq!(ramadans[1], HijriDate::new_in(HijriCalendar::UmmAlQura, 1447, 9, 1)?);
//! # Ok::<(), hilal::Error>(())
//! ```
//!
//! The same rule in its textual form:
//!
//! ```
//! use hilal::RRule;
//!
//! let rule: RRule = "DTSTART;CALENDAR=HIJRI-UM-AL-QURA:14460901\n\
//!                    RRULE:FREQ=YEARLY;BYMONTH=9;BYMONTHDAY=1;COUNT=3"
//!     .parse()?;
//! assert_eq!(rule.all()?.len(), 3);
//! # Ok::<(), hilal::Error>(())
//! ```

pub mod cal;
pub mod error;
pub mod model;
pub mod parser;
pub mod ruleset;

mod cache;
mod engine;
mod rrule;

pub use cal::{HijriCalendar, default_calendar, set_default_calendar};
pub use error::Error;
pub use model::date::{HijriDate, RawTime, Weekday};
pub use model::options::{DateInput, ParsedOptions, PartialOptions};
pub use model::rrule::{Frequency, Skip, WeekdayNum};
pub use rrule::RRule;
pub use ruleset::RRuleSet;
