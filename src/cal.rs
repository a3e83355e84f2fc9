//! Hijri calendar back-ends.
//!
//! Both back-ends convert through integer Julian Day Numbers: the
//! [`tabular`] calendar is purely arithmetic, and the [`umm_al_qura`]
//! calendar reads a month-length table for 1356–1500 AH (falling back to
//! the arithmetic cycle outside that range). The two calendars disagree on
//! some civil dates inside the table range; callers choose which one they
//! mean, or rely on the process-wide default.

use std::sync::atomic::{AtomicU8, Ordering};

use chrono::{Datelike, NaiveDate};

use crate::error::Error;

pub(crate) mod tabular;
pub mod umm_al_qura;

/// Years below 1 precede the Hijri epoch; years above this bound are
/// rejected so that dates stay comfortably inside `u16`.
pub(crate) const MAX_YEAR: i32 = 9999;

/// JDN of 0001-01-01 in the proleptic Gregorian calendar, minus one; the
/// bridge between chrono's day count and Julian Day Numbers.
const JDN_OF_CE: i64 = 1_721_425;

/// A Hijri calendar back-end.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HijriCalendar {
    /// The table-driven Umm al-Qura calendar (Saudi civil calendar).
    #[default]
    UmmAlQura,
    /// The arithmetic tabular calendar with the 30-year leap cycle.
    Tabular,
}

impl HijriCalendar {
    pub(crate) const fn from_repr(repr: u8) -> Option<Self> {
        match repr {
            0..=1 => {
                // SAFETY: the valid discriminants of Self are exactly the
                // values of the range 0..=1.
                Some(unsafe { std::mem::transmute::<u8, Self>(repr) })
            }
            _ => None,
        }
    }

    /// The canonical `CALENDAR` parameter value for this back-end.
    pub const fn name(self) -> &'static str {
        match self {
            Self::UmmAlQura => "HIJRI-UM-AL-QURA",
            Self::Tabular => "HIJRI-TABULAR",
        }
    }

    /// The length in days (29 or 30) of `month` of `year`.
    pub fn month_length(self, year: i32, month: u8) -> u8 {
        match self {
            Self::UmmAlQura => umm_al_qura::month_length(year, month),
            Self::Tabular => tabular::month_length(year, month),
        }
    }

    /// Whether `year` has 355 days.
    pub fn is_leap(self, year: i32) -> bool {
        match self {
            Self::UmmAlQura => umm_al_qura::is_leap(year),
            Self::Tabular => tabular::is_leap(year),
        }
    }

    /// The length of `year` in days (354 or 355).
    pub fn year_length(self, year: i32) -> u16 {
        match self {
            Self::UmmAlQura => umm_al_qura::year_length(year),
            Self::Tabular => tabular::year_length(year),
        }
    }

    /// Whether (year, month, day) names a real day of this calendar.
    pub fn is_valid(self, year: i32, month: u8, day: u8) -> bool {
        year >= 1
            && year <= MAX_YEAR
            && (1..=12).contains(&month)
            && day >= 1
            && day <= self.month_length(year, month)
    }

    /// The integer JDN of a valid (year, month, day) triple.
    pub(crate) fn to_jdn(self, year: i32, month: u8, day: u8) -> i64 {
        match self {
            Self::UmmAlQura => umm_al_qura::to_jdn(year, month, day),
            Self::Tabular => tabular::to_jdn(year, month, day),
        }
    }

    /// The (year, month, day) triple containing `jdn`, or `OutOfEpoch`
    /// when the triple would leave the supported year range.
    pub(crate) fn from_jdn(self, jdn: i64) -> Result<(i32, u8, u8), Error> {
        let (year, month, day) = match self {
            Self::UmmAlQura => umm_al_qura::from_jdn(jdn),
            Self::Tabular => tabular::from_jdn(jdn),
        };

        if year < 1 || year > MAX_YEAR as i64 {
            return Err(Error::OutOfEpoch);
        }

        Ok((year as i32, month, day))
    }

    /// Converts a valid Hijri (year, month, day) to a civil date.
    pub fn hijri_to_gregorian(
        self,
        year: i32,
        month: u8,
        day: u8,
    ) -> Result<NaiveDate, Error> {
        if !self.is_valid(year, month, day) {
            return Err(Error::invalid_date(year, month, day));
        }

        let jdn = self.to_jdn(year, month, day);
        NaiveDate::from_num_days_from_ce_opt((jdn - JDN_OF_CE) as i32)
            .ok_or(Error::OutOfEpoch)
    }

    /// Converts a civil date to Hijri (year, month, day).
    pub fn gregorian_to_hijri(
        self,
        date: NaiveDate,
    ) -> Result<(i32, u8, u8), Error> {
        self.from_jdn(i64::from(date.num_days_from_ce()) + JDN_OF_CE)
    }
}

/// The process-wide default calendar, stored as a discriminant.
static DEFAULT_CALENDAR: AtomicU8 = AtomicU8::new(0);

/// Returns the process-wide default calendar (Umm al-Qura until changed).
pub fn default_calendar() -> HijriCalendar {
    let repr = DEFAULT_CALENDAR.load(Ordering::Relaxed);
    HijriCalendar::from_repr(repr).unwrap_or_default()
}

/// Replaces the process-wide default calendar. Rules capture the default
/// at construction time, so call this before building rules.
pub fn set_default_calendar(calendar: HijriCalendar) {
    DEFAULT_CALENDAR.store(calendar as u8, Ordering::Relaxed);
}
