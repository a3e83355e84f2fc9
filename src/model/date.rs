//! The Hijri date value object and its arithmetic.
//!
//! A [`HijriDate`] is an immutable (year, month, day, hh, mm, ss) tuple
//! validated against a calendar back-end at construction. Equality,
//! ordering, and hashing are **date-only**: the time fields ride along
//! through arithmetic but never participate in comparisons, which is what
//! the day-granularity recurrence engine relies on.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::num::NonZero;

use chrono::{NaiveDateTime, Timelike};

use crate::cal::{self, HijriCalendar};
use crate::error::Error;

/// A wall-clock time of day, seconds precision.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RawTime {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

impl RawTime {
    pub(crate) const MIDNIGHT: Self = Self {
        hours: 0,
        minutes: 0,
        seconds: 0,
    };

    pub(crate) const fn new_opt(hours: u8, minutes: u8, seconds: u8) -> Option<Self> {
        if hours < 24 && minutes < 60 && seconds < 60 {
            Some(Self {
                hours,
                minutes,
                seconds,
            })
        } else {
            None
        }
    }
}

/// One of the seven weekdays, in the Saturday-origin encoding of the
/// Islamic week: 0 = Saturday through 6 = Friday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Weekday {
    Saturday,
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Weekday {
    pub const fn from_repr(repr: u8) -> Option<Self> {
        match repr {
            0..=6 => {
                // SAFETY: the valid discriminants of Self are exactly the
                // values of the range 0..=6.
                Some(unsafe { std::mem::transmute::<u8, Self>(repr) })
            }
            _ => None,
        }
    }

    /// The RFC 5545 two-letter code.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Saturday => "SA",
            Self::Sunday => "SU",
            Self::Monday => "MO",
            Self::Tuesday => "TU",
            Self::Wednesday => "WE",
            Self::Thursday => "TH",
            Self::Friday => "FR",
        }
    }

    pub fn iter() -> impl ExactSizeIterator<Item = Self> {
        const VARIANTS: [Weekday; 7] = [
            Weekday::Saturday,
            Weekday::Sunday,
            Weekday::Monday,
            Weekday::Tuesday,
            Weekday::Wednesday,
            Weekday::Thursday,
            Weekday::Friday,
        ];

        VARIANTS.iter().copied()
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A date of the Hijri calendar, with a time-of-day payload.
#[derive(Debug, Clone, Copy)]
pub struct HijriDate {
    year: u16,
    month: NonZero<u8>,
    day: NonZero<u8>,
    time: RawTime,
}

impl HijriDate {
    /// Constructs a date at midnight, validated against the process-wide
    /// default calendar.
    pub fn new(year: i32, month: u8, day: u8) -> Result<Self, Error> {
        Self::new_in(cal::default_calendar(), year, month, day)
    }

    /// Constructs a date at midnight, validated against `calendar`.
    pub fn new_in(
        calendar: HijriCalendar,
        year: i32,
        month: u8,
        day: u8,
    ) -> Result<Self, Error> {
        if !calendar.is_valid(year, month, day) {
            return Err(Error::invalid_date(year, month, day));
        }

        // Validation bounds year to 1..=MAX_YEAR and month/day to nonzero.
        match (NonZero::new(month), NonZero::new(day)) {
            (Some(m), Some(d)) => Ok(Self {
                year: year as u16,
                month: m,
                day: d,
                time: RawTime::MIDNIGHT,
            }),
            _ => Err(Error::invalid_date(year, month, day)),
        }
    }

    /// Replaces the time-of-day fields.
    pub fn and_hms(self, hours: u8, minutes: u8, seconds: u8) -> Result<Self, Error> {
        let time = RawTime::new_opt(hours, minutes, seconds).ok_or_else(|| {
            Error::invalid_input(format!(
                "time {hours:02}:{minutes:02}:{seconds:02} out of range"
            ))
        })?;

        Ok(Self { time, ..self })
    }

    /// Today (local wall clock) in the default calendar.
    pub fn today() -> Result<Self, Error> {
        Self::today_in(cal::default_calendar())
    }

    /// Today (local wall clock) in `calendar`.
    pub fn today_in(calendar: HijriCalendar) -> Result<Self, Error> {
        Self::from_gregorian_in(calendar, chrono::Local::now().naive_local())
    }

    /// Converts a civil datetime into this crate's date type using the
    /// default calendar.
    pub fn from_gregorian(datetime: NaiveDateTime) -> Result<Self, Error> {
        Self::from_gregorian_in(cal::default_calendar(), datetime)
    }

    /// Converts a civil datetime into this crate's date type.
    pub fn from_gregorian_in(
        calendar: HijriCalendar,
        datetime: NaiveDateTime,
    ) -> Result<Self, Error> {
        let (year, month, day) = calendar.gregorian_to_hijri(datetime.date())?;
        Self::new_in(calendar, year, month, day)?.and_hms(
            datetime.time().hour() as u8,
            datetime.time().minute() as u8,
            datetime.time().second() as u8,
        )
    }

    /// Converts to a civil datetime using the default calendar.
    pub fn to_gregorian(&self) -> Result<NaiveDateTime, Error> {
        self.to_gregorian_in(cal::default_calendar())
    }

    /// Converts to a civil datetime.
    pub fn to_gregorian_in(
        &self,
        calendar: HijriCalendar,
    ) -> Result<NaiveDateTime, Error> {
        let date = calendar.hijri_to_gregorian(
            self.year(),
            self.month(),
            self.day(),
        )?;

        date.and_hms_opt(
            u32::from(self.time.hours),
            u32::from(self.time.minutes),
            u32::from(self.time.seconds),
        )
        .ok_or(Error::OutOfEpoch)
    }

    pub const fn year(&self) -> i32 {
        self.year as i32
    }

    pub const fn month(&self) -> u8 {
        self.month.get()
    }

    pub const fn day(&self) -> u8 {
        self.day.get()
    }

    pub const fn hour(&self) -> u8 {
        self.time.hours
    }

    pub const fn minute(&self) -> u8 {
        self.time.minutes
    }

    pub const fn second(&self) -> u8 {
        self.time.seconds
    }

    pub(crate) const fn time(&self) -> RawTime {
        self.time
    }

    /// The date-only triple used for comparisons and dedup keys.
    pub(crate) const fn ymd(&self) -> (u16, u8, u8) {
        (self.year, self.month.get(), self.day.get())
    }

    /// Rebuilds a date from an engine triple, carrying `time` across.
    pub(crate) fn from_ymd_time(
        calendar: HijriCalendar,
        year: i32,
        month: u8,
        day: u8,
        time: RawTime,
    ) -> Result<Self, Error> {
        let date = Self::new_in(calendar, year, month, day)?;
        Ok(Self { time, ..date })
    }

    pub(crate) fn jdn(&self, calendar: HijriCalendar) -> i64 {
        calendar.to_jdn(self.year(), self.month(), self.day())
    }

    /// The weekday of this date, identical across back-ends.
    pub fn weekday(&self) -> Weekday {
        self.weekday_in(cal::default_calendar())
    }

    pub fn weekday_in(&self, calendar: HijriCalendar) -> Weekday {
        weekday_of_jdn(self.jdn(calendar))
    }

    /// Adds (or subtracts) whole days, preserving the time fields.
    pub fn add_days(
        &self,
        days: i64,
        calendar: HijriCalendar,
    ) -> Result<Self, Error> {
        let (year, month, day) = calendar.from_jdn(self.jdn(calendar) + days)?;
        Self::from_ymd_time(calendar, year, month, day, self.time)
    }

    /// Adds whole months on a linearized month index. When the source day
    /// exceeds the target month's length it is clamped down (`clamp`) or
    /// the operation yields no date (`!clamp`).
    pub fn add_months(
        &self,
        months: i32,
        clamp: bool,
        calendar: HijriCalendar,
    ) -> Result<Option<Self>, Error> {
        let index =
            i64::from(self.year()) * 12 + i64::from(self.month() - 1) + i64::from(months);
        let year = index.div_euclid(12);
        let month = index.rem_euclid(12) as u8 + 1;

        if year < 1 {
            return Err(Error::OutOfEpoch);
        }
        let year = i32::try_from(year).map_err(|_| Error::OutOfEpoch)?;
        if year > cal::MAX_YEAR {
            return Err(Error::OutOfEpoch);
        }

        let length = calendar.month_length(year, month);
        let day = if self.day() > length {
            if !clamp {
                return Ok(None);
            }
            length
        } else {
            self.day()
        };

        Self::from_ymd_time(calendar, year, month, day, self.time).map(Some)
    }

    /// Adds whole years; the month is unchanged, and 30 Dhu al-Hijjah in a
    /// source leap year clamps (or vanishes) in a common target year.
    pub fn add_years(
        &self,
        years: i32,
        clamp: bool,
        calendar: HijriCalendar,
    ) -> Result<Option<Self>, Error> {
        self.add_months(years.saturating_mul(12), clamp, calendar)
    }

    /// The first day of this date's month.
    pub fn start_of_month(&self) -> Self {
        Self {
            day: NonZero::<u8>::MIN,
            ..*self
        }
    }

    /// The last day of this date's month under `calendar`.
    pub fn end_of_month(&self, calendar: HijriCalendar) -> Self {
        let length = calendar.month_length(self.year(), self.month());
        Self {
            day: NonZero::new(length).expect("month lengths are 29 or 30"),
            ..*self
        }
    }

    /// 1 Muharram of this date's year.
    pub fn start_of_year(&self) -> Self {
        Self {
            month: NonZero::<u8>::MIN,
            day: NonZero::<u8>::MIN,
            ..*self
        }
    }

    /// The last day of this date's year under `calendar`.
    pub fn end_of_year(&self, calendar: HijriCalendar) -> Self {
        let length = calendar.month_length(self.year(), 12);
        Self {
            month: NonZero::new(12).expect("12 is nonzero"),
            day: NonZero::new(length).expect("month lengths are 29 or 30"),
            ..*self
        }
    }

    /// The most recent day (possibly this one) whose weekday is `wkst`.
    pub fn start_of_week(
        &self,
        wkst: Weekday,
        calendar: HijriCalendar,
    ) -> Result<Self, Error> {
        let offset =
            (self.weekday_in(calendar) as i64 - wkst as i64).rem_euclid(7);
        self.add_days(-offset, calendar)
    }

    /// The last day of the week containing this date, for a week that
    /// starts on `wkst`.
    pub fn end_of_week(
        &self,
        wkst: Weekday,
        calendar: HijriCalendar,
    ) -> Result<Self, Error> {
        self.start_of_week(wkst, calendar)?.add_days(6, calendar)
    }
}

impl PartialEq for HijriDate {
    fn eq(&self, other: &Self) -> bool {
        self.ymd() == other.ymd()
    }
}

impl Eq for HijriDate {}

impl Hash for HijriDate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ymd().hash(state);
    }
}

impl PartialOrd for HijriDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HijriDate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ymd().cmp(&other.ymd())
    }
}

impl fmt::Display for HijriDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.year, self.month, self.day
        )?;

        if self.time != RawTime::MIDNIGHT {
            write!(
                f,
                "T{:02}:{:02}:{:02}",
                self.time.hours, self.time.minutes, self.time.seconds
            )?;
        }

        Ok(())
    }
}

/// The weekday containing `jdn` in the Saturday-origin encoding.
pub(crate) fn weekday_of_jdn(jdn: i64) -> Weekday {
    let repr = (jdn + 2).rem_euclid(7) as u8;
    Weekday::from_repr(repr).expect("mod 7 is a weekday")
}

/// The day-of-month of the `n`-th occurrence of `weekday` in the given
/// month, counted from the end when `n < 0`. `None` when fewer than |n|
/// occurrences exist (or n is zero).
pub fn nth_weekday_of_month(
    calendar: HijriCalendar,
    year: i32,
    month: u8,
    weekday: Weekday,
    n: i16,
) -> Option<u8> {
    if n == 0 {
        return None;
    }

    let length = calendar.month_length(year, month);
    let first = weekday_of_jdn(calendar.to_jdn(year, month, 1));
    let first_hit = 1 + (weekday as i16 - first as i16).rem_euclid(7) as u8;
    let occurrences = (length - first_hit) / 7 + 1;

    if n.unsigned_abs() > u16::from(occurrences) {
        return None;
    }

    // |n| now fits in the 1..=5 occurrence range.
    let index = if n > 0 {
        n as u8 - 1
    } else {
        occurrences - n.unsigned_abs() as u8
    };

    Some(first_hit + 7 * index)
}
