//! Model types for recurrence rule parts.

use std::fmt;
use std::num::NonZero;

use super::date::Weekday;

/// The frequency of a recurrence rule.
///
/// The sub-day frequencies are recognised on input but expand at day
/// granularity, one candidate per step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Yearly,
    Monthly,
    Weekly,
    Daily,
    Hourly,
    Minutely,
    Secondly,
}

impl Frequency {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yearly => "YEARLY",
            Self::Monthly => "MONTHLY",
            Self::Weekly => "WEEKLY",
            Self::Daily => "DAILY",
            Self::Hourly => "HOURLY",
            Self::Minutely => "MINUTELY",
            Self::Secondly => "SECONDLY",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The policy applied when a requested month day exceeds the month's
/// actual length.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    /// Drop the candidate.
    #[default]
    Omit,
    /// Clamp down to the last day of the month.
    Backward,
    /// Roll over to the first day of the next month.
    Forward,
}

impl Skip {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Omit => "OMIT",
            Self::Backward => "BACKWARD",
            Self::Forward => "FORWARD",
        }
    }
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value of the `weekdaynum` mini-grammar: a weekday with an optional
/// nonzero ordinal, e.g. `FR`, `1FR`, or `-1MO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekdayNum {
    pub ordinal: Option<NonZero<i16>>,
    pub weekday: Weekday,
}

impl WeekdayNum {
    pub const fn simple(weekday: Weekday) -> Self {
        Self {
            ordinal: None,
            weekday,
        }
    }

    /// The textual form used in BYDAY lists.
    pub fn to_rrule_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for WeekdayNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ordinal) = self.ordinal {
            write!(f, "{}", ordinal)?;
        }
        f.write_str(self.weekday.code())
    }
}

impl From<Weekday> for WeekdayNum {
    fn from(weekday: Weekday) -> Self {
        Self::simple(weekday)
    }
}

impl Weekday {
    /// The `n`-th occurrence of this weekday within the enclosing period,
    /// counted from the end when `n < 0`.
    ///
    /// # Panics
    ///
    /// Panics if `n` is zero; ordinals are nonzero by grammar.
    pub fn nth(self, n: i16) -> WeekdayNum {
        WeekdayNum {
            ordinal: Some(NonZero::new(n).expect("weekday ordinal must be nonzero")),
            weekday: self,
        }
    }
}

/// A bitset of weekdays. The most significant bit is always set to
/// guarantee that the entire set is never zero.
///
/// ```text
///  0      6
///  |      |
///  xxxxxxx1 (0-7)
///         |
///        msb
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekdaySet(NonZero<u8>);

impl WeekdaySet {
    pub(crate) const EMPTY: Self = Self(NonZero::new(1 << 7).unwrap());

    pub const fn get(&self, weekday: Weekday) -> bool {
        let mask = 1 << (weekday as u8);
        (self.0.get() & mask) != 0
    }

    pub const fn set(&mut self, weekday: Weekday) {
        let mask = 1 << (weekday as u8);
        let updated = self.0.get() | mask;

        // SAFETY: bitwise OR cannot reduce the number of set bits
        *self = Self(unsafe { NonZero::new_unchecked(updated) })
    }

    pub const fn is_empty(&self) -> bool {
        self.0.get() == Self::EMPTY.0.get()
    }
}

impl Default for WeekdaySet {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<T: IntoIterator<Item = Weekday>>(iter: T) -> Self {
        let mut set = Self::EMPTY;
        for weekday in iter {
            set.set(weekday);
        }
        set
    }
}

/// An RRULE property name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartName {
    Freq,
    Interval,
    WkSt,
    Count,
    Until,
    Tzid,
    BySetPos,
    ByMonth,
    ByMonthDay,
    ByYearDay,
    ByWeekNo,
    ByDay,
    ByHour,
    ByMinute,
    BySecond,
    Skip,
}

/// An unresolved date literal from the textual form (`YYYYMMDD` with an
/// optional `THHMMSS` suffix). Resolution against a calendar happens when
/// the surrounding options are assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateToken {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub time: super::date::RawTime,
}

/// A parsed `name=value` rule part.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Freq(Frequency),
    Interval(u32),
    WkSt(Weekday),
    Count(u32),
    Until(DateToken),
    Tzid(String),
    BySetPos(Vec<i32>),
    ByMonth(Vec<u8>),
    ByMonthDay(Vec<i8>),
    ByYearDay(Vec<i16>),
    ByWeekNo(Vec<i8>),
    ByDay(Vec<WeekdayNum>),
    ByHour(Vec<u8>),
    ByMinute(Vec<u8>),
    BySecond(Vec<u8>),
    Skip(Skip),
}

impl From<&Part> for PartName {
    fn from(value: &Part) -> Self {
        match value {
            Part::Freq(_) => Self::Freq,
            Part::Interval(_) => Self::Interval,
            Part::WkSt(_) => Self::WkSt,
            Part::Count(_) => Self::Count,
            Part::Until(_) => Self::Until,
            Part::Tzid(_) => Self::Tzid,
            Part::BySetPos(_) => Self::BySetPos,
            Part::ByMonth(_) => Self::ByMonth,
            Part::ByMonthDay(_) => Self::ByMonthDay,
            Part::ByYearDay(_) => Self::ByYearDay,
            Part::ByWeekNo(_) => Self::ByWeekNo,
            Part::ByDay(_) => Self::ByDay,
            Part::ByHour(_) => Self::ByHour,
            Part::ByMinute(_) => Self::ByMinute,
            Part::BySecond(_) => Self::BySecond,
            Part::Skip(_) => Self::Skip,
        }
    }
}
