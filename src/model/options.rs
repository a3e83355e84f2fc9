//! Recurrence options, partial and parsed.
//!
//! [`PartialOptions`] is what callers (and the text parser) hand over:
//! everything optional, lists in caller order, dates as either Hijri or
//! Gregorian civil values. [`ParsedOptions`] is the canonicalized form the
//! expansion engine consumes: defaults applied, month days split by sign,
//! weekday specs split by the presence of an ordinal, every range checked.

use std::num::NonZero;

use chrono::{NaiveDate, NaiveDateTime};

use crate::cal::{self, HijriCalendar};
use crate::error::Error;

use super::date::{HijriDate, Weekday};
use super::rrule::{Frequency, Skip, WeekdayNum};

/// A date supplied by the caller, in either calendar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DateInput {
    Hijri(HijriDate),
    Gregorian(NaiveDateTime),
}

impl DateInput {
    fn resolve(self, calendar: HijriCalendar) -> Result<HijriDate, Error> {
        match self {
            Self::Hijri(date) => Ok(date),
            Self::Gregorian(datetime) => {
                HijriDate::from_gregorian_in(calendar, datetime)
            }
        }
    }
}

impl From<HijriDate> for DateInput {
    fn from(date: HijriDate) -> Self {
        Self::Hijri(date)
    }
}

impl From<NaiveDateTime> for DateInput {
    fn from(datetime: NaiveDateTime) -> Self {
        Self::Gregorian(datetime)
    }
}

impl From<NaiveDate> for DateInput {
    fn from(date: NaiveDate) -> Self {
        Self::Gregorian(date.and_hms_opt(0, 0, 0).expect("midnight exists"))
    }
}

/// Recurrence options as accepted from the caller.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PartialOptions {
    pub freq: Option<Frequency>,
    pub dtstart: Option<DateInput>,
    pub interval: Option<u32>,
    pub wkst: Option<Weekday>,
    pub count: Option<u32>,
    pub until: Option<DateInput>,
    pub tzid: Option<String>,
    pub bysetpos: Vec<i32>,
    pub bymonth: Vec<u8>,
    pub bymonthday: Vec<i8>,
    pub byyearday: Vec<i16>,
    pub byweekno: Vec<i8>,
    pub byweekday: Vec<WeekdayNum>,
    pub byhour: Vec<u8>,
    pub byminute: Vec<u8>,
    pub bysecond: Vec<u8>,
    pub skip: Option<Skip>,
    pub calendar: Option<HijriCalendar>,
}

/// Canonicalized recurrence options.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOptions {
    pub freq: Frequency,
    pub dtstart: HijriDate,
    pub interval: NonZero<u32>,
    pub wkst: Weekday,
    pub count: Option<u32>,
    pub until: Option<HijriDate>,
    pub tzid: Option<String>,
    pub bysetpos: Vec<i32>,
    pub bymonth: Vec<u8>,
    /// Strictly positive month days.
    pub bymonthday: Vec<u8>,
    /// Strictly negative month days (counted from the month's end).
    pub bynmonthday: Vec<i8>,
    pub byyearday: Vec<i16>,
    /// Accepted and carried, but ignored at expansion time.
    pub byweekno: Vec<i8>,
    /// Weekday specs without an ordinal.
    pub byweekday: Vec<Weekday>,
    /// Weekday specs with an ordinal.
    pub bynweekday: Vec<(Weekday, i16)>,
    pub byhour: Vec<u8>,
    pub byminute: Vec<u8>,
    pub bysecond: Vec<u8>,
    pub skip: Skip,
    pub calendar: HijriCalendar,
}

impl PartialOptions {
    /// Normalizes and validates into engine-ready options.
    pub fn parse(&self) -> Result<ParsedOptions, Error> {
        let freq = self
            .freq
            .ok_or_else(|| Error::invalid_input("FREQ is required"))?;

        let calendar = self.calendar.unwrap_or_else(cal::default_calendar);

        let dtstart = match self.dtstart {
            Some(input) => input.resolve(calendar)?,
            None => HijriDate::today_in(calendar)?,
        };

        let until = self
            .until
            .map(|input| input.resolve(calendar))
            .transpose()?;

        let interval = NonZero::new(self.interval.unwrap_or(1))
            .ok_or_else(|| Error::invalid_input("INTERVAL must be at least 1"))?;

        check_range("BYMONTH", &self.bymonth, 1, 12)?;
        check_signed("BYMONTHDAY", &self.bymonthday, 30)?;
        check_signed("BYYEARDAY", &self.byyearday, 355)?;
        check_signed("BYSETPOS", &self.bysetpos, 366)?;
        check_signed("BYWEEKNO", &self.byweekno, 53)?;
        check_range("BYHOUR", &self.byhour, 0, 23)?;
        check_range("BYMINUTE", &self.byminute, 0, 59)?;
        check_range("BYSECOND", &self.bysecond, 0, 59)?;

        let (bymonthday, bynmonthday) = split_month_days(&self.bymonthday);
        let (byweekday, bynweekday) = split_weekdays(&self.byweekday);

        Ok(ParsedOptions {
            freq,
            dtstart,
            interval,
            wkst: self.wkst.unwrap_or(Weekday::Sunday),
            count: self.count,
            until,
            tzid: self.tzid.clone(),
            bysetpos: self.bysetpos.clone(),
            bymonth: self.bymonth.clone(),
            bymonthday,
            bynmonthday,
            byyearday: self.byyearday.clone(),
            byweekno: self.byweekno.clone(),
            byweekday,
            bynweekday,
            byhour: self.byhour.clone(),
            byminute: self.byminute.clone(),
            bysecond: self.bysecond.clone(),
            skip: self.skip.unwrap_or_default(),
            calendar,
        })
    }
}

/// Partitions month days into strictly positive and strictly negative
/// lists, preserving relative order within each.
fn split_month_days(values: &[i8]) -> (Vec<u8>, Vec<i8>) {
    let positive = values
        .iter()
        .filter(|&&day| day > 0)
        .map(|&day| day as u8)
        .collect();
    let negative = values.iter().copied().filter(|&day| day < 0).collect();
    (positive, negative)
}

/// Splits weekday specs by the presence of an ordinal.
fn split_weekdays(values: &[WeekdayNum]) -> (Vec<Weekday>, Vec<(Weekday, i16)>) {
    let simple = values
        .iter()
        .filter(|spec| spec.ordinal.is_none())
        .map(|spec| spec.weekday)
        .collect();
    let nth = values
        .iter()
        .filter_map(|spec| spec.ordinal.map(|n| (spec.weekday, n.get())))
        .collect();
    (simple, nth)
}

fn check_range<T>(name: &str, values: &[T], min: T, max: T) -> Result<(), Error>
where
    T: PartialOrd + Copy + std::fmt::Display,
{
    for &value in values {
        if value < min || value > max {
            return Err(Error::invalid_input(format!(
                "{name} values must be in [{min},{max}], got {value}"
            )));
        }
    }
    Ok(())
}

/// Checks a signed by-part: nonzero and |value| ≤ bound.
fn check_signed<T>(name: &str, values: &[T], bound: i32) -> Result<(), Error>
where
    T: Into<i32> + Copy + std::fmt::Display,
{
    for &value in values {
        let widened: i32 = value.into();
        if widened == 0 || widened.abs() > bound {
            return Err(Error::invalid_input(format!(
                "{name} values must be in [-{bound},-1] or [1,{bound}], got {value}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> PartialOptions {
        PartialOptions {
            freq: Some(Frequency::Daily),
            dtstart: Some(
                HijriDate::new_in(HijriCalendar::UmmAlQura, 1446, 1, 1)
                    .unwrap()
                    .into(),
            ),
            calendar: Some(HijriCalendar::UmmAlQura),
            ..Default::default()
        }
    }

    #[test]
    fn freq_is_required() {
        let err = PartialOptions::default().parse().unwrap_err();
        assert_eq!(err, Error::InvalidInput("FREQ is required".into()));
    }

    #[test]
    fn defaults_are_applied() {
        let parsed = base().parse().unwrap();
        assert_eq!(parsed.interval.get(), 1);
        assert_eq!(parsed.wkst, Weekday::Sunday);
        assert_eq!(parsed.skip, Skip::Omit);
        assert_eq!(parsed.count, None);
        assert_eq!(parsed.until, None);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut options = base();
        options.interval = Some(0);
        assert!(options.parse().is_err());
    }

    #[test]
    fn month_day_sign_split() {
        let mut options = base();
        options.bymonthday = vec![15, -1, 1, -30];
        let parsed = options.parse().unwrap();
        assert_eq!(parsed.bymonthday, vec![15, 1]);
        assert_eq!(parsed.bynmonthday, vec![-1, -30]);
    }

    #[test]
    fn zero_month_day_is_rejected() {
        let mut options = base();
        options.bymonthday = vec![0];
        assert!(matches!(
            options.parse(),
            Err(Error::InvalidInput(message)) if message.contains("BYMONTHDAY")
        ));
    }

    #[test]
    fn weekday_ordinal_split() {
        let mut options = base();
        options.byweekday = vec![
            Weekday::Friday.into(),
            Weekday::Monday.nth(2),
            Weekday::Sunday.into(),
            Weekday::Thursday.nth(-1),
        ];
        let parsed = options.parse().unwrap();
        assert_eq!(parsed.byweekday, vec![Weekday::Friday, Weekday::Sunday]);
        assert_eq!(
            parsed.bynweekday,
            vec![(Weekday::Monday, 2), (Weekday::Thursday, -1)]
        );
    }

    #[test]
    fn range_checks() {
        let cases: [(fn(&mut PartialOptions), bool); 13] = [
            (|o| o.bymonth = vec![12], true),
            (|o| o.bymonth = vec![13], false),
            (|o| o.bymonth = vec![0], false),
            (|o| o.byyearday = vec![-355, 355], true),
            (|o| o.byyearday = vec![356], false),
            (|o| o.bysetpos = vec![-366, 1], true),
            (|o| o.bysetpos = vec![0], false),
            (|o| o.byweekno = vec![53, -53], true),
            (|o| o.byweekno = vec![54], false),
            (|o| o.byhour = vec![23], true),
            (|o| o.byhour = vec![24], false),
            (|o| o.byminute = vec![60], false),
            (|o| o.bysecond = vec![60], false),
        ];

        for (mutate, ok) in cases {
            let mut options = base();
            mutate(&mut options);
            assert_eq!(options.parse().is_ok(), ok, "{options:?}");
        }
    }

    #[test]
    fn gregorian_dtstart_is_converted() {
        let mut options = base();
        options.dtstart = Some(
            NaiveDate::from_ymd_opt(2025, 3, 1)
                .unwrap()
                .into(),
        );
        let parsed = options.parse().unwrap();
        assert_eq!(
            parsed.dtstart,
            HijriDate::new_in(HijriCalendar::UmmAlQura, 1446, 9, 1).unwrap()
        );
    }
}
