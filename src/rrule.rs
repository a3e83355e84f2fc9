//! The public recurrence rule type.

use std::cell::RefCell;
use std::fmt;
use std::str::FromStr;

use crate::cache::{QueryCache, bound_key, range_key};
use crate::engine::OccurrenceIter;
use crate::error::Error;
use crate::model::date::{HijriDate, Weekday};
use crate::model::options::{ParsedOptions, PartialOptions};
use crate::model::rrule::Skip;
use crate::parser::parse_rrule_string;

/// A single recurrence rule: parsed options plus a lazy occurrence
/// stream, with memoized query results.
///
/// Construct with [`RRule::new`] from [`PartialOptions`], or parse the
/// two-line textual form via [`FromStr`]. The [`fmt::Display`]
/// implementation is the canonical serializer.
#[derive(Debug, Clone)]
pub struct RRule {
    partial: PartialOptions,
    options: ParsedOptions,
    cache: RefCell<QueryCache>,
}

impl RRule {
    /// Normalizes the options and builds a rule.
    pub fn new(options: PartialOptions) -> Result<Self, Error> {
        let parsed = options.parse()?;
        Ok(Self {
            partial: options,
            options: parsed,
            cache: RefCell::new(QueryCache::default()),
        })
    }

    /// The canonicalized options driving the expansion.
    pub fn options(&self) -> &ParsedOptions {
        &self.options
    }

    /// The options exactly as supplied, used for serialization.
    pub fn partial_options(&self) -> &PartialOptions {
        &self.partial
    }

    /// A lazy ascending stream of occurrences.
    pub fn iter(&self) -> impl Iterator<Item = Result<HijriDate, Error>> + '_ {
        OccurrenceIter::new(&self.options)
    }

    /// All occurrences of the rule. Memoized.
    pub fn all(&self) -> Result<Vec<HijriDate>, Error> {
        if let Some(dates) = &self.cache.borrow().all {
            return Ok(dates.clone());
        }

        let dates = self.iter().collect::<Result<Vec<_>, _>>()?;
        self.cache.borrow_mut().all = Some(dates.clone());
        Ok(dates)
    }

    /// Drains the stream through `callback`; a `false` return stops the
    /// traversal (the rejected date is not collected). Never memoized.
    pub fn all_with<F>(&self, mut callback: F) -> Result<Vec<HijriDate>, Error>
    where
        F: FnMut(&HijriDate) -> bool,
    {
        let mut dates = Vec::new();
        for result in self.iter() {
            let date = result?;
            if !callback(&date) {
                break;
            }
            dates.push(date);
        }
        Ok(dates)
    }

    /// The occurrences between `after` and `before`, with both bounds
    /// inclusive or exclusive per the flag. Memoized.
    pub fn between(
        &self,
        after: HijriDate,
        before: HijriDate,
        inclusive: bool,
    ) -> Result<Vec<HijriDate>, Error> {
        let key = range_key(&after, &before, inclusive);
        if let Some(dates) = self.cache.borrow().between.get(&key) {
            return Ok(dates.clone());
        }

        let dates = self.between_with(after, before, inclusive, |_| true)?;
        self.cache
            .borrow_mut()
            .between
            .insert(key, dates.clone());
        Ok(dates)
    }

    /// [`RRule::between`] with a callback; a `false` return stops the
    /// traversal. Never memoized.
    pub fn between_with<F>(
        &self,
        after: HijriDate,
        before: HijriDate,
        inclusive: bool,
        mut callback: F,
    ) -> Result<Vec<HijriDate>, Error>
    where
        F: FnMut(&HijriDate) -> bool,
    {
        let mut dates = Vec::new();
        for result in self.iter() {
            let date = result?;
            if past_upper(&date, &before, inclusive) {
                break;
            }
            if !reached_lower(&date, &after, inclusive) {
                continue;
            }
            if !callback(&date) {
                break;
            }
            dates.push(date);
        }
        Ok(dates)
    }

    /// The first occurrence past `date` (or at it, when inclusive).
    /// Memoized.
    pub fn after(
        &self,
        date: HijriDate,
        inclusive: bool,
    ) -> Result<Option<HijriDate>, Error> {
        let key = bound_key(&date, inclusive);
        if let Some(hit) = self.cache.borrow().after.get(&key) {
            return Ok(*hit);
        }

        let mut found = None;
        for result in self.iter() {
            let candidate = result?;
            if reached_lower(&candidate, &date, inclusive) {
                found = Some(candidate);
                break;
            }
        }

        self.cache.borrow_mut().after.insert(key, found);
        Ok(found)
    }

    /// The last occurrence before `date` (or at it, when inclusive).
    /// Memoized. Consumes the stream up to `date`.
    pub fn before(
        &self,
        date: HijriDate,
        inclusive: bool,
    ) -> Result<Option<HijriDate>, Error> {
        let key = bound_key(&date, inclusive);
        if let Some(hit) = self.cache.borrow().before.get(&key) {
            return Ok(*hit);
        }

        let mut found = None;
        for result in self.iter() {
            let candidate = result?;
            if past_upper(&candidate, &date, inclusive) {
                break;
            }
            found = Some(candidate);
        }

        self.cache.borrow_mut().before.insert(key, found);
        Ok(found)
    }

    /// Writes the `name=value` part list of the RRULE line, in canonical
    /// order, omitting default-valued properties.
    pub(crate) fn write_parts(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FREQ={}", self.options.freq)?;

        if self.options.interval.get() != 1 {
            write!(f, ";INTERVAL={}", self.options.interval)?;
        }
        if self.options.wkst != Weekday::Sunday {
            write!(f, ";WKST={}", self.options.wkst)?;
        }
        if let Some(count) = self.options.count {
            write!(f, ";COUNT={count}")?;
        }
        if let Some(until) = &self.options.until {
            f.write_str(";UNTIL=")?;
            write_date_token(f, until)?;
        }

        write_list(f, "BYSETPOS", &self.partial.bysetpos)?;
        write_list(f, "BYMONTH", &self.partial.bymonth)?;
        write_list(f, "BYMONTHDAY", &self.partial.bymonthday)?;
        write_list(f, "BYYEARDAY", &self.partial.byyearday)?;
        write_list(f, "BYWEEKNO", &self.partial.byweekno)?;
        write_list(f, "BYDAY", &self.partial.byweekday)?;
        write_list(f, "BYHOUR", &self.partial.byhour)?;
        write_list(f, "BYMINUTE", &self.partial.byminute)?;
        write_list(f, "BYSECOND", &self.partial.bysecond)?;

        if self.options.skip != Skip::Omit {
            write!(f, ";SKIP={}", self.options.skip)?;
        }
        if let Some(tzid) = &self.options.tzid {
            write!(f, ";TZID={tzid}")?;
        }

        Ok(())
    }
}

impl PartialEq for RRule {
    fn eq(&self, other: &Self) -> bool {
        self.options == other.options
    }
}

impl FromStr for RRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        Self::new(parse_rrule_string(s)?)
    }
}

impl fmt::Display for RRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.partial.dtstart.is_some() {
            f.write_str("DTSTART")?;
            if self.partial.calendar.is_some() {
                write!(f, ";CALENDAR={}", self.options.calendar.name())?;
            }
            f.write_str(":")?;
            write_date_token(f, &self.options.dtstart)?;
            f.write_str("\n")?;
        }

        f.write_str("RRULE:")?;
        self.write_parts(f)
    }
}

fn reached_lower(date: &HijriDate, bound: &HijriDate, inclusive: bool) -> bool {
    if inclusive { date >= bound } else { date > bound }
}

fn past_upper(date: &HijriDate, bound: &HijriDate, inclusive: bool) -> bool {
    if inclusive { date > bound } else { date >= bound }
}

/// Writes the `YYYYMMDD` token of a date, extended with `THHMMSS` when
/// the time is not midnight.
pub(crate) fn write_date_token(
    f: &mut fmt::Formatter<'_>,
    date: &HijriDate,
) -> fmt::Result {
    write!(
        f,
        "{:04}{:02}{:02}",
        date.year(),
        date.month(),
        date.day()
    )?;

    if (date.hour(), date.minute(), date.second()) != (0, 0, 0) {
        write!(
            f,
            "T{:02}{:02}{:02}",
            date.hour(),
            date.minute(),
            date.second()
        )?;
    }

    Ok(())
}

fn write_list<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    values: &[T],
) -> fmt::Result {
    if values.is_empty() {
        return Ok(());
    }

    write!(f, ";{name}=")?;
    for (index, value) in values.iter().enumerate() {
        if index > 0 {
            f.write_str(",")?;
        }
        write!(f, "{value}")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cal::HijriCalendar;
    use crate::model::rrule::Frequency;

    const UAQ: HijriCalendar = HijriCalendar::UmmAlQura;

    fn date(y: i32, m: u8, d: u8) -> HijriDate {
        HijriDate::new_in(UAQ, y, m, d).unwrap()
    }

    fn ramadan_rule() -> RRule {
        RRule::new(PartialOptions {
            freq: Some(Frequency::Yearly),
            dtstart: Some(date(1446, 9, 1).into()),
            bymonth: vec![9],
            bymonthday: vec![1],
            count: Some(3),
            calendar: Some(UAQ),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn all_is_idempotent_and_memoized() {
        let rule = ramadan_rule();
        let first = rule.all().unwrap();
        let second = rule.all().unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![date(1446, 9, 1), date(1447, 9, 1), date(1448, 9, 1)]
        );
    }

    #[test]
    fn all_with_short_circuits() {
        let rule = ramadan_rule();
        let mut seen = 0;
        let dates = rule
            .all_with(|_| {
                seen += 1;
                seen < 2
            })
            .unwrap();
        assert_eq!(dates, vec![date(1446, 9, 1)]);
        assert_eq!(seen, 2);
    }

    #[test]
    fn between_respects_bounds() {
        let rule = RRule::new(PartialOptions {
            freq: Some(Frequency::Daily),
            dtstart: Some(date(1446, 1, 1).into()),
            count: Some(10),
            calendar: Some(UAQ),
            ..Default::default()
        })
        .unwrap();

        let exclusive = rule
            .between(date(1446, 1, 2), date(1446, 1, 5), false)
            .unwrap();
        assert_eq!(exclusive, vec![date(1446, 1, 3), date(1446, 1, 4)]);

        let inclusive = rule
            .between(date(1446, 1, 2), date(1446, 1, 5), true)
            .unwrap();
        assert_eq!(
            inclusive,
            vec![
                date(1446, 1, 2),
                date(1446, 1, 3),
                date(1446, 1, 4),
                date(1446, 1, 5),
            ]
        );
    }

    #[test]
    fn after_and_before_lookups() {
        let rule = ramadan_rule();

        assert_eq!(
            rule.after(date(1446, 9, 1), false).unwrap(),
            Some(date(1447, 9, 1))
        );
        assert_eq!(
            rule.after(date(1446, 9, 1), true).unwrap(),
            Some(date(1446, 9, 1))
        );
        assert_eq!(rule.after(date(1448, 9, 2), false).unwrap(), None);

        assert_eq!(
            rule.before(date(1447, 9, 1), false).unwrap(),
            Some(date(1446, 9, 1))
        );
        assert_eq!(
            rule.before(date(1447, 9, 1), true).unwrap(),
            Some(date(1447, 9, 1))
        );
        assert_eq!(rule.before(date(1446, 1, 1), true).unwrap(), None);
    }

    #[test]
    fn serializes_canonically() {
        assert_eq!(
            ramadan_rule().to_string(),
            "DTSTART;CALENDAR=HIJRI-UM-AL-QURA:14460901\n\
             RRULE:FREQ=YEARLY;COUNT=3;BYMONTH=9;BYMONTHDAY=1"
        );
    }

    #[test]
    fn serialization_omits_defaults() {
        let rule = RRule::new(PartialOptions {
            freq: Some(Frequency::Daily),
            dtstart: Some(date(1446, 1, 1).into()),
            interval: Some(1),
            wkst: Some(Weekday::Sunday),
            skip: Some(Skip::Omit),
            calendar: Some(UAQ),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            rule.to_string(),
            "DTSTART;CALENDAR=HIJRI-UM-AL-QURA:14460101\nRRULE:FREQ=DAILY"
        );
    }

    #[test]
    fn serialization_merges_signed_month_days_in_caller_order() {
        let rule = RRule::new(PartialOptions {
            freq: Some(Frequency::Monthly),
            dtstart: Some(date(1446, 1, 1).into()),
            bymonthday: vec![15, -1, 1],
            interval: Some(2),
            skip: Some(Skip::Backward),
            calendar: Some(UAQ),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            rule.to_string(),
            "DTSTART;CALENDAR=HIJRI-UM-AL-QURA:14460101\n\
             RRULE:FREQ=MONTHLY;INTERVAL=2;BYMONTHDAY=15,-1,1;SKIP=BACKWARD"
        );
    }

    #[test]
    fn text_round_trip_preserves_occurrences() {
        let texts = [
            "DTSTART;CALENDAR=HIJRI-TABULAR:14460101\nRRULE:FREQ=MONTHLY;COUNT=5;BYMONTHDAY=1",
            "DTSTART:14460901\nRRULE:FREQ=WEEKLY;BYDAY=SA,TU;COUNT=6",
            "DTSTART:14450101\nRRULE:FREQ=YEARLY;BYMONTH=9;BYMONTHDAY=1,-1;COUNT=4;SKIP=FORWARD",
            "DTSTART:14460115\nRRULE:FREQ=MONTHLY;INTERVAL=3;BYSETPOS=1;BYDAY=FR;UNTIL=14480101",
        ];

        for text in texts {
            let rule: RRule = text.parse().unwrap();
            let reparsed: RRule = rule.to_string().parse().unwrap();
            assert_eq!(
                rule.all().unwrap(),
                reparsed.all().unwrap(),
                "round trip changed occurrences of {text}"
            );
        }
    }

    #[test]
    fn parsed_text_matches_programmatic_rule() {
        let from_text: RRule =
            "DTSTART;CALENDAR=HIJRI-UM-AL-QURA:14460901\nRRULE:FREQ=YEARLY;BYMONTH=9;BYMONTHDAY=1;COUNT=3"
                .parse()
                .unwrap();
        assert_eq!(from_text, ramadan_rule());
        assert_eq!(from_text.to_string(), ramadan_rule().to_string());
    }
}
