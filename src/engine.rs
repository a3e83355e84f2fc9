//! The recurrence expansion engine.
//!
//! [`OccurrenceIter`] walks period anchors at the rule's frequency,
//! generates a sorted, de-duplicated candidate list per period from the
//! by-part filters, narrows it by BYSETPOS, and streams the candidates
//! that fall between DTSTART and UNTIL. The stream is strictly ascending
//! and duplicate-free across periods.
//!
//! When a rule has no UNTIL and no COUNT the walk is bounded by a safety
//! ceiling of `max(100_000, 100 * count)` periods.

use smallvec::SmallVec;

use crate::cal;
use crate::error::Error;
use crate::model::date::{
    HijriDate, Weekday, nth_weekday_of_month, weekday_of_jdn,
};
use crate::model::options::ParsedOptions;
use crate::model::rrule::{Frequency, Skip, WeekdaySet};

/// A bare (year, month, day) triple; engine arithmetic stays on triples
/// and only materializes [`HijriDate`] values at the emission boundary.
type Ymd = (i32, u8, u8);

type Candidates = SmallVec<[Ymd; 8]>;

/// A pull-based, lazy, strictly ascending stream of occurrences.
pub(crate) struct OccurrenceIter<'a> {
    options: &'a ParsedOptions,
    weekday_filter: WeekdaySet,
    cursor: Option<HijriDate>,
    /// Pending emissions for the current period, in descending order so
    /// that `pop` yields them ascending.
    buffer: SmallVec<[HijriDate; 8]>,
    last: Option<Ymd>,
    emitted: u32,
    periods: usize,
    ceiling: usize,
    done: bool,
}

impl<'a> OccurrenceIter<'a> {
    pub(crate) fn new(options: &'a ParsedOptions) -> Self {
        let ceiling = match options.count {
            Some(count) => 100_000usize.max(100usize.saturating_mul(count as usize)),
            None => 100_000,
        };

        Self {
            options,
            weekday_filter: options.byweekday.iter().copied().collect(),
            cursor: Some(options.dtstart),
            buffer: SmallVec::new(),
            last: None,
            emitted: 0,
            periods: 0,
            ceiling,
            done: false,
        }
    }

    /// Generates candidate periods until one produces pending emissions
    /// (or the stream ends).
    fn refill(&mut self) -> Result<(), Error> {
        let start = key(&self.options.dtstart);
        let until = self.options.until.as_ref().map(key);

        while !self.done {
            let Some(anchor) = self.cursor else {
                self.done = true;
                break;
            };

            if self.periods >= self.ceiling {
                self.done = true;
                break;
            }
            self.periods += 1;

            let mut candidates = self.period_candidates(&anchor)?;
            candidates.sort_unstable();
            candidates.dedup();

            if !self.options.bysetpos.is_empty() {
                candidates = select_positions(&candidates, &self.options.bysetpos);
            }

            candidates.retain(|&mut ymd| {
                ymd >= start && until.is_none_or(|until| ymd <= until)
            });

            self.cursor = self.advance(&anchor)?;
            if self.cursor.is_none() {
                self.done = true;
            }

            // One catch-up period runs with its anchor already past UNTIL,
            // to pick up candidates that precede their anchor.
            if until.is_some_and(|until| key(&anchor) > until) {
                self.done = true;
            }

            if !candidates.is_empty() {
                let time = self.options.dtstart.time();
                for &(year, month, day) in candidates.iter().rev() {
                    self.buffer.push(HijriDate::from_ymd_time(
                        self.options.calendar,
                        year,
                        month,
                        day,
                        time,
                    )?);
                }
                break;
            }
        }

        Ok(())
    }

    /// The candidate list for the period anchored at `anchor`, before
    /// sorting and BYSETPOS selection.
    fn period_candidates(&self, anchor: &HijriDate) -> Result<Candidates, Error> {
        let options = self.options;
        let calendar = options.calendar;
        let mut out = Candidates::new();

        match options.freq {
            Frequency::Yearly => {
                let year = anchor.year();
                if !options.bymonth.is_empty() {
                    for &month in &options.bymonth {
                        self.month_candidates(year, month, &mut out)?;
                    }
                } else if !options.bymonthday.is_empty()
                    || !options.bynmonthday.is_empty()
                {
                    self.month_candidates(year, anchor.month(), &mut out)?;
                } else if !options.byyearday.is_empty() {
                    self.year_day_candidates(year, &mut out);
                } else {
                    let length = calendar.month_length(year, anchor.month());
                    out.push((year, anchor.month(), anchor.day().min(length)));
                }

                if !options.byweekday.is_empty() && options.bymonth.is_empty() {
                    self.retain_weekdays(&mut out);
                }
            }
            Frequency::Monthly => {
                let year = anchor.year();
                let month = anchor.month();
                let allowed = options.bymonth.is_empty()
                    || options.bymonth.contains(&month);

                if allowed {
                    let bare = options.bymonth.is_empty()
                        && options.bymonthday.is_empty()
                        && options.bynmonthday.is_empty()
                        && options.bynweekday.is_empty()
                        && options.byweekday.is_empty();

                    if bare {
                        let length = calendar.month_length(year, month);
                        out.push((year, month, anchor.day().min(length)));
                    } else {
                        self.month_candidates(year, month, &mut out)?;
                    }
                }

                if !options.byweekday.is_empty() && options.bymonth.is_empty() {
                    self.retain_weekdays(&mut out);
                }
            }
            Frequency::Weekly => {
                if options.byweekday.is_empty() {
                    out.push((anchor.year(), anchor.month(), anchor.day()));
                } else {
                    let jdn = anchor.jdn(calendar);
                    for offset in 0..7 {
                        if !self.weekday_filter.get(weekday_of_jdn(jdn + offset)) {
                            continue;
                        }
                        match calendar.from_jdn(jdn + offset) {
                            Ok(ymd) => out.push(ymd),
                            Err(_) => break,
                        }
                    }
                }
            }
            Frequency::Daily => {
                if self.daily_filters_pass(anchor) {
                    out.push((anchor.year(), anchor.month(), anchor.day()));
                }
            }
            // Sub-day frequencies degenerate to one candidate per step at
            // day granularity.
            Frequency::Hourly | Frequency::Minutely | Frequency::Secondly => {
                out.push((anchor.year(), anchor.month(), anchor.day()));
            }
        }

        Ok(out)
    }

    /// The per-month candidate suite shared by YEARLY and MONTHLY.
    fn month_candidates(
        &self,
        year: i32,
        month: u8,
        out: &mut Candidates,
    ) -> Result<(), Error> {
        let options = self.options;
        let calendar = options.calendar;
        let length = calendar.month_length(year, month);

        if !options.bymonthday.is_empty() {
            for &day in &options.bymonthday {
                if day <= length {
                    out.push((year, month, day));
                    continue;
                }

                match options.skip {
                    Skip::Omit => {}
                    Skip::Backward => out.push((year, month, length)),
                    Skip::Forward => {
                        if month == 12 {
                            if year >= cal::MAX_YEAR {
                                return Err(Error::OutOfEpoch);
                            }
                            out.push((year + 1, 1, 1));
                        } else {
                            out.push((year, month + 1, 1));
                        }
                    }
                }
            }
        } else if !options.bynmonthday.is_empty() {
            for &nday in &options.bynmonthday {
                let day = i16::from(length) + i16::from(nday) + 1;
                if day >= 1 {
                    out.push((year, month, day as u8));
                }
            }
        } else if !options.bynweekday.is_empty() {
            for &(weekday, n) in &options.bynweekday {
                if let Some(day) =
                    nth_weekday_of_month(calendar, year, month, weekday, n)
                {
                    out.push((year, month, day));
                }
            }
        } else if !options.byweekday.is_empty() {
            let first = weekday_of_jdn(calendar.to_jdn(year, month, 1));
            for day in 1..=length {
                let repr = (first as u8 + day - 1) % 7;
                let weekday = Weekday::from_repr(repr)
                    .expect("mod 7 is a weekday");
                if self.weekday_filter.get(weekday) {
                    out.push((year, month, day));
                }
            }
        } else {
            out.push((year, month, options.dtstart.day().min(length)));
        }

        Ok(())
    }

    /// Expands BYYEARDAY entries into (month, day) pairs of `year`.
    fn year_day_candidates(&self, year: i32, out: &mut Candidates) {
        let calendar = self.options.calendar;
        let year_length = calendar.year_length(year) as i16;

        for &entry in &self.options.byyearday {
            let target = if entry > 0 {
                entry
            } else {
                year_length + entry + 1
            };
            if target < 1 || target > year_length {
                continue;
            }

            let mut remaining = target;
            let mut month = 1u8;
            loop {
                let length = i16::from(calendar.month_length(year, month));
                if remaining <= length {
                    break;
                }
                remaining -= length;
                month += 1;
            }
            out.push((year, month, remaining as u8));
        }
    }

    /// Whether the anchor day passes the DAILY limiting filters.
    fn daily_filters_pass(&self, anchor: &HijriDate) -> bool {
        let options = self.options;
        let calendar = options.calendar;
        let (year, month, day) =
            (anchor.year(), anchor.month(), anchor.day());

        if !options.bymonth.is_empty() && !options.bymonth.contains(&month) {
            return false;
        }

        if !options.bymonthday.is_empty() || !options.bynmonthday.is_empty() {
            let length = calendar.month_length(year, month);
            let positive = options.bymonthday.contains(&day);
            let negative = options.bynmonthday.iter().any(|&nday| {
                i16::from(length) + i16::from(nday) + 1 == i16::from(day)
            });
            if !(positive || negative) {
                return false;
            }
        }

        if !options.byweekday.is_empty()
            && !self.weekday_filter.get(anchor.weekday_in(calendar))
        {
            return false;
        }

        true
    }

    fn retain_weekdays(&self, out: &mut Candidates) {
        let calendar = self.options.calendar;
        out.retain(|&mut (year, month, day)| {
            self.weekday_filter
                .get(weekday_of_jdn(calendar.to_jdn(year, month, day)))
        });
    }

    /// Moves the cursor one interval forward; `None` ends the stream when
    /// the next anchor would leave the supported years.
    fn advance(&self, anchor: &HijriDate) -> Result<Option<HijriDate>, Error> {
        let calendar = self.options.calendar;
        let interval = self.options.interval.get() as i32;

        let next = match self.options.freq {
            Frequency::Yearly => anchor.add_years(interval, true, calendar),
            Frequency::Monthly => anchor.add_months(interval, true, calendar),
            Frequency::Weekly => anchor
                .add_days(7 * i64::from(interval), calendar)
                .map(Some),
            Frequency::Daily
            | Frequency::Hourly
            | Frequency::Minutely
            | Frequency::Secondly => {
                anchor.add_days(i64::from(interval), calendar).map(Some)
            }
        };

        match next {
            Ok(date) => Ok(date),
            Err(Error::OutOfEpoch) => Ok(None),
            Err(error) => Err(error),
        }
    }
}

impl Iterator for OccurrenceIter<'_> {
    type Item = Result<HijriDate, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(count) = self.options.count {
                if self.emitted >= count {
                    self.done = true;
                    self.buffer.clear();
                }
            }
            if self.done && self.buffer.is_empty() {
                return None;
            }

            if let Some(date) = self.buffer.pop() {
                let ymd = key(&date);
                if self.last.is_some_and(|last| ymd <= last) {
                    continue;
                }
                self.last = Some(ymd);
                self.emitted += 1;
                return Some(Ok(date));
            }

            if let Err(error) = self.refill() {
                self.done = true;
                self.buffer.clear();
                return Some(Err(error));
            }

            if self.buffer.is_empty() && self.done {
                return None;
            }
        }
    }
}

fn key(date: &HijriDate) -> Ymd {
    (date.year(), date.month(), date.day())
}

/// Replaces the candidate list with the values at the requested 1-based
/// positions; negative positions count from the end, out-of-range
/// positions drop silently.
fn select_positions(candidates: &Candidates, positions: &[i32]) -> Candidates {
    let length = candidates.len() as i32;
    let mut selected = Candidates::new();

    for &position in positions {
        let index = if position > 0 {
            position - 1
        } else {
            length + position
        };
        if (0..length).contains(&index) {
            selected.push(candidates[index as usize]);
        }
    }

    selected.sort_unstable();
    selected.dedup();
    selected
}
