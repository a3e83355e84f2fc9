//! Memoization of query results.
//!
//! Every rule (and rule set) owns one [`QueryCache`] exclusively. Entries
//! are keyed by the day-granularity string of the query inputs, and the
//! whole cache is dropped whenever the owning collection mutates.

use hashbrown::HashMap;

use crate::model::date::HijriDate;

#[derive(Debug, Default, Clone)]
pub(crate) struct QueryCache {
    pub(crate) all: Option<Vec<HijriDate>>,
    pub(crate) after: HashMap<String, Option<HijriDate>>,
    pub(crate) before: HashMap<String, Option<HijriDate>>,
    pub(crate) between: HashMap<String, Vec<HijriDate>>,
}

impl QueryCache {
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

/// The day-granularity token of a date, `YYYYMMDD`.
pub(crate) fn day_key(date: &HijriDate) -> String {
    format!("{:04}{:02}{:02}", date.year(), date.month(), date.day())
}

pub(crate) fn bound_key(date: &HijriDate, inclusive: bool) -> String {
    format!("{}:{inclusive}", day_key(date))
}

pub(crate) fn range_key(
    after: &HijriDate,
    before: &HijriDate,
    inclusive: bool,
) -> String {
    format!("{}:{}:{inclusive}", day_key(after), day_key(before))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cal::HijriCalendar;

    #[test]
    fn keys_are_day_granular() {
        let date = HijriDate::new_in(HijriCalendar::UmmAlQura, 1446, 9, 1)
            .unwrap()
            .and_hms(13, 30, 0)
            .unwrap();

        assert_eq!(day_key(&date), "14460901");
        assert_eq!(bound_key(&date, true), "14460901:true");
        assert_eq!(range_key(&date, &date, false), "14460901:14460901:false");
    }
}
