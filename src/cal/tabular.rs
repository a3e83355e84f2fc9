//! The arithmetic (tabular) Islamic calendar.
//!
//! Hijri years run in a 30-year cycle of 10631 days with leap years at
//! positions {2, 5, 7, 10, 13, 16, 18, 21, 24, 26, 29}. Odd months have 30
//! days and even months 29, except that month 12 has 30 days in a leap
//! year. The epoch (1 Muharram 1 AH) is JDN 1948439.5, i.e. integer day
//! 1948440.

/// Integer Julian Day Number of 1 Muharram 1 AH.
pub(crate) const EPOCH_JDN: i64 = 1948440;

/// Days in one 30-year leap cycle.
pub(crate) const CYCLE_DAYS: i64 = 10631;

/// Years in one leap cycle.
pub(crate) const CYCLE_YEARS: i64 = 30;

/// The number of leap years in the tabular cycle strictly before `year`.
/// Callers guarantee `year >= 1`.
const fn leap_years_before(year: i64) -> i64 {
    (11 * year + 3) / 30
}

/// Whether `year` has 355 days in the tabular cycle.
pub(crate) const fn is_leap(year: i32) -> bool {
    let year = year as i64;
    leap_years_before(year + 1) - leap_years_before(year) == 1
}

/// The length of `year` in days.
pub(crate) const fn year_length(year: i32) -> u16 {
    if is_leap(year) { 355 } else { 354 }
}

/// The length in days of month `month` of `year`.
pub(crate) const fn month_length(year: i32, month: u8) -> u8 {
    if month == 12 && is_leap(year) {
        30
    } else if month % 2 == 1 {
        30
    } else {
        29
    }
}

/// Days between 1 Muharram and the first of `month` in a common year.
const fn days_before_month(month: u8) -> i64 {
    let month = month as i64;
    30 * (month / 2) + 29 * ((month - 1) / 2)
}

/// The JDN of a tabular (year, month, day) triple. The triple is assumed
/// to be valid; out-of-range days simply offset from the month start.
pub(crate) const fn to_jdn(year: i32, month: u8, day: u8) -> i64 {
    let y = year as i64;
    EPOCH_JDN
        + 354 * (y - 1)
        + leap_years_before(y)
        + days_before_month(month)
        + (day as i64 - 1)
}

/// The tabular (year, month, day) triple containing `jdn`. The year is
/// returned widened; values outside the supported range are the caller's
/// problem to reject.
pub(crate) fn from_jdn(jdn: i64) -> (i64, u8, u8) {
    let days = jdn - EPOCH_JDN;
    let cycle = days.div_euclid(CYCLE_DAYS);
    let mut rem = days.rem_euclid(CYCLE_DAYS);

    let mut year = CYCLE_YEARS * cycle + 1;
    loop {
        let len = year_length(clamp_year(year)) as i64;
        if rem < len {
            break;
        }
        rem -= len;
        year += 1;
    }

    let mut month = 1u8;
    loop {
        let len = month_length(clamp_year(year), month) as i64;
        if rem < len {
            break;
        }
        rem -= len;
        month += 1;
    }

    (year, month, rem as u8 + 1)
}

/// Collapses a widened year onto the cycle for leap lookups. Leap status
/// depends only on the year's position within the 30-year cycle, so this
/// is exact even for years outside `i32`.
fn clamp_year(year: i64) -> i32 {
    (year.rem_euclid(CYCLE_YEARS) + CYCLE_YEARS) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leap_cycle_positions() {
        let leaps: Vec<i32> = (1..=30).filter(|&y| is_leap(y)).collect();
        assert_eq!(leaps, vec![2, 5, 7, 10, 13, 16, 18, 21, 24, 26, 29]);
    }

    #[test]
    fn cycle_length_sums() {
        let total: i64 = (1..=30).map(|y| year_length(y) as i64).sum();
        assert_eq!(total, CYCLE_DAYS);
    }

    #[test]
    fn month_lengths_alternate() {
        assert_eq!(month_length(1446, 1), 30);
        assert_eq!(month_length(1446, 2), 29);
        assert_eq!(month_length(1446, 11), 30);

        // month 12 stretches in leap years
        assert_eq!(month_length(2, 12), 30);
        assert_eq!(month_length(1, 12), 29);
    }

    #[test]
    fn epoch_is_year_one() {
        assert_eq!(to_jdn(1, 1, 1), EPOCH_JDN);
        assert_eq!(from_jdn(EPOCH_JDN), (1, 1, 1));
    }

    #[test]
    fn jdn_round_trips() {
        for &year in &[1, 2, 29, 30, 31, 1355, 1446, 1500, 4000, 9999] {
            for month in 1..=12u8 {
                for &day in &[1, 15, month_length(year, month)] {
                    let jdn = to_jdn(year, month, day);
                    assert_eq!(from_jdn(jdn), (year as i64, month, day));
                }
            }
        }
    }

    #[test]
    fn known_civil_alignment() {
        // 1 Muharram 1356 opens the Umm al-Qura table range and is also
        // exactly reproduced by the arithmetic cycle: 14 March 1937.
        assert_eq!(to_jdn(1356, 1, 1), 2428607);
    }
}
