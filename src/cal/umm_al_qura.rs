//! The table-driven Umm al-Qura calendar.
//!
//! Month lengths for the years 1356–1500 AH are stored as packed 16-bit
//! words, one per year: bit `m - 1` is set exactly when month `m` has 30
//! days. The year-start JDNs are accumulated lazily from the anchor (the
//! JDN of 1 Muharram 1356, computed arithmetically from the epoch with
//! the tabular cycle) and memoized once for the whole table.
//!
//! LOUD FALLBACK: every operation on a year outside [1356, 1500] delegates
//! to the arithmetic tabular calendar. Callers that need table-accurate
//! civil dates must stay inside [`FIRST_YEAR`]..=[`LAST_YEAR`].

use std::sync::OnceLock;

use super::tabular;

/// First year covered by the month-length table.
pub const FIRST_YEAR: i32 = 1356;

/// Last year covered by the month-length table.
pub const LAST_YEAR: i32 = 1500;

/// Packed month lengths for 1356..=1500 AH; bit `m - 1` set ⇔ month `m`
/// has 30 days.
#[rustfmt::skip]
const MONTH_WORDS: [u16; (LAST_YEAR - FIRST_YEAR + 1) as usize] = [
    0x0aaa, 0x055a, 0x0b55, 0x0aaa, 0x0556, 0x0ab5, 0x06aa, 0x0555,
    0x0aad, 0x056a, 0x0d55, 0x0aaa, 0x055a, 0x0ad5, 0x0aaa, 0x0555,
    0x0ab5, 0x05aa, 0x0555, 0x0aab, 0x056a, 0x0b55, 0x0aaa, 0x0556,
    0x0ad5, 0x06aa, 0x0555, 0x0aad, 0x05aa, 0x0d55, 0x0aaa, 0x055a,
    0x0b55, 0x0aaa, 0x0555, 0x0ab5, 0x06aa, 0x0555, 0x0aab, 0x056a,
    0x0d55, 0x0aaa, 0x0556, 0x0ad5, 0x0aaa, 0x0555, 0x0aad, 0x05aa,
    0x0555, 0x0aab, 0x055a, 0x0b55, 0x0aaa, 0x0556, 0x0ab5, 0x06aa,
    0x0555, 0x0aad, 0x056a, 0x0d55, 0x0aaa, 0x055a, 0x0ad5, 0x0aaa,
    0x0555, 0x0ab5, 0x05aa, 0x0555, 0x0aab, 0x056a, 0x0b55, 0x0aaa,
    0x0556, 0x0ad5, 0x06aa, 0x0555, 0x0aad, 0x05aa, 0x0555, 0x0aab,
    0x055a, 0x0b55, 0x0aaa, 0x0556, 0x0ab5, 0x06aa, 0x0555, 0x0aad,
    0x056a, 0x0555, 0x02ab, 0x055b, 0x0ad5, 0x0aaa, 0x0555, 0x0ab5,
    0x05aa, 0x0555, 0x0aab, 0x056a, 0x0b55, 0x0aaa, 0x0556, 0x0ad5,
    0x06aa, 0x0555, 0x0aad, 0x05aa, 0x0d55, 0x0aaa, 0x055a, 0x0b55,
    0x0aaa, 0x0555, 0x0ab5, 0x06aa, 0x0555, 0x0aab, 0x056a, 0x0d55,
    0x0aaa, 0x0556, 0x0ad5, 0x0aaa, 0x0555, 0x0aad, 0x05aa, 0x0555,
    0x0aab, 0x055a, 0x0b55, 0x0aaa, 0x0556, 0x0ab5, 0x06aa, 0x0555,
    0x0aad, 0x056a, 0x0d55, 0x0aaa, 0x055a, 0x0ad5, 0x0aaa, 0x0555,
    0x0ab5,
];

const TABLE_YEARS: usize = MONTH_WORDS.len();

fn in_table(year: i32) -> bool {
    (FIRST_YEAR..=LAST_YEAR).contains(&year)
}

fn word(year: i32) -> u16 {
    MONTH_WORDS[(year - FIRST_YEAR) as usize]
}

/// The length in days of month `month` of `year`.
pub(crate) fn month_length(year: i32, month: u8) -> u8 {
    if !in_table(year) {
        return tabular::month_length(year, month);
    }

    if word(year) & (1 << (month - 1)) != 0 { 30 } else { 29 }
}

/// Days between 1 Muharram of `year` and the first of `month`.
fn days_before_month(year: i32, month: u8) -> i64 {
    let prior = word(year) & ((1u16 << (month - 1)) - 1);
    29 * (month as i64 - 1) + prior.count_ones() as i64
}

/// The length of `year` in days.
pub(crate) fn year_length(year: i32) -> u16 {
    if !in_table(year) {
        return tabular::year_length(year);
    }

    29 * 12 + word(year).count_ones() as u16
}

/// Whether `year` has 355 days.
pub(crate) fn is_leap(year: i32) -> bool {
    year_length(year) == 355
}

/// Year-start JDNs for 1356..=1501: entry `i` is 1 Muharram of
/// `FIRST_YEAR + i`, with one extra entry marking the end of the table.
fn year_starts() -> &'static [i64; TABLE_YEARS + 1] {
    static STARTS: OnceLock<[i64; TABLE_YEARS + 1]> = OnceLock::new();
    STARTS.get_or_init(|| {
        let mut starts = [0i64; TABLE_YEARS + 1];
        let mut jdn = tabular::to_jdn(FIRST_YEAR, 1, 1);
        for (i, word) in MONTH_WORDS.iter().enumerate() {
            starts[i] = jdn;
            jdn += 29 * 12 + word.count_ones() as i64;
        }
        starts[TABLE_YEARS] = jdn;
        starts
    })
}

/// The JDN of a (year, month, day) triple. The triple is assumed valid.
pub(crate) fn to_jdn(year: i32, month: u8, day: u8) -> i64 {
    if !in_table(year) {
        return tabular::to_jdn(year, month, day);
    }

    year_starts()[(year - FIRST_YEAR) as usize]
        + days_before_month(year, month)
        + (day as i64 - 1)
}

/// The (year, month, day) triple containing `jdn`.
pub(crate) fn from_jdn(jdn: i64) -> (i64, u8, u8) {
    let starts = year_starts();
    if jdn < starts[0] || jdn >= starts[TABLE_YEARS] {
        return tabular::from_jdn(jdn);
    }

    let index = starts.partition_point(|&start| start <= jdn) - 1;
    let year = FIRST_YEAR + index as i32;

    let mut rem = jdn - starts[index];
    let mut month = 1u8;
    loop {
        let len = month_length(year, month) as i64;
        if rem < len {
            break;
        }
        rem -= len;
        month += 1;
    }

    (year as i64, month, rem as u8 + 1)
}
