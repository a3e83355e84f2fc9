//! Parsers for primitive (i.e. terminal) grammar elements.

use winnow::{
    ModalResult, Parser,
    ascii::digit1,
    combinator::{alt, opt},
    token::take,
};

use crate::model::date::RawTime;
use crate::model::rrule::DateToken;

/// The sign of a numeric rule-part value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum Sign {
    #[default]
    Positive = 1,
    Negative = -1,
}

/// Parses an explicit `+` or `-`.
///
/// # Examples
///
/// ```
/// use hilal::parser::primitive::{sign, Sign};
/// use winnow::Parser;
///
/// assert_eq!(sign.parse_peek("+3"), Ok(("3", Sign::Positive)));
/// assert_eq!(sign.parse_peek("-3"), Ok(("3", Sign::Negative)));
/// assert!(sign.parse_peek("3").is_err());
/// ```
pub fn sign(input: &mut &str) -> ModalResult<Sign> {
    alt(('+'.value(Sign::Positive), '-'.value(Sign::Negative)))
        .parse_next(input)
}

/// Parses a date token of the form `YYYYMMDD`, optionally followed by
/// `THHMMSS` and a trailing `Z` (which is ignored).
///
/// # Examples
///
/// ```
/// use hilal::parser::primitive::date_token;
/// use winnow::Parser;
///
/// assert!(date_token.parse_peek("14460901").is_ok());
/// assert!(date_token.parse_peek("14460901T053000").is_ok());
/// assert!(date_token.parse_peek("14460901T053000Z").is_ok());
/// assert!(date_token.parse_peek("1446-09-01").is_err());
/// ```
pub fn date_token(input: &mut &str) -> ModalResult<DateToken> {
    (
        take(4usize).and_then(lz_dec_uint::<u32>),
        take(2usize).and_then(lz_dec_uint::<u32>),
        take(2usize).and_then(lz_dec_uint::<u32>),
        opt(('T', raw_time_token).map(|(_, time)| time)),
        opt('Z'),
    )
        .map(|(year, month, day, time, _)| DateToken {
            year: year as i32,
            month: month as u8,
            day: day as u8,
            time: time.unwrap_or(RawTime::MIDNIGHT),
        })
        .parse_next(input)
}

/// Parses a time token of the form `HHMMSS`.
///
/// # Examples
///
/// ```
/// use hilal::parser::primitive::raw_time_token;
/// use hilal::model::date::RawTime;
/// use winnow::Parser;
///
/// assert_eq!(
///     raw_time_token.parse_peek("053000").unwrap().1,
///     RawTime { hours: 5, minutes: 30, seconds: 0 },
/// );
///
/// assert!(raw_time_token.parse_peek("240000").is_err());
/// assert!(raw_time_token.parse_peek("235960").is_err());
/// ```
pub fn raw_time_token(input: &mut &str) -> ModalResult<RawTime> {
    (
        take(2usize)
            .and_then(lz_dec_uint::<u8>)
            .verify(|&hours| hours < 24),
        take(2usize)
            .and_then(lz_dec_uint::<u8>)
            .verify(|&minutes| minutes < 60),
        take(2usize)
            .and_then(lz_dec_uint::<u8>)
            .verify(|&seconds| seconds < 60),
    )
        .map(|(hours, minutes, seconds)| RawTime {
            hours,
            minutes,
            seconds,
        })
        .parse_next(input)
}

/// A version of [`dec_uint`] that accepts leading zeros.
///
/// [`dec_uint`]: winnow::ascii::dec_uint
pub(crate) fn lz_dec_uint<O>(input: &mut &str) -> ModalResult<O>
where
    O: winnow::ascii::Uint,
{
    digit1
        .verify_map(|digits: &str| O::try_from_dec_uint(digits))
        .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lz_dec_uint_accepts_leading_zeros() {
        assert_eq!(lz_dec_uint::<u32>.parse_peek("007"), Ok(("", 7)));
        assert_eq!(lz_dec_uint::<u8>.parse_peek("15x"), Ok(("x", 15)));
        assert!(lz_dec_uint::<u8>.parse_peek("300").is_err());
        assert!(lz_dec_uint::<u32>.parse_peek("abc").is_err());
    }

    #[test]
    fn date_token_fields() {
        let token = date_token.parse_peek("14460901").unwrap().1;
        assert_eq!((token.year, token.month, token.day), (1446, 9, 1));
        assert_eq!(token.time, RawTime::MIDNIGHT);

        let token = date_token.parse_peek("14461230T235959Z").unwrap().1;
        assert_eq!((token.year, token.month, token.day), (1446, 12, 30));
        assert_eq!(
            token.time,
            RawTime {
                hours: 23,
                minutes: 59,
                seconds: 59
            }
        );
    }

    #[test]
    fn sign_parser() {
        assert_eq!(sign.parse_peek("+1"), Ok(("1", Sign::Positive)));
        assert_eq!(sign.parse_peek("-1"), Ok(("1", Sign::Negative)));
        assert!(sign.parse_peek("1").is_err());
    }
}
