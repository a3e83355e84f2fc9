//! Parsers for recurrence rule lines.

use winnow::{
    ModalResult, Parser,
    ascii::Caseless,
    combinator::{alt, cut_err, opt, preceded, separated, terminated},
    stream::AsChar,
    token::{any, take_while},
};

use crate::cal::{self, HijriCalendar};
use crate::error::Error;
use crate::model::date::{HijriDate, Weekday};
use crate::model::options::{DateInput, PartialOptions};
use crate::model::rrule::{DateToken, Frequency, Part, PartName, Skip, WeekdayNum};

use super::primitive::{date_token, lz_dec_uint, sign};

/// Parses the shared shape of the signed numeric rule-part values: an
/// optional sign and a magnitude in `1..=BOUND`.
fn signed_num<const BOUND: u32>(input: &mut &str) -> ModalResult<i32> {
    (opt(sign), lz_dec_uint::<u32>)
        .verify_map(|(sign, magnitude)| {
            if magnitude == 0 || magnitude > BOUND {
                return None;
            }
            Some(magnitude as i32 * sign.unwrap_or_default() as i32)
        })
        .parse_next(input)
}

/// Parses a [`Frequency`].
///
/// # Examples
///
/// ```
/// use hilal::parser::rrule::frequency;
/// use hilal::model::rrule::Frequency;
/// use winnow::Parser;
///
/// assert_eq!(frequency.parse_peek("YEARLY"), Ok(("", Frequency::Yearly)));
/// assert_eq!(frequency.parse_peek("daily"), Ok(("", Frequency::Daily)));
/// assert!(frequency.parse_peek("FORTNIGHTLY").is_err());
/// ```
pub fn frequency(input: &mut &str) -> ModalResult<Frequency> {
    alt((
        Caseless("MINUTELY").value(Frequency::Minutely),
        Caseless("SECONDLY").value(Frequency::Secondly),
        Caseless("MONTHLY").value(Frequency::Monthly),
        Caseless("HOURLY").value(Frequency::Hourly),
        Caseless("WEEKLY").value(Frequency::Weekly),
        Caseless("YEARLY").value(Frequency::Yearly),
        Caseless("DAILY").value(Frequency::Daily),
    ))
    .parse_next(input)
}

/// Parses a [`Skip`] policy.
///
/// # Examples
///
/// ```
/// use hilal::parser::rrule::skip_policy;
/// use hilal::model::rrule::Skip;
/// use winnow::Parser;
///
/// assert_eq!(skip_policy.parse_peek("OMIT"), Ok(("", Skip::Omit)));
/// assert_eq!(skip_policy.parse_peek("backward"), Ok(("", Skip::Backward)));
/// assert!(skip_policy.parse_peek("SIDEWAYS").is_err());
/// ```
pub fn skip_policy(input: &mut &str) -> ModalResult<Skip> {
    alt((
        Caseless("BACKWARD").value(Skip::Backward),
        Caseless("FORWARD").value(Skip::Forward),
        Caseless("OMIT").value(Skip::Omit),
    ))
    .parse_next(input)
}

/// Parses a `CALENDAR` parameter value, accepting the documented aliases
/// of both back-ends.
///
/// # Examples
///
/// ```
/// use hilal::parser::rrule::hijri_calendar;
/// use hilal::HijriCalendar;
/// use winnow::Parser;
///
/// assert_eq!(
///     hijri_calendar.parse_peek("HIJRI-UM-AL-QURA"),
///     Ok(("", HijriCalendar::UmmAlQura)),
/// );
/// assert_eq!(
///     hijri_calendar.parse_peek("islamic-tbla"),
///     Ok(("", HijriCalendar::Tabular)),
/// );
/// assert!(hijri_calendar.parse_peek("GREGORIAN").is_err());
/// ```
pub fn hijri_calendar(input: &mut &str) -> ModalResult<HijriCalendar> {
    alt((
        alt((
            Caseless("HIJRI-UM-AL-QURA"),
            Caseless("ISLAMIC-UMALQURA"),
            Caseless("UMM-AL-QURA"),
            Caseless("UMALQURA"),
        ))
        .value(HijriCalendar::UmmAlQura),
        alt((
            Caseless("HIJRI-TABULAR"),
            Caseless("ISLAMIC-TBLA"),
            Caseless("TABULAR"),
            Caseless("TBLA"),
        ))
        .value(HijriCalendar::Tabular),
    ))
    .parse_next(input)
}

/// Parses a two-letter [`Weekday`] code.
///
/// # Examples
///
/// ```
/// use hilal::parser::rrule::weekday;
/// use hilal::Weekday;
/// use winnow::Parser;
///
/// assert_eq!(weekday.parse_peek("SA"), Ok(("", Weekday::Saturday)));
/// assert_eq!(weekday.parse_peek("fr"), Ok(("", Weekday::Friday)));
/// assert!(weekday.parse_peek("XX").is_err());
/// ```
pub fn weekday(input: &mut &str) -> ModalResult<Weekday> {
    match (any.map(AsChar::as_char), any.map(AsChar::as_char))
        .parse_next(input)?
    {
        ('s' | 'S', 'a' | 'A') => Ok(Weekday::Saturday),
        ('s' | 'S', 'u' | 'U') => Ok(Weekday::Sunday),
        ('m' | 'M', 'o' | 'O') => Ok(Weekday::Monday),
        ('t' | 'T', 'u' | 'U') => Ok(Weekday::Tuesday),
        ('w' | 'W', 'e' | 'E') => Ok(Weekday::Wednesday),
        ('t' | 'T', 'h' | 'H') => Ok(Weekday::Thursday),
        ('f' | 'F', 'r' | 'R') => Ok(Weekday::Friday),
        _ => Err(winnow::error::ParserError::from_input(input)),
    }
}

/// Parses a [`WeekdayNum`] of the BYDAY mini-grammar
/// `(-?\d+)?([A-Z]{2})`.
///
/// # Examples
///
/// ```
/// use hilal::parser::rrule::weekday_num;
/// use hilal::Weekday;
/// use winnow::Parser;
///
/// assert_eq!(weekday_num.parse_peek("FR").unwrap().1, Weekday::Friday.into());
/// assert_eq!(weekday_num.parse_peek("1FR").unwrap().1, Weekday::Friday.nth(1));
/// assert_eq!(weekday_num.parse_peek("-1MO").unwrap().1, Weekday::Monday.nth(-1));
/// assert!(weekday_num.parse_peek("0TU").is_err());
/// ```
pub fn weekday_num(input: &mut &str) -> ModalResult<WeekdayNum> {
    (
        opt((opt('-'), lz_dec_uint::<u32>).verify_map(|(minus, magnitude)| {
            let magnitude = i16::try_from(magnitude).ok()?;
            let ordinal = if minus.is_some() { -magnitude } else { magnitude };
            std::num::NonZero::new(ordinal)
        })),
        weekday,
    )
        .map(|(ordinal, weekday)| WeekdayNum { ordinal, weekday })
        .parse_next(input)
}

/// Parses a BYMONTH value (1 through 12).
///
/// # Examples
///
/// ```
/// use hilal::parser::rrule::month_num;
/// use winnow::Parser;
///
/// assert_eq!(month_num.parse_peek("9"), Ok(("", 9)));
/// assert_eq!(month_num.parse_peek("09"), Ok(("", 9)));
/// assert!(month_num.parse_peek("13").is_err());
/// assert!(month_num.parse_peek("0").is_err());
/// ```
pub fn month_num(input: &mut &str) -> ModalResult<u8> {
    lz_dec_uint::<u8>
        .verify(|&month| (1..=12).contains(&month))
        .parse_next(input)
}

/// Parses a BYMONTHDAY value (±1 through ±30, never zero).
pub fn month_day_num(input: &mut &str) -> ModalResult<i8> {
    signed_num::<30>.map(|value| value as i8).parse_next(input)
}

/// Parses a BYYEARDAY value (±1 through ±355, never zero).
pub fn year_day_num(input: &mut &str) -> ModalResult<i16> {
    signed_num::<355>.map(|value| value as i16).parse_next(input)
}

/// Parses a BYWEEKNO value (±1 through ±53, never zero).
pub fn week_num(input: &mut &str) -> ModalResult<i8> {
    signed_num::<53>.map(|value| value as i8).parse_next(input)
}

/// Parses a BYSETPOS value (±1 through ±366, never zero).
pub fn set_pos_num(input: &mut &str) -> ModalResult<i32> {
    signed_num::<366>.parse_next(input)
}

/// Parses a BYHOUR value (0 through 23).
pub fn hour_num(input: &mut &str) -> ModalResult<u8> {
    lz_dec_uint::<u8>
        .verify(|&hour| hour < 24)
        .parse_next(input)
}

/// Parses a BYMINUTE or BYSECOND value (0 through 59).
pub fn minute_num(input: &mut &str) -> ModalResult<u8> {
    lz_dec_uint::<u8>
        .verify(|&minute| minute < 60)
        .parse_next(input)
}

/// Parses a [`PartName`].
pub fn part_name(input: &mut &str) -> ModalResult<PartName> {
    alt((
        alt((
            Caseless("BYMONTHDAY").value(PartName::ByMonthDay),
            Caseless("BYYEARDAY").value(PartName::ByYearDay),
            Caseless("BYWEEKDAY").value(PartName::ByDay),
            Caseless("BYSECOND").value(PartName::BySecond),
            Caseless("BYMINUTE").value(PartName::ByMinute),
            Caseless("BYWEEKNO").value(PartName::ByWeekNo),
            Caseless("BYSETPOS").value(PartName::BySetPos),
            Caseless("INTERVAL").value(PartName::Interval),
        )),
        alt((
            Caseless("BYMONTH").value(PartName::ByMonth),
            Caseless("BYHOUR").value(PartName::ByHour),
            Caseless("BYDAY").value(PartName::ByDay),
            Caseless("COUNT").value(PartName::Count),
            Caseless("UNTIL").value(PartName::Until),
            Caseless("TZID").value(PartName::Tzid),
            Caseless("FREQ").value(PartName::Freq),
            Caseless("WKST").value(PartName::WkSt),
            Caseless("SKIP").value(PartName::Skip),
        )),
    ))
    .parse_next(input)
}

/// Parses a recognised `name=value` rule part. The value grammar is
/// committed once the name and `=` have matched.
pub fn part(input: &mut &str) -> ModalResult<Part> {
    let name = terminated(part_name, '=').parse_next(input)?;

    Ok(match name {
        PartName::Freq => Part::Freq(cut_err(frequency).parse_next(input)?),
        PartName::Interval => {
            Part::Interval(cut_err(lz_dec_uint).parse_next(input)?)
        }
        PartName::WkSt => Part::WkSt(cut_err(weekday).parse_next(input)?),
        PartName::Count => Part::Count(cut_err(lz_dec_uint).parse_next(input)?),
        PartName::Until => Part::Until(cut_err(date_token).parse_next(input)?),
        PartName::Tzid => {
            let value: &str =
                cut_err(take_while(1.., |c| c != ';')).parse_next(input)?;
            Part::Tzid(value.to_owned())
        }
        PartName::BySetPos => Part::BySetPos(
            cut_err(separated(1.., set_pos_num, ',')).parse_next(input)?,
        ),
        PartName::ByMonth => Part::ByMonth(
            cut_err(separated(1.., month_num, ',')).parse_next(input)?,
        ),
        PartName::ByMonthDay => Part::ByMonthDay(
            cut_err(separated(1.., month_day_num, ',')).parse_next(input)?,
        ),
        PartName::ByYearDay => Part::ByYearDay(
            cut_err(separated(1.., year_day_num, ',')).parse_next(input)?,
        ),
        PartName::ByWeekNo => Part::ByWeekNo(
            cut_err(separated(1.., week_num, ',')).parse_next(input)?,
        ),
        PartName::ByDay => Part::ByDay(
            cut_err(separated(1.., weekday_num, ',')).parse_next(input)?,
        ),
        PartName::ByHour => Part::ByHour(
            cut_err(separated(1.., hour_num, ',')).parse_next(input)?,
        ),
        PartName::ByMinute => Part::ByMinute(
            cut_err(separated(1.., minute_num, ',')).parse_next(input)?,
        ),
        PartName::BySecond => Part::BySecond(
            cut_err(separated(1.., minute_num, ',')).parse_next(input)?,
        ),
        PartName::Skip => Part::Skip(cut_err(skip_policy).parse_next(input)?),
    })
}

/// Parses an unrecognised `name=value` pair, which is ignored.
fn unknown_part(input: &mut &str) -> ModalResult<()> {
    (
        take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '-'),
        '=',
        take_while(0.., |c| c != ';'),
    )
        .void()
        .parse_next(input)
}

/// Parses an RRULE line into its recognised parts; unknown property names
/// are dropped. The leading `RRULE:` tag is optional.
pub fn rrule_line(input: &mut &str) -> ModalResult<Vec<Part>> {
    preceded(
        opt(Caseless("RRULE:")),
        separated(1.., alt((part.map(Some), unknown_part.value(None))), ';'),
    )
    .map(|parts: Vec<Option<Part>>| parts.into_iter().flatten().collect())
    .parse_next(input)
}

/// Parses a DTSTART line: the optional `CALENDAR` parameter and the date
/// token.
pub fn dtstart_line(
    input: &mut &str,
) -> ModalResult<(Option<HijriCalendar>, DateToken)> {
    preceded(
        Caseless("DTSTART"),
        (
            opt(preceded(
                (';', Caseless("CALENDAR"), '='),
                cut_err(hijri_calendar),
            )),
            preceded(':', cut_err(date_token)),
        ),
    )
    .parse_next(input)
}

/// Parses the full textual form: an optional DTSTART line and an RRULE
/// line, separated by CR/LF. Returns options ready for normalization.
pub fn parse_rrule_string(input: &str) -> Result<PartialOptions, Error> {
    let mut options = PartialOptions::default();
    let mut dtstart_token = None;
    let mut until_token = None;

    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.len() >= 7 && line[..7].eq_ignore_ascii_case("DTSTART") {
            let (calendar, token) = dtstart_line.parse(line).map_err(|_| {
                Error::invalid_input(format!("malformed DTSTART line: {line}"))
            })?;
            if calendar.is_some() {
                options.calendar = calendar;
            }
            dtstart_token = Some(token);
        } else {
            let parts = rrule_line.parse(line).map_err(|_| {
                Error::invalid_input(format!("malformed RRULE line: {line}"))
            })?;
            for part in parts {
                apply_part(&mut options, part, &mut until_token);
            }
        }
    }

    let calendar = options.calendar.unwrap_or_else(cal::default_calendar);
    if let Some(token) = dtstart_token {
        options.dtstart = Some(resolve_token(token, calendar)?);
    }
    if let Some(token) = until_token {
        options.until = Some(resolve_token(token, calendar)?);
    }

    Ok(options)
}

/// Folds one parsed part into the options; a repeated part overrides the
/// earlier occurrence.
fn apply_part(
    options: &mut PartialOptions,
    part: Part,
    until_token: &mut Option<DateToken>,
) {
    match part {
        Part::Freq(freq) => options.freq = Some(freq),
        Part::Interval(interval) => options.interval = Some(interval),
        Part::WkSt(wkst) => options.wkst = Some(wkst),
        Part::Count(count) => options.count = Some(count),
        Part::Until(token) => *until_token = Some(token),
        Part::Tzid(tzid) => options.tzid = Some(tzid),
        Part::BySetPos(values) => options.bysetpos = values,
        Part::ByMonth(values) => options.bymonth = values,
        Part::ByMonthDay(values) => options.bymonthday = values,
        Part::ByYearDay(values) => options.byyearday = values,
        Part::ByWeekNo(values) => options.byweekno = values,
        Part::ByDay(values) => options.byweekday = values,
        Part::ByHour(values) => options.byhour = values,
        Part::ByMinute(values) => options.byminute = values,
        Part::BySecond(values) => options.bysecond = values,
        Part::Skip(skip) => options.skip = Some(skip),
    }
}

/// Resolves a date literal against the calendar named on the DTSTART line
/// (or the process default).
fn resolve_token(
    token: DateToken,
    calendar: HijriCalendar,
) -> Result<DateInput, Error> {
    let date = HijriDate::new_in(calendar, token.year, token.month, token.day)?
        .and_hms(token.time.hours, token.time.minutes, token.time.seconds)?;
    Ok(DateInput::Hijri(date))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_name_parser() {
        assert_eq!(part_name.parse_peek("FREQ"), Ok(("", PartName::Freq)));
        assert_eq!(part_name.parse_peek("until"), Ok(("", PartName::Until)));
        assert_eq!(
            part_name.parse_peek("ByMonthDay"),
            Ok(("", PartName::ByMonthDay))
        );
        assert_eq!(
            part_name.parse_peek("BYWEEKDAY"),
            Ok(("", PartName::ByDay))
        );
        assert_eq!(part_name.parse_peek("skip"), Ok(("", PartName::Skip)));
        assert!(part_name.parse_peek("anything else").is_err());
    }

    #[test]
    fn part_parser() {
        assert_eq!(
            part.parse_peek("FREQ=YEARLY"),
            Ok(("", Part::Freq(Frequency::Yearly)))
        );
        assert_eq!(
            part.parse_peek("BYMONTHDAY=1,-1"),
            Ok(("", Part::ByMonthDay(vec![1, -1])))
        );
        assert_eq!(
            part.parse_peek("BYDAY=SA,1FR"),
            Ok((
                "",
                Part::ByDay(vec![
                    Weekday::Saturday.into(),
                    Weekday::Friday.nth(1)
                ])
            ))
        );
        assert_eq!(
            part.parse_peek("TZID=Asia/Riyadh"),
            Ok(("", Part::Tzid("Asia/Riyadh".into())))
        );

        // committed value grammars fail loudly instead of backtracking
        assert!(part.parse_peek("BYMONTH=13").is_err());
        assert!(part.parse_peek("FREQ=SOMETIMES").is_err());
    }

    #[test]
    fn rrule_line_parser() {
        let parts = rrule_line
            .parse("RRULE:FREQ=MONTHLY;COUNT=5;BYMONTHDAY=1")
            .unwrap();
        assert_eq!(parts.len(), 3);

        // the tag is optional and unknown names are dropped
        let parts = rrule_line.parse("FREQ=DAILY;X-UNKNOWN=42").unwrap();
        assert_eq!(parts, vec![Part::Freq(Frequency::Daily)]);
    }

    #[test]
    fn dtstart_line_parser() {
        let (calendar, token) = dtstart_line
            .parse("DTSTART;CALENDAR=HIJRI-TABULAR:14460101")
            .unwrap();
        assert_eq!(calendar, Some(HijriCalendar::Tabular));
        assert_eq!((token.year, token.month, token.day), (1446, 1, 1));

        let (calendar, token) =
            dtstart_line.parse("DTSTART:14460901T120000Z").unwrap();
        assert_eq!(calendar, None);
        assert_eq!(token.time.hours, 12);

        assert!(
            dtstart_line
                .parse("DTSTART;CALENDAR=JULIAN:14460101")
                .is_err()
        );
    }

    #[test]
    fn full_text_assembly() {
        let options = parse_rrule_string(
            "DTSTART;CALENDAR=HIJRI-UM-AL-QURA:14460901\nRRULE:FREQ=YEARLY;BYMONTH=9;BYMONTHDAY=1;COUNT=3",
        )
        .unwrap();

        assert_eq!(options.freq, Some(Frequency::Yearly));
        assert_eq!(options.calendar, Some(HijriCalendar::UmmAlQura));
        assert_eq!(options.count, Some(3));
        assert_eq!(options.bymonth, vec![9]);
        assert_eq!(options.bymonthday, vec![1]);
        match options.dtstart {
            Some(DateInput::Hijri(date)) => {
                assert_eq!(
                    (date.year(), date.month(), date.day()),
                    (1446, 9, 1)
                );
            }
            other => panic!("unexpected dtstart {other:?}"),
        }
    }

    #[test]
    fn unknown_properties_leave_freq_missing() {
        let options = parse_rrule_string("RRULE:FOO=BAR").unwrap();
        assert_eq!(options.freq, None);

        let err = options.parse().unwrap_err();
        assert_eq!(err, Error::InvalidInput("FREQ is required".into()));
    }

    #[test]
    fn invalid_dtstart_date_is_rejected() {
        // Ramadan 1446 has 29 days.
        let err =
            parse_rrule_string("DTSTART:14460930\nRRULE:FREQ=DAILY").unwrap_err();
        assert_eq!(
            err,
            Error::InvalidDate {
                year: 1446,
                month: 9,
                day: 30
            }
        );
    }

    #[test]
    fn crlf_separators_are_accepted() {
        let options = parse_rrule_string(
            "DTSTART:14460101\r\nRRULE:FREQ=WEEKLY;BYDAY=SA,TU",
        )
        .unwrap();
        assert_eq!(options.freq, Some(Frequency::Weekly));
        assert_eq!(options.byweekday.len(), 2);
    }
}
