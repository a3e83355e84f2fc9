//! End-to-end scenarios across both calendar back-ends.

use chrono::NaiveDate;

use hilal::{
    Error, Frequency, HijriCalendar, HijriDate, PartialOptions, RRule,
    RRuleSet, Weekday,
};

const UAQ: HijriCalendar = HijriCalendar::UmmAlQura;
const TABULAR: HijriCalendar = HijriCalendar::Tabular;

fn date(y: i32, m: u8, d: u8) -> HijriDate {
    HijriDate::new_in(UAQ, y, m, d).unwrap()
}

#[test]
fn yearly_first_of_ramadan() {
    let rule = RRule::new(PartialOptions {
        freq: Some(Frequency::Yearly),
        dtstart: Some(date(1446, 9, 1).into()),
        bymonth: vec![9],
        bymonthday: vec![1],
        count: Some(3),
        calendar: Some(UAQ),
        ..Default::default()
    })
    .unwrap();

    assert_eq!(
        rule.all().unwrap(),
        vec![date(1446, 9, 1), date(1447, 9, 1), date(1448, 9, 1)]
    );
}

#[test]
fn monthly_fifteenth() {
    let rule = RRule::new(PartialOptions {
        freq: Some(Frequency::Monthly),
        dtstart: Some(date(1446, 1, 15).into()),
        count: Some(3),
        calendar: Some(UAQ),
        ..Default::default()
    })
    .unwrap();

    let dates = rule.all().unwrap();
    assert_eq!(
        dates,
        vec![date(1446, 1, 15), date(1446, 2, 15), date(1446, 3, 15)]
    );
    assert!(dates.iter().all(|date| date.day() == 15));
}

#[test]
fn tabular_text_round_trip() {
    let rule: RRule =
        "DTSTART;CALENDAR=HIJRI-TABULAR:14460101\nRRULE:FREQ=MONTHLY;COUNT=5;BYMONTHDAY=1"
            .parse()
            .unwrap();

    let dates = rule.all().unwrap();
    assert_eq!(dates.len(), 5);
    assert!(dates.iter().all(|date| date.day() == 1));
    assert_eq!(
        (dates[0].year(), dates[0].month(), dates[0].day()),
        (1446, 1, 1)
    );

    let reparsed: RRule = rule.to_string().parse().unwrap();
    assert_eq!(reparsed.all().unwrap(), dates);
}

#[test]
fn rule_set_with_inclusions_and_exclusions() {
    let mut set = RRuleSet::new();
    set.rrule(
        RRule::new(PartialOptions {
            freq: Some(Frequency::Monthly),
            dtstart: Some(date(1446, 1, 1).into()),
            bymonthday: vec![1],
            count: Some(3),
            calendar: Some(UAQ),
            ..Default::default()
        })
        .unwrap(),
    );
    set.rdate(date(1446, 6, 15));
    set.exdate(date(1446, 2, 1));

    assert_eq!(
        set.all().unwrap(),
        vec![date(1446, 1, 1), date(1446, 3, 1), date(1446, 6, 15)]
    );
}

#[test]
fn gregorian_round_trip() {
    let original = date(1446, 5, 15);
    let civil = original.to_gregorian_in(UAQ).unwrap();
    assert_eq!(civil.date(), NaiveDate::from_ymd_opt(2024, 11, 17).unwrap());

    let back = HijriDate::from_gregorian_in(UAQ, civil).unwrap();
    assert_eq!(back, original);
}

#[test]
fn weekday_spec_formatting() {
    assert_eq!(Weekday::Friday.nth(1).to_rrule_string(), "1FR");
    assert_eq!(Weekday::Monday.nth(-1).to_rrule_string(), "-1MO");
}

#[test]
fn streams_are_strictly_ascending() {
    let texts = [
        "DTSTART:14460101\nRRULE:FREQ=DAILY;COUNT=40",
        "DTSTART:14460101\nRRULE:FREQ=MONTHLY;BYMONTHDAY=29,30;SKIP=FORWARD;COUNT=30",
        "DTSTART:14460101\nRRULE:FREQ=YEARLY;BYMONTH=1,6,12;BYDAY=FR;COUNT=40",
        "DTSTART:14460104\nRRULE:FREQ=WEEKLY;BYDAY=SA,SU,FR;COUNT=25",
    ];

    for text in texts {
        let rule: RRule = text.parse().unwrap();
        let dates = rule.all().unwrap();
        assert!(
            dates.windows(2).all(|pair| pair[0] < pair[1]),
            "stream of {text} is not strictly ascending: {dates:?}"
        );
    }
}

#[test]
fn count_and_until_bounds() {
    let counted: RRule = "DTSTART:14460101\nRRULE:FREQ=DAILY;COUNT=7"
        .parse()
        .unwrap();
    assert_eq!(counted.all().unwrap().len(), 7);

    let bounded: RRule =
        "DTSTART:14460101\nRRULE:FREQ=DAILY;UNTIL=14460110"
            .parse()
            .unwrap();
    let dates = bounded.all().unwrap();
    let dtstart = date(1446, 1, 1);
    let until = date(1446, 1, 10);
    assert_eq!(dates.len(), 10);
    assert!(dates.iter().all(|d| *d >= dtstart && *d <= until));
}

#[test]
fn set_position_selection_matches_the_model() {
    // Candidate list: all Fridays and Saturdays of Ramadan 1446, which
    // opens on a Saturday and has 29 days.
    let rule: RRule =
        "DTSTART:14460901\nRRULE:FREQ=MONTHLY;BYDAY=FR,SA;BYSETPOS=1,2,-1;COUNT=3"
            .parse()
            .unwrap();

    // Sorted candidates: 1, 7, 8, 14, 15, 21, 22, 28, 29.
    assert_eq!(
        rule.all().unwrap(),
        vec![date(1446, 9, 1), date(1446, 9, 7), date(1446, 9, 29)]
    );
}

#[test]
fn back_ends_disagree_inside_the_table_range() {
    let uaq_new_year = UAQ.hijri_to_gregorian(1446, 1, 1).unwrap();
    let tabular_new_year = TABULAR.hijri_to_gregorian(1446, 1, 1).unwrap();
    assert_ne!(uaq_new_year, tabular_new_year);
}

#[test]
fn provider_round_trips_hold_everywhere() {
    for calendar in [UAQ, TABULAR] {
        for year in [1355, 1356, 1420, 1446, 1500, 1501, 1600] {
            for month in 1..=12 {
                let length = calendar.month_length(year, month);
                for day in [1, length] {
                    let civil = calendar
                        .hijri_to_gregorian(year, month, day)
                        .unwrap();
                    assert_eq!(
                        calendar.gregorian_to_hijri(civil).unwrap(),
                        (year, month, day),
                        "{calendar:?} {year}-{month}-{day}"
                    );
                }
            }
        }
    }
}

#[test]
fn invalid_dates_and_options_are_rejected() {
    assert!(matches!(
        HijriDate::new_in(UAQ, 1446, 13, 1),
        Err(Error::InvalidDate { .. })
    ));
    assert!(matches!(
        HijriDate::new_in(UAQ, 1446, 9, 31),
        Err(Error::InvalidDate { .. })
    ));

    let err = "RRULE:FOO=BAR".parse::<RRule>().unwrap_err();
    assert_eq!(err, Error::InvalidInput("FREQ is required".into()));

    let err = RRule::new(PartialOptions {
        freq: Some(Frequency::Monthly),
        dtstart: Some(date(1446, 1, 1).into()),
        bymonthday: vec![0],
        calendar: Some(UAQ),
        ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[test]
fn skip_governs_short_months() {
    let omit: RRule =
        "DTSTART:14460101\nRRULE:FREQ=MONTHLY;BYMONTHDAY=30;COUNT=4"
            .parse()
            .unwrap();
    // Months 1, 2, 4, 5 of 1446 have 30 days; month 3 has 29.
    assert_eq!(
        omit.all().unwrap(),
        vec![
            date(1446, 1, 30),
            date(1446, 2, 30),
            date(1446, 4, 30),
            date(1446, 6, 30),
        ]
    );

    let backward: RRule =
        "DTSTART:14460101\nRRULE:FREQ=MONTHLY;BYMONTHDAY=30;SKIP=BACKWARD;COUNT=3"
            .parse()
            .unwrap();
    assert_eq!(
        backward.all().unwrap(),
        vec![date(1446, 1, 30), date(1446, 2, 30), date(1446, 3, 29)]
    );
}

#[test]
fn gregorian_dtstart_inputs_are_converted() {
    let rule = RRule::new(PartialOptions {
        freq: Some(Frequency::Daily),
        dtstart: Some(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().into()),
        count: Some(2),
        calendar: Some(UAQ),
        ..Default::default()
    })
    .unwrap();

    assert_eq!(
        rule.all().unwrap(),
        vec![date(1446, 9, 1), date(1446, 9, 2)]
    );
}
