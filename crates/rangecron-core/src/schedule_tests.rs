//! Tests for cron dialect handling.

use super::*;
use chrono::{Datelike, NaiveDate, Weekday};

fn local(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, s)
        .unwrap()
}

#[test]
fn test_every_minute_excludes_both_bounds() {
    let schedule = CronSchedule::parse("* * * * *", CronFormat::Default).unwrap();
    let found: Vec<_> = schedule
        .occurrences(local(2024, 5, 1, 10, 0, 0), local(2024, 5, 1, 10, 3, 0))
        .collect();
    assert_eq!(
        found,
        vec![local(2024, 5, 1, 10, 1, 0), local(2024, 5, 1, 10, 2, 0)]
    );
}

#[test]
fn test_field_count_must_match_format() {
    let err = CronSchedule::parse("* * * * * *", CronFormat::Default).unwrap_err();
    assert!(matches!(err, CoreError::InvalidCron { .. }));
    assert!(err.to_string().contains("expected 5 fields"));

    assert!(CronSchedule::parse("* * * * *", CronFormat::WithSeconds).is_err());
    assert!(CronSchedule::parse("* * * * * *", CronFormat::WithSecondsAndYears).is_err());
}

#[test]
fn test_malformed_field_is_rejected() {
    assert!(CronSchedule::parse("61 * * * *", CronFormat::Default).is_err());
    assert!(CronSchedule::parse("* * * * 8", CronFormat::Default).is_err());
    assert!(CronSchedule::parse("not a cron at all", CronFormat::Default).is_err());
}

#[test]
fn test_seconds_dialect() {
    let schedule = CronSchedule::parse("*/15 * * * * *", CronFormat::WithSeconds).unwrap();
    let found: Vec<_> = schedule
        .occurrences(local(2024, 5, 1, 10, 0, 0), local(2024, 5, 1, 10, 1, 0))
        .collect();
    assert_eq!(
        found,
        vec![
            local(2024, 5, 1, 10, 0, 15),
            local(2024, 5, 1, 10, 0, 30),
            local(2024, 5, 1, 10, 0, 45),
        ]
    );
}

#[test]
fn test_years_dialect() {
    let schedule = CronSchedule::parse("0 12 * * * 2030", CronFormat::WithYears).unwrap();
    assert_eq!(
        schedule.next_occurrence(local(2026, 10, 19, 0, 0, 0)),
        Some(local(2030, 1, 1, 12, 0, 0))
    );

    let schedule =
        CronSchedule::parse("30 0 12 1 1 * 2031", CronFormat::WithSecondsAndYears).unwrap();
    assert_eq!(
        schedule.next_occurrence(local(2026, 10, 19, 0, 0, 0)),
        Some(local(2031, 1, 1, 12, 0, 30))
    );
}

#[test]
fn test_weekdays_use_crontab_numbering() {
    // 2024-06-01 is a Saturday.
    let saturday = local(2024, 6, 1, 0, 0, 0);

    let weekdays = CronSchedule::parse("0 9 * * 1-5", CronFormat::Default).unwrap();
    let next = weekdays.next_occurrence(saturday).unwrap();
    assert_eq!(next.weekday(), Weekday::Mon);
    assert_eq!(next, local(2024, 6, 3, 9, 0, 0));

    for sunday in ["0", "7"] {
        let expression = format!("0 9 * * {sunday}");
        let schedule = CronSchedule::parse(&expression, CronFormat::Default).unwrap();
        assert_eq!(
            schedule.next_occurrence(saturday),
            Some(local(2024, 6, 2, 9, 0, 0))
        );
    }
}

#[test]
fn test_named_weekdays_pass_through() {
    let schedule = CronSchedule::parse("0 9 * * MON-FRI", CronFormat::Default).unwrap();
    let next = schedule.next_occurrence(local(2024, 6, 1, 0, 0, 0)).unwrap();
    assert_eq!(next.weekday(), Weekday::Mon);
}

#[test]
fn test_translate_day_of_week() {
    assert_eq!(translate_day_of_week("*").unwrap(), "*");
    assert_eq!(translate_day_of_week("?").unwrap(), "?");
    assert_eq!(translate_day_of_week("1-5").unwrap(), "2,3,4,5,6");
    assert_eq!(translate_day_of_week("0,7").unwrap(), "1,1");
    assert_eq!(translate_day_of_week("*/2").unwrap(), "1,3,5,7");
    assert_eq!(translate_day_of_week("5-7").unwrap(), "1,6,7");
    assert_eq!(translate_day_of_week("SUN,SAT").unwrap(), "SUN,SAT");
    assert!(translate_day_of_week("8").is_err());
    assert!(translate_day_of_week("5-1").is_err());
    assert!(translate_day_of_week("*/0").is_err());
}

#[test]
fn test_expression_and_format_are_kept() {
    let schedule = CronSchedule::parse("  0 0 * * *  ", CronFormat::Default).unwrap();
    assert_eq!(schedule.expression(), "0 0 * * *");
    assert_eq!(schedule.format(), CronFormat::Default);
}

#[test]
fn test_cron_format_text_round_trip() {
    for format in [
        CronFormat::Default,
        CronFormat::WithSeconds,
        CronFormat::WithYears,
        CronFormat::WithSecondsAndYears,
    ] {
        assert_eq!(format.to_string().parse::<CronFormat>().unwrap(), format);
    }
    assert!("hourly".parse::<CronFormat>().is_err());
}
