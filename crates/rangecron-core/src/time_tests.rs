//! Tests for zone-local conversions.

use super::*;
use chrono::{Datelike, NaiveDate};
use chrono_tz::America::New_York;
use chrono_tz::Pacific::Honolulu;

fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    local(y, m, d, h, min).and_utc()
}

#[test]
fn test_bounds_are_calendar_extremes() {
    assert_eq!(min_instant().year(), 1);
    assert_eq!(min_instant().month(), 1);
    assert_eq!(max_instant().year(), 9999);
    assert_eq!(max_instant().day(), 31);
    assert!(min_instant() < max_instant());
}

#[test]
fn test_truncate_to_minute() {
    let instant = utc(2024, 5, 1, 10, 30) + Duration::milliseconds(42_123);
    let truncated = truncate_to_minute(instant);
    assert_eq!(truncated, utc(2024, 5, 1, 10, 30));
    assert_eq!(truncated.nanosecond(), 0);
}

#[test]
fn test_to_zone_local_applies_offset() {
    let instant = utc(2024, 1, 15, 12, 0);
    assert_eq!(to_zone_local(instant, &Honolulu), local(2024, 1, 15, 2, 0));
    assert_eq!(to_zone_local(instant, &New_York), local(2024, 1, 15, 7, 0));
    assert_eq!(to_zone_local(instant, &Tz::UTC), local(2024, 1, 15, 12, 0));
}

#[test]
fn test_to_zone_local_saturates_at_extremes() {
    // Tokyo is ahead of UTC, so the max instant would overflow year 9999.
    let tokyo = chrono_tz::Asia::Tokyo;
    assert_eq!(to_zone_local(max_instant(), &tokyo), max_instant().naive_utc());
    // Honolulu is behind UTC, so the min instant would underflow year 1.
    assert_eq!(to_zone_local(min_instant(), &Honolulu), min_instant().naive_utc());
}

#[test]
fn test_from_zone_local_round_trip() {
    let instant = utc(2024, 7, 4, 16, 45);
    let zoned = to_zone_local(instant, &New_York);
    assert_eq!(from_zone_local(zoned, &New_York), Some(instant));
}

#[test]
fn test_from_zone_local_gap_is_none() {
    // 2024-03-10 02:30 does not exist in New York.
    assert_eq!(from_zone_local(local(2024, 3, 10, 2, 30), &New_York), None);
}

#[test]
fn test_from_zone_local_ambiguous_prefers_standard_time() {
    // 2024-11-03 01:30 happens twice in New York: EDT (05:30Z) and EST (06:30Z).
    let resolved = from_zone_local(local(2024, 11, 3, 1, 30), &New_York);
    assert_eq!(resolved, Some(utc(2024, 11, 3, 6, 30)));
}

#[test]
fn test_from_zone_local_lenient_skips_gap() {
    let resolved = from_zone_local_lenient(local(2024, 3, 10, 2, 30), &New_York);
    // First valid local time after the gap is 03:00 EDT == 07:00Z.
    assert_eq!(resolved, utc(2024, 3, 10, 7, 0));
}

#[test]
fn test_from_zone_local_clamps_extremes() {
    let max_local = max_instant().naive_utc();
    assert_eq!(from_zone_local(max_local, &Honolulu), Some(max_instant()));
    let min_local = min_instant().naive_utc();
    assert_eq!(
        from_zone_local(min_local, &chrono_tz::Asia::Tokyo),
        Some(min_instant())
    );
}

#[test]
fn test_start_of_day_and_next_day() {
    let value = local(2024, 2, 28, 17, 5);
    assert_eq!(start_of_day(value), local(2024, 2, 28, 0, 0));
    assert_eq!(start_of_next_day(value), local(2024, 2, 29, 0, 0));
}

#[test]
fn test_start_of_next_day_saturates_on_last_date() {
    let last = local(9999, 12, 31, 8, 0);
    assert_eq!(start_of_next_day(last), max_instant().naive_utc());
}
