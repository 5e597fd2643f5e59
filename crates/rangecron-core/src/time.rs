//! Instant bounds and zone-local conversions.
//!
//! Every persisted instant is a `DateTime<Utc>`. Zone-local values are plain
//! `NaiveDateTime`s expressed in some zone's civil calendar. Conversions in
//! both directions saturate at [`min_instant`] / [`max_instant`] so the
//! degenerate "unbounded" values never overflow.

use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone,
    Timelike, Utc,
};
use chrono_tz::Tz;
use tracing::debug;

/// How far past a spring-forward gap [`from_zone_local_lenient`] searches.
const GAP_SEARCH_MINUTES: u32 = 24 * 60;

/// Smallest instant the scheduler stores: 0001-01-01T00:00:00Z.
pub fn min_instant() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Largest instant the scheduler stores: 9999-12-31T23:59:59.999999999Z.
pub fn max_instant() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(9999, 12, 31)
        .and_then(|date| date.and_hms_nano_opt(23, 59, 59, 999_999_999))
        .map(|local| local.and_utc())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Clamp an instant into the storable range.
pub fn clamp_instant(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.clamp(min_instant(), max_instant())
}

fn clamp_local(local: NaiveDateTime) -> NaiveDateTime {
    local.clamp(min_instant().naive_utc(), max_instant().naive_utc())
}

/// Zero the seconds and sub-second part of an instant.
pub fn truncate_to_minute(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .with_second(0)
        .and_then(|truncated| truncated.with_nanosecond(0))
        .unwrap_or(instant)
}

/// Express a UTC instant in the civil calendar of `tz`.
pub fn to_zone_local(instant: DateTime<Utc>, tz: &Tz) -> NaiveDateTime {
    let utc = instant.naive_utc();
    let offset = tz.offset_from_utc_datetime(&utc).fix().local_minus_utc();
    let local = utc
        .checked_add_signed(Duration::seconds(i64::from(offset)))
        .unwrap_or(if offset < 0 {
            NaiveDateTime::MIN
        } else {
            NaiveDateTime::MAX
        });
    clamp_local(local)
}

/// Convert a zone-local time back to UTC.
///
/// Returns `None` when the local time falls in a daylight-saving gap.
/// Ambiguous local times resolve to the standard-time reading, which is the
/// later of the two UTC instants.
pub fn from_zone_local(local: NaiveDateTime, tz: &Tz) -> Option<DateTime<Utc>> {
    let resolved = match tz.from_local_datetime(&local) {
        LocalResult::Single(zoned) => zoned,
        LocalResult::Ambiguous(_, latest) => latest,
        LocalResult::None => return None,
    };
    Some(clamp_instant(resolved.with_timezone(&Utc)))
}

/// Like [`from_zone_local`], but a time inside a gap maps to the first valid
/// local time after it.
pub fn from_zone_local_lenient(local: NaiveDateTime, tz: &Tz) -> DateTime<Utc> {
    let mut candidate = local;
    for _ in 0..=GAP_SEARCH_MINUTES {
        if let Some(instant) = from_zone_local(candidate, tz) {
            if candidate != local {
                debug!(%local, shifted = %candidate, zone = %tz.name(), "Local time fell into a gap");
            }
            return instant;
        }
        match candidate.checked_add_signed(Duration::minutes(1)) {
            Some(next) => candidate = next,
            None => break,
        }
    }
    clamp_instant(local.and_utc())
}

/// Midnight at the start of the calendar date of `local`.
pub fn start_of_day(local: NaiveDateTime) -> NaiveDateTime {
    local.date().and_time(NaiveTime::MIN)
}

/// Midnight at the start of the day after the calendar date of `local`.
///
/// The last representable date has no successor; it saturates at the
/// largest representable local time instead.
pub fn start_of_next_day(local: NaiveDateTime) -> NaiveDateTime {
    let max_local = max_instant().naive_utc();
    if local.date() >= max_local.date() {
        return max_local;
    }
    local
        .date()
        .succ_opt()
        .map(|next| next.and_time(NaiveTime::MIN))
        .unwrap_or(max_local)
}

#[cfg(test)]
#[path = "time_tests.rs"]
mod tests;
