//! Wire encoding of persisted instants.
//!
//! Instants are written as RFC 3339 UTC strings. Readers also accept
//! offset-less ISO timestamps (taken as UTC) and legacy epoch-millisecond
//! integers. An empty value means "absent".

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

use crate::error::{CoreError, CoreResult};
use crate::time::clamp_instant;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Encode an instant for storage.
pub fn encode_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Decode a stored instant. `field` names the value in errors.
pub fn decode_instant(field: &'static str, value: &str) -> CoreResult<Option<DateTime<Utc>>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    let invalid = |message: String| CoreError::InvalidField { field, message };

    if is_epoch_millis(value) {
        let millis: i64 = value
            .parse()
            .map_err(|_| invalid(format!("'{value}' is not a timestamp")))?;
        return DateTime::from_timestamp_millis(millis)
            .map(|instant| Some(clamp_instant(instant)))
            .ok_or_else(|| invalid(format!("timestamp {millis} is out of range")));
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(clamp_instant(instant.with_timezone(&Utc))));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| Some(clamp_instant(naive.and_utc())))
        .ok_or_else(|| invalid(format!("'{value}' is not a valid date")))
}

/// Digits with at most one leading minus sign.
fn is_epoch_millis(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Decode an optional stored value, treating a missing field as absent.
pub fn decode_optional_instant(
    field: &'static str,
    value: Option<&String>,
) -> CoreResult<Option<DateTime<Utc>>> {
    match value {
        Some(value) => decode_instant(field, value),
        None => Ok(None),
    }
}
