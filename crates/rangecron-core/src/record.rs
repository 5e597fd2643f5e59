//! Typed view of a persisted recurring job record.
//!
//! Records are stored as string field maps. They are decoded into
//! [`RecurringJobRecord`] right after reading, and state changes are encoded
//! from a [`RecordUpdate`] right before writing.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::codec::{decode_optional_instant, encode_instant};
use crate::error::{CoreError, CoreResult};

/// Persisted field names.
pub mod fields {
    pub const JOB: &str = "Job";
    pub const CRON: &str = "Cron";
    pub const TIME_ZONE_ID: &str = "TimeZoneId";
    pub const QUEUE: &str = "Queue";
    pub const START_DATE: &str = "StartDate";
    pub const END_DATE: &str = "EndDate";
    pub const USE_END_DATE_TIME_COMPONENT: &str = "UseEndDateTimeComponent";
    pub const LAST_EXECUTION: &str = "LastExecution";
    pub const LAST_JOB_ID: &str = "LastJobId";
    pub const NEXT_EXECUTION: &str = "NextExecution";
    pub const CREATED_AT: &str = "CreatedAt";
}

/// How a job's end bound is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndDateTimeMode {
    /// Follow the scheduler-wide setting.
    #[default]
    Default,
    /// The end bound is an exact instant.
    Exact,
    /// Only the end bound's calendar date counts; the whole day is included.
    DateOnly,
}

impl EndDateTimeMode {
    /// Whether the end bound's time of day is ignored, given the
    /// scheduler-wide default.
    pub fn ignores_time(self, scheduler_default: bool) -> bool {
        match self {
            EndDateTimeMode::Default => scheduler_default,
            EndDateTimeMode::Exact => false,
            EndDateTimeMode::DateOnly => true,
        }
    }

    fn encode(self) -> &'static str {
        match self {
            EndDateTimeMode::Default => "",
            EndDateTimeMode::Exact => "True",
            EndDateTimeMode::DateOnly => "False",
        }
    }

    fn decode(value: Option<&String>) -> CoreResult<Self> {
        let Some(value) = value.map(|v| v.trim()).filter(|v| !v.is_empty()) else {
            return Ok(EndDateTimeMode::Default);
        };
        if value.eq_ignore_ascii_case("true") {
            Ok(EndDateTimeMode::Exact)
        } else if value.eq_ignore_ascii_case("false") {
            Ok(EndDateTimeMode::DateOnly)
        } else {
            Err(CoreError::InvalidField {
                field: fields::USE_END_DATE_TIME_COMPONENT,
                message: format!("'{value}' is not a boolean"),
            })
        }
    }
}

/// A recurring job as stored.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecurringJobRecord {
    /// Serialized [`crate::Invocation`]; loaded lazily so that a bad payload
    /// only affects this job.
    pub job: String,
    pub cron: String,
    pub time_zone_id: Option<String>,
    pub queue: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub end_date_time_mode: EndDateTimeMode,
    pub last_execution: Option<DateTime<Utc>>,
    pub last_job_id: Option<String>,
    pub next_execution: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl RecurringJobRecord {
    /// Decode a stored field map.
    ///
    /// # Errors
    ///
    /// Fails when `Job` or `Cron` is missing or a date field is malformed.
    pub fn from_fields(map: &HashMap<String, String>) -> CoreResult<Self> {
        let required = |name: &'static str| {
            map.get(name)
                .cloned()
                .ok_or(CoreError::MissingField(name))
        };
        let text = |name: &str| {
            map.get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let instant = |name: &'static str| decode_optional_instant(name, map.get(name));

        Ok(Self {
            job: required(fields::JOB)?,
            cron: required(fields::CRON)?,
            time_zone_id: text(fields::TIME_ZONE_ID),
            queue: text(fields::QUEUE),
            start_date: instant(fields::START_DATE)?,
            end_date: instant(fields::END_DATE)?,
            end_date_time_mode: EndDateTimeMode::decode(
                map.get(fields::USE_END_DATE_TIME_COMPONENT),
            )?,
            last_execution: instant(fields::LAST_EXECUTION)?,
            last_job_id: map.get(fields::LAST_JOB_ID).cloned(),
            next_execution: instant(fields::NEXT_EXECUTION)?,
            created_at: instant(fields::CREATED_AT)?,
        })
    }

    /// Fields describing the job definition.
    ///
    /// Unset optional values are written as empty strings so that an update
    /// clears what a previous definition stored. Execution state is left out.
    pub fn definition_fields(&self) -> HashMap<String, String> {
        let instant = |value: Option<DateTime<Utc>>| value.map(encode_instant).unwrap_or_default();

        HashMap::from([
            (fields::JOB.to_string(), self.job.clone()),
            (fields::CRON.to_string(), self.cron.clone()),
            (
                fields::TIME_ZONE_ID.to_string(),
                self.time_zone_id.clone().unwrap_or_default(),
            ),
            (
                fields::QUEUE.to_string(),
                self.queue.clone().unwrap_or_default(),
            ),
            (fields::START_DATE.to_string(), instant(self.start_date)),
            (fields::END_DATE.to_string(), instant(self.end_date)),
            (
                fields::USE_END_DATE_TIME_COMPONENT.to_string(),
                self.end_date_time_mode.encode().to_string(),
            ),
        ])
    }
}

/// Execution state changed by one scheduler pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordUpdate {
    pub last_execution: Option<DateTime<Utc>>,
    pub last_job_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    /// Always written; `None` is stored as an explicit empty value.
    pub next_execution: Option<DateTime<Utc>>,
}

impl RecordUpdate {
    pub fn into_fields(self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        if let Some(last_execution) = self.last_execution {
            map.insert(
                fields::LAST_EXECUTION.to_string(),
                encode_instant(last_execution),
            );
        }
        if let Some(last_job_id) = self.last_job_id {
            map.insert(fields::LAST_JOB_ID.to_string(), last_job_id);
        }
        if let Some(created_at) = self.created_at {
            map.insert(fields::CREATED_AT.to_string(), encode_instant(created_at));
        }
        map.insert(
            fields::NEXT_EXECUTION.to_string(),
            self.next_execution.map(encode_instant).unwrap_or_default(),
        );
        map
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
