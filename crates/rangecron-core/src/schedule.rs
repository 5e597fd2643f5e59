//! Cron expressions in the supported dialects.
//!
//! Parsing is delegated to the `cron` crate, which always expects a leading
//! seconds field and numbers weekdays 1 (Sunday) through 7 (Saturday). The
//! dialects accepted here follow classic crontab conventions instead, so
//! expressions are normalised before they reach the parser.
//!
//! Occurrences are enumerated on a naive civil clock: the caller decides
//! which zone the clock belongs to.

use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Cron expression dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CronFormat {
    /// `minute hour day-of-month month day-of-week`.
    #[default]
    Default,
    /// `second minute hour day-of-month month day-of-week`.
    WithSeconds,
    /// `minute hour day-of-month month day-of-week year`.
    WithYears,
    /// `second minute hour day-of-month month day-of-week year`.
    WithSecondsAndYears,
}

impl CronFormat {
    fn field_count(self) -> usize {
        match self {
            CronFormat::Default => 5,
            CronFormat::WithSeconds | CronFormat::WithYears => 6,
            CronFormat::WithSecondsAndYears => 7,
        }
    }

    fn has_seconds(self) -> bool {
        matches!(self, CronFormat::WithSeconds | CronFormat::WithSecondsAndYears)
    }
}

impl std::fmt::Display for CronFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CronFormat::Default => "default",
            CronFormat::WithSeconds => "with_seconds",
            CronFormat::WithYears => "with_years",
            CronFormat::WithSecondsAndYears => "with_seconds_and_years",
        };
        write!(f, "{s}")
    }
}

impl FromStr for CronFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(CronFormat::Default),
            "with_seconds" => Ok(CronFormat::WithSeconds),
            "with_years" => Ok(CronFormat::WithYears),
            "with_seconds_and_years" => Ok(CronFormat::WithSecondsAndYears),
            other => Err(format!("unknown cron format: {other}")),
        }
    }
}

/// A parsed cron schedule.
#[derive(Debug, Clone)]
pub struct CronSchedule {
    expression: String,
    format: CronFormat,
    schedule: cron::Schedule,
}

impl CronSchedule {
    /// Parse `expression` in the given dialect.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCron`] when the field count does not match
    /// the dialect or any field is malformed.
    pub fn parse(expression: &str, format: CronFormat) -> CoreResult<Self> {
        let invalid = |message: String| CoreError::InvalidCron {
            expression: expression.to_string(),
            message,
        };

        let mut fields: Vec<String> = expression
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if fields.len() != format.field_count() {
            return Err(invalid(format!(
                "expected {} fields for the {} format, found {}",
                format.field_count(),
                format,
                fields.len()
            )));
        }

        if !format.has_seconds() {
            fields.insert(0, "0".to_string());
        }
        fields[5] = translate_day_of_week(&fields[5]).map_err(invalid)?;

        let schedule = cron::Schedule::from_str(&fields.join(" "))
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            expression: expression.trim().to_string(),
            format,
            schedule,
        })
    }

    /// The expression as it was written.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The dialect the expression was parsed with.
    pub fn format(&self) -> CronFormat {
        self.format
    }

    /// Occurrences strictly after `from` and strictly before `to`.
    pub fn occurrences(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.schedule
            .after(&from.and_utc())
            .map(|occurrence| occurrence.naive_utc())
            .take_while(move |occurrence| *occurrence < to)
    }

    /// First occurrence strictly after `after`.
    pub fn next_occurrence(&self, after: NaiveDateTime) -> Option<NaiveDateTime> {
        self.schedule
            .after(&after.and_utc())
            .next()
            .map(|occurrence| occurrence.naive_utc())
    }
}

/// Rewrite a crontab day-of-week field (0-7, Sunday = 0 or 7) into the
/// numbering the parser expects (1-7, Sunday = 1). Named days pass through.
fn translate_day_of_week(field: &str) -> Result<String, String> {
    let mut translated = Vec::new();

    for item in field.split(',') {
        if item == "*" || item == "?" || item.chars().any(|c| c.is_ascii_alphabetic()) {
            translated.push(item.to_string());
            continue;
        }

        let (range, step) = match item.split_once('/') {
            Some((range, step)) => {
                let step: usize = step
                    .parse()
                    .map_err(|_| format!("invalid day-of-week step '{step}'"))?;
                (range, Some(step))
            }
            None => (item, None),
        };
        if step == Some(0) {
            return Err("day-of-week step must be positive".to_string());
        }

        let (start, end) = match (range, range.split_once('-')) {
            ("*", _) => (0, 6),
            (_, Some((start, end))) => (parse_day(start)?, parse_day(end)?),
            (_, None) if step.is_some() => (parse_day(range)?, 6),
            (_, None) => {
                let day = parse_day(range)?;
                (day, day)
            }
        };
        if start > end {
            return Err(format!("invalid day-of-week range '{range}'"));
        }

        let mut days: Vec<u32> = (start..=end)
            .step_by(step.unwrap_or(1))
            .map(|day| day % 7 + 1)
            .collect();
        days.sort_unstable();
        days.dedup();
        translated.extend(days.iter().map(u32::to_string));
    }

    Ok(translated.join(","))
}

fn parse_day(value: &str) -> Result<u32, String> {
    match value.parse::<u32>() {
        Ok(day) if day <= 7 => Ok(day),
        _ => Err(format!("invalid day of week '{value}'")),
    }
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
