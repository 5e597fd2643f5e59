//! "Now" and "next" cron instants in a target time zone.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

use crate::schedule::CronSchedule;
use crate::time::{from_zone_local, max_instant, to_zone_local, truncate_to_minute};

/// Cron instants for one job as seen from a single polling tick.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait ScheduleInstant: Send + Sync {
    /// The tick's current instant, truncated to the minute.
    fn now_instant(&self) -> DateTime<Utc>;

    /// The first occurrence strictly after [`Self::now_instant`] and before
    /// the end bound the instant was built with.
    fn next_instant(&self) -> Option<DateTime<Utc>>;

    /// Occurrences after `last_instant` up to and including the current
    /// minute, excluding anything at or after `end`.
    fn next_instants(
        &self,
        last_instant: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Vec<DateTime<Utc>>;

    /// Whether [`Self::next_instants`] would yield anything. Stops at the
    /// first occurrence.
    fn has_next_instant(&self, last_instant: DateTime<Utc>, end: Option<DateTime<Utc>>) -> bool;
}

/// [`ScheduleInstant`] backed by a parsed cron schedule.
///
/// Occurrences are enumerated on the zone's civil clock. Local times that
/// fall into a daylight-saving gap never fire; ambiguous ones fire once, at
/// their standard-time reading.
#[derive(Debug, Clone)]
pub struct CronScheduleInstant {
    now: DateTime<Utc>,
    next: Option<DateTime<Utc>>,
    time_zone: Tz,
    schedule: CronSchedule,
}

impl CronScheduleInstant {
    pub fn new(
        now: DateTime<Utc>,
        time_zone: Tz,
        schedule: CronSchedule,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        let now = truncate_to_minute(now);
        let end_local = to_zone_local(end.unwrap_or_else(max_instant), &time_zone);

        let next = schedule
            .occurrences(to_zone_local(now, &time_zone), end_local)
            .find_map(|occurrence| from_zone_local(occurrence, &time_zone));

        Self {
            now,
            next,
            time_zone,
            schedule,
        }
    }

    fn missed(
        &self,
        last_instant: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        let tz = &self.time_zone;
        let end_local = to_zone_local(end.unwrap_or_else(max_instant), tz);
        let upper = self
            .now
            .checked_add_signed(Duration::seconds(1))
            .unwrap_or(self.now);

        self.schedule
            .occurrences(to_zone_local(last_instant, tz), to_zone_local(upper, tz))
            .filter(move |occurrence| *occurrence < end_local)
            .filter_map(move |occurrence| from_zone_local(occurrence, tz))
    }
}

impl ScheduleInstant for CronScheduleInstant {
    fn now_instant(&self) -> DateTime<Utc> {
        self.now
    }

    fn next_instant(&self) -> Option<DateTime<Utc>> {
        self.next
    }

    fn next_instants(
        &self,
        last_instant: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Vec<DateTime<Utc>> {
        self.missed(last_instant, end).collect()
    }

    fn has_next_instant(&self, last_instant: DateTime<Utc>, end: Option<DateTime<Utc>>) -> bool {
        self.missed(last_instant, end).next().is_some()
    }
}

#[cfg(test)]
#[path = "instant_tests.rs"]
mod tests;
