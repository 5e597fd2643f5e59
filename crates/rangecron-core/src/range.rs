//! Active date range evaluation.

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;

use crate::time::{
    from_zone_local_lenient, max_instant, min_instant, start_of_day, start_of_next_day,
    to_zone_local,
};

/// Whether `now` lies in the half-open range `[start, end)`.
///
/// A missing bound is unbounded on that side. All values must already be in
/// the same zone.
pub fn within_range<T: PartialOrd>(now: &T, start: Option<&T>, end: Option<&T>) -> bool {
    start.is_none_or(|start| start <= now) && end.is_none_or(|end| end > now)
}

/// A job's start/end bounds resolved against its time zone.
///
/// The UTC bounds are the effective ones: when a bound was widened to a
/// calendar date they are re-derived from the widened local value.
#[derive(Debug, Clone, PartialEq)]
pub struct DateRange {
    time_zone: Tz,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    start_local: Option<NaiveDateTime>,
    end_local: Option<NaiveDateTime>,
}

impl DateRange {
    /// Resolve stored UTC bounds.
    ///
    /// With `ignore_start_time` the start is truncated to midnight of its
    /// local date. With `ignore_end_time` the end is widened to midnight of
    /// the following local date, except on the last representable date.
    pub fn resolve(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        time_zone: Tz,
        ignore_start_time: bool,
        ignore_end_time: bool,
    ) -> Self {
        let mut start_local = start.map(|start| to_zone_local(start, &time_zone));
        let mut end_local = end.map(|end| to_zone_local(end, &time_zone));
        let mut start = start;
        let mut end = end;

        if ignore_start_time {
            if let Some(local) = start_local {
                let truncated = start_of_day(local);
                start_local = Some(truncated);
                start = Some(local_bound_to_utc(truncated, &time_zone));
            }
        }

        if ignore_end_time {
            if let Some(local) = end_local {
                let widened = start_of_next_day(local);
                end_local = Some(widened);
                end = Some(local_bound_to_utc(widened, &time_zone));
            }
        }

        Self {
            time_zone,
            start,
            end,
            start_local,
            end_local,
        }
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    pub fn start_local(&self) -> Option<NaiveDateTime> {
        self.start_local
    }

    pub fn end_local(&self) -> Option<NaiveDateTime> {
        self.end_local
    }

    /// Whether `now` is inside the range, compared on the zone's civil clock.
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        let now_local = to_zone_local(now, &self.time_zone);
        within_range(
            &now_local,
            self.start_local.as_ref(),
            self.end_local.as_ref(),
        )
    }

    /// Raise `instant` to the start bound or lower it to the end bound when
    /// it lies outside them. An inverted range yields the end bound.
    pub fn clamp(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        let raised = match self.start {
            Some(start) if instant < start => start,
            _ => instant,
        };
        match self.end {
            Some(end) if raised > end => end,
            _ => raised,
        }
    }
}

/// The representable extremes stay unbounded in every zone.
fn local_bound_to_utc(local: NaiveDateTime, time_zone: &Tz) -> DateTime<Utc> {
    if local >= max_instant().naive_utc() {
        max_instant()
    } else if local <= min_instant().naive_utc() {
        min_instant()
    } else {
        from_zone_local_lenient(local, time_zone)
    }
}

#[cfg(test)]
#[path = "range_tests.rs"]
mod tests;
