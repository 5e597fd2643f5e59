//! Construction of [`ScheduleInstant`]s for a pass.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rangecron_core::{Clock, CronSchedule, CronScheduleInstant, ScheduleInstant, SystemClock};

/// Builds the instant a job is evaluated against.
pub trait InstantFactory: Send + Sync {
    fn create(
        &self,
        schedule: &CronSchedule,
        time_zone: Tz,
        end: Option<DateTime<Utc>>,
    ) -> Box<dyn ScheduleInstant>;
}

/// Cron instants anchored at a clock's current time.
pub struct ClockInstantFactory {
    clock: Arc<dyn Clock>,
}

impl ClockInstantFactory {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl Default for ClockInstantFactory {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl InstantFactory for ClockInstantFactory {
    fn create(
        &self,
        schedule: &CronSchedule,
        time_zone: Tz,
        end: Option<DateTime<Utc>>,
    ) -> Box<dyn ScheduleInstant> {
        Box::new(CronScheduleInstant::new(
            self.clock.now(),
            time_zone,
            schedule.clone(),
            end,
        ))
    }
}

impl<F> InstantFactory for F
where
    F: Fn(&CronSchedule, Tz, Option<DateTime<Utc>>) -> Box<dyn ScheduleInstant> + Send + Sync,
{
    fn create(
        &self,
        schedule: &CronSchedule,
        time_zone: Tz,
        end: Option<DateTime<Utc>>,
    ) -> Box<dyn ScheduleInstant> {
        self(schedule, time_zone, end)
    }
}
