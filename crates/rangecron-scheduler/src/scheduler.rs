//! The recurring job scheduler.
//!
//! One pass takes the registry lock, walks every registered job in registry
//! order and decides whether an occurrence of its cron schedule is due inside
//! its active date range. Per job it writes back only what changed:
//!
//! - `LastExecution` / `LastJobId` when the job fired
//! - `CreatedAt` when a legacy record lacks it
//! - `NextExecution`, always, empty when there is no upcoming occurrence

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rangecron_config::SchedulerConfig;
use rangecron_core::{
    CoreError, CronSchedule, DateRange, Invocation, RecordUpdate, RecurringJobRecord, SystemClock,
    resolve_time_zone,
};
use rangecron_storage::{JOB_SET, JobStorage, job_key, registry_lock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::SchedulerError;
use crate::factory::{CreateRequest, JobFactory, SCHEDULER_REASON};
use crate::instant_factory::{ClockInstantFactory, InstantFactory};
use crate::throttle::{EveryMinuteThrottler, Throttler};

/// Outcome of one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Jobs whose record was found and evaluated.
    pub processed: usize,
    /// Jobs handed to the job factory.
    pub triggered: usize,
    /// Jobs skipped because of a job-local failure.
    pub skipped: usize,
}

/// Evaluates every registered recurring job once per pass.
pub struct RecurringJobScheduler {
    storage: Arc<dyn JobStorage>,
    factory: Arc<dyn JobFactory>,
    instant_factory: Arc<dyn InstantFactory>,
    throttler: Arc<dyn Throttler>,
    config: SchedulerConfig,
}

impl RecurringJobScheduler {
    /// Create a scheduler driven by the system clock.
    pub fn new(
        storage: Arc<dyn JobStorage>,
        factory: Arc<dyn JobFactory>,
        config: SchedulerConfig,
    ) -> Self {
        let throttler = EveryMinuteThrottler::new(Arc::new(SystemClock), config.throttle_step());
        Self {
            storage,
            factory,
            instant_factory: Arc::new(ClockInstantFactory::default()),
            throttler: Arc::new(throttler),
            config,
        }
    }

    pub fn with_instant_factory(mut self, instant_factory: Arc<dyn InstantFactory>) -> Self {
        self.instant_factory = instant_factory;
        self
    }

    pub fn with_throttler(mut self, throttler: Arc<dyn Throttler>) -> Self {
        self.throttler = throttler;
        self
    }

    /// Run passes until `cancel` fires.
    ///
    /// A failed pass is logged and followed by the usual post-pass delay.
    pub async fn run(&self, cancel: &CancellationToken) {
        info!("Recurring job scheduler started");

        while !cancel.is_cancelled() {
            match self.execute(cancel).await {
                Ok(summary) => debug!(
                    processed = summary.processed,
                    triggered = summary.triggered,
                    skipped = summary.skipped,
                    "Recurring job pass completed"
                ),
                Err(SchedulerError::Cancelled) => break,
                Err(e) => {
                    error!("Recurring job pass failed: {}", e);
                    if self.throttler.delay(cancel).await.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Recurring job scheduler stopped");
    }

    /// Throttle, run one pass, then delay.
    pub async fn execute(&self, cancel: &CancellationToken) -> Result<PassSummary, SchedulerError> {
        self.throttler.throttle(cancel).await?;
        let summary = self.run_pass(cancel).await?;
        // A pass can finish well within the throttler's resolution.
        self.throttler.delay(cancel).await?;
        Ok(summary)
    }

    /// Evaluate every registered job once while holding the registry lock.
    pub async fn run_pass(&self, cancel: &CancellationToken) -> Result<PassSummary, SchedulerError> {
        let resource = registry_lock();
        let lock = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SchedulerError::Cancelled),
            lock = self.storage.acquire_lock(&resource, self.config.lock_timeout()) => lock?,
        };

        let ids = self.storage.get_all_items_from_set(JOB_SET).await?;
        let mut summary = PassSummary::default();

        for id in ids {
            if cancel.is_cancelled() {
                return Err(SchedulerError::Cancelled);
            }

            let Some(fields) = self.storage.get_all_entries_from_hash(&job_key(&id)).await? else {
                continue;
            };
            summary.processed += 1;

            match self.try_schedule_job(&id, &fields).await {
                Ok(true) => summary.triggered += 1,
                Ok(false) => {}
                Err(e) if e.is_job_local() => {
                    summary.skipped += 1;
                    if matches!(e, SchedulerError::Core(CoreError::JobLoad(_))) {
                        warn!(
                            "Recurring job '{}' can not be scheduled due to job load failure: {}",
                            id, e
                        );
                    } else {
                        error!("Recurring job '{}' was not triggered: {}", id, e);
                    }
                }
                Err(e) => return Err(e),
            }
        }

        drop(lock);
        Ok(summary)
    }

    async fn try_schedule_job(
        &self,
        id: &str,
        fields: &HashMap<String, String>,
    ) -> Result<bool, SchedulerError> {
        let record = RecurringJobRecord::from_fields(fields)?;
        let invocation = Invocation::from_json(&record.job)?;
        let schedule = CronSchedule::parse(&record.cron, self.config.cron_format)?;
        let time_zone = resolve_time_zone(record.time_zone_id.as_deref())?;

        let ignore_time = self.config.ignore_time_component_in_start_end_dates;
        let range = DateRange::resolve(
            record.start_date,
            record.end_date,
            time_zone,
            ignore_time,
            record.end_date_time_mode.ignores_time(ignore_time),
        );

        let instant = self
            .instant_factory
            .create(&schedule, time_zone, range.end());
        let now = instant.now_instant();
        let last_instant = range.clamp(last_instant(&record, now));

        let mut update = RecordUpdate {
            next_execution: instant.next_instant(),
            ..RecordUpdate::default()
        };

        let due = range.contains(now) && instant.has_next_instant(last_instant, range.end());
        if due {
            let request =
                CreateRequest::recurring(id, invocation, record.queue.as_deref(), SCHEDULER_REASON);
            let job_id = self.factory.create(request).await?.unwrap_or_default();

            if job_id.is_empty() {
                debug!(
                    "Recurring job '{}' execution at '{}' has been canceled",
                    id, now
                );
            } else {
                debug!(job_id = %job_id, "Recurring job '{}' triggered at '{}'", id, now);
            }

            update.last_execution = Some(now);
            update.last_job_id = Some(job_id);
        }

        if record.created_at.is_none() {
            update.created_at = Some(now);
        }

        self.storage
            .set_range_in_hash(&job_key(id), update.into_fields())
            .await?;

        Ok(due)
    }
}

/// Where enumeration of missed occurrences starts for a job.
fn last_instant(record: &RecurringJobRecord, now: DateTime<Utc>) -> DateTime<Utc> {
    let one_second_before =
        |instant: DateTime<Utc>| instant.checked_sub_signed(Duration::seconds(1)).unwrap_or(instant);

    record
        .last_execution
        .or(record.created_at)
        .or_else(|| record.next_execution.map(one_second_before))
        .unwrap_or_else(|| one_second_before(now))
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
