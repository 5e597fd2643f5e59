//! Registration of recurring jobs.

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use rangecron_core::time::{from_zone_local, to_zone_local};
use rangecron_core::{
    Clock, CoreError, CronFormat, CronSchedule, EndDateTimeMode, Invocation, RecurringJobRecord,
    SystemClock, encode_instant, fields, resolve_time_zone,
};
use rangecron_storage::{JOB_SET, JobStorage, WriteTransaction, job_key};
use tracing::{debug, info, warn};

use crate::error::SchedulerError;
use crate::factory::{CreateRequest, JobFactory, MANAGER_REASON};

/// Definition of a recurring job as supplied by a caller.
///
/// `start` and `end` are wall-clock values in `time_zone` (UTC when unset).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecurringJobOptions {
    pub recurring_job_id: String,
    pub invocation: Option<Invocation>,
    pub cron_expression: String,
    pub time_zone: Option<String>,
    pub queue: Option<String>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub end_date_time_mode: EndDateTimeMode,
}

impl RecurringJobOptions {
    /// A job in UTC on the default queue, unbounded on both sides.
    pub fn new(
        recurring_job_id: impl Into<String>,
        invocation: Invocation,
        cron_expression: impl Into<String>,
    ) -> Self {
        Self {
            recurring_job_id: recurring_job_id.into(),
            invocation: Some(invocation),
            cron_expression: cron_expression.into(),
            ..Self::default()
        }
    }

    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = Some(time_zone.into());
        self
    }

    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = Some(queue.into());
        self
    }

    pub fn with_start(mut self, start: NaiveDateTime) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_end(mut self, end: NaiveDateTime) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_end_date_time_mode(mut self, mode: EndDateTimeMode) -> Self {
        self.end_date_time_mode = mode;
        self
    }

    /// Check that the required fields are present.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.recurring_job_id.trim().is_empty() {
            return Err(SchedulerError::Validation(
                "recurring job id is required".to_string(),
            ));
        }
        if self.invocation.is_none() {
            return Err(SchedulerError::Validation("job is required".to_string()));
        }
        if self.cron_expression.trim().is_empty() {
            return Err(SchedulerError::Validation(
                "cron expression is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Creates, triggers and removes recurring jobs.
pub struct RecurringJobManager {
    storage: Arc<dyn JobStorage>,
    factory: Arc<dyn JobFactory>,
    clock: Arc<dyn Clock>,
    cron_format: CronFormat,
}

impl RecurringJobManager {
    pub fn new(storage: Arc<dyn JobStorage>, factory: Arc<dyn JobFactory>) -> Self {
        Self {
            storage,
            factory,
            clock: Arc::new(SystemClock),
            cron_format: CronFormat::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Dialect used to validate cron expressions. Must match the scheduler's.
    pub fn with_cron_format(mut self, cron_format: CronFormat) -> Self {
        self.cron_format = cron_format;
        self
    }

    /// Store a job definition and register its id.
    ///
    /// Execution state of an existing job is kept. Nothing is written when
    /// the options are rejected.
    pub async fn add_or_update(&self, options: &RecurringJobOptions) -> Result<(), SchedulerError> {
        options.validate()?;
        let id = options.recurring_job_id.as_str();

        let time_zone = resolve_time_zone(options.time_zone.as_deref())
            .map_err(|e| SchedulerError::Validation(e.to_string()))?;
        self.validate_cron(&options.cron_expression, time_zone)?;

        let job = match &options.invocation {
            Some(invocation) => invocation.to_json()?,
            None => return Err(SchedulerError::Validation("job is required".to_string())),
        };

        let record = RecurringJobRecord {
            job,
            cron: options.cron_expression.clone(),
            time_zone_id: options.time_zone.clone(),
            queue: options.queue.clone(),
            start_date: local_to_utc(options.start, time_zone)?,
            end_date: local_to_utc(options.end, time_zone)?,
            end_date_time_mode: options.end_date_time_mode,
            ..RecurringJobRecord::default()
        };

        let key = job_key(id);
        let mut definition = record.definition_fields();
        if self.storage.get_all_entries_from_hash(&key).await?.is_none() {
            definition.insert(
                fields::CREATED_AT.to_string(),
                encode_instant(self.clock.now()),
            );
        }

        self.storage
            .commit(
                WriteTransaction::new()
                    .set_range_in_hash(key, definition)
                    .add_to_set(JOB_SET, id),
            )
            .await?;

        info!("Recurring job '{}' added or updated", id);
        Ok(())
    }

    /// Create a job for `recurring_job_id` now, ignoring its schedule and
    /// date range. Returns `Ok(None)` when the id is unknown or creation was
    /// vetoed.
    pub async fn trigger(&self, recurring_job_id: &str) -> Result<Option<String>, SchedulerError> {
        let Some(hash) = self
            .storage
            .get_all_entries_from_hash(&job_key(recurring_job_id))
            .await?
        else {
            debug!("Recurring job '{}' does not exist", recurring_job_id);
            return Ok(None);
        };

        let record = RecurringJobRecord::from_fields(&hash)?;
        let invocation = Invocation::from_json(&record.job)?;
        let request = CreateRequest::recurring(
            recurring_job_id,
            invocation,
            record.queue.as_deref(),
            MANAGER_REASON,
        );

        let job_id = self.factory.create(request).await?;
        info!(
            job_id = job_id.as_deref().unwrap_or_default(),
            "Recurring job '{}' triggered manually", recurring_job_id
        );
        Ok(job_id)
    }

    /// Delete a job and unregister its id. Unknown ids are ignored.
    pub async fn remove_if_exists(&self, recurring_job_id: &str) -> Result<(), SchedulerError> {
        self.storage
            .commit(
                WriteTransaction::new()
                    .remove_hash(job_key(recurring_job_id))
                    .remove_from_set(JOB_SET, recurring_job_id),
            )
            .await?;

        debug!("Recurring job '{}' removed", recurring_job_id);
        Ok(())
    }

    /// Registered jobs in registry order. Undecodable records are left out.
    pub async fn list(&self) -> Result<Vec<(String, RecurringJobRecord)>, SchedulerError> {
        let ids = self.storage.get_all_items_from_set(JOB_SET).await?;
        let mut jobs = Vec::with_capacity(ids.len());

        for id in ids {
            let Some(hash) = self.storage.get_all_entries_from_hash(&job_key(&id)).await? else {
                continue;
            };
            match RecurringJobRecord::from_fields(&hash) {
                Ok(record) => jobs.push((id, record)),
                Err(e) => warn!("Recurring job '{}' can not be read: {}", id, e),
            }
        }

        Ok(jobs)
    }

    /// Parse `expression` and require an upcoming occurrence.
    fn validate_cron(&self, expression: &str, time_zone: Tz) -> Result<(), SchedulerError> {
        let schedule = CronSchedule::parse(expression, self.cron_format)
            .map_err(|e| SchedulerError::Validation(e.to_string()))?;

        let now_local = to_zone_local(self.clock.now(), &time_zone);
        if schedule.next_occurrence(now_local).is_none() {
            return Err(SchedulerError::Validation(format!(
                "cron expression '{expression}' has no upcoming occurrence"
            )));
        }
        Ok(())
    }
}

/// Convert a caller-supplied bound. Gap times are rejected.
fn local_to_utc(
    local: Option<NaiveDateTime>,
    time_zone: Tz,
) -> Result<Option<DateTime<Utc>>, SchedulerError> {
    let Some(local) = local else {
        return Ok(None);
    };
    from_zone_local(local, &time_zone).map(Some).ok_or_else(|| {
        let err = CoreError::InvalidLocalTime {
            local: local.to_string(),
            zone: time_zone.name().to_string(),
        };
        SchedulerError::Validation(err.to_string())
    })
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
