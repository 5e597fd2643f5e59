//! Job factory used by the CLI.

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use rangecron_scheduler::{CreateRequest, JobFactory, SchedulerError};

/// Logs each created job under a fresh id instead of running it.
#[derive(Debug, Default)]
pub(crate) struct LoggingJobFactory;

#[async_trait]
impl JobFactory for LoggingJobFactory {
    async fn create(&self, request: CreateRequest) -> Result<Option<String>, SchedulerError> {
        let job_id = Uuid::new_v4().to_string();
        let args = serde_json::to_string(&request.invocation.args)
            .map_err(|e| SchedulerError::Factory(e.to_string()))?;

        info!(
            job_id = %job_id,
            recurring_job_id = request.recurring_job_id().unwrap_or_default(),
            queue = %request.state.queue,
            reason = %request.state.reason,
            args = %args,
            "Created job {}",
            request.invocation
        );
        Ok(Some(job_id))
    }
}
