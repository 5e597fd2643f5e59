//! Job creation collaborator.

use std::collections::HashMap;

use async_trait::async_trait;
use rangecron_core::Invocation;

use crate::error::SchedulerError;

/// Queue used when a job does not name one.
pub const DEFAULT_QUEUE: &str = "default";

/// Creation parameter carrying the recurring job id.
pub const RECURRING_JOB_ID_PARAMETER: &str = "RecurringJobId";

/// Enqueue reason for jobs created by a scheduler pass.
pub const SCHEDULER_REASON: &str = "Triggered by recurring job scheduler";

/// Enqueue reason for jobs created by a manual trigger.
pub const MANAGER_REASON: &str = "Triggered using recurring job manager";

/// Target state of a created job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnqueuedState {
    pub queue: String,
    pub reason: String,
}

/// Everything the factory needs to create one job.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRequest {
    pub invocation: Invocation,
    pub state: EnqueuedState,
    pub parameters: HashMap<String, String>,
}

impl CreateRequest {
    /// A request on behalf of a recurring job. A blank queue means
    /// [`DEFAULT_QUEUE`].
    pub fn recurring(
        recurring_job_id: &str,
        invocation: Invocation,
        queue: Option<&str>,
        reason: &str,
    ) -> Self {
        let queue = queue
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or(DEFAULT_QUEUE);

        Self {
            invocation,
            state: EnqueuedState {
                queue: queue.to_string(),
                reason: reason.to_string(),
            },
            parameters: HashMap::from([(
                RECURRING_JOB_ID_PARAMETER.to_string(),
                recurring_job_id.to_string(),
            )]),
        }
    }

    pub fn recurring_job_id(&self) -> Option<&str> {
        self.parameters
            .get(RECURRING_JOB_ID_PARAMETER)
            .map(String::as_str)
    }
}

/// Creates background jobs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobFactory: Send + Sync {
    /// Create a job. `Ok(None)` means creation was vetoed, which is not an
    /// error.
    async fn create(&self, request: CreateRequest) -> Result<Option<String>, SchedulerError>;
}
