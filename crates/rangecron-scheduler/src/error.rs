//! Scheduler errors.

use rangecron_core::CoreError;
use rangecron_storage::StorageError;
use thiserror::Error;

/// Errors raised by the scheduler and the job manager.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The registry store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A record or schedule could not be evaluated.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The job factory failed to create a job.
    #[error("Job creation failed: {0}")]
    Factory(String),

    /// Recurring job options were rejected before anything was stored.
    #[error("Invalid recurring job: {0}")]
    Validation(String),

    /// A wait was interrupted by cancellation.
    #[error("Operation cancelled")]
    Cancelled,
}

impl SchedulerError {
    /// Whether the error only affects one job and the pass can continue.
    pub fn is_job_local(&self) -> bool {
        matches!(self, SchedulerError::Core(err) if err.is_job_local())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_job_local_errors() {
        assert!(SchedulerError::from(CoreError::TimeZoneNotFound("X".to_string())).is_job_local());
        assert!(SchedulerError::from(CoreError::JobLoad("bad".to_string())).is_job_local());
        assert!(!SchedulerError::from(CoreError::MissingField("Cron")).is_job_local());
        assert!(!SchedulerError::Cancelled.is_job_local());
        assert!(
            !SchedulerError::from(StorageError::LockTimeout {
                resource: "jobs:lock".to_string(),
                timeout: Duration::from_secs(1),
            })
            .is_job_local()
        );
    }

    #[test]
    fn test_core_errors_display_transparently() {
        let err = SchedulerError::from(CoreError::TimeZoneNotFound("Mars/Olympus".to_string()));
        assert_eq!(err.to_string(), "Time zone not found: Mars/Olympus");
    }
}
