//! Core errors.

use thiserror::Error;

/// Errors raised by the scheduling decision engine.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The cron expression could not be parsed in the requested dialect.
    #[error("Invalid cron expression '{expression}': {message}")]
    InvalidCron { expression: String, message: String },

    /// The time zone id does not name a known zone.
    #[error("Time zone not found: {0}")]
    TimeZoneNotFound(String),

    /// A required record field is absent.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A record field holds a value that cannot be decoded.
    #[error("Invalid value for {field}: {message}")]
    InvalidField { field: &'static str, message: String },

    /// The job payload could not be loaded.
    #[error("Job load failed: {0}")]
    JobLoad(String),

    /// A zone-local time does not exist in the target zone.
    #[error("Local time {local} does not exist in time zone {zone}")]
    InvalidLocalTime { local: String, zone: String },
}

impl CoreError {
    /// Whether the error only affects a single job and should not abort a pass.
    pub fn is_job_local(&self) -> bool {
        matches!(self, CoreError::TimeZoneNotFound(_) | CoreError::JobLoad(_))
    }
}

/// Result alias for core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;
