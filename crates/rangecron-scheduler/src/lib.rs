//! # rangecron scheduler
//!
//! Polling scheduler and job manager for recurring jobs that only fire
//! inside a start/end date range.
//!
//! ## Components
//!
//! - [`RecurringJobScheduler`] - one pass per minute over the job registry
//! - [`RecurringJobManager`] - add, update, trigger and remove jobs
//! - [`JobFactory`] - creates the background job when a recurring job fires
//! - [`Throttler`] - paces passes; [`EveryMinuteThrottler`] by default
//!
//! ## Example
//!
//! ```ignore
//! let storage = Arc::new(MemoryStorage::new());
//! let manager = RecurringJobManager::new(storage.clone(), factory.clone());
//! manager
//!     .add_or_update(&RecurringJobOptions::new("nightly", invocation, "0 2 * * *"))
//!     .await?;
//!
//! let scheduler = RecurringJobScheduler::new(storage, factory, SchedulerConfig::default());
//! scheduler.run(&CancellationToken::new()).await;
//! ```

pub mod error;
pub mod factory;
pub mod instant_factory;
pub mod manager;
pub mod scheduler;
pub mod throttle;

pub use error::SchedulerError;
pub use factory::{
    CreateRequest, DEFAULT_QUEUE, EnqueuedState, JobFactory, MANAGER_REASON,
    RECURRING_JOB_ID_PARAMETER, SCHEDULER_REASON,
};
pub use instant_factory::{ClockInstantFactory, InstantFactory};
pub use manager::{RecurringJobManager, RecurringJobOptions};
pub use scheduler::{PassSummary, RecurringJobScheduler};
pub use throttle::{EveryMinuteThrottler, Throttler};

// Re-export for callers driving `run`.
pub use tokio_util::sync::CancellationToken;
