//! Pacing of scheduler passes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Timelike;
use rangecron_core::{Clock, SystemClock};
use tokio_util::sync::CancellationToken;

use crate::error::SchedulerError;

/// Gates how often a pass runs.
///
/// Both waits return [`SchedulerError::Cancelled`] promptly once `cancel`
/// fires.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Throttler: Send + Sync {
    /// Wait before a pass.
    async fn throttle(&self, cancel: &CancellationToken) -> Result<(), SchedulerError>;

    /// Wait after a pass.
    async fn delay(&self, cancel: &CancellationToken) -> Result<(), SchedulerError>;
}

/// Starts passes on minute boundaries.
pub struct EveryMinuteThrottler {
    clock: Arc<dyn Clock>,
    step: Duration,
}

impl EveryMinuteThrottler {
    pub fn new(clock: Arc<dyn Clock>, step: Duration) -> Self {
        Self { clock, step }
    }

    async fn wait_step(&self, cancel: &CancellationToken) -> Result<(), SchedulerError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SchedulerError::Cancelled),
            _ = tokio::time::sleep(self.step) => Ok(()),
        }
    }
}

impl Default for EveryMinuteThrottler {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), Duration::from_secs(1))
    }
}

#[async_trait]
impl Throttler for EveryMinuteThrottler {
    async fn throttle(&self, cancel: &CancellationToken) -> Result<(), SchedulerError> {
        while self.clock.now().second() != 0 {
            self.wait_step(cancel).await?;
        }
        if cancel.is_cancelled() {
            return Err(SchedulerError::Cancelled);
        }
        Ok(())
    }

    async fn delay(&self, cancel: &CancellationToken) -> Result<(), SchedulerError> {
        self.wait_step(cancel).await
    }
}
