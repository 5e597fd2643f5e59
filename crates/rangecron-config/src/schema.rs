//! Configuration schema definitions.

use std::path::PathBuf;
use std::time::Duration;

use rangecron_core::CronFormat;
use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Dialect every stored cron expression is parsed with.
    #[serde(default)]
    pub cron_format: CronFormat,

    /// Compare start/end bounds by calendar date instead of exact instant,
    /// unless a job overrides the end bound.
    #[serde(default)]
    pub ignore_time_component_in_start_end_dates: bool,

    /// How long a pass waits for the registry lock.
    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: u64,

    /// Granularity of the throttler's waits.
    #[serde(default = "default_throttle_step_millis")]
    pub throttle_step_millis: u64,
}

impl SchedulerConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }

    pub fn throttle_step(&self) -> Duration {
        Duration::from_millis(self.throttle_step_millis)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cron_format: CronFormat::default(),
            ignore_time_component_in_start_end_dates: false,
            lock_timeout_secs: default_lock_timeout_secs(),
            throttle_step_millis: default_throttle_step_millis(),
        }
    }
}

fn default_lock_timeout_secs() -> u64 {
    60
}

fn default_throttle_step_millis() -> u64 {
    1000
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON document holding the job registry.
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    base_dir().join("store.json")
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily-rotated log files.
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: default_log_directory(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_directory() -> PathBuf {
    base_dir().join("logs")
}

fn base_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".rangecron")
}
