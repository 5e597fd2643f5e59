//! # rangecron core
//!
//! Scheduling decision engine for recurring jobs bounded by a start/end
//! date window.
//!
//! ## Components
//!
//! - [`CronSchedule`] - cron expressions in the supported dialects
//! - [`ScheduleInstant`] - "now" and "next" occurrences in a time zone
//! - [`DateRange`] - zone-aware evaluation of a job's active window
//! - [`RecurringJobRecord`] / [`RecordUpdate`] - typed view of stored records
//! - [`Invocation`] - the payload handed to the job factory
//! - [`Clock`] - injectable time source

pub mod clock;
pub mod codec;
pub mod error;
pub mod instant;
pub mod invocation;
pub mod range;
pub mod record;
pub mod schedule;
pub mod time;
pub mod zone;

pub use clock::{Clock, FixedClock, SystemClock};
pub use codec::{decode_instant, encode_instant};
pub use error::{CoreError, CoreResult};
pub use instant::{CronScheduleInstant, ScheduleInstant};
#[cfg(any(test, feature = "mock"))]
pub use instant::MockScheduleInstant;
pub use invocation::Invocation;
pub use range::{DateRange, within_range};
pub use record::{EndDateTimeMode, RecordUpdate, RecurringJobRecord, fields};
pub use schedule::{CronFormat, CronSchedule};
pub use time::{max_instant, min_instant};
pub use zone::resolve_time_zone;
