//! # rangecron storage
//!
//! The job registry store: hashes keyed by job, a registry set of job ids,
//! atomic write transactions and an exclusive lock.
//!
//! ## Backends
//!
//! - [`MemoryStorage`] - in-process, for tests and embedding
//! - [`FileStorage`] - a JSON document with lock files, for the CLI

pub mod error;
pub mod file;
pub mod keys;
pub mod memory;
pub mod storage;
pub mod transaction;

pub use error::{StorageError, StorageResult};
pub use file::FileStorage;
pub use keys::{JOB_KEY_PREFIX, JOB_SET, job_key, registry_lock};
pub use memory::MemoryStorage;
pub use storage::{JobStorage, StorageLock};
pub use transaction::{WriteOp, WriteTransaction};
