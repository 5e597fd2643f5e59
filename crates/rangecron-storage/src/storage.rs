//! Job registry storage contract.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::transaction::WriteTransaction;

/// Hash and set storage with atomic writes and an exclusive lock.
///
/// Implementations must apply a committed [`WriteTransaction`] atomically
/// and must keep at most one [`StorageLock`] per resource alive across every
/// process sharing the store.
#[async_trait]
pub trait JobStorage: Send + Sync {
    /// Every member of a set, in a stable order.
    async fn get_all_items_from_set(&self, key: &str) -> Result<Vec<String>, StorageError>;

    /// Every field of a hash, or `None` if the hash does not exist.
    async fn get_all_entries_from_hash(
        &self,
        key: &str,
    ) -> Result<Option<HashMap<String, String>>, StorageError>;

    /// Insert or overwrite fields of a hash.
    async fn set_range_in_hash(
        &self,
        key: &str,
        fields: HashMap<String, String>,
    ) -> Result<(), StorageError>;

    /// Apply a batch of writes atomically.
    async fn commit(&self, transaction: WriteTransaction) -> Result<(), StorageError>;

    /// Wait up to `timeout` for exclusive access to `resource`.
    async fn acquire_lock(
        &self,
        resource: &str,
        timeout: Duration,
    ) -> Result<StorageLock, StorageError>;
}

/// Exclusive access to a storage resource, released on drop.
pub struct StorageLock {
    resource: String,
    _guard: Box<dyn Any + Send + Sync>,
}

impl StorageLock {
    pub fn new(resource: impl Into<String>, guard: impl Any + Send + Sync) -> Self {
        Self {
            resource: resource.into(),
            _guard: Box::new(guard),
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }
}

impl fmt::Debug for StorageLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageLock")
            .field("resource", &self.resource)
            .finish_non_exhaustive()
    }
}
