//! In-memory storage for tests and single-process use.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::error::StorageError;
use crate::storage::{JobStorage, StorageLock};
use crate::transaction::{StoreState, WriteOp, WriteTransaction};

/// Storage kept entirely in process memory.
pub struct MemoryStorage {
    state: RwLock<StoreState>,
    locks: parking_lot::Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            locks: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    fn lock_for(&self, resource: &str) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .entry(resource.to_string())
            .or_default()
            .clone()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStorage for MemoryStorage {
    async fn get_all_items_from_set(&self, key: &str) -> Result<Vec<String>, StorageError> {
        Ok(self.state.read().await.set_items(key))
    }

    async fn get_all_entries_from_hash(
        &self,
        key: &str,
    ) -> Result<Option<HashMap<String, String>>, StorageError> {
        Ok(self.state.read().await.hashes.get(key).cloned())
    }

    async fn set_range_in_hash(
        &self,
        key: &str,
        fields: HashMap<String, String>,
    ) -> Result<(), StorageError> {
        self.state.write().await.apply(WriteOp::SetRangeInHash {
            key: key.to_string(),
            fields,
        });
        Ok(())
    }

    async fn commit(&self, transaction: WriteTransaction) -> Result<(), StorageError> {
        self.state.write().await.apply_all(transaction);
        Ok(())
    }

    async fn acquire_lock(
        &self,
        resource: &str,
        timeout: Duration,
    ) -> Result<StorageLock, StorageError> {
        let mutex = self.lock_for(resource);
        match tokio::time::timeout(timeout, mutex.lock_owned()).await {
            Ok(guard) => {
                debug!(resource, "Acquired lock");
                Ok(StorageLock::new(resource, guard))
            }
            Err(_) => Err(StorageError::LockTimeout {
                resource: resource.to_string(),
                timeout,
            }),
        }
    }
}
