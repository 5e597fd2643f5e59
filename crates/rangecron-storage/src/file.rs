//! JSON file storage shared between processes on one host.
//!
//! The whole store lives in a single JSON document. Reads need no lock;
//! writes re-read, change and replace the document while holding the store
//! lock file, and land through a synced temporary file and a rename.
//! Exclusive locks are marker files created with `create_new` that hold
//! their owner's token:
//!
//! ```text
//! {dir}/
//! ├── store.json
//! ├── store.json.lock
//! └── store.json.{resource}.lock
//! ```
//!
//! A held lock file is touched periodically. One that has not been touched
//! for the stale age is assumed to belong to a dead process and is broken.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::storage::{JobStorage, StorageLock};
use crate::transaction::{StoreState, WriteOp, WriteTransaction};

/// How often a contended resource lock file is re-checked.
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How often a contended store lock file is re-checked.
const STORE_LOCK_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// How long a write waits for the store lock.
const STORE_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Lock files older than this are assumed to belong to a dead process.
const DEFAULT_STALE_LOCK_AGE: Duration = Duration::from_secs(5 * 60);

static TOKEN_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A name unique to this process and call.
fn unique_token() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!(
        "{}-{}-{}",
        std::process::id(),
        nanos,
        TOKEN_SEQUENCE.fetch_add(1, Ordering::Relaxed)
    )
}

/// `path` with `suffix` appended to its file name.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Storage backed by a single JSON file.
pub struct FileStorage {
    path: PathBuf,
    stale_lock_age: Duration,
    /// Serializes read-modify-write cycles within this process.
    write_guard: Mutex<()>,
}

impl FileStorage {
    /// Open (or prepare to create) the store at `path`.
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        debug!("FileStorage initialized at {:?}", path);

        Ok(Self {
            path,
            stale_lock_age: DEFAULT_STALE_LOCK_AGE,
            write_guard: Mutex::new(()),
        })
    }

    /// Override how old a lock file must be before it is broken.
    pub fn with_stale_lock_age(mut self, age: Duration) -> Self {
        self.stale_lock_age = age;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self, resource: &str) -> PathBuf {
        let sanitized: String = resource
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        with_suffix(&self.path, &format!(".{sanitized}.lock"))
    }

    fn store_lock_path(&self) -> PathBuf {
        with_suffix(&self.path, ".lock")
    }

    /// Held lock files are touched often enough to never look stale.
    fn refresh_interval(&self) -> Duration {
        (self.stale_lock_age / 3).max(LOCK_POLL_INTERVAL)
    }

    async fn load(&self) -> Result<StoreState, StorageError> {
        match fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(StoreState::default()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(StoreState::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, state: &StoreState) -> Result<(), StorageError> {
        let content = serde_json::to_vec_pretty(state)?;
        let tmp = with_suffix(&self.path, &format!(".{}.tmp", unique_token()));

        if let Err(e) = write_synced(&tmp, &content).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        fs::rename(&tmp, &self.path).await?;
        sync_parent_dir(&self.path).await?;
        Ok(())
    }

    async fn update(&self, change: impl FnOnce(&mut StoreState)) -> Result<(), StorageError> {
        let _guard = self.write_guard.lock().await;
        let _lock = self
            .lock_file(
                self.store_lock_path(),
                "store",
                STORE_LOCK_TIMEOUT,
                STORE_LOCK_POLL_INTERVAL,
            )
            .await?;

        let mut state = self.load().await?;
        change(&mut state);
        self.save(&state).await
    }

    /// Create `lock_path` exclusively, waiting up to `timeout`.
    async fn lock_file(
        &self,
        lock_path: PathBuf,
        resource: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<LockFile, StorageError> {
        let token = unique_token();
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_path)
                .await
            {
                Ok(mut file) => {
                    if let Err(e) = write_owner(&mut file, &token).await {
                        let _ = fs::remove_file(&lock_path).await;
                        return Err(e.into());
                    }
                    debug!(resource, "Acquired lock file {:?}", lock_path);
                    return Ok(LockFile::new(lock_path, token, self.refresh_interval()));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if self.break_if_stale(&lock_path).await? {
                        continue;
                    }
                }
                Err(e) => return Err(e.into()),
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(StorageError::LockTimeout {
                    resource: resource.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Remove `lock_path` if it was left behind by a dead holder.
    ///
    /// The file is first moved aside. If what was moved is no longer the
    /// file judged stale, it is linked back into place.
    async fn break_if_stale(&self, lock_path: &Path) -> Result<bool, StorageError> {
        let Some(observed) = read_lock(lock_path).await? else {
            return Ok(true);
        };
        let age = SystemTime::now()
            .duration_since(observed.modified)
            .unwrap_or_default();
        if age < self.stale_lock_age {
            return Ok(false);
        }

        let aside = with_suffix(lock_path, &format!(".{}.stale", unique_token()));
        match fs::rename(lock_path, &aside).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(e.into()),
        }

        let moved = read_lock(&aside).await?;
        if moved.as_ref() != Some(&observed) {
            if let Err(e) = fs::hard_link(&aside, lock_path).await {
                warn!("Failed to restore lock file {:?}: {}", lock_path, e);
            }
            let _ = fs::remove_file(&aside).await;
            return Ok(false);
        }

        warn!(
            holder = %observed.owner,
            "Breaking stale lock file {:?} (age {:?})", lock_path, age
        );
        match fs::remove_file(&aside).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
            Err(e) => Err(e.into()),
        }
    }
}

/// Owner token and modification time of a lock file.
#[derive(Debug, PartialEq, Eq)]
struct LockState {
    owner: String,
    modified: SystemTime,
}

async fn read_lock(lock_path: &Path) -> Result<Option<LockState>, StorageError> {
    let modified = match fs::metadata(lock_path).await {
        Ok(metadata) => metadata.modified()?,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let owner = match fs::read_to_string(lock_path).await {
        Ok(owner) => owner,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(LockState { owner, modified }))
}

async fn write_owner(file: &mut fs::File, token: &str) -> std::io::Result<()> {
    file.write_all(token.as_bytes()).await?;
    file.flush().await
}

async fn write_synced(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(content).await?;
    file.sync_all().await
}

#[cfg(unix)]
async fn sync_parent_dir(path: &Path) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::File::open(parent).await?.sync_all().await
}

#[cfg(not(unix))]
async fn sync_parent_dir(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Touch `path` if it still holds `token`. `false` once another owner
/// holds it.
fn touch_if_owned(path: &Path, token: &str) -> std::io::Result<bool> {
    match std::fs::read_to_string(path) {
        Ok(owner) if owner == token => {}
        Ok(_) => return Ok(false),
        // Possibly moved aside by a waiter checking staleness.
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(e),
    }
    std::fs::OpenOptions::new()
        .write(true)
        .open(path)?
        .set_modified(SystemTime::now())?;
    Ok(true)
}

async fn refresh_lock(path: PathBuf, token: String, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let (touch_path, touch_token) = (path.clone(), token.clone());
        match tokio::task::spawn_blocking(move || touch_if_owned(&touch_path, &touch_token)).await
        {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) => {
                warn!("Lock file {:?} is no longer ours; stopped refreshing", path);
                return;
            }
            Ok(Err(e)) => warn!("Failed to refresh lock file {:?}: {}", path, e),
            Err(_) => return,
        }
    }
}

#[async_trait]
impl JobStorage for FileStorage {
    async fn get_all_items_from_set(&self, key: &str) -> Result<Vec<String>, StorageError> {
        Ok(self.load().await?.set_items(key))
    }

    async fn get_all_entries_from_hash(
        &self,
        key: &str,
    ) -> Result<Option<HashMap<String, String>>, StorageError> {
        Ok(self.load().await?.hashes.remove(key))
    }

    async fn set_range_in_hash(
        &self,
        key: &str,
        fields: HashMap<String, String>,
    ) -> Result<(), StorageError> {
        let op = WriteOp::SetRangeInHash {
            key: key.to_string(),
            fields,
        };
        self.update(|state| state.apply(op)).await
    }

    async fn commit(&self, transaction: WriteTransaction) -> Result<(), StorageError> {
        if transaction.is_empty() {
            return Ok(());
        }
        self.update(|state| state.apply_all(transaction)).await
    }

    async fn acquire_lock(
        &self,
        resource: &str,
        timeout: Duration,
    ) -> Result<StorageLock, StorageError> {
        let lock = self
            .lock_file(self.lock_path(resource), resource, timeout, LOCK_POLL_INTERVAL)
            .await?;
        Ok(StorageLock::new(resource, lock))
    }
}

/// A held lock file. Refreshed while alive, removed on drop if still ours.
struct LockFile {
    path: PathBuf,
    token: String,
    refresh: JoinHandle<()>,
}

impl LockFile {
    fn new(path: PathBuf, token: String, refresh_interval: Duration) -> Self {
        let refresh = tokio::spawn(refresh_lock(path.clone(), token.clone(), refresh_interval));
        Self {
            path,
            token,
            refresh,
        }
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        self.refresh.abort();
        match std::fs::read_to_string(&self.path) {
            Ok(owner) if owner == self.token => {
                if let Err(e) = std::fs::remove_file(&self.path) {
                    warn!("Failed to release lock file {:?}: {}", self.path, e);
                }
            }
            Ok(owner) => warn!(
                holder = %owner,
                "Lock file {:?} was taken over; leaving it in place", self.path
            ),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to release lock file {:?}: {}", self.path, e),
        }
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
