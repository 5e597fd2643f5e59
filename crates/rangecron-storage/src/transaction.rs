//! Atomic multi-key writes.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// One write inside a [`WriteTransaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Insert or overwrite the given fields, leaving other fields untouched.
    SetRangeInHash {
        key: String,
        fields: HashMap<String, String>,
    },
    /// Delete a whole hash.
    RemoveHash { key: String },
    /// Add a value to a set.
    AddToSet { key: String, value: String },
    /// Remove a value from a set.
    RemoveFromSet { key: String, value: String },
}

/// A batch of writes applied all-or-nothing by [`crate::JobStorage::commit`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteTransaction {
    ops: Vec<WriteOp>,
}

impl WriteTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_range_in_hash(
        mut self,
        key: impl Into<String>,
        fields: HashMap<String, String>,
    ) -> Self {
        self.ops.push(WriteOp::SetRangeInHash {
            key: key.into(),
            fields,
        });
        self
    }

    pub fn remove_hash(mut self, key: impl Into<String>) -> Self {
        self.ops.push(WriteOp::RemoveHash { key: key.into() });
        self
    }

    pub fn add_to_set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.ops.push(WriteOp::AddToSet {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn remove_from_set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.ops.push(WriteOp::RemoveFromSet {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Hashes and sets held by the bundled backends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct StoreState {
    #[serde(default)]
    pub hashes: BTreeMap<String, HashMap<String, String>>,
    #[serde(default)]
    pub sets: BTreeMap<String, BTreeSet<String>>,
}

impl StoreState {
    pub fn apply(&mut self, op: WriteOp) {
        match op {
            WriteOp::SetRangeInHash { key, fields } => {
                self.hashes.entry(key).or_default().extend(fields);
            }
            WriteOp::RemoveHash { key } => {
                self.hashes.remove(&key);
            }
            WriteOp::AddToSet { key, value } => {
                self.sets.entry(key).or_default().insert(value);
            }
            WriteOp::RemoveFromSet { key, value } => {
                if let Some(set) = self.sets.get_mut(&key) {
                    set.remove(&value);
                    if set.is_empty() {
                        self.sets.remove(&key);
                    }
                }
            }
        }
    }

    pub fn apply_all(&mut self, transaction: WriteTransaction) {
        for op in transaction.ops {
            self.apply(op);
        }
    }

    pub fn set_items(&self, key: &str) -> Vec<String> {
        self.sets
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }
}
