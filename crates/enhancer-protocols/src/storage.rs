//! Reactive key-value storage protocol.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::StorageError;

/// A set of stored items.
pub type StorageMap = serde_json::Map<String, Value>;

/// Which store an item lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageArea {
    /// User settings, synced across devices.
    Sync,
    /// Device-local transient data.
    Local,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

/// A batch of changes from a single write.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub area: StorageArea,
    pub changes: HashMap<String, ValueChange>,
}

impl StorageChange {
    pub fn get(&self, key: &str) -> Option<&ValueChange> {
        self.changes.get(key)
    }

    pub fn touches(&self, key: &str) -> bool {
        self.changes.contains_key(key)
    }

    /// New value of `key`, if the key changed and was not removed.
    pub fn new_value(&self, key: &str) -> Option<&Value> {
        self.changes.get(key).and_then(|c| c.new_value.as_ref())
    }
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    fn area(&self) -> StorageArea;

    /// Fetch the given keys; absent keys are omitted from the result.
    async fn get(&self, keys: &[&str]) -> Result<StorageMap, StorageError>;

    async fn set(&self, items: StorageMap) -> Result<(), StorageError>;

    async fn remove(&self, keys: &[&str]) -> Result<(), StorageError>;

    /// Subscribe to changes written after this call.
    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}
