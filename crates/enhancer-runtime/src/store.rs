//! In-memory key-value store.

use std::collections::HashMap;

use async_trait::async_trait;
use enhancer_protocols::{KeyValueStore, StorageArea, StorageChange, StorageError, StorageMap, ValueChange};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

const CHANGE_CAPACITY: usize = 64;

/// A [`KeyValueStore`] held in memory.
///
/// Writes that change nothing are not broadcast.
pub struct MemoryStore {
    area: StorageArea,
    items: RwLock<StorageMap>,
    changes: broadcast::Sender<StorageChange>,
}

impl MemoryStore {
    pub fn new(area: StorageArea) -> Self {
        Self::with_items(area, StorageMap::new())
    }

    pub fn with_items(area: StorageArea, items: StorageMap) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            area,
            items: RwLock::new(items),
            changes,
        }
    }

    /// Copy of every stored item.
    pub async fn snapshot(&self) -> StorageMap {
        self.items.read().await.clone()
    }

    fn publish(&self, changes: HashMap<String, ValueChange>) {
        if changes.is_empty() {
            return;
        }
        debug!(area = ?self.area, keys = ?changes.keys().collect::<Vec<_>>(), "Storage changed");
        // No subscribers is fine.
        let _ = self.changes.send(StorageChange {
            area: self.area,
            changes,
        });
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn area(&self) -> StorageArea {
        self.area
    }

    async fn get(&self, keys: &[&str]) -> Result<StorageMap, StorageError> {
        let items = self.items.read().await;
        Ok(keys
            .iter()
            .filter_map(|key| items.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, new_items: StorageMap) -> Result<(), StorageError> {
        let mut changes = HashMap::new();
        {
            let mut items = self.items.write().await;
            for (key, value) in new_items {
                let old = items.insert(key.clone(), value.clone());
                if old.as_ref() != Some(&value) {
                    changes.insert(
                        key,
                        ValueChange {
                            old_value: old,
                            new_value: Some(value),
                        },
                    );
                }
            }
        }
        self.publish(changes);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut changes = HashMap::new();
        {
            let mut items = self.items.write().await;
            for key in keys {
                if let Some(old) = items.remove(*key) {
                    changes.insert(
                        key.to_string(),
                        ValueChange {
                            old_value: Some(old),
                            new_value: None,
                        },
                    );
                }
            }
        }
        self.publish(changes);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: serde_json::Value) -> StorageMap {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_get_omits_absent_keys() {
        let store = MemoryStore::with_items(StorageArea::Sync, map(json!({"theme": "dark"})));
        let got = store.get(&["theme", "openaiApiKey"]).await.unwrap();
        assert_eq!(got, map(json!({"theme": "dark"})));
    }

    #[tokio::test]
    async fn test_set_broadcasts_only_real_changes() {
        let store = MemoryStore::with_items(StorageArea::Sync, map(json!({"theme": "dark"})));
        let mut rx = store.subscribe();

        store
            .set(map(json!({"theme": "dark", "debugMode": true})))
            .await
            .unwrap();
        let change = rx.recv().await.unwrap();
        assert_eq!(change.area, StorageArea::Sync);
        assert!(!change.touches("theme"));
        assert_eq!(change.new_value("debugMode"), Some(&json!(true)));

        store.set(map(json!({"theme": "dark"}))).await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_remove_reports_old_value() {
        let store = MemoryStore::with_items(StorageArea::Local, map(json!({"pendingText": "hi"})));
        let mut rx = store.subscribe();

        store.remove(&["pendingText", "missing"]).await.unwrap();
        let change = rx.recv().await.unwrap();
        assert_eq!(change.area, StorageArea::Local);
        assert_eq!(change.get("pendingText").unwrap().old_value, Some(json!("hi")));
        assert!(change.new_value("pendingText").is_none());
        assert!(!change.touches("missing"));
        assert!(store.snapshot().await.is_empty());
    }
}
