//! The pending handoff record passed from the background to the popup.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use enhancer_config::{keys, HandoffConfig};
use enhancer_protocols::{KeyValueStore, StorageError, StorageMap, TabId};
use serde_json::Value;
use tracing::debug;

/// Text captured from a page field, waiting for the popup to pick it up.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingHandoff {
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub auto_enhance: bool,
    pub from_website: bool,
    /// Tab whose content script captured the text.
    pub source_tab: Option<TabId>,
}

impl PendingHandoff {
    pub fn from_tab(text: impl Into<String>, tab: Option<TabId>) -> Self {
        Self {
            text: text.into(),
            created_at: Utc::now(),
            auto_enhance: true,
            from_website: true,
            source_tab: tab,
        }
    }

    fn to_map(&self) -> StorageMap {
        let mut map = StorageMap::new();
        map.insert(keys::PENDING_TEXT.into(), Value::String(self.text.clone()));
        map.insert(
            keys::PENDING_TIMESTAMP.into(),
            Value::from(self.created_at.timestamp_millis()),
        );
        map.insert(keys::AUTO_ENHANCE.into(), Value::Bool(self.auto_enhance));
        map.insert(keys::FROM_WEBSITE.into(), Value::Bool(self.from_website));
        if let Some(tab) = self.source_tab {
            map.insert(keys::SOURCE_TAB_ID.into(), Value::from(tab.0));
        }
        map
    }

    fn from_map(map: &StorageMap) -> Option<Self> {
        let text = map.get(keys::PENDING_TEXT)?.as_str()?.to_string();
        let millis = map.get(keys::PENDING_TIMESTAMP)?.as_i64()?;
        let created_at = Utc.timestamp_millis_opt(millis).single()?;
        Some(Self {
            text,
            created_at,
            auto_enhance: map.get(keys::AUTO_ENHANCE).and_then(Value::as_bool).unwrap_or(false),
            from_website: map.get(keys::FROM_WEBSITE).and_then(Value::as_bool).unwrap_or(false),
            source_tab: map.get(keys::SOURCE_TAB_ID).and_then(Value::as_i64).map(TabId),
        })
    }
}

/// Reads and writes the handoff in the local area.
#[derive(Clone)]
pub struct HandoffStore {
    local: Arc<dyn KeyValueStore>,
    config: HandoffConfig,
}

impl HandoffStore {
    pub fn new(local: Arc<dyn KeyValueStore>, config: HandoffConfig) -> Self {
        Self { local, config }
    }

    pub async fn put(&self, handoff: &PendingHandoff) -> Result<(), StorageError> {
        self.local.set(handoff.to_map()).await
    }

    /// Consume the handoff. See [`HandoffStore::take_at`].
    pub async fn take(&self) -> Result<Option<PendingHandoff>, StorageError> {
        self.take_at(Utc::now()).await
    }

    /// Consume the handoff as of `now`.
    ///
    /// The record is deleted whenever one is present, fresh or not. A record
    /// older than the freshness window is discarded.
    pub async fn take_at(&self, now: DateTime<Utc>) -> Result<Option<PendingHandoff>, StorageError> {
        let stored = self.local.get(keys::HANDOFF_KEYS).await?;
        if stored.is_empty() {
            return Ok(None);
        }
        self.local.remove(keys::HANDOFF_KEYS).await?;

        let Some(handoff) = PendingHandoff::from_map(&stored) else {
            debug!("Discarding malformed handoff");
            return Ok(None);
        };

        let age = now.signed_duration_since(handoff.created_at).num_milliseconds();
        if age < 0 || age > self.config.freshness_ms as i64 {
            debug!(age_ms = age, "Discarding stale handoff");
            return Ok(None);
        }
        Ok(Some(handoff))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Duration;
    use enhancer_protocols::StorageArea;

    fn store() -> (Arc<MemoryStore>, HandoffStore) {
        let local = Arc::new(MemoryStore::new(StorageArea::Local));
        let handoff = HandoffStore::new(local.clone(), HandoffConfig::default());
        (local, handoff)
    }

    #[tokio::test]
    async fn test_fresh_handoff_consumed_once() {
        let (local, handoffs) = store();
        let handoff = PendingHandoff::from_tab("hey there", Some(TabId(7)));
        handoffs.put(&handoff).await.unwrap();

        let now = handoff.created_at + Duration::seconds(3);
        let taken = handoffs.take_at(now).await.unwrap().unwrap();
        assert_eq!(taken.text, "hey there");
        assert!(taken.auto_enhance);
        assert_eq!(taken.source_tab, Some(TabId(7)));
        // millisecond precision survives the round trip through storage
        assert_eq!(taken.created_at.timestamp_millis(), handoff.created_at.timestamp_millis());

        assert!(handoffs.take_at(now).await.unwrap().is_none());
        assert!(local.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_stale_handoff_discarded_and_deleted() {
        let (local, handoffs) = store();
        let handoff = PendingHandoff::from_tab("old", None);
        handoffs.put(&handoff).await.unwrap();

        let now = handoff.created_at + Duration::milliseconds(10_001);
        assert!(handoffs.take_at(now).await.unwrap().is_none());
        assert!(local.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_freshness_boundary_inclusive() {
        let (_local, handoffs) = store();
        let handoff = PendingHandoff::from_tab("edge", None);
        handoffs.put(&handoff).await.unwrap();
        let now = handoff.created_at + Duration::milliseconds(10_000);
        assert!(handoffs.take_at(now).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_malformed_handoff_removed() {
        let (local, handoffs) = store();
        let mut map = StorageMap::new();
        map.insert(keys::PENDING_TEXT.into(), Value::String("no timestamp".into()));
        local.set(map).await.unwrap();

        assert!(handoffs.take().await.unwrap().is_none());
        assert!(local.snapshot().await.is_empty());
    }
}
