//! The background context.
//!
//! Serves `openPopupWithText` from content scripts and `enhanceText` from the
//! popup. Liveness and replace requests belong to content scripts and are
//! left unanswered here.

use std::sync::Arc;

use async_trait::async_trait;
use enhancer_config::{keys, Settings};
use enhancer_protocols::{
    CompletionTarget, EnhanceError, EnhanceRequest, EnhanceResponse, KeyValueStore, MessageResponse, PopupLauncher,
    RuntimeMessage, TabId, TextEnhancer,
};
use tracing::{debug, info, warn};

use crate::bus::MessageHandler;
use crate::error::RuntimeError;
use crate::handoff::{HandoffStore, PendingHandoff};

pub struct Background {
    settings: Arc<dyn KeyValueStore>,
    handoff: HandoffStore,
    popup: Arc<dyn PopupLauncher>,
    enhancer: Arc<dyn TextEnhancer>,
}

impl Background {
    pub fn new(
        settings: Arc<dyn KeyValueStore>,
        handoff: HandoffStore,
        popup: Arc<dyn PopupLauncher>,
        enhancer: Arc<dyn TextEnhancer>,
    ) -> Self {
        Self {
            settings,
            handoff,
            popup,
            enhancer,
        }
    }

    async fn settings(&self) -> Result<Settings, RuntimeError> {
        let map = self.settings.get(keys::SETTINGS_KEYS).await?;
        Ok(Settings::from_map(&map))
    }

    /// Store the captured text and open the popup on it.
    pub async fn open_popup_with_text(&self, text: String, sender: Option<TabId>) -> Result<(), RuntimeError> {
        let handoff = PendingHandoff::from_tab(text, sender);
        self.handoff.put(&handoff).await?;
        self.popup.open_popup().await?;
        info!(tab = ?sender, chars = handoff.text.chars().count(), "Popup opened with captured text");
        Ok(())
    }

    /// Run a completion with the stored key and model.
    pub async fn enhance_text(&self, request: &EnhanceRequest) -> Result<String, EnhanceError> {
        let settings = self
            .settings()
            .await
            .map_err(|e| EnhanceError::Settings(e.to_string()))?;
        let api_key = settings.api_key().ok_or(EnhanceError::MissingApiKey)?;
        let target = CompletionTarget {
            api_key: api_key.to_string(),
            model: settings.model().to_string(),
        };
        debug!(model = %target.model, tone = %request.tone, kind = %request.kind, "Enhancing text");
        self.enhancer.enhance(&target, request).await
    }

    async fn debug_mode(&self) -> bool {
        self.settings().await.map(|s| s.debug_mode).unwrap_or(false)
    }
}

#[async_trait]
impl MessageHandler for Background {
    async fn handle(&self, message: RuntimeMessage, sender: Option<TabId>) -> Option<MessageResponse> {
        match message {
            RuntimeMessage::OpenPopupWithText { text } => match self.open_popup_with_text(text, sender).await {
                Ok(()) => Some(MessageResponse::ok()),
                Err(e) => {
                    if self.debug_mode().await {
                        warn!(error = %e, "Failed to open popup with text");
                    }
                    Some(MessageResponse::failed(e.to_string()))
                }
            },
            RuntimeMessage::EnhanceText { data } => {
                let result = self.enhance_text(&data).await;
                if let Err(ref e) = result {
                    debug!(error = %e, "Enhancement failed");
                }
                Some(MessageResponse::Enhance(EnhanceResponse::from(result)))
            }
            RuntimeMessage::Ping | RuntimeMessage::ReplaceText { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::ExtensionBus;
    use crate::store::MemoryStore;
    use enhancer_config::HandoffConfig;
    use enhancer_protocols::{StorageArea, StorageChange, StorageError, StorageMap};
    use parking_lot::Mutex;
    use serde_json::json;
    use tokio::sync::broadcast;

    // ===== Test Helpers =====

    struct RecordingEnhancer {
        calls: Mutex<Vec<(CompletionTarget, EnhanceRequest)>>,
        result: Result<String, EnhanceError>,
    }

    #[async_trait]
    impl TextEnhancer for RecordingEnhancer {
        async fn enhance(&self, target: &CompletionTarget, request: &EnhanceRequest) -> Result<String, EnhanceError> {
            self.calls.lock().push((target.clone(), request.clone()));
            self.result.clone()
        }
    }

    struct UnavailableStore;

    #[async_trait]
    impl KeyValueStore for UnavailableStore {
        fn area(&self) -> StorageArea {
            StorageArea::Sync
        }

        async fn get(&self, _keys: &[&str]) -> Result<StorageMap, StorageError> {
            Err(StorageError::Unavailable("sync area offline".into()))
        }

        async fn set(&self, _items: StorageMap) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("sync area offline".into()))
        }

        async fn remove(&self, _keys: &[&str]) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("sync area offline".into()))
        }

        fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
            broadcast::channel(1).1
        }
    }

    struct Fixture {
        bus: ExtensionBus,
        local: Arc<MemoryStore>,
        enhancer: Arc<RecordingEnhancer>,
        background: Background,
    }

    fn fixture(settings: serde_json::Value, result: Result<String, EnhanceError>) -> Fixture {
        let items: StorageMap = settings.as_object().cloned().unwrap_or_default();
        let sync = Arc::new(MemoryStore::with_items(StorageArea::Sync, items));
        let local = Arc::new(MemoryStore::new(StorageArea::Local));
        let bus = ExtensionBus::new("ext");
        let enhancer = Arc::new(RecordingEnhancer {
            calls: Mutex::new(Vec::new()),
            result,
        });
        let background = Background::new(
            sync,
            HandoffStore::new(local.clone(), HandoffConfig::default()),
            Arc::new(bus.clone()),
            enhancer.clone(),
        );
        Fixture {
            bus,
            local,
            enhancer,
            background,
        }
    }

    // ===== openPopupWithText =====

    #[tokio::test]
    async fn test_open_popup_stores_handoff() {
        let fx = fixture(json!({}), Ok(String::new()));
        let reply = fx
            .background
            .handle(RuntimeMessage::OpenPopupWithText { text: "hi".into() }, Some(TabId(3)))
            .await
            .unwrap();
        assert!(reply.is_success());
        assert_eq!(fx.bus.popup_open_count(), 1);

        let stored = fx.local.snapshot().await;
        assert_eq!(stored["pendingText"], json!("hi"));
        assert_eq!(stored["autoEnhance"], json!(true));
        assert_eq!(stored["fromWebsite"], json!(true));
        assert_eq!(stored["sourceTabId"], json!(3));
        assert!(stored["pendingTimestamp"].is_i64());
    }

    #[tokio::test]
    async fn test_open_popup_failure_reported() {
        let fx = fixture(json!({"debugMode": true}), Ok(String::new()));
        fx.bus.set_popup_allowed(false);
        let reply = fx
            .background
            .handle(RuntimeMessage::OpenPopupWithText { text: "hi".into() }, None)
            .await
            .unwrap();
        assert!(!reply.is_success());
        assert!(reply.error().unwrap().contains("Could not open popup"));
    }

    // ===== enhanceText =====

    #[tokio::test]
    async fn test_enhance_uses_stored_key_and_model() {
        let fx = fixture(
            json!({"openaiApiKey": "sk-test-key-0123456789", "openaiModel": "gpt-4o-mini"}),
            Ok("Hello.".to_string()),
        );
        let request = EnhanceRequest::new("hello");
        let reply = fx
            .background
            .handle(RuntimeMessage::EnhanceText { data: request.clone() }, None)
            .await
            .unwrap();
        assert_eq!(reply, MessageResponse::Enhance(EnhanceResponse::success("Hello.")));

        let calls = fx.enhancer.calls.lock();
        assert_eq!(calls[0].0.api_key, "sk-test-key-0123456789");
        assert_eq!(calls[0].0.model, "gpt-4o-mini");
        assert_eq!(calls[0].1, request);
    }

    #[tokio::test]
    async fn test_enhance_defaults_model() {
        let fx = fixture(json!({"openaiApiKey": "sk-test-key-0123456789"}), Ok("x".into()));
        fx.background.enhance_text(&EnhanceRequest::new("x")).await.unwrap();
        assert_eq!(fx.enhancer.calls.lock()[0].0.model, enhancer_config::DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn test_enhance_without_key() {
        let fx = fixture(json!({"openaiApiKey": "   "}), Ok("unused".into()));
        let reply = fx
            .background
            .handle(RuntimeMessage::EnhanceText { data: EnhanceRequest::new("x") }, None)
            .await
            .unwrap();
        assert_eq!(
            reply.error(),
            Some("OpenAI API key not found. Please set it in the extension settings.")
        );
        assert!(fx.enhancer.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_enhance_api_error_prefixed() {
        let fx = fixture(
            json!({"openaiApiKey": "sk-test-key-0123456789"}),
            Err(EnhanceError::Api {
                status: 429,
                message: "Rate limit reached".into(),
            }),
        );
        let reply = fx
            .background
            .handle(RuntimeMessage::EnhanceText { data: EnhanceRequest::new("x") }, None)
            .await
            .unwrap();
        assert_eq!(reply.error(), Some("Failed to enhance text: Rate limit reached"));
    }

    #[tokio::test]
    async fn test_enhance_with_unknown_theme_stored() {
        let fx = fixture(
            json!({"openaiApiKey": "sk-test-key-0123456789", "theme": "auto", "debugMode": "false"}),
            Ok("Done.".to_string()),
        );
        let text = fx.background.enhance_text(&EnhanceRequest::new("x")).await.unwrap();
        assert_eq!(text, "Done.");
        assert_eq!(fx.enhancer.calls.lock()[0].0.api_key, "sk-test-key-0123456789");
    }

    #[tokio::test]
    async fn test_enhance_settings_read_failure() {
        let enhancer = Arc::new(RecordingEnhancer {
            calls: Mutex::new(Vec::new()),
            result: Ok("unused".into()),
        });
        let bus = ExtensionBus::new("ext");
        let background = Background::new(
            Arc::new(UnavailableStore),
            HandoffStore::new(Arc::new(MemoryStore::new(StorageArea::Local)), HandoffConfig::default()),
            Arc::new(bus),
            enhancer.clone(),
        );

        let err = background.enhance_text(&EnhanceRequest::new("x")).await.unwrap_err();
        assert!(matches!(err, EnhanceError::Settings(_)));
        assert!(err.user_message().contains("Could not read settings"));
        assert!(enhancer.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_tab_bound_actions_unanswered() {
        let fx = fixture(json!({}), Ok(String::new()));
        assert!(fx.background.handle(RuntimeMessage::Ping, None).await.is_none());
        assert!(fx
            .background
            .handle(RuntimeMessage::ReplaceText { text: "x".into() }, None)
            .await
            .is_none());
    }
}
