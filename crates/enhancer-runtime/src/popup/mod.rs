//! The enhancer popup.
//!
//! [`PopupController`] holds the popup's view model and implements its
//! actions: enhance, copy, clean, draft persistence and sending the result
//! back into the page it came from.

mod replace;
mod view;

use std::sync::{Arc, Weak};

use enhancer_config::{keys, HandoffConfig, PopupConfig, ReplaceRetryConfig, Settings, Theme};
use enhancer_protocols::{
    Clipboard, EnhanceRequest, EnhanceResponse, ExtensionRuntime, KeyValueStore, MessageKind, MessageResponse,
    RuntimeMessage, StorageArea, StorageChange, StorageMap, TabMessenger, Tone,
};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{PopupError, RuntimeError};
use crate::handoff::HandoffStore;

pub use replace::{ReplaceOutcome, CLIPBOARD_FALLBACK_NOTICE};
pub use view::PopupView;
use view::{Notice, PopupState};

/// Host capabilities the popup runs against.
#[derive(Clone)]
pub struct PopupHost {
    /// Channel to the background context.
    pub runtime: Arc<dyn ExtensionRuntime>,
    pub tabs: Arc<dyn TabMessenger>,
    pub clipboard: Arc<dyn Clipboard>,
    /// Synced settings and drafts.
    pub settings: Arc<dyn KeyValueStore>,
    /// Device-local area holding the handoff.
    pub local: Arc<dyn KeyValueStore>,
}

pub struct PopupController {
    host: PopupHost,
    config: PopupConfig,
    retry: ReplaceRetryConfig,
    state: Mutex<PopupState>,
    draft_timer: Mutex<Option<JoinHandle<()>>>,
}

impl PopupController {
    /// Open the popup.
    ///
    /// Loads theme, key status and drafts, then consumes a pending handoff.
    /// A fresh handoff replaces the draft input and, when it asks for it and
    /// a key is set, starts an enhancement right away.
    pub async fn open(
        host: PopupHost,
        config: PopupConfig,
        retry: ReplaceRetryConfig,
        handoff: HandoffConfig,
    ) -> Result<Arc<Self>, RuntimeError> {
        let mut wanted: Vec<&str> = keys::SETTINGS_KEYS.to_vec();
        wanted.extend_from_slice(keys::DRAFT_KEYS);
        let stored = host.settings.get(&wanted).await?;
        let settings = Settings::from_map(&stored);

        let mut state = PopupState {
            theme: settings.theme,
            translate: settings.translate_enabled,
            has_api_key: settings.api_key().is_some(),
            ..Default::default()
        };

        if settings.keep_text_on_close {
            let draft = |key: &str| stored.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
            state.input = cap_chars(&draft(keys::PERSISTED_INPUT_TEXT), config.max_input_chars);
            state.output = draft(keys::PERSISTED_OUTPUT_TEXT);
        }

        let pending = HandoffStore::new(host.local.clone(), handoff).take().await?;
        let auto_enhance = match pending {
            Some(handoff) => {
                debug!(tab = ?handoff.source_tab, "Popup opened from page");
                state.input = handoff.text;
                state.source_tab = handoff.source_tab;
                state.from_website = handoff.from_website;
                handoff.auto_enhance
            }
            None => false,
        };

        let controller = Arc::new(Self {
            host,
            config,
            retry,
            state: Mutex::new(state),
            draft_timer: Mutex::new(None),
        });

        if settings.api_key().is_none() {
            controller.notify(PopupError::MissingApiKey.to_string());
        } else if auto_enhance {
            // Failures already surface as a notice.
            let _ = controller.enhance().await;
        }

        Ok(controller)
    }

    pub fn view(&self) -> PopupView {
        self.state.lock().view(Instant::now())
    }

    /// Current notice, if it has not expired.
    pub fn notice(&self) -> Option<String> {
        self.view().notice
    }

    fn notify(&self, message: String) {
        let expires_at = Instant::now() + self.config.notice_lifetime();
        self.state.lock().notice = Some(Notice { message, expires_at });
    }

    fn fail(&self, error: PopupError) -> PopupError {
        self.notify(error.to_string());
        error
    }

    // ---- inputs ----------------------------------------------------------

    /// Replace the input text, capped to the configured length, and schedule
    /// a draft save.
    pub fn set_input(self: &Arc<Self>, text: &str) {
        self.state.lock().input = cap_chars(text, self.config.max_input_chars);
        self.schedule_draft_save();
    }

    pub fn set_tone(&self, tone: Tone) {
        self.state.lock().tone = tone;
    }

    pub fn set_kind(&self, kind: MessageKind) {
        self.state.lock().kind = kind;
    }

    pub fn set_translate(&self, translate: bool) {
        self.state.lock().translate = translate;
    }

    // ---- actions ---------------------------------------------------------

    /// Enhance the input through the background.
    ///
    /// On success the trimmed result becomes the output and drafts are saved.
    /// Every failure is also posted as a notice.
    pub async fn enhance(&self) -> Result<String, PopupError> {
        let request = {
            let mut state = self.state.lock();
            let text = state.input.trim().to_string();
            if text.is_empty() {
                drop(state);
                return Err(self.fail(PopupError::EmptyInput));
            }
            if !state.has_api_key {
                drop(state);
                return Err(self.fail(PopupError::MissingApiKey));
            }
            if state.loading {
                return Err(PopupError::Busy);
            }
            state.loading = true;
            EnhanceRequest::new(text)
                .with_tone(state.tone)
                .with_kind(state.kind)
                .with_translate(state.translate)
        };

        info!(tone = %request.tone, kind = %request.kind, translate = request.translate, "Enhancing");
        let reply = self
            .host
            .runtime
            .send_message(RuntimeMessage::EnhanceText { data: request })
            .await;

        let outcome = match reply {
            Ok(MessageResponse::Enhance(EnhanceResponse::Success { enhanced_text, .. })) => {
                Ok(enhanced_text.trim().to_string())
            }
            Ok(other) => Err(PopupError::Enhance(
                other.error().unwrap_or("Unexpected response from background").to_string(),
            )),
            Err(e) => Err(PopupError::Message(e)),
        };

        {
            let mut state = self.state.lock();
            state.loading = false;
            if let Ok(text) = &outcome {
                state.output = text.clone();
            }
        }

        match outcome {
            Ok(text) => {
                self.save_drafts().await;
                Ok(text)
            }
            Err(e) => {
                warn!(error = %e, "Enhancement failed");
                Err(self.fail(e))
            }
        }
    }

    /// Copy the output to the clipboard. A no-op while there is no output.
    pub async fn copy(&self) -> Result<(), PopupError> {
        let text = self.state.lock().output.clone();
        if text.is_empty() {
            return Ok(());
        }
        match self.host.clipboard.write_text(&text).await {
            Ok(()) => {
                self.state.lock().copied_until = Some(Instant::now() + self.config.copied_lifetime());
                Ok(())
            }
            Err(e) => {
                debug!(error = %e, "Clipboard write failed");
                Err(self.fail(PopupError::Clipboard))
            }
        }
    }

    /// Clear input and output.
    pub fn clean(self: &Arc<Self>) {
        {
            let mut state = self.state.lock();
            state.input.clear();
            state.output.clear();
        }
        self.schedule_draft_save();
    }

    // ---- drafts ----------------------------------------------------------

    fn schedule_draft_save(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let delay = self.config.draft_debounce();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(popup) = weak.upgrade() {
                popup.save_drafts().await;
            }
        });
        if let Some(previous) = self.draft_timer.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Persist input and output unless the user turned draft keeping off.
    async fn save_drafts(&self) {
        let keep = match self.host.settings.get(&[keys::KEEP_TEXT_ON_CLOSE]).await {
            Ok(map) => map.get(keys::KEEP_TEXT_ON_CLOSE) != Some(&Value::Bool(false)),
            Err(e) => {
                warn!(error = %e, "Failed to read draft setting");
                return;
            }
        };
        if !keep {
            return;
        }

        let (input, output) = {
            let state = self.state.lock();
            (state.input.clone(), state.output.clone())
        };
        let mut drafts = StorageMap::new();
        drafts.insert(keys::PERSISTED_INPUT_TEXT.into(), Value::String(input));
        drafts.insert(keys::PERSISTED_OUTPUT_TEXT.into(), Value::String(output));
        if let Err(e) = self.host.settings.set(drafts).await {
            warn!(error = %e, "Failed to save drafts");
        }
    }

    // ---- settings --------------------------------------------------------

    pub async fn apply_storage_change(&self, change: &StorageChange) {
        if change.area != StorageArea::Sync {
            return;
        }

        if let Some(c) = change.get(keys::THEME) {
            let theme = c
                .new_value
                .clone()
                .and_then(|v| serde_json::from_value::<Theme>(v).ok())
                .unwrap_or_default();
            self.state.lock().theme = theme;
        }

        if change.touches(keys::OPENAI_API_KEY) {
            self.recheck_api_key().await;
        }

        if let Some(c) = change.get(keys::KEEP_TEXT_ON_CLOSE) {
            if c.new_value.as_ref().and_then(Value::as_bool) != Some(true) {
                let mut state = self.state.lock();
                state.input.clear();
                state.output.clear();
            }
        }
    }

    async fn recheck_api_key(&self) {
        let has_key = match self.host.settings.get(&[keys::OPENAI_API_KEY]).await {
            Ok(map) => map
                .get(keys::OPENAI_API_KEY)
                .and_then(Value::as_str)
                .is_some_and(|k| !k.trim().is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read API key");
                false
            }
        };
        self.state.lock().has_api_key = has_key;
        if !has_key {
            self.notify(PopupError::MissingApiKey.to_string());
        }
    }

    /// Follow settings changes until the store goes away.
    pub async fn run(self: Arc<Self>) {
        let mut changes = self.host.settings.subscribe();
        loop {
            match changes.recv().await {
                Ok(change) => self.apply_storage_change(&change).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Settings change stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

impl Drop for PopupController {
    fn drop(&mut self) {
        if let Some(timer) = self.draft_timer.lock().take() {
            timer.abort();
        }
    }
}

fn cap_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
#[path = "popup_tests.rs"]
mod tests;
