//! What the popup currently shows.

use enhancer_config::Theme;
use enhancer_protocols::{MessageKind, TabId, Tone};
use serde::Serialize;
use tokio::time::Instant;

/// A transient message; hidden once `expires_at` passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Notice {
    pub message: String,
    pub expires_at: Instant,
}

impl Notice {
    pub fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PopupState {
    pub input: String,
    pub output: String,
    pub tone: Tone,
    pub kind: MessageKind,
    pub translate: bool,
    pub loading: bool,
    pub has_api_key: bool,
    pub theme: Theme,
    pub notice: Option<Notice>,
    pub copied_until: Option<Instant>,
    pub source_tab: Option<TabId>,
    pub from_website: bool,
}

impl Default for PopupState {
    fn default() -> Self {
        Self {
            input: String::new(),
            output: String::new(),
            tone: Tone::default(),
            kind: MessageKind::default(),
            translate: false,
            loading: false,
            has_api_key: false,
            theme: Theme::System,
            notice: None,
            copied_until: None,
            source_tab: None,
            from_website: false,
        }
    }
}

impl PopupState {
    pub fn view(&self, now: Instant) -> PopupView {
        PopupView {
            input: self.input.clone(),
            output: self.output.clone(),
            char_count: self.input.chars().count(),
            tone: self.tone,
            kind: self.kind,
            translate: self.translate,
            loading: self.loading,
            enhance_enabled: self.has_api_key && !self.loading,
            copy_enabled: !self.output.is_empty(),
            has_api_key: self.has_api_key,
            theme: self.theme,
            notice: self
                .notice
                .as_ref()
                .filter(|n| n.is_live(now))
                .map(|n| n.message.clone()),
            copied: self.copied_until.is_some_and(|until| now < until),
            source_tab: self.source_tab,
            from_website: self.from_website,
        }
    }
}

/// Snapshot of the popup for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupView {
    pub input: String,
    pub output: String,
    pub char_count: usize,
    pub tone: Tone,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub translate: bool,
    pub loading: bool,
    pub enhance_enabled: bool,
    pub copy_enabled: bool,
    pub has_api_key: bool,
    pub theme: Theme,
    pub notice: Option<String>,
    /// The copy action shows its "copied" state.
    pub copied: bool,
    pub source_tab: Option<TabId>,
    pub from_website: bool,
}
