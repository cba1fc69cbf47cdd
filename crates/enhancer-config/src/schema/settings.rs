//! User settings as stored in the synced key-value area.

use enhancer_protocols::StorageMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use tracing::warn;

use super::default_true;
use crate::keys;

pub const DEFAULT_MODEL: &str = "gpt-5-nano-2025-08-07";

/// Colour scheme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

impl Theme {
    /// Resolve `System` against the platform preference.
    pub fn resolve(self, prefers_dark: bool) -> Theme {
        match self {
            Theme::System if prefers_dark => Theme::Dark,
            Theme::System => Theme::Light,
            other => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::System => "system",
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

/// Synced settings. Field names are the storage keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_true")]
    pub enable_content_script: bool,

    /// Comma-separated block list, as typed by the user.
    #[serde(default)]
    pub blocked_domains: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,

    #[serde(default = "default_model")]
    pub openai_model: String,

    #[serde(default)]
    pub theme: Theme,

    #[serde(default = "default_true")]
    pub keep_text_on_close: bool,

    #[serde(default)]
    pub debug_mode: bool,

    #[serde(default)]
    pub translate_enabled: bool,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable_content_script: true,
            blocked_domains: String::new(),
            openai_api_key: None,
            openai_model: default_model(),
            theme: Theme::default(),
            keep_text_on_close: true,
            debug_mode: false,
            translate_enabled: false,
        }
    }
}

impl Settings {
    /// Decode settings from a store snapshot; absent keys take their defaults.
    ///
    /// Keys that are not settings (drafts, handoff fields) are ignored. A
    /// `null` value is treated as absent, and a value that does not decode
    /// leaves that one field at its default.
    pub fn from_map(map: &StorageMap) -> Self {
        let mut accepted = Settings::default().to_map();
        for key in keys::SETTINGS_KEYS {
            let Some(value) = map.get(*key).filter(|v| !v.is_null()) else {
                continue;
            };
            let mut candidate = accepted.clone();
            candidate.insert(key.to_string(), value.clone());
            match serde_json::from_value::<Settings>(Value::Object(candidate.clone())) {
                Ok(_) => accepted = candidate,
                Err(e) => warn!(key = *key, value = %value, error = %e, "Ignoring stored setting"),
            }
        }
        serde_json::from_value(Value::Object(accepted)).unwrap_or_default()
    }

    /// Encode as a store write.
    pub fn to_map(&self) -> StorageMap {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => StorageMap::new(),
        }
    }

    /// The API key, if one is set and non-empty.
    pub fn api_key(&self) -> Option<&str> {
        self.openai_api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    /// The model, falling back to the default when blank.
    pub fn model(&self) -> &str {
        if self.openai_model.trim().is_empty() {
            DEFAULT_MODEL
        } else {
            &self.openai_model
        }
    }
}
