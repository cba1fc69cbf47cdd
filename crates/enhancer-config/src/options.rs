//! Options page save flow.

use enhancer_protocols::StorageMap;
use serde_json::Value;

use crate::error::ConfigError;
use crate::keys;
use crate::schema::{Settings, Theme};
use crate::validator::SettingsValidator;

/// Values entered on the options page.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsForm {
    pub api_key: String,
    pub model: String,
    pub theme: Theme,
    pub keep_text_on_close: bool,
    pub enable_content_script: bool,
    pub debug_mode: bool,
    pub blocked_domains: String,
}

impl SettingsForm {
    /// Pre-fill the form from stored settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            api_key: settings.openai_api_key.clone().unwrap_or_default(),
            model: settings.model().to_string(),
            theme: settings.theme,
            keep_text_on_close: settings.keep_text_on_close,
            enable_content_script: settings.enable_content_script,
            debug_mode: settings.debug_mode,
            blocked_domains: settings.blocked_domains.clone(),
        }
    }

    /// Validate and build the store write.
    ///
    /// Turning `keep_text_on_close` off also clears both persisted drafts.
    pub fn into_storage(self) -> Result<StorageMap, ConfigError> {
        let api_key = self.api_key.trim().to_string();
        SettingsValidator::check_api_key(&api_key)?;

        let blocked = self.blocked_domains.trim().to_string();
        SettingsValidator::check_blocked_domains(&blocked)?;

        let mut map = StorageMap::new();
        map.insert(keys::OPENAI_API_KEY.into(), Value::String(api_key));
        map.insert(keys::OPENAI_MODEL.into(), Value::String(self.model));
        map.insert(keys::THEME.into(), Value::String(self.theme.as_str().to_string()));
        map.insert(keys::KEEP_TEXT_ON_CLOSE.into(), Value::Bool(self.keep_text_on_close));
        map.insert(keys::ENABLE_CONTENT_SCRIPT.into(), Value::Bool(self.enable_content_script));
        map.insert(keys::DEBUG_MODE.into(), Value::Bool(self.debug_mode));
        map.insert(keys::BLOCKED_DOMAINS.into(), Value::String(blocked));

        if !self.keep_text_on_close {
            for key in keys::DRAFT_KEYS {
                map.insert((*key).into(), Value::String(String::new()));
            }
        }

        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form() -> SettingsForm {
        SettingsForm {
            api_key: "  sk-abcdefghijklmnopqrstuvwxyz  ".to_string(),
            ..SettingsForm::from_settings(&Settings::default())
        }
    }

    #[test]
    fn test_from_default_settings() {
        let form = SettingsForm::from_settings(&Settings::default());
        assert_eq!(form.model, "gpt-5-nano-2025-08-07");
        assert_eq!(form.theme, Theme::System);
        assert!(form.keep_text_on_close);
        assert!(form.enable_content_script);
        assert!(form.api_key.is_empty());
    }

    #[test]
    fn test_save_trims_key_and_keeps_drafts() {
        let map = form().into_storage().unwrap();
        assert_eq!(map.get(keys::OPENAI_API_KEY), Some(&json!("sk-abcdefghijklmnopqrstuvwxyz")));
        assert_eq!(map.get(keys::THEME), Some(&json!("system")));
        assert!(!map.contains_key(keys::PERSISTED_INPUT_TEXT));

        let saved = Settings::from_map(&map);
        assert!(saved.enable_content_script);
    }

    #[test]
    fn test_save_clears_drafts_when_not_keeping_text() {
        let mut form = form();
        form.keep_text_on_close = false;
        let map = form.into_storage().unwrap();
        assert_eq!(map.get(keys::PERSISTED_INPUT_TEXT), Some(&json!("")));
        assert_eq!(map.get(keys::PERSISTED_OUTPUT_TEXT), Some(&json!("")));
    }

    #[test]
    fn test_save_rejects_missing_key() {
        let mut form = form();
        form.api_key = String::new();
        assert!(form.into_storage().is_err());
    }

    #[test]
    fn test_save_rejects_bad_domains() {
        let mut form = form();
        form.blocked_domains = "http://example.com".to_string();
        let err = form.into_storage().unwrap_err();
        assert!(err.to_string().contains("Remove protocol"));
    }
}
