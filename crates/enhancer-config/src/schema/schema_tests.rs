use super::*;
use crate::keys;
use enhancer_protocols::StorageMap;
use serde_json::json;

#[test]
fn test_settings_defaults() {
    let settings = Settings::default();
    assert!(settings.enable_content_script);
    assert!(settings.keep_text_on_close);
    assert!(!settings.debug_mode);
    assert!(!settings.translate_enabled);
    assert_eq!(settings.theme, Theme::System);
    assert_eq!(settings.openai_model, DEFAULT_MODEL);
    assert!(settings.api_key().is_none());
}

#[test]
fn test_settings_from_empty_map_uses_defaults() {
    let settings = Settings::from_map(&StorageMap::new());
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_settings_from_map_reads_storage_keys() {
    let mut map = StorageMap::new();
    map.insert(keys::ENABLE_CONTENT_SCRIPT.into(), json!(false));
    map.insert(keys::BLOCKED_DOMAINS.into(), json!("example.com, foo.org/path"));
    map.insert(keys::OPENAI_API_KEY.into(), json!("sk-abcdefghijklmnopqrstu"));
    map.insert(keys::THEME.into(), json!("dark"));
    map.insert(keys::PERSISTED_INPUT_TEXT.into(), json!("draft"));
    map.insert(keys::DEBUG_MODE.into(), serde_json::Value::Null);

    let settings = Settings::from_map(&map);
    assert!(!settings.enable_content_script);
    assert_eq!(settings.blocked_domains, "example.com, foo.org/path");
    assert_eq!(settings.api_key(), Some("sk-abcdefghijklmnopqrstu"));
    assert_eq!(settings.theme, Theme::Dark);
    assert!(!settings.debug_mode);
}

#[test]
fn test_settings_from_map_unknown_theme_falls_back() {
    let mut map = StorageMap::new();
    map.insert(keys::THEME.into(), json!("auto"));
    map.insert(keys::OPENAI_API_KEY.into(), json!("sk-abcdefghijklmnopqrstu"));

    let settings = Settings::from_map(&map);
    assert_eq!(settings.theme, Theme::System);
    assert_eq!(settings.api_key(), Some("sk-abcdefghijklmnopqrstu"));
}

#[test]
fn test_settings_from_map_bad_field_keeps_the_rest() {
    let mut map = StorageMap::new();
    map.insert(keys::DEBUG_MODE.into(), json!("false"));
    map.insert(keys::KEEP_TEXT_ON_CLOSE.into(), json!(false));
    map.insert(keys::BLOCKED_DOMAINS.into(), json!(["example.com"]));
    map.insert(keys::OPENAI_MODEL.into(), json!("gpt-4o-mini"));

    let settings = Settings::from_map(&map);
    assert!(!settings.debug_mode);
    assert!(!settings.keep_text_on_close);
    assert_eq!(settings.blocked_domains, "");
    assert_eq!(settings.openai_model, "gpt-4o-mini");
}

#[test]
fn test_settings_to_map_uses_camel_case() {
    let map = Settings::default().to_map();
    assert_eq!(map.get(keys::ENABLE_CONTENT_SCRIPT), Some(&json!(true)));
    assert_eq!(map.get(keys::OPENAI_MODEL), Some(&json!(DEFAULT_MODEL)));
    assert!(!map.contains_key(keys::OPENAI_API_KEY));
}

#[test]
fn test_blank_api_key_is_missing() {
    let settings = Settings {
        openai_api_key: Some("   ".to_string()),
        ..Settings::default()
    };
    assert!(settings.api_key().is_none());
}

#[test]
fn test_theme_resolve() {
    assert_eq!(Theme::System.resolve(true), Theme::Dark);
    assert_eq!(Theme::System.resolve(false), Theme::Light);
    assert_eq!(Theme::Light.resolve(true), Theme::Light);
}

#[test]
fn test_tunable_defaults() {
    let config = AppConfig::default();
    assert_eq!(config.content.scan_interval_ms, 2_000);
    assert_eq!(config.content.hide_delay_ms, 10_000);
    assert_eq!(config.content.settle_delay_ms, 1_000);
    assert_eq!(config.content.max_capture_chars, 10_000);
    assert_eq!(config.content.platform_selectors.len(), 3);
    assert_eq!(config.retry.max_attempts, 3);
    assert_eq!(config.retry.ping_timeout_ms, 2_000);
    assert_eq!(config.handoff.freshness_ms, 10_000);
    assert_eq!(config.popup.max_input_chars, 1_000);
    assert_eq!(config.popup.draft_debounce_ms, 500);
    assert_eq!(config.popup.notice_ms, 3_000);
    assert_eq!(config.openai.max_completion_tokens, 1_000);
    assert_eq!(config.openai.timeout_seconds, 30);
}

#[test]
fn test_linear_backoff() {
    let retry = ReplaceRetryConfig::default();
    assert_eq!(retry.backoff_after(1).as_millis(), 500);
    assert_eq!(retry.backoff_after(2).as_millis(), 1_000);
}
