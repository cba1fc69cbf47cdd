use super::*;
use crate::schema::PlatformSelectors;

const GOOD_KEY: &str = "sk-abcdefghijklmnopqrstuvwxyz";

fn config_with_key() -> AppConfig {
    let mut config = AppConfig::default();
    config.settings.openai_api_key = Some(GOOD_KEY.to_string());
    config
}

#[test]
fn test_validate_default_config() {
    let result = SettingsValidator::validate(&AppConfig::default()).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "settings.openaiApiKey"));
}

#[test]
fn test_validate_good_key() {
    let result = SettingsValidator::validate(&config_with_key()).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_api_key_rules() {
    assert!(SettingsValidator::check_api_key(GOOD_KEY).is_ok());

    let missing = SettingsValidator::check_api_key("  ").unwrap_err();
    assert!(missing.to_string().contains(MISSING_API_KEY));

    let no_prefix = SettingsValidator::check_api_key("pk-abcdefghijklmnopqrstuvwxyz").unwrap_err();
    assert!(no_prefix.to_string().contains("start with \"sk-\""));

    assert!(SettingsValidator::check_api_key("sk-short").is_err());
    // exactly 20 characters is accepted
    assert!(SettingsValidator::check_api_key("sk-12345678901234567").is_ok());
}

#[test]
fn test_validate_bad_key_is_error() {
    let mut config = AppConfig::default();
    config.settings.openai_api_key = Some("nope".to_string());
    let result = SettingsValidator::validate(&config).unwrap();
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| e.path == "settings.openaiApiKey"));
}

#[test]
fn test_blocked_domains_accepts_hosts_and_paths() {
    let domains = SettingsValidator::check_blocked_domains(" example.com, , mail.google.com/mail/ ,a").unwrap();
    assert_eq!(domains, vec!["example.com", "mail.google.com/mail/", "a"]);
    assert!(SettingsValidator::check_blocked_domains("").unwrap().is_empty());
}

#[test]
fn test_blocked_domains_rejects_protocol() {
    let err = SettingsValidator::check_blocked_domains("https://example.com").unwrap_err();
    let text = err.to_string();
    assert!(text.contains("\"https://example.com\" - Remove protocol (http:// or https://)"));
}

#[test]
fn test_blocked_domains_reports_every_bad_entry() {
    let err = SettingsValidator::check_blocked_domains("-bad.com, good.com, bad_underscore.com").unwrap_err();
    match err {
        ConfigError::InvalidBlockList(message) => {
            assert!(message.starts_with("Invalid domain format: "));
            assert!(message.contains("\"-bad.com\" - Invalid domain format"));
            assert!(message.contains("\"bad_underscore.com\" - Invalid domain format"));
            assert!(!message.contains("good.com\""));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_validate_bad_selectors() {
    let mut config = config_with_key();
    config.content.generic_selectors = r#"textarea, input[type="#.to_string();
    config.content.platform_selectors.push(PlatformSelectors::new("", ".x"));

    let result = SettingsValidator::validate(&config).unwrap();
    assert!(result.errors.iter().any(|e| e.path == "content.generic_selectors"));
    assert!(
        result
            .errors
            .iter()
            .any(|e| e.path == "content.platform_selectors[3].host_contains")
    );
}

#[test]
fn test_validate_accepts_combinators_and_quoted_commas() {
    let mut config = config_with_key();
    config.content.generic_selectors = r#"form textarea, div > [aria-label="Reply, Message"]"#.to_string();

    let result = SettingsValidator::validate(&config).unwrap();
    assert!(
        !result.errors.iter().any(|e| e.path == "content.generic_selectors"),
        "{:?}",
        result.errors
    );
}

#[test]
fn test_validate_zero_attempts() {
    let mut config = config_with_key();
    config.retry.max_attempts = 0;
    let result = SettingsValidator::validate(&config).unwrap();
    assert!(result.errors.iter().any(|e| e.path == "retry.max_attempts"));
}

#[test]
fn test_validate_high_attempts_warning() {
    let mut config = config_with_key();
    config.retry.max_attempts = 50;
    let result = SettingsValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "retry.max_attempts"));
}

#[test]
fn test_validate_openai_section() {
    let mut config = config_with_key();
    config.openai.endpoint = "api.openai.com".to_string();
    config.openai.temperature = 3.5;
    config.openai.timeout_seconds = 0;
    let result = SettingsValidator::validate(&config).unwrap();
    assert_eq!(result.errors.len(), 3);
}

#[test]
fn test_validate_disabled_script_warning() {
    let mut config = config_with_key();
    config.settings.enable_content_script = false;
    let result = SettingsValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "settings.enableContentScript"));
}
