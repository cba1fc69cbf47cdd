//! Loading a settings file and validating it end to end.

use std::io::Write;

use enhancer_config::{ConfigLoader, Settings, SettingsValidator};
use tempfile::NamedTempFile;

#[test]
fn test_file_round_trips_into_store_settings() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[settings]
openaiApiKey = "sk-integration-key-000000"
blockedDomains = "example.com, intranet.corp/wiki"
translateEnabled = true

[content]
hide_delay_ms = 4000
"#
    )
    .unwrap();

    let config = ConfigLoader::load(file.path()).unwrap();
    let result = SettingsValidator::validate(&config).unwrap();
    assert!(result.is_valid(), "{:?}", result.errors);

    let stored = config.settings.to_map();
    let decoded = Settings::from_map(&stored);
    assert_eq!(decoded, config.settings);
    assert!(decoded.translate_enabled);
    assert_eq!(config.content.hide_delay().as_millis(), 4_000);
}

#[test]
fn test_invalid_domains_surface_as_errors() {
    let config = ConfigLoader::load_str("[settings]\nblockedDomains = \"https://bad.com\"").unwrap();
    let result = SettingsValidator::validate(&config).unwrap();
    assert!(!result.is_valid());
    assert_eq!(result.errors[0].path, "settings.blockedDomains");
}
