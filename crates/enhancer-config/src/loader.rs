//! Configuration loader.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::ConfigError;
use crate::schema::AppConfig;

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<AppConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<AppConfig, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let mut config: AppConfig = toml::from_str(&expanded)?;
        if let Some(dir) = config.logging.dir.take() {
            config.logging.dir = Some(PathBuf::from(Self::expand_path(&dir.to_string_lossy())));
        }
        Ok(config)
    }

    /// Load from `path`, or from the default location when it exists, or fall
    /// back to built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(AppConfig::default()),
        }
    }

    /// `<config dir>/message-enhancer/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("message-enhancer").join("config.toml"))
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        let mut result = content.to_string();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value =
                std::env::var(var_name).map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.config`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Theme;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.content.scan_interval_ms, 2_000);
        assert!(config.settings.enable_content_script);
    }

    #[test]
    fn test_load_settings_section() {
        let content = r#"
            [settings]
            blockedDomains = "example.com"
            theme = "light"
            debugMode = true
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.settings.blocked_domains, "example.com");
        assert_eq!(config.settings.theme, Theme::Light);
        assert!(config.settings.debug_mode);
        assert!(config.settings.keep_text_on_close);
    }

    #[test]
    fn test_load_tunables() {
        let content = r#"
            [content]
            hide_delay_ms = 5000

            [[content.platform_selectors]]
            host_contains = "discord.com"
            selectors = "[role=\"textbox\"]"

            [retry]
            max_attempts = 5

            [openai]
            timeout_seconds = 10
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.content.hide_delay_ms, 5_000);
        assert_eq!(config.content.scan_interval_ms, 2_000);
        assert_eq!(config.content.platform_selectors.len(), 1);
        assert_eq!(config.content.platform_selectors[0].host_contains, "discord.com");
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.backoff_step_ms, 500);
        assert_eq!(config.openai.timeout_seconds, 10);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[popup]").unwrap();
        writeln!(file, "max_input_chars = 200").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.popup.max_input_chars, 200);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/config.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_or_default_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[handoff]").unwrap();
        writeln!(file, "freshness_ms = 1").unwrap();
        let config = ConfigLoader::load_or_default(Some(file.path())).unwrap();
        assert_eq!(config.handoff.freshness_ms, 1);
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: This test runs in isolation and sets a unique test-only env var
        unsafe {
            std::env::set_var("ENHANCER_TEST_API_KEY", "sk-from-environment-123");
        }
        let content = "[settings]\nopenaiApiKey = \"${ENHANCER_TEST_API_KEY}\"";
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.settings.api_key(), Some("sk-from-environment-123"));
        unsafe {
            std::env::remove_var("ENHANCER_TEST_API_KEY");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value = \"${NONEXISTENT_ENHANCER_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_expand_env_vars_no_vars() {
        let content = "value = \"no variables here\"";
        let expanded = ConfigLoader::expand_env_vars(content).unwrap();
        assert_eq!(expanded, content);
    }

    #[test]
    fn test_logging_dir_tilde_expanded() {
        let config = ConfigLoader::load_str("[logging]\ndir = \"~/logs\"").unwrap();
        let dir = config.logging.dir.unwrap();
        assert!(!dir.to_string_lossy().starts_with('~'));
        assert!(dir.ends_with("logs"));
    }

    #[test]
    fn test_expand_path_no_tilde() {
        let path = "/usr/local/bin";
        assert_eq!(ConfigLoader::expand_path(path), path);
    }
}
