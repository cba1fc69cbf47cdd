//! Settings and tunables validation.

use enhancer_protocols::Selector;
use regex::Regex;

use crate::error::ConfigError;
use crate::schema::{AppConfig, Settings};

const DOMAIN_PATTERN: &str = r"^[a-zA-Z0-9]([a-zA-Z0-9\-\./]*[a-zA-Z0-9/])?$";

pub const MISSING_API_KEY: &str = "Please enter an API key";
pub const INVALID_API_KEY: &str =
    "Invalid API key format. It should start with \"sk-\" and be at least 20 characters long.";

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Validator for settings and runtime tunables.
pub struct SettingsValidator;

impl SettingsValidator {
    /// Validate a full configuration.
    pub fn validate(config: &AppConfig) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_settings(&config.settings, &mut result)?;
        Self::validate_content(config, &mut result);
        Self::validate_retry(config, &mut result);
        Self::validate_popup(config, &mut result);
        Self::validate_openai(config, &mut result);

        Ok(result)
    }

    /// Check an API key the way the options page does before saving.
    pub fn check_api_key(key: &str) -> Result<(), ConfigError> {
        let key = key.trim();
        let message = if key.is_empty() {
            MISSING_API_KEY
        } else if !key.starts_with("sk-") || key.chars().count() < 20 {
            INVALID_API_KEY
        } else {
            return Ok(());
        };
        Err(ConfigError::InvalidApiKey(message.to_string()))
    }

    /// Check a comma-separated block list; returns the accepted entries.
    ///
    /// Entries carrying a protocol or failing the domain pattern are reported
    /// together in a single error.
    pub fn check_blocked_domains(domains: &str) -> Result<Vec<String>, ConfigError> {
        let re = Regex::new(DOMAIN_PATTERN).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        let mut valid = Vec::new();
        let mut errors = Vec::new();

        for domain in domains.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            if domain.contains("://") {
                errors.push(format!("\"{}\" - Remove protocol (http:// or https://)", domain));
            } else if re.is_match(domain) {
                valid.push(domain.to_string());
            } else {
                errors.push(format!("\"{}\" - Invalid domain format", domain));
            }
        }

        if errors.is_empty() {
            Ok(valid)
        } else {
            Err(ConfigError::InvalidBlockList(format!(
                "Invalid domain format: {}",
                errors.join(", ")
            )))
        }
    }

    fn validate_settings(settings: &Settings, result: &mut ValidationResult) -> Result<(), ConfigError> {
        match settings.openai_api_key.as_deref() {
            None => result.add_warning(ValidationWarning::new(
                "settings.openaiApiKey",
                "API key is not set, enhancement will be disabled",
            )),
            Some(key) => {
                if let Err(ConfigError::InvalidApiKey(message)) = Self::check_api_key(key) {
                    result.add_error(ValidationError::new("settings.openaiApiKey", message));
                }
            }
        }

        match Self::check_blocked_domains(&settings.blocked_domains) {
            Ok(_) => {}
            Err(ConfigError::InvalidBlockList(message)) => {
                result.add_error(ValidationError::new("settings.blockedDomains", message));
            }
            Err(other) => return Err(other),
        }

        if settings.openai_model.trim().is_empty() {
            result.add_warning(ValidationWarning::new(
                "settings.openaiModel",
                "Model is empty, the default model will be used",
            ));
        }

        if !settings.enable_content_script {
            result.add_warning(ValidationWarning::new(
                "settings.enableContentScript",
                "Content script is disabled, no inline affordances will be shown",
            ));
        }

        Ok(())
    }

    fn validate_content(config: &AppConfig, result: &mut ValidationResult) {
        let content = &config.content;

        if content.scan_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "content.scan_interval_ms",
                "scan_interval_ms must be greater than 0",
            ));
        }

        if content.max_capture_chars == 0 {
            result.add_error(ValidationError::new(
                "content.max_capture_chars",
                "max_capture_chars must be greater than 0",
            ));
        }

        if let Err(e) = Selector::parse(&content.generic_selectors) {
            result.add_error(ValidationError::new("content.generic_selectors", e.to_string()));
        }

        for (i, platform) in content.platform_selectors.iter().enumerate() {
            if platform.host_contains.trim().is_empty() {
                result.add_error(ValidationError::new(
                    format!("content.platform_selectors[{}].host_contains", i),
                    "host_contains cannot be empty",
                ));
            }
            if let Err(e) = Selector::parse(&platform.selectors) {
                result.add_error(ValidationError::new(
                    format!("content.platform_selectors[{}].selectors", i),
                    e.to_string(),
                ));
            }
        }
    }

    fn validate_retry(config: &AppConfig, result: &mut ValidationResult) {
        if config.retry.max_attempts == 0 {
            result.add_error(ValidationError::new(
                "retry.max_attempts",
                "max_attempts must be at least 1",
            ));
        }

        if config.retry.ping_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "retry.ping_timeout_ms",
                "ping_timeout_ms must be greater than 0",
            ));
        }

        if config.retry.max_attempts > 10 {
            result.add_warning(ValidationWarning::new(
                "retry.max_attempts",
                "max_attempts is very high (>10), replacement may appear to hang",
            ));
        }
    }

    fn validate_popup(config: &AppConfig, result: &mut ValidationResult) {
        if config.popup.max_input_chars == 0 {
            result.add_error(ValidationError::new(
                "popup.max_input_chars",
                "max_input_chars must be greater than 0",
            ));
        }
    }

    fn validate_openai(config: &AppConfig, result: &mut ValidationResult) {
        let openai = &config.openai;

        if !openai.endpoint.starts_with("http://") && !openai.endpoint.starts_with("https://") {
            result.add_error(ValidationError::new(
                "openai.endpoint",
                "endpoint must start with http:// or https://",
            ));
        }

        if !(0.0..=2.0).contains(&openai.temperature) {
            result.add_error(ValidationError::new(
                "openai.temperature",
                "temperature must be between 0 and 2",
            ));
        }

        if openai.timeout_seconds == 0 {
            result.add_error(ValidationError::new(
                "openai.timeout_seconds",
                "timeout_seconds must be greater than 0",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
