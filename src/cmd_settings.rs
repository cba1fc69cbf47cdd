//! Configuration validation command.

use enhancer_config::{AppConfig, SettingsValidator};
use tracing::debug;

pub(crate) fn handle_validate(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let result = SettingsValidator::validate(config)?;
    debug!(errors = result.errors.len(), warnings = result.warnings.len(), "Validated configuration");

    for warning in &result.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        println!("error: {}: {}", error.path, error.message);
    }

    if result.is_valid() {
        println!("Configuration is valid");
        Ok(())
    } else {
        Err(format!("{} validation error(s)", result.errors.len()).into())
    }
}
