//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

mod settings;
mod tunables;

pub use settings::*;
pub use tunables::*;

/// Shared default helper used by submodules.
pub(crate) fn default_true() -> bool {
    true
}

/// Root configuration for a headless run.
///
/// `settings` seeds the synced store; the remaining sections are runtime
/// tunables that never live in storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub settings: Settings,

    #[serde(default)]
    pub content: ContentConfig,

    #[serde(default)]
    pub retry: ReplaceRetryConfig,

    #[serde(default)]
    pub handoff: HandoffConfig,

    #[serde(default)]
    pub popup: PopupConfig,

    #[serde(default)]
    pub openai: OpenAIConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
