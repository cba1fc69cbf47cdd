//! Runtime tunables.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Content-script timing, limits and candidate selectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentConfig {
    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,

    #[serde(default = "default_hide_delay_ms")]
    pub hide_delay_ms: u64,

    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    #[serde(default = "default_click_feedback_ms")]
    pub click_feedback_ms: u64,

    #[serde(default = "default_max_capture_chars")]
    pub max_capture_chars: usize,

    #[serde(default = "default_generic_selectors")]
    pub generic_selectors: String,

    #[serde(default = "default_platform_selectors")]
    pub platform_selectors: Vec<PlatformSelectors>,
}

/// Extra selectors for hosts whose name contains `host_contains`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformSelectors {
    pub host_contains: String,
    pub selectors: String,
}

impl PlatformSelectors {
    pub fn new(host_contains: impl Into<String>, selectors: impl Into<String>) -> Self {
        Self {
            host_contains: host_contains.into(),
            selectors: selectors.into(),
        }
    }
}

fn default_scan_interval_ms() -> u64 {
    2_000
}

fn default_hide_delay_ms() -> u64 {
    10_000
}

fn default_settle_delay_ms() -> u64 {
    1_000
}

fn default_click_feedback_ms() -> u64 {
    150
}

fn default_max_capture_chars() -> usize {
    10_000
}

fn default_generic_selectors() -> String {
    r#"textarea, input[type="text"], input[type="email"], input:not([type]), [contenteditable="true"]"#.to_string()
}

fn default_platform_selectors() -> Vec<PlatformSelectors> {
    vec![
        PlatformSelectors::new(
            "teams.microsoft.com",
            r#"[role="textbox"][contenteditable="true"], .ck-content"#,
        ),
        PlatformSelectors::new("slack.com", r#".ql-editor, [data-qa="message_input"]"#),
        PlatformSelectors::new(
            "gmail.com",
            r#"[contenteditable="true"][role="textbox"], .Am.Al.editable"#,
        ),
    ]
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            scan_interval_ms: default_scan_interval_ms(),
            hide_delay_ms: default_hide_delay_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            click_feedback_ms: default_click_feedback_ms(),
            max_capture_chars: default_max_capture_chars(),
            generic_selectors: default_generic_selectors(),
            platform_selectors: default_platform_selectors(),
        }
    }
}

impl ContentConfig {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }

    pub fn hide_delay(&self) -> Duration {
        Duration::from_millis(self.hide_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn click_feedback(&self) -> Duration {
        Duration::from_millis(self.click_feedback_ms)
    }
}

/// Retry policy for `replaceText`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaceRetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff before attempt `n + 1` is `n * backoff_step_ms`.
    #[serde(default = "default_backoff_step_ms")]
    pub backoff_step_ms: u64,

    #[serde(default = "default_ping_timeout_ms")]
    pub ping_timeout_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_step_ms() -> u64 {
    500
}

fn default_ping_timeout_ms() -> u64 {
    2_000
}

impl Default for ReplaceRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_step_ms: default_backoff_step_ms(),
            ping_timeout_ms: default_ping_timeout_ms(),
        }
    }
}

impl ReplaceRetryConfig {
    /// Delay after failed attempt number `attempt` (1-based).
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_step_ms.saturating_mul(attempt as u64))
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }
}

/// Popup handoff freshness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandoffConfig {
    #[serde(default = "default_freshness_ms")]
    pub freshness_ms: u64,
}

fn default_freshness_ms() -> u64 {
    10_000
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            freshness_ms: default_freshness_ms(),
        }
    }
}

/// Popup limits and timings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupConfig {
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    #[serde(default = "default_draft_debounce_ms")]
    pub draft_debounce_ms: u64,

    #[serde(default = "default_notice_ms")]
    pub notice_ms: u64,

    #[serde(default = "default_copied_ms")]
    pub copied_ms: u64,
}

fn default_max_input_chars() -> usize {
    1_000
}

fn default_draft_debounce_ms() -> u64 {
    500
}

fn default_notice_ms() -> u64 {
    3_000
}

fn default_copied_ms() -> u64 {
    2_000
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            max_input_chars: default_max_input_chars(),
            draft_debounce_ms: default_draft_debounce_ms(),
            notice_ms: default_notice_ms(),
            copied_ms: default_copied_ms(),
        }
    }
}

impl PopupConfig {
    pub fn draft_debounce(&self) -> Duration {
        Duration::from_millis(self.draft_debounce_ms)
    }

    pub fn notice_lifetime(&self) -> Duration {
        Duration::from_millis(self.notice_ms)
    }

    pub fn copied_lifetime(&self) -> Duration {
        Duration::from_millis(self.copied_ms)
    }
}

/// Completion API client settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAIConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_completion_tokens")]
    pub max_completion_tokens: u32,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_completion_tokens() -> u32 {
    1_000
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            temperature: default_temperature(),
            max_completion_tokens: default_max_completion_tokens(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Log output for the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily-rolling log files; console only when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
            json: false,
        }
    }
}
