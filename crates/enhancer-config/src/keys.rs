//! Storage keys shared by every extension context.

// Synced settings.
pub const ENABLE_CONTENT_SCRIPT: &str = "enableContentScript";
pub const BLOCKED_DOMAINS: &str = "blockedDomains";
pub const OPENAI_API_KEY: &str = "openaiApiKey";
pub const OPENAI_MODEL: &str = "openaiModel";
pub const THEME: &str = "theme";
pub const KEEP_TEXT_ON_CLOSE: &str = "keepTextOnClose";
pub const DEBUG_MODE: &str = "debugMode";
pub const TRANSLATE_ENABLED: &str = "translateEnabled";

// Popup drafts, also in the sync area.
pub const PERSISTED_INPUT_TEXT: &str = "persistedInputText";
pub const PERSISTED_OUTPUT_TEXT: &str = "persistedOutputText";

// Transient handoff record, local area only.
pub const PENDING_TEXT: &str = "pendingText";
pub const PENDING_TIMESTAMP: &str = "pendingTimestamp";
pub const AUTO_ENHANCE: &str = "autoEnhance";
pub const FROM_WEBSITE: &str = "fromWebsite";
pub const SOURCE_TAB_ID: &str = "sourceTabId";

pub const SETTINGS_KEYS: &[&str] = &[
    ENABLE_CONTENT_SCRIPT,
    BLOCKED_DOMAINS,
    OPENAI_API_KEY,
    OPENAI_MODEL,
    THEME,
    KEEP_TEXT_ON_CLOSE,
    DEBUG_MODE,
    TRANSLATE_ENABLED,
];

pub const DRAFT_KEYS: &[&str] = &[PERSISTED_INPUT_TEXT, PERSISTED_OUTPUT_TEXT];

pub const HANDOFF_KEYS: &[&str] = &[PENDING_TEXT, PENDING_TIMESTAMP, AUTO_ENHANCE, FROM_WEBSITE, SOURCE_TAB_ID];
