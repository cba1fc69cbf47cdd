//! Completion API errors.

use thiserror::Error;

/// Prefix applied to every failure reported back from an enhancement call.
pub const ENHANCE_FAILURE_PREFIX: &str = "Failed to enhance text: ";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnhanceError {
    #[error("OpenAI API key not found. Please set it in the extension settings.")]
    MissingApiKey,

    /// Non-2xx response; `message` is the API's own error message when present.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("{0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The stored key and model could not be read.
    #[error("Could not read settings: {0}")]
    Settings(String),
}

impl EnhanceError {
    /// The text shown to the user.
    ///
    /// The missing-key check happens before the request is attempted, so it is
    /// reported bare; every other failure carries [`ENHANCE_FAILURE_PREFIX`].
    pub fn user_message(&self) -> String {
        match self {
            EnhanceError::MissingApiKey => self.to_string(),
            other => format!("{}{}", ENHANCE_FAILURE_PREFIX, other),
        }
    }
}
