//! Runtime errors.

use enhancer_config::ConfigError;
use enhancer_protocols::{ClipboardError, MessageError, StorageError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Messaging error: {0}")]
    Message(#[from] MessageError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Clipboard error: {0}")]
    Clipboard(#[from] ClipboardError),
}

/// Popup action failures. `Display` is the notice shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PopupError {
    #[error("Please enter some text to enhance.")]
    EmptyInput,

    #[error("Please set your OpenAI API key in the extension settings.")]
    MissingApiKey,

    #[error("An enhancement is already in progress.")]
    Busy,

    /// Failure reported by the background, already user-facing.
    #[error("{0}")]
    Enhance(String),

    #[error("{0}")]
    Message(#[from] MessageError),

    #[error("Failed to copy text to clipboard")]
    Clipboard,

    #[error("There is no enhanced text to insert.")]
    NothingToReplace,

    #[error("{0}")]
    Storage(String),
}

impl From<StorageError> for PopupError {
    fn from(e: StorageError) -> Self {
        PopupError::Storage(e.to_string())
    }
}
