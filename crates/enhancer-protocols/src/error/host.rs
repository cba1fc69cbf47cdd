//! Host capability errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardError {
    #[error("Clipboard write denied: {0}")]
    Denied(String),

    #[error("Clipboard unavailable")]
    Unavailable,
}
