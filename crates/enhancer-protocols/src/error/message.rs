//! Cross-context messaging errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// No receiver is listening in the target context.
    #[error("Could not establish connection. Receiving end does not exist.")]
    Disconnected,

    #[error("Message timed out after {0} ms")]
    Timeout(u64),

    /// The sending context belongs to an unloaded extension instance.
    #[error("Extension context invalidated.")]
    ContextInvalidated,

    #[error("Message rejected: {0}")]
    Rejected(String),

    /// The receiver dropped the reply channel without answering.
    #[error("The message port closed before a response was received.")]
    Closed,
}

impl MessageError {
    /// Whether the failure means this page's extension context is gone for good.
    pub fn is_context_invalidated(&self) -> bool {
        matches!(self, MessageError::ContextInvalidated)
            || matches!(self, MessageError::Rejected(reason) if reason.contains("Extension context invalidated"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let err = MessageError::Timeout(2000);
        assert!(err.to_string().contains("2000"));
    }

    #[test]
    fn test_context_invalidated_detection() {
        assert!(MessageError::ContextInvalidated.is_context_invalidated());
        assert!(MessageError::Rejected("Error: Extension context invalidated.".to_string()).is_context_invalidated());
        assert!(!MessageError::Disconnected.is_context_invalidated());
        assert!(!MessageError::Rejected("popup blocked".to_string()).is_context_invalidated());
    }

    #[test]
    fn test_all_error_variants() {
        let errors = vec![
            MessageError::Disconnected,
            MessageError::Timeout(1),
            MessageError::ContextInvalidated,
            MessageError::Rejected("x".to_string()),
            MessageError::Closed,
        ];
        for err in errors {
            assert!(!err.to_string().is_empty());
        }
    }
}
