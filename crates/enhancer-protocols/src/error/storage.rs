//! Key-value storage errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid value for key '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value_display() {
        let err = StorageError::InvalidValue {
            key: "theme".to_string(),
            message: "expected string".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("theme"));
        assert!(display.contains("expected string"));
    }

    #[test]
    fn test_from_serde_error() {
        let json_err = serde_json::from_str::<bool>("nope").unwrap_err();
        let err: StorageError = json_err.into();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
