//! Content-script errors.

use enhancer_config::ConfigError;
use enhancer_protocols::{DomError, SelectorError, StorageError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),

    #[error("Selector error: {0}")]
    Selector(#[from] SelectorError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}
