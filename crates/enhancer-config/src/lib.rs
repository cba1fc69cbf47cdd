//! # Enhancer Config
//!
//! Settings schema, storage keys, TOML loading and validation for Message Enhancer.

mod error;
pub mod keys;
mod loader;
mod options;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use options::SettingsForm;
pub use schema::*;
pub use validator::{SettingsValidator, ValidationError, ValidationResult, ValidationWarning};
