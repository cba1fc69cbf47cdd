//! Page document and selector errors.

use thiserror::Error;

use crate::dom::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Node {node} does not support {operation}")]
    Unsupported { node: NodeId, operation: &'static str },

    #[error("HTML parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("Empty selector in '{0}'")]
    Empty(String),

    #[error("Invalid selector '{selector}': {reason}")]
    Invalid { selector: String, reason: String },
}
