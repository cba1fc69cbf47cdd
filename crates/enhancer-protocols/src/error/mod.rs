//! Error types for the Message Enhancer protocol layer.

mod dom;
mod enhance;
mod host;
mod message;
mod storage;

pub use dom::*;
pub use enhance::*;
pub use host::*;
pub use message::*;
pub use storage::*;
