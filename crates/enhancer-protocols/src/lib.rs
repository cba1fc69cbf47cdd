//! # Enhancer Protocols
//!
//! Core protocol definitions for the Message Enhancer extension.
//! Contains interface definitions and exact-shape message contracts only.
//!
//! ## Core Traits
//!
//! - [`PageDom`] - The page document as seen by the content script
//! - [`ExtensionRuntime`] - The content script's handle to the extension runtime
//! - [`TabMessenger`] - Popup-to-tab request/response channel
//! - [`PopupLauncher`] - Opens the enhancer popup
//! - [`Clipboard`] - System clipboard access for the fallback path
//! - [`KeyValueStore`] - Reactive settings/handoff storage
//! - [`TextEnhancer`] - The completion API boundary

pub mod dom;
pub mod enhance;
pub mod error;
pub mod host;
pub mod message;
pub mod selector;
pub mod storage;

pub use dom::{NavigationEvent, NodeId, OverlaySpec, PageDom, PageEvent, PageEventKind, SyntheticEvent};
pub use enhance::{CompletionTarget, EnhanceRequest, EnhanceResponse, MessageKind, TextEnhancer, Tone};
pub use error::{ClipboardError, DomError, EnhanceError, MessageError, SelectorError, StorageError};
pub use host::{Clipboard, ExtensionRuntime, PopupLauncher, TabMessenger};
pub use message::{Ack, MessageResponse, Pong, RuntimeMessage, TabEnvelope, TabId};
pub use selector::Selector;
pub use storage::{KeyValueStore, StorageArea, StorageChange, StorageMap, ValueChange};
