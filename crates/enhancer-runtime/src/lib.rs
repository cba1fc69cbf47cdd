//! # Enhancer Runtime
//!
//! The extension-side contexts of Message Enhancer and an in-process host to
//! run them in:
//!
//! - [`MemoryStore`] - reactive key-value storage
//! - [`ExtensionBus`] - message routing between content scripts, background and popup
//! - [`Background`] - popup handoff and the completion relay
//! - [`PopupController`] - the popup's view model and actions

pub mod background;
pub mod bus;
mod error;
pub mod handoff;
pub mod popup;
pub mod store;

pub use background::Background;
pub use bus::{BusRuntime, ExtensionBus, MemoryClipboard, MessageHandler};
pub use error::{PopupError, RuntimeError};
pub use handoff::{HandoffStore, PendingHandoff};
pub use popup::{PopupController, PopupHost, PopupView, ReplaceOutcome, CLIPBOARD_FALLBACK_NOTICE};
pub use store::MemoryStore;
