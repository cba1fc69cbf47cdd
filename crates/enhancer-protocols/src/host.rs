//! Extension host capabilities.

use async_trait::async_trait;

use crate::error::{ClipboardError, MessageError};
use crate::message::{MessageResponse, RuntimeMessage, TabId};

/// The content script's handle on the extension runtime.
#[async_trait]
pub trait ExtensionRuntime: Send + Sync {
    /// Runtime identity; `None` once the extension has been reloaded or removed.
    fn id(&self) -> Option<String>;

    fn is_valid(&self) -> bool {
        self.id().is_some()
    }

    /// Send a message to the background context and await its reply.
    async fn send_message(&self, message: RuntimeMessage) -> Result<MessageResponse, MessageError>;
}

/// Request/response channel from the popup into a tab's content script.
#[async_trait]
pub trait TabMessenger: Send + Sync {
    async fn send_to_tab(&self, tab: TabId, message: RuntimeMessage) -> Result<MessageResponse, MessageError>;

    /// The active tab of the focused window.
    async fn active_tab(&self) -> Option<TabId>;
}

#[async_trait]
pub trait PopupLauncher: Send + Sync {
    async fn open_popup(&self) -> Result<(), MessageError>;
}

#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}
