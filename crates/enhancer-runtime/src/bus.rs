//! In-process extension messaging.
//!
//! [`ExtensionBus`] wires the three extension contexts together: content
//! scripts register a tab and get a [`BusRuntime`], the background installs a
//! [`MessageHandler`], and the popup reaches tabs through the bus's
//! [`TabMessenger`] implementation. Reloading the extension bumps a generation
//! counter, which invalidates every runtime handed out before it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use enhancer_protocols::{
    Clipboard, ClipboardError, ExtensionRuntime, MessageError, MessageResponse, PopupLauncher, RuntimeMessage,
    TabEnvelope, TabId, TabMessenger,
};
use parking_lot::{Mutex, RwLock};
use tokio::sync::{mpsc, oneshot, Notify};
use tracing::{debug, info};

const TAB_QUEUE: usize = 32;

/// Receiver side of runtime messages, i.e. the background context.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handle a message; `None` leaves it unanswered.
    async fn handle(&self, message: RuntimeMessage, sender: Option<TabId>) -> Option<MessageResponse>;
}

struct BusInner {
    extension_id: String,
    generation: AtomicU64,
    background: RwLock<Option<Arc<dyn MessageHandler>>>,
    tabs: Mutex<HashMap<TabId, mpsc::Sender<TabEnvelope>>>,
    active: Mutex<Option<TabId>>,
    next_tab: AtomicI64,
    popup_allowed: AtomicBool,
    popup_opens: AtomicUsize,
    popup_opened: Notify,
}

/// The extension's message router.
#[derive(Clone)]
pub struct ExtensionBus {
    inner: Arc<BusInner>,
}

impl ExtensionBus {
    pub fn new(extension_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(BusInner {
                extension_id: extension_id.into(),
                generation: AtomicU64::new(0),
                background: RwLock::new(None),
                tabs: Mutex::new(HashMap::new()),
                active: Mutex::new(None),
                next_tab: AtomicI64::new(1),
                popup_allowed: AtomicBool::new(true),
                popup_opens: AtomicUsize::new(0),
                popup_opened: Notify::new(),
            }),
        }
    }

    pub fn set_background(&self, handler: Arc<dyn MessageHandler>) {
        *self.inner.background.write() = Some(handler);
    }

    /// Register a new tab, make it active, and return its content-script
    /// runtime and inbound message queue.
    pub fn open_tab(&self) -> (TabId, BusRuntime, mpsc::Receiver<TabEnvelope>) {
        let tab = TabId(self.inner.next_tab.fetch_add(1, Ordering::SeqCst));
        let (tx, rx) = mpsc::channel(TAB_QUEUE);
        self.inner.tabs.lock().insert(tab, tx);
        *self.inner.active.lock() = Some(tab);
        debug!(%tab, "Tab opened");
        (tab, self.runtime_for(Some(tab)), rx)
    }

    /// Drop a tab's listener; later messages to it fail as disconnected.
    pub fn close_tab(&self, tab: TabId) {
        self.inner.tabs.lock().remove(&tab);
        let mut active = self.inner.active.lock();
        if *active == Some(tab) {
            *active = None;
        }
    }

    pub fn set_active_tab(&self, tab: Option<TabId>) {
        *self.inner.active.lock() = tab;
    }

    /// Runtime handle for a non-tab context such as the popup.
    pub fn popup_runtime(&self) -> BusRuntime {
        self.runtime_for(None)
    }

    fn runtime_for(&self, tab: Option<TabId>) -> BusRuntime {
        BusRuntime {
            bus: self.inner.clone(),
            tab,
            generation: self.inner.generation.load(Ordering::SeqCst),
        }
    }

    /// Reload the extension. Every runtime issued so far is invalidated and
    /// existing tab listeners are dropped.
    pub fn reload(&self) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.tabs.lock().clear();
        info!(generation, "Extension reloaded");
    }

    /// Whether `open_popup` succeeds.
    pub fn set_popup_allowed(&self, allowed: bool) {
        self.inner.popup_allowed.store(allowed, Ordering::SeqCst);
    }

    pub fn popup_open_count(&self) -> usize {
        self.inner.popup_opens.load(Ordering::SeqCst)
    }

    /// Wait for the next successful `open_popup`.
    pub async fn popup_opened(&self) {
        self.inner.popup_opened.notified().await;
    }
}

#[async_trait]
impl TabMessenger for ExtensionBus {
    async fn send_to_tab(&self, tab: TabId, message: RuntimeMessage) -> Result<MessageResponse, MessageError> {
        let sender = self
            .inner
            .tabs
            .lock()
            .get(&tab)
            .cloned()
            .ok_or(MessageError::Disconnected)?;

        let (reply, response) = oneshot::channel();
        sender
            .send(TabEnvelope { message, reply })
            .await
            .map_err(|_| MessageError::Disconnected)?;
        response.await.map_err(|_| MessageError::Closed)
    }

    async fn active_tab(&self) -> Option<TabId> {
        *self.inner.active.lock()
    }
}

#[async_trait]
impl PopupLauncher for ExtensionBus {
    async fn open_popup(&self) -> Result<(), MessageError> {
        if !self.inner.popup_allowed.load(Ordering::SeqCst) {
            return Err(MessageError::Rejected("Could not open popup".to_string()));
        }
        self.inner.popup_opens.fetch_add(1, Ordering::SeqCst);
        self.inner.popup_opened.notify_waiters();
        Ok(())
    }
}

/// A context's handle on the bus.
#[derive(Clone)]
pub struct BusRuntime {
    bus: Arc<BusInner>,
    tab: Option<TabId>,
    generation: u64,
}

impl BusRuntime {
    pub fn tab(&self) -> Option<TabId> {
        self.tab
    }
}

#[async_trait]
impl ExtensionRuntime for BusRuntime {
    fn id(&self) -> Option<String> {
        (self.bus.generation.load(Ordering::SeqCst) == self.generation).then(|| self.bus.extension_id.clone())
    }

    async fn send_message(&self, message: RuntimeMessage) -> Result<MessageResponse, MessageError> {
        if !self.is_valid() {
            return Err(MessageError::ContextInvalidated);
        }
        let handler = self.bus.background.read().clone().ok_or(MessageError::Disconnected)?;
        handler.handle(message, self.tab).await.ok_or(MessageError::Closed)
    }
}

/// Clipboard held in memory.
#[derive(Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
    denied: AtomicBool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().clone()
    }

    /// Make writes fail, as when the document lacks clipboard permission.
    pub fn deny(&self, denied: bool) {
        self.denied.store(denied, Ordering::SeqCst);
    }
}

#[async_trait]
impl Clipboard for MemoryClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        if self.denied.load(Ordering::SeqCst) {
            return Err(ClipboardError::Denied("Document is not focused".to_string()));
        }
        *self.contents.lock() = Some(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
