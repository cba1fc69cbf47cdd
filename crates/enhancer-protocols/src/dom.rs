//! Page document protocol.
//!
//! The content script never touches a concrete DOM. It works against
//! [`PageDom`], a narrow capability surface over the live document: attribute
//! reads, selector queries, value/text access, focus, synthetic events and the
//! overlay controls it owns.

use serde::{Deserialize, Serialize};

use crate::error::DomError;
use crate::selector::Selector;

/// Opaque identity of a node in the page.
///
/// Identities are never reused for the lifetime of a page, so a detached
/// node's id can be pruned from bookkeeping without risk of aliasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Notifications dispatched on a node so page-level frameworks observe a
/// programmatic mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyntheticEvent {
    Input,
    Change,
}

/// Page events the content script listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEventKind {
    /// Element-level focus.
    Focus,
    /// Element-level blur.
    Blur,
    /// Element-level input (user typing).
    Input,
    /// Document-level focus capture, fired for any focused element.
    FocusIn,
    /// Click on an affordance overlay; `target` is the overlay node.
    OverlayClick,
}

/// A page event delivered to the content script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageEvent {
    pub target: NodeId,
    pub kind: PageEventKind,
}

impl PageEvent {
    pub fn new(target: NodeId, kind: PageEventKind) -> Self {
        Self { target, kind }
    }
}

/// In-page navigation observed without a full document load.
///
/// Delivered after the document URL has changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    PushState { url: String },
    ReplaceState { url: String },
    PopState { url: String },
    HashChange { url: String },
}

impl NavigationEvent {
    pub fn url(&self) -> &str {
        match self {
            NavigationEvent::PushState { url }
            | NavigationEvent::ReplaceState { url }
            | NavigationEvent::PopState { url }
            | NavigationEvent::HashChange { url } => url,
        }
    }
}

/// Appearance of an affordance overlay control.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySpec {
    pub class_name: String,
    pub title: String,
    pub label: String,
}

/// The live page document.
///
/// Implementations must tolerate stale ids: every accessor on a detached or
/// unknown node returns `None`/`false` or a [`DomError::NodeNotFound`].
///
/// Mutations made through this trait are programmatic: the host does not
/// report the focus or input events they cause back to the engine, which
/// updates its own bookkeeping synchronously instead.
pub trait PageDom: Send + Sync {
    /// Current document URL. Changes on in-page navigation.
    fn url(&self) -> String;

    /// Lower-cased tag name of an element node.
    fn tag_name(&self, node: NodeId) -> Option<String>;

    /// Raw attribute value.
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Whether the node is still part of the document.
    fn is_connected(&self, node: NodeId) -> bool;

    /// Parent element, if any.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// The document's active (focused) element.
    fn active_element(&self) -> Option<NodeId>;

    /// All connected elements matching the selector, in document order.
    fn query_selector_all(&self, selector: &Selector) -> Vec<NodeId>;

    /// Current value of a form field.
    fn value(&self, node: NodeId) -> Option<String>;

    fn set_value(&self, node: NodeId, value: &str) -> Result<(), DomError>;

    /// Concatenated text of the node's subtree.
    fn text_content(&self, node: NodeId) -> Option<String>;

    fn set_text_content(&self, node: NodeId, text: &str) -> Result<(), DomError>;

    /// Move focus to the node.
    fn focus(&self, node: NodeId) -> Result<(), DomError>;

    /// Dispatch a bubbling synthetic event to page-level listeners.
    ///
    /// May synchronously run page scripts.
    fn dispatch_event(&self, node: NodeId, event: SyntheticEvent) -> Result<(), DomError>;

    /// Whether the computed `position` of the node is `static`.
    fn is_statically_positioned(&self, node: NodeId) -> bool;

    fn set_position_relative(&self, node: NodeId) -> Result<(), DomError>;

    /// Append a hidden overlay control to `parent` and return its node.
    fn attach_overlay(&self, parent: NodeId, spec: &OverlaySpec) -> Result<NodeId, DomError>;

    fn set_overlay_visible(&self, overlay: NodeId, visible: bool) -> Result<(), DomError>;

    fn set_overlay_scale(&self, overlay: NodeId, scale: f32) -> Result<(), DomError>;

    /// Detach a single overlay; `false` if it was already gone.
    fn remove_overlay(&self, overlay: NodeId) -> bool;

    /// Remove every overlay carrying `class_name`; returns how many were removed.
    fn remove_overlays(&self, class_name: &str) -> usize;

    /// Show a blocking user-visible message.
    fn alert(&self, message: &str);
}
