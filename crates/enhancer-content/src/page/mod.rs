//! In-memory page host.
//!
//! [`MemoryPage`] implements [`PageDom`] over an arena built from an HTML
//! fixture. Besides the programmatic surface the engine uses, it offers a
//! user-simulation surface (`user_focus`, `user_type`, `click_overlay`, ...)
//! that mutates the document and reports the resulting events on
//! [`PageChannels`], the way a browser reports real user input.

mod node;
mod parse;

use std::sync::Arc;

use enhancer_protocols::{
    DomError, NavigationEvent, NodeId, OverlaySpec, PageDom, PageEvent, PageEventKind, Selector, SyntheticEvent,
};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use node::{ElementData, NodeData, OverlayState, PageNode};

/// Event streams of a [`MemoryPage`].
#[derive(Debug)]
pub struct PageChannels {
    pub events: mpsc::UnboundedReceiver<PageEvent>,
    pub navigation: mpsc::UnboundedReceiver<NavigationEvent>,
}

pub(crate) struct PageState {
    url: String,
    nodes: Vec<PageNode>,
    active: Option<NodeId>,
    alerts: Vec<String>,
    dispatched: Vec<(NodeId, SyntheticEvent)>,
}

impl PageState {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            nodes: vec![PageNode {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
            active: None,
            alerts: Vec::new(),
            dispatched: Vec::new(),
        }
    }

    pub(crate) fn document(&self) -> NodeId {
        NodeId(0)
    }

    fn node(&self, id: NodeId) -> Option<&PageNode> {
        usize::try_from(id.0).ok().and_then(|i| self.nodes.get(i))
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut PageNode> {
        usize::try_from(id.0).ok().and_then(|i| self.nodes.get_mut(i))
    }

    fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.node(id).and_then(PageNode::element)
    }

    pub(crate) fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.node_mut(id).and_then(PageNode::element_mut)
    }

    pub(crate) fn push_node(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u64);
        self.nodes.push(PageNode {
            parent: Some(parent),
            children: Vec::new(),
            data,
        });
        if let Some(p) = self.node_mut(parent) {
            p.children.push(id);
        }
        id
    }

    fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.node(id).and_then(|n| n.parent) else {
            return false;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|c| *c != id);
        }
        if let Some(n) = self.node_mut(id) {
            n.parent = None;
        }
        if self.active.is_some_and(|a| !self.is_connected(a)) {
            self.active = None;
        }
        true
    }

    fn is_connected(&self, id: NodeId) -> bool {
        let document = self.document();
        let mut current = Some(id);
        while let Some(node) = current {
            if node == document {
                return true;
            }
            current = self.node(node).and_then(|n| n.parent);
        }
        false
    }

    /// Connected element id, or `NodeNotFound`.
    fn live_element(&self, id: NodeId) -> Result<&ElementData, DomError> {
        if !self.is_connected(id) {
            return Err(DomError::NodeNotFound(id));
        }
        self.element(id).ok_or(DomError::NodeNotFound(id))
    }

    fn live_element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DomError> {
        if !self.is_connected(id) {
            return Err(DomError::NodeNotFound(id));
        }
        self.element_mut(id).ok_or(DomError::NodeNotFound(id))
    }

    /// Preorder walk of the connected tree.
    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.node(id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    pub(crate) fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|n| match &self.node(n)?.data {
                NodeData::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    fn replace_children_with_text(&mut self, id: NodeId, text: &str) {
        let children = self.node(id).map(|n| n.children.clone()).unwrap_or_default();
        for child in children {
            self.detach(child);
        }
        if !text.is_empty() {
            self.push_node(id, NodeData::Text(text.to_string()));
        }
    }

    fn query(&self, selector: &Selector) -> Vec<NodeId> {
        parse::select(self, selector)
    }

    fn overlay_nodes(&self) -> Vec<NodeId> {
        self.descendants(self.document())
            .into_iter()
            .filter(|id| self.element(*id).is_some_and(|e| e.overlay.is_some()))
            .collect()
    }

    fn write_text(&mut self, id: NodeId, text: &str) -> Result<(), DomError> {
        let el = self.live_element_mut(id)?;
        if el.is_form_field() {
            el.value = text.to_string();
        } else {
            self.replace_children_with_text(id, text);
        }
        Ok(())
    }
}

/// An HTML document held in memory.
pub struct MemoryPage {
    state: Mutex<PageState>,
    events: mpsc::UnboundedSender<PageEvent>,
    navigation: mpsc::UnboundedSender<NavigationEvent>,
}

impl MemoryPage {
    /// Parse an HTML document loaded at `url`.
    pub fn parse(url: &str, html: &str) -> (Arc<Self>, PageChannels) {
        let mut state = PageState::new(url);
        parse::load_document(&mut state, html);

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (nav_tx, nav_rx) = mpsc::unbounded_channel();
        let page = Arc::new(Self {
            state: Mutex::new(state),
            events: events_tx,
            navigation: nav_tx,
        });
        let channels = PageChannels {
            events: events_rx,
            navigation: nav_rx,
        };
        (page, channels)
    }

    /// First connected element matching a CSS selector.
    pub fn find(&self, css: &str) -> Option<NodeId> {
        self.find_all(css).into_iter().next()
    }

    pub fn find_all(&self, css: &str) -> Vec<NodeId> {
        match Selector::parse(css) {
            Ok(selector) => self.state.lock().query(&selector),
            Err(_) => Vec::new(),
        }
    }

    pub fn body(&self) -> Option<NodeId> {
        self.find("body")
    }

    fn emit(&self, target: NodeId, kind: PageEventKind) {
        let _ = self.events.send(PageEvent::new(target, kind));
    }

    // ---- user simulation -------------------------------------------------

    /// The user focuses `node`: blur on the previous element, then focus and
    /// a document-level focusin on the new one.
    pub fn user_focus(&self, node: NodeId) -> Result<(), DomError> {
        let previous = {
            let mut state = self.state.lock();
            state.live_element(node)?;
            if state.active == Some(node) {
                return Ok(());
            }
            state.active.replace(node)
        };
        if let Some(previous) = previous {
            self.emit(previous, PageEventKind::Blur);
        }
        self.emit(node, PageEventKind::Focus);
        self.emit(node, PageEventKind::FocusIn);
        Ok(())
    }

    /// Focus leaves the document's active element.
    pub fn user_blur(&self) {
        let previous = self.state.lock().active.take();
        if let Some(previous) = previous {
            self.emit(previous, PageEventKind::Blur);
        }
    }

    /// Type `text` at the end of the field, focusing it first.
    pub fn user_type(&self, node: NodeId, text: &str) -> Result<(), DomError> {
        self.user_focus(node)?;
        let current = self.current_text(node)?;
        self.state.lock().write_text(node, &format!("{}{}", current, text))?;
        self.emit(node, PageEventKind::Input);
        Ok(())
    }

    /// Replace the field's whole text, e.g. select-all and delete.
    pub fn user_replace_text(&self, node: NodeId, text: &str) -> Result<(), DomError> {
        self.user_focus(node)?;
        self.state.lock().write_text(node, text)?;
        self.emit(node, PageEventKind::Input);
        Ok(())
    }

    pub fn click_overlay(&self, overlay: NodeId) -> Result<(), DomError> {
        let state = self.state.lock();
        let el = state.live_element(overlay)?;
        if el.overlay.is_none() {
            return Err(DomError::Unsupported {
                node: overlay,
                operation: "click_overlay",
            });
        }
        drop(state);
        self.emit(overlay, PageEventKind::OverlayClick);
        Ok(())
    }

    /// Append parsed HTML under `parent`, as a page script would.
    pub fn append_html(&self, parent: NodeId, html: &str) -> Result<Vec<NodeId>, DomError> {
        let mut state = self.state.lock();
        state.live_element(parent)?;
        Ok(parse::append_fragment(&mut state, parent, html))
    }

    /// Detach a node and its subtree.
    pub fn remove(&self, node: NodeId) -> bool {
        self.state.lock().detach(node)
    }

    /// In-page navigation: update the URL, then report the event.
    pub fn navigate(&self, event: NavigationEvent) {
        self.state.lock().url = event.url().to_string();
        let _ = self.navigation.send(event);
    }

    // ---- inspection ------------------------------------------------------

    fn current_text(&self, node: NodeId) -> Result<String, DomError> {
        let state = self.state.lock();
        let el = state.live_element(node)?;
        Ok(if el.is_form_field() {
            el.value.clone()
        } else {
            state.text_content(node)
        })
    }

    /// Connected overlays in document order.
    pub fn overlays(&self) -> Vec<NodeId> {
        self.state.lock().overlay_nodes()
    }

    pub fn visible_overlays(&self) -> Vec<NodeId> {
        let state = self.state.lock();
        state
            .overlay_nodes()
            .into_iter()
            .filter(|id| {
                state
                    .element(*id)
                    .and_then(|e| e.overlay.as_ref())
                    .is_some_and(|o| o.visible)
            })
            .collect()
    }

    pub fn overlay_visible(&self, overlay: NodeId) -> Option<bool> {
        let state = self.state.lock();
        state.element(overlay)?.overlay.as_ref().map(|o| o.visible)
    }

    pub fn overlay_scale(&self, overlay: NodeId) -> Option<f32> {
        let state = self.state.lock();
        state.element(overlay)?.overlay.as_ref().map(|o| o.scale)
    }

    pub fn alerts(&self) -> Vec<String> {
        self.state.lock().alerts.clone()
    }

    /// Synthetic events dispatched on `node`, oldest first.
    pub fn dispatched_events(&self, node: NodeId) -> Vec<SyntheticEvent> {
        self.state
            .lock()
            .dispatched
            .iter()
            .filter(|(n, _)| *n == node)
            .map(|(_, e)| *e)
            .collect()
    }

    pub fn dispatched_count(&self) -> usize {
        self.state.lock().dispatched.len()
    }
}

impl PageDom for MemoryPage {
    fn url(&self) -> String {
        self.state.lock().url.clone()
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.state.lock().element(node).map(|e| e.tag.clone())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.state
            .lock()
            .element(node)
            .and_then(|e| e.attrs.get(&name.to_ascii_lowercase()).cloned())
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.state.lock().is_connected(node)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        let state = self.state.lock();
        let parent = state.node(node)?.parent?;
        state.element(parent).map(|_| parent)
    }

    fn active_element(&self) -> Option<NodeId> {
        let state = self.state.lock();
        state.active.filter(|a| state.is_connected(*a))
    }

    fn query_selector_all(&self, selector: &Selector) -> Vec<NodeId> {
        self.state.lock().query(selector)
    }

    fn value(&self, node: NodeId) -> Option<String> {
        let state = self.state.lock();
        let el = state.element(node)?;
        el.is_form_field().then(|| el.value.clone())
    }

    fn set_value(&self, node: NodeId, value: &str) -> Result<(), DomError> {
        let mut state = self.state.lock();
        let el = state.live_element_mut(node)?;
        if !el.is_form_field() {
            return Err(DomError::Unsupported {
                node,
                operation: "set_value",
            });
        }
        el.value = value.to_string();
        Ok(())
    }

    fn text_content(&self, node: NodeId) -> Option<String> {
        let state = self.state.lock();
        state.node(node)?;
        Some(state.text_content(node))
    }

    fn set_text_content(&self, node: NodeId, text: &str) -> Result<(), DomError> {
        let mut state = self.state.lock();
        state.live_element(node)?;
        state.replace_children_with_text(node, text);
        Ok(())
    }

    fn focus(&self, node: NodeId) -> Result<(), DomError> {
        let mut state = self.state.lock();
        state.live_element(node)?;
        state.active = Some(node);
        Ok(())
    }

    fn dispatch_event(&self, node: NodeId, event: SyntheticEvent) -> Result<(), DomError> {
        let mut state = self.state.lock();
        state.live_element(node)?;
        state.dispatched.push((node, event));
        Ok(())
    }

    fn is_statically_positioned(&self, node: NodeId) -> bool {
        self.state
            .lock()
            .element(node)
            .is_some_and(|e| e.style_property("position").is_none_or(|p| p == "static"))
    }

    fn set_position_relative(&self, node: NodeId) -> Result<(), DomError> {
        let mut state = self.state.lock();
        state.live_element_mut(node)?.set_style_property("position", "relative");
        Ok(())
    }

    fn attach_overlay(&self, parent: NodeId, spec: &OverlaySpec) -> Result<NodeId, DomError> {
        let mut state = self.state.lock();
        state.live_element(parent)?;

        let mut el = ElementData::new("div");
        el.attrs.insert("class".to_string(), spec.class_name.clone());
        el.attrs.insert("title".to_string(), spec.title.clone());
        el.set_style_property("position", "absolute");
        el.set_style_property("display", "none");
        el.overlay = Some(OverlayState {
            visible: false,
            scale: 1.0,
        });

        let overlay = state.push_node(parent, NodeData::Element(el));
        state.push_node(overlay, NodeData::Text(spec.label.clone()));
        Ok(overlay)
    }

    fn set_overlay_visible(&self, overlay: NodeId, visible: bool) -> Result<(), DomError> {
        let mut state = self.state.lock();
        let el = state.element_mut(overlay).ok_or(DomError::NodeNotFound(overlay))?;
        let Some(ref mut o) = el.overlay else {
            return Err(DomError::Unsupported {
                node: overlay,
                operation: "set_overlay_visible",
            });
        };
        o.visible = visible;
        el.set_style_property("display", if visible { "flex" } else { "none" });
        Ok(())
    }

    fn set_overlay_scale(&self, overlay: NodeId, scale: f32) -> Result<(), DomError> {
        let mut state = self.state.lock();
        let el = state.element_mut(overlay).ok_or(DomError::NodeNotFound(overlay))?;
        let Some(ref mut o) = el.overlay else {
            return Err(DomError::Unsupported {
                node: overlay,
                operation: "set_overlay_scale",
            });
        };
        o.scale = scale;
        el.set_style_property("transform", &format!("scale({})", scale));
        Ok(())
    }

    fn remove_overlay(&self, overlay: NodeId) -> bool {
        let mut state = self.state.lock();
        if state.element(overlay).is_none_or(|e| e.overlay.is_none()) {
            return false;
        }
        state.detach(overlay)
    }

    fn remove_overlays(&self, class_name: &str) -> usize {
        let mut state = self.state.lock();
        let targets: Vec<NodeId> = state
            .overlay_nodes()
            .into_iter()
            .filter(|id| state.element(*id).is_some_and(|e| e.has_class(class_name)))
            .collect();
        targets.into_iter().filter(|id| state.detach(*id)).count()
    }

    fn alert(&self, message: &str) {
        self.state.lock().alerts.push(message.to_string());
    }
}

#[cfg(test)]
#[path = "page_tests.rs"]
mod tests;
