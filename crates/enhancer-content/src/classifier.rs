//! Which page nodes are eligible text entry surfaces.

use std::collections::HashSet;

use enhancer_protocols::{DomError, NodeId, PageDom, SyntheticEvent};
use serde::Serialize;

/// Shape of an admitted text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputKind {
    TextArea,
    PlainInput,
    ContentEditable,
}

const PLAIN_INPUT_TYPES: &[&str] = &["", "text", "email"];
const EDITABLE_VALUES: &[&str] = &["", "true", "plaintext-only"];

/// Classify a node without consulting processed state.
///
/// Rejections run before shape admission: disabled or read-only form fields
/// and anything whose `name` or `id` mentions "password" never qualify.
pub fn classify(page: &dyn PageDom, node: NodeId) -> Option<InputKind> {
    let tag = page.tag_name(node)?;
    let is_form_field = tag == "input" || tag == "textarea";

    if is_form_field && (page.attribute(node, "disabled").is_some() || page.attribute(node, "readonly").is_some()) {
        return None;
    }

    let mentions_password = ["name", "id"].iter().any(|attr| {
        page.attribute(node, attr)
            .map(|v| v.to_lowercase().contains("password"))
            .unwrap_or(false)
    });
    if mentions_password {
        return None;
    }

    match tag.as_str() {
        "textarea" => return Some(InputKind::TextArea),
        "input" => {
            let input_type = page.attribute(node, "type").unwrap_or_default().to_lowercase();
            return PLAIN_INPUT_TYPES
                .contains(&input_type.as_str())
                .then_some(InputKind::PlainInput);
        }
        _ => {}
    }

    page.attribute(node, "contenteditable")
        .map(|v| v.to_lowercase())
        .filter(|v| EDITABLE_VALUES.contains(&v.as_str()))
        .map(|_| InputKind::ContentEditable)
}

/// Classify a node that has not been processed yet.
pub fn eligible(page: &dyn PageDom, node: NodeId, processed: &HashSet<NodeId>) -> Option<InputKind> {
    if processed.contains(&node) {
        return None;
    }
    classify(page, node)
}

/// Uniform text access over value-backed fields and editable regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSurface {
    ValueField(NodeId),
    EditableRegion(NodeId),
}

impl TextSurface {
    pub fn new(node: NodeId, kind: InputKind) -> Self {
        match kind {
            InputKind::TextArea | InputKind::PlainInput => TextSurface::ValueField(node),
            InputKind::ContentEditable => TextSurface::EditableRegion(node),
        }
    }

    pub fn node(&self) -> NodeId {
        match *self {
            TextSurface::ValueField(node) | TextSurface::EditableRegion(node) => node,
        }
    }

    /// Current text; empty for a node that has gone away.
    pub fn text(&self, page: &dyn PageDom) -> String {
        match *self {
            TextSurface::ValueField(node) => page.value(node),
            TextSurface::EditableRegion(node) => page.text_content(node),
        }
        .unwrap_or_default()
    }

    /// Overwrite the text, notify page listeners with `input` then `change`,
    /// and move focus back to the field.
    pub fn set_text(&self, page: &dyn PageDom, text: &str) -> Result<(), DomError> {
        let node = self.node();
        match self {
            TextSurface::ValueField(_) => page.set_value(node, text)?,
            TextSurface::EditableRegion(_) => page.set_text_content(node, text)?,
        }
        page.dispatch_event(node, SyntheticEvent::Input)?;
        page.dispatch_event(node, SyntheticEvent::Change)?;
        page.focus(node)
    }
}
