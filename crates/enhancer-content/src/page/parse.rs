//! HTML conversion via `scraper`, in both directions.
//!
//! Fixtures are parsed into the arena. Selector queries go the other way: the
//! connected tree is rendered with every element tagged by its [`NodeId`],
//! reparsed, and matched by `scraper`.

use std::fmt::Write;

use enhancer_protocols::{NodeId, Selector};
use scraper::{ElementRef, Html, Node};

use super::node::{ElementData, NodeData};
use super::PageState;

/// Attribute carrying the arena id in rendered markup.
const NODE_MARK: &str = "data-memory-page-node";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

/// Build the whole document under the document node.
pub(crate) fn load_document(state: &mut PageState, html: &str) {
    let document = Html::parse_document(html);
    let root = state.document();
    convert_element(state, root, document.root_element());
}

/// Parse `html` as a fragment and append its top-level nodes to `parent`.
/// Returns the appended elements.
pub(crate) fn append_fragment(state: &mut PageState, parent: NodeId, html: &str) -> Vec<NodeId> {
    let fragment = Html::parse_fragment(html);
    let mut added = Vec::new();
    for child in fragment.root_element().children() {
        match child.value() {
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    added.push(convert_element(state, parent, el));
                }
            }
            Node::Text(t) => {
                state.push_node(parent, NodeData::Text(t.text.to_string()));
            }
            _ => {}
        }
    }
    added
}

fn convert_element(state: &mut PageState, parent: NodeId, el: ElementRef<'_>) -> NodeId {
    let mut data = ElementData::new(el.value().name());
    data.attrs = el
        .value()
        .attrs()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
        .collect();
    if data.tag == "input" {
        data.value = data.attrs.get("value").cloned().unwrap_or_default();
    }
    let is_textarea = data.tag == "textarea";

    let id = state.push_node(parent, NodeData::Element(data));

    for child in el.children() {
        match child.value() {
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    convert_element(state, id, child_el);
                }
            }
            Node::Text(t) => {
                state.push_node(id, NodeData::Text(t.text.to_string()));
            }
            _ => {}
        }
    }

    if is_textarea {
        let initial = state.text_content(id);
        if let Some(el) = state.element_mut(id) {
            el.value = initial;
        }
    }

    id
}

/// Connected elements matching `selector`, in document order.
pub(crate) fn select(state: &PageState, selector: &Selector) -> Vec<NodeId> {
    let snapshot = Html::parse_document(&render_marked(state));
    snapshot
        .select(selector.compiled())
        .filter_map(|el| el.value().attr(NODE_MARK)?.parse::<u64>().ok())
        .map(NodeId)
        .collect()
}

fn render_marked(state: &PageState) -> String {
    let mut out = String::from("<!DOCTYPE html>");
    let document = state.document();
    if let Some(node) = state.node(document) {
        for child in &node.children {
            render_node(state, *child, &mut out);
        }
    }
    out
}

fn render_node(state: &PageState, id: NodeId, out: &mut String) {
    let Some(node) = state.node(id) else {
        return;
    };
    match &node.data {
        NodeData::Document => {}
        NodeData::Text(text) => out.push_str(&escape(text, false)),
        NodeData::Element(el) => {
            let _ = write!(out, "<{}", el.tag);
            for (name, value) in el.attrs.iter().filter(|(name, _)| name.as_str() != NODE_MARK) {
                let _ = write!(out, " {}=\"{}\"", name, escape(value, true));
            }
            let _ = write!(out, " {}=\"{}\">", NODE_MARK, id.0);
            if VOID_ELEMENTS.contains(&el.tag.as_str()) {
                return;
            }
            for child in &node.children {
                render_node(state, *child, out);
            }
            let _ = write!(out, "</{}>", el.tag);
        }
    }
}

fn escape(raw: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(html: &str) -> PageState {
        let mut state = PageState::new("https://example.com/");
        load_document(&mut state, html);
        state
    }

    #[test]
    fn test_render_marks_every_element() {
        let state = state(r#"<html><body><p class="a">x &amp; y</p><input id="i"></body></html>"#);
        let markup = render_marked(&state);
        assert!(markup.contains(r#"<p class="a" data-memory-page-node="#));
        assert!(markup.contains("x &amp; y</p>"));
        assert!(!markup.contains("</input>"));
    }

    #[test]
    fn test_select_escapes_attribute_values() {
        let state = state(r#"<html><body><div id="d" title="say &quot;hi&quot; &lt;now&gt;"></div></body></html>"#);
        let selector = Selector::parse(r#"[title='say "hi" <now>']"#).unwrap();
        let found = select(&state, &selector);
        assert_eq!(found.len(), 1);
        assert_eq!(state.element(found[0]).and_then(|e| e.attrs.get("id")).map(String::as_str), Some("d"));
    }

    #[test]
    fn test_select_skips_detached_nodes() {
        let mut state = state(r#"<html><body><textarea id="t"></textarea></body></html>"#);
        let selector = Selector::parse("textarea").unwrap();
        let found = select(&state, &selector);
        assert_eq!(found.len(), 1);

        state.detach(found[0]);
        assert!(select(&state, &selector).is_empty());
    }
}
