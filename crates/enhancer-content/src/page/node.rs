//! Arena nodes of the in-memory page.

use std::collections::BTreeMap;

use enhancer_protocols::NodeId;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OverlayState {
    pub visible: bool,
    pub scale: f32,
}

#[derive(Debug, Clone)]
pub(crate) struct ElementData {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    /// Live value of form fields; unused for other elements.
    pub value: String,
    pub overlay: Option<OverlayState>,
}

impl ElementData {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attrs: BTreeMap::new(),
            value: String::new(),
            overlay: None,
        }
    }

    pub fn is_form_field(&self) -> bool {
        self.tag == "input" || self.tag == "textarea"
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attrs
            .get("class")
            .map(|v| v.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn style_property(&self, property: &str) -> Option<String> {
        style_property(self.attrs.get("style").map(String::as_str).unwrap_or_default(), property)
    }

    pub fn set_style_property(&mut self, property: &str, value: &str) {
        let style = self.attrs.get("style").map(String::as_str).unwrap_or_default();
        let updated = with_style_property(style, property, value);
        self.attrs.insert("style".to_string(), updated);
    }
}

#[derive(Debug, Clone)]
pub(crate) enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct PageNode {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub data: NodeData,
}

impl PageNode {
    pub fn element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }
}

fn declarations(style: &str) -> impl Iterator<Item = (&str, &str)> {
    style.split(';').filter_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        Some((name.trim(), value.trim()))
    })
}

pub(crate) fn style_property(style: &str, property: &str) -> Option<String> {
    declarations(style)
        .filter(|(name, _)| name.eq_ignore_ascii_case(property))
        .last()
        .map(|(_, value)| value.to_ascii_lowercase())
}

pub(crate) fn with_style_property(style: &str, property: &str, value: &str) -> String {
    let mut parts: Vec<String> = declarations(style)
        .filter(|(name, _)| !name.eq_ignore_ascii_case(property))
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect();
    parts.push(format!("{}: {}", property, value));
    parts.join("; ")
}
