//! Diagnostic snapshot of a running content script.

use enhancer_protocols::NodeId;
use serde::Serialize;

use crate::classifier::InputKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffordanceDebug {
    pub input: NodeId,
    pub overlay: NodeId,
    pub kind: InputKind,
    pub has_text: bool,
    pub has_focus: bool,
    pub visibility: &'static str,
    pub has_timeout: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugSnapshot {
    pub url: String,
    pub enabled: bool,
    pub blocked_domains: Vec<String>,
    pub url_blocked: bool,
    pub should_run: bool,
    pub processed_inputs: usize,
    pub current_focused_input: Option<NodeId>,
    pub active_timeouts: usize,
    pub affordances: Vec<AffordanceDebug>,
    pub dom_overlays: usize,
}
