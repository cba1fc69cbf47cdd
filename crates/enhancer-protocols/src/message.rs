//! Cross-context message contracts.
//!
//! Every message is an exact-shape JSON record tagged by `action`.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::enhance::{EnhanceRequest, EnhanceResponse};

/// Browser tab identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub i64);

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tab {}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum RuntimeMessage {
    /// Content script → background: open the popup pre-filled with `text`.
    OpenPopupWithText { text: String },
    /// Popup → background: run a completion.
    EnhanceText { data: EnhanceRequest },
    /// Popup → content script: liveness probe.
    Ping,
    /// Popup → content script: overwrite the focus-tracked field.
    ReplaceText { text: String },
}

impl RuntimeMessage {
    pub fn action(&self) -> &'static str {
        match self {
            RuntimeMessage::OpenPopupWithText { .. } => "openPopupWithText",
            RuntimeMessage::EnhanceText { .. } => "enhanceText",
            RuntimeMessage::Ping => "ping",
            RuntimeMessage::ReplaceText { .. } => "replaceText",
        }
    }
}

/// `{ pong: true }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Pong {
    pub pong: bool,
}

/// `{ success, error? }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Ack {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Reply to a [`RuntimeMessage`].
///
/// Variant order matters for decoding: an enhancement success also carries
/// `success`, so the strict shapes are tried first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageResponse {
    Pong(Pong),
    Ack(Ack),
    Enhance(EnhanceResponse),
}

impl MessageResponse {
    pub fn pong() -> Self {
        MessageResponse::Pong(Pong { pong: true })
    }

    pub fn ok() -> Self {
        MessageResponse::Ack(Ack {
            success: true,
            error: None,
        })
    }

    pub fn failed(error: impl Into<String>) -> Self {
        MessageResponse::Ack(Ack {
            success: false,
            error: Some(error.into()),
        })
    }

    pub fn is_pong(&self) -> bool {
        matches!(self, MessageResponse::Pong(Pong { pong: true }))
    }

    pub fn is_success(&self) -> bool {
        match self {
            MessageResponse::Pong(p) => p.pong,
            MessageResponse::Ack(a) => a.success,
            MessageResponse::Enhance(EnhanceResponse::Success { success, .. }) => *success,
            MessageResponse::Enhance(EnhanceResponse::Error { .. }) => false,
        }
    }

    /// Error text carried by a failed reply.
    pub fn error(&self) -> Option<&str> {
        match self {
            MessageResponse::Ack(a) => a.error.as_deref(),
            MessageResponse::Enhance(EnhanceResponse::Error { error }) => Some(error),
            _ => None,
        }
    }
}

/// A message delivered to a tab's content script, with its reply slot.
#[derive(Debug)]
pub struct TabEnvelope {
    pub message: RuntimeMessage,
    pub reply: oneshot::Sender<MessageResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_wire_shapes() {
        assert_eq!(serde_json::to_value(RuntimeMessage::Ping).unwrap(), json!({"action": "ping"}));
        assert_eq!(
            serde_json::to_value(RuntimeMessage::OpenPopupWithText { text: "hi".into() }).unwrap(),
            json!({"action": "openPopupWithText", "text": "hi"})
        );
        assert_eq!(
            serde_json::to_value(RuntimeMessage::ReplaceText { text: "new".into() }).unwrap(),
            json!({"action": "replaceText", "text": "new"})
        );
    }

    #[test]
    fn test_enhance_message_decodes() {
        let msg: RuntimeMessage = serde_json::from_value(json!({
            "action": "enhanceText",
            "data": {"text": "yo", "tone": "formal", "type": "email", "translate": false}
        }))
        .unwrap();
        match msg {
            RuntimeMessage::EnhanceText { data } => assert_eq!(data.text, "yo"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_action_names_match_wire() {
        let msgs = vec![
            RuntimeMessage::OpenPopupWithText { text: String::new() },
            RuntimeMessage::EnhanceText {
                data: EnhanceRequest::new(""),
            },
            RuntimeMessage::Ping,
            RuntimeMessage::ReplaceText { text: String::new() },
        ];
        for msg in msgs {
            let value = serde_json::to_value(&msg).unwrap();
            assert_eq!(value["action"], msg.action());
        }
    }

    #[test]
    fn test_response_decoding_disambiguates() {
        let pong: MessageResponse = serde_json::from_value(json!({"pong": true})).unwrap();
        assert!(pong.is_pong());

        let ack: MessageResponse =
            serde_json::from_value(json!({"success": false, "error": "No input element tracked"})).unwrap();
        assert_eq!(ack, MessageResponse::failed("No input element tracked"));

        let enhanced: MessageResponse =
            serde_json::from_value(json!({"success": true, "enhancedText": "Hello."})).unwrap();
        assert_eq!(enhanced, MessageResponse::Enhance(EnhanceResponse::success("Hello.")));

        let api_err: MessageResponse = serde_json::from_value(json!({"error": "bad"})).unwrap();
        assert_eq!(api_err.error(), Some("bad"));
        assert!(!api_err.is_success());
    }

    #[test]
    fn test_ok_omits_error_field() {
        assert_eq!(serde_json::to_value(MessageResponse::ok()).unwrap(), json!({"success": true}));
    }
}
