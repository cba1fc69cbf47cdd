//! Enhancement request/response contracts and the completion boundary.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EnhanceError;

/// Requested register of the rewritten text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tone {
    VeryInformal,
    Informal,
    #[default]
    Neutral,
    Formal,
}

impl Tone {
    pub const ALL: [Tone; 4] = [Tone::VeryInformal, Tone::Informal, Tone::Neutral, Tone::Formal];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::VeryInformal => "very-informal",
            Tone::Informal => "informal",
            Tone::Neutral => "neutral",
            Tone::Formal => "formal",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tone::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown tone '{}'", s))
    }
}

/// Whether the text is an email or a chat message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Message,
    Email,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Message => "message",
            MessageKind::Email => "email",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "message" => Ok(MessageKind::Message),
            "email" => Ok(MessageKind::Email),
            other => Err(format!("unknown message type '{}'", other)),
        }
    }
}

/// `{ text, tone, type, translate }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhanceRequest {
    pub text: String,
    #[serde(default)]
    pub tone: Tone,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub translate: bool,
}

impl EnhanceRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: Tone::default(),
            kind: MessageKind::default(),
            translate: false,
        }
    }

    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    pub fn with_kind(mut self, kind: MessageKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_translate(mut self, translate: bool) -> Self {
        self.translate = translate;
        self
    }
}

/// `{ success: true, enhancedText } | { error }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnhanceResponse {
    Success {
        success: bool,
        #[serde(rename = "enhancedText")]
        enhanced_text: String,
    },
    Error {
        error: String,
    },
}

impl EnhanceResponse {
    pub fn success(enhanced_text: impl Into<String>) -> Self {
        EnhanceResponse::Success {
            success: true,
            enhanced_text: enhanced_text.into(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        EnhanceResponse::Error { error: error.into() }
    }

    pub fn into_result(self) -> Result<String, String> {
        match self {
            EnhanceResponse::Success { enhanced_text, .. } => Ok(enhanced_text),
            EnhanceResponse::Error { error } => Err(error),
        }
    }
}

impl From<Result<String, EnhanceError>> for EnhanceResponse {
    fn from(result: Result<String, EnhanceError>) -> Self {
        match result {
            Ok(text) => EnhanceResponse::success(text),
            Err(e) => EnhanceResponse::failure(e.user_message()),
        }
    }
}

/// Credentials and model for a single completion call.
#[derive(Clone, PartialEq, Eq)]
pub struct CompletionTarget {
    pub api_key: String,
    pub model: String,
}

impl fmt::Debug for CompletionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionTarget")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

/// The completion API boundary.
#[async_trait]
pub trait TextEnhancer: Send + Sync {
    /// Rewrite `request.text`; returns the trimmed enhanced text.
    async fn enhance(&self, target: &CompletionTarget, request: &EnhanceRequest) -> Result<String, EnhanceError>;
}
