//! JSON bodies exchanged with the tutoring backend.
//!
//! Every response field is optional on the wire: a well-formed body that lacks
//! the expected field means "nothing to render", not a failure.

use serde::{Deserialize, Serialize};

use crate::session::{Level, ProviderId};
use crate::turn::{Role, Turn};

// --- Endpoints (relative to the server base URL) ---

pub const CHAT_PATH: &str = "/api/chat";
pub const TRANSLATE_PATH: &str = "/api/translate";
pub const FEEDBACK_PATH: &str = "/api/feedback";
pub const HINT_PATH: &str = "/api/hint";
pub const SWITCH_PROVIDER_PATH: &str = "/api/switch-provider";
pub const CONFIG_PATH: &str = "/api/config";

/// Translations always target the learner's native language.
pub const TARGET_LANGUAGE: &str = "japanese";

/// Treat blank strings the same as a missing field.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

// --- Requests ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

impl From<&Turn> for HistoryEntry {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role,
            content: turn.content.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub level: Level,
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub target_language: String,
}

impl TranslateRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target_language: TARGET_LANGUAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub text: String,
    pub level: Level,
    /// Serialized as `null` when there is no earlier teacher turn.
    pub teacher_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HintRequest {
    pub japanese_text: String,
    pub level: Level,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchProviderRequest {
    pub provider: ProviderId,
}

// --- Responses ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponse {
    pub response: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranslateResponse {
    pub translation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackResponse {
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HintResponse {
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SwitchProviderResponse {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigResponse {
    pub default_level: Option<String>,
}
