use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A proposed structured operation as emitted by the inference layer.
/// Untrusted until it has been through the validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ActionCall {
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Canonical output of response normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineResult {
    pub action_calls: Vec<ActionCall>,
    /// Conversational reply, only present when no action is warranted.
    pub text: Option<String>,
}

/// What a pending confirmation is about to delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    LedgerEntry,
    Debt,
}

/// A destructive action parked in the KV store until the user answers yes/no.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingConfirmation {
    pub subject_kind: SubjectKind,
    /// The exact action that will run on confirmation.
    pub payload: ActionCall,
    pub description: String,
}

/// One inbound chat message as handed over by the delivery layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub user_id: String,
    pub chat_id: String,
    pub message_id: String,
    pub text: String,
}

/// A prior conversation turn passed to inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: String, // "user" | "assistant"
    pub content: String,
}
