//! Conversation and message types for Patter.
//!
//! A `Conversation` is the unit of persistence: an ordered message sequence
//! plus exactly one owned `ConversationMetadata`. It is created on the first
//! turn, mutated every turn, and never deleted by this engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ToolError;
use crate::metadata::ConversationMetadata;

// Re-export MessageRole from llm (persisted messages share the model's roles).
pub use crate::llm::MessageRole;

/// A multi-turn conversation scoped to one tenant domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    /// Normalized tenant domain this conversation belongs to.
    pub domain: String,
    pub messages: Vec<Message>,
    pub metadata: ConversationMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a fresh conversation for a tenant domain.
    pub fn new(domain: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            domain: domain.into(),
            messages: Vec::new(),
            metadata: ConversationMetadata::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message and bump `updated_at`.
    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    /// Number of completed user turns so far.
    pub fn user_turn_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .count()
    }
}

/// A single message within a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: MessageRole,
    pub content: String,
    /// Tool calls executed while producing this message (assistant only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRecord>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            role: MessageRole::User,
            content: content.into(),
            tool_calls: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            role: MessageRole::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// An assistant message carrying the tool calls gathered during its turn.
    pub fn assistant_with_tools(
        content: impl Into<String>,
        tool_calls: Vec<ToolCallRecord>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            role: MessageRole::Assistant,
            content: content.into(),
            tool_calls,
            created_at: Utc::now(),
        }
    }
}

/// Record of one executed tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// The model-assigned call id; results are re-associated by this id.
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
    pub outcome: ToolOutcome,
    pub duration_ms: u64,
}

/// Result-or-error of one tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success {
        value: serde_json::Value,
    },
    Failure {
        kind: ToolFailureKind,
        message: String,
    },
}

impl ToolOutcome {
    pub fn success(value: serde_json::Value) -> Self {
        ToolOutcome::Success { value }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success { .. })
    }

    /// Content string fed back to the model for this outcome.
    ///
    /// Failures keep their kind tag so the model can distinguish "the tool
    /// broke" from "the tool found nothing".
    pub fn as_model_content(&self) -> String {
        match self {
            ToolOutcome::Success { value } => value.to_string(),
            ToolOutcome::Failure { kind, message } => {
                serde_json::json!({ "error": { "kind": kind, "message": message } }).to_string()
            }
        }
    }
}

impl From<ToolError> for ToolOutcome {
    fn from(err: ToolError) -> Self {
        let kind = match &err {
            ToolError::Timeout { .. } => ToolFailureKind::Timeout,
            ToolError::UnknownTool(_) => ToolFailureKind::UnknownTool,
            ToolError::InvalidArguments { .. } => ToolFailureKind::InvalidArguments,
            ToolError::Execution(_) => ToolFailureKind::Execution,
            ToolError::Cancelled => ToolFailureKind::Cancelled,
        };
        ToolOutcome::Failure {
            kind,
            message: err.to_string(),
        }
    }
}

/// Classification of tool failures surfaced to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolFailureKind {
    Timeout,
    UnknownTool,
    InvalidArguments,
    Execution,
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_conversation_is_empty() {
        let conversation = Conversation::new("shop.example.com");
        assert_eq!(conversation.domain, "shop.example.com");
        assert!(conversation.messages.is_empty());
        assert_eq!(conversation.user_turn_count(), 0);
        assert_eq!(conversation.metadata, ConversationMetadata::default());
    }

    #[test]
    fn test_push_message_bumps_updated_at() {
        let mut conversation = Conversation::new("shop.example.com");
        let before = conversation.updated_at;
        conversation.push_message(Message::user("hello"));
        assert_eq!(conversation.messages.len(), 1);
        assert!(conversation.updated_at >= before);
        assert_eq!(conversation.user_turn_count(), 1);
    }

    #[test]
    fn test_tool_outcome_from_tool_error() {
        let outcome: ToolOutcome = ToolError::Timeout {
            name: "search_products".to_string(),
            timeout_ms: 10_000,
        }
        .into();
        match outcome {
            ToolOutcome::Failure { kind, message } => {
                assert_eq!(kind, ToolFailureKind::Timeout);
                assert!(message.contains("search_products"));
            }
            ToolOutcome::Success { .. } => panic!("expected Failure"),
        }
    }

    #[test]
    fn test_tool_outcome_serde_tagging() {
        let outcome = ToolOutcome::success(serde_json::json!({"count": 3}));
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"status\":\"success\""));
        let parsed: ToolOutcome = serde_json::from_str(&json).unwrap();
        assert!(parsed.is_success());
    }

    #[test]
    fn test_failure_model_content_keeps_kind() {
        let outcome = ToolOutcome::Failure {
            kind: ToolFailureKind::Execution,
            message: "upstream 500".to_string(),
        };
        let content = outcome.as_model_content();
        assert!(content.contains("\"kind\":\"execution\""));
        assert!(content.contains("upstream 500"));
    }

    #[test]
    fn test_message_serde_roundtrip_with_tool_calls() {
        let message = Message::assistant_with_tools(
            "Here are three options.",
            vec![ToolCallRecord {
                id: "call_1".to_string(),
                name: "search_products".to_string(),
                arguments: serde_json::json!({"query": "mug"}),
                outcome: ToolOutcome::success(serde_json::json!([{"id": "p1"}])),
                duration_ms: 120,
            }],
        );
        let json = serde_json::to_string(&message).unwrap();
        let parsed: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.tool_calls.len(), 1);
        assert_eq!(parsed.tool_calls[0].name, "search_products");
        assert!(parsed.tool_calls[0].outcome.is_success());
    }
}
