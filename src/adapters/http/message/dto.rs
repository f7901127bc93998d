//! HTTP DTOs for message endpoints.
//!
//! These types decouple the HTTP API from domain types, allowing independent evolution.

use serde::{Deserialize, Serialize};

use crate::application::handlers::HistoryPage;
use crate::domain::conversation::{Role, Turn, TurnMetadata, TurnPair};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /api/message/:conversation_id/send_message`.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
    /// Turn type; `text` when absent.
    #[serde(rename = "type", default)]
    pub turn_type: Option<String>,
    #[serde(default)]
    pub metadata: Option<TurnMetadata>,
}

/// Query parameters for history retrieval.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryParams {
    /// 1-based page number.
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    /// RFC 3339 cursor; only turns strictly before it are returned.
    #[serde(default)]
    pub before: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// View of a stored turn.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnView {
    pub id: i64,
    pub conversation_id: i64,
    pub role: Role,
    #[serde(rename = "type")]
    pub turn_type: String,
    pub content: String,
    #[serde(skip_serializing_if = "TurnMetadata::is_empty")]
    pub metadata: TurnMetadata,
    pub created_at: String,
}

impl From<&Turn> for TurnView {
    fn from(turn: &Turn) -> Self {
        Self {
            id: turn.id.as_i64(),
            conversation_id: turn.conversation_id.as_i64(),
            role: turn.role,
            turn_type: turn.turn_type.to_string(),
            content: turn.content.clone(),
            metadata: turn.metadata.clone(),
            created_at: turn.created_at.to_rfc3339(),
        }
    }
}

/// Response of a request/response exchange.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub user_message: TurnView,
    pub agent_message: TurnView,
}

/// One user turn and its reply, if any.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub user_message: TurnView,
    /// `null` for a trailing unanswered user turn.
    pub agent_message: Option<TurnView>,
}

impl From<&TurnPair> for HistoryEntry {
    fn from(pair: &TurnPair) -> Self {
        Self {
            user_message: TurnView::from(&pair.user),
            agent_message: pair.assistant.as_ref().map(TurnView::from),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginationView {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

/// Response of the history endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryEntry>,
    pub pagination: PaginationView,
}

impl From<&HistoryPage> for HistoryResponse {
    fn from(page: &HistoryPage) -> Self {
        Self {
            history: page.pairs.iter().map(HistoryEntry::from).collect(),
            pagination: PaginationView {
                page: page.page,
                limit: page.limit,
                total: page.total,
                pages: page.pages,
            },
        }
    }
}

/// Error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        Self::new("NOT_FOUND", format!("{} not found: {}", resource, id))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::NewTurn;
    use crate::domain::foundation::{ConversationId, Timestamp, TurnId};

    fn turn(id: i64, new: NewTurn) -> Turn {
        new.into_turn(TurnId::new(id), Timestamp::now())
    }

    mod send_message_request {
        use super::*;

        #[test]
        fn type_and_metadata_are_optional() {
            let req: SendMessageRequest = serde_json::from_str(r#"{"content":"hi"}"#).unwrap();
            assert_eq!(req.content, "hi");
            assert!(req.turn_type.is_none());
            assert!(req.metadata.is_none());
        }

        #[test]
        fn reads_type_field() {
            let req: SendMessageRequest =
                serde_json::from_str(r#"{"content":"hi","type":"image","metadata":{"k":1}}"#)
                    .unwrap();
            assert_eq!(req.turn_type.as_deref(), Some("image"));
            assert_eq!(req.metadata.unwrap()["k"], 1);
        }
    }

    mod turn_view {
        use super::*;

        #[test]
        fn serializes_to_camel_case() {
            let view = TurnView::from(&turn(7, NewTurn::user(ConversationId::new(42), "hello")));

            let json = serde_json::to_value(&view).unwrap();
            assert_eq!(json["id"], 7);
            assert_eq!(json["conversationId"], 42);
            assert_eq!(json["role"], "user");
            assert_eq!(json["type"], "text");
            assert!(json.get("createdAt").is_some());
            assert!(json.get("metadata").is_none());
        }
    }

    mod history_entry {
        use super::*;

        #[test]
        fn unanswered_turn_has_null_agent_message() {
            let pair = TurnPair {
                user: turn(1, NewTurn::user(ConversationId::new(42), "u")),
                assistant: None,
            };

            let json = serde_json::to_value(HistoryEntry::from(&pair)).unwrap();
            assert!(json["agentMessage"].is_null());
            assert_eq!(json["userMessage"]["content"], "u");
        }
    }
}
