//! Per-connection session and conversation metadata.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::foundation::{ConnectionId, ConversationId, SubjectId, Timestamp};

/// Binding of one live connection to its conversation and principal.
///
/// Only constructed after the handshake has both verified the credential and
/// confirmed the conversation exists. Both bindings are fixed for the life of
/// the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    connection_id: ConnectionId,
    conversation_id: ConversationId,
    subject_id: SubjectId,
}

impl Session {
    pub fn new(
        connection_id: ConnectionId,
        conversation_id: ConversationId,
        subject_id: SubjectId,
    ) -> Self {
        Self {
            connection_id,
            conversation_id,
            subject_id,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    pub fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }
}

/// Stored conversation header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMeta {
    pub id: ConversationId,
    pub agent_id: Option<i64>,
    pub title: Option<String>,
    pub metadata: Map<String, Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ConversationMeta {
    /// Header with no agent, title or metadata, stamped now.
    pub fn new(id: ConversationId) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            agent_id: None,
            title: None,
            metadata: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_agent(mut self, agent_id: i64) -> Self {
        self.agent_id = Some(agent_id);
        self
    }
}
