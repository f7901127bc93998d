//! SendMessage command handler.
//!
//! Request/response counterpart of the streaming exchange: the whole reply is
//! returned at once instead of being chunked onto a connection.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::conversation::{NewTurn, Turn, TurnMetadata, TurnType};
use crate::domain::foundation::{ConversationId, SubjectId};
use crate::ports::{ConversationStore, MessageStore, ReplyError, ReplyGenerator, StoreError};

/// Command to send a message in a conversation.
#[derive(Debug, Clone)]
pub struct SendMessageCommand {
    pub conversation_id: ConversationId,
    /// The authenticated sender.
    pub subject_id: SubjectId,
    pub content: String,
    pub turn_type: TurnType,
    pub metadata: TurnMetadata,
}

impl SendMessageCommand {
    pub fn new(
        conversation_id: ConversationId,
        subject_id: SubjectId,
        content: impl Into<String>,
    ) -> Self {
        Self {
            conversation_id,
            subject_id,
            content: content.into(),
            turn_type: TurnType::text(),
            metadata: TurnMetadata::new(),
        }
    }

    pub fn with_type(mut self, turn_type: TurnType) -> Self {
        self.turn_type = turn_type;
        self
    }

    pub fn with_metadata(mut self, metadata: TurnMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Errors that can occur when sending a message.
#[derive(Debug, Clone, Error)]
pub enum SendMessageError {
    /// Message content is empty or whitespace only.
    #[error("Validation error: message content cannot be empty")]
    EmptyContent,

    #[error("Validation error: message content exceeds {max} characters")]
    ContentTooLong { max: usize },

    #[error("Conversation not found: {0}")]
    ConversationNotFound(ConversationId),

    #[error("Failed to persist user turn: {0}")]
    UserTurnNotPersisted(#[source] StoreError),

    #[error("Reply generation failed: {0}")]
    ReplyFailed(#[from] ReplyError),

    #[error("Failed to persist assistant turn: {0}")]
    AssistantTurnNotPersisted(#[source] StoreError),

    #[error("Repository error: {0}")]
    Store(#[from] StoreError),
}

/// Result of sending a message.
#[derive(Debug, Clone)]
pub struct SendMessageResult {
    pub user_turn: Turn,
    pub assistant_turn: Turn,
}

/// Handler for SendMessage commands.
pub struct SendMessageHandler {
    conversation_store: Arc<dyn ConversationStore>,
    message_store: Arc<dyn MessageStore>,
    reply_generator: Arc<dyn ReplyGenerator>,
    max_content_chars: usize,
}

impl SendMessageHandler {
    pub fn new(
        conversation_store: Arc<dyn ConversationStore>,
        message_store: Arc<dyn MessageStore>,
        reply_generator: Arc<dyn ReplyGenerator>,
        max_content_chars: usize,
    ) -> Self {
        Self {
            conversation_store,
            message_store,
            reply_generator,
            max_content_chars,
        }
    }

    pub async fn handle(
        &self,
        cmd: SendMessageCommand,
    ) -> Result<SendMessageResult, SendMessageError> {
        if cmd.content.trim().is_empty() {
            return Err(SendMessageError::EmptyContent);
        }
        if cmd.content.chars().count() > self.max_content_chars {
            return Err(SendMessageError::ContentTooLong {
                max: self.max_content_chars,
            });
        }

        if !self.conversation_store.exists(cmd.conversation_id).await? {
            return Err(SendMessageError::ConversationNotFound(cmd.conversation_id));
        }

        let user_turn = self
            .message_store
            .append(
                NewTurn::user(cmd.conversation_id, cmd.content)
                    .with_type(cmd.turn_type)
                    .with_metadata(cmd.metadata),
            )
            .await
            .map_err(SendMessageError::UserTurnNotPersisted)?;

        let reply = self
            .reply_generator
            .generate_reply(cmd.conversation_id, &user_turn.content)
            .await?;

        let assistant_turn = self
            .message_store
            .append(NewTurn::assistant(cmd.conversation_id, reply))
            .await
            .map_err(SendMessageError::AssistantTurnNotPersisted)?;

        tracing::info!(
            conversation_id = %cmd.conversation_id,
            subject_id = %cmd.subject_id,
            user_turn_id = %user_turn.id,
            assistant_turn_id = %assistant_turn.id,
            "Message exchanged"
        );

        Ok(SendMessageResult {
            user_turn,
            assistant_turn,
        })
    }
}
