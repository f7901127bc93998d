//! Reply generation port.
//!
//! The seam where a text-generation backend attaches. Implementations return
//! the complete reply; chunking for display happens in the caller.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::ConversationId;

/// Failure to produce a reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplyError {
    #[error("Reply backend unavailable: {0}")]
    Unavailable(String),

    #[error("Reply rejected: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate_reply(
        &self,
        conversation_id: ConversationId,
        user_content: &str,
    ) -> Result<String, ReplyError>;
}
