//! Conversation lookup port.

use async_trait::async_trait;

use crate::domain::conversation::ConversationMeta;
use crate::domain::foundation::ConversationId;

use super::StoreError;

/// Read access to conversation headers.
///
/// Conversations are created elsewhere; the streaming core only needs to
/// know whether one exists before binding a session to it.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Returns true if the conversation exists.
    async fn exists(&self, id: ConversationId) -> Result<bool, StoreError>;

    /// Returns the conversation header, or `None` if not found.
    async fn get(&self, id: ConversationId) -> Result<Option<ConversationMeta>, StoreError>;
}
