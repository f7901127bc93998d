//! Error type shared by the persistence ports.

use thiserror::Error;

use crate::domain::foundation::ConversationId;

/// Failure reported by a conversation or message store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The referenced conversation does not exist.
    #[error("Conversation {0} not found")]
    ConversationNotFound(ConversationId),

    /// The store could not be reached or the query failed.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be mapped back into the domain.
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt(message.into())
    }
}
