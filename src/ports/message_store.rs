//! Turn persistence port.
//!
//! Append-only. Many connections write concurrently; no in-process locking is
//! applied around these calls, so implementations own their consistency.

use async_trait::async_trait;

use crate::domain::conversation::{NewTurn, Turn};
use crate::domain::foundation::{ConversationId, Timestamp};

use super::StoreError;

/// Filter and page for reading a conversation's turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnQuery {
    pub conversation_id: ConversationId,
    /// Only turns created strictly before this instant.
    pub before: Option<Timestamp>,
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
}

impl TurnQuery {
    pub fn new(conversation_id: ConversationId, page: u32, limit: u32) -> Self {
        Self {
            conversation_id,
            before: None,
            page,
            limit,
        }
    }

    pub fn before(mut self, before: Option<Timestamp>) -> Self {
        self.before = before;
        self
    }

    /// Number of matching turns to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.limit)
    }
}

/// One page of turns plus the size of the full filtered set.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnPage {
    pub turns: Vec<Turn>,
    pub total: u64,
}

/// Durable storage for turns.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a turn, assigning its id and timestamps.
    ///
    /// Ids and `created_at` must be non-decreasing in append order within a
    /// conversation.
    async fn append(&self, turn: NewTurn) -> Result<Turn, StoreError>;

    /// Turns of a conversation ordered by creation time ascending.
    async fn query(&self, query: TurnQuery) -> Result<TurnPage, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_zero_on_first_page() {
        let q = TurnQuery::new(ConversationId::new(1), 1, 20);
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn offset_advances_by_limit() {
        let q = TurnQuery::new(ConversationId::new(1), 3, 10);
        assert_eq!(q.offset(), 20);
    }

    #[test]
    fn page_zero_is_first_page() {
        let q = TurnQuery::new(ConversationId::new(1), 0, 10);
        assert_eq!(q.offset(), 0);
    }
}
