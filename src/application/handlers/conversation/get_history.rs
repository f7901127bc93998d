//! GetHistoryHandler - Query handler for paged conversation history.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::conversation::{pair_turns, TurnPair};
use crate::domain::foundation::{ConversationId, Timestamp};
use crate::ports::{ConversationStore, MessageStore, StoreError, TurnQuery};

/// Page size when the caller does not give one.
pub const DEFAULT_HISTORY_LIMIT: u32 = 20;

/// Largest page size served.
pub const MAX_HISTORY_LIMIT: u32 = 100;

/// Query for a page of history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetHistoryQuery {
    pub conversation_id: ConversationId,
    pub page: u32,
    pub limit: u32,
    pub before: Option<Timestamp>,
}

impl GetHistoryQuery {
    /// Builds a query, defaulting and clamping the paging inputs.
    ///
    /// Page numbers are 1-based; 0 or absent means the first page. A limit of
    /// 0 or absent means [`DEFAULT_HISTORY_LIMIT`]; anything above
    /// [`MAX_HISTORY_LIMIT`] is capped.
    pub fn new(
        conversation_id: ConversationId,
        page: Option<u32>,
        limit: Option<u32>,
        before: Option<Timestamp>,
    ) -> Self {
        let page = page.filter(|p| *p > 0).unwrap_or(1);
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .min(MAX_HISTORY_LIMIT);

        Self {
            conversation_id,
            page,
            limit,
            before,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum GetHistoryError {
    #[error("Conversation not found: {0}")]
    ConversationNotFound(ConversationId),

    #[error("Repository error: {0}")]
    Store(#[from] StoreError),
}

/// One page of paired history.
#[derive(Debug, Clone)]
pub struct HistoryPage {
    pub pairs: Vec<TurnPair>,
    pub page: u32,
    pub limit: u32,
    /// Turns matching the filter, across all pages.
    pub total: u64,
    pub pages: u64,
}

/// Handler for history queries.
pub struct GetHistoryHandler {
    conversation_store: Arc<dyn ConversationStore>,
    message_store: Arc<dyn MessageStore>,
}

impl GetHistoryHandler {
    pub fn new(
        conversation_store: Arc<dyn ConversationStore>,
        message_store: Arc<dyn MessageStore>,
    ) -> Self {
        Self {
            conversation_store,
            message_store,
        }
    }

    pub async fn handle(&self, query: GetHistoryQuery) -> Result<HistoryPage, GetHistoryError> {
        if !self.conversation_store.exists(query.conversation_id).await? {
            return Err(GetHistoryError::ConversationNotFound(query.conversation_id));
        }

        let page = self
            .message_store
            .query(
                TurnQuery::new(query.conversation_id, query.page, query.limit)
                    .before(query.before),
            )
            .await?;

        let limit = u64::from(query.limit.max(1));
        Ok(HistoryPage {
            pairs: pair_turns(page.turns),
            page: query.page,
            limit: query.limit,
            total: page.total,
            pages: page.total.div_ceil(limit),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryConversationStore, InMemoryMessageStore};
    use crate::domain::conversation::{ConversationMeta, NewTurn};

    async fn setup(turns: &[(&str, bool)]) -> GetHistoryHandler {
        let conversations = InMemoryConversationStore::new();
        conversations
            .insert(ConversationMeta::new(ConversationId::new(42)))
            .await;

        let messages = InMemoryMessageStore::new();
        for (content, is_user) in turns {
            let turn = if *is_user {
                NewTurn::user(ConversationId::new(42), *content)
            } else {
                NewTurn::assistant(ConversationId::new(42), *content)
            };
            messages.append(turn).await.unwrap();
        }

        GetHistoryHandler::new(Arc::new(conversations), Arc::new(messages))
    }

    mod paging_defaults {
        use super::*;

        #[test]
        fn absent_values_use_defaults() {
            let q = GetHistoryQuery::new(ConversationId::new(1), None, None, None);
            assert_eq!(q.page, 1);
            assert_eq!(q.limit, DEFAULT_HISTORY_LIMIT);
        }

        #[test]
        fn zero_values_use_defaults() {
            let q = GetHistoryQuery::new(ConversationId::new(1), Some(0), Some(0), None);
            assert_eq!(q.page, 1);
            assert_eq!(q.limit, DEFAULT_HISTORY_LIMIT);
        }

        #[test]
        fn limit_is_capped() {
            let q = GetHistoryQuery::new(ConversationId::new(1), Some(2), Some(5000), None);
            assert_eq!(q.page, 2);
            assert_eq!(q.limit, MAX_HISTORY_LIMIT);
        }
    }

    #[tokio::test]
    async fn pairs_turns_with_trailing_user() {
        let handler = setup(&[
            ("u1", true),
            ("a1", false),
            ("u2", true),
            ("a2", false),
            ("u3", true),
        ])
        .await;

        let page = handler
            .handle(GetHistoryQuery::new(ConversationId::new(42), Some(1), Some(10), None))
            .await
            .unwrap();

        let shape: Vec<(String, Option<String>)> = page
            .pairs
            .iter()
            .map(|p| (p.user.content.clone(), p.assistant.as_ref().map(|a| a.content.clone())))
            .collect();
        assert_eq!(
            shape,
            vec![
                ("u1".to_string(), Some("a1".to_string())),
                ("u2".to_string(), Some("a2".to_string())),
                ("u3".to_string(), None),
            ]
        );
        assert_eq!(page.total, 5);
        assert_eq!(page.pages, 1);
    }

    #[tokio::test]
    async fn pages_count_rounds_up() {
        let handler = setup(&[("u1", true), ("a1", false), ("u2", true)]).await;

        let page = handler
            .handle(GetHistoryQuery::new(ConversationId::new(42), Some(1), Some(2), None))
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.pages, 2);
        assert_eq!(page.pairs.len(), 1);
    }

    #[tokio::test]
    async fn empty_conversation_has_zero_pages() {
        let handler = setup(&[]).await;

        let page = handler
            .handle(GetHistoryQuery::new(ConversationId::new(42), None, None, None))
            .await
            .unwrap();

        assert!(page.pairs.is_empty());
        assert_eq!(page.total, 0);
        assert_eq!(page.pages, 0);
    }

    #[tokio::test]
    async fn unknown_conversation_is_not_found() {
        let handler = setup(&[]).await;

        let err = handler
            .handle(GetHistoryQuery::new(ConversationId::new(9999), None, None, None))
            .await
            .unwrap_err();

        assert!(matches!(err, GetHistoryError::ConversationNotFound(_)));
    }
}
