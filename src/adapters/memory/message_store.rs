//! In-memory message store.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::conversation::{NewTurn, Turn};
use crate::domain::foundation::{Timestamp, TurnId};
use crate::ports::{MessageStore, StoreError, TurnPage, TurnQuery};

#[derive(Debug, Default)]
struct Inner {
    turns: Vec<Turn>,
    last_id: i64,
}

/// Turns kept in append order behind one lock.
///
/// Ids are sequential and `created_at` never goes backwards, so append order,
/// id order and timestamp order always agree.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMessageStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored turn, in append order.
    pub async fn all(&self) -> Vec<Turn> {
        self.inner.read().await.turns.clone()
    }

    pub async fn count(&self) -> usize {
        self.inner.read().await.turns.len()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(&self, turn: NewTurn) -> Result<Turn, StoreError> {
        let mut inner = self.inner.write().await;

        let now = match inner.turns.last() {
            Some(last) if !last.created_at.is_before(&Timestamp::now()) => last.created_at,
            _ => Timestamp::now(),
        };
        inner.last_id += 1;
        let stored = turn.into_turn(TurnId::new(inner.last_id), now);
        inner.turns.push(stored.clone());

        Ok(stored)
    }

    async fn query(&self, query: TurnQuery) -> Result<TurnPage, StoreError> {
        let inner = self.inner.read().await;

        let matching: Vec<&Turn> = inner
            .turns
            .iter()
            .filter(|t| t.conversation_id == query.conversation_id)
            .filter(|t| query.before.map_or(true, |b| t.created_at.is_before(&b)))
            .collect();

        let total = matching.len() as u64;
        let turns = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(TurnPage { turns, total })
    }
}
