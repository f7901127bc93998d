//! In-memory conversation store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::conversation::ConversationMeta;
use crate::domain::foundation::ConversationId;
use crate::ports::{ConversationStore, StoreError};

/// Conversation headers held in a map.
#[derive(Debug, Clone)]
pub struct InMemoryConversationStore {
    conversations: Arc<RwLock<HashMap<ConversationId, ConversationMeta>>>,
    next_id: Arc<AtomicI64>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self {
            conversations: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }

    /// Stores a conversation under its own id, replacing any previous one.
    pub async fn insert(&self, meta: ConversationMeta) {
        self.next_id
            .fetch_max(meta.id.as_i64() + 1, Ordering::SeqCst);
        self.conversations.write().await.insert(meta.id, meta);
    }

    /// Creates a conversation with the next free id.
    pub async fn create(&self, title: Option<String>) -> ConversationMeta {
        let id = ConversationId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let mut meta = ConversationMeta::new(id);
        meta.title = title;
        self.conversations.write().await.insert(id, meta.clone());
        meta
    }

    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn exists(&self, id: ConversationId) -> Result<bool, StoreError> {
        Ok(self.conversations.read().await.contains_key(&id))
    }

    async fn get(&self, id: ConversationId) -> Result<Option<ConversationMeta>, StoreError> {
        Ok(self.conversations.read().await.get(&id).cloned())
    }
}
