//! PostgreSQL implementation of ConversationStore.
//!
//! Conversations are created elsewhere; this adapter only reads them, plus a
//! `create` helper used for seeding.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};

use crate::domain::conversation::{ConversationMeta, TurnMetadata};
use crate::domain::foundation::{ConversationId, Timestamp};
use crate::ports::{ConversationStore, StoreError};

/// PostgreSQL implementation of ConversationStore.
#[derive(Clone)]
pub struct PostgresConversationStore {
    pool: PgPool,
}

impl PostgresConversationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a new conversation and returns it.
    pub async fn create(&self, title: Option<String>) -> Result<ConversationMeta, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO conversation (title)
            VALUES ($1)
            RETURNING id, agent_id, title, metadata, created_at, updated_at
            "#,
        )
        .bind(title)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::unavailable(format!("Failed to insert conversation: {}", e)))?;

        row_to_meta(&row)
    }
}

#[async_trait]
impl ConversationStore for PostgresConversationStore {
    async fn exists(&self, id: ConversationId) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM conversation WHERE id = $1)")
            .bind(id.as_i64())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::unavailable(format!("Failed to check conversation: {}", e)))
    }

    async fn get(&self, id: ConversationId) -> Result<Option<ConversationMeta>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, agent_id, title, metadata, created_at, updated_at
            FROM conversation
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::unavailable(format!("Failed to fetch conversation: {}", e)))?;

        row.as_ref().map(row_to_meta).transpose()
    }
}

fn row_to_meta(row: &PgRow) -> Result<ConversationMeta, StoreError> {
    let corrupt = |e: sqlx::Error| StoreError::corrupt(format!("conversation row: {}", e));

    let id: i64 = row.try_get("id").map_err(corrupt)?;
    let agent_id: Option<i64> = row.try_get("agent_id").map_err(corrupt)?;
    let title: Option<String> = row.try_get("title").map_err(corrupt)?;
    let metadata: Option<sqlx::types::Json<TurnMetadata>> =
        row.try_get("metadata").map_err(corrupt)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(corrupt)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(corrupt)?;

    Ok(ConversationMeta {
        id: ConversationId::new(id),
        agent_id,
        title,
        metadata: metadata.map(|m| m.0).unwrap_or_default(),
        created_at: Timestamp::from_datetime(created_at),
        updated_at: Timestamp::from_datetime(updated_at),
    })
}
