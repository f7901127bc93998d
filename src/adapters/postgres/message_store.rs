//! PostgreSQL implementation of MessageStore.
//!
//! Turns live in the `message` table. Ordering is `created_at, id`; ids come
//! from a sequence, so turns inserted within the same clock tick still keep
//! their append order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, types::Json, PgPool, Row};

use crate::domain::conversation::{NewTurn, Role, Turn, TurnMetadata, TurnType};
use crate::domain::foundation::{ConversationId, Timestamp, TurnId};
use crate::ports::{MessageStore, StoreError, TurnPage, TurnQuery};

/// PostgreSQL implementation of MessageStore.
#[derive(Clone)]
pub struct PostgresMessageStore {
    pool: PgPool,
}

impl PostgresMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for PostgresMessageStore {
    async fn append(&self, turn: NewTurn) -> Result<Turn, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO message (conversation_id, role, content, type, metadata)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, conversation_id, role, content, type, metadata, created_at, updated_at
            "#,
        )
        .bind(turn.conversation_id.as_i64())
        .bind(turn.role.as_str())
        .bind(&turn.content)
        .bind(turn.turn_type.as_str())
        .bind(Json(&turn.metadata))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::unavailable(format!("Failed to insert turn: {}", e)))?;

        row_to_turn(&row)
    }

    async fn query(&self, query: TurnQuery) -> Result<TurnPage, StoreError> {
        let before = query.before.as_ref().map(|t| *t.as_datetime());

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM message
            WHERE conversation_id = $1
              AND ($2::timestamptz IS NULL OR created_at < $2)
            "#,
        )
        .bind(query.conversation_id.as_i64())
        .bind(before)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::unavailable(format!("Failed to count turns: {}", e)))?;

        let rows = sqlx::query(
            r#"
            SELECT id, conversation_id, role, content, type, metadata, created_at, updated_at
            FROM message
            WHERE conversation_id = $1
              AND ($2::timestamptz IS NULL OR created_at < $2)
            ORDER BY created_at ASC, id ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(query.conversation_id.as_i64())
        .bind(before)
        .bind(i64::from(query.limit))
        .bind(i64::try_from(query.offset()).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::unavailable(format!("Failed to fetch turns: {}", e)))?;

        let turns = rows.iter().map(row_to_turn).collect::<Result<Vec<_>, _>>()?;

        Ok(TurnPage {
            turns,
            total: u64::try_from(total).unwrap_or(0),
        })
    }
}

fn row_to_turn(row: &PgRow) -> Result<Turn, StoreError> {
    let corrupt = |e: sqlx::Error| StoreError::corrupt(format!("message row: {}", e));

    let id: i64 = row.try_get("id").map_err(corrupt)?;
    let conversation_id: i64 = row.try_get("conversation_id").map_err(corrupt)?;
    let role: String = row.try_get("role").map_err(corrupt)?;
    let content: String = row.try_get("content").map_err(corrupt)?;
    let turn_type: String = row.try_get("type").map_err(corrupt)?;
    let metadata: Option<Json<TurnMetadata>> = row.try_get("metadata").map_err(corrupt)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(corrupt)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(corrupt)?;

    Ok(Turn {
        id: TurnId::new(id),
        conversation_id: ConversationId::new(conversation_id),
        role: parse_role(&role)?,
        content,
        turn_type: parse_turn_type(turn_type),
        metadata: metadata.map(|m| m.0).unwrap_or_default(),
        created_at: Timestamp::from_datetime(created_at),
        updated_at: Timestamp::from_datetime(updated_at),
    })
}

fn parse_role(raw: &str) -> Result<Role, StoreError> {
    raw.parse()
        .map_err(|_| StoreError::corrupt(format!("unknown role '{}'", raw)))
}

/// Blank types in old rows read as `text`.
fn parse_turn_type(raw: String) -> TurnType {
    TurnType::new(raw).unwrap_or_default()
}
