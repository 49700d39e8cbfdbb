//! SQLite conversation store.
//!
//! Implements `ConversationStore` from `patter-core` using sqlx with split
//! read/write pools. The conversation row carries the metadata snapshot as
//! a JSON column; messages live in their own table and are append-only.

use patter_core::store::ConversationStore;
use patter_types::conversation::{Conversation, Message, MessageRole};
use patter_types::error::StoreError;
use patter_types::metadata::ConversationMetadata;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ConversationStore`.
pub struct SqliteConversationStore {
    pool: DatabasePool,
}

impl SqliteConversationStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ConversationRow {
    id: String,
    domain: String,
    metadata: String,
    created_at: String,
    updated_at: String,
}

impl ConversationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            domain: row.try_get("domain")?,
            metadata: row.try_get("metadata")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_conversation(self, messages: Vec<Message>) -> Result<Conversation, StoreError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| StoreError::Query(format!("invalid conversation id: {e}")))?;
        let metadata: ConversationMetadata = serde_json::from_str(&self.metadata)
            .map_err(|e| StoreError::Serialization(format!("invalid metadata: {e}")))?;

        Ok(Conversation {
            id,
            domain: self.domain,
            messages,
            metadata,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct MessageRow {
    id: String,
    role: String,
    content: String,
    tool_calls: String,
    created_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            tool_calls: row.try_get("tool_calls")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<Message, StoreError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| StoreError::Query(format!("invalid message id: {e}")))?;
        let role: MessageRole = self.role.parse().map_err(|e: String| StoreError::Query(e))?;
        let tool_calls = serde_json::from_str(&self.tool_calls)
            .map_err(|e| StoreError::Serialization(format!("invalid tool_calls: {e}")))?;

        Ok(Message {
            id,
            role,
            content: self.content,
            tool_calls,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// ---------------------------------------------------------------------------
// ConversationStore implementation
// ---------------------------------------------------------------------------

impl ConversationStore for SqliteConversationStore {
    async fn load(&self, conversation_id: &Uuid) -> Result<Option<Conversation>, StoreError> {
        let row = sqlx::query("SELECT * FROM conversations WHERE id = ?")
            .bind(conversation_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let conversation_row =
            ConversationRow::from_row(&row).map_err(|e| StoreError::Query(e.to_string()))?;

        // Message ids are v7, so id order is insertion order.
        let message_rows =
            sqlx::query("SELECT * FROM messages WHERE conversation_id = ? ORDER BY id ASC")
                .bind(conversation_id.to_string())
                .fetch_all(&self.pool.reader)
                .await
                .map_err(|e| StoreError::Query(e.to_string()))?;

        let mut messages = Vec::with_capacity(message_rows.len());
        for row in &message_rows {
            let message_row =
                MessageRow::from_row(row).map_err(|e| StoreError::Query(e.to_string()))?;
            messages.push(message_row.into_message()?);
        }

        Ok(Some(conversation_row.into_conversation(messages)?))
    }

    async fn save(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let metadata = serde_json::to_string(&conversation.metadata)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        sqlx::query(
            r#"INSERT INTO conversations (id, domain, metadata, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                   metadata = excluded.metadata,
                   updated_at = excluded.updated_at"#,
        )
        .bind(conversation.id.to_string())
        .bind(&conversation.domain)
        .bind(&metadata)
        .bind(format_datetime(&conversation.created_at))
        .bind(format_datetime(&conversation.updated_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        for message in &conversation.messages {
            let tool_calls = serde_json::to_string(&message.tool_calls)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;

            // Message rows are immutable once written; replaying an
            // already-saved message is a no-op.
            sqlx::query(
                r#"INSERT OR IGNORE INTO messages (id, conversation_id, role, content, tool_calls, created_at)
                   VALUES (?, ?, ?, ?, ?, ?)"#,
            )
            .bind(message.id.to_string())
            .bind(conversation.id.to_string())
            .bind(message.role.to_string())
            .bind(&message.content)
            .bind(&tool_calls)
            .bind(format_datetime(&message.created_at))
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }
}
