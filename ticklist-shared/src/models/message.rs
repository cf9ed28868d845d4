/// Message model and database operations
///
/// Messages are append-only rows inside a conversation. Ownership is not
/// stored per message; it flows through the parent conversation, which
/// callers must resolve with an owner-scoped lookup before touching
/// messages.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "message_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Sent by the human user
    User,

    /// Produced by the agent
    Assistant,
}

impl MessageRole {
    /// Role as a string for display and serialization
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// Message model representing one transcript entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    /// Unique message ID
    pub id: Uuid,

    /// Conversation this message belongs to
    pub conversation_id: Uuid,

    /// Author role
    pub role: MessageRole,

    /// Message text
    pub content: String,

    /// When the message was recorded
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Appends a message to a conversation
    pub async fn append(
        pool: &PgPool,
        conversation_id: Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<Self, sqlx::Error> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (conversation_id, role, content)
            VALUES ($1, $2, $3)
            RETURNING id, conversation_id, role, content, created_at
            "#,
        )
        .bind(conversation_id)
        .bind(role)
        .bind(content)
        .fetch_one(pool)
        .await?;

        Ok(message)
    }

    /// Lists a conversation's messages in chronological order
    pub async fn list_for_conversation(
        pool: &PgPool,
        conversation_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, role, content, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(conversation_id)
        .fetch_all(pool)
        .await?;

        Ok(messages)
    }
}
