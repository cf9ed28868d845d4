/// Conversation model and database operations
///
/// A conversation groups the messages of one chat thread and belongs to
/// exactly one user. Access follows the same rule as tasks: lookups are
/// owner-scoped at the SQL level, so a foreign conversation reads as absent.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Conversation model representing one chat thread
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: Uuid,

    /// Owner of the conversation
    pub user_id: Uuid,

    /// Display title, derived from the first message
    pub title: String,

    /// When the conversation was created
    pub created_at: DateTime<Utc>,

    /// When the conversation last received a message
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Creates a new conversation for an owner
    pub async fn create(pool: &PgPool, owner_id: Uuid, title: &str) -> Result<Self, sqlx::Error> {
        let conversation = sqlx::query_as::<_, Conversation>(
            r#"
            INSERT INTO conversations (user_id, title)
            VALUES ($1, $2)
            RETURNING id, user_id, title, created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(title)
        .fetch_one(pool)
        .await?;

        Ok(conversation)
    }

    /// Finds a conversation by ID, scoped to its owner
    ///
    /// Returns None both when the conversation does not exist and when it
    /// belongs to a different owner.
    pub async fn find_for_owner(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let conversation = sqlx::query_as::<_, Conversation>(
            r#"
            SELECT id, user_id, title, created_at, updated_at
            FROM conversations
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;

        Ok(conversation)
    }

    /// Refreshes the conversation's updated_at timestamp
    ///
    /// Called whenever a message is appended so listings sort by recency.
    pub async fn touch(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE conversations SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }
}
