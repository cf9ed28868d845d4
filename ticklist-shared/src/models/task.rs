/// Task model and database operations
///
/// Tasks are the core entity of Ticklist. Every task is bound to exactly one
/// owner, assigned from the authenticated subject at creation time and never
/// settable by client input.
///
/// Every single-row operation here takes the owner id and folds it into the
/// `WHERE` clause (`id = $1 AND user_id = $2`). That one query shape is the
/// ownership check: a task owned by someone else produces the same "no row"
/// outcome as a task that never existed, so callers cannot distinguish the
/// two.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(200) NOT NULL CHECK (char_length(title) >= 1),
///     description TEXT,
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Maximum accepted title length in characters
pub const MAX_TITLE_LENGTH: usize = 200;

/// Task model representing a to-do item
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Owner of the task; set once at creation
    pub user_id: Uuid,

    /// Task title (1-200 characters)
    pub title: String,

    /// Optional detailed description
    pub description: Option<String>,

    /// Completion status
    pub completed: bool,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Owner (always the authenticated subject, never client input)
    pub user_id: Uuid,

    /// Task title
    pub title: String,

    /// Optional description
    pub description: Option<String>,
}

/// Input for updating a task
///
/// All fields are optional; only provided fields are changed. The owner
/// cannot be patched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    /// New title
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New completion status
    pub completed: Option<bool>,
}

impl UpdateTask {
    /// Whether the patch changes anything at all
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }
}

/// Filter and pagination options for listing tasks
#[derive(Debug, Clone, Copy)]
pub struct TaskFilter {
    /// Filter by completion status (None returns all tasks)
    pub completed: Option<bool>,

    /// Maximum number of tasks to return
    pub limit: i64,

    /// Number of tasks to skip
    pub offset: i64,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            completed: None,
            limit: 10,
            offset: 0,
        }
    }
}

impl Task {
    /// Creates a new task owned by `data.user_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the owner does not exist (foreign key violation)
    /// or the database operation fails.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (user_id, title, description)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, title, description, completed, created_at, updated_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.title)
        .bind(data.description)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID, scoped to its owner
    ///
    /// Returns None both when the task does not exist and when it belongs to
    /// a different owner.
    pub async fn find_for_owner(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, title, description, completed, created_at, updated_at
            FROM tasks
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Finds an owner's most recent task matching a title, case-insensitively
    ///
    /// Used by the chat surface, where tasks are referred to by name rather
    /// than id. Scoped to the owner like every other lookup.
    pub async fn find_by_title_for_owner(
        pool: &PgPool,
        owner_id: Uuid,
        title: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, title, description, completed, created_at, updated_at
            FROM tasks
            WHERE user_id = $1 AND LOWER(title) = LOWER($2)
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(owner_id)
        .bind(title)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists tasks for an owner, newest first
    ///
    /// Applies the optional completion filter and pagination from `filter`.
    pub async fn list_for_owner(
        pool: &PgPool,
        owner_id: Uuid,
        filter: TaskFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = match filter.completed {
            Some(completed) => {
                sqlx::query_as::<_, Task>(
                    r#"
                    SELECT id, user_id, title, description, completed, created_at, updated_at
                    FROM tasks
                    WHERE user_id = $1 AND completed = $2
                    ORDER BY created_at DESC
                    LIMIT $3 OFFSET $4
                    "#,
                )
                .bind(owner_id)
                .bind(completed)
                .bind(filter.limit)
                .bind(filter.offset)
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Task>(
                    r#"
                    SELECT id, user_id, title, description, completed, created_at, updated_at
                    FROM tasks
                    WHERE user_id = $1
                    ORDER BY created_at DESC
                    LIMIT $2 OFFSET $3
                    "#,
                )
                .bind(owner_id)
                .bind(filter.limit)
                .bind(filter.offset)
                .fetch_all(pool)
                .await?
            }
        };

        Ok(tasks)
    }

    /// Counts an owner's tasks, honoring the completion filter
    pub async fn count_for_owner(
        pool: &PgPool,
        owner_id: Uuid,
        completed: Option<bool>,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = match completed {
            Some(completed) => {
                sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE user_id = $1 AND completed = $2")
                    .bind(owner_id)
                    .bind(completed)
                    .fetch_one(pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE user_id = $1")
                    .bind(owner_id)
                    .fetch_one(pool)
                    .await?
            }
        };

        Ok(count)
    }

    /// Applies a partial patch to an owner's task
    ///
    /// Only non-None fields in `data` are written; `updated_at` is refreshed
    /// on every successful mutation. Returns None when the task does not
    /// exist for this owner (absent or owned by someone else).
    pub async fn update_for_owner(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build the update dynamically from the fields present in the patch
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.completed.is_some() {
            bind_count += 1;
            query.push_str(&format!(", completed = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 AND user_id = $2 \
             RETURNING id, user_id, title, description, completed, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id).bind(owner_id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(completed) = data.completed {
            q = q.bind(completed);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Deletes an owner's task
    ///
    /// # Returns
    ///
    /// True if a row was deleted; false when the task does not exist for
    /// this owner. Deleting the same id twice returns false the second time,
    /// indistinguishable from a task that never existed.
    pub async fn delete_for_owner(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
