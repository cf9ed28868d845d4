/// Task CRUD endpoints
///
/// All five operations require a verified token and are scoped to the
/// authenticated subject. The owner of a new task is always the context
/// subject; nothing in any request body can name a different owner.
///
/// A task that exists but belongs to another user produces the same 404 as
/// a task that does not exist. This is intentional: returning 403 for the
/// mismatch would confirm the row exists.
///
/// # Endpoints
///
/// - `GET /tasks` - List with pagination and completion filter
/// - `POST /tasks` - Create
/// - `GET /tasks/:id` - Fetch one
/// - `PUT /tasks/:id` - Partial update
/// - `DELETE /tasks/:id` - Delete
use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ticklist_shared::{
    auth::middleware::AuthContext,
    db::with_retry,
    models::task::{CreateTask, Task, TaskFilter, UpdateTask},
};
use uuid::Uuid;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Task title (1-200 characters)
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    /// Optional description
    pub description: Option<String>,
}

/// Update task request (partial patch)
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    /// New title
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New completion status
    pub completed: Option<bool>,
}

/// List query parameters
#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    /// Number of tasks per page (1-100, default 10)
    pub limit: Option<i64>,

    /// Number of tasks to skip (default 0)
    pub offset: Option<i64>,

    /// Filter by completion status
    pub completed: Option<bool>,
}

/// Task response body
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    /// Task ID
    pub id: Uuid,

    /// Title
    pub title: String,

    /// Description
    pub description: Option<String>,

    /// Completion status
    pub completed: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            completed: task.completed,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// List response with pagination metadata
#[derive(Debug, Serialize)]
pub struct ListTasksResponse {
    /// Tasks on this page, newest first
    pub tasks: Vec<TaskResponse>,

    /// Total number of matching tasks
    pub total: i64,

    /// Applied page size
    pub limit: i64,

    /// Applied offset
    pub offset: i64,
}

impl ListTasksQuery {
    /// Validates pagination bounds and resolves defaults
    fn into_filter(self) -> Result<TaskFilter, ApiError> {
        let limit = self.limit.unwrap_or(10);
        let offset = self.offset.unwrap_or(0);

        let mut errors = Vec::new();
        if !(1..=100).contains(&limit) {
            errors.push(ValidationErrorDetail {
                field: "limit".to_string(),
                message: "Limit must be between 1 and 100".to_string(),
            });
        }
        if offset < 0 {
            errors.push(ValidationErrorDetail {
                field: "offset".to_string(),
                message: "Offset must not be negative".to_string(),
            });
        }

        if !errors.is_empty() {
            return Err(ApiError::ValidationError(errors));
        }

        Ok(TaskFilter {
            completed: self.completed,
            limit,
            offset,
        })
    }
}

/// List tasks for the authenticated user
///
/// Returns only the subject's own tasks, newest first, with the total count
/// for pagination.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<ListTasksResponse>> {
    let filter = query.into_filter()?;

    let tasks = with_retry(|| Task::list_for_owner(&state.db, auth.subject, filter)).await?;
    let total = with_retry(|| Task::count_for_owner(&state.db, auth.subject, filter.completed))
        .await?;

    Ok(Json(ListTasksResponse {
        tasks: tasks.into_iter().map(TaskResponse::from).collect(),
        total,
        limit: filter.limit,
        offset: filter.offset,
    }))
}

/// Create a task owned by the authenticated user
///
/// The owner comes from the verified token, unconditionally.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    req.validate()?;

    let task = with_retry(|| {
        Task::create(
            &state.db,
            CreateTask {
                user_id: auth.subject,
                title: req.title.clone(),
                description: req.description.clone(),
            },
        )
    })
    .await?;

    tracing::debug!(user_id = %auth.subject, task_id = %task.id, "Task created");

    Ok((StatusCode::CREATED, Json(TaskResponse::from(task))))
}

/// Fetch a single task
///
/// # Errors
///
/// - `404 Not Found`: Task absent, or owned by a different user
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskResponse>> {
    let task = with_retry(|| Task::find_for_owner(&state.db, id, auth.subject))
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(TaskResponse::from(task)))
}

/// Apply a partial update to a task
///
/// Only title, description, and completion can change; `updated_at` is
/// refreshed on every successful mutation.
///
/// # Errors
///
/// - `404 Not Found`: Task absent, or owned by a different user
/// - `422 Unprocessable Entity`: Title present but not 1-200 characters
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    req.validate()?;

    let patch = UpdateTask {
        title: req.title,
        description: req.description,
        completed: req.completed,
    };

    let task = with_retry(|| Task::update_for_owner(&state.db, id, auth.subject, patch.clone()))
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(TaskResponse::from(task)))
}

/// Delete a task
///
/// Deleting an id that no longer exists (including one just deleted) yields
/// the same 404 as an id that never existed.
///
/// # Errors
///
/// - `404 Not Found`: Task absent, or owned by a different user
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let deleted = with_retry(|| Task::delete_for_owner(&state.db, id, auth.subject)).await?;

    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    tracing::debug!(user_id = %auth.subject, task_id = %id, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}
