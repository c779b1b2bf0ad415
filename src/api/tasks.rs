//! Task CRUD + stats endpoints.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

use super::error::ApiError;
use super::extract::{ApiJson, TaskId};
use super::routes::AppState;
use super::types::{CreateTaskRequest, UpdateTaskRequest};
use crate::task::{NewTask, Task, TaskPatch, TaskStats, TaskStatus};

/// Create the task sub-router, nested under `/api/tasks`.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/stats", get(task_stats))
        .route(
            "/:id",
            get(get_task).put(update_task).delete(delete_task),
        )
}

/// Parse an optional status string, turning bad values into a 400.
fn parse_status(raw: Option<String>) -> Result<Option<TaskStatus>, ApiError> {
    match raw {
        None => Ok(None),
        Some(s) => s
            .parse::<TaskStatus>()
            .map(Some)
            .map_err(|e| ApiError::Validation(e.to_string())),
    }
}

/// GET /api/tasks - List all tasks.
async fn list_tasks(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = state.store.list().await?;
    Ok(Json(tasks))
}

/// GET /api/tasks/:id - Get one task.
async fn get_task(
    State(state): State<Arc<AppState>>,
    TaskId(id): TaskId,
) -> Result<Json<Task>, ApiError> {
    state
        .store
        .get(id)
        .await?
        .map(Json)
        .ok_or(ApiError::TaskNotFound(id))
}

/// POST /api/tasks - Create a task.
///
/// `title` is required and must be non-empty; a missing `status` defaults
/// to `todo`.
async fn create_task(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let title = match req.title {
        Some(t) if !t.trim().is_empty() => t,
        _ => {
            return Err(ApiError::Validation(
                "title is required and must be non-empty".to_string(),
            ))
        }
    };
    let status = parse_status(req.status)?.unwrap_or_default();

    let task = state
        .store
        .create(NewTask {
            title,
            description: req.description,
            status,
        })
        .await?;

    tracing::info!("Created task {} ({})", task.id, task.title);

    Ok((StatusCode::CREATED, Json(task)))
}

/// PUT /api/tasks/:id - Partially update a task.
async fn update_task(
    State(state): State<Arc<AppState>>,
    TaskId(id): TaskId,
    ApiJson(req): ApiJson<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    if let Some(title) = &req.title {
        if title.trim().is_empty() {
            return Err(ApiError::Validation("title must be non-empty".to_string()));
        }
    }
    let status = parse_status(req.status)?;

    let patch = TaskPatch {
        title: req.title,
        description: req.description,
        status,
    };

    state
        .store
        .update(id, patch)
        .await?
        .map(Json)
        .ok_or(ApiError::TaskNotFound(id))
}

/// DELETE /api/tasks/:id - Remove a task.
async fn delete_task(
    State(state): State<Arc<AppState>>,
    TaskId(id): TaskId,
) -> Result<StatusCode, ApiError> {
    if state.store.delete(id).await? {
        tracing::info!("Deleted task {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::TaskNotFound(id))
    }
}

/// GET /api/tasks/stats - Aggregate counts by status.
async fn task_stats(State(state): State<Arc<AppState>>) -> Result<Json<TaskStats>, ApiError> {
    let stats = state.store.stats().await?;
    Ok(Json(stats))
}
