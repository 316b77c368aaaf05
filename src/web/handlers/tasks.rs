//! # Task Handlers
//!
//! Thin wrappers over `TaskLifecycleService`. Path and body rejections are
//! turned into the same JSON error shape the service errors use.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::debug;

use crate::models::{NewTask, Task, TaskPatch};
use crate::web::errors::{ApiError, ApiResult};
use crate::web::state::AppState;

fn task_id(path: Result<Path<i64>, PathRejection>) -> ApiResult<i64> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::bad_request("Invalid task ID"))
}

fn user_id(path: Result<Path<i64>, PathRejection>) -> ApiResult<i64> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::bad_request("Invalid user ID"))
}

fn body<T>(json: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    json.map(|Json(value)| value)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

/// GET /api/tasks
pub async fn list_tasks(State(state): State<AppState>) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(state.tasks.list_tasks().await?))
}

/// POST /api/tasks
pub async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<NewTask>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let input = body(payload)?;
    let task = state.tasks.create_task(input).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /api/tasks/:id
pub async fn get_task(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Task>> {
    let id = task_id(path)?;
    Ok(Json(state.tasks.get_task(id).await?))
}

/// PUT /api/tasks/:id
pub async fn update_task(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<TaskPatch>, JsonRejection>,
) -> ApiResult<Json<Task>> {
    let id = task_id(path)?;
    let patch = match body(payload) {
        Ok(patch) => patch,
        Err(e) => {
            // Unknown ids are 404 whatever the body looks like
            state.tasks.get_task(id).await?;
            return Err(e);
        }
    };
    debug!(task_id = id, empty = patch.is_empty(), "Updating task");
    Ok(Json(state.tasks.update_task(id, patch).await?))
}

/// DELETE /api/tasks/:id
pub async fn delete_task(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let id = task_id(path)?;
    state.tasks.delete_task(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/tasks/user/:user_id
pub async fn tasks_for_user(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Vec<Task>>> {
    let user_id = user_id(path)?;
    Ok(Json(state.tasks.tasks_for_user(user_id).await?))
}
