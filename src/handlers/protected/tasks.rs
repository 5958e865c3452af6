// handlers/protected/tasks.rs - /api/tasks and /api/tasks/:id

use axum::extract::State;
use uuid::Uuid;

use crate::database::models::{NewTask, Task, TaskListQuery, TaskPatch};
use crate::middleware::{ApiResponse, ApiResult, Deleted, TenantContext, ValidJson, ValidPath, ValidQuery};
use crate::services::task_service;
use crate::state::AppState;

/// GET /api/tasks - Ordered by due date (undated last), then newest
pub async fn list(
    State(state): State<AppState>,
    tenant: TenantContext,
    ValidQuery(query): ValidQuery<TaskListQuery>,
) -> ApiResult<Vec<Task>> {
    let tasks = task_service::list(state.store.as_ref(), &tenant, &query).await?;
    Ok(ApiResponse::success(tasks))
}

/// POST /api/tasks - `assigneeId` defaults to the caller
pub async fn create(
    State(state): State<AppState>,
    tenant: TenantContext,
    ValidJson(task): ValidJson<NewTask>,
) -> ApiResult<Task> {
    let created = task_service::create(state.store.as_ref(), &tenant, task).await?;
    Ok(ApiResponse::created(created))
}

pub async fn show(
    State(state): State<AppState>,
    tenant: TenantContext,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<Task> {
    let task = task_service::get(state.store.as_ref(), &tenant, id).await?;
    Ok(ApiResponse::success(task))
}

/// PUT /api/tasks/:id - Moving to COMPLETE stamps `completedAt`, moving
/// away clears it
pub async fn update(
    State(state): State<AppState>,
    tenant: TenantContext,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(patch): ValidJson<TaskPatch>,
) -> ApiResult<Task> {
    let task = task_service::update(state.store.as_ref(), &tenant, id, patch).await?;
    Ok(ApiResponse::success(task))
}

pub async fn delete(
    State(state): State<AppState>,
    tenant: TenantContext,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<Deleted> {
    task_service::delete(state.store.as_ref(), &tenant, id).await?;
    Ok(ApiResponse::success(Deleted::new(id)))
}
