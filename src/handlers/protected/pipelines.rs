// handlers/protected/pipelines.rs - read-only pipeline endpoints

use axum::extract::State;
use uuid::Uuid;

use crate::database::models::Pipeline;
use crate::middleware::{ApiResponse, ApiResult, TenantContext, ValidPath};
use crate::services::pipeline_service;
use crate::state::AppState;

/// GET /api/pipelines - Default pipeline first, then by creation time
pub async fn list(State(state): State<AppState>, tenant: TenantContext) -> ApiResult<Vec<Pipeline>> {
    let pipelines = pipeline_service::list(state.store.as_ref(), &tenant).await?;
    Ok(ApiResponse::success(pipelines))
}

/// GET /api/pipelines/default
pub async fn default(State(state): State<AppState>, tenant: TenantContext) -> ApiResult<Pipeline> {
    let pipeline = pipeline_service::get_default(state.store.as_ref(), &tenant).await?;
    Ok(ApiResponse::success(pipeline))
}

/// GET /api/pipelines/:id
pub async fn show(
    State(state): State<AppState>,
    tenant: TenantContext,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<Pipeline> {
    let pipeline = pipeline_service::get(state.store.as_ref(), &tenant, id).await?;
    Ok(ApiResponse::success(pipeline))
}
