// handlers/public/health.rs - GET /health and GET /health/detailed

use axum::extract::State;

use crate::middleware::{ApiResponse, ApiResult};
use crate::services::health_service::{self, DetailedHealth, Liveness};
use crate::state::AppState;

pub async fn health_get() -> ApiResult<Liveness> {
    Ok(ApiResponse::success(health_service::liveness()))
}

/// Store and cache status. Always 200; check `data.status`.
pub async fn health_detailed_get(State(state): State<AppState>) -> ApiResult<DetailedHealth> {
    Ok(ApiResponse::success(health_service::detailed(&state).await))
}
