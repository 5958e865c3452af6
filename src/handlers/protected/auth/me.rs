// handlers/protected/auth/me.rs - GET /api/auth/me handler

use axum::extract::State;

use crate::middleware::{ApiResponse, ApiResult, TenantContext};
use crate::services::auth_service::{self, Me};
use crate::state::AppState;

/// GET /api/auth/me - The caller's user record and organization
pub async fn me_get(State(state): State<AppState>, tenant: TenantContext) -> ApiResult<Me> {
    let me = auth_service::me(&state, &tenant).await?;
    Ok(ApiResponse::success(me))
}
