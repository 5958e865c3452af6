// handlers/public/auth/refresh.rs - POST /api/auth/refresh handler

use axum::extract::State;

use crate::auth::TokenPair;
use crate::middleware::{ApiResponse, ApiResult, ValidJson};
use crate::services::auth_service::{self, RefreshRequest};
use crate::state::AppState;

/// POST /api/auth/refresh - Exchange `{refreshToken}` for a new token pair
pub async fn refresh_post(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<RefreshRequest>,
) -> ApiResult<TokenPair> {
    let tokens = auth_service::refresh(&state, request).await?;
    Ok(ApiResponse::success(tokens))
}
