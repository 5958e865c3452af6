// handlers/public/auth/login.rs - POST /api/auth/login handler

use axum::extract::State;

use crate::middleware::{ApiResponse, ApiResult, ValidJson};
use crate::services::auth_service::{self, AuthSession, LoginRequest};
use crate::state::AppState;

/// POST /api/auth/login - Authenticate with email and password
///
/// Returns `{user, accessToken, refreshToken, expiresIn}`. Unknown email,
/// wrong password and deactivated accounts all answer 401 with the same
/// message.
pub async fn login_post(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> ApiResult<AuthSession> {
    let session = auth_service::login(&state, request).await?;
    Ok(ApiResponse::success(session))
}
