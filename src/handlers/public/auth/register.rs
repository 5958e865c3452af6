// handlers/public/auth/register.rs - POST /api/auth/register handler

use axum::extract::State;

use crate::middleware::{ApiResponse, ApiResult, ValidJson};
use crate::services::auth_service::{self, AuthSession, RegisterRequest};
use crate::state::AppState;

/// POST /api/auth/register - Create an organization and its first admin
///
/// Expected Input:
/// ```json
/// {
///   "email": "owner@acme.test",
///   "password": "at-least-8-chars",
///   "firstName": "Ada",
///   "lastName": "Lovelace",
///   "organizationName": "Acme"
/// }
/// ```
///
/// Responds 201 with `{user, organization, accessToken, refreshToken}`.
/// The organization starts with one default sales pipeline. A registered
/// email yields 409.
pub async fn register_post(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<RegisterRequest>,
) -> ApiResult<AuthSession> {
    let session = auth_service::register(&state, request).await?;
    Ok(ApiResponse::created(session))
}
