use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::database::models::UserRole;
use crate::database::Store;
use crate::error::ApiError;
use crate::state::AppState;

use super::auth::AuthUser;

/// The organization every query in a request is scoped to.
///
/// Taking this extractor is the only way a protected handler learns its
/// organization id, so resolution cannot be skipped.
#[derive(Clone, Debug)]
pub struct TenantContext {
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub role: UserRole,
}

impl TenantContext {
    pub fn require_manager(&self) -> Result<(), ApiError> {
        if self.role.can_manage_records() {
            Ok(())
        } else {
            Err(ApiError::forbidden("This action requires the ADMIN or MANAGER role"))
        }
    }
}

/// Resolve the principal's organization from its current user row.
pub async fn resolve_tenant(store: &dyn Store, principal: &AuthUser) -> Result<TenantContext, ApiError> {
    let user = store
        .find_user_by_id(principal.principal_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if !user.is_active {
        return Err(ApiError::unauthorized("Account is inactive"));
    }

    Ok(TenantContext {
        organization_id: user.organization_id,
        user_id: user.id,
        role: user.role,
    })
}

#[async_trait]
impl FromRequestParts<AppState> for TenantContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let principal = parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

        resolve_tenant(state.store.as_ref(), &principal).await
    }
}
