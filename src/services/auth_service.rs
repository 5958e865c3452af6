use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use crate::auth::{hash_password, verify_password, TokenPair, TokenType};
use crate::database::models::{NewOrganization, NewPipeline, NewUser, Organization, User, UserRole};
use crate::error::ApiError;
use crate::middleware::TenantContext;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "First name must be between 1 and 100 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "Last name must be between 1 and 100 characters"))]
    pub last_name: String,

    #[validate(length(min = 1, max = 255, message = "Organization name must be between 1 and 255 characters"))]
    pub organization_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Tokens plus the user they were issued for.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<Organization>,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

impl AuthSession {
    fn new(user: User, organization: Option<Organization>, tokens: TokenPair) -> Self {
        Self {
            user,
            organization,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Me {
    pub user: User,
    pub organization: Organization,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Create an organization with its admin user and default pipeline.
pub async fn register(state: &AppState, request: RegisterRequest) -> Result<AuthSession, ApiError> {
    let email = normalize_email(&request.email);
    let cost = state.config.security.bcrypt_cost;
    let password = request.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(ApiError::internal)??;

    let (organization, user) = state
        .store
        .register(
            NewOrganization {
                name: request.organization_name.trim().to_string(),
            },
            NewUser {
                email,
                password_hash,
                first_name: request.first_name,
                last_name: request.last_name,
                role: UserRole::Admin,
            },
            NewPipeline::default_for_organization(),
        )
        .await?;

    info!("Organization {} registered by {}", organization.id, user.id);
    let tokens = state.tokens.issue_pair(&user)?;
    Ok(AuthSession::new(user, Some(organization), tokens))
}

/// Verify credentials and issue a fresh token pair.
pub async fn login(state: &AppState, request: LoginRequest) -> Result<AuthSession, ApiError> {
    let invalid = || ApiError::unauthorized("Invalid email or password");

    let mut user = state
        .store
        .find_user_by_email(&normalize_email(&request.email))
        .await?
        .ok_or_else(invalid)?;

    let password = request.password;
    let hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(ApiError::internal)?;
    if !matches {
        warn!("Failed login for user {}", user.id);
        return Err(invalid());
    }
    if !user.is_active {
        warn!("Login attempt for inactive user {}", user.id);
        return Err(invalid());
    }

    state.store.record_login(user.id).await?;
    user.last_login_at = Some(chrono::Utc::now());
    let tokens = state.tokens.issue_pair(&user)?;
    Ok(AuthSession::new(user, None, tokens))
}

/// Exchange a refresh token for a new pair. The user must still exist and
/// be active.
pub async fn refresh(state: &AppState, request: RefreshRequest) -> Result<TokenPair, ApiError> {
    let claims = state.tokens.verify(&request.refresh_token, TokenType::Refresh)?;

    let user = state
        .store
        .find_user_by_id(claims.sub)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::unauthorized("Invalid refresh token"))?;

    Ok(state.tokens.issue_pair(&user)?)
}

pub async fn me(state: &AppState, tenant: &TenantContext) -> Result<Me, ApiError> {
    let user = state
        .store
        .find_user_by_id(tenant.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let organization = state
        .store
        .find_organization(tenant.organization_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Organization not found"))?;
    Ok(Me { user, organization })
}
