// handlers/protected/contact_history.rs - /api/contact-history and /api/contact-history/:id

use axum::extract::State;
use uuid::Uuid;

use crate::database::models::{ContactHistory, ContactHistoryListQuery, ContactHistoryPatch, NewContactHistory};
use crate::middleware::{ApiResponse, ApiResult, Deleted, TenantContext, ValidJson, ValidPath, ValidQuery};
use crate::services::contact_history_service;
use crate::state::AppState;

/// GET /api/contact-history - Paged log, newest first
///
/// Query: `customerId`, `type`, `limit`, `offset`. The envelope carries
/// `metadata {page, limit, total, totalPages, offset}`.
pub async fn list(
    State(state): State<AppState>,
    tenant: TenantContext,
    ValidQuery(query): ValidQuery<ContactHistoryListQuery>,
) -> ApiResult<Vec<ContactHistory>> {
    let (entries, meta) =
        contact_history_service::list(state.store.as_ref(), &tenant, &query, &state.config.api).await?;
    Ok(ApiResponse::paginated(entries, meta))
}

/// POST /api/contact-history - The caller is recorded as the author
pub async fn create(
    State(state): State<AppState>,
    tenant: TenantContext,
    ValidJson(entry): ValidJson<NewContactHistory>,
) -> ApiResult<ContactHistory> {
    let created = contact_history_service::create(state.store.as_ref(), &tenant, entry).await?;
    Ok(ApiResponse::created(created))
}

pub async fn show(
    State(state): State<AppState>,
    tenant: TenantContext,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<ContactHistory> {
    let entry = contact_history_service::get(state.store.as_ref(), &tenant, id).await?;
    Ok(ApiResponse::success(entry))
}

pub async fn update(
    State(state): State<AppState>,
    tenant: TenantContext,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(patch): ValidJson<ContactHistoryPatch>,
) -> ApiResult<ContactHistory> {
    let entry = contact_history_service::update(state.store.as_ref(), &tenant, id, patch).await?;
    Ok(ApiResponse::success(entry))
}

pub async fn delete(
    State(state): State<AppState>,
    tenant: TenantContext,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<Deleted> {
    contact_history_service::delete(state.store.as_ref(), &tenant, id).await?;
    Ok(ApiResponse::success(Deleted::new(id)))
}
