// handlers/protected/deals.rs - /api/deals and /api/deals/:id

use axum::extract::State;
use uuid::Uuid;

use crate::database::models::{Deal, DealListQuery, DealPatch, NewDeal};
use crate::middleware::{ApiResponse, ApiResult, Deleted, TenantContext, ValidJson, ValidPath, ValidQuery};
use crate::services::deal_service;
use crate::state::AppState;

/// GET /api/deals - Optional `pipelineId`, `stageId`, `customerId` filters
pub async fn list(
    State(state): State<AppState>,
    tenant: TenantContext,
    ValidQuery(query): ValidQuery<DealListQuery>,
) -> ApiResult<Vec<Deal>> {
    let deals = deal_service::list(state.store.as_ref(), &tenant, &query).await?;
    Ok(ApiResponse::success(deals))
}

/// POST /api/deals
///
/// The customer and pipeline must belong to the caller's organization and
/// `stageId` must name a stage of that pipeline. Without an explicit
/// `probability` the stage's probability is used.
pub async fn create(
    State(state): State<AppState>,
    tenant: TenantContext,
    ValidJson(deal): ValidJson<NewDeal>,
) -> ApiResult<Deal> {
    let created = deal_service::create(state.store.as_ref(), &tenant, deal).await?;
    Ok(ApiResponse::created(created))
}

pub async fn show(
    State(state): State<AppState>,
    tenant: TenantContext,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<Deal> {
    let deal = deal_service::get(state.store.as_ref(), &tenant, id).await?;
    Ok(ApiResponse::success(deal))
}

pub async fn update(
    State(state): State<AppState>,
    tenant: TenantContext,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(patch): ValidJson<DealPatch>,
) -> ApiResult<Deal> {
    let deal = deal_service::update(state.store.as_ref(), &tenant, id, patch).await?;
    Ok(ApiResponse::success(deal))
}

pub async fn delete(
    State(state): State<AppState>,
    tenant: TenantContext,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<Deleted> {
    deal_service::delete(state.store.as_ref(), &tenant, id).await?;
    Ok(ApiResponse::success(Deleted::new(id)))
}
