// handlers/protected/customers.rs - /api/customers and /api/customers/:id

use axum::extract::State;
use uuid::Uuid;

use crate::database::models::{Customer, CustomerListQuery, CustomerPatch, NewCustomer};
use crate::middleware::{ApiResponse, ApiResult, Deleted, TenantContext, ValidJson, ValidPath, ValidQuery};
use crate::services::customer_service;
use crate::state::AppState;

/// GET /api/customers - Live customers, newest first
///
/// Query: `search` (name, email or company substring), `status`, `tag`.
pub async fn list(
    State(state): State<AppState>,
    tenant: TenantContext,
    ValidQuery(query): ValidQuery<CustomerListQuery>,
) -> ApiResult<Vec<Customer>> {
    let customers = customer_service::list(state.store.as_ref(), &tenant, &query).await?;
    Ok(ApiResponse::success(customers))
}

/// POST /api/customers
pub async fn create(
    State(state): State<AppState>,
    tenant: TenantContext,
    ValidJson(customer): ValidJson<NewCustomer>,
) -> ApiResult<Customer> {
    let created = customer_service::create(state.store.as_ref(), &tenant, customer).await?;
    Ok(ApiResponse::created(created))
}

/// GET /api/customers/:id
pub async fn show(
    State(state): State<AppState>,
    tenant: TenantContext,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<Customer> {
    let customer = customer_service::get(state.store.as_ref(), &tenant, id).await?;
    Ok(ApiResponse::success(customer))
}

/// PUT /api/customers/:id - Partial update; absent fields are left alone
pub async fn update(
    State(state): State<AppState>,
    tenant: TenantContext,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(patch): ValidJson<CustomerPatch>,
) -> ApiResult<Customer> {
    let customer = customer_service::update(state.store.as_ref(), &tenant, id, patch).await?;
    Ok(ApiResponse::success(customer))
}

/// DELETE /api/customers/:id - Soft delete, admins and managers only
pub async fn delete(
    State(state): State<AppState>,
    tenant: TenantContext,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<Deleted> {
    customer_service::delete(state.store.as_ref(), &tenant, id).await?;
    Ok(ApiResponse::success(Deleted::new(id)))
}
