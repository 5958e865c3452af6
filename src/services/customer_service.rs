use tracing::info;
use uuid::Uuid;

use crate::database::models::{Customer, CustomerListQuery, CustomerPatch, NewCustomer};
use crate::database::Store;
use crate::error::ApiError;
use crate::middleware::TenantContext;

use super::guards;

pub async fn list(store: &dyn Store, tenant: &TenantContext, query: &CustomerListQuery) -> Result<Vec<Customer>, ApiError> {
    Ok(store.list_customers(tenant.organization_id, query).await?)
}

pub async fn get(store: &dyn Store, tenant: &TenantContext, id: Uuid) -> Result<Customer, ApiError> {
    guards::customer_in_org(store, tenant.organization_id, id).await
}

pub async fn create(store: &dyn Store, tenant: &TenantContext, customer: NewCustomer) -> Result<Customer, ApiError> {
    if let Some(assignee) = customer.assigned_to {
        guards::user_in_org(store, tenant.organization_id, assignee).await?;
    }
    let created = store.create_customer(tenant.organization_id, tenant.user_id, &customer).await?;
    info!("Customer {} created in organization {}", created.id, tenant.organization_id);
    Ok(created)
}

pub async fn update(store: &dyn Store, tenant: &TenantContext, id: Uuid, patch: CustomerPatch) -> Result<Customer, ApiError> {
    if let Some(Some(assignee)) = patch.assigned_to {
        guards::user_in_org(store, tenant.organization_id, assignee).await?;
    }
    store
        .update_customer(tenant.organization_id, id, &patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer not found"))
}

/// Soft delete; restricted to admins and managers.
pub async fn delete(store: &dyn Store, tenant: &TenantContext, id: Uuid) -> Result<(), ApiError> {
    tenant.require_manager()?;
    if !store.delete_customer(tenant.organization_id, id).await? {
        return Err(ApiError::not_found("Customer not found"));
    }
    info!("Customer {} soft-deleted by {}", id, tenant.user_id);
    Ok(())
}
