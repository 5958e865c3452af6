use tracing::info;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::database::models::{ContactHistory, ContactHistoryListQuery, ContactHistoryPatch, NewContactHistory};
use crate::database::repository::ContactHistoryFilter;
use crate::database::Store;
use crate::error::ApiError;
use crate::middleware::{PaginationMeta, TenantContext};

use super::guards;

/// Turn the raw query into a store filter. The limit defaults to the
/// configured page size and is capped at the configured maximum.
pub fn resolve_filter(query: &ContactHistoryListQuery, api: &ApiConfig) -> Result<ContactHistoryFilter, ApiError> {
    let contact_type = query.contact_type.as_deref().map(guards::contact_type).transpose()?;
    Ok(ContactHistoryFilter {
        customer_id: query.customer_id,
        contact_type,
        limit: query.limit.unwrap_or(api.default_page_limit).clamp(1, api.max_page_limit.max(1)),
        offset: query.offset.unwrap_or(0).max(0),
    })
}

pub async fn list(
    store: &dyn Store,
    tenant: &TenantContext,
    query: &ContactHistoryListQuery,
    api: &ApiConfig,
) -> Result<(Vec<ContactHistory>, PaginationMeta), ApiError> {
    let filter = resolve_filter(query, api)?;
    if let Some(customer_id) = filter.customer_id {
        guards::customer_in_org(store, tenant.organization_id, customer_id).await?;
    }

    let (entries, total) = store.list_contact_history(tenant.organization_id, &filter).await?;
    Ok((entries, PaginationMeta::from_offset(filter.limit, filter.offset, total)))
}

pub async fn get(store: &dyn Store, tenant: &TenantContext, id: Uuid) -> Result<ContactHistory, ApiError> {
    store
        .find_contact_history(tenant.organization_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Contact history entry not found"))
}

/// Log an interaction with a customer of the caller's organization.
pub async fn create(store: &dyn Store, tenant: &TenantContext, entry: NewContactHistory) -> Result<ContactHistory, ApiError> {
    let contact_type = guards::contact_type(&entry.contact_type)?;
    guards::customer_in_org(store, tenant.organization_id, entry.customer_id).await?;

    let created = store
        .create_contact_history(tenant.organization_id, tenant.user_id, contact_type, &entry)
        .await?;
    info!("Contact history {} logged for customer {}", created.id, created.customer_id);
    Ok(created)
}

pub async fn update(
    store: &dyn Store,
    tenant: &TenantContext,
    id: Uuid,
    patch: ContactHistoryPatch,
) -> Result<ContactHistory, ApiError> {
    store
        .update_contact_history(tenant.organization_id, id, &patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Contact history entry not found"))
}

pub async fn delete(store: &dyn Store, tenant: &TenantContext, id: Uuid) -> Result<(), ApiError> {
    if !store.delete_contact_history(tenant.organization_id, id).await? {
        return Err(ApiError::not_found("Contact history entry not found"));
    }
    Ok(())
}
