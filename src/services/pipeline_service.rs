use uuid::Uuid;

use crate::database::models::Pipeline;
use crate::database::Store;
use crate::error::ApiError;
use crate::middleware::TenantContext;

use super::guards;

pub async fn list(store: &dyn Store, tenant: &TenantContext) -> Result<Vec<Pipeline>, ApiError> {
    Ok(store.list_pipelines(tenant.organization_id).await?)
}

pub async fn get(store: &dyn Store, tenant: &TenantContext, id: Uuid) -> Result<Pipeline, ApiError> {
    guards::pipeline_in_org(store, tenant.organization_id, id).await
}

/// When several pipelines claim to be the default, the newest wins.
pub async fn get_default(store: &dyn Store, tenant: &TenantContext) -> Result<Pipeline, ApiError> {
    store
        .find_default_pipeline(tenant.organization_id)
        .await?
        .ok_or_else(|| ApiError::not_found("No default pipeline configured"))
}
