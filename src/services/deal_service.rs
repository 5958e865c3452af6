use tracing::info;
use uuid::Uuid;

use crate::database::models::deal::clamp_probability;
use crate::database::models::{Deal, DealListQuery, DealPatch, NewDeal};
use crate::database::Store;
use crate::error::ApiError;
use crate::middleware::TenantContext;

use super::guards;

pub async fn list(store: &dyn Store, tenant: &TenantContext, query: &DealListQuery) -> Result<Vec<Deal>, ApiError> {
    Ok(store.list_deals(tenant.organization_id, query).await?)
}

pub async fn get(store: &dyn Store, tenant: &TenantContext, id: Uuid) -> Result<Deal, ApiError> {
    guards::deal_in_org(store, tenant.organization_id, id).await
}

/// Create a deal on a stage of one of the organization's pipelines. An
/// omitted probability is taken from the stage.
pub async fn create(store: &dyn Store, tenant: &TenantContext, mut deal: NewDeal) -> Result<Deal, ApiError> {
    let org = tenant.organization_id;
    guards::customer_in_org(store, org, deal.customer_id).await?;
    let pipeline = guards::pipeline_in_org(store, org, deal.pipeline_id).await?;
    let stage = guards::stage_in_pipeline(&pipeline, &deal.stage_id)?;

    deal.probability = Some(clamp_probability(deal.probability.unwrap_or(stage.probability)));

    let created = store.create_deal(org, tenant.user_id, &deal).await?;
    info!("Deal {} created on stage '{}' of pipeline {}", created.id, created.stage_id, created.pipeline_id);
    Ok(created)
}

/// Apply a sparse update. Moving the deal re-checks that the resulting
/// stage id exists in the resulting pipeline.
pub async fn update(store: &dyn Store, tenant: &TenantContext, id: Uuid, patch: DealPatch) -> Result<Deal, ApiError> {
    let org = tenant.organization_id;
    let existing = guards::deal_in_org(store, org, id).await?;

    if let Some(customer_id) = patch.customer_id {
        guards::customer_in_org(store, org, customer_id).await?;
    }
    if patch.moves_stage() {
        let pipeline_id = patch.pipeline_id.unwrap_or(existing.pipeline_id);
        let stage_id = patch.stage_id.as_deref().unwrap_or(&existing.stage_id);
        let pipeline = guards::pipeline_in_org(store, org, pipeline_id).await?;
        guards::stage_in_pipeline(&pipeline, stage_id)?;
    }

    store
        .update_deal(org, id, &patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Deal not found"))
}

pub async fn delete(store: &dyn Store, tenant: &TenantContext, id: Uuid) -> Result<(), ApiError> {
    if !store.delete_deal(tenant.organization_id, id).await? {
        return Err(ApiError::not_found("Deal not found"));
    }
    info!("Deal {} deleted by {}", id, tenant.user_id);
    Ok(())
}
