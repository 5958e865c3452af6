//! Ownership checks run before any write.
//!
//! Each guard is a read-only lookup through the tenant-scoped store, so a
//! row from another organization fails exactly like a missing one.

use uuid::Uuid;

use crate::database::models::contact_history::ContactTypeError;
use crate::database::models::{ContactType, Customer, Deal, Pipeline, Stage, User};
use crate::database::Store;
use crate::error::ApiError;

pub async fn customer_in_org(store: &dyn Store, organization_id: Uuid, customer_id: Uuid) -> Result<Customer, ApiError> {
    store
        .find_customer(organization_id, customer_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer not found"))
}

pub async fn pipeline_in_org(store: &dyn Store, organization_id: Uuid, pipeline_id: Uuid) -> Result<Pipeline, ApiError> {
    store
        .find_pipeline(organization_id, pipeline_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Pipeline not found"))
}

pub async fn user_in_org(store: &dyn Store, organization_id: Uuid, user_id: Uuid) -> Result<User, ApiError> {
    store
        .find_user_in_org(organization_id, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

pub async fn deal_in_org(store: &dyn Store, organization_id: Uuid, deal_id: Uuid) -> Result<Deal, ApiError> {
    store
        .find_deal(organization_id, deal_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Deal not found"))
}

/// The stage must be one of the pipeline's stage ids.
pub fn stage_in_pipeline<'p>(pipeline: &'p Pipeline, stage_id: &str) -> Result<&'p Stage, ApiError> {
    pipeline.stages.get(stage_id).ok_or_else(|| {
        ApiError::field_error(
            "stageId",
            format!("Stage '{}' does not exist in pipeline '{}'", stage_id, pipeline.name),
        )
    })
}

pub fn contact_type(raw: &str) -> Result<ContactType, ApiError> {
    raw.parse()
        .map_err(|e: ContactTypeError| ApiError::field_error("type", e.to_string()))
}
