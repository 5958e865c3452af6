use tracing::info;
use uuid::Uuid;

use crate::database::models::{NewTask, Task, TaskListQuery, TaskPatch};
use crate::database::Store;
use crate::error::ApiError;
use crate::middleware::TenantContext;

use super::guards;

pub async fn list(store: &dyn Store, tenant: &TenantContext, query: &TaskListQuery) -> Result<Vec<Task>, ApiError> {
    Ok(store.list_tasks(tenant.organization_id, query).await?)
}

pub async fn get(store: &dyn Store, tenant: &TenantContext, id: Uuid) -> Result<Task, ApiError> {
    store
        .find_task(tenant.organization_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))
}

/// Create a task. Without an explicit assignee it is assigned to the caller.
pub async fn create(store: &dyn Store, tenant: &TenantContext, mut task: NewTask) -> Result<Task, ApiError> {
    let org = tenant.organization_id;
    let assignee_id = task.assignee_id.unwrap_or(tenant.user_id);
    guards::user_in_org(store, org, assignee_id).await?;
    if let Some(customer_id) = task.customer_id {
        guards::customer_in_org(store, org, customer_id).await?;
    }
    if let Some(deal_id) = task.deal_id {
        guards::deal_in_org(store, org, deal_id).await?;
    }

    task.assignee_id = Some(assignee_id);
    let created = store.create_task(org, tenant.user_id, &task).await?;
    info!("Task {} created for assignee {}", created.id, created.assignee_id);
    Ok(created)
}

pub async fn update(store: &dyn Store, tenant: &TenantContext, id: Uuid, patch: TaskPatch) -> Result<Task, ApiError> {
    let org = tenant.organization_id;
    if let Some(assignee_id) = patch.assignee_id {
        guards::user_in_org(store, org, assignee_id).await?;
    }
    if let Some(Some(customer_id)) = patch.customer_id {
        guards::customer_in_org(store, org, customer_id).await?;
    }
    if let Some(Some(deal_id)) = patch.deal_id {
        guards::deal_in_org(store, org, deal_id).await?;
    }

    store
        .update_task(org, id, &patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))
}

pub async fn delete(store: &dyn Store, tenant: &TenantContext, id: Uuid) -> Result<(), ApiError> {
    if !store.delete_task(tenant.organization_id, id).await? {
        return Err(ApiError::not_found("Task not found"));
    }
    info!("Task {} deleted by {}", id, tenant.user_id);
    Ok(())
}
