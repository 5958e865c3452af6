//! Repository traits for the CRM entities.
//!
//! Every method that touches a tenant entity takes the caller's
//! organization id and only ever sees rows reachable from it. A row that
//! exists in another organization is indistinguishable from a missing one.

use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    ContactHistory, ContactHistoryPatch, ContactType, Customer, CustomerListQuery, CustomerPatch, Deal, DealListQuery,
    DealPatch, NewContactHistory, NewCustomer, NewDeal, NewOrganization, NewPipeline, NewTask, NewUser, Organization,
    Pipeline, Task, TaskListQuery, TaskPatch, User,
};

/// Resolved contact-history listing parameters.
#[derive(Debug, Clone)]
pub struct ContactHistoryFilter {
    pub customer_id: Option<Uuid>,
    pub contact_type: Option<ContactType>,
    pub limit: i64,
    pub offset: i64,
}

#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    /// Create the organization, its admin and its first pipeline atomically.
    async fn register(
        &self,
        organization: NewOrganization,
        admin: NewUser,
        pipeline: NewPipeline,
    ) -> Result<(Organization, User), DatabaseError>;

    async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>, DatabaseError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;
    async fn find_user_in_org(&self, organization_id: Uuid, id: Uuid) -> Result<Option<User>, DatabaseError>;
    async fn record_login(&self, id: Uuid) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn list_customers(&self, organization_id: Uuid, query: &CustomerListQuery) -> Result<Vec<Customer>, DatabaseError>;
    async fn find_customer(&self, organization_id: Uuid, id: Uuid) -> Result<Option<Customer>, DatabaseError>;
    /// Lookup that also returns soft-deleted rows.
    async fn find_customer_including_deleted(&self, organization_id: Uuid, id: Uuid) -> Result<Option<Customer>, DatabaseError>;
    async fn create_customer(&self, organization_id: Uuid, created_by: Uuid, customer: &NewCustomer) -> Result<Customer, DatabaseError>;
    async fn update_customer(&self, organization_id: Uuid, id: Uuid, patch: &CustomerPatch) -> Result<Option<Customer>, DatabaseError>;
    async fn delete_customer(&self, organization_id: Uuid, id: Uuid) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait PipelineRepository: Send + Sync {
    async fn list_pipelines(&self, organization_id: Uuid) -> Result<Vec<Pipeline>, DatabaseError>;
    async fn find_pipeline(&self, organization_id: Uuid, id: Uuid) -> Result<Option<Pipeline>, DatabaseError>;
    /// Most recently created pipeline flagged as default.
    async fn find_default_pipeline(&self, organization_id: Uuid) -> Result<Option<Pipeline>, DatabaseError>;
}

#[async_trait]
pub trait DealRepository: Send + Sync {
    async fn list_deals(&self, organization_id: Uuid, query: &DealListQuery) -> Result<Vec<Deal>, DatabaseError>;
    async fn find_deal(&self, organization_id: Uuid, id: Uuid) -> Result<Option<Deal>, DatabaseError>;
    /// `deal.probability` must already be resolved.
    async fn create_deal(&self, organization_id: Uuid, created_by: Uuid, deal: &NewDeal) -> Result<Deal, DatabaseError>;
    async fn update_deal(&self, organization_id: Uuid, id: Uuid, patch: &DealPatch) -> Result<Option<Deal>, DatabaseError>;
    async fn delete_deal(&self, organization_id: Uuid, id: Uuid) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn list_tasks(&self, organization_id: Uuid, query: &TaskListQuery) -> Result<Vec<Task>, DatabaseError>;
    async fn find_task(&self, organization_id: Uuid, id: Uuid) -> Result<Option<Task>, DatabaseError>;
    /// `task.assignee_id` must already be resolved.
    async fn create_task(&self, organization_id: Uuid, created_by: Uuid, task: &NewTask) -> Result<Task, DatabaseError>;
    async fn update_task(&self, organization_id: Uuid, id: Uuid, patch: &TaskPatch) -> Result<Option<Task>, DatabaseError>;
    async fn delete_task(&self, organization_id: Uuid, id: Uuid) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait ContactHistoryRepository: Send + Sync {
    /// One page of entries plus the total matching count.
    async fn list_contact_history(
        &self,
        organization_id: Uuid,
        filter: &ContactHistoryFilter,
    ) -> Result<(Vec<ContactHistory>, i64), DatabaseError>;
    async fn find_contact_history(&self, organization_id: Uuid, id: Uuid) -> Result<Option<ContactHistory>, DatabaseError>;
    async fn create_contact_history(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        contact_type: ContactType,
        entry: &NewContactHistory,
    ) -> Result<ContactHistory, DatabaseError>;
    async fn update_contact_history(
        &self,
        organization_id: Uuid,
        id: Uuid,
        patch: &ContactHistoryPatch,
    ) -> Result<Option<ContactHistory>, DatabaseError>;
    async fn delete_contact_history(&self, organization_id: Uuid, id: Uuid) -> Result<bool, DatabaseError>;
}

/// Everything the HTTP layer needs from persistence.
#[async_trait]
pub trait Store:
    OrganizationRepository
    + UserRepository
    + CustomerRepository
    + PipelineRepository
    + DealRepository
    + TaskRepository
    + ContactHistoryRepository
{
    fn backend(&self) -> &'static str;

    async fn ping(&self) -> Result<(), DatabaseError>;
}
